use std::ops::{ Add, Sub, Mul };

use crate::feq;

/// A color.
///
/// Represented with red-green-blue (RGB) channels. Displayable values range
/// from 0.0 to 1.0, but intermediate lighting results are free to exceed that
/// range; clamping only happens when a color is written to a `Canvas`.
///
/// # Examples
///
/// ```
/// # use whitted_tracer::color::Color;
/// let blend = Color::average(&Color::green(), &Color::blue());
/// assert_eq!(blend, Color::rgb(0.0, 0.5, 0.5));
/// ```
#[derive(Copy, Clone, Debug, Default, PartialOrd)]
pub struct Color {
    pub r: f64,
    pub g: f64,
    pub b: f64,
}

/// Channel-wise approximate equality, like `Tuple4D`.
impl PartialEq for Color {
    fn eq(&self, other: &Color) -> bool {
        feq(self.r, other.r) &&
            feq(self.g, other.g) &&
            feq(self.b, other.b)
    }
}

impl From<[f64; 3]> for Color {
    fn from(c: [f64; 3]) -> Color {
        Color::rgb(c[0], c[1], c[2])
    }
}

/// Maps a floating point channel onto `0..=255`.
fn channel_to_byte(c: f64) -> u8 {
    (c * 255.0).round().clamp(0.0, 255.0) as u8
}

impl Color {
    pub fn rgb(r: f64, g: f64, b: f64) -> Color {
        Color { r, g, b }
    }

    pub fn black() -> Color {
        Color::rgb(0.0, 0.0, 0.0)
    }

    pub fn white() -> Color {
        Color::rgb(1.0, 1.0, 1.0)
    }

    pub fn red() -> Color {
        Color::rgb(1.0, 0.0, 0.0)
    }

    pub fn green() -> Color {
        Color::rgb(0.0, 1.0, 0.0)
    }

    pub fn blue() -> Color {
        Color::rgb(0.0, 0.0, 1.0)
    }

    /// Computes the Hadamard (channel-wise) product of two colors.
    ///
    /// ```
    /// # use whitted_tracer::color::Color;
    /// let yellow = Color::rgb(1.0, 1.0, 0.0);
    /// let purple = Color::rgb(1.0, 0.0, 1.0);
    /// assert_eq!(Color::hadamard(&yellow, &purple), Color::red());
    /// ```
    pub fn hadamard(c1: &Color, c2: &Color) -> Color {
        Color::rgb(c1.r * c2.r, c1.g * c2.g, c1.b * c2.b)
    }

    /// Averages two colors channel by channel.
    pub fn average(c1: &Color, c2: &Color) -> Color {
        (*c1 + *c2) * 0.5
    }

    /// Linear interpolation from `self` (at `0.0`) to `other` (at `1.0`).
    pub fn lerp(&self, other: &Color, fraction: f64) -> Color {
        *self + (*other - *self) * fraction
    }

    /// Converts to RGBA bytes, clamping each channel. Alpha is always opaque.
    pub fn to_rgba8(&self) -> [u8; 4] {
        [
            channel_to_byte(self.r),
            channel_to_byte(self.g),
            channel_to_byte(self.b),
            255,
        ]
    }
}

impl Add<Color> for Color {
    type Output = Color;

    fn add(self, other: Color) -> Self::Output {
        Color::rgb(self.r + other.r, self.g + other.g, self.b + other.b)
    }
}

impl Sub<Color> for Color {
    type Output = Color;

    fn sub(self, other: Color) -> Self::Output {
        Color::rgb(self.r - other.r, self.g - other.g, self.b - other.b)
    }
}

impl Mul<f64> for Color {
    type Output = Color;

    fn mul(self, s: f64) -> Self::Output {
        Color::rgb(self.r * s, self.g * s, self.b * s)
    }
}

impl Mul<Color> for f64 {
    type Output = Color;

    fn mul(self, c: Color) -> Self::Output {
        c * self
    }
}

/// Shorthand for `Color::hadamard`.
impl Mul<Color> for Color {
    type Output = Color;

    fn mul(self, other: Color) -> Self::Output {
        Color::hadamard(&self, &other)
    }
}

#[test]
fn add_and_subtract_colors() {
    let c1 = Color::rgb(0.9, 0.6, 0.75);
    let c2 = Color::rgb(0.7, 0.1, 0.25);

    assert_eq!(c1 + c2, Color::rgb(1.6, 0.7, 1.0));
    assert_eq!(c1 - c2, Color::rgb(0.2, 0.5, 0.5));
}

#[test]
fn multiply_colors() {
    let c1 = Color::rgb(1.0, 0.2, 0.4);
    let c2 = Color::rgb(0.9, 1.0, 0.1);

    assert_eq!(Color::rgb(0.2, 0.3, 0.4) * 2.0, Color::rgb(0.4, 0.6, 0.8));
    assert_eq!(c1 * c2, Color::rgb(0.9, 0.2, 0.04));
}

#[test]
fn lerp_between_colors() {
    let a = Color::white();
    let b = Color::black();

    assert_eq!(a.lerp(&b, 0.25), Color::rgb(0.75, 0.75, 0.75));
    assert_eq!(a.lerp(&b, 0.0), a);
}

#[test]
fn rgba_conversion_clamps() {
    assert_eq!(Color::rgb(1.5, 0.0, -0.5).to_rgba8(), [255, 0, 0, 255]);
    assert_eq!(Color::rgb(0.0, 0.5, 1.0).to_rgba8(), [0, 128, 255, 255]);
}
