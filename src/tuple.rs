use std::ops::{ Add, Sub, Neg, Mul, Div };

use crate::feq;

/// A homogeneous 4D tuple.
///
/// Points carry `w == 1.0` and vectors carry `w == 0.0`. The arithmetic
/// operators keep that distinction intact: point minus point is a vector,
/// point plus vector is a point, and vector plus vector is a vector.
#[derive(Debug, Default, Copy, Clone, PartialOrd)]
pub struct Tuple4D {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub w: f64
}

/// Component-wise approximate equality (see `feq`).
impl PartialEq for Tuple4D {
    fn eq(&self, other: &Tuple4D) -> bool {
        feq(self.x, other.x) &&
            feq(self.y, other.y) &&
            feq(self.z, other.z) &&
            feq(self.w, other.w)
    }
}

impl Tuple4D {
    pub fn tuple(x: f64, y: f64, z: f64, w: f64) -> Tuple4D {
        Tuple4D { x, y, z, w }
    }

    pub fn point(x: f64, y: f64, z: f64) -> Tuple4D {
        Tuple4D { x, y, z, w: 1.0 }
    }

    pub fn vector(x: f64, y: f64, z: f64) -> Tuple4D {
        Tuple4D { x, y, z, w: 0.0 }
    }

    /// The point at the origin.
    pub fn origin() -> Tuple4D {
        Tuple4D::point(0.0, 0.0, 0.0)
    }

    pub fn is_point(&self) -> bool {
        feq(self.w, 1.0)
    }

    pub fn is_vector(&self) -> bool {
        feq(self.w, 0.0)
    }

    pub fn magnitude(&self) -> f64 {
        self.dot(self).sqrt()
    }

    /// Scales a tuple to unit length.
    ///
    /// # Panics
    ///
    /// Normalizing a zero-length tuple has no meaningful result. Well-formed
    /// scenes never ask for it, so this panics instead of handing back NaNs.
    pub fn normalize(&self) -> Tuple4D {
        let mag = self.magnitude();
        assert!(mag > 0.0, "cannot normalize a zero-length tuple: {:?}", self);

        *self / mag
    }

    pub fn dot(&self, other: &Tuple4D) -> f64 {
        self.x * other.x
            + self.y * other.y
            + self.z * other.z
            + self.w * other.w
    }

    /// Cross product of two vectors. The `w` components are ignored.
    pub fn cross(&self, other: &Tuple4D) -> Tuple4D {
        Tuple4D::vector(
            self.y * other.z - self.z * other.y,
            self.z * other.x - self.x * other.z,
            self.x * other.y - self.y * other.x,
        )
    }

    /// Reflects a vector across a normal: `v - 2 * (v . n) * n`.
    pub fn reflect(&self, normal: &Tuple4D) -> Tuple4D {
        *self - (*normal * 2.0 * self.dot(normal))
    }
}

impl Add for Tuple4D {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Tuple4D::tuple(
            self.x + other.x,
            self.y + other.y,
            self.z + other.z,
            self.w + other.w,
        )
    }
}

impl Sub for Tuple4D {
    type Output = Self;

    fn sub(self, other: Self) -> Self {
        Tuple4D::tuple(
            self.x - other.x,
            self.y - other.y,
            self.z - other.z,
            self.w - other.w,
        )
    }
}

impl Neg for Tuple4D {
    type Output = Self;

    fn neg(self) -> Self {
        Tuple4D::tuple(-self.x, -self.y, -self.z, -self.w)
    }
}

/// Scalar right-multiplication.
///
/// ```
/// use whitted_tracer::tuple::Tuple4D;
///
/// let t = Tuple4D::tuple(1.0, 2.0, 3.0, 4.0);
/// assert_eq!(t * 5.0, Tuple4D::tuple(5.0, 10.0, 15.0, 20.0));
/// ```
impl Mul<f64> for Tuple4D {
    type Output = Self;

    fn mul(self, s: f64) -> Self {
        Tuple4D::tuple(self.x * s, self.y * s, self.z * s, self.w * s)
    }
}

/// Scalar left-multiplication, so that `s * t == t * s`.
impl Mul<Tuple4D> for f64 {
    type Output = Tuple4D;

    fn mul(self, t: Tuple4D) -> Tuple4D {
        t * self
    }
}

impl Div<f64> for Tuple4D {
    type Output = Self;

    fn div(self, s: f64) -> Self {
        Tuple4D::tuple(self.x / s, self.y / s, self.z / s, self.w / s)
    }
}

/* Tests */

#[test]
fn point_and_vector_tags() {
    assert!(Tuple4D::point(4.3, -4.2, 3.1).is_point());
    assert!(!Tuple4D::point(4.3, -4.2, 3.1).is_vector());
    assert!(Tuple4D::vector(4.3, -4.2, 3.1).is_vector());
}

#[test]
fn add_point_and_vector() {
    let p = Tuple4D::point(3.0, -2.0, 5.0);
    let v = Tuple4D::vector(-2.0, 3.0, 1.0);

    let sum = p + v;
    assert_eq!(sum, Tuple4D::point(1.0, 1.0, 6.0));
    assert!(sum.is_point());
}

#[test]
fn sub_points_gives_vector() {
    let p1 = Tuple4D::point(3.0, 2.0, 1.0);
    let p2 = Tuple4D::point(5.0, 6.0, 7.0);

    assert_eq!(p1 - p2, Tuple4D::vector(-2.0, -4.0, -6.0));
}

#[test]
fn sub_vector_from_point() {
    let p = Tuple4D::point(3.0, 2.0, 1.0);
    let v = Tuple4D::vector(5.0, 6.0, 7.0);

    assert_eq!(p - v, Tuple4D::point(-2.0, -4.0, -6.0));
}

#[test]
fn neg_and_scale() {
    let a = Tuple4D::tuple(1.0, -2.0, 3.0, -4.0);

    assert_eq!(-a, Tuple4D::tuple(-1.0, 2.0, -3.0, 4.0));
    assert_eq!(a * 0.5, Tuple4D::tuple(0.5, -1.0, 1.5, -2.0));
    assert_eq!(3.5 * a, Tuple4D::tuple(3.5, -7.0, 10.5, -14.0));
    assert_eq!(a / 2.0, Tuple4D::tuple(0.5, -1.0, 1.5, -2.0));
}

#[test]
fn magnitude_of_vectors() {
    assert_eq!(Tuple4D::vector(0.0, 1.0, 0.0).magnitude(), 1.0);
    assert!(crate::feq(Tuple4D::vector(-1.0, -2.0, -3.0).magnitude(),
        14.0f64.sqrt()));
}

#[test]
fn normalize_gives_unit_length() {
    let vs = [
        Tuple4D::vector(4.0, 0.0, 0.0),
        Tuple4D::vector(1.0, 2.0, 3.0),
        Tuple4D::vector(-0.001, 250.0, 3.5),
    ];

    for v in vs.iter() {
        assert!(crate::feq(v.normalize().magnitude(), 1.0));
    }

    let s = 14.0f64.sqrt();
    assert_eq!(Tuple4D::vector(1.0, 2.0, 3.0).normalize(),
        Tuple4D::vector(1.0 / s, 2.0 / s, 3.0 / s));
}

#[test]
#[should_panic]
fn normalize_zero_vector_panics() {
    Tuple4D::vector(0.0, 0.0, 0.0).normalize();
}

#[test]
fn dot_and_cross() {
    let a = Tuple4D::vector(1.0, 2.0, 3.0);
    let b = Tuple4D::vector(2.0, 3.0, 4.0);

    assert_eq!(a.dot(&b), 20.0);
    assert_eq!(a.cross(&b), Tuple4D::vector(-1.0, 2.0, -1.0));
    assert_eq!(b.cross(&a), Tuple4D::vector(1.0, -2.0, 1.0));
}

#[test]
fn reflect_approaching_at_45() {
    let v = Tuple4D::vector(1.0, -1.0, 0.0);
    let n = Tuple4D::vector(0.0, 1.0, 0.0);

    assert_eq!(v.reflect(&n), Tuple4D::vector(1.0, 1.0, 0.0));
}

#[test]
fn reflect_off_slanted_surface() {
    let v = Tuple4D::vector(0.0, -1.0, 0.0);
    let h = 2.0f64.sqrt() / 2.0;
    let n = Tuple4D::vector(h, h, 0.0);

    assert_eq!(v.reflect(&n), Tuple4D::vector(1.0, 0.0, 0.0));
}
