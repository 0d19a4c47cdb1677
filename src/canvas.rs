use std::io::{ self, Write, BufWriter };
use std::fs::File;
use std::path::Path;

use crate::color::Color;

/// Bytes per pixel: red, green, blue, alpha.
pub const CHANNELS: usize = 4;

/// A pixel buffer holding the results of the ray tracer.
///
/// Pixels are stored row-major, four bytes each (R, G, B, A). Colors are
/// clamped into `0..=255` as they are written, so the canvas never holds an
/// out-of-range value.
///
/// Rows can be handed out as disjoint mutable slices (`rows_mut`), which is
/// how render workers fill the canvas without any locking.
#[derive(Clone, Default, Debug, PartialEq, Eq)]
pub struct Canvas {
    /// The width of the canvas, in pixels.
    pub width: usize,

    /// The height of the canvas, in pixels.
    pub height: usize,

    pixels: Vec<u8>,
}

impl Canvas {
    /// Creates a fully transparent black canvas.
    pub fn new(width: usize, height: usize) -> Canvas {
        Canvas {
            width,
            height,
            pixels: vec![0; width * height * CHANNELS],
        }
    }

    /// Length in bytes of a single row.
    pub fn stride(&self) -> usize {
        self.width * CHANNELS
    }

    /// The raw RGBA bytes, row-major.
    pub fn as_bytes(&self) -> &[u8] {
        &self.pixels
    }

    /// The raw RGBA bytes, mutably. Render workers split this by row.
    pub fn as_bytes_mut(&mut self) -> &mut [u8] {
        &mut self.pixels
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.pixels
    }

    /// Writes a color to a location on the `Canvas`.
    ///
    /// `x` is the column and `y` is the row, both zero-indexed. Out-of-bounds
    /// pixels are silently ignored.
    ///
    /// ```
    /// # use whitted_tracer::color::Color;
    /// # use whitted_tracer::canvas::Canvas;
    /// let mut canvas = Canvas::new(8, 8);
    /// canvas.write_pixel(4, 2, &Color::rgb(1.0, 0.0, 1.0));
    /// assert_eq!(canvas.read_pixel(4, 2), Some([255, 0, 255, 255]));
    /// ```
    pub fn write_pixel(&mut self, x: usize, y: usize, color: &Color) {
        if x >= self.width || y >= self.height {
            return;
        }

        let stride = self.stride();
        write_into_row(&mut self.pixels[y * stride..(y + 1) * stride], x, color);
    }

    /// Reads the RGBA bytes at a location, or `None` when out-of-bounds.
    pub fn read_pixel(&self, x: usize, y: usize) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None
        }

        let i = (y * self.width + x) * CHANNELS;
        let mut px = [0; 4];
        px.copy_from_slice(&self.pixels[i..i + CHANNELS]);
        Some(px)
    }

    /// A mutable view of one scanline.
    pub fn row_mut(&mut self, y: usize) -> Option<&mut [u8]> {
        if y >= self.height {
            return None;
        }

        let stride = self.stride();
        Some(&mut self.pixels[y * stride..(y + 1) * stride])
    }

    /// Every scanline as a disjoint mutable slice, top to bottom.
    pub fn rows_mut(&mut self) -> std::slice::ChunksMut<'_, u8> {
        let stride = self.stride().max(1);
        self.pixels.chunks_mut(stride)
    }

    /// Writes the canvas as a plain PPM (P3) image.
    ///
    /// Alpha is dropped. No output line exceeds 70 columns; a value that would
    /// cross the limit starts a new line instead.
    pub fn write_ppm<W: Write>(&self, out: &mut W) -> io::Result<()> {
        writeln!(out, "P3")?;
        writeln!(out, "{} {}", self.width, self.height)?;
        writeln!(out, "255")?;

        for row in self.pixels.chunks(self.stride().max(1)) {
            let mut col = 0;
            for px in row.chunks(CHANNELS) {
                for value in &px[..3] {
                    let s = value.to_string();
                    if col != 0 && col + 1 + s.len() > 70 {
                        writeln!(out)?;
                        col = 0;
                    }

                    if col != 0 {
                        write!(out, " ")?;
                        col += 1;
                    }

                    write!(out, "{}", s)?;
                    col += s.len();
                }
            }

            writeln!(out)?;
        }

        Ok(())
    }

    /// Saves the canvas to a PPM file at `path`.
    pub fn save_ppm<P: AsRef<Path>>(&self, path: P) -> io::Result<()> {
        let mut out = BufWriter::new(File::create(path)?);
        self.write_ppm(&mut out)?;
        out.flush()
    }
}

/// Writes `color` at column `x` of a single RGBA scanline.
pub fn write_into_row(row: &mut [u8], x: usize, color: &Color) {
    let i = x * CHANNELS;
    if i + CHANNELS <= row.len() {
        row[i..i + CHANNELS].copy_from_slice(&color.to_rgba8());
    }
}

#[test]
fn new_canvas_is_zeroed() {
    let c = Canvas::new(10, 20);

    assert_eq!(c.as_bytes().len(), 10 * 20 * 4);
    assert!(c.as_bytes().iter().all(|&b| b == 0));
}

#[test]
fn write_pixel_clamps_and_ignores_out_of_bounds() {
    let mut c = Canvas::new(5, 3);
    c.write_pixel(0, 0, &Color::rgb(1.5, 0.0, 0.0));
    c.write_pixel(2, 1, &Color::rgb(0.0, 0.5, 0.0));
    c.write_pixel(4, 2, &Color::rgb(-0.5, 0.0, 1.0));
    c.write_pixel(5, 0, &Color::white());

    assert_eq!(c.read_pixel(0, 0), Some([255, 0, 0, 255]));
    assert_eq!(c.read_pixel(2, 1), Some([0, 128, 0, 255]));
    assert_eq!(c.read_pixel(4, 2), Some([0, 0, 255, 255]));
    assert_eq!(c.read_pixel(5, 0), None);
}

#[test]
fn rows_are_disjoint_scanlines() {
    let mut c = Canvas::new(3, 4);
    for (y, row) in c.rows_mut().enumerate() {
        write_into_row(row, 1, &Color::rgb(y as f64 / 3.0, 0.0, 0.0));
    }

    assert_eq!(c.read_pixel(1, 0), Some([0, 0, 0, 255]));
    assert_eq!(c.read_pixel(1, 3), Some([255, 0, 0, 255]));
    assert_eq!(c.read_pixel(0, 3), Some([0, 0, 0, 0]));
}

#[test]
fn ppm_header_and_pixel_data() {
    let mut c = Canvas::new(5, 3);
    c.write_pixel(0, 0, &Color::rgb(1.5, 0.0, 0.0));
    c.write_pixel(2, 1, &Color::rgb(0.0, 0.5, 0.0));
    c.write_pixel(4, 2, &Color::rgb(-0.5, 0.0, 1.0));

    let mut out = Vec::new();
    c.write_ppm(&mut out).unwrap();
    let text = String::from_utf8(out).unwrap();
    let lines: Vec<&str> = text.lines().collect();

    assert_eq!(lines[0], "P3");
    assert_eq!(lines[1], "5 3");
    assert_eq!(lines[2], "255");
    assert_eq!(lines[3], "255 0 0 0 0 0 0 0 0 0 0 0 0 0 0");
    assert_eq!(lines[4], "0 0 0 0 0 0 0 128 0 0 0 0 0 0 0");
    assert_eq!(lines[5], "0 0 0 0 0 0 0 0 0 0 0 0 0 0 255");
    assert!(text.ends_with('\n'));
}

#[test]
fn ppm_lines_wrap_at_70_columns() {
    let mut c = Canvas::new(10, 2);
    for y in 0..2 {
        for x in 0..10 {
            c.write_pixel(x, y, &Color::rgb(1.0, 0.8, 0.6));
        }
    }

    let mut out = Vec::new();
    c.write_ppm(&mut out).unwrap();
    let text = String::from_utf8(out).unwrap();

    assert!(text.lines().all(|l| l.len() <= 70));
    assert_eq!(text.lines().nth(3).unwrap(),
        "255 204 153 255 204 153 255 204 153 255 204 153 255 204 153 255 204");
}
