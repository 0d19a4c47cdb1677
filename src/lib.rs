pub mod consts;
pub mod error;

pub mod tuple;
pub mod matrix;
pub mod ray;

pub mod color;
pub mod canvas;

pub mod pattern;
pub mod light;

pub mod bounds;
pub mod intersect;
pub mod shape;

pub mod world;
pub mod camera;
pub mod parallel;
pub mod incremental;

pub mod scene;
pub mod obj;

pub use error::{ Result, TracerError };

use consts::FEQ_EPSILON;

/// Approximate floating point equality, within `FEQ_EPSILON`.
pub fn feq(left: f64, right: f64) -> bool {
    (left - right).abs() < FEQ_EPSILON
}
