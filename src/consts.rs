// Runtime defaults
pub const NUM_THREADS: usize = 4;
pub const CANVAS_WIDTH: usize = 400;
pub const CANVAS_HEIGHT: usize = 200;
pub const OUT_FILE: &str = "./out.ppm";

// Floating point comparisons
pub const FEQ_EPSILON: f64 = 0.0001;

// Stand-in for division by a near-zero ray direction component.
pub const LARGE_SENTINEL: f64 = 1.0e10;

// Maximum recursion depth for reflected and refracted rays
pub const RECURSION_DEPTH: usize = 5;

// Per-worker intersection scratch list is shrunk back to this many entries
// whenever a pixel grows it beyond that.
pub const SCRATCH_CAPACITY: usize = 256;

// Common refraction indices
pub const VACUUM_RI: f64 = 1.0;
pub const GLASS_RI: f64 = 1.52;

// Seed for the noise that jitters perturbed patterns
pub const PERTURB_SEED: u32 = 0;
