use std::sync::Arc;
use std::sync::atomic::{ AtomicUsize, Ordering };
use std::thread;
use std::time::Instant;

use rayon::prelude::*;

use crate::consts::{ NUM_THREADS, RECURSION_DEPTH };
use crate::error::{ Result, TracerError };
use crate::world::World;
use crate::camera::Camera;
use crate::canvas::Canvas;
use crate::intersect::Intersections;

/// Settings for a parallel render.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct RenderConfig {
    /// Worker threads in the pool. Zero is treated as one.
    pub threads: usize,

    /// Reflection/refraction bounces allowed per camera ray.
    pub depth: usize,
}

impl Default for RenderConfig {
    fn default() -> RenderConfig {
        RenderConfig { threads: NUM_THREADS, depth: RECURSION_DEPTH }
    }
}

/// Renders `world` through `camera` on a fixed-size pool of threads.
///
/// Work is split by scanline: every row belongs to exactly one worker, which
/// writes only that row's slice of the canvas, so the pixel buffer needs no
/// lock. Blocks until every row is done. The first error from any row fails
/// the whole render.
pub fn render(world: &World, camera: &Camera, config: &RenderConfig)
    -> Result<Canvas> {
    let rows_done = AtomicUsize::new(0);
    render_with_progress(world, camera, config, &rows_done)
}

fn render_with_progress(world: &World, camera: &Camera, config: &RenderConfig,
    rows_done: &AtomicUsize) -> Result<Canvas> {
    let mut canvas = Canvas::new(camera.hsize, camera.vsize);
    let stride = canvas.stride();
    if stride == 0 || canvas.height == 0 {
        return Ok(canvas);
    }

    let threads = config.threads.max(1);
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build()?;

    log::info!("Rendering {}x{} on {} threads (depth {})",
        canvas.width, canvas.height, threads, config.depth);
    let start = Instant::now();

    pool.install(|| {
        canvas.as_bytes_mut()
            .par_chunks_mut(stride)
            .enumerate()
            .try_for_each_init(Intersections::new, |scratch, (y, row)| {
                camera.render_row(world, y, row, config.depth, scratch)?;
                rows_done.fetch_add(1, Ordering::Release);
                Ok::<(), TracerError>(())
            })
    })?;

    log::info!("Render finished in {:.2?}", start.elapsed());
    Ok(canvas)
}

/// A render running in the background, started by `spawn`.
///
/// Polling `rows_done` or `is_finished` never blocks; `join` waits for the
/// finished canvas.
#[derive(Debug)]
pub struct RenderHandle {
    rows_done: Arc<AtomicUsize>,
    total_rows: usize,
    thread: thread::JoinHandle<Result<Canvas>>,
}

impl RenderHandle {
    /// Rows completed so far.
    pub fn rows_done(&self) -> usize {
        self.rows_done.load(Ordering::Acquire)
    }

    pub fn total_rows(&self) -> usize {
        self.total_rows
    }

    /// True once every row is rendered, or the render has stopped on an
    /// error (which `join` then reports).
    pub fn is_finished(&self) -> bool {
        self.rows_done() >= self.total_rows || self.thread.is_finished()
    }

    /// Waits for the render and returns the canvas.
    pub fn join(self) -> Result<Canvas> {
        self.thread.join().map_err(|_| TracerError::WorkerPanicked)?
    }
}

/// Starts a parallel render on a background thread and returns at once.
///
/// The scene is shared read-only with the workers for the whole render;
/// there is no way to cancel it part way.
pub fn spawn(world: Arc<World>, camera: Arc<Camera>, config: RenderConfig)
    -> RenderHandle {
    let rows_done = Arc::new(AtomicUsize::new(0));
    let total_rows = camera.vsize;

    let counter = Arc::clone(&rows_done);
    let thread = thread::spawn(move ||
        render_with_progress(&world, &camera, &config, &counter)
    );

    RenderHandle { rows_done, total_rows, thread }
}

#[cfg(test)]
fn small_scene() -> (World, Camera) {
    use crate::tuple::Tuple4D;

    let w = crate::world::test_world();
    let mut c = Camera::new(24, 16, std::f64::consts::PI / 2.0);
    c.look_at(
        Tuple4D::point(0.0, 0.0, -5.0),
        Tuple4D::origin(),
        Tuple4D::vector(0.0, 1.0, 0.0),
    ).unwrap();

    (w, c)
}

#[test]
fn parallel_matches_single_threaded() {
    let (w, c) = small_scene();

    let serial = c.render(&w).unwrap();
    for threads in [1, 3, 8].iter() {
        let config = RenderConfig { threads: *threads, ..Default::default() };
        assert_eq!(render(&w, &c, &config).unwrap(), serial);
    }
}

#[test]
fn zero_threads_still_renders() {
    let (w, c) = small_scene();
    let config = RenderConfig { threads: 0, depth: RECURSION_DEPTH };

    assert_eq!(render(&w, &c, &config).unwrap(), c.render(&w).unwrap());
}

#[test]
fn empty_camera_renders_empty_canvas() {
    let w = crate::world::test_world();
    let c = Camera::new(0, 0, 1.0);
    let canvas = render(&w, &c, &RenderConfig::default()).unwrap();

    assert!(canvas.as_bytes().is_empty());
}

#[test]
fn spawned_render_counts_every_row() {
    let (w, c) = small_scene();
    let expected = c.render(&w).unwrap();

    let handle = spawn(Arc::new(w), Arc::new(c), RenderConfig::default());
    let total = handle.total_rows();
    let canvas = handle.join().unwrap();

    assert_eq!(total, 16);
    assert_eq!(canvas, expected);
}

#[test]
fn spawned_render_reports_finished() {
    let (w, c) = small_scene();
    let handle = spawn(Arc::new(w), Arc::new(c), RenderConfig::default());

    while !handle.is_finished() {
        thread::yield_now();
    }

    assert_eq!(handle.rows_done(), handle.total_rows());
    assert!(handle.join().is_ok());
}
