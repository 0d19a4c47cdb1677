use crate::consts::RECURSION_DEPTH;
use crate::error::Result;
use crate::world::World;
use crate::camera::Camera;
use crate::canvas::Canvas;
use crate::intersect::Intersections;

/// A render that fills its canvas a few rows at a time.
///
/// Meant for interactive callers that want to show a partial image between
/// batches. Rows are rendered top to bottom on the calling thread. The scene
/// may change between batches; rows already drawn are not redrawn unless the
/// render is restarted.
#[derive(Clone, Debug)]
pub struct IncrementalRender {
    canvas: Canvas,
    next_row: usize,
    depth: usize,
}

impl IncrementalRender {
    /// Starts an empty render sized for `camera`.
    pub fn new(camera: &Camera) -> IncrementalRender {
        IncrementalRender::with_depth(camera, RECURSION_DEPTH)
    }

    pub fn with_depth(camera: &Camera, depth: usize) -> IncrementalRender {
        IncrementalRender {
            canvas: Canvas::new(camera.hsize, camera.vsize),
            next_row: 0,
            depth,
        }
    }

    /// Renders up to `rows` more scanlines.
    ///
    /// Returns `true` once the whole canvas is done. If a row fails, the
    /// cursor stays on that row so a retry starts from it again.
    pub fn render_rows(&mut self, world: &World, camera: &Camera, rows: usize)
        -> Result<bool> {
        let end = self.next_row.saturating_add(rows).min(self.canvas.height);
        let mut scratch = Intersections::new();

        while self.next_row < end {
            let y = self.next_row;
            if let Some(row) = self.canvas.row_mut(y) {
                camera.render_row(world, y, row, self.depth, &mut scratch)?;
            }
            self.next_row += 1;
        }

        log::debug!("Rendered {}/{} rows", self.next_row, self.canvas.height);
        Ok(self.is_finished())
    }

    pub fn rows_done(&self) -> usize {
        self.next_row
    }

    pub fn total_rows(&self) -> usize {
        self.canvas.height
    }

    pub fn is_finished(&self) -> bool {
        self.next_row >= self.canvas.height
    }

    /// Starts over from the top row, resizing for `camera` if needed.
    pub fn restart(&mut self, camera: &Camera) {
        if self.canvas.width != camera.hsize
            || self.canvas.height != camera.vsize {
            self.canvas = Canvas::new(camera.hsize, camera.vsize);
        }

        self.next_row = 0;
    }

    /// The image so far. Rows not yet rendered are transparent black.
    pub fn canvas(&self) -> &Canvas {
        &self.canvas
    }

    pub fn into_canvas(self) -> Canvas {
        self.canvas
    }
}

#[cfg(test)]
fn small_scene() -> (World, Camera) {
    use crate::tuple::Tuple4D;

    let w = crate::world::test_world();
    let mut c = Camera::new(11, 7, std::f64::consts::PI / 2.0);
    c.look_at(
        Tuple4D::point(0.0, 0.0, -5.0),
        Tuple4D::origin(),
        Tuple4D::vector(0.0, 1.0, 0.0),
    ).unwrap();

    (w, c)
}

#[test]
fn batches_add_up_to_full_render() {
    let (w, c) = small_scene();
    let mut r = IncrementalRender::new(&c);

    assert!(!r.render_rows(&w, &c, 3).unwrap());
    assert_eq!(r.rows_done(), 3);
    assert!(!r.render_rows(&w, &c, 3).unwrap());
    assert!(r.render_rows(&w, &c, 3).unwrap());
    assert_eq!(r.rows_done(), r.total_rows());

    assert_eq!(r.into_canvas(), c.render(&w).unwrap());
}

#[test]
fn unrendered_rows_stay_blank() {
    let (w, c) = small_scene();
    let mut r = IncrementalRender::new(&c);
    r.render_rows(&w, &c, 1).unwrap();

    assert_eq!(r.canvas().read_pixel(5, 0).map(|p| p[3]), Some(255));
    assert_eq!(r.canvas().read_pixel(5, 1), Some([0, 0, 0, 0]));
}

#[test]
fn zero_row_batch_is_a_no_op() {
    let (w, c) = small_scene();
    let mut r = IncrementalRender::new(&c);

    assert!(!r.render_rows(&w, &c, 0).unwrap());
    assert_eq!(r.rows_done(), 0);
}

#[test]
fn finished_render_ignores_more_batches() {
    let (w, c) = small_scene();
    let mut r = IncrementalRender::new(&c);

    assert!(r.render_rows(&w, &c, 100).unwrap());
    assert!(r.render_rows(&w, &c, 5).unwrap());
    assert_eq!(r.rows_done(), 7);
}

#[test]
fn restart_picks_up_new_camera_size() {
    let (w, mut c) = small_scene();
    let mut r = IncrementalRender::new(&c);
    r.render_rows(&w, &c, 100).unwrap();

    c = Camera::new(4, 3, c.field_of_view);
    r.restart(&c);

    assert_eq!(r.rows_done(), 0);
    assert_eq!(r.total_rows(), 3);
    assert_eq!(r.canvas().width, 4);
}

#[test]
fn unbounded_batch_finishes_the_rest() {
    let (w, c) = small_scene();
    let mut r = IncrementalRender::new(&c);

    assert!(!r.render_rows(&w, &c, 2).unwrap());
    assert!(r.render_rows(&w, &c, usize::MAX).unwrap());
    assert_eq!(r.rows_done(), 7);
    assert!(r.is_finished());
}
