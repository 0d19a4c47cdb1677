use crate::consts::RECURSION_DEPTH;
use crate::error::{ Result, TracerError };
use crate::ray::Ray4D;
use crate::tuple::Tuple4D;
use crate::matrix::Matrix4D;
use crate::world::World;
use crate::canvas::{ Canvas, write_into_row };
use crate::intersect::Intersections;

/// The eye position, look-at target and up vector a view was built from.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ViewOrientation {
    pub from: Tuple4D,
    pub to: Tuple4D,
    pub up: Tuple4D,
}

/// A camera record for generating a canvas.
///
/// This record gives a "frame" of the world. Based on camera parameters,
/// different perspectives can be produced.
///
/// A camera aimed with `look_at` remembers the triple it was given. Later
/// `orbit` and `pan` calls only accumulate an angle pair and an offset; the
/// view transform is rebuilt from the original triple each time, so repeated
/// motion never drifts.
#[derive(Clone, Debug, PartialEq)]
pub struct Camera {
    /// The horizontal size of the resultant canvas.
    pub hsize: usize,

    /// The vertical size of the resultant canvas.
    pub vsize: usize,

    pub half_width: f64,
    pub half_height: f64,
    pub pixel_size: f64,

    /// The angle describing "how much" the camera can see.
    pub field_of_view: f64,

    /// How the world is oriented relative to the camera (typically a view
    /// transformation), and its inverse.
    transform: Matrix4D,
    inverse: Matrix4D,

    orientation: Option<ViewOrientation>,
    yaw: f64,
    pitch: f64,
    offset: Tuple4D,
}

impl Camera {
    /// Creates a camera at the origin looking down -Z.
    pub fn new(hsize: usize, vsize: usize, field_of_view: f64) -> Camera {
        let half_view = (field_of_view / 2.0).tan();
        let aspect = (hsize as f64) / (vsize as f64);

        let half_width: f64;
        let half_height: f64;

        if aspect >= 1.0 {
            half_width = half_view;
            half_height = half_view / aspect;
        } else {
            half_width = half_view * aspect;
            half_height = half_view;
        }

        let pixel_size = half_width * 2.0 / (hsize as f64);
        Camera {
            hsize,
            vsize,
            half_width,
            half_height,
            pixel_size,
            field_of_view,
            transform: Matrix4D::identity(),
            inverse: Matrix4D::identity(),
            orientation: None,
            yaw: 0.0,
            pitch: 0.0,
            offset: Tuple4D::vector(0.0, 0.0, 0.0),
        }
    }

    pub fn transform(&self) -> &Matrix4D {
        &self.transform
    }

    /// Sets the view transform directly.
    ///
    /// This forgets any orientation stored by `look_at`, so `orbit` and `pan`
    /// fail afterwards until `look_at` is called again.
    pub fn set_transform(&mut self, transform: Matrix4D) -> Result<()> {
        self.assign_transform(transform)?;
        self.orientation = None;
        Ok(())
    }

    fn assign_transform(&mut self, transform: Matrix4D) -> Result<()> {
        self.inverse = transform.inverse()?;
        self.transform = transform;
        Ok(())
    }

    pub fn orientation(&self) -> Option<&ViewOrientation> {
        self.orientation.as_ref()
    }

    /// Aims the camera from `from` at `to`, with `up` roughly overhead.
    ///
    /// Resets any accumulated orbit or pan. A degenerate triple (eye on the
    /// target, or `up` along the line of sight) has no view transform and is
    /// rejected as `SingularMatrix`.
    pub fn look_at(&mut self, from: Tuple4D, to: Tuple4D, up: Tuple4D)
        -> Result<()> {
        let forward = to - from;
        if forward.magnitude() == 0.0 || forward.cross(&up).magnitude() == 0.0 {
            return Err(TracerError::SingularMatrix);
        }

        self.orientation = Some(ViewOrientation { from, to, up });
        self.yaw = 0.0;
        self.pitch = 0.0;
        self.offset = Tuple4D::vector(0.0, 0.0, 0.0);
        self.apply_view()
    }

    /// Swings the eye around the target: `yaw` radians about the up vector,
    /// then `pitch` radians about the camera's horizontal axis. Positive
    /// pitch raises the eye.
    pub fn orbit(&mut self, yaw: f64, pitch: f64) -> Result<()> {
        if self.orientation.is_none() {
            return Err(TracerError::MissingOrientation);
        }

        self.yaw += yaw;
        self.pitch += pitch;
        self.apply_view()
    }

    /// Moves eye and target together by a world-space offset.
    pub fn pan(&mut self, offset: Tuple4D) -> Result<()> {
        if self.orientation.is_none() {
            return Err(TracerError::MissingOrientation);
        }

        self.offset = self.offset + Tuple4D::vector(offset.x, offset.y, offset.z);
        self.apply_view()
    }

    /// Discards all orbit and pan motion, restoring the `look_at` view.
    pub fn reset_view(&mut self) -> Result<()> {
        if self.orientation.is_none() {
            return Err(TracerError::MissingOrientation);
        }

        self.yaw = 0.0;
        self.pitch = 0.0;
        self.offset = Tuple4D::vector(0.0, 0.0, 0.0);
        self.apply_view()
    }

    /// Rebuilds the view transform from the stored triple and the
    /// accumulated motion.
    fn apply_view(&mut self) -> Result<()> {
        let o = self.orientation.ok_or(TracerError::MissingOrientation)?;

        let arm = o.from - o.to;
        let horizontal = o.up.cross(&(o.to - o.from));
        let rotation = Matrix4D::rotation_axis(o.up, self.yaw)
            * Matrix4D::rotation_axis(horizontal, self.pitch);

        let to = o.to + self.offset;
        let from = to + rotation * arm;
        let up = rotation * o.up;

        self.assign_transform(Matrix4D::view_transform(from, to, up))
    }

    /// The world-space ray through the center of pixel `(px, py)`.
    pub fn ray_for_pixel(&self, px: usize, py: usize) -> Ray4D {
        // Offsets from the edge of the canvas to the pixel's center
        let xoffset = (px as f64 + 0.5) * self.pixel_size;
        let yoffset = (py as f64 + 0.5) * self.pixel_size;

        // The untransformed coordinates of the pixel in world space
        let world_x = self.half_width - xoffset;
        let world_y = self.half_height - yoffset;

        // The canvas sits at z = -1 in camera space.
        let pixel = self.inverse * Tuple4D::point(world_x, world_y, -1.0);
        let origin = self.inverse * Tuple4D::origin();
        let direction = (pixel - origin).normalize();

        Ray4D::new(origin, direction)
    }

    /// Traces one scanline into `row`, an RGBA slice of `hsize` pixels.
    ///
    /// `scratch` is reset after every pixel, so nothing from one pixel's
    /// trace survives into the next.
    pub fn render_row<'w>(&self, world: &'w World, y: usize, row: &mut [u8],
        depth: usize, scratch: &mut Intersections<'w>) -> Result<()> {
        for x in 0..self.hsize {
            let ray = self.ray_for_pixel(x, y);
            let color = world.color_at(&ray, depth, scratch);
            scratch.reset();

            write_into_row(row, x, &color?);
        }

        Ok(())
    }

    /// Renders the whole image on the calling thread.
    pub fn render(&self, world: &World) -> Result<Canvas> {
        let mut image = Canvas::new(self.hsize, self.vsize);
        let mut scratch = Intersections::new();

        for (y, row) in image.rows_mut().enumerate() {
            self.render_row(world, y, row, RECURSION_DEPTH, &mut scratch)?;
        }

        Ok(image)
    }
}

#[test]
fn pixel_size_for_horizontal_canvas() {
    let c = Camera::new(200, 125, std::f64::consts::PI / 2.0);

    assert!(crate::feq(c.pixel_size, 0.01));
}

#[test]
fn pixel_size_for_vertical_canvas() {
    let c = Camera::new(125, 200, std::f64::consts::PI / 2.0);

    assert!(crate::feq(c.pixel_size, 0.01));
}

#[test]
fn ray_through_center() {
    let c = Camera::new(201, 101, std::f64::consts::PI / 2.0);
    let r = c.ray_for_pixel(100, 50);

    assert_eq!(r.origin, Tuple4D::point(0.0, 0.0, 0.0));
    assert_eq!(r.direction, Tuple4D::vector(0.0, 0.0, -1.0));
}

#[test]
fn ray_through_corner() {
    let c = Camera::new(201, 101, std::f64::consts::PI / 2.0);
    let r = c.ray_for_pixel(0, 0);

    assert_eq!(r.origin, Tuple4D::point(0.0, 0.0, 0.0));
    assert_eq!(r.direction, Tuple4D::vector(0.66519, 0.33259, -0.66851));
}

#[test]
fn ray_when_camera_transformed() {
    let mut c = Camera::new(201, 101, std::f64::consts::PI / 2.0);
    c.set_transform(Matrix4D::rotation_y(std::f64::consts::PI / 4.0)
        * Matrix4D::translation(0.0, -2.0, 5.0)).unwrap();
    let r = c.ray_for_pixel(100, 50);

    assert_eq!(r.origin, Tuple4D::point(0.0, 2.0, -5.0));
    assert_eq!(r.direction,
        Tuple4D::vector(2.0f64.sqrt() / 2.0, 0.0, -(2.0f64.sqrt() / 2.0)));
}

#[test]
fn render_world_with_camera() {
    let w = crate::world::test_world();
    let mut c = Camera::new(11, 11, std::f64::consts::PI / 2.0);
    c.look_at(
        Tuple4D::point(0.0, 0.0, -5.0),
        Tuple4D::point(0.0, 0.0, 0.0),
        Tuple4D::vector(0.0, 1.0, 0.0),
    ).unwrap();

    let image = c.render(&w).unwrap();

    // (0.38066, 0.47583, 0.2855) scaled to bytes.
    assert_eq!(image.read_pixel(5, 5), Some([97, 121, 73, 255]));
}

#[test]
fn look_at_matches_view_transform() {
    let from = Tuple4D::point(1.0, 3.0, 2.0);
    let to = Tuple4D::point(4.0, -2.0, 8.0);
    let up = Tuple4D::vector(1.0, 1.0, 0.0);

    let mut c = Camera::new(10, 10, 1.0);
    c.look_at(from, to, up).unwrap();

    assert_eq!(*c.transform(), Matrix4D::view_transform(from, to, up));
    assert_eq!(c.orientation(), Some(&ViewOrientation { from, to, up }));
}

#[test]
fn degenerate_look_at_is_rejected() {
    let mut c = Camera::new(10, 10, 1.0);
    let p = Tuple4D::point(0.0, 0.0, -5.0);

    assert!(c.look_at(p, p, Tuple4D::vector(0.0, 1.0, 0.0)).is_err());
    assert!(c.look_at(p, Tuple4D::origin(), Tuple4D::vector(0.0, 0.0, 1.0))
        .is_err());
}

#[test]
fn motion_requires_orientation() {
    let mut c = Camera::new(10, 10, 1.0);

    assert!(matches!(c.orbit(0.1, 0.0), Err(TracerError::MissingOrientation)));
    assert!(matches!(c.pan(Tuple4D::vector(1.0, 0.0, 0.0)),
        Err(TracerError::MissingOrientation)));
    assert!(matches!(c.reset_view(), Err(TracerError::MissingOrientation)));
}

#[cfg(test)]
fn camera_on_negative_z() -> Camera {
    let mut c = Camera::new(11, 11, std::f64::consts::PI / 2.0);
    c.look_at(
        Tuple4D::point(0.0, 0.0, -5.0),
        Tuple4D::origin(),
        Tuple4D::vector(0.0, 1.0, 0.0),
    ).unwrap();
    c
}

#[test]
fn yaw_swings_eye_about_up() {
    let mut c = camera_on_negative_z();
    c.orbit(std::f64::consts::PI / 2.0, 0.0).unwrap();

    assert_eq!(*c.transform(), Matrix4D::view_transform(
        Tuple4D::point(-5.0, 0.0, 0.0),
        Tuple4D::origin(),
        Tuple4D::vector(0.0, 1.0, 0.0),
    ));
}

#[test]
fn positive_pitch_raises_eye() {
    let mut c = camera_on_negative_z();
    c.orbit(0.0, std::f64::consts::PI / 2.0).unwrap();

    let r = c.ray_for_pixel(5, 5);
    assert_eq!(r.origin, Tuple4D::point(0.0, 5.0, 0.0));
    assert_eq!(r.direction, Tuple4D::vector(0.0, -1.0, 0.0));
}

#[test]
fn orbit_accumulates_without_drift() {
    let mut stepped = camera_on_negative_z();
    for _ in 0..8 {
        stepped.orbit(std::f64::consts::PI / 16.0, 0.05).unwrap();
    }

    let mut direct = camera_on_negative_z();
    direct.orbit(std::f64::consts::PI / 2.0, 0.4).unwrap();
    assert_eq!(stepped.transform(), direct.transform());

    for _ in 0..8 {
        stepped.orbit(-std::f64::consts::PI / 16.0, -0.05).unwrap();
    }
    assert_eq!(stepped.transform(), camera_on_negative_z().transform());
}

#[test]
fn pan_moves_eye_and_target() {
    let mut c = camera_on_negative_z();
    c.pan(Tuple4D::vector(1.0, 2.0, 0.0)).unwrap();

    assert_eq!(*c.transform(), Matrix4D::view_transform(
        Tuple4D::point(1.0, 2.0, -5.0),
        Tuple4D::point(1.0, 2.0, 0.0),
        Tuple4D::vector(0.0, 1.0, 0.0),
    ));

    c.orbit(0.3, -0.2).unwrap();
    c.reset_view().unwrap();
    assert_eq!(c.transform(), camera_on_negative_z().transform());
}

#[test]
fn set_transform_forgets_orientation() {
    let mut c = camera_on_negative_z();
    c.set_transform(Matrix4D::identity()).unwrap();

    assert!(c.orientation().is_none());
    assert!(c.orbit(0.1, 0.0).is_err());
}

#[test]
fn rendering_through_a_cone_apex() {
    let mut w = World::new();
    w.add_light(crate::light::PointLight::new(crate::color::Color::white(),
        Tuple4D::point(-10.0, 10.0, -10.0))).unwrap();
    w.add_object(crate::shape::Shape::bounded_cone(-1.0, 1.0, true)).unwrap();

    let mut c = Camera::new(11, 11, std::f64::consts::PI / 2.0);
    c.look_at(Tuple4D::point(0.0, 0.0, -5.0), Tuple4D::origin(),
        Tuple4D::vector(0.0, 1.0, 0.0)).unwrap();

    let image = c.render(&w).unwrap();
    assert_eq!(image.width, 11);
    assert_eq!(image.height, 11);
}
