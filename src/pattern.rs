use lazy_static::lazy_static;
use noise::{ NoiseFn, Perlin, Seedable };

use crate::color::Color;
use crate::consts::PERTURB_SEED;
use crate::error::Result;
use crate::matrix::Matrix4D;
use crate::shape::Shape;
use crate::tuple::Tuple4D;

lazy_static! {
    // One fixed-seed generator, so the same scene always renders the same.
    static ref PERLIN: Perlin = Perlin::new().set_seed(PERTURB_SEED);
}

/// Perlin noise at a point, roughly in `[-1, 1]`.
fn perlin(x: f64, y: f64, z: f64) -> f64 {
    PERLIN.get([x, y, z])
}

/// The kinds of pattern.
///
/// Every non-solid kind composes child patterns, so stripes of checkers of
/// rings are expressible. Each child keeps its own transform, applied on top
/// of its parent's.
#[derive(Clone, Debug, PartialEq)]
pub enum PatternType {
    /// A single flat color everywhere.
    Solid(Color),

    /// Alternates between two patterns with the parity of `floor(x)`.
    Stripe(Box<Pattern>, Box<Pattern>),

    /// Concentric rings around the Y axis; parity of `floor(sqrt(x^2 + z^2))`.
    Ring(Box<Pattern>, Box<Pattern>),

    /// Blends linearly from the first to the second pattern across each unit
    /// of X.
    Gradient(Box<Pattern>, Box<Pattern>),

    /// Like `Gradient`, but across each unit of distance from the Y axis.
    RadialGradient(Box<Pattern>, Box<Pattern>),

    /// 3D checkerboard; parity of `floor(x) + floor(y) + floor(z)`.
    Checker(Box<Pattern>, Box<Pattern>),

    /// The average of two patterns at the same point.
    Blend(Box<Pattern>, Box<Pattern>),

    /// Jitters the lookup point with 3D noise, scaled by the `f64`, before
    /// delegating.
    Perturb(f64, Box<Pattern>),

    /// Six face patterns of a cube, in the order left, front, right, back,
    /// up, down. Each face is sampled at `(u, 0, v)` with `u, v` in `[0, 1)`.
    CubeMap(Box<[Pattern; 6]>),
}

/// A pattern: a color function over space, with its own transform.
#[derive(Clone, Debug, PartialEq)]
pub struct Pattern {
    pub ty: PatternType,

    transform: Matrix4D,
    inverse: Matrix4D,
}

impl From<Color> for Pattern {
    fn from(color: Color) -> Pattern {
        Pattern::solid(color)
    }
}

/// Which face of the unit cube a point is nearest to.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum CubeFace {
    Left,
    Front,
    Right,
    Back,
    Up,
    Down,
}

impl CubeFace {
    /// Picks the face by the largest absolute coordinate and its sign.
    pub fn of(p: &Tuple4D) -> CubeFace {
        let abs_x = p.x.abs();
        let abs_y = p.y.abs();
        let abs_z = p.z.abs();
        let coord = abs_x.max(abs_y).max(abs_z);

        if coord == p.x {
            CubeFace::Right
        } else if coord == -p.x {
            CubeFace::Left
        } else if coord == p.y {
            CubeFace::Up
        } else if coord == -p.y {
            CubeFace::Down
        } else if coord == p.z {
            CubeFace::Front
        } else {
            CubeFace::Back
        }
    }

    /// Index into a `CubeMap`'s face array.
    fn index(self) -> usize {
        match self {
            CubeFace::Left => 0,
            CubeFace::Front => 1,
            CubeFace::Right => 2,
            CubeFace::Back => 3,
            CubeFace::Up => 4,
            CubeFace::Down => 5,
        }
    }

    /// Unfolds a point on this face into `(u, v)` texture coordinates.
    pub fn uv(self, p: &Tuple4D) -> (f64, f64) {
        let wrap = |c: f64| c.rem_euclid(2.0) / 2.0;

        match self {
            CubeFace::Front => (wrap(p.x + 1.0), wrap(p.y + 1.0)),
            CubeFace::Back  => (wrap(1.0 - p.x), wrap(p.y + 1.0)),
            CubeFace::Left  => (wrap(p.z + 1.0), wrap(p.y + 1.0)),
            CubeFace::Right => (wrap(1.0 - p.z), wrap(p.y + 1.0)),
            CubeFace::Up    => (wrap(p.x + 1.0), wrap(1.0 - p.z)),
            CubeFace::Down  => (wrap(p.x + 1.0), wrap(p.z + 1.0)),
        }
    }
}

/// Parity test shared by stripes, rings and checkers.
fn is_even(v: f64) -> bool {
    (v.floor() as i64).rem_euclid(2) == 0
}

impl Pattern {
    fn with_type(ty: PatternType) -> Pattern {
        Pattern {
            ty,
            transform: Matrix4D::identity(),
            inverse: Matrix4D::identity(),
        }
    }

    pub fn solid(color: Color) -> Pattern {
        Self::with_type(PatternType::Solid(color))
    }

    /// Stripes along X.
    ///
    /// ```
    /// # use whitted_tracer::color::Color;
    /// # use whitted_tracer::pattern::Pattern;
    /// # use whitted_tracer::tuple::Tuple4D;
    /// let p = Pattern::stripe(Color::white(), Color::black());
    /// assert_eq!(p.pattern_at(Tuple4D::point(1.5, 0.0, 0.0)), Color::black());
    /// ```
    pub fn stripe<A: Into<Pattern>, B: Into<Pattern>>(a: A, b: B) -> Pattern {
        Self::with_type(PatternType::Stripe(Box::new(a.into()), Box::new(b.into())))
    }

    pub fn ring<A: Into<Pattern>, B: Into<Pattern>>(a: A, b: B) -> Pattern {
        Self::with_type(PatternType::Ring(Box::new(a.into()), Box::new(b.into())))
    }

    pub fn gradient<A: Into<Pattern>, B: Into<Pattern>>(a: A, b: B) -> Pattern {
        Self::with_type(PatternType::Gradient(Box::new(a.into()), Box::new(b.into())))
    }

    pub fn radial_gradient<A: Into<Pattern>, B: Into<Pattern>>(a: A, b: B)
        -> Pattern {
        Self::with_type(
            PatternType::RadialGradient(Box::new(a.into()), Box::new(b.into()))
        )
    }

    pub fn checker<A: Into<Pattern>, B: Into<Pattern>>(a: A, b: B) -> Pattern {
        Self::with_type(PatternType::Checker(Box::new(a.into()), Box::new(b.into())))
    }

    pub fn blend<A: Into<Pattern>, B: Into<Pattern>>(a: A, b: B) -> Pattern {
        Self::with_type(PatternType::Blend(Box::new(a.into()), Box::new(b.into())))
    }

    pub fn perturb<P: Into<Pattern>>(scale: f64, pattern: P) -> Pattern {
        Self::with_type(PatternType::Perturb(scale, Box::new(pattern.into())))
    }

    /// A cube map from six face patterns.
    pub fn cube_map(left: Pattern, front: Pattern, right: Pattern,
        back: Pattern, up: Pattern, down: Pattern) -> Pattern {
        Self::with_type(
            PatternType::CubeMap(Box::new([left, front, right, back, up, down]))
        )
    }

    pub fn transform(&self) -> &Matrix4D {
        &self.transform
    }

    pub fn inverse(&self) -> &Matrix4D {
        &self.inverse
    }

    /// Sets the pattern transform and recomputes its inverse.
    ///
    /// On a singular matrix the pattern is left unchanged.
    pub fn set_transform(&mut self, transform: Matrix4D) -> Result<()> {
        self.inverse = transform.inverse()?;
        self.transform = transform;
        Ok(())
    }

    /// Builder-style `set_transform`.
    pub fn with_transform(mut self, transform: Matrix4D) -> Result<Pattern> {
        self.set_transform(transform)?;
        Ok(self)
    }

    /// Evaluates a child pattern at a point expressed in its parent's space.
    fn sample(&self, parent_point: Tuple4D) -> Color {
        self.pattern_at(self.inverse * parent_point)
    }

    /// The color at a point already in this pattern's own space.
    pub fn pattern_at(&self, p: Tuple4D) -> Color {
        match self.ty {
            PatternType::Solid(c) => c,

            PatternType::Stripe(ref a, ref b) => {
                if is_even(p.x) { a.sample(p) } else { b.sample(p) }
            },

            PatternType::Ring(ref a, ref b) => {
                if is_even((p.x.powi(2) + p.z.powi(2)).sqrt()) {
                    a.sample(p)
                } else {
                    b.sample(p)
                }
            },

            PatternType::Gradient(ref a, ref b) => {
                a.sample(p).lerp(&b.sample(p), p.x - p.x.floor())
            },

            PatternType::RadialGradient(ref a, ref b) => {
                let r = (p.x.powi(2) + p.z.powi(2)).sqrt();
                a.sample(p).lerp(&b.sample(p), r - r.floor())
            },

            PatternType::Checker(ref a, ref b) => {
                if is_even(p.x.floor() + p.y.floor() + p.z.floor()) {
                    a.sample(p)
                } else {
                    b.sample(p)
                }
            },

            PatternType::Blend(ref a, ref b) => {
                Color::average(&a.sample(p), &b.sample(p))
            },

            PatternType::Perturb(scale, ref pattern) => {
                // Offset the z input so each axis gets an independent jitter.
                let jittered = Tuple4D::point(
                    p.x + perlin(p.x, p.y, p.z) * scale,
                    p.y + perlin(p.x, p.y, p.z + 1.0) * scale,
                    p.z + perlin(p.x, p.y, p.z + 2.0) * scale,
                );

                pattern.sample(jittered)
            },

            PatternType::CubeMap(ref faces) => {
                let face = CubeFace::of(&p);
                let (u, v) = face.uv(&p);
                faces[face.index()].sample(Tuple4D::point(u, 0.0, v))
            },
        }
    }

    /// The color of this pattern on `shape` at a world-space point.
    ///
    /// The point goes to the shape's object space first (through every
    /// enclosing group), then into pattern space, so a pattern can be moved
    /// independently of the object it decorates.
    pub fn pattern_at_shape(&self, shape: &Shape, world_point: Tuple4D) -> Color {
        self.sample(shape.world_to_object(world_point))
    }
}

#[cfg(test)]
fn stripes() -> Pattern {
    Pattern::stripe(Color::white(), Color::black())
}

#[test]
fn stripe_is_constant_in_y_and_z() {
    let p = stripes();

    for &(y, z) in [(0.0, 0.0), (1.0, 0.0), (2.0, 0.0), (0.0, 1.0), (0.0, 2.0)].iter() {
        assert_eq!(p.pattern_at(Tuple4D::point(0.0, y, z)), Color::white());
    }
}

#[test]
fn stripe_alternates_in_x() {
    let p = stripes();

    assert_eq!(p.pattern_at(Tuple4D::point( 0.9, 0.0, 0.0)), Color::white());
    assert_eq!(p.pattern_at(Tuple4D::point( 1.0, 0.0, 0.0)), Color::black());
    assert_eq!(p.pattern_at(Tuple4D::point(-0.1, 0.0, 0.0)), Color::black());
    assert_eq!(p.pattern_at(Tuple4D::point(-1.0, 0.0, 0.0)), Color::black());
    assert_eq!(p.pattern_at(Tuple4D::point(-1.1, 0.0, 0.0)), Color::white());
}

#[test]
fn stripes_with_object_transform() {
    let mut s = Shape::sphere();
    s.set_transform(Matrix4D::scaling(2.0, 2.0, 2.0)).unwrap();

    let c = stripes().pattern_at_shape(&s, Tuple4D::point(1.5, 0.0, 0.0));
    assert_eq!(c, Color::white());
}

#[test]
fn stripes_with_pattern_transform() {
    let s = Shape::sphere();
    let p = stripes().with_transform(Matrix4D::scaling(2.0, 2.0, 2.0)).unwrap();

    assert_eq!(p.pattern_at_shape(&s, Tuple4D::point(1.5, 0.0, 0.0)),
        Color::white());
}

#[test]
fn stripes_with_object_and_pattern_transform() {
    let mut s = Shape::sphere();
    s.set_transform(Matrix4D::scaling(2.0, 2.0, 2.0)).unwrap();
    let p = stripes().with_transform(Matrix4D::translation(0.5, 0.0, 0.0))
        .unwrap();

    assert_eq!(p.pattern_at_shape(&s, Tuple4D::point(2.5, 0.0, 0.0)),
        Color::white());
    assert_eq!(p.pattern_at_shape(&s, Tuple4D::point(3.5, 0.0, 0.0)),
        Color::black());
}

#[test]
fn gradient_interpolates_in_x() {
    let p = Pattern::gradient(Color::white(), Color::black());

    assert_eq!(p.pattern_at(Tuple4D::point(0.0, 0.0, 0.0)), Color::white());
    assert_eq!(p.pattern_at(Tuple4D::point(0.25, 0.0, 0.0)),
        Color::rgb(0.75, 0.75, 0.75));
    assert_eq!(p.pattern_at(Tuple4D::point(0.75, 0.0, 0.0)),
        Color::rgb(0.25, 0.25, 0.25));
}

#[test]
fn radial_gradient_follows_distance_from_y_axis() {
    let p = Pattern::radial_gradient(Color::white(), Color::black());

    assert_eq!(p.pattern_at(Tuple4D::point(0.3, 7.0, 0.4)),
        Color::rgb(0.5, 0.5, 0.5));
    assert_eq!(p.pattern_at(Tuple4D::point(0.0, 0.0, 1.25)),
        Color::rgb(0.75, 0.75, 0.75));
}

#[test]
fn ring_extends_in_x_and_z() {
    let p = Pattern::ring(Color::white(), Color::black());

    assert_eq!(p.pattern_at(Tuple4D::point(0.0, 0.0, 0.0)), Color::white());
    assert_eq!(p.pattern_at(Tuple4D::point(1.0, 0.0, 0.0)), Color::black());
    assert_eq!(p.pattern_at(Tuple4D::point(0.0, 0.0, 1.0)), Color::black());
    assert_eq!(p.pattern_at(Tuple4D::point(0.708, 0.0, 0.708)), Color::black());
}

#[test]
fn checkers_repeat_in_each_axis() {
    let p = Pattern::checker(Color::white(), Color::black());

    assert_eq!(p.pattern_at(Tuple4D::point(0.99, 0.0, 0.0)), Color::white());
    assert_eq!(p.pattern_at(Tuple4D::point(1.01, 0.0, 0.0)), Color::black());
    assert_eq!(p.pattern_at(Tuple4D::point(0.0, 1.01, 0.0)), Color::black());
    assert_eq!(p.pattern_at(Tuple4D::point(0.0, 0.0, 1.01)), Color::black());
    assert_eq!(p.pattern_at(Tuple4D::point(1.01, 1.01, 0.0)), Color::white());
}

#[test]
fn nested_patterns_use_child_transforms() {
    let narrow = Pattern::stripe(Color::red(), Color::blue())
        .with_transform(Matrix4D::scaling(0.5, 1.0, 1.0)).unwrap();
    let p = Pattern::checker(narrow, Color::black());

    assert_eq!(p.pattern_at(Tuple4D::point(0.25, 0.0, 0.0)), Color::red());
    assert_eq!(p.pattern_at(Tuple4D::point(0.75, 0.0, 0.0)), Color::blue());
    assert_eq!(p.pattern_at(Tuple4D::point(1.25, 0.0, 0.0)), Color::black());
}

#[test]
fn blend_averages_children() {
    let horizontal = Pattern::stripe(Color::white(), Color::black());
    let vertical = Pattern::stripe(Color::red(), Color::blue())
        .with_transform(Matrix4D::rotation_y(std::f64::consts::PI / 2.0))
        .unwrap();
    let p = Pattern::blend(horizontal, vertical);

    assert_eq!(p.pattern_at(Tuple4D::point(0.5, 0.0, 0.5)),
        Color::rgb(1.0, 0.5, 0.5));
}

#[test]
fn perturb_is_deterministic_and_wobbles() {
    let p = Pattern::perturb(0.8, stripes());
    let plain = stripes();

    let mut differs = false;
    for i in 0..100 {
        let pt = Tuple4D::point(i as f64 * 0.173, 0.31, i as f64 * 0.07);
        assert_eq!(p.pattern_at(pt), p.pattern_at(pt));
        differs |= p.pattern_at(pt) != plain.pattern_at(pt);
    }

    assert!(differs);
}

#[test]
fn zero_scale_perturb_matches_child() {
    let p = Pattern::perturb(0.0, stripes());
    let pt = Tuple4D::point(1.3, 0.2, -0.4);

    assert_eq!(p.pattern_at(pt), stripes().pattern_at(pt));
}

#[test]
fn cube_face_selection() {
    let cases = [
        (Tuple4D::point(-1.0, 0.5, -0.25), CubeFace::Left),
        (Tuple4D::point(1.1, -0.75, 0.8), CubeFace::Right),
        (Tuple4D::point(0.1, 0.6, 0.9), CubeFace::Front),
        (Tuple4D::point(-0.7, 0.0, -2.0), CubeFace::Back),
        (Tuple4D::point(0.5, 1.0, 0.9), CubeFace::Up),
        (Tuple4D::point(-0.2, -1.3, 1.1), CubeFace::Down),
    ];

    for (p, face) in cases.iter() {
        assert_eq!(CubeFace::of(p), *face);
    }
}

#[test]
fn cube_face_uv() {
    let front = CubeFace::Front.uv(&Tuple4D::point(-0.5, 0.5, 1.0));
    assert!(crate::feq(front.0, 0.25) && crate::feq(front.1, 0.75));

    let up = CubeFace::Up.uv(&Tuple4D::point(-0.5, 1.0, -0.5));
    assert!(crate::feq(up.0, 0.25) && crate::feq(up.1, 0.75));
}

#[test]
fn cube_map_picks_face_pattern() {
    let p = Pattern::cube_map(
        Pattern::solid(Color::rgb(1.0, 1.0, 0.0)),
        Pattern::solid(Color::rgb(0.0, 1.0, 1.0)),
        Pattern::solid(Color::red()),
        Pattern::solid(Color::green()),
        Pattern::solid(Color::rgb(1.0, 0.5, 0.0)),
        Pattern::solid(Color::white()),
    );

    assert_eq!(p.pattern_at(Tuple4D::point(-1.0, 0.0, 0.0)),
        Color::rgb(1.0, 1.0, 0.0));
    assert_eq!(p.pattern_at(Tuple4D::point(0.0, 0.0, 1.0)),
        Color::rgb(0.0, 1.0, 1.0));
    assert_eq!(p.pattern_at(Tuple4D::point(1.0, 0.0, 0.0)), Color::red());
    assert_eq!(p.pattern_at(Tuple4D::point(0.0, 0.0, -1.0)), Color::green());
    assert_eq!(p.pattern_at(Tuple4D::point(0.0, 1.0, 0.0)),
        Color::rgb(1.0, 0.5, 0.0));
    assert_eq!(p.pattern_at(Tuple4D::point(0.0, -1.0, 0.0)), Color::white());
}

#[test]
fn singular_pattern_transform_is_rejected() {
    let mut p = stripes();

    assert!(p.set_transform(Matrix4D::scaling(0.0, 1.0, 1.0)).is_err());
    assert_eq!(*p.transform(), Matrix4D::identity());
}

#[test]
fn noise_is_repeatable_and_bounded() {
    for i in 0..50 {
        let (x, y, z) = (i as f64 * 0.37, i as f64 * -0.11, 1.0 + i as f64 * 0.05);
        let n = perlin(x, y, z);

        assert_eq!(n, perlin(x, y, z));
        assert!(n.is_finite() && n.abs() <= 2.0);
    }
}

#[test]
fn perturbed_samples_match_across_copies() {
    let a = Pattern::perturb(0.5, stripes());
    let b = a.clone();
    let pt = Tuple4D::point(0.42, -1.7, 3.3);

    assert_eq!(a.pattern_at(pt), b.pattern_at(pt));
}
