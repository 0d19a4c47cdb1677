use crate::consts::{ FEQ_EPSILON, SCRATCH_CAPACITY, VACUUM_RI };
use crate::error::Result;
use crate::tuple::Tuple4D;
use crate::ray::Ray4D;
use crate::shape::Shape;

/// An intersection.
///
/// Some ray hit the shape `what` at offset `t` along its direction. `t` is
/// the same in world space and in the shape's local space, because rays are
/// transformed without renormalizing their direction.
#[derive(Copy, Clone, Debug)]
pub struct Intersection<'a> {
    pub t: f64,
    pub what: &'a Shape,
}

/// Two intersections are equal if their offsets match and they refer to the
/// very same shape (pointer equality).
impl<'a> PartialEq for Intersection<'a> {
    fn eq(&self, other: &Intersection<'a>) -> bool {
        self.t == other.t && std::ptr::eq(self.what, other.what)
    }
}

impl<'a> Intersection<'a> {
    pub fn new(t: f64, what: &'a Shape) -> Intersection<'a> {
        Intersection { t, what }
    }
}

/// A collection of intersections.
///
/// Render workers keep one of these per thread as scratch space: it is filled
/// while tracing a pixel and `reset` before the next one, so its allocation is
/// reused instead of churned. Growth goes through `try_reserve`, so running
/// out of memory mid-render surfaces as an error rather than an abort.
#[derive(Clone, Debug, Default)]
pub struct Intersections<'a> {
    pub intersections: Vec<Intersection<'a>>,
}

impl<'a> Intersections<'a> {
    pub fn new() -> Intersections<'a> {
        Intersections { intersections: Vec::new() }
    }

    /// Creates an empty list with room for `capacity` intersections.
    pub fn with_capacity(capacity: usize) -> Result<Intersections<'a>> {
        let mut intersections = Vec::new();
        intersections.try_reserve(capacity)?;

        Ok(Intersections { intersections })
    }

    /// Appends an intersection, failing if the list cannot grow.
    pub fn push(&mut self, i: Intersection<'a>) -> Result<()> {
        self.intersections.try_reserve(1)?;
        self.intersections.push(i);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.intersections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.intersections.is_empty()
    }

    /// Sorts the intersections by ascending `t`.
    ///
    /// A NaN offset compares equal to everything, so its final position is
    /// unspecified; `hit` drops such offsets before sorting.
    pub fn sort(&mut self) {
        self.intersections.sort_by(|a, b|
            a.t.partial_cmp(&b.t).unwrap_or(std::cmp::Ordering::Equal)
        );
    }

    /// The visible intersection: the lowest non-negative `t`.
    ///
    /// Non-finite offsets are dropped and the list is left sorted.
    pub fn hit(&mut self) -> Option<Intersection<'a>> {
        self.intersections.retain(|i| i.t.is_finite());
        self.sort();

        self.intersections.iter().find(|i| i.t >= 0.0).copied()
    }

    pub fn clear(&mut self) {
        self.intersections.clear();
    }

    /// Clears the list for reuse on the next pixel.
    ///
    /// A pathological pixel can grow the list far past its usual size; in
    /// that case the excess is released so a worker's memory stays bounded.
    pub fn reset(&mut self) {
        self.intersections.clear();
        if self.intersections.capacity() > SCRATCH_CAPACITY {
            self.intersections.shrink_to(SCRATCH_CAPACITY);
        }
    }

    pub fn capacity(&self) -> usize {
        self.intersections.capacity()
    }
}

/// A record for computations associated with an `Intersection`.
///
/// Everything shading needs about a hit, computed once.
#[derive(Clone, Debug)]
pub struct IntersectionComputation<'a> {
    /// The "time" of the ray intersection.
    pub t: f64,

    /// The object being intersected.
    pub obj: &'a Shape,

    /// The point where the intersection occurs.
    pub point: Tuple4D,

    /// A point slightly above the intersected surface. Shadow and reflection
    /// rays start here so the surface cannot shadow itself ("acne").
    pub over_point: Tuple4D,

    /// A point slightly below the intersected surface, where refracted rays
    /// start.
    pub under_point: Tuple4D,

    pub eyev: Tuple4D,

    /// The surface normal, flipped to face the eye when the hit is inside.
    pub normalv: Tuple4D,

    /// The incoming ray, reflected across the normal.
    pub reflectv: Tuple4D,

    /// Whether the ray hit the surface from inside the object.
    pub inside: bool,

    /// The refractive index of the medium being exited.
    pub n1: f64,

    /// The refractive index of the medium being entered.
    pub n2: f64,
}

impl<'a> IntersectionComputation<'a> {
    /// Precomputes shading state for `hit` along `r`.
    ///
    /// Refractive indices come from the hit object alone: entering an object
    /// goes from vacuum into its material, leaving it goes back to vacuum.
    /// Nested transparent volumes are not tracked.
    pub fn new(r: &Ray4D, hit: &Intersection<'a>) -> IntersectionComputation<'a> {
        let t = hit.t;
        let obj = hit.what;
        let point = r.position(t);
        let eyev = -r.direction;
        let mut normalv = obj.normal_at(point);

        let inside = if normalv.dot(&eyev) < 0.0 {
            normalv = -normalv;
            true
        } else {
            false
        };

        let over_point = point + normalv * FEQ_EPSILON;
        let under_point = point - normalv * FEQ_EPSILON;
        let reflectv = r.direction.reflect(&normalv);

        let index = obj.material.refractive_index;
        let (n1, n2) = if inside {
            (index, VACUUM_RI)
        } else {
            (VACUUM_RI, index)
        };

        IntersectionComputation {
            t, obj,
            point, over_point, under_point,
            eyev, normalv, reflectv,
            inside,
            n1, n2,
        }
    }

    /// The direction of the refracted ray by Snell's law, or `None` under
    /// total internal reflection.
    pub fn refracted_direction(&self) -> Option<Tuple4D> {
        let n_ratio = self.n1 / self.n2;
        let cos_i = self.eyev.dot(&self.normalv);
        let sin2_t = n_ratio.powi(2) * (1.0 - cos_i.powi(2));

        if sin2_t > 1.0 {
            return None;
        }

        let cos_t = (1.0 - sin2_t).sqrt();
        Some(self.normalv * (n_ratio * cos_i - cos_t) - self.eyev * n_ratio)
    }
}

#[test]
fn hit_with_all_positive() {
    let s = Shape::sphere();
    let i1 = Intersection::new(1.0, &s);
    let i2 = Intersection::new(2.0, &s);
    let mut xs = Intersections { intersections: vec![i2, i1] };

    assert_eq!(xs.hit(), Some(i1));
}

#[test]
fn hit_with_some_negative() {
    let s = Shape::sphere();
    let i1 = Intersection::new(-1.0, &s);
    let i2 = Intersection::new(1.0, &s);
    let mut xs = Intersections { intersections: vec![i2, i1] };

    assert_eq!(xs.hit(), Some(i2));
}

#[test]
fn hit_with_all_negative() {
    let s = Shape::sphere();
    let mut xs = Intersections {
        intersections: vec![
            Intersection::new(-2.0, &s),
            Intersection::new(-1.0, &s),
        ]
    };

    assert_eq!(xs.hit(), None);
    assert_eq!(Intersections::new().hit(), None);
}

#[test]
fn hit_is_lowest_nonnegative() {
    let s = Shape::sphere();
    let i4 = Intersection::new(2.0, &s);
    let mut xs = Intersections {
        intersections: vec![
            Intersection::new(5.0, &s),
            Intersection::new(7.0, &s),
            Intersection::new(-3.0, &s),
            i4,
            Intersection::new(std::f64::NAN, &s),
        ]
    };

    assert_eq!(xs.hit(), Some(i4));
    assert_eq!(xs.len(), 4);
    assert_eq!(xs.intersections[0].t, -3.0);
}

#[test]
fn intersections_with_same_t_on_different_shapes_differ() {
    let a = Shape::sphere();
    let b = Shape::sphere();

    assert_ne!(Intersection::new(1.0, &a), Intersection::new(1.0, &b));
}

#[test]
fn reset_keeps_capacity_within_bound() {
    let s = Shape::sphere();
    let mut xs = Intersections::new();
    for i in 0..(SCRATCH_CAPACITY * 4) {
        xs.push(Intersection::new(i as f64, &s)).unwrap();
    }

    xs.reset();
    assert!(xs.is_empty());
    assert!(xs.capacity() <= SCRATCH_CAPACITY);

    xs.push(Intersection::new(1.0, &s)).unwrap();
    xs.reset();
    assert!(xs.capacity() > 0);
}

#[test]
fn precompute_outside_intersection() {
    let r = Ray4D::new(Tuple4D::point(0.0, 0.0, -5.0),
                       Tuple4D::vector(0.0, 0.0, 1.0));
    let s = Shape::sphere();
    let i = Intersection::new(4.0, &s);
    let comps = IntersectionComputation::new(&r, &i);

    assert_eq!(comps.t, 4.0);
    assert!(std::ptr::eq(comps.obj, &s));
    assert_eq!(comps.point, Tuple4D::point(0.0, 0.0, -1.0));
    assert_eq!(comps.eyev, Tuple4D::vector(0.0, 0.0, -1.0));
    assert_eq!(comps.normalv, Tuple4D::vector(0.0, 0.0, -1.0));
    assert!(!comps.inside);
}

#[test]
fn precompute_inside_intersection() {
    let r = Ray4D::new(Tuple4D::point(0.0, 0.0, 0.0),
                       Tuple4D::vector(0.0, 0.0, 1.0));
    let s = Shape::sphere();
    let i = Intersection::new(1.0, &s);
    let comps = IntersectionComputation::new(&r, &i);

    assert_eq!(comps.point, Tuple4D::point(0.0, 0.0, 1.0));
    assert_eq!(comps.eyev, Tuple4D::vector(0.0, 0.0, -1.0));
    assert!(comps.inside);
    assert_eq!(comps.normalv, Tuple4D::vector(0.0, 0.0, -1.0));
}

#[test]
fn over_and_under_points_straddle_surface() {
    use crate::matrix::Matrix4D;

    let r = Ray4D::new(Tuple4D::point(0.0, 0.0, -5.0),
                       Tuple4D::vector(0.0, 0.0, 1.0));
    let mut s = Shape::sphere();
    s.set_transform(Matrix4D::translation(0.0, 0.0, 1.0)).unwrap();
    let i = Intersection::new(5.0, &s);
    let comps = IntersectionComputation::new(&r, &i);

    assert!(comps.over_point.z < -FEQ_EPSILON / 2.0);
    assert!(comps.point.z > comps.over_point.z);
    assert!(comps.under_point.z > FEQ_EPSILON / 2.0);
    assert!(comps.point.z < comps.under_point.z);
}

#[test]
fn precompute_reflection_vector() {
    use crate::matrix::Matrix4D;

    let mut p = Shape::plane();
    p.set_transform(Matrix4D::identity()).unwrap();
    let h = 2.0f64.sqrt() / 2.0;
    let r = Ray4D::new(Tuple4D::point(0.0, 1.0, -1.0),
                       Tuple4D::vector(0.0, -h, h));
    let i = Intersection::new(2.0f64.sqrt(), &p);
    let comps = IntersectionComputation::new(&r, &i);

    assert_eq!(comps.reflectv, Tuple4D::vector(0.0, h, h));
}

#[test]
fn refractive_indices_follow_inside_flag() {
    let mut s = Shape::sphere();
    s.material.refractive_index = 1.5;

    let entering = Ray4D::new(Tuple4D::point(0.0, 0.0, -5.0),
                              Tuple4D::vector(0.0, 0.0, 1.0));
    let comps = IntersectionComputation::new(&entering, &Intersection::new(4.0, &s));
    assert_eq!((comps.n1, comps.n2), (1.0, 1.5));

    let leaving = Ray4D::new(Tuple4D::point(0.0, 0.0, 0.0),
                             Tuple4D::vector(0.0, 0.0, 1.0));
    let comps = IntersectionComputation::new(&leaving, &Intersection::new(1.0, &s));
    assert_eq!((comps.n1, comps.n2), (1.5, 1.0));
}

#[test]
fn total_internal_reflection_has_no_direction() {
    let mut s = Shape::sphere();
    s.material.refractive_index = 1.5;

    let h = 2.0f64.sqrt() / 2.0;
    let r = Ray4D::new(Tuple4D::point(0.0, 0.0, h),
                       Tuple4D::vector(0.0, 1.0, 0.0));
    let comps = IntersectionComputation::new(&r, &Intersection::new(h, &s));

    assert!(comps.inside);
    assert_eq!(comps.refracted_direction(), None);
}

#[test]
fn straight_on_refraction_keeps_direction() {
    let mut s = Shape::sphere();
    s.material.refractive_index = 1.5;

    let r = Ray4D::new(Tuple4D::point(0.0, 0.0, -5.0),
                       Tuple4D::vector(0.0, 0.0, 1.0));
    let comps = IntersectionComputation::new(&r, &Intersection::new(4.0, &s));

    assert_eq!(comps.refracted_direction(),
        Some(Tuple4D::vector(0.0, 0.0, 1.0)));
}

#[test]
fn sorting_tolerates_nan_offsets() {
    let s = Shape::sphere();
    let mut xs = Intersections::new();
    for &t in [3.0, f64::NAN, -1.0, 2.0, f64::NAN].iter() {
        xs.push(Intersection::new(t, &s)).unwrap();
    }

    xs.sort();
    assert_eq!(xs.len(), 5);

    let hit = xs.hit().unwrap();
    assert_eq!(hit.t, 2.0);
    assert_eq!(xs.len(), 3);
}
