use crate::consts::FEQ_EPSILON;
use crate::tuple::Tuple4D;
use crate::matrix::Matrix4D;
use crate::ray::Ray4D;

/// An axis-aligned bounding box.
///
/// Planes and uncapped cylinders extend forever, so either corner may hold
/// infinite components. An empty box has `minimum > maximum` on every axis
/// and is never hit.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Bounds {
    pub minimum: Tuple4D,
    pub maximum: Tuple4D,
}

impl Default for Bounds {
    fn default() -> Bounds {
        Bounds::empty()
    }
}

impl Bounds {
    pub fn new(min_x: f64, min_y: f64, min_z: f64,
        max_x: f64, max_y: f64, max_z: f64) -> Bounds {
        Bounds {
            minimum: Tuple4D::point(min_x, min_y, min_z),
            maximum: Tuple4D::point(max_x, max_y, max_z),
        }
    }

    /// A box containing nothing. Adding any point to it yields that point.
    pub fn empty() -> Bounds {
        let inf = std::f64::INFINITY;
        Bounds::new(inf, inf, inf, -inf, -inf, -inf)
    }

    /// A box containing all of space.
    pub fn infinite() -> Bounds {
        let inf = std::f64::INFINITY;
        Bounds::new(-inf, -inf, -inf, inf, inf, inf)
    }

    pub fn is_empty(&self) -> bool {
        self.minimum.x > self.maximum.x
            || self.minimum.y > self.maximum.y
            || self.minimum.z > self.maximum.z
    }

    /// Grows the box to include `p`.
    pub fn add_point(&mut self, p: &Tuple4D) {
        self.minimum.x = self.minimum.x.min(p.x);
        self.minimum.y = self.minimum.y.min(p.y);
        self.minimum.z = self.minimum.z.min(p.z);
        self.maximum.x = self.maximum.x.max(p.x);
        self.maximum.y = self.maximum.y.max(p.y);
        self.maximum.z = self.maximum.z.max(p.z);
    }

    /// Grows the box to include another box.
    pub fn merge(&mut self, other: &Bounds) {
        if other.is_empty() {
            return;
        }

        self.add_point(&other.minimum);
        self.add_point(&other.maximum);
    }

    pub fn contains_point(&self, p: &Tuple4D) -> bool {
        self.minimum.x <= p.x && p.x <= self.maximum.x
            && self.minimum.y <= p.y && p.y <= self.maximum.y
            && self.minimum.z <= p.z && p.z <= self.maximum.z
    }

    /// Transforms the box by `m`, returning a new axis-aligned box around the
    /// eight transformed corners.
    ///
    /// A box with any infinite extent cannot be transformed meaningfully
    /// (infinity times zero is NaN), so it stays infinite.
    pub fn transform(&self, m: &Matrix4D) -> Bounds {
        if self.is_empty() {
            return *self;
        }

        let finite = [self.minimum, self.maximum].iter()
            .all(|c| c.x.is_finite() && c.y.is_finite() && c.z.is_finite());
        if !finite {
            return Bounds::infinite();
        }

        let (lo, hi) = (self.minimum, self.maximum);
        let corners = [
            Tuple4D::point(lo.x, lo.y, lo.z),
            Tuple4D::point(lo.x, lo.y, hi.z),
            Tuple4D::point(lo.x, hi.y, lo.z),
            Tuple4D::point(lo.x, hi.y, hi.z),
            Tuple4D::point(hi.x, lo.y, lo.z),
            Tuple4D::point(hi.x, lo.y, hi.z),
            Tuple4D::point(hi.x, hi.y, lo.z),
            Tuple4D::point(hi.x, hi.y, hi.z),
        ];

        let mut out = Bounds::empty();
        for corner in corners.iter() {
            out.add_point(&(*m * *corner));
        }

        out
    }

    /// Gets the entry and exit offsets of a ray along one axis of a box
    /// spanning `min..max` on that axis.
    ///
    /// A direction with no component along the axis yields infinite offsets,
    /// signed by which side of the slab the origin sits. The smaller `t` comes
    /// first.
    pub fn check_axis(min: f64, max: f64, origin: f64, direction: f64)
        -> (f64, f64) {
        let tmin_numerator = min - origin;
        let tmax_numerator = max - origin;

        let (tmin, tmax) = if direction.abs() >= FEQ_EPSILON {
            (tmin_numerator / direction, tmax_numerator / direction)
        } else {
            (Self::signed_infinity(tmin_numerator),
             Self::signed_infinity(tmax_numerator))
        };

        if tmin > tmax {
            (tmax, tmin)
        } else {
            (tmin, tmax)
        }
    }

    /// Infinity carrying the sign of `numerator`. A zero numerator (origin on
    /// the slab face) counts as positive.
    fn signed_infinity(numerator: f64) -> f64 {
        if numerator < 0.0 {
            -std::f64::INFINITY
        } else {
            std::f64::INFINITY
        }
    }

    /// Slab test: does the ray pass through this box?
    pub fn intersects(&self, ray: &Ray4D) -> bool {
        if self.is_empty() {
            return false;
        }

        let (xtmin, xtmax) = Self::check_axis(
            self.minimum.x, self.maximum.x, ray.origin.x, ray.direction.x
        );
        let (ytmin, ytmax) = Self::check_axis(
            self.minimum.y, self.maximum.y, ray.origin.y, ray.direction.y
        );
        let (ztmin, ztmax) = Self::check_axis(
            self.minimum.z, self.maximum.z, ray.origin.z, ray.direction.z
        );

        let tmin = xtmin.max(ytmin).max(ztmin);
        let tmax = xtmax.min(ytmax).min(ztmax);

        // NaN only arises from infinite slabs, which the ray cannot miss.
        !(tmin > tmax)
    }
}

#[test]
fn adding_points_to_empty_bounds() {
    let mut b = Bounds::empty();
    assert!(b.is_empty());

    b.add_point(&Tuple4D::point(-5.0, 2.0, 0.0));
    b.add_point(&Tuple4D::point(7.0, 0.0, -3.0));

    assert_eq!(b, Bounds::new(-5.0, 0.0, -3.0, 7.0, 2.0, 0.0));
}

#[test]
fn merging_boxes() {
    let mut b = Bounds::new(-5.0, -2.0, 0.0, 7.0, 4.0, 4.0);
    b.merge(&Bounds::new(8.0, -7.0, -2.0, 14.0, 2.0, 8.0));
    b.merge(&Bounds::empty());

    assert_eq!(b, Bounds::new(-5.0, -7.0, -2.0, 14.0, 4.0, 8.0));
}

#[test]
fn rotated_box_is_rebounded() {
    let b = Bounds::new(-1.0, -1.0, -1.0, 1.0, 1.0, 1.0);
    let m = Matrix4D::rotation_x(std::f64::consts::PI / 4.0)
        * Matrix4D::rotation_y(std::f64::consts::PI / 4.0);
    let t = b.transform(&m);

    assert_eq!(t.minimum, Tuple4D::point(-1.41421, -1.70710, -1.70710));
    assert_eq!(t.maximum, Tuple4D::point(1.41421, 1.70710, 1.70710));
}

#[test]
fn infinite_box_stays_infinite_under_transform() {
    let b = Bounds::new(-std::f64::INFINITY, 0.0, -std::f64::INFINITY,
        std::f64::INFINITY, 0.0, std::f64::INFINITY);
    let t = b.transform(&Matrix4D::rotation_z(0.5));

    assert_eq!(t.minimum.x, -std::f64::INFINITY);
    assert_eq!(t.maximum.y, std::f64::INFINITY);
}

#[test]
fn ray_against_box() {
    let b = Bounds::new(5.0, -2.0, 0.0, 11.0, 4.0, 7.0);
    let cases = [
        (Tuple4D::point(15.0, 1.0, 2.0), Tuple4D::vector(-1.0, 0.0, 0.0), true),
        (Tuple4D::point(-5.0, -1.0, 4.0), Tuple4D::vector(1.0, 0.0, 0.0), true),
        (Tuple4D::point(7.0, 6.0, 5.0), Tuple4D::vector(0.0, -1.0, 0.0), true),
        (Tuple4D::point(8.0, 2.0, 12.0), Tuple4D::vector(0.0, 0.0, -1.0), true),
        (Tuple4D::point(9.0, -1.0, -8.0), Tuple4D::vector(2.0, 4.0, 6.0), false),
        (Tuple4D::point(8.0, 3.0, -4.0), Tuple4D::vector(6.0, 2.0, 4.0), false),
        (Tuple4D::point(12.0, 5.0, 4.0), Tuple4D::vector(0.0, 0.0, -1.0), false),
    ];

    for &(origin, direction, expected) in cases.iter() {
        let r = Ray4D::new(origin, direction.normalize());
        assert_eq!(b.intersects(&r), expected, "{:?}", r);
    }
}

#[test]
fn ray_against_infinite_box() {
    let b = Bounds::infinite();
    let r = Ray4D::new(Tuple4D::point(0.0, 3.0, 0.0),
        Tuple4D::vector(0.0, 0.0, 1.0));

    assert!(b.intersects(&r));
    assert!(!Bounds::empty().intersects(&r));
}
