use crate::consts::{ FEQ_EPSILON, LARGE_SENTINEL };
use crate::error::{ Result, TracerError };
use crate::tuple::Tuple4D;
use crate::ray::Ray4D;
use crate::light::Material;
use crate::matrix::Matrix4D;
use crate::bounds::Bounds;
use crate::intersect::{ Intersection, Intersections };

/// Precomputed data for a triangle.
///
/// The edge vectors and face normal never change after construction, so
/// they are calculated once here rather than on every intersection.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct TriangleInfo {
    pub p1: Tuple4D,
    pub p2: Tuple4D,
    pub p3: Tuple4D,

    /// `p2 - p1`.
    pub e1: Tuple4D,

    /// `p3 - p1`.
    pub e2: Tuple4D,

    pub normal: Tuple4D,
}

impl TriangleInfo {
    pub fn new(p1: Tuple4D, p2: Tuple4D, p3: Tuple4D) -> TriangleInfo {
        let e1 = p2 - p1;
        let e2 = p3 - p1;

        // Collinear vertices have no face normal; such a triangle is never
        // hit, since its determinant is always zero.
        let n = e2.cross(&e1);
        let normal = if n.magnitude() > 0.0 { n.normalize() } else { n };

        TriangleInfo { p1, p2, p3, e1, e2, normal }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ShapeType {
    /// A unit sphere with its center at the object-space origin.
    Sphere,

    /// The X-Z plane, stretching indefinitely, with its normal along +Y.
    Plane,

    /// A 2-by-2-by-2 cube centered at the object-space origin.
    Cube,

    /// A unit-radius cylinder around the Y axis. Minimum Y, maximum Y and
    /// whether the cylinder is closed.
    Cylinder(f64, f64, bool),

    /// A double-napped cone around the Y axis. Minimum Y, maximum Y and
    /// whether the cone is closed.
    Cone(f64, f64, bool),

    /// A triangle. See TriangleInfo for further explanation.
    Triangle(TriangleInfo),

    /// A group of shapes. Can include other groups of shapes.
    Group(Vec<Shape>),
}

/// A shape in a scene.
///
/// Shapes form a tree: groups own their children outright. Instead of a
/// pointer back up to the owning group, each shape caches the composed
/// inverse of every transform above it (`parent_inverse`), which is all a
/// child ever needs from its ancestors. Attaching a child or changing a
/// group's transform pushes the new chain down the subtree.
#[derive(Debug, Clone)]
pub struct Shape {
    pub ty: ShapeType,
    pub material: Material,

    transform: Matrix4D,
    inverse: Matrix4D,

    // Product of the inverses of all enclosing group transforms, and that
    // product combined with `inverse`. Both are identity at the top level.
    parent_inverse: Matrix4D,
    world_inverse: Matrix4D,

    casts_shadow: bool,

    // Object-space bounding box. For groups, the union of every child's box
    // in group space.
    bounds: Bounds,
}

impl Default for Shape {
    fn default() -> Shape {
        Shape::with_type(ShapeType::Sphere)
    }
}

/// Checks that two Shapes are equal.
///
/// Only the shape itself is compared; where it sits in a group tree is not.
impl PartialEq for Shape {
    fn eq(&self, other: &Self) -> bool {
        self.ty == other.ty
            && self.transform == other.transform
            && self.material == other.material
            && self.casts_shadow == other.casts_shadow
    }
}

impl Shape {
    fn with_type(ty: ShapeType) -> Shape {
        let bounds = Self::local_bounds(&ty);

        Shape {
            ty,
            material: Default::default(),
            transform: Matrix4D::identity(),
            inverse: Matrix4D::identity(),
            parent_inverse: Matrix4D::identity(),
            world_inverse: Matrix4D::identity(),
            casts_shadow: true,
            bounds,
        }
    }

    /// Creates a unit sphere with identity transform and default material.
    pub fn sphere() -> Shape {
        Self::with_type(ShapeType::Sphere)
    }

    /// Creates a plane with a normal pointing up along the Y axis.
    pub fn plane() -> Shape {
        Self::with_type(ShapeType::Plane)
    }

    pub fn cube() -> Shape {
        Self::with_type(ShapeType::Cube)
    }

    /// Creates an infinitely long cylinder with no end caps.
    pub fn cylinder() -> Shape {
        Self::with_type(ShapeType::Cylinder(
            -std::f64::INFINITY, std::f64::INFINITY, false
        ))
    }

    /// Creates a cylinder between `minimum` and `maximum` Y, optionally with
    /// end caps.
    pub fn bounded_cylinder(minimum: f64, maximum: f64, closed: bool) -> Shape {
        Self::with_type(ShapeType::Cylinder(minimum, maximum, closed))
    }

    /// Creates an infinite double-napped cone with no end caps.
    pub fn cone() -> Shape {
        Self::with_type(ShapeType::Cone(
            -std::f64::INFINITY, std::f64::INFINITY, false
        ))
    }

    pub fn bounded_cone(minimum: f64, maximum: f64, closed: bool) -> Shape {
        Self::with_type(ShapeType::Cone(minimum, maximum, closed))
    }

    /// Creates a triangle, defined by three points in space.
    pub fn triangle(p1: Tuple4D, p2: Tuple4D, p3: Tuple4D) -> Shape {
        Self::with_type(ShapeType::Triangle(TriangleInfo::new(p1, p2, p3)))
    }

    /// Creates a group, which holds a list of other shapes (possibly groups).
    pub fn group() -> Shape {
        Self::with_type(ShapeType::Group(Vec::new()))
    }

    /// The object-space bounding box of a leaf shape type.
    fn local_bounds(ty: &ShapeType) -> Bounds {
        let inf = std::f64::INFINITY;

        match *ty {
            ShapeType::Sphere | ShapeType::Cube
                => Bounds::new(-1.0, -1.0, -1.0, 1.0, 1.0, 1.0),
            ShapeType::Plane => Bounds::new(-inf, 0.0, -inf, inf, 0.0, inf),
            ShapeType::Cylinder(min, max, _)
                => Bounds::new(-1.0, min, -1.0, 1.0, max, 1.0),
            ShapeType::Cone(min, max, _) => {
                let r = min.abs().max(max.abs());
                Bounds::new(-r, min, -r, r, max, r)
            },
            ShapeType::Triangle(ref ti) => {
                let mut b = Bounds::empty();
                b.add_point(&ti.p1);
                b.add_point(&ti.p2);
                b.add_point(&ti.p3);
                b
            },
            ShapeType::Group(ref children) => {
                let mut b = Bounds::empty();
                for child in children.iter() {
                    b.merge(&child.parent_space_bounds());
                }
                b
            },
        }
    }

    /// Attaches `child` to this group, taking ownership of it.
    ///
    /// The child's transform chain and this group's bounding box are updated
    /// immediately. Fails with `NotAGroup` if `self` is not a group, or with
    /// `Allocation` if the child list cannot grow.
    pub fn add_child(&mut self, mut child: Shape) -> Result<()> {
        let children = match self.ty {
            ShapeType::Group(ref mut c) => c,
            _ => return Err(TracerError::NotAGroup),
        };

        children.try_reserve(1)?;

        child.propagate_parent_inverse(self.world_inverse);
        let child_bounds = child.parent_space_bounds();
        children.push(child);

        self.bounds.merge(&child_bounds);
        Ok(())
    }

    /// Deduces whether a shape includes another shape.
    ///
    /// A group includes `other` if any child includes it. Any other shape
    /// includes only itself (by address).
    pub fn includes(&self, other: &Self) -> bool {
        match self.ty {
            ShapeType::Group(ref children)
                => children.iter().any(|c| c.includes(other)),
            _ => std::ptr::eq(self, other),
        }
    }

    /// The bounding box in this shape's own object space.
    pub fn bounds(&self) -> &Bounds {
        &self.bounds
    }

    /// The bounding box in the space of whatever contains this shape.
    pub fn parent_space_bounds(&self) -> Bounds {
        self.bounds.transform(&self.transform)
    }

    /// Returns the child shapes if this is a group.
    pub fn children(&self) -> Option<&[Shape]> {
        if let ShapeType::Group(ref children) = self.ty {
            Some(children)
        } else {
            None
        }
    }

    /// Returns a ref. to `TriangleInfo` if this is a triangle.
    pub fn triangle_info(&self) -> Option<&TriangleInfo> {
        if let ShapeType::Triangle(ref info) = self.ty {
            Some(info)
        } else {
            None
        }
    }

    pub fn is_group(&self) -> bool {
        matches!(self.ty, ShapeType::Group(_))
    }

    pub fn transform(&self) -> &Matrix4D {
        &self.transform
    }

    pub fn inverse(&self) -> &Matrix4D {
        &self.inverse
    }

    /// Sets the transform and recomputes its inverse.
    ///
    /// For groups, the new transform is pushed down to every descendant.
    /// A singular matrix is rejected and leaves the shape untouched.
    pub fn set_transform(&mut self, transform: Matrix4D) -> Result<()> {
        let inverse = transform.inverse()?;

        self.transform = transform;
        self.inverse = inverse;
        self.propagate_parent_inverse(self.parent_inverse);
        Ok(())
    }

    /// Builder-style `set_transform`.
    pub fn with_transform(mut self, transform: Matrix4D) -> Result<Shape> {
        self.set_transform(transform)?;
        Ok(self)
    }

    /// Stores the composed inverse of all enclosing groups, then pushes this
    /// shape's own composed inverse down to its children.
    fn propagate_parent_inverse(&mut self, parent_inverse: Matrix4D) {
        self.parent_inverse = parent_inverse;
        self.world_inverse = self.inverse * parent_inverse;

        let world_inverse = self.world_inverse;
        if let ShapeType::Group(ref mut children) = self.ty {
            for child in children.iter_mut() {
                child.propagate_parent_inverse(world_inverse);
            }
        }
    }

    pub fn casts_shadow(&self) -> bool {
        self.casts_shadow
    }

    /// Sets whether this shape occludes light. On a group the flag applies to
    /// every descendant, since only leaf shapes are ever hit.
    pub fn set_casts_shadow(&mut self, casts_shadow: bool) {
        self.casts_shadow = casts_shadow;

        if let ShapeType::Group(ref mut children) = self.ty {
            for child in children.iter_mut() {
                child.set_casts_shadow(casts_shadow);
            }
        }
    }

    /// Sets the material on this shape, and on every descendant of a group.
    pub fn set_material(&mut self, material: Material) {
        if let ShapeType::Group(ref mut children) = self.ty {
            for child in children.iter_mut() {
                child.set_material(material.clone());
            }
        }

        self.material = material;
    }

    /// Converts a point from world to object space.
    ///
    /// Goes through every enclosing group's transform, outermost first.
    pub fn world_to_object(&self, point: Tuple4D) -> Tuple4D {
        self.world_inverse * point
    }

    /// Converts a normal from object to world space.
    ///
    /// Normals transform by the transpose of the inverse, so they stay
    /// perpendicular to the surface under non-uniform scaling.
    pub fn normal_to_world(&self, normal: Tuple4D) -> Tuple4D {
        let mut n = self.world_inverse.transposition() * normal;
        n.w = 0.0;
        n.normalize()
    }

    /// The world-space normal at a world-space point on this shape.
    pub fn normal_at(&self, world_point: Tuple4D) -> Tuple4D {
        let local_point = self.world_to_object(world_point);
        self.normal_to_world(self.local_normal_at(&local_point))
    }

    /// Intersects a ray given in the space of this shape's parent.
    ///
    /// The ray is brought into object space and handed to `local_intersect`.
    /// Hits are appended to `xs` unsorted.
    pub fn intersect_into<'a>(&'a self, ray: &Ray4D, xs: &mut Intersections<'a>)
        -> Result<()> {
        let local_ray = ray.transform(&self.inverse);
        self.local_intersect(&local_ray, xs)
    }

    /// Intersects an object-space ray with this shape, appending hits to
    /// `xs`.
    pub fn local_intersect<'a>(&'a self, ray: &Ray4D, xs: &mut Intersections<'a>)
        -> Result<()> {
        match self.ty {
            ShapeType::Sphere => self.intersect_sphere(ray, xs),
            ShapeType::Plane => self.intersect_plane(ray, xs),
            ShapeType::Cube => self.intersect_cube(ray, xs),
            ShapeType::Cylinder(min, max, closed)
                => self.intersect_cylinder(ray, min, max, closed, xs),
            ShapeType::Cone(min, max, closed)
                => self.intersect_cone(ray, min, max, closed, xs),
            ShapeType::Triangle(ref ti) => self.intersect_triangle(ray, ti, xs),
            ShapeType::Group(ref children)
                => self.intersect_group(ray, children, xs),
        }
    }

    /// Obtains the object-space normal vector at an object-space point.
    pub fn local_normal_at(&self, at: &Tuple4D) -> Tuple4D {
        match self.ty {
            ShapeType::Sphere => Tuple4D { w: 0.0, ..*at },
            ShapeType::Plane => Tuple4D::vector(0.0, 1.0, 0.0),
            ShapeType::Cube => Self::normal_at_cube(at),
            ShapeType::Cylinder(min, max, _)
                => Self::normal_at_cylinder(at, min, max),
            ShapeType::Cone(min, max, _) => Self::normal_at_cone(at, min, max),
            ShapeType::Triangle(ref ti) => ti.normal,
            ShapeType::Group(_) => unreachable!(
                "groups never report hits of their own"
            ),
        }
    }

    /// Both roots of the ray/unit-sphere quadratic, whatever their sign.
    fn intersect_sphere<'a>(&'a self, ray: &Ray4D, xs: &mut Intersections<'a>)
        -> Result<()> {
        // Subtracting the origin point turns the ray origin into a vector.
        let sphere_to_ray = ray.origin - Tuple4D::origin();

        let a = ray.direction.dot(&ray.direction);
        let b = 2.0 * ray.direction.dot(&sphere_to_ray);
        let c = sphere_to_ray.dot(&sphere_to_ray) - 1.0;

        let discriminant = b.powi(2) - (4.0 * a * c);
        if discriminant < 0.0 {
            return Ok(());
        }

        let t1 = (-b - discriminant.sqrt()) / (2.0 * a);
        let t2 = (-b + discriminant.sqrt()) / (2.0 * a);

        xs.push(Intersection::new(t1, self))?;
        xs.push(Intersection::new(t2, self))
    }

    fn intersect_plane<'a>(&'a self, ray: &Ray4D, xs: &mut Intersections<'a>)
        -> Result<()> {
        // Without a Y component, the ray runs parallel to the plane.
        if ray.direction.y.abs() <= FEQ_EPSILON {
            return Ok(());
        }

        let t = -ray.origin.y / ray.direction.y;
        xs.push(Intersection::new(t, self))
    }

    fn intersect_cube<'a>(&'a self, ray: &Ray4D, xs: &mut Intersections<'a>)
        -> Result<()> {
        let (xtmin, xtmax)
            = Self::check_cube_axis(ray.origin.x, ray.direction.x);
        let (ytmin, ytmax)
            = Self::check_cube_axis(ray.origin.y, ray.direction.y);
        let (ztmin, ztmax)
            = Self::check_cube_axis(ray.origin.z, ray.direction.z);

        let tmin = xtmin.max(ytmin).max(ztmin);
        let tmax = xtmax.min(ytmax).min(ztmax);

        if tmin > tmax {
            return Ok(());
        }

        xs.push(Intersection::new(tmin, self))?;
        xs.push(Intersection::new(tmax, self))
    }

    fn normal_at_cube(p: &Tuple4D) -> Tuple4D {
        let xa = p.x.abs();
        let ya = p.y.abs();
        let za = p.z.abs();

        let max_component = xa.max(ya).max(za);
        if max_component == xa {
            Tuple4D::vector(p.x, 0.0, 0.0)
        } else if max_component == ya {
            Tuple4D::vector(0.0, p.y, 0.0)
        } else {
            Tuple4D::vector(0.0, 0.0, p.z)
        }
    }

    fn intersect_cylinder<'a>(&'a self, ray: &Ray4D, minimum: f64,
        maximum: f64, closed: bool, xs: &mut Intersections<'a>) -> Result<()> {
        let a = ray.direction.x.powi(2) + ray.direction.z.powi(2);

        // A ray parallel to the Y axis can only hit the caps.
        if a < FEQ_EPSILON {
            return self.intersect_caps(ray, minimum, maximum, closed,
                |_| 1.0, xs);
        }

        let b = 2.0 * ray.origin.x * ray.direction.x
              + 2.0 * ray.origin.z * ray.direction.z;
        let c = ray.origin.x.powi(2) + ray.origin.z.powi(2) - 1.0;

        let disc = b.powi(2) - 4.0 * a * c;
        if disc < 0.0 {
            return Ok(());
        }

        let t0 = (-b - disc.sqrt()) / (2.0 * a);
        let t1 = (-b + disc.sqrt()) / (2.0 * a);
        self.push_within_y(ray, t0, minimum, maximum, xs)?;
        self.push_within_y(ray, t1, minimum, maximum, xs)?;

        self.intersect_caps(ray, minimum, maximum, closed, |_| 1.0, xs)
    }

    fn normal_at_cylinder(at: &Tuple4D, minimum: f64, maximum: f64) -> Tuple4D {
        // Square of the distance from the Y axis.
        let dist = at.x.powi(2) + at.z.powi(2);

        if dist < 1.0 && at.y >= maximum - FEQ_EPSILON {
            Tuple4D::vector(0.0, 1.0, 0.0)
        } else if dist < 1.0 && at.y <= minimum + FEQ_EPSILON {
            Tuple4D::vector(0.0, -1.0, 0.0)
        } else {
            Tuple4D::vector(at.x, 0.0, at.z)
        }
    }

    fn intersect_cone<'a>(&'a self, ray: &Ray4D, minimum: f64, maximum: f64,
        closed: bool, xs: &mut Intersections<'a>) -> Result<()> {
        let a = ray.direction.x.powi(2)
              - ray.direction.y.powi(2)
              + ray.direction.z.powi(2);

        let b = 2.0 * ray.origin.x * ray.direction.x
              - 2.0 * ray.origin.y * ray.direction.y
              + 2.0 * ray.origin.z * ray.direction.z;

        let c = ray.origin.x.powi(2)
              - ray.origin.y.powi(2)
              + ray.origin.z.powi(2);

        // The ray runs parallel to one of the cone's halves: the quadratic
        // collapses to a line, with at most one lateral hit.
        if a.abs() < FEQ_EPSILON {
            if b.abs() >= FEQ_EPSILON {
                let t = -c / (2.0 * b);
                self.push_within_y(ray, t, minimum, maximum, xs)?;
            }

            return self.intersect_caps(ray, minimum, maximum, closed,
                |y: f64| y.powi(2), xs);
        }

        let disc = b.powi(2) - 4.0 * a * c;
        if disc < 0.0 {
            return Ok(());
        }

        let t0 = (-b - disc.sqrt()) / (2.0 * a);
        let t1 = (-b + disc.sqrt()) / (2.0 * a);
        self.push_within_y(ray, t0, minimum, maximum, xs)?;
        self.push_within_y(ray, t1, minimum, maximum, xs)?;

        self.intersect_caps(ray, minimum, maximum, closed,
            |y: f64| y.powi(2), xs)
    }

    fn normal_at_cone(at: &Tuple4D, minimum: f64, maximum: f64) -> Tuple4D {
        let dist = at.x.powi(2) + at.z.powi(2);

        // Each cap's radius is the absolute value of its Y.
        if dist < maximum.powi(2) && at.y >= maximum - FEQ_EPSILON {
            Tuple4D::vector(0.0, 1.0, 0.0)
        } else if dist < minimum.powi(2) && at.y <= minimum + FEQ_EPSILON {
            Tuple4D::vector(0.0, -1.0, 0.0)
        } else if dist == 0.0 {
            // At the apex the side normal vanishes, so use the axis.
            Tuple4D::vector(0.0, if at.y > 0.0 { -1.0 } else { 1.0 }, 0.0)
        } else {
            let mut y = dist.sqrt();
            if at.y > 0.0 {
                y = -y;
            }

            Tuple4D::vector(at.x, y, at.z)
        }
    }

    /// Records a lateral hit on a cylinder or cone if it lies strictly
    /// between the Y limits.
    fn push_within_y<'a>(&'a self, ray: &Ray4D, t: f64, minimum: f64,
        maximum: f64, xs: &mut Intersections<'a>) -> Result<()> {
        let y = ray.origin.y + t * ray.direction.y;
        if minimum < y && y < maximum {
            xs.push(Intersection::new(t, self))?;
        }

        Ok(())
    }

    /// Intersects the flat end caps of a closed cylinder or cone.
    ///
    /// `radius_squared` gives the squared cap radius at a given Y: constant
    /// for cylinders, `y^2` for cones.
    fn intersect_caps<'a, F>(&'a self, ray: &Ray4D, minimum: f64, maximum: f64,
        closed: bool, radius_squared: F, xs: &mut Intersections<'a>)
        -> Result<()>
        where F: Fn(f64) -> f64 {
        // Open shapes have no caps, and a ray with no Y motion cannot reach
        // them.
        if !closed || ray.direction.y.abs() < FEQ_EPSILON {
            return Ok(());
        }

        for &y in [minimum, maximum].iter() {
            let t = (y - ray.origin.y) / ray.direction.y;
            let x = ray.origin.x + t * ray.direction.x;
            let z = ray.origin.z + t * ray.direction.z;

            if x.powi(2) + z.powi(2) <= radius_squared(y) {
                xs.push(Intersection::new(t, self))?;
            }
        }

        Ok(())
    }

    /// Moller-Trumbore. Triangles report at most one hit.
    fn intersect_triangle<'a>(&'a self, ray: &Ray4D, ti: &TriangleInfo,
        xs: &mut Intersections<'a>) -> Result<()> {
        let dir_cross_e2 = ray.direction.cross(&ti.e2);
        let determinant = ti.e1.dot(&dir_cross_e2);

        // Parallel to the triangle's plane.
        if determinant.abs() < FEQ_EPSILON {
            return Ok(());
        }

        let f = 1.0 / determinant;
        let p1_to_origin = ray.origin - ti.p1;
        let u = f * p1_to_origin.dot(&dir_cross_e2);
        if u < 0.0 || u > 1.0 {
            return Ok(());
        }

        let origin_cross_e1 = p1_to_origin.cross(&ti.e1);
        let v = f * ray.direction.dot(&origin_cross_e1);
        if v < 0.0 || u + v > 1.0 {
            return Ok(());
        }

        let t = f * ti.e2.dot(&origin_cross_e1);
        xs.push(Intersection::new(t, self))
    }

    /// Tests the group's box first and only descends on a hit.
    fn intersect_group<'a>(&'a self, ray: &Ray4D, children: &'a [Shape],
        xs: &mut Intersections<'a>) -> Result<()> {
        if !self.bounds.intersects(ray) {
            return Ok(());
        }

        for child in children.iter() {
            child.intersect_into(ray, xs)?;
        }

        Ok(())
    }

    /// Gets the min and max intersection offsets along one axis of the unit
    /// cube.
    ///
    /// A direction too small to divide by gets a large finite sentinel
    /// instead, signed by which face the origin sits past. The smaller `t`
    /// comes first.
    fn check_cube_axis(origin: f64, direction: f64) -> (f64, f64) {
        let tmin_numerator = -1.0 - origin;
        let tmax_numerator =  1.0 - origin;

        let (tmin, tmax) = if direction.abs() >= FEQ_EPSILON {
            (tmin_numerator / direction, tmax_numerator / direction)
        } else {
            (tmin_numerator * LARGE_SENTINEL, tmax_numerator * LARGE_SENTINEL)
        };

        if tmin > tmax {
            (tmax, tmin)
        } else {
            (tmin, tmax)
        }
    }
}

/// Intersects a world-space ray with a top-level `Shape`.
///
/// Returns the hits unsorted. Rendering reuses one list per worker through
/// `Shape::intersect_into`; this allocates a fresh one.
pub fn intersect<'a>(s: &'a Shape, r: &Ray4D) -> Result<Intersections<'a>> {
    let mut xs = Intersections::new();
    s.intersect_into(r, &mut xs)?;
    Ok(xs)
}

#[cfg(test)]
fn ts(xs: &Intersections) -> Vec<f64> {
    xs.intersections.iter().map(|i| i.t).collect()
}

#[cfg(test)]
fn ray(origin: (f64, f64, f64), direction: (f64, f64, f64)) -> Ray4D {
    Ray4D::new(
        Tuple4D::point(origin.0, origin.1, origin.2),
        Tuple4D::vector(direction.0, direction.1, direction.2)
    )
}

#[test]
fn ray_intersects_sphere_at_two_points() {
    let s = Shape::sphere();
    let xs = intersect(&s, &ray((0.0, 0.0, -5.0), (0.0, 0.0, 1.0))).unwrap();

    assert_eq!(ts(&xs), vec![4.0, 6.0]);
    assert!(std::ptr::eq(xs.intersections[0].what, &s));
}

#[test]
fn ray_is_tangent_to_sphere() {
    let s = Shape::sphere();
    let xs = intersect(&s, &ray((0.0, 1.0, -5.0), (0.0, 0.0, 1.0))).unwrap();

    assert_eq!(ts(&xs), vec![5.0, 5.0]);
}

#[test]
fn ray_misses_sphere() {
    let s = Shape::sphere();
    let xs = intersect(&s, &ray((0.0, 2.0, -5.0), (0.0, 0.0, 1.0))).unwrap();

    assert!(xs.is_empty());
}

#[test]
fn ray_is_inside_sphere() {
    let s = Shape::sphere();
    let xs = intersect(&s, &ray((0.0, 0.0, 0.0), (0.0, 0.0, 1.0))).unwrap();

    assert_eq!(ts(&xs), vec![-1.0, 1.0]);
}

#[test]
fn sphere_is_behind_ray() {
    let s = Shape::sphere();
    let xs = intersect(&s, &ray((0.0, 0.0, 5.0), (0.0, 0.0, 1.0))).unwrap();

    assert_eq!(ts(&xs), vec![-6.0, -4.0]);
}

#[test]
fn intersecting_scaled_and_translated_spheres() {
    let r = ray((0.0, 0.0, -5.0), (0.0, 0.0, 1.0));

    let s = Shape::sphere().with_transform(Matrix4D::scaling(2.0, 2.0, 2.0))
        .unwrap();
    assert_eq!(ts(&intersect(&s, &r).unwrap()), vec![3.0, 7.0]);

    let s = Shape::sphere()
        .with_transform(Matrix4D::translation(5.0, 0.0, 0.0)).unwrap();
    assert!(intersect(&s, &r).unwrap().is_empty());
}

#[test]
fn singular_transform_is_rejected() {
    let mut s = Shape::sphere();
    let result = s.set_transform(Matrix4D::scaling(1.0, 0.0, 1.0));

    assert!(matches!(result, Err(TracerError::SingularMatrix)));
    assert_eq!(*s.transform(), Matrix4D::identity());
}

#[test]
fn normal_on_sphere_nonaxial() {
    let s = Shape::sphere();
    let k = 3.0f64.sqrt() / 3.0;
    let n = s.normal_at(Tuple4D::point(k, k, k));

    assert_eq!(n, Tuple4D::vector(k, k, k));
    assert_eq!(n, n.normalize());
}

#[test]
fn compute_normal_on_translated_sphere() {
    let s = Shape::sphere()
        .with_transform(Matrix4D::translation(0.0, 1.0, 0.0)).unwrap();
    let n = s.normal_at(Tuple4D::point(0.0, 1.70711, -0.70711));

    assert_eq!(n, Tuple4D::vector(0.0, 0.70711, -0.70711));
}

#[test]
fn compute_normal_on_transformed_sphere() {
    let s = Shape::sphere()
        .with_transform(Matrix4D::scaling(1.0, 0.5, 1.0)
            * Matrix4D::rotation_z(std::f64::consts::PI / 5.0))
        .unwrap();

    let h = 2.0f64.sqrt() / 2.0;
    let n = s.normal_at(Tuple4D::point(0.0, h, -h));

    assert_eq!(n, Tuple4D::vector(0.0, 0.97014, -0.24254));
}

#[test]
fn normal_on_plane_is_constant() {
    let p = Shape::plane();

    for pt in [(0.0, 0.0, 0.0), (10.0, 0.0, -10.0), (-5.0, 0.0, 150.0)].iter() {
        let n = p.local_normal_at(&Tuple4D::point(pt.0, pt.1, pt.2));
        assert_eq!(n, Tuple4D::vector(0.0, 1.0, 0.0));
    }
}

#[test]
fn ray_intersecting_plane() {
    let p = Shape::plane();

    let xs = intersect(&p, &ray((0.0, 10.0, 0.0), (0.0, 0.0, 1.0))).unwrap();
    assert!(xs.is_empty());

    let xs = intersect(&p, &ray((0.0, 1.0, 0.0), (0.0, -1.0, 0.0))).unwrap();
    assert_eq!(ts(&xs), vec![1.0]);

    let xs = intersect(&p, &ray((0.0, -1.0, 0.0), (0.0, 1.0, 0.0))).unwrap();
    assert_eq!(ts(&xs), vec![1.0]);
}

#[test]
fn ray_intersects_cube_faces() {
    let c = Shape::cube();
    let cases = [
        ((5.0, 0.5, 0.0), (-1.0, 0.0, 0.0), 4.0, 6.0),
        ((-5.0, 0.5, 0.0), (1.0, 0.0, 0.0), 4.0, 6.0),
        ((0.5, 5.0, 0.0), (0.0, -1.0, 0.0), 4.0, 6.0),
        ((0.5, -5.0, 0.0), (0.0, 1.0, 0.0), 4.0, 6.0),
        ((0.5, 0.0, 5.0), (0.0, 0.0, -1.0), 4.0, 6.0),
        ((0.5, 0.0, -5.0), (0.0, 0.0, 1.0), 4.0, 6.0),
        ((0.0, 0.5, 0.0), (0.0, 0.0, 1.0), -1.0, 1.0),
        ((0.0, 2.0, 0.0), (0.0, -1.0, 0.0), 1.0, 3.0),
    ];

    for &(o, d, t1, t2) in cases.iter() {
        let xs = intersect(&c, &ray(o, d)).unwrap();
        assert_eq!(ts(&xs), vec![t1, t2], "origin {:?}", o);
    }
}

#[test]
fn ray_misses_cube() {
    let c = Shape::cube();
    let cases = [
        ((-2.0, 0.0, 0.0), (0.2673, 0.5345, 0.8018)),
        ((0.0, -2.0, 0.0), (0.8018, 0.2673, 0.5345)),
        ((0.0, 0.0, -2.0), (0.5345, 0.8018, 0.2673)),
        ((2.0, 0.0, 2.0), (0.0, 0.0, -1.0)),
        ((0.0, 2.0, 2.0), (0.0, -1.0, 0.0)),
        ((2.0, 2.0, 0.0), (-1.0, 0.0, 0.0)),
    ];

    for &(o, d) in cases.iter() {
        assert!(intersect(&c, &ray(o, d)).unwrap().is_empty(), "origin {:?}", o);
    }
}

#[test]
fn normal_on_cube_faces_and_corners() {
    let c = Shape::cube();
    let cases = [
        ((1.0, 0.5, -0.8), (1.0, 0.0, 0.0)),
        ((-1.0, -0.2, 0.9), (-1.0, 0.0, 0.0)),
        ((-0.4, 1.0, -0.1), (0.0, 1.0, 0.0)),
        ((0.3, -1.0, -0.7), (0.0, -1.0, 0.0)),
        ((-0.6, 0.3, 1.0), (0.0, 0.0, 1.0)),
        ((0.4, 0.4, -1.0), (0.0, 0.0, -1.0)),
        ((1.0, 1.0, 1.0), (1.0, 0.0, 0.0)),
        ((-1.0, -1.0, -1.0), (-1.0, 0.0, 0.0)),
    ];

    for &(p, n) in cases.iter() {
        assert_eq!(c.local_normal_at(&Tuple4D::point(p.0, p.1, p.2)),
            Tuple4D::vector(n.0, n.1, n.2));
    }
}

#[test]
fn ray_misses_cylinder() {
    let cyl = Shape::cylinder();
    let cases = [
        ((1.0, 0.0, 0.0), (0.0, 1.0, 0.0)),
        ((0.0, 0.0, 0.0), (0.0, 1.0, 0.0)),
        ((0.0, 0.0, -5.0), (1.0, 1.0, 1.0)),
    ];

    for &(o, d) in cases.iter() {
        let r = Ray4D::new(Tuple4D::point(o.0, o.1, o.2),
            Tuple4D::vector(d.0, d.1, d.2).normalize());
        assert!(intersect(&cyl, &r).unwrap().is_empty());
    }
}

#[test]
fn ray_strikes_cylinder() {
    let cyl = Shape::cylinder();
    let cases = [
        ((1.0, 0.0, -5.0), (0.0, 0.0, 1.0), 5.0, 5.0),
        ((0.0, 0.0, -5.0), (0.0, 0.0, 1.0), 4.0, 6.0),
        ((0.5, 0.0, -5.0), (0.1, 1.0, 1.0), 6.80798, 7.08872),
    ];

    for &(o, d, t0, t1) in cases.iter() {
        let r = Ray4D::new(Tuple4D::point(o.0, o.1, o.2),
            Tuple4D::vector(d.0, d.1, d.2).normalize());
        let xs = intersect(&cyl, &r).unwrap();

        assert_eq!(xs.len(), 2);
        assert!(crate::feq(xs.intersections[0].t, t0));
        assert!(crate::feq(xs.intersections[1].t, t1));
    }
}

#[test]
fn truncated_cylinder_hits() {
    let cyl = Shape::bounded_cylinder(1.0, 2.0, false);
    let cases = [
        ((0.0, 1.5, 0.0), (0.1, 1.0, 0.0), 0),
        ((0.0, 3.0, -5.0), (0.0, 0.0, 1.0), 0),
        ((0.0, 0.0, -5.0), (0.0, 0.0, 1.0), 0),
        ((0.0, 2.0, -5.0), (0.0, 0.0, 1.0), 0),
        ((0.0, 1.0, -5.0), (0.0, 0.0, 1.0), 0),
        ((0.0, 1.5, -2.0), (0.0, 0.0, 1.0), 2),
    ];

    for &(o, d, count) in cases.iter() {
        let r = Ray4D::new(Tuple4D::point(o.0, o.1, o.2),
            Tuple4D::vector(d.0, d.1, d.2).normalize());
        assert_eq!(intersect(&cyl, &r).unwrap().len(), count, "origin {:?}", o);
    }
}

#[test]
fn closed_cylinder_caps() {
    let cyl = Shape::bounded_cylinder(1.0, 2.0, true);
    let cases = [
        ((0.0, 3.0, 0.0), (0.0, -1.0, 0.0), 2),
        ((0.0, 3.0, -2.0), (0.0, -1.0, 2.0), 2),
        ((0.0, 4.0, -2.0), (0.0, -1.0, 1.0), 2),
        ((0.0, 0.0, -2.0), (0.0, 1.0, 2.0), 2),
        ((0.0, -1.0, -2.0), (0.0, 1.0, 1.0), 2),
    ];

    for &(o, d, count) in cases.iter() {
        let r = Ray4D::new(Tuple4D::point(o.0, o.1, o.2),
            Tuple4D::vector(d.0, d.1, d.2).normalize());
        assert_eq!(intersect(&cyl, &r).unwrap().len(), count, "origin {:?}", o);
    }
}

#[test]
fn normal_on_cylinder_and_caps() {
    let cyl = Shape::cylinder();
    assert_eq!(cyl.local_normal_at(&Tuple4D::point(1.0, 0.0, 0.0)),
        Tuple4D::vector(1.0, 0.0, 0.0));
    assert_eq!(cyl.local_normal_at(&Tuple4D::point(0.0, -2.0, 1.0)),
        Tuple4D::vector(0.0, 0.0, 1.0));

    let capped = Shape::bounded_cylinder(1.0, 2.0, true);
    assert_eq!(capped.local_normal_at(&Tuple4D::point(0.5, 1.0, 0.0)),
        Tuple4D::vector(0.0, -1.0, 0.0));
    assert_eq!(capped.local_normal_at(&Tuple4D::point(0.0, 2.0, 0.5)),
        Tuple4D::vector(0.0, 1.0, 0.0));
}

#[test]
fn ray_strikes_cone() {
    let cone = Shape::cone();
    let cases = [
        ((0.0, 0.0, -5.0), (0.0, 0.0, 1.0), 5.0, 5.0),
        ((0.0, 0.0, -5.0), (1.0, 1.0, 1.0), 8.66025, 8.66025),
        ((1.0, 1.0, -5.0), (-0.5, -1.0, 1.0), 4.55006, 49.44994),
    ];

    for &(o, d, t0, t1) in cases.iter() {
        let r = Ray4D::new(Tuple4D::point(o.0, o.1, o.2),
            Tuple4D::vector(d.0, d.1, d.2).normalize());
        let mut xs = intersect(&cone, &r).unwrap();
        xs.sort();

        assert_eq!(xs.len(), 2);
        assert!((xs.intersections[0].t - t0).abs() < 1e-3);
        assert!((xs.intersections[1].t - t1).abs() < 1e-3);
    }
}

#[test]
fn ray_parallel_to_cone_half() {
    let cone = Shape::cone();
    let r = Ray4D::new(Tuple4D::point(0.0, 0.0, -1.0),
        Tuple4D::vector(0.0, 1.0, 1.0).normalize());
    let xs = intersect(&cone, &r).unwrap();

    assert_eq!(xs.len(), 1);
    assert!(crate::feq(xs.intersections[0].t, 0.35355));
}

#[test]
fn closed_cone_caps() {
    let cone = Shape::bounded_cone(-0.5, 0.5, true);
    let cases = [
        ((0.0, 0.0, -5.0), (0.0, 1.0, 0.0), 0),
        ((0.0, 0.0, -0.25), (0.0, 1.0, 1.0), 2),
        ((0.0, 0.0, -0.25), (0.0, 1.0, 0.0), 4),
    ];

    for &(o, d, count) in cases.iter() {
        let r = Ray4D::new(Tuple4D::point(o.0, o.1, o.2),
            Tuple4D::vector(d.0, d.1, d.2).normalize());
        assert_eq!(intersect(&cone, &r).unwrap().len(), count, "origin {:?}", o);
    }

    // The same rays against an open cone never see caps.
    let open = Shape::bounded_cone(-0.5, 0.5, false);
    let r = ray((0.0, 0.0, -0.25), (0.0, 1.0, 0.0));
    assert_eq!(intersect(&open, &r).unwrap().len(), 2);
}

#[test]
fn normal_on_cone() {
    let cone = Shape::cone();
    let cases = [
        ((0.0, 0.0, 0.0), (0.0, 1.0, 0.0)),
        ((1.0, 1.0, 1.0), (1.0, -(2.0f64.sqrt()), 1.0)),
        ((-1.0, -1.0, 0.0), (-1.0, 1.0, 0.0)),
    ];

    for &(p, n) in cases.iter() {
        assert_eq!(cone.local_normal_at(&Tuple4D::point(p.0, p.1, p.2)),
            Tuple4D::vector(n.0, n.1, n.2));
    }

    let capped = Shape::bounded_cone(-1.0, 2.0, true);
    assert_eq!(capped.local_normal_at(&Tuple4D::point(0.5, 2.0, 0.5)),
        Tuple4D::vector(0.0, 1.0, 0.0));
    assert_eq!(capped.local_normal_at(&Tuple4D::point(0.2, -1.0, 0.3)),
        Tuple4D::vector(0.0, -1.0, 0.0));
}

#[test]
fn constructing_a_triangle() {
    let p1 = Tuple4D::point(0.0, 1.0, 0.0);
    let p2 = Tuple4D::point(-1.0, 0.0, 0.0);
    let p3 = Tuple4D::point(1.0, 0.0, 0.0);
    let t = Shape::triangle(p1, p2, p3);
    let ti = t.triangle_info().unwrap();

    assert_eq!(ti.e1, Tuple4D::vector(-1.0, -1.0, 0.0));
    assert_eq!(ti.e2, Tuple4D::vector(1.0, -1.0, 0.0));
    assert_eq!(ti.normal, Tuple4D::vector(0.0, 0.0, -1.0));
    assert_eq!(t.local_normal_at(&Tuple4D::point(0.0, 0.5, 0.0)), ti.normal);
}

#[test]
fn ray_against_triangle() {
    let t = Shape::triangle(
        Tuple4D::point(0.0, 1.0, 0.0),
        Tuple4D::point(-1.0, 0.0, 0.0),
        Tuple4D::point(1.0, 0.0, 0.0),
    );

    // Parallel, then past each of the three edges.
    let misses = [
        ((0.0, -1.0, -2.0), (0.0, 1.0, 0.0)),
        ((1.0, 1.0, -2.0), (0.0, 0.0, 1.0)),
        ((-1.0, 1.0, -2.0), (0.0, 0.0, 1.0)),
        ((0.0, -1.0, -2.0), (0.0, 0.0, 1.0)),
    ];
    for &(o, d) in misses.iter() {
        assert!(intersect(&t, &ray(o, d)).unwrap().is_empty(), "origin {:?}", o);
    }

    let xs = intersect(&t, &ray((0.0, 0.5, -2.0), (0.0, 0.0, 1.0))).unwrap();
    assert_eq!(ts(&xs), vec![2.0]);
}

#[test]
fn degenerate_triangle_is_never_hit() {
    let t = Shape::triangle(
        Tuple4D::point(0.0, 0.0, 0.0),
        Tuple4D::point(1.0, 1.0, 1.0),
        Tuple4D::point(2.0, 2.0, 2.0),
    );

    let xs = intersect(&t, &ray((0.5, 0.5, -2.0), (0.0, 0.0, 1.0))).unwrap();
    assert!(xs.is_empty());
}

#[test]
fn only_groups_take_children() {
    let mut s = Shape::sphere();

    assert!(matches!(s.add_child(Shape::cube()), Err(TracerError::NotAGroup)));
}

#[test]
fn adding_a_child_to_a_shape_group() {
    let mut g = Shape::group();
    assert_eq!(g.children().unwrap().len(), 0);

    let s = Shape::cube();
    g.add_child(s.clone()).unwrap();

    assert_eq!(g.children().unwrap().len(), 1);
    assert_eq!(g.children().unwrap()[0], s);
    assert!(g.includes(&g.children().unwrap()[0]));
    assert!(!g.includes(&s));
}

#[test]
fn intersecting_ray_with_empty_group() {
    let g = Shape::group();
    let xs = intersect(&g, &ray((0.0, 0.0, 0.0), (0.0, 0.0, 1.0))).unwrap();

    assert!(xs.is_empty());
}

#[test]
fn intersecting_ray_with_nonempty_group() {
    let mut g = Shape::group();
    g.add_child(Shape::sphere()).unwrap();
    g.add_child(Shape::sphere()
        .with_transform(Matrix4D::translation(0.0, 0.0, -3.0)).unwrap()).unwrap();
    g.add_child(Shape::sphere()
        .with_transform(Matrix4D::translation(5.0, 0.0, 0.0)).unwrap()).unwrap();

    let mut xs = intersect(&g, &ray((0.0, 0.0, -5.0), (0.0, 0.0, 1.0))).unwrap();
    xs.sort();

    let children = g.children().unwrap();
    assert_eq!(xs.len(), 4);
    assert!(std::ptr::eq(&children[1], xs.intersections[0].what));
    assert!(std::ptr::eq(&children[1], xs.intersections[1].what));
    assert!(std::ptr::eq(&children[0], xs.intersections[2].what));
    assert!(std::ptr::eq(&children[0], xs.intersections[3].what));
}

#[test]
fn intersecting_a_transformed_group() {
    let mut g = Shape::group();
    g.set_transform(Matrix4D::scaling(2.0, 2.0, 2.0)).unwrap();
    g.add_child(Shape::sphere()
        .with_transform(Matrix4D::translation(5.0, 0.0, 0.0)).unwrap()).unwrap();

    let xs = intersect(&g, &ray((10.0, 0.0, -10.0), (0.0, 0.0, 1.0))).unwrap();
    assert_eq!(xs.len(), 2);
}

#[test]
fn group_bounds_cover_transformed_children() {
    let mut g = Shape::group();
    g.add_child(Shape::sphere()
        .with_transform(Matrix4D::translation(2.0, 5.0, -3.0)
            * Matrix4D::scaling(2.0, 2.0, 2.0)).unwrap()).unwrap();
    g.add_child(Shape::bounded_cylinder(-2.0, 2.0, false)
        .with_transform(Matrix4D::translation(-4.0, -1.0, 4.0)
            * Matrix4D::scaling(0.5, 1.0, 0.5)).unwrap()).unwrap();

    assert_eq!(*g.bounds(), Bounds::new(-4.5, -3.0, -5.0, 4.0, 7.0, 4.5));
}

#[test]
fn group_box_miss_skips_children() {
    let mut g = Shape::group();
    g.add_child(Shape::sphere()).unwrap();

    let xs = intersect(&g, &ray((5.0, 5.0, -5.0), (0.0, 0.0, 1.0))).unwrap();
    assert!(xs.is_empty());
}

#[test]
fn group_with_plane_is_unbounded() {
    let mut g = Shape::group();
    g.add_child(Shape::plane()).unwrap();

    let xs = intersect(&g, &ray((100.0, 1.0, 100.0), (0.0, -1.0, 0.0))).unwrap();
    assert_eq!(ts(&xs), vec![1.0]);
}

#[test]
fn converting_a_point_from_world_to_object_space() {
    let mut g2 = Shape::group();
    g2.set_transform(Matrix4D::scaling(2.0, 2.0, 2.0)).unwrap();
    g2.add_child(Shape::sphere()
        .with_transform(Matrix4D::translation(5.0, 0.0, 0.0)).unwrap()).unwrap();

    let mut g1 = Shape::group();
    g1.set_transform(Matrix4D::rotation_y(std::f64::consts::PI / 2.0)).unwrap();
    g1.add_child(g2).unwrap();

    let s = &g1.children().unwrap()[0].children().unwrap()[0];
    let p = s.world_to_object(Tuple4D::point(-2.0, 0.0, -10.0));
    assert_eq!(p, Tuple4D::point(0.0, 0.0, -1.0));
}

#[cfg(test)]
fn nested_sphere_group() -> Shape {
    let mut g2 = Shape::group();
    g2.set_transform(Matrix4D::scaling(1.0, 2.0, 3.0)).unwrap();
    g2.add_child(Shape::sphere()
        .with_transform(Matrix4D::translation(5.0, 0.0, 0.0)).unwrap()).unwrap();

    let mut g1 = Shape::group();
    g1.set_transform(Matrix4D::rotation_y(std::f64::consts::PI / 2.0)).unwrap();
    g1.add_child(g2).unwrap();
    g1
}

#[test]
fn converting_a_normal_from_object_to_world_space() {
    let g1 = nested_sphere_group();
    let s = &g1.children().unwrap()[0].children().unwrap()[0];

    let k = 3.0f64.sqrt() / 3.0;
    let n = s.normal_to_world(Tuple4D::vector(k, k, k));
    assert_eq!(n, Tuple4D::vector(0.2857, 0.4286, -0.8571));
}

#[test]
fn finding_the_normal_on_a_child_object() {
    let g1 = nested_sphere_group();
    let s = &g1.children().unwrap()[0].children().unwrap()[0];

    let n = s.normal_at(Tuple4D::point(1.7321, 1.1547, -5.5774));
    assert_eq!(n, Tuple4D::vector(0.2857, 0.4286, -0.8571));
}

#[test]
fn retransforming_a_group_updates_descendants() {
    let mut g = Shape::group();
    g.add_child(Shape::sphere()).unwrap();
    g.set_transform(Matrix4D::translation(0.0, 0.0, 10.0)).unwrap();

    let s = &g.children().unwrap()[0];
    assert_eq!(s.world_to_object(Tuple4D::point(0.0, 0.0, 10.0)),
        Tuple4D::origin());
}

#[test]
fn shadow_flag_propagates_through_groups() {
    let mut inner = Shape::group();
    inner.add_child(Shape::sphere()).unwrap();
    let mut g = Shape::group();
    g.add_child(inner).unwrap();

    g.set_casts_shadow(false);
    let leaf = &g.children().unwrap()[0].children().unwrap()[0];
    assert!(!leaf.casts_shadow());
    assert!(Shape::sphere().casts_shadow());
}

#[test]
fn cone_apex_normal_is_usable() {
    let cone = Shape::bounded_cone(-1.0, 1.0, true);
    let n = cone.normal_at(Tuple4D::origin());

    assert_eq!(n, Tuple4D::vector(0.0, 1.0, 0.0));

    let mut xs = intersect(&cone, &ray((0.0, 0.0, -5.0), (0.0, 0.0, 1.0))).unwrap();
    let hit = xs.hit().unwrap();
    assert_eq!(hit.what.normal_at(ray((0.0, 0.0, -5.0), (0.0, 0.0, 1.0))
        .position(hit.t)), Tuple4D::vector(0.0, 1.0, 0.0));
}

#[test]
fn group_bounds_follow_added_children() {
    let mut g = Shape::group();
    g.add_child(Shape::sphere().with_transform(
        Matrix4D::translation(2.0, 0.0, 0.0)).unwrap()).unwrap();

    assert_eq!(*g.bounds(), Bounds::new(1.0, -1.0, -1.0, 3.0, 1.0, 1.0));

    let mut s = Shape::sphere();
    let before = *s.bounds();
    assert!(s.add_child(Shape::cube()).is_err());
    assert_eq!(*s.bounds(), before);
}
