use crate::consts::RECURSION_DEPTH;
use crate::error::Result;
use crate::ray::Ray4D;
use crate::tuple::Tuple4D;
use crate::color::Color;
use crate::light::{ PointLight, lighting };
use crate::shape::Shape;
use crate::intersect::{ Intersections, IntersectionComputation };

/// A world with objects and lights.
///
/// Worlds collect every top-level shape and every light for rendering, and
/// own the recursive color computation. A world is read-only while it is
/// being rendered, so one world can be shared by any number of workers.
#[derive(Clone, Debug, Default)]
pub struct World {
    pub objects: Vec<Shape>,
    pub lights: Vec<PointLight>,
}

impl World {
    /// Creates an empty world with no objects and no lights.
    pub fn new() -> World {
        Default::default()
    }

    /// Adds a top-level shape, failing if the object list cannot grow.
    pub fn add_object(&mut self, shape: Shape) -> Result<()> {
        self.objects.try_reserve(1)?;
        self.objects.push(shape);
        Ok(())
    }

    pub fn add_light(&mut self, light: PointLight) -> Result<()> {
        self.lights.try_reserve(1)?;
        self.lights.push(light);
        Ok(())
    }

    /// Intersects a ray against all objects in the world.
    ///
    /// `xs` is cleared first, then filled with every hit sorted by `t`.
    pub fn intersect<'w>(&'w self, r: &Ray4D, xs: &mut Intersections<'w>)
        -> Result<()> {
        xs.clear();
        for obj in self.objects.iter() {
            obj.intersect_into(r, xs)?;
        }

        xs.sort();
        Ok(())
    }

    /// Like `intersect`, into a freshly allocated list.
    pub fn intersections(&self, r: &Ray4D) -> Result<Intersections<'_>> {
        let mut xs = Intersections::new();
        self.intersect(r, &mut xs)?;
        Ok(xs)
    }

    /// Determines whether a point is shadowed from `light`.
    ///
    /// Only shapes that cast shadows count, and only when they sit strictly
    /// between the point and the light.
    pub fn is_shadowed<'w>(&'w self, light: &PointLight, p: Tuple4D,
        xs: &mut Intersections<'w>) -> Result<bool> {
        let v = light.position - p;
        let distance = v.magnitude();

        // A point at the light itself has nothing in between.
        if distance == 0.0 {
            return Ok(false);
        }

        let r = Ray4D::new(p, v / distance);
        self.intersect(&r, xs)?;

        Ok(xs.intersections.iter().any(|i|
            i.what.casts_shadow() && i.t > 0.0 && i.t < distance
        ))
    }

    /// Calculates the color for a hit: local lighting from every light, plus
    /// reflected and refracted contributions while `remaining` allows.
    pub fn shade_hit<'w>(&'w self, comps: &IntersectionComputation<'w>,
        remaining: usize, xs: &mut Intersections<'w>) -> Result<Color> {
        let mut surface = Color::black();
        for light in self.lights.iter() {
            let shadowed = self.is_shadowed(light, comps.over_point, xs)?;
            surface = surface + lighting(light, comps.obj, comps.over_point,
                comps.eyev, comps.normalv, shadowed);
        }

        if remaining == 0 {
            return Ok(surface);
        }

        let reflected = self.reflected_color(comps, remaining, xs)?;
        let refracted = self.refracted_color(comps, remaining, xs)?;

        Ok(surface + reflected + refracted)
    }

    /// Determines the color seen along a ray.
    ///
    /// `remaining` bounds how many more reflection or refraction bounces may
    /// follow; at zero only the surface itself is shaded. `xs` is scratch
    /// space, reused at every level of recursion.
    pub fn color_at<'w>(&'w self, r: &Ray4D, remaining: usize,
        xs: &mut Intersections<'w>) -> Result<Color> {
        self.intersect(r, xs)?;

        match xs.hit() {
            None => Ok(Color::black()),
            Some(i) => {
                let comps = IntersectionComputation::new(r, &i);
                self.shade_hit(&comps, remaining, xs)
            },
        }
    }

    /// `color_at` with the default recursion depth and its own scratch list.
    pub fn color(&self, r: &Ray4D) -> Result<Color> {
        let mut xs = Intersections::new();
        self.color_at(r, RECURSION_DEPTH, &mut xs)
    }

    /// The color reflected off a hit, scaled by the material's reflectivity.
    pub fn reflected_color<'w>(&'w self, comps: &IntersectionComputation<'w>,
        remaining: usize, xs: &mut Intersections<'w>) -> Result<Color> {
        let reflective = comps.obj.material.reflective;
        if remaining == 0 || reflective <= 0.0 {
            return Ok(Color::black());
        }

        let r = Ray4D::new(comps.over_point, comps.reflectv);
        Ok(self.color_at(&r, remaining - 1, xs)? * reflective)
    }

    /// The color seen through a hit, scaled by the material's transparency.
    ///
    /// Total internal reflection contributes black.
    pub fn refracted_color<'w>(&'w self, comps: &IntersectionComputation<'w>,
        remaining: usize, xs: &mut Intersections<'w>) -> Result<Color> {
        let transparency = comps.obj.material.transparency;
        if remaining == 0 || transparency <= 0.0 {
            return Ok(Color::black());
        }

        match comps.refracted_direction() {
            None => Ok(Color::black()),
            Some(direction) => {
                let r = Ray4D::new(comps.under_point, direction);
                Ok(self.color_at(&r, remaining - 1, xs)? * transparency)
            },
        }
    }
}

/// Two concentric spheres lit from the upper left, used throughout the tests.
#[cfg(test)]
pub(crate) fn test_world() -> World {
    use crate::matrix::Matrix4D;

    let mut w = World::new();
    w.add_light(PointLight::new(
        Color::rgb(1.0, 1.0, 1.0),
        Tuple4D::point(-10.0, 10.0, -10.0)
    )).unwrap();

    let mut s1 = Shape::sphere();
    s1.material.color = Color::rgb(0.8, 1.0, 0.6);
    s1.material.diffuse = 0.7;
    s1.material.specular = 0.2;
    w.add_object(s1).unwrap();

    let s2 = Shape::sphere()
        .with_transform(Matrix4D::scaling(0.5, 0.5, 0.5)).unwrap();
    w.add_object(s2).unwrap();

    w
}

#[cfg(test)]
fn reflective_floor(reflective: f64, transparency: f64) -> Shape {
    use crate::matrix::Matrix4D;

    let mut floor = Shape::plane()
        .with_transform(Matrix4D::translation(0.0, -1.0, 0.0)).unwrap();
    floor.material.reflective = reflective;
    floor.material.transparency = transparency;
    floor.material.refractive_index = 1.5;
    floor
}

#[cfg(test)]
fn ray_down_at_floor() -> Ray4D {
    let h = 2.0f64.sqrt() / 2.0;
    Ray4D::new(Tuple4D::point(0.0, 0.0, -3.0), Tuple4D::vector(0.0, -h, h))
}

#[test]
fn intersect_default_world_with_ray() {
    let w = test_world();
    let r = Ray4D::new(
        Tuple4D::point(0.0, 0.0, -5.0),
        Tuple4D::vector(0.0, 0.0, 1.0),
    );

    let xs = w.intersections(&r).unwrap();
    let ts: Vec<f64> = xs.intersections.iter().map(|i| i.t).collect();
    assert_eq!(ts, vec![4.0, 4.5, 5.5, 6.0]);
}

#[test]
fn empty_world_is_black() {
    let w = World::new();
    let r = Ray4D::new(Tuple4D::origin(), Tuple4D::vector(0.0, 0.0, 1.0));

    assert_eq!(w.color(&r).unwrap(), Color::black());
}

#[test]
fn shade_intersection_from_outside() {
    use crate::intersect::Intersection;

    let w = test_world();
    let r = Ray4D::new(
        Tuple4D::point(0.0, 0.0, -5.0),
        Tuple4D::vector(0.0, 0.0, 1.0)
    );

    let i = Intersection::new(4.0, &w.objects[0]);
    let comps = IntersectionComputation::new(&r, &i);
    let mut xs = Intersections::new();

    assert_eq!(w.shade_hit(&comps, RECURSION_DEPTH, &mut xs).unwrap(),
        Color::rgb(0.38066, 0.47583, 0.2855));
}

#[test]
fn shade_intersection_from_inside() {
    use crate::intersect::Intersection;

    let mut w = test_world();
    w.lights = vec![PointLight::new(
        Color::rgb(1.0, 1.0, 1.0),
        Tuple4D::point(0.0, 0.25, 0.0),
    )];

    let r = Ray4D::new(Tuple4D::origin(), Tuple4D::vector(0.0, 0.0, 1.0));
    let i = Intersection::new(0.5, &w.objects[1]);
    let comps = IntersectionComputation::new(&r, &i);
    let mut xs = Intersections::new();

    assert_eq!(w.shade_hit(&comps, RECURSION_DEPTH, &mut xs).unwrap(),
        Color::rgb(0.90498, 0.90498, 0.90498));
}

#[test]
fn shade_intersection_in_shadow() {
    use crate::intersect::Intersection;
    use crate::matrix::Matrix4D;

    let mut w = World::new();
    w.add_light(PointLight::new(
        Color::rgb(1.0, 1.0, 1.0),
        Tuple4D::point(0.0, 0.0, -10.0),
    )).unwrap();
    w.add_object(Shape::sphere()).unwrap();
    w.add_object(Shape::sphere()
        .with_transform(Matrix4D::translation(0.0, 0.0, 10.0)).unwrap())
        .unwrap();

    let r = Ray4D::new(
        Tuple4D::point(0.0, 0.0, 5.0),
        Tuple4D::vector(0.0, 0.0, 1.0),
    );

    let i = Intersection::new(4.0, &w.objects[1]);
    let comps = IntersectionComputation::new(&r, &i);
    let mut xs = Intersections::new();

    assert_eq!(w.shade_hit(&comps, RECURSION_DEPTH, &mut xs).unwrap(),
        Color::rgb(0.1, 0.1, 0.1));
}

#[test]
fn color_ray_miss() {
    let w = test_world();
    let r = Ray4D::new(
        Tuple4D::point(0.0, 0.0, -5.0),
        Tuple4D::vector(0.0, 1.0, 0.0),
    );

    assert_eq!(w.color(&r).unwrap(), Color::black());
}

#[test]
fn color_ray_hit() {
    let w = test_world();
    let r = Ray4D::new(
        Tuple4D::point(0.0, 0.0, -5.0),
        Tuple4D::vector(0.0, 0.0, 1.0),
    );

    assert_eq!(w.color(&r).unwrap(), Color::rgb(0.38066, 0.47583, 0.2855));
}

#[test]
fn color_with_intersection_behind_ray() {
    let mut w = test_world();
    w.objects[0].material.ambient = 1.0;
    w.objects[1].material.ambient = 1.0;

    let r = Ray4D::new(
        Tuple4D::point(0.0, 0.0, 0.75),
        Tuple4D::vector(0.0, 0.0, -1.0)
    );

    assert_eq!(w.color(&r).unwrap(), w.objects[1].material.color);
}

#[cfg(test)]
fn shadowed_in_test_world(w: &World, p: Tuple4D) -> bool {
    let mut xs = Intersections::new();
    w.is_shadowed(&w.lights[0], p, &mut xs).unwrap()
}

#[test]
fn shadow_collinear_point_and_light() {
    let w = test_world();

    assert!(!shadowed_in_test_world(&w, Tuple4D::point(0.0, 10.0, 0.0)));
}

#[test]
fn shadow_object_between_point_and_light() {
    let w = test_world();

    assert!(shadowed_in_test_world(&w, Tuple4D::point(10.0, -10.0, 10.0)));
}

#[test]
fn shadow_object_behind_light() {
    let w = test_world();

    assert!(!shadowed_in_test_world(&w, Tuple4D::point(-20.0, 20.0, -20.0)));
}

#[test]
fn shadow_object_behind_point() {
    let w = test_world();

    assert!(!shadowed_in_test_world(&w, Tuple4D::point(-2.0, 2.0, -2.0)));
}

#[test]
fn non_shadow_casting_objects_let_light_through() {
    let mut w = test_world();
    for obj in w.objects.iter_mut() {
        obj.set_casts_shadow(false);
    }

    assert!(!shadowed_in_test_world(&w, Tuple4D::point(10.0, -10.0, 10.0)));
}

#[test]
fn each_light_contributes() {
    let one = test_world();
    let mut two = test_world();
    two.add_light(one.lights[0]).unwrap();

    let r = Ray4D::new(
        Tuple4D::point(0.0, 0.0, -5.0),
        Tuple4D::vector(0.0, 0.0, 1.0),
    );

    let single = one.color(&r).unwrap();
    assert_eq!(two.color(&r).unwrap(), single + single);
}

#[test]
fn reflected_color_for_nonreflective_material() {
    use crate::intersect::Intersection;

    let mut w = test_world();
    w.objects[1].material.ambient = 1.0;

    let r = Ray4D::new(Tuple4D::origin(), Tuple4D::vector(0.0, 0.0, 1.0));
    let i = Intersection::new(1.0, &w.objects[1]);
    let comps = IntersectionComputation::new(&r, &i);
    let mut xs = Intersections::new();

    assert_eq!(w.reflected_color(&comps, RECURSION_DEPTH, &mut xs).unwrap(),
        Color::black());
}

#[test]
fn reflected_color_for_reflective_material() {
    use crate::intersect::Intersection;

    let mut w = test_world();
    w.add_object(reflective_floor(0.5, 0.0)).unwrap();

    let r = ray_down_at_floor();
    let i = Intersection::new(2.0f64.sqrt(), &w.objects[2]);
    let comps = IntersectionComputation::new(&r, &i);
    let mut xs = Intersections::new();

    assert_eq!(w.reflected_color(&comps, RECURSION_DEPTH, &mut xs).unwrap(),
        Color::rgb(0.19033, 0.23791, 0.14274));
    assert_eq!(w.shade_hit(&comps, RECURSION_DEPTH, &mut xs).unwrap(),
        Color::rgb(0.87676, 0.92434, 0.82917));
}

#[test]
fn reflection_stops_at_depth_zero() {
    use crate::intersect::Intersection;

    let mut w = test_world();
    w.add_object(reflective_floor(0.5, 0.0)).unwrap();

    let r = ray_down_at_floor();
    let i = Intersection::new(2.0f64.sqrt(), &w.objects[2]);
    let comps = IntersectionComputation::new(&r, &i);
    let mut xs = Intersections::new();

    assert_eq!(w.reflected_color(&comps, 0, &mut xs).unwrap(), Color::black());
}

#[test]
fn depth_zero_returns_bare_surface_color() {
    let mut mirrored = test_world();
    mirrored.add_object(reflective_floor(0.5, 0.0)).unwrap();
    let mut matte = test_world();
    matte.add_object(reflective_floor(0.0, 0.0)).unwrap();

    let r = ray_down_at_floor();
    let mut xs = Intersections::new();
    let a = mirrored.color_at(&r, 0, &mut xs).unwrap();
    let mut xs = Intersections::new();
    let b = matte.color_at(&r, RECURSION_DEPTH, &mut xs).unwrap();

    assert_eq!((a.r, a.g, a.b), (b.r, b.g, b.b));
}

#[test]
fn mutually_reflective_surfaces_terminate() {
    use crate::matrix::Matrix4D;

    let mut w = World::new();
    w.add_light(PointLight::new(Color::white(), Tuple4D::origin())).unwrap();

    let mut lower = Shape::plane()
        .with_transform(Matrix4D::translation(0.0, -1.0, 0.0)).unwrap();
    lower.material.reflective = 1.0;
    let mut upper = Shape::plane()
        .with_transform(Matrix4D::translation(0.0, 1.0, 0.0)).unwrap();
    upper.material.reflective = 1.0;
    w.add_object(lower).unwrap();
    w.add_object(upper).unwrap();

    let r = Ray4D::new(Tuple4D::origin(), Tuple4D::vector(0.0, 1.0, 0.0));
    assert!(w.color(&r).is_ok());
}

#[test]
fn refracted_color_of_opaque_surface() {
    use crate::intersect::Intersection;

    let w = test_world();
    let r = Ray4D::new(
        Tuple4D::point(0.0, 0.0, -5.0),
        Tuple4D::vector(0.0, 0.0, 1.0),
    );
    let i = Intersection::new(4.0, &w.objects[0]);
    let comps = IntersectionComputation::new(&r, &i);
    let mut xs = Intersections::new();

    assert_eq!(w.refracted_color(&comps, RECURSION_DEPTH, &mut xs).unwrap(),
        Color::black());
}

#[test]
fn refracted_color_at_depth_zero() {
    use crate::intersect::Intersection;

    let mut w = test_world();
    w.objects[0].material.transparency = 1.0;
    w.objects[0].material.refractive_index = 1.5;

    let r = Ray4D::new(
        Tuple4D::point(0.0, 0.0, -5.0),
        Tuple4D::vector(0.0, 0.0, 1.0),
    );
    let i = Intersection::new(4.0, &w.objects[0]);
    let comps = IntersectionComputation::new(&r, &i);
    let mut xs = Intersections::new();

    assert_eq!(w.refracted_color(&comps, 0, &mut xs).unwrap(), Color::black());
}

#[test]
fn refracted_color_under_total_internal_reflection() {
    use crate::intersect::Intersection;

    let mut w = test_world();
    w.objects[0].material.transparency = 1.0;
    w.objects[0].material.refractive_index = 1.5;

    let h = 2.0f64.sqrt() / 2.0;
    let r = Ray4D::new(Tuple4D::point(0.0, 0.0, h), Tuple4D::vector(0.0, 1.0, 0.0));
    let i = Intersection::new(h, &w.objects[0]);
    let comps = IntersectionComputation::new(&r, &i);
    let mut xs = Intersections::new();

    assert_eq!(w.refracted_color(&comps, RECURSION_DEPTH, &mut xs).unwrap(),
        Color::black());
}

#[test]
fn shade_hit_with_transparent_material() {
    use crate::intersect::Intersection;
    use crate::matrix::Matrix4D;

    let mut w = test_world();
    w.add_object(reflective_floor(0.0, 0.5)).unwrap();

    let mut ball = Shape::sphere()
        .with_transform(Matrix4D::translation(0.0, -3.5, -0.5)).unwrap();
    ball.material.color = Color::rgb(1.0, 0.0, 0.0);
    ball.material.ambient = 0.5;
    w.add_object(ball).unwrap();

    let r = ray_down_at_floor();
    let i = Intersection::new(2.0f64.sqrt(), &w.objects[2]);
    let comps = IntersectionComputation::new(&r, &i);
    let mut xs = Intersections::new();

    assert_eq!(w.shade_hit(&comps, RECURSION_DEPTH, &mut xs).unwrap(),
        Color::rgb(0.93642, 0.68642, 0.68642));
}

#[test]
fn transparent_sphere_shows_what_is_behind_it() {
    use crate::matrix::Matrix4D;

    let mut w = World::new();
    w.add_light(PointLight::new(Color::white(), Tuple4D::point(0.0, 0.0, -10.0)))
        .unwrap();

    let mut glass = Shape::sphere();
    glass.material.color = Color::black();
    glass.material.ambient = 0.0;
    glass.material.diffuse = 0.0;
    glass.material.specular = 0.0;
    glass.material.transparency = 1.0;
    glass.set_casts_shadow(false);
    w.add_object(glass).unwrap();

    let mut wall = Shape::plane()
        .with_transform(Matrix4D::translation(0.0, 0.0, 5.0)
            * Matrix4D::rotation_x(std::f64::consts::PI / 2.0)).unwrap();
    wall.material.color = Color::rgb(0.0, 1.0, 0.0);
    wall.material.ambient = 1.0;
    wall.material.diffuse = 0.0;
    wall.material.specular = 0.0;
    w.add_object(wall).unwrap();

    // Refractive index 1.0 bends nothing, so the wall shows straight through.
    let r = Ray4D::new(Tuple4D::point(0.0, 0.0, -5.0),
        Tuple4D::vector(0.0, 0.0, 1.0));
    assert_eq!(w.color(&r).unwrap(), Color::rgb(0.0, 1.0, 0.0));
}

#[test]
fn shading_a_cone_at_its_apex() {
    let mut w = World::new();
    w.add_light(PointLight::new(Color::white(),
        Tuple4D::point(0.0, 10.0, -10.0))).unwrap();
    w.add_object(Shape::cone()).unwrap();

    // The ray grazes both nappes exactly at the apex.
    let r = Ray4D::new(Tuple4D::point(0.0, 0.0, -5.0),
        Tuple4D::vector(0.0, 0.0, 1.0));
    assert_eq!(w.color(&r).unwrap(), Color::rgb(0.7364, 0.7364, 0.7364));
}
