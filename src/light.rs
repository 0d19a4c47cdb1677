use crate::color::Color;
use crate::pattern::Pattern;
use crate::tuple::Tuple4D;
use crate::shape::Shape;

/// A point light.
///
/// A very simple light source. Provides a color and a position where light is
/// produced from. Lights have no shape and cast no shadows of their own.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct PointLight {
    pub intensity: Color,
    pub position: Tuple4D,
}

impl PointLight {
    /// Creates a point light.
    ///
    /// If `position` isn't a point, it is converted to a point automatically.
    pub fn new(intensity: Color, mut position: Tuple4D) -> PointLight {
        if !position.is_point() {
            position.w = 1.0;
        }

        PointLight { intensity, position }
    }
}

/// A material record.
///
/// Materials use attributes from the Phong reflection model; ambient, diffuse,
/// specular and shininess. A pattern, when present, replaces `color`.
#[derive(Clone, Debug, PartialEq)]
pub struct Material {
    pub color: Color,
    pub pattern: Option<Pattern>,

    pub ambient: f64,
    pub diffuse: f64,
    pub specular: f64,
    pub shininess: f64,

    pub reflective: f64,
    pub refractive_index: f64,
    pub transparency: f64,
}

impl Default for Material {
    fn default() -> Material {
        Material {
            color: Color::rgb(1.0, 1.0, 1.0),
            pattern: None,

            ambient: 0.1,
            diffuse: 0.9,
            specular: 0.9,
            shininess: 200.0,

            reflective: 0.0,
            refractive_index: 1.0,
            transparency: 0.0,
        }
    }
}

impl Material {
    /// The surface color of `obj` at a world-space point.
    pub fn color_at(&self, obj: &Shape, point: Tuple4D) -> Color {
        match self.pattern {
            Some(ref pattern) => pattern.pattern_at_shape(obj, point),
            None => self.color,
        }
    }
}

/// Calculate the lighting of a point on a shape under a single light.
///
/// Phong shading: ambient is always present; diffuse and specular are added
/// only when the point is lit (`in_shadow` is false) and the light is on the
/// facing side of the surface. Channels are not clamped here.
pub fn lighting(light: &PointLight, obj: &Shape, point: Tuple4D,
    eyev: Tuple4D, normalv: Tuple4D, in_shadow: bool) -> Color {
    let m = &obj.material;

    // Combine surface color with light's color
    let effective_color = m.color_at(obj, point) * light.intensity;
    let ambient = effective_color * m.ambient;

    if in_shadow {
        return ambient;
    }

    let lightv = (light.position - point).normalize();

    // A negative dot product means the light is behind the surface.
    let light_dot_normal = lightv.dot(&normalv);
    if light_dot_normal < 0.0 {
        return ambient;
    }

    let diffuse = effective_color * m.diffuse * light_dot_normal;

    let reflectv = (-lightv).reflect(&normalv);
    let reflect_dot_eye = reflectv.dot(&eyev);

    let specular = if reflect_dot_eye <= 0.0 {
        Color::black()
    } else {
        let factor = reflect_dot_eye.powf(m.shininess);
        light.intensity * m.specular * factor
    };

    ambient + diffuse + specular
}

#[cfg(test)]
fn lit_at_origin(eyev: Tuple4D, light_position: Tuple4D, in_shadow: bool)
    -> Color {
    let s = Shape::sphere();
    let light = PointLight::new(Color::white(), light_position);

    lighting(&light, &s, Tuple4D::origin(), eyev,
        Tuple4D::vector(0.0, 0.0, -1.0), in_shadow)
}

#[test]
fn eye_between_light_and_surface() {
    let res = lit_at_origin(Tuple4D::vector(0.0, 0.0, -1.0),
        Tuple4D::point(0.0, 0.0, -10.0), false);

    assert_eq!(res, Color::rgb(1.9, 1.9, 1.9));
}

#[test]
fn eye_between_light_and_surface_offset_45() {
    let h = 2.0f64.sqrt() / 2.0;
    let res = lit_at_origin(Tuple4D::vector(0.0, h, -h),
        Tuple4D::point(0.0, 0.0, -10.0), false);

    assert_eq!(res, Color::rgb(1.0, 1.0, 1.0));
}

#[test]
fn eye_opposite_from_surface_offset_45() {
    let res = lit_at_origin(Tuple4D::vector(0.0, 0.0, -1.0),
        Tuple4D::point(0.0, 10.0, -10.0), false);

    assert_eq!(res, Color::rgb(0.7364, 0.7364, 0.7364));
}

#[test]
fn eye_in_path_of_reflection() {
    let h = 2.0f64.sqrt() / 2.0;
    let res = lit_at_origin(Tuple4D::vector(0.0, -h, -h),
        Tuple4D::point(0.0, 10.0, -10.0), false);

    assert_eq!(res, Color::rgb(1.6364, 1.6364, 1.6364));
}

#[test]
fn light_behind_surface() {
    let res = lit_at_origin(Tuple4D::vector(0.0, 0.0, -1.0),
        Tuple4D::point(0.0, 0.0, 10.0), false);

    assert_eq!(res, Color::rgb(0.1, 0.1, 0.1));
}

#[test]
fn surface_in_shadow_is_ambient_only() {
    let res = lit_at_origin(Tuple4D::vector(0.0, 0.0, -1.0),
        Tuple4D::point(0.0, 0.0, -10.0), true);

    assert_eq!(res, Color::rgb(0.1, 0.1, 0.1));
}

#[test]
fn lighting_with_stripe_pattern() {
    let mut s = Shape::sphere();
    s.material = Material {
        color: Color::rgb(0.5, 0.5, 0.5),
        pattern: Some(Pattern::stripe(Color::white(), Color::black())),

        // Only ambient light, so the pattern shows through unchanged.
        ambient: 1.0,
        diffuse: 0.0,
        specular: 0.0,

        ..Default::default()
    };

    let eyev = Tuple4D::vector(0.0, 0.0, -1.0);
    let normalv = Tuple4D::vector(0.0, 0.0, -1.0);
    let light = PointLight::new(Color::white(), Tuple4D::point(0.0, 0.0, -10.0));

    assert_eq!(Color::white(),
        lighting(&light, &s, Tuple4D::point(0.9, 0.0, 0.0), eyev, normalv, false));
    assert_eq!(Color::black(),
        lighting(&light, &s, Tuple4D::point(1.1, 0.0, 0.0), eyev, normalv, false));
}

#[test]
fn light_intensity_tints_result() {
    let s = Shape::sphere();
    let light = PointLight::new(Color::rgb(1.0, 0.0, 0.0),
        Tuple4D::point(0.0, 0.0, -10.0));
    let n = Tuple4D::vector(0.0, 0.0, -1.0);

    assert_eq!(lighting(&light, &s, Tuple4D::origin(), n, n, false),
        Color::rgb(1.9, 0.0, 0.0));
}

#[test]
fn point_light_coerces_position() {
    let l = PointLight::new(Color::white(), Tuple4D::vector(1.0, 2.0, 3.0));

    assert!(l.position.is_point());
}
