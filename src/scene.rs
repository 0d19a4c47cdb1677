use std::fs;
use std::path::{ Path, PathBuf };

use serde::{ Serialize, Deserialize };

use crate::error::{ Result, TracerError };
use crate::tuple::Tuple4D;
use crate::matrix::Matrix4D;
use crate::color::Color;
use crate::pattern::Pattern;
use crate::light::{ PointLight, Material };
use crate::shape::Shape;
use crate::world::World;
use crate::camera::Camera;
use crate::obj::ObjParser;

/// A world and the camera to view it through.
#[derive(Debug)]
pub struct Scene {
    pub world: World,
    pub camera: Camera,
}

impl Scene {
    /// Reads a JSON scene description from `path`.
    ///
    /// OBJ files named by the scene are resolved relative to the scene file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Scene> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)?;
        let scene_json: SceneJson = serde_json::from_str(&text)?;

        let base = path.parent().map(Path::to_path_buf).unwrap_or_default();
        let scene = scene_json.into_scene(&base)?;

        log::info!("Loaded scene {:?}: {} objects, {} lights",
            path, scene.world.objects.len(), scene.world.lights.len());
        Ok(scene)
    }
}

impl TryFrom<SceneJson> for Scene {
    type Error = TracerError;

    fn try_from(scene_json: SceneJson) -> Result<Scene> {
        scene_json.into_scene(Path::new(""))
    }
}

/// The top level of a JSON scene description.
///
/// ```json
/// {
///     "camera": { "width": 100, "height": 50, "field_of_view": 1.047,
///                 "from": [0, 1.5, -5], "to": [0, 1, 0], "up": [0, 1, 0] },
///     "lights": [ { "intensity": [1, 1, 1], "position": [-10, 10, -10] } ],
///     "shapes": [
///         { "type": "sphere", "transform": [ { "translate": [0, 1, 0] } ],
///           "material": { "color": [0.1, 1, 0.5], "diffuse": 0.7 } }
///     ]
/// }
/// ```
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SceneJson {
    pub camera: CameraJson,

    #[serde(default)]
    pub lights: Vec<LightJson>,

    #[serde(default)]
    pub shapes: Vec<ShapeJson>,
}

impl SceneJson {
    /// Builds the scene. Relative OBJ paths are resolved against `base`.
    pub fn into_scene(self, base: &Path) -> Result<Scene> {
        let camera = self.camera.into_camera()?;

        let mut world = World::new();
        for light in self.lights {
            world.add_light(PointLight::new(
                color(light.intensity),
                point(light.position),
            ))?;
        }
        for shape in self.shapes {
            world.add_object(shape.into_shape(base, None)?)?;
        }

        Ok(Scene { world, camera })
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CameraJson {
    pub width: usize,
    pub height: usize,

    /// Horizontal field of view, in radians.
    pub field_of_view: f64,

    pub from: [f64; 3],
    pub to: [f64; 3],
    pub up: [f64; 3],
}

impl CameraJson {
    fn into_camera(self) -> Result<Camera> {
        let mut camera = Camera::new(self.width, self.height, self.field_of_view);
        camera.look_at(point(self.from), point(self.to), vector(self.up))
            .map_err(|_| TracerError::Scene(
                "camera from, to and up do not define a view".into()
            ))?;

        Ok(camera)
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LightJson {
    pub intensity: [f64; 3],
    pub position: [f64; 3],
}

/// One primitive transformation.
///
/// A list of these is multiplied together in the order written, so the last
/// entry is the first one applied to the shape.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransformJson {
    Translate([f64; 3]),
    Scale([f64; 3]),
    RotateX(f64),
    RotateY(f64),
    RotateZ(f64),

    /// `[xy, xz, yx, yz, zx, zy]`.
    Shear([f64; 6]),
}

impl TransformJson {
    fn to_matrix(&self) -> Matrix4D {
        match *self {
            TransformJson::Translate([x, y, z]) => Matrix4D::translation(x, y, z),
            TransformJson::Scale([x, y, z]) => Matrix4D::scaling(x, y, z),
            TransformJson::RotateX(r) => Matrix4D::rotation_x(r),
            TransformJson::RotateY(r) => Matrix4D::rotation_y(r),
            TransformJson::RotateZ(r) => Matrix4D::rotation_z(r),
            TransformJson::Shear([xy, xz, yx, yz, zx, zy])
                => Matrix4D::shearing(xy, xz, yx, yz, zx, zy),
        }
    }
}

fn compose(transforms: &[TransformJson]) -> Matrix4D {
    transforms.iter()
        .fold(Matrix4D::identity(), |m, t| m * t.to_matrix())
}

/// Material attributes. Anything left out keeps its default value.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct MaterialJson {
    pub color: [f64; 3],
    pub pattern: Option<PatternJson>,

    pub ambient: f64,
    pub diffuse: f64,
    pub specular: f64,
    pub shininess: f64,

    pub reflective: f64,
    pub refractive_index: f64,
    pub transparency: f64,
}

impl Default for MaterialJson {
    fn default() -> MaterialJson {
        let m = Material::default();

        MaterialJson {
            color: [m.color.r, m.color.g, m.color.b],
            pattern: None,

            ambient: m.ambient,
            diffuse: m.diffuse,
            specular: m.specular,
            shininess: m.shininess,

            reflective: m.reflective,
            refractive_index: m.refractive_index,
            transparency: m.transparency,
        }
    }
}

impl MaterialJson {
    fn into_material(self) -> Result<Material> {
        Ok(Material {
            color: color(self.color),
            pattern: self.pattern.map(PatternJson::into_pattern).transpose()?,

            ambient: self.ambient,
            diffuse: self.diffuse,
            specular: self.specular,
            shininess: self.shininess,

            reflective: self.reflective,
            refractive_index: self.refractive_index,
            transparency: self.transparency,
        })
    }
}

/// A pattern, possibly built from other patterns.
///
/// Operands come from `patterns`, or from `colors` as solid patterns when
/// `patterns` is empty. Two-operand kinds are `stripe`, `ring`, `gradient`,
/// `radial_gradient`, `checker` and `blend`. `solid` takes `color`;
/// `perturb` takes one operand and `scale`; `cube_map` takes six operands in
/// the order left, front, right, back, up, down.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PatternJson {
    #[serde(rename = "type")]
    pub ty: String,

    #[serde(default)]
    pub color: Option<[f64; 3]>,

    #[serde(default)]
    pub colors: Vec<[f64; 3]>,

    #[serde(default)]
    pub patterns: Vec<PatternJson>,

    #[serde(default)]
    pub scale: Option<f64>,

    #[serde(default)]
    pub transform: Vec<TransformJson>,
}

impl PatternJson {
    fn into_pattern(self) -> Result<Pattern> {
        let transform = compose(&self.transform);
        let ty = self.ty;

        let mut operands: Vec<Pattern> = if self.patterns.is_empty() {
            self.colors.into_iter().map(|c| Pattern::solid(color(c))).collect()
        } else {
            self.patterns.into_iter()
                .map(PatternJson::into_pattern)
                .collect::<Result<Vec<_>>>()?
        };

        let arity = |n: usize, operands: &[Pattern]| {
            if operands.len() == n {
                Ok(())
            } else {
                Err(TracerError::Scene(format!(
                    "`{}` pattern takes {} operand(s), got {}",
                    ty, n, operands.len()
                )))
            }
        };

        let pattern = match ty.as_str() {
            "solid" => {
                let c = self.color.ok_or_else(|| TracerError::Scene(
                    "`solid` pattern needs a `color`".into()
                ))?;
                Pattern::solid(color(c))
            },
            "perturb" => {
                arity(1, &operands)?;
                let scale = self.scale.unwrap_or(1.0);
                Pattern::perturb(scale, operands.remove(0))
            },
            "cube_map" => {
                arity(6, &operands)?;
                let [left, front, right, back, up, down] =
                    <[Pattern; 6]>::try_from(operands).map_err(|_|
                        TracerError::Scene("`cube_map` needs six faces".into())
                    )?;
                Pattern::cube_map(left, front, right, back, up, down)
            },
            "stripe" | "ring" | "gradient" | "radial_gradient" | "checker"
                | "blend" => {
                arity(2, &operands)?;
                let b = operands.remove(1);
                let a = operands.remove(0);

                match ty.as_str() {
                    "stripe" => Pattern::stripe(a, b),
                    "ring" => Pattern::ring(a, b),
                    "gradient" => Pattern::gradient(a, b),
                    "radial_gradient" => Pattern::radial_gradient(a, b),
                    "checker" => Pattern::checker(a, b),
                    _ => Pattern::blend(a, b),
                }
            },
            other => return Err(TracerError::Scene(
                format!("unknown pattern type `{}`", other)
            )),
        };

        pattern.with_transform(transform)
    }
}

/// A shape, or a group of shapes.
///
/// `type` is one of `sphere`, `plane`, `cube`, `cylinder`, `cone`,
/// `triangle`, `group` or `obj`. Cylinders and cones use `minimum`,
/// `maximum` and `closed`; triangles use `points`; groups use `children`;
/// `obj` loads the mesh at `file`. A group's material is handed down to any
/// child that has none of its own.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ShapeJson {
    #[serde(rename = "type")]
    pub ty: String,

    #[serde(default)]
    pub transform: Vec<TransformJson>,

    #[serde(default)]
    pub material: Option<MaterialJson>,

    #[serde(default)]
    pub casts_shadow: Option<bool>,

    #[serde(default)]
    pub minimum: Option<f64>,

    #[serde(default)]
    pub maximum: Option<f64>,

    #[serde(default)]
    pub closed: bool,

    #[serde(default)]
    pub points: Vec<[f64; 3]>,

    #[serde(default)]
    pub children: Vec<ShapeJson>,

    #[serde(default)]
    pub file: Option<PathBuf>,
}

impl ShapeJson {
    fn into_shape(self, base: &Path, inherited: Option<&Material>) -> Result<Shape> {
        let material = match self.material {
            Some(m) => Some(m.into_material()?),
            None => inherited.cloned(),
        };

        let minimum = self.minimum.unwrap_or(f64::NEG_INFINITY);
        let maximum = self.maximum.unwrap_or(f64::INFINITY);

        let mut shape = match self.ty.as_str() {
            "sphere" => Shape::sphere(),
            "plane" => Shape::plane(),
            "cube" => Shape::cube(),
            "cylinder" => Shape::bounded_cylinder(minimum, maximum, self.closed),
            "cone" => Shape::bounded_cone(minimum, maximum, self.closed),
            "triangle" => match self.points[..] {
                [p1, p2, p3] => Shape::triangle(point(p1), point(p2), point(p3)),
                _ => return Err(TracerError::Scene(
                    "a triangle needs exactly three `points`".into()
                )),
            },
            "group" => {
                let mut group = Shape::group();
                for child in self.children {
                    group.add_child(child.into_shape(base, material.as_ref())?)?;
                }

                group
            },
            "obj" => {
                let file = self.file.ok_or_else(|| TracerError::Scene(
                    "an `obj` shape needs a `file`".into()
                ))?;
                ObjParser::load(base.join(file))?.into_group()?
            },
            other => return Err(TracerError::Scene(
                format!("unknown shape type `{}`", other)
            )),
        };

        if let Some(m) = material {
            if shape.is_group() {
                // Children already carry their own or the inherited material.
                if self.ty == "obj" {
                    shape.set_material(m);
                }
            } else {
                shape.material = m;
            }
        }
        if let Some(casts_shadow) = self.casts_shadow {
            shape.set_casts_shadow(casts_shadow);
        }

        shape.set_transform(compose(&self.transform))
            .map_err(|_| TracerError::Scene(
                format!("`{}` transform is not invertible", self.ty)
            ))?;
        Ok(shape)
    }
}

fn point(p: [f64; 3]) -> Tuple4D {
    Tuple4D::point(p[0], p[1], p[2])
}

fn vector(v: [f64; 3]) -> Tuple4D {
    Tuple4D::vector(v[0], v[1], v[2])
}

fn color(c: [f64; 3]) -> Color {
    Color::rgb(c[0], c[1], c[2])
}

#[cfg(test)]
fn parse(text: &str) -> Result<Scene> {
    let scene_json: SceneJson = serde_json::from_str(text)?;
    Scene::try_from(scene_json)
}

#[cfg(test)]
const CAMERA: &str = r#""camera": { "width": 20, "height": 10,
    "field_of_view": 1.0471975512, "from": [0, 0, -5], "to": [0, 0, 0],
    "up": [0, 1, 0] }"#;

#[test]
fn minimal_scene() {
    let scene = parse(&format!("{{ {} }}", CAMERA)).unwrap();

    assert_eq!(scene.camera.hsize, 20);
    assert_eq!(scene.camera.vsize, 10);
    assert!(scene.camera.orientation().is_some());
    assert!(scene.world.objects.is_empty());
}

#[test]
fn shapes_lights_and_materials() {
    let scene = parse(&format!(r#"{{ {},
        "lights": [ {{ "intensity": [1, 1, 1], "position": [-10, 10, -10] }} ],
        "shapes": [
            {{ "type": "sphere", "material": {{ "color": [0.8, 1.0, 0.6],
                "diffuse": 0.7, "specular": 0.2 }} }},
            {{ "type": "sphere", "transform": [ {{ "scale": [0.5, 0.5, 0.5] }} ] }}
        ] }}"#, CAMERA)).unwrap();

    assert_eq!(scene.world.lights.len(), 1);
    assert_eq!(scene.world.lights[0].position, Tuple4D::point(-10.0, 10.0, -10.0));

    let s1 = &scene.world.objects[0];
    assert_eq!(s1.material.color, Color::rgb(0.8, 1.0, 0.6));
    assert_eq!(s1.material.diffuse, 0.7);
    assert_eq!(s1.material.ambient, 0.1);

    let s2 = &scene.world.objects[1];
    assert_eq!(*s2.transform(), Matrix4D::scaling(0.5, 0.5, 0.5));
}

#[test]
fn transforms_compose_in_written_order() {
    let shape: ShapeJson = serde_json::from_str(r#"{ "type": "cube",
        "transform": [ { "translate": [10, 5, 7] }, { "scale": [5, 5, 5] },
                       { "rotate_x": 1.5707963268 } ] }"#).unwrap();
    let shape = shape.into_shape(Path::new(""), None).unwrap();

    let expected = Matrix4D::translation(10.0, 5.0, 7.0)
        * Matrix4D::scaling(5.0, 5.0, 5.0)
        * Matrix4D::rotation_x(std::f64::consts::PI / 2.0);
    assert_eq!(*shape.transform(), expected);
}

#[test]
fn groups_hand_material_down() {
    let shape: ShapeJson = serde_json::from_str(r#"{ "type": "group",
        "material": { "reflective": 0.5 },
        "casts_shadow": false,
        "children": [
            { "type": "sphere" },
            { "type": "cylinder", "minimum": 0, "maximum": 2, "closed": true,
              "material": { "reflective": 0.25 } }
        ] }"#).unwrap();
    let group = shape.into_shape(Path::new(""), None).unwrap();
    let children = group.children().unwrap();

    assert_eq!(children[0].material.reflective, 0.5);
    assert_eq!(children[1].material.reflective, 0.25);
    assert!(children.iter().all(|c| !c.casts_shadow()));
}

#[test]
fn nested_patterns() {
    let m: MaterialJson = serde_json::from_str(r#"{ "pattern": {
        "type": "checker",
        "patterns": [
            { "type": "stripe", "colors": [[1, 1, 1], [0, 0, 0]] },
            { "type": "solid", "color": [1, 0, 0] }
        ],
        "transform": [ { "scale": [0.5, 0.5, 0.5] } ] } }"#).unwrap();
    let pattern = m.into_material().unwrap().pattern.unwrap();

    assert_eq!(*pattern.transform(), Matrix4D::scaling(0.5, 0.5, 0.5));
    assert_eq!(pattern.pattern_at(Tuple4D::point(1.5, 0.0, 1.5)), Color::black());
    assert_eq!(pattern.pattern_at(Tuple4D::point(1.5, 0.0, 0.0)),
        Color::rgb(1.0, 0.0, 0.0));
}

#[test]
fn pattern_with_wrong_operand_count_is_rejected() {
    let p: PatternJson = serde_json::from_str(
        r#"{ "type": "stripe", "colors": [[1, 1, 1]] }"#).unwrap();

    assert!(matches!(p.into_pattern(), Err(TracerError::Scene(_))));
}

#[test]
fn unknown_shape_type_is_rejected() {
    let result = parse(&format!(r#"{{ {},
        "shapes": [ {{ "type": "teapot" }} ] }}"#, CAMERA));

    assert!(matches!(result, Err(TracerError::Scene(_))));
}

#[test]
fn singular_transform_is_rejected() {
    let result = parse(&format!(r#"{{ {},
        "shapes": [ {{ "type": "sphere",
            "transform": [ {{ "scale": [0, 1, 1] }} ] }} ] }}"#, CAMERA));

    assert!(matches!(result, Err(TracerError::Scene(_))));
}

#[test]
fn malformed_json_is_a_json_error() {
    assert!(matches!(parse("{ \"camera\": "), Err(TracerError::Json(_))));
}

#[test]
fn degenerate_camera_is_rejected() {
    let result = parse(r#"{ "camera": { "width": 4, "height": 4,
        "field_of_view": 1.0, "from": [0, 0, 0], "to": [0, 0, 0],
        "up": [0, 1, 0] } }"#);

    assert!(matches!(result, Err(TracerError::Scene(_))));
}
