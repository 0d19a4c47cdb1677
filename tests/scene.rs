use whitted_tracer::TracerError;
use whitted_tracer::tuple::Tuple4D;
use whitted_tracer::color::Color;
use whitted_tracer::ray::Ray4D;
use whitted_tracer::scene::{ Scene, SceneJson };

const FIXTURE: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/data/scene.json");

#[test]
fn fixture_loads_every_shape() {
    let scene = Scene::load(FIXTURE).unwrap();

    assert_eq!(scene.camera.hsize, 32);
    assert_eq!(scene.camera.vsize, 24);
    assert_eq!(scene.world.lights.len(), 2);
    assert_eq!(scene.world.objects.len(), 5);

    let group = &scene.world.objects[2];
    let children = group.children().unwrap();
    assert_eq!(children.len(), 2);
    assert!(children.iter().all(|c| c.material.color == Color::rgb(1.0, 0.6, 0.2)));
}

#[test]
fn obj_mesh_is_loaded_relative_to_scene() {
    let scene = Scene::load(FIXTURE).unwrap();
    let mesh = &scene.world.objects[3];

    // One child group per named OBJ group.
    let groups = mesh.children().unwrap();
    assert_eq!(groups.len(), 2);

    let triangles: usize = groups.iter()
        .map(|g| g.children().unwrap().len())
        .sum();
    assert_eq!(triangles, 6);

    assert!(!mesh.casts_shadow());
    assert!(groups.iter()
        .flat_map(|g| g.children().unwrap())
        .all(|t| t.material.color == Color::rgb(0.3, 0.5, 1.0) && !t.casts_shadow()));
}

#[test]
fn loaded_world_can_be_traced() {
    let scene = Scene::load(FIXTURE).unwrap();

    // Straight down onto the floor, away from every object.
    let r = Ray4D::new(Tuple4D::point(4.0, 5.0, -4.0), Tuple4D::vector(0.0, -1.0, 0.0));
    let c = scene.world.color(&r).unwrap();

    assert!(c.r > 0.0 && c.g > 0.0 && c.b > 0.0);
}

#[test]
fn missing_scene_file_is_an_io_error() {
    let result = Scene::load(concat!(env!("CARGO_MANIFEST_DIR"), "/tests/data/nope.json"));

    assert!(matches!(result, Err(TracerError::Io(_))));
}

#[test]
fn missing_obj_file_is_an_io_error() {
    let scene_json: SceneJson = serde_json::from_str(r#"{
        "camera": { "width": 4, "height": 4, "field_of_view": 1.0,
            "from": [0, 0, -5], "to": [0, 0, 0], "up": [0, 1, 0] },
        "shapes": [ { "type": "obj", "file": "does-not-exist.obj" } ]
    }"#).unwrap();

    assert!(matches!(Scene::try_from(scene_json), Err(TracerError::Io(_))));
}

#[test]
fn cone_apex_can_be_shaded() {
    let scene = Scene::load(FIXTURE).unwrap();
    let cone = &scene.world.objects[4];

    assert_eq!(cone.normal_at(Tuple4D::point(2.5, 1.0, -1.0)),
        Tuple4D::vector(0.0, 1.0, 0.0));

    let down = Ray4D::new(Tuple4D::point(2.5, 5.0, -1.0),
        Tuple4D::vector(0.0, -1.0, 0.0));
    let c = scene.world.color(&down).unwrap();
    assert!(c != Color::black());
}
