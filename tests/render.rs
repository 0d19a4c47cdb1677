use std::sync::Arc;

use whitted_tracer::tuple::Tuple4D;
use whitted_tracer::camera::Camera;
use whitted_tracer::scene::Scene;
use whitted_tracer::parallel::{ self, RenderConfig };
use whitted_tracer::incremental::IncrementalRender;
use whitted_tracer::consts::RECURSION_DEPTH;

fn fixture() -> Scene {
    Scene::load(concat!(env!("CARGO_MANIFEST_DIR"), "/tests/data/scene.json"))
        .unwrap()
}

#[test]
fn repeated_renders_are_identical() {
    let Scene { world, camera } = fixture();
    let config = RenderConfig { threads: 4, depth: RECURSION_DEPTH };

    let first = parallel::render(&world, &camera, &config).unwrap();
    let second = parallel::render(&world, &camera, &config).unwrap();

    assert_eq!(first.as_bytes(), second.as_bytes());
}

#[test]
fn every_render_path_agrees() {
    let Scene { world, camera } = fixture();
    let serial = camera.render(&world).unwrap();

    for threads in [1, 2, 7].iter() {
        let config = RenderConfig { threads: *threads, depth: RECURSION_DEPTH };
        assert_eq!(parallel::render(&world, &camera, &config).unwrap(), serial);
    }

    let mut incremental = IncrementalRender::new(&camera);
    while !incremental.render_rows(&world, &camera, 5).unwrap() {}
    assert_eq!(incremental.canvas(), &serial);

    let world = Arc::new(world);
    let handle = parallel::spawn(Arc::clone(&world),
        Arc::new(camera.clone()), RenderConfig::default());
    assert_eq!(handle.join().unwrap(), serial);
}

#[test]
fn image_is_opaque_and_not_blank() {
    let Scene { world, camera } = fixture();
    let canvas = camera.render(&world).unwrap();

    let pixels: Vec<&[u8]> = canvas.as_bytes().chunks(4).collect();
    assert_eq!(pixels.len(), camera.hsize * camera.vsize);
    assert!(pixels.iter().all(|p| p[3] == 255));
    assert!(pixels.iter().any(|p| p[..3] != [0, 0, 0]));
}

#[test]
fn depth_zero_drops_reflections() {
    let Scene { world, camera } = fixture();
    let flat = RenderConfig { threads: 2, depth: 0 };
    let deep = RenderConfig { threads: 2, depth: RECURSION_DEPTH };

    assert_ne!(parallel::render(&world, &camera, &flat).unwrap(),
        parallel::render(&world, &camera, &deep).unwrap());
}

#[test]
fn orbit_then_reset_restores_the_image() {
    let Scene { world, mut camera } = fixture();
    let before = camera.render(&world).unwrap();

    camera.orbit(0.4, 0.1).unwrap();
    camera.pan(Tuple4D::vector(0.5, 0.0, 0.0)).unwrap();
    assert_ne!(camera.render(&world).unwrap(), before);

    camera.reset_view().unwrap();
    assert_eq!(camera.render(&world).unwrap(), before);
}

#[test]
fn incremental_render_sees_camera_changes_after_restart() {
    let Scene { world, camera } = fixture();
    let mut moved = camera.clone();
    moved.orbit(-0.3, 0.0).unwrap();

    let mut render = IncrementalRender::new(&camera);
    render.render_rows(&world, &camera, 10).unwrap();
    render.restart(&moved);
    while !render.render_rows(&world, &moved, 10).unwrap() {}

    assert_eq!(render.into_canvas(), moved.render(&world).unwrap());
}

#[test]
fn resized_camera_keeps_its_view() {
    let Scene { camera, .. } = fixture();
    let o = *camera.orientation().unwrap();

    let mut small = Camera::new(8, 6, camera.field_of_view);
    small.look_at(o.from, o.to, o.up).unwrap();

    assert_eq!(small.transform(), camera.transform());
}
