use std::path::PathBuf;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use clap::Parser;

use whitted_tracer::Result;
use whitted_tracer::consts::{ CANVAS_WIDTH, CANVAS_HEIGHT, NUM_THREADS,
    OUT_FILE, RECURSION_DEPTH, GLASS_RI };
use whitted_tracer::tuple::Tuple4D;
use whitted_tracer::matrix::Matrix4D;
use whitted_tracer::color::Color;
use whitted_tracer::pattern::Pattern;
use whitted_tracer::light::{ PointLight, Material };
use whitted_tracer::shape::Shape;
use whitted_tracer::world::World;
use whitted_tracer::camera::Camera;
use whitted_tracer::scene::Scene;
use whitted_tracer::parallel::{ self, RenderConfig };
use whitted_tracer::incremental::IncrementalRender;

/// Renders a JSON scene description to a PPM image.
#[derive(Parser, Debug)]
#[clap(author, version, about)]
struct Args {
    /// Scene description (JSON). Renders a built-in demo scene if omitted.
    scene: Option<PathBuf>,

    /// Where to write the image.
    #[clap(short, long, default_value = OUT_FILE)]
    output: PathBuf,

    /// Render threads.
    #[clap(short, long, default_value_t = NUM_THREADS)]
    threads: usize,

    /// Reflection/refraction bounces per camera ray.
    #[clap(short, long, default_value_t = RECURSION_DEPTH)]
    depth: usize,

    /// Override the scene's image width.
    #[clap(long)]
    width: Option<usize>,

    /// Override the scene's image height.
    #[clap(long)]
    height: Option<usize>,

    /// Render on one thread, this many rows at a time.
    #[clap(long, value_name = "ROWS")]
    incremental: Option<usize>,
}

fn main() {
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or("info")
    ).init();

    if let Err(e) = run(Args::parse()) {
        log::error!("{}", e);
        std::process::exit(1);
    }
}

fn run(args: Args) -> Result<()> {
    let Scene { world, mut camera } = match args.scene {
        Some(ref path) => Scene::load(path)?,
        None => demo_scene()?,
    };

    if args.width.is_some() || args.height.is_some() {
        camera = resized(&camera,
            args.width.unwrap_or(camera.hsize),
            args.height.unwrap_or(camera.vsize))?;
    }

    let canvas = match args.incremental {
        Some(rows) => {
            let rows = rows.max(1);
            let mut render = IncrementalRender::with_depth(&camera, args.depth);
            while !render.render_rows(&world, &camera, rows)? {
                log::info!("{}/{} rows", render.rows_done(), render.total_rows());
            }

            render.into_canvas()
        },
        None => {
            let config = RenderConfig { threads: args.threads, depth: args.depth };
            let handle = parallel::spawn(Arc::new(world), Arc::new(camera), config);

            while !handle.is_finished() {
                thread::sleep(Duration::from_millis(500));
                log::debug!("{}/{} rows", handle.rows_done(), handle.total_rows());
            }

            handle.join()?
        },
    };

    canvas.save_ppm(&args.output)?;
    log::info!("Wrote {:?}", args.output);
    Ok(())
}

/// A copy of `camera` with a different image size and the same view.
fn resized(camera: &Camera, hsize: usize, vsize: usize) -> Result<Camera> {
    let mut c = Camera::new(hsize, vsize, camera.field_of_view);
    match camera.orientation() {
        Some(o) => c.look_at(o.from, o.to, o.up)?,
        None => c.set_transform(*camera.transform())?,
    }

    Ok(c)
}

/// A floor, a glass sphere, a cone and a cube under one light.
fn demo_scene() -> Result<Scene> {
    let mut floor = Shape::plane();
    floor.material = Material {
        color: Color::rgb(0.5, 0.5, 0.5),
        pattern: Some(Pattern::checker(Color::white(), Color::black())
            .with_transform(Matrix4D::scaling(0.5, 0.5, 0.5))?),
        specular: 0.0,
        reflective: 0.5,
        ..Default::default()
    };

    let mut middle = Shape::sphere()
        .with_transform(Matrix4D::translation(-0.5, 1.0, 2.0))?;
    middle.material = Material {
        color: Color::rgb(1.0, 0.4666, 0.2666),
        diffuse: 0.7,
        specular: 0.3,
        transparency: 0.5,
        reflective: 0.5,
        refractive_index: GLASS_RI,
        ..Default::default()
    };

    let mut right = Shape::bounded_cone(0.0, 3.0, true).with_transform(
        Matrix4D::translation(1.5, 2.5, -0.5)
            * Matrix4D::scaling(0.25, 0.25, 0.25)
            * Matrix4D::rotation_z(std::f64::consts::PI / 4.0)
            * Matrix4D::rotation_y(std::f64::consts::PI / 8.0)
    )?;
    right.material = Material {
        color: Color::rgb(1.0, 0.6666, 0.2666),
        diffuse: 0.7,
        specular: 0.3,
        reflective: 0.3,
        ..Default::default()
    };

    let mut left = Shape::cube().with_transform(
        Matrix4D::translation(-1.5, 1.0, -0.75)
            * Matrix4D::scaling(0.33, 0.33, 0.33)
            * Matrix4D::rotation_x(std::f64::consts::PI / 4.0)
            * Matrix4D::rotation_y(std::f64::consts::PI / 4.0)
    )?;
    left.material = Material {
        color: Color::rgb(0.8666, 0.2, 0.2),
        diffuse: 0.7,
        specular: 0.3,
        ..Default::default()
    };

    let mut world = World::new();
    world.add_light(PointLight::new(Color::white(),
        Tuple4D::point(-10.0, 10.0, -10.0)))?;
    for shape in vec![floor, middle, right, left] {
        world.add_object(shape)?;
    }

    let mut camera = Camera::new(CANVAS_WIDTH, CANVAS_HEIGHT,
        std::f64::consts::PI / 3.0);
    camera.look_at(
        Tuple4D::point(0.0, 1.5, -5.0),
        Tuple4D::point(0.0, 1.0, 0.0),
        Tuple4D::vector(0.0, 1.0, 0.0),
    )?;

    Ok(Scene { world, camera })
}
