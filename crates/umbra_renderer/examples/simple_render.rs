//! Simple direct-lighting example.
//!
//! Builds a small scene graph (ground, a transformed group of spheres, a
//! triangle), renders it through the parallel pipeline and saves a PNG.
//!
//! Usage: `cargo run --example simple_render -- [config.json] [output.png]`

use std::sync::Arc;
use std::time::Instant;

use anyhow::Context;
use umbra_core::{EpsilonTable, Scene};
use umbra_math::{Quat, Vec3};
use umbra_renderer::{
    Camera, DirectTracer, ImageBuffer, OrderKind, Pipeline, Plane, PointLight, Progress, RenderConfig, Sphere,
    Triangle, PLANE_KIND,
};

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    let mut args = std::env::args().skip(1);
    let config = match args.next() {
        Some(path) => RenderConfig::load(&path).with_context(|| format!("loading {path}"))?,
        None => RenderConfig::default()
            .with_resolution(640, 360)
            .with_order(OrderKind::Spiral { bucket_size: 32 })
            .with_samples(4)
            .with_seed(7),
    };
    let output = args.next().unwrap_or_else(|| "output.png".to_string());

    let start = Instant::now();
    let scene = build_scene(&config)?;
    log::info!("Scene built in {:?}", start.elapsed());

    let camera = Camera::new()
        .with_resolution(config.width, config.height)
        .with_position(Vec3::new(0.0, 2.5, 9.0), Vec3::new(0.0, 0.5, 0.0), Vec3::Y)
        .with_fov(35.0)
        .initialized();

    let tracer = DirectTracer::new(camera, &config)
        .with_checker(1.0)
        .with_light(PointLight::white(Vec3::new(-4.0, 8.0, 4.0), 90.0))
        .with_light(PointLight::new(Vec3::new(5.0, 3.0, 2.0), Vec3::new(1.0, 0.7, 0.4), 25.0));

    let image = Arc::new(ImageBuffer::new());
    let mut pipeline = Pipeline::new(&config)?
        .with_listener(image.clone())
        .with_listener(Arc::new(Progress::new("simple_render")));

    pipeline.submit(&scene, &tracer)?;
    pipeline.close();

    image
        .save_png(&output)
        .with_context(|| format!("saving {output}"))?;
    Ok(())
}

fn build_scene(config: &RenderConfig) -> anyhow::Result<Scene> {
    // Large ground plane needs a looser epsilon than the spheres.
    let epsilons = EpsilonTable::default().with(PLANE_KIND, config.epsilon * 10.0);
    let mut scene = Scene::new("world").with_epsilons(epsilons);
    let root = scene.root();

    scene.add_geometric(root, "ground", Plane::ground(0.0))?;

    // A ring of spheres, spun and lifted as one unit.
    let ring = scene.add_group(root, "ring")?;
    {
        let header = scene.header_mut(ring)?;
        header.set_translation(Vec3::new(0.0, 0.75, 0.0));
        header.set_rotation(Quat::from_rotation_y(0.4));
    }
    for i in 0..6 {
        let angle = i as f32 * std::f32::consts::TAU / 6.0;
        let center = Vec3::new(2.2 * angle.cos(), 0.0, 2.2 * angle.sin());
        scene.add_geometric(ring, format!("ball_{i}"), Sphere::new(center, 0.75))?;
    }

    // Squashed sphere in the middle, via its own transform.
    let hub = scene.add_geometric(ring, "hub", Sphere::new(Vec3::ZERO, 1.0))?;
    scene.header_mut(hub)?.set_scale(Vec3::new(1.0, 0.5, 1.0));

    scene.add_geometric(
        root,
        "fin",
        Triangle::new(
            Vec3::new(-3.5, 0.0, -2.0),
            Vec3::new(-1.5, 0.0, -3.0),
            Vec3::new(-2.5, 2.5, -2.5),
        ),
    )?;

    scene.prepare()?;
    Ok(scene)
}
