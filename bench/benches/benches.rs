use criterion::{Criterion, criterion_group, criterion_main};
use rand::SeedableRng;
use rand::rngs::StdRng;
use terrain_core::{
    NoiseGenerator, RockScatter, Scene, ScatterRequest, TerrainDeformer, ValueNoise2D,
    utils::{HeightMap2D, normalize2, to_gray_image},
};

const DIMENSION: f64 = 100.0;
const SUBDIVISIONS: u32 = 100;
const SEED: u64 = 2025;

fn fresh_terrain() -> (Scene, TerrainDeformer) {
    let mut scene = Scene::new();
    let mut deformer = TerrainDeformer::default();
    deformer
        .create_terrain(&mut scene, "myTerrain", DIMENSION, SUBDIVISIONS)
        .unwrap();
    (scene, deformer)
}

fn bench_value_noise_field(c: &mut Criterion) {
    let size = SUBDIVISIONS as usize + 1;
    c.bench_function("ValueNoise2D field + normalize + image", |b| {
        b.iter(|| {
            let noise = ValueNoise2D::new(6000.0, 4.0);
            let mut map: HeightMap2D = (0..size)
                .map(|x| {
                    (0..size)
                        .map(|y| noise.get2(x as f64 / size as f64, y as f64 / size as f64) as f32)
                        .collect()
                })
                .collect();
            normalize2(&mut map);
            let _img = to_gray_image(&map);
        })
    });
}

fn bench_soft_random(c: &mut Criterion) {
    c.bench_function("Soft random deformation (100 x 100 grid)", |b| {
        b.iter_batched(
            fresh_terrain,
            |(mut scene, deformer)| {
                let mut rng = StdRng::seed_from_u64(SEED);
                deformer.soft_random(&mut scene, &mut rng).unwrap();
            },
            criterion::BatchSize::LargeInput,
        )
    });
}

fn bench_value_noise(c: &mut Criterion) {
    c.bench_function("Value noise deformation (100 x 100 grid)", |b| {
        b.iter_batched(
            fresh_terrain,
            |(mut scene, deformer)| {
                deformer.value_noise(&mut scene, 6000.0).unwrap();
            },
            criterion::BatchSize::LargeInput,
        )
    });
}

fn deformed_terrain() -> (Scene, TerrainDeformer) {
    let (mut scene, deformer) = fresh_terrain();
    deformer.value_noise(&mut scene, 6000.0).unwrap();
    (scene, deformer)
}

fn bench_scatter(c: &mut Criterion) {
    let request = ScatterRequest::new("myRocks", 10);
    let scatter = RockScatter::default();

    c.bench_function("Scatter 10 rocks onto deformed terrain", |b| {
        b.iter_batched(
            deformed_terrain,
            |(mut scene, deformer)| {
                let mut rng = StdRng::seed_from_u64(SEED);
                scatter
                    .scatter(&mut scene, deformer.grid(), DIMENSION, &request, &mut rng)
                    .unwrap();
            },
            criterion::BatchSize::LargeInput,
        )
    });
}

criterion_group!(
    terrain_benchmarks,
    bench_value_noise_field,
    bench_soft_random,
    bench_value_noise,
    bench_scatter
);
criterion_main!(terrain_benchmarks);
