// Headless driver: builds and deforms a terrain, scatters rocks on it and
// writes a grayscale height preview.
// usage: terrain-app [params.json] [preview.png]
// Set `RUST_LOG=debug` for per-operation timings.

use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::Context;
use terrain_core::utils::{normalize2, to_gray_image};
use terrain_core::{AmbientColor, DeformReport, Scene, TerrainGenerator, TerrainParams};
use tracing_subscriber::EnvFilter;

fn load_params(path: Option<&Path>) -> anyhow::Result<TerrainParams> {
    let Some(path) = path else {
        return Ok(TerrainParams::default());
    };
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading parameters from {}", path.display()))?;
    let params: TerrainParams = serde_json::from_str(&text)
        .with_context(|| format!("parsing parameters in {}", path.display()))?;
    Ok(params)
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let mut args = std::env::args().skip(1);
    let params_path = args.next().map(PathBuf::from);
    let output = args
        .next()
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("terrain_preview.png"));

    let params = load_params(params_path.as_deref())?;
    params.validate()?;
    tracing::info!(
        terrain = %params.terrain_name,
        dimension = params.dimension,
        subdivisions = params.subdivisions,
        method = %params.method,
        "Parameters loaded"
    );

    let start = Instant::now();
    let mut scene = Scene::new();
    let mut generator = TerrainGenerator::from_entropy();

    match generator.create_and_deform(&mut scene, &params)? {
        DeformReport::SoftRandom(report) => tracing::info!(
            edits = report.edits.len(),
            sections = report.sections,
            height_limit = report.height_limit,
            "Soft random terrain ready"
        ),
        DeformReport::ValueNoise(report) => tracing::info!(
            seed = report.seed,
            height_limit = report.height_limit,
            "Value noise terrain ready"
        ),
    }

    let swatch = AmbientColor::swatch(params.hue);
    tracing::info!(hue = params.hue, ?swatch, "Rock hue");
    let rocks = generator.create_rocks(&mut scene, &params)?;

    // Summary output
    tracing::info!("Generation completed in {:?}", start.elapsed());
    tracing::info!("  Meshes: {}", scene.mesh_count());
    tracing::info!("  Rocks: {} under {}", rocks.rocks.len(), rocks.group);
    tracing::info!("  Projected: {}", rocks.projected_count());

    let grid = generator
        .deformer()
        .grid()
        .context("terrain missing after creation")?;
    let mut map = grid.heights(&scene)?;
    normalize2(&mut map);
    to_gray_image(&map)
        .save(&output)
        .with_context(|| format!("saving preview to {}", output.display()))?;
    tracing::info!("Saved height preview to {}", output.display());

    Ok(())
}
