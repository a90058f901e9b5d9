// Terrain deformation: random soft-selection bumps or a value-noise height field.
// Both methods scale their intensity with the current grid relative to a
// 100 x 100 reference terrain, so the same settings read the same on any size.

use std::fmt;
use std::str::FromStr;
use std::time::Instant;

use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use crate::NoiseGenerator;
use crate::error::{Result, TerrainError};
use crate::falloff::FalloffCurve;
use crate::grid::TerrainGrid;
use crate::host::{MeshHost, VertexId};
use crate::utils::{push_from_zero, uniform};
use crate::value2::ValueNoise2D;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeformMethod {
    // Localized random displacement through soft selection.
    SoftRandom,
    // Absolute heights from multi-octave value noise.
    ValueNoise,
}

impl DeformMethod {
    pub const ALL: [DeformMethod; 2] = [DeformMethod::SoftRandom, DeformMethod::ValueNoise];

    // Name shown to users.
    pub fn label(self) -> &'static str {
        match self {
            DeformMethod::SoftRandom => "Random Soft Select",
            DeformMethod::ValueNoise => "Value Noise",
        }
    }
}

impl fmt::Display for DeformMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for DeformMethod {
    type Err = TerrainError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "soft_random" | "random soft select" => Ok(DeformMethod::SoftRandom),
            "value_noise" | "value noise" => Ok(DeformMethod::ValueNoise),
            other => Err(TerrainError::invalid(format!(
                "unknown deformation method {other:?}"
            ))),
        }
    }
}

// Tuning constants, calibrated by hand on a 100 x 100 grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeformSettings {
    // Max vertical move of a single soft edit on the reference grid.
    pub max_height: f64,
    // Soft edits on a grid with the reference subdivision count.
    pub max_points: u32,
    // Soft-selection radius on the reference grid.
    pub soft_select_radius: f64,
    pub reference_dimension: f64,
    pub reference_subdivisions: f64,
    // Upper bound on the vertex chunks edits rotate through.
    pub max_sections: usize,
    // Base frequency of the value noise on normalized grid coordinates.
    pub noise_frequency: f64,
    // Noise amplitude relative to `max_height`.
    pub noise_height_scale: f64,
    // Noise seeds are drawn from `[0, seed_range)`.
    pub seed_range: f64,
}

impl Default for DeformSettings {
    fn default() -> Self {
        Self {
            max_height: 7.5,
            max_points: 100,
            soft_select_radius: 20.0,
            reference_dimension: 100.0,
            reference_subdivisions: 100.0,
            max_sections: 8,
            noise_frequency: 4.0,
            noise_height_scale: 3.0,
            seed_range: 10000.0,
        }
    }
}

// One soft-selection edit made by the random method.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SoftEdit {
    pub center: VertexId,
    // Sample from `[-height_limit, height_limit]` before the push from zero.
    pub raw: f64,
    // Applied Y move.
    pub delta: f64,
    pub radius: f64,
    // Index into the falloff palette.
    pub falloff: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SoftRandomReport {
    pub height_limit: f64,
    pub budget: usize,
    pub sections: usize,
    pub edits: Vec<SoftEdit>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ValueNoiseReport {
    pub seed: f64,
    pub height_limit: f64,
    pub vertices: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DeformReport {
    SoftRandom(SoftRandomReport),
    ValueNoise(ValueNoiseReport),
}

impl DeformReport {
    pub fn method(&self) -> DeformMethod {
        match self {
            DeformReport::SoftRandom(_) => DeformMethod::SoftRandom,
            DeformReport::ValueNoise(_) => DeformMethod::ValueNoise,
        }
    }
}

// Owns the terrain grid handle and deforms it on request.
#[derive(Debug, Clone)]
pub struct TerrainDeformer {
    settings: DeformSettings,
    palette: [FalloffCurve; 3],
    grid: Option<TerrainGrid>,
}

impl Default for TerrainDeformer {
    fn default() -> Self {
        Self::new(DeformSettings::default())
    }
}

impl TerrainDeformer {
    pub fn new(settings: DeformSettings) -> Self {
        Self {
            settings,
            palette: FalloffCurve::palette(),
            grid: None,
        }
    }

    pub fn settings(&self) -> &DeformSettings {
        &self.settings
    }

    pub fn palette(&self) -> &[FalloffCurve; 3] {
        &self.palette
    }

    // Last created grid. It may have been deleted from the host since.
    pub fn grid(&self) -> Option<&TerrainGrid> {
        self.grid.as_ref()
    }

    // Creates a new terrain plane, replacing the previous one.
    pub fn create_terrain<H: MeshHost + ?Sized>(
        &mut self,
        host: &mut H,
        name: &str,
        dimension: f64,
        subdivisions: u32,
    ) -> Result<&TerrainGrid> {
        let start = Instant::now();
        let grid = TerrainGrid::create(host, name, dimension, subdivisions)?;
        if let Some(old) = self.grid.take() {
            host.delete_mesh(old.mesh());
        }
        debug!(elapsed = ?start.elapsed(), "Grid creation finished");
        Ok(self.grid.insert(grid))
    }

    // Deforms the current terrain with `method`.
    // Fails with `NoTerrain`, leaving the host untouched, when there is no grid.
    pub fn deform<H, R>(&self, host: &mut H, method: DeformMethod, rng: &mut R) -> Result<DeformReport>
    where
        H: MeshHost + ?Sized,
        R: Rng + ?Sized,
    {
        let start = Instant::now();
        let report = match method {
            DeformMethod::SoftRandom => DeformReport::SoftRandom(self.soft_random(host, rng)?),
            DeformMethod::ValueNoise => {
                // fresh terrain on every run
                let seed = rng.gen_range(0.0..self.settings.seed_range);
                DeformReport::ValueNoise(self.value_noise(host, seed)?)
            }
        };
        debug!(%method, elapsed = ?start.elapsed(), "Grid deformation finished");
        Ok(report)
    }

    // Rebuilds the grid from its stored parameters, then deforms it.
    // Used to switch methods once random bumps are baked in.
    pub fn redeform<H, R>(
        &mut self,
        host: &mut H,
        method: DeformMethod,
        rng: &mut R,
    ) -> Result<DeformReport>
    where
        H: MeshHost + ?Sized,
        R: Rng + ?Sized,
    {
        let Some(old) = self.grid.clone() else {
            error!("No terrain was previously created. Please create one before deforming.");
            return Err(TerrainError::NoTerrain);
        };
        self.create_terrain(host, old.name(), old.dimension(), old.subdivisions())?;
        self.deform(host, method, rng)
    }

    // Random soft-selection bumps.
    // Vertices are split into contiguous chunks visited in a shuffled
    // round-robin so the edits spread across the whole terrain.
    pub fn soft_random<H, R>(&self, host: &mut H, rng: &mut R) -> Result<SoftRandomReport>
    where
        H: MeshHost + ?Sized,
        R: Rng + ?Sized,
    {
        let grid = self.check_terrain(host)?;
        let s = &self.settings;

        let size_scale = grid.dimension() / s.reference_dimension;
        let points_scale = grid.subdivisions() as f64 / s.reference_subdivisions;
        let radius = s.soft_select_radius * size_scale;
        let height_limit = s.max_height * size_scale / 2.0;
        // at least two edits, even on tiny grids
        let budget = (s.max_points as f64 * points_scale).floor() as usize + 2;

        let vertices = grid.vertices(host)?;
        let section_count = s.max_sections.min(budget).max(1);
        let section_size = vertices.len().div_ceil(section_count);
        let sections: Vec<&[VertexId]> = vertices.chunks(section_size).collect();
        let mut order: Vec<usize> = (0..sections.len()).collect();
        order.shuffle(rng);

        debug!(budget, sections = sections.len(), height_limit, radius, "Soft random deformation");

        let mut edits = Vec::with_capacity(budget);
        for i in 0..budget {
            let falloff = rng.gen_range(0..self.palette.len());
            let section = sections[order[i % order.len()]];
            let center = section[rng.gen_range(0..section.len())];

            let raw = uniform(rng, -height_limit, height_limit);
            // keep bumps visible: never near zero
            let delta = push_from_zero(raw, height_limit);

            grid.soft_displace(host, center, radius, &self.palette[falloff], delta)?;
            edits.push(SoftEdit {
                center,
                raw,
                delta,
                radius,
                falloff,
            });
        }

        grid.finalize_shading(host)?;
        info!(edits = edits.len(), terrain = grid.name(), "Applied soft random deformation");

        Ok(SoftRandomReport {
            height_limit,
            budget,
            sections: sections.len(),
            edits,
        })
    }

    // Sets every vertex height from four octaves of value noise with `seed`.
    pub fn value_noise<H: MeshHost + ?Sized>(&self, host: &mut H, seed: f64) -> Result<ValueNoiseReport> {
        let grid = self.check_terrain(host)?;
        let s = &self.settings;

        let height_limit = s.max_height * (grid.dimension() / s.reference_dimension) * s.noise_height_scale;
        let noise = ValueNoise2D::new(seed, s.noise_frequency);
        debug!(seed, height_limit, "Value noise deformation");

        let n = grid.subdivisions() as usize;
        let mut visited = 0;
        for x in 0..=n {
            for y in 0..=n {
                let nx = x as f64 / n as f64;
                let ny = y as f64 / n as f64;
                let value = noise.get2(nx, ny);
                grid.set_height(host, grid.vertex(x, y)?, value * height_limit)?;
                visited += 1;
            }
        }

        info!(seed, vertices = visited, terrain = grid.name(), "Applied value noise deformation");
        Ok(ValueNoiseReport {
            seed,
            height_limit,
            vertices: visited,
        })
    }

    fn check_terrain<H: MeshHost + ?Sized>(&self, host: &H) -> Result<&TerrainGrid> {
        match &self.grid {
            Some(grid) if grid.exists(host) => Ok(grid),
            _ => {
                error!("No terrain was previously created, or got deleted. Please create one before deforming.");
                Err(TerrainError::NoTerrain)
            }
        }
    }
}
