// The three terrain actions plus rock creation, bundled with the random
// source they share.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::info;

use crate::deformer::{DeformMethod, DeformReport, DeformSettings, TerrainDeformer};
use crate::error::Result;
use crate::host::MeshHost;
use crate::params::TerrainParams;
use crate::rock::{RockSettings, RockShaper};
use crate::scatter::{RockScatter, ScatterReport, ScatterSettings};

// Rock size reference used before any terrain was created.
pub const DEFAULT_DIMENSION: f64 = 10.0;

#[derive(Debug, Clone)]
pub struct TerrainGenerator<R = StdRng> {
    deformer: TerrainDeformer,
    scatter: RockScatter,
    rng: R,
}

impl TerrainGenerator<StdRng> {
    pub fn seeded(seed: u64) -> Self {
        Self::new(StdRng::seed_from_u64(seed))
    }

    pub fn from_entropy() -> Self {
        Self::new(StdRng::from_entropy())
    }
}

impl<R: Rng> TerrainGenerator<R> {
    pub fn new(rng: R) -> Self {
        Self {
            deformer: TerrainDeformer::default(),
            scatter: RockScatter::default(),
            rng,
        }
    }

    pub fn with_settings(
        rng: R,
        deform: DeformSettings,
        rock: RockSettings,
        scatter: ScatterSettings,
    ) -> Self {
        Self {
            deformer: TerrainDeformer::new(deform),
            scatter: RockScatter::new(scatter, RockShaper::new(rock)),
            rng,
        }
    }

    pub fn deformer(&self) -> &TerrainDeformer {
        &self.deformer
    }

    pub fn scatter(&self) -> &RockScatter {
        &self.scatter
    }

    // Dimension rocks are sized and spread by: the last terrain's, else 10.
    pub fn dimension(&self) -> f64 {
        self.deformer
            .grid()
            .map_or(DEFAULT_DIMENSION, |grid| grid.dimension())
    }

    // Replaces the terrain with a flat one built from `params`, then deforms it.
    pub fn create_and_deform<H: MeshHost + ?Sized>(
        &mut self,
        host: &mut H,
        params: &TerrainParams,
    ) -> Result<DeformReport> {
        params.validate_terrain()?;
        self.deformer
            .create_terrain(host, &params.terrain_name, params.dimension, params.subdivisions)?;
        let report = self.deformer.deform(host, params.method, &mut self.rng)?;
        info!(terrain = %params.terrain_name, method = %params.method, "Terrain created");
        Ok(report)
    }

    // Deforms the existing terrain on top of what is already there.
    pub fn just_deform<H: MeshHost + ?Sized>(
        &mut self,
        host: &mut H,
        method: DeformMethod,
    ) -> Result<DeformReport> {
        self.deformer.deform(host, method, &mut self.rng)
    }

    // Rebuilds the terrain flat with its current parameters and deforms it.
    pub fn modify_terrain<H: MeshHost + ?Sized>(
        &mut self,
        host: &mut H,
        method: DeformMethod,
    ) -> Result<DeformReport> {
        self.deformer.redeform(host, method, &mut self.rng)
    }

    pub fn create_rocks<H: MeshHost + ?Sized>(
        &mut self,
        host: &mut H,
        params: &TerrainParams,
    ) -> Result<ScatterReport> {
        params.validate_rocks()?;
        let dimension = self.dimension();
        self.scatter.scatter(
            host,
            self.deformer.grid(),
            dimension,
            &params.scatter_request(),
            &mut self.rng,
        )
    }
}
