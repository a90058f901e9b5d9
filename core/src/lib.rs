// core holds the terrain deformation, rock and scatter algorithms
pub mod color;
pub mod deformer;
pub mod error;
pub mod falloff;
pub mod grid;
pub mod host;
pub mod params;
pub mod rock;
pub mod scatter;
pub mod scene;
pub mod session;
pub mod utils;
pub mod value2;

pub use color::AmbientColor;
pub use deformer::{DeformMethod, DeformReport, DeformSettings, TerrainDeformer};
pub use error::{Result, TerrainError};
pub use falloff::{Falloff, FalloffCurve};
pub use grid::TerrainGrid;
pub use host::{MeshHost, MeshId, Projection, SoftSelection, VertexId};
pub use params::TerrainParams;
pub use rock::{RockSettings, RockShape, RockShaper};
pub use scatter::{RockInstance, RockScatter, ScatterReport, ScatterRequest, ScatterSettings};
pub use scene::Scene;
pub use session::TerrainGenerator;
pub use utils::flatten2;
pub use value2::ValueNoise2D;

// noise generator that can sample 2D points
pub trait NoiseGenerator {
    // Sample 2D noise at (x, y).
    fn get2(&self, x: f64, y: f64) -> f64;
}
