// A regular subdivided plane addressed by lattice coordinates.

use glam::DVec3;
use tracing::debug;

use crate::error::{Result, TerrainError};
use crate::falloff::Falloff;
use crate::host::{MeshHost, MeshId, SoftSelection, VertexId};
use crate::utils::HeightMap2D;

// Handle to the terrain plane plus the parameters it was built from.
// Vertex count is fixed at `(subdivisions + 1)^2`; only heights change.
#[derive(Debug, Clone, PartialEq)]
pub struct TerrainGrid {
    mesh: MeshId,
    name: String,
    dimension: f64,
    subdivisions: u32,
}

impl TerrainGrid {
    // Builds a `dimension` x `dimension` plane with `subdivisions` cells per side.
    pub fn create<H: MeshHost + ?Sized>(
        host: &mut H,
        name: &str,
        dimension: f64,
        subdivisions: u32,
    ) -> Result<Self> {
        if !(dimension.is_finite() && dimension >= 1.0) {
            return Err(TerrainError::invalid(format!(
                "terrain dimension must be at least 1, got {dimension}"
            )));
        }
        if subdivisions < 1 {
            return Err(TerrainError::invalid("terrain needs at least one subdivision"));
        }
        let mesh = host.create_plane(name, dimension, dimension, subdivisions, subdivisions)?;
        debug!(%mesh, name, dimension, subdivisions, "Created terrain grid");
        Ok(Self {
            mesh,
            name: name.to_string(),
            dimension,
            subdivisions,
        })
    }

    pub fn mesh(&self) -> MeshId {
        self.mesh
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn dimension(&self) -> f64 {
        self.dimension
    }

    pub fn subdivisions(&self) -> u32 {
        self.subdivisions
    }

    // Vertices per side.
    pub fn side(&self) -> usize {
        self.subdivisions as usize + 1
    }

    pub fn vertex_count(&self) -> usize {
        self.side() * self.side()
    }

    pub fn flat_index(&self, x: usize, y: usize) -> usize {
        x * self.side() + y
    }

    // Vertex at lattice `(x, y)`, both in `0..=subdivisions`.
    pub fn vertex(&self, x: usize, y: usize) -> Result<VertexId> {
        let v = VertexId::new(self.mesh, self.flat_index(x, y));
        if x < self.side() && y < self.side() {
            Ok(v)
        } else {
            Err(TerrainError::MissingVertex(v))
        }
    }

    pub fn exists<H: MeshHost + ?Sized>(&self, host: &H) -> bool {
        host.mesh_exists(self.mesh)
    }

    // Every vertex in scan order (`x` major, `y` minor).
    pub fn vertices<H: MeshHost + ?Sized>(&self, host: &H) -> Result<Vec<VertexId>> {
        host.list_vertices(self.mesh)
    }

    pub fn height<H: MeshHost + ?Sized>(&self, host: &H, vertex: VertexId) -> Result<f64> {
        Ok(host.vertex_position(vertex)?.y)
    }

    // Relative move along Y.
    pub fn displace<H: MeshHost + ?Sized>(
        &self,
        host: &mut H,
        vertex: VertexId,
        delta_y: f64,
    ) -> Result<()> {
        host.move_vertex(vertex, DVec3::new(0.0, delta_y, 0.0), true, None)
    }

    // Absolute Y, keeping X and Z.
    pub fn set_height<H: MeshHost + ?Sized>(
        &self,
        host: &mut H,
        vertex: VertexId,
        y: f64,
    ) -> Result<()> {
        let p = host.vertex_position(vertex)?;
        host.move_vertex(vertex, DVec3::new(p.x, y, p.z), false, None)
    }

    // Relative Y move of `center`, spread to neighbours within `radius`
    // weighted by `falloff` (1.0 at the center, 0 at the radius edge).
    pub fn soft_displace<H: MeshHost + ?Sized>(
        &self,
        host: &mut H,
        center: VertexId,
        radius: f64,
        falloff: &dyn Falloff,
        delta_y: f64,
    ) -> Result<()> {
        let soft = SoftSelection::new(radius, falloff);
        host.move_vertex(center, DVec3::new(0.0, delta_y, 0.0), true, Some(&soft))
    }

    // Recomputes smooth normals with every edge softened.
    pub fn finalize_shading<H: MeshHost + ?Sized>(&self, host: &mut H) -> Result<()> {
        host.smooth_shade(self.mesh, 180.0)
    }

    // Current heights as a `side` x `side` map indexed `[x][y]`.
    pub fn heights<H: MeshHost + ?Sized>(&self, host: &H) -> Result<HeightMap2D> {
        let vertices = self.vertices(host)?;
        let mut map = Vec::with_capacity(self.side());
        for row in vertices.chunks(self.side()) {
            let heights = row
                .iter()
                .map(|&v| host.vertex_position(v).map(|p| p.y as f32))
                .collect::<Result<Vec<_>>>()?;
            map.push(heights);
        }
        Ok(map)
    }
}
