// The mesh-editing capability the deformation engine drives.
// Everything scene-related goes through `MeshHost`: the engine never holds
// geometry itself, only handles. Selection is never ambient; the vertex being
// edited and any soft-selection influence are passed explicitly.

use std::fmt;

use glam::DVec3;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::falloff::Falloff;

// Handle to a mesh owned by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MeshId(pub u64);

impl fmt::Display for MeshId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "mesh#{}", self.0)
    }
}

// Handle to one vertex: owning mesh plus flat index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct VertexId {
    pub mesh: MeshId,
    pub index: usize,
}

impl VertexId {
    pub fn new(mesh: MeshId, index: usize) -> Self {
        Self { mesh, index }
    }
}

impl fmt::Display for VertexId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.vtx[{}]", self.mesh, self.index)
    }
}

// Soft-selection influence for a single edit.
#[derive(Clone, Copy)]
pub struct SoftSelection<'a> {
    pub radius: f64,
    pub falloff: &'a dyn Falloff,
}

impl<'a> SoftSelection<'a> {
    pub fn new(radius: f64, falloff: &'a dyn Falloff) -> Self {
        Self { radius, falloff }
    }
}

impl fmt::Debug for SoftSelection<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SoftSelection")
            .field("radius", &self.radius)
            .finish_non_exhaustive()
    }
}

// Successful surface projection: where the instance's pivot landed and the
// surface normal it was aligned to.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projection {
    pub position: DVec3,
    pub normal: DVec3,
}

pub trait MeshHost {
    // Creates a plane on the XZ plane centered at the origin.
    // Vertices are listed row-major: flat index `x * (subdiv_y + 1) + y`.
    fn create_plane(
        &mut self,
        name: &str,
        width: f64,
        height: f64,
        subdiv_x: u32,
        subdiv_y: u32,
    ) -> Result<MeshId>;

    // Creates a UV sphere centered at the origin.
    // Vertex order: `subdiv_height - 1` latitude rings of `subdiv_axis`
    // vertices from bottom to top, then the bottom pole, then the top pole.
    fn create_sphere(
        &mut self,
        name: &str,
        radius: f64,
        subdiv_axis: u32,
        subdiv_height: u32,
    ) -> Result<MeshId>;

    fn delete_mesh(&mut self, mesh: MeshId) -> bool;

    fn mesh_exists(&self, mesh: MeshId) -> bool;

    fn list_vertices(&self, mesh: MeshId) -> Result<Vec<VertexId>>;

    // Object-space position.
    fn vertex_position(&self, vertex: VertexId) -> Result<DVec3>;

    // Moves a vertex in object space. With `relative == false` the vertex is
    // placed at `offset`; soft selection then spreads the resulting delta.
    fn move_vertex(
        &mut self,
        vertex: VertexId,
        offset: DVec3,
        relative: bool,
        soft: Option<&SoftSelection<'_>>,
    ) -> Result<()>;

    // Scales a vertex about an object-space pivot.
    fn scale_vertex(
        &mut self,
        vertex: VertexId,
        scale: DVec3,
        pivot: DVec3,
        soft: Option<&SoftSelection<'_>>,
    ) -> Result<()>;

    // Recomputes vertex normals; edges under `angle_degrees` are softened.
    fn smooth_shade(&mut self, mesh: MeshId, angle_degrees: f64) -> Result<()>;

    // Sets the object scale, applied about the mesh pivot.
    fn scale_mesh(&mut self, mesh: MeshId, scale: DVec3) -> Result<()>;

    // Moves the scale and rotate pivots by `offset`, in object space.
    fn move_pivot(&mut self, mesh: MeshId, offset: DVec3) -> Result<()>;

    // World-space position of the pivot.
    fn pivot(&self, mesh: MeshId) -> Result<DVec3>;

    // Bakes the transform into the vertices and resets it to identity.
    fn freeze_transform(&mut self, mesh: MeshId) -> Result<()>;

    // Moves the mesh so its pivot sits at `position` in world space.
    fn translate_mesh(&mut self, mesh: MeshId, position: DVec3) -> Result<()>;

    // Snaps `instance`'s pivot to the closest point on `surface` and rotates
    // it so its local `up` follows the surface normal, with local `reference`
    // kept as close as possible to world `reference`.
    // Fails with `NoTerrain` when the surface does not exist.
    fn project_onto_surface(
        &mut self,
        instance: MeshId,
        surface: MeshId,
        up: DVec3,
        reference: DVec3,
    ) -> Result<Projection>;

    // Creates an empty group; a no-op if it already exists.
    fn create_group(&mut self, name: &str);

    // Parents `child` under `group`. Fails with `MissingGroup` when the group
    // has not been created.
    fn group_under(&mut self, group: &str, child: MeshId) -> Result<()>;
}
