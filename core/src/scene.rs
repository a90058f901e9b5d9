// In-memory `MeshHost`: plain vertex/triangle buffers with a pivot-based
// transform per mesh and named groups.

use std::collections::BTreeMap;
use std::f64::consts::{FRAC_PI_2, PI, TAU};

use glam::{DMat3, DQuat, DVec3};
use tracing::debug;

use crate::error::{Result, TerrainError};
use crate::host::{MeshHost, MeshId, Projection, SoftSelection, VertexId};

// What a mesh was created as.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Primitive {
    Plane {
        width: f64,
        height: f64,
        subdiv_x: u32,
        subdiv_y: u32,
    },
    Sphere {
        radius: f64,
        subdiv_axis: u32,
        subdiv_height: u32,
    },
}

// Object-to-world transform. Scale and rotation apply about `pivot`
// (object space); the pivot lands at `translation + pivot` in world space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub translation: DVec3,
    pub rotation: DQuat,
    pub scale: DVec3,
    pub pivot: DVec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            translation: DVec3::ZERO,
            rotation: DQuat::IDENTITY,
            scale: DVec3::ONE,
            pivot: DVec3::ZERO,
        }
    }
}

impl Transform {
    pub fn apply(&self, p: DVec3) -> DVec3 {
        self.translation + self.pivot + self.rotation * (self.scale * (p - self.pivot))
    }

    pub fn world_pivot(&self) -> DVec3 {
        self.translation + self.pivot
    }
}

#[derive(Debug, Clone)]
pub struct SceneMesh {
    name: String,
    primitive: Primitive,
    positions: Vec<DVec3>,
    normals: Vec<DVec3>,
    triangles: Vec<[usize; 3]>,
    transform: Transform,
    soft_edge_angle: Option<f64>,
    parent: Option<String>,
}

impl SceneMesh {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn primitive(&self) -> Primitive {
        self.primitive
    }

    // Object-space positions.
    pub fn positions(&self) -> &[DVec3] {
        &self.positions
    }

    pub fn normals(&self) -> &[DVec3] {
        &self.normals
    }

    pub fn triangles(&self) -> &[[usize; 3]] {
        &self.triangles
    }

    pub fn transform(&self) -> &Transform {
        &self.transform
    }

    // Angle passed to the last `smooth_shade`, if any.
    pub fn soft_edge_angle(&self) -> Option<f64> {
        self.soft_edge_angle
    }

    pub fn parent(&self) -> Option<&str> {
        self.parent.as_deref()
    }

    pub fn world_positions(&self) -> Vec<DVec3> {
        self.positions
            .iter()
            .map(|&p| self.transform.apply(p))
            .collect()
    }

    fn recompute_normals(&mut self) {
        let mut acc = vec![DVec3::ZERO; self.positions.len()];
        for &[a, b, c] in &self.triangles {
            let (pa, pb, pc) = (self.positions[a], self.positions[b], self.positions[c]);
            // unnormalized: weighted by twice the triangle area
            let n = (pb - pa).cross(pc - pa);
            acc[a] += n;
            acc[b] += n;
            acc[c] += n;
        }
        for (normal, sum) in self.normals.iter_mut().zip(acc) {
            let n = sum.normalize_or_zero();
            if n != DVec3::ZERO {
                *normal = n;
            }
        }
    }
}

#[derive(Debug, Default)]
pub struct Scene {
    meshes: BTreeMap<MeshId, SceneMesh>,
    groups: BTreeMap<String, Vec<MeshId>>,
    next_id: u64,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mesh(&self, id: MeshId) -> Option<&SceneMesh> {
        self.meshes.get(&id)
    }

    pub fn mesh_count(&self) -> usize {
        self.meshes.len()
    }

    pub fn group(&self, name: &str) -> Option<&[MeshId]> {
        self.groups.get(name).map(Vec::as_slice)
    }

    pub fn group_count(&self) -> usize {
        self.groups.len()
    }

    pub fn world_position(&self, vertex: VertexId) -> Result<DVec3> {
        let mesh = self.get(vertex.mesh)?;
        mesh.positions
            .get(vertex.index)
            .map(|&p| mesh.transform.apply(p))
            .ok_or(TerrainError::MissingVertex(vertex))
    }

    // Deletes every mesh and group.
    pub fn clear(&mut self) {
        debug!(meshes = self.meshes.len(), "Clearing scene");
        self.meshes.clear();
        self.groups.clear();
    }

    fn get(&self, id: MeshId) -> Result<&SceneMesh> {
        self.meshes.get(&id).ok_or(TerrainError::MissingMesh(id))
    }

    fn get_mut(&mut self, id: MeshId) -> Result<&mut SceneMesh> {
        self.meshes.get_mut(&id).ok_or(TerrainError::MissingMesh(id))
    }

    fn insert(&mut self, mesh: SceneMesh) -> MeshId {
        let id = MeshId(self.next_id);
        self.next_id += 1;
        debug!(%id, name = %mesh.name, vertices = mesh.positions.len(), "Created mesh");
        self.meshes.insert(id, mesh);
        id
    }
}

fn check_index(mesh: &SceneMesh, vertex: VertexId) -> Result<()> {
    if vertex.index < mesh.positions.len() {
        Ok(())
    } else {
        Err(TerrainError::MissingVertex(vertex))
    }
}

// Adds `delta(p) * weight` to every vertex within the soft radius of `center`.
fn spread(
    positions: &mut [DVec3],
    center: usize,
    soft: &SoftSelection<'_>,
    delta: impl Fn(DVec3) -> DVec3,
) {
    let origin = positions[center];
    for p in positions.iter_mut() {
        let w = soft.falloff.weight(p.distance(origin), soft.radius);
        if w > 0.0 {
            *p += delta(*p) * w;
        }
    }
}

impl MeshHost for Scene {
    fn create_plane(
        &mut self,
        name: &str,
        width: f64,
        height: f64,
        subdiv_x: u32,
        subdiv_y: u32,
    ) -> Result<MeshId> {
        if !(width > 0.0 && height > 0.0) || subdiv_x == 0 || subdiv_y == 0 {
            return Err(TerrainError::invalid(format!(
                "plane {width}x{height} with {subdiv_x}x{subdiv_y} subdivisions"
            )));
        }
        let (sx, sy) = (subdiv_x as usize, subdiv_y as usize);
        let step_x = width / sx as f64;
        let step_z = height / sy as f64;

        let mut positions = Vec::with_capacity((sx + 1) * (sy + 1));
        for x in 0..=sx {
            for y in 0..=sy {
                positions.push(DVec3::new(
                    -width / 2.0 + x as f64 * step_x,
                    0.0,
                    -height / 2.0 + y as f64 * step_z,
                ));
            }
        }

        let idx = |x: usize, y: usize| x * (sy + 1) + y;
        let mut triangles = Vec::with_capacity(sx * sy * 2);
        for x in 0..sx {
            for y in 0..sy {
                let (a, b, c, d) = (idx(x, y), idx(x + 1, y), idx(x, y + 1), idx(x + 1, y + 1));
                triangles.push([a, c, b]);
                triangles.push([b, c, d]);
            }
        }

        let normals = vec![DVec3::Y; positions.len()];
        Ok(self.insert(SceneMesh {
            name: name.to_string(),
            primitive: Primitive::Plane {
                width,
                height,
                subdiv_x,
                subdiv_y,
            },
            positions,
            normals,
            triangles,
            transform: Transform::default(),
            soft_edge_angle: None,
            parent: None,
        }))
    }

    fn create_sphere(
        &mut self,
        name: &str,
        radius: f64,
        subdiv_axis: u32,
        subdiv_height: u32,
    ) -> Result<MeshId> {
        if !(radius > 0.0) || subdiv_axis < 3 || subdiv_height < 2 {
            return Err(TerrainError::invalid(format!(
                "sphere r={radius} with {subdiv_axis}x{subdiv_height} subdivisions"
            )));
        }
        let axis = subdiv_axis as usize;
        let rings = subdiv_height as usize - 1;

        let mut positions = Vec::with_capacity(axis * rings + 2);
        for k in 0..rings {
            let phi = -FRAC_PI_2 + (k + 1) as f64 * PI / subdiv_height as f64;
            let (y, ring_r) = (radius * phi.sin(), radius * phi.cos());
            for j in 0..axis {
                let theta = TAU * j as f64 / axis as f64;
                positions.push(DVec3::new(ring_r * theta.cos(), y, ring_r * theta.sin()));
            }
        }
        let bottom = positions.len();
        positions.push(DVec3::new(0.0, -radius, 0.0));
        let top = positions.len();
        positions.push(DVec3::new(0.0, radius, 0.0));

        let ring = |k: usize, j: usize| k * axis + j % axis;
        let mut triangles = Vec::with_capacity(axis * 2 * rings);
        for j in 0..axis {
            triangles.push([bottom, ring(0, j), ring(0, j + 1)]);
            triangles.push([top, ring(rings - 1, j + 1), ring(rings - 1, j)]);
        }
        for k in 0..rings - 1 {
            for j in 0..axis {
                let (a, b, c, d) = (ring(k, j), ring(k, j + 1), ring(k + 1, j), ring(k + 1, j + 1));
                triangles.push([a, c, b]);
                triangles.push([b, c, d]);
            }
        }

        let normals = positions.iter().map(|p| p.normalize()).collect();
        Ok(self.insert(SceneMesh {
            name: name.to_string(),
            primitive: Primitive::Sphere {
                radius,
                subdiv_axis,
                subdiv_height,
            },
            positions,
            normals,
            triangles,
            transform: Transform::default(),
            soft_edge_angle: None,
            parent: None,
        }))
    }

    fn delete_mesh(&mut self, mesh: MeshId) -> bool {
        let Some(removed) = self.meshes.remove(&mesh) else {
            return false;
        };
        if let Some(members) = removed.parent.and_then(|g| self.groups.get_mut(&g)) {
            members.retain(|&m| m != mesh);
        }
        debug!(%mesh, "Deleted mesh");
        true
    }

    fn mesh_exists(&self, mesh: MeshId) -> bool {
        self.meshes.contains_key(&mesh)
    }

    fn list_vertices(&self, mesh: MeshId) -> Result<Vec<VertexId>> {
        let m = self.get(mesh)?;
        Ok((0..m.positions.len())
            .map(|i| VertexId::new(mesh, i))
            .collect())
    }

    fn vertex_position(&self, vertex: VertexId) -> Result<DVec3> {
        let mesh = self.get(vertex.mesh)?;
        mesh.positions
            .get(vertex.index)
            .copied()
            .ok_or(TerrainError::MissingVertex(vertex))
    }

    fn move_vertex(
        &mut self,
        vertex: VertexId,
        offset: DVec3,
        relative: bool,
        soft: Option<&SoftSelection<'_>>,
    ) -> Result<()> {
        let mesh = self.get_mut(vertex.mesh)?;
        check_index(mesh, vertex)?;
        let i = vertex.index;
        match (soft, relative) {
            (Some(soft), _) => {
                let delta = if relative { offset } else { offset - mesh.positions[i] };
                spread(&mut mesh.positions, i, soft, |_| delta);
            }
            (None, true) => mesh.positions[i] += offset,
            (None, false) => mesh.positions[i] = offset,
        }
        Ok(())
    }

    fn scale_vertex(
        &mut self,
        vertex: VertexId,
        scale: DVec3,
        pivot: DVec3,
        soft: Option<&SoftSelection<'_>>,
    ) -> Result<()> {
        let mesh = self.get_mut(vertex.mesh)?;
        check_index(mesh, vertex)?;
        let toward = |p: DVec3| pivot + (p - pivot) * scale - p;
        match soft {
            Some(soft) => spread(&mut mesh.positions, vertex.index, soft, toward),
            None => {
                let p = mesh.positions[vertex.index];
                mesh.positions[vertex.index] += toward(p);
            }
        }
        Ok(())
    }

    fn smooth_shade(&mut self, mesh: MeshId, angle_degrees: f64) -> Result<()> {
        if !(0.0..=180.0).contains(&angle_degrees) {
            return Err(TerrainError::invalid(format!(
                "soft edge angle {angle_degrees} outside 0..=180"
            )));
        }
        let m = self.get_mut(mesh)?;
        m.recompute_normals();
        m.soft_edge_angle = Some(angle_degrees);
        Ok(())
    }

    fn scale_mesh(&mut self, mesh: MeshId, scale: DVec3) -> Result<()> {
        if !scale.is_finite() {
            return Err(TerrainError::invalid(format!("scale {scale}")));
        }
        self.get_mut(mesh)?.transform.scale = scale;
        Ok(())
    }

    fn move_pivot(&mut self, mesh: MeshId, offset: DVec3) -> Result<()> {
        let t = &mut self.get_mut(mesh)?.transform;
        // keep the geometry where it is
        t.translation += t.rotation * (t.scale * offset) - offset;
        t.pivot += offset;
        Ok(())
    }

    fn pivot(&self, mesh: MeshId) -> Result<DVec3> {
        Ok(self.get(mesh)?.transform.world_pivot())
    }

    fn freeze_transform(&mut self, mesh: MeshId) -> Result<()> {
        let m = self.get_mut(mesh)?;
        let t = m.transform;
        for p in m.positions.iter_mut() {
            *p = t.apply(*p);
        }
        m.transform = Transform {
            pivot: t.world_pivot(),
            ..Transform::default()
        };
        m.recompute_normals();
        Ok(())
    }

    fn translate_mesh(&mut self, mesh: MeshId, position: DVec3) -> Result<()> {
        let t = &mut self.get_mut(mesh)?.transform;
        t.translation = position - t.pivot;
        Ok(())
    }

    fn project_onto_surface(
        &mut self,
        instance: MeshId,
        surface: MeshId,
        up: DVec3,
        reference: DVec3,
    ) -> Result<Projection> {
        let target = self.meshes.get(&surface).ok_or(TerrainError::NoTerrain)?;
        let query = self.get(instance)?.transform.world_pivot();

        let world = target.world_positions();
        let mut best: Option<(f64, DVec3, DVec3)> = None;
        for &[a, b, c] in &target.triangles {
            let (pa, pb, pc) = (world[a], world[b], world[c]);
            let point = closest_point_on_triangle(query, pa, pb, pc);
            let dist = point.distance_squared(query);
            if best.is_none_or(|(d, _, _)| dist < d) {
                let normal = (pb - pa).cross(pc - pa).normalize_or_zero();
                best = Some((dist, point, normal));
            }
        }
        let (_, position, normal) = best.ok_or(TerrainError::NoTerrain)?;
        let normal = if normal == DVec3::ZERO { DVec3::Y } else { normal };

        let rotation = aim_rotation(up, reference, normal);
        let t = &mut self.get_mut(instance)?.transform;
        t.rotation = rotation;
        t.translation = position - t.pivot;

        Ok(Projection { position, normal })
    }

    fn create_group(&mut self, name: &str) {
        if !self.groups.contains_key(name) {
            debug!(group = name, "Created group");
            self.groups.insert(name.to_string(), Vec::new());
        }
    }

    fn group_under(&mut self, group: &str, child: MeshId) -> Result<()> {
        if !self.groups.contains_key(group) {
            return Err(TerrainError::MissingGroup(group.to_string()));
        }
        let previous = self.get_mut(child)?.parent.replace(group.to_string());
        if let Some(members) = previous.and_then(|g| self.groups.get_mut(&g)) {
            members.retain(|&m| m != child);
        }
        if let Some(members) = self.groups.get_mut(group) {
            members.push(child);
        }
        Ok(())
    }
}

// Closest point on triangle abc to p (Ericson, Real-Time Collision Detection 5.1.5)
fn closest_point_on_triangle(p: DVec3, a: DVec3, b: DVec3, c: DVec3) -> DVec3 {
    let ab = b - a;
    let ac = c - a;
    let ap = p - a;
    let d1 = ab.dot(ap);
    let d2 = ac.dot(ap);
    if d1 <= 0.0 && d2 <= 0.0 {
        return a;
    }

    let bp = p - b;
    let d3 = ab.dot(bp);
    let d4 = ac.dot(bp);
    if d3 >= 0.0 && d4 <= d3 {
        return b;
    }

    let vc = d1 * d4 - d3 * d2;
    if vc <= 0.0 && d1 >= 0.0 && d3 <= 0.0 {
        return a + ab * (d1 / (d1 - d3));
    }

    let cp = p - c;
    let d5 = ab.dot(cp);
    let d6 = ac.dot(cp);
    if d6 >= 0.0 && d5 <= d6 {
        return c;
    }

    let vb = d5 * d2 - d1 * d6;
    if vb <= 0.0 && d2 >= 0.0 && d6 <= 0.0 {
        return a + ac * (d2 / (d2 - d6));
    }

    let va = d3 * d6 - d5 * d4;
    if va <= 0.0 && (d4 - d3) >= 0.0 && (d5 - d6) >= 0.0 {
        return b + (c - b) * ((d4 - d3) / ((d4 - d3) + (d5 - d6)));
    }

    let denom = 1.0 / (va + vb + vc);
    a + ab * (vb * denom) + ac * (vc * denom)
}

// Rotation taking local `up` onto `normal`, with local `reference` turned
// as close as it can get to the same world axis.
fn aim_rotation(up: DVec3, reference: DVec3, normal: DVec3) -> DQuat {
    let frame = |axis: DVec3, hint: DVec3| {
        let axis = axis.normalize_or(DVec3::Y);
        let side = (hint - axis * axis.dot(hint)).normalize_or_zero();
        let side = if side == DVec3::ZERO {
            axis.any_orthonormal_vector()
        } else {
            side
        };
        DMat3::from_cols(side, axis, side.cross(axis))
    };
    let local = frame(up, reference);
    let world = frame(normal, reference);
    DQuat::from_mat3(&(world * local.transpose())).normalize()
}
