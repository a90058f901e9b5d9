// Scatters generated rocks over the terrain.

use std::time::Instant;

use glam::DVec3;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::color::AmbientColor;
use crate::error::{Result, TerrainError};
use crate::grid::TerrainGrid;
use crate::host::{MeshHost, MeshId, Projection};
use crate::rock::{RockShape, RockShaper};
use crate::utils::uniform;

// Placement constants. Rock size follows the terrain dimension relative to
// `reference_dimension`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScatterSettings {
    pub sphere_start_radius: f64,
    pub reference_dimension: f64,
    pub scale_min: f64,
    pub scale_max: f64,
    // Y and Z scales stray from X by at most this much.
    pub scale_jitter: f64,
}

impl Default for ScatterSettings {
    fn default() -> Self {
        Self {
            sphere_start_radius: 0.8,
            reference_dimension: 100.0,
            scale_min: 0.2,
            scale_max: 1.0,
            scale_jitter: 0.1,
        }
    }
}

// One batch of rocks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScatterRequest {
    pub name: String,
    pub count: u32,
    // Degrees, shared by the whole batch.
    pub hue: f64,
    pub saturation: (f64, f64),
    pub brightness: (f64, f64),
}

impl ScatterRequest {
    pub fn new(name: impl Into<String>, count: u32) -> Self {
        Self {
            name: name.into(),
            count,
            hue: 120.0,
            saturation: (0.0, 1.0),
            brightness: (0.0, 1.0),
        }
    }

    pub fn with_color(mut self, hue: f64, saturation: (f64, f64), brightness: (f64, f64)) -> Self {
        self.hue = hue;
        self.saturation = saturation;
        self.brightness = brightness;
        self
    }

    // Parent group every rock of the batch ends up under.
    pub fn group_name(&self) -> String {
        format!("{}_grp", self.name)
    }

    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(TerrainError::invalid("rocks need a name"));
        }
        if self.count < 1 {
            return Err(TerrainError::invalid("at least one rock must be requested"));
        }
        if !self.hue.is_finite() {
            return Err(TerrainError::invalid(format!("hue {}", self.hue)));
        }
        for (what, (lo, hi)) in [("saturation", self.saturation), ("brightness", self.brightness)] {
            if !(0.0..=1.0).contains(&lo) || !(0.0..=1.0).contains(&hi) {
                return Err(TerrainError::invalid(format!(
                    "{what} range ({lo}, {hi}) outside 0..=1"
                )));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RockInstance {
    pub shape: RockShape,
    pub scale: DVec3,
    // World position of the rock's base pivot after placement.
    pub position: DVec3,
    // `None` when the rock was left at height 0.
    pub projected: Option<Projection>,
    pub color: AmbientColor,
}

impl RockInstance {
    pub fn mesh(&self) -> MeshId {
        self.shape.mesh
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScatterReport {
    pub group: String,
    pub rocks: Vec<RockInstance>,
    // Set once projection failed; every later rock in the batch stayed at y = 0.
    pub projection_disabled: bool,
}

impl ScatterReport {
    pub fn projected_count(&self) -> usize {
        self.rocks.iter().filter(|r| r.projected.is_some()).count()
    }
}

#[derive(Debug, Clone, Default)]
pub struct RockScatter {
    settings: ScatterSettings,
    shaper: RockShaper,
}

impl RockScatter {
    pub fn new(settings: ScatterSettings, shaper: RockShaper) -> Self {
        Self { settings, shaper }
    }

    pub fn settings(&self) -> &ScatterSettings {
        &self.settings
    }

    pub fn shaper(&self) -> &RockShaper {
        &self.shaper
    }

    // Radius of the sphere every rock starts from.
    pub fn rock_radius(&self, dimension: f64) -> f64 {
        self.settings.sphere_start_radius * (dimension / self.settings.reference_dimension)
    }

    // Creates `request.count` rocks spread over a `dimension` wide square.
    // Rocks are snapped onto `terrain` while it exists. The first failed
    // projection turns projection off for the rest of the batch.
    pub fn scatter<H, R>(
        &self,
        host: &mut H,
        terrain: Option<&TerrainGrid>,
        dimension: f64,
        request: &ScatterRequest,
        rng: &mut R,
    ) -> Result<ScatterReport>
    where
        H: MeshHost + ?Sized,
        R: Rng + ?Sized,
    {
        request.validate()?;
        if !(dimension.is_finite() && dimension > 0.0) {
            return Err(TerrainError::invalid(format!("scatter dimension {dimension}")));
        }
        let start = Instant::now();
        let s = &self.settings;
        let radius = self.rock_radius(dimension);
        let group = request.group_name();
        let half = dimension / 2.0;

        let mut projecting = true;
        let mut rocks = Vec::with_capacity(request.count as usize);
        for _ in 0..request.count {
            let shape = self.shaper.generate(host, &request.name, radius, rng)?;
            let mesh = shape.mesh;

            let sx = uniform(rng, s.scale_min, s.scale_max);
            let sy = sx + uniform(rng, -s.scale_jitter, s.scale_jitter);
            let sz = sx + uniform(rng, -s.scale_jitter, s.scale_jitter);
            let scale = DVec3::new(sx, sy, sz);
            host.scale_mesh(mesh, scale)?;
            host.freeze_transform(mesh)?;

            let x = uniform(rng, -half, half);
            let z = uniform(rng, -half, half);
            host.translate_mesh(mesh, DVec3::new(x, 0.0, z))?;

            let mut projected = None;
            if projecting {
                let attempt = match terrain {
                    Some(grid) => host.project_onto_surface(mesh, grid.mesh(), DVec3::Y, DVec3::X),
                    None => Err(TerrainError::NoTerrain),
                };
                match attempt {
                    Ok(p) => projected = Some(p),
                    Err(TerrainError::NoTerrain) => {
                        warn!("No terrain was previously created, or got deleted. Spawning rocks randomly...");
                        projecting = false;
                    }
                    Err(e) => return Err(e),
                }
            }

            match host.group_under(&group, mesh) {
                Err(TerrainError::MissingGroup(_)) => {
                    host.create_group(&group);
                    host.group_under(&group, mesh)?;
                }
                other => other?,
            }

            let color = AmbientColor::sample(rng, request.hue, request.saturation, request.brightness);
            debug!(%mesh, ?color, "Rock placed");

            rocks.push(RockInstance {
                shape,
                scale,
                position: host.pivot(mesh)?,
                projected,
                color,
            });
        }

        debug!(elapsed = ?start.elapsed(), "Rock creation finished");
        info!(rocks = rocks.len(), group = %group, projected = projecting, "Scattered rocks");
        Ok(ScatterReport {
            group,
            rocks,
            projection_disabled: !projecting,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{SoftSelection, VertexId};
    use crate::scene::Scene;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn five_rocks_without_terrain() {
        let mut scene = Scene::new();
        let mut rng = StdRng::seed_from_u64(21);
        let request = ScatterRequest::new("myRocks", 5);
        let report = RockScatter::default()
            .scatter(&mut scene, None, 10.0, &request, &mut rng)
            .unwrap();

        assert_eq!(report.rocks.len(), 5);
        assert_eq!(report.projected_count(), 0);
        assert!(report.projection_disabled);
        assert_eq!(report.group, "myRocks_grp");
        assert_eq!(scene.group_count(), 1);
        assert_eq!(scene.group("myRocks_grp").unwrap().len(), 5);
        for rock in &report.rocks {
            assert_eq!(rock.position.y, 0.0);
            assert!(rock.position.x.abs() <= 5.0 && rock.position.z.abs() <= 5.0);
        }
    }

    #[test]
    fn scales_are_near_uniform() {
        let mut scene = Scene::new();
        let mut rng = StdRng::seed_from_u64(8);
        let request = ScatterRequest::new("r", 20);
        let report = RockScatter::default()
            .scatter(&mut scene, None, 100.0, &request, &mut rng)
            .unwrap();
        for rock in &report.rocks {
            let s = rock.scale;
            assert!((0.2..=1.0).contains(&s.x));
            assert!((s.y - s.x).abs() <= 0.1 + 1e-12);
            assert!((s.z - s.x).abs() <= 0.1 + 1e-12);
            // baked into the vertices
            let mesh = scene.mesh(rock.mesh()).unwrap();
            assert_eq!(mesh.transform().scale, DVec3::ONE);
        }
    }

    #[test]
    fn projects_onto_terrain() {
        let mut scene = Scene::new();
        let grid = TerrainGrid::create(&mut scene, "t", 20.0, 4).unwrap();
        for v in grid.vertices(&scene).unwrap() {
            grid.displace(&mut scene, v, 2.0).unwrap();
        }
        let mut rng = StdRng::seed_from_u64(4);
        let request = ScatterRequest::new("r", 3);
        let report = RockScatter::default()
            .scatter(&mut scene, Some(&grid), 20.0, &request, &mut rng)
            .unwrap();

        assert!(!report.projection_disabled);
        assert_eq!(report.projected_count(), 3);
        for rock in &report.rocks {
            assert!((rock.position.y - 2.0).abs() < 1e-9);
            let hit = rock.projected.unwrap();
            assert!((hit.normal - DVec3::Y).length() < 1e-9);
        }
    }

    #[test]
    fn deleted_terrain_downgrades_once() {
        let mut scene = Scene::new();
        let grid = TerrainGrid::create(&mut scene, "t", 20.0, 4).unwrap();
        scene.delete_mesh(grid.mesh());
        let mut rng = StdRng::seed_from_u64(4);
        let request = ScatterRequest::new("r", 4);
        let report = RockScatter::default()
            .scatter(&mut scene, Some(&grid), 20.0, &request, &mut rng)
            .unwrap();
        assert!(report.projection_disabled);
        assert_eq!(report.projected_count(), 0);
        assert_eq!(report.rocks.len(), 4);
    }

    #[test]
    fn rock_radius_follows_dimension() {
        let scatter = RockScatter::default();
        assert!((scatter.rock_radius(50.0) - 0.4).abs() < 1e-12);
        assert!((scatter.rock_radius(10.0) - 0.08).abs() < 1e-12);
    }

    #[test]
    fn existing_group_is_reused() {
        let mut scene = Scene::new();
        scene.create_group("r_grp");
        let mut rng = StdRng::seed_from_u64(2);
        let request = ScatterRequest::new("r", 2);
        RockScatter::default()
            .scatter(&mut scene, None, 10.0, &request, &mut rng)
            .unwrap();
        assert_eq!(scene.group_count(), 1);
        assert_eq!(scene.group("r_grp").unwrap().len(), 2);
    }

    #[test]
    fn rejects_bad_requests_before_creating_anything() {
        let mut scene = Scene::new();
        let mut rng = StdRng::seed_from_u64(2);
        let scatter = RockScatter::default();
        let zero = ScatterRequest::new("r", 0);
        assert!(matches!(
            scatter.scatter(&mut scene, None, 10.0, &zero, &mut rng),
            Err(TerrainError::InvalidParameter(_))
        ));
        let bad_color = ScatterRequest::new("r", 1).with_color(0.0, (0.0, 1.5), (0.0, 1.0));
        assert!(scatter.scatter(&mut scene, None, 10.0, &bad_color, &mut rng).is_err());
        let ok = ScatterRequest::new("r", 1);
        for dimension in [0.0, -5.0, f64::INFINITY, f64::NAN] {
            assert!(matches!(
                scatter.scatter(&mut scene, None, dimension, &ok, &mut rng),
                Err(TerrainError::InvalidParameter(_))
            ));
        }
        assert_eq!(scene.mesh_count(), 0);
    }

    // Scene that counts projections and loses its terrain after the first one
    struct FlakyTerrain {
        scene: Scene,
        projections: usize,
    }

    impl MeshHost for FlakyTerrain {
        fn create_plane(&mut self, name: &str, w: f64, h: f64, sx: u32, sy: u32) -> Result<MeshId> {
            self.scene.create_plane(name, w, h, sx, sy)
        }
        fn create_sphere(&mut self, name: &str, r: f64, axis: u32, height: u32) -> Result<MeshId> {
            self.scene.create_sphere(name, r, axis, height)
        }
        fn delete_mesh(&mut self, mesh: MeshId) -> bool {
            self.scene.delete_mesh(mesh)
        }
        fn mesh_exists(&self, mesh: MeshId) -> bool {
            self.scene.mesh_exists(mesh)
        }
        fn list_vertices(&self, mesh: MeshId) -> Result<Vec<VertexId>> {
            self.scene.list_vertices(mesh)
        }
        fn vertex_position(&self, vertex: VertexId) -> Result<DVec3> {
            self.scene.vertex_position(vertex)
        }
        fn move_vertex(
            &mut self,
            vertex: VertexId,
            offset: DVec3,
            relative: bool,
            soft: Option<&SoftSelection<'_>>,
        ) -> Result<()> {
            self.scene.move_vertex(vertex, offset, relative, soft)
        }
        fn scale_vertex(
            &mut self,
            vertex: VertexId,
            scale: DVec3,
            pivot: DVec3,
            soft: Option<&SoftSelection<'_>>,
        ) -> Result<()> {
            self.scene.scale_vertex(vertex, scale, pivot, soft)
        }
        fn smooth_shade(&mut self, mesh: MeshId, angle: f64) -> Result<()> {
            self.scene.smooth_shade(mesh, angle)
        }
        fn scale_mesh(&mut self, mesh: MeshId, scale: DVec3) -> Result<()> {
            self.scene.scale_mesh(mesh, scale)
        }
        fn move_pivot(&mut self, mesh: MeshId, offset: DVec3) -> Result<()> {
            self.scene.move_pivot(mesh, offset)
        }
        fn pivot(&self, mesh: MeshId) -> Result<DVec3> {
            self.scene.pivot(mesh)
        }
        fn freeze_transform(&mut self, mesh: MeshId) -> Result<()> {
            self.scene.freeze_transform(mesh)
        }
        fn translate_mesh(&mut self, mesh: MeshId, position: DVec3) -> Result<()> {
            self.scene.translate_mesh(mesh, position)
        }
        fn project_onto_surface(
            &mut self,
            instance: MeshId,
            surface: MeshId,
            up: DVec3,
            reference: DVec3,
        ) -> Result<Projection> {
            self.projections += 1;
            let hit = self.scene.project_onto_surface(instance, surface, up, reference);
            if self.projections == 1 {
                self.scene.delete_mesh(surface);
            }
            hit
        }
        fn create_group(&mut self, name: &str) {
            self.scene.create_group(name)
        }
        fn group_under(&mut self, group: &str, child: MeshId) -> Result<()> {
            self.scene.group_under(group, child)
        }
    }

    #[test]
    fn projection_not_retried_after_first_failure() {
        let mut host = FlakyTerrain {
            scene: Scene::new(),
            projections: 0,
        };
        let grid = TerrainGrid::create(&mut host, "t", 20.0, 4).unwrap();
        for v in grid.vertices(&host).unwrap() {
            grid.displace(&mut host, v, 2.0).unwrap();
        }
        let mut rng = StdRng::seed_from_u64(13);
        let request = ScatterRequest::new("r", 4);
        let report = RockScatter::default()
            .scatter(&mut host, Some(&grid), 20.0, &request, &mut rng)
            .unwrap();

        // one success, one failure, then no more attempts
        assert_eq!(host.projections, 2);
        assert!(report.projection_disabled);
        assert!(report.rocks[0].projected.is_some());
        assert!((report.rocks[0].position.y - 2.0).abs() < 1e-9);
        for rock in &report.rocks[1..] {
            assert!(rock.projected.is_none());
            assert_eq!(rock.position.y, 0.0);
        }
    }

    #[test]
    fn colors_share_hue() {
        let mut scene = Scene::new();
        let mut rng = StdRng::seed_from_u64(6);
        let request = ScatterRequest::new("r", 6).with_color(30.0, (0.2, 0.4), (0.6, 0.8));
        let report = RockScatter::default()
            .scatter(&mut scene, None, 10.0, &request, &mut rng)
            .unwrap();
        for rock in &report.rocks {
            assert_eq!(rock.color.hue, 30.0);
            assert!((0.2..=0.4).contains(&rock.color.saturation));
            assert!((0.6..=0.8).contains(&rock.color.brightness));
        }
    }
}
