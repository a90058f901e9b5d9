use glam::DVec3;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Result, TerrainError};
use crate::falloff::FalloffCurve;
use crate::host::{MeshHost, MeshId, SoftSelection};
use crate::utils::{push_from_zero, uniform};

// Shape constants for turning a sphere into a rock, as fractions of its radius
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RockSettings {
    pub subdivisions_axis: u32,
    pub subdivisions_height: u32,
    pub radius_jitter: f64,      // soft radius drawn from ±jitter, pushed out by 1
    pub base_flatten: f64,       // Y scale of the bottom pole
    pub base_falloff_scale: f64, // soft radius multiplier while flattening
    pub push_falloff_scale: f64, // soft radius multiplier while pushing
    pub middle_push: f64,        // equator vertex, along local X
    pub top_push: f64,           // top pole, along local X
    pub pivot_drop: f64,         // pivot moves down to the base
}

impl Default for RockSettings {
    fn default() -> Self {
        Self {
            subdivisions_axis: 20,
            subdivisions_height: 20,
            radius_jitter: 0.1,
            base_flatten: 0.00005,
            base_falloff_scale: 3.0,
            push_falloff_scale: 1.5,
            middle_push: 0.8,
            top_push: 0.4,
            pivot_drop: 0.95,
        }
    }
}

// A generated rock mesh and the values it was shaped with
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RockShape {
    pub mesh: MeshId,
    pub radius: f64,
    pub soft_select_radius: f64, // signed, |value| in [1 - jitter, 1 + jitter] * radius
    pub pivot: DVec3,            // object space, after recentering
}

// Deforms spheres into irregular rocks
#[derive(Debug, Clone)]
pub struct RockShaper {
    settings: RockSettings,
    falloff: FalloffCurve,
}

impl Default for RockShaper {
    fn default() -> Self {
        Self::new(RockSettings::default())
    }
}

impl RockShaper {
    pub fn new(settings: RockSettings) -> Self {
        Self {
            settings,
            falloff: FalloffCurve::smooth(),
        }
    }

    pub fn settings(&self) -> &RockSettings {
        &self.settings
    }

    // Creates a sphere of `radius` and shapes it
    pub fn generate<H, R>(&self, host: &mut H, name: &str, radius: f64, rng: &mut R) -> Result<RockShape>
    where
        H: MeshHost + ?Sized,
        R: Rng + ?Sized,
    {
        if !(radius > 0.0) {
            return Err(TerrainError::invalid(format!("rock radius must be positive, got {radius}")));
        }
        let sphere = host.create_sphere(
            name,
            radius,
            self.settings.subdivisions_axis,
            self.settings.subdivisions_height,
        )?;
        self.deform(host, sphere, radius, rng)
    }

    // Shapes an existing sphere: flat base, two sideways pushes, pivot at the base.
    // Only positions change, the vertex count stays the same.
    pub fn deform<H, R>(&self, host: &mut H, sphere: MeshId, radius: f64, rng: &mut R) -> Result<RockShape>
    where
        H: MeshHost + ?Sized,
        R: Rng + ?Sized,
    {
        let s = &self.settings;
        let vertices = host.list_vertices(sphere)?;
        if vertices.len() < 3 {
            return Err(TerrainError::invalid(format!(
                "{sphere} has {} vertices, not a sphere",
                vertices.len()
            )));
        }
        // rings..., bottom pole, top pole
        let bottom = vertices[vertices.len() - 2];
        let top = vertices[vertices.len() - 1];
        let middle = vertices[vertices.len() / 2];

        let jitter = uniform(rng, -s.radius_jitter, s.radius_jitter) * radius;
        let soft_select_radius = push_from_zero(jitter, radius);
        debug!(%sphere, radius, soft_select_radius, "Deforming rock");

        // Squash the bottom into a near planar base
        let base = SoftSelection::new(s.base_falloff_scale * soft_select_radius.abs(), &self.falloff);
        host.scale_vertex(
            bottom,
            DVec3::new(1.0, s.base_flatten * radius, 1.0),
            DVec3::new(0.0, -radius, 0.0),
            Some(&base),
        )?;

        // Break the symmetry sideways
        let push = SoftSelection::new(s.push_falloff_scale * soft_select_radius.abs(), &self.falloff);
        host.move_vertex(middle, DVec3::new(s.middle_push * radius, 0.0, 0.0), true, Some(&push))?;
        host.move_vertex(top, DVec3::new(s.top_push * radius, 0.0, 0.0), true, Some(&push))?;

        // Scale and rotate from the base, not the center
        let pivot = DVec3::new(0.0, -s.pivot_drop * radius, 0.0);
        host.move_pivot(sphere, pivot)?;

        Ok(RockShape {
            mesh: sphere,
            radius,
            soft_select_radius,
            pivot,
        })
    }
}
