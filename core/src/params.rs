use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};

use crate::deformer::DeformMethod;
use crate::error::{Result, TerrainError};
use crate::scatter::ScatterRequest;

pub const DIMENSION_RANGE: RangeInclusive<f64> = 1.0..=150.0;
pub const SUBDIVISION_RANGE: RangeInclusive<u32> = 1..=150;
pub const ROCK_AMOUNT_RANGE: RangeInclusive<u32> = 1..=100;
pub const HUE_RANGE: RangeInclusive<f64> = 0.0..=359.0;

// Everything a user sets before pressing a button
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TerrainParams {
    pub terrain_name: String,
    pub dimension: f64,
    pub subdivisions: u32,
    pub method: DeformMethod,
    pub rocks_name: String,
    pub rocks_amount: u32,
    pub hue: f64,
    pub saturation: (f64, f64),
    pub brightness: (f64, f64),
}

impl Default for TerrainParams {
    fn default() -> Self {
        Self {
            terrain_name: "myTerrain".to_string(),
            dimension: 50.0,
            subdivisions: 50,
            method: DeformMethod::SoftRandom,
            rocks_name: "myRocks".to_string(),
            rocks_amount: 1,
            hue: 120.0,
            saturation: (0.0, 1.0),
            brightness: (0.0, 1.0),
        }
    }
}

impl TerrainParams {
    // Terrain fields only
    pub fn validate_terrain(&self) -> Result<()> {
        if self.terrain_name.trim().is_empty() {
            return Err(TerrainError::invalid("terrain needs a name"));
        }
        if !DIMENSION_RANGE.contains(&self.dimension) {
            return Err(out_of_range("dimension", self.dimension, &DIMENSION_RANGE));
        }
        if !SUBDIVISION_RANGE.contains(&self.subdivisions) {
            return Err(out_of_range("subdivisions", self.subdivisions, &SUBDIVISION_RANGE));
        }
        Ok(())
    }

    // Rock fields only
    pub fn validate_rocks(&self) -> Result<()> {
        if !ROCK_AMOUNT_RANGE.contains(&self.rocks_amount) {
            return Err(out_of_range("rocks amount", self.rocks_amount, &ROCK_AMOUNT_RANGE));
        }
        if !HUE_RANGE.contains(&self.hue) {
            return Err(out_of_range("hue", self.hue, &HUE_RANGE));
        }
        self.scatter_request().validate()
    }

    pub fn validate(&self) -> Result<()> {
        self.validate_terrain()?;
        self.validate_rocks()
    }

    pub fn scatter_request(&self) -> ScatterRequest {
        ScatterRequest::new(self.rocks_name.clone(), self.rocks_amount).with_color(
            self.hue,
            self.saturation,
            self.brightness,
        )
    }
}

fn out_of_range<T: std::fmt::Display>(what: &str, value: T, range: &RangeInclusive<T>) -> TerrainError {
    TerrainError::invalid(format!(
        "{what} {value} outside {}..={}",
        range.start(),
        range.end()
    ))
}
