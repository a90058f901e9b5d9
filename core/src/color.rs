use palette::{FromColor, Hsv, Srgb};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::utils::uniform;

// Ambient color of a rock: one hue shared by the batch,
// saturation and brightness drawn per rock
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AmbientColor {
    pub hue: f64, // degrees, 0..360
    pub saturation: f64,
    pub brightness: f64,
}

impl AmbientColor {
    pub fn new(hue: f64, saturation: f64, brightness: f64) -> Self {
        Self {
            hue,
            saturation,
            brightness,
        }
    }

    // Fully saturated, full brightness preview of a hue
    pub fn swatch(hue: f64) -> [f64; 3] {
        Self::new(hue, 1.0, 1.0).to_rgb()
    }

    // Draw saturation and brightness from their [min, max] ranges
    pub fn sample<R: Rng + ?Sized>(
        rng: &mut R,
        hue: f64,
        saturation: (f64, f64),
        brightness: (f64, f64),
    ) -> Self {
        let brightness = uniform(rng, brightness.0, brightness.1);
        let saturation = uniform(rng, saturation.0, saturation.1);
        Self::new(hue, saturation, brightness)
    }

    // Hue is taken modulo 360
    pub fn normalized_hue(&self) -> f64 {
        self.hue.rem_euclid(360.0) / 360.0
    }

    pub fn to_rgb(&self) -> [f64; 3] {
        let hsv: Hsv<_, f64> =
            Hsv::new(self.normalized_hue() * 360.0, self.saturation, self.brightness);
        let rgb = Srgb::<f64>::from_color(hsv);
        [rgb.red, rgb.green, rgb.blue]
    }
}
