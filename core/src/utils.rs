use image::{GrayImage, Luma};
use rand::Rng;

// 2D height map: row‐major Vec<Vec<f32>>, one row per lattice x
// access as `map[x][y]`, matching the grid's flat index x * (n + 1) + y
pub type HeightMap2D = Vec<Vec<f32>>;

// flatten a 2D height map (row‐major) into a single Vec<f32>
pub fn flatten2(map: &HeightMap2D) -> Vec<f32> {
    map.iter().flat_map(|row| row.iter().cloned()).collect()
}

// Rescale a height map into [0, 1] for previewing
pub fn normalize2(map: &mut HeightMap2D) {
    let mut min = f32::MAX;
    let mut max = f32::MIN;

    for row in map.iter() {
        for &val in row.iter() {
            min = min.min(val);
            max = max.max(val);
        }
    }

    let range = (max - min).max(0.001); // prevent zero-division
    for row in map.iter_mut() {
        for val in row.iter_mut() {
            *val = (*val - min) / range;
        }
    }
}

// Grayscale image of a normalized height map (values outside [0, 1] are clamped)
pub fn to_gray_image(map: &HeightMap2D) -> GrayImage {
    let h = map.len() as u32;
    let w = map.first().map_or(0, Vec::len) as u32;
    GrayImage::from_fn(w, h, |x, y| {
        let v = map[y as usize][x as usize].clamp(0.0, 1.0);
        Luma([(v * 255.0).round() as u8])
    })
}

// Uniform sample between two bounds, in either order
pub fn uniform<R: Rng + ?Sized>(rng: &mut R, a: f64, b: f64) -> f64 {
    if a == b {
        return a;
    }
    rng.gen_range(a.min(b)..=a.max(b))
}

// Moves a sample away from zero by `offset` in its own sign,
// so [-h, h] becomes [-2h, -h] ∪ [h, 2h]
#[inline]
pub fn push_from_zero(value: f64, offset: f64) -> f64 {
    if value >= 0.0 {
        value + offset
    } else {
        value - offset
    }
}
