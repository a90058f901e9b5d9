use crate::NoiseGenerator;

// Frequency/amplitude ladder summed by `fractal_noise`
pub const OCTAVES: [(f64, f64); 4] = [(1.0, 1.0), (2.0, 0.5), (4.0, 0.25), (8.0, 0.125)];
// 1 + 0.5 + 0.25 + 0.125
pub const AMPLITUDE_SUM: f64 = 1.875;

// Sine based hash for a single lattice point.
// Keeps the sign of the fractional part (truncation toward zero),
// so the result lies in (-1, 1).
#[inline]
pub fn point_noise(x: f64, y: f64, seed: f64) -> f64 {
    ((x * 100.0 + y * seed).sin() * seed).fract()
}

// Hermite smoothstep: 3t^2 - 2t^3
#[inline]
fn smoothstep(t: f64) -> f64 {
    t * t * (3.0 - 2.0 * t)
}

#[inline]
fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a * (1.0 - t) + b * t
}

// Value noise at (x, y): the four surrounding lattice points are hashed
// and blended with a smoothstep weight on each axis.
pub fn smooth_noise(x: f64, y: f64, seed: f64) -> f64 {
    // Which cell? (integer part, toward zero)
    let cell_x = x.trunc();
    let cell_y = y.trunc();
    // Where inside the cell?
    let u = smoothstep(x.fract());
    let v = smoothstep(y.fract());

    let bottom = lerp(
        point_noise(cell_x, cell_y, seed),
        point_noise(cell_x + 1.0, cell_y, seed),
        u,
    );
    let top = lerp(
        point_noise(cell_x, cell_y + 1.0, seed),
        point_noise(cell_x + 1.0, cell_y + 1.0, seed),
        u,
    );
    lerp(bottom, top, v)
}

// Four octaves of `smooth_noise`, normalized by the amplitude sum.
// Not clamped: interpolation can overshoot slightly.
pub fn fractal_noise(x: f64, y: f64, seed: f64) -> f64 {
    let total: f64 = OCTAVES
        .iter()
        .map(|&(freq, amp)| smooth_noise(x * freq, y * freq, seed) * amp)
        .sum();
    total / AMPLITUDE_SUM
}

// 2D value noise generator
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ValueNoise2D {
    seed: f64,
    frequency: f64, // base frequency applied before the octave ladder
}

impl ValueNoise2D {
    pub fn new(seed: f64, frequency: f64) -> Self {
        Self { seed, frequency }
    }

    pub fn seed(&self) -> f64 {
        self.seed
    }

    pub fn frequency(&self) -> f64 {
        self.frequency
    }
}

impl NoiseGenerator for ValueNoise2D {
    fn get2(&self, x: f64, y: f64) -> f64 {
        fractal_noise(x * self.frequency, y * self.frequency, self.seed)
    }
}
