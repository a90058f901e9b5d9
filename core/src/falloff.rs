// Soft-selection falloff curves.
// A falloff maps the distance of a vertex from the selection center to an
// influence weight: 1.0 at the center, decaying to 0.0 at the influence radius.

use std::fmt::Write as _;

use serde::{Deserialize, Serialize};

use crate::error::{Result, TerrainError};

// Distance-weighted influence used by soft moves and scales.
pub trait Falloff {
    // Weight in `[0, 1]` for a vertex `distance` away from the center.
    // Vertices at or beyond `radius` are not influenced.
    fn weight(&self, distance: f64, radius: f64) -> f64;
}

// How a curve segment is interpolated, keyed on its left control point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Interpolation {
    None,
    Linear,
    Smooth,
    Spline,
}

impl Interpolation {
    // Numeric code used by the host's curve strings.
    pub fn code(self) -> u8 {
        match self {
            Interpolation::None => 0,
            Interpolation::Linear => 1,
            Interpolation::Smooth => 2,
            Interpolation::Spline => 3,
        }
    }

    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Interpolation::None),
            1 => Some(Interpolation::Linear),
            2 => Some(Interpolation::Smooth),
            3 => Some(Interpolation::Spline),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ControlPoint {
    // Normalized distance from the center, in `[0, 1]`.
    pub position: f64,
    pub value: f64,
    pub interpolation: Interpolation,
}

impl ControlPoint {
    pub const fn new(position: f64, value: f64, interpolation: Interpolation) -> Self {
        Self {
            position,
            value,
            interpolation,
        }
    }
}

// Piecewise falloff profile over normalized distance.
// Control points are kept sorted by position. Before the first point the
// curve holds the first value; after the last it holds the last value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<ControlPoint>", into = "Vec<ControlPoint>")]
pub struct FalloffCurve {
    points: Vec<ControlPoint>,
}

impl TryFrom<Vec<ControlPoint>> for FalloffCurve {
    type Error = TerrainError;

    fn try_from(points: Vec<ControlPoint>) -> Result<Self> {
        Self::new(points)
    }
}

impl From<FalloffCurve> for Vec<ControlPoint> {
    fn from(curve: FalloffCurve) -> Self {
        curve.points
    }
}

impl FalloffCurve {
    pub fn new(mut points: Vec<ControlPoint>) -> Result<Self> {
        if points.is_empty() {
            return Err(TerrainError::InvalidFalloff(
                "curve needs at least one control point".into(),
            ));
        }
        for p in &points {
            if !(0.0..=1.0).contains(&p.position) || !p.value.is_finite() {
                return Err(TerrainError::InvalidFalloff(format!(
                    "control point ({}, {}) is outside the unit range",
                    p.position, p.value
                )));
            }
        }
        points.sort_by(|a, b| a.position.total_cmp(&b.position));
        Ok(Self { points })
    }

    // Parses the host format: flat `value,position,interpolation` triples.
    pub fn parse(text: &str) -> Result<Self> {
        let fields = text
            .split(',')
            .map(|f| f.trim().parse::<f64>())
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| TerrainError::InvalidFalloff(format!("{text:?}: {e}")))?;

        if fields.len() % 3 != 0 {
            return Err(TerrainError::InvalidFalloff(format!(
                "{text:?}: expected value,position,interpolation triples"
            )));
        }

        let points = fields
            .chunks_exact(3)
            .map(|t| {
                let code = t[2];
                let interpolation = if code.fract() == 0.0 && (0.0..=3.0).contains(&code) {
                    Interpolation::from_code(code as u8)
                } else {
                    None
                };
                interpolation
                    .map(|i| ControlPoint::new(t[1], t[0], i))
                    .ok_or_else(|| {
                        TerrainError::InvalidFalloff(format!(
                            "{text:?}: unknown interpolation {code}"
                        ))
                    })
            })
            .collect::<Result<Vec<_>>>()?;

        Self::new(points)
    }

    // Encodes the curve back into the host format.
    pub fn to_host_string(&self) -> String {
        let mut out = String::new();
        for (i, p) in self.points.iter().enumerate() {
            if i > 0 {
                out.push(',');
            }
            let _ = write!(out, "{},{},{}", p.value, p.position, p.interpolation.code());
        }
        out
    }

    pub fn points(&self) -> &[ControlPoint] {
        &self.points
    }

    // Two points, smooth decay from center to edge. Also the rock falloff.
    pub fn smooth() -> Self {
        Self {
            points: vec![
                ControlPoint::new(0.0, 1.0, Interpolation::Smooth),
                ControlPoint::new(1.0, 0.0, Interpolation::Smooth),
            ],
        }
    }

    // Full strength up to half the radius, then a smooth decay.
    pub fn plateau() -> Self {
        Self {
            points: vec![
                ControlPoint::new(0.0, 1.0, Interpolation::Smooth),
                ControlPoint::new(0.5, 1.0, Interpolation::Smooth),
                ControlPoint::new(1.0, 0.0, Interpolation::Smooth),
            ],
        }
    }

    // Sharp spline drop near the center with a long shoulder.
    pub fn peaked() -> Self {
        Self {
            points: vec![
                ControlPoint::new(0.05, 1.0, Interpolation::Spline),
                ControlPoint::new(0.4, 0.5, Interpolation::Spline),
                ControlPoint::new(1.0, 0.0, Interpolation::Spline),
            ],
        }
    }

    // The curves random terrain edits pick from.
    pub fn palette() -> [FalloffCurve; 3] {
        [Self::smooth(), Self::plateau(), Self::peaked()]
    }

    // Evaluates the curve at normalized distance `t`, clamped to `[0, 1]`.
    pub fn sample(&self, t: f64) -> f64 {
        let pts = &self.points;
        let first = pts[0];
        let last = pts[pts.len() - 1];
        if t <= first.position {
            return first.value.clamp(0.0, 1.0);
        }
        if t >= last.position {
            return last.value.clamp(0.0, 1.0);
        }

        // First segment whose right end lies past t
        let i = pts
            .windows(2)
            .position(|w| t < w[1].position)
            .unwrap_or(pts.len() - 2);
        let (left, right) = (pts[i], pts[i + 1]);
        let span = right.position - left.position;
        if span <= 0.0 {
            return right.value.clamp(0.0, 1.0);
        }
        let s = (t - left.position) / span;

        let value = match left.interpolation {
            Interpolation::None => left.value,
            Interpolation::Linear => lerp(left.value, right.value, s),
            Interpolation::Smooth => lerp(left.value, right.value, s * s * (3.0 - 2.0 * s)),
            Interpolation::Spline => {
                let before = if i > 0 { pts[i - 1].value } else { left.value };
                let after = pts.get(i + 2).map_or(right.value, |p| p.value);
                catmull_rom(before, left.value, right.value, after, s)
            }
        };
        value.clamp(0.0, 1.0)
    }
}

impl Falloff for FalloffCurve {
    fn weight(&self, distance: f64, radius: f64) -> f64 {
        if radius <= 0.0 {
            return if distance <= 0.0 { 1.0 } else { 0.0 };
        }
        let t = distance / radius;
        if t >= 1.0 { 0.0 } else { self.sample(t) }
    }
}

#[inline]
fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}

fn catmull_rom(p0: f64, p1: f64, p2: f64, p3: f64, t: f64) -> f64 {
    let t2 = t * t;
    let t3 = t2 * t;
    0.5 * (2.0 * p1
        + (p2 - p0) * t
        + (2.0 * p0 - 5.0 * p1 + 4.0 * p2 - p3) * t2
        + (3.0 * p1 - p0 - 3.0 * p2 + p3) * t3)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presets_full_strength_at_center() {
        for curve in FalloffCurve::palette() {
            assert!((curve.weight(0.0, 20.0) - 1.0).abs() < 1e-12);
        }
    }

    #[test]
    fn presets_vanish_at_and_beyond_radius() {
        for curve in FalloffCurve::palette() {
            assert_eq!(curve.weight(20.0, 20.0), 0.0);
            assert_eq!(curve.weight(35.0, 20.0), 0.0);
        }
    }

    #[test]
    fn weights_stay_in_unit_range() {
        for curve in FalloffCurve::palette() {
            for i in 0..=100 {
                let w = curve.weight(i as f64 / 10.0, 10.0);
                assert!((0.0..=1.0).contains(&w), "weight {} out of range", w);
            }
        }
    }

    #[test]
    fn smooth_preset_decays_monotonically() {
        let curve = FalloffCurve::smooth();
        let mut prev = 1.0;
        for i in 1..=20 {
            let w = curve.weight(i as f64, 20.0);
            assert!(w <= prev);
            prev = w;
        }
        assert!((curve.weight(10.0, 20.0) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn plateau_holds_until_half_radius() {
        let curve = FalloffCurve::plateau();
        assert_eq!(curve.weight(4.9, 10.0), 1.0);
        assert!(curve.weight(7.5, 10.0) < 1.0);
    }

    #[test]
    fn peaked_passes_through_shoulder() {
        let curve = FalloffCurve::peaked();
        assert!((curve.sample(0.4) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn parse_host_strings() {
        assert_eq!(FalloffCurve::parse("1,0,2,0,1,2").unwrap(), FalloffCurve::smooth());
        assert_eq!(
            FalloffCurve::parse("1,0.5,2,0,1,2,1,0,2").unwrap(),
            FalloffCurve::plateau()
        );
        assert_eq!(
            FalloffCurve::parse("1,0.05,3,0,1,3,0.5,0.4,3").unwrap(),
            FalloffCurve::peaked()
        );
    }

    #[test]
    fn host_string_round_trip() {
        let curve = FalloffCurve::plateau();
        assert_eq!(FalloffCurve::parse(&curve.to_host_string()).unwrap(), curve);
    }

    #[test]
    fn parse_rejects_malformed() {
        assert!(FalloffCurve::parse("").is_err());
        assert!(FalloffCurve::parse("1,0").is_err());
        assert!(FalloffCurve::parse("1,0,7").is_err());
        assert!(FalloffCurve::parse("1,2,2").is_err());
        assert!(FalloffCurve::parse("a,b,c").is_err());
    }

    #[test]
    fn deserialize_goes_through_validation() {
        assert!(serde_json::from_str::<FalloffCurve>(r#"{"points":[]}"#).is_err());
        assert!(serde_json::from_str::<FalloffCurve>("[]").is_err());
        let outside = r#"[{"position": 1.5, "value": 1.0, "interpolation": "smooth"}]"#;
        assert!(serde_json::from_str::<FalloffCurve>(outside).is_err());

        let unsorted = r#"[
            {"position": 1.0, "value": 0.0, "interpolation": "smooth"},
            {"position": 0.0, "value": 1.0, "interpolation": "smooth"}
        ]"#;
        let curve: FalloffCurve = serde_json::from_str(unsorted).unwrap();
        assert_eq!(curve, FalloffCurve::smooth());

        let json = serde_json::to_string(&FalloffCurve::peaked()).unwrap();
        assert_eq!(serde_json::from_str::<FalloffCurve>(&json).unwrap(), FalloffCurve::peaked());
    }

    #[test]
    fn zero_radius_only_hits_center() {
        let curve = FalloffCurve::smooth();
        assert_eq!(curve.weight(0.0, 0.0), 1.0);
        assert_eq!(curve.weight(0.1, 0.0), 0.0);
    }
}
