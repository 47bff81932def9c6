//! Normalization of sparse numeric series into plot coordinates.

use serde::Serialize;

/// Value used for missing samples and for series with no spread.
pub const MIDPOINT: f64 = 0.5;

pub const DEFAULT_CHART_HEIGHT: f64 = 60.0;

const MIN_CHART_WIDTH: f64 = 120.0;
const POINT_SPACING: f64 = 30.0;
const CHART_MARGIN: f64 = 10.0;

/// Maps samples onto [0, 1] by min–max scaling over the present, finite values.
///
/// - no usable samples: every output is [`MIDPOINT`]
/// - min == max (flat series, single point): every output is [`MIDPOINT`]
/// - otherwise each usable sample is `(v - min) / (max - min)` and each missing
///   or non-finite sample is [`MIDPOINT`], whatever its neighbours are
///
/// Output length always equals input length.
pub fn normalize(samples: &[Option<f64>]) -> Vec<f64> {
    let clean = samples.iter().filter_map(|s| s.filter(|v| v.is_finite()));
    let (min, max) = clean.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    });

    // Empty series leaves min > max; flat series has min == max.
    if min >= max {
        return vec![MIDPOINT; samples.len()];
    }

    let span = max - min;
    samples
        .iter()
        .map(|s| match s {
            Some(v) if v.is_finite() => (v - min) / span,
            _ => MIDPOINT,
        })
        .collect()
}

/// Last present, finite sample.
pub fn latest(samples: &[Option<f64>]) -> Option<f64> {
    samples.iter().rev().find_map(|s| s.filter(|v| v.is_finite()))
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

/// Pixel geometry for a mini line chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartLayout {
    pub width: f64,
    pub height: f64,
    pub points: Vec<Point>,
}

impl ChartLayout {
    pub fn compute(samples: &[Option<f64>], height: f64) -> Self {
        let n = samples.len();
        let width = MIN_CHART_WIDTH.max(n as f64 * POINT_SPACING);
        let inner_w = width - 2.0 * CHART_MARGIN;
        let inner_h = height - 2.0 * CHART_MARGIN;

        let points = normalize(samples)
            .into_iter()
            .enumerate()
            .map(|(i, v)| {
                let x = if n == 1 {
                    width / 2.0
                } else {
                    (i as f64 / (n - 1) as f64) * inner_w + CHART_MARGIN
                };
                // Larger values plot higher, so invert.
                let y = (1.0 - v) * inner_h + CHART_MARGIN;
                Point { x, y }
            })
            .collect();

        Self { width, height, points }
    }

    /// SVG path data joining the points, or `None` with fewer than two points.
    pub fn path(&self) -> Option<String> {
        if self.points.len() < 2 {
            return None;
        }
        let d = self
            .points
            .iter()
            .enumerate()
            .map(|(i, p)| format!("{}{},{}", if i == 0 { "M" } else { "L" }, p.x, p.y))
            .collect::<Vec<_>>()
            .join(" ");
        Some(d)
    }
}
