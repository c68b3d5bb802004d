//! Headline metrics and their bounded jitter.
//!
//! Every refresh derives a fresh [`MetricSnapshot`] from the fixed
//! [`MetricBaseline`]; nothing accumulates between refreshes. A field's
//! offset is `U(-0.05, 0.05) * scale`, clamped to 5% of the baseline, then
//! counts are rounded and kept non-negative and percentages are kept within
//! `[0, 100]`.

use rand::Rng;
use serde::Serialize;

use crate::config::schema::JitterConfig;
use crate::data::{MetricBaseline, SeriesPoint};

/// Half-width of the uniform sample multiplied by each field's scale.
pub const JITTER_AMPLITUDE: f64 = 0.05;

/// Largest allowed deviation from a baseline, as a fraction of it.
pub const MAX_DEVIATION: f64 = 0.05;

/// Largest per-point deviation of the passenger flow series.
pub const FLOW_JITTER: f64 = 10.0;

/// Current values of the headline statistics.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MetricSnapshot {
    pub performance_pct: f64,
    pub active_buses: u32,
    pub passengers_today: u32,
    pub weekly_savings: u32,
    pub prediction_accuracy_pct: f64,
    pub system_uptime_pct: f64,
}

impl MetricSnapshot {
    /// The un-jittered snapshot.
    pub fn baseline(b: &MetricBaseline) -> Self {
        Self {
            performance_pct: b.performance_pct,
            active_buses: b.active_buses,
            passengers_today: b.passengers_today,
            weekly_savings: b.weekly_savings,
            prediction_accuracy_pct: b.prediction_accuracy_pct,
            system_uptime_pct: b.system_uptime_pct,
        }
    }

    /// A jittered copy of the baseline.
    pub fn jittered<R: Rng>(b: &MetricBaseline, scales: &JitterConfig, rng: &mut R) -> Self {
        Self {
            performance_pct: jitter_pct(b.performance_pct, scales.performance_scale, rng),
            active_buses: jitter_count(b.active_buses, scales.active_buses_scale, rng),
            passengers_today: jitter_count(b.passengers_today, scales.passengers_scale, rng),
            weekly_savings: jitter_count(b.weekly_savings, scales.savings_scale, rng),
            prediction_accuracy_pct: jitter_pct(
                b.prediction_accuracy_pct,
                scales.accuracy_scale,
                rng,
            ),
            system_uptime_pct: jitter_pct(b.system_uptime_pct, scales.uptime_scale, rng),
        }
    }

    /// Whether every field lies within the allowed band around `b`.
    pub fn within_bounds(&self, b: &MetricBaseline) -> bool {
        within(self.performance_pct, b.performance_pct)
            && within(f64::from(self.active_buses), f64::from(b.active_buses))
            && within(
                f64::from(self.passengers_today),
                f64::from(b.passengers_today),
            )
            && within(f64::from(self.weekly_savings), f64::from(b.weekly_savings))
            && within(self.prediction_accuracy_pct, b.prediction_accuracy_pct)
            && within(self.system_uptime_pct, b.system_uptime_pct)
            && (0.0..=100.0).contains(&self.performance_pct)
            && (0.0..=100.0).contains(&self.prediction_accuracy_pct)
            && (0.0..=100.0).contains(&self.system_uptime_pct)
    }
}

/// Offset for one field: scaled uniform sample, clamped to the deviation band.
fn offset<R: Rng>(baseline: f64, scale: f64, rng: &mut R) -> f64 {
    let limit = baseline.abs() * MAX_DEVIATION;
    let sample: f64 = rng.gen_range(-JITTER_AMPLITUDE..=JITTER_AMPLITUDE);
    (sample * scale).clamp(-limit, limit)
}

fn jitter_pct<R: Rng>(baseline: f64, scale: f64, rng: &mut R) -> f64 {
    (baseline + offset(baseline, scale, rng)).clamp(0.0, 100.0)
}

fn jitter_count<R: Rng>(baseline: u32, scale: f64, rng: &mut R) -> u32 {
    let base = f64::from(baseline);
    let limit = (base * MAX_DEVIATION).floor();
    // Rounding may cross the band edge, so clamp again after rounding.
    let value = (base + offset(base, scale, rng))
        .round()
        .clamp(base - limit, base + limit)
        .max(0.0);
    value as u32
}

fn within(value: f64, baseline: f64) -> bool {
    (value - baseline).abs() <= baseline.abs() * MAX_DEVIATION + 1e-9
}

/// Jitter each point of a series around its baseline, keeping values ≥ 0.
pub fn jitter_series<R: Rng>(baseline: &[SeriesPoint], rng: &mut R) -> Vec<SeriesPoint> {
    baseline
        .iter()
        .map(|p| {
            let delta: f64 = rng.gen_range(-FLOW_JITTER..=FLOW_JITTER);
            SeriesPoint {
                label: p.label.clone(),
                value: (p.value + delta).max(0.0),
            }
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
