//! Tide height × time of day heatmap over catches.

use std::collections::BTreeSet;

use chrono::Timelike;
use serde::Serialize;

use super::{mean, round1, Record};

/// Heights in this range are taken to be metres.
const METRE_RANGE: std::ops::RangeInclusive<f64> = 0.1..=5.0;

/// What a heatmap cell shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HeatmapMetric {
    /// Number of fish.
    #[default]
    Count,
    /// Mean fish size in cm.
    MeanSize,
}

/// Binning and metric for [`heatmap`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeatmapOptions {
    /// Hours per column: 1, 2 or 3.
    pub hour_step: u32,
    /// Upper edge of the tide axis in cm.
    pub tide_max_cm: u32,
    /// Tide bin width in cm.
    pub tide_step_cm: u32,
    /// Cell metric.
    pub metric: HeatmapMetric,
}

impl Default for HeatmapOptions {
    fn default() -> Self {
        Self {
            hour_step: 2,
            tide_max_cm: 220,
            tide_step_cm: 20,
            metric: HeatmapMetric::Count,
        }
    }
}

/// A tide-bin by hour-bin grid.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Heatmap {
    /// Cell metric.
    pub metric: HeatmapMetric,
    /// Column labels, earliest hour first.
    pub hour_labels: Vec<String>,
    /// Row labels, lowest tide first.
    pub tide_labels: Vec<String>,
    /// `cells[row][column]`; `None` is an empty mean-size cell.
    pub cells: Vec<Vec<Option<f64>>>,
    /// Catches that went into the grid.
    pub samples: usize,
}

impl Heatmap {
    fn empty(metric: HeatmapMetric) -> Self {
        Self {
            metric,
            hour_labels: Vec::new(),
            tide_labels: Vec::new(),
            cells: Vec::new(),
            samples: 0,
        }
    }

    /// Whether no catch qualified.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.samples == 0
    }

    /// Largest cell value.
    #[must_use]
    pub fn max_value(&self) -> Option<f64> {
        self.cells
            .iter()
            .flatten()
            .flatten()
            .copied()
            .reduce(f64::max)
    }
}

/// Tide height in cm, treating small values as metres.
#[must_use]
pub fn normalize_height(height: f64) -> f64 {
    if METRE_RANGE.contains(&height) {
        height * 100.0
    } else {
        height
    }
}

/// Index of the tide bin for `height_cm`, clipped into range.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn tide_bin(height_cm: f64, step: u32, bins: usize) -> usize {
    let clipped = height_cm.max(0.0);
    let index = (clipped / f64::from(step)).floor() as usize;
    index.min(bins - 1)
}

/// Build the heatmap over catches with a tide height and a real time.
///
/// The blank `00:00` time is not a real time and is left out.
#[allow(clippy::cast_possible_truncation)]
#[must_use]
pub fn heatmap(records: &[Record], options: &HeatmapOptions) -> Heatmap {
    let hour_step = options.hour_step.clamp(1, 24);
    let step = options.tide_step_cm.max(1);
    let bins = (options.tide_max_cm / step).max(1) as usize;

    // (tide bin, hour bin start, size)
    let samples: Vec<(usize, u32, f64)> = records
        .iter()
        .filter(|r| r.caught())
        .filter_map(|r| {
            let height = normalize_height(r.trip.tide_height?);
            let time = r.trip.meaningful_time()?;
            let hour_start = time.hour() / hour_step * hour_step;
            Some((
                tide_bin(height, step, bins),
                hour_start,
                r.trip.size.unwrap_or_default(),
            ))
        })
        .collect();

    if samples.is_empty() {
        return Heatmap::empty(options.metric);
    }

    let hours: Vec<u32> = samples
        .iter()
        .map(|(_, h, _)| *h)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    #[allow(clippy::cast_precision_loss)]
    let cells = (0..bins)
        .map(|bin| {
            hours
                .iter()
                .map(|hour| {
                    let sizes: Vec<f64> = samples
                        .iter()
                        .filter(|(b, h, _)| *b == bin && h == hour)
                        .map(|(_, _, s)| *s)
                        .collect();
                    match options.metric {
                        HeatmapMetric::Count => Some(sizes.len() as f64),
                        HeatmapMetric::MeanSize => mean(&sizes).map(round1),
                    }
                })
                .collect()
        })
        .collect();

    Heatmap {
        metric: options.metric,
        hour_labels: hours
            .iter()
            .map(|h| format!("{h}–{}", h + hour_step))
            .collect(),
        tide_labels: (0..bins)
            .map(|i| format!("{}–{}cm", i as u32 * step, (i as u32 + 1) * step))
            .collect(),
        cells,
        samples: samples.len(),
    }
}
