//! Counting builders: overall summary, tide phase, month and lure.

use std::collections::BTreeMap;

use serde::Serialize;

use super::{mean, rate, round1, Record};
use crate::trip::TidePhase;

/// Headroom above the tallest bar of the tide phase chart.
const Y_HEADROOM: f64 = 1.15;

/// Lure name used for catches logged without one.
pub const NO_LURE: &str = "(none)";

/// Overall trip counts.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    /// Number of trips.
    pub trips: usize,
    /// Trips with a catch.
    pub catches: usize,
    /// Catch rate in percent.
    pub catch_rate: f64,
}

/// Trips, catches, catch rate.
#[must_use]
pub fn summary(records: &[Record]) -> Summary {
    let trips = records.len();
    let catches = records.iter().filter(|r| r.caught()).count();
    Summary {
        trips,
        catches,
        catch_rate: rate(catches, trips),
    }
}

/// One bar of the tide phase chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PhaseStats {
    /// Phase label.
    pub phase: String,
    /// Trips on this phase.
    pub trips: usize,
    /// Trips with a catch.
    pub catches: usize,
    /// Catch rate in percent.
    pub catch_rate: f64,
}

/// The tide phase chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PhaseChart {
    /// Phases that occur, in display order.
    pub rows: Vec<PhaseStats>,
    /// Upper bound of the rate axis.
    pub y_max: f64,
}

/// Catch rate per tide phase.
#[must_use]
pub fn by_tide_phase(records: &[Record]) -> PhaseChart {
    let rows: Vec<PhaseStats> = TidePhase::ORDER
        .iter()
        .filter_map(|phase| {
            let group: Vec<&Record> = records
                .iter()
                .filter(|r| r.trip.tide_phase == *phase)
                .collect();
            if group.is_empty() {
                return None;
            }
            let catches = group.iter().filter(|r| r.caught()).count();
            Some(PhaseStats {
                phase: phase.label().to_string(),
                trips: group.len(),
                catches,
                catch_rate: rate(catches, group.len()),
            })
        })
        .collect();

    let y_max = rows.iter().map(|r| r.catch_rate).fold(0.0_f64, f64::max) * Y_HEADROOM;
    PhaseChart { rows, y_max }
}

/// One month of trips.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthStats {
    /// `YYYY-MM`.
    pub month: String,
    /// Number of trips.
    pub trips: usize,
    /// Trips with a catch.
    pub catches: usize,
    /// Catch rate in percent.
    pub catch_rate: f64,
    /// Mean size of the fish caught, `None` without a catch.
    pub avg_size: Option<f64>,
}

/// Trips and catches per month, oldest first.
#[must_use]
pub fn by_month(records: &[Record]) -> Vec<MonthStats> {
    let mut months: BTreeMap<&str, Vec<&Record>> = BTreeMap::new();
    for record in records {
        months.entry(record.month.as_str()).or_default().push(record);
    }

    months
        .into_iter()
        .map(|(month, group)| {
            let sizes: Vec<f64> = group
                .iter()
                .filter_map(|r| r.trip.size)
                .filter(|s| *s > 0.0)
                .collect();
            let catches = group.iter().filter(|r| r.caught()).count();
            MonthStats {
                month: month.to_string(),
                trips: group.len(),
                catches,
                catch_rate: rate(catches, group.len()),
                avg_size: mean(&sizes).map(round1),
            }
        })
        .collect()
}

/// Catches made with one lure.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LureStats {
    /// Lure name.
    pub lure: String,
    /// Number of fish caught.
    pub catches: usize,
    /// Mean size of those fish.
    pub avg_size: f64,
}

/// Catches per lure, most productive first.
#[must_use]
pub fn by_lure(records: &[Record]) -> Vec<LureStats> {
    let mut lures: BTreeMap<String, Vec<f64>> = BTreeMap::new();
    for record in records.iter().filter(|r| r.caught()) {
        let name = match record.trip.lure.trim() {
            "" => NO_LURE.to_string(),
            l => l.to_string(),
        };
        lures
            .entry(name)
            .or_default()
            .push(record.trip.size.unwrap_or_default());
    }

    let mut stats: Vec<LureStats> = lures
        .into_iter()
        .map(|(lure, sizes)| LureStats {
            lure,
            catches: sizes.len(),
            avg_size: round1(mean(&sizes).unwrap_or_default()),
        })
        .collect();
    // Stable sort keeps name order among equal counts.
    stats.sort_by(|a, b| b.catches.cmp(&a.catches));
    stats
}
