//! Catch analysis over the trip log.
//!
//! Every builder takes the prepared records from [`prepare`] and returns a
//! plain data structure that the CLI renders as a table, a bar chart or
//! JSON. An empty input always yields an empty result.

pub mod distribution;
pub mod heatmap;
pub mod summary;

use chrono::NaiveDate;
use serde::Serialize;

use crate::config::AnalysisConfig;
use crate::trip::TripLog;

pub use distribution::{area_tide_distribution, AreaDistribution};
pub use heatmap::{heatmap, Heatmap, HeatmapMetric, HeatmapOptions};
pub use summary::{by_lure, by_month, by_tide_phase, summary, LureStats, MonthStats, PhaseChart, PhaseStats, Summary};

/// Area name used for trips logged without one.
pub const NO_AREA: &str = "(none)";

/// Area filter value meaning "every area".
pub const ALL_AREAS: &str = "all";

/// A trip with a usable date, ready for grouping.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    /// Trip date.
    pub date: NaiveDate,
    /// `YYYY-MM`.
    pub month: String,
    /// Area, with blanks replaced by [`NO_AREA`].
    pub area: String,
    /// The stored trip.
    pub trip: TripLog,
}

impl Record {
    /// Whether a fish was landed.
    #[must_use]
    pub fn caught(&self) -> bool {
        self.trip.caught()
    }
}

/// Drop undated trips and apply the area filter.
///
/// `area` of `None` or [`ALL_AREAS`] keeps every area.
#[must_use]
pub fn prepare(trips: &[TripLog], area: Option<&str>) -> Vec<Record> {
    let area = area.filter(|a| *a != ALL_AREAS);
    trips
        .iter()
        .filter_map(|trip| {
            let date = trip.date?;
            let area_name = match trip.area.trim() {
                "" => NO_AREA.to_string(),
                a => a.to_string(),
            };
            Some(Record {
                date,
                month: date.format("%Y-%m").to_string(),
                area: area_name,
                trip: trip.clone(),
            })
        })
        .filter(|r| area.map_or(true, |a| r.area == a))
        .collect()
}

/// Areas present in `records`, sorted by name.
#[must_use]
pub fn area_names(records: &[Record]) -> Vec<String> {
    let mut names: Vec<String> = records.iter().map(|r| r.area.clone()).collect();
    names.sort();
    names.dedup();
    names
}

/// Percentage of `part` in `whole`, rounded to one decimal; 0 when empty.
#[allow(clippy::cast_precision_loss)]
#[must_use]
pub fn rate(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        round1(part as f64 / whole as f64 * 100.0)
    }
}

/// Round to one decimal place.
#[must_use]
pub fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Arithmetic mean, `None` for no values.
#[allow(clippy::cast_precision_loss)]
#[must_use]
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

/// Which part of the report to build.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    /// Trips, catches, rate.
    Summary,
    /// Catch rate per tide phase.
    Tide,
    /// Trips and catch rate per month.
    Month,
    /// Catches per lure.
    Lure,
    /// Tide-height spread per area.
    Area,
    /// Tide height by time of day.
    Heatmap,
}

impl Section {
    /// Every section in report order.
    pub const ALL: [Section; 6] = [
        Self::Summary,
        Self::Tide,
        Self::Month,
        Self::Lure,
        Self::Area,
        Self::Heatmap,
    ];
}

/// Settings for [`build_report`].
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisOptions {
    /// Area filter; `None` or `"all"` for every area.
    pub area: Option<String>,
    /// Heatmap settings.
    pub heatmap: HeatmapOptions,
}

impl AnalysisOptions {
    /// Options seeded from configuration.
    #[must_use]
    pub fn from_config(config: &AnalysisConfig) -> Self {
        Self {
            area: None,
            heatmap: HeatmapOptions {
                hour_step: config.hour_step,
                tide_max_cm: config.tide_max_cm,
                tide_step_cm: config.tide_step_cm,
                metric: HeatmapMetric::Count,
            },
        }
    }
}

/// Every analysis section together.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisReport {
    /// Area the report covers, `None` for all.
    pub area: Option<String>,
    /// Areas available for filtering.
    pub areas: Vec<String>,
    /// Overall numbers.
    pub summary: Summary,
    /// Per tide phase.
    pub by_tide_phase: PhaseChart,
    /// Per month.
    pub by_month: Vec<MonthStats>,
    /// Per lure.
    pub by_lure: Vec<LureStats>,
    /// Per area tide spread.
    pub area_distribution: Vec<AreaDistribution>,
    /// Tide × time heatmap.
    pub heatmap: Heatmap,
}

/// Build the full report.
#[must_use]
pub fn build_report(trips: &[TripLog], options: &AnalysisOptions) -> AnalysisReport {
    let areas = area_names(&prepare(trips, None));
    let records = prepare(trips, options.area.as_deref());
    AnalysisReport {
        area: options.area.clone().filter(|a| a != ALL_AREAS),
        areas,
        summary: summary(&records),
        by_tide_phase: by_tide_phase(&records),
        by_month: by_month(&records),
        by_lure: by_lure(&records),
        area_distribution: area_tide_distribution(&records),
        heatmap: heatmap(&records, &options.heatmap),
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::trip::TidePhase;

    /// A stored trip with the fields the analyses read.
    pub fn trip(
        id: i64,
        date: &str,
        area: &str,
        phase: TidePhase,
        size: Option<f64>,
    ) -> TripLog {
        TripLog {
            id,
            date: NaiveDate::parse_from_str(date, "%Y-%m-%d").ok(),
            time: None,
            area: area.to_string(),
            tide_phase: phase,
            tide_height: None,
            temperature: None,
            wind_direction: String::new(),
            lure: String::new(),
            action: String::new(),
            size,
            photos: Default::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::trip;
    use super::*;
    use crate::trip::TidePhase;

    #[test]
    fn test_prepare_drops_undated_and_fills_area() {
        let trips = vec![
            trip(1, "2024-05-01", "", TidePhase::Major, None),
            trip(2, "not a date", "若洲", TidePhase::Major, None),
            trip(3, "2024-06-02", "若洲", TidePhase::Minor, Some(40.0)),
        ];
        let records = prepare(&trips, None);

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].area, NO_AREA);
        assert_eq!(records[0].month, "2024-05");
        assert!(records[1].caught());
    }

    #[test]
    fn test_prepare_area_filter() {
        let trips = vec![
            trip(1, "2024-05-01", "豊洲", TidePhase::Major, None),
            trip(2, "2024-05-02", "若洲", TidePhase::Major, None),
        ];

        assert_eq!(prepare(&trips, Some("若洲")).len(), 1);
        assert_eq!(prepare(&trips, Some(ALL_AREAS)).len(), 2);
        assert!(prepare(&trips, Some("どこか")).is_empty());
    }

    #[test]
    fn test_area_names_sorted_unique() {
        let trips = vec![
            trip(1, "2024-05-01", "b", TidePhase::Major, None),
            trip(2, "2024-05-02", "a", TidePhase::Major, None),
            trip(3, "2024-05-03", "b", TidePhase::Major, None),
        ];
        assert_eq!(area_names(&prepare(&trips, None)), vec!["a", "b"]);
    }

    #[test]
    fn test_rate_and_rounding() {
        assert!((rate(3, 10) - 30.0).abs() < f64::EPSILON);
        assert!((rate(1, 3) - 33.3).abs() < 1e-9);
        assert!((rate(0, 0)).abs() < f64::EPSILON);
        assert!((round1(12.345) - 12.3).abs() < 1e-9);
    }

    #[test]
    fn test_mean() {
        assert_eq!(mean(&[]), None);
        assert_eq!(mean(&[40.0, 60.0]), Some(50.0));
    }

    #[test]
    fn test_build_report_empty() {
        let report = build_report(&[], &AnalysisOptions::from_config(&AnalysisConfig::default()));

        assert_eq!(report.summary.trips, 0);
        assert!(report.by_tide_phase.rows.is_empty());
        assert!(report.by_month.is_empty());
        assert!(report.by_lure.is_empty());
        assert!(report.area_distribution.is_empty());
        assert!(report.heatmap.is_empty());
    }

    #[test]
    fn test_build_report_with_area_filter() {
        let trips = vec![
            trip(1, "2024-05-01", "豊洲", TidePhase::Major, Some(50.0)),
            trip(2, "2024-05-02", "若洲", TidePhase::Major, None),
        ];
        let mut options = AnalysisOptions::from_config(&AnalysisConfig::default());
        options.area = Some("豊洲".to_string());

        let report = build_report(&trips, &options);
        assert_eq!(report.area.as_deref(), Some("豊洲"));
        assert_eq!(report.areas, vec!["若洲", "豊洲"]);
        assert_eq!(report.summary.trips, 1);
        assert_eq!(report.summary.catches, 1);
    }

    #[test]
    fn test_report_serializes() {
        let trips = vec![trip(1, "2024-05-01", "豊洲", TidePhase::Major, Some(50.0))];
        let report = build_report(&trips, &AnalysisOptions::from_config(&AnalysisConfig::default()));

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["summary"]["trips"], 1);
        assert_eq!(json["by_tide_phase"]["rows"][0]["phase"], "大潮");
    }
}
