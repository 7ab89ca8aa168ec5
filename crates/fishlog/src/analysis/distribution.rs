//! Tide height spread per area, for box plots.

use serde::Serialize;

use super::Record;

/// Five-number summary of the tide heights at which fish were caught in
/// one area.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AreaDistribution {
    /// Area name.
    pub area: String,
    /// Number of catches with a tide height.
    pub count: usize,
    /// Lowest height.
    pub min: f64,
    /// First quartile.
    pub q1: f64,
    /// Median.
    pub median: f64,
    /// Third quartile.
    pub q3: f64,
    /// Highest height.
    pub max: f64,
    /// Every height, ascending.
    pub points: Vec<f64>,
}

/// Quantile of sorted `values` by linear interpolation between ranks.
#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
fn quantile(sorted: &[f64], q: f64) -> f64 {
    let pos = q * (sorted.len() - 1) as f64;
    let lower = pos.floor() as usize;
    let upper = pos.ceil() as usize;
    let frac = pos - lower as f64;
    sorted[lower] + (sorted[upper] - sorted[lower]) * frac
}

/// Tide-height box statistics per area over catches with a height.
///
/// Areas appear in order of first occurrence.
#[must_use]
pub fn area_tide_distribution(records: &[Record]) -> Vec<AreaDistribution> {
    let mut groups: Vec<(String, Vec<f64>)> = Vec::new();
    for record in records.iter().filter(|r| r.caught()) {
        let Some(height) = record.trip.tide_height else {
            continue;
        };
        match groups.iter_mut().find(|(area, _)| *area == record.area) {
            Some((_, heights)) => heights.push(height),
            None => groups.push((record.area.clone(), vec![height])),
        }
    }

    groups
        .into_iter()
        .map(|(area, mut points)| {
            points.sort_by(f64::total_cmp);
            AreaDistribution {
                count: points.len(),
                min: points[0],
                q1: quantile(&points, 0.25),
                median: quantile(&points, 0.5),
                q3: quantile(&points, 0.75),
                max: points[points.len() - 1],
                area,
                points,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::prepare;
    use crate::analysis::test_support::trip;
    use crate::trip::{TidePhase, TripLog};

    fn with_height(id: i64, area: &str, size: f64, height: Option<f64>) -> TripLog {
        let mut t = trip(id, "2024-05-01", area, TidePhase::Major, Some(size));
        t.tide_height = height;
        t
    }

    #[test]
    fn test_quantile_interpolates() {
        let values = [100.0, 120.0, 150.0, 200.0];
        assert!((quantile(&values, 0.5) - 135.0).abs() < 1e-9);
        assert!((quantile(&values, 0.25) - 115.0).abs() < 1e-9);
        assert!((quantile(&values, 0.75) - 162.5).abs() < 1e-9);
        assert!((quantile(&[42.0], 0.75) - 42.0).abs() < 1e-9);
    }

    #[test]
    fn test_distribution_per_area() {
        let trips = vec![
            with_height(1, "若洲", 50.0, Some(150.0)),
            with_height(2, "若洲", 40.0, Some(100.0)),
            with_height(3, "豊洲", 60.0, Some(80.0)),
            with_height(4, "若洲", 0.0, Some(10.0)),
            with_height(5, "若洲", 45.0, None),
            with_height(6, "若洲", 55.0, Some(200.0)),
        ];
        let dist = area_tide_distribution(&prepare(&trips, None));

        assert_eq!(dist.len(), 2);
        assert_eq!(dist[0].area, "若洲");
        assert_eq!(dist[0].count, 3);
        assert_eq!(dist[0].points, vec![100.0, 150.0, 200.0]);
        assert!((dist[0].median - 150.0).abs() < 1e-9);
        assert!((dist[0].q1 - 125.0).abs() < 1e-9);
        assert_eq!(dist[1].area, "豊洲");
        assert_eq!(dist[1].count, 1);
    }

    #[test]
    fn test_distribution_empty_without_heights() {
        let trips = vec![with_height(1, "若洲", 50.0, None)];
        assert!(area_tide_distribution(&prepare(&trips, None)).is_empty());
        assert!(area_tide_distribution(&[]).is_empty());
    }
}
