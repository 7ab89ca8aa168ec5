//! Sorting and filtering for the trip list.

use std::cmp::Ordering;

use serde::Serialize;

use crate::storage::format_time;
use crate::trip::TripLog;

/// Primary sort column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortKey {
    /// Trip date.
    #[default]
    Date,
    /// Fish size.
    Size,
}

/// Direction of the primary sort.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    /// Newest or largest first.
    #[default]
    Desc,
    /// Oldest or smallest first.
    Asc,
}

/// Secondary sort column, always ascending.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Then {
    /// Time of day.
    Time,
    /// Fish size.
    Size,
    /// Trip date.
    Date,
}

/// How to present the list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListOptions {
    /// Primary column.
    pub key: SortKey,
    /// Primary direction.
    pub order: SortOrder,
    /// Tie-breaker.
    pub then: Option<Then>,
    /// Only trips at this area.
    pub area: Option<String>,
}

impl Default for ListOptions {
    fn default() -> Self {
        Self {
            key: SortKey::Date,
            order: SortOrder::Desc,
            then: Some(Then::Time),
            area: None,
        }
    }
}

/// Compare two optional values; `None` sorts after every value.
fn cmp_missing_last<T: PartialOrd>(a: Option<T>, b: Option<T>, descending: bool) -> Ordering {
    match (a, b) {
        (Some(x), Some(y)) => {
            let ord = x.partial_cmp(&y).unwrap_or(Ordering::Equal);
            if descending {
                ord.reverse()
            } else {
                ord
            }
        }
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

fn cmp_then(a: &TripLog, b: &TripLog, then: Then) -> Ordering {
    match then {
        Then::Time => cmp_missing_last(a.time, b.time, false),
        Then::Size => cmp_missing_last(a.size, b.size, false),
        Then::Date => cmp_missing_last(a.date, b.date, false),
    }
}

/// Sort `trips` in place. The sort is stable.
pub fn sort_trips(trips: &mut [TripLog], key: SortKey, order: SortOrder, then: Option<Then>) {
    let descending = order == SortOrder::Desc;
    trips.sort_by(|a, b| {
        let primary = match key {
            SortKey::Date => cmp_missing_last(a.date, b.date, descending),
            SortKey::Size => cmp_missing_last(a.size, b.size, descending),
        };
        primary.then_with(|| then.map_or(Ordering::Equal, |t| cmp_then(a, b, t)))
    });
}

/// Keep only trips at `area` (exact match); `None` keeps everything.
#[must_use]
pub fn filter_area(trips: Vec<TripLog>, area: Option<&str>) -> Vec<TripLog> {
    match area {
        Some(area) => trips.into_iter().filter(|t| t.area == area).collect(),
        None => trips,
    }
}

/// Filter then sort.
#[must_use]
pub fn list(trips: Vec<TripLog>, options: &ListOptions) -> Vec<TripLog> {
    let mut trips = filter_area(trips, options.area.as_deref());
    sort_trips(&mut trips, options.key, options.order, options.then);
    trips
}

/// One line of the list view.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ListRow {
    /// Trip id.
    pub id: i64,
    /// `YYYY-MM-DD` or `?`.
    pub date: String,
    /// `HH:MM` or blank.
    pub time: String,
    /// Area name.
    pub area: String,
    /// Size in cm or `-`.
    pub size: String,
    /// Whether the trip has photos.
    pub photo: bool,
}

impl From<&TripLog> for ListRow {
    fn from(trip: &TripLog) -> Self {
        Self {
            id: trip.id,
            date: trip
                .date
                .map_or_else(|| "?".to_string(), |d| d.format("%Y-%m-%d").to_string()),
            time: trip.time.map(format_time).unwrap_or_default(),
            area: trip.area.clone(),
            size: trip
                .size
                .filter(|s| *s > 0.0)
                .map_or_else(|| "-".to_string(), |s| format!("{s}cm")),
            photo: trip.has_photos(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trip::TidePhase;
    use chrono::{NaiveDate, NaiveTime};

    fn trip(id: i64, date: Option<(i32, u32, u32)>, time: Option<(u32, u32)>, size: Option<f64>) -> TripLog {
        TripLog {
            id,
            date: date.and_then(|(y, m, d)| NaiveDate::from_ymd_opt(y, m, d)),
            time: time.and_then(|(h, m)| NaiveTime::from_hms_opt(h, m, 0)),
            area: format!("area{}", id % 2),
            tide_phase: TidePhase::Unknown,
            tide_height: None,
            temperature: None,
            wind_direction: String::new(),
            lure: String::new(),
            action: String::new(),
            size,
            photos: Default::default(),
        }
    }

    fn ids(trips: &[TripLog]) -> Vec<i64> {
        trips.iter().map(|t| t.id).collect()
    }

    fn sample() -> Vec<TripLog> {
        vec![
            trip(1, Some((2024, 5, 1)), Some((21, 0)), Some(40.0)),
            trip(2, Some((2024, 5, 1)), Some((6, 30)), None),
            trip(3, Some((2024, 6, 10)), None, Some(62.0)),
            trip(4, None, Some((5, 0)), Some(30.0)),
        ]
    }

    #[test]
    fn test_default_is_date_desc_then_time() {
        let trips = list(sample(), &ListOptions::default());
        assert_eq!(ids(&trips), vec![3, 2, 1, 4]);
    }

    #[test]
    fn test_date_ascending_keeps_missing_last() {
        let mut trips = sample();
        sort_trips(&mut trips, SortKey::Date, SortOrder::Asc, Some(Then::Time));
        assert_eq!(ids(&trips), vec![2, 1, 3, 4]);
    }

    #[test]
    fn test_size_descending() {
        let mut trips = sample();
        sort_trips(&mut trips, SortKey::Size, SortOrder::Desc, None);
        assert_eq!(ids(&trips), vec![3, 1, 4, 2]);
    }

    #[test]
    fn test_size_ascending_then_date() {
        let mut trips = sample();
        trips.push(trip(5, Some((2023, 1, 1)), None, Some(40.0)));
        sort_trips(&mut trips, SortKey::Size, SortOrder::Asc, Some(Then::Date));
        assert_eq!(ids(&trips), vec![4, 5, 1, 3, 2]);
    }

    #[test]
    fn test_filter_area() {
        let trips = filter_area(sample(), Some("area1"));
        assert_eq!(ids(&trips), vec![1, 3]);
        assert_eq!(filter_area(sample(), None).len(), 4);
        assert!(filter_area(sample(), Some("nowhere")).is_empty());
    }

    #[test]
    fn test_list_row() {
        let mut t = trip(3, Some((2024, 6, 10)), Some((5, 5)), Some(62.0));
        t.photos[1] = Some("https://x".to_string());
        let row = ListRow::from(&t);

        assert_eq!(row.date, "2024-06-10");
        assert_eq!(row.time, "05:05");
        assert_eq!(row.size, "62cm");
        assert!(row.photo);

        let row = ListRow::from(&trip(4, None, None, Some(0.0)));
        assert_eq!(row.date, "?");
        assert_eq!(row.size, "-");
        assert!(!row.photo);
    }
}
