//! Core trip-log types.
//!
//! One flat record describes one fishing trip: where and when, the tide and
//! weather conditions, what lure was used and what (if anything) was caught.

use std::fmt;
use std::str::FromStr;

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Number of photo slots per trip.
pub const PHOTO_SLOTS: usize = 3;

/// Time stored when a trip was logged without one.
#[must_use]
pub fn blank_time() -> NaiveTime {
    NaiveTime::MIN
}

/// Lunar tide phase (潮回り) of the trip day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TidePhase {
    /// 大潮, spring tide.
    Major,
    /// 中潮.
    Medium,
    /// 小潮, neap tide.
    Minor,
    /// 若潮, the tide after the neap.
    Young,
    /// 長潮, the long, slack neap.
    Long,
    /// 不明, not recorded.
    Unknown,
}

impl TidePhase {
    /// Display order used by listings and charts.
    pub const ORDER: [TidePhase; 6] = [
        Self::Major,
        Self::Medium,
        Self::Minor,
        Self::Young,
        Self::Long,
        Self::Unknown,
    ];

    /// The label written to the log.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Major => "大潮",
            Self::Medium => "中潮",
            Self::Minor => "小潮",
            Self::Young => "若潮",
            Self::Long => "長潮",
            Self::Unknown => "不明",
        }
    }

    /// English name, also accepted on input.
    #[must_use]
    pub fn english(self) -> &'static str {
        match self {
            Self::Major => "major",
            Self::Medium => "medium",
            Self::Minor => "minor",
            Self::Young => "young",
            Self::Long => "long",
            Self::Unknown => "unknown",
        }
    }

    /// Interpret a stored cell; anything unrecognised reads as `Unknown`.
    #[must_use]
    pub fn from_stored(text: &str) -> Self {
        text.parse().unwrap_or(Self::Unknown)
    }

    /// Position in [`TidePhase::ORDER`].
    #[must_use]
    pub fn rank(self) -> usize {
        Self::ORDER.iter().position(|p| *p == self).unwrap_or(Self::ORDER.len())
    }
}

impl fmt::Display for TidePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for TidePhase {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        Self::ORDER
            .into_iter()
            .find(|p| p.label() == s || p.english().eq_ignore_ascii_case(s))
            .ok_or_else(|| {
                Error::invalid(
                    "tide phase",
                    format!("'{s}' (expected 大潮/中潮/小潮/若潮/長潮 or major/medium/minor/young/long)"),
                )
            })
    }
}

/// A trip as stored in the log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TripLog {
    /// Identifier assigned by the store.
    pub id: i64,
    /// Trip date; `None` when the stored text does not parse.
    pub date: Option<NaiveDate>,
    /// Time of the catch or of the session.
    pub time: Option<NaiveTime>,
    /// Area / spot name as typed.
    pub area: String,
    /// Tide phase of the day.
    pub tide_phase: TidePhase,
    /// Tide height in centimetres.
    pub tide_height: Option<f64>,
    /// Air temperature in °C.
    pub temperature: Option<f64>,
    /// Wind direction, free text.
    pub wind_direction: String,
    /// Lure name.
    pub lure: String,
    /// Retrieve / action, free text.
    pub action: String,
    /// Fish size in cm; zero or absent means no catch.
    pub size: Option<f64>,
    /// Photo URLs.
    pub photos: [Option<String>; PHOTO_SLOTS],
}

impl TripLog {
    /// Whether a fish was landed.
    #[must_use]
    pub fn caught(&self) -> bool {
        self.size.unwrap_or(0.0) > 0.0
    }

    /// Whether any photo slot holds a URL.
    #[must_use]
    pub fn has_photos(&self) -> bool {
        self.photos
            .iter()
            .flatten()
            .any(|url| !url.trim().is_empty())
    }

    /// The time unless it is the blank `00:00` placeholder.
    #[must_use]
    pub fn meaningful_time(&self) -> Option<NaiveTime> {
        self.time.filter(|t| *t != blank_time())
    }
}

/// Payload for a new trip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewTrip {
    /// Trip date.
    pub date: NaiveDate,
    /// Time; stored as `00:00` when absent.
    pub time: Option<NaiveTime>,
    /// Area / spot name.
    pub area: String,
    /// Tide phase.
    pub tide_phase: TidePhase,
    /// Tide height in centimetres.
    pub tide_height: Option<f64>,
    /// Air temperature in °C.
    pub temperature: Option<f64>,
    /// Wind direction.
    pub wind_direction: String,
    /// Lure name.
    pub lure: String,
    /// Retrieve / action.
    pub action: String,
    /// Fish size in cm.
    pub size: Option<f64>,
    /// Photo URLs.
    pub photos: [Option<String>; PHOTO_SLOTS],
}

impl NewTrip {
    /// A trip on `date` with every other field empty.
    #[must_use]
    pub fn on(date: NaiveDate) -> Self {
        Self {
            date,
            time: None,
            area: String::new(),
            tide_phase: TidePhase::Unknown,
            tide_height: None,
            temperature: None,
            wind_direction: String::new(),
            lure: String::new(),
            action: String::new(),
            size: None,
            photos: Default::default(),
        }
    }

    /// Trim text fields, fill the blank time and reject negative sizes.
    ///
    /// # Errors
    ///
    /// Returns an error if a numeric field is out of range.
    pub fn normalized(mut self) -> Result<Self> {
        check_non_negative("size", self.size)?;
        self.time = Some(self.time.unwrap_or_else(blank_time));
        trim_in_place(&mut self.area);
        trim_in_place(&mut self.wind_direction);
        trim_in_place(&mut self.lure);
        trim_in_place(&mut self.action);
        self.photos = normalize_photos(self.photos);
        Ok(self)
    }
}

/// What to do with one photo slot on update.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PhotoChange {
    /// Leave the slot as it is.
    #[default]
    Keep,
    /// Empty the slot.
    Clear,
    /// Store a new URL.
    Set(String),
}

impl PhotoChange {
    /// Apply the change to the current slot value.
    #[must_use]
    pub fn apply(&self, current: Option<String>) -> Option<String> {
        match self {
            Self::Keep => current,
            Self::Clear => None,
            Self::Set(url) => Some(url.clone()),
        }
    }
}

/// New values for an existing trip. The date is never changed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TripUpdate {
    /// Time; stored as `00:00` when absent.
    pub time: Option<NaiveTime>,
    /// Area / spot name.
    pub area: String,
    /// Tide phase.
    pub tide_phase: TidePhase,
    /// Tide height in centimetres.
    pub tide_height: Option<f64>,
    /// Air temperature in °C.
    pub temperature: Option<f64>,
    /// Wind direction.
    pub wind_direction: String,
    /// Lure name.
    pub lure: String,
    /// Retrieve / action.
    pub action: String,
    /// Fish size in cm.
    pub size: Option<f64>,
    /// Per-slot photo changes.
    pub photos: [PhotoChange; PHOTO_SLOTS],
}

impl TripUpdate {
    /// An update that rewrites `trip` with its current values.
    #[must_use]
    pub fn from_existing(trip: &TripLog) -> Self {
        Self {
            time: trip.time,
            area: trip.area.clone(),
            tide_phase: trip.tide_phase,
            tide_height: trip.tide_height,
            temperature: trip.temperature,
            wind_direction: trip.wind_direction.clone(),
            lure: trip.lure.clone(),
            action: trip.action.clone(),
            size: trip.size,
            photos: Default::default(),
        }
    }

    /// Trim text fields, fill the blank time and reject negative sizes.
    ///
    /// # Errors
    ///
    /// Returns an error if a numeric field is out of range.
    pub fn normalized(mut self) -> Result<Self> {
        check_non_negative("size", self.size)?;
        self.time = Some(self.time.unwrap_or_else(blank_time));
        trim_in_place(&mut self.area);
        trim_in_place(&mut self.wind_direction);
        trim_in_place(&mut self.lure);
        trim_in_place(&mut self.action);
        Ok(self)
    }

    /// The photo slots after applying this update to `current`.
    #[must_use]
    pub fn apply_photos(&self, current: &[Option<String>; PHOTO_SLOTS]) -> [Option<String>; PHOTO_SLOTS] {
        let mut out: [Option<String>; PHOTO_SLOTS] = Default::default();
        for (i, slot) in out.iter_mut().enumerate() {
            *slot = self.photos[i].apply(current[i].clone());
        }
        normalize_photos(out)
    }
}

fn trim_in_place(text: &mut String) {
    let trimmed = text.trim();
    if trimmed.len() != text.len() {
        *text = trimmed.to_string();
    }
}

fn normalize_photos(photos: [Option<String>; PHOTO_SLOTS]) -> [Option<String>; PHOTO_SLOTS] {
    photos.map(|p| p.map(|u| u.trim().to_string()).filter(|u| !u.is_empty()))
}

fn check_non_negative(field: &'static str, value: Option<f64>) -> Result<()> {
    match value {
        Some(v) if v < 0.0 || !v.is_finite() => {
            Err(Error::invalid(field, format!("{v} must be zero or positive")))
        }
        _ => Ok(()),
    }
}

/// Parse `HH:MM`.
///
/// # Errors
///
/// Returns an error if the text is not a valid clock time.
pub fn parse_time(text: &str) -> Result<NaiveTime> {
    NaiveTime::parse_from_str(text.trim(), "%H:%M")
        .map_err(|_| Error::invalid("time", format!("'{text}' (expected HH:MM)")))
}

/// Parse `YYYY-MM-DD`.
///
/// # Errors
///
/// Returns an error if the text is not a valid date.
pub fn parse_date(text: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(text.trim(), "%Y-%m-%d")
        .map_err(|_| Error::invalid("date", format!("'{text}' (expected YYYY-MM-DD)")))
}
