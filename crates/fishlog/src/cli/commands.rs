//! CLI command definitions.
//!
//! This module defines the structure of all CLI subcommands and the
//! argument enums that map onto library types.

use std::path::PathBuf;

use chrono::{NaiveDate, NaiveTime};
use clap::{Args, Subcommand, ValueEnum};

use crate::analysis::{HeatmapMetric, Section};
use crate::listing::{SortKey, SortOrder, Then};
use crate::photos::{self, SlotPhoto};
use crate::render;
use crate::trip::{self, TidePhase};

fn parse_date_arg(s: &str) -> Result<NaiveDate, String> {
    trip::parse_date(s).map_err(|e| e.to_string())
}

fn parse_time_arg(s: &str) -> Result<NaiveTime, String> {
    trip::parse_time(s).map_err(|e| e.to_string())
}

fn parse_tide_arg(s: &str) -> Result<TidePhase, String> {
    s.parse::<TidePhase>().map_err(|e| e.to_string())
}

fn parse_slot_photo_arg(s: &str) -> Result<SlotPhoto, String> {
    s.parse::<SlotPhoto>().map_err(|e| e.to_string())
}

fn parse_slot_arg(s: &str) -> Result<usize, String> {
    photos::parse_slot(s).map_err(|e| e.to_string())
}

/// Add command arguments.
#[derive(Debug, Args)]
pub struct AddCommand {
    /// Trip date, YYYY-MM-DD (default: today)
    #[arg(short, long, value_parser = parse_date_arg)]
    pub date: Option<NaiveDate>,

    /// Time of the catch or session, HH:MM (default: 00:00)
    #[arg(short, long, value_parser = parse_time_arg)]
    pub time: Option<NaiveTime>,

    /// Area / spot name as you want it logged
    #[arg(short, long, default_value = "")]
    pub area: String,

    /// Tide phase: 大潮, 中潮, 小潮, 若潮, 長潮 or major, medium, minor, young, long
    #[arg(long, value_parser = parse_tide_arg)]
    pub tide: Option<TidePhase>,

    /// Tide height in cm
    #[arg(long)]
    pub tide_height: Option<f64>,

    /// Air temperature in °C
    #[arg(long)]
    pub temp: Option<f64>,

    /// Wind direction
    #[arg(long, default_value = "")]
    pub wind: String,

    /// Lure used
    #[arg(short, long, default_value = "")]
    pub lure: String,

    /// Retrieve / action
    #[arg(long, default_value = "")]
    pub action: String,

    /// Fish size in cm; leave out or use 0 for no catch
    #[arg(short, long)]
    pub size: Option<f64>,

    /// Photo to upload (up to 3, filling slots in order)
    #[arg(short, long, value_name = "PATH")]
    pub photo: Vec<PathBuf>,

    /// Fill missing tide phase, tide height and temperature from the services
    #[arg(long)]
    pub auto: bool,

    /// Configured spot to use for --auto (default: default_spot)
    #[arg(long)]
    pub spot: Option<String>,
}

/// Edit command arguments.
///
/// Fields that are not given keep their stored values.
#[derive(Debug, Args)]
pub struct EditCommand {
    /// Trip id
    pub id: i64,

    /// New time, HH:MM
    #[arg(short, long, value_parser = parse_time_arg)]
    pub time: Option<NaiveTime>,

    /// New area
    #[arg(short, long)]
    pub area: Option<String>,

    /// New tide phase
    #[arg(long, value_parser = parse_tide_arg)]
    pub tide: Option<TidePhase>,

    /// New tide height in cm
    #[arg(long)]
    pub tide_height: Option<f64>,

    /// New air temperature in °C
    #[arg(long)]
    pub temp: Option<f64>,

    /// New wind direction
    #[arg(long)]
    pub wind: Option<String>,

    /// New lure
    #[arg(short, long)]
    pub lure: Option<String>,

    /// New retrieve / action
    #[arg(long)]
    pub action: Option<String>,

    /// New fish size in cm
    #[arg(short, long)]
    pub size: Option<f64>,

    /// Replace photo slot N with a new upload
    #[arg(short, long, value_name = "N=PATH", value_parser = parse_slot_photo_arg)]
    pub photo: Vec<SlotPhoto>,

    /// Clear photo slot N
    #[arg(long, value_name = "N", value_parser = parse_slot_arg)]
    pub remove_photo: Vec<usize>,
}

impl EditCommand {
    /// Whether any field or photo change was given.
    #[must_use]
    pub fn has_changes(&self) -> bool {
        self.time.is_some()
            || self.area.is_some()
            || self.tide.is_some()
            || self.tide_height.is_some()
            || self.temp.is_some()
            || self.wind.is_some()
            || self.lure.is_some()
            || self.action.is_some()
            || self.size.is_some()
            || !self.photo.is_empty()
            || !self.remove_photo.is_empty()
    }
}

/// Delete command arguments.
#[derive(Debug, Args)]
pub struct DeleteCommand {
    /// Trip ids
    #[arg(required = true)]
    pub ids: Vec<i64>,

    /// Delete without asking; otherwise only show what would go
    #[arg(short, long)]
    pub yes: bool,
}

/// List command arguments.
#[derive(Debug, Args)]
pub struct ListCommand {
    /// Primary sort column
    #[arg(long, value_enum, default_value = "date")]
    pub sort: SortKeyArg,

    /// Primary sort direction
    #[arg(long, value_enum, default_value = "desc")]
    pub order: SortOrderArg,

    /// Tie-breaker, always ascending
    #[arg(long, value_enum, default_value = "time")]
    pub then: ThenArg,

    /// Only trips at this area
    #[arg(short, long)]
    pub area: Option<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub format: OutputFormat,
}

/// Show command arguments.
#[derive(Debug, Args)]
pub struct ShowCommand {
    /// Trip id
    pub id: i64,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub format: OutputFormat,
}

/// Analyze command arguments.
#[derive(Debug, Args)]
pub struct AnalyzeCommand {
    /// Area to analyse, or "all"
    #[arg(short, long)]
    pub area: Option<String>,

    /// Sections to show (repeatable; default: all)
    #[arg(short, long, value_enum)]
    pub section: Vec<SectionArg>,

    /// Hours per heatmap column (default from config)
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..=3))]
    pub hour_step: Option<u32>,

    /// Heatmap cell metric
    #[arg(long, value_enum, default_value = "count")]
    pub metric: MetricArg,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub format: OutputFormat,
}

impl AnalyzeCommand {
    /// Requested sections in report order, all of them when none were given.
    #[must_use]
    pub fn sections(&self) -> Vec<Section> {
        if self.section.is_empty() {
            return Section::ALL.to_vec();
        }
        let wanted: Vec<Section> = self.section.iter().map(|s| (*s).into()).collect();
        Section::ALL
            .into_iter()
            .filter(|s| wanted.contains(s))
            .collect()
    }
}

/// Check command arguments.
#[derive(Debug, Args)]
pub struct CheckCommand {
    /// Configured spot (default: default_spot)
    #[arg(long)]
    pub spot: Option<String>,

    /// Day to check, YYYY-MM-DD (default: today)
    #[arg(short, long, value_parser = parse_date_arg)]
    pub date: Option<NaiveDate>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub format: OutputFormat,
}

/// Tide command arguments.
#[derive(Debug, Args)]
pub struct TideCommand {
    /// Time of day, HH:MM
    #[arg(short, long, value_parser = parse_time_arg)]
    pub time: NaiveTime,

    /// Configured spot (default: default_spot)
    #[arg(long)]
    pub spot: Option<String>,

    /// Day, YYYY-MM-DD (default: today)
    #[arg(short, long, value_parser = parse_date_arg)]
    pub date: Option<NaiveDate>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub format: OutputFormat,
}

/// Spots command arguments.
#[derive(Debug, Args)]
pub struct SpotsCommand {
    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub format: OutputFormat,
}

/// Status command arguments.
#[derive(Debug, Args)]
pub struct StatusCommand {
    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Configuration commands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Show the configuration file path
    Path,

    /// Validate configuration
    Validate {
        /// Path to configuration file to validate
        #[arg(short, long)]
        file: Option<PathBuf>,
    },

    /// Write a starter configuration file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

/// Sort column argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SortKeyArg {
    /// Trip date
    Date,
    /// Fish size
    Size,
}

impl From<SortKeyArg> for SortKey {
    fn from(arg: SortKeyArg) -> Self {
        match arg {
            SortKeyArg::Date => Self::Date,
            SortKeyArg::Size => Self::Size,
        }
    }
}

/// Sort direction argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SortOrderArg {
    /// Newest or largest first
    Desc,
    /// Oldest or smallest first
    Asc,
}

impl From<SortOrderArg> for SortOrder {
    fn from(arg: SortOrderArg) -> Self {
        match arg {
            SortOrderArg::Desc => Self::Desc,
            SortOrderArg::Asc => Self::Asc,
        }
    }
}

/// Tie-breaker argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ThenArg {
    /// Time of day
    Time,
    /// Fish size
    Size,
    /// Trip date
    Date,
    /// No tie-breaker
    None,
}

impl ThenArg {
    /// The listing tie-breaker, if any.
    #[must_use]
    pub fn to_then(self) -> Option<Then> {
        match self {
            Self::Time => Some(Then::Time),
            Self::Size => Some(Then::Size),
            Self::Date => Some(Then::Date),
            Self::None => None,
        }
    }
}

/// Report section argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SectionArg {
    /// Trips, catches, catch rate
    Summary,
    /// Catch rate per tide phase
    Tide,
    /// Trips per month
    Month,
    /// Catches per lure
    Lure,
    /// Tide height spread per area
    Area,
    /// Tide height by hour
    Heatmap,
}

impl From<SectionArg> for Section {
    fn from(arg: SectionArg) -> Self {
        match arg {
            SectionArg::Summary => Self::Summary,
            SectionArg::Tide => Self::Tide,
            SectionArg::Month => Self::Month,
            SectionArg::Lure => Self::Lure,
            SectionArg::Area => Self::Area,
            SectionArg::Heatmap => Self::Heatmap,
        }
    }
}

/// Heatmap metric argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum MetricArg {
    /// Number of fish
    Count,
    /// Mean fish size
    MeanSize,
}

impl From<MetricArg> for HeatmapMetric {
    fn from(arg: MetricArg) -> Self {
        match arg {
            MetricArg::Count => Self::Count,
            MetricArg::MeanSize => Self::MeanSize,
        }
    }
}

/// Output format for commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Plain text output
    Plain,
    /// Formatted table
    #[default]
    Table,
    /// JSON output
    Json,
}

impl From<OutputFormat> for render::OutputFormat {
    fn from(arg: OutputFormat) -> Self {
        match arg {
            OutputFormat::Plain => Self::Plain,
            OutputFormat::Table => Self::Table,
            OutputFormat::Json => Self::Json,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn analyze(sections: Vec<SectionArg>) -> AnalyzeCommand {
        AnalyzeCommand {
            area: None,
            section: sections,
            hour_step: None,
            metric: MetricArg::Count,
            format: OutputFormat::Table,
        }
    }

    #[test]
    fn test_sort_arg_conversion() {
        assert_eq!(SortKey::from(SortKeyArg::Size), SortKey::Size);
        assert_eq!(SortOrder::from(SortOrderArg::Asc), SortOrder::Asc);
        assert_eq!(ThenArg::Time.to_then(), Some(Then::Time));
        assert_eq!(ThenArg::None.to_then(), None);
    }

    #[test]
    fn test_metric_and_format_conversion() {
        assert_eq!(HeatmapMetric::from(MetricArg::MeanSize), HeatmapMetric::MeanSize);
        assert_eq!(
            render::OutputFormat::from(OutputFormat::Json),
            render::OutputFormat::Json
        );
    }

    #[test]
    fn test_output_format_default() {
        assert_eq!(OutputFormat::default(), OutputFormat::Table);
    }

    #[test]
    fn test_sections_default_to_all() {
        assert_eq!(analyze(Vec::new()).sections(), Section::ALL.to_vec());
    }

    #[test]
    fn test_sections_keep_report_order() {
        let cmd = analyze(vec![SectionArg::Heatmap, SectionArg::Summary, SectionArg::Heatmap]);
        assert_eq!(cmd.sections(), vec![Section::Summary, Section::Heatmap]);
    }

    #[test]
    fn test_value_parsers() {
        assert!(parse_date_arg("2024-05-01").is_ok());
        assert!(parse_date_arg("05/01/2024").is_err());
        assert!(parse_time_arg("18:30").is_ok());
        assert!(parse_time_arg("25:00").is_err());
        assert_eq!(parse_tide_arg("大潮"), Ok(TidePhase::Major));
        assert_eq!(parse_tide_arg("young"), Ok(TidePhase::Young));
        assert!(parse_tide_arg("spring").is_err());
        assert_eq!(parse_slot_arg("3"), Ok(3));
        assert!(parse_slot_arg("4").is_err());
        assert_eq!(parse_slot_photo_arg("1=a.jpg").unwrap().slot, 1);
    }

    #[test]
    fn test_edit_has_changes() {
        let mut cmd = EditCommand {
            id: 1,
            time: None,
            area: None,
            tide: None,
            tide_height: None,
            temp: None,
            wind: None,
            lure: None,
            action: None,
            size: None,
            photo: Vec::new(),
            remove_photo: Vec::new(),
        };
        assert!(!cmd.has_changes());
        cmd.remove_photo.push(2);
        assert!(cmd.has_changes());
    }

    #[test]
    fn test_status_command_debug() {
        let cmd = StatusCommand { json: true };
        let debug_str = format!("{cmd:?}");
        assert!(debug_str.contains("json"));
    }

    #[test]
    fn test_config_command_debug() {
        let cmd = ConfigCommand::Init { force: false };
        let debug_str = format!("{cmd:?}");
        assert!(debug_str.contains("Init"));
    }
}
