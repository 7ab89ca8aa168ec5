//! Command-line interface for fishlog.
//!
//! This module provides the CLI structure for the `fishlog` binary; the
//! handlers live in `main.rs`.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub use commands::{
    AddCommand, AnalyzeCommand, CheckCommand, ConfigCommand, DeleteCommand, EditCommand,
    ListCommand, MetricArg, OutputFormat, SectionArg, ShowCommand, SortKeyArg, SortOrderArg,
    SpotsCommand, StatusCommand, ThenArg, TideCommand,
};

/// fishlog - Log fishing trips and learn when the fish bite
///
/// Records each trip with its tide, weather and catch, looks up tide and
/// weather for an upcoming trip, and analyses catch rates by tide phase,
/// month, lure and tide height.
#[derive(Debug, Parser)]
#[command(name = "fishlog")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to custom configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Increase verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// The command to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Log a trip
    Add(AddCommand),

    /// List logged trips
    List(ListCommand),

    /// Show one trip in full
    Show(ShowCommand),

    /// Change fields or photos of a trip
    Edit(EditCommand),

    /// Delete trips
    Delete(DeleteCommand),

    /// Analyse catches
    Analyze(AnalyzeCommand),

    /// Tide, weather and sea temperature for a trip
    Check(CheckCommand),

    /// Tide height at a given time
    Tide(TideCommand),

    /// List configured spots
    Spots(SpotsCommand),

    /// Show store status
    Status(StatusCommand),

    /// View or modify configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

impl Cli {
    /// Get the verbosity level based on flags.
    #[must_use]
    pub fn verbosity(&self) -> crate::logging::Verbosity {
        if self.quiet {
            crate::logging::Verbosity::Quiet
        } else {
            match self.verbose {
                0 => crate::logging::Verbosity::Normal,
                1 => crate::logging::Verbosity::Verbose,
                2 => crate::logging::Verbosity::Debug,
                _ => crate::logging::Verbosity::Trace,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::Verbosity;
    use clap::CommandFactory;

    fn status_cli(verbose: u8, quiet: bool) -> Cli {
        Cli {
            config: None,
            verbose,
            quiet,
            command: Command::Status(StatusCommand { json: false }),
        }
    }

    #[test]
    fn test_cli_name() {
        let cli = Cli::command();
        assert_eq!(cli.get_name(), "fishlog");
    }

    #[test]
    fn test_verbosity_levels() {
        assert_eq!(status_cli(0, true).verbosity(), Verbosity::Quiet);
        assert_eq!(status_cli(3, true).verbosity(), Verbosity::Quiet);
        assert_eq!(status_cli(0, false).verbosity(), Verbosity::Normal);
        assert_eq!(status_cli(1, false).verbosity(), Verbosity::Verbose);
        assert_eq!(status_cli(2, false).verbosity(), Verbosity::Debug);
        assert_eq!(status_cli(5, false).verbosity(), Verbosity::Trace);
    }

    #[test]
    fn test_cli_verify() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_add() {
        let args = [
            "fishlog", "add", "--date", "2024-05-01", "--time", "18:30", "--area", "若洲",
            "--tide", "大潮", "--size", "62", "--photo", "a.jpg", "--photo", "b.jpg",
        ];
        let cli = Cli::try_parse_from(args).unwrap();
        let Command::Add(add) = cli.command else {
            panic!("expected add");
        };
        assert_eq!(add.area, "若洲");
        assert_eq!(add.size, Some(62.0));
        assert_eq!(add.photo.len(), 2);
        assert!(!add.auto);
    }

    #[test]
    fn test_parse_add_rejects_bad_time() {
        assert!(Cli::try_parse_from(["fishlog", "add", "--time", "7pm"]).is_err());
    }

    #[test]
    fn test_parse_list_defaults() {
        let cli = Cli::try_parse_from(["fishlog", "list"]).unwrap();
        let Command::List(list) = cli.command else {
            panic!("expected list");
        };
        assert_eq!(list.sort, SortKeyArg::Date);
        assert_eq!(list.order, SortOrderArg::Desc);
        assert_eq!(list.then, ThenArg::Time);
        assert_eq!(list.format, OutputFormat::Table);
    }

    #[test]
    fn test_parse_edit_photos() {
        let args = [
            "fishlog", "edit", "7", "--photo", "2=new.jpg", "--remove-photo", "3", "--lure", "ミノー",
        ];
        let cli = Cli::try_parse_from(args).unwrap();
        let Command::Edit(edit) = cli.command else {
            panic!("expected edit");
        };
        assert_eq!(edit.id, 7);
        assert_eq!(edit.photo[0].slot, 2);
        assert_eq!(edit.remove_photo, vec![3]);
        assert_eq!(edit.lure.as_deref(), Some("ミノー"));
    }

    #[test]
    fn test_parse_edit_rejects_slot_out_of_range() {
        assert!(Cli::try_parse_from(["fishlog", "edit", "7", "--remove-photo", "4"]).is_err());
    }

    #[test]
    fn test_parse_delete_requires_ids() {
        assert!(Cli::try_parse_from(["fishlog", "delete"]).is_err());
        let cli = Cli::try_parse_from(["fishlog", "delete", "3", "4", "--yes"]).unwrap();
        let Command::Delete(delete) = cli.command else {
            panic!("expected delete");
        };
        assert_eq!(delete.ids, vec![3, 4]);
        assert!(delete.yes);
    }

    #[test]
    fn test_parse_analyze() {
        let args = [
            "fishlog", "analyze", "--area", "若洲", "--section", "tide", "--section", "heatmap",
            "--hour-step", "3", "--metric", "mean-size", "--format", "json",
        ];
        let cli = Cli::try_parse_from(args).unwrap();
        let Command::Analyze(analyze) = cli.command else {
            panic!("expected analyze");
        };
        assert_eq!(analyze.hour_step, Some(3));
        assert_eq!(analyze.metric, MetricArg::MeanSize);
        assert_eq!(analyze.section, vec![SectionArg::Tide, SectionArg::Heatmap]);
    }

    #[test]
    fn test_parse_analyze_rejects_hour_step() {
        assert!(Cli::try_parse_from(["fishlog", "analyze", "--hour-step", "4"]).is_err());
    }

    #[test]
    fn test_parse_tide_requires_time() {
        assert!(Cli::try_parse_from(["fishlog", "tide"]).is_err());
        assert!(Cli::try_parse_from(["fishlog", "tide", "--time", "06:00", "--spot", "横浜"]).is_ok());
    }

    #[test]
    fn test_parse_config_init() {
        let cli = Cli::try_parse_from(["fishlog", "config", "init", "--force"]).unwrap();
        assert!(matches!(
            cli.command,
            Command::Config(ConfigCommand::Init { force: true })
        ));
    }

    #[test]
    fn test_parse_with_config() {
        let args = vec!["fishlog", "-c", "/custom/config.toml", "status"];
        let cli = Cli::try_parse_from(args).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("/custom/config.toml")));
    }

    #[test]
    fn test_parse_with_verbose() {
        let cli = Cli::try_parse_from(["fishlog", "-vv", "status"]).unwrap();
        assert_eq!(cli.verbose, 2);
    }

    #[test]
    fn test_parse_with_quiet() {
        let cli = Cli::try_parse_from(["fishlog", "-q", "spots"]).unwrap();
        assert!(cli.quiet);
    }
}
