//! Text and JSON output for the CLI.
//!
//! Every view returns a `String`; the binary decides where it goes.

pub mod chart;
pub mod table;
pub mod views;

use serde::Serialize;

use crate::error::Result;

pub use table::{display_width, pad, Align, Table};

/// How command output is laid out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Tab-separated rows, no headers or charts.
    Plain,
    /// Aligned tables and bar charts.
    #[default]
    Table,
    /// Pretty-printed JSON.
    Json,
}

/// Pretty JSON with a trailing newline.
///
/// # Errors
///
/// Returns an error if `value` cannot be serialized.
pub fn json<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    Ok(serde_json::to_string_pretty(value)? + "\n")
}

/// Label/value lines with the labels padded to a common width.
#[must_use]
pub fn fields(pairs: &[(&str, String)]) -> String {
    let width = pairs
        .iter()
        .map(|(label, _)| display_width(label))
        .max()
        .unwrap_or_default();
    pairs
        .iter()
        .map(|(label, value)| {
            format!("{}  {value}", pad(&format!("{label}:"), width + 1, Align::Left))
                .trim_end()
                .to_string()
                + "\n"
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fields_aligns_labels() {
        let out = fields(&[("ID", "7".to_string()), ("Area", "若洲".to_string())]);
        assert_eq!(out, "ID:    7\nArea:  若洲\n");
    }

    #[test]
    fn test_json_trailing_newline() {
        let out = json(&serde_json::json!({"a": 1})).unwrap();
        assert!(out.ends_with("}\n"));
    }
}
