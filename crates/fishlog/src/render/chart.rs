//! Text charts: horizontal bars and a shaded grid.

use crate::analysis::Heatmap;

use super::table::{display_width, pad, Align};

/// Bar length at the top of the axis.
pub const BAR_WIDTH: usize = 30;

const FULL: char = '█';
const SHADES: [char; 5] = [' ', '░', '▒', '▓', '█'];

/// Number of cells a bar of `value` fills on an axis ending at `max`.
#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
#[must_use]
pub fn bar_len(value: f64, max: f64, width: usize) -> usize {
    if max <= 0.0 || value <= 0.0 {
        return 0;
    }
    let cells = (value / max * width as f64).round() as usize;
    cells.clamp(1, width)
}

/// One labelled bar per row, each followed by its formatted value.
#[must_use]
pub fn bar_chart(rows: &[(String, f64, String)], max: f64) -> String {
    let label_width = rows
        .iter()
        .map(|(l, _, _)| display_width(l))
        .max()
        .unwrap_or_default();
    rows.iter()
        .map(|(label, value, shown)| {
            let bar: String = std::iter::repeat(FULL)
                .take(bar_len(*value, max, BAR_WIDTH))
                .collect();
            format!(
                "{} │{} {shown}\n",
                pad(label, label_width, Align::Left),
                pad(&bar, BAR_WIDTH, Align::Left)
            )
        })
        .collect()
}

/// Shade for `value` on a scale ending at `max`.
#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
fn shade(value: Option<f64>, max: f64) -> char {
    match value {
        Some(v) if v > 0.0 && max > 0.0 => {
            let steps = SHADES.len() - 1;
            let level = (v / max * steps as f64).ceil() as usize;
            SHADES[level.clamp(1, steps)]
        }
        _ => SHADES[0],
    }
}

/// The heatmap as a shaded grid, highest tide bin on top.
#[must_use]
pub fn heat_grid(map: &Heatmap) -> String {
    if map.is_empty() {
        return String::new();
    }
    let max = map.max_value().unwrap_or_default();
    let label_width = map
        .tide_labels
        .iter()
        .map(|l| display_width(l))
        .max()
        .unwrap_or_default();
    let col_width = map
        .hour_labels
        .iter()
        .map(|l| display_width(l))
        .max()
        .unwrap_or_default();

    let mut out = String::new();
    for (label, row) in map.tide_labels.iter().zip(&map.cells).rev() {
        out.push_str(&pad(label, label_width, Align::Right));
        out.push_str(" │");
        for cell in row {
            let c = shade(*cell, max);
            out.push(' ');
            out.push_str(&std::iter::repeat(c).take(col_width).collect::<String>());
        }
        out.push('\n');
    }
    out.push_str(&" ".repeat(label_width + 1));
    out.push('└');
    for _ in &map.hour_labels {
        out.push_str(&"─".repeat(col_width + 1));
    }
    out.push('\n');
    out.push_str(&" ".repeat(label_width + 2));
    for label in &map.hour_labels {
        out.push(' ');
        out.push_str(&pad(label, col_width, Align::Left));
    }
    out.push('\n');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::HeatmapMetric;

    #[test]
    fn test_bar_len() {
        assert_eq!(bar_len(50.0, 100.0, 30), 15);
        assert_eq!(bar_len(100.0, 100.0, 30), 30);
        assert_eq!(bar_len(0.0, 100.0, 30), 0);
        assert_eq!(bar_len(0.1, 100.0, 30), 1);
        assert_eq!(bar_len(5.0, 0.0, 30), 0);
        assert_eq!(bar_len(200.0, 100.0, 30), 30);
    }

    #[test]
    fn test_bar_chart_aligns_labels() {
        let rows = vec![
            ("大潮".to_string(), 50.0, "50.0%".to_string()),
            ("x".to_string(), 0.0, "0.0%".to_string()),
        ];
        let out = bar_chart(&rows, 100.0);
        let lines: Vec<&str> = out.lines().collect();

        assert!(lines[0].starts_with("大潮 │███████████████ "));
        assert!(lines[0].ends_with(" 50.0%"));
        assert!(lines[1].starts_with("x    │ "));
        assert_eq!(display_width(lines[0]), display_width(lines[1]) + 1);
    }

    #[test]
    fn test_shade_levels() {
        assert_eq!(shade(None, 4.0), ' ');
        assert_eq!(shade(Some(0.0), 4.0), ' ');
        assert_eq!(shade(Some(1.0), 4.0), '░');
        assert_eq!(shade(Some(4.0), 4.0), '█');
    }

    #[test]
    fn test_heat_grid_layout() {
        let map = Heatmap {
            metric: HeatmapMetric::Count,
            hour_labels: vec!["4–6".to_string(), "20–22".to_string()],
            tide_labels: vec!["0–20cm".to_string(), "20–40cm".to_string()],
            cells: vec![vec![Some(0.0), Some(2.0)], vec![Some(1.0), Some(0.0)]],
            samples: 3,
        };
        let out = heat_grid(&map);
        let lines: Vec<&str> = out.lines().collect();

        assert_eq!(lines.len(), 4);
        assert!(lines[0].starts_with("20–40cm │"));
        assert!(lines[1].starts_with(" 0–20cm │"));
        assert!(lines[1].ends_with("█████"));
        assert!(lines[3].contains("20–22"));
        assert!(heat_grid(&Heatmap {
            samples: 0,
            cells: Vec::new(),
            ..map
        })
        .is_empty());
    }
}
