//! Views for each command's output.

use std::fmt::Write as _;
use std::path::Path;

use chrono::NaiveTime;
use fishlog_forecast::tide::TideEventKind;
use fishlog_forecast::{weather_code_label, wind_dir_arrow, TideDay, TideSample, WeatherHour, WindLevel};
use serde_json::{json as json_value, Map, Value};

use super::chart::{bar_chart, heat_grid};
use super::{fields, json, OutputFormat, Table};
use crate::analysis::{AnalysisReport, HeatmapMetric, Section};
use crate::check::{CheckReport, Lookup};
use crate::config::{Backend, Spot};
use crate::error::Result;
use crate::listing::ListRow;
use crate::storage::{format_time, StorageStats};
use crate::trip::TripLog;

const NO_DATA: &str = "(no data)\n";

fn opt(value: Option<f64>, unit: &str) -> String {
    value.map_or_else(|| "-".to_string(), |v| format!("{v}{unit}"))
}

fn opt1(value: Option<f64>, unit: &str) -> String {
    value.map_or_else(|| "-".to_string(), |v| format!("{v:.1}{unit}"))
}

/// The trip list.
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub fn trip_list(trips: &[TripLog], format: OutputFormat) -> Result<String> {
    let rows: Vec<ListRow> = trips.iter().map(ListRow::from).collect();
    if format == OutputFormat::Json {
        return json(&rows);
    }

    let mut table = Table::new(["ID", "Date", "Time", "Area", "Size", "Photo"]).right(&[0, 4]);
    for row in &rows {
        table.push([
            row.id.to_string(),
            row.date.clone(),
            row.time.clone(),
            row.area.clone(),
            row.size.clone(),
            if row.photo { "yes" } else { "-" }.to_string(),
        ]);
    }
    Ok(match format {
        OutputFormat::Plain => table.render_plain(),
        _ if table.is_empty() => "No trips logged.\n".to_string(),
        _ => table.render(),
    })
}

/// One trip in full, photo URLs included.
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub fn trip_detail(trip: &TripLog, format: OutputFormat) -> Result<String> {
    if format == OutputFormat::Json {
        return json(trip);
    }
    let mut pairs = vec![
        ("ID", trip.id.to_string()),
        (
            "Date",
            trip.date
                .map_or_else(|| "?".to_string(), |d| d.format("%Y-%m-%d").to_string()),
        ),
        ("Time", trip.time.map(format_time).unwrap_or_default()),
        ("Area", trip.area.clone()),
        (
            "Tide phase",
            format!("{} ({})", trip.tide_phase.label(), trip.tide_phase.english()),
        ),
        ("Tide height", opt(trip.tide_height, "cm")),
        ("Temperature", opt(trip.temperature, "°C")),
        ("Wind", trip.wind_direction.clone()),
        ("Lure", trip.lure.clone()),
        ("Action", trip.action.clone()),
        ("Size", opt(trip.size.filter(|s| *s > 0.0), "cm")),
    ];
    for (slot, url) in trip.photos.iter().enumerate() {
        if let Some(url) = url {
            pairs.push((["Photo 1", "Photo 2", "Photo 3"][slot.min(2)], url.clone()));
        }
    }
    if format == OutputFormat::Plain {
        return Ok(pairs
            .iter()
            .map(|(k, v)| format!("{k}\t{v}\n"))
            .collect());
    }
    Ok(fields(&pairs))
}

fn section_key(section: Section) -> &'static str {
    match section {
        Section::Summary => "summary",
        Section::Tide => "by_tide_phase",
        Section::Month => "by_month",
        Section::Lure => "by_lure",
        Section::Area => "area_distribution",
        Section::Heatmap => "heatmap",
    }
}

fn section_title(section: Section, report: &AnalysisReport) -> String {
    match section {
        Section::Summary => "Summary".to_string(),
        Section::Tide => "Catch rate by tide phase".to_string(),
        Section::Month => "Trips by month".to_string(),
        Section::Lure => "Catches by lure".to_string(),
        Section::Area => "Tide height at catch, by area".to_string(),
        Section::Heatmap => match report.heatmap.metric {
            HeatmapMetric::Count => "Catches by tide height and hour".to_string(),
            HeatmapMetric::MeanSize => "Mean size by tide height and hour".to_string(),
        },
    }
}

/// The analysis report, limited to `sections`.
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub fn report(report: &AnalysisReport, sections: &[Section], format: OutputFormat) -> Result<String> {
    if format == OutputFormat::Json {
        let full = serde_json::to_value(report)?;
        let mut out = Map::new();
        out.insert("area".to_string(), json_value!(report.area));
        out.insert("areas".to_string(), json_value!(report.areas));
        for section in sections {
            let key = section_key(*section);
            out.insert(key.to_string(), full.get(key).cloned().unwrap_or(Value::Null));
        }
        return json(&Value::Object(out));
    }

    let mut out = String::new();
    if format == OutputFormat::Table {
        let area = report.area.as_deref().unwrap_or("all areas");
        let _ = writeln!(out, "Area: {area}");
    }
    for section in sections {
        let tables = section_tables(*section, report);
        if format == OutputFormat::Plain {
            let _ = writeln!(out, "# {}", section_key(*section));
            for t in &tables {
                out.push_str(&t.render_plain());
            }
            continue;
        }

        let _ = writeln!(out, "\n== {} ==", section_title(*section, report));
        out.push_str(&section_chart(*section, report, &tables));
    }
    Ok(out)
}

fn section_tables(section: Section, report: &AnalysisReport) -> Vec<Table> {
    match section {
        Section::Summary => {
            let s = &report.summary;
            let mut t = Table::new(["Trips", "Catches", "Catch rate"]).right(&[0, 1, 2]);
            t.push([s.trips.to_string(), s.catches.to_string(), format!("{:.1}%", s.catch_rate)]);
            vec![t]
        }
        Section::Tide => {
            let mut t = Table::new(["Phase", "Trips", "Catches", "Rate"]).right(&[1, 2, 3]);
            for r in &report.by_tide_phase.rows {
                t.push([
                    r.phase.clone(),
                    r.trips.to_string(),
                    r.catches.to_string(),
                    format!("{:.1}%", r.catch_rate),
                ]);
            }
            vec![t]
        }
        Section::Month => {
            let mut t =
                Table::new(["Month", "Trips", "Catches", "Rate", "Avg size"]).right(&[1, 2, 3, 4]);
            for m in &report.by_month {
                t.push([
                    m.month.clone(),
                    m.trips.to_string(),
                    m.catches.to_string(),
                    format!("{:.1}%", m.catch_rate),
                    opt1(m.avg_size, "cm"),
                ]);
            }
            vec![t]
        }
        Section::Lure => {
            let mut t = Table::new(["Lure", "Catches", "Avg size"]).right(&[1, 2]);
            for l in &report.by_lure {
                t.push([l.lure.clone(), l.catches.to_string(), format!("{:.1}cm", l.avg_size)]);
            }
            vec![t]
        }
        Section::Area => {
            let mut t = Table::new(["Area", "n", "Min", "Q1", "Median", "Q3", "Max"])
                .right(&[1, 2, 3, 4, 5, 6]);
            for d in &report.area_distribution {
                t.push([
                    d.area.clone(),
                    d.count.to_string(),
                    format!("{:.0}", d.min),
                    format!("{:.1}", d.q1),
                    format!("{:.1}", d.median),
                    format!("{:.1}", d.q3),
                    format!("{:.0}", d.max),
                ]);
            }
            vec![t]
        }
        Section::Heatmap => {
            let map = &report.heatmap;
            let mut headers = vec!["Tide".to_string()];
            headers.extend(map.hour_labels.iter().cloned());
            let right: Vec<usize> = (1..headers.len()).collect();
            let mut t = Table::new(headers).right(&right);
            for (label, row) in map.tide_labels.iter().zip(&map.cells).rev() {
                let mut cells = vec![label.clone()];
                cells.extend(row.iter().map(|c| opt(*c, "")));
                t.push(cells);
            }
            vec![t]
        }
    }
}

fn section_chart(section: Section, report: &AnalysisReport, tables: &[Table]) -> String {
    let empty = match section {
        Section::Summary => false,
        Section::Tide => report.by_tide_phase.rows.is_empty(),
        Section::Month => report.by_month.is_empty(),
        Section::Lure => report.by_lure.is_empty(),
        Section::Area => report.area_distribution.is_empty(),
        Section::Heatmap => report.heatmap.is_empty(),
    };
    if empty {
        return NO_DATA.to_string();
    }

    match section {
        Section::Tide => {
            let rows: Vec<(String, f64, String)> = report
                .by_tide_phase
                .rows
                .iter()
                .map(|r| {
                    (
                        r.phase.clone(),
                        r.catch_rate,
                        format!("{:.1}% ({}/{})", r.catch_rate, r.catches, r.trips),
                    )
                })
                .collect();
            bar_chart(&rows, report.by_tide_phase.y_max)
        }
        Section::Lure => {
            #[allow(clippy::cast_precision_loss)]
            let rows: Vec<(String, f64, String)> = report
                .by_lure
                .iter()
                .map(|l| {
                    (
                        l.lure.clone(),
                        l.catches as f64,
                        format!("{} (avg {:.1}cm)", l.catches, l.avg_size),
                    )
                })
                .collect();
            let max = rows.iter().map(|r| r.1).fold(0.0, f64::max);
            bar_chart(&rows, max)
        }
        Section::Heatmap => {
            let legend = format!(
                "darkest = {} over {} catches\n",
                opt1(report.heatmap.max_value(), ""),
                report.heatmap.samples
            );
            heat_grid(&report.heatmap) + &legend + "\n" + &tables[0].render()
        }
        _ => tables.iter().map(Table::render).collect(),
    }
}

fn tide_summary(day: &TideDay) -> Vec<(&'static str, String)> {
    let mut pairs = vec![(
        "Tide",
        format!(
            "{}  moon age {}",
            day.phase_title.as_deref().unwrap_or("?"),
            opt1(day.moon_age, "")
        ),
    )];
    let events: Vec<String> = day
        .events
        .iter()
        .map(|e| {
            let kind = match e.kind {
                TideEventKind::High => "high",
                TideEventKind::Low => "low",
            };
            format!("{kind} {} {:.0}cm", format_time(e.time), e.cm)
        })
        .collect();
    if !events.is_empty() {
        pairs.push(("High/low", events.join(", ")));
    }
    if let (Some(min), Some(max)) = (day.min_cm(), day.max_cm()) {
        pairs.push(("Range", format!("{min:.0}–{max:.0}cm")));
    }
    pairs
}

fn weather_table(hours: &[WeatherHour]) -> Table {
    let mut t = Table::new(["Time", "Weather", "Temp", "Rain", "Wind"]).right(&[2, 3]);
    for h in hours {
        let wind = match (h.wind_speed, h.wind_dir) {
            (Some(speed), Some(dir)) => format!(
                "{speed:.1}m/s{} {}",
                WindLevel::from_speed(speed).marker(),
                wind_dir_arrow(dir)
            ),
            (Some(speed), None) => format!("{speed:.1}m/s"),
            _ => "-".to_string(),
        };
        t.push([
            h.time.format("%H:%M").to_string(),
            h.weather_code.map_or("-", weather_code_label).to_string(),
            opt1(h.temp, "°C"),
            opt1(h.rain, "mm"),
            wind,
        ]);
    }
    t
}

fn lookup_note<T>(lookup: &Lookup<T>) -> Option<String> {
    match lookup {
        Lookup::Ok(_) => None,
        Lookup::Skipped(why) => Some(format!("skipped: {why}")),
        Lookup::Failed(e) => Some(format!("unavailable: {e}")),
    }
}

/// The pre-trip check.
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub fn check(report: &CheckReport, format: OutputFormat) -> Result<String> {
    if format == OutputFormat::Json {
        return json(report);
    }

    let mut pairs = vec![
        ("Spot", report.spot.clone()),
        ("Date", report.date.format("%Y-%m-%d").to_string()),
        ("Tide chart", report.chart_url.clone()),
    ];
    match &report.tide {
        Lookup::Ok(day) => pairs.extend(tide_summary(day)),
        other => pairs.push(("Tide", lookup_note(other).unwrap_or_default())),
    }
    let (lat, lon) = report.sea_point;
    let sea = match &report.sea_temp {
        Lookup::Ok(Some(t)) => format!("{t:.1}°C at ({lat}, {lon})"),
        Lookup::Ok(None) => format!("no reading at ({lat}, {lon})"),
        other => lookup_note(other).unwrap_or_default(),
    };
    pairs.push(("Sea temp", sea));

    let mut out: String = if format == OutputFormat::Plain {
        pairs.iter().map(|(k, v)| format!("{k}\t{v}\n")).collect()
    } else {
        fields(&pairs)
    };

    match &report.weather {
        Lookup::Ok(hours) => {
            let table = weather_table(hours);
            if format == OutputFormat::Plain {
                out.push_str(&table.render_plain());
            } else {
                out.push_str("\nWeather (3-hourly)\n");
                out.push_str(&table.render());
            }
        }
        other => {
            let _ = writeln!(out, "Weather\t{}", lookup_note(other).unwrap_or_default());
        }
    }
    Ok(out)
}

/// Tide height near a given time.
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub fn tide(
    spot: &Spot,
    day: &TideDay,
    time: NaiveTime,
    sample: Option<TideSample>,
    format: OutputFormat,
) -> Result<String> {
    if format == OutputFormat::Json {
        return json(&json_value!({
            "spot": spot.name,
            "date": day.date,
            "time": format_time(time),
            "nearest": sample,
            "tide": day,
        }));
    }
    let height = sample.map_or_else(
        || "no tide data".to_string(),
        |s| format!("{:.0}cm (sample at {})", s.cm, format_time(s.time)),
    );
    if format == OutputFormat::Plain {
        return Ok(format!(
            "{}\t{}\t{}\t{}\n",
            spot.name,
            day.date.format("%Y-%m-%d"),
            format_time(time),
            sample.map(|s| s.cm.to_string()).unwrap_or_default()
        ));
    }
    let mut pairs = vec![
        ("Spot", spot.name.clone()),
        ("Date", day.date.format("%Y-%m-%d").to_string()),
        ("Time", format_time(time)),
        ("Height", height),
    ];
    pairs.extend(tide_summary(day));
    Ok(fields(&pairs))
}

/// Configured spots.
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub fn spots(spots: &[Spot], default: Option<&str>, format: OutputFormat) -> Result<String> {
    if format == OutputFormat::Json {
        return json(spots);
    }
    let mut table = Table::new(["Name", "Port", "Lat", "Lon", "Default"]);
    for s in spots {
        table.push([
            s.name.clone(),
            format!("{}/{}", s.pc, s.hc),
            s.lat.map(|v| v.to_string()).unwrap_or_default(),
            s.lon.map(|v| v.to_string()).unwrap_or_default(),
            if default == Some(s.name.as_str()) { "*" } else { "" }.to_string(),
        ]);
    }
    Ok(match format {
        OutputFormat::Plain => table.render_plain(),
        _ => table.render(),
    })
}

/// Store status.
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub fn status(backend: Backend, path: &Path, stats: &StorageStats, format: OutputFormat) -> Result<String> {
    if format == OutputFormat::Json {
        return json(&json_value!({
            "backend": backend.to_string(),
            "path": path,
            "stats": stats,
        }));
    }
    let range = match (stats.first_date, stats.last_date) {
        (Some(first), Some(last)) => format!("{first} to {last}"),
        _ => "-".to_string(),
    };
    let pairs = [
        ("Backend", backend.to_string()),
        ("Path", path.display().to_string()),
        ("Trips", stats.total_trips.to_string()),
        ("Catches", stats.catches.to_string()),
        ("Dates", range),
        ("Size", format!("{} bytes", stats.size_bytes)),
    ];
    if format == OutputFormat::Plain {
        return Ok(pairs.iter().map(|(k, v)| format!("{k}\t{v}\n")).collect());
    }
    Ok(fields(&pairs))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::test_support::trip;
    use crate::analysis::{build_report, AnalysisOptions};
    use crate::check::fakes::{tide_day, weather_hours};
    use crate::config::AnalysisConfig;
    use crate::trip::TidePhase;
    use chrono::NaiveDate;

    fn sample_trips() -> Vec<TripLog> {
        let mut a = trip(1, "2024-05-01", "若洲", TidePhase::Major, Some(62.0));
        a.time = NaiveTime::from_hms_opt(18, 30, 0);
        a.tide_height = Some(120.0);
        a.lure = "バイブ".to_string();
        a.photos[1] = Some("https://img.test/a.jpg".to_string());
        let b = trip(2, "2024-05-03", "豊洲", TidePhase::Minor, None);
        vec![a, b]
    }

    fn spot() -> Spot {
        Spot {
            name: "東京".to_string(),
            pc: 13,
            hc: "0001".to_string(),
            lat: Some(35.65),
            lon: Some(139.77),
        }
    }

    #[test]
    fn test_trip_list_table_and_json() {
        let trips = sample_trips();

        let table = trip_list(&trips, OutputFormat::Table).unwrap();
        assert!(table.starts_with("ID"));
        assert!(table.contains("62cm"));
        assert!(table.contains("yes"));

        let plain = trip_list(&trips, OutputFormat::Plain).unwrap();
        assert_eq!(plain.lines().count(), 2);
        assert!(plain.starts_with("1\t2024-05-01\t18:30\t若洲\t62cm\tyes"));

        let value: Value = serde_json::from_str(&trip_list(&trips, OutputFormat::Json).unwrap()).unwrap();
        assert_eq!(value[1]["size"], "-");
    }

    #[test]
    fn test_trip_list_empty() {
        assert_eq!(trip_list(&[], OutputFormat::Table).unwrap(), "No trips logged.\n");
        assert_eq!(trip_list(&[], OutputFormat::Plain).unwrap(), "");
    }

    #[test]
    fn test_trip_detail_shows_photos() {
        let out = trip_detail(&sample_trips()[0], OutputFormat::Table).unwrap();
        assert!(out.contains("大潮 (major)"));
        assert!(out.contains("Photo 2:"));
        assert!(out.contains("https://img.test/a.jpg"));
        assert!(!out.contains("Photo 1"));
    }

    #[test]
    fn test_report_sections() {
        let report = build_report(&sample_trips(), &AnalysisOptions::from_config(&AnalysisConfig::default()));

        let out = report_text(&report, &Section::ALL);
        assert!(out.contains("== Summary =="));
        assert!(out.contains("50.0%"));
        assert!(out.contains("バイブ"));
        assert!(out.contains("18–20"));

        let only = super::report(&report, &[Section::Lure], OutputFormat::Json).unwrap();
        let value: Value = serde_json::from_str(&only).unwrap();
        assert!(value.get("by_lure").is_some());
        assert!(value.get("summary").is_none());
    }

    fn report_text(report: &AnalysisReport, sections: &[Section]) -> String {
        super::report(report, sections, OutputFormat::Table).unwrap()
    }

    #[test]
    fn test_report_empty_sections_say_no_data() {
        let report = build_report(&[], &AnalysisOptions::from_config(&AnalysisConfig::default()));
        let out = report_text(&report, &[Section::Tide, Section::Heatmap]);
        assert_eq!(out.matches("(no data)").count(), 2);
    }

    #[test]
    fn test_check_renders_sections_and_failures() {
        let report = CheckReport {
            spot: "東京".to_string(),
            date: NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
            chart_url: "https://fake/chart".to_string(),
            tide: Lookup::Ok(tide_day()),
            weather: Lookup::Ok(fishlog_forecast::every_3_hours(&weather_hours())),
            sea_temp: Lookup::Failed("open-meteo-marine returned HTTP 500".to_string()),
            sea_point: (35.65, 139.77),
        };
        let out = check(&report, OutputFormat::Table).unwrap();

        assert!(out.contains("中潮"));
        assert!(out.contains("110–130cm"));
        assert!(out.contains("Weather (3-hourly)"));
        assert!(out.contains("21:00"));
        assert!(out.contains("unavailable: open-meteo-marine"));
    }

    #[test]
    fn test_tide_view() {
        let day = tide_day();
        let time = NaiveTime::from_hms_opt(18, 29, 0).unwrap();
        let out = tide(&spot(), &day, time, day.nearest(time), OutputFormat::Table).unwrap();
        assert!(out.contains("120cm (sample at 18:20)"));

        let plain = tide(&spot(), &day, time, None, OutputFormat::Plain).unwrap();
        assert_eq!(plain, "東京\t2024-05-01\t18:29\t\n");
    }

    #[test]
    fn test_spots_marks_default() {
        let out = spots(&[spot()], Some("東京"), OutputFormat::Plain).unwrap();
        assert_eq!(out, "東京\t13/0001\t35.65\t139.77\t*\n");
    }

    #[test]
    fn test_status_json() {
        let stats = StorageStats::from_trips(&sample_trips(), 2048);
        let out = status(Backend::Sqlite, Path::new("/tmp/log.db"), &stats, OutputFormat::Json).unwrap();
        let value: Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value["backend"], "sqlite");
        assert_eq!(value["stats"]["total_trips"], 2);
        assert_eq!(value["stats"]["catches"], 1);
    }
}
