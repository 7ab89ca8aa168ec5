//! Spreadsheet-style trip store kept in a CSV file.
//!
//! The first row is a fixed header; every other row is one trip. The file
//! is read on every operation so edits made in a spreadsheet program are
//! picked up, and every write replaces the whole file in one rename.

use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use super::{
    file_size, format_date, format_number, format_time, parse_number, parse_stored_date,
    parse_stored_time, sort_newest_first, LogStore, StorageStats,
};
use crate::config::Backend;
use crate::error::{Error, Result};
use crate::trip::{NewTrip, TidePhase, TripLog, TripUpdate, PHOTO_SLOTS};

/// Column names, in order.
pub const HEADER: [&str; 14] = [
    "id",
    "date",
    "time",
    "area",
    "tide_type",
    "tide_height",
    "temperature",
    "wind_direction",
    "lure",
    "action",
    "size",
    "image_url1",
    "image_url2",
    "image_url3",
];

const COL_ID: usize = 0;
const COL_DATE: usize = 1;
const COL_FIRST_PHOTO: usize = 11;

type Row = Vec<String>;

/// Trip store backed by a CSV sheet.
#[derive(Debug, Clone)]
pub struct SheetStore {
    path: PathBuf,
}

impl SheetStore {
    /// Open the sheet, creating it or repairing its header row.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or written.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let store = Self { path };

        if store.path.exists() {
            let mut rows = store.read_all()?;
            let header_ok = rows.first().is_some_and(|first| is_header(first));
            if !header_ok {
                warn!(path = %store.path.display(), "sheet header differs, rewriting row 1");
                let unmapped = replace_header(&mut rows);
                if unmapped > 0 {
                    warn!(
                        path = %store.path.display(),
                        rows = unmapped,
                        "existing rows were not remapped to the new columns"
                    );
                }
                store.write_all(&rows)?;
            }
        } else {
            if let Some(parent) = store.path.parent() {
                if !parent.as_os_str().is_empty() && !parent.exists() {
                    std::fs::create_dir_all(parent).map_err(|source| Error::DirectoryCreate {
                        path: parent.to_path_buf(),
                        source,
                    })?;
                }
            }
            store.write_all(&[HEADER.iter().map(ToString::to_string).collect()])?;
            info!(path = %store.path.display(), "sheet created");
        }

        Ok(store)
    }

    fn sheet_error(&self, source: csv::Error) -> Error {
        Error::Sheet {
            path: self.path.clone(),
            source,
        }
    }

    /// Every row including the header, padded to the header width.
    fn read_all(&self) -> Result<Vec<Row>> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_path(&self.path)
            .map_err(|e| self.sheet_error(e))?;

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record.map_err(|e| self.sheet_error(e))?;
            let mut row: Row = record.iter().map(ToString::to_string).collect();
            if row.len() < HEADER.len() {
                row.resize(HEADER.len(), String::new());
            }
            rows.push(row);
        }
        Ok(rows)
    }

    /// Data rows only.
    fn read_data(&self) -> Result<Vec<Row>> {
        let mut rows = self.read_all()?;
        if !rows.is_empty() {
            rows.remove(0);
        }
        Ok(rows)
    }

    /// Replace the file with `rows` (header first).
    fn write_all(&self, rows: &[Row]) -> Result<()> {
        let tmp = self.path.with_extension("csv.tmp");
        {
            let mut writer = csv::WriterBuilder::new()
                .flexible(true)
                .from_path(&tmp)
                .map_err(|e| self.sheet_error(e))?;
            for row in rows {
                writer.write_record(row).map_err(|e| self.sheet_error(e))?;
            }
            writer.flush()?;
        }
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    fn write_data(&self, data: &[Row]) -> Result<()> {
        let mut rows = Vec::with_capacity(data.len() + 1);
        rows.push(HEADER.iter().map(ToString::to_string).collect());
        rows.extend(data.iter().cloned());
        self.write_all(&rows)
    }

    fn row_to_trip(row: &Row) -> Option<TripLog> {
        if row.iter().all(|cell| cell.trim().is_empty()) {
            return None;
        }
        let Some(id) = row_id(row) else {
            warn!(id = %row[COL_ID], "sheet row without a numeric id skipped");
            return None;
        };

        let date = parse_stored_date(&row[COL_DATE]);
        if date.is_none() {
            warn!(id, date = %row[COL_DATE], "trip has an unparseable date");
        }

        let mut photos: [Option<String>; PHOTO_SLOTS] = Default::default();
        for (i, slot) in photos.iter_mut().enumerate() {
            let url = row[COL_FIRST_PHOTO + i].trim();
            *slot = (!url.is_empty()).then(|| url.to_string());
        }

        Some(TripLog {
            id,
            date,
            time: parse_stored_time(&row[2]),
            area: row[3].trim().to_string(),
            tide_phase: TidePhase::from_stored(&row[4]),
            tide_height: parse_number(&row[5]),
            temperature: parse_number(&row[6]),
            wind_direction: row[7].trim().to_string(),
            lure: row[8].trim().to_string(),
            action: row[9].trim().to_string(),
            size: parse_number(&row[10]),
            photos,
        })
    }
}

/// Put the canonical header in row 1, returning how many data rows sit
/// under it unchanged.
fn replace_header(rows: &mut Vec<Row>) -> usize {
    let header = HEADER.iter().map(ToString::to_string).collect();
    if rows.is_empty() {
        rows.push(header);
    } else {
        rows[0] = header;
    }
    rows.iter()
        .skip(1)
        .filter(|row| row.iter().any(|cell| !cell.trim().is_empty()))
        .count()
}

fn is_header(row: &Row) -> bool {
    let used = row.iter().rposition(|c| !c.is_empty()).map_or(0, |i| i + 1);
    used == HEADER.len() && row.iter().zip(HEADER).all(|(cell, name)| cell == name)
}

fn row_id(row: &Row) -> Option<i64> {
    let text = row[COL_ID].trim();
    text.parse::<i64>().ok().or_else(|| {
        // Spreadsheet programs like to turn 7 into 7.0.
        #[allow(clippy::cast_possible_truncation)]
        parse_number(text)
            .filter(|v| v.fract() == 0.0)
            .map(|v| v as i64)
    })
}

/// Cells after the date column, shared by insert and update.
#[allow(clippy::too_many_arguments)]
fn tail_cells(
    time: Option<chrono::NaiveTime>,
    area: &str,
    tide_phase: TidePhase,
    tide_height: Option<f64>,
    temperature: Option<f64>,
    wind_direction: &str,
    lure: &str,
    action: &str,
    size: Option<f64>,
    photos: &[Option<String>; PHOTO_SLOTS],
) -> Vec<String> {
    let mut cells = vec![
        time.map(format_time).unwrap_or_default(),
        area.to_string(),
        tide_phase.label().to_string(),
        format_number(tide_height),
        format_number(temperature),
        wind_direction.to_string(),
        lure.to_string(),
        action.to_string(),
        format_number(size),
    ];
    cells.extend(photos.iter().map(|p| p.clone().unwrap_or_default()));
    cells
}

impl LogStore for SheetStore {
    fn backend(&self) -> Backend {
        Backend::Sheet
    }

    fn path(&self) -> &Path {
        &self.path
    }

    fn fetch_all(&self) -> Result<Vec<TripLog>> {
        let mut trips: Vec<TripLog> = self
            .read_data()?
            .iter()
            .filter_map(Self::row_to_trip)
            .collect();
        sort_newest_first(&mut trips);
        debug!(count = trips.len(), "trips loaded from sheet");
        Ok(trips)
    }

    fn get(&self, id: i64) -> Result<Option<TripLog>> {
        Ok(self
            .read_data()?
            .iter()
            .find(|row| row_id(row) == Some(id))
            .and_then(Self::row_to_trip))
    }

    fn insert(&mut self, trip: &NewTrip) -> Result<i64> {
        let trip = trip.clone().normalized()?;
        let mut data = self.read_data()?;
        let id = data.iter().filter_map(row_id).max().unwrap_or(0) + 1;

        let mut row = vec![id.to_string(), format_date(trip.date)];
        row.extend(tail_cells(
            trip.time,
            &trip.area,
            trip.tide_phase,
            trip.tide_height,
            trip.temperature,
            &trip.wind_direction,
            &trip.lure,
            &trip.action,
            trip.size,
            &trip.photos,
        ));
        data.push(row);
        self.write_data(&data)?;

        debug!("Inserted trip with id {} into sheet", id);
        Ok(id)
    }

    fn update(&mut self, id: i64, update: &TripUpdate) -> Result<bool> {
        let mut data = self.read_data()?;
        let Some(index) = data.iter().position(|row| row_id(row) == Some(id)) else {
            debug!(id, "update skipped, no such trip in sheet");
            return Ok(false);
        };
        let update = update.clone().normalized()?;

        let row = &data[index];
        let mut current: [Option<String>; PHOTO_SLOTS] = Default::default();
        for (i, slot) in current.iter_mut().enumerate() {
            let url = row[COL_FIRST_PHOTO + i].trim();
            *slot = (!url.is_empty()).then(|| url.to_string());
        }
        let photos = update.apply_photos(&current);

        let mut new_row = vec![row[COL_ID].clone(), row[COL_DATE].clone()];
        new_row.extend(tail_cells(
            update.time,
            &update.area,
            update.tide_phase,
            update.tide_height,
            update.temperature,
            &update.wind_direction,
            &update.lure,
            &update.action,
            update.size,
            &photos,
        ));
        data[index] = new_row;
        self.write_data(&data)?;

        debug!(id, "Updated trip in sheet");
        Ok(true)
    }

    fn delete(&mut self, id: i64) -> Result<bool> {
        let mut data = self.read_data()?;
        let Some(index) = data.iter().position(|row| row_id(row) == Some(id)) else {
            return Ok(false);
        };
        data.remove(index);
        self.write_data(&data)?;

        info!(id, "Deleted trip from sheet");
        Ok(true)
    }

    fn stats(&self) -> Result<StorageStats> {
        let trips = self.fetch_all()?;
        Ok(StorageStats::from_trips(&trips, file_size(&self.path)))
    }
}
