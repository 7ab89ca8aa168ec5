//! Catch photos: slot assignment, upload naming and edit planning.
//!
//! A trip has [`PHOTO_SLOTS`] photo slots holding public URLs. On insert
//! the given files fill the slots in order; on edit each slot is kept,
//! cleared or replaced independently.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use chrono::NaiveDate;
use fishlog_forecast::{public_id, ImageHost};
use tracing::debug;

use crate::error::{Error, Result};
use crate::trip::{PhotoChange, PHOTO_SLOTS};

/// A photo file bound to a 1-based slot, written `N=PATH`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotPhoto {
    /// Slot number, 1 to [`PHOTO_SLOTS`].
    pub slot: usize,
    /// Photo file.
    pub path: PathBuf,
}

impl FromStr for SlotPhoto {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let (slot, path) = s
            .split_once('=')
            .ok_or_else(|| Error::invalid("photo", format!("expected N=PATH, got '{s}'")))?;
        let path = path.trim();
        if path.is_empty() {
            return Err(Error::invalid("photo", format!("missing path in '{s}'")));
        }
        Ok(Self {
            slot: parse_slot(slot)?,
            path: PathBuf::from(path),
        })
    }
}

/// Parse a 1-based slot number.
///
/// # Errors
///
/// Returns an error unless `s` is a number from 1 to [`PHOTO_SLOTS`].
pub fn parse_slot(s: &str) -> Result<usize> {
    match s.trim().parse::<usize>() {
        Ok(n) if (1..=PHOTO_SLOTS).contains(&n) => Ok(n),
        _ => Err(Error::invalid(
            "photo slot",
            format!("expected 1 to {PHOTO_SLOTS}, got '{s}'"),
        )),
    }
}

/// A photo read from disk.
#[derive(Clone, PartialEq, Eq)]
pub struct PhotoFile {
    /// Base name of the file.
    pub file_name: String,
    /// File content.
    pub bytes: Vec<u8>,
}

impl fmt::Debug for PhotoFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PhotoFile")
            .field("file_name", &self.file_name)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// Read a photo file.
///
/// # Errors
///
/// Returns [`Error::PhotoRead`] if the file cannot be read.
pub async fn read_photo(path: &Path) -> Result<PhotoFile> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|source| Error::PhotoRead {
            path: path.to_path_buf(),
            source,
        })?;
    let file_name = path
        .file_name()
        .map_or_else(|| "photo".to_string(), |n| n.to_string_lossy().into_owned());
    Ok(PhotoFile { file_name, bytes })
}

/// Upload name prefix for a photo added with a new trip: `YYYYMMDD_area_slot`.
#[must_use]
pub fn insert_prefix(date: NaiveDate, area: &str, slot: usize) -> String {
    format!("{}_{}_{slot}", date.format("%Y%m%d"), area.trim())
}

/// Upload name prefix for a photo added on edit: `id_date_slot`.
#[must_use]
pub fn edit_prefix(id: i64, date: Option<NaiveDate>, slot: usize) -> String {
    let date = date.map_or_else(|| "undated".to_string(), |d| d.format("%Y-%m-%d").to_string());
    format!("{id}_{date}_{slot}")
}

async fn upload(host: &dyn ImageHost, photo: PhotoFile, prefix: &str) -> Result<String> {
    let id = public_id(prefix, &photo.bytes);
    debug!(file = %photo.file_name, public_id = %id, "uploading");
    Ok(host.upload(photo.bytes, &photo.file_name, &id).await?)
}

/// Upload the photos of a new trip, filling slots in order.
///
/// Every file is read before the first upload starts.
///
/// # Errors
///
/// Returns an error for more than [`PHOTO_SLOTS`] files, an unreadable
/// file or a failed upload.
pub async fn upload_new(
    host: &dyn ImageHost,
    date: NaiveDate,
    area: &str,
    paths: &[PathBuf],
) -> Result<[Option<String>; PHOTO_SLOTS]> {
    if paths.len() > PHOTO_SLOTS {
        return Err(Error::invalid(
            "photo",
            format!("at most {PHOTO_SLOTS} photos, got {}", paths.len()),
        ));
    }

    let mut photos = Vec::with_capacity(paths.len());
    for path in paths {
        photos.push(read_photo(path).await?);
    }

    let mut urls: [Option<String>; PHOTO_SLOTS] = Default::default();
    for (i, photo) in photos.into_iter().enumerate() {
        urls[i] = Some(upload(host, photo, &insert_prefix(date, area, i + 1)).await?);
    }
    Ok(urls)
}

/// Planned action for one slot on edit.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SlotPlan {
    /// Leave it alone.
    #[default]
    Keep,
    /// Empty it.
    Clear,
    /// Upload this file into it.
    Replace(PathBuf),
}

/// Work out what happens to each slot.
///
/// Removing a slot takes precedence over replacing it.
///
/// # Errors
///
/// Returns an error for a slot out of range or a slot given two files.
pub fn plan_edit(replace: &[SlotPhoto], remove: &[usize]) -> Result<[SlotPlan; PHOTO_SLOTS]> {
    let mut plan: [SlotPlan; PHOTO_SLOTS] = Default::default();

    for photo in replace {
        let index = slot_index(photo.slot)?;
        if plan[index] != SlotPlan::Keep {
            return Err(Error::invalid(
                "photo",
                format!("slot {} given more than once", photo.slot),
            ));
        }
        plan[index] = SlotPlan::Replace(photo.path.clone());
    }
    for slot in remove {
        plan[slot_index(*slot)?] = SlotPlan::Clear;
    }
    Ok(plan)
}

fn slot_index(slot: usize) -> Result<usize> {
    parse_slot(&slot.to_string()).map(|n| n - 1)
}

impl SlotPlan {
    /// Whether carrying this out needs an image host.
    #[must_use]
    pub fn needs_upload(&self) -> bool {
        matches!(self, Self::Replace(_))
    }
}

/// Carry out an edit plan, uploading replacement photos.
///
/// Every replacement file is read before the first upload. `host` may be
/// `None` when no slot is replaced.
///
/// # Errors
///
/// Returns an error for an unreadable file, a failed upload or a
/// replacement without a host.
pub async fn apply_plan(
    host: Option<&dyn ImageHost>,
    id: i64,
    date: Option<NaiveDate>,
    plan: [SlotPlan; PHOTO_SLOTS],
) -> Result<[PhotoChange; PHOTO_SLOTS]> {
    if host.is_none() && plan.iter().any(SlotPlan::needs_upload) {
        return Err(Error::invalid("photo", "no image host to upload to"));
    }

    let mut files: [Option<PhotoFile>; PHOTO_SLOTS] = Default::default();
    for (file, slot) in files.iter_mut().zip(&plan) {
        if let SlotPlan::Replace(path) = slot {
            *file = Some(read_photo(path).await?);
        }
    }

    let mut changes: [PhotoChange; PHOTO_SLOTS] = Default::default();
    for (i, (slot, file)) in plan.into_iter().zip(files).enumerate() {
        changes[i] = match (slot, file) {
            (SlotPlan::Clear, _) => PhotoChange::Clear,
            (SlotPlan::Replace(_), Some(photo)) => {
                let host = host.ok_or_else(|| Error::invalid("photo", "no image host to upload to"))?;
                PhotoChange::Set(upload(host, photo, &edit_prefix(id, date, i + 1)).await?)
            }
            _ => PhotoChange::Keep,
        };
    }
    Ok(changes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use tempfile::TempDir;

    /// Records uploads and answers with a predictable URL.
    #[derive(Default)]
    struct FakeHost {
        uploads: Mutex<Vec<(String, String)>>,
        fail: bool,
    }

    #[async_trait]
    impl ImageHost for FakeHost {
        async fn upload(
            &self,
            _bytes: Vec<u8>,
            file_name: &str,
            public_id: &str,
        ) -> fishlog_forecast::Result<String> {
            if self.fail {
                return Err(fishlog_forecast::Error::Status {
                    service: "cloudinary",
                    status: 401,
                });
            }
            self.uploads
                .lock()
                .unwrap()
                .push((file_name.to_string(), public_id.to_string()));
            Ok(format!("https://img.test/{public_id}.jpg"))
        }
    }

    fn photo(dir: &TempDir, name: &str, content: &[u8]) -> PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, 1).unwrap()
    }

    #[test]
    fn test_slot_photo_from_str() {
        let p: SlotPhoto = "2=/tmp/fish.jpg".parse().unwrap();
        assert_eq!(p.slot, 2);
        assert_eq!(p.path, PathBuf::from("/tmp/fish.jpg"));

        assert!("fish.jpg".parse::<SlotPhoto>().is_err());
        assert!("4=fish.jpg".parse::<SlotPhoto>().is_err());
        assert!("0=fish.jpg".parse::<SlotPhoto>().is_err());
        assert!("1=".parse::<SlotPhoto>().is_err());
    }

    #[test]
    fn test_prefixes() {
        assert_eq!(insert_prefix(date(), " 若洲 ", 1), "20240501_若洲_1");
        assert_eq!(edit_prefix(7, Some(date()), 3), "7_2024-05-01_3");
        assert_eq!(edit_prefix(7, None, 2), "7_undated_2");
    }

    #[test]
    fn test_plan_edit_remove_wins() {
        let replace = vec![
            SlotPhoto { slot: 1, path: PathBuf::from("a.jpg") },
            SlotPhoto { slot: 3, path: PathBuf::from("c.jpg") },
        ];
        let plan = plan_edit(&replace, &[3]).unwrap();

        assert_eq!(plan[0], SlotPlan::Replace(PathBuf::from("a.jpg")));
        assert_eq!(plan[1], SlotPlan::Keep);
        assert_eq!(plan[2], SlotPlan::Clear);
    }

    #[test]
    fn test_plan_edit_rejects_bad_slots() {
        let twice = vec![
            SlotPhoto { slot: 2, path: PathBuf::from("a.jpg") },
            SlotPhoto { slot: 2, path: PathBuf::from("b.jpg") },
        ];
        assert!(plan_edit(&twice, &[]).is_err());
        assert!(plan_edit(&[], &[4]).is_err());
    }

    #[tokio::test]
    async fn test_upload_new_fills_slots_in_order() {
        let dir = TempDir::new().unwrap();
        let paths = vec![photo(&dir, "a.jpg", b"one"), photo(&dir, "b.jpg", b"two")];
        let host = FakeHost::default();

        let urls = upload_new(&host, date(), "若洲", &paths).await.unwrap();

        assert!(urls[0].as_deref().unwrap().contains("20240501_若洲_1_"));
        assert!(urls[1].as_deref().unwrap().contains("20240501_若洲_2_"));
        assert_eq!(urls[2], None);
        let uploads = host.uploads.lock().unwrap();
        assert_eq!(uploads[0].0, "a.jpg");
        assert_eq!(uploads[1].0, "b.jpg");
    }

    #[tokio::test]
    async fn test_upload_new_limits_and_missing_files() {
        let dir = TempDir::new().unwrap();
        let host = FakeHost::default();

        let four: Vec<PathBuf> = (0..4).map(|i| photo(&dir, &format!("{i}.jpg"), b"x")).collect();
        assert!(upload_new(&host, date(), "a", &four).await.is_err());

        let missing = vec![photo(&dir, "ok.jpg", b"x"), dir.path().join("gone.jpg")];
        let err = upload_new(&host, date(), "a", &missing).await.unwrap_err();
        assert!(matches!(err, Error::PhotoRead { .. }));
        assert!(host.uploads.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_apply_plan() {
        let dir = TempDir::new().unwrap();
        let host = FakeHost::default();
        let plan = [
            SlotPlan::Keep,
            SlotPlan::Replace(photo(&dir, "new.jpg", b"fresh")),
            SlotPlan::Clear,
        ];

        let changes = apply_plan(Some(&host), 12, Some(date()), plan).await.unwrap();

        assert_eq!(changes[0], PhotoChange::Keep);
        assert!(matches!(&changes[1], PhotoChange::Set(url) if url.contains("12_2024-05-01_2_")));
        assert_eq!(changes[2], PhotoChange::Clear);
    }

    #[tokio::test]
    async fn test_apply_plan_reads_all_files_before_uploading() {
        let dir = TempDir::new().unwrap();
        let host = FakeHost::default();
        let plan = [
            SlotPlan::Replace(photo(&dir, "a.jpg", b"one")),
            SlotPlan::Replace(dir.path().join("missing.jpg")),
            SlotPlan::Keep,
        ];

        let err = apply_plan(Some(&host), 7, Some(date()), plan).await.unwrap_err();

        assert!(matches!(err, Error::PhotoRead { .. }));
        assert!(host.uploads.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_apply_plan_without_host() {
        let plan = [SlotPlan::Clear, SlotPlan::Keep, SlotPlan::Keep];
        assert!(!plan.iter().any(SlotPlan::needs_upload));
        let changes = apply_plan(None, 1, None, plan).await.unwrap();
        assert_eq!(changes[0], PhotoChange::Clear);

        let replace = [SlotPlan::Replace(PathBuf::from("x.jpg")), SlotPlan::Keep, SlotPlan::Keep];
        assert!(replace[0].needs_upload());
        assert!(apply_plan(None, 1, None, replace).await.is_err());
    }

    #[tokio::test]
    async fn test_upload_failure_propagates() {
        let dir = TempDir::new().unwrap();
        let host = FakeHost {
            fail: true,
            ..FakeHost::default()
        };
        let paths = vec![photo(&dir, "a.jpg", b"x")];

        let err = upload_new(&host, date(), "a", &paths).await.unwrap_err();
        assert!(matches!(err, Error::Forecast(_)));
    }
}
