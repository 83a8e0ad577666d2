//! Extraction of the static GTFS zip into a scratch directory.

use std::fs::File;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::error::ScheduleLoadError;

/// A scratch directory that is removed when dropped.
#[derive(Debug)]
pub struct WorkDir {
    path: PathBuf,
}

impl WorkDir {
    /// Creates a fresh directory under the system temp dir.
    pub fn create(prefix: &str) -> Result<Self, ScheduleLoadError> {
        let name = format!(
            "{}-{}-{}",
            prefix,
            std::process::id(),
            chrono::Utc::now().timestamp_nanos_opt().unwrap_or_default()
        );
        let path = std::env::temp_dir().join(name);
        std::fs::create_dir_all(&path).map_err(|source| ScheduleLoadError::Io {
            path: path.clone(),
            source,
        })?;
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for WorkDir {
    fn drop(&mut self) {
        if let Err(e) = std::fs::remove_dir_all(&self.path) {
            warn!(path = %self.path.display(), error = %e, "Failed to remove work dir");
        }
    }
}

/// Extracts the GTFS zip at `zip_path` into a new [`WorkDir`].
///
/// # Errors
///
/// Returns [`ScheduleLoadError::Io`] if the archive cannot be opened and
/// [`ScheduleLoadError::Archive`] if it is not a valid zip.
#[tracing::instrument(fields(zip = %zip_path.display()))]
pub fn extract_archive(zip_path: &Path) -> Result<WorkDir, ScheduleLoadError> {
    let file = File::open(zip_path).map_err(|source| ScheduleLoadError::Io {
        path: zip_path.to_path_buf(),
        source,
    })?;
    let mut archive = zip::ZipArchive::new(file)?;

    let work_dir = WorkDir::create("trip-status-gtfs")?;
    archive.extract(work_dir.path())?;

    info!(
        files = archive.len(),
        dir = %work_dir.path().display(),
        "GTFS data extracted"
    );
    Ok(work_dir)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::fs;
    use std::io::Write;
    use zip::write::SimpleFileOptions;

    fn temp_path(name: &str) -> PathBuf {
        env::temp_dir().join(name)
    }

    #[test]
    fn test_work_dir_removed_on_drop() {
        let work_dir = WorkDir::create("trip-status-test").unwrap();
        let path = work_dir.path().to_path_buf();
        assert!(path.is_dir());

        drop(work_dir);
        assert!(!path.exists());
    }

    #[test]
    fn test_extract_archive() {
        let zip_path = temp_path("trip_status_test_extract.zip");
        {
            let file = File::create(&zip_path).unwrap();
            let mut writer = zip::ZipWriter::new(file);
            writer
                .start_file("routes.txt", SimpleFileOptions::default())
                .unwrap();
            writer.write_all(b"route_id,route_type\nR1,2\n").unwrap();
            writer.finish().unwrap();
        }

        let work_dir = extract_archive(&zip_path).unwrap();
        let content = fs::read_to_string(work_dir.path().join("routes.txt")).unwrap();
        assert!(content.starts_with("route_id"));

        fs::remove_file(&zip_path).unwrap();
    }

    #[test]
    fn test_extract_missing_archive() {
        let err = extract_archive(&temp_path("trip_status_no_such.zip")).unwrap_err();
        assert!(matches!(err, ScheduleLoadError::Io { .. }));
    }

    #[test]
    fn test_extract_not_a_zip() {
        let zip_path = temp_path("trip_status_test_not_zip.zip");
        fs::write(&zip_path, b"definitely not a zip").unwrap();

        let err = extract_archive(&zip_path).unwrap_err();
        assert!(matches!(err, ScheduleLoadError::Archive(_)));

        fs::remove_file(&zip_path).unwrap();
    }
}
