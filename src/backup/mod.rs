//! Backup
//!
//! A backup is a plain recursive copy of a home directory: whatever is on
//! disk at the time of the copy. Buffered log records that were never
//! flushed are not on disk and so are not in the copy. Opening the copy runs
//! normal recovery.
//!
//! The destination must be absent or empty. On failure the partial copy is
//! removed.

mod copier;
mod errors;
mod manifest;

pub use copier::CopyStats;
pub use errors::{BackupError, BackupResult};
pub use manifest::{BackupManifest, MANIFEST_FILE};

use std::fs;
use std::path::Path;

use crate::checkpoint::CheckpointMarker;
use crate::observability::{log_event_with_fields, Event};

/// Copies a home directory to `destination` and writes a `backup.json`
/// manifest there. The copy opens like the original after a crash.
pub fn copy_home(source: &Path, destination: &Path) -> BackupResult<BackupManifest> {
    if !source.is_dir() {
        return Err(BackupError::SourceMissing(source.to_path_buf()));
    }
    if destination.exists() {
        let mut entries =
            fs::read_dir(destination).map_err(|e| BackupError::io_error_at_path(destination, e))?;
        if entries.next().is_some() {
            return Err(BackupError::DestinationNotEmpty(destination.to_path_buf()));
        }
    }

    let mut stats = CopyStats::default();
    let result = copier::copy_dir_recursive(source, destination, &mut stats).and_then(|_| {
        let generation = CheckpointMarker::load(destination)
            .ok()
            .flatten()
            .map(|m| m.generation);
        let manifest = BackupManifest::new(source, generation, stats.files, stats.bytes);
        manifest.write_to(destination)?;
        Ok(manifest)
    });

    match result {
        Ok(manifest) => {
            let files = manifest.files.to_string();
            let bytes = manifest.bytes.to_string();
            log_event_with_fields(
                Event::BackupComplete,
                &[
                    ("bytes", &bytes),
                    ("destination", &destination.display().to_string()),
                    ("files", &files),
                ],
            );
            Ok(manifest)
        }
        Err(e) => {
            let _ = fs::remove_dir_all(destination);
            Err(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_copy_writes_manifest() {
        let src = TempDir::new().unwrap();
        fs::write(src.path().join("data"), b"1234").unwrap();
        let dst = TempDir::new().unwrap();
        let target = dst.path().join("backup");

        let manifest = copy_home(src.path(), &target).unwrap();
        assert_eq!(manifest.files, 1);
        assert_eq!(manifest.bytes, 4);
        assert_eq!(manifest.checkpoint_generation, None);
        assert_eq!(BackupManifest::read_from(&target).unwrap(), manifest);
    }

    #[test]
    fn test_non_empty_destination_rejected() {
        let src = TempDir::new().unwrap();
        let dst = TempDir::new().unwrap();
        fs::write(dst.path().join("existing"), b"x").unwrap();
        let err = copy_home(src.path(), dst.path()).unwrap_err();
        assert_eq!(err.code(), "EPOCH_BACKUP_DESTINATION_NOT_EMPTY");
        assert!(dst.path().join("existing").exists());
    }

    #[test]
    fn test_missing_source_rejected() {
        let dst = TempDir::new().unwrap();
        let err = copy_home(&dst.path().join("nope"), &dst.path().join("out")).unwrap_err();
        assert!(matches!(err, BackupError::SourceMissing(_)));
    }
}
