//! Recursive directory copy with fsync.

use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::Path;

use super::errors::{BackupError, BackupResult};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CopyStats {
    pub files: u64,
    pub bytes: u64,
}

/// In-progress temp files are never part of a consistent home.
fn is_temp_file(path: &Path) -> bool {
    path.extension().map_or(false, |ext| ext == "tmp")
}

fn copy_file_with_fsync(src: &Path, dst: &Path) -> BackupResult<u64> {
    let mut input = File::open(src).map_err(|e| BackupError::io_error_at_path(src, e))?;
    let mut output = File::create(dst).map_err(|e| BackupError::io_error_at_path(dst, e))?;
    let bytes = io::copy(&mut input, &mut output).map_err(|e| {
        BackupError::io_error(
            format!("failed to copy {} to {}", src.display(), dst.display()),
            e,
        )
    })?;
    output
        .sync_all()
        .map_err(|e| BackupError::io_error(format!("failed to fsync {}", dst.display()), e))?;
    Ok(bytes)
}

/// Copies `src` into `dst`, skipping `*.tmp` files.
pub fn copy_dir_recursive(src: &Path, dst: &Path, stats: &mut CopyStats) -> BackupResult<()> {
    fs::create_dir_all(dst).map_err(|e| BackupError::io_error_at_path(dst, e))?;

    let mut entries: Vec<_> = fs::read_dir(src)
        .map_err(|e| BackupError::io_error_at_path(src, e))?
        .collect::<Result<_, _>>()
        .map_err(|e| BackupError::io_error_at_path(src, e))?;
    entries.sort_by_key(|e| e.file_name());

    for entry in entries {
        let from = entry.path();
        let to = dst.join(entry.file_name());
        let file_type = entry
            .file_type()
            .map_err(|e| BackupError::io_error_at_path(&from, e))?;

        if file_type.is_dir() {
            copy_dir_recursive(&from, &to, stats)?;
        } else if file_type.is_file() && !is_temp_file(&from) {
            stats.bytes += copy_file_with_fsync(&from, &to)?;
            stats.files += 1;
        }
    }

    let dir = OpenOptions::new()
        .read(true)
        .open(dst)
        .map_err(|e| BackupError::io_error_at_path(dst, e))?;
    dir.sync_all().map_err(|e| {
        BackupError::io_error(format!("failed to fsync directory {}", dst.display()), e)
    })?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_copies_nested_files_and_skips_temp() {
        let src = TempDir::new().unwrap();
        fs::create_dir_all(src.path().join("wal")).unwrap();
        fs::write(src.path().join("wal").join("wal.log"), b"abc").unwrap();
        fs::write(src.path().join("checkpoint.json"), b"{}").unwrap();
        fs::write(src.path().join("checkpoint.json.tmp"), b"partial").unwrap();

        let dst = TempDir::new().unwrap();
        let target = dst.path().join("copy");
        let mut stats = CopyStats::default();
        copy_dir_recursive(src.path(), &target, &mut stats).unwrap();

        assert_eq!(stats, CopyStats { files: 2, bytes: 5 });
        assert_eq!(fs::read(target.join("wal").join("wal.log")).unwrap(), b"abc");
        assert!(!target.join("checkpoint.json.tmp").exists());
    }
}
