//! Atomic file writes and timestamped backups
//!
//! Every file the tools overwrite goes through [`write_atomic`]: the new
//! contents land in a temp file next to the target and are renamed over it,
//! so an interrupted write never leaves a half-written dataset behind.

use crate::Result;
use chrono::{DateTime, Local};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Temp file path used while writing `target` (`<name>.tmp` in the same directory)
pub fn temp_path_for(target: &Path) -> PathBuf {
    let mut name = target
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| "output".into());
    name.push(".tmp");
    target.with_file_name(name)
}

/// Write `contents` to `target` atomically (write temp, flush, rename)
///
/// On failure the temp file is removed and `target` is left untouched.
pub fn write_atomic(target: &Path, contents: &[u8]) -> Result<()> {
    if let Some(parent) = target.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent)?;
        }
    }

    let temp = temp_path_for(target);
    let outcome = (|| -> std::io::Result<()> {
        let mut file = fs::File::create(&temp)?;
        file.write_all(contents)?;
        file.sync_all()?;
        fs::rename(&temp, target)
    })();

    if let Err(e) = outcome {
        if temp.exists() {
            if let Err(cleanup) = fs::remove_file(&temp) {
                warn!("Failed to remove temp file {}: {}", temp.display(), cleanup);
            }
        }
        return Err(e.into());
    }

    debug!("Wrote {} bytes to {}", contents.len(), target.display());
    Ok(())
}

/// Backup path for `original`: `<stem>.backup-<operation>-<YYYYmmddTHHMMSS>.<ext>`
pub fn backup_path_for(original: &Path, operation: &str, at: DateTime<Local>) -> PathBuf {
    let stem = original
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "dataset".to_string());
    let ext = original
        .extension()
        .map(|e| e.to_string_lossy().into_owned())
        .unwrap_or_else(|| "json".to_string());
    original.with_file_name(format!(
        "{}.backup-{}-{}.{}",
        stem,
        operation,
        at.format("%Y%m%dT%H%M%S"),
        ext
    ))
}

/// Copy `original` to a timestamped backup next to it and return the backup path
///
/// A backup with the same name (same operation within the same second) gets a
/// numeric suffix instead of being overwritten.
pub fn write_backup(original: &Path, operation: &str, at: DateTime<Local>) -> Result<PathBuf> {
    let base = backup_path_for(original, operation, at);
    let stem = base
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let ext = base
        .extension()
        .map(|e| e.to_string_lossy().into_owned())
        .unwrap_or_default();
    let mut backup = base.clone();
    let mut attempt = 1;
    while backup.exists() {
        backup = base.with_file_name(format!("{}-{}.{}", stem, attempt, ext));
        attempt += 1;
    }

    let contents = fs::read(original)?;
    write_atomic(&backup, &contents)?;
    Ok(backup)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::TempDir;

    #[test]
    fn test_write_atomic_creates_target_without_temp() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("jokes.json");

        write_atomic(&target, b"{}").unwrap();

        assert_eq!(fs::read_to_string(&target).unwrap(), "{}");
        assert!(!temp_path_for(&target).exists());
    }

    #[test]
    fn test_write_atomic_replaces_existing() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("jokes.json");
        fs::write(&target, "old").unwrap();

        write_atomic(&target, b"new").unwrap();

        assert_eq!(fs::read_to_string(&target).unwrap(), "new");
    }

    #[test]
    fn test_write_atomic_failure_leaves_original() {
        let dir = TempDir::new().unwrap();
        // Target is a non-empty directory, so the final rename must fail
        let target = dir.path().join("occupied");
        fs::create_dir(&target).unwrap();
        fs::write(target.join("keep.txt"), "x").unwrap();

        assert!(write_atomic(&target, b"data").is_err());
        assert!(target.join("keep.txt").exists());
        assert!(!temp_path_for(&target).exists());
    }

    #[test]
    fn test_backup_path_format() {
        let at = Local.with_ymd_and_hms(2024, 3, 9, 14, 5, 7).unwrap();
        let path = backup_path_for(Path::new("/data/jokes.json"), "dedup", at);
        assert_eq!(
            path,
            PathBuf::from("/data/jokes.backup-dedup-20240309T140507.json")
        );
    }

    #[test]
    fn test_backup_copies_contents_and_never_overwrites() {
        let dir = TempDir::new().unwrap();
        let original = dir.path().join("jokes.json");
        fs::write(&original, "v1").unwrap();
        let at = Local.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();

        let first = write_backup(&original, "clean", at).unwrap();
        fs::write(&original, "v2").unwrap();
        let second = write_backup(&original, "clean", at).unwrap();

        assert_ne!(first, second);
        assert_eq!(fs::read_to_string(&first).unwrap(), "v1");
        assert_eq!(fs::read_to_string(&second).unwrap(), "v2");
    }

    #[test]
    fn test_backup_suffix_keeps_extension() {
        let dir = TempDir::new().unwrap();
        let original = dir.path().join("notes.txt");
        fs::write(&original, "v1").unwrap();
        let at = Local.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();

        write_backup(&original, "clean", at).unwrap();
        let second = write_backup(&original, "clean", at).unwrap();
        let third = write_backup(&original, "clean", at).unwrap();

        assert_eq!(second, dir.path().join("notes.backup-clean-20240101T000000-1.txt"));
        assert_eq!(third, dir.path().join("notes.backup-clean-20240101T000000-2.txt"));
    }
}
