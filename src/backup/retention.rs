//! Deletes archives that have outlived the retention period.

use crate::backup::error::Result;

use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;
use tracing::{debug, info};
use validator::Validate;

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

/// File name suffix every finished archive carries.
pub static ARCHIVE_SUFFIX: &str = ".tar.bz2";

#[skip_serializing_none]
#[derive(Clone, Debug, Validate, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RetentionConfig {
    /// Maximum archive age, e.g. `365days` or `90d`.
    #[serde(with = "humantime_serde", default = "default_max_age")]
    pub max_age: Duration,
}

impl Default for RetentionConfig {
    fn default() -> Self {
        Self {
            max_age: default_max_age(),
        }
    }
}

fn default_max_age() -> Duration {
    Duration::from_secs(365 * 86400)
}

/// Deletes every `*.tar.bz2` file directly under `backup_dir` that is
/// strictly older than `now - max_age`, returning the deleted paths.
///
/// The archive's creation time is read from filesystem metadata,
/// falling back to the modification time where the platform has no
/// birth time. Entries at or newer than the cutoff, non-matching names
/// and directories are left untouched; an empty backup root is a
/// no-op. A failed deletion propagates and aborts the remaining scan.
pub fn expire(backup_dir: &Path, max_age: Duration, now: SystemTime) -> Result<Vec<PathBuf>> {
    debug!(
        "Expiring archives in {:?} older than {:?}",
        backup_dir, max_age
    );

    let mut deleted = Vec::new();
    for entry in fs::read_dir(backup_dir)? {
        let entry = entry?;
        let name = entry.file_name();
        let Some(name) = name.to_str() else {
            continue;
        };
        if !name.ends_with(ARCHIVE_SUFFIX) {
            continue;
        }

        let metadata = entry.metadata()?;
        if !metadata.is_file() {
            continue;
        }

        let created = metadata.created().or_else(|_| metadata.modified())?;
        match now.duration_since(created) {
            Ok(age) if age > max_age => {
                info!("Removing out of retention archive {:?}", entry.path());
                fs::remove_file(entry.path())?;
                deleted.push(entry.path());
            }
            _ => {}
        }
    }

    Ok(deleted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    static DAY: Duration = Duration::from_secs(86400);

    #[test]
    fn test_default_retention_is_one_year() {
        let config = RetentionConfig::default();
        assert_eq!(config.max_age, Duration::from_secs(365 * 86400));
    }

    #[test]
    fn test_retention_config_parses_humantime() {
        let config: RetentionConfig = serde_yml::from_str("max_age: 30days").unwrap();
        assert_eq!(config.max_age, 30 * DAY);

        let config: RetentionConfig = serde_yml::from_str("{}").unwrap();
        assert_eq!(config.max_age, 365 * DAY);
    }

    #[test]
    fn test_expire_empty_backup_root_is_a_noop() {
        let backups = TempDir::new().unwrap();
        let deleted = expire(backups.path(), DAY, SystemTime::now()).unwrap();
        assert!(deleted.is_empty());
    }

    #[test]
    fn test_expire_deletes_only_archives_past_the_cutoff() {
        let backups = TempDir::new().unwrap();
        fs::write(backups.path().join("backup-20250101-120000.tar.bz2"), "a").unwrap();
        fs::write(backups.path().join("backup-20250102-120000.tar.bz2"), "b").unwrap();
        fs::write(backups.path().join("notes.txt"), "keep").unwrap();
        fs::create_dir(backups.path().join("dir.tar.bz2")).unwrap();

        // Fresh files, generous retention: nothing is eligible.
        let deleted = expire(backups.path(), 365 * DAY, SystemTime::now()).unwrap();
        assert!(deleted.is_empty());

        // Same files seen from two days in the future with one day of
        // retention: both archives are past the cutoff.
        let future = SystemTime::now() + 2 * DAY;
        let mut deleted = expire(backups.path(), DAY, future).unwrap();
        deleted.sort();
        assert_eq!(
            deleted,
            vec![
                backups.path().join("backup-20250101-120000.tar.bz2"),
                backups.path().join("backup-20250102-120000.tar.bz2"),
            ]
        );

        assert!(backups.path().join("notes.txt").is_file());
        assert!(backups.path().join("dir.tar.bz2").is_dir());
    }

    #[test]
    fn test_expire_is_idempotent() {
        let backups = TempDir::new().unwrap();
        fs::write(backups.path().join("backup-20250101-120000.tar.bz2"), "a").unwrap();

        let future = SystemTime::now() + 2 * DAY;
        let deleted = expire(backups.path(), DAY, future).unwrap();
        assert_eq!(deleted.len(), 1);

        let deleted = expire(backups.path(), DAY, future).unwrap();
        assert!(deleted.is_empty());
    }

    #[test]
    fn test_expire_keeps_archives_at_the_cutoff() {
        let backups = TempDir::new().unwrap();
        let archive = backups.path().join("backup-20250101-120000.tar.bz2");
        fs::write(&archive, "a").unwrap();

        // Age exactly equal to max_age stays: the cutoff is strict.
        let created = fs::metadata(&archive)
            .unwrap()
            .created()
            .or_else(|_| fs::metadata(&archive).unwrap().modified())
            .unwrap();
        let deleted = expire(backups.path(), DAY, created + DAY).unwrap();
        assert!(deleted.is_empty());
        assert!(archive.is_file());
    }
}
