//! Staging directory lifecycle.
//!
//! A staging directory is created at the start of a run, populated by
//! the copy and snapshot steps, and removed only after the archive has
//! been written. Failure paths leave it on disk for inspection.

use crate::backup::error::{Error, Result};
use std::fs;
use std::io::ErrorKind;
use std::path::Path;
use tracing::debug;

/// Creates the staging directory, creating the backup root on demand.
///
/// A pre-existing staging path is a hard [`Error::StagingExists`]: it
/// indicates either a concurrent run or a leftover from a crashed one.
pub fn create_staging(staging: &Path) -> Result<()> {
    if let Some(parent) = staging.parent() {
        fs::create_dir_all(parent)?;
    }

    debug!("Making staging {:?}", staging);
    match fs::create_dir(staging) {
        Err(e) if e.kind() == ErrorKind::AlreadyExists => {
            Err(Error::StagingExists(staging.to_path_buf()))
        }
        res => Ok(res?),
    }
}

/// Recursively deletes the staging directory.
pub fn remove_staging(staging: &Path) -> Result<()> {
    debug!("Removing staging {:?}", staging);
    Ok(fs::remove_dir_all(staging)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_create_staging_makes_backup_root() {
        let temp_dir = TempDir::new().unwrap();
        let staging = temp_dir.path().join("backups/backup-20260101-120000");

        create_staging(&staging).unwrap();
        assert!(staging.is_dir());
    }

    #[test]
    fn test_create_staging_collision_is_an_error() {
        let temp_dir = TempDir::new().unwrap();
        let staging = temp_dir.path().join("backup-20260101-120000");

        create_staging(&staging).unwrap();
        std::fs::write(staging.join("marker"), "first run").unwrap();

        let err = create_staging(&staging).unwrap_err();
        match err {
            Error::StagingExists(path) => assert_eq!(path, staging),
            other => panic!("Expected StagingExists, got {other:?}"),
        }

        // The first run's staging is untouched.
        let marker = std::fs::read_to_string(staging.join("marker")).unwrap();
        assert_eq!(marker, "first run");
    }

    #[test]
    fn test_remove_staging_deletes_tree() {
        let temp_dir = TempDir::new().unwrap();
        let staging = temp_dir.path().join("backup-20260101-120000");

        create_staging(&staging).unwrap();
        std::fs::create_dir(staging.join("attachments")).unwrap();
        std::fs::write(staging.join("attachments/a.png"), "png").unwrap();

        remove_staging(&staging).unwrap();
        assert!(!staging.exists());
    }
}
