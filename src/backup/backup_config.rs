use crate::backup::archive;
use crate::backup::copy::{self, ExcludeGlob};
use crate::backup::error::Result;
use crate::backup::retention::{self, RetentionConfig};
use crate::backup::snapshot::{self, CommandRunner};
use crate::backup::stage;
use crate::backup::validate::{validate_bare_file_name, validate_dir_exist, validate_writable_dir};

use bon::Builder;
use chrono::{DateTime, Local};
use getset::Getters;
use globset::{GlobBuilder, GlobSet, GlobSetBuilder};
use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;
use tracing::info;
use validator::Validate;

use std::path::PathBuf;
use std::time::SystemTime;

static STAGING_TIME_FORMAT: &str = "%Y%m%d-%H%M%S";

/// One backup run end-to-end: stage, populate, archive, clean up.
///
/// Defaults describe the known vaultwarden deployment; every field can
/// be overridden through the config file or the builder.
#[skip_serializing_none]
#[derive(Clone, Debug, Serialize, Deserialize, Validate, Builder, Getters)]
#[serde(deny_unknown_fields)]
#[getset(get = "pub")]
pub struct BackupConfig {
    /// Live data directory, read-only to this tool.
    #[validate(custom(function = validate_dir_exist))]
    #[serde(default = "default_data_dir")]
    #[builder(default = default_data_dir(), into)]
    data_dir: PathBuf,
    /// Holds one staging directory per run and the finished archives.
    #[validate(custom(function = validate_writable_dir))]
    #[serde(default = "default_backup_dir")]
    #[builder(default = default_backup_dir(), into)]
    backup_dir: PathBuf,
    /// Database file name inside `data_dir`; its `{db_file}*` siblings
    /// are excluded from the file copy.
    #[validate(custom(function = validate_bare_file_name))]
    #[serde(default = "default_db_file")]
    #[builder(default = default_db_file(), into)]
    db_file: String,
    /// sqlite3 binary used for the `.backup` snapshot.
    #[serde(default = "default_sqlite3_bin")]
    #[builder(default = default_sqlite3_bin(), into)]
    sqlite3_bin: PathBuf,
    /// bzip2 compression level (1-9).
    #[validate(range(min = 1, max = 9))]
    #[serde(default = "default_compression_level")]
    #[builder(default = default_compression_level())]
    compression_level: u32,
    /// Extra glob patterns excluded from the file copy.
    #[serde(default)]
    #[builder(default)]
    exclude: Vec<ExcludeGlob>,
    /// Retention applied to the backup root after a run. An absent key
    /// means the 365-day default; an explicit null disables expiry.
    #[validate(nested)]
    #[serde(default = "default_retention")]
    retention: Option<RetentionConfig>,
    #[serde(default)]
    #[builder(default)]
    verbose: bool,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("/export/vaultwarden/vaultwarden")
}

fn default_backup_dir() -> PathBuf {
    PathBuf::from("/export/vaultwarden/backups")
}

fn default_db_file() -> String {
    "db.sqlite3".into()
}

fn default_sqlite3_bin() -> PathBuf {
    PathBuf::from("/usr/bin/sqlite3")
}

fn default_compression_level() -> u32 {
    9
}

fn default_retention() -> Option<RetentionConfig> {
    Some(RetentionConfig::default())
}

impl BackupConfig {
    /// Staging path for a run started at `now`, second precision. Two
    /// runs started within the same second collide on purpose.
    pub fn staging_dir(&self, now: DateTime<Local>) -> PathBuf {
        self.backup_dir
            .join(format!("backup-{}", now.format(STAGING_TIME_FORMAT)))
    }

    fn exclude_set(&self) -> Result<GlobSet> {
        let mut builder = GlobSetBuilder::new();
        builder.add(
            GlobBuilder::new(&format!("{}*", self.db_file))
                .literal_separator(true)
                .build()?,
        );
        for glob in &self.exclude {
            builder.add(glob.glob().clone());
        }
        Ok(builder.build()?)
    }

    /// Runs one full backup: create staging, copy auxiliary files,
    /// snapshot the database, archive, remove staging. Returns the
    /// archive path.
    ///
    /// The first failing step aborts the run; the staging directory is
    /// then left on disk for forensic inspection, and no archive is
    /// produced.
    pub fn run(&self, runner: &dyn CommandRunner, now: DateTime<Local>) -> Result<PathBuf> {
        let staging = self.staging_dir(now);
        stage::create_staging(&staging)?;
        copy::copy_tree(&self.data_dir, &staging, &self.exclude_set()?)?;
        snapshot::snapshot_database(
            runner,
            &self.sqlite3_bin,
            &self.data_dir.join(&self.db_file),
            &staging.join(&self.db_file),
        )?;
        let archive = archive::archive_staging(&staging, self.compression_level)?;
        stage::remove_staging(&staging)?;

        info!("Backup complete: {:?}", archive);
        Ok(archive)
    }

    /// Applies the configured retention to the backup root, returning
    /// the deleted archives. Without a retention config this is a
    /// no-op.
    pub fn expire(&self, now: SystemTime) -> Result<Vec<PathBuf>> {
        match &self.retention {
            Some(retention) => retention::expire(&self.backup_dir, retention.max_age, now),
            None => Ok(Vec::new()),
        }
    }
}
