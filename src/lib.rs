//! # vault-backup
//!
//! Point-in-time backup of a vaultwarden data directory.
//!
//! ## Features
//!
//! - **Consistent Snapshots**: SQLite export through the sqlite3 CLI's `.backup` command
//! - **File Copy**: auxiliary files staged with glob-based exclusions
//! - **Compression**: bzip2-compressed tar archives
//! - **Retention Management**: archives older than a configurable age are deleted
//!
//! ## Quick Start
//!
//! ```no_run
//! use vault_backup::backup::backup_config::BackupConfig;
//! use vault_backup::backup::snapshot::SystemRunner;
//!
//! // Load configuration from YAML file
//! let config: BackupConfig = serde_yml::from_reader(std::fs::File::open("config.yml")?)?;
//!
//! // Run one backup, then delete archives past the retention period
//! let archive = config.run(&SystemRunner, chrono::Local::now())?;
//! println!("created {:?}", archive);
//! config.expire(std::time::SystemTime::now())?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod backup;
