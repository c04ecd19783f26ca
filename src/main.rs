use chrono::Local;
use clap::Parser;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::process::exit;
use std::time::SystemTime;
use tracing::{error, Level};
use validator::Validate;
use vault_backup::backup::backup_config::BackupConfig;
use vault_backup::backup::error::Result;
use vault_backup::backup::retention::RetentionConfig;
use vault_backup::backup::snapshot::SystemRunner;

/// Back up a vaultwarden data directory and delete old archives
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Location of config file; defaults apply when omitted
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Only delete archives past the retention period, skip the backup
    #[arg(long)]
    expire_only: bool,
    /// Print progress for each step
    #[arg(short, long)]
    verbose: bool,
}

fn main() {
    let args = Args::parse();

    let config = match load_config(args.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{e}");
            exit(1);
        }
    };

    let level = if args.verbose || *config.verbose() {
        Level::DEBUG
    } else {
        Level::INFO
    };
    tracing_subscriber::fmt().with_max_level(level).init();

    let res = if args.expire_only {
        config.expire(SystemTime::now()).map(|_| ())
    } else {
        config
            .run(&SystemRunner, Local::now())
            .and_then(|_| config.expire(SystemTime::now()))
            .map(|_| ())
    };

    if let Err(e) = res {
        error!("{e}");
        exit(1);
    }
}

fn load_config(path: Option<&Path>) -> Result<BackupConfig> {
    let config: BackupConfig = match path {
        Some(path) => serde_yml::from_reader(File::open(path)?)?,
        None => BackupConfig::builder()
            .retention(RetentionConfig::default())
            .build(),
    };
    config.validate()?;
    Ok(config)
}
