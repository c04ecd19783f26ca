use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    WalkDir(#[from] walkdir::Error),
    #[error(transparent)]
    Glob(#[from] globset::Error),
    #[error(transparent)]
    Validation(#[from] validator::ValidationErrors),
    #[error(transparent)]
    SerdeYml(#[from] serde_yml::Error),
    #[error(transparent)]
    StripPrefix(#[from] std::path::StripPrefixError),
    /// A run must never reuse or merge into a pre-existing staging path.
    #[error("staging directory {0:?} already exists, inspect or remove it before retrying")]
    StagingExists(PathBuf),
    #[error("database snapshot command exited with code {code:?}:\n{stderr}")]
    Snapshot { code: Option<i32>, stderr: String },
}
