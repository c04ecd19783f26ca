//! Custom validator functions for config fields.

use sanitize_filename::{is_sanitized, sanitize};
use validator::ValidationError;

use std::path::Path;

pub fn validate_dir_exist<P: AsRef<Path>>(dir: P) -> Result<(), ValidationError> {
    let dir = dir.as_ref();
    match std::fs::metadata(dir) {
        Ok(md) if md.is_dir() => Ok(()),
        Ok(_) => Err(ValidationError::new("NotADirectory")
            .with_message(format!("expected a directory at {:?}", dir).into())),
        Err(e) => Err(ValidationError::new("MissingDirectory")
            .with_message(format!("cannot read {:?}: {}", dir, e).into())),
    }
}

pub fn validate_writable_dir<P: AsRef<Path>>(dir: P) -> Result<(), ValidationError> {
    let dir = dir.as_ref();
    if !dir.exists() {
        std::fs::create_dir_all(dir).map_err(|e| {
            ValidationError::new("UnwritableDirectory")
                .with_message(format!("creating {:?} failed: {}", dir, e).into())
        })?;
    }

    let md = std::fs::metadata(dir).map_err(|e| {
        ValidationError::new("UnwritableDirectory")
            .with_message(format!("cannot read {:?}: {}", dir, e).into())
    })?;
    if !md.is_dir() {
        return Err(ValidationError::new("NotADirectory")
            .with_message(format!("expected a directory at {:?}", dir).into()));
    }
    if md.permissions().readonly() {
        return Err(ValidationError::new("UnwritableDirectory")
            .with_message(format!("{:?} is read-only", dir).into()));
    }

    Ok(())
}

pub fn validate_bare_file_name<S: AsRef<str>>(name: S) -> Result<(), ValidationError> {
    let name = name.as_ref();
    if name.is_empty() || !is_sanitized(name) {
        return Err(ValidationError::new("InvalidFileName").with_message(
            format!(
                "{:?} must be a plain file name; something like {:?} would work",
                name,
                sanitize(name)
            )
            .into(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_validate_dir_exist() {
        let temp_dir = TempDir::new().unwrap();
        assert!(validate_dir_exist(temp_dir.path()).is_ok());
        assert!(validate_dir_exist(temp_dir.path().join("missing")).is_err());

        let file_path = temp_dir.path().join("file.txt");
        std::fs::write(&file_path, "content").unwrap();
        assert!(validate_dir_exist(&file_path).is_err());
    }

    #[test]
    fn test_validate_writable_dir_creates_missing() {
        let temp_dir = TempDir::new().unwrap();
        let nested = temp_dir.path().join("a/b");

        assert!(validate_writable_dir(&nested).is_ok());
        assert!(nested.is_dir());
    }

    #[test]
    fn test_validate_bare_file_name() {
        assert!(validate_bare_file_name("db.sqlite3").is_ok());
        assert!(validate_bare_file_name("a/b").is_err());
        assert!(validate_bare_file_name("").is_err());
    }
}
