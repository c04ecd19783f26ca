//! Copies the auxiliary files of the data directory into staging.
//!
//! The database file and its journal/rotation siblings are excluded
//! here; they are replaced by the snapshot step's consistent export.

use crate::backup::error::Result;

use derive_more::{Display, From};
use getset::Getters;
use globset::{Glob, GlobBuilder, GlobSet};
use serde::de::Visitor;
use serde::{Deserialize, Deserializer, Serialize};
use tracing::{debug, trace};
use walkdir::WalkDir;

use std::fmt::Formatter;
use std::fs;
use std::path::Path;
use std::result;

/// A glob pattern excluded from the file copy.
///
/// Deserializes from a plain string with literal path separators, so
/// `*` never crosses a directory boundary. Patterns are matched against
/// the path relative to the data directory and against the bare file
/// name, so `db.sqlite3*` excludes database siblings at any depth.
#[derive(Clone, Debug, From, Display, Serialize, PartialEq, Eq, Getters)]
#[serde(transparent)]
#[getset(get = "pub")]
pub struct ExcludeGlob {
    glob: Glob,
}

struct ExcludeGlobVisitor;

impl Visitor<'_> for ExcludeGlobVisitor {
    type Value = ExcludeGlob;

    fn expecting(&self, formatter: &mut Formatter) -> std::fmt::Result {
        formatter.write_str("a glob pattern")
    }

    fn visit_str<E>(self, v: &str) -> result::Result<Self::Value, E>
    where
        E: serde::de::Error,
    {
        GlobBuilder::new(v)
            .literal_separator(true)
            .build()
            .map(ExcludeGlob::from)
            .map_err(serde::de::Error::custom)
    }
}

impl<'de> Deserialize<'de> for ExcludeGlob {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> result::Result<Self, D::Error> {
        deserializer.deserialize_str(ExcludeGlobVisitor)
    }
}

/// Recursively copies `src` into `dst`, skipping excluded entries.
///
/// Directory structure and symlinks are preserved; permissions ride
/// along with [`fs::copy`]. Merging into a `dst` that already contains
/// entries does not fail: directories are reused and files are
/// overwritten. Returns the number of files copied.
pub fn copy_tree(src: &Path, dst: &Path, excludes: &GlobSet) -> Result<u64> {
    debug!("Copying files from {:?} to {:?}", src, dst);

    let mut copied = 0;
    let walker = WalkDir::new(src)
        .follow_links(false)
        .into_iter()
        .filter_entry(|entry| !is_excluded(entry.path(), src, excludes));
    for entry in walker {
        let entry = entry?;
        let rel = entry.path().strip_prefix(src)?;
        if rel.as_os_str().is_empty() {
            continue;
        }

        let target = dst.join(rel);
        let file_type = entry.file_type();
        if file_type.is_dir() {
            fs::create_dir_all(&target)?;
        } else if file_type.is_symlink() {
            replicate_symlink(entry.path(), &target)?;
        } else {
            trace!("Copying {:?} -> {:?}", entry.path(), target);
            fs::copy(entry.path(), &target)?;
            copied += 1;
        }
    }

    debug!("Copied {} files", copied);
    Ok(copied)
}

fn is_excluded(path: &Path, base: &Path, excludes: &GlobSet) -> bool {
    let Ok(rel) = path.strip_prefix(base) else {
        return false;
    };
    if rel.as_os_str().is_empty() {
        return false;
    }

    excludes.is_match(rel)
        || path
            .file_name()
            .is_some_and(|name| excludes.is_match(Path::new(name)))
}

#[cfg(unix)]
fn replicate_symlink(src: &Path, dst: &Path) -> Result<()> {
    let link_target = fs::read_link(src)?;
    if dst.symlink_metadata().is_ok() {
        fs::remove_file(dst)?;
    }
    std::os::unix::fs::symlink(&link_target, dst)?;
    Ok(())
}

#[cfg(not(unix))]
fn replicate_symlink(src: &Path, dst: &Path) -> Result<()> {
    // No portable link re-creation here; copy what the link points at.
    fs::copy(src, dst)?;
    Ok(())
}
