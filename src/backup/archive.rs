//! Compresses a fully populated staging directory into a tar.bz2.

use crate::backup::error::Result;

use bzip2::write::BzEncoder;
use bzip2::Compression;
use tracing::debug;
use walkdir::WalkDir;

use std::fs;
use std::fs::File;
use std::io::{BufWriter, IntoInnerError, Write};
use std::path::{Path, PathBuf};

/// Archives the staging tree into `{staging}.tar.bz2` and returns the
/// archive path.
///
/// Entry paths are relative to the staging directory, so extraction
/// reproduces the original data-directory layout. The archive is
/// written to a `.tmp` sibling first and renamed into place once the
/// encoder has finished, so the final name only ever denotes a
/// complete archive. On failure the temp file is removed and the
/// staging directory is left alone.
pub fn archive_staging(staging: &Path, level: u32) -> Result<PathBuf> {
    let archive_path = path_with_suffix(staging, ".tar.bz2");
    let tmp_path = path_with_suffix(&archive_path, ".tmp");
    debug!("Archiving {:?} into {:?}", staging, archive_path);

    match write_archive(staging, &tmp_path, level) {
        Ok(()) => {
            fs::rename(&tmp_path, &archive_path)?;
            Ok(archive_path)
        }
        Err(e) => {
            let _ = fs::remove_file(&tmp_path);
            Err(e)
        }
    }
}

fn write_archive(staging: &Path, tmp_path: &Path, level: u32) -> Result<()> {
    let mut builder = File::create_new(tmp_path)
        .map(BufWriter::new)
        .map(|w| BzEncoder::new(w, Compression::new(level)))
        .map(BufWriter::new)
        .map(tar::Builder::new)?;
    builder.follow_symlinks(false);

    append_tree(&mut builder, staging)?;

    builder
        .into_inner()?
        .into_inner()
        .map_err(IntoInnerError::into_error)?
        .finish()?
        .into_inner()
        .map_err(IntoInnerError::into_error)?;

    Ok(())
}

fn append_tree<W: Write>(builder: &mut tar::Builder<W>, staging: &Path) -> Result<()> {
    for entry in WalkDir::new(staging).follow_links(false) {
        let entry = entry?;
        let rel = entry.path().strip_prefix(staging)?;
        if rel.as_os_str().is_empty() {
            continue;
        }
        builder.append_path_with_name(entry.path(), rel)?;
    }

    Ok(())
}

fn path_with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut s = path.as_os_str().to_os_string();
    s.push(suffix);
    PathBuf::from(s)
}
