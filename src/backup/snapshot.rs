//! Consistent database snapshot through the sqlite3 CLI.
//!
//! The live database may be open for writes, so a raw file copy could
//! capture a torn write. The sqlite3 binary's `.backup` dot-command
//! produces a point-in-time consistent export instead.

use crate::backup::error::{Error, Result};

use tracing::debug;

use std::ffi::OsString;
use std::io;
use std::path::Path;
use std::process::Command;

/// Exit status and captured stderr of one finished external command.
#[derive(Debug)]
pub struct CommandOutput {
    pub code: Option<i32>,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

/// Runs an external command to completion, capturing its output.
///
/// The snapshot step depends only on this seam, so tests substitute a
/// fake instead of spawning a real sqlite3 process.
pub trait CommandRunner {
    fn run(&self, program: &Path, args: &[OsString]) -> io::Result<CommandOutput>;
}

/// Spawns through [`std::process::Command`], blocking until exit.
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&self, program: &Path, args: &[OsString]) -> io::Result<CommandOutput> {
        let output = Command::new(program).args(args).output()?;
        Ok(CommandOutput {
            code: output.status.code(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

/// Exports `src_db` to `dst_db` with `sqlite3 <src_db> ".backup <dst_db>"`.
///
/// A non-zero exit is reported as [`Error::Snapshot`] carrying the exit
/// code and captured stderr; the caller decides what happens to the
/// staging area (it is deliberately kept).
pub fn snapshot_database(
    runner: &dyn CommandRunner,
    sqlite3_bin: &Path,
    src_db: &Path,
    dst_db: &Path,
) -> Result<()> {
    let dot_command = format!(".backup {}", dst_db.display());
    debug!(
        "Snapshotting {:?} with {:?} {:?}",
        src_db, sqlite3_bin, dot_command
    );

    let output = runner.run(
        sqlite3_bin,
        &[src_db.as_os_str().to_owned(), dot_command.into()],
    )?;
    if !output.success() {
        return Err(Error::Snapshot {
            code: output.code,
            stderr: output.stderr,
        });
    }

    Ok(())
}
