//! Atomic replacement of queue files.
//!
//! A queue file is rewritten whole on every change: the new contents go to a
//! hidden temporary file in the same directory, are synced, and then renamed
//! over the target, so a crash leaves either the old or the new queue.

use std::io::{self, Write};
use std::sync::atomic::{AtomicU64, Ordering};

use camino::Utf8Path;
use cap_std::fs::{Dir, OpenOptions};

use crate::error::SyncError;

static TEMP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Replace `file_name` in `dir` with `contents`.
pub(crate) fn write_atomic(dir: &Dir, file_name: &str, contents: &str) -> Result<(), SyncError> {
    let counter = TEMP_COUNTER.fetch_add(1, Ordering::Relaxed);
    let tmp_name = format!(".{file_name}.tmp.{}.{counter}", std::process::id());

    write_temp(dir, &tmp_name, contents).map_err(|error| storage_error(&tmp_name, &error))?;
    if let Err(error) = replace(dir, &tmp_name, file_name) {
        if dir.remove_file(&tmp_name).is_err() {
            // Leftover temp files are ignored on read.
        }
        return Err(storage_error(file_name, &error));
    }
    if dir.open(".").and_then(|parent| parent.sync_all()).is_err() {
        // Directory sync is best effort.
    }
    Ok(())
}

fn write_temp(dir: &Dir, tmp_name: &str, contents: &str) -> io::Result<()> {
    let mut options = OpenOptions::new();
    options.write(true).create_new(true);
    let mut file = dir.open_with(tmp_name, &options)?;
    let written = file
        .write_all(contents.as_bytes())
        .and_then(|()| file.sync_all());
    if written.is_err() {
        drop(file);
        drop(dir.remove_file(tmp_name));
    }
    written
}

#[cfg(windows)]
fn replace(dir: &Dir, tmp_name: &str, target_name: &str) -> io::Result<()> {
    match dir.remove_file(target_name) {
        Ok(()) => {}
        Err(err) if err.kind() == io::ErrorKind::NotFound => {}
        Err(err) => return Err(err),
    }
    dir.rename(tmp_name, dir, target_name)
}

#[cfg(not(windows))]
fn replace(dir: &Dir, tmp_name: &str, target_name: &str) -> io::Result<()> {
    dir.rename(tmp_name, dir, target_name)
}

pub(crate) fn storage_error(file_name: &str, error: &io::Error) -> SyncError {
    SyncError::Storage {
        path: Utf8Path::new(file_name).to_path_buf(),
        message: error.to_string(),
    }
}
