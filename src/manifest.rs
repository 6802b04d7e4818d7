//! Small filesystem helpers used to make split runs resumable.

use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use log::debug;

use crate::Error;

/// Name of the unit list written inside a split output directory.
pub const MANIFEST_NAME: &str = "split_list";

/// Name of the marker file signalling a completed split run.
pub const DONE_MARKER_NAME: &str = "split_done";

/// Create a directory (and its parents) if missing and return its absolute path.
pub fn ensure_dir<P: AsRef<Path>>(path: P) -> Result<PathBuf, Error> {
    let path = std::path::absolute(path.as_ref())?;
    if path.is_dir() {
        debug!("mkdir {path:?}, already exists");
    } else {
        debug!("mkdir {path:?}");
        fs::create_dir_all(&path)?;
    }
    Ok(path)
}

/// Read the entries of a list file, skipping blank lines and `#` comments.
pub fn read_list<P: AsRef<Path>>(path: P) -> Result<Vec<String>, Error> {
    let reader = BufReader::new(File::open(path)?);
    let mut entries = Vec::new();
    for line in reader.lines() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        entries.push(line.to_string());
    }
    Ok(entries)
}

/// Write one entry per line.
pub fn write_list<P: AsRef<Path>, S: AsRef<str>>(path: P, entries: &[S]) -> Result<(), Error> {
    let mut writer = BufWriter::new(File::create(path)?);
    for entry in entries {
        writeln!(writer, "{}", entry.as_ref())?;
    }
    writer.flush()?;
    Ok(())
}

/// Create an empty file, or bump the modification time of an existing one.
pub fn touch<P: AsRef<Path>>(path: P) -> Result<(), Error> {
    let path = path.as_ref();
    let file = OpenOptions::new().create(true).append(true).open(path)?;
    file.set_modified(std::time::SystemTime::now())?;
    debug!("touch {path:?}");
    Ok(())
}
