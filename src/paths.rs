//! Resolution of user-supplied log file names into absolute, existing paths.

use std::fs::{self, OpenOptions};
use std::io;

use camino::{Utf8Path, Utf8PathBuf};
use tracing::debug;

use crate::error::PathError;

/// Where a logger's output goes.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Destination {
    /// The process's standard error stream.
    Console,
    /// Output is dropped.
    Discard,
    /// An absolute path to an existing file.
    File(Utf8PathBuf),
}

impl Destination {
    pub fn path(&self) -> Option<&Utf8Path> {
        match self {
            Destination::File(path) => Some(path.as_path()),
            _ => None,
        }
    }
}

/// Resolve `name` (relative to `dir`, or the current directory) into a
/// destination, creating the file and its parents when missing.
///
/// `None` selects the console and `Some("")` discards all output.
pub fn resolve(name: Option<&str>, dir: Option<&str>) -> Result<Destination, PathError> {
    let Some(name) = name else {
        return Ok(Destination::Console);
    };
    if name.is_empty() {
        return Ok(Destination::Discard);
    }

    let name = expand_home(name)?;
    let joined = if name.is_absolute() {
        name
    } else {
        let base = match dir {
            Some(dir) if !dir.is_empty() => absolute(expand_home(dir)?)?,
            _ => current_dir()?,
        };
        base.join(name)
    };
    let path = absolute(joined)?;

    if let Some(parent) = path.parent() {
        ensure_dir(parent)?;
    }
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .map_err(create_error(&path))?;

    let path = path.canonicalize_utf8().map_err(create_error(&path))?;
    debug!(%path, "resolved log destination");
    Ok(Destination::File(path))
}

/// Replace a leading `~` with the user's home directory.
pub fn expand_home(raw: &str) -> Result<Utf8PathBuf, PathError> {
    let rest = if raw == "~" {
        ""
    } else if let Some(rest) = raw.strip_prefix("~/") {
        rest
    } else {
        return Ok(Utf8PathBuf::from(raw));
    };

    let home = dirs::home_dir().ok_or_else(|| PathError::HomeDir(raw.to_owned()))?;
    let home = Utf8PathBuf::from_path_buf(home)
        .map_err(|p| PathError::NotUtf8(p.display().to_string()))?;
    if rest.is_empty() {
        Ok(home)
    } else {
        Ok(home.join(rest))
    }
}

/// Ensure a directory exists, creating it recursively if needed.
pub fn ensure_dir(path: &Utf8Path) -> Result<(), PathError> {
    if !path.exists() {
        fs::create_dir_all(path).map_err(create_error(path))?;
    }
    Ok(())
}

fn absolute(path: Utf8PathBuf) -> Result<Utf8PathBuf, PathError> {
    if path.is_absolute() {
        Ok(path)
    } else {
        Ok(current_dir()?.join(path))
    }
}

fn current_dir() -> Result<Utf8PathBuf, PathError> {
    let cwd = std::env::current_dir().map_err(PathError::CurrentDir)?;
    Utf8PathBuf::from_path_buf(cwd).map_err(|p| PathError::NotUtf8(p.display().to_string()))
}

fn create_error(path: &Utf8Path) -> impl FnOnce(io::Error) -> PathError + '_ {
    move |source| PathError::Create {
        path: path.to_owned(),
        source,
    }
}
