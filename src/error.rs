use camino::Utf8PathBuf;
use thiserror::Error;

/// Failures of the path resolver.
#[derive(Debug, Error)]
pub enum PathError {
    #[error("could not determine the home directory for `{0}`")]
    HomeDir(String),
    #[error("could not determine the current directory")]
    CurrentDir(#[source] std::io::Error),
    #[error("path is not valid UTF-8: {0}")]
    NotUtf8(String),
    #[error("creating {path}")]
    Create {
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors surfaced by [`crate::Logger`].
///
/// `Open` and `Fatal` are both meant to end the program; the caller's
/// top-level driver decides how.
#[derive(Debug, Error)]
pub enum LogError {
    #[error(transparent)]
    Path(#[from] PathError),
    #[error("cannot open {path} for writing")]
    Open {
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{message}")]
    Fatal { message: String },
}

impl LogError {
    pub fn is_fatal(&self) -> bool {
        matches!(self, LogError::Fatal { .. })
    }
}
