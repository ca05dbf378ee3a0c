use std::path::{Path, PathBuf};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum RouteError {
    #[error("Failed to read pages directory {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Too many redirects navigating to {0}")]
    RedirectLoop(String),
}

impl RouteError {
    pub(crate) fn io(path: &Path, source: std::io::Error) -> Self {
        RouteError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}
