use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while building an object library or rendering a diagram
#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid path data in object `{name}`: {message}")]
    PathData { name: String, message: String },

    #[error("invalid object source `{name}`: {message}")]
    ObjectSource { name: String, message: String },

    #[error("failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, Error>;
