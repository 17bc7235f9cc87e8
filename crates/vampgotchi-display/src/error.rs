use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DisplayError {
    #[error("failed to write frame to {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("display driver error: {0}")]
    Driver(String),
}
