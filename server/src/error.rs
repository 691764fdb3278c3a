use std::io;
use thiserror::Error;

/// Faults that stop the server itself
///
/// Per-connection transport faults never surface here: they end only the
/// connection they happened on.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: io::Error,
    },
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}
