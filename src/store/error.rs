use std::path::PathBuf;

use thiserror::Error;

/// Failure of a JSON document store. Every variant names the file involved.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("cannot locate store directory: {0}")]
    Location(String),

    #[error("cannot create store directory {}: {source}", path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot read file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot write file {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot unmarshal file {}: {source}", path.display())]
    Unmarshal {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("cannot marshal document {name}: {source}")]
    Marshal {
        name: String,
        #[source]
        source: serde_json::Error,
    },
}
