//! Storage for whole rule sets, keyed by rule-set name.

pub mod json;
pub mod repository;
pub mod sqlite;

use std::path::PathBuf;

use crate::rules::RuleError;

pub use json::JsonLibrary;
pub use repository::{RuleSetEntry, RuleSetRepository};
pub use sqlite::SqliteLibrary;

#[derive(Debug, thiserror::Error)]
pub enum LibraryError {
    #[error("failed to access {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed rule set document {}: {source}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// The document parsed but does not describe a valid rule set.
    #[error("invalid rule set: {0}")]
    Rules(#[from] RuleError),

    #[error("{0}")]
    InvalidData(String),

    #[error("no rule set named {0}")]
    NotFound(String),

    #[error("{0:?} is not a usable rule set name")]
    InvalidName(String),
}
