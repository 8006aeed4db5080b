//! Error types.
//!
//! Load failures are not errors here: they are a status of the source and
//! never leave it. These enums cover pool contract violations and
//! configuration problems.

use std::path::PathBuf;

use thiserror::Error;

use crate::dom::NodeId;

/// Misuse of the clone pool or of a source's clone handles.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PoolError {
    /// The node was never manufactured by this pool.
    #[error("node {0:?} is not a pooled clone")]
    UnknownClone(NodeId),

    /// The clone is sitting on a free list.
    #[error("clone {0:?} is not checked out")]
    NotCheckedOut(NodeId),

    /// The handle was already released or belongs to another source.
    #[error("clone handle {0} is not held by this source")]
    UnknownHandle(u64),
}

/// Errors that can occur when loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Error reading a configuration file.
    #[error("I/O error reading {path}: {error}")]
    Io {
        path: PathBuf,
        error: std::io::Error,
    },

    /// The TOML document could not be deserialized.
    #[error("config parse error: {0}")]
    Parse(#[from] toml::de::Error),

    /// A rule's `match` pattern is not a valid glob.
    #[error("invalid rule pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        source: globset::Error,
    },

    /// An option has a value outside its valid range.
    #[error("invalid value for '{option}': {reason}")]
    InvalidValue {
        option: &'static str,
        reason: String,
    },
}

/// Crate-level error.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Pool(#[from] PoolError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The layout pass of a render failed.
    #[error("layout failed: {0}")]
    Layout(#[from] taffy::TaffyError),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
