//! Error types for the library crate

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while reading or writing a local mirror
#[derive(Error, Debug)]
pub enum Error {
    /// Failed to read a file or directory of the mirror
    #[error("failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to write an entity blob
    #[error("failed to write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The properties record lacks a required key
    #[error("{} does not define '{key}'", .path.display())]
    MissingProperty { path: PathBuf, key: &'static str },

    /// No mirror under the root records the URL
    #[error("no library under {} records url {url}", .root.display())]
    UnknownUrl { root: PathBuf, url: String },

    /// Entity names map to single files inside a collection
    #[error("invalid entity name: '{0}'")]
    InvalidEntityName(String),
}

/// Result type for library operations
pub type Result<T> = std::result::Result<T, Error>;
