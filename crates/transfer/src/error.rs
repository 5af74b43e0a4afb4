//! Error types for the transfer crate
//!
//! Only pre-flight faults travel as [`Error`]. Failures of a single entity
//! (remote command rejected, local blob unreadable) are recorded in the
//! [`Response`](crate::Response) so a batch keeps going.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by transfer operations
#[derive(Error, Debug)]
pub enum Error {
    /// Operation needs `--local-copy` but none was given
    #[error("you must specify the local library directory")]
    MissingLocalLibrary,

    /// Wrong number of positional arguments
    #[error("{operation}: expecting {expected} positional arguments, got {actual}")]
    InsufficientArguments {
        operation: String,
        expected: &'static str,
        actual: usize,
    },

    /// Address does not match the entity grammar
    #[error("unable to resolve '{0}' to an entity")]
    UnresolvedAddress(String),

    /// Local mirror could not be read or written
    #[error("local library: {0}")]
    LocalRead(#[from] library::Error),

    /// Remote channel could not be opened
    #[error("unable to connect to {host}: {message}")]
    Connection { host: String, message: String },

    /// Recipe could not be parsed or evaluated
    #[error("recipe {}: {message}", .path.display())]
    Recipe { path: PathBuf, message: String },

    /// Recipes include each other too deeply
    #[error("recipes nested deeper than {0} levels")]
    RecipeDepth(usize),

    /// Name not present in the command table
    #[error("unknown operation: '{0}'")]
    UnknownOperation(String),
}

impl Error {
    /// Returns true for faults caused by how the command was invoked.
    pub fn is_usage(&self) -> bool {
        matches!(
            self,
            Error::MissingLocalLibrary
                | Error::InsufficientArguments { .. }
                | Error::UnresolvedAddress(_)
                | Error::UnknownOperation(_)
        )
    }
}

/// Result type for transfer operations
pub type Result<T> = std::result::Result<T, Error>;
