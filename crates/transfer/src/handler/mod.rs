//! Transfer handlers.
//!
//! One [`Handler`] drives a single entity kind through the executor pool:
//!
//! - [`Handler::clone_entity`] - remote to remote (`get`, fixup, `update` or `create`)
//! - [`Handler::download`] - remote to local library
//! - [`Handler::update`] - local library to remote
//! - [`Handler::delete`] - remove remote entities
//! - [`pull`] - refresh every job of one local library
//!
//! Argument-count and missing-library checks, plus address resolution, happen
//! before the first remote call and fail the whole invocation. Everything
//! after that is recorded per entity in the returned [`Response`].

mod clone;
mod delete;
mod download;
mod pull;
mod update;

pub use pull::{PullPlan, plan_pull, pull};

use crate::destination::{Destination, Resolver};
use crate::error::{Error, Result};
use crate::kind::Kind;
use crate::pool::ExecutorPool;
use crate::response::{LOCAL_FAILURE_CODE, Response};
use library::LibraryRoot;
use std::path::PathBuf;

/// Flags carried by one invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransferFlags {
    /// Lenient address resolution
    pub force: bool,
    /// Skip the final mutating step
    pub dry_run: bool,
    /// Root directory of the local library
    pub local_library: Option<PathBuf>,
}

impl TransferFlags {
    /// Local library root, or [`Error::MissingLocalLibrary`].
    pub fn library_root(&self) -> Result<LibraryRoot> {
        match &self.local_library {
            Some(path) if !path.as_os_str().is_empty() => Ok(LibraryRoot::new(path)),
            _ => Err(Error::MissingLocalLibrary),
        }
    }
}

/// Orchestrates transfers of one entity kind.
pub struct Handler<'a> {
    pool: &'a ExecutorPool,
    kind: Kind,
    flags: &'a TransferFlags,
}

impl<'a> Handler<'a> {
    pub fn new(pool: &'a ExecutorPool, kind: Kind, flags: &'a TransferFlags) -> Self {
        Self { pool, kind, flags }
    }

    pub fn kind(&self) -> Kind {
        self.kind
    }

    fn resolver(&self) -> Resolver {
        Resolver::new(self.kind).lenient(self.flags.force)
    }

    /// Fetch the configuration of `source`.
    fn fetch(&self, source: &Destination) -> Response {
        self.pool
            .execute(source, "", self.kind.get_command(), source.entity())
    }
}

fn check_arguments(
    operation: String,
    args: &[String],
    expected: &'static str,
    ok: bool,
) -> Result<()> {
    if ok {
        Ok(())
    } else {
        Err(Error::InsufficientArguments {
            operation,
            expected,
            actual: args.len(),
        })
    }
}

fn local_failure(error: impl Into<Error>) -> Response {
    let error = error.into();
    log::warn!("{}", error);
    Response::failure(LOCAL_FAILURE_CODE, error.to_string())
}
