//! Command table and dispatch.
//!
//! Every operation the tool offers has a name in one flat table (`job`,
//! `download-view`, `pull`, `recipe`, ...). The command line and recipe steps
//! both go through [`Dispatcher::dispatch`] with a typed [`Invocation`].

use crate::error::{Error, Result};
use crate::handler::{Handler, TransferFlags, pull};
use crate::kind::Kind;
use crate::pool::ExecutorPool;
use crate::recipe::RecipeRunner;
use crate::response::Response;
use std::collections::BTreeMap;
use std::fmt;

/// Entry of the command table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// Remote to remote
    Clone(Kind),
    /// Remote to local library
    Download(Kind),
    /// Local library to remote
    Update(Kind),
    Delete(Kind),
    /// Refresh every job of a local library
    Pull,
    /// Run a recipe file
    Recipe,
}

impl Operation {
    /// The whole command table, in help order.
    pub fn all() -> Vec<Operation> {
        let mut all: Vec<Operation> = Kind::ALL.iter().map(|&k| Operation::Clone(k)).collect();
        all.extend(Kind::ALL.iter().map(|&k| Operation::Download(k)));
        all.extend(Kind::ALL.iter().map(|&k| Operation::Update(k)));
        all.extend(Kind::ALL.iter().map(|&k| Operation::Delete(k)));
        all.push(Operation::Pull);
        all.push(Operation::Recipe);
        all
    }

    pub fn name(self) -> &'static str {
        match self {
            Operation::Clone(kind) => kind.name(),
            Operation::Download(Kind::Job) => "download-job",
            Operation::Download(Kind::View) => "download-view",
            Operation::Download(Kind::Node) => "download-node",
            Operation::Update(kind) => kind.update_command(),
            Operation::Delete(kind) => kind.delete_command(),
            Operation::Pull => "pull",
            Operation::Recipe => "recipe",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::all().into_iter().find(|op| op.name() == name)
    }

    pub fn description(self) -> &'static str {
        match self {
            Operation::Clone(Kind::Job) => "Clone job from one instance to another",
            Operation::Clone(Kind::View) => "Clone view from one instance to another",
            Operation::Clone(Kind::Node) => "Clone node from one instance to another",
            Operation::Download(_) => "Save remote configurations into the local library",
            Operation::Update(_) => "Push configurations from the local library",
            Operation::Delete(_) => "Delete remote configurations",
            Operation::Pull => "Refresh every job of a local library",
            Operation::Recipe => "Evaluate migration recipe",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One call into the command table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub operation: Operation,
    /// Positional arguments
    pub args: Vec<String>,
    pub flags: TransferFlags,
    /// Recipe properties, inherited by nested recipes
    pub properties: BTreeMap<String, String>,
    /// Recipe nesting level; 0 for the command line
    pub depth: usize,
}

impl Invocation {
    pub fn new(operation: Operation, args: Vec<String>) -> Self {
        Self {
            operation,
            args,
            flags: TransferFlags::default(),
            properties: BTreeMap::new(),
            depth: 0,
        }
    }

    pub fn with_flags(mut self, flags: TransferFlags) -> Self {
        self.flags = flags;
        self
    }

    pub fn with_properties(mut self, properties: BTreeMap<String, String>) -> Self {
        self.properties = properties;
        self
    }
}

/// Runs invocations.
pub trait Dispatcher {
    /// Run one invocation.
    ///
    /// `Err` means the invocation was rejected before any remote call;
    /// everything else is reported in the [`Response`].
    fn dispatch(&self, invocation: &Invocation) -> Result<Response>;
}

/// Dispatcher backed by the transfer handlers.
pub struct TransferDispatcher<'a> {
    pool: &'a ExecutorPool,
}

impl<'a> TransferDispatcher<'a> {
    pub fn new(pool: &'a ExecutorPool) -> Self {
        Self { pool }
    }

    /// Look up `name` in the command table and dispatch it.
    pub fn dispatch_named(
        &self,
        name: &str,
        args: Vec<String>,
        flags: TransferFlags,
    ) -> Result<Response> {
        let operation =
            Operation::from_name(name).ok_or_else(|| Error::UnknownOperation(name.to_string()))?;
        self.dispatch(&Invocation::new(operation, args).with_flags(flags))
    }
}

impl Dispatcher for TransferDispatcher<'_> {
    fn dispatch(&self, invocation: &Invocation) -> Result<Response> {
        log::debug!(
            "Dispatching {} {:?} (dry run: {}, force: {})",
            invocation.operation,
            invocation.args,
            invocation.flags.dry_run,
            invocation.flags.force
        );

        let flags = &invocation.flags;
        let args = &invocation.args;
        match invocation.operation {
            Operation::Clone(kind) => Handler::new(self.pool, kind, flags).clone_entity(args),
            Operation::Download(kind) => Handler::new(self.pool, kind, flags).download(args),
            Operation::Update(kind) => Handler::new(self.pool, kind, flags).update(args),
            Operation::Delete(kind) => Handler::new(self.pool, kind, flags).delete(args),
            Operation::Pull => pull(self.pool, flags, args),
            Operation::Recipe => RecipeRunner::new(self).run(invocation),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::mock::MockConnector;
    use std::collections::HashSet;

    #[test]
    fn test_command_table_names_are_unique() {
        let all = Operation::all();
        assert_eq!(all.len(), 14);

        let names: HashSet<_> = all.iter().map(|op| op.name()).collect();
        assert_eq!(names.len(), all.len());

        for op in all {
            assert_eq!(Operation::from_name(op.name()), Some(op));
            assert!(!op.description().is_empty());
        }
    }

    #[test]
    fn test_table_names() {
        assert_eq!(Operation::Clone(Kind::Node).name(), "node");
        assert_eq!(Operation::Download(Kind::View).name(), "download-view");
        assert_eq!(Operation::Update(Kind::Job).name(), "update-job");
        assert_eq!(Operation::Delete(Kind::Node).name(), "delete-node");
        assert_eq!(Operation::from_name("get-job"), None);
    }

    #[test]
    fn test_dispatch_clone() {
        let mock = MockConnector::new();
        mock.respond_ok("https://a.example/", "get-job", "build", "<project/>");
        let pool = ExecutorPool::new(mock.clone());

        let response = TransferDispatcher::new(&pool)
            .dispatch_named(
                "job",
                vec![
                    "https://a.example/job/build".to_string(),
                    "https://b.example/job/build".to_string(),
                ],
                TransferFlags::default(),
            )
            .unwrap();

        assert!(response.succeeded());
        assert_eq!(mock.calls_to("update-job").len(), 1);
    }

    #[test]
    fn test_dispatch_unknown_name() {
        let pool = ExecutorPool::new(MockConnector::new());
        let result =
            TransferDispatcher::new(&pool).dispatch_named("rebuild", vec![], TransferFlags::default());
        assert!(matches!(result, Err(Error::UnknownOperation(name)) if name == "rebuild"));
    }
}
