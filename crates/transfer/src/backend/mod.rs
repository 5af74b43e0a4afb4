//! Remote executor abstraction.
//!
//! A [`Connector`] opens an authenticated [`Channel`] to one Jenkins instance;
//! the channel runs named CLI commands (`get-job`, `update-view`, ...) against
//! a single entity, optionally feeding a configuration payload on stdin.
//!
//! - [`cli::JenkinsCliConnector`] drives the real `jenkins-cli.jar`
//! - [`mock::MockConnector`] answers from memory and records every call
//!
//! # Testing
//!
//! ```
//! use transfer::backend::{Channel, Connector, mock::MockConnector};
//!
//! let mock = MockConnector::new();
//! mock.respond_ok("https://ci.example/", "get-job", "build", "<project/>");
//!
//! let channel = mock.connect("https://ci.example/").unwrap();
//! let output = channel.invoke("get-job", "build", "").unwrap();
//! assert_eq!(output.stdout, "<project/>");
//! ```

pub mod cli;
pub mod mock;

use crate::error::Result;
use crate::response::Response;
use std::sync::Arc;

/// Captured result of one remote command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    pub code: i32,
}

impl CommandOutput {
    pub fn success(stdout: impl Into<String>) -> Self {
        Self {
            stdout: stdout.into(),
            stderr: String::new(),
            code: 0,
        }
    }

    pub fn failure(code: i32, stderr: impl Into<String>) -> Self {
        Self {
            stdout: String::new(),
            stderr: stderr.into(),
            code,
        }
    }

    pub fn succeeded(&self) -> bool {
        self.code == 0
    }
}

impl From<CommandOutput> for Response {
    fn from(output: CommandOutput) -> Self {
        Response::from_output(output.stdout, output.stderr, output.code)
    }
}

/// Open channel to one instance.
pub trait Channel: Send + Sync {
    /// Run `command` for `entity`. An empty `payload` sends nothing on stdin.
    ///
    /// `Err` is reserved for failures to run the command at all; a command
    /// that ran and failed reports its exit code in [`CommandOutput`].
    fn invoke(&self, command: &str, entity: &str, payload: &str) -> Result<CommandOutput>;
}

/// Factory for channels, called at most once per host by the pool.
pub trait Connector: Send + Sync {
    /// Open and authenticate a channel to `host` (always ends in `/`).
    fn connect(&self, host: &str) -> Result<Arc<dyn Channel>>;
}
