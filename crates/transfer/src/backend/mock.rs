//! In-memory connector for tests.

use crate::backend::{Channel, CommandOutput, Connector};
use crate::error::{Error, Result};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, PoisonError};

/// Exit code reported for `get-*` commands nobody scripted.
pub const NOT_FOUND_CODE: i32 = 3;

/// One recorded remote command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Call {
    pub host: String,
    pub command: String,
    pub entity: String,
    pub payload: String,
}

#[derive(Debug, Default)]
struct State {
    responses: Mutex<HashMap<(String, String, String), CommandOutput>>,
    unreachable: Mutex<HashSet<String>>,
    connections: Mutex<Vec<String>>,
    calls: Mutex<Vec<Call>>,
}

/// Connector answering from scripted responses.
///
/// Unscripted `get-*` commands fail with [`NOT_FOUND_CODE`]; every other
/// unscripted command succeeds with empty output. Clones share state.
#[derive(Debug, Clone, Default)]
pub struct MockConnector {
    state: Arc<State>,
}

impl MockConnector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Script the output of `command` for `entity` on `host`.
    pub fn respond(&self, host: &str, command: &str, entity: &str, output: CommandOutput) {
        lock(&self.state.responses).insert(
            (host.to_string(), command.to_string(), entity.to_string()),
            output,
        );
    }

    /// Script a successful command printing `stdout`.
    pub fn respond_ok(&self, host: &str, command: &str, entity: &str, stdout: &str) {
        self.respond(host, command, entity, CommandOutput::success(stdout));
    }

    /// Make connecting to `host` fail.
    pub fn unreachable(&self, host: &str) {
        lock(&self.state.unreachable).insert(host.to_string());
    }

    /// Hosts connected to, in order.
    pub fn connections(&self) -> Vec<String> {
        lock(&self.state.connections).clone()
    }

    /// Every command invoked, in order.
    pub fn calls(&self) -> Vec<Call> {
        lock(&self.state.calls).clone()
    }

    /// Commands invoked with the given name, in order.
    pub fn calls_to(&self, command: &str) -> Vec<Call> {
        self.calls()
            .into_iter()
            .filter(|c| c.command == command)
            .collect()
    }
}

impl Connector for MockConnector {
    fn connect(&self, host: &str) -> Result<Arc<dyn Channel>> {
        lock(&self.state.connections).push(host.to_string());

        if lock(&self.state.unreachable).contains(host) {
            return Err(Error::Connection {
                host: host.to_string(),
                message: "connection refused".to_string(),
            });
        }

        Ok(Arc::new(MockChannel {
            host: host.to_string(),
            state: Arc::clone(&self.state),
        }))
    }
}

struct MockChannel {
    host: String,
    state: Arc<State>,
}

impl Channel for MockChannel {
    fn invoke(&self, command: &str, entity: &str, payload: &str) -> Result<CommandOutput> {
        lock(&self.state.calls).push(Call {
            host: self.host.clone(),
            command: command.to_string(),
            entity: entity.to_string(),
            payload: payload.to_string(),
        });

        let key = (self.host.clone(), command.to_string(), entity.to_string());
        if let Some(output) = lock(&self.state.responses).get(&key) {
            return Ok(output.clone());
        }

        if command.starts_with("get-") {
            return Ok(CommandOutput::failure(
                NOT_FOUND_CODE,
                format!("ERROR: No such item '{entity}'\n"),
            ));
        }

        Ok(CommandOutput::default())
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;

    const HOST: &str = "https://ci.example/";

    #[test]
    fn test_scripted_and_default_responses() {
        let mock = MockConnector::new();
        mock.respond_ok(HOST, "get-job", "build", "<project/>");
        let channel = mock.connect(HOST).unwrap();

        assert_eq!(
            channel.invoke("get-job", "build", "").unwrap().stdout,
            "<project/>"
        );
        assert_eq!(
            channel.invoke("get-job", "missing", "").unwrap().code,
            NOT_FOUND_CODE
        );
        assert!(channel.invoke("update-job", "build", "<x/>").unwrap().succeeded());
        assert_eq!(mock.calls().len(), 3);
        assert_eq!(mock.calls_to("update-job")[0].payload, "<x/>");
    }

    #[test]
    fn test_unreachable_host() {
        let mock = MockConnector::new();
        mock.unreachable(HOST);
        assert!(matches!(mock.connect(HOST), Err(Error::Connection { .. })));
        assert_eq!(mock.connections(), vec![HOST.to_string()]);
    }
}
