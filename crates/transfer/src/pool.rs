//! Executor pool.
//!
//! Keeps one authenticated channel per host so repeated commands against the
//! same instance skip reconnecting. Each host owns a slot, created under a
//! short write lock on the map; the connection itself is opened holding only
//! that slot's lock. Concurrent callers for a new host serialize on creation
//! and end up sharing a single channel, while commands to other hosts go
//! ahead. Failed connections are not cached; the next command retries.

use crate::backend::{Channel, Connector};
use crate::destination::Destination;
use crate::error::Result;
use crate::response::{FAILURE_CODE, Response};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError, RwLock};

/// Channel of one host, empty until a connection succeeds.
type Slot = Mutex<Option<Arc<dyn Channel>>>;

/// Pool of channels keyed by host.
pub struct ExecutorPool {
    connector: Box<dyn Connector>,
    slots: RwLock<HashMap<String, Arc<Slot>>>,
}

impl ExecutorPool {
    pub fn new(connector: impl Connector + 'static) -> Self {
        Self {
            connector: Box::new(connector),
            slots: RwLock::new(HashMap::new()),
        }
    }

    /// Run `command` for `entity` on the destination's host.
    ///
    /// Never fails: connection and execution errors come back as a response
    /// with a non-zero return code and the error text on stderr.
    pub fn execute(
        &self,
        destination: &Destination,
        payload: &str,
        command: &str,
        entity: &str,
    ) -> Response {
        let host = destination.host();

        let result = self
            .channel(host)
            .and_then(|channel| channel.invoke(command, entity, payload));

        match result {
            Ok(output) => {
                if !output.succeeded() {
                    log::debug!(
                        "{} {} on {} exited with {}",
                        command,
                        entity,
                        host,
                        output.code
                    );
                }
                output.into()
            }
            Err(e) => {
                log::warn!("{} {} on {} failed: {}", command, entity, host, e);
                Response::failure(FAILURE_CODE, e.to_string())
            }
        }
    }

    /// Number of live channels.
    pub fn channel_count(&self) -> usize {
        self.slots
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .filter(|slot| slot.lock().unwrap_or_else(PoisonError::into_inner).is_some())
            .count()
    }

    fn slot(&self, host: &str) -> Arc<Slot> {
        {
            let slots = self.slots.read().unwrap_or_else(PoisonError::into_inner);
            if let Some(slot) = slots.get(host) {
                return Arc::clone(slot);
            }
        }

        let mut slots = self.slots.write().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(slots.entry(host.to_string()).or_default())
    }

    fn channel(&self, host: &str) -> Result<Arc<dyn Channel>> {
        let slot = self.slot(host);
        let mut channel = slot.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(channel) = channel.as_ref() {
            log::trace!("Reusing channel to {}", host);
            return Ok(Arc::clone(channel));
        }

        log::debug!("Opening channel to {}", host);
        let opened = self.connector.connect(host)?;
        *channel = Some(Arc::clone(&opened));
        Ok(opened)
    }
}
