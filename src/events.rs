use std::sync::Mutex;

use event_emitter_rs::EventEmitter;
use serde::Serialize;
use tracing::warn;

pub const RESTAURANT_CREATED: &str = "RestaurantCreated";
pub const REVIEW_ADDED: &str = "ReviewAdded";
pub const REVIEW_REMOVED: &str = "ReviewRemoved";

/// In-process notifications fired after a composite write has fully completed.
///
/// Payloads are JSON strings; listeners run on the emitter's own threads.
///
/// # Example
///
/// ```ignore
/// service.on(REVIEW_ADDED, |payload| {
///     println!("review added: {}", payload);
/// });
/// ```
pub struct ServiceEvents {
    emitter: Mutex<EventEmitter>,
}

impl ServiceEvents {
    pub fn new() -> Self {
        Self {
            emitter: Mutex::new(EventEmitter::new()),
        }
    }

    /// Register a listener for an event type.
    pub fn on<F>(&self, event: &str, listener: F)
    where
        F: Fn(String) + Send + Sync + 'static,
    {
        match self.emitter.lock() {
            Ok(mut emitter) => {
                emitter.on(event, listener);
            }
            Err(_) => warn!(event, "event emitter poisoned; listener not registered"),
        }
    }

    /// Serialize `payload` and emit it.
    pub(crate) fn emit<T: Serialize>(&self, event: &str, payload: &T) {
        let data = match serde_json::to_string(payload) {
            Ok(data) => data,
            Err(err) => {
                warn!(event, error = %err, "event payload not serializable; dropped");
                return;
            }
        };
        match self.emitter.lock() {
            Ok(mut emitter) => {
                emitter.emit(event, data);
            }
            Err(_) => warn!(event, "event emitter poisoned; event dropped"),
        }
    }
}

impl Default for ServiceEvents {
    fn default() -> Self {
        Self::new()
    }
}
