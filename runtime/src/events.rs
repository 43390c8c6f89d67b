//! Named lifecycle events.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde_json::Value;
use tracing::debug;

/// Event broadcast after every failed invocation.
pub const ERROR_EVENT: &str = "cmdError";

/// Subscribe/publish hub for named events.
pub trait EventHub {
    /// Declares an event name. Registering the same name again is a no-op.
    fn register(&mut self, name: &str);
    fn publish(&mut self, name: &str, payload: &Value);
}

type Listener = Box<dyn FnMut(&Value)>;

/// In-process hub. Keeps every published event for inspection.
#[derive(Default)]
pub struct LocalEventHub {
    registered: BTreeSet<String>,
    listeners: BTreeMap<String, Vec<Listener>>,
    published: Vec<(String, Value)>,
}

impl fmt::Debug for LocalEventHub {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocalEventHub")
            .field("registered", &self.registered)
            .field("listeners", &self.listeners.keys().collect::<Vec<_>>())
            .field("published", &self.published)
            .finish()
    }
}

impl LocalEventHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a listener called on every publish of `name`.
    pub fn on<F>(&mut self, name: &str, listener: F)
    where
        F: FnMut(&Value) + 'static,
    {
        self.listeners
            .entry(name.to_string())
            .or_default()
            .push(Box::new(listener));
    }

    pub fn is_registered(&self, name: &str) -> bool {
        self.registered.contains(name)
    }

    pub fn published(&self) -> &[(String, Value)] {
        &self.published
    }

    /// Payloads published under `name`, oldest first.
    pub fn payloads(&self, name: &str) -> Vec<&Value> {
        self.published
            .iter()
            .filter(|(event, _)| event == name)
            .map(|(_, payload)| payload)
            .collect()
    }
}

impl EventHub for LocalEventHub {
    fn register(&mut self, name: &str) {
        if self.registered.insert(name.to_string()) {
            debug!(event = name, "registered lifecycle event");
        }
    }

    fn publish(&mut self, name: &str, payload: &Value) {
        if let Some(listeners) = self.listeners.get_mut(name) {
            for listener in listeners.iter_mut() {
                listener(payload);
            }
        }
        self.published.push((name.to_string(), payload.clone()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn test_register_is_idempotent() {
        let mut hub = LocalEventHub::new();
        hub.register("deployed");
        hub.register("deployed");
        assert!(hub.is_registered("deployed"));
        assert_eq!(hub.registered.len(), 1);
    }

    #[test]
    fn test_publish_reaches_listeners() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);

        let mut hub = LocalEventHub::new();
        hub.on(ERROR_EVENT, move |payload| sink.borrow_mut().push(payload.clone()));
        hub.publish(ERROR_EVENT, &json!({ "name": "UsageError" }));
        hub.publish("other", &json!(1));

        assert_eq!(seen.borrow().len(), 1);
        assert_eq!(hub.payloads(ERROR_EVENT)[0]["name"], "UsageError");
        assert_eq!(hub.published().len(), 2);
    }
}
