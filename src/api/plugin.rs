//! Plugin trait and event subscriptions

use super::events::{Event, EventKind};
use super::{ApiError, Host};

/// Event kinds a loaded plugin receives
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Subscriptions {
    kinds: Vec<EventKind>,
}

impl Subscriptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe to an event kind. Returns false if already subscribed.
    pub fn register(&mut self, kind: EventKind) -> bool {
        if self.kinds.contains(&kind) {
            return false;
        }
        self.kinds.push(kind);
        true
    }

    /// Drop every subscription
    pub fn flush(&mut self) {
        self.kinds.clear();
    }

    pub fn contains(&self, kind: EventKind) -> bool {
        self.kinds.contains(&kind)
    }
}

/// A server-side extension loaded by the host
pub trait Plugin {
    fn name(&self) -> &str;

    /// Called once at load. Registers flags and variables and subscribes to
    /// events.
    fn init(
        &mut self,
        host: &dyn Host,
        config: &str,
        events: &mut Subscriptions,
    ) -> Result<(), ApiError>;

    /// Handle one subscribed event. Handlers may mutate the event's
    /// writable fields and must not fail.
    fn event(&self, host: &dyn Host, event: &mut Event);

    /// Called once at unload
    fn cleanup(&mut self, _host: &dyn Host, events: &mut Subscriptions) {
        events.flush();
    }
}
