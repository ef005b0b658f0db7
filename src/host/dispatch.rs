//! Plugin loading and sequential event dispatch

use tracing::{error, info};

use crate::api::{ApiError, Event, EventKind, Host, Plugin, Subscriptions};

/// Handle to a loaded plugin
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PluginId(usize);

struct LoadedPlugin {
    id: PluginId,
    plugin: Box<dyn Plugin>,
    events: Subscriptions,
}

/// Loaded plugins in load order
#[derive(Default)]
pub struct Dispatcher {
    plugins: Vec<LoadedPlugin>,
    next_id: usize,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a plugin and run its init. A plugin whose init fails is dropped
    /// without any subscriptions.
    pub fn load(
        &mut self,
        mut plugin: Box<dyn Plugin>,
        host: &dyn Host,
        config: &str,
    ) -> Result<PluginId, LoadError> {
        let mut events = Subscriptions::new();

        if let Err(source) = plugin.init(host, config, &mut events) {
            error!(plugin = plugin.name(), error = %source, "Plugin init failed");
            return Err(LoadError::Init {
                plugin: plugin.name().to_string(),
                source,
            });
        }

        let id = PluginId(self.next_id);
        self.next_id += 1;

        info!(plugin = plugin.name(), "Plugin loaded");
        self.plugins.push(LoadedPlugin { id, plugin, events });
        Ok(id)
    }

    /// Run the plugin's cleanup and remove it. Returns false if not loaded.
    pub fn unload(&mut self, id: PluginId, host: &dyn Host) -> bool {
        let Some(index) = self.plugins.iter().position(|p| p.id == id) else {
            return false;
        };

        let mut loaded = self.plugins.remove(index);
        loaded.plugin.cleanup(host, &mut loaded.events);

        info!(plugin = loaded.plugin.name(), "Plugin unloaded");
        true
    }

    /// Hand an event to every subscribed plugin in load order. Later
    /// plugins see changes made by earlier ones.
    pub fn dispatch(&self, host: &dyn Host, event: &mut Event) {
        let kind = event.kind();
        for loaded in &self.plugins {
            if loaded.events.contains(kind) {
                loaded.plugin.event(host, event);
            }
        }
    }

    pub fn is_subscribed(&self, id: PluginId, kind: EventKind) -> bool {
        self.plugins
            .iter()
            .any(|p| p.id == id && p.events.contains(kind))
    }

    /// Names of the loaded plugins
    pub fn loaded(&self) -> Vec<&str> {
        self.plugins.iter().map(|p| p.plugin.name()).collect()
    }
}

/// Plugin load errors
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("Plugin {plugin} failed to initialize: {source}")]
    Init {
        plugin: String,
        #[source]
        source: ApiError,
    },
}
