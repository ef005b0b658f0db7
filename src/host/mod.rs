//! Host side: plugin dispatch and the in-memory game server

pub mod dispatch;
pub mod memory;

pub use dispatch::{Dispatcher, LoadError, PluginId};
pub use memory::{HostError, InMemoryHost, Score, SpawnedShot};
