//! Vertical Velocity (+VV) - custom flag plugin for a multiplayer tank arena
//!
//! - `api`: the host API plugins are written against
//! - `vv`: the flag itself (side shot geometry, kill attribution)
//! - `host`: plugin dispatch and an in-memory host
//! - `scenario`: scripted replays for the harness binary

pub mod api;
pub mod config;
pub mod host;
pub mod registry;
pub mod scenario;
pub mod vv;

pub use vv::VerticalVelocity;
