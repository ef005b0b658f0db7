//! Event notifications the host dispatches to plugins

use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::types::{LocalShotId, PlayerId, TeamColor};

/// Event kinds a plugin can subscribe to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    ShotFired,
    PlayerDie,
    PlayerJoin,
    PlayerPart,
    FlagGrabbed,
    FlagDropped,
}

/// A player discharged their weapon
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShotFiredEvent {
    pub player_id: PlayerId,
    /// Abbreviation of the flag the shot was fired with, empty for a plain shot
    pub shot_type: String,
    pub position: Vec3,
}

/// A player was eliminated.
///
/// `killer_id` and `killer_team` are writable: whatever they hold after
/// dispatch is what the host credits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerDieEvent {
    pub victim_id: PlayerId,
    pub victim_team: TeamColor,
    pub killer_id: PlayerId,
    pub killer_team: TeamColor,
    /// None for deaths not caused by a shot
    pub shot_id: Option<LocalShotId>,
    pub flag_killed_with: Option<String>,
}

/// Notification passed to subscribed plugins
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    ShotFired(ShotFiredEvent),
    PlayerDie(PlayerDieEvent),
    /// Events that carry nothing a plugin here needs to read
    Other(EventKind),
}

impl Event {
    pub fn kind(&self) -> EventKind {
        match self {
            Event::ShotFired(_) => EventKind::ShotFired,
            Event::PlayerDie(_) => EventKind::PlayerDie,
            Event::Other(kind) => *kind,
        }
    }
}
