//! Identifiers, teams, flags and player records shared with the host

use std::fmt;

use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Player slot id assigned by the host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(pub u32);

impl PlayerId {
    /// Placeholder shooter the host credits server-fired shots to
    pub const SERVER: PlayerId = PlayerId(253);
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Host-assigned unique identifier of a live shot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ShotGuid(pub u32);

impl fmt::Display for ShotGuid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Per-shooter shot number, as carried by death events
pub type LocalShotId = u16;

/// Team colors known to the host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TeamColor {
    Rogue,
    Red,
    Green,
    Blue,
    Purple,
    Observer,
    Rabbit,
    Hunter,
    /// Returned for players the host does not know
    #[default]
    NoTeam,
}

/// Whether holding a flag helps or hurts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlagQuality {
    Good,
    Bad,
}

/// A pickup flag as registered with the host
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlagDefinition {
    /// Short tag, e.g. "VV"
    pub abbrev: String,
    pub name: String,
    pub help: String,
    /// Shot-type bits; 0 keeps the normal shot
    pub shot_flags: u32,
    pub quality: FlagQuality,
}

impl FlagDefinition {
    /// The label a player record reports while the flag is held,
    /// e.g. "Vertical Velocity (+VV)"
    pub fn label(&self) -> String {
        format!("{} (+{})", self.name, self.abbrev)
    }
}

/// Last known motion of a player
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PlayerState {
    /// Facing angle in radians
    pub rotation: f32,
    pub position: Vec3,
    pub velocity: Vec3,
}

/// Read-only snapshot of a connected player
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerRecord {
    pub id: PlayerId,
    pub callsign: String,
    pub team: TeamColor,
    /// Label of the held flag, if any
    pub current_flag: Option<String>,
    pub state: PlayerState,
}

/// Spawn request for a projectile fired by the server on a plugin's behalf
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerShot {
    /// Flag abbreviation the shot behaves as
    pub shot_type: String,
    pub position: Vec3,
    pub velocity: Vec3,
    pub team: TeamColor,
    pub owner: PlayerId,
}
