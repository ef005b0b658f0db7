//! Host API - the surface a plugin sees of the game server
//!
//! Everything a plugin reads or changes goes through the `Host` and
//! `ShotMetaData` traits. The host owns players, shots and their metadata;
//! each call is a single atomic operation.

pub mod events;
pub mod plugin;
pub mod record;
pub mod types;

pub use events::{Event, EventKind, PlayerDieEvent, ShotFiredEvent};
pub use plugin::{Plugin, Subscriptions};
pub use record::PlayerRecordGuard;
pub use types::{
    FlagDefinition, FlagQuality, LocalShotId, PlayerId, PlayerRecord, PlayerState, ServerShot,
    ShotGuid, TeamColor,
};

/// Server variable: shot speed in world units per second
pub const SHOT_SPEED: &str = "_shotSpeed";
/// Server variable: distance from tank center to muzzle along the facing
pub const MUZZLE_FRONT: &str = "_muzzleFront";
/// Server variable: muzzle height above the tank origin
pub const MUZZLE_HEIGHT: &str = "_muzzleHeight";

/// Key/value data the host keeps per live shot.
///
/// Entries disappear with the shot.
pub trait ShotMetaData {
    fn set_shot_meta_str(&self, guid: ShotGuid, key: &str, value: &str) -> bool;
    fn set_shot_meta_int(&self, guid: ShotGuid, key: &str, value: u32) -> bool;
    fn shot_has_meta(&self, guid: ShotGuid, key: &str) -> bool;
    fn shot_meta_str(&self, guid: ShotGuid, key: &str) -> Option<String>;
    fn shot_meta_int(&self, guid: ShotGuid, key: &str) -> Option<u32>;
}

/// Services the game server provides to plugins
pub trait Host: ShotMetaData {
    /// Register a custom pickup flag
    fn register_custom_flag(&self, flag: &FlagDefinition) -> Result<(), ApiError>;

    /// Register a custom server variable holding a double
    fn register_custom_double(&self, name: &str, default: f64) -> Result<(), ApiError>;

    /// Current value of a server variable (0.0 if unknown)
    fn get_double(&self, name: &str) -> f64;

    /// Prefer `PlayerRecordGuard::acquire`, which releases the record on drop
    fn acquire_player_record(&self, id: PlayerId) -> Option<PlayerRecord>;

    fn release_player_record(&self, id: PlayerId);

    /// Current team of a player, `TeamColor::NoTeam` if not connected
    fn player_team(&self, id: PlayerId) -> TeamColor;

    /// Abbreviation of the flag a player holds
    fn player_flag(&self, id: PlayerId) -> Option<String>;

    /// Spawn a projectile; None if the host refused
    fn fire_server_shot(&self, shot: &ServerShot) -> Option<ShotGuid>;

    /// Resolve a shooter's local shot number to the shot's GUID
    fn shot_guid(&self, shooter: PlayerId, shot_id: LocalShotId) -> Option<ShotGuid>;
}

/// Registration errors
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Flag already registered: {0}")]
    DuplicateFlag(String),

    #[error("Invalid flag abbreviation: {0:?}")]
    InvalidFlag(String),

    #[error("Server variable already registered: {0}")]
    DuplicateVariable(String),
}
