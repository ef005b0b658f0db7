//! In-memory game server implementing the host API
//!
//! Keeps players, server variables, flags, live shots and their metadata.
//! It does not simulate motion or collisions: callers say which shot hit
//! whom through `kill_with_shot`.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use dashmap::DashMap;
use glam::Vec3;
use parking_lot::{Mutex, RwLock};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::api::{
    ApiError, Event, EventKind, FlagDefinition, FlagQuality, Host, LocalShotId, PlayerDieEvent,
    PlayerId, PlayerRecord, PlayerState, ServerShot, ShotFiredEvent, ShotGuid, ShotMetaData,
    TeamColor, MUZZLE_FRONT, MUZZLE_HEIGHT, SHOT_SPEED,
};

use super::dispatch::Dispatcher;

pub const DEFAULT_SHOT_SPEED: f64 = 100.0;
pub const DEFAULT_MUZZLE_FRONT: f64 = 4.42;
pub const DEFAULT_MUZZLE_HEIGHT: f64 = 1.57;

/// A metadata value attached to a shot
#[derive(Debug, Clone, PartialEq)]
pub enum MetaValue {
    Str(String),
    Int(u32),
}

/// A shot the host has spawned
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpawnedShot {
    pub guid: ShotGuid,
    /// Who the host credits a kill to unless a plugin says otherwise
    pub shooter: PlayerId,
    pub shot_id: LocalShotId,
    pub shot_type: String,
    pub position: Vec3,
    pub velocity: Vec3,
    pub team: TeamColor,
    pub owner: PlayerId,
}

/// Kill/death tally
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Score {
    pub kills: u32,
    pub deaths: u32,
}

#[derive(Debug, Clone)]
struct PlayerEntry {
    callsign: String,
    team: TeamColor,
    /// Abbreviation of the held flag
    flag: Option<String>,
    state: PlayerState,
    score: Score,
}

#[derive(Debug, Default)]
struct ShotTable {
    live: HashMap<ShotGuid, SpawnedShot>,
    by_shooter: HashMap<(PlayerId, LocalShotId), ShotGuid>,
    next_local: HashMap<PlayerId, LocalShotId>,
    history: Vec<SpawnedShot>,
    last_guid: u32,
}

/// Host backed by plain maps
pub struct InMemoryHost {
    players: RwLock<HashMap<PlayerId, PlayerEntry>>,
    variables: RwLock<HashMap<String, f64>>,
    flags: RwLock<HashMap<String, FlagDefinition>>,
    shots: Mutex<ShotTable>,
    metadata: DashMap<ShotGuid, HashMap<String, MetaValue>>,
    outstanding_records: AtomicUsize,
}

impl InMemoryHost {
    /// A host with the default world constants and a few built-in flags
    pub fn new() -> Self {
        let variables = HashMap::from([
            (SHOT_SPEED.to_string(), DEFAULT_SHOT_SPEED),
            (MUZZLE_FRONT.to_string(), DEFAULT_MUZZLE_FRONT),
            (MUZZLE_HEIGHT.to_string(), DEFAULT_MUZZLE_HEIGHT),
        ]);

        let flags: HashMap<String, FlagDefinition> = [
            ("GM", "Guided Missile", FlagQuality::Good),
            ("L", "Laser", FlagQuality::Good),
            ("SW", "Shock Wave", FlagQuality::Good),
            ("TR", "Trigger Happy", FlagQuality::Bad),
        ]
        .into_iter()
        .map(|(abbrev, name, quality)| {
            let flag = FlagDefinition {
                abbrev: abbrev.to_string(),
                name: name.to_string(),
                help: String::new(),
                shot_flags: 0,
                quality,
            };
            (flag.abbrev.clone(), flag)
        })
        .collect();

        Self {
            players: RwLock::new(HashMap::new()),
            variables: RwLock::new(variables),
            flags: RwLock::new(flags),
            shots: Mutex::new(ShotTable::default()),
            metadata: DashMap::new(),
            outstanding_records: AtomicUsize::new(0),
        }
    }

    pub fn add_player(
        &self,
        dispatcher: &Dispatcher,
        id: PlayerId,
        callsign: &str,
        team: TeamColor,
        state: PlayerState,
    ) -> Result<(), HostError> {
        {
            let mut players = self.players.write();
            if players.contains_key(&id) {
                return Err(HostError::DuplicatePlayer(id));
            }
            players.insert(
                id,
                PlayerEntry {
                    callsign: callsign.to_string(),
                    team,
                    flag: None,
                    state,
                    score: Score::default(),
                },
            );
        }

        info!(player_id = %id, callsign, ?team, "Player joined");
        dispatcher.dispatch(self, &mut Event::Other(EventKind::PlayerJoin));
        Ok(())
    }

    pub fn remove_player(&self, dispatcher: &Dispatcher, id: PlayerId) -> Result<(), HostError> {
        self.players
            .write()
            .remove(&id)
            .ok_or(HostError::UnknownPlayer(id))?;

        info!(player_id = %id, "Player left");
        dispatcher.dispatch(self, &mut Event::Other(EventKind::PlayerPart));
        Ok(())
    }

    pub fn set_team(&self, id: PlayerId, team: TeamColor) -> Result<(), HostError> {
        self.with_player(id, |p| p.team = team)
    }

    pub fn set_state(&self, id: PlayerId, state: PlayerState) -> Result<(), HostError> {
        self.with_player(id, |p| p.state = state)
    }

    /// Hand a registered flag to a player
    pub fn give_flag(
        &self,
        dispatcher: &Dispatcher,
        id: PlayerId,
        abbrev: &str,
    ) -> Result<(), HostError> {
        if !self.flags.read().contains_key(abbrev) {
            return Err(HostError::UnknownFlag(abbrev.to_string()));
        }
        self.with_player(id, |p| p.flag = Some(abbrev.to_string()))?;

        debug!(player_id = %id, flag = abbrev, "Flag grabbed");
        dispatcher.dispatch(self, &mut Event::Other(EventKind::FlagGrabbed));
        Ok(())
    }

    /// Take a player's flag away, returning its abbreviation
    pub fn drop_flag(
        &self,
        dispatcher: &Dispatcher,
        id: PlayerId,
    ) -> Result<Option<String>, HostError> {
        let mut dropped = None;
        self.with_player(id, |p| dropped = p.flag.take())?;

        if dropped.is_some() {
            dispatcher.dispatch(self, &mut Event::Other(EventKind::FlagDropped));
        }
        Ok(dropped)
    }

    pub fn callsign(&self, id: PlayerId) -> Option<String> {
        self.players.read().get(&id).map(|p| p.callsign.clone())
    }

    pub fn score(&self, id: PlayerId) -> Option<Score> {
        self.players.read().get(&id).map(|p| p.score)
    }

    /// Scores of every connected player, ordered by id
    pub fn scores(&self) -> Vec<(PlayerId, Score)> {
        let mut scores: Vec<(PlayerId, Score)> = self
            .players
            .read()
            .iter()
            .map(|(id, p)| (*id, p.score))
            .collect();
        scores.sort_by_key(|(id, _)| *id);
        scores
    }

    /// Player records handed out and not yet released
    pub fn outstanding_records(&self) -> usize {
        self.outstanding_records.load(Ordering::SeqCst)
    }

    fn with_player(
        &self,
        id: PlayerId,
        f: impl FnOnce(&mut PlayerEntry),
    ) -> Result<(), HostError> {
        let mut players = self.players.write();
        let player = players.get_mut(&id).ok_or(HostError::UnknownPlayer(id))?;
        f(player);
        Ok(())
    }

    /// Change a server variable, as an operator `/set` would
    pub fn set_double(&self, name: &str, value: f64) {
        self.variables.write().insert(name.to_string(), value);
    }

    pub fn flag_label(&self, abbrev: &str) -> Option<String> {
        self.flags.read().get(abbrev).map(FlagDefinition::label)
    }

    /// The player fires a normal shot. Records the shot and dispatches the
    /// fire event.
    pub fn fire(&self, dispatcher: &Dispatcher, id: PlayerId) -> Result<ShotGuid, HostError> {
        let (team, state, flag) = {
            let players = self.players.read();
            let player = players.get(&id).ok_or(HostError::UnknownPlayer(id))?;
            (player.team, player.state, player.flag.clone())
        };

        let shot_speed = self.get_double(SHOT_SPEED) as f32;
        let facing = Vec3::new(state.rotation.cos(), state.rotation.sin(), 0.0);
        let position = state.position
            + facing * self.get_double(MUZZLE_FRONT) as f32
            + Vec3::Z * self.get_double(MUZZLE_HEIGHT) as f32;
        let shot_type = flag.unwrap_or_default();

        let guid = self.record_shot(
            id,
            ServerShot {
                shot_type: shot_type.clone(),
                position,
                velocity: facing + state.velocity / shot_speed,
                team,
                owner: id,
            },
        );

        let mut event = Event::ShotFired(ShotFiredEvent {
            player_id: id,
            shot_type,
            position,
        });
        dispatcher.dispatch(self, &mut event);
        Ok(guid)
    }

    /// Resolve a hit: `guid` killed `victim`. Dispatches the death event,
    /// removes the shot and credits whoever the event names after dispatch.
    pub fn kill_with_shot(
        &self,
        dispatcher: &Dispatcher,
        victim: PlayerId,
        guid: ShotGuid,
    ) -> Result<PlayerDieEvent, HostError> {
        let shot = self
            .shots
            .lock()
            .live
            .get(&guid)
            .cloned()
            .ok_or(HostError::UnknownShot(guid))?;
        let victim_team = self
            .players
            .read()
            .get(&victim)
            .map(|p| p.team)
            .ok_or(HostError::UnknownPlayer(victim))?;

        let mut event = Event::PlayerDie(PlayerDieEvent {
            victim_id: victim,
            victim_team,
            killer_id: shot.shooter,
            killer_team: shot.team,
            shot_id: Some(shot.shot_id),
            flag_killed_with: (!shot.shot_type.is_empty()).then(|| shot.shot_type.clone()),
        });
        dispatcher.dispatch(self, &mut event);

        let died = match event {
            Event::PlayerDie(died) => died,
            other => {
                warn!(kind = ?other.kind(), "Death event replaced during dispatch");
                return Err(HostError::EventReplaced(other.kind()));
            }
        };

        self.remove_shot(guid);

        {
            let mut players = self.players.write();
            if let Some(entry) = players.get_mut(&victim) {
                entry.score.deaths += 1;
                entry.flag = None;
            }
            if died.killer_id != victim {
                if let Some(entry) = players.get_mut(&died.killer_id) {
                    entry.score.kills += 1;
                }
            }
        }

        info!(
            victim_id = %victim,
            killer_id = %died.killer_id,
            killer_team = ?died.killer_team,
            "Player killed"
        );
        Ok(died)
    }

    /// Every shot spawned so far, in spawn order
    pub fn spawned_shots(&self) -> Vec<SpawnedShot> {
        self.shots.lock().history.clone()
    }

    pub fn live_shots(&self) -> usize {
        self.shots.lock().live.len()
    }

    /// Expire a shot; its metadata goes with it
    pub fn remove_shot(&self, guid: ShotGuid) -> bool {
        let removed = {
            let mut shots = self.shots.lock();
            match shots.live.remove(&guid) {
                Some(shot) => {
                    shots.by_shooter.remove(&(shot.shooter, shot.shot_id));
                    true
                }
                None => false,
            }
        };
        self.metadata.remove(&guid);
        removed
    }

    fn record_shot(&self, shooter: PlayerId, request: ServerShot) -> ShotGuid {
        let mut shots = self.shots.lock();

        shots.last_guid += 1;
        let guid = ShotGuid(shots.last_guid);

        let next = shots.next_local.entry(shooter).or_insert(0);
        let shot_id = *next;
        *next = next.wrapping_add(1);

        let shot = SpawnedShot {
            guid,
            shooter,
            shot_id,
            shot_type: request.shot_type,
            position: request.position,
            velocity: request.velocity,
            team: request.team,
            owner: request.owner,
        };

        shots.by_shooter.insert((shooter, shot_id), guid);
        shots.history.push(shot.clone());
        shots.live.insert(guid, shot);
        guid
    }

    fn is_live(&self, guid: ShotGuid) -> bool {
        self.shots.lock().live.contains_key(&guid)
    }

    fn set_meta(&self, guid: ShotGuid, key: &str, value: MetaValue) -> bool {
        if !self.is_live(guid) {
            return false;
        }
        self.metadata
            .entry(guid)
            .or_default()
            .insert(key.to_string(), value);
        true
    }
}

impl Default for InMemoryHost {
    fn default() -> Self {
        Self::new()
    }
}

impl ShotMetaData for InMemoryHost {
    fn set_shot_meta_str(&self, guid: ShotGuid, key: &str, value: &str) -> bool {
        self.set_meta(guid, key, MetaValue::Str(value.to_string()))
    }

    fn set_shot_meta_int(&self, guid: ShotGuid, key: &str, value: u32) -> bool {
        self.set_meta(guid, key, MetaValue::Int(value))
    }

    fn shot_has_meta(&self, guid: ShotGuid, key: &str) -> bool {
        self.metadata
            .get(&guid)
            .is_some_and(|meta| meta.contains_key(key))
    }

    fn shot_meta_str(&self, guid: ShotGuid, key: &str) -> Option<String> {
        match self.metadata.get(&guid)?.get(key)? {
            MetaValue::Str(value) => Some(value.clone()),
            MetaValue::Int(value) => Some(value.to_string()),
        }
    }

    fn shot_meta_int(&self, guid: ShotGuid, key: &str) -> Option<u32> {
        match self.metadata.get(&guid)?.get(key)? {
            MetaValue::Int(value) => Some(*value),
            MetaValue::Str(value) => value.parse().ok(),
        }
    }
}

impl Host for InMemoryHost {
    fn register_custom_flag(&self, flag: &FlagDefinition) -> Result<(), ApiError> {
        let abbrev = &flag.abbrev;
        let well_formed = !abbrev.is_empty()
            && abbrev.len() <= 2
            && abbrev.chars().all(|c| c.is_ascii_alphanumeric());
        if !well_formed {
            return Err(ApiError::InvalidFlag(abbrev.clone()));
        }

        let mut flags = self.flags.write();
        if flags.contains_key(abbrev) {
            return Err(ApiError::DuplicateFlag(abbrev.clone()));
        }
        flags.insert(abbrev.clone(), flag.clone());
        Ok(())
    }

    fn register_custom_double(&self, name: &str, default: f64) -> Result<(), ApiError> {
        let mut variables = self.variables.write();
        if variables.contains_key(name) {
            return Err(ApiError::DuplicateVariable(name.to_string()));
        }
        variables.insert(name.to_string(), default);
        Ok(())
    }

    fn get_double(&self, name: &str) -> f64 {
        self.variables.read().get(name).copied().unwrap_or(0.0)
    }

    fn acquire_player_record(&self, id: PlayerId) -> Option<PlayerRecord> {
        let players = self.players.read();
        let player = players.get(&id)?;
        let current_flag = player
            .flag
            .as_deref()
            .and_then(|abbrev| self.flag_label(abbrev));

        self.outstanding_records.fetch_add(1, Ordering::SeqCst);
        Some(PlayerRecord {
            id,
            callsign: player.callsign.clone(),
            team: player.team,
            current_flag,
            state: player.state,
        })
    }

    fn release_player_record(&self, _id: PlayerId) {
        let released = self
            .outstanding_records
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1));
        debug_assert!(released.is_ok(), "player record released without acquire");
    }

    fn player_team(&self, id: PlayerId) -> TeamColor {
        self.players
            .read()
            .get(&id)
            .map(|p| p.team)
            .unwrap_or(TeamColor::NoTeam)
    }

    fn player_flag(&self, id: PlayerId) -> Option<String> {
        self.players.read().get(&id).and_then(|p| p.flag.clone())
    }

    fn fire_server_shot(&self, shot: &ServerShot) -> Option<ShotGuid> {
        if shot.shot_type.is_empty() {
            return None;
        }
        Some(self.record_shot(PlayerId::SERVER, shot.clone()))
    }

    fn shot_guid(&self, shooter: PlayerId, shot_id: LocalShotId) -> Option<ShotGuid> {
        self.shots
            .lock()
            .by_shooter
            .get(&(shooter, shot_id))
            .copied()
    }
}

/// In-memory host errors
#[derive(Debug, thiserror::Error)]
pub enum HostError {
    #[error("Unknown player: {0}")]
    UnknownPlayer(PlayerId),

    #[error("Player already connected: {0}")]
    DuplicatePlayer(PlayerId),

    #[error("Unknown flag: {0}")]
    UnknownFlag(String),

    #[error("Unknown or expired shot: {0}")]
    UnknownShot(ShotGuid),

    #[error("Event replaced during dispatch, now {0:?}")]
    EventReplaced(EventKind),
}
