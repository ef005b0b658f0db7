//! Replayable scenarios for the harness
//!
//! A scenario is a JSON document: server variable overrides, the players
//! present at start and an ordered list of steps.

use std::collections::BTreeMap;

use glam::Vec3;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::api::{PlayerId, PlayerState, ShotGuid, TeamColor};
use crate::host::{Dispatcher, HostError, InMemoryHost, LoadError, Score, SpawnedShot};
use crate::vv::VerticalVelocity;

/// A full scenario
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Scenario {
    /// Applied after the plugin has registered its own variables
    #[serde(default)]
    pub variables: BTreeMap<String, f64>,
    #[serde(default)]
    pub players: Vec<PlayerSetup>,
    #[serde(default)]
    pub steps: Vec<Step>,
}

/// A player present when the scenario starts
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerSetup {
    pub id: PlayerId,
    pub callsign: String,
    pub team: TeamColor,
    #[serde(default)]
    pub rotation: f32,
    #[serde(default)]
    pub position: Vec3,
    #[serde(default)]
    pub velocity: Vec3,
    /// Abbreviation of a flag held from the start
    #[serde(default)]
    pub flag: Option<String>,
}

/// One scripted action
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Step {
    /// Player fires a normal shot
    Fire { player: PlayerId },
    /// The shot at `shot` (index into all shots spawned so far) kills `victim`
    Kill { victim: PlayerId, shot: usize },
    SetTeam { player: PlayerId, team: TeamColor },
    GiveFlag { player: PlayerId, flag: String },
    DropFlag { player: PlayerId },
    Move {
        player: PlayerId,
        rotation: f32,
        position: Vec3,
        #[serde(default)]
        velocity: Vec3,
    },
    /// Player disconnects
    Leave { player: PlayerId },
    /// Change a server variable mid-scenario
    Set { name: String, value: f64 },
}

/// A resolved death
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeathRecord {
    pub victim: PlayerId,
    pub killer: PlayerId,
    pub killer_team: TeamColor,
    pub shot: ShotGuid,
}

/// Final scores of one player
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreLine {
    pub player: PlayerId,
    pub callsign: String,
    #[serde(flatten)]
    pub score: Score,
}

/// Outcome of a replay
#[derive(Debug, Clone, Serialize)]
pub struct ScenarioReport {
    pub plugins: Vec<String>,
    pub shots: Vec<SpawnedShot>,
    pub deaths: Vec<DeathRecord>,
    pub scores: Vec<ScoreLine>,
}

impl Scenario {
    pub fn from_json(text: &str) -> Result<Self, ScenarioError> {
        serde_json::from_str(text).map_err(ScenarioError::Parse)
    }

    /// Run the scenario against a fresh in-memory host with the Vertical
    /// Velocity plugin loaded
    pub fn replay(&self) -> Result<ScenarioReport, ScenarioError> {
        let host = InMemoryHost::new();
        let mut dispatcher = Dispatcher::new();
        dispatcher.load(Box::new(VerticalVelocity::new()), &host, "")?;

        for (name, value) in &self.variables {
            host.set_double(name, *value);
        }

        for setup in &self.players {
            let state = PlayerState {
                rotation: setup.rotation,
                position: setup.position,
                velocity: setup.velocity,
            };
            host.add_player(&dispatcher, setup.id, &setup.callsign, setup.team, state)?;
            if let Some(flag) = &setup.flag {
                host.give_flag(&dispatcher, setup.id, flag)?;
            }
        }

        let mut deaths = Vec::new();
        for (index, step) in self.steps.iter().enumerate() {
            info!(step = index, ?step, "Replaying step");
            if let Some(death) = run_step(&host, &dispatcher, step)? {
                deaths.push(death);
            }
        }

        let scores = host
            .scores()
            .into_iter()
            .map(|(player, score)| ScoreLine {
                player,
                callsign: host.callsign(player).unwrap_or_default(),
                score,
            })
            .collect();

        Ok(ScenarioReport {
            plugins: dispatcher.loaded().into_iter().map(str::to_string).collect(),
            shots: host.spawned_shots(),
            deaths,
            scores,
        })
    }
}

fn run_step(
    host: &InMemoryHost,
    dispatcher: &Dispatcher,
    step: &Step,
) -> Result<Option<DeathRecord>, ScenarioError> {
    match step {
        Step::Fire { player } => {
            host.fire(dispatcher, *player)?;
        }
        Step::Kill { victim, shot } => {
            let guid = host
                .spawned_shots()
                .get(*shot)
                .map(|s| s.guid)
                .ok_or(ScenarioError::UnknownShot(*shot))?;
            let died = host.kill_with_shot(dispatcher, *victim, guid)?;
            return Ok(Some(DeathRecord {
                victim: died.victim_id,
                killer: died.killer_id,
                killer_team: died.killer_team,
                shot: guid,
            }));
        }
        Step::SetTeam { player, team } => host.set_team(*player, *team)?,
        Step::GiveFlag { player, flag } => host.give_flag(dispatcher, *player, flag)?,
        Step::DropFlag { player } => {
            host.drop_flag(dispatcher, *player)?;
        }
        Step::Move {
            player,
            rotation,
            position,
            velocity,
        } => host.set_state(
            *player,
            PlayerState {
                rotation: *rotation,
                position: *position,
                velocity: *velocity,
            },
        )?,
        Step::Leave { player } => host.remove_player(dispatcher, *player)?,
        Step::Set { name, value } => host.set_double(name, *value),
    }
    Ok(None)
}

/// Scenario errors
#[derive(Debug, thiserror::Error)]
pub enum ScenarioError {
    #[error("Invalid scenario: {0}")]
    Parse(#[source] serde_json::Error),

    #[error("No shot at index {0}")]
    UnknownShot(usize),

    #[error(transparent)]
    Host(#[from] HostError),

    #[error(transparent)]
    Load(#[from] LoadError),
}

#[cfg(test)]
mod tests {
    use super::*;

    const TWO_PLAYERS: &str = r#"{
        "variables": { "_shotSpeed": 1.0, "_muzzleFront": 0.0, "_muzzleHeight": 0.0 },
        "players": [
            { "id": 1, "callsign": "alpha", "team": "red", "flag": "VV" },
            { "id": 2, "callsign": "bravo", "team": "blue", "position": [50.0, 0.0, 0.0] }
        ],
        "steps": [
            { "action": "fire", "player": 1 },
            { "action": "set_team", "player": 1, "team": "green" },
            { "action": "kill", "victim": 2, "shot": 1 }
        ]
    }"#;

    #[test]
    fn parses_tagged_steps() {
        let scenario = Scenario::from_json(TWO_PLAYERS).unwrap();

        assert_eq!(scenario.players.len(), 2);
        assert_eq!(scenario.players[1].position, Vec3::new(50.0, 0.0, 0.0));
        assert!(matches!(scenario.steps[0], Step::Fire { player: PlayerId(1) }));
        assert!(matches!(
            scenario.steps[1],
            Step::SetTeam {
                team: TeamColor::Green,
                ..
            }
        ));
    }

    #[test]
    fn side_shot_kill_goes_to_firer_on_new_team() {
        let report = Scenario::from_json(TWO_PLAYERS).unwrap().replay().unwrap();

        assert_eq!(report.plugins, vec!["Vertical Velocity Flag".to_string()]);
        // normal shot plus two side shots
        assert_eq!(report.shots.len(), 3);
        assert_eq!(report.shots[1].shooter, PlayerId::SERVER);
        assert_eq!(
            report.deaths,
            vec![DeathRecord {
                victim: PlayerId(2),
                killer: PlayerId(1),
                killer_team: TeamColor::Green,
                shot: report.shots[1].guid,
            }]
        );

        let alpha = &report.scores[0];
        assert_eq!(alpha.player, PlayerId(1));
        assert_eq!(alpha.score.kills, 1);
        assert_eq!(report.scores[1].score.deaths, 1);
    }

    #[test]
    fn set_and_leave_steps_apply_mid_replay() {
        let json = r#"{
            "players": [
                { "id": 1, "callsign": "alpha", "team": "red", "flag": "VV" },
                { "id": 2, "callsign": "bravo", "team": "blue" }
            ],
            "steps": [
                { "action": "set", "name": "_verticalVelocityWidth", "value": 5.0 },
                { "action": "fire", "player": 1 },
                { "action": "leave", "player": 1 },
                { "action": "kill", "victim": 2, "shot": 2 }
            ]
        }"#;
        let report = Scenario::from_json(json).unwrap().replay().unwrap();

        assert!((report.shots[1].position.y - 5.0).abs() < 1e-4);
        assert!((report.shots[2].position.y + 5.0).abs() < 1e-4);
        assert_eq!(report.deaths[0].killer, PlayerId(1));
        assert_eq!(report.deaths[0].killer_team, TeamColor::NoTeam);
        assert_eq!(report.scores.len(), 1);
        assert_eq!(report.scores[0].player, PlayerId(2));
    }

    #[test]
    fn bad_shot_index_is_an_error() {
        let scenario = Scenario {
            steps: vec![Step::Kill {
                victim: PlayerId(2),
                shot: 9,
            }],
            ..Default::default()
        };
        assert!(matches!(
            scenario.replay(),
            Err(ScenarioError::UnknownShot(9))
        ));
    }

    #[test]
    fn malformed_json_is_rejected() {
        assert!(matches!(
            Scenario::from_json("{\"steps\": [{\"action\": \"explode\"}]}"),
            Err(ScenarioError::Parse(_))
        ));
    }
}
