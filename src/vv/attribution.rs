//! Kill attribution for side shots

use tracing::{debug, trace};

use crate::api::{Host, PlayerDieEvent, PlayerId};

use super::{FLAG_ABBREV, META_OWNER, META_TYPE};

/// Credit a kill made by a side shot to the player who fired it.
///
/// The killer team is looked up now rather than taken from spawn time, so a
/// team switch in between is reflected. Returns true if the event was
/// rewritten.
pub fn handle_player_die(host: &dyn Host, event: &mut PlayerDieEvent) -> bool {
    let Some(shot_id) = event.shot_id else {
        return false;
    };
    let Some(guid) = host.shot_guid(event.killer_id, shot_id) else {
        trace!(killer_id = %event.killer_id, shot_id, "Shot not tracked");
        return false;
    };

    if !host.shot_has_meta(guid, META_TYPE) || !host.shot_has_meta(guid, META_OWNER) {
        return false;
    }

    // Other plugins may tag shots with the same keys
    if host.shot_meta_str(guid, META_TYPE).as_deref() != Some(FLAG_ABBREV) {
        return false;
    }

    let Some(owner) = host.shot_meta_int(guid, META_OWNER) else {
        return false;
    };
    let owner = PlayerId(owner);

    debug!(
        guid = %guid,
        victim_id = %event.victim_id,
        from = %event.killer_id,
        to = %owner,
        "Crediting side shot kill"
    );

    event.killer_id = owner;
    event.killer_team = host.player_team(owner);
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{PlayerState, ServerShot, ShotGuid, ShotMetaData, TeamColor};
    use crate::host::{Dispatcher, InMemoryHost};
    use glam::Vec3;

    const SHOOTER: PlayerId = PlayerId(1);
    const VICTIM: PlayerId = PlayerId(2);

    fn host_with_players() -> (InMemoryHost, Dispatcher) {
        let host = InMemoryHost::new();
        let dispatcher = Dispatcher::new();
        host.add_player(&dispatcher, SHOOTER, "alpha", TeamColor::Red, PlayerState::default())
            .unwrap();
        host.add_player(&dispatcher, VICTIM, "bravo", TeamColor::Blue, PlayerState::default())
            .unwrap();
        (host, dispatcher)
    }

    fn server_shot(host: &InMemoryHost) -> ShotGuid {
        host.fire_server_shot(&ServerShot {
            shot_type: "VV".to_string(),
            position: Vec3::ZERO,
            velocity: Vec3::X,
            team: TeamColor::Red,
            owner: SHOOTER,
        })
        .unwrap()
    }

    fn death_by(guid: ShotGuid, host: &InMemoryHost) -> PlayerDieEvent {
        let shot = host
            .spawned_shots()
            .into_iter()
            .find(|s| s.guid == guid)
            .unwrap();
        PlayerDieEvent {
            victim_id: VICTIM,
            victim_team: TeamColor::Blue,
            killer_id: shot.shooter,
            killer_team: TeamColor::Rogue,
            shot_id: Some(shot.shot_id),
            flag_killed_with: Some("VV".to_string()),
        }
    }

    #[test]
    fn vv_shot_is_credited_to_owner() {
        let (host, _dispatcher) = host_with_players();
        let guid = server_shot(&host);
        host.set_shot_meta_str(guid, META_TYPE, "VV");
        host.set_shot_meta_int(guid, META_OWNER, SHOOTER.0);

        let mut event = death_by(guid, &host);
        assert!(handle_player_die(&host, &mut event));
        assert_eq!(event.killer_id, SHOOTER);
        assert_eq!(event.killer_team, TeamColor::Red);
        assert_eq!(event.victim_id, VICTIM);
    }

    #[test]
    fn team_is_read_at_death_time() {
        let (host, _dispatcher) = host_with_players();
        let guid = server_shot(&host);
        host.set_shot_meta_str(guid, META_TYPE, "VV");
        host.set_shot_meta_int(guid, META_OWNER, SHOOTER.0);

        host.set_team(SHOOTER, TeamColor::Green).unwrap();

        let mut event = death_by(guid, &host);
        handle_player_die(&host, &mut event);
        assert_eq!(event.killer_team, TeamColor::Green);
    }

    #[test]
    fn departed_owner_gets_no_team() {
        let (host, dispatcher) = host_with_players();
        let guid = server_shot(&host);
        host.set_shot_meta_str(guid, META_TYPE, "VV");
        host.set_shot_meta_int(guid, META_OWNER, SHOOTER.0);

        host.remove_player(&dispatcher, SHOOTER).unwrap();

        let mut event = death_by(guid, &host);
        assert!(handle_player_die(&host, &mut event));
        assert_eq!(event.killer_id, SHOOTER);
        assert_eq!(event.killer_team, TeamColor::NoTeam);
    }

    #[test]
    fn untagged_shot_is_left_alone() {
        let (host, _dispatcher) = host_with_players();
        let guid = server_shot(&host);

        let mut event = death_by(guid, &host);
        let before = event.clone();
        assert!(!handle_player_die(&host, &mut event));
        assert_eq!(event, before);
    }

    #[test]
    fn shot_missing_owner_is_left_alone() {
        let (host, _dispatcher) = host_with_players();
        let guid = server_shot(&host);
        host.set_shot_meta_str(guid, META_TYPE, "VV");

        let mut event = death_by(guid, &host);
        let before = event.clone();
        assert!(!handle_player_die(&host, &mut event));
        assert_eq!(event, before);
    }

    #[test]
    fn foreign_type_is_left_alone() {
        let (host, _dispatcher) = host_with_players();
        let guid = server_shot(&host);
        host.set_shot_meta_str(guid, META_TYPE, "GM");
        host.set_shot_meta_int(guid, META_OWNER, SHOOTER.0);

        let mut event = death_by(guid, &host);
        let before = event.clone();
        assert!(!handle_player_die(&host, &mut event));
        assert_eq!(event, before);
    }

    #[test]
    fn death_without_shot_is_left_alone() {
        let (host, _dispatcher) = host_with_players();
        let mut event = PlayerDieEvent {
            victim_id: VICTIM,
            victim_team: TeamColor::Blue,
            killer_id: VICTIM,
            killer_team: TeamColor::Blue,
            shot_id: None,
            flag_killed_with: None,
        };
        let before = event.clone();
        assert!(!handle_player_die(&host, &mut event));
        assert_eq!(event, before);
    }

    #[test]
    fn unknown_shot_is_left_alone() {
        let (host, _dispatcher) = host_with_players();
        let mut event = PlayerDieEvent {
            victim_id: VICTIM,
            victim_team: TeamColor::Blue,
            killer_id: PlayerId::SERVER,
            killer_team: TeamColor::Rogue,
            shot_id: Some(40),
            flag_killed_with: None,
        };
        let before = event.clone();
        assert!(!handle_player_die(&host, &mut event));
        assert_eq!(event, before);
    }
}
