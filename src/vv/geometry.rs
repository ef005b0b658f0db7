//! Side shot geometry - where the two extra shots spawn and how they move

use glam::{Vec2, Vec3};
use tracing::{debug, trace, warn};

use crate::api::{
    Host, PlayerRecordGuard, PlayerState, ServerShot, ShotFiredEvent, ShotGuid,
    MUZZLE_FRONT, MUZZLE_HEIGHT, SHOT_SPEED,
};

use super::{FLAG_ABBREV, META_OWNER, META_TYPE, WIDTH_VARIABLE};

/// World constants the geometry depends on, read fresh for every shot
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShotConstants {
    pub shot_speed: f32,
    pub muzzle_front: f32,
    pub muzzle_height: f32,
    /// Distance from the middle shot to each side shot
    pub width: f32,
}

impl ShotConstants {
    pub fn from_host(host: &dyn Host) -> Self {
        Self {
            shot_speed: host.get_double(SHOT_SPEED) as f32,
            muzzle_front: host.get_double(MUZZLE_FRONT) as f32,
            muzzle_height: host.get_double(MUZZLE_HEIGHT) as f32,
            width: host.get_double(WIDTH_VARIABLE) as f32,
        }
    }
}

/// Spawn data for the pair of side shots
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SideShots {
    /// Shared by both shots
    pub velocity: Vec3,
    /// Left of the facing direction first, then right
    pub positions: [Vec3; 2],
}

/// Velocity of a shot fired along `rotation` by a tank moving at `velocity`,
/// expressed in units of shot speed like the host's own shots
pub fn shot_velocity(rotation: f32, velocity: Vec3, shot_speed: f32) -> Vec3 {
    Vec3::new(
        rotation.cos() + velocity.x / shot_speed,
        rotation.sin() + velocity.y / shot_speed,
        velocity.z / shot_speed,
    )
}

/// Muzzle point of a tank
pub fn muzzle_position(state: &PlayerState, muzzle_front: f32, muzzle_height: f32) -> Vec3 {
    let facing = Vec3::new(state.rotation.cos(), state.rotation.sin(), 0.0);
    state.position + facing * muzzle_front + Vec3::Z * muzzle_height
}

/// Horizontal offset perpendicular to the facing, `width` long
pub fn lateral_offset(rotation: f32, width: f32) -> Vec2 {
    Vec2::new(-rotation.sin(), rotation.cos()) * width
}

/// Compute both side shots for a tank in `state`
pub fn side_shots(state: &PlayerState, constants: &ShotConstants) -> SideShots {
    let velocity = shot_velocity(state.rotation, state.velocity, constants.shot_speed);
    let base = muzzle_position(state, constants.muzzle_front, constants.muzzle_height);
    let offset = lateral_offset(state.rotation, constants.width).extend(0.0);

    SideShots {
        velocity,
        positions: [base + offset, base - offset],
    }
}

/// Handle a fire event: if the shooter holds the flag labelled `flag_label`,
/// spawn and tag the two side shots.
///
/// Returns the GUIDs the host assigned (empty when nothing was spawned).
pub fn handle_shot_fired(
    host: &dyn Host,
    event: &ShotFiredEvent,
    flag_label: &str,
) -> Vec<ShotGuid> {
    let player_id = event.player_id;
    let Some(player) = PlayerRecordGuard::acquire(host, player_id) else {
        trace!(player_id = %player_id, "Shooter not connected");
        return Vec::new();
    };

    if player.current_flag.as_deref() != Some(flag_label) {
        return Vec::new();
    }

    let constants = ShotConstants::from_host(host);
    let shots = side_shots(&player.state, &constants);
    let held_flag = host.player_flag(player_id);

    let mut spawned = Vec::with_capacity(shots.positions.len());
    for position in shots.positions {
        let request = ServerShot {
            shot_type: FLAG_ABBREV.to_string(),
            position,
            velocity: shots.velocity,
            team: player.team,
            owner: player_id,
        };

        let Some(guid) = host.fire_server_shot(&request) else {
            warn!(player_id = %player_id, "Host refused side shot");
            continue;
        };

        if let Some(flag) = held_flag.as_deref() {
            host.set_shot_meta_str(guid, META_TYPE, flag);
        }
        host.set_shot_meta_int(guid, META_OWNER, player_id.0);
        spawned.push(guid);
    }

    debug!(
        player_id = %player_id,
        shots = spawned.len(),
        "Spawned side shots"
    );
    spawned
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{Rng, SeedableRng};
    use rand_chacha::ChaCha8Rng;

    const EPS: f32 = 1e-4;

    fn unit_constants(width: f32) -> ShotConstants {
        ShotConstants {
            shot_speed: 1.0,
            muzzle_front: 0.0,
            muzzle_height: 0.0,
            width,
        }
    }

    #[test]
    fn stationary_tank_facing_east() {
        let state = PlayerState::default();
        let shots = side_shots(&state, &unit_constants(2.0));

        assert!(shots.positions[0].abs_diff_eq(Vec3::new(0.0, 2.0, 0.0), EPS));
        assert!(shots.positions[1].abs_diff_eq(Vec3::new(0.0, -2.0, 0.0), EPS));
        assert!(shots.velocity.abs_diff_eq(Vec3::new(1.0, 0.0, 0.0), EPS));
    }

    #[test]
    fn offsets_are_antiparallel_and_width_long() {
        let mut rng = ChaCha8Rng::seed_from_u64(42);

        for _ in 0..500 {
            let width = rng.gen_range(0.0..20.0);
            let state = PlayerState {
                rotation: rng.gen_range(-10.0..10.0),
                position: Vec3::new(
                    rng.gen_range(-400.0..400.0),
                    rng.gen_range(-400.0..400.0),
                    rng.gen_range(0.0..50.0),
                ),
                velocity: Vec3::ZERO,
            };
            let constants = ShotConstants {
                shot_speed: 100.0,
                muzzle_front: 4.42,
                muzzle_height: 1.57,
                width,
            };

            let shots = side_shots(&state, &constants);
            let base = muzzle_position(&state, constants.muzzle_front, constants.muzzle_height);
            let a = shots.positions[0] - base;
            let b = shots.positions[1] - base;

            assert!(a.abs_diff_eq(-b, 1e-3), "offsets {a} and {b} not opposite");
            assert!((a.length() - width).abs() < 1e-3);
            assert!(a.z.abs() < EPS && b.z.abs() < EPS);

            let offset = lateral_offset(state.rotation, width);
            assert!((offset.length() - width).abs() < 1e-3);
        }
    }

    #[test]
    fn offset_is_perpendicular_to_facing() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);

        for _ in 0..200 {
            let rotation: f32 = rng.gen_range(0.0..std::f32::consts::TAU);
            let facing = Vec2::new(rotation.cos(), rotation.sin());
            let offset = lateral_offset(rotation, 3.0);
            assert!(facing.dot(offset).abs() < 1e-4);
        }
    }

    #[test]
    fn muzzle_sits_ahead_and_above() {
        let state = PlayerState {
            rotation: std::f32::consts::FRAC_PI_2,
            position: Vec3::new(10.0, 20.0, 5.0),
            velocity: Vec3::ZERO,
        };
        let muzzle = muzzle_position(&state, 4.0, 1.5);
        assert!(muzzle.abs_diff_eq(Vec3::new(10.0, 24.0, 6.5), EPS));
    }

    #[test]
    fn tank_velocity_is_added_in_shot_speed_units() {
        let velocity = shot_velocity(0.0, Vec3::new(50.0, -25.0, 10.0), 100.0);
        assert!(velocity.abs_diff_eq(Vec3::new(1.5, -0.25, 0.1), EPS));
    }

    #[test]
    fn both_shots_share_velocity_and_height() {
        let state = PlayerState {
            rotation: 1.2,
            position: Vec3::new(3.0, -7.0, 2.0),
            velocity: Vec3::new(4.0, 1.0, -3.0),
        };
        let constants = ShotConstants {
            shot_speed: 100.0,
            muzzle_front: 4.42,
            muzzle_height: 1.57,
            width: 2.0,
        };
        let shots = side_shots(&state, &constants);

        assert_eq!(shots.positions[0].z, shots.positions[1].z);
        assert!((shots.positions[0].z - 3.57).abs() < EPS);
        assert_eq!(
            shots.velocity,
            shot_velocity(state.rotation, state.velocity, constants.shot_speed)
        );
    }

    #[test]
    fn zero_width_stacks_shots_on_muzzle() {
        let state = PlayerState {
            rotation: 0.3,
            ..Default::default()
        };
        let shots = side_shots(&state, &unit_constants(0.0));
        assert!(shots.positions[0].abs_diff_eq(shots.positions[1], EPS));
    }
}
