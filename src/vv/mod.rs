//! Vertical Velocity (+VV) flag
//!
//! While a player holds the flag, every shot they fire is flanked by two
//! server shots spawned `_verticalVelocityWidth` to either side of the
//! muzzle. The side shots are tagged with `type` and `owner` metadata so
//! kills they score are credited to the player.

pub mod attribution;
pub mod geometry;

use tracing::info;

use crate::api::{ApiError, Event, EventKind, Host, Plugin, Subscriptions};
use crate::registry::{init_registry, Registry};

pub use attribution::handle_player_die;
pub use geometry::{handle_shot_fired, side_shots, ShotConstants, SideShots};

pub const PLUGIN_NAME: &str = "Vertical Velocity Flag";

pub const FLAG_ABBREV: &str = "VV";
pub const FLAG_NAME: &str = "Vertical Velocity";
pub const FLAG_HELP: &str = "Extra two shots travel with vertical velocity.";

/// Server variable holding the side shot distance
pub const WIDTH_VARIABLE: &str = "_verticalVelocityWidth";
pub const DEFAULT_WIDTH: f64 = 2.0;

/// Shot metadata key: flag abbreviation the shot was fired with
pub const META_TYPE: &str = "type";
/// Shot metadata key: id of the player who fired the shot
pub const META_OWNER: &str = "owner";

/// The plugin. Holds nothing but the registry it loaded.
#[derive(Debug, Default)]
pub struct VerticalVelocity {
    registry: Option<&'static Registry>,
}

impl VerticalVelocity {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Plugin for VerticalVelocity {
    fn name(&self) -> &str {
        PLUGIN_NAME
    }

    fn init(
        &mut self,
        host: &dyn Host,
        _config: &str,
        events: &mut Subscriptions,
    ) -> Result<(), ApiError> {
        let registry = init_registry();

        host.register_custom_flag(&registry.flag)?;
        for variable in &registry.variables {
            host.register_custom_double(variable.name, variable.default)?;
        }

        events.register(EventKind::ShotFired);
        events.register(EventKind::PlayerDie);

        self.registry = Some(registry);
        info!(flag = %registry.flag_label, "Vertical Velocity registered");
        Ok(())
    }

    fn event(&self, host: &dyn Host, event: &mut Event) {
        let Some(registry) = self.registry else {
            return;
        };

        match event {
            Event::ShotFired(data) => {
                handle_shot_fired(host, data, &registry.flag_label);
            }
            Event::PlayerDie(data) => {
                handle_player_die(host, data);
            }
            Event::Other(_) => {}
        }
    }
}
