//! Process-wide registration data for the Vertical Velocity flag

use std::sync::OnceLock;

use crate::api::{FlagDefinition, FlagQuality};
use crate::vv::{DEFAULT_WIDTH, FLAG_ABBREV, FLAG_HELP, FLAG_NAME, WIDTH_VARIABLE};

/// A custom server variable and its default
#[derive(Debug, Clone, PartialEq)]
pub struct CustomDouble {
    pub name: &'static str,
    pub default: f64,
}

/// Read-only registration data, fixed at init
#[derive(Debug)]
pub struct Registry {
    pub flag: FlagDefinition,
    /// Cached `flag.label()`, compared against player records on every shot
    pub flag_label: String,
    pub variables: Vec<CustomDouble>,
}

impl Registry {
    fn vertical_velocity() -> Self {
        let flag = FlagDefinition {
            abbrev: FLAG_ABBREV.to_string(),
            name: FLAG_NAME.to_string(),
            help: FLAG_HELP.to_string(),
            shot_flags: 0,
            quality: FlagQuality::Good,
        };
        let flag_label = flag.label();

        Self {
            flag,
            flag_label,
            variables: vec![CustomDouble {
                name: WIDTH_VARIABLE,
                default: DEFAULT_WIDTH,
            }],
        }
    }
}

static REGISTRY: OnceLock<Registry> = OnceLock::new();

/// Initialize the registry (call once at plugin load; later calls return
/// the same instance)
pub fn init_registry() -> &'static Registry {
    REGISTRY.get_or_init(Registry::vertical_velocity)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_describes_vertical_velocity() {
        let registry = init_registry();

        assert_eq!(registry.flag.abbrev, "VV");
        assert_eq!(registry.flag.name, "Vertical Velocity");
        assert_eq!(registry.flag.shot_flags, 0);
        assert_eq!(registry.flag.quality, FlagQuality::Good);
        assert_eq!(registry.flag_label, "Vertical Velocity (+VV)");
        assert_eq!(
            registry.variables,
            vec![CustomDouble {
                name: "_verticalVelocityWidth",
                default: 2.0
            }]
        );
    }

    #[test]
    fn init_is_idempotent() {
        let first = init_registry() as *const Registry;
        let second = init_registry() as *const Registry;
        assert_eq!(first, second);
        assert!(REGISTRY.get().is_some());
    }
}
