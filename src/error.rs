//! Simulation-specific error types.
//!
//! None of these are faults: they are policy rejections (a full registry, a
//! stale selection, a release without a charge) or configuration values that
//! fall outside their safe range.  Systems log them and carry on.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use crate::error::SimError;
//!
//! fn some_system(registry: &mut MassRegistry) -> Result<(), SimError> {
//!     registry.remove(id)?;
//!     Ok(())
//! }
//! ```

use crate::config::SpacetimeConfig;
use crate::constants::MAX_MASS_SLOTS;
use crate::mass::MassId;
use std::fmt;

/// Top-level error enum for the spacetime simulation.
#[derive(Debug, Clone, PartialEq)]
pub enum SimError {
    /// A mass was requested while the registry already holds its maximum.
    RegistryFull {
        /// Configured maximum number of masses.
        capacity: usize,
    },

    /// A mass id was referenced that is no longer (or never was) registered.
    UnknownMass {
        /// The id that was looked up.
        id: MassId,
    },

    /// A spawn commit arrived without an active charging session.
    NoChargeSession,

    /// Config constant is outside its safe operating range.
    UnsafeConstant {
        /// Name of the constant (for logging).
        name: &'static str,
        /// The value that was rejected.
        value: f32,
        /// Human-readable description of the safe range.
        safe_range: &'static str,
    },
}

impl fmt::Display for SimError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SimError::RegistryFull { capacity } => {
                write!(f, "mass registry is full (capacity {})", capacity)
            }
            SimError::UnknownMass { id } => write!(f, "no registered mass with id {}", id.0),
            SimError::NoChargeSession => {
                write!(f, "spawn release without an active charging session")
            }
            SimError::UnsafeConstant {
                name,
                value,
                safe_range,
            } => write!(
                f,
                "constant '{}' = {} is outside safe range {}",
                name, value, safe_range
            ),
        }
    }
}

impl std::error::Error for SimError {}

/// Convenience alias: a `Result` using `SimError` as the error type.
pub type SimResult<T> = Result<T, SimError>;

// ── Validation helpers ────────────────────────────────────────────────────────

fn require_positive(name: &'static str, value: f32) -> SimResult<()> {
    if value > 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(SimError::UnsafeConstant {
            name,
            value,
            safe_range: "(0.0, ∞)",
        })
    }
}

fn require_unit_interval(name: &'static str, value: f32) -> SimResult<()> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(SimError::UnsafeConstant {
            name,
            value,
            safe_range: "[0.0, 1.0]",
        })
    }
}

/// Returns the first constant in `config` that is outside its safe range.
///
/// `epsilon` must be strictly positive: it is the only thing keeping the
/// softened distance away from zero.
pub fn validate_config(config: &SpacetimeConfig) -> SimResult<()> {
    require_positive("gravity_k", config.gravity_k)?;
    require_positive("epsilon", config.epsilon)?;
    require_positive("min_mass_value", config.min_mass_value)?;
    require_positive("scale_per_mass", config.scale_per_mass)?;
    require_positive("observer_mass", config.observer_mass)?;
    require_positive("mass_map_limit", config.mass_map_limit)?;
    require_positive("observer_map_limit", config.observer_map_limit)?;
    require_positive("flight_duration", config.flight_duration)?;
    require_positive("plane_size", config.plane_size)?;
    require_positive("orbit_min_distance", config.orbit_min_distance)?;
    require_unit_interval("mass_bounce_damping", config.mass_bounce_damping)?;
    require_unit_interval("observer_bounce_damping", config.observer_bounce_damping)?;

    if config.max_mass_count == 0 || config.max_mass_count > MAX_MASS_SLOTS {
        return Err(SimError::UnsafeConstant {
            name: "max_mass_count",
            value: config.max_mass_count as f32,
            safe_range: "[1, 5]",
        });
    }
    if config.grid_divisions == 0 || config.grid_line_segments == 0 {
        return Err(SimError::UnsafeConstant {
            name: "grid_divisions",
            value: config.grid_divisions.min(config.grid_line_segments) as f32,
            safe_range: "[1, ∞)",
        });
    }
    if config.orbit_max_distance < config.orbit_min_distance {
        return Err(SimError::UnsafeConstant {
            name: "orbit_max_distance",
            value: config.orbit_max_distance,
            safe_range: "[orbit_min_distance, ∞)",
        });
    }
    if config.max_mass_value < config.min_mass_value {
        return Err(SimError::UnsafeConstant {
            name: "max_mass_value",
            value: config.max_mass_value,
            safe_range: "[min_mass_value, ∞)",
        });
    }
    if config.mass_fade_outer <= config.mass_fade_inner {
        return Err(SimError::UnsafeConstant {
            name: "mass_fade_outer",
            value: config.mass_fade_outer,
            safe_range: "(mass_fade_inner, ∞)",
        });
    }
    if config.observer_fade_outer <= config.observer_fade_inner {
        return Err(SimError::UnsafeConstant {
            name: "observer_fade_outer",
            value: config.observer_fade_outer,
            safe_range: "(observer_fade_inner, ∞)",
        });
    }
    if config.spawn_orbit_speed_max < config.spawn_orbit_speed_min {
        return Err(SimError::UnsafeConstant {
            name: "spawn_orbit_speed_max",
            value: config.spawn_orbit_speed_max,
            safe_range: "[spawn_orbit_speed_min, ∞)",
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert_eq!(validate_config(&SpacetimeConfig::default()), Ok(()));
    }

    #[test]
    fn zero_epsilon_is_unsafe() {
        let config = SpacetimeConfig {
            epsilon: 0.0,
            ..Default::default()
        };
        assert!(matches!(
            validate_config(&config),
            Err(SimError::UnsafeConstant { name: "epsilon", .. })
        ));
    }

    #[test]
    fn capacity_beyond_uniform_slots_is_unsafe() {
        let config = SpacetimeConfig {
            max_mass_count: MAX_MASS_SLOTS + 1,
            ..Default::default()
        };
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn inverted_fade_radii_are_unsafe() {
        let config = SpacetimeConfig {
            observer_fade_inner: 500.0,
            observer_fade_outer: 400.0,
            ..Default::default()
        };
        assert!(matches!(
            validate_config(&config),
            Err(SimError::UnsafeConstant {
                name: "observer_fade_outer",
                ..
            })
        ));
    }

    #[test]
    fn display_mentions_capacity() {
        let msg = SimError::RegistryFull { capacity: 5 }.to_string();
        assert!(msg.contains('5'), "got {msg}");
    }
}
