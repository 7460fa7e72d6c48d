//! Runtime configuration loaded from `assets/spacetime.toml`.
//!
//! [`SpacetimeConfig`] is a Bevy [`Resource`] that mirrors every constant in
//! [`crate::constants`].  At startup, [`load_spacetime_config`] reads
//! `assets/spacetime.toml` and overwrites the defaults with any values present
//! in the file.  Missing keys fall back to the compile-time defaults, so a
//! minimal TOML can override just the constants you care about.
//!
//! ## Usage in systems
//!
//! Add `config: Res<SpacetimeConfig>` to any system parameter list and read
//! values with `config.gravity_k`, `config.mass_map_limit`, etc.  The field
//! helpers ([`SpacetimeConfig::field_params`], [`SpacetimeConfig::mass_fade`],
//! [`SpacetimeConfig::observer_fade`]) bundle the values the field model needs.
//!
//! Keep `src/constants.rs` in sync: it remains the **authoritative default**
//! source used by `SpacetimeConfig::default()`.

use crate::constants::*;
use crate::error::validate_config;
use crate::field::{EdgeFade, FieldParams};
use bevy::prelude::*;
use serde::Deserialize;

/// Default location of the override file, relative to the working directory.
pub const CONFIG_PATH: &str = "assets/spacetime.toml";

/// Runtime-tunable field, physics and interaction configuration.
///
/// All fields default to the corresponding compile-time constant from
/// `src/constants.rs`.
#[derive(Resource, Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SpacetimeConfig {
    // ── Field ─────────────────────────────────────────────────────────────────
    pub gravity_k: f32,
    pub epsilon: f32,

    // ── Grid ──────────────────────────────────────────────────────────────────
    pub plane_size: f32,
    pub grid_divisions: u32,
    pub grid_line_segments: u32,

    // ── Mass Registry / Spawning ──────────────────────────────────────────────
    pub max_mass_count: usize,
    pub min_mass_value: f32,
    pub max_mass_value: f32,
    pub charge_rate: f32,
    pub base_mass_scale: f32,
    pub scale_per_mass: f32,
    pub max_mass_scale: f32,
    pub spawn_orbit_speed_min: f32,
    pub spawn_orbit_speed_max: f32,
    pub anchor_first_mass: bool,
    pub include_self_potential: bool,

    // ── Mass Simulation ───────────────────────────────────────────────────────
    pub physics_speed: f32,
    pub mass_friction: f32,
    pub mass_map_limit: f32,
    pub mass_bounce_damping: f32,
    pub mass_fade_inner: f32,
    pub mass_fade_outer: f32,

    // ── Observer ──────────────────────────────────────────────────────────────
    pub observer_mass: f32,
    pub observer_gravity_scale: f32,
    pub observer_thrust: f32,
    pub observer_friction: f32,
    pub observer_map_limit: f32,
    pub observer_bounce_damping: f32,
    pub observer_fade_inner: f32,
    pub observer_fade_outer: f32,
    pub eye_height: f32,
    pub observer_spawn: [f32; 3],

    // ── Camera ────────────────────────────────────────────────────────────────
    pub look_sensitivity: f32,
    pub overhead_vantage: [f32; 3],
    pub flight_duration: f32,
    pub orbit_sensitivity: f32,
    pub orbit_zoom_speed: f32,
    pub orbit_min_distance: f32,
    pub orbit_max_distance: f32,

    // ── Rendering ─────────────────────────────────────────────────────────────
    pub hud_font_size: f32,
}

impl Default for SpacetimeConfig {
    fn default() -> Self {
        Self {
            // Field
            gravity_k: GRAVITY_K,
            epsilon: EPSILON,
            // Grid
            plane_size: PLANE_SIZE,
            grid_divisions: GRID_DIVISIONS,
            grid_line_segments: GRID_LINE_SEGMENTS,
            // Mass Registry / Spawning
            max_mass_count: MAX_MASS_COUNT,
            min_mass_value: MIN_MASS_VALUE,
            max_mass_value: MAX_MASS_VALUE,
            charge_rate: CHARGE_RATE,
            base_mass_scale: BASE_MASS_SCALE,
            scale_per_mass: SCALE_PER_MASS,
            max_mass_scale: MAX_MASS_SCALE,
            spawn_orbit_speed_min: SPAWN_ORBIT_SPEED_MIN,
            spawn_orbit_speed_max: SPAWN_ORBIT_SPEED_MAX,
            anchor_first_mass: ANCHOR_FIRST_MASS,
            include_self_potential: INCLUDE_SELF_POTENTIAL,
            // Mass Simulation
            physics_speed: PHYSICS_SPEED,
            mass_friction: MASS_FRICTION,
            mass_map_limit: MASS_MAP_LIMIT,
            mass_bounce_damping: MASS_BOUNCE_DAMPING,
            mass_fade_inner: MASS_FADE_INNER,
            mass_fade_outer: MASS_FADE_OUTER,
            // Observer
            observer_mass: OBSERVER_MASS,
            observer_gravity_scale: OBSERVER_GRAVITY_SCALE,
            observer_thrust: OBSERVER_THRUST,
            observer_friction: OBSERVER_FRICTION,
            observer_map_limit: OBSERVER_MAP_LIMIT,
            observer_bounce_damping: OBSERVER_BOUNCE_DAMPING,
            observer_fade_inner: OBSERVER_FADE_INNER,
            observer_fade_outer: OBSERVER_FADE_OUTER,
            eye_height: EYE_HEIGHT,
            observer_spawn: OBSERVER_SPAWN,
            // Camera
            look_sensitivity: LOOK_SENSITIVITY,
            overhead_vantage: OVERHEAD_VANTAGE,
            flight_duration: FLIGHT_DURATION,
            orbit_sensitivity: ORBIT_SENSITIVITY,
            orbit_zoom_speed: ORBIT_ZOOM_SPEED,
            orbit_min_distance: ORBIT_MIN_DISTANCE,
            orbit_max_distance: ORBIT_MAX_DISTANCE,
            // Rendering
            hud_font_size: HUD_FONT_SIZE,
        }
    }
}

impl SpacetimeConfig {
    /// Force-law constants shared by the CPU physics and the grid uniforms.
    #[inline]
    pub fn field_params(&self) -> FieldParams {
        FieldParams {
            k: self.gravity_k,
            epsilon: self.epsilon,
        }
    }

    /// Fade used for mass elevation and the grid surface.
    #[inline]
    pub fn mass_fade(&self) -> EdgeFade {
        EdgeFade {
            inner: self.mass_fade_inner,
            outer: self.mass_fade_outer,
        }
    }

    /// Fade used for the observer's elevation.
    #[inline]
    pub fn observer_fade(&self) -> EdgeFade {
        EdgeFade {
            inner: self.observer_fade_inner,
            outer: self.observer_fade_outer,
        }
    }

    pub fn observer_spawn(&self) -> Vec3 {
        Vec3::from_array(self.observer_spawn)
    }

    pub fn overhead_vantage(&self) -> Vec3 {
        Vec3::from_array(self.overhead_vantage)
    }
}

/// Parse a TOML document into a validated config.
///
/// Keys absent from `contents` keep their compiled defaults.
pub fn parse_config(contents: &str) -> Result<SpacetimeConfig, String> {
    let loaded = toml::from_str::<SpacetimeConfig>(contents).map_err(|e| e.to_string())?;
    validate_config(&loaded).map_err(|e| e.to_string())?;
    Ok(loaded)
}

/// Startup system: attempt to load `assets/spacetime.toml` and overwrite the
/// `SpacetimeConfig` resource with any values present in the file.
///
/// Parse or validation errors are logged and the compiled defaults are kept.
/// A missing file is not an error.
pub fn load_spacetime_config(mut config: ResMut<SpacetimeConfig>) {
    match std::fs::read_to_string(CONFIG_PATH) {
        Ok(contents) => match parse_config(&contents) {
            Ok(loaded) => {
                *config = loaded;
                info!("Loaded spacetime config from {CONFIG_PATH}");
            }
            Err(e) => {
                warn!("Failed to load {CONFIG_PATH}: {e}; using defaults");
            }
        },
        Err(_) => {
            info!("No {CONFIG_PATH} found; using compiled defaults");
        }
    }
}
