//! First-person observer: a walker that rides the warped surface.
//!
//! ## Pipeline (first-person only)
//!
//! 1. [`latch_movement_keys_system`] (`SimSet::Input`, every mode) copies WASD
//!    into [`MovementKeys`].
//! 2. [`observer_physics_system`] (`SimSet::Physics`, gated on
//!    `ViewMode::FirstPerson`) runs [`step_observer`] and moves the camera to
//!    the observer's eye.
//!
//! The observer is pulled by the same field the masses feel, using
//! `observer_mass` as its test mass.  Nothing here runs in free-orbit, so the
//! observer's state is frozen rather than decayed while unused.

use crate::config::SpacetimeConfig;
use crate::field::{displacement, total_force, MassSource};
use crate::mass::MassRegistry;
use crate::simulation::reflect_at_boundary;
use crate::view::FirstPersonLook;
use bevy::prelude::*;

/// The first-person participant.
#[derive(Resource, Debug, Clone, PartialEq)]
pub struct Observer {
    /// `y` is the faded field elevation (eye height not included).
    pub position: Vec3,
    /// Planar `(x, z)` velocity.
    pub velocity: Vec2,
}

impl Default for Observer {
    fn default() -> Self {
        Self {
            position: Vec3::from_array(crate::constants::OBSERVER_SPAWN),
            velocity: Vec2::ZERO,
        }
    }
}

impl Observer {
    /// Back to the spawn point, at rest.
    pub fn reset(&mut self, config: &SpacetimeConfig) {
        self.position = config.observer_spawn();
        self.velocity = Vec2::ZERO;
    }

    #[inline]
    pub fn planar(&self) -> Vec2 {
        Vec2::new(self.position.x, self.position.z)
    }

    /// Camera translation for this observer.
    #[inline]
    pub fn eye(&self, config: &SpacetimeConfig) -> Vec3 {
        self.position + Vec3::Y * config.eye_height
    }
}

/// Movement keys held this frame.
#[derive(Resource, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MovementKeys {
    pub forward: bool,
    pub back: bool,
    pub left: bool,
    pub right: bool,
}

impl MovementKeys {
    #[inline]
    pub fn any(&self) -> bool {
        self.forward || self.back || self.left || self.right
    }
}

/// Planar `(x, z)` forward for a camera yawed by `yaw` (looking down −Z at 0).
#[inline]
pub fn planar_forward(yaw: f32) -> Vec2 {
    let f = Quat::from_rotation_y(yaw) * Vec3::NEG_Z;
    Vec2::new(f.x, f.z).normalize_or_zero()
}

/// Acceleration requested by the held keys: unit direction × `thrust`.
pub fn input_acceleration(keys: MovementKeys, yaw: f32, thrust: f32) -> Vec2 {
    if !keys.any() {
        return Vec2::ZERO;
    }
    let forward = planar_forward(yaw);
    // forward × Y, expressed in (x, z)
    let right = Vec2::new(-forward.y, forward.x);

    let mut dir = Vec2::ZERO;
    if keys.forward {
        dir += forward;
    }
    if keys.back {
        dir -= forward;
    }
    if keys.right {
        dir += right;
    }
    if keys.left {
        dir -= right;
    }
    dir.normalize_or_zero() * thrust
}

/// Advance the observer by `dt`.
///
/// `v = (v + (input + gravity)·dt) · (1 − friction·dt)`, then integrate,
/// bounce at `observer_map_limit` and re-derive `y` from the field.
pub fn step_observer(
    observer: &mut Observer,
    keys: MovementKeys,
    yaw: f32,
    sources: &[MassSource],
    config: &SpacetimeConfig,
    dt: f32,
) {
    let params = config.field_params();
    let input = input_acceleration(keys, yaw, config.observer_thrust);
    let gravity = total_force(observer.planar(), config.observer_mass, sources, &params)
        * config.observer_gravity_scale;

    observer.velocity += (input + gravity) * dt;
    observer.velocity *= (1.0 - config.observer_friction * dt).max(0.0);

    observer.position.x += observer.velocity.x * dt;
    observer.position.z += observer.velocity.y * dt;

    let limit = config.observer_map_limit;
    let damping = config.observer_bounce_damping;
    reflect_at_boundary(&mut observer.position.x, &mut observer.velocity.x, limit, damping);
    reflect_at_boundary(&mut observer.position.z, &mut observer.velocity.y, limit, damping);

    let p = observer.planar();
    observer.position.y = displacement(p, sources, &params, &config.observer_fade());
}

// ── Systems ───────────────────────────────────────────────────────────────────

/// Latch WASD into [`MovementKeys`] every frame.
pub fn latch_movement_keys_system(
    keys: Res<ButtonInput<KeyCode>>,
    mut latched: ResMut<MovementKeys>,
) {
    *latched = MovementKeys {
        forward: keys.pressed(KeyCode::KeyW),
        back: keys.pressed(KeyCode::KeyS),
        left: keys.pressed(KeyCode::KeyA),
        right: keys.pressed(KeyCode::KeyD),
    };
}

/// Step the observer and place the camera at its eye.
pub fn observer_physics_system(
    time: Res<Time>,
    config: Res<SpacetimeConfig>,
    keys: Res<MovementKeys>,
    look: Res<FirstPersonLook>,
    registry: Res<MassRegistry>,
    mut observer: ResMut<Observer>,
    mut q_camera: Query<&mut Transform, With<Camera3d>>,
) {
    step_observer(
        &mut observer,
        *keys,
        look.yaw,
        &registry.sources(),
        &config,
        time.delta_secs(),
    );
    if let Ok(mut cam) = q_camera.single_mut() {
        cam.translation = observer.eye(&config);
    }
}
