//! Charge-and-release mass spawning.
//!
//! ```text
//!  Idle ──arm──▶ Armed ──press on plane──▶ Charging ──release──▶ Idle (+1 mass)
//!   ▲              │                          │
//!   └────cancel────┴──────cancel / focus lost─┘
//! ```
//!
//! While charging, the held duration maps linearly onto a mass in
//! `[min_mass_value, max_mass_value]`; the preview sphere grows with it.  On
//! release the final mass is read back from the preview's scale, so what the
//! user saw is what they get.

use crate::config::SpacetimeConfig;
use crate::constants::PLACEMENT_HALF_EXTENT;
use crate::error::{SimError, SimResult};
use crate::graphics::cursor_ray;
use crate::mass::{MassId, MassRegistry, NewMass, STAR_COLORS};
use bevy::math::{primitives::InfinitePlane3d, Ray3d};
use bevy::prelude::*;
use bevy::window::{CursorLeft, PrimaryWindow, WindowFocused};
use rand::Rng;

// ── Charge mapping ────────────────────────────────────────────────────────────

/// Mass reached after holding for `held_secs`; saturates at the maximum.
#[inline]
pub fn charge_magnitude(held_secs: f32, config: &SpacetimeConfig) -> f32 {
    (config.min_mass_value + held_secs.max(0.0) * config.charge_rate).min(config.max_mass_value)
}

/// Sphere radius shown for a mass.
#[inline]
pub fn scale_for_magnitude(magnitude: f32, config: &SpacetimeConfig) -> f32 {
    (config.base_mass_scale + magnitude / config.scale_per_mass).min(config.max_mass_scale)
}

/// Inverse of [`scale_for_magnitude`] below the scale cap.
#[inline]
pub fn magnitude_for_scale(scale: f32, config: &SpacetimeConfig) -> f32 {
    (scale - config.base_mass_scale) * config.scale_per_mass
}

/// Launch velocity for a mass placed at planar `point`.
///
/// The first mass starts at rest.  Later ones get a tangential kick
/// (counter-clockwise about the origin) so they tend to orbit rather than fall
/// straight in.
pub fn initial_velocity<R: Rng + ?Sized>(
    point: Vec2,
    registry_empty: bool,
    config: &SpacetimeConfig,
    rng: &mut R,
) -> Vec2 {
    if registry_empty {
        return Vec2::ZERO;
    }
    let tangent = Vec2::new(-point.y, point.x).normalize_or_zero();
    tangent * rng.gen_range(config.spawn_orbit_speed_min..=config.spawn_orbit_speed_max)
}

/// Where a pointer ray lands on the placement plane, if within its extent.
pub fn placement_point(ray: Ray3d) -> Option<Vec3> {
    let distance = ray.intersect_plane(Vec3::ZERO, InfinitePlane3d::new(Vec3::Y))?;
    let point = ray.get_point(distance);
    (point.x.abs() <= PLACEMENT_HALF_EXTENT && point.z.abs() <= PLACEMENT_HALF_EXTENT)
        .then_some(point)
}

// ── Controller ────────────────────────────────────────────────────────────────

/// A charge in progress.  Nothing is registered until release.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChargeSession {
    /// `Time::elapsed_secs` at press.
    pub started_at: f32,
    /// Placement-plane hit.
    pub point: Vec3,
    pub magnitude: f32,
    /// Preview sphere radius.
    pub scale: f32,
}

impl ChargeSession {
    fn refresh(&mut self, now: f32, config: &SpacetimeConfig) {
        self.magnitude = charge_magnitude(now - self.started_at, config);
        self.scale = scale_for_magnitude(self.magnitude, config);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum SpawnPhase {
    #[default]
    Idle,
    /// Waiting for a press on the placement plane.
    Armed,
    Charging(ChargeSession),
}

#[derive(Resource, Debug, Clone, Copy, Default, PartialEq)]
pub struct SpawnController {
    pub phase: SpawnPhase,
}

impl SpawnController {
    #[inline]
    pub fn is_idle(&self) -> bool {
        matches!(self.phase, SpawnPhase::Idle)
    }

    #[inline]
    pub fn is_armed(&self) -> bool {
        matches!(self.phase, SpawnPhase::Armed)
    }

    /// The preview, while charging.
    pub fn session(&self) -> Option<&ChargeSession> {
        match &self.phase {
            SpawnPhase::Charging(session) => Some(session),
            _ => None,
        }
    }

    /// Handle an "add mass" request.  Rejected while the registry is full;
    /// a no-op if a spawn is already under way.
    pub fn arm(&mut self, registry: &MassRegistry) -> SimResult<()> {
        if registry.is_full() {
            return Err(SimError::RegistryFull {
                capacity: registry.capacity(),
            });
        }
        if self.is_idle() {
            self.phase = SpawnPhase::Armed;
        }
        Ok(())
    }

    /// Start charging at `point`.  Only valid while armed.
    pub fn begin_charge(&mut self, point: Vec3, now: f32, config: &SpacetimeConfig) -> bool {
        if !self.is_armed() {
            return false;
        }
        let magnitude = charge_magnitude(0.0, config);
        self.phase = SpawnPhase::Charging(ChargeSession {
            started_at: now,
            point,
            magnitude,
            scale: scale_for_magnitude(magnitude, config),
        });
        true
    }

    /// Grow the preview to match the time held so far.
    pub fn update_charge(&mut self, now: f32, config: &SpacetimeConfig) {
        if let SpawnPhase::Charging(session) = &mut self.phase {
            session.refresh(now, config);
        }
    }

    /// Release: register the charged mass and return to idle.
    ///
    /// Without an active charge this is [`SimError::NoChargeSession`] and
    /// nothing changes.
    pub fn commit<R: Rng + ?Sized>(
        &mut self,
        now: f32,
        registry: &mut MassRegistry,
        config: &SpacetimeConfig,
        rng: &mut R,
    ) -> SimResult<MassId> {
        let SpawnPhase::Charging(mut session) = self.phase else {
            return Err(SimError::NoChargeSession);
        };
        self.phase = SpawnPhase::Idle;
        session.refresh(now, config);

        let magnitude = magnitude_for_scale(session.scale, config)
            .clamp(config.min_mass_value, config.max_mass_value);
        let planar = Vec2::new(session.point.x, session.point.z);
        let velocity = initial_velocity(planar, registry.is_empty(), config, rng);
        let (r, g, b) = STAR_COLORS[rng.gen_range(0..STAR_COLORS.len())];

        registry.insert(NewMass {
            position: Vec3::new(planar.x, 0.0, planar.y),
            mass: magnitude,
            velocity,
            radius: session.scale,
            color: Color::srgb_u8(r, g, b),
        })
    }

    /// Drop any pending spawn.  Returns whether anything was discarded.
    pub fn cancel(&mut self) -> bool {
        let was_active = !self.is_idle();
        self.phase = SpawnPhase::Idle;
        was_active
    }

    /// Drop a charge in progress; an armed controller stays armed.
    pub fn abandon_charge(&mut self) -> bool {
        if self.session().is_some() {
            self.phase = SpawnPhase::Idle;
            true
        } else {
            false
        }
    }
}

// ── Systems ───────────────────────────────────────────────────────────────────

/// Start a charge on a left press over the placement plane, and keep the
/// preview in step with the hold time.
pub fn charge_input_system(
    buttons: Res<ButtonInput<MouseButton>>,
    time: Res<Time>,
    config: Res<SpacetimeConfig>,
    windows: Query<&Window, With<PrimaryWindow>>,
    q_camera: Query<(&Camera, &GlobalTransform)>,
    mut spawn: ResMut<SpawnController>,
) {
    let now = time.elapsed_secs();
    if buttons.just_pressed(MouseButton::Left) && spawn.is_armed() {
        let (Ok(window), Ok((camera, cam_transform))) = (windows.single(), q_camera.single())
        else {
            return;
        };
        if let Some(point) = cursor_ray(window, camera, cam_transform).and_then(placement_point) {
            spawn.begin_charge(point, now, &config);
            debug!("Charging mass at ({:.1}, {:.1})", point.x, point.z);
        }
    }
    if spawn.session().is_some() {
        spawn.update_charge(now, &config);
    }
}

/// Commit the charge on left release.
pub fn commit_charge_system(
    buttons: Res<ButtonInput<MouseButton>>,
    time: Res<Time>,
    config: Res<SpacetimeConfig>,
    mut spawn: ResMut<SpawnController>,
    mut registry: ResMut<MassRegistry>,
) {
    if !buttons.just_released(MouseButton::Left) || spawn.session().is_none() {
        return;
    }
    let mut rng = rand::thread_rng();
    match spawn.commit(time.elapsed_secs(), &mut registry, &config, &mut rng) {
        Ok(id) => {
            if let Some(mass) = registry.get(id) {
                info!(
                    "Spawned mass {} (m = {:.1}) at ({:.1}, {:.1}); {}/{} alive",
                    id.0,
                    mass.mass,
                    mass.position.x,
                    mass.position.z,
                    registry.len(),
                    registry.capacity()
                );
            }
        }
        Err(e) => warn!("Spawn rejected: {e}"),
    }
}

/// Cancel a charge when the window loses focus or the cursor leaves it; the
/// release would never arrive.
pub fn abandon_charge_system(
    mut focus: MessageReader<WindowFocused>,
    mut left: MessageReader<CursorLeft>,
    mut spawn: ResMut<SpawnController>,
) {
    let lost_focus = focus.read().any(|e| !e.focused);
    let cursor_left = left.read().count() > 0;
    if (lost_focus || cursor_left) && spawn.abandon_charge() {
        info!("Charge abandoned");
    }
}
