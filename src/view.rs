//! View modes and everything that moves the camera.
//!
//! ## States
//!
//! | State         | Camera driven by                         | Input routed to           |
//! |---------------|------------------------------------------|---------------------------|
//! | `FreeOrbit`   | [`CameraFlight`], then [`OrbitControls`] | orbit drag/zoom, spawning |
//! | `FirstPerson` | observer position + [`FirstPersonLook`]  | WASD, drag-to-look        |
//!
//! ## Systems (registered by `ViewPlugin`)
//!
//! | System                         | Schedule                     | Purpose                         |
//! |--------------------------------|------------------------------|---------------------------------|
//! | `enter_free_orbit_system`      | `OnEnter(FreeOrbit)`         | enable orbit, fly to overhead   |
//! | `enter_first_person_system`    | `OnEnter(FirstPerson)`       | reset look + observer, snap cam |
//! | `latch_movement_keys_system`   | `Update / Input`             | WASD → `MovementKeys`           |
//! | `first_person_look_system`     | `Update / Input`, FP only    | drag → yaw/pitch                |
//! | `observer_physics_system`      | `Update / Physics`, FP only  | walk the observer               |
//! | `camera_flight_system`         | `Update / Camera`            | poll the fly-to task            |
//! | `orbit_camera_system`          | `Update / Camera`, orbit only| drag rotate, scroll zoom        |
//!
//! Mode changes go through `NextState<ViewMode>` only; the toggle and reset
//! commands in [`crate::controls`] are the sole writers.

use crate::config::SpacetimeConfig;
use crate::constants::{ORBIT_MAX_POLAR, ORBIT_MIN_POLAR};
use crate::observer::{
    latch_movement_keys_system, observer_physics_system, MovementKeys, Observer,
};
use crate::simulation::{mass_physics_system, SimSet};
use crate::spawn::SpawnController;
use bevy::input::mouse::{AccumulatedMouseMotion, AccumulatedMouseScroll, MouseScrollUnit};
use bevy::prelude::*;
use std::f32::consts::FRAC_PI_2;

// ── View state ────────────────────────────────────────────────────────────────

/// Which camera rig is active.  Exactly one at a time.
#[derive(States, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ViewMode {
    /// Overhead orbit around the origin.
    #[default]
    FreeOrbit,
    /// Walking the surface as the observer.
    FirstPerson,
}

impl ViewMode {
    pub fn toggled(self) -> Self {
        match self {
            ViewMode::FreeOrbit => ViewMode::FirstPerson,
            ViewMode::FirstPerson => ViewMode::FreeOrbit,
        }
    }

    /// HUD label.
    pub fn label(self) -> &'static str {
        match self {
            ViewMode::FreeOrbit => "FREE ORBIT",
            ViewMode::FirstPerson => "OBSERVER (drag to look)",
        }
    }
}

// ── First-person look ─────────────────────────────────────────────────────────

/// Yaw/pitch of the first-person camera, plus whether a look-drag is active.
#[derive(Resource, Debug, Clone, Copy, Default, PartialEq)]
pub struct FirstPersonLook {
    pub yaw: f32,
    /// Clamped to `[-π/2, π/2]`.
    pub pitch: f32,
    pub dragging: bool,
}

impl FirstPersonLook {
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Apply a pointer delta (pixels).  Dragging right turns right; dragging
    /// down looks down.
    pub fn apply_drag(&mut self, delta: Vec2, sensitivity: f32) {
        self.yaw -= delta.x * sensitivity;
        self.pitch = (self.pitch - delta.y * sensitivity).clamp(-FRAC_PI_2, FRAC_PI_2);
    }

    /// Yaw, then pitch, no roll.
    #[inline]
    pub fn rotation(&self) -> Quat {
        Quat::from_euler(EulerRot::YXZ, self.yaw, self.pitch, 0.0)
    }
}

// ── Orbit ─────────────────────────────────────────────────────────────────────

/// Whether the free-orbit controller may move the camera.
#[derive(Resource, Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrbitControls {
    pub enabled: bool,
}

impl Default for OrbitControls {
    fn default() -> Self {
        Self { enabled: true }
    }
}

/// Orbit a camera at `translation` around the origin.
///
/// `drag` is in pixels, `scroll` in lines (positive zooms in).  Distance and
/// polar angle are clamped so the camera never dives under the grid or onto
/// the pole.
pub fn orbit_step(translation: Vec3, drag: Vec2, scroll: f32, config: &SpacetimeConfig) -> Vec3 {
    let radius = translation.length().max(config.orbit_min_distance);
    let mut yaw = translation.x.atan2(translation.z);
    let mut polar = (translation.y / radius).clamp(-1.0, 1.0).acos();

    yaw -= drag.x * config.orbit_sensitivity;
    polar = (polar - drag.y * config.orbit_sensitivity).clamp(ORBIT_MIN_POLAR, ORBIT_MAX_POLAR);
    let radius = (radius * (1.0 - scroll * config.orbit_zoom_speed))
        .clamp(config.orbit_min_distance, config.orbit_max_distance);

    Vec3::new(
        radius * polar.sin() * yaw.sin(),
        radius * polar.cos(),
        radius * polar.sin() * yaw.cos(),
    )
}

// ── Camera flight ─────────────────────────────────────────────────────────────

/// One finite-duration camera move, re-aimed at `look_at` every tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Flight {
    /// Captured from the camera on the first tick.
    pub from: Option<Vec3>,
    pub to: Vec3,
    pub look_at: Vec3,
    pub duration: f32,
    pub elapsed: f32,
}

/// The active fly-to task, polled by [`camera_flight_system`].
///
/// A new request replaces whatever is in flight.
#[derive(Resource, Debug, Clone, Copy, Default, PartialEq)]
pub struct CameraFlight(pub Option<Flight>);

impl CameraFlight {
    pub fn request(&mut self, to: Vec3, look_at: Vec3, duration: f32) {
        self.0 = Some(Flight {
            from: None,
            to,
            look_at,
            duration,
            elapsed: 0.0,
        });
    }

    pub fn cancel(&mut self) {
        self.0 = None;
    }

    #[inline]
    pub fn is_active(&self) -> bool {
        self.0.is_some()
    }

    /// Advance by `dt` from a camera currently at `current`.
    ///
    /// Returns the translation and aim point for this tick, or `None` when no
    /// flight is running.  The flight clears itself on its final tick.
    pub fn advance(&mut self, current: Vec3, dt: f32) -> Option<(Vec3, Vec3)> {
        let flight = self.0.as_mut()?;
        let from = *flight.from.get_or_insert(current);
        flight.elapsed += dt;
        let t = if flight.duration > 0.0 {
            (flight.elapsed / flight.duration).clamp(0.0, 1.0)
        } else {
            1.0
        };
        let position = if t >= 1.0 {
            flight.to
        } else {
            from.lerp(flight.to, ease_in_out_cubic(t))
        };
        let look_at = flight.look_at;
        if t >= 1.0 {
            self.0 = None;
        }
        Some((position, look_at))
    }
}

/// Cubic ease-in-out on `[0, 1]`.
#[inline]
pub fn ease_in_out_cubic(t: f32) -> f32 {
    if t < 0.5 {
        4.0 * t * t * t
    } else {
        1.0 - (-2.0 * t + 2.0).powi(3) / 2.0
    }
}

// ── Plugin ────────────────────────────────────────────────────────────────────

/// Registers [`ViewMode`], the mode-entry systems and all camera systems.
///
/// Requires `SimulationPlugin` (for [`SimSet`]) and `StatesPlugin`.
pub struct ViewPlugin;

impl Plugin for ViewPlugin {
    fn build(&self, app: &mut App) {
        app.init_state::<ViewMode>()
            .init_resource::<FirstPersonLook>()
            .init_resource::<OrbitControls>()
            .init_resource::<CameraFlight>()
            .init_resource::<Observer>()
            .init_resource::<MovementKeys>()
            .add_systems(OnEnter(ViewMode::FreeOrbit), enter_free_orbit_system)
            .add_systems(OnEnter(ViewMode::FirstPerson), enter_first_person_system)
            .add_systems(
                Update,
                (
                    latch_movement_keys_system,
                    first_person_look_system.run_if(in_state(ViewMode::FirstPerson)),
                )
                    .in_set(SimSet::Input),
            )
            .add_systems(
                Update,
                observer_physics_system
                    .after(mass_physics_system)
                    .in_set(SimSet::Physics)
                    .run_if(in_state(ViewMode::FirstPerson)),
            )
            .add_systems(
                Update,
                (
                    camera_flight_system,
                    orbit_camera_system.run_if(in_state(ViewMode::FreeOrbit)),
                )
                    .chain()
                    .in_set(SimSet::Camera),
            );
    }
}

// ── Mode entry ────────────────────────────────────────────────────────────────

/// Hand the camera to the orbit controller and fly it to the overhead vantage.
pub fn enter_free_orbit_system(
    config: Res<SpacetimeConfig>,
    mut orbit: ResMut<OrbitControls>,
    mut look: ResMut<FirstPersonLook>,
    mut flight: ResMut<CameraFlight>,
) {
    orbit.enabled = true;
    look.dragging = false;
    flight.request(config.overhead_vantage(), Vec3::ZERO, config.flight_duration);
    info!("View mode: free orbit");
}

/// Put the observer back at spawn and snap the camera to its eye.
pub fn enter_first_person_system(
    config: Res<SpacetimeConfig>,
    mut orbit: ResMut<OrbitControls>,
    mut look: ResMut<FirstPersonLook>,
    mut flight: ResMut<CameraFlight>,
    mut observer: ResMut<Observer>,
    mut q_camera: Query<&mut Transform, With<Camera3d>>,
) {
    orbit.enabled = false;
    flight.cancel();
    look.reset();
    observer.reset(&config);
    if let Ok(mut cam) = q_camera.single_mut() {
        cam.translation = observer.eye(&config);
        cam.rotation = look.rotation();
    }
    info!("View mode: first person");
}

// ── Per-frame camera systems ──────────────────────────────────────────────────

/// Drag-to-look while in first person.
///
/// A left press starts a drag unless a spawn is armed or charging (the press
/// belongs to the spawn then).  Releasing the button anywhere ends it.
pub fn first_person_look_system(
    buttons: Res<ButtonInput<MouseButton>>,
    motion: Res<AccumulatedMouseMotion>,
    spawn: Res<SpawnController>,
    config: Res<SpacetimeConfig>,
    mut look: ResMut<FirstPersonLook>,
    mut q_camera: Query<&mut Transform, With<Camera3d>>,
) {
    if buttons.just_pressed(MouseButton::Left) && spawn.is_idle() {
        look.dragging = true;
    }
    if !buttons.pressed(MouseButton::Left) {
        look.dragging = false;
    }
    if !look.dragging || motion.delta == Vec2::ZERO {
        return;
    }
    look.apply_drag(motion.delta, config.look_sensitivity);
    if let Ok(mut cam) = q_camera.single_mut() {
        cam.rotation = look.rotation();
    }
}

/// Poll the fly-to task and move the camera along it.
pub fn camera_flight_system(
    time: Res<Time>,
    mut flight: ResMut<CameraFlight>,
    mut q_camera: Query<&mut Transform, With<Camera3d>>,
) {
    if !flight.is_active() {
        return;
    }
    let Ok(mut cam) = q_camera.single_mut() else {
        return;
    };
    if let Some((position, look_at)) = flight.advance(cam.translation, time.delta_secs()) {
        cam.translation = position;
        cam.look_at(look_at, Vec3::Y);
    }
}

/// Left-drag rotates about the origin, scroll zooms.
///
/// Stands down while a flight runs or a spawn is in progress.
#[allow(clippy::too_many_arguments)]
pub fn orbit_camera_system(
    orbit: Res<OrbitControls>,
    flight: Res<CameraFlight>,
    spawn: Res<SpawnController>,
    buttons: Res<ButtonInput<MouseButton>>,
    motion: Res<AccumulatedMouseMotion>,
    scroll: Res<AccumulatedMouseScroll>,
    config: Res<SpacetimeConfig>,
    mut q_camera: Query<&mut Transform, With<Camera3d>>,
) {
    if !orbit.enabled || flight.is_active() || !spawn.is_idle() {
        return;
    }
    let drag = if buttons.pressed(MouseButton::Left) {
        motion.delta
    } else {
        Vec2::ZERO
    };
    let lines = match scroll.unit {
        MouseScrollUnit::Line => scroll.delta.y,
        MouseScrollUnit::Pixel => scroll.delta.y / 100.0,
    };
    if drag == Vec2::ZERO && lines == 0.0 {
        return;
    }
    let Ok(mut cam) = q_camera.single_mut() else {
        return;
    };
    cam.translation = orbit_step(cam.translation, drag, lines, &config);
    cam.look_at(Vec3::ZERO, Vec3::Y);
}

#[cfg(test)]
mod tests {
    use super::*;

    // ── look ──────────────────────────────────────────────────────────────────

    #[test]
    fn pitch_is_clamped_at_the_poles() {
        let mut look = FirstPersonLook::default();
        look.apply_drag(Vec2::new(0.0, -10_000.0), 0.002);
        assert_eq!(look.pitch, FRAC_PI_2);
        look.apply_drag(Vec2::new(0.0, 20_000.0), 0.002);
        assert_eq!(look.pitch, -FRAC_PI_2);
    }

    #[test]
    fn drag_scales_by_sensitivity() {
        let mut look = FirstPersonLook::default();
        look.apply_drag(Vec2::new(100.0, 50.0), 0.002);
        assert!((look.yaw + 0.2).abs() < 1e-6);
        assert!((look.pitch + 0.1).abs() < 1e-6);
    }

    #[test]
    fn zero_look_is_identity_rotation() {
        let look = FirstPersonLook::default();
        assert!(look.rotation().angle_between(Quat::IDENTITY) < 1e-6);
    }

    #[test]
    fn rotation_has_no_roll() {
        let look = FirstPersonLook {
            yaw: 1.1,
            pitch: -0.4,
            dragging: false,
        };
        let right = look.rotation() * Vec3::X;
        assert!(right.y.abs() < 1e-6, "camera right must stay level, got {right:?}");
    }

    #[test]
    fn toggled_flips_mode() {
        assert_eq!(ViewMode::FreeOrbit.toggled(), ViewMode::FirstPerson);
        assert_eq!(ViewMode::FirstPerson.toggled(), ViewMode::FreeOrbit);
    }

    // ── flight ────────────────────────────────────────────────────────────────

    #[test]
    fn ease_endpoints_and_midpoint() {
        assert_eq!(ease_in_out_cubic(0.0), 0.0);
        assert_eq!(ease_in_out_cubic(1.0), 1.0);
        assert!((ease_in_out_cubic(0.5) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn flight_runs_to_completion_then_clears() {
        let mut flight = CameraFlight::default();
        let target = Vec3::new(0.0, 400.0, 600.0);
        flight.request(target, Vec3::ZERO, 1.5);

        let start = Vec3::new(10.0, 10.0, 10.0);
        let (first, _) = flight.advance(start, 0.5).unwrap();
        assert!(first.distance(start) > 0.0 && first.distance(target) > 0.0);

        // `current` is ignored once `from` is captured.
        flight.advance(Vec3::ZERO, 0.5).unwrap();
        let (last, aim) = flight.advance(Vec3::ZERO, 0.6).unwrap();
        assert_eq!(last, target);
        assert_eq!(aim, Vec3::ZERO);
        assert!(!flight.is_active());
        assert_eq!(flight.advance(Vec3::ZERO, 0.1), None);
    }

    #[test]
    fn later_request_supersedes_earlier() {
        let mut flight = CameraFlight::default();
        flight.request(Vec3::X * 100.0, Vec3::ZERO, 1.0);
        flight.advance(Vec3::ZERO, 0.5);
        flight.request(Vec3::Z * 100.0, Vec3::ZERO, 1.0);
        let (pos, _) = flight.advance(Vec3::new(1.0, 2.0, 3.0), 1.0).unwrap();
        assert_eq!(pos, Vec3::Z * 100.0);
    }

    // ── orbit ─────────────────────────────────────────────────────────────────

    #[test]
    fn orbit_without_input_keeps_position() {
        let config = SpacetimeConfig::default();
        let start = Vec3::new(0.0, 400.0, 600.0);
        let next = orbit_step(start, Vec2::ZERO, 0.0, &config);
        assert!(next.distance(start) < 1e-2, "got {next:?}");
    }

    #[test]
    fn orbit_zoom_is_clamped() {
        let config = SpacetimeConfig::default();
        let start = Vec3::new(0.0, 400.0, 600.0);
        let near = orbit_step(start, Vec2::ZERO, 1000.0, &config);
        assert!((near.length() - config.orbit_min_distance).abs() < 1e-2);
        let far = orbit_step(start, Vec2::ZERO, -1000.0, &config);
        assert!((far.length() - config.orbit_max_distance).abs() < 1e-1);
    }

    #[test]
    fn orbit_never_dips_below_the_grid() {
        let config = SpacetimeConfig::default();
        let start = Vec3::new(0.0, 400.0, 600.0);
        let low = orbit_step(start, Vec2::new(0.0, -100_000.0), 0.0, &config);
        assert!(low.y > 0.0);
        let drag_rotate = orbit_step(start, Vec2::new(300.0, 0.0), 0.0, &config);
        assert!((drag_rotate.length() - start.length()).abs() < 1e-2);
        assert!(drag_rotate.x.abs() > 1.0);
    }
}
