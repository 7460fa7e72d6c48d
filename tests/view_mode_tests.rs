//! Headless tests for the [`ViewMode`] state machine.
//!
//! These tests use [`MinimalPlugins`] plus [`StatesPlugin`]: no window, no
//! rendering.  Mode changes are driven through real [`SimCommand`] messages
//! so the command system, `NextState` and the `OnEnter` systems all run.
//!
//! Covered scenarios:
//! 1. Default mode is `FreeOrbit`, and entering it requests the overhead flight.
//! 2. `FirstPerson → FreeOrbit → FirstPerson` resets the observer exactly.
//! 3. Two toggles in one frame cancel out.
//! 4. Reset from first person returns to `FreeOrbit` with an empty registry.
//! 5. With the real plugins and a camera: observer physics only runs in first
//!    person, and entering first person snaps the camera to the spawn eye.

use std::time::Duration;

use bevy::input::mouse::{AccumulatedMouseMotion, AccumulatedMouseScroll};
use bevy::prelude::*;
use bevy::state::app::StatesPlugin;
use bevy::time::TimeUpdateStrategy;
use spacetime::config::SpacetimeConfig;
use spacetime::controls::{apply_sim_commands_system, SimCommand};
use spacetime::mass::{MassRegistry, MassSelection, NewMass};
use spacetime::observer::Observer;
use spacetime::simulation::SimulationPlugin;
use spacetime::spawn::SpawnController;
use spacetime::view::{
    enter_first_person_system, enter_free_orbit_system, CameraFlight, FirstPersonLook,
    OrbitControls, ViewMode, ViewPlugin,
};

// ── Helpers ───────────────────────────────────────────────────────────────────

/// Minimal headless app with the view state, its entry systems and the
/// command handler.  No camera entity exists, so camera writes are skipped;
/// [`plugin_app`] covers the camera.
fn view_app() -> App {
    let mut app = App::new();
    app.add_plugins((MinimalPlugins, StatesPlugin))
        .insert_resource(SpacetimeConfig::default())
        .init_state::<ViewMode>()
        .add_message::<SimCommand>()
        .init_resource::<OrbitControls>()
        .init_resource::<FirstPersonLook>()
        .init_resource::<CameraFlight>()
        .init_resource::<Observer>()
        .init_resource::<MassRegistry>()
        .init_resource::<MassSelection>()
        .init_resource::<SpawnController>()
        .add_systems(OnEnter(ViewMode::FreeOrbit), enter_free_orbit_system)
        .add_systems(OnEnter(ViewMode::FirstPerson), enter_first_person_system)
        .add_systems(Update, apply_sim_commands_system);
    app.update(); // settle into FreeOrbit
    app
}

/// Headless app with the real simulation and view plugins, a camera at the
/// overhead vantage, and a fixed 1/60 s step.
///
/// `MinimalPlugins` has no input plugin, so the input resources are inserted
/// by hand and never cleared between frames.
fn plugin_app() -> App {
    let config = SpacetimeConfig::default();
    let mut app = App::new();
    app.add_plugins((MinimalPlugins, StatesPlugin))
        .insert_resource(TimeUpdateStrategy::ManualDuration(Duration::from_secs_f32(
            1.0 / 60.0,
        )))
        .insert_resource(config.clone())
        .init_resource::<SpawnController>()
        .init_resource::<ButtonInput<KeyCode>>()
        .init_resource::<ButtonInput<MouseButton>>()
        .init_resource::<AccumulatedMouseMotion>()
        .init_resource::<AccumulatedMouseScroll>()
        .add_plugins((SimulationPlugin, ViewPlugin));
    app.world_mut().spawn((
        Camera3d::default(),
        Transform::from_translation(config.overhead_vantage()).looking_at(Vec3::ZERO, Vec3::Y),
    ));
    app.update();
    app
}

fn camera_transform(app: &mut App) -> Transform {
    let mut q = app.world_mut().query_filtered::<&Transform, With<Camera3d>>();
    *q.single(app.world()).expect("one camera")
}

/// Send a command and run two frames: one for the handler to request the
/// transition, one for `StateTransition` to apply it.
fn command(app: &mut App, cmd: SimCommand) {
    app.world_mut().write_message(cmd);
    app.update();
    app.update();
}

fn mode(app: &App) -> ViewMode {
    *app.world().resource::<State<ViewMode>>().get()
}

/// Move the observer somewhere arbitrary, as if it had been walking.
fn disturb_observer(app: &mut App, seed: f32) {
    let mut observer = app.world_mut().resource_mut::<Observer>();
    observer.position = Vec3::new(123.0 * seed, -17.0, -250.0 * seed);
    observer.velocity = Vec2::new(40.0 * seed, -9.0);
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[test]
fn default_mode_is_free_orbit_with_flight_requested() {
    let app = view_app();
    assert_eq!(mode(&app), ViewMode::FreeOrbit);
    assert!(app.world().resource::<OrbitControls>().enabled);
    let config = SpacetimeConfig::default();
    let flight = app.world().resource::<CameraFlight>().0.expect("flight requested");
    assert_eq!(flight.to, config.overhead_vantage());
}

#[test]
fn observer_is_reset_on_every_first_person_entry() {
    let mut app = view_app();
    let spawn = Observer::default();

    disturb_observer(&mut app, 1.0);
    command(&mut app, SimCommand::ToggleView);
    assert_eq!(mode(&app), ViewMode::FirstPerson);
    assert_eq!(*app.world().resource::<Observer>(), spawn);
    assert!(!app.world().resource::<OrbitControls>().enabled);
    assert!(!app.world().resource::<CameraFlight>().is_active());

    app.world_mut().resource_mut::<FirstPersonLook>().yaw = 1.3;
    disturb_observer(&mut app, 2.0);
    command(&mut app, SimCommand::ToggleView);
    assert_eq!(mode(&app), ViewMode::FreeOrbit);
    assert!(app.world().resource::<OrbitControls>().enabled);
    assert!(app.world().resource::<CameraFlight>().is_active());

    disturb_observer(&mut app, 3.0);
    command(&mut app, SimCommand::ToggleView);
    assert_eq!(mode(&app), ViewMode::FirstPerson);
    assert_eq!(*app.world().resource::<Observer>(), spawn);
    assert_eq!(
        *app.world().resource::<FirstPersonLook>(),
        FirstPersonLook::default()
    );
}

#[test]
fn double_toggle_in_one_frame_keeps_mode() {
    let mut app = view_app();
    app.world_mut().write_message(SimCommand::ToggleView);
    app.world_mut().write_message(SimCommand::ToggleView);
    app.update();
    app.update();
    assert_eq!(mode(&app), ViewMode::FreeOrbit);
}

#[test]
fn reset_from_first_person_returns_to_orbit_and_clears_masses() {
    let mut app = view_app();
    command(&mut app, SimCommand::ToggleView);
    assert_eq!(mode(&app), ViewMode::FirstPerson);

    app.world_mut()
        .resource_mut::<MassRegistry>()
        .insert(NewMass {
            position: Vec3::new(50.0, 0.0, 0.0),
            mass: 40.0,
            velocity: Vec2::ZERO,
            radius: 6.0,
            color: Color::WHITE,
        })
        .unwrap();

    command(&mut app, SimCommand::Reset);
    assert_eq!(mode(&app), ViewMode::FreeOrbit);
    assert!(app.world().resource::<MassRegistry>().is_empty());
    assert!(app.world().resource::<CameraFlight>().is_active());
}

#[test]
fn observer_only_moves_in_first_person_and_entry_snaps_camera() {
    let mut app = plugin_app();
    assert_eq!(mode(&app), ViewMode::FreeOrbit);

    // Held W in free orbit is latched but never integrated.
    app.world_mut()
        .resource_mut::<ButtonInput<KeyCode>>()
        .press(KeyCode::KeyW);
    for _ in 0..10 {
        app.update();
    }
    assert_eq!(*app.world().resource::<Observer>(), Observer::default());

    app.world_mut()
        .resource_mut::<ButtonInput<KeyCode>>()
        .release(KeyCode::KeyW);
    app.world_mut()
        .resource_mut::<NextState<ViewMode>>()
        .set(ViewMode::FirstPerson);
    app.update();
    assert_eq!(mode(&app), ViewMode::FirstPerson);
    let cam = camera_transform(&mut app);
    assert_eq!(cam.translation, Vec3::new(0.0, 15.0, 300.0));
    assert_eq!(cam.rotation, Quat::IDENTITY);

    // The same key now walks the observer forward (-z at zero yaw).
    app.world_mut()
        .resource_mut::<ButtonInput<KeyCode>>()
        .press(KeyCode::KeyW);
    for _ in 0..10 {
        app.update();
    }
    let observer = app.world().resource::<Observer>().clone();
    assert!(observer.position.z < 300.0, "observer at {:?}", observer.position);
    let cam = camera_transform(&mut app);
    assert_eq!(cam.translation, observer.eye(&SpacetimeConfig::default()));
}
