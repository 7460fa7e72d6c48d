//! Keyboard and pointer surface.
//!
//! ## Pipeline
//!
//! 1. [`keyboard_command_system`] (`SimSet::Input`) turns shortcut presses into
//!    [`SimCommand`] messages.
//! 2. [`pick_selection_system`] (`SimSet::Input`) right-click picks the mass
//!    that "delete selected" will remove.
//! 3. [`apply_sim_commands_system`] (`SimSet::Commands`) drains the messages and
//!    mutates the registry, spawn controller and view mode.
//!
//! | Key            | Command          |
//! |----------------|------------------|
//! | `M`            | `AddMass`        |
//! | `V`            | `ToggleView`     |
//! | `R`            | `Reset`          |
//! | `Delete` / `X` | `DeleteSelected` |
//! | `Escape`       | `CancelSpawn`    |
//!
//! The command handlers are plain functions over the resources they touch so
//! tests can drive them without a window.

use crate::config::SpacetimeConfig;
use crate::error::SimResult;
use crate::graphics::cursor_ray;
use crate::mass::{pick_mass, Mass, MassRegistry, MassSelection};
use crate::simulation::SimSet;
use crate::spawn::{
    abandon_charge_system, charge_input_system, commit_charge_system, SpawnController,
};
use crate::view::{CameraFlight, ViewMode};
use bevy::prelude::*;
use bevy::window::PrimaryWindow;

/// A user request, produced by input handlers and consumed once per frame.
#[derive(Message, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimCommand {
    /// Arm the spawn controller.
    AddMass,
    ToggleView,
    /// Clear all masses and fly back to the overhead view.
    Reset,
    DeleteSelected,
    /// Drop an armed or charging spawn.
    CancelSpawn,
}

pub struct ControlsPlugin;

impl Plugin for ControlsPlugin {
    fn build(&self, app: &mut App) {
        app.add_message::<SimCommand>()
            .init_resource::<SpawnController>()
            .add_systems(
                Update,
                (
                    keyboard_command_system,
                    pick_selection_system,
                    abandon_charge_system,
                    charge_input_system,
                )
                    .chain()
                    .in_set(SimSet::Input),
            )
            .add_systems(
                Update,
                (apply_sim_commands_system, commit_charge_system)
                    .chain()
                    .in_set(SimSet::Commands),
            );
    }
}

// ── Command handlers ──────────────────────────────────────────────────────────

/// Arm a spawn.  Rejected while the registry is full.
pub fn add_mass(spawn: &mut SpawnController, registry: &MassRegistry) -> SimResult<()> {
    spawn.arm(registry)
}

/// Remove the selected mass, if any.  No selection is a no-op; the selection
/// is cleared either way.
pub fn delete_selected(
    registry: &mut MassRegistry,
    selection: &mut MassSelection,
) -> SimResult<Option<Mass>> {
    match selection.0.take() {
        Some(id) => registry.remove(id).map(Some),
        None => Ok(None),
    }
}

/// Empty the registry, drop any pending spawn and selection, and fly the
/// camera back to the overhead vantage.
pub fn reset_simulation(
    registry: &mut MassRegistry,
    selection: &mut MassSelection,
    spawn: &mut SpawnController,
    flight: &mut CameraFlight,
    config: &SpacetimeConfig,
) {
    registry.clear();
    selection.0 = None;
    spawn.cancel();
    flight.request(config.overhead_vantage(), Vec3::ZERO, config.flight_duration);
}

// ── Systems ───────────────────────────────────────────────────────────────────

/// Map shortcut keys to [`SimCommand`]s.
pub fn keyboard_command_system(
    keys: Res<ButtonInput<KeyCode>>,
    mut commands_out: MessageWriter<SimCommand>,
) {
    if keys.just_pressed(KeyCode::KeyM) {
        commands_out.write(SimCommand::AddMass);
    }
    if keys.just_pressed(KeyCode::KeyV) {
        commands_out.write(SimCommand::ToggleView);
    }
    if keys.just_pressed(KeyCode::KeyR) {
        commands_out.write(SimCommand::Reset);
    }
    if keys.any_just_pressed([KeyCode::Delete, KeyCode::KeyX]) {
        commands_out.write(SimCommand::DeleteSelected);
    }
    if keys.just_pressed(KeyCode::Escape) {
        commands_out.write(SimCommand::CancelSpawn);
    }
}

/// Right-click selects the mass under the cursor; clicking empty space clears
/// the selection.
pub fn pick_selection_system(
    buttons: Res<ButtonInput<MouseButton>>,
    windows: Query<&Window, With<PrimaryWindow>>,
    q_camera: Query<(&Camera, &GlobalTransform)>,
    registry: Res<MassRegistry>,
    mut selection: ResMut<MassSelection>,
) {
    if !buttons.just_pressed(MouseButton::Right) {
        return;
    }
    let (Ok(window), Ok((camera, cam_transform))) = (windows.single(), q_camera.single()) else {
        return;
    };
    let picked = cursor_ray(window, camera, cam_transform)
        .and_then(|ray| pick_mass(&registry, ray.origin, *ray.direction));
    if picked != selection.0 {
        selection.0 = picked;
        match picked {
            Some(id) => debug!("Selected mass {}", id.0),
            None => debug!("Selection cleared"),
        }
    }
}

/// Drain this frame's commands.
///
/// Mode changes are collapsed into a single `NextState` write, so toggling
/// twice in one frame is a no-op.
#[allow(clippy::too_many_arguments)]
pub fn apply_sim_commands_system(
    mut commands_in: MessageReader<SimCommand>,
    config: Res<SpacetimeConfig>,
    view: Res<State<ViewMode>>,
    mut next_view: ResMut<NextState<ViewMode>>,
    mut registry: ResMut<MassRegistry>,
    mut selection: ResMut<MassSelection>,
    mut spawn: ResMut<SpawnController>,
    mut flight: ResMut<CameraFlight>,
) {
    let current = *view.get();
    let mut target = current;

    for command in commands_in.read() {
        match command {
            SimCommand::AddMass => match add_mass(&mut spawn, &registry) {
                Ok(()) => info!("Spawn armed: press and hold on the grid"),
                Err(e) => debug!("Add mass ignored: {e}"),
            },
            SimCommand::ToggleView => target = target.toggled(),
            SimCommand::Reset => {
                reset_simulation(&mut registry, &mut selection, &mut spawn, &mut flight, &config);
                target = ViewMode::FreeOrbit;
                info!("Simulation reset");
            }
            SimCommand::DeleteSelected => match delete_selected(&mut registry, &mut selection) {
                Ok(Some(mass)) => info!("Deleted mass {}", mass.id.0),
                Ok(None) => debug!("Delete ignored: nothing selected"),
                Err(e) => debug!("Delete ignored: {e}"),
            },
            SimCommand::CancelSpawn => {
                if spawn.cancel() {
                    info!("Spawn cancelled");
                }
            }
        }
    }

    if target != current {
        next_view.set(target);
    }
}
