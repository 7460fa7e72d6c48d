use bevy::prelude::*;
use bevy::window::WindowResolution;
use spacetime::config::{self, SpacetimeConfig};
use spacetime::{controls, graphics, rendering, simulation, view};

fn main() {
    App::new()
        .add_plugins(DefaultPlugins.set(WindowPlugin {
            primary_window: Some(Window {
                title: "Spacetime".into(),
                resolution: WindowResolution::new(1200, 680),
                ..Default::default()
            }),
            ..Default::default()
        }))
        .insert_resource(ClearColor(Color::srgb(0.01, 0.01, 0.03)))
        // Compiled defaults; load_spacetime_config overwrites them from
        // assets/spacetime.toml (if present) in the Startup schedule.
        .insert_resource(SpacetimeConfig::default())
        .add_plugins(simulation::SimulationPlugin)
        .add_plugins(view::ViewPlugin)
        .add_plugins(controls::ControlsPlugin)
        .add_plugins(rendering::RenderingPlugin)
        .add_systems(
            Startup,
            (
                // Load config first so every other startup system sees the final values.
                config::load_spacetime_config,
                simulation::init_mass_registry.after(config::load_spacetime_config),
                graphics::setup_camera.after(config::load_spacetime_config),
                graphics::setup_lights,
                rendering::setup_grid.after(config::load_spacetime_config),
                rendering::setup_hud
                    .after(graphics::setup_camera)
                    .after(config::load_spacetime_config),
            ),
        )
        .run();
}
