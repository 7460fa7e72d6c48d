use crate::config::SpacetimeConfig;
use bevy::math::Ray3d;
use bevy::prelude::*;

/// Spawn the single 3D camera at the overhead vantage, aimed at the origin.
///
/// Must run after [`crate::config::load_spacetime_config`].
pub fn setup_camera(mut commands: Commands, config: Res<SpacetimeConfig>) {
    commands.spawn((
        Camera3d::default(),
        Transform::from_translation(config.overhead_vantage()).looking_at(Vec3::ZERO, Vec3::Y),
    ));
    info!("Camera spawned");
}

/// A soft directional key light plus one overhead point light standing in for
/// a sun.
pub fn setup_lights(mut commands: Commands) {
    commands.spawn((
        DirectionalLight {
            illuminance: 2_000.0,
            ..default()
        },
        Transform::from_xyz(200.0, 600.0, 300.0).looking_at(Vec3::ZERO, Vec3::Y),
    ));
    commands.spawn((
        PointLight {
            intensity: 2.0e8,
            range: 3000.0,
            shadows_enabled: false,
            ..default()
        },
        Transform::from_xyz(0.0, 200.0, 0.0),
    ));
}

/// World-space ray under the cursor, or `None` when the cursor is outside the
/// window.
pub fn cursor_ray(window: &Window, camera: &Camera, transform: &GlobalTransform) -> Option<Ray3d> {
    let cursor = window.cursor_position()?;
    camera.viewport_to_world(transform, cursor).ok()
}
