//! Rendering systems: warped grid, mass spheres, spawn/selection gizmos and HUD.
//!
//! ## Layer Model
//!
//! | Layer            | Technology            | Driven by                       |
//! |------------------|-----------------------|---------------------------------|
//! | Spacetime grid   | `Mesh3d` (`LineList`) | `GridUniforms` every frame      |
//! | Mass spheres     | `Mesh3d` + emissive   | `MassRegistry`, keyed by id     |
//! | Charge ghost     | Gizmos                | `SpawnController` session       |
//! | Selection ring   | Gizmos                | `MassSelection`                 |
//! | HUD              | Bevy UI               | registry size, view mode, spawn |
//!
//! ## System Responsibilities
//!
//! | System                     | Schedule         | Purpose                              |
//! |----------------------------|------------------|--------------------------------------|
//! | `setup_grid`               | Startup          | Build the flat grid + shared sphere  |
//! | `setup_hud`                | Startup          | Spawn the HUD text node              |
//! | `deform_grid_system`       | Update / Render  | Displace grid vertices by the field  |
//! | `sync_mass_visuals_system` | Update / Render  | Spawn/move/despawn mass spheres      |
//! | `spawn_gizmo_system`       | Update / Render  | Ghost sphere + selection highlight   |
//! | `hud_display_system`       | Update / Render  | Refresh HUD text                     |

use crate::config::SpacetimeConfig;
use crate::field::GridUniforms;
use crate::mass::{MassId, MassRegistry, MassSelection};
use crate::simulation::{update_grid_uniforms_system, SimSet};
use crate::spawn::{SpawnController, SpawnPhase};
use crate::view::ViewMode;
use bevy::prelude::*;
use bevy_asset::RenderAssetUsages;
use bevy_mesh::PrimitiveTopology;
use std::collections::HashSet;

pub struct RenderingPlugin;

impl Plugin for RenderingPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(
            Update,
            (
                deform_grid_system.after(update_grid_uniforms_system),
                sync_mass_visuals_system,
                spawn_gizmo_system,
                hud_display_system,
            )
                .in_set(SimSet::Render),
        );
    }
}

// ── Resources & markers ───────────────────────────────────────────────────────

/// The grid mesh and the undeformed `(x, z)` of each of its vertices.
#[derive(Resource)]
pub struct GridMesh {
    pub handle: Handle<Mesh>,
    pub base: Vec<Vec2>,
}

/// Unit sphere shared by every mass visual; scaled by the mass radius.
#[derive(Resource)]
pub struct MassSphereMesh(pub Handle<Mesh>);

/// Links a sphere entity to the registry mass it draws.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq)]
pub struct MassVisual(pub MassId);

/// Marker for the HUD text node.
#[derive(Component)]
pub struct HudText;

// ── Geometry helpers ──────────────────────────────────────────────────────────

/// Planar `(x, z)` endpoints of every segment of a square line grid, two
/// entries per segment, centred on the origin.
///
/// `divisions + 1` lines run along each axis, each split into `segments`
/// pieces so the surface can bend between crossings.
pub fn grid_line_vertices(size: f32, divisions: u32, segments: u32) -> Vec<Vec2> {
    let half = size * 0.5;
    let cell = size / divisions as f32;
    let step = size / segments as f32;
    let lines = divisions as usize + 1;
    let mut out = Vec::with_capacity(lines * 2 * segments as usize * 2);

    for i in 0..=divisions {
        let fixed = -half + i as f32 * cell;
        for s in 0..segments {
            let a = -half + s as f32 * step;
            let b = a + step;
            // Along X at z = fixed.
            out.push(Vec2::new(a, fixed));
            out.push(Vec2::new(b, fixed));
            // Along Z at x = fixed.
            out.push(Vec2::new(fixed, a));
            out.push(Vec2::new(fixed, b));
        }
    }
    out
}

/// A `LineList` mesh whose vertices sit at `(x, height(x, z), z)`.
pub fn grid_line_mesh(base: &[Vec2], height: impl Fn(Vec2) -> f32) -> Mesh {
    let mut mesh = Mesh::new(
        PrimitiveTopology::LineList,
        RenderAssetUsages::RENDER_WORLD | RenderAssetUsages::MAIN_WORLD,
    );
    mesh.insert_attribute(Mesh::ATTRIBUTE_POSITION, displaced_positions(base, height));
    mesh
}

fn displaced_positions(base: &[Vec2], height: impl Fn(Vec2) -> f32) -> Vec<[f32; 3]> {
    base.iter().map(|p| [p.x, height(*p), p.y]).collect()
}

// ── Startup ───────────────────────────────────────────────────────────────────

/// Spawn the flat grid and create the shared mass sphere mesh.
///
/// Must be ordered after [`crate::config::load_spacetime_config`].
pub fn setup_grid(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    config: Res<SpacetimeConfig>,
) {
    let base = grid_line_vertices(
        config.plane_size,
        config.grid_divisions,
        config.grid_line_segments,
    );
    let handle = meshes.add(grid_line_mesh(&base, |_| 0.0));
    let material = materials.add(StandardMaterial {
        base_color: Color::srgba(0.25, 0.65, 1.0, 0.8),
        unlit: true,
        alpha_mode: AlphaMode::Blend,
        ..default()
    });
    commands.spawn((
        Mesh3d(handle.clone()),
        MeshMaterial3d(material),
        Transform::IDENTITY,
    ));
    info!("Grid: {} line vertices", base.len());
    commands.insert_resource(GridMesh { handle, base });

    let sphere = meshes.add(Sphere::new(1.0).mesh().uv(32, 18));
    commands.insert_resource(MassSphereMesh(sphere));
}

/// Spawn the top-left HUD text.
pub fn setup_hud(mut commands: Commands, config: Res<SpacetimeConfig>) {
    commands
        .spawn((
            Node {
                position_type: PositionType::Absolute,
                left: Val::Px(10.0),
                top: Val::Px(10.0),
                ..default()
            },
            HudText,
        ))
        .with_children(|parent| {
            parent.spawn((
                Text::new(""),
                TextFont {
                    font_size: config.hud_font_size,
                    ..default()
                },
                TextColor(Color::srgb(0.8, 0.9, 1.0)),
            ));
        });
}

// ── Update: grid ──────────────────────────────────────────────────────────────

/// Lift every grid vertex to the field displacement packed in [`GridUniforms`].
///
/// Uses the same potential and edge fade as mass placement, but over every
/// mass.  A mass's own elevation leaves out its own well, so the grid under a
/// mass dips below it by that well's depth.
pub fn deform_grid_system(
    uniforms: Res<GridUniforms>,
    grid: Option<Res<GridMesh>>,
    mut meshes: ResMut<Assets<Mesh>>,
) {
    let Some(grid) = grid else {
        return;
    };
    if !uniforms.is_changed() {
        return;
    }
    let Some(mesh) = meshes.get_mut(&grid.handle) else {
        return;
    };
    mesh.insert_attribute(
        Mesh::ATTRIBUTE_POSITION,
        displaced_positions(&grid.base, |p| uniforms.displacement_at(p)),
    );
}

// ── Update: mass visuals ──────────────────────────────────────────────────────

/// Mirror the registry: one emissive sphere per mass, despawned with it.
pub fn sync_mass_visuals_system(
    mut commands: Commands,
    registry: Res<MassRegistry>,
    sphere: Option<Res<MassSphereMesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    mut q_visuals: Query<(Entity, &MassVisual, &mut Transform)>,
) {
    let mut drawn = HashSet::new();
    for (entity, visual, mut transform) in q_visuals.iter_mut() {
        match registry.get(visual.0) {
            Some(mass) => {
                transform.translation = mass.render_translation();
                transform.scale = Vec3::splat(mass.radius);
                drawn.insert(visual.0);
            }
            None => commands.entity(entity).despawn(),
        }
    }

    let Some(sphere) = sphere else {
        return;
    };
    for mass in registry.iter().filter(|m| !drawn.contains(&m.id)) {
        let material = materials.add(StandardMaterial {
            base_color: mass.color,
            emissive: mass.color.to_linear() * 3.0,
            ..default()
        });
        commands.spawn((
            Mesh3d(sphere.0.clone()),
            MeshMaterial3d(material),
            Transform::from_translation(mass.render_translation())
                .with_scale(Vec3::splat(mass.radius)),
            MassVisual(mass.id),
        ));
    }
}

// ── Update: gizmos ────────────────────────────────────────────────────────────

/// Wireframe ghost for a charge in progress and a ring around the selection.
pub fn spawn_gizmo_system(
    mut gizmos: Gizmos,
    spawn: Res<SpawnController>,
    registry: Res<MassRegistry>,
    selection: Res<MassSelection>,
) {
    if let Some(session) = spawn.session() {
        let center = session.point + Vec3::Y * session.scale;
        gizmos.sphere(
            Isometry3d::from_translation(center),
            session.scale,
            Color::srgba(1.0, 1.0, 1.0, 0.5),
        );
    }
    if let Some(mass) = selection.0.and_then(|id| registry.get(id)) {
        gizmos.sphere(
            Isometry3d::from_translation(mass.render_translation()),
            mass.radius * 1.4,
            Color::srgb(1.0, 0.85, 0.2),
        );
    }
}

// ── Update: HUD ───────────────────────────────────────────────────────────────

/// HUD contents for the current frame.
pub fn hud_text(registry: &MassRegistry, mode: ViewMode, spawn: &SpawnController) -> String {
    let hint = match spawn.phase {
        SpawnPhase::Charging(session) => format!("Charging: mass {:.0}", session.magnitude),
        SpawnPhase::Armed => "Press and hold on the grid to place a mass (Esc cancels)".to_string(),
        SpawnPhase::Idle if registry.is_full() => "Mass limit reached".to_string(),
        SpawnPhase::Idle => {
            "M add mass | V toggle view | R reset | right-click + X delete".to_string()
        }
    };
    format!(
        "Masses: {} / {}\n{}\n{}",
        registry.len(),
        registry.capacity(),
        mode.label(),
        hint
    )
}

pub fn hud_display_system(
    registry: Res<MassRegistry>,
    mode: Res<State<ViewMode>>,
    spawn: Res<SpawnController>,
    parent_query: Query<&Children, With<HudText>>,
    mut text_query: Query<&mut Text>,
) {
    for children in parent_query.iter() {
        for child in children.iter() {
            if let Ok(mut text) = text_query.get_mut(child) {
                *text = Text::new(hud_text(&registry, *mode.get(), &spawn));
            }
        }
    }
}
