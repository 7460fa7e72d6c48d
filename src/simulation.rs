//! Simulation plugin: frame ordering, mass integration and grid uniforms.
//!
//! ## Frame order
//!
//! Every `Update` runs the [`SimSet`]s in sequence:
//!
//! | Set        | Work                                                        |
//! |------------|-------------------------------------------------------------|
//! | `Input`    | keyboard/pointer → commands, latched keys, charge preview   |
//! | `Commands` | commands mutate the registry, spawn controller, view mode   |
//! | `Physics`  | [`mass_physics_system`], then the observer (first-person)   |
//! | `Camera`   | fly-to task, orbit controls                                 |
//! | `Render`   | [`update_grid_uniforms_system`], mesh and visual sync       |
//!
//! Input handlers never touch physics state directly; they either emit a
//! `SimCommand` or write a latched resource that a later set reads.

use crate::config::SpacetimeConfig;
use crate::field::{force_from, potential, GridUniforms, MassSource};
use crate::mass::{Mass, MassRegistry, MassSelection};
use bevy::prelude::*;

/// Per-frame ordering of the simulation.
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub enum SimSet {
    Input,
    Commands,
    Physics,
    Camera,
    Render,
}

pub struct SimulationPlugin;

impl Plugin for SimulationPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<MassRegistry>()
            .init_resource::<MassSelection>()
            .init_resource::<GridUniforms>()
            .configure_sets(
                Update,
                (
                    SimSet::Input,
                    SimSet::Commands,
                    SimSet::Physics,
                    SimSet::Camera,
                    SimSet::Render,
                )
                    .chain(),
            )
            .add_systems(Update, mass_physics_system.in_set(SimSet::Physics))
            .add_systems(Update, update_grid_uniforms_system.in_set(SimSet::Render));
    }
}

/// Startup system: rebuild the registry with the loaded capacity and anchor
/// policy.  Must run after `config::load_spacetime_config`.
pub fn init_mass_registry(mut commands: Commands, config: Res<SpacetimeConfig>) {
    commands.insert_resource(MassRegistry::new(
        config.max_mass_count,
        config.anchor_first_mass,
    ));
}

// ── Integration ───────────────────────────────────────────────────────────────

/// Clamp one axis to `[-limit, limit]`; on contact the velocity is pointed back
/// inward and scaled by `damping`.
///
/// Returns `true` when a bounce happened.
#[inline]
pub fn reflect_at_boundary(
    position: &mut f32,
    velocity: &mut f32,
    limit: f32,
    damping: f32,
) -> bool {
    if position.abs() <= limit {
        return false;
    }
    let side = position.signum();
    *position = limit * side;
    *velocity = -side * velocity.abs() * damping;
    true
}

/// Advance every mass by `dt` seconds.
///
/// 1. Pairwise attraction, `a = F / m`, anchors exempt.
/// 2. Semi-implicit Euler with friction.
/// 3. Boundary bounce at `mass_map_limit`.
/// 4. Elevation from the field, evaluated once all positions have moved.
pub fn step_masses(masses: &mut [Mass], config: &SpacetimeConfig, dt: f32) {
    let n = masses.len();
    if n == 0 {
        return;
    }
    let params = config.field_params();

    let mut accel = vec![Vec2::ZERO; n];
    for i in 0..n {
        for j in (i + 1)..n {
            let force = force_from(
                masses[i].planar(),
                masses[i].mass,
                &masses[j].source(),
                &params,
            );
            if !masses[i].is_anchor {
                accel[i] += force / masses[i].mass;
            }
            if !masses[j].is_anchor {
                accel[j] -= force / masses[j].mass;
            }
        }
    }

    let friction = (1.0 - config.mass_friction * dt).max(0.0);
    for (m, a) in masses.iter_mut().zip(accel) {
        if m.is_anchor {
            m.velocity = Vec2::ZERO;
            continue;
        }
        m.velocity += a * config.physics_speed * dt;
        m.velocity *= friction;
        m.position.x += m.velocity.x * dt;
        m.position.z += m.velocity.y * dt;

        let limit = config.mass_map_limit;
        let damping = config.mass_bounce_damping;
        reflect_at_boundary(&mut m.position.x, &mut m.velocity.x, limit, damping);
        reflect_at_boundary(&mut m.position.z, &mut m.velocity.y, limit, damping);
    }

    let sources: Vec<MassSource> = masses.iter().map(Mass::source).collect();
    let fade = config.mass_fade();
    for (i, m) in masses.iter_mut().enumerate() {
        let p = m.planar();
        let contributing: Vec<MassSource> = sources
            .iter()
            .enumerate()
            .filter(|(j, _)| config.include_self_potential || *j != i)
            .map(|(_, s)| *s)
            .collect();
        m.position.y = potential(p, &contributing, &params) * fade.factor(p);
    }
}

// ── Systems ───────────────────────────────────────────────────────────────────

/// Advance the registry by the frame delta.
pub fn mass_physics_system(
    time: Res<Time>,
    config: Res<SpacetimeConfig>,
    mut registry: ResMut<MassRegistry>,
) {
    if registry.is_empty() {
        return;
    }
    step_masses(registry.as_mut_slice(), &config, time.delta_secs());
}

/// Repack the grid uniforms from the registry after physics has run.
pub fn update_grid_uniforms_system(
    time: Res<Time>,
    config: Res<SpacetimeConfig>,
    registry: Res<MassRegistry>,
    mut uniforms: ResMut<GridUniforms>,
) {
    *uniforms = GridUniforms::pack(
        time.elapsed_secs(),
        &registry.sources(),
        config.field_params(),
        config.mass_fade(),
    );
}
