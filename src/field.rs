//! Softened gravity field: force, potential and edge fade.
//!
//! Everything here is a pure function of explicit `(position, mass)` pairs, so
//! the same code places masses, moves the observer and deforms the grid.
//! Positions are planar: a [`Vec2`] holds world `(x, z)`.
//!
//! | Quantity     | Formula                                              |
//! |--------------|------------------------------------------------------|
//! | force        | `k · m · m_test / (d² + ε²)` toward the source        |
//! | potential    | `Σ −k · m / √(d² + ε²)`                               |
//! | edge fade    | `1 − smoothstep(inner, outer, |p|)`                    |
//! | displacement | `potential · edge fade`                              |
//!
//! The `ε²` padding is what keeps every division finite, including at zero
//! separation.

use crate::constants::{MAX_MASS_SLOTS, SENTINEL_POSITION};
use bevy::prelude::*;

/// One gravity source as seen by the field: planar position and magnitude.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MassSource {
    /// World `(x, z)`.
    pub position: Vec2,
    pub mass: f32,
}

impl MassSource {
    pub fn new(position: Vec2, mass: f32) -> Self {
        Self { position, mass }
    }
}

/// Force-law constants.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldParams {
    /// Strength constant.
    pub k: f32,
    /// Softening length.
    pub epsilon: f32,
}

/// Radial attenuation that flattens the field toward the map edge.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EdgeFade {
    pub inner: f32,
    pub outer: f32,
}

impl EdgeFade {
    /// 1.0 inside `inner`, 0.0 beyond `outer`, smooth in between.
    #[inline]
    pub fn factor(&self, point: Vec2) -> f32 {
        1.0 - smoothstep(self.inner, self.outer, point.length())
    }
}

/// Hermite interpolation with GLSL semantics (clamped to `[0, 1]`).
#[inline]
pub fn smoothstep(edge0: f32, edge1: f32, x: f32) -> f32 {
    if x <= edge0 {
        return 0.0;
    }
    if x >= edge1 {
        return 1.0;
    }
    let t = (x - edge0) / (edge1 - edge0);
    t * t * (3.0 - 2.0 * t)
}

/// Squared planar distance padded by `ε²`.
#[inline]
fn softened_dist_sq(delta: Vec2, params: &FieldParams) -> f32 {
    delta.length_squared() + params.epsilon * params.epsilon
}

/// Force on a test mass `test_mass` at `point` from a single source.
///
/// Points from `point` toward the source.  Coincident points have no defined
/// direction and produce zero force.
#[inline]
pub fn force_from(point: Vec2, test_mass: f32, source: &MassSource, params: &FieldParams) -> Vec2 {
    let delta = source.position - point;
    let magnitude = params.k * source.mass * test_mass / softened_dist_sq(delta, params);
    delta.normalize_or_zero() * magnitude
}

/// Vector sum of [`force_from`] over every source.
///
/// Callers exclude the test mass's own source themselves when it is one.
pub fn total_force(
    point: Vec2,
    test_mass: f32,
    sources: &[MassSource],
    params: &FieldParams,
) -> Vec2 {
    sources
        .iter()
        .map(|s| force_from(point, test_mass, s, params))
        .fold(Vec2::ZERO, |acc, f| acc + f)
}

/// Softened potential at `point`; always ≤ 0.
pub fn potential(point: Vec2, sources: &[MassSource], params: &FieldParams) -> f32 {
    sources
        .iter()
        .map(|s| -params.k * s.mass / softened_dist_sq(s.position - point, params).sqrt())
        .sum()
}

/// Elevation of the surface at `point`: potential attenuated by `fade`.
#[inline]
pub fn displacement(
    point: Vec2,
    sources: &[MassSource],
    params: &FieldParams,
    fade: &EdgeFade,
) -> f32 {
    potential(point, sources, params) * fade.factor(point)
}

// ── Grid uniforms ─────────────────────────────────────────────────────────────

/// Fixed-width snapshot of the field handed to the grid surface every frame.
///
/// Unused slots hold a far sentinel position with zero mass, so evaluating the
/// full arrays gives the same result as evaluating only the live sources.
#[derive(Resource, Debug, Clone, PartialEq)]
pub struct GridUniforms {
    pub time: f32,
    pub mass_count: u32,
    pub positions: [Vec2; MAX_MASS_SLOTS],
    pub values: [f32; MAX_MASS_SLOTS],
    pub params: FieldParams,
    pub fade: EdgeFade,
}

impl GridUniforms {
    /// Pack up to [`MAX_MASS_SLOTS`] sources; extras are dropped.
    pub fn pack(time: f32, sources: &[MassSource], params: FieldParams, fade: EdgeFade) -> Self {
        let mut positions = [Vec2::splat(SENTINEL_POSITION); MAX_MASS_SLOTS];
        let mut values = [0.0; MAX_MASS_SLOTS];
        let live = sources.len().min(MAX_MASS_SLOTS);
        for (i, source) in sources.iter().take(live).enumerate() {
            positions[i] = source.position;
            values[i] = source.mass;
        }
        Self {
            time,
            mass_count: live as u32,
            positions,
            values,
            params,
            fade,
        }
    }

    /// Evaluate the surface height from the packed arrays, slot by slot.
    ///
    /// Same expression and summation order as [`potential`], so the result is
    /// bit-identical to [`displacement`] over the live sources.
    pub fn displacement_at(&self, point: Vec2) -> f32 {
        let mut total = 0.0;
        for i in 0..MAX_MASS_SLOTS {
            let r = softened_dist_sq(self.positions[i] - point, &self.params).sqrt();
            total += -self.params.k * self.values[i] / r;
        }
        total * self.fade.factor(point)
    }
}

impl Default for GridUniforms {
    fn default() -> Self {
        Self::pack(
            0.0,
            &[],
            FieldParams {
                k: crate::constants::GRAVITY_K,
                epsilon: crate::constants::EPSILON,
            },
            EdgeFade {
                inner: crate::constants::MASS_FADE_INNER,
                outer: crate::constants::MASS_FADE_OUTER,
            },
        )
    }
}
