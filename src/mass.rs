//! Mass records and the registry that owns them.
//!
//! [`MassRegistry`] is the single owner of every live [`Mass`].  Renderers hold
//! a [`MassId`] (see `rendering::MassVisual`) rather than a reference, and
//! look the mass up each frame.  Ids are never reused within a session, so a
//! stale visual can always tell that its mass is gone.

use crate::error::{SimError, SimResult};
use crate::field::MassSource;
use bevy::prelude::*;

/// Star-like emissive palette for new masses (blue-white through orange).
pub const STAR_COLORS: [(u8, u8, u8); 7] = [
    (0x9b, 0xb0, 0xff),
    (0xaa, 0xbf, 0xff),
    (0xca, 0xd7, 0xff),
    (0xf8, 0xf7, 0xff),
    (0xff, 0xf4, 0xea),
    (0xff, 0xd2, 0xa1),
    (0xff, 0xcc, 0x6f),
];

/// Stable handle to a registered mass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MassId(pub u64);

/// One gravity source.
#[derive(Debug, Clone, PartialEq)]
pub struct Mass {
    pub id: MassId,
    /// `y` is the field elevation, recomputed every step.
    pub position: Vec3,
    pub mass: f32,
    /// Planar `(x, z)` velocity.
    pub velocity: Vec2,
    /// Sphere radius; lifts the rendered sphere so it rests on the surface.
    pub radius: f32,
    pub color: Color,
    /// Pinned in place: never accelerated, never integrated.
    pub is_anchor: bool,
}

impl Mass {
    /// World `(x, z)`.
    #[inline]
    pub fn planar(&self) -> Vec2 {
        Vec2::new(self.position.x, self.position.z)
    }

    #[inline]
    pub fn source(&self) -> MassSource {
        MassSource::new(self.planar(), self.mass)
    }

    /// Where the sphere is drawn.
    #[inline]
    pub fn render_translation(&self) -> Vec3 {
        self.position + Vec3::Y * self.radius
    }
}

/// Everything needed to create a mass; the registry assigns id and role.
#[derive(Debug, Clone, PartialEq)]
pub struct NewMass {
    pub position: Vec3,
    pub mass: f32,
    pub velocity: Vec2,
    pub radius: f32,
    pub color: Color,
}

/// Ordered, capacity-bounded collection of live masses.
#[derive(Resource, Debug, Clone)]
pub struct MassRegistry {
    masses: Vec<Mass>,
    capacity: usize,
    next_id: u64,
    /// Whether the next insert should be pinned.
    anchor_pending: bool,
    anchor_first: bool,
}

impl Default for MassRegistry {
    fn default() -> Self {
        Self::new(crate::constants::MAX_MASS_COUNT, crate::constants::ANCHOR_FIRST_MASS)
    }
}

impl MassRegistry {
    /// `anchor_first`: pin the first mass created after construction or
    /// [`clear`](Self::clear).
    pub fn new(capacity: usize, anchor_first: bool) -> Self {
        Self {
            masses: Vec::with_capacity(capacity),
            capacity,
            next_id: 0,
            anchor_pending: anchor_first,
            anchor_first,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.masses.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.masses.is_empty()
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.masses.len() >= self.capacity
    }

    pub fn iter(&self) -> impl Iterator<Item = &Mass> {
        self.masses.iter()
    }

    pub fn as_slice(&self) -> &[Mass] {
        &self.masses
    }

    pub fn as_mut_slice(&mut self) -> &mut [Mass] {
        &mut self.masses
    }

    pub fn get(&self, id: MassId) -> Option<&Mass> {
        self.masses.iter().find(|m| m.id == id)
    }

    pub fn contains(&self, id: MassId) -> bool {
        self.get(id).is_some()
    }

    /// Field sources in registry order.
    pub fn sources(&self) -> Vec<MassSource> {
        self.masses.iter().map(Mass::source).collect()
    }

    /// Register a new mass.  Fails without side effects when full.
    pub fn insert(&mut self, new: NewMass) -> SimResult<MassId> {
        if self.is_full() {
            return Err(SimError::RegistryFull {
                capacity: self.capacity,
            });
        }
        let id = MassId(self.next_id);
        self.next_id += 1;
        let is_anchor = std::mem::take(&mut self.anchor_pending);
        self.masses.push(Mass {
            id,
            position: new.position,
            mass: new.mass,
            velocity: if is_anchor { Vec2::ZERO } else { new.velocity },
            radius: new.radius,
            color: new.color,
            is_anchor,
        });
        Ok(id)
    }

    /// Remove one mass, preserving the order of the rest.
    pub fn remove(&mut self, id: MassId) -> SimResult<Mass> {
        let index = self
            .masses
            .iter()
            .position(|m| m.id == id)
            .ok_or(SimError::UnknownMass { id })?;
        Ok(self.masses.remove(index))
    }

    /// Remove every mass.  The anchor role becomes available again; ids keep
    /// counting up.
    pub fn clear(&mut self) {
        self.masses.clear();
        self.anchor_pending = self.anchor_first;
    }
}

/// Mass currently targeted for deletion (right-click pick).
#[derive(Resource, Debug, Clone, Copy, Default, PartialEq)]
pub struct MassSelection(pub Option<MassId>);

/// Nearest mass sphere hit by a ray, if any.
///
/// Spheres are centred on [`Mass::render_translation`] with radius
/// [`Mass::radius`]; `direction` must be normalized.
pub fn pick_mass(registry: &MassRegistry, origin: Vec3, direction: Vec3) -> Option<MassId> {
    registry
        .iter()
        .filter_map(|m| {
            ray_sphere(origin, direction, m.render_translation(), m.radius).map(|t| (t, m.id))
        })
        .min_by(|a, b| a.0.total_cmp(&b.0))
        .map(|(_, id)| id)
}

/// Distance along the ray to the first intersection in front of the origin.
fn ray_sphere(origin: Vec3, direction: Vec3, center: Vec3, radius: f32) -> Option<f32> {
    let oc = origin - center;
    let b = oc.dot(direction);
    let c = oc.length_squared() - radius * radius;
    let disc = b * b - c;
    if disc < 0.0 {
        return None;
    }
    let sqrt_disc = disc.sqrt();
    let near = -b - sqrt_disc;
    let far = -b + sqrt_disc;
    if near >= 0.0 {
        Some(near)
    } else if far >= 0.0 {
        Some(far)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_mass(x: f32, z: f32, mass: f32) -> NewMass {
        NewMass {
            position: Vec3::new(x, 0.0, z),
            mass,
            velocity: Vec2::new(1.0, 2.0),
            radius: 5.0,
            color: Color::WHITE,
        }
    }

    #[test]
    fn insert_assigns_increasing_ids() {
        let mut reg = MassRegistry::new(5, false);
        let a = reg.insert(new_mass(0.0, 0.0, 10.0)).unwrap();
        let b = reg.insert(new_mass(1.0, 0.0, 10.0)).unwrap();
        assert!(b > a);
        assert_eq!(reg.len(), 2);
    }

    #[test]
    fn insert_at_capacity_is_rejected_without_growth() {
        let mut reg = MassRegistry::new(5, false);
        for i in 0..5 {
            reg.insert(new_mass(i as f32 * 10.0, 0.0, 10.0)).unwrap();
        }
        assert!(reg.is_full());
        assert_eq!(
            reg.insert(new_mass(0.0, 0.0, 10.0)),
            Err(SimError::RegistryFull { capacity: 5 })
        );
        assert_eq!(reg.len(), 5);
    }

    #[test]
    fn remove_preserves_order_and_rejects_unknown_ids() {
        let mut reg = MassRegistry::new(5, false);
        let a = reg.insert(new_mass(0.0, 0.0, 10.0)).unwrap();
        let b = reg.insert(new_mass(1.0, 0.0, 10.0)).unwrap();
        let c = reg.insert(new_mass(2.0, 0.0, 10.0)).unwrap();
        reg.remove(b).unwrap();
        let ids: Vec<_> = reg.iter().map(|m| m.id).collect();
        assert_eq!(ids, vec![a, c]);
        assert_eq!(reg.remove(b), Err(SimError::UnknownMass { id: b }));
    }

    #[test]
    fn ids_are_not_reused_after_clear() {
        let mut reg = MassRegistry::new(5, false);
        let a = reg.insert(new_mass(0.0, 0.0, 10.0)).unwrap();
        reg.clear();
        assert!(reg.is_empty());
        let b = reg.insert(new_mass(0.0, 0.0, 10.0)).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn anchor_goes_to_first_mass_only() {
        let mut reg = MassRegistry::new(5, true);
        let a = reg.insert(new_mass(0.0, 0.0, 10.0)).unwrap();
        let b = reg.insert(new_mass(50.0, 0.0, 10.0)).unwrap();
        assert!(reg.get(a).unwrap().is_anchor);
        assert_eq!(reg.get(a).unwrap().velocity, Vec2::ZERO);
        assert!(!reg.get(b).unwrap().is_anchor);

        // Deleting the anchor does not promote anyone.
        reg.remove(a).unwrap();
        let c = reg.insert(new_mass(60.0, 0.0, 10.0)).unwrap();
        assert!(!reg.get(c).unwrap().is_anchor);

        // A reset makes the role available again.
        reg.clear();
        let d = reg.insert(new_mass(0.0, 0.0, 10.0)).unwrap();
        assert!(reg.get(d).unwrap().is_anchor);
    }

    #[test]
    fn anchor_disabled_by_default() {
        let mut reg = MassRegistry::default();
        let a = reg.insert(new_mass(0.0, 0.0, 10.0)).unwrap();
        assert!(!reg.get(a).unwrap().is_anchor);
    }

    #[test]
    fn render_translation_lifts_by_radius() {
        let mut reg = MassRegistry::new(5, false);
        let a = reg.insert(new_mass(3.0, 4.0, 10.0)).unwrap();
        assert_eq!(reg.get(a).unwrap().render_translation(), Vec3::new(3.0, 5.0, 4.0));
    }

    #[test]
    fn pick_returns_nearest_hit() {
        let mut reg = MassRegistry::new(5, false);
        let near = reg.insert(new_mass(0.0, 100.0, 10.0)).unwrap();
        let _far = reg.insert(new_mass(0.0, -100.0, 10.0)).unwrap();
        // Looking down -Z from z = 300 at sphere height.
        let hit = pick_mass(&reg, Vec3::new(0.0, 5.0, 300.0), Vec3::NEG_Z);
        assert_eq!(hit, Some(near));
    }

    #[test]
    fn pick_misses_return_none() {
        let mut reg = MassRegistry::new(5, false);
        reg.insert(new_mass(0.0, 0.0, 10.0)).unwrap();
        assert_eq!(pick_mass(&reg, Vec3::new(100.0, 5.0, 300.0), Vec3::NEG_Z), None);
        // Sphere behind the ray origin.
        assert_eq!(pick_mass(&reg, Vec3::new(0.0, 5.0, -300.0), Vec3::NEG_Z), None);
    }
}
