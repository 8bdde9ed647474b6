//! Collision grouping and perfectly inelastic merging.
//!
//! Collisions are detected while the quadtree is built: a body landing in a
//! leaf whose resident it touches is absorbed by that resident instead of
//! splitting the leaf. Every absorption found during one build is recorded
//! here, keyed by the surviving body's index, and merged in a single pass
//! once the build has finished.

use std::collections::{BTreeMap, BTreeSet};

use crate::body::Body;

/// Absorbed body indices grouped by the index of the body absorbing them.
///
/// Survivors iterate in index order and absorbed bodies in detection order,
/// so merging is deterministic for a fixed body ordering.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CollisionGroups {
    groups: BTreeMap<usize, Vec<usize>>,
}

impl CollisionGroups {
    /// Records that `absorbed` collided with, and will be merged into, `survivor`.
    pub fn record(&mut self, survivor: usize, absorbed: usize) {
        self.groups.entry(survivor).or_default().push(absorbed);
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Number of distinct survivors
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    /// Total number of bodies that will disappear
    pub fn absorbed_count(&self) -> usize {
        self.groups.values().map(Vec::len).sum()
    }

    pub fn absorbed_by(&self, survivor: usize) -> Option<&[usize]> {
        self.groups.get(&survivor).map(Vec::as_slice)
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, &[usize])> {
        self.groups.iter().map(|(&s, a)| (s, a.as_slice()))
    }
}

/// Folds `absorbed` into `survivor`.
///
/// Position, velocity and acceleration become mass-weighted means, then the
/// masses add up (which also updates the survivor's radius).
///
/// # Examples
///
/// ```
/// use gravity::body::Body;
/// use gravity::collisions::absorb;
///
/// let mut a = Body::from_arrays([0.0, 0.0], [0.0, 0.0], 1.0);
/// let b = Body::from_arrays([4.0, 0.0], [0.0, 0.0], 3.0);
///
/// absorb(&mut a, &b);
///
/// assert_eq!(a.position.x, 3.0);
/// assert_eq!(a.mass(), 4.0);
/// ```
pub fn absorb(survivor: &mut Body, absorbed: &Body) {
    let (ma, mb) = (survivor.mass(), absorbed.mass());
    let total = ma + mb;

    survivor.position.coords = (survivor.position.coords * ma + absorbed.position.coords * mb) / total;
    survivor.velocity = (survivor.velocity * ma + absorbed.velocity * mb) / total;
    survivor.acceleration = (survivor.acceleration * ma + absorbed.acceleration * mb) / total;
    survivor.set_mass(total);
}

/// Merges every group into its survivor and removes the absorbed bodies.
///
/// The remaining bodies keep their relative order. Returns the number of
/// bodies removed.
pub fn resolve_collisions(bodies: &mut Vec<Body>, groups: &CollisionGroups) -> usize {
    if groups.is_empty() {
        return 0;
    }

    let mut removed: BTreeSet<usize> = BTreeSet::new();

    for (survivor, absorbed) in groups.iter() {
        for &index in absorbed {
            let other = bodies[index];
            absorb(&mut bodies[survivor], &other);
            removed.insert(index);
        }
    }

    let mut index = 0;
    bodies.retain(|_| {
        let keep = !removed.contains(&index);
        index += 1;
        keep
    });

    removed.len()
}
