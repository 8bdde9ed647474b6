//! Force models for the gravity engine
//!
//! This module provides the `ForceModel` trait with a Barnes-Hut
//! implementation backed by the quadtree and an exact pairwise one used as a
//! reference.

use nalgebra::{Point2, Vector2};

use crate::quadtree::Probe;

pub mod gravity;
pub mod tree_gravity;


pub use gravity::DirectGravity;
pub use tree_gravity::TreeGravity;

/// Newtonian gravitational constant in SI units (m³ kg⁻¹ s⁻²)
pub const G: f64 = 6.67408e-11;

/// A source of force on a point mass
///
/// # Examples
///
/// ```
/// use gravity::body::Body;
/// use gravity::forces::{DirectGravity, ForceModel, G};
/// use gravity::quadtree::Probe;
///
/// let bodies = vec![
///     Body::from_arrays([0.0, 0.0], [0.0, 0.0], 1e16),
///     Body::from_arrays([200.0, 0.0], [0.0, 0.0], 1e12),
/// ];
///
/// let gravity = DirectGravity::new(&bodies, G);
/// let force = gravity.force(&Probe::body(1, bodies[1].position), bodies[1].mass());
///
/// // Pulled back toward the heavy body at the origin
/// assert!(force.x < 0.0);
/// ```
pub trait ForceModel: Send + Sync {
    /// Net force on a body of `mass` located at `probe.position`, ignoring
    /// the body `probe.skip` refers to
    fn force(&self, probe: &Probe, mass: f64) -> Vector2<f64>;

    /// Acceleration, `force / mass`
    fn acceleration(&self, probe: &Probe, mass: f64) -> Vector2<f64> {
        self.force(probe, mass) / mass
    }
}

/// Newtonian attraction exerted on `mass` at `from` by `other_mass` at
/// `toward`, `distance` apart.
///
/// Uses `G·m·M / (d² + ε²)` along the unit vector toward the attractor. With
/// `softening = 0` and coincident points the result is NaN; any positive
/// softening makes it zero instead.
#[inline]
pub fn attraction(
    from: Point2<f64>,
    mass: f64,
    toward: Point2<f64>,
    other_mass: f64,
    distance: f64,
    g: f64,
    softening: f64,
) -> Vector2<f64> {
    let dist_sq = distance * distance + softening * softening;
    let dist = dist_sq.sqrt();

    // F = G m M r / |r|³
    (toward - from) * (g * mass * other_mass / (dist_sq * dist))
}
