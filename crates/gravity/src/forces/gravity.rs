//! Direct pairwise gravity (O(N²))

use nalgebra::Vector2;

use crate::body::Body;
use crate::forces::{ForceModel, attraction};
use crate::quadtree::Probe;

/// Exact gravitational force by summing over every other body.
///
/// Serves as the reference the Barnes-Hut approximation converges to as
/// θ → 0, and as a baseline in benchmarks.
pub struct DirectGravity<'a> {
    bodies: &'a [Body],
    /// Gravitational constant
    pub g: f64,
    /// Softening length
    pub softening: f64,
}

impl<'a> DirectGravity<'a> {
    pub fn new(bodies: &'a [Body], g: f64) -> Self {
        Self {
            bodies,
            g,
            softening: 0.0,
        }
    }

    pub fn with_softening(bodies: &'a [Body], g: f64, softening: f64) -> Self {
        Self {
            bodies,
            g,
            softening,
        }
    }

    /// Total pairwise potential energy, each pair counted once
    pub fn potential_energy(&self) -> f64 {
        let eps2 = self.softening * self.softening;

        self.bodies
            .iter()
            .enumerate()
            .flat_map(|(i, a)| {
                self.bodies[i + 1..].iter().map(move |b| {
                    let r = ((a.position - b.position).magnitude_squared() + eps2).sqrt();
                    -self.g * a.mass() * b.mass() / r
                })
            })
            .sum()
    }
}

impl ForceModel for DirectGravity<'_> {
    fn force(&self, probe: &Probe, mass: f64) -> Vector2<f64> {
        self.bodies
            .iter()
            .enumerate()
            .filter(|(i, _)| Some(*i) != probe.skip)
            .map(|(_, other)| {
                let distance = (other.position - probe.position).magnitude();
                attraction(
                    probe.position,
                    mass,
                    other.position,
                    other.mass(),
                    distance,
                    self.g,
                    self.softening,
                )
            })
            .fold(Vector2::zeros(), |acc, f| acc + f)
    }
}
