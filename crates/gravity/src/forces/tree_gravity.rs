//! Tree-based gravity using the Barnes-Hut algorithm (O(N log N))

use nalgebra::Vector2;

use crate::forces::{ForceModel, attraction};
use crate::quadtree::{Probe, QuadTree};

/// Barnes-Hut gravitational force over a finished quadtree
///
/// # Opening Angle (θ)
///
/// A node of width `s` at distance `d` is opened when `s / d ≥ θ`:
/// - θ = 0.0: every body individually (same as `DirectGravity`)
/// - θ = 0.5: good accuracy, moderately fast
/// - θ = 1.0 and above: coarse, very fast
///
/// # Examples
///
/// ```
/// use gravity::body::Body;
/// use gravity::forces::{ForceModel, TreeGravity, G};
/// use gravity::quadtree::{Probe, QuadTree, Square};
///
/// let bodies = vec![
///     Body::from_arrays([0.0, 0.0], [0.0, 0.0], 1e16),
///     Body::from_arrays([0.0, 300.0], [0.0, 0.0], 1e12),
/// ];
/// let square = Square::enclosing(&bodies, 50.0).unwrap();
/// let (tree, _) = QuadTree::build(&bodies, square, false).unwrap();
///
/// let gravity = TreeGravity::new(&tree, 0.5, G);
/// let force = gravity.force(&Probe::body(1, bodies[1].position), bodies[1].mass());
/// assert!(force.y < 0.0);
/// ```
pub struct TreeGravity<'a> {
    tree: &'a QuadTree,
    /// Opening angle parameter
    pub theta: f64,
    /// Gravitational constant
    pub g: f64,
    /// Softening length
    pub softening: f64,
}

impl<'a> TreeGravity<'a> {
    pub fn new(tree: &'a QuadTree, theta: f64, g: f64) -> Self {
        Self {
            tree,
            theta,
            g,
            softening: 0.0,
        }
    }

    pub fn with_softening(tree: &'a QuadTree, theta: f64, g: f64, softening: f64) -> Self {
        Self {
            tree,
            theta,
            g,
            softening,
        }
    }
}

impl ForceModel for TreeGravity<'_> {
    fn force(&self, probe: &Probe, mass: f64) -> Vector2<f64> {
        self.tree
            .virtual_bodies(probe, self.theta)
            .iter()
            .map(|vb| {
                attraction(
                    probe.position,
                    mass,
                    vb.position,
                    vb.mass,
                    vb.distance,
                    self.g,
                    self.softening,
                )
            })
            .fold(Vector2::zeros(), |acc, f| acc + f)
    }
}
