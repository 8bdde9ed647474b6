use std::f64::consts::PI;

use nalgebra::{Point2, Vector2};

/// Divisor applied to the unit-density sphere radius to get a display and
/// collision radius.
pub const RADIUS_SCALE: f64 = 1e4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BodyId(pub u32);

/// A point mass.
///
/// `mass` and `radius` are private so the radius can never drift from the
/// mass: every mass write goes through [`Body::set_mass`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Body {
    pub id: BodyId,
    pub position: Point2<f64>,
    pub velocity: Vector2<f64>,
    pub acceleration: Vector2<f64>,
    mass: f64,
    radius: f64,
}

/// Radius of a sphere whose volume equals `mass`, scaled by [`RADIUS_SCALE`].
///
/// # Examples
///
/// ```
/// use gravity::body::{radius_for_mass, RADIUS_SCALE};
///
/// let mass = 4.0 / 3.0 * std::f64::consts::PI * 1e12;
/// assert!((radius_for_mass(mass) - 1e4 / RADIUS_SCALE).abs() < 1e-9);
/// ```
pub fn radius_for_mass(mass: f64) -> f64 {
    (3.0 * mass / (4.0 * PI)).cbrt() / RADIUS_SCALE
}

impl Body {
    /// Creates a body with zero acceleration. The id is assigned by the
    /// `Universe` the body is handed to.
    pub fn new(position: Point2<f64>, velocity: Vector2<f64>, mass: f64) -> Self {
        Body {
            id: BodyId(0),
            position,
            velocity,
            acceleration: Vector2::zeros(),
            mass,
            radius: radius_for_mass(mass),
        }
    }

    /// Convenience constructor from raw arrays
    pub fn from_arrays(position: [f64; 2], velocity: [f64; 2], mass: f64) -> Self {
        Self::new(
            Point2::new(position[0], position[1]),
            Vector2::new(velocity[0], velocity[1]),
            mass,
        )
    }

    pub fn with_acceleration(mut self, acceleration: Vector2<f64>) -> Self {
        self.acceleration = acceleration;
        self
    }

    pub fn mass(&self) -> f64 {
        self.mass
    }

    /// Sets the mass and recomputes the radius in the same write.
    pub fn set_mass(&mut self, mass: f64) {
        self.mass = mass;
        self.radius = radius_for_mass(mass);
    }

    pub fn radius(&self) -> f64 {
        self.radius
    }

    pub fn momentum(&self) -> Vector2<f64> {
        self.velocity * self.mass
    }

    pub fn kinetic_energy(&self) -> f64 {
        0.5 * self.mass * self.velocity.magnitude_squared()
    }

    pub fn distance_to(&self, other: &Body) -> f64 {
        (self.position - other.position).magnitude()
    }

    /// Distance from the origin
    pub fn orbital_radius(&self) -> f64 {
        self.position.coords.magnitude()
    }

    pub fn speed(&self) -> f64 {
        self.velocity.magnitude()
    }
}

// Implement Massive trait for Body to work with the quadtree
impl crate::quadtree::Massive for Body {
    fn position(&self) -> Point2<f64> {
        self.position
    }

    fn mass(&self) -> f64 {
        self.mass
    }

    fn radius(&self) -> f64 {
        self.radius
    }
}
