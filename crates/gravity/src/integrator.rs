//! Time integration
//!
//! The engine advances bodies with semi-implicit (symplectic) Euler: the
//! velocity is updated from the current acceleration first, then the position
//! from the updated velocity. Unlike explicit Euler it keeps orbits bounded
//! over long runs at the same cost.

use nalgebra::Vector2;

use crate::body::Body;

/// Advances bodies given the net force acting on them
pub trait Integrator: Send + Sync {
    /// Advance one body by `dt` under `force`
    fn step(&self, body: &mut Body, force: Vector2<f64>, dt: f64);

    /// Advance every body by `dt`; `forces[i]` acts on `bodies[i]`
    fn step_all(&self, bodies: &mut [Body], forces: &[Vector2<f64>], dt: f64) {
        debug_assert_eq!(bodies.len(), forces.len());
        bodies
            .iter_mut()
            .zip(forces.iter())
            .for_each(|(body, force)| self.step(body, *force, dt));
    }
}

/// Semi-implicit Euler (1st order, symplectic)
///
/// 1. `a = F / m`
/// 2. `v(t + dt) = v(t) + a·dt`
/// 3. `x(t + dt) = x(t) + v(t + dt)·dt`
///
/// # Examples
///
/// ```
/// use gravity::body::Body;
/// use gravity::integrator::{Integrator, SemiImplicitEuler};
/// use nalgebra::Vector2;
///
/// let mut body = Body::from_arrays([0.0, 0.0], [1.0, 0.0], 2.0);
/// SemiImplicitEuler.step(&mut body, Vector2::new(0.0, 4.0), 0.5);
///
/// assert_eq!(body.acceleration, Vector2::new(0.0, 2.0));
/// assert_eq!(body.velocity, Vector2::new(1.0, 1.0));
/// assert_eq!(body.position.coords, Vector2::new(0.5, 0.5));
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct SemiImplicitEuler;

impl Integrator for SemiImplicitEuler {
    fn step(&self, body: &mut Body, force: Vector2<f64>, dt: f64) {
        body.acceleration = force / body.mass();
        body.velocity += body.acceleration * dt;
        body.position += body.velocity * dt;
    }
}
