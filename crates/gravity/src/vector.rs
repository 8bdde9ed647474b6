//! Angle helpers on top of `nalgebra` points and vectors.
//!
//! Positions are `Point2<f64>`; velocities, accelerations and forces are
//! `Vector2<f64>`. In-place addition and the zero value come from nalgebra
//! (`+=`, `Vector2::zeros()`, `Point2::origin()`), so only the angular
//! queries live here.

use nalgebra::{Point2, Vector2};

/// Polar angle of a 2D quantity, `atan2(y, x)`.
pub trait Heading {
    fn heading(&self) -> f64;
}

impl Heading for Vector2<f64> {
    fn heading(&self) -> f64 {
        self.y.atan2(self.x)
    }
}

impl Heading for Point2<f64> {
    fn heading(&self) -> f64 {
        self.y.atan2(self.x)
    }
}

/// Bearing from `from` toward `to`, `atan2(to.y - from.y, to.x - from.x)`.
///
/// # Examples
///
/// ```
/// use gravity::vector::angle_between;
/// use nalgebra::Point2;
///
/// let bearing = angle_between(&Point2::new(1.0, 1.0), &Point2::new(1.0, 3.0));
/// assert!((bearing - std::f64::consts::FRAC_PI_2).abs() < 1e-12);
/// ```
pub fn angle_between(from: &Point2<f64>, to: &Point2<f64>) -> f64 {
    (to - from).heading()
}

/// Wraps an angle difference into `(-π, π]`.
pub(crate) fn wrap_angle(delta: f64) -> f64 {
    use std::f64::consts::{PI, TAU};

    let wrapped = (delta + PI).rem_euclid(TAU) - PI;
    if wrapped == -PI { PI } else { wrapped }
}
