use std::f64::consts::{FRAC_PI_2, PI};

use approx::assert_relative_eq;
use nalgebra::{Point2, Vector2};

use crate::vector::{Heading, angle_between, wrap_angle};

#[test]
fn test_heading_of_vector() {
    assert_relative_eq!(Vector2::new(1.0, 0.0).heading(), 0.0);
    assert_relative_eq!(Vector2::new(0.0, 2.0).heading(), FRAC_PI_2);
    assert_relative_eq!(Vector2::new(-1.0, 0.0).heading(), PI);
    assert_relative_eq!(Vector2::new(0.0, -3.0).heading(), -FRAC_PI_2);
}

#[test]
fn test_heading_of_point() {
    assert_relative_eq!(Point2::new(1.0, 1.0).heading(), PI / 4.0);
}

#[test]
fn test_angle_between() {
    let from = Point2::new(2.0, 2.0);

    assert_relative_eq!(angle_between(&from, &Point2::new(5.0, 2.0)), 0.0);
    assert_relative_eq!(angle_between(&from, &Point2::new(2.0, -1.0)), -FRAC_PI_2);
}

#[test]
fn test_wrap_angle() {
    assert_relative_eq!(wrap_angle(0.25), 0.25);
    assert_relative_eq!(wrap_angle(-0.25), -0.25);

    // Crossing the ±π seam is a small step, not a full turn
    let across = wrap_angle(-PI + 0.1 - (PI - 0.1));
    assert_relative_eq!(across, 0.2, epsilon = 1e-12);

    assert_relative_eq!(wrap_angle(-PI), PI);
}
