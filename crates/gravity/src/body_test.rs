use std::f64::consts::PI;

use approx::assert_relative_eq;
use nalgebra::{Point2, Vector2};

use crate::body::{Body, BodyId, RADIUS_SCALE, radius_for_mass};

#[test]
fn test_new_body() {
    let body = Body::new(Point2::new(1.0, 2.0), Vector2::new(3.0, 4.0), 1e12);

    assert_eq!(body.id, BodyId(0));
    assert_eq!(body.position, Point2::new(1.0, 2.0));
    assert_eq!(body.velocity, Vector2::new(3.0, 4.0));
    assert_eq!(body.acceleration, Vector2::zeros());
    assert_eq!(body.mass(), 1e12);
}

#[test]
fn test_radius_from_mass() {
    let body = Body::from_arrays([0.0, 0.0], [0.0, 0.0], 1e12);

    let expected = (3.0 * 1e12 / (4.0 * PI)).cbrt() / RADIUS_SCALE;
    assert_relative_eq!(body.radius(), expected, max_relative = 1e-12);
    // ~0.62 for 1e12
    assert!(body.radius() > 0.6 && body.radius() < 0.63);
}

#[test]
fn test_set_mass_updates_radius() {
    let mut body = Body::from_arrays([0.0, 0.0], [0.0, 0.0], 1e12);
    let before = body.radius();

    body.set_mass(8e12);

    assert_eq!(body.mass(), 8e12);
    // Volume scales with mass, so the radius doubles
    assert_relative_eq!(body.radius(), 2.0 * before, max_relative = 1e-12);
    assert_eq!(body.radius(), radius_for_mass(8e12));
}

#[test]
fn test_momentum() {
    let body = Body::from_arrays([1.0, 0.0], [3.0, 4.0], 2.0);

    assert_eq!(body.momentum(), Vector2::new(6.0, 8.0));
}

#[test]
fn test_kinetic_energy() {
    let body = Body::from_arrays([0.0, 0.0], [3.0, 4.0], 2.0);

    // KE = 0.5 * 2 * 25
    assert_eq!(body.kinetic_energy(), 25.0);
}

#[test]
fn test_distance_to() {
    let a = Body::from_arrays([0.0, 0.0], [0.0, 0.0], 1.0);
    let b = Body::from_arrays([3.0, 4.0], [0.0, 0.0], 1.0);

    assert_eq!(a.distance_to(&b), 5.0);
    assert_eq!(b.distance_to(&a), 5.0);
}

#[test]
fn test_orbital_radius_and_speed() {
    let body = Body::from_arrays([-6.0, 8.0], [0.0, -2.0], 1.0);

    assert_eq!(body.orbital_radius(), 10.0);
    assert_eq!(body.speed(), 2.0);
}

#[test]
fn test_with_acceleration() {
    let body = Body::from_arrays([0.0, 0.0], [0.0, 0.0], 1.0)
        .with_acceleration(Vector2::new(0.5, -0.5));

    assert_eq!(body.acceleration, Vector2::new(0.5, -0.5));
}
