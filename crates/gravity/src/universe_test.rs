use approx::assert_relative_eq;
use nalgebra::{Point2, Vector2};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::body::{Body, BodyId};
use crate::config::UniverseConfig;
use crate::error::{ConfigError, SimulationError};
use crate::forces::G;
use crate::quadtree::NodeKind;
use crate::universe::Universe;

const CENTRAL_MASS: f64 = 1e16;
const ORBIT_RADIUS: f64 = 200.0;

fn universe() -> Universe {
    Universe::new(UniverseConfig::default()).unwrap()
}

/// Light body on a circular orbit around a heavy one at the origin
fn orbiting_pair(config: UniverseConfig) -> (Universe, BodyId) {
    let mut universe = Universe::new(config).unwrap();
    let speed = (G * CENTRAL_MASS / ORBIT_RADIUS).sqrt();

    universe
        .add_body(Point2::origin(), Vector2::zeros(), CENTRAL_MASS)
        .unwrap();
    let moon = universe
        .add_body(Point2::new(ORBIT_RADIUS, 0.0), Vector2::new(0.0, speed), 1.0)
        .unwrap();

    (universe, moon)
}

#[test]
fn test_new_rejects_invalid_config() {
    let result = Universe::new(UniverseConfig::default().with_steps_per_second(0));
    assert!(matches!(result, Err(ConfigError::StepsPerSecond(0))));
}

#[test]
fn test_add_body_assigns_sequential_ids() {
    let mut universe = universe();

    let a = universe.add_body(Point2::origin(), Vector2::zeros(), 1.0).unwrap();
    let b = universe.add_body(Point2::new(5.0, 0.0), Vector2::zeros(), 2.0).unwrap();

    assert_eq!(a, BodyId(0));
    assert_eq!(b, BodyId(1));
    assert_eq!(universe.body(b).unwrap().mass(), 2.0);
    assert_eq!(universe.body_count(), 2);
}

#[test]
fn test_add_body_rejects_bad_mass() {
    let mut universe = universe();

    for mass in [0.0, -1.0, f64::NAN, f64::INFINITY] {
        let result = universe.add_body(Point2::origin(), Vector2::zeros(), mass);
        assert!(matches!(result, Err(SimulationError::InvalidBody { .. })));
    }
    assert_eq!(universe.body_count(), 0);

    // Rejections do not use up ids
    let id = universe.add_body(Point2::origin(), Vector2::zeros(), 1.0).unwrap();
    assert_eq!(id, BodyId(0));
}

#[test]
fn test_set_bodies_replaces_and_renumbers() {
    let mut universe = universe();
    universe.add_body(Point2::origin(), Vector2::zeros(), 1.0).unwrap();

    universe
        .set_bodies(vec![
            Body::from_arrays([1.0, 0.0], [0.0, 0.0], 1.0),
            Body::from_arrays([2.0, 0.0], [0.0, 0.0], 1.0),
        ])
        .unwrap();

    let ids: Vec<BodyId> = universe.bodies().iter().map(|b| b.id).collect();
    assert_eq!(ids, vec![BodyId(1), BodyId(2)]);
}

#[test]
fn test_set_bodies_is_all_or_nothing() {
    let mut universe = universe();
    universe.add_body(Point2::origin(), Vector2::zeros(), 1.0).unwrap();

    let result = universe.set_bodies(vec![
        Body::from_arrays([1.0, 0.0], [0.0, 0.0], 1.0),
        Body::from_arrays([2.0, 0.0], [0.0, 0.0], -3.0),
    ]);

    assert!(matches!(result, Err(SimulationError::InvalidBody { mass, .. }) if mass == -3.0));
    assert_eq!(universe.body_count(), 1);
}

#[test]
fn test_remove_body() {
    let mut universe = universe();
    let a = universe.add_body(Point2::origin(), Vector2::zeros(), 1.0).unwrap();
    let b = universe.add_body(Point2::new(9.0, 0.0), Vector2::zeros(), 1.0).unwrap();

    assert_eq!(universe.remove_body(a).map(|body| body.id), Some(a));
    assert!(universe.remove_body(a).is_none());
    assert!(universe.body(b).is_some());
}

#[test]
fn test_clear_resets_clock() {
    let (mut universe, _) = orbiting_pair(UniverseConfig::default());
    universe.run(3).unwrap();

    universe.clear();

    assert_eq!(universe.body_count(), 0);
    assert_eq!(universe.steps(), 0);
    assert_eq!(universe.time(), 0.0);
    assert!(universe.tree().is_none());
}

#[test]
fn test_tick_on_empty_universe() {
    let mut universe = universe();

    let report = universe.tick().unwrap();

    assert_eq!(report.step, 1);
    assert_eq!(report.bodies, 0);
    assert!(universe.tree().is_none());
    assert_relative_eq!(universe.time(), 1.0 / 30.0);
}

#[test]
fn test_lone_body_drifts() {
    let mut universe = universe();
    let id = universe
        .add_body(Point2::new(10.0, 0.0), Vector2::new(3.0, 0.0), 1e12)
        .unwrap();

    universe.run(30).unwrap();

    let body = universe.body(id).unwrap();
    assert_relative_eq!(body.position.x, 13.0, epsilon = 1e-9);
    assert_eq!(body.acceleration, Vector2::zeros());
}

#[test]
fn test_cull_boundary() {
    let mut universe = universe();
    let on_edge = universe
        .add_body(Point2::new(2000.0, 0.0), Vector2::zeros(), 1.0)
        .unwrap();
    let outside = universe
        .add_body(Point2::new(0.0, -2000.001), Vector2::zeros(), 1.0)
        .unwrap();

    let report = universe.tick().unwrap();

    assert_eq!(report.culled, 1);
    assert!(universe.body(on_edge).is_some());
    assert!(universe.body(outside).is_none());
}

#[test]
fn test_cull_removes_non_finite_positions() {
    let mut universe = universe();
    universe
        .add_body(Point2::new(f64::NAN, 0.0), Vector2::zeros(), 1.0)
        .unwrap();
    universe
        .add_body(Point2::new(f64::INFINITY, 0.0), Vector2::zeros(), 1.0)
        .unwrap();
    universe.add_body(Point2::origin(), Vector2::zeros(), 1.0).unwrap();

    let report = universe.tick().unwrap();

    assert_eq!(report.culled, 2);
    assert_eq!(universe.body_count(), 1);
}

#[test]
fn test_circular_orbit() {
    let (mut universe, moon) = orbiting_pair(UniverseConfig::default());

    // About one full period
    for _ in 0..650 {
        universe.tick().unwrap();
        let r = universe.body(moon).unwrap().orbital_radius();
        assert!((r - ORBIT_RADIUS).abs() / ORBIT_RADIUS < 0.02, "radius {r}");
    }

    let moon = universe.body(moon).unwrap();
    let expected_accel = G * CENTRAL_MASS / (ORBIT_RADIUS * ORBIT_RADIUS);
    assert_relative_eq!(moon.acceleration.magnitude(), expected_accel, max_relative = 0.05);
}

#[test]
fn test_one_tick_matches_semi_implicit_euler() {
    let (mut universe, moon) = orbiting_pair(UniverseConfig::default());
    let speed = (G * CENTRAL_MASS / ORBIT_RADIUS).sqrt();
    let accel = G * CENTRAL_MASS / (ORBIT_RADIUS * ORBIT_RADIUS);

    universe.tick().unwrap();

    let moon = universe.body(moon).unwrap();
    assert_relative_eq!(moon.acceleration.x, -accel, max_relative = 1e-12);
    assert_eq!(moon.acceleration.y, 0.0);
    assert_relative_eq!(moon.velocity.x, -accel / 30.0, max_relative = 1e-12);
    assert_relative_eq!(moon.velocity.y, speed, max_relative = 1e-12);
    assert_relative_eq!(
        moon.position.x,
        ORBIT_RADIUS - accel / 900.0,
        max_relative = 1e-12
    );
    assert_relative_eq!(moon.position.y, speed / 30.0, max_relative = 1e-12);

    assert_relative_eq!(moon.velocity.x, -0.5561733333333334, max_relative = 1e-12);
    assert_relative_eq!(moon.position.x, 199.98146088888888, max_relative = 1e-12);
}

#[test]
fn test_collision_merges_bodies() {
    let mut universe = universe();
    let a = universe
        .add_body(Point2::new(0.0, 0.0), Vector2::new(1.0, 0.0), 1e12)
        .unwrap();
    let b = universe
        .add_body(Point2::new(0.1, 0.0), Vector2::new(0.0, 3.0), 3e12)
        .unwrap();
    let momentum = universe.total_momentum();

    let report = universe.tick().unwrap();

    assert_eq!(report.merged, 1);
    assert_eq!(universe.body_count(), 1);
    assert!(universe.body(b).is_none());

    let survivor = universe.body(a).unwrap();
    assert_relative_eq!(survivor.mass(), 4e12);
    assert_relative_eq!(survivor.velocity.x, 0.25, epsilon = 1e-12);
    assert_relative_eq!(survivor.velocity.y, 2.25, epsilon = 1e-12);
    assert_relative_eq!(universe.total_momentum().x, momentum.x, max_relative = 1e-12);
}

#[test]
fn test_collisions_disabled() {
    let mut universe = Universe::new(UniverseConfig::default().with_collisions(false)).unwrap();
    universe
        .add_body(Point2::new(0.0, 0.0), Vector2::zeros(), 1e12)
        .unwrap();
    universe
        .add_body(Point2::new(0.1, 0.0), Vector2::zeros(), 1e12)
        .unwrap();

    let report = universe.tick().unwrap();

    assert_eq!(report.merged, 0);
    assert_eq!(universe.body_count(), 2);
}

/// Two coincident bodies and a distant third, never merged
fn coincident_trio(softening: f64) -> Universe {
    let config = UniverseConfig::default()
        .with_collisions(false)
        .with_softening(softening);
    let mut universe = Universe::new(config).unwrap();
    for x in [1.0, 1.0, 100.0] {
        universe
            .add_body(Point2::new(x, 1.0), Vector2::zeros(), 1e12)
            .unwrap();
    }
    universe
}

#[test]
fn test_coincident_bodies_keep_ticking_with_softening() {
    let mut universe = coincident_trio(1.0);

    for step in 1..=3 {
        let report = universe.tick().unwrap();
        assert_eq!(report.step, step);
        assert_eq!(report.bodies, 3);
    }

    assert_eq!(universe.steps(), 3);
    assert_relative_eq!(universe.time(), 3.0 / 30.0);
    assert!(universe.bodies().iter().all(|b| {
        b.position.coords.iter().all(|c| c.is_finite())
    }));
    // Both coincident bodies feel the same pull from the third
    let bodies = universe.bodies();
    assert_eq!(bodies[0].position, bodies[1].position);
    assert!(bodies[0].velocity.x > 0.0);
}

#[test]
fn test_coincident_bodies_without_softening_are_culled() {
    let mut universe = coincident_trio(0.0);

    universe.tick().unwrap();
    assert!(universe.bodies()[0].position.x.is_nan());
    assert!(universe.bodies()[2].position.x.is_finite());

    let report = universe.tick().unwrap();
    assert_eq!(report.culled, 2);
    assert_eq!(report.bodies, 1);
    assert_eq!(universe.steps(), 2);
}

#[test]
fn test_unresolvable_neighbours_still_tick() {
    let mut universe = Universe::new(UniverseConfig::default().with_collisions(false)).unwrap();
    universe
        .add_body(Point2::new(1e-20, 0.0), Vector2::zeros(), 1.0)
        .unwrap();
    universe
        .add_body(Point2::new(2e-20, 0.0), Vector2::zeros(), 1.0)
        .unwrap();

    let first = universe.tick().unwrap();
    assert_eq!(first.bodies, 2);
    assert!(universe.tree().is_some());

    // The pull at 1e-20 flings both far past the outward bound
    let second = universe.tick().unwrap();
    assert_eq!(second.culled, 2);
    assert_eq!(universe.steps(), 2);
}

#[test]
fn test_tree_rebuilt_after_merge() {
    let mut universe = universe();
    universe
        .add_body(Point2::new(0.0, 0.0), Vector2::zeros(), 1e12)
        .unwrap();
    let absorbed = universe
        .add_body(Point2::new(0.05, 0.0), Vector2::zeros(), 1e12)
        .unwrap();
    universe
        .add_body(Point2::new(150.0, -90.0), Vector2::zeros(), 1e12)
        .unwrap();

    universe.tick().unwrap();

    let tree = universe.tree().unwrap();
    assert_eq!(tree.leaf_count(), 2);
    assert_relative_eq!(tree.total_mass(), universe.total_mass());

    let snapshot = universe.tree_snapshot().unwrap();
    assert_eq!(snapshot.state, NodeKind::Internal);
    let labels: Vec<u32> = snapshot
        .children
        .iter()
        .filter_map(|c| c.body)
        .collect();
    assert!(!labels.contains(&absorbed.0));
}

#[test]
fn test_mass_conserved_over_many_ticks() {
    let config = UniverseConfig::default().with_outward_bound_limit(f64::INFINITY);
    let mut universe = Universe::new(config).unwrap();
    let mut rng = ChaCha8Rng::seed_from_u64(99);

    for _ in 0..200 {
        universe
            .add_body(
                Point2::new(rng.random_range(-60.0..60.0), rng.random_range(-60.0..60.0)),
                Vector2::new(rng.random_range(-2.0..2.0), rng.random_range(-2.0..2.0)),
                rng.random_range(1e11..1e13),
            )
            .unwrap();
    }
    let mass = universe.total_mass();

    let report = universe.run(60).unwrap();

    assert_eq!(report.step, 60);
    assert_eq!(report.culled, 0);
    assert_eq!(report.bodies, 200 - report.merged);
    assert_relative_eq!(universe.total_mass(), mass, max_relative = 1e-9);
}

#[test]
fn test_tree_cleared_by_mutation() {
    let (mut universe, _) = orbiting_pair(UniverseConfig::default());
    universe.tick().unwrap();
    assert!(universe.tree().is_some());

    universe
        .add_body(Point2::new(-50.0, 0.0), Vector2::zeros(), 1.0)
        .unwrap();

    assert!(universe.tree().is_none());
    assert!(universe.tree_snapshot().is_none());
}

#[test]
fn test_project_path_unknown_body() {
    let universe = universe();

    assert_eq!(
        universe.project_path(BodyId(7)),
        Err(SimulationError::UnknownBody(BodyId(7)))
    );
}

#[test]
fn test_project_path_stops_short_of_full_orbit() {
    let (mut universe, moon) = orbiting_pair(UniverseConfig::default());
    universe.tick().unwrap();
    let before = universe.bodies().to_vec();

    let path = universe.project_path(moon).unwrap();

    // One period is ~650 steps; the preview covers 1.95π of it
    assert!(path.len() > 550 && path.len() < 700, "{} samples", path.len());
    assert!(path.iter().all(|p| (p.coords.magnitude() - ORBIT_RADIUS).abs() < 5.0));
    assert_eq!(universe.bodies(), &before[..]);
}

#[test]
fn test_project_path_without_tree() {
    let (universe, moon) = orbiting_pair(UniverseConfig::default());
    assert!(universe.tree().is_none());

    let path = universe.project_path(moon).unwrap();

    assert!(!path.is_empty());
    assert!(path[0].y > 0.0);
}

#[test]
fn test_project_path_capped_by_max_steps() {
    let mut config = UniverseConfig::default();
    config.projection.max_steps = 40;
    let mut universe = Universe::new(config).unwrap();
    let id = universe
        .add_body(Point2::new(100.0, 0.0), Vector2::new(1.0, 0.0), 1.0)
        .unwrap();

    let path = universe.project_path(id).unwrap();

    assert_eq!(path.len(), 40);
    assert_relative_eq!(path[39].x, 100.0 + 40.0 / 30.0, epsilon = 1e-9);
}

#[test]
fn test_energy_diagnostics() {
    let (universe, _) = orbiting_pair(UniverseConfig::default());

    let speed_sq = G * CENTRAL_MASS / ORBIT_RADIUS;
    assert_relative_eq!(universe.kinetic_energy(), 0.5 * speed_sq, max_relative = 1e-12);
    assert_relative_eq!(
        universe.potential_energy(),
        -G * CENTRAL_MASS / ORBIT_RADIUS,
        max_relative = 1e-12
    );
}
