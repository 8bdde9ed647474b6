//! A ring of small bodies around a heavy central mass
//!
//! Massive moonlets sweep up the lighter ring material over time. Prints a
//! line per simulated second with the body count, merges and energy.
//!
//! Run with: cargo run --package gravity --example planet_rings
//! Set RUST_LOG=gravity=debug to see every tick.

use std::f64::consts::TAU;

use anyhow::Result;
use gravity::body::Body;
use gravity::config::UniverseConfig;
use gravity::universe::Universe;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::info;
use tracing_subscriber::EnvFilter;

const CENTRAL_MASS: f64 = 1e16;
const MOONLETS: usize = 10;

fn ring(count: usize, min_distance: f64, max_distance: f64, seed: u64) -> Vec<Body> {
    let g = UniverseConfig::default().gravitational_constant;
    let mut rng = ChaCha8Rng::seed_from_u64(seed);

    let mut bodies = vec![Body::from_arrays([0.0, 0.0], [0.0, 0.0], CENTRAL_MASS)];
    let (light_min, light_max) = (CENTRAL_MASS / 1e6, CENTRAL_MASS / 1e5);

    for index in 0..count {
        let angle = rng.random_range(0.0..TAU);
        let distance = rng.random_range(min_distance..max_distance);
        let speed = (g * CENTRAL_MASS / distance).sqrt();
        let mass = if index < MOONLETS {
            10.0 * light_max
        } else {
            rng.random_range(light_min..light_max)
        };

        // Clockwise circular orbit
        bodies.push(Body::from_arrays(
            [angle.cos() * distance, angle.sin() * distance],
            [angle.sin() * speed, -angle.cos() * speed],
            mass,
        ));
    }

    bodies
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let config = UniverseConfig::load_or_default("gravity.toml");
    let seconds = 20;
    let steps_per_second = config.steps_per_second as usize;

    let mut universe = Universe::new(config)?;
    universe.set_bodies(ring(600, 100.0, 200.0, 7))?;

    println!("Planet rings: {} bodies\n", universe.body_count());
    println!("{}", "=".repeat(60));

    let initial_mass = universe.total_mass();

    for second in 1..=seconds {
        let report = universe.run(steps_per_second)?;
        let energy = universe.kinetic_energy() + universe.potential_energy();

        println!(
            "t={:>3}s  bodies={:>4}  merged={:>3}  culled={:>2}  E={:.4e}",
            second, report.bodies, report.merged, report.culled, energy
        );
    }

    let drift = (universe.total_mass() - initial_mass).abs() / initial_mass;
    info!(drift, "mass drift after {} steps", universe.steps());

    if let Some(tree) = universe.tree() {
        println!(
            "\nFinal tree: {} nodes, {} leaves, depth {}",
            tree.node_count(),
            tree.leaf_count(),
            tree.depth()
        );
    }

    Ok(())
}
