//! Predicted path of one body against a frozen universe
//!
//! Places a few bodies on circular orbits, projects the path of the outermost
//! one, then steps the real simulation for the same number of steps and
//! compares where it ends up.
//!
//! Run with: cargo run --package gravity --example orbit_preview

use anyhow::{Context, Result};
use gravity::config::UniverseConfig;
use gravity::universe::Universe;
use gravity::vector::Heading;
use nalgebra::{Point2, Vector2};
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let config = UniverseConfig::default();
    let g = config.gravitational_constant;
    let mut universe = Universe::new(config)?;

    universe.add_body(Point2::origin(), Vector2::zeros(), 1e16)?;
    let mut outermost = None;
    for distance in [130.0, 220.0, 310.0, 400.0] {
        let speed = (g * 1e16 / distance).sqrt();
        outermost = Some(universe.add_body(
            Point2::new(distance, 0.0),
            Vector2::new(0.0, -speed),
            1e12,
        )?);
    }
    let id = outermost.context("no orbiting bodies")?;

    universe.tick()?;
    let path = universe.project_path(id)?;
    let (first, last) = (
        path.first().context("empty projection")?,
        path.last().context("empty projection")?,
    );

    println!("Projected {} steps for body {}", path.len(), id.0);
    println!(
        "  start ({:8.2}, {:8.2})  angle {:6.3}",
        first.x,
        first.y,
        first.heading()
    );
    println!(
        "  end   ({:8.2}, {:8.2})  angle {:6.3}",
        last.x,
        last.y,
        last.heading()
    );

    universe.run(path.len())?;
    let actual = universe.body(id).context("body vanished")?.position;
    println!(
        "\nSimulated end ({:8.2}, {:8.2}), {:.2} from the projection",
        actual.x,
        actual.y,
        (actual - last).magnitude()
    );

    Ok(())
}
