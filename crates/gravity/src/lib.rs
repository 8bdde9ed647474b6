//! Barnes-Hut gravity for 2D point masses.
//!
//! Bodies are organised in a quadtree rebuilt every step. Distant groups of
//! bodies act as a single mass at their center of mass, touching bodies merge
//! inelastically, and positions advance with semi-implicit Euler.
//!
//! ```
//! use gravity::config::UniverseConfig;
//! use gravity::universe::Universe;
//! use nalgebra::{Point2, Vector2};
//!
//! let mut universe = Universe::new(UniverseConfig::default()).unwrap();
//! universe.add_body(Point2::origin(), Vector2::zeros(), 1e16).unwrap();
//! universe.add_body(Point2::new(200.0, 0.0), Vector2::new(0.0, 57.8), 1e12).unwrap();
//!
//! let report = universe.tick().unwrap();
//! assert_eq!(report.bodies, 2);
//! ```

pub mod body;
pub mod collisions;
pub mod config;
pub mod error;
pub mod forces;
pub mod integrator;
pub mod quadtree;
pub mod universe;
pub mod vector;

pub use body::{Body, BodyId};
pub use config::{ProjectionConfig, UniverseConfig};
pub use error::{ConfigError, SimulationError, TreeError};
pub use universe::{TickReport, Universe};

#[cfg(test)]
mod body_test;
#[cfg(test)]
mod universe_test;
#[cfg(test)]
mod vector_test;
