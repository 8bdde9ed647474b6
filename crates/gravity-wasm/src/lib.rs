//! WASM bindings for the gravity engine.
//!
//! Exposes [`gravity::Universe`] to JavaScript so a browser canvas can drive
//! and draw the simulation.
//!
//! # Architecture
//!
//! Universes live in thread-local storage (WASM is single-threaded).
//! Functions return opaque IDs for referencing mutable state, and serializable
//! snapshots for reading state.
//!
//! # Example Usage (JavaScript)
//!
//! ```javascript
//! const id = universe_create({ stepsPerSecond: 60, collisions: true });
//!
//! universe_add_body(id, { position: [0, 0], velocity: [0, 0], mass: 1e16 });
//! const moon = universe_add_body(id, {
//!   position: [200, 0],
//!   velocity: [0, circular_velocity(1e16, 200)],
//!   mass: 1e12,
//! });
//!
//! // Once per animation frame
//! universe_tick(id);
//! const bodies = universe_get_bodies(id);
//! const tree = universe_get_tree(id);
//! const path = universe_project_path(id, moon);
//! ```

use std::cell::RefCell;
use std::collections::HashMap;

use nalgebra::{Point2, Vector2};
use serde::{Deserialize, Serialize};
use wasm_bindgen::prelude::*;

use gravity::body::{Body, BodyId};
use gravity::config::{ProjectionConfig, UniverseConfig};
use gravity::forces::G;
use gravity::universe::{TickReport, Universe};

// =============================================================================
// Serialization helpers
// =============================================================================

fn to_js<T: Serialize>(value: &T) -> Result<JsValue, JsError> {
    serde_wasm_bindgen::to_value(value).map_err(|e| JsError::new(&e.to_string()))
}

fn from_js<T: serde::de::DeserializeOwned>(value: JsValue) -> Result<T, JsError> {
    serde_wasm_bindgen::from_value(value).map_err(|e| JsError::new(&e.to_string()))
}

fn not_found(id: u32) -> JsError {
    JsError::new(&format!("Universe {} not found", id))
}

// =============================================================================
// Thread-local storage for universes
// =============================================================================

thread_local! {
    static UNIVERSES: RefCell<HashMap<u32, Universe>> = RefCell::new(HashMap::new());
    static NEXT_UNIVERSE_ID: RefCell<u32> = const { RefCell::new(0) };
}

// =============================================================================
// Serializable types for JavaScript interop
// =============================================================================

/// Universe configuration as passed from JavaScript.
///
/// Every field is optional and defaults to [`UniverseConfig::default`].
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ConfigInput {
    pub steps_per_second: u32,
    pub gravitational_constant: f64,
    pub collisions: bool,
    pub theta: f64,
    pub outward_bound_limit: f64,
    pub tree_margin: f64,
    pub softening: f64,
    pub projection_max_steps: usize,
    pub projection_sweep_angle: f64,
}

impl Default for ConfigInput {
    fn default() -> Self {
        UniverseConfig::default().into()
    }
}

impl From<UniverseConfig> for ConfigInput {
    fn from(config: UniverseConfig) -> Self {
        Self {
            steps_per_second: config.steps_per_second,
            gravitational_constant: config.gravitational_constant,
            collisions: config.collisions,
            theta: config.theta,
            outward_bound_limit: config.outward_bound_limit,
            tree_margin: config.tree_margin,
            softening: config.softening,
            projection_max_steps: config.projection.max_steps,
            projection_sweep_angle: config.projection.sweep_angle,
        }
    }
}

impl From<ConfigInput> for UniverseConfig {
    fn from(input: ConfigInput) -> Self {
        Self {
            steps_per_second: input.steps_per_second,
            gravitational_constant: input.gravitational_constant,
            collisions: input.collisions,
            theta: input.theta,
            outward_bound_limit: input.outward_bound_limit,
            tree_margin: input.tree_margin,
            softening: input.softening,
            projection: ProjectionConfig {
                max_steps: input.projection_max_steps,
                sweep_angle: input.projection_sweep_angle,
            },
        }
    }
}

/// Body data for adding new bodies
#[derive(Clone, Debug, Deserialize)]
pub struct BodyInput {
    /// Position [x, y]
    pub position: [f64; 2],
    /// Velocity [x, y]
    #[serde(default)]
    pub velocity: [f64; 2],
    pub mass: f64,
}

impl From<BodyInput> for Body {
    fn from(input: BodyInput) -> Self {
        Body::from_arrays(input.position, input.velocity, input.mass)
    }
}

/// Body state snapshot for JavaScript
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BodySnapshot {
    pub id: u32,
    pub mass: f64,
    /// Display and collision radius
    pub radius: f64,
    pub position: [f64; 2],
    pub velocity: [f64; 2],
    pub acceleration: [f64; 2],
    /// Distance from the origin
    pub orbital_radius: f64,
    pub speed: f64,
}

impl From<&Body> for BodySnapshot {
    fn from(b: &Body) -> Self {
        Self {
            id: b.id.0,
            mass: b.mass(),
            radius: b.radius(),
            position: [b.position.x, b.position.y],
            velocity: [b.velocity.x, b.velocity.y],
            acceleration: [b.acceleration.x, b.acceleration.y],
            orbital_radius: b.orbital_radius(),
            speed: b.speed(),
        }
    }
}

/// Outcome of one or more ticks
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TickSnapshot {
    pub step: u64,
    /// Simulated seconds elapsed
    pub time: f64,
    pub culled: usize,
    pub merged: usize,
    pub bodies: usize,
}

impl TickSnapshot {
    fn new(report: TickReport, time: f64) -> Self {
        Self {
            step: report.step,
            time,
            culled: report.culled,
            merged: report.merged,
            bodies: report.bodies,
        }
    }
}

/// Complete universe state snapshot
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UniverseSnapshot {
    pub time: f64,
    pub steps: u64,
    pub bodies: Vec<BodySnapshot>,
    pub total_mass: f64,
    pub momentum: [f64; 2],
    pub kinetic_energy: f64,
    pub potential_energy: f64,
    /// Should stay roughly constant between merges
    pub total_energy: f64,
    pub outward_bound_limit: f64,
}

// =============================================================================
// Universe management functions
// =============================================================================

/// Create a new universe.
///
/// # Arguments
/// * `config` - Configuration object (camelCase fields), or `undefined` for
///   defaults
///
/// # Returns
/// A universe ID for use with other functions
#[wasm_bindgen]
pub fn universe_create(config: JsValue) -> Result<u32, JsError> {
    let config: UniverseConfig = if config.is_undefined() || config.is_null() {
        UniverseConfig::default()
    } else {
        from_js::<ConfigInput>(config)?.into()
    };
    let universe = Universe::new(config)?;

    let id = NEXT_UNIVERSE_ID.with(|next_id| {
        let mut id = next_id.borrow_mut();
        let current = *id;
        *id += 1;
        current
    });

    UNIVERSES.with(|universes| {
        universes.borrow_mut().insert(id, universe);
    });

    Ok(id)
}

/// Default configuration, as a camelCase object
#[wasm_bindgen]
pub fn universe_default_config() -> Result<JsValue, JsError> {
    to_js(&ConfigInput::default())
}

/// Delete a universe to free memory.
#[wasm_bindgen]
pub fn universe_delete(universe_id: u32) {
    UNIVERSES.with(|universes| {
        universes.borrow_mut().remove(&universe_id);
    });
}

// =============================================================================
// Body management
// =============================================================================

/// Replace every body.
///
/// # Arguments
/// * `universe_id` - Universe ID
/// * `bodies` - Array of `{ position, velocity, mass }`
#[wasm_bindgen]
pub fn universe_set_bodies(universe_id: u32, bodies: JsValue) -> Result<(), JsError> {
    let bodies: Vec<BodyInput> = from_js(bodies)?;

    UNIVERSES.with(|universes| {
        let mut universes = universes.borrow_mut();
        let universe = universes
            .get_mut(&universe_id)
            .ok_or_else(|| not_found(universe_id))?;

        universe.set_bodies(bodies.into_iter().map(Body::from).collect())?;
        Ok(())
    })
}

/// Add a body.
///
/// # Returns
/// The new body's ID
#[wasm_bindgen]
pub fn universe_add_body(universe_id: u32, body: JsValue) -> Result<u32, JsError> {
    let body: BodyInput = from_js(body)?;

    UNIVERSES.with(|universes| {
        let mut universes = universes.borrow_mut();
        let universe = universes
            .get_mut(&universe_id)
            .ok_or_else(|| not_found(universe_id))?;

        let id = universe.push_body(body.into())?;
        Ok(id.0)
    })
}

/// Add a body using simple parameters.
#[wasm_bindgen]
pub fn universe_add_body_simple(
    universe_id: u32,
    x: f64,
    y: f64,
    vx: f64,
    vy: f64,
    mass: f64,
) -> Result<u32, JsError> {
    UNIVERSES.with(|universes| {
        let mut universes = universes.borrow_mut();
        let universe = universes
            .get_mut(&universe_id)
            .ok_or_else(|| not_found(universe_id))?;

        let id = universe.add_body(Point2::new(x, y), Vector2::new(vx, vy), mass)?;
        Ok(id.0)
    })
}

/// Remove a body.
///
/// # Returns
/// true if the body was found and removed
#[wasm_bindgen]
pub fn universe_remove_body(universe_id: u32, body_id: u32) -> Result<bool, JsError> {
    UNIVERSES.with(|universes| {
        let mut universes = universes.borrow_mut();
        let universe = universes
            .get_mut(&universe_id)
            .ok_or_else(|| not_found(universe_id))?;

        Ok(universe.remove_body(BodyId(body_id)).is_some())
    })
}

/// Remove every body and reset the clock.
#[wasm_bindgen]
pub fn universe_clear(universe_id: u32) -> Result<(), JsError> {
    UNIVERSES.with(|universes| {
        let mut universes = universes.borrow_mut();
        let universe = universes
            .get_mut(&universe_id)
            .ok_or_else(|| not_found(universe_id))?;

        universe.clear();
        Ok(())
    })
}

// =============================================================================
// Stepping
// =============================================================================

/// Advance the universe by one step of `1 / stepsPerSecond`.
///
/// # Returns
/// `{ step, time, culled, merged, bodies }`
#[wasm_bindgen]
pub fn universe_tick(universe_id: u32) -> Result<JsValue, JsError> {
    UNIVERSES.with(|universes| {
        let mut universes = universes.borrow_mut();
        let universe = universes
            .get_mut(&universe_id)
            .ok_or_else(|| not_found(universe_id))?;

        let report = universe.tick()?;
        to_js(&TickSnapshot::new(report, universe.time()))
    })
}

/// Advance the universe by several steps.
///
/// More efficient than calling universe_tick repeatedly. Culled and merged
/// counts are summed over all steps.
#[wasm_bindgen]
pub fn universe_tick_many(universe_id: u32, n_steps: usize) -> Result<JsValue, JsError> {
    UNIVERSES.with(|universes| {
        let mut universes = universes.borrow_mut();
        let universe = universes
            .get_mut(&universe_id)
            .ok_or_else(|| not_found(universe_id))?;

        let report = universe.run(n_steps)?;
        to_js(&TickSnapshot::new(report, universe.time()))
    })
}

// =============================================================================
// State queries
// =============================================================================

/// Get all bodies for rendering, including velocity and acceleration
/// vectors.
#[wasm_bindgen]
pub fn universe_get_bodies(universe_id: u32) -> Result<JsValue, JsError> {
    UNIVERSES.with(|universes| {
        let universes = universes.borrow();
        let universe = universes
            .get(&universe_id)
            .ok_or_else(|| not_found(universe_id))?;

        let bodies: Vec<BodySnapshot> = universe.bodies().iter().map(BodySnapshot::from).collect();
        to_js(&bodies)
    })
}

/// Get complete universe state snapshot.
///
/// Includes time, bodies, and energy for diagnostics. Potential energy is an
/// exact pairwise sum, so this is O(N²).
#[wasm_bindgen]
pub fn universe_get_state(universe_id: u32) -> Result<JsValue, JsError> {
    UNIVERSES.with(|universes| {
        let universes = universes.borrow();
        let universe = universes
            .get(&universe_id)
            .ok_or_else(|| not_found(universe_id))?;

        let kinetic_energy = universe.kinetic_energy();
        let potential_energy = universe.potential_energy();
        let momentum = universe.total_momentum();

        let snapshot = UniverseSnapshot {
            time: universe.time(),
            steps: universe.steps(),
            bodies: universe.bodies().iter().map(BodySnapshot::from).collect(),
            total_mass: universe.total_mass(),
            momentum: [momentum.x, momentum.y],
            kinetic_energy,
            potential_energy,
            total_energy: kinetic_energy + potential_energy,
            outward_bound_limit: universe.outward_bound_limit(),
        };

        to_js(&snapshot)
    })
}

/// Get the quadtree built during the last tick.
///
/// # Returns
/// Nested `{ origin, width, state, body, centerOfMass, totalMass, children }`
/// nodes, or `undefined` if no tick has run since the bodies last changed
#[wasm_bindgen]
pub fn universe_get_tree(universe_id: u32) -> Result<JsValue, JsError> {
    UNIVERSES.with(|universes| {
        let universes = universes.borrow();
        let universe = universes
            .get(&universe_id)
            .ok_or_else(|| not_found(universe_id))?;

        to_js(&universe.tree_snapshot())
    })
}

/// Radius beyond which bodies are removed
#[wasm_bindgen]
pub fn universe_outward_bound_limit(universe_id: u32) -> Result<f64, JsError> {
    UNIVERSES.with(|universes| {
        let universes = universes.borrow();
        let universe = universes
            .get(&universe_id)
            .ok_or_else(|| not_found(universe_id))?;

        Ok(universe.outward_bound_limit())
    })
}

/// Predict the path of a body.
///
/// # Returns
/// Array of `[x, y]` positions, one per future step
#[wasm_bindgen]
pub fn universe_project_path(universe_id: u32, body_id: u32) -> Result<JsValue, JsError> {
    UNIVERSES.with(|universes| {
        let universes = universes.borrow();
        let universe = universes
            .get(&universe_id)
            .ok_or_else(|| not_found(universe_id))?;

        let path: Vec<[f64; 2]> = universe
            .project_path(BodyId(body_id))?
            .iter()
            .map(|p| [p.x, p.y])
            .collect();

        to_js(&path)
    })
}

/// Get the number of bodies.
#[wasm_bindgen]
pub fn universe_body_count(universe_id: u32) -> Result<usize, JsError> {
    UNIVERSES.with(|universes| {
        let universes = universes.borrow();
        let universe = universes
            .get(&universe_id)
            .ok_or_else(|| not_found(universe_id))?;

        Ok(universe.body_count())
    })
}

// =============================================================================
// Utility functions
// =============================================================================

/// Speed of a circular orbit at `distance` around `central_mass`, using the
/// default gravitational constant.
#[wasm_bindgen]
pub fn circular_velocity(central_mass: f64, distance: f64) -> f64 {
    (G * central_mass / distance).sqrt()
}

/// Radius the engine assigns to a body of `mass`
#[wasm_bindgen]
pub fn radius_for_mass(mass: f64) -> f64 {
    gravity::body::radius_for_mass(mass)
}
