//! The simulation driver.
//!
//! A [`Universe`] owns the live bodies, the quadtree built during the last
//! step and the clock. Each [`Universe::tick`] runs one fixed step:
//!
//! 1. drop bodies beyond the outward bound
//! 2. build the quadtree, detecting collisions while inserting
//! 3. merge colliding bodies and rebuild the tree over the survivors
//! 4. compute Barnes-Hut forces and integrate with semi-implicit Euler

use nalgebra::{Point2, Vector2};
use tracing::debug;

use crate::body::{Body, BodyId};
use crate::collisions::resolve_collisions;
use crate::config::{ProjectionConfig, UniverseConfig};
use crate::error::{ConfigError, SimulationError, TreeError};
use crate::forces::{DirectGravity, ForceModel, TreeGravity};
use crate::integrator::{Integrator, SemiImplicitEuler};
use crate::quadtree::{Probe, QuadTree, Square, TreeSnapshot};
use crate::vector::{Heading, wrap_angle};

/// What happened during one step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TickReport {
    /// Step counter after this step
    pub step: u64,
    /// Bodies removed for leaving the outward bound
    pub culled: usize,
    /// Bodies absorbed by collisions
    pub merged: usize,
    /// Bodies alive at the end of the step
    pub bodies: usize,
}

pub struct Universe {
    config: UniverseConfig,
    bodies: Vec<Body>,
    /// Tree from the last step. Leaf indices refer to `bodies`, so any
    /// mutation of the body list clears it.
    tree: Option<QuadTree>,
    integrator: SemiImplicitEuler,
    time: f64,
    steps: u64,
    next_id: u32,
}

impl Universe {
    pub fn new(config: UniverseConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            bodies: Vec::new(),
            tree: None,
            integrator: SemiImplicitEuler,
            time: 0.0,
            steps: 0,
            next_id: 0,
        })
    }

    pub fn config(&self) -> &UniverseConfig {
        &self.config
    }

    /// Replaces every body.
    ///
    /// Each body receives a fresh id, in order. Nothing is replaced if any
    /// body has a non-positive or non-finite mass.
    pub fn set_bodies(&mut self, bodies: Vec<Body>) -> Result<(), SimulationError> {
        if let Some(bad) = bodies.iter().find(|b| !valid_mass(b.mass())) {
            return Err(SimulationError::InvalidBody {
                id: bad.id,
                mass: bad.mass(),
            });
        }

        self.bodies = bodies;
        for body in &mut self.bodies {
            body.id = BodyId(self.next_id);
            self.next_id += 1;
        }
        self.tree = None;
        Ok(())
    }

    /// Adds a body and returns its id
    ///
    /// # Examples
    ///
    /// ```
    /// use gravity::config::UniverseConfig;
    /// use gravity::universe::Universe;
    /// use nalgebra::{Point2, Vector2};
    ///
    /// let mut universe = Universe::new(UniverseConfig::default()).unwrap();
    /// let id = universe.add_body(Point2::new(10.0, 0.0), Vector2::zeros(), 1e12).unwrap();
    ///
    /// assert_eq!(universe.body(id).unwrap().mass(), 1e12);
    /// assert!(universe.add_body(Point2::origin(), Vector2::zeros(), -1.0).is_err());
    /// ```
    pub fn add_body(
        &mut self,
        position: Point2<f64>,
        velocity: Vector2<f64>,
        mass: f64,
    ) -> Result<BodyId, SimulationError> {
        self.push_body(Body::new(position, velocity, mass))
    }

    /// Adds a prepared body, overwriting its id
    pub fn push_body(&mut self, mut body: Body) -> Result<BodyId, SimulationError> {
        let id = BodyId(self.next_id);
        if !valid_mass(body.mass()) {
            return Err(SimulationError::InvalidBody {
                id,
                mass: body.mass(),
            });
        }

        body.id = id;
        self.next_id += 1;
        self.bodies.push(body);
        self.tree = None;
        Ok(id)
    }

    pub fn remove_body(&mut self, id: BodyId) -> Option<Body> {
        let index = self.index_of(id)?;
        self.tree = None;
        Some(self.bodies.remove(index))
    }

    /// Removes every body and resets the clock
    pub fn clear(&mut self) {
        self.bodies.clear();
        self.tree = None;
        self.time = 0.0;
        self.steps = 0;
    }

    pub fn bodies(&self) -> &[Body] {
        &self.bodies
    }

    pub fn body(&self, id: BodyId) -> Option<&Body> {
        self.index_of(id).map(|i| &self.bodies[i])
    }

    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }

    fn index_of(&self, id: BodyId) -> Option<usize> {
        self.bodies.iter().position(|b| b.id == id)
    }

    /// Simulated seconds elapsed
    pub fn time(&self) -> f64 {
        self.time
    }

    pub fn steps(&self) -> u64 {
        self.steps
    }

    /// Tree built during the last step, if the bodies have not changed since
    pub fn tree(&self) -> Option<&QuadTree> {
        self.tree.as_ref()
    }

    /// Serialisable copy of the current tree, leaves labelled with body ids
    pub fn tree_snapshot(&self) -> Option<TreeSnapshot> {
        let tree = self.tree.as_ref()?;
        Some(tree.snapshot_with(&|index| self.bodies[index].id.0))
    }

    pub fn outward_bound_limit(&self) -> f64 {
        self.config.outward_bound_limit
    }

    pub fn total_mass(&self) -> f64 {
        self.bodies.iter().map(Body::mass).sum()
    }

    pub fn total_momentum(&self) -> Vector2<f64> {
        self.bodies
            .iter()
            .fold(Vector2::zeros(), |acc, b| acc + b.momentum())
    }

    pub fn kinetic_energy(&self) -> f64 {
        self.bodies.iter().map(Body::kinetic_energy).sum()
    }

    /// Exact pairwise potential energy, O(N²)
    pub fn potential_energy(&self) -> f64 {
        DirectGravity::with_softening(
            &self.bodies,
            self.config.gravitational_constant,
            self.config.softening,
        )
        .potential_energy()
    }

    /// Advances the simulation by one step of `1 / steps_per_second`.
    ///
    /// On error the bodies may have been culled or merged, but nothing has
    /// been integrated and the clock has not moved.
    pub fn tick(&mut self) -> Result<TickReport, SimulationError> {
        let culled = self.cull();
        self.tree = None;

        let mut merged = 0;
        let dt = self.config.dt();

        if let Some(square) = Square::enclosing(&self.bodies, self.config.tree_margin) {
            let (mut tree, groups) = QuadTree::build(&self.bodies, square, self.config.collisions)?;

            if !groups.is_empty() {
                merged = resolve_collisions(&mut self.bodies, &groups);
                // Indices shifted; the survivors need a tree of their own
                tree = self.rebuild()?;
            }

            let forces: Vec<Vector2<f64>> = {
                let gravity = self.gravity(&tree);
                self.bodies
                    .iter()
                    .enumerate()
                    .map(|(i, b)| gravity.force(&Probe::body(i, b.position), b.mass()))
                    .collect()
            };

            self.integrator.step_all(&mut self.bodies, &forces, dt);
            self.tree = Some(tree);
        }

        self.time += dt;
        self.steps += 1;

        let report = TickReport {
            step: self.steps,
            culled,
            merged,
            bodies: self.bodies.len(),
        };
        debug!(
            step = report.step,
            bodies = report.bodies,
            culled,
            merged,
            "tick"
        );
        Ok(report)
    }

    /// Runs `steps` ticks, stopping at the first error
    pub fn run(&mut self, steps: usize) -> Result<TickReport, SimulationError> {
        let mut total = TickReport {
            step: self.steps,
            bodies: self.bodies.len(),
            ..TickReport::default()
        };

        for _ in 0..steps {
            let report = self.tick()?;
            total.step = report.step;
            total.culled += report.culled;
            total.merged += report.merged;
            total.bodies = report.bodies;
        }

        Ok(total)
    }

    /// Predicts the path of body `id` against the current tree.
    ///
    /// A copy of the body is stepped forward while everything else stays
    /// frozen. Sampling stops after `projection.max_steps` positions or once
    /// the copy has swept `projection.sweep_angle` around the origin,
    /// whichever comes first. The universe itself is not modified.
    ///
    /// # Examples
    ///
    /// ```
    /// use gravity::config::UniverseConfig;
    /// use gravity::universe::Universe;
    /// use nalgebra::{Point2, Vector2};
    ///
    /// let mut universe = Universe::new(UniverseConfig::default()).unwrap();
    /// universe.add_body(Point2::origin(), Vector2::zeros(), 1e16).unwrap();
    /// let moon = universe.add_body(Point2::new(200.0, 0.0), Vector2::new(0.0, 57.8), 1e12).unwrap();
    ///
    /// let path = universe.project_path(moon).unwrap();
    /// assert!(!path.is_empty() && path.len() <= 2000);
    /// ```
    pub fn project_path(&self, id: BodyId) -> Result<Vec<Point2<f64>>, SimulationError> {
        let index = self.index_of(id).ok_or(SimulationError::UnknownBody(id))?;

        let scratch;
        let tree = match &self.tree {
            Some(tree) => tree,
            None => {
                scratch = self.rebuild()?;
                &scratch
            }
        };

        let gravity = self.gravity(tree);
        let dt = self.config.dt();
        let ProjectionConfig {
            max_steps,
            sweep_angle,
        } = self.config.projection;

        let mut ghost = self.bodies[index];
        let mut path = Vec::with_capacity(max_steps.min(1024));
        let mut last_angle: Option<f64> = None;
        let mut swept = 0.0_f64;

        while path.len() < max_steps && swept.abs() < sweep_angle {
            let force = gravity.force(&Probe::body(index, ghost.position), ghost.mass());
            self.integrator.step(&mut ghost, force, dt);

            let angle = ghost.position.heading();
            if let Some(last) = last_angle {
                swept += wrap_angle(angle - last);
            }
            last_angle = Some(angle);
            path.push(ghost.position);
        }

        Ok(path)
    }

    fn gravity<'a>(&self, tree: &'a QuadTree) -> TreeGravity<'a> {
        TreeGravity::with_softening(
            tree,
            self.config.theta,
            self.config.gravitational_constant,
            self.config.softening,
        )
    }

    /// Collision-free tree over the current bodies. Callers guarantee at
    /// least one body.
    fn rebuild(&self) -> Result<QuadTree, TreeError> {
        let square = Square::enclosing(&self.bodies, self.config.tree_margin)
            .unwrap_or_else(|| Square::new(Point2::origin(), self.config.tree_margin));
        let (tree, _) = QuadTree::build(&self.bodies, square, false)?;
        Ok(tree)
    }

    /// Removes every body farther than the outward bound, or with a
    /// non-finite position
    fn cull(&mut self) -> usize {
        let limit = self.config.outward_bound_limit;
        let before = self.bodies.len();
        self.bodies.retain(|b| b.orbital_radius() <= limit);
        before - self.bodies.len()
    }
}

fn valid_mass(mass: f64) -> bool {
    mass > 0.0 && mass.is_finite()
}
