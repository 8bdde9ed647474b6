//! Run configuration for a [`Universe`](crate::universe::Universe).
//!
//! Loaded from TOML; every field is optional and falls back to the defaults
//! below.
//!
//! ```toml
//! steps_per_second = 30
//! gravitational_constant = 6.67408e-11
//! collisions = true
//! theta = 0.5
//! outward_bound_limit = 2000.0
//! tree_margin = 50.0
//! softening = 0.0
//!
//! [projection]
//! max_steps = 2000
//! sweep_angle = 6.126105674500097
//! ```

use std::f64::consts::PI;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::ConfigError;
use crate::forces::G;

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct UniverseConfig {
    /// Discrete steps per simulated second; `dt = 1 / steps_per_second`
    pub steps_per_second: u32,
    pub gravitational_constant: f64,
    /// Merge touching bodies while the tree is built
    pub collisions: bool,
    /// Barnes-Hut opening threshold
    pub theta: f64,
    /// Bodies farther than this from the origin are removed
    pub outward_bound_limit: f64,
    /// Padding added around the bodies when sizing the root square
    pub tree_margin: f64,
    /// Softening length added to every distance in the force law
    pub softening: f64,
    pub projection: ProjectionConfig,
}

impl Default for UniverseConfig {
    fn default() -> Self {
        Self {
            steps_per_second: 30,
            gravitational_constant: G,
            collisions: true,
            theta: 0.5,
            outward_bound_limit: 2e3,
            tree_margin: 50.0,
            softening: 0.0,
            projection: ProjectionConfig::default(),
        }
    }
}

/// Limits for trajectory previews
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
#[serde(default)]
pub struct ProjectionConfig {
    /// Hard cap on the number of samples
    pub max_steps: usize,
    /// Stop once the body has swept this angle around the origin. Just short
    /// of a full turn, so the preview does not overlap its own start.
    pub sweep_angle: f64,
}

impl Default for ProjectionConfig {
    fn default() -> Self {
        Self {
            max_steps: 2000,
            sweep_angle: 1.95 * PI,
        }
    }
}

impl UniverseConfig {
    pub fn with_collisions(mut self, collisions: bool) -> Self {
        self.collisions = collisions;
        self
    }

    pub fn with_theta(mut self, theta: f64) -> Self {
        self.theta = theta;
        self
    }

    pub fn with_steps_per_second(mut self, steps_per_second: u32) -> Self {
        self.steps_per_second = steps_per_second;
        self
    }

    pub fn with_gravitational_constant(mut self, g: f64) -> Self {
        self.gravitational_constant = g;
        self
    }

    pub fn with_outward_bound_limit(mut self, limit: f64) -> Self {
        self.outward_bound_limit = limit;
        self
    }

    pub fn with_softening(mut self, softening: f64) -> Self {
        self.softening = softening;
        self
    }

    /// Length of one step in simulated seconds
    pub fn dt(&self) -> f64 {
        1.0 / f64::from(self.steps_per_second)
    }

    /// Checks every field, returning the first offending one.
    ///
    /// # Examples
    ///
    /// ```
    /// use gravity::config::UniverseConfig;
    ///
    /// assert!(UniverseConfig::default().validate().is_ok());
    /// assert!(UniverseConfig::default().with_steps_per_second(0).validate().is_err());
    /// assert!(UniverseConfig::default().with_theta(-1.0).validate().is_err());
    /// ```
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.steps_per_second == 0 {
            return Err(ConfigError::StepsPerSecond(self.steps_per_second));
        }
        if !(self.gravitational_constant > 0.0 && self.gravitational_constant.is_finite()) {
            return Err(ConfigError::GravitationalConstant(
                self.gravitational_constant,
            ));
        }
        if !(self.theta >= 0.0 && self.theta.is_finite()) {
            return Err(ConfigError::Theta(self.theta));
        }
        // Infinity disables culling
        if !(self.outward_bound_limit > 0.0) {
            return Err(ConfigError::OutwardBoundLimit(self.outward_bound_limit));
        }
        // The root origin is floored to a whole unit
        if !(self.tree_margin > 2.0 && self.tree_margin.is_finite()) {
            return Err(ConfigError::TreeMargin(self.tree_margin));
        }
        if !(self.softening >= 0.0 && self.softening.is_finite()) {
            return Err(ConfigError::Softening(self.softening));
        }
        let ProjectionConfig {
            max_steps,
            sweep_angle,
        } = self.projection;
        if max_steps == 0 || !(sweep_angle > 0.0) {
            return Err(ConfigError::Projection {
                max_steps,
                sweep_angle,
            });
        }
        Ok(())
    }

    /// Parses and validates a TOML document
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Load configuration from a file, falling back to defaults if the file
    /// is missing or invalid
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match Self::load(path) {
            Ok(config) => config,
            Err(ConfigError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                info!("Config file {} not found. Using defaults.", path.display());
                Self::default()
            }
            Err(e) => {
                warn!("Failed to load config file {}: {}. Using defaults.", path.display(), e);
                Self::default()
            }
        }
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Save configuration to a file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        std::fs::write(path, self.to_toml_string()?)?;
        Ok(())
    }
}
