//! Error types for configuration, tree construction and stepping.

use std::fmt;

use crate::body::BodyId;

/// Rejected or unreadable configuration
#[derive(Debug)]
pub enum ConfigError {
    /// `steps_per_second` must be at least 1
    StepsPerSecond(u32),
    /// `gravitational_constant` must be positive and finite
    GravitationalConstant(f64),
    /// `theta` must be non-negative and finite
    Theta(f64),
    /// `outward_bound_limit` must be positive (infinity is allowed)
    OutwardBoundLimit(f64),
    /// `tree_margin` must be finite and greater than 2
    TreeMargin(f64),
    /// `softening` must be non-negative and finite
    Softening(f64),
    /// Projection needs at least one step and a positive sweep angle
    Projection { max_steps: usize, sweep_angle: f64 },
    /// Configuration file could not be read
    Io(std::io::Error),
    /// Configuration file is not valid TOML for `UniverseConfig`
    Parse(toml::de::Error),
    /// Configuration could not be written as TOML
    Serialize(toml::ser::Error),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::StepsPerSecond(v) => {
                write!(f, "steps_per_second must be at least 1, got {v}")
            }
            ConfigError::GravitationalConstant(v) => {
                write!(f, "gravitational_constant must be positive, got {v}")
            }
            ConfigError::Theta(v) => write!(f, "theta must be non-negative, got {v}"),
            ConfigError::OutwardBoundLimit(v) => {
                write!(f, "outward_bound_limit must be positive, got {v}")
            }
            ConfigError::TreeMargin(v) => write!(f, "tree_margin must be greater than 2, got {v}"),
            ConfigError::Softening(v) => write!(f, "softening must be non-negative, got {v}"),
            ConfigError::Projection {
                max_steps,
                sweep_angle,
            } => write!(
                f,
                "projection needs max_steps > 0 and sweep_angle > 0, got {max_steps} and {sweep_angle}"
            ),
            ConfigError::Io(e) => write!(f, "failed to read configuration: {e}"),
            ConfigError::Parse(e) => write!(f, "failed to parse configuration: {e}"),
            ConfigError::Serialize(e) => write!(f, "failed to serialize configuration: {e}"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io(e) => Some(e),
            ConfigError::Parse(e) => Some(e),
            ConfigError::Serialize(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for ConfigError {
    fn from(e: std::io::Error) -> Self {
        ConfigError::Io(e)
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(e: toml::de::Error) -> Self {
        ConfigError::Parse(e)
    }
}

impl From<toml::ser::Error> for ConfigError {
    fn from(e: toml::ser::Error) -> Self {
        ConfigError::Serialize(e)
    }
}

/// Quadtree invariant violations.
///
/// These indicate a construction bug or a non-finite mass aggregate; the
/// step that hit them is aborted.
#[derive(Debug, Clone, PartialEq)]
pub enum TreeError {
    /// An internal node ended up without any non-empty child
    MissingCenterOfMass { node: usize },
    /// A non-empty node aggregated to a non-positive or non-finite mass
    DegenerateMass { node: usize, mass: f64 },
}

impl fmt::Display for TreeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TreeError::MissingCenterOfMass { node } => {
                write!(f, "internal node {node} has no center of mass")
            }
            TreeError::DegenerateMass { node, mass } => {
                write!(f, "non-empty node {node} has total mass {mass}")
            }
        }
    }
}

impl std::error::Error for TreeError {}

/// Errors raised while mutating or stepping a `Universe`
#[derive(Debug, Clone, PartialEq)]
pub enum SimulationError {
    /// Body mass must be positive and finite
    InvalidBody { id: BodyId, mass: f64 },
    /// No body with this id is alive
    UnknownBody(BodyId),
    /// Tree construction failed
    Tree(TreeError),
}

impl fmt::Display for SimulationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SimulationError::InvalidBody { id, mass } => {
                write!(f, "body {} has invalid mass {mass}", id.0)
            }
            SimulationError::UnknownBody(id) => write!(f, "body {} not found", id.0),
            SimulationError::Tree(e) => write!(f, "tree construction failed: {e}"),
        }
    }
}

impl std::error::Error for SimulationError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SimulationError::Tree(e) => Some(e),
            _ => None,
        }
    }
}

impl From<TreeError> for SimulationError {
    fn from(e: TreeError) -> Self {
        SimulationError::Tree(e)
    }
}
