//! World configuration, validation, and error types.

use std::error::Error;
use std::fmt;
use std::time::Duration;

use kinet_core::Vec3;

/// Configuration for a [`Coordinator`](crate::Coordinator) and the
/// simulation worker it spawns.
#[derive(Clone, Debug)]
pub struct WorldConfig {
    /// World gravity. Default: `[0, -9.81, 0]`.
    pub gravity: Vec3,
    /// Constraint solver iterations. Default: 10.
    pub solver_iterations: u32,
    /// Upper bound on a single simulation step, in seconds. A slow
    /// frame is clamped to this instead of producing one large,
    /// unstable step. Default: 1/30.
    pub max_step_dt: f32,
    /// Deadline for correlated property queries. Pending queries older
    /// than this resolve with [`QueryError::TimedOut`](kinet_core::QueryError::TimedOut).
    /// Default: 5 seconds.
    pub query_timeout: Duration,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            gravity: [0.0, -9.81, 0.0],
            solver_iterations: 10,
            max_step_dt: 1.0 / 30.0,
            query_timeout: Duration::from_secs(5),
        }
    }
}

impl WorldConfig {
    /// Check structural invariants before spawning the worker.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.gravity.iter().any(|g| !g.is_finite()) {
            return Err(ConfigError::NonFiniteGravity {
                gravity: self.gravity,
            });
        }
        if self.solver_iterations == 0 {
            return Err(ConfigError::ZeroSolverIterations);
        }
        if !self.max_step_dt.is_finite() || self.max_step_dt <= 0.0 {
            return Err(ConfigError::InvalidMaxStepDt {
                value: self.max_step_dt,
            });
        }
        Ok(())
    }
}

/// Error validating a [`WorldConfig`] or spawning its worker.
#[derive(Debug, PartialEq)]
pub enum ConfigError {
    /// The gravity vector carried a NaN or infinity.
    NonFiniteGravity {
        /// The rejected gravity vector.
        gravity: Vec3,
    },
    /// The solver iteration count was zero.
    ZeroSolverIterations,
    /// The maximum step was non-positive or non-finite.
    InvalidMaxStepDt {
        /// The rejected value.
        value: f32,
    },
    /// The worker thread exited before accepting the initialization
    /// command.
    WorkerUnavailable,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NonFiniteGravity { gravity } => {
                write!(
                    f,
                    "gravity must be finite, got [{}, {}, {}]",
                    gravity[0], gravity[1], gravity[2]
                )
            }
            Self::ZeroSolverIterations => write!(f, "solver_iterations must be at least 1"),
            Self::InvalidMaxStepDt { value } => {
                write!(f, "max_step_dt must be positive and finite, got {value}")
            }
            Self::WorkerUnavailable => write!(f, "simulation worker exited during startup"),
        }
    }
}

impl Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(WorldConfig::default().validate().is_ok());
    }

    #[test]
    fn rejects_nan_gravity() {
        let config = WorldConfig {
            gravity: [0.0, f32::NAN, 0.0],
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::NonFiniteGravity { .. })
        ));
    }

    #[test]
    fn rejects_zero_iterations_and_bad_dt() {
        let config = WorldConfig {
            solver_iterations: 0,
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::ZeroSolverIterations));

        let config = WorldConfig {
            max_step_dt: 0.0,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidMaxStepDt { .. })
        ));
    }
}
