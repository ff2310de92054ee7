//! Error types shared across the protocol boundary.
//!
//! Organized by failure class: shape configuration (rejected at body
//! creation), query resolution (correlated responses), and fatal worker
//! preconditions.

use std::error::Error;
use std::fmt;

use crate::id::{BodyId, Vec3};

/// A body descriptor carried invalid shape parameters.
///
/// Raised synchronously at the Coordinator boundary and, for callers
/// that speak the protocol directly, echoed back by the Worker as
/// [`Event::CreateFailed`](crate::Event::CreateFailed) rather than
/// terminating the simulation thread.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ShapeError {
    /// A box shape with a non-positive or non-finite half-extent.
    InvalidBoxExtents {
        /// The rejected half-extents.
        half_extents: Vec3,
    },
    /// A sphere shape with a non-positive or non-finite radius.
    InvalidSphereRadius {
        /// The rejected radius.
        radius: f32,
    },
}

impl fmt::Display for ShapeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidBoxExtents { half_extents } => {
                write!(
                    f,
                    "box half-extents must be positive and finite, got [{}, {}, {}]",
                    half_extents[0], half_extents[1], half_extents[2]
                )
            }
            Self::InvalidSphereRadius { radius } => {
                write!(f, "sphere radius must be positive and finite, got {radius}")
            }
        }
    }
}

impl Error for ShapeError {}

/// Why a body-properties query did not produce a report.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum QueryError {
    /// The queried body was never created or has already been removed.
    BodyNotFound {
        /// The id the query named.
        id: BodyId,
    },
    /// The query deadline passed with no response.
    TimedOut,
    /// The simulation worker has shut down.
    WorkerShutdown,
}

impl fmt::Display for QueryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BodyNotFound { id } => write!(f, "body {id} not found"),
            Self::TimedOut => write!(f, "query timed out"),
            Self::WorkerShutdown => write!(f, "simulation worker has shut down"),
        }
    }
}

impl Error for QueryError {}

/// Fatal precondition violations inside the simulation worker loop.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WorkerError {
    /// A command arrived before `Initialize`.
    NotInitialized,
}

impl fmt::Display for WorkerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotInitialized => write!(f, "command received before Initialize"),
        }
    }
}

impl Error for WorkerError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_messages_name_the_offending_value() {
        let e = ShapeError::InvalidSphereRadius { radius: -1.0 };
        assert!(e.to_string().contains("-1"));

        let e = QueryError::BodyNotFound { id: BodyId(3) };
        assert!(e.to_string().contains('3'));
    }
}
