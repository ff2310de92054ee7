//! Core types for the Kinet physics offload protocol.
//!
//! This is the leaf crate with zero internal dependencies. It defines
//! the identifiers, shape and body descriptors, the typed command/event
//! protocol spoken between the Coordinator and the Simulation Worker,
//! and the error types shared by both sides.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod body;
pub mod error;
pub mod id;
pub mod protocol;
pub mod shape;

pub use body::{BodyOptions, BodyPropertiesReport, Material, SleepState};
pub use error::{QueryError, ShapeError, WorkerError};
pub use id::{BodyId, Quat, RequestId, Vec3, IDENTITY_ORIENTATION};
pub use protocol::{Command, Event, SyncFrame};
pub use shape::ShapeDesc;
