//! Kinet: offloaded rigid-body physics coordination for real-time
//! render loops.
//!
//! The render thread talks to a [`Coordinator`]; the Coordinator owns a
//! dedicated simulation worker thread that exclusively owns the physics
//! engine state. The two sides exchange typed commands and events over
//! channels, so the render loop never blocks on a physics step and the
//! engine never sees concurrent access.
//!
//! # Quick start
//!
//! ```rust
//! use kinet::prelude::*;
//!
//! struct Cube {
//!     position: Vec3,
//! }
//!
//! impl Renderable for Cube {
//!     fn apply_transform(&mut self, position: Vec3, _orientation: Quat) {
//!         self.position = position;
//!     }
//! }
//!
//! let mut world = Coordinator::spawn(WorldConfig::default()).unwrap();
//! let id = world
//!     .add_object(
//!         Cube { position: [0.0; 3] },
//!         BodyOptions::dynamic_ball(0.5, 1.0)
//!             .unwrap()
//!             .with_position([0.0, 5.0, 0.0]),
//!     )
//!     .unwrap();
//!
//! // Once per frame:
//! world.update().unwrap();
//! assert!(world.contains(id));
//! ```
//!
//! # Crates
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`protocol`] | `kinet-core` | Ids, body descriptors, the command/event protocol |
//! | [`sim`] | `kinet-sim` | The worker loop and the engine-owning `PhysicsWorld` |
//! | [`config`], [`coordinator`] | `kinet` | Configuration and the render-side Coordinator |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod config;
pub mod coordinator;

/// Ids, body descriptors, and the command/event protocol (`kinet-core`).
pub use kinet_core as protocol;

/// The simulation worker loop and physics world (`kinet-sim`).
///
/// Only needed when driving the worker over raw channels instead of
/// through a [`Coordinator`].
pub use kinet_sim as sim;

pub use config::{ConfigError, WorldConfig};
pub use coordinator::{
    AddObjectError, CommandError, Coordinator, PropertiesTicket, QueryReply, Renderable,
};

/// Common imports for typical Kinet usage.
///
/// ```rust
/// use kinet::prelude::*;
/// ```
pub mod prelude {
    pub use crate::config::WorldConfig;
    pub use crate::coordinator::{Coordinator, PropertiesTicket, Renderable};
    pub use kinet_core::{
        BodyId, BodyOptions, BodyPropertiesReport, Material, Quat, QueryError, RequestId,
        ShapeDesc, SleepState, Vec3,
    };
}
