//! Simulation worker for the Kinet physics offload.
//!
//! Owns the one authoritative physics world (rapier3d), the ordered
//! live-body registry, and the worker loop that drains the command
//! channel, steps the simulation, and emits synchronized transform
//! frames and query responses.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

mod frame;
mod world;
mod worker;

pub use worker::run;
pub use world::PhysicsWorld;
