//! The typed command/event protocol between Coordinator and Worker.
//!
//! Both directions are closed enums: an unknown message discriminant is
//! unrepresentable, so the protocol-error class reduces to responses
//! whose correlation id matches nothing and sync entries whose body id
//! has no local object. Those are logged and dropped by the receiver.
//!
//! Channel contract: one ordered, reliable, point-to-point channel per
//! direction. FIFO is guaranteed within a direction; there is no
//! cross-message atomicity between a create/remove command and a later
//! `Step`/`Sync` pair — a frame is only consistent with commands sent
//! strictly before the `Step` that produced it.

use crate::body::{BodyOptions, BodyPropertiesReport};
use crate::error::{QueryError, ShapeError};
use crate::id::{BodyId, Quat, RequestId, Vec3};

/// A command sent from the Coordinator to the Simulation Worker.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// One-time world setup. Must be the first command processed;
    /// anything arriving earlier is a fatal worker precondition
    /// violation, and a duplicate is logged and dropped.
    Initialize {
        /// World gravity vector.
        gravity: Vec3,
        /// Constraint solver iteration count.
        solver_iterations: u32,
    },
    /// Register a new body under a Coordinator-allocated id.
    CreateBody {
        /// The id the Coordinator allocated for this body.
        id: BodyId,
        /// Shape, mass, transform, material, and damping.
        options: BodyOptions,
    },
    /// Unregister a body. Idempotent: unknown ids are ignored.
    RemoveBody {
        /// The body to remove.
        id: BodyId,
    },
    /// Advance the simulation by exactly `dt` once, then emit a
    /// [`Event::Sync`] frame. Clamping `dt` is the Coordinator's job.
    Step {
        /// Timestep in seconds.
        dt: f32,
    },
    /// Accumulate a force for the next step. No-op on unknown ids.
    ApplyForce {
        /// The target body.
        id: BodyId,
        /// Force vector in world space.
        force: Vec3,
        /// Application point in world space; the body's center of mass
        /// when absent.
        world_point: Option<Vec3>,
    },
    /// Apply an instantaneous velocity change. No-op on unknown ids.
    ApplyImpulse {
        /// The target body.
        id: BodyId,
        /// Impulse vector in world space.
        impulse: Vec3,
        /// Application point in world space; the body's center of mass
        /// when absent.
        world_point: Option<Vec3>,
    },
    /// Teleport a body, bypassing integration. No-op on unknown ids.
    SetPosition {
        /// The target body.
        id: BodyId,
        /// The new world position.
        position: Vec3,
    },
    /// Override a body's linear velocity. No-op on unknown ids.
    SetVelocity {
        /// The target body.
        id: BodyId,
        /// The new linear velocity.
        velocity: Vec3,
    },
    /// Read a single body's properties, answered by
    /// [`Event::BodyProperties`] or [`Event::QueryFailed`].
    GetBodyProperties {
        /// The body to query.
        id: BodyId,
        /// Correlation id for the response.
        request_id: RequestId,
    },
}

/// An event sent from the Simulation Worker to the Coordinator.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// Per-step bundle of all live bodies' transforms.
    Sync(SyncFrame),
    /// Answer to a [`Command::GetBodyProperties`] query.
    BodyProperties(BodyPropertiesReport),
    /// The worker rejected a `CreateBody` with invalid shape
    /// parameters instead of terminating its thread.
    CreateFailed {
        /// The id the rejected body would have used.
        id: BodyId,
        /// What was wrong with the descriptor.
        reason: ShapeError,
    },
    /// A query that could not be answered, correlated by request id.
    QueryFailed {
        /// The correlation id of the failed query.
        request_id: RequestId,
        /// Why no report was produced.
        reason: QueryError,
    },
}

/// The per-step bundle of all live bodies' positions and orientations.
///
/// Three parallel sequences in the Worker's registry iteration order
/// (creation order, stable under removal): one id per body, three
/// position components per body, four orientation components per body
/// (x, y, z, w unit quaternion). Entries are id-tagged so the receiver
/// applies transforms by id lookup; iteration order alone is never
/// load-bearing.
///
/// Sending a frame transfers ownership of the backing storage: the
/// Worker allocates fresh buffers after every send and never reuses a
/// transferred one.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SyncFrame {
    /// Body ids, one per entry, in registry iteration order.
    pub ids: Vec<BodyId>,
    /// Flat positions, 3 components per entry.
    pub positions: Vec<f32>,
    /// Flat orientations, 4 components per entry (x, y, z, w).
    pub orientations: Vec<f32>,
}

impl SyncFrame {
    /// Number of bodies in the frame.
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Whether the frame carries no bodies.
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Position of the i-th entry.
    ///
    /// # Panics
    ///
    /// Panics if `i >= self.len()`.
    pub fn position(&self, i: usize) -> Vec3 {
        [
            self.positions[3 * i],
            self.positions[3 * i + 1],
            self.positions[3 * i + 2],
        ]
    }

    /// Orientation of the i-th entry.
    ///
    /// # Panics
    ///
    /// Panics if `i >= self.len()`.
    pub fn orientation(&self, i: usize) -> Quat {
        [
            self.orientations[4 * i],
            self.orientations[4 * i + 1],
            self.orientations[4 * i + 2],
            self.orientations[4 * i + 3],
        ]
    }

    /// Iterate `(id, position, orientation)` entries in frame order.
    pub fn entries(&self) -> impl Iterator<Item = (BodyId, Vec3, Quat)> + '_ {
        self.ids
            .iter()
            .enumerate()
            .map(|(i, &id)| (id, self.position(i), self.orientation(i)))
    }
}
