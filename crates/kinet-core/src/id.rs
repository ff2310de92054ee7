//! Strongly-typed handles and the flat vector/quaternion aliases.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// A 3-component vector as it travels over the protocol.
///
/// Component order is x, y, z. Kept as a plain array so the protocol
/// crate carries no math-library dependency; the worker converts to
/// engine types at its boundary.
pub type Vec3 = [f32; 3];

/// A unit quaternion as it travels over the protocol.
///
/// Component order is x, y, z, w — matching the layout of the
/// orientation stream in a [`SyncFrame`](crate::SyncFrame).
pub type Quat = [f32; 4];

/// The identity orientation.
pub const IDENTITY_ORIENTATION: Quat = [0.0, 0.0, 0.0, 1.0];

/// Handle correlating a renderable object with its simulation body.
///
/// Allocated by the Coordinator from a monotonic counter, never reused
/// within a session. The Coordinator maps it to a renderable object;
/// the Worker maps it to the live simulation body. The two maps hold
/// the same set of live ids, up to one message of latency.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BodyId(pub u64);

impl fmt::Display for BodyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for BodyId {
    fn from(v: u64) -> Self {
        Self(v)
    }
}

/// Counter for unique [`RequestId`] allocation.
static REQUEST_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Correlation token matching an asynchronous query to its response.
///
/// Allocated from a process-wide monotonic atomic counter via
/// [`RequestId::next`]. Each call returns an id that has never been
/// returned before within this process. Thread-safe.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RequestId(u64);

impl RequestId {
    /// Allocate a fresh, unique request id.
    pub fn next() -> Self {
        Self(REQUEST_COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
