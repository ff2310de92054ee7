//! Sync-frame buffer capacity tracking.
//!
//! Sending a [`SyncFrame`] moves its backing vectors to the
//! Coordinator, so the worker allocates fresh storage for every frame.
//! [`FrameBuffers`] remembers the high-water live-body count so those
//! allocations are sized up front: capacity grows on body creation and
//! never shrinks.

use kinet_core::SyncFrame;

/// Grow-never-shrink capacity tracker for outgoing frame storage.
pub(crate) struct FrameBuffers {
    reserved_bodies: usize,
}

impl FrameBuffers {
    /// Initial per-frame body capacity before any growth.
    pub(crate) const INITIAL_BODIES: usize = 32;

    pub(crate) fn new() -> Self {
        Self {
            reserved_bodies: Self::INITIAL_BODIES,
        }
    }

    /// Grow the reserved capacity to at least `live_bodies`.
    pub(crate) fn reserve_for(&mut self, live_bodies: usize) {
        if live_bodies > self.reserved_bodies {
            self.reserved_bodies = live_bodies;
        }
    }

    /// Allocate an empty frame with the reserved capacity.
    pub(crate) fn allocate(&self) -> SyncFrame {
        SyncFrame {
            ids: Vec::with_capacity(self.reserved_bodies),
            positions: Vec::with_capacity(self.reserved_bodies * 3),
            orientations: Vec::with_capacity(self.reserved_bodies * 4),
        }
    }

    #[cfg(test)]
    pub(crate) fn reserved_bodies(&self) -> usize {
        self.reserved_bodies
    }
}
