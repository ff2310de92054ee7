//! The simulation worker loop.
//!
//! Runs on a dedicated thread that exclusively owns the
//! [`PhysicsWorld`]. Commands arrive over a bounded crossbeam channel
//! in FIFO order; events go back over an unbounded one. No locks
//! anywhere on the hot path.
//!
//! State machine: Uninitialized → Ready (after `Initialize`) → Ready.
//! There is no terminal command; the loop ends when the Coordinator
//! drops its sender (clean shutdown) or when a command arrives before
//! initialization (fatal precondition violation).

use crossbeam_channel::{Receiver, Sender};

use kinet_core::{Command, Event, WorkerError};

use crate::world::PhysicsWorld;

/// Drain the command channel until disconnect, applying each command
/// to the physics world and emitting the resulting events.
///
/// Returns `Ok(())` on clean shutdown. Event-send failures mean the
/// Coordinator is gone and also end the loop cleanly.
pub fn run(cmd_rx: Receiver<Command>, evt_tx: Sender<Event>) -> Result<(), WorkerError> {
    let mut world: Option<PhysicsWorld> = None;

    while let Ok(command) = cmd_rx.recv() {
        if let Command::Initialize {
            gravity,
            solver_iterations,
        } = command
        {
            if world.is_some() {
                log::warn!("duplicate Initialize command: dropped");
            } else {
                world = Some(PhysicsWorld::new(gravity, solver_iterations));
            }
            continue;
        }

        let Some(world) = world.as_mut() else {
            log::error!("{command:?} received before Initialize; worker exiting");
            return Err(WorkerError::NotInitialized);
        };

        if let Some(event) = world.apply(command) {
            if evt_tx.send(event).is_err() {
                break;
            }
        }
    }

    Ok(())
}
