//! Integration test: full Coordinator ↔ worker round trips.
//!
//! Exercises the whole pipeline through the public API: spawn a real
//! worker thread, create bodies, step, and verify that synchronized
//! transforms land on the renderables and that correlated queries
//! resolve against live simulation state.

use std::time::{Duration, Instant};

use kinet::prelude::*;
use kinet::{CommandError, Coordinator};

// ── Test renderable ──────────────────────────────────────────────────

#[derive(Debug, Default)]
struct TrackedTransform {
    position: Vec3,
    orientation: Quat,
    syncs: usize,
}

impl Renderable for TrackedTransform {
    fn apply_transform(&mut self, position: Vec3, orientation: Quat) {
        self.position = position;
        self.orientation = orientation;
        self.syncs += 1;
    }
}

// ── Helpers ──────────────────────────────────────────────────────────

fn zero_gravity() -> WorldConfig {
    WorldConfig {
        gravity: [0.0; 3],
        ..Default::default()
    }
}

/// Drive the update loop until `done` holds or the timeout passes.
fn poll_until(
    world: &mut Coordinator<TrackedTransform>,
    timeout: Duration,
    mut done: impl FnMut(&Coordinator<TrackedTransform>) -> bool,
) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        world.update().unwrap();
        if done(world) {
            return true;
        }
        std::thread::sleep(Duration::from_millis(5));
    }
    false
}

// ── Tests ────────────────────────────────────────────────────────────

#[test]
fn falling_body_syncs_back_to_renderable() {
    let mut world = Coordinator::spawn(WorldConfig::default()).unwrap();
    let id = world
        .add_object(
            TrackedTransform::default(),
            BodyOptions::dynamic_ball(0.5, 1.0)
                .unwrap()
                .with_position([0.0, 5.0, 0.0]),
        )
        .unwrap();

    let fell = poll_until(&mut world, Duration::from_secs(5), |w| {
        let r = w.renderable(id).unwrap();
        r.syncs > 0 && r.position[1] < 4.9
    });
    assert!(fell, "body never fell below its spawn height");

    // Gravity is straight down: x and z stay where they started.
    let r = world.renderable(id).unwrap();
    assert_eq!(r.position[0], 0.0);
    assert_eq!(r.position[2], 0.0);
}

#[test]
fn set_position_round_trips_exactly() {
    let mut world = Coordinator::spawn(zero_gravity()).unwrap();
    let id = world
        .add_object(
            TrackedTransform::default(),
            BodyOptions::dynamic_ball(0.5, 1.0).unwrap().with_mass(0.0),
        )
        .unwrap();

    // Teleports bypass integration, so the readback is bit-exact.
    world.set_position(id, [1.0, 2.0, 3.0]).unwrap();
    let ticket = world.get_body_properties(id).unwrap();
    let report = world
        .wait_properties(&ticket, Duration::from_secs(5))
        .unwrap();
    assert_eq!(report.position, [1.0, 2.0, 3.0]);
}

#[test]
fn impulse_sets_velocity_immediately() {
    let mut world = Coordinator::spawn(zero_gravity()).unwrap();
    let id = world
        .add_object(
            TrackedTransform::default(),
            BodyOptions::dynamic_ball(0.5, 1.0)
                .unwrap()
                .with_damping(0.0, 0.0),
        )
        .unwrap();

    world.apply_impulse(id, [5.0, 0.0, 0.0], None).unwrap();
    let ticket = world.get_body_properties(id).unwrap();
    let report = world
        .wait_properties(&ticket, Duration::from_secs(5))
        .unwrap();
    assert_eq!(report.linear_velocity, [5.0, 0.0, 0.0]);
    assert_eq!(report.mass, 1.0);
}

#[test]
fn query_for_unknown_body_fails_with_body_not_found() {
    let mut world: Coordinator<TrackedTransform> = Coordinator::spawn(zero_gravity()).unwrap();
    let missing = BodyId(999);
    let ticket = world.get_body_properties(missing).unwrap();
    let err = world
        .wait_properties(&ticket, Duration::from_secs(5))
        .unwrap_err();
    assert_eq!(err, QueryError::BodyNotFound { id: missing });
}

#[test]
fn removal_churn_keeps_both_sides_consistent() {
    let mut world = Coordinator::spawn(zero_gravity()).unwrap();
    let options = BodyOptions::dynamic_ball(0.5, 1.0).unwrap();
    let ids: Vec<BodyId> = (0..5)
        .map(|_| world.add_object(TrackedTransform::default(), options).unwrap())
        .collect();

    world.remove_object(ids[0]).unwrap();
    world.remove_object(ids[2]).unwrap();
    // Removing again is idempotent.
    world.remove_object(ids[0]).unwrap();
    assert_eq!(world.body_count(), 3);

    // The worker's registry converges to the same live set.
    let ticket = world.get_body_properties(ids[2]).unwrap();
    assert_eq!(
        world.wait_properties(&ticket, Duration::from_secs(5)),
        Err(QueryError::BodyNotFound { id: ids[2] })
    );
    let ticket = world.get_body_properties(ids[1]).unwrap();
    assert!(world
        .wait_properties(&ticket, Duration::from_secs(5))
        .is_ok());

    // Survivors still receive sync frames.
    let synced = poll_until(&mut world, Duration::from_secs(5), |w| {
        ids.iter()
            .filter(|id| w.contains(**id))
            .all(|id| w.renderable(*id).unwrap().syncs > 0)
    });
    assert!(synced, "surviving bodies stopped receiving sync frames");
}

#[test]
fn shutdown_rejects_further_commands() {
    let mut world: Coordinator<TrackedTransform> = Coordinator::spawn(zero_gravity()).unwrap();
    world.shutdown();
    assert_eq!(
        world.set_velocity(BodyId(1), [0.0; 3]),
        Err(CommandError::WorkerShutdown)
    );
}

#[test]
fn drop_joins_the_worker() {
    // Must not hang: dropping the Coordinator closes the command
    // channel, which ends the worker loop.
    let world: Coordinator<TrackedTransform> = Coordinator::spawn(zero_gravity()).unwrap();
    drop(world);
}
