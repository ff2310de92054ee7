//! The client-facing Coordinator: id allocation, renderable-object
//! bookkeeping, command dispatch, and response demultiplexing.
//!
//! # Architecture
//!
//! ```text
//! Render Thread                     Simulation Worker Thread
//!     |                                  |
//!     |--add_object()----------------->  | cmd_rx.recv()
//!     |   [cmd_tx: bounded(256)]         | world.create_body()
//!     |--update()  [Step {dt}]-------->  | world.step(dt)
//!     |                                  | evt_tx.send(Sync)
//!     |<--poll_events() <-- Sync frames--|
//!     |    apply transforms by id        |
//!     |                                  |
//!     |--get_body_properties()-------->  | world.body_properties()
//!     |<--ticket resolved via pending----| evt_tx.send(BodyProperties)
//! ```
//!
//! The worker is an explicit object owned by the Coordinator: spawned
//! in [`Coordinator::spawn`], addressed through explicit channels, and
//! joined on drop. Nothing here blocks the render loop except the
//! optional [`wait_properties`](Coordinator::wait_properties) helper.

use std::collections::HashMap;
use std::error::Error;
use std::fmt;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};
use indexmap::IndexMap;

use kinet_core::{
    BodyId, BodyOptions, BodyPropertiesReport, Command, Event, Quat, QueryError, RequestId,
    ShapeError, SyncFrame, Vec3,
};

use crate::config::{ConfigError, WorldConfig};

/// Command channel depth. The worker drains continuously, so this only
/// fills when the worker has stalled or died.
const COMMAND_CHANNEL_CAPACITY: usize = 256;

// ── Error types ──────────────────────────────────────────────────

/// Error submitting a command to the simulation worker.
#[derive(Debug, PartialEq, Eq)]
pub enum CommandError {
    /// The worker has shut down.
    WorkerShutdown,
    /// The command channel is full (back-pressure).
    ChannelFull,
}

impl fmt::Display for CommandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::WorkerShutdown => write!(f, "simulation worker has shut down"),
            Self::ChannelFull => write!(f, "command channel full"),
        }
    }
}

impl Error for CommandError {}

/// Error adding an object: either the shape descriptor was rejected at
/// the boundary, or the command could not be submitted.
#[derive(Debug, PartialEq)]
pub enum AddObjectError {
    /// Invalid shape parameters, caught before anything was sent.
    Shape(ShapeError),
    /// The command could not reach the worker.
    Command(CommandError),
}

impl fmt::Display for AddObjectError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Shape(e) => write!(f, "invalid shape: {e}"),
            Self::Command(e) => write!(f, "command not sent: {e}"),
        }
    }
}

impl Error for AddObjectError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Shape(e) => Some(e),
            Self::Command(e) => Some(e),
        }
    }
}

impl From<ShapeError> for AddObjectError {
    fn from(e: ShapeError) -> Self {
        Self::Shape(e)
    }
}

impl From<CommandError> for AddObjectError {
    fn from(e: CommandError) -> Self {
        Self::Command(e)
    }
}

// ── Renderable seam ──────────────────────────────────────────────

/// The seam between synchronized physics transforms and the scene
/// graph. Rendering collaborators implement this for whatever object
/// they hand to [`Coordinator::add_object`].
pub trait Renderable {
    /// Receive the body's transform for the latest simulation step.
    fn apply_transform(&mut self, position: Vec3, orientation: Quat);
}

// ── Pending queries ──────────────────────────────────────────────

/// Resolution of a body-properties query.
pub type QueryReply = Result<BodyPropertiesReport, QueryError>;

struct PendingQuery {
    reply: Sender<QueryReply>,
    deadline: Instant,
}

/// Handle to an in-flight body-properties query.
///
/// Resolved out-of-band while the Coordinator pumps events; check with
/// [`try_get`](Self::try_get) after [`Coordinator::poll_events`], or
/// block via [`Coordinator::wait_properties`].
pub struct PropertiesTicket {
    request_id: RequestId,
    rx: Receiver<QueryReply>,
}

impl PropertiesTicket {
    /// The correlation id of this query.
    pub fn request_id(&self) -> RequestId {
        self.request_id
    }

    /// Non-blocking check for the reply.
    pub fn try_get(&self) -> Option<QueryReply> {
        self.rx.try_recv().ok()
    }
}

// ── Coordinator ──────────────────────────────────────────────────

/// Owns the simulation worker and the renderable-object registry.
///
/// Allocates [`BodyId`]s, forwards commands fire-and-forget, applies
/// synchronized transforms back onto renderables by id lookup, and
/// demultiplexes correlated query responses.
pub struct Coordinator<R: Renderable> {
    cmd_tx: Option<Sender<Command>>,
    evt_rx: Receiver<Event>,
    /// Insertion-ordered, like the worker's registry; correctness
    /// relies on id lookup, not on the order matching.
    objects: IndexMap<BodyId, R>,
    pending: HashMap<RequestId, PendingQuery>,
    next_body_id: u64,
    last_update: Option<Instant>,
    worker: Option<JoinHandle<()>>,
    config: WorldConfig,
}

impl<R: Renderable> Coordinator<R> {
    /// Validate the config, spawn the simulation worker thread, and
    /// send the one-time `Initialize` command.
    pub fn spawn(config: WorldConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        let (cmd_tx, cmd_rx) = crossbeam_channel::bounded(COMMAND_CHANNEL_CAPACITY);
        let (evt_tx, evt_rx) = crossbeam_channel::unbounded();

        let worker = thread::Builder::new()
            .name("kinet-sim".into())
            .spawn(move || {
                if let Err(e) = kinet_sim::run(cmd_rx, evt_tx) {
                    log::error!("simulation worker terminated: {e}");
                }
            })
            .expect("failed to spawn simulation worker thread");

        // FIFO guarantees this arrives before any other command.
        cmd_tx
            .try_send(Command::Initialize {
                gravity: config.gravity,
                solver_iterations: config.solver_iterations,
            })
            .map_err(|_| ConfigError::WorkerUnavailable)?;

        Ok(Self {
            cmd_tx: Some(cmd_tx),
            evt_rx,
            objects: IndexMap::new(),
            pending: HashMap::new(),
            next_body_id: 1,
            last_update: None,
            worker: Some(worker),
            config,
        })
    }

    /// Register a renderable with a physics body and return its id.
    ///
    /// The shape is validated here, at the boundary, so a bad
    /// descriptor fails synchronously instead of inside the simulation
    /// thread. Returns immediately; the body exists on the worker side
    /// one message later.
    pub fn add_object(&mut self, renderable: R, options: BodyOptions) -> Result<BodyId, AddObjectError> {
        options.shape.validate()?;

        let id = BodyId(self.next_body_id);
        self.next_body_id += 1;
        self.objects.insert(id, renderable);

        if let Err(e) = self.submit(Command::CreateBody { id, options }) {
            self.objects.shift_remove(&id);
            return Err(e.into());
        }
        Ok(id)
    }

    /// Remove the renderable mapping and the simulation body.
    /// Idempotent on both sides.
    pub fn remove_object(&mut self, id: BodyId) -> Result<(), CommandError> {
        self.objects.shift_remove(&id);
        self.submit(Command::RemoveBody { id })
    }

    /// Accumulate a force on a body for the next step.
    pub fn apply_force(
        &self,
        id: BodyId,
        force: Vec3,
        world_point: Option<Vec3>,
    ) -> Result<(), CommandError> {
        self.submit(Command::ApplyForce {
            id,
            force,
            world_point,
        })
    }

    /// Apply an instantaneous velocity change to a body.
    pub fn apply_impulse(
        &self,
        id: BodyId,
        impulse: Vec3,
        world_point: Option<Vec3>,
    ) -> Result<(), CommandError> {
        self.submit(Command::ApplyImpulse {
            id,
            impulse,
            world_point,
        })
    }

    /// Teleport a body.
    pub fn set_position(&self, id: BodyId, position: Vec3) -> Result<(), CommandError> {
        self.submit(Command::SetPosition { id, position })
    }

    /// Override a body's linear velocity.
    pub fn set_velocity(&self, id: BodyId, velocity: Vec3) -> Result<(), CommandError> {
        self.submit(Command::SetVelocity { id, velocity })
    }

    /// Once-per-frame advance.
    ///
    /// Pumps pending events (applying the latest sync frames onto the
    /// renderables), then sends a single `Step` whose `dt` is the
    /// wall-clock time since the previous `update` call, clamped to
    /// [`WorldConfig::max_step_dt`]. The first call steps by zero.
    pub fn update(&mut self) -> Result<(), CommandError> {
        let now = Instant::now();
        let dt = match self.last_update {
            Some(prev) => clamp_dt((now - prev).as_secs_f32(), self.config.max_step_dt),
            None => 0.0,
        };
        self.last_update = Some(now);

        self.poll_events();
        self.submit(Command::Step { dt })
    }

    /// Drain and handle every event currently queued, then expire
    /// overdue queries. Returns the number of events handled.
    pub fn poll_events(&mut self) -> usize {
        let mut handled = 0;
        while let Ok(event) = self.evt_rx.try_recv() {
            self.handle_event(event);
            handled += 1;
        }
        self.expire_stale_queries();
        handled
    }

    /// Issue a correlated single-body property query.
    ///
    /// The reply arrives while events are pumped; the pending entry
    /// expires with [`QueryError::TimedOut`] after
    /// [`WorldConfig::query_timeout`].
    pub fn get_body_properties(&mut self, id: BodyId) -> Result<PropertiesTicket, CommandError> {
        let request_id = RequestId::next();
        let (reply_tx, reply_rx) = crossbeam_channel::bounded(1);
        self.pending.insert(
            request_id,
            PendingQuery {
                reply: reply_tx,
                deadline: Instant::now() + self.config.query_timeout,
            },
        );

        if let Err(e) = self.submit(Command::GetBodyProperties { id, request_id }) {
            self.pending.remove(&request_id);
            return Err(e);
        }
        Ok(PropertiesTicket {
            request_id,
            rx: reply_rx,
        })
    }

    /// Pump events until the ticket resolves or `timeout` passes.
    ///
    /// Blocking; meant for tests and tooling, not the render loop.
    pub fn wait_properties(&mut self, ticket: &PropertiesTicket, timeout: Duration) -> QueryReply {
        let deadline = Instant::now() + timeout;
        loop {
            if let Ok(reply) = ticket.rx.try_recv() {
                return reply;
            }
            let now = Instant::now();
            if now >= deadline {
                self.pending.remove(&ticket.request_id);
                return Err(QueryError::TimedOut);
            }
            match self.evt_rx.recv_timeout(deadline - now) {
                Ok(event) => {
                    self.handle_event(event);
                    self.expire_stale_queries();
                }
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => return Err(QueryError::WorkerShutdown),
            }
        }
    }

    /// Number of registered renderable objects.
    pub fn body_count(&self) -> usize {
        self.objects.len()
    }

    /// Whether `id` has a registered renderable.
    pub fn contains(&self, id: BodyId) -> bool {
        self.objects.contains_key(&id)
    }

    /// The renderable registered under `id`.
    pub fn renderable(&self, id: BodyId) -> Option<&R> {
        self.objects.get(&id)
    }

    /// Mutable access to the renderable registered under `id`.
    pub fn renderable_mut(&mut self, id: BodyId) -> Option<&mut R> {
        self.objects.get_mut(&id)
    }

    /// Shut the worker down: close the command channel and join the
    /// thread. Called automatically on drop.
    pub fn shutdown(&mut self) {
        self.cmd_tx.take();
        if let Some(handle) = self.worker.take() {
            let _ = handle.join();
        }
    }

    fn submit(&self, command: Command) -> Result<(), CommandError> {
        let cmd_tx = self.cmd_tx.as_ref().ok_or(CommandError::WorkerShutdown)?;
        cmd_tx.try_send(command).map_err(|e| match e {
            crossbeam_channel::TrySendError::Full(_) => CommandError::ChannelFull,
            crossbeam_channel::TrySendError::Disconnected(_) => CommandError::WorkerShutdown,
        })
    }

    fn handle_event(&mut self, event: Event) {
        match event {
            Event::Sync(frame) => self.apply_sync(&frame),
            Event::BodyProperties(report) => {
                self.resolve_query(report.request_id, Ok(report));
            }
            Event::QueryFailed { request_id, reason } => {
                self.resolve_query(request_id, Err(reason));
            }
            Event::CreateFailed { id, reason } => {
                log::warn!("worker rejected body {id}: {reason}");
                self.objects.shift_remove(&id);
            }
        }
    }

    /// Apply a sync frame by id lookup. A frame entry whose id has no
    /// local object is the benign removal race across the message
    /// boundary; it is dropped at debug level.
    fn apply_sync(&mut self, frame: &SyncFrame) {
        for (id, position, orientation) in frame.entries() {
            match self.objects.get_mut(&id) {
                Some(renderable) => renderable.apply_transform(position, orientation),
                None => log::debug!("sync entry for unknown body {id}: dropped"),
            }
        }
    }

    fn resolve_query(&mut self, request_id: RequestId, reply: QueryReply) {
        match self.pending.remove(&request_id) {
            // Best-effort: the caller may have dropped the ticket.
            Some(pending) => {
                let _ = pending.reply.send(reply);
            }
            None => log::warn!("response with unmatched request id {request_id}: dropped"),
        }
    }

    fn expire_stale_queries(&mut self) {
        let now = Instant::now();
        self.pending.retain(|request_id, pending| {
            if now < pending.deadline {
                return true;
            }
            log::warn!("query {request_id} timed out");
            let _ = pending.reply.send(Err(QueryError::TimedOut));
            false
        });
    }
}

impl<R: Renderable> Drop for Coordinator<R> {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Clamp a frame's elapsed time to the maximum simulation step.
fn clamp_dt(elapsed: f32, max_step_dt: f32) -> f32 {
    elapsed.min(max_step_dt)
}

#[cfg(test)]
mod tests {
    use super::*;
    use kinet_core::{BodyId, SleepState};

    #[derive(Debug, Default, PartialEq)]
    struct TestRenderable {
        position: Vec3,
        orientation: Quat,
        syncs: usize,
    }

    impl Renderable for TestRenderable {
        fn apply_transform(&mut self, position: Vec3, orientation: Quat) {
            self.position = position;
            self.orientation = orientation;
            self.syncs += 1;
        }
    }

    /// A coordinator with no worker thread: commands land in the
    /// returned receiver, events are injected via the returned sender.
    fn detached() -> (
        Coordinator<TestRenderable>,
        Receiver<Command>,
        Sender<Event>,
    ) {
        let (cmd_tx, cmd_rx) = crossbeam_channel::bounded(COMMAND_CHANNEL_CAPACITY);
        let (evt_tx, evt_rx) = crossbeam_channel::unbounded();
        let coordinator = Coordinator {
            cmd_tx: Some(cmd_tx),
            evt_rx,
            objects: IndexMap::new(),
            pending: HashMap::new(),
            next_body_id: 1,
            last_update: None,
            worker: None,
            config: WorldConfig::default(),
        };
        (coordinator, cmd_rx, evt_tx)
    }

    fn report_for(request_id: RequestId) -> BodyPropertiesReport {
        BodyPropertiesReport {
            request_id,
            mass: 1.0,
            position: [0.0; 3],
            orientation: [0.0, 0.0, 0.0, 1.0],
            linear_velocity: [0.0; 3],
            angular_velocity: [0.0; 3],
            fixed_rotation: false,
            sleep_state: SleepState::Awake,
        }
    }

    #[test]
    fn dt_is_clamped_to_max_step() {
        assert_eq!(clamp_dt(0.5, 1.0 / 30.0), 1.0 / 30.0);
        assert_eq!(clamp_dt(0.01, 1.0 / 30.0), 0.01);
        assert_eq!(clamp_dt(0.0, 1.0 / 30.0), 0.0);
    }

    #[test]
    fn add_object_allocates_monotonic_ids_and_sends_create() {
        let (mut c, cmd_rx, _evt_tx) = detached();
        let options = BodyOptions::dynamic_ball(0.5, 1.0).unwrap();
        let a = c.add_object(TestRenderable::default(), options).unwrap();
        let b = c.add_object(TestRenderable::default(), options).unwrap();
        assert!(a < b);
        assert_eq!(c.body_count(), 2);

        let Command::CreateBody { id, .. } = cmd_rx.try_recv().unwrap() else {
            panic!("expected CreateBody");
        };
        assert_eq!(id, a);
    }

    #[test]
    fn add_object_rejects_bad_shape_without_sending() {
        let (mut c, cmd_rx, _evt_tx) = detached();
        let options = BodyOptions::new(kinet_core::ShapeDesc::Sphere { radius: -1.0 });
        let err = c.add_object(TestRenderable::default(), options).unwrap_err();
        assert!(matches!(err, AddObjectError::Shape(_)));
        assert_eq!(c.body_count(), 0);
        assert!(cmd_rx.try_recv().is_err());
    }

    #[test]
    fn sync_applies_by_id_and_skips_unknown() {
        let (mut c, _cmd_rx, evt_tx) = detached();
        let options = BodyOptions::dynamic_ball(0.5, 1.0).unwrap();
        let a = c.add_object(TestRenderable::default(), options).unwrap();
        let b = c.add_object(TestRenderable::default(), options).unwrap();

        // Frame mentions a removed/unknown id between two live ones.
        let frame = SyncFrame {
            ids: vec![a, BodyId(999), b],
            positions: vec![1.0, 2.0, 3.0, 0.0, 0.0, 0.0, 4.0, 5.0, 6.0],
            orientations: vec![
                0.0, 0.0, 0.0, 1.0, //
                0.0, 0.0, 0.0, 1.0, //
                0.0, 0.0, 0.0, 1.0,
            ],
        };
        evt_tx.send(Event::Sync(frame)).unwrap();
        assert_eq!(c.poll_events(), 1);

        assert_eq!(c.renderable(a).unwrap().position, [1.0, 2.0, 3.0]);
        assert_eq!(c.renderable(b).unwrap().position, [4.0, 5.0, 6.0]);
        assert_eq!(c.renderable(a).unwrap().syncs, 1);
    }

    #[test]
    fn query_resolution_is_keyed_by_request_id() {
        let (mut c, cmd_rx, evt_tx) = detached();
        let ticket = c.get_body_properties(BodyId(1)).unwrap();
        let Command::GetBodyProperties { request_id, .. } = cmd_rx.try_recv().unwrap() else {
            panic!("expected GetBodyProperties");
        };
        assert_eq!(request_id, ticket.request_id());

        evt_tx
            .send(Event::BodyProperties(report_for(request_id)))
            .unwrap();
        c.poll_events();
        let reply = ticket.try_get().expect("ticket should be resolved");
        assert_eq!(reply.unwrap().request_id, request_id);
    }

    #[test]
    fn unmatched_response_is_dropped_without_panic() {
        let (mut c, _cmd_rx, evt_tx) = detached();
        evt_tx
            .send(Event::BodyProperties(report_for(RequestId::next())))
            .unwrap();
        assert_eq!(c.poll_events(), 1);
    }

    #[test]
    fn overdue_query_expires_with_timeout() {
        let (mut c, _cmd_rx, _evt_tx) = detached();
        c.config.query_timeout = Duration::from_millis(0);
        let ticket = c.get_body_properties(BodyId(1)).unwrap();
        std::thread::sleep(Duration::from_millis(5));
        c.poll_events();
        assert_eq!(ticket.try_get(), Some(Err(QueryError::TimedOut)));
    }

    #[test]
    fn create_failed_event_rolls_back_local_mapping() {
        let (mut c, _cmd_rx, evt_tx) = detached();
        let options = BodyOptions::dynamic_ball(0.5, 1.0).unwrap();
        let id = c.add_object(TestRenderable::default(), options).unwrap();
        evt_tx
            .send(Event::CreateFailed {
                id,
                reason: ShapeError::InvalidSphereRadius { radius: -1.0 },
            })
            .unwrap();
        c.poll_events();
        assert!(!c.contains(id));
    }

    #[test]
    fn submit_after_shutdown_reports_worker_gone() {
        let (mut c, _cmd_rx, _evt_tx) = detached();
        c.shutdown();
        assert_eq!(
            c.set_velocity(BodyId(1), [0.0; 3]),
            Err(CommandError::WorkerShutdown)
        );
    }
}
