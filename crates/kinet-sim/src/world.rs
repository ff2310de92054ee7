//! The authoritative physics world and its ordered body registry.
//!
//! [`PhysicsWorld`] wraps the full rapier3d simulation context and maps
//! protocol-level [`BodyId`]s onto engine body handles through an
//! insertion-ordered registry. Commands mutate it; [`step`](PhysicsWorld::step)
//! advances it and serializes a [`SyncFrame`] over the registry's
//! current iteration order.
//!
//! Unknown-id mutating commands are tolerated as no-ops but logged at
//! debug level, distinct from the warn-level genuine protocol errors,
//! so lifecycle races stay observable in testing.

use std::num::NonZeroUsize;

use indexmap::IndexMap;
use rapier3d::na::{Isometry3, Quaternion, Translation3, UnitQuaternion, Vector3};
use rapier3d::prelude::*;

use kinet_core::{
    BodyId, BodyOptions, BodyPropertiesReport, Command, Event, Quat, QueryError, RequestId,
    ShapeDesc, ShapeError, SleepState, SyncFrame, Vec3,
};

use crate::frame::FrameBuffers;

/// Registry entry for one live body.
struct BodyEntry {
    handle: RigidBodyHandle,
    fixed_rotation: bool,
}

/// The one authoritative physics world.
///
/// Exclusively owned and mutated by the simulation worker thread; the
/// Coordinator never touches it except through the command protocol.
pub struct PhysicsWorld {
    pipeline: PhysicsPipeline,
    gravity: Vector3<Real>,
    integration_parameters: IntegrationParameters,
    islands: IslandManager,
    broad_phase: BroadPhaseMultiSap,
    narrow_phase: NarrowPhase,
    bodies: RigidBodySet,
    colliders: ColliderSet,
    impulse_joints: ImpulseJointSet,
    multibody_joints: MultibodyJointSet,
    ccd_solver: CCDSolver,
    /// BodyId → engine handle, in creation order. Removal preserves the
    /// relative order of the survivors.
    registry: IndexMap<BodyId, BodyEntry>,
    buffers: FrameBuffers,
}

impl PhysicsWorld {
    /// Construct the world with the given gravity and solver iteration
    /// count. Called exactly once per worker lifetime, from the
    /// `Initialize` command.
    pub fn new(gravity: Vec3, solver_iterations: u32) -> Self {
        let mut integration_parameters = IntegrationParameters::default();
        if let Some(n) = NonZeroUsize::new(solver_iterations as usize) {
            integration_parameters.num_solver_iterations = n;
        }

        Self {
            pipeline: PhysicsPipeline::new(),
            gravity: to_vector(gravity),
            integration_parameters,
            islands: IslandManager::new(),
            broad_phase: BroadPhaseMultiSap::new(),
            narrow_phase: NarrowPhase::new(),
            bodies: RigidBodySet::new(),
            colliders: ColliderSet::new(),
            impulse_joints: ImpulseJointSet::new(),
            multibody_joints: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
            registry: IndexMap::new(),
            buffers: FrameBuffers::new(),
        }
    }

    /// Apply one post-initialization command, returning the event it
    /// produces, if any.
    pub fn apply(&mut self, command: Command) -> Option<Event> {
        match command {
            // Handled by the worker loop; a duplicate reaching this far
            // is dropped there too.
            Command::Initialize { .. } => None,
            Command::CreateBody { id, options } => match self.create_body(id, options) {
                Ok(()) => None,
                Err(reason) => Some(Event::CreateFailed { id, reason }),
            },
            Command::RemoveBody { id } => {
                self.remove_body(id);
                None
            }
            Command::Step { dt } => Some(Event::Sync(self.step(dt))),
            Command::ApplyForce {
                id,
                force,
                world_point,
            } => {
                self.apply_force(id, force, world_point);
                None
            }
            Command::ApplyImpulse {
                id,
                impulse,
                world_point,
            } => {
                self.apply_impulse(id, impulse, world_point);
                None
            }
            Command::SetPosition { id, position } => {
                self.set_position(id, position);
                None
            }
            Command::SetVelocity { id, velocity } => {
                self.set_velocity(id, velocity);
                None
            }
            Command::GetBodyProperties { id, request_id } => {
                Some(match self.body_properties(id, request_id) {
                    Ok(report) => Event::BodyProperties(report),
                    Err(reason) => Event::QueryFailed { request_id, reason },
                })
            }
        }
    }

    /// Validate and register a new body under `id`.
    ///
    /// `mass == 0` creates a fixed (immovable) body. Registration grows
    /// the outgoing frame capacity to the new live-body count.
    pub fn create_body(&mut self, id: BodyId, options: BodyOptions) -> Result<(), ShapeError> {
        options.shape.validate()?;

        if self.registry.contains_key(&id) {
            log::warn!("CreateBody for already-live body {id}: dropped");
            return Ok(());
        }

        let is_static = options.mass == 0.0;
        let mut builder = if is_static {
            RigidBodyBuilder::fixed()
        } else {
            RigidBodyBuilder::dynamic()
        }
        .position(to_isometry(options.position, options.orientation))
        .linear_damping(options.linear_damping)
        .angular_damping(options.angular_damping);
        if options.fixed_rotation {
            builder = builder.lock_rotations();
        }
        let handle = self.bodies.insert(builder.build());

        let collider = match options.shape {
            ShapeDesc::Box {
                half_extents: [hx, hy, hz],
            } => ColliderBuilder::cuboid(hx, hy, hz),
            ShapeDesc::Sphere { radius } => ColliderBuilder::ball(radius),
            ShapeDesc::Plane => ColliderBuilder::halfspace(Vector3::y_axis()),
        }
        .friction(options.material.friction)
        .restitution(options.material.restitution)
        .mass(if is_static { 0.0 } else { options.mass });
        self.colliders
            .insert_with_parent(collider.build(), handle, &mut self.bodies);

        self.registry.insert(
            id,
            BodyEntry {
                handle,
                fixed_rotation: options.fixed_rotation,
            },
        );
        self.buffers.reserve_for(self.registry.len());
        Ok(())
    }

    /// Remove a body and its colliders. Idempotent: unknown ids are
    /// ignored. Survivors keep their relative registry order.
    pub fn remove_body(&mut self, id: BodyId) {
        let Some(entry) = self.registry.shift_remove(&id) else {
            log::debug!("RemoveBody for unknown body {id}: ignored");
            return;
        };
        self.bodies.remove(
            entry.handle,
            &mut self.islands,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            true,
        );
    }

    /// Accumulate a force for the next step, at the given world point
    /// or the center of mass.
    pub fn apply_force(&mut self, id: BodyId, force: Vec3, world_point: Option<Vec3>) {
        let Some(body) = self.body_mut(id, "ApplyForce") else {
            return;
        };
        match world_point {
            Some(p) => body.add_force_at_point(to_vector(force), to_point(p), true),
            None => body.add_force(to_vector(force), true),
        }
    }

    /// Apply an instantaneous velocity change, at the given world point
    /// or the center of mass.
    pub fn apply_impulse(&mut self, id: BodyId, impulse: Vec3, world_point: Option<Vec3>) {
        let Some(body) = self.body_mut(id, "ApplyImpulse") else {
            return;
        };
        match world_point {
            Some(p) => body.apply_impulse_at_point(to_vector(impulse), to_point(p), true),
            None => body.apply_impulse(to_vector(impulse), true),
        }
    }

    /// Teleport a body, keeping its orientation.
    ///
    /// Replaces the whole pose via `set_position`, which also resets
    /// the engine's pose interpolation basis — no one-frame snap-back.
    pub fn set_position(&mut self, id: BodyId, position: Vec3) {
        let Some(body) = self.body_mut(id, "SetPosition") else {
            return;
        };
        let rotation = *body.rotation();
        body.set_position(
            Isometry3::from_parts(Translation3::new(position[0], position[1], position[2]), rotation),
            true,
        );
    }

    /// Override a body's linear velocity.
    pub fn set_velocity(&mut self, id: BodyId, velocity: Vec3) {
        let Some(body) = self.body_mut(id, "SetVelocity") else {
            return;
        };
        body.set_linvel(to_vector(velocity), true);
    }

    /// Advance the world by exactly `dt` once and serialize the frame.
    ///
    /// `dt <= 0` skips integration entirely so a zero step advances no
    /// body, but still produces a frame. User force accumulators are
    /// cleared after the step: `ApplyForce` affects exactly the steps
    /// it was enqueued before.
    pub fn step(&mut self, dt: f32) -> SyncFrame {
        if dt > 0.0 {
            self.integration_parameters.dt = dt;
            self.pipeline.step(
                &self.gravity,
                &self.integration_parameters,
                &mut self.islands,
                &mut self.broad_phase,
                &mut self.narrow_phase,
                &mut self.bodies,
                &mut self.colliders,
                &mut self.impulse_joints,
                &mut self.multibody_joints,
                &mut self.ccd_solver,
                None,
                &(),
                &(),
            );
            for entry in self.registry.values() {
                if let Some(body) = self.bodies.get_mut(entry.handle) {
                    body.reset_forces(false);
                    body.reset_torques(false);
                }
            }
        }
        self.serialize_frame()
    }

    /// Read a single body's properties.
    pub fn body_properties(
        &self,
        id: BodyId,
        request_id: RequestId,
    ) -> Result<BodyPropertiesReport, QueryError> {
        let entry = self
            .registry
            .get(&id)
            .ok_or(QueryError::BodyNotFound { id })?;
        let body = self
            .bodies
            .get(entry.handle)
            .ok_or(QueryError::BodyNotFound { id })?;

        let position = *body.translation();
        let rotation = *body.rotation();
        let linvel = *body.linvel();
        let angvel = *body.angvel();
        Ok(BodyPropertiesReport {
            request_id,
            mass: body.mass(),
            position: [position.x, position.y, position.z],
            orientation: quat_components(&rotation),
            linear_velocity: [linvel.x, linvel.y, linvel.z],
            angular_velocity: [angvel.x, angvel.y, angvel.z],
            fixed_rotation: entry.fixed_rotation,
            sleep_state: sleep_state(body),
        })
    }

    /// Number of live bodies.
    pub fn live_body_count(&self) -> usize {
        self.registry.len()
    }

    /// Whether `id` names a live body.
    pub fn contains(&self, id: BodyId) -> bool {
        self.registry.contains_key(&id)
    }

    fn body_mut(&mut self, id: BodyId, command: &str) -> Option<&mut RigidBody> {
        let Some(entry) = self.registry.get(&id) else {
            log::debug!("{command} for unknown body {id}: ignored");
            return None;
        };
        self.bodies.get_mut(entry.handle)
    }

    fn serialize_frame(&mut self) -> SyncFrame {
        let mut frame = self.buffers.allocate();
        for (&id, entry) in &self.registry {
            let Some(body) = self.bodies.get(entry.handle) else {
                continue;
            };
            let position = body.translation();
            let rotation = body.rotation();
            frame.ids.push(id);
            frame.positions.extend([position.x, position.y, position.z]);
            frame.orientations.extend(quat_components(rotation));
        }
        frame
    }
}

fn to_vector(v: Vec3) -> Vector3<Real> {
    Vector3::new(v[0], v[1], v[2])
}

fn to_point(v: Vec3) -> Point<Real> {
    Point::new(v[0], v[1], v[2])
}

fn to_isometry(position: Vec3, orientation: Quat) -> Isometry3<Real> {
    let [x, y, z, w] = orientation;
    Isometry3::from_parts(
        Translation3::new(position[0], position[1], position[2]),
        UnitQuaternion::from_quaternion(Quaternion::new(w, x, y, z)),
    )
}

fn quat_components(q: &UnitQuaternion<Real>) -> Quat {
    [q.i, q.j, q.k, q.w]
}

fn sleep_state(body: &RigidBody) -> SleepState {
    if body.is_sleeping() {
        SleepState::Asleep
    } else if body.activation().time_since_can_sleep > 0.0 {
        SleepState::Sleepy
    } else {
        SleepState::Awake
    }
}
