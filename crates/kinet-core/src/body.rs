//! Body creation descriptors and the single-body property report.

use crate::error::ShapeError;
use crate::id::{Quat, RequestId, Vec3, IDENTITY_ORIENTATION};
use crate::shape::ShapeDesc;

/// Surface material of a body's collider.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Material {
    /// Coulomb friction coefficient. Default: 0.3.
    pub friction: f32,
    /// Bounciness in [0, 1]. Default: 0.0.
    pub restitution: f32,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            friction: 0.3,
            restitution: 0.0,
        }
    }
}

/// Everything needed to create a physics body.
///
/// `mass == 0` creates a static (immovable) body. Damping defaults are
/// small positive values so free-flying bodies bleed energy slowly
/// instead of drifting forever.
///
/// # Examples
///
/// ```
/// use kinet_core::{BodyOptions, ShapeDesc};
///
/// let options = BodyOptions::new(ShapeDesc::sphere(0.5).unwrap())
///     .with_mass(2.0)
///     .with_position([0.0, 3.0, 0.0]);
/// assert_eq!(options.mass, 2.0);
/// assert!(!options.fixed_rotation);
/// ```
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BodyOptions {
    /// The collision shape.
    pub shape: ShapeDesc,
    /// Body mass in kilograms. `0` means static/immovable.
    pub mass: f32,
    /// Initial world position.
    pub position: Vec3,
    /// Initial orientation as a unit quaternion (x, y, z, w).
    pub orientation: Quat,
    /// Collider surface material.
    pub material: Material,
    /// Linear velocity damping per second. Default: 0.01.
    pub linear_damping: f32,
    /// Angular velocity damping per second. Default: 0.01.
    pub angular_damping: f32,
    /// When set, the body never rotates (orientation stays fixed).
    pub fixed_rotation: bool,
}

impl BodyOptions {
    /// Options for a body with the given shape and all defaults:
    /// unit mass, origin position, identity orientation.
    pub fn new(shape: ShapeDesc) -> Self {
        Self {
            shape,
            mass: 1.0,
            position: [0.0; 3],
            orientation: IDENTITY_ORIENTATION,
            material: Material::default(),
            linear_damping: 0.01,
            angular_damping: 0.01,
            fixed_rotation: false,
        }
    }

    /// Convenience: a dynamic box with the given half-extents and mass.
    pub fn dynamic_cuboid(half_extents: Vec3, mass: f32) -> Result<Self, ShapeError> {
        Ok(Self::new(ShapeDesc::cuboid(half_extents)?).with_mass(mass))
    }

    /// Convenience: a dynamic ball with the given radius and mass.
    pub fn dynamic_ball(radius: f32, mass: f32) -> Result<Self, ShapeError> {
        Ok(Self::new(ShapeDesc::sphere(radius)?).with_mass(mass))
    }

    /// Convenience: a static ground plane with outward normal +Y.
    pub fn static_plane() -> Self {
        Self::new(ShapeDesc::Plane).with_mass(0.0)
    }

    /// Set the mass. `0` makes the body static.
    pub fn with_mass(mut self, mass: f32) -> Self {
        self.mass = mass;
        self
    }

    /// Set the initial position.
    pub fn with_position(mut self, position: Vec3) -> Self {
        self.position = position;
        self
    }

    /// Set the initial orientation (x, y, z, w unit quaternion).
    pub fn with_orientation(mut self, orientation: Quat) -> Self {
        self.orientation = orientation;
        self
    }

    /// Set the collider material.
    pub fn with_material(mut self, material: Material) -> Self {
        self.material = material;
        self
    }

    /// Set linear and angular damping.
    pub fn with_damping(mut self, linear: f32, angular: f32) -> Self {
        self.linear_damping = linear;
        self.angular_damping = angular;
        self
    }

    /// Lock the body's rotation.
    pub fn with_fixed_rotation(mut self, fixed: bool) -> Self {
        self.fixed_rotation = fixed;
        self
    }
}

/// Discrete activity state of a body in the solver.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SleepState {
    /// Actively integrated.
    Awake,
    /// Below the motion threshold, counting down to sleep.
    Sleepy,
    /// At rest and excluded from stepping cost.
    Asleep,
}

/// Response payload for a single-body property query.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BodyPropertiesReport {
    /// The correlation id of the query this report answers.
    pub request_id: RequestId,
    /// Body mass in kilograms.
    pub mass: f32,
    /// Current world position.
    pub position: Vec3,
    /// Current orientation (x, y, z, w unit quaternion).
    pub orientation: Quat,
    /// Current linear velocity.
    pub linear_velocity: Vec3,
    /// Current angular velocity.
    pub angular_velocity: Vec3,
    /// Whether the body's rotation is locked.
    pub fixed_rotation: bool,
    /// Current sleep state.
    pub sleep_state: SleepState,
}
