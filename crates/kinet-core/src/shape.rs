//! Collision shape descriptors.

use crate::error::ShapeError;
use crate::id::Vec3;

/// Geometric collision primitive for a physics body.
///
/// A closed sum type: adding a shape forces every consumer — collider
/// construction, validation, serialization — to handle it at compile
/// time. Prefer the fallible constructors ([`cuboid`](Self::cuboid),
/// [`sphere`](Self::sphere)) which reject degenerate parameters up
/// front; [`validate`](Self::validate) re-checks descriptors built
/// directly from literals.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ShapeDesc {
    /// An axis-aligned box, described by its half-extents.
    Box {
        /// Half the box size along each local axis. Must be positive.
        half_extents: Vec3,
    },
    /// A sphere.
    Sphere {
        /// The sphere radius. Must be positive.
        radius: f32,
    },
    /// An infinite plane with outward normal +Y in body-local space.
    ///
    /// Only meaningful for static bodies; typically the ground.
    Plane,
}

impl ShapeDesc {
    /// Build a box shape, rejecting non-positive or non-finite extents.
    pub fn cuboid(half_extents: Vec3) -> Result<Self, ShapeError> {
        let shape = Self::Box { half_extents };
        shape.validate()?;
        Ok(shape)
    }

    /// Build a sphere shape, rejecting a non-positive or non-finite radius.
    pub fn sphere(radius: f32) -> Result<Self, ShapeError> {
        let shape = Self::Sphere { radius };
        shape.validate()?;
        Ok(shape)
    }

    /// Check the shape parameters.
    ///
    /// Box half-extents and sphere radii must be strictly positive and
    /// finite. `Plane` carries no parameters and is always valid.
    pub fn validate(&self) -> Result<(), ShapeError> {
        match *self {
            Self::Box { half_extents } => {
                if half_extents.iter().all(|e| e.is_finite() && *e > 0.0) {
                    Ok(())
                } else {
                    Err(ShapeError::InvalidBoxExtents { half_extents })
                }
            }
            Self::Sphere { radius } => {
                if radius.is_finite() && radius > 0.0 {
                    Ok(())
                } else {
                    Err(ShapeError::InvalidSphereRadius { radius })
                }
            }
            Self::Plane => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cuboid_accepts_positive_extents() {
        let s = ShapeDesc::cuboid([0.5, 1.0, 0.25]).unwrap();
        assert!(matches!(s, ShapeDesc::Box { .. }));
    }

    #[test]
    fn cuboid_rejects_zero_extent() {
        let err = ShapeDesc::cuboid([0.5, 0.0, 0.25]).unwrap_err();
        assert_eq!(
            err,
            ShapeError::InvalidBoxExtents {
                half_extents: [0.5, 0.0, 0.25]
            }
        );
    }

    #[test]
    fn cuboid_rejects_nan_extent() {
        assert!(ShapeDesc::cuboid([f32::NAN, 1.0, 1.0]).is_err());
    }

    #[test]
    fn sphere_rejects_negative_and_infinite_radius() {
        assert!(ShapeDesc::sphere(-0.1).is_err());
        assert!(ShapeDesc::sphere(f32::INFINITY).is_err());
        assert!(ShapeDesc::sphere(0.3).is_ok());
    }

    #[test]
    fn plane_is_always_valid() {
        assert!(ShapeDesc::Plane.validate().is_ok());
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn validation_matches_componentwise_rule(
                hx in -10.0f32..10.0,
                hy in -10.0f32..10.0,
                hz in -10.0f32..10.0,
            ) {
                let valid = hx > 0.0 && hy > 0.0 && hz > 0.0;
                let result = ShapeDesc::cuboid([hx, hy, hz]);
                prop_assert_eq!(result.is_ok(), valid);
            }

            #[test]
            fn sphere_validation_matches_rule(r in -10.0f32..10.0) {
                prop_assert_eq!(ShapeDesc::sphere(r).is_ok(), r > 0.0);
            }
        }
    }
}
