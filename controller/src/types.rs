/*!
Core types and math aliases shared by the controller submodules.

This module intentionally contains no algorithms. It defines the data
exchanged across the host boundary each tick:
- body snapshots coming in (position, orientation, velocity),
- ray queries the controller performs against the host's scene,
- force/velocity commands going back out to the host's rigid body.

Conventions
- Units are meters and seconds. Y is up.
- Right-handed coordinates with body forward = `orientation * -Z`.
*/

use nalgebra as na;

use crate::settings::NORMALIZE_GUARD_SQ;

/// Common math aliases for clarity and consistency.
pub type Vec3 = na::Vector3<f32>;
pub type Quat = na::UnitQuaternion<f32>;

/// Per-tick snapshot of the driven rigid body, as read from the physics engine.
#[derive(Clone, Copy, Debug)]
pub struct BodyState {
    /// Capsule center position (world space).
    pub position: Vec3,
    /// Body orientation. With locked rotations this is yaw-only in practice.
    pub orientation: Quat,
    /// Linear velocity (world space, m/s).
    pub velocity: Vec3,
}

impl BodyState {
    #[inline]
    pub fn new(position: Vec3, orientation: Quat, velocity: Vec3) -> Self {
        Self {
            position,
            orientation,
            velocity,
        }
    }

    /// World-space facing direction (`orientation * -Z`).
    #[inline]
    pub fn forward(&self) -> Vec3 {
        self.orientation * Vec3::new(0.0, 0.0, -1.0)
    }
}

/// Capsule specification for the driven body.
///
/// `half_height` is the half-length of the cylinder section (aligned with +Y),
/// so the total capsule height is 2*half_height + 2*radius.
#[derive(Clone, Copy, Debug)]
pub struct CapsuleSpec {
    pub radius: f32,
    pub half_height: f32,
}

impl CapsuleSpec {
    /// Distance from the capsule center to its lowest/highest point.
    #[inline]
    pub fn total_half_height(&self) -> f32 {
        self.half_height + self.radius
    }

    /// Center of the bottom hemisphere for a capsule centered at `position`.
    #[inline]
    pub fn lower_sphere_center(&self, position: Vec3) -> Vec3 {
        Vec3::new(position.x, position.y - self.half_height, position.z)
    }
}

/// A single ray-cast hit against the host's scene.
#[derive(Clone, Copy, Debug)]
pub struct RayHit {
    /// World-space hit position.
    pub point: Vec3,
    /// World-space unit surface normal at the hit.
    pub normal: Vec3,
    /// Distance from the ray origin to the hit, along the (unit) direction.
    pub distance: f32,
}

/// Scene ray casts the controller needs each tick.
///
/// Implementations must not report the driven character's own collider:
/// ground-validation and nudge rays originate on or inside the capsule, and a
/// self-hit at distance zero would read as permanent ground support.
pub trait RayQuery {
    /// Cast a ray from `origin` along the unit direction `dir`, up to
    /// `max_dist` meters. Returns the closest hit, if any.
    fn cast_ray(&self, origin: Vec3, dir: Vec3, max_dist: f32) -> Option<RayHit>;
}

/// A force/velocity request submitted back to the physics engine.
///
/// Commands are ordered; the host applies them in sequence before its next
/// integration step.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum BodyCommand {
    /// Instantaneous velocity delta, independent of body mass.
    VelocityChange(Vec3),
    /// Momentum kick scaled by body mass (landing absorption only).
    Impulse(Vec3),
    /// Hard velocity override (landing hard stop only).
    SetVelocity(Vec3),
}

/// XZ projection of a velocity.
#[inline]
pub fn planar(v: &Vec3) -> na::Vector2<f32> {
    na::Vector2::new(v.x, v.z)
}

/// Magnitude of the XZ projection of a velocity (m/s).
#[inline]
pub fn planar_speed(v: &Vec3) -> f32 {
    (v.x * v.x + v.z * v.z).sqrt()
}

/// Normalize `v`, returning zero when its length is too small to be meaningful.
#[inline]
pub fn normalize_or_zero(v: Vec3) -> Vec3 {
    let len_sq = v.norm_squared();
    if len_sq > NORMALIZE_GUARD_SQ {
        v / len_sq.sqrt()
    } else {
        Vec3::zeros()
    }
}

/// Linear interpolation from `a` to `b` with `t` clamped to [0, 1].
#[inline]
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t.clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forward_is_negative_z_at_identity() {
        let body = BodyState::new(Vec3::zeros(), Quat::identity(), Vec3::zeros());
        let fwd = body.forward();
        assert!((fwd - Vec3::new(0.0, 0.0, -1.0)).norm() < 1.0e-6);
    }

    #[test]
    fn forward_tracks_yaw() {
        use nalgebra as na;
        // Quarter turn to the left (counter-clockwise seen from above).
        let yaw = Quat::from_axis_angle(&na::Vector3::y_axis(), std::f32::consts::FRAC_PI_2);
        let body = BodyState::new(Vec3::zeros(), yaw, Vec3::zeros());
        let fwd = body.forward();
        assert!((fwd - Vec3::new(-1.0, 0.0, 0.0)).norm() < 1.0e-6);
    }

    #[test]
    fn capsule_derived_heights() {
        let capsule = CapsuleSpec {
            radius: 0.5,
            half_height: 0.5,
        };
        assert_eq!(capsule.total_half_height(), 1.0);
        let bottom = capsule.lower_sphere_center(Vec3::new(2.0, 3.0, 4.0));
        assert_eq!(bottom, Vec3::new(2.0, 2.5, 4.0));
    }

    #[test]
    fn normalize_or_zero_guards_tiny_vectors() {
        assert_eq!(normalize_or_zero(Vec3::zeros()), Vec3::zeros());
        assert_eq!(normalize_or_zero(Vec3::new(1.0e-9, 0.0, 0.0)), Vec3::zeros());
        let n = normalize_or_zero(Vec3::new(0.0, 3.0, 4.0));
        assert!((n.norm() - 1.0).abs() < 1.0e-6);
    }

    #[test]
    fn lerp_clamps_t() {
        assert_eq!(lerp(0.0, 10.0, 0.5), 5.0);
        assert_eq!(lerp(0.0, 10.0, 2.0), 10.0);
        assert_eq!(lerp(0.0, 10.0, -1.0), 0.0);
    }
}
