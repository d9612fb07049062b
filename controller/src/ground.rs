/*!
Ground classification from tracked contacts.

A contact point alone is not proof of support: the body can brush a wall or a
ledge lip with its lower hemisphere. Each candidate point is therefore
re-validated with a short downward ray just above it, and only hits whose
surface normal is within the walkable slope limit count as ground. The result
is recomputed from scratch every tick and never persisted.
*/

use crate::contacts::ContactTracker;
use crate::settings::{GROUND_PROBE_RANGE, GROUND_PROBE_RISE};
use crate::types::{CapsuleSpec, RayQuery, Vec3, normalize_or_zero};

/// Support state for one tick.
///
/// Invariant: `normal` is a unit vector when `grounded`, and exactly zero when
/// not. Consumers may branch on either representation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GroundState {
    pub grounded: bool,
    /// Unit support normal (the normalized sum of all validated hit normals),
    /// or zero when airborne.
    pub normal: Vec3,
}

impl GroundState {
    /// No support, zero normal.
    #[inline]
    pub fn airborne() -> Self {
        Self {
            grounded: false,
            normal: Vec3::zeros(),
        }
    }
}

/// Whether a unit surface normal is within the walkable slope limit.
///
/// `max_slope_cos` is the cosine of the limit angle (see
/// [`ControllerSettings::max_slope_cos`](crate::ControllerSettings::max_slope_cos)).
#[inline]
pub fn is_walkable(normal: &Vec3, max_slope_cos: f32) -> bool {
    normal.y >= max_slope_cos
}

/// Classify the body's support state from the tracked contact snapshot.
///
/// For every contact point strictly below the capsule's lower-sphere center,
/// cast a ray from [`GROUND_PROBE_RISE`] above the point straight down, up to
/// [`GROUND_PROBE_RANGE`]. Walkable hits mark the body grounded and their
/// normals accumulate; the sum is normalized into the final support normal.
pub fn classify_ground(
    world: &dyn RayQuery,
    contacts: &ContactTracker,
    body_position: Vec3,
    capsule: CapsuleSpec,
    max_slope_cos: f32,
) -> GroundState {
    let mut grounded = false;
    let mut normal_sum = Vec3::zeros();
    let lower_sphere_y = capsule.lower_sphere_center(body_position).y;

    for contact in contacts.points() {
        if contact.point.y >= lower_sphere_y {
            // At or above the lower hemisphere: a wall or edge graze, not support.
            continue;
        }

        let origin = contact.point + Vec3::new(0.0, GROUND_PROBE_RISE, 0.0);
        if let Some(hit) = world.cast_ray(origin, -Vec3::y(), GROUND_PROBE_RANGE) {
            if is_walkable(&hit.normal, max_slope_cos) {
                grounded = true;
                normal_sum += hit.normal;
            }
        }
    }

    if !grounded {
        return GroundState::airborne();
    }

    let normal = normalize_or_zero(normal_sum);
    if normal == Vec3::zeros() {
        // Validated normals cancelled out. The zero-normal invariant wins
        // over the raw flag: report airborne rather than grounded-without-normal.
        return GroundState::airborne();
    }

    GroundState {
        grounded: true,
        normal,
    }
}
