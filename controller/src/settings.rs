/*!
Movement controller settings and tolerances.

`ControllerSettings` holds the per-instance tuning; the module constants are
fixed parts of the algorithm that are not meant to vary per character.
Keeping them together makes tuning easier and keeps behavior consistent
across hosts.

Notes
- Distances are in meters, speeds in m/s, times in seconds, angles in degrees.
- Favor practical world-space tolerances over machine epsilon for robust behavior.
- Keep `gravity_mps2` equal to the host world's gravity magnitude; the
  idle-hold path counters exactly one tick of gravity with it.
*/

/// Height of the ground-validation ray origin above a contact point (meters).
pub const GROUND_PROBE_RISE: f32 = 1.0;

/// Max distance of the downward ground-validation ray (meters).
/// Slightly more than [`GROUND_PROBE_RISE`] so the ray reaches just below the
/// contact point it started above.
pub const GROUND_PROBE_RANGE: f32 = 1.1;

/// Practical tolerance for approximate scalar equality.
/// Used for the divide-by-zero guard in the velocity correction and for the
/// "no directional input" test.
pub const APPROX_EPS: f32 = 1.0e-6;

/// Squared-length floor below which a vector is treated as zero when normalizing.
pub const NORMALIZE_GUARD_SQ: f32 = 1.0e-12;

/// Damping applied to the air-control delta before submission.
/// Air influence is intentionally weaker than the grounded correction.
pub const AIR_CONTROL_DAMPING: f32 = 0.5;

/// Per-instance movement tuning.
///
/// `Default` carries the canonical values; hosts override fields as needed
/// and pass the struct to [`CharacterController::new`](crate::CharacterController::new).
#[derive(Clone, Copy, Debug)]
pub struct ControllerSettings {
    /// Grounded speed-up rate toward the target velocity (m/s per second).
    pub acceleration_rate: f32,
    /// Grounded slow-down rate toward the target velocity (m/s per second).
    pub deceleration_rate: f32,
    /// Air-control authority (m/s per second, before damping).
    pub aerial_acceleration: f32,
    /// Vertical take-off speed applied when a jump request is consumed (m/s).
    pub jump_speed: f32,
    /// Extra ground-snap reach below the capsule's lowest point (meters).
    pub nudge_extra: f32,
    /// Walkable slope limit, measured between surface normal and world up (degrees).
    pub max_slope_deg: f32,
    /// Planar speed at or above which grounded acceleration is cut (m/s).
    /// External pushes past this are left alone; only input stops adding.
    pub max_input_speed: f32,
    /// Landing absorption: planar speeds at or below this hard-stop to zero,
    /// faster landings take a mass-scaled braking impulse of this magnitude.
    pub landing_soak: f32,
    /// Seconds of ground contact required before the next jump is accepted.
    pub jump_cooldown_time: f32,
    /// Stance target speeds (m/s).
    pub walk_speed: f32,
    pub sprint_speed: f32,
    pub crouch_speed: f32,
    /// A slide ends (reverting to crouch) once its target speed decays to this (m/s).
    pub slide_threshold: f32,
    /// Slide target-speed decay factor (per second, fed to a clamped lerp).
    pub slide_decay_rate: f32,
    /// Sprint button acts as a toggle instead of hold-to-sprint.
    pub toggle_sprint: bool,
    /// Crouch button acts as a toggle instead of hold-to-crouch.
    pub toggle_crouch: bool,
    /// Gravity magnitude of the host world (m/s^2, positive value).
    pub gravity_mps2: f32,
}

impl Default for ControllerSettings {
    fn default() -> Self {
        Self {
            acceleration_rate: 20.0,
            deceleration_rate: 20.0,
            aerial_acceleration: 5.0,
            jump_speed: 4.0,
            nudge_extra: 0.5,
            max_slope_deg: 45.0,
            max_input_speed: 8.0,
            landing_soak: 1.0,
            jump_cooldown_time: 0.1,
            walk_speed: 5.0,
            sprint_speed: 8.0,
            crouch_speed: 2.5,
            slide_threshold: 5.0,
            slide_decay_rate: 2.0,
            toggle_sprint: false,
            toggle_crouch: false,
            gravity_mps2: 9.81,
        }
    }
}

impl ControllerSettings {
    /// Cosine of the walkable slope limit, for comparing against unit normals.
    #[inline]
    pub fn max_slope_cos(&self) -> f32 {
        self.max_slope_deg.to_radians().cos()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_slope_limit_cos_matches_45_degrees() {
        let settings = ControllerSettings::default();
        assert!((settings.max_slope_cos() - 0.70710677).abs() < 1.0e-6);
    }

    #[test]
    fn defaults_are_the_canonical_tuning() {
        let s = ControllerSettings::default();
        assert_eq!(s.acceleration_rate, 20.0);
        assert_eq!(s.jump_speed, 4.0);
        assert_eq!(s.walk_speed, 5.0);
        assert_eq!(s.sprint_speed, 8.0);
        assert_eq!(s.crouch_speed, 2.5);
        assert_eq!(s.slide_threshold, 5.0);
        assert!(!s.toggle_sprint);
        assert!(!s.toggle_crouch);
    }
}
