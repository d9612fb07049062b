/*!
Per-tick input snapshot consumed by the controller.

Device mapping (keys, gamepads, buffering) lives in the host; the controller
only sees the distilled result for the current fixed tick. Buttons arrive as
press/release edges so both hold and toggle activation modes can be resolved
by the stance machine.
*/

use crate::settings::APPROX_EPS;

/// Immutable movement input for one fixed tick.
///
/// Axes are body-local: `move_x` to the right, `move_y` forward. The pair is
/// expected to be jointly normalized by the input layer; the controller
/// re-normalizes defensively (see [`MotionInputs::normalized_axes`]).
#[derive(Clone, Copy, Debug, Default)]
pub struct MotionInputs {
    /// Rightward input axis.
    pub move_x: f32,
    /// Forward input axis.
    pub move_y: f32,
    /// Jump button was pressed this tick (edge, not held state).
    pub jump_pressed: bool,
    /// Sprint button press edge this tick.
    pub sprint_pressed: bool,
    /// Sprint button release edge this tick.
    pub sprint_released: bool,
    /// Crouch button press edge this tick.
    pub crouch_pressed: bool,
    /// Crouch button release edge this tick.
    pub crouch_released: bool,
}

impl MotionInputs {
    /// Movement-only snapshot, no button activity.
    #[inline]
    pub fn axes(move_x: f32, move_y: f32) -> Self {
        Self {
            move_x,
            move_y,
            ..Self::default()
        }
    }

    /// The axis pair scaled to unit length.
    ///
    /// Malformed input is normalized rather than rejected: any non-zero pair
    /// comes out at length one, a zero pair stays zero.
    #[inline]
    pub fn normalized_axes(&self) -> (f32, f32) {
        let len_sq = self.move_x * self.move_x + self.move_y * self.move_y;
        if len_sq <= APPROX_EPS * APPROX_EPS {
            return (0.0, 0.0);
        }
        let inv = 1.0 / len_sq.sqrt();
        (self.move_x * inv, self.move_y * inv)
    }

    /// True when there is no directional input this tick.
    #[inline]
    pub fn idle(&self) -> bool {
        let (x, y) = self.normalized_axes();
        x == 0.0 && y == 0.0
    }
}
