/*!
Per-tick movement solve.

Grounded, the solver magnitude-matches the body's velocity against a
slope-aligned target and submits the delta as one velocity change, with
landing absorption, jump take-off and an idle gravity hold folded into the
same command. Airborne, it first tries to stay glued to nearby walkable
ground (the "nudge") and otherwise applies damped horizontal air control.

Notes
- The solver owns the tick-to-tick flags (`falling`, `grounded_last_frame`,
  `fall_speed`); everything else is recomputed from the inputs each tick.
- Commands are ordered. A landing tick emits its stop/soak command before the
  regular correction.
- All math happens on the host-reported velocity snapshot; the one exception
  is the hard stop, whose effect the rest of the tick must already see.
*/

use crate::ground::{GroundState, is_walkable};
use crate::input::MotionInputs;
use crate::jump::{JumpPhase, JumpStateMachine};
use crate::settings::{AIR_CONTROL_DAMPING, APPROX_EPS, ControllerSettings};
use crate::types::{
    BodyCommand, BodyState, CapsuleSpec, RayQuery, Vec3, normalize_or_zero, planar, planar_speed,
};

/// Movement solver state that survives across ticks.
#[derive(Clone, Copy, Debug, Default)]
pub struct MovementSolver {
    falling: bool,
    fall_speed: f32,
    grounded_last_frame: bool,
}

impl MovementSolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the body is in unsupported flight (set from the first fully
    /// airborne tick, cleared on landing).
    #[inline]
    pub fn is_falling(&self) -> bool {
        self.falling
    }

    /// Vertical velocity recorded on the most recent airborne tick (m/s).
    #[inline]
    pub fn fall_speed(&self) -> f32 {
        self.fall_speed
    }

    /// Previous tick's support conclusion; gates nudge and jump acceptance.
    #[inline]
    pub fn grounded_last_frame(&self) -> bool {
        self.grounded_last_frame
    }

    /// Solve one fixed tick and return the commands to submit, in order.
    #[allow(clippy::too_many_arguments)]
    pub fn step(
        &mut self,
        world: &dyn RayQuery,
        ground: GroundState,
        jump: &mut JumpStateMachine,
        target_speed: f32,
        inputs: &MotionInputs,
        body: &BodyState,
        capsule: CapsuleSpec,
        touching_dynamic: bool,
        settings: &ControllerSettings,
        dt: f32,
    ) -> Vec<BodyCommand> {
        if ground.grounded && jump.phase() != JumpPhase::Falling {
            self.step_grounded(
                ground,
                jump,
                target_speed,
                inputs,
                body,
                touching_dynamic,
                settings,
                dt,
            )
        } else {
            self.step_airborne(world, jump, target_speed, inputs, body, capsule, settings, dt)
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn step_grounded(
        &mut self,
        ground: GroundState,
        jump: &mut JumpStateMachine,
        target_speed: f32,
        inputs: &MotionInputs,
        body: &BodyState,
        touching_dynamic: bool,
        settings: &ControllerSettings,
        dt: f32,
    ) -> Vec<BodyCommand> {
        let mut commands = Vec::new();
        let mut velocity = body.velocity;

        // 1) Landing transition.
        if self.falling {
            self.falling = false;
            if planar_speed(&velocity) <= settings.landing_soak {
                commands.push(BodyCommand::SetVelocity(Vec3::zeros()));
                // The stop takes effect before the correction below, so the
                // rest of the tick solves against the stopped body.
                velocity = Vec3::zeros();
            } else {
                commands.push(BodyCommand::Impulse(
                    -body.forward() * settings.landing_soak,
                ));
            }
        }

        // 2) Slope-aligned target velocity. Gram-Schmidt: renormalize the
        // support normal, project the facing direction onto the support plane.
        // A degenerate normal is treated as flat ground.
        let mut normal = normalize_or_zero(ground.normal);
        if normal == Vec3::zeros() {
            normal = Vec3::y();
        }
        let forward = body.forward();
        let tangent = normalize_or_zero(forward - normal * forward.dot(&normal));

        let (input_x, input_y) = inputs.normalized_axes();
        let target = tangent.cross(&normal) * (input_x * target_speed)
            + tangent * (input_y * target_speed);

        // 3) Magnitude-matched correction toward the target.
        let difference = target.norm() - velocity.norm();
        let mut movement = Vec3::zeros();
        let mut accelerating = false;
        if difference.abs() > APPROX_EPS {
            accelerating = difference > 0.0;
            let acceleration = if accelerating {
                (settings.acceleration_rate * dt).min(difference)
            } else {
                (-settings.deceleration_rate * dt).max(difference)
            };
            movement = (target - velocity) * (acceleration / difference);
        }

        // 4) Jump take-off, or the idle gravity hold.
        if jump.phase() == JumpPhase::Requested {
            movement.y = settings.jump_speed - velocity.y;
            jump.consume_request();
        } else if !touching_dynamic && inputs.idle() && !jump.phase().has_applied_impulse() {
            // Idle on static ground: counter one tick of gravity so the body
            // does not creep down slopes. Dynamic partners are allowed to
            // push the body around, so the hold is suppressed near them.
            movement.y += settings.gravity_mps2 * dt;
        }

        // 5) Input speed cap. External pushes may exceed it; input stops adding.
        if accelerating && planar_speed(&velocity) >= settings.max_input_speed {
            movement.x = 0.0;
            movement.z = 0.0;
        }

        commands.push(BodyCommand::VelocityChange(movement));
        self.grounded_last_frame = true;
        commands
    }

    #[allow(clippy::too_many_arguments)]
    fn step_airborne(
        &mut self,
        world: &dyn RayQuery,
        jump: &mut JumpStateMachine,
        target_speed: f32,
        inputs: &MotionInputs,
        body: &BodyState,
        capsule: CapsuleSpec,
        settings: &ControllerSettings,
        dt: f32,
    ) -> Vec<BodyCommand> {
        let velocity = body.velocity;

        // 1) Nudge: support flickered off this tick, but walkable ground may
        // still be within reach below. Steering back onto it beats going
        // ballistic over every slope crest and stair lip.
        if self.grounded_last_frame && jump.phase() != JumpPhase::Falling && !self.falling {
            let reach = capsule.total_half_height() + settings.nudge_extra + velocity.norm() * dt;
            if let Some(hit) = world.cast_ray(body.position, -Vec3::y(), reach) {
                if is_walkable(&hit.normal, settings.max_slope_cos()) {
                    // A jump pressed on a nudge tick must not be lost.
                    if jump.phase() == JumpPhase::Requested {
                        jump.consume_request();
                        return vec![BodyCommand::VelocityChange(Vec3::new(
                            0.0,
                            settings.jump_speed,
                            0.0,
                        ))];
                    }

                    // The vertical ray overstates the separation on a slope;
                    // ask along the surface normal for the exact distance.
                    let origin = capsule.lower_sphere_center(body.position);
                    if let Some(snap) = world.cast_ray(origin, -hit.normal, hit.distance) {
                        return vec![BodyCommand::VelocityChange(snap.normal * -snap.distance)];
                    }

                    // Walkable ground within reach but no usable second hit:
                    // stay passive this tick, air control stays off.
                    return Vec::new();
                }
            }
        }

        // 2) Fully airborne.
        self.falling = true;
        self.fall_speed = velocity.y;
        let mut commands = Vec::new();

        if !inputs.idle() {
            // Air control: body-local input rotated into the world, horizontal only.
            let (input_x, input_y) = inputs.normalized_axes();
            let local = Vec3::new(input_x, 0.0, -input_y) * (settings.aerial_acceleration * dt);
            let mut delta = body.orientation * local;
            delta.y = 0.0;

            // Never push the planar speed past the stance target. The delta
            // is rescaled to the remaining room; the resultant is untouched,
            // so momentum beyond the cap is kept, just not grown.
            let planar_vel = planar(&velocity);
            let combined = planar_vel + planar(&delta);
            if combined.norm() > target_speed {
                let delta_len = planar(&delta).norm();
                if delta_len > APPROX_EPS {
                    let room = (target_speed - planar_vel.norm()).max(0.0);
                    delta *= room / delta_len;
                }
            }

            delta *= AIR_CONTROL_DAMPING;
            commands.push(BodyCommand::VelocityChange(Vec3::new(
                delta.x, 0.0, delta.z,
            )));
        }

        self.grounded_last_frame = false;
        commands
    }
}
