/*!
Controller shell: owns the per-character state machines and runs the tick.

The host drives this from its physics loop. Each fixed tick it snapshots the
rigid body and the input device, calls [`CharacterController::fixed_tick`],
applies the returned commands to the body, steps physics, and feeds the
resulting contact events back in before the next tick.

Tick order is load-bearing:

1. button resolution (stance) and the jump press latch,
2. ground classification over the tracked contacts,
3. stance target-speed resolution,
4. jump phase and cooldown maintenance,
5. the movement solve.

The jump press in step 1 is judged against the previous tick's support
conclusion: the press belongs to the state the player last saw.
*/

use std::fmt;

use log::{debug, trace};

use crate::contacts::{ContactPoint, ContactTracker, PartnerId};
use crate::ground::{GroundState, classify_ground};
use crate::input::MotionInputs;
use crate::jump::{JumpPhase, JumpStateMachine};
use crate::settings::ControllerSettings;
use crate::solver::MovementSolver;
use crate::stance::{Stance, StanceMachine};
use crate::types::{BodyCommand, BodyState, CapsuleSpec, RayQuery, planar_speed};

/// Everything one fixed tick resolved.
#[derive(Clone, Debug)]
pub struct TickOutput {
    /// Ordered commands for the host to apply before its next physics step.
    pub commands: Vec<BodyCommand>,
    /// This tick's support conclusion.
    pub ground: GroundState,
}

/// Read-only state snapshot for HUD and log overlays.
#[derive(Clone, Copy, Debug)]
pub struct Diagnostics {
    pub grounded: bool,
    pub stance: Stance,
    pub target_speed: f32,
    pub jump_phase: JumpPhase,
    pub falling: bool,
    pub touching_dynamic: bool,
}

impl fmt::Display for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "stance={:?} target={:.2}m/s grounded={} falling={} jump={:?} dynamic_contact={}",
            self.stance,
            self.target_speed,
            self.grounded,
            self.falling,
            self.jump_phase,
            self.touching_dynamic,
        )
    }
}

/// First-person movement controller over a dynamic capsule rigid body.
///
/// The controller never touches the physics engine itself. It consumes body
/// snapshots, contact events and a ray-cast hook, and emits [`BodyCommand`]s;
/// the host owns the body and decides how to apply them (see
/// `rapier_world::HostWorld` for the bundled rapier host).
pub struct CharacterController {
    settings: ControllerSettings,
    capsule: CapsuleSpec,
    contacts: ContactTracker,
    stance: StanceMachine,
    jump: JumpStateMachine,
    solver: MovementSolver,
    ground: GroundState,
}

impl CharacterController {
    pub fn new(settings: ControllerSettings, capsule: CapsuleSpec) -> Self {
        Self {
            settings,
            capsule,
            contacts: ContactTracker::new(),
            stance: StanceMachine::new(),
            jump: JumpStateMachine::new(),
            solver: MovementSolver::new(),
            ground: GroundState::airborne(),
        }
    }

    /// A contact pair with `partner` began. Re-arms a completed jump cycle.
    pub fn on_contact_begin(
        &mut self,
        partner: PartnerId,
        is_dynamic: bool,
        points: Vec<ContactPoint>,
    ) {
        self.contacts.on_contact_begin(partner, is_dynamic, points);
        self.jump.on_contact_begin();
    }

    /// The contact pair with `partner` persisted; `points` is its fresh manifold.
    pub fn on_contact_persist(&mut self, partner: PartnerId, points: Vec<ContactPoint>) {
        self.contacts.on_contact_persist(partner, points);
    }

    /// The contact pair with `partner` ended.
    pub fn on_contact_end(&mut self, partner: PartnerId) {
        self.contacts.on_contact_end(partner);
    }

    /// Run one fixed tick.
    pub fn fixed_tick(
        &mut self,
        inputs: &MotionInputs,
        body: &BodyState,
        world: &dyn RayQuery,
        dt: f32,
    ) -> TickOutput {
        let planar = planar_speed(&body.velocity);
        trace!("tick: planar speed {planar:.3} m/s");

        let stance_before = self.stance.stance();
        let jump_before = self.jump.phase();
        let was_falling = self.solver.is_falling();
        let was_grounded = self.ground.grounded;

        // 1) Buttons.
        self.stance.apply_buttons(inputs, &self.settings);
        if inputs.jump_pressed {
            self.jump.note_press(self.solver.grounded_last_frame());
        }

        // 2) Ground classification.
        self.ground = classify_ground(
            world,
            &self.contacts,
            body.position,
            self.capsule,
            self.settings.max_slope_cos(),
        );

        // 3) Stance target speed.
        self.stance.update_target_speed(planar, dt, &self.settings);

        // 4) Jump maintenance.
        self.jump
            .tick(self.ground.grounded, dt, self.settings.jump_cooldown_time);

        // 5) Movement solve.
        let commands = self.solver.step(
            world,
            self.ground,
            &mut self.jump,
            self.stance.target_speed(),
            inputs,
            body,
            self.capsule,
            self.contacts.touching_dynamic(),
            &self.settings,
            dt,
        );

        if self.stance.stance() != stance_before {
            debug!(
                "stance {stance_before:?} -> {:?} (target {:.2} m/s)",
                self.stance.stance(),
                self.stance.target_speed(),
            );
        }
        if self.jump.phase() != jump_before {
            debug!("jump {jump_before:?} -> {:?}", self.jump.phase());
        }
        if self.ground.grounded != was_grounded {
            debug!(
                "support {}",
                if self.ground.grounded { "gained" } else { "lost" }
            );
        }
        if was_falling && !self.solver.is_falling() {
            debug!("landed at {:.2} m/s vertical", self.solver.fall_speed());
        }

        TickOutput {
            commands,
            ground: self.ground,
        }
    }

    #[inline]
    pub fn settings(&self) -> &ControllerSettings {
        &self.settings
    }

    #[inline]
    pub fn capsule(&self) -> CapsuleSpec {
        self.capsule
    }

    /// Last tick's support conclusion.
    #[inline]
    pub fn is_grounded(&self) -> bool {
        self.ground.grounded
    }

    /// Last tick's support normal (zero while airborne).
    #[inline]
    pub fn ground_normal(&self) -> crate::types::Vec3 {
        self.ground.normal
    }

    #[inline]
    pub fn is_falling(&self) -> bool {
        self.solver.is_falling()
    }

    /// Vertical velocity recorded on the most recent airborne tick (m/s).
    #[inline]
    pub fn fall_speed(&self) -> f32 {
        self.solver.fall_speed()
    }

    #[inline]
    pub fn touching_dynamic(&self) -> bool {
        self.contacts.touching_dynamic()
    }

    #[inline]
    pub fn stance(&self) -> Stance {
        self.stance.stance()
    }

    /// Target speed the solver is currently driving toward (m/s).
    #[inline]
    pub fn target_speed(&self) -> f32 {
        self.stance.target_speed()
    }

    #[inline]
    pub fn jump_phase(&self) -> JumpPhase {
        self.jump.phase()
    }

    pub fn diagnostics(&self) -> Diagnostics {
        Diagnostics {
            grounded: self.ground.grounded,
            stance: self.stance.stance(),
            target_speed: self.stance.target_speed(),
            jump_phase: self.jump.phase(),
            falling: self.solver.is_falling(),
            touching_dynamic: self.contacts.touching_dynamic(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Quat, RayHit, Vec3};

    const DT: f32 = 0.02;

    /// A flat floor under everything: any ray hits it one meter out.
    struct AlwaysFloor;

    impl RayQuery for AlwaysFloor {
        fn cast_ray(&self, origin: Vec3, dir: Vec3, _max_dist: f32) -> Option<RayHit> {
            Some(RayHit {
                point: origin + dir,
                normal: Vec3::y(),
                distance: 1.0,
            })
        }
    }

    fn controller() -> CharacterController {
        CharacterController::new(
            ControllerSettings::default(),
            CapsuleSpec {
                radius: 0.5,
                half_height: 0.5,
            },
        )
    }

    fn standing_body(velocity: Vec3) -> BodyState {
        BodyState::new(Vec3::new(0.0, 1.0, 0.0), Quat::identity(), velocity)
    }

    /// One manifold point at the capsule's lowest point.
    fn floor_points() -> Vec<ContactPoint> {
        vec![ContactPoint {
            point: Vec3::new(0.0, 0.0, 0.0),
            normal: Vec3::y(),
        }]
    }

    fn jump_inputs() -> MotionInputs {
        MotionInputs {
            jump_pressed: true,
            ..MotionInputs::default()
        }
    }

    #[test]
    fn jump_press_without_prior_support_is_rejected() {
        let mut ctl = controller();
        let out = ctl.fixed_tick(&jump_inputs(), &standing_body(Vec3::zeros()), &AlwaysFloor, DT);

        assert_eq!(ctl.jump_phase(), JumpPhase::Ready);
        assert!(!out.ground.grounded);
        assert!(out.commands.is_empty());
    }

    #[test]
    fn walk_jump_land_cycle() {
        let mut ctl = controller();
        let idle = MotionInputs::default();

        // Settled on the floor.
        ctl.on_contact_begin(1, false, floor_points());
        let out = ctl.fixed_tick(&idle, &standing_body(Vec3::zeros()), &AlwaysFloor, DT);
        assert!(out.ground.grounded);
        assert!(ctl.is_grounded());

        // Jump press accepted against last tick's support, consumed same tick.
        let out = ctl.fixed_tick(&jump_inputs(), &standing_body(Vec3::zeros()), &AlwaysFloor, DT);
        assert_eq!(ctl.jump_phase(), JumpPhase::Rising);
        assert_eq!(
            out.commands,
            vec![BodyCommand::VelocityChange(Vec3::new(0.0, 4.0, 0.0))]
        );

        // Contact lost, body on the way up: phase falls, no commands while idle.
        ctl.on_contact_end(1);
        let out = ctl.fixed_tick(&idle, &standing_body(Vec3::new(0.0, 3.9, 0.0)), &AlwaysFloor, DT);
        assert_eq!(ctl.jump_phase(), JumpPhase::Falling);
        assert!(ctl.is_falling());
        assert!(out.commands.is_empty());

        // Touch-down: the begin event re-arms the jump, the grounded tick
        // absorbs the slow landing with a hard stop.
        ctl.on_contact_begin(1, false, floor_points());
        let out = ctl.fixed_tick(&idle, &standing_body(Vec3::new(0.0, -3.0, 0.0)), &AlwaysFloor, DT);
        assert_eq!(ctl.jump_phase(), JumpPhase::Ready);
        assert!(!ctl.is_falling());
        assert_eq!(out.commands[0], BodyCommand::SetVelocity(Vec3::zeros()));

        // Cooldown still running: the immediate re-press is ignored.
        let out = ctl.fixed_tick(&jump_inputs(), &standing_body(Vec3::zeros()), &AlwaysFloor, DT);
        assert_eq!(ctl.jump_phase(), JumpPhase::Ready);
        assert!(!out.commands.is_empty());
    }

    #[test]
    fn same_tick_crouch_press_reaches_the_solve() {
        let mut ctl = controller();
        ctl.on_contact_begin(1, false, floor_points());
        ctl.fixed_tick(
            &MotionInputs::default(),
            &standing_body(Vec3::zeros()),
            &AlwaysFloor,
            DT,
        );

        let crouch = MotionInputs {
            crouch_pressed: true,
            ..MotionInputs::axes(1.0, 0.0)
        };
        ctl.fixed_tick(&crouch, &standing_body(Vec3::zeros()), &AlwaysFloor, DT);

        assert_eq!(ctl.stance(), Stance::Crouch);
        assert_eq!(ctl.target_speed(), 2.5);
    }

    #[test]
    fn diagnostics_render_as_one_line() {
        let line = controller().diagnostics().to_string();
        assert!(line.contains("stance=Walk"));
        assert!(line.contains("grounded=false"));
        assert!(line.contains("jump=Ready"));
        assert!(!line.contains('\n'));
    }
}
