/*!
Rapier-based reference host for the movement controller.

Builds an in-memory Rapier scene from a set of static collider definitions
plus one dynamic character capsule, steps the physics pipeline, and adapts
between the controller's command/event model and Rapier's rigid-body API.

Design goals
- Deterministic: given the same inputs (sorted by `id`), build identical
  in-memory sets; contact diffs iterate in partner-id order.
- The character body carries the movement-friendly material: locked
  rotations, zero friction and restitution with `Min` combine rules, so the
  capsule neither trips over edges by spinning nor sticks to walls, and
  surface materials cannot reintroduce either.
- Immutable statics: the world geometry does not move after construction.
*/

// Re-export Rapier so downstream hosts can use Rapier types without needing
// to depend on `rapier3d` directly.
pub use rapier3d;

use std::collections::{BTreeMap, BTreeSet};

use rapier3d::prelude::*;

// Rapier math aliases (0.31): keep this explicit so we don't accidentally
// rely on nalgebra names that aren't in scope.
use rapier3d::na::Translation3;

use crate::contacts::{ContactPoint, PartnerId};
use crate::controller::CharacterController;
use crate::types::{BodyCommand, BodyState, CapsuleSpec, Quat, RayHit, RayQuery, Vec3};

/// Definition of one immutable world collider.
///
/// Conventions
/// - Units are meters.
/// - Rotation is a unit quaternion.
/// - For planes, the normal derives from the pose: `normal = rotation * +Y`,
///   and `dist = dot(normal, translation) + offset_along_normal`.
#[derive(Clone, Debug)]
pub struct StaticDef {
    /// Stable unique identifier used to ensure deterministic insertion order.
    pub id: u32,
    /// World-space translation.
    pub translation: Vec3,
    /// World-space rotation.
    pub rotation: Quat,
    /// Collider shape parameters.
    pub shape: StaticShape,
}

/// Supported static collider shapes.
#[derive(Clone, Debug)]
pub enum StaticShape {
    /// Infinite half-space. The normal is derived from the pose as
    /// `rotation * +Y`; any "plane size" is a rendering concern, not collision.
    Plane {
        /// Offset along the plane normal (meters).
        offset_along_normal: f32,
    },

    /// Oriented cuboid with given half-extents (meters).
    Cuboid { half_extents: Vec3 },
}

impl StaticDef {
    /// Horizontal floor plane through the world origin.
    pub fn floor(id: u32) -> Self {
        Self {
            id,
            translation: Vec3::zeros(),
            rotation: Quat::identity(),
            shape: StaticShape::Plane {
                offset_along_normal: 0.0,
            },
        }
    }

    /// Axis-aligned box centered at `center`.
    pub fn cuboid(id: u32, center: Vec3, half_extents: Vec3) -> Self {
        Self {
            id,
            translation: center,
            rotation: Quat::identity(),
            shape: StaticShape::Cuboid { half_extents },
        }
    }

    /// Oriented box centered at `center` (ramps, tilted platforms).
    pub fn rotated_cuboid(id: u32, center: Vec3, rotation: Quat, half_extents: Vec3) -> Self {
        Self {
            id,
            translation: center,
            rotation,
            shape: StaticShape::Cuboid { half_extents },
        }
    }
}

/// Pack a collider handle into the controller's stable partner id.
fn partner_id(handle: ColliderHandle) -> PartnerId {
    let (index, generation) = handle.into_raw_parts();
    (index as u64) | ((generation as u64) << 32)
}

/// In-memory Rapier scene: static world geometry plus the character capsule.
///
/// The controller itself stays outside; the host loop each tick is
/// `body_state` -> `fixed_tick` -> [`HostWorld::apply`] -> [`HostWorld::step`]
/// (which feeds the resulting contact events back into the controller).
pub struct HostWorld {
    gravity: Vector<f32>,
    integration_parameters: IntegrationParameters,
    pipeline: PhysicsPipeline,
    islands: IslandManager,
    broad_phase: BroadPhaseBvh,
    narrow_phase: NarrowPhase,
    bodies: RigidBodySet,
    colliders: ColliderSet,
    impulse_joints: ImpulseJointSet,
    multibody_joints: MultibodyJointSet,
    ccd_solver: CCDSolver,
    character_body: RigidBodyHandle,
    character_collider: ColliderHandle,
    /// Partners touched on the previous tick, for the begin/persist/end diff.
    previous_contacts: BTreeSet<PartnerId>,
}

impl HostWorld {
    /// Build the static scene and spawn the character capsule at `spawn`.
    ///
    /// Determinism
    /// - The static defs are sorted by `id` before insertion.
    /// - Any NaN/invalid values should be filtered by the caller.
    pub fn build(
        mut statics: Vec<StaticDef>,
        capsule: CapsuleSpec,
        spawn: Vec3,
        gravity_mps2: f32,
    ) -> Self {
        statics.sort_by_key(|d| d.id);

        let mut bodies = RigidBodySet::new();
        let mut colliders = ColliderSet::new();

        // Insert each static as a fixed rigid-body + attached collider.
        for def in statics.into_iter() {
            let pose = Isometry::from_parts(Translation3::from(def.translation), def.rotation);
            let rb = RigidBodyBuilder::fixed().pose(pose).build();
            let rb_handle = bodies.insert(rb);
            colliders.insert_with_parent(collider_from_def(&def), rb_handle, &mut bodies);
        }

        let body = RigidBodyBuilder::dynamic()
            .translation(spawn)
            .lock_rotations()
            .build();
        let character_body = bodies.insert(body);

        let collider = ColliderBuilder::capsule_y(capsule.half_height, capsule.radius)
            .friction(0.0)
            .friction_combine_rule(CoefficientCombineRule::Min)
            .restitution(0.0)
            .restitution_combine_rule(CoefficientCombineRule::Min)
            .build();
        let character_collider =
            colliders.insert_with_parent(collider, character_body, &mut bodies);

        Self {
            gravity: Vector::new(0.0, -gravity_mps2, 0.0),
            integration_parameters: IntegrationParameters::default(),
            pipeline: PhysicsPipeline::new(),
            islands: IslandManager::new(),
            broad_phase: BroadPhaseBvh::new(),
            narrow_phase: NarrowPhase::new(),
            bodies,
            colliders,
            impulse_joints: ImpulseJointSet::new(),
            multibody_joints: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
            character_body,
            character_collider,
            previous_contacts: BTreeSet::new(),
        }
    }

    /// Apply solver commands to the character body, in order.
    pub fn apply(&mut self, commands: &[BodyCommand]) {
        let Some(body) = self.bodies.get_mut(self.character_body) else {
            return;
        };
        for command in commands {
            match *command {
                BodyCommand::VelocityChange(delta) => {
                    let next = body.linvel() + delta;
                    body.set_linvel(next, true);
                }
                BodyCommand::Impulse(impulse) => body.apply_impulse(impulse, true),
                BodyCommand::SetVelocity(velocity) => body.set_linvel(velocity, true),
            }
        }
    }

    /// Step the simulation by `dt` and feed the resulting contact events into
    /// the controller.
    pub fn step(&mut self, dt: f32, controller: &mut CharacterController) {
        self.integration_parameters.dt = dt;
        // No hooks; contact events come from the pair diff below instead.
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
            &(),
            &(),
        );
        self.feed_contacts(controller);
    }

    /// Diff the narrow phase against the previous tick and raise the
    /// controller's begin/persist/end events with world-space points.
    fn feed_contacts(&mut self, controller: &mut CharacterController) {
        let Some(char_collider) = self.colliders.get(self.character_collider) else {
            return;
        };
        let char_pose = *char_collider.position();

        let mut current: BTreeMap<PartnerId, (bool, Vec<ContactPoint>)> = BTreeMap::new();
        for pair in self.narrow_phase.contact_pairs_with(self.character_collider) {
            if !pair.has_any_active_contact {
                continue;
            }
            let (partner_handle, flipped) = if pair.collider1 == self.character_collider {
                (pair.collider2, false)
            } else {
                (pair.collider1, true)
            };
            let Some(partner) = self.colliders.get(partner_handle) else {
                continue;
            };
            let is_dynamic = partner
                .parent()
                .and_then(|h| self.bodies.get(h))
                .is_some_and(|b| b.is_dynamic());

            let mut points = Vec::new();
            for manifold in &pair.manifolds {
                // Manifold normals point out of the first collider; the
                // controller wants them pointing at the character. The ground
                // classifier re-validates every point with rays, so
                // speculative manifold points are fine to pass along.
                let normal = if flipped {
                    manifold.data.normal
                } else {
                    -manifold.data.normal
                };
                for contact in &manifold.points {
                    let local = if flipped {
                        contact.local_p2
                    } else {
                        contact.local_p1
                    };
                    points.push(ContactPoint {
                        point: (char_pose * local).coords,
                        normal,
                    });
                }
            }
            current.insert(partner_id(partner_handle), (is_dynamic, points));
        }

        let current_ids: BTreeSet<PartnerId> = current.keys().copied().collect();
        for (partner, (is_dynamic, points)) in current {
            if self.previous_contacts.contains(&partner) {
                controller.on_contact_persist(partner, points);
            } else {
                controller.on_contact_begin(partner, is_dynamic, points);
            }
        }
        for &partner in &self.previous_contacts {
            if !current_ids.contains(&partner) {
                controller.on_contact_end(partner);
            }
        }
        self.previous_contacts = current_ids;
    }

    /// Snapshot of the character body for `fixed_tick`.
    pub fn body_state(&self) -> BodyState {
        match self.bodies.get(self.character_body) {
            Some(body) => BodyState::new(*body.translation(), *body.rotation(), *body.linvel()),
            None => BodyState::new(Vec3::zeros(), Quat::identity(), Vec3::zeros()),
        }
    }

    /// Point the character's facing. Look control lives outside the
    /// controller; hosts write the orientation directly (rotations are
    /// locked, so physics never changes it).
    pub fn set_orientation(&mut self, orientation: Quat) {
        if let Some(body) = self.bodies.get_mut(self.character_body) {
            body.set_rotation(orientation, true);
        }
    }
}

impl RayQuery for HostWorld {
    fn cast_ray(&self, origin: Vec3, dir: Vec3, max_dist: f32) -> Option<RayHit> {
        // The controller's rays start on or inside the capsule; without the
        // exclusion every cast would stop at distance zero on the character.
        let filter = QueryFilter::default().exclude_rigid_body(self.character_body);
        let pipeline = self.broad_phase.as_query_pipeline(
            self.narrow_phase.query_dispatcher(),
            &self.bodies,
            &self.colliders,
            filter,
        );
        let ray = Ray::new(origin.into(), dir);
        let (_, hit) = pipeline.cast_ray_and_get_normal(&ray, max_dist, true)?;
        Some(RayHit {
            point: ray.point_at(hit.time_of_impact).coords,
            normal: hit.normal,
            distance: hit.time_of_impact,
        })
    }
}

/// Build a Rapier collider from a `StaticDef`.
///
/// The pose lives on the parent rigid-body, so the collider is created with
/// an identity local transform (planes are the exception; see below).
fn collider_from_def(def: &StaticDef) -> Collider {
    match &def.shape {
        StaticShape::Plane {
            offset_along_normal,
        } => {
            // Derive the world-space plane normal from the pose rotation,
            // then the plane distance: n . x = dist for any point x on the
            // plane, so with pose translation t, dist = n . t + offset.
            let n = def.rotation * Vector::y();
            let dist = n.dot(&def.translation) + *offset_along_normal;
            let unit_n = UnitVector::new_normalize(n);

            let halfspace = HalfSpace::new(unit_n);
            ColliderBuilder::new(SharedShape::new(halfspace))
                .translation(unit_n.into_inner() * dist)
                .build()
        }

        StaticShape::Cuboid { half_extents } => {
            ColliderBuilder::cuboid(half_extents.x, half_extents.y, half_extents.z).build()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::MotionInputs;
    use crate::jump::JumpPhase;
    use crate::settings::ControllerSettings;
    use crate::types::planar_speed;

    const DT: f32 = 1.0 / 60.0;

    fn capsule() -> CapsuleSpec {
        CapsuleSpec {
            radius: 0.5,
            half_height: 0.5,
        }
    }

    fn controller() -> CharacterController {
        CharacterController::new(ControllerSettings::default(), capsule())
    }

    fn run_ticks(
        world: &mut HostWorld,
        ctl: &mut CharacterController,
        inputs: &MotionInputs,
        ticks: usize,
    ) {
        for _ in 0..ticks {
            let body = world.body_state();
            let out = ctl.fixed_tick(inputs, &body, world, DT);
            world.apply(&out.commands);
            world.step(DT, ctl);
        }
    }

    #[test]
    fn capsule_drops_settles_and_walks() {
        let mut world = HostWorld::build(
            vec![StaticDef::floor(1)],
            capsule(),
            Vec3::new(0.0, 3.0, 0.0),
            9.81,
        );
        let mut ctl = controller();

        run_ticks(&mut world, &mut ctl, &MotionInputs::default(), 240);
        assert!(ctl.is_grounded());
        assert!(!ctl.is_falling());
        let settled = world.body_state();
        // Resting height: total capsule half-height above the floor plane.
        assert!((settled.position.y - 1.0).abs() < 0.1);
        assert!(planar_speed(&settled.velocity) < 0.1);

        // Identity orientation faces -Z; forward input walks that way.
        run_ticks(&mut world, &mut ctl, &MotionInputs::axes(0.0, 1.0), 120);
        let moved = world.body_state();
        assert!(ctl.is_grounded());
        assert!(moved.position.z < settled.position.z - 2.0);
        assert!(planar_speed(&moved.velocity) > 4.0);
    }

    #[test]
    fn jump_arc_rises_and_relands() {
        let mut world = HostWorld::build(
            vec![StaticDef::floor(1)],
            capsule(),
            Vec3::new(0.0, 1.5, 0.0),
            9.81,
        );
        let mut ctl = controller();

        run_ticks(&mut world, &mut ctl, &MotionInputs::default(), 120);
        assert!(ctl.is_grounded());
        let rest_y = world.body_state().position.y;

        let press = MotionInputs {
            jump_pressed: true,
            ..MotionInputs::default()
        };
        let body = world.body_state();
        let out = ctl.fixed_tick(&press, &body, &world, DT);
        world.apply(&out.commands);
        world.step(DT, &mut ctl);
        assert_eq!(ctl.jump_phase(), JumpPhase::Rising);

        let mut peak = rest_y;
        let mut landed = false;
        for _ in 0..180 {
            run_ticks(&mut world, &mut ctl, &MotionInputs::default(), 1);
            peak = peak.max(world.body_state().position.y);
            if ctl.is_grounded() && !ctl.is_falling() {
                landed = true;
                break;
            }
        }

        // 4 m/s take-off peaks around 0.8 m up; allow for the grounded tick
        // right after take-off shaving some of it.
        assert!(peak > rest_y + 0.4, "peak {peak} rest {rest_y}");
        assert!(landed);
        assert_eq!(ctl.jump_phase(), JumpPhase::Ready);
    }

    #[test]
    fn walks_up_a_thirty_degree_ramp() {
        // Ramp surface rising toward -Z, well within the 45 degree limit.
        let ramp = StaticDef::rotated_cuboid(
            2,
            Vec3::new(0.0, 0.0, 0.0),
            Quat::from_axis_angle(&Vec3::x_axis(), 30.0_f32.to_radians()),
            Vec3::new(2.0, 0.1, 4.0),
        );
        let mut world = HostWorld::build(
            vec![StaticDef::floor(1), ramp],
            capsule(),
            Vec3::new(0.0, 2.0, 0.0),
            9.81,
        );
        let mut ctl = controller();

        run_ticks(&mut world, &mut ctl, &MotionInputs::default(), 240);
        assert!(ctl.is_grounded());
        // Support normal matches the ramp tilt.
        assert!((ctl.ground_normal().y - 0.866).abs() < 0.02);
        let settled = world.body_state();

        run_ticks(&mut world, &mut ctl, &MotionInputs::axes(0.0, 1.0), 45);
        let climbed = world.body_state();
        assert!(ctl.is_grounded());
        assert!(climbed.position.z < settled.position.z - 0.5);
        assert!(climbed.position.y > settled.position.y + 0.3);
    }

    #[test]
    fn idle_capsule_parks_on_the_ramp() {
        let ramp = StaticDef::rotated_cuboid(
            2,
            Vec3::new(0.0, 0.0, 0.0),
            Quat::from_axis_angle(&Vec3::x_axis(), 30.0_f32.to_radians()),
            Vec3::new(2.0, 0.1, 4.0),
        );
        let mut world = HostWorld::build(
            vec![StaticDef::floor(1), ramp],
            capsule(),
            Vec3::new(0.0, 2.0, 0.0),
            9.81,
        );
        let mut ctl = controller();

        run_ticks(&mut world, &mut ctl, &MotionInputs::default(), 240);
        assert!(ctl.is_grounded());
        let parked = world.body_state();

        // Frictionless material, yet the idle gravity hold keeps it parked.
        run_ticks(&mut world, &mut ctl, &MotionInputs::default(), 120);
        let later = world.body_state();
        assert!((later.position.z - parked.position.z).abs() < 0.05);
        assert!((later.position.y - parked.position.y).abs() < 0.05);
    }
}
