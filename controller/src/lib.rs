//! First-person character movement over a dynamic rigid-body capsule.
//!
//! The controller never moves the body itself: each fixed tick it consumes a
//! body snapshot, tracked contacts and a ray-cast hook, and emits velocity
//! commands for the host to apply before its next physics step. Stance,
//! jumping, ground detection and the movement solve are separate machines
//! composed by [`CharacterController`].
//!
//! Conventions
//! - Y is up; facing is `orientation * -Z`.
//! - Distances in meters, speeds in m/s, angles in degrees at the API.
//! - Capsules use the cylinder-half convention ([`CapsuleSpec`]).

pub mod contacts;
pub mod controller;
pub mod ground;
pub mod input;
pub mod jump;
pub mod rapier_world;
pub mod settings;
pub mod solver;
pub mod stance;
pub mod types;

pub use contacts::{ContactPoint, ContactTracker, PartnerId};
pub use controller::{CharacterController, Diagnostics, TickOutput};
pub use ground::{GroundState, classify_ground, is_walkable};
pub use input::MotionInputs;
pub use jump::{JumpPhase, JumpStateMachine};
pub use rapier_world::{HostWorld, StaticDef, StaticShape};
pub use settings::ControllerSettings;
pub use solver::MovementSolver;
pub use stance::{Stance, StanceMachine};
pub use types::{BodyCommand, BodyState, CapsuleSpec, Quat, RayHit, RayQuery, Vec3};
