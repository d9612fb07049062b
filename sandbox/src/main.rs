//! Headless movement sandbox.
//!
//! Drives the controller through a scripted 60 Hz timeline against a small
//! static scene and logs what happens. Run with `RUST_LOG=debug` to see the
//! stance and jump transitions, `RUST_LOG=trace` for per-tick speeds.

use controller::types::planar_speed;
use controller::{
    CapsuleSpec, CharacterController, ControllerSettings, HostWorld, MotionInputs, Quat,
    StaticDef, Vec3,
};
use log::info;

const DT: f32 = 1.0 / 60.0;

/// Buttons held during a phase; edges are derived tick-to-tick.
#[derive(Clone, Copy, Default)]
struct Held {
    move_x: f32,
    move_y: f32,
    jump: bool,
    sprint: bool,
    crouch: bool,
}

/// Converts held-button state into the controller's per-tick edge snapshot.
struct InputScript {
    previous: Held,
}

impl InputScript {
    fn new() -> Self {
        Self {
            previous: Held::default(),
        }
    }

    fn snapshot(&mut self, current: Held) -> MotionInputs {
        let inputs = MotionInputs {
            move_x: current.move_x,
            move_y: current.move_y,
            jump_pressed: current.jump && !self.previous.jump,
            sprint_pressed: current.sprint && !self.previous.sprint,
            sprint_released: !current.sprint && self.previous.sprint,
            crouch_pressed: current.crouch && !self.previous.crouch,
            crouch_released: !current.crouch && self.previous.crouch,
        };
        self.previous = current;
        inputs
    }
}

struct Phase {
    label: &'static str,
    ticks: u32,
    held: Held,
    /// Facing set at phase start, if the script turns here.
    face: Option<Quat>,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let capsule = CapsuleSpec {
        radius: 0.5,
        half_height: 0.5,
    };
    let settings = ControllerSettings::default();

    // Floor plane, a raised landing platform along the run line, and a
    // 30 degree ramp (rising toward +X) next to where the run ends.
    let statics = vec![
        StaticDef::floor(1),
        StaticDef::cuboid(
            2,
            Vec3::new(0.0, 0.25, -20.0),
            Vec3::new(3.0, 0.25, 3.0),
        ),
        StaticDef::rotated_cuboid(
            3,
            Vec3::new(6.0, 0.0, -25.0),
            Quat::from_axis_angle(&Vec3::z_axis(), 30.0_f32.to_radians()),
            Vec3::new(4.0, 0.1, 4.0),
        ),
    ];

    let mut world = HostWorld::build(
        statics,
        capsule,
        Vec3::new(0.0, 2.0, 0.0),
        settings.gravity_mps2,
    );
    let mut ctl = CharacterController::new(settings, capsule);
    let mut script = InputScript::new();

    let idle = Held::default();
    let forward = Held {
        move_y: 1.0,
        ..idle
    };
    let sprint = Held {
        sprint: true,
        ..forward
    };
    let sprint_jump = Held {
        jump: true,
        ..sprint
    };
    let slide = Held {
        crouch: true,
        ..sprint
    };
    // Identity faces -Z; the ramp leg turns to face +X.
    let toward_ramp = Quat::from_axis_angle(&Vec3::y_axis(), -std::f32::consts::FRAC_PI_2);

    let phases = [
        Phase {
            label: "settle on the floor",
            ticks: 60,
            held: idle,
            face: None,
        },
        Phase {
            label: "walk forward",
            ticks: 90,
            held: forward,
            face: None,
        },
        Phase {
            label: "sprint toward the platform",
            ticks: 60,
            held: sprint,
            face: None,
        },
        Phase {
            label: "jump onto the platform",
            ticks: 45,
            held: sprint_jump,
            face: None,
        },
        Phase {
            label: "crouch into a slide",
            ticks: 90,
            held: slide,
            face: None,
        },
        Phase {
            label: "stop",
            ticks: 60,
            held: idle,
            face: None,
        },
        Phase {
            label: "climb the ramp",
            ticks: 90,
            held: forward,
            face: Some(toward_ramp),
        },
        Phase {
            label: "park on the slope",
            ticks: 90,
            held: idle,
            face: None,
        },
    ];

    let mut tick = 0u32;
    for phase in &phases {
        info!("--- {} ({} ticks)", phase.label, phase.ticks);
        if let Some(orientation) = phase.face {
            world.set_orientation(orientation);
        }
        for _ in 0..phase.ticks {
            let inputs = script.snapshot(phase.held);
            let body = world.body_state();
            let out = ctl.fixed_tick(&inputs, &body, &world, DT);
            world.apply(&out.commands);
            world.step(DT, &mut ctl);

            tick += 1;
            if tick % 30 == 0 {
                let body = world.body_state();
                info!(
                    "t={:>6.2}s pos=({:+6.2}, {:+5.2}, {:+6.2}) planar={:4.2} m/s | {}",
                    tick as f32 * DT,
                    body.position.x,
                    body.position.y,
                    body.position.z,
                    planar_speed(&body.velocity),
                    ctl.diagnostics(),
                );
            }
        }
    }

    let end = world.body_state();
    info!(
        "done after {tick} ticks at ({:+.2}, {:+.2}, {:+.2})",
        end.position.x, end.position.y, end.position.z
    );
}
