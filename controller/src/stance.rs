/*!
Stance resolution: walk / sprint / crouch / slide and the per-tick target speed.

Sprint and crouch buttons each support hold and toggle activation, chosen in
settings. Slide is entered on the crouch activation edge while sprint is
already active, holds until either crouch is released (immediate exit) or its
decaying target speed reaches the slide threshold (revert to crouch), and owns
the target speed while active.
*/

use crate::input::MotionInputs;
use crate::settings::ControllerSettings;
use crate::types::lerp;

/// Resolved stance for one tick, in priority order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Stance {
    Walk,
    Sprint,
    Crouch,
    Slide,
}

#[derive(Clone, Copy, Debug, Default)]
pub struct StanceMachine {
    sprinting: bool,
    crouching: bool,
    sliding: bool,
    /// Decaying slide target; `None` outside a slide (re-seeded on entry).
    slide_speed: Option<f32>,
    target_speed: f32,
}

impl StanceMachine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve sprint/crouch button edges and the slide triggers.
    ///
    /// Called once per tick, before the fixed-tick pipeline, with the same
    /// snapshot the solver will see.
    pub fn apply_buttons(&mut self, inputs: &MotionInputs, settings: &ControllerSettings) {
        if settings.toggle_sprint {
            if inputs.sprint_pressed {
                self.sprinting = !self.sprinting;
            }
        } else if inputs.sprint_pressed {
            self.sprinting = true;
        } else if inputs.sprint_released {
            self.sprinting = false;
        }

        let was_crouching = self.crouching;
        if settings.toggle_crouch {
            if inputs.crouch_pressed {
                self.crouching = !self.crouching;
            }
        } else if inputs.crouch_pressed {
            self.crouching = true;
        } else if inputs.crouch_released {
            self.crouching = false;
        }

        // Slide entry: crouch went active this very tick while already sprinting.
        if self.sprinting && self.crouching && !was_crouching && !self.sliding {
            self.sliding = true;
            self.slide_speed = None;
        }

        // Releasing crouch ends the slide immediately.
        if self.sliding && !self.crouching {
            self.sliding = false;
            self.slide_speed = None;
        }
    }

    /// Resolve this tick's target speed from the active flags.
    ///
    /// While sliding the target decays from the body's planar speed toward
    /// zero and never increases within one slide; once it reaches the slide
    /// threshold the slide ends. The decayed value still stands for the
    /// current tick, so the crouch speed applies from the next tick on.
    pub fn update_target_speed(
        &mut self,
        planar_speed: f32,
        dt: f32,
        settings: &ControllerSettings,
    ) {
        if self.sliding {
            let decayed = lerp(planar_speed, 0.0, settings.slide_decay_rate * dt);
            let next = match self.slide_speed {
                Some(prev) => decayed.min(prev),
                None => decayed,
            };
            self.slide_speed = Some(next);
            self.target_speed = next;

            if next <= settings.slide_threshold {
                self.sliding = false;
                self.slide_speed = None;
            }
        } else if self.crouching {
            self.target_speed = settings.crouch_speed;
        } else if self.sprinting {
            self.target_speed = settings.sprint_speed;
        } else {
            self.target_speed = settings.walk_speed;
        }
    }

    /// Stance implied by the active flags, highest priority first.
    #[inline]
    pub fn stance(&self) -> Stance {
        if self.sliding {
            Stance::Slide
        } else if self.crouching {
            Stance::Crouch
        } else if self.sprinting {
            Stance::Sprint
        } else {
            Stance::Walk
        }
    }

    /// Target speed resolved by the last `update_target_speed` call (m/s).
    #[inline]
    pub fn target_speed(&self) -> f32 {
        self.target_speed
    }

    #[inline]
    pub fn sprinting(&self) -> bool {
        self.sprinting
    }

    #[inline]
    pub fn crouching(&self) -> bool {
        self.crouching
    }

    #[inline]
    pub fn sliding(&self) -> bool {
        self.sliding
    }
}
