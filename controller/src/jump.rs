/*!
Jump state machine.

Four phases, one cycle per jump:

```text
Ready -> Requested -> Rising -> Falling -> Ready
```

- `Ready -> Requested` on an accepted button press (grounded last tick,
  cooldown expired).
- `Requested -> Rising` when the movement solver consumes the request and
  applies the vertical impulse, always on the same tick as the request.
- `Rising -> Falling` on the first maintenance tick with an ungrounded
  classification after the impulse.
- `Falling -> Ready` on the next contact-begin event. The collision event is
  used instead of the ground classification because it fires earlier and is
  edge-triggered.

The cooldown only counts down while grounded; airborne it stays pinned at its
maximum so the timer starts after landing, not at take-off.
*/

/// Where the current jump cycle stands.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum JumpPhase {
    /// Grounded and able to accept a jump press.
    Ready,
    /// A press was accepted this tick; the solver has not applied the impulse yet.
    Requested,
    /// The impulse was applied; the body has not yet been seen ungrounded.
    Rising,
    /// The body left the ground; waiting for the next contact to re-arm.
    Falling,
}

impl JumpPhase {
    /// True once the vertical impulse has been applied this cycle.
    #[inline]
    pub fn has_applied_impulse(self) -> bool {
        matches!(self, JumpPhase::Rising | JumpPhase::Falling)
    }
}

#[derive(Clone, Copy, Debug)]
pub struct JumpStateMachine {
    phase: JumpPhase,
    cooldown: f32,
}

impl Default for JumpStateMachine {
    fn default() -> Self {
        Self {
            phase: JumpPhase::Ready,
            cooldown: 0.0,
        }
    }
}

impl JumpStateMachine {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn phase(&self) -> JumpPhase {
        self.phase
    }

    /// Seconds of ground contact still required before a press is accepted.
    #[inline]
    pub fn cooldown(&self) -> f32 {
        self.cooldown
    }

    /// A jump press edge arrived this tick.
    ///
    /// Accepted only from `Ready`, when the body was grounded on the previous
    /// tick and the cooldown has expired. Presses at any other time are
    /// dropped without buffering.
    pub fn note_press(&mut self, grounded_last_frame: bool) {
        if self.phase == JumpPhase::Ready && grounded_last_frame && self.cooldown <= 0.0 {
            self.phase = JumpPhase::Requested;
        }
    }

    /// The solver is applying the vertical impulse for a pending request.
    pub fn consume_request(&mut self) {
        if self.phase == JumpPhase::Requested {
            self.phase = JumpPhase::Rising;
        }
    }

    /// Per-tick maintenance, after ground classification.
    ///
    /// Grounded ticks run the cooldown toward zero; airborne ticks pin it back
    /// to `cooldown_time` and move `Rising` on to `Falling`.
    pub fn tick(&mut self, grounded: bool, dt: f32, cooldown_time: f32) {
        if grounded {
            self.cooldown = (self.cooldown - dt).max(0.0);
        } else {
            if self.phase == JumpPhase::Rising {
                self.phase = JumpPhase::Falling;
            }
            self.cooldown = cooldown_time;
        }
    }

    /// A contact-begin event arrived; a falling jump cycle re-arms.
    pub fn on_contact_begin(&mut self) {
        if self.phase == JumpPhase::Falling {
            self.phase = JumpPhase::Ready;
        }
    }
}
