use std::time::{Duration, Instant};

use log::debug;

pub use crate::chest::LID_OPEN_ANGLE;

/// Delay between the open activation and the reveal payload firing.
pub const REVEAL_DELAY: Duration = Duration::from_millis(1200);
/// Delay between the close activation and settling back into `Closed`.
pub const CLOSE_SETTLE: Duration = Duration::from_millis(1800);
/// Particles spawned by the reveal burst.
pub const BURST_COUNT: usize = 40;

/// Phase of the open/close choreography. Exactly one is active at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevealPhase {
    Closed,
    Opening,
    Open,
    Closing,
}

/// Commands emitted by the sequencer for the presentation layer and the
/// external gallery. Delivered as a drained queue with a single consumer;
/// the sequencer never assumes a command succeeded.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RevealEffect {
    /// The open activation was accepted; cue the shake and panel treatment.
    OpenRequested,
    /// Ease the arcane beam opacity toward the given target.
    BeamFade { target: f32 },
    /// Ramp the gold glow up or back down.
    GlowRamp { on: bool },
    /// Spawn the particle burst. Fires at most once per open cycle.
    EmitBurst { count: usize },
    /// Start continuous rotation of the external gallery.
    GalleryStart,
    /// Stop the external gallery's rotation.
    GalleryStop,
    /// The sequence settled back into `Closed`.
    CycleReset,
}

/// Drives the `Closed -> Opening -> Open -> Closing -> Closed` sequence.
///
/// Timers are plain deadlines checked by `update`, so cancellation is
/// clearing an `Option` and is always idempotent. The session flag guards
/// the reveal payload: the burst and the gallery-start command fire at most
/// once per open cycle, and a close that lands before the deferred deadline
/// suppresses them entirely.
#[derive(Debug)]
pub struct RevealSequencer {
    phase: RevealPhase,
    revealed: bool,
    gallery_spinning: bool,
    lid_target: f32,
    reveal_deadline: Option<Instant>,
    settle_deadline: Option<Instant>,
}

impl Default for RevealSequencer {
    fn default() -> Self {
        Self::new()
    }
}

impl RevealSequencer {
    pub fn new() -> Self {
        Self {
            phase: RevealPhase::Closed,
            revealed: false,
            gallery_spinning: false,
            lid_target: 0.0,
            reveal_deadline: None,
            settle_deadline: None,
        }
    }

    pub fn phase(&self) -> RevealPhase {
        self.phase
    }

    /// Angle the lid eases toward. Flips to the open deflection the moment
    /// an open activation is accepted; the deferred deadline gates only the
    /// reveal payload.
    pub fn lid_target_angle(&self) -> f32 {
        self.lid_target
    }

    pub fn is_revealed(&self) -> bool {
        self.revealed
    }

    /// Handles the single discrete activation input. Only `Closed` and
    /// `Open` are valid activation sources; anything else is ignored.
    pub fn activate(&mut self, now: Instant) -> Vec<RevealEffect> {
        match self.phase {
            RevealPhase::Closed => {
                self.phase = RevealPhase::Opening;
                self.lid_target = LID_OPEN_ANGLE;
                self.reveal_deadline = Some(now + REVEAL_DELAY);
                vec![
                    RevealEffect::OpenRequested,
                    RevealEffect::BeamFade { target: 0.0 },
                    RevealEffect::GlowRamp { on: true },
                ]
            }
            RevealPhase::Open => self.close(now),
            RevealPhase::Opening | RevealPhase::Closing => {
                debug!("activation ignored during {:?}", self.phase);
                Vec::new()
            }
        }
    }

    /// Requests a close. Valid from `Open` and also from `Opening`, where it
    /// cancels the pending reveal deadline so the payload never fires.
    pub fn close(&mut self, now: Instant) -> Vec<RevealEffect> {
        match self.phase {
            RevealPhase::Open | RevealPhase::Opening => {
                self.phase = RevealPhase::Closing;
                self.lid_target = 0.0;
                self.reveal_deadline = None;
                self.settle_deadline = Some(now + CLOSE_SETTLE);
                let mut effects = vec![
                    RevealEffect::BeamFade { target: 1.0 },
                    RevealEffect::GlowRamp { on: false },
                ];
                if self.gallery_spinning {
                    self.gallery_spinning = false;
                    effects.push(RevealEffect::GalleryStop);
                }
                effects
            }
            RevealPhase::Closed | RevealPhase::Closing => Vec::new(),
        }
    }

    /// Advances the deadline timers. Called once per frame.
    pub fn update(&mut self, now: Instant) -> Vec<RevealEffect> {
        match self.phase {
            RevealPhase::Opening => {
                let due = self
                    .reveal_deadline
                    .map(|deadline| now >= deadline)
                    .unwrap_or(false);
                if due && !self.revealed {
                    self.reveal_deadline = None;
                    self.revealed = true;
                    self.phase = RevealPhase::Open;
                    let mut effects = vec![RevealEffect::EmitBurst { count: BURST_COUNT }];
                    if !self.gallery_spinning {
                        self.gallery_spinning = true;
                        effects.push(RevealEffect::GalleryStart);
                    }
                    effects
                } else {
                    Vec::new()
                }
            }
            RevealPhase::Closing => {
                let due = self
                    .settle_deadline
                    .map(|deadline| now >= deadline)
                    .unwrap_or(false);
                if due {
                    self.settle_deadline = None;
                    self.reveal_deadline = None;
                    self.revealed = false;
                    self.phase = RevealPhase::Closed;
                    vec![RevealEffect::CycleReset]
                } else {
                    Vec::new()
                }
            }
            RevealPhase::Closed | RevealPhase::Open => Vec::new(),
        }
    }

    /// Forces the sequence back to `Closed`, canceling any pending deadline.
    /// Used by teardown; safe to call in any phase, any number of times.
    pub fn reset(&mut self) -> Vec<RevealEffect> {
        self.reveal_deadline = None;
        self.settle_deadline = None;
        self.revealed = false;
        self.lid_target = 0.0;
        self.phase = RevealPhase::Closed;
        if self.gallery_spinning {
            self.gallery_spinning = false;
            vec![RevealEffect::GalleryStop]
        } else {
            Vec::new()
        }
    }
}
