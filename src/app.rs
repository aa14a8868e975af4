use std::time::{Duration, Instant};

use glam::Vec2;
use log::{debug, info};
use rand::rngs::StdRng;
use rand::SeedableRng;
use thiserror::Error;

use crate::chest::ChestModel;
use crate::gallery::Gallery;
use crate::orbit::OrbitController;
use crate::particles::ParticleBurst;
use crate::reveal::{RevealEffect, RevealPhase, RevealSequencer};
use crate::scene::{SceneContext, EASE_DAMPING};

/// Burst origin in the reveal panel's coordinate space (50% across, 60%
/// down of a nominal container, like the original treatment).
const BURST_ORIGIN: Vec2 = Vec2::new(0.5, 0.6);

/// Fatal construction failure surfaced to the host. There is no partial
/// scene and no retry.
#[derive(Debug, Error)]
pub enum MountError {
    #[error("chest model built with no parts")]
    EmptyModel,
    #[error("chest part {0:?} tessellated to no geometry")]
    DegenerateGeometry(String),
}

/// Owns every resource of the reveal controller and guarantees deterministic
/// teardown. `mount` acquires, `unmount` releases; after `unmount` the frame
/// step is a no-op and no timer can mutate state.
pub struct RevealApp {
    chest: ChestModel,
    context: SceneContext,
    orbit: OrbitController,
    sequencer: RevealSequencer,
    particles: ParticleBurst,
    gallery: Box<dyn Gallery>,
    rng: StdRng,
    lid_angle: f32,
    last_frame: Option<Instant>,
    mounted: bool,
}

impl RevealApp {
    /// Builds the model graph and scene context. A zero-area surface is not
    /// an error; rendering is simply skipped until a real size arrives.
    pub fn mount(width: u32, height: u32, gallery: Box<dyn Gallery>) -> Result<Self, MountError> {
        let chest = ChestModel::build();
        if chest.part_count() == 0 {
            return Err(MountError::EmptyModel);
        }
        for part in chest.parts() {
            if part.shape.tessellate().triangle_count() == 0 {
                return Err(MountError::DegenerateGeometry(part.name.clone()));
            }
        }
        info!("mounted chest with {} parts", chest.part_count());

        Ok(Self {
            chest,
            context: SceneContext::new(width, height),
            orbit: OrbitController::new(),
            sequencer: RevealSequencer::new(),
            particles: ParticleBurst::new(),
            gallery,
            rng: StdRng::from_entropy(),
            lid_angle: 0.0,
            last_frame: None,
            mounted: true,
        })
    }

    /// The single discrete activation input (click or tap).
    pub fn activate(&mut self, now: Instant) {
        if !self.mounted {
            return;
        }
        let effects = self.sequencer.activate(now);
        self.apply_effects(effects);
    }

    /// Explicit close request; also valid mid-`Opening`.
    pub fn close(&mut self, now: Instant) {
        if !self.mounted {
            return;
        }
        let effects = self.sequencer.close(now);
        self.apply_effects(effects);
    }

    /// The render-loop body: advances the deferred deadlines, eases the lid
    /// and lighting toward their targets, and ages the particles. The caller
    /// renders afterwards if `context().renderable()`.
    pub fn frame(&mut self, now: Instant) {
        if !self.mounted {
            return;
        }
        let effects = self.sequencer.update(now);
        self.apply_effects(effects);

        let dt = match self.last_frame {
            Some(previous) => now.saturating_duration_since(previous),
            None => Duration::ZERO,
        };
        self.last_frame = Some(now);

        // Proportional step toward the target; eased, never snapped.
        self.lid_angle += (self.sequencer.lid_target_angle() - self.lid_angle) * EASE_DAMPING;
        self.context.lights_mut().step();
        self.particles.update(dt);
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        if !self.mounted {
            return;
        }
        self.context.resize(width, height);
    }

    /// Synchronously cancels every pending deadline, stops the gallery if a
    /// start was issued, drops live particles, and detaches the render
    /// surface. Idempotent; safe mid-sequence.
    pub fn unmount(&mut self) {
        if !self.mounted {
            return;
        }
        self.mounted = false;
        let effects = self.sequencer.reset();
        for effect in effects {
            if effect == RevealEffect::GalleryStop {
                self.gallery.stop_rotation();
            }
        }
        self.particles.clear();
        self.context.detach();
        info!("reveal controller unmounted");
    }

    fn apply_effects(&mut self, effects: Vec<RevealEffect>) {
        for effect in effects {
            match effect {
                RevealEffect::OpenRequested => {
                    debug!("open requested; beginning reveal choreography");
                }
                RevealEffect::BeamFade { target } => {
                    self.context.lights_mut().beam.set_target(target);
                }
                RevealEffect::GlowRamp { on } => {
                    let target = if on { 4.0 } else { 2.0 };
                    self.context.lights_mut().glow.set_target(target);
                }
                RevealEffect::EmitBurst { count } => {
                    self.particles.emit(BURST_ORIGIN, count, &mut self.rng);
                }
                RevealEffect::GalleryStart => self.gallery.start_rotation(),
                RevealEffect::GalleryStop => self.gallery.stop_rotation(),
                RevealEffect::CycleReset => debug!("reveal cycle settled closed"),
            }
        }
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted
    }

    pub fn phase(&self) -> RevealPhase {
        self.sequencer.phase()
    }

    pub fn lid_angle(&self) -> f32 {
        self.lid_angle
    }

    pub fn chest(&self) -> &ChestModel {
        &self.chest
    }

    pub fn context(&self) -> &SceneContext {
        &self.context
    }

    pub fn orbit(&self) -> &OrbitController {
        &self.orbit
    }

    pub fn orbit_mut(&mut self) -> &mut OrbitController {
        &mut self.orbit
    }

    pub fn particles(&self) -> &ParticleBurst {
        &self.particles
    }

    /// One-line state summary used by the headless binary.
    pub fn summary(&self) -> String {
        format!(
            "phase={:?} lid={:.3} particles={} revealed={} attached={}",
            self.sequencer.phase(),
            self.lid_angle,
            self.particles.live().len(),
            self.sequencer.is_revealed(),
            self.context.is_attached(),
        )
    }
}

impl Drop for RevealApp {
    fn drop(&mut self) {
        self.unmount();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gallery::RecordingGallery;
    use crate::reveal::{CLOSE_SETTLE, LID_OPEN_ANGLE, REVEAL_DELAY};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    const FRAME: Duration = Duration::from_millis(16);

    fn mounted() -> (RevealApp, Arc<AtomicUsize>, Arc<AtomicUsize>) {
        let gallery = RecordingGallery::new();
        let (starts, stops) = gallery.counters();
        let app = RevealApp::mount(800, 600, Box::new(gallery)).unwrap();
        (app, starts, stops)
    }

    fn run_frames(app: &mut RevealApp, from: Instant, frames: u32) -> Instant {
        let mut now = from;
        for _ in 0..frames {
            now += FRAME;
            app.frame(now);
        }
        now
    }

    #[test]
    fn open_cycle_fires_payload_exactly_once() {
        let (mut app, starts, stops) = mounted();
        let t0 = Instant::now();
        app.activate(t0);
        assert_eq!(app.phase(), RevealPhase::Opening);

        // ~1.6 seconds of frames carries the sequence past the deadline.
        run_frames(&mut app, t0, 100);
        assert_eq!(app.phase(), RevealPhase::Open);
        assert_eq!(starts.load(Ordering::SeqCst), 1);
        assert_eq!(stops.load(Ordering::SeqCst), 0);
        assert_eq!(app.particles().live().len(), crate::reveal::BURST_COUNT);
    }

    #[test]
    fn lid_eases_toward_open_without_overshoot() {
        let (mut app, _, _) = mounted();
        let t0 = Instant::now();
        app.activate(t0);
        let mut previous = app.lid_angle();
        let mut now = t0;
        for _ in 0..300 {
            now += FRAME;
            app.frame(now);
            assert!(app.lid_angle() <= previous + 1e-6);
            assert!(app.lid_angle() >= LID_OPEN_ANGLE);
            previous = app.lid_angle();
        }
        assert!((app.lid_angle() - LID_OPEN_ANGLE).abs() < 1e-3);
    }

    #[test]
    fn round_trip_leaves_lid_easing_back_not_snapped() {
        let (mut app, starts, stops) = mounted();
        let t0 = Instant::now();
        app.activate(t0);
        let now = run_frames(&mut app, t0, 100);
        app.activate(now);
        assert_eq!(app.phase(), RevealPhase::Closing);
        assert_eq!(stops.load(Ordering::SeqCst), 1);

        // A few frames into closing the lid is moving but not yet home.
        run_frames(&mut app, now, 5);
        assert!(app.lid_angle() < -0.5);

        let settled = run_frames(&mut app, now, 150);
        app.frame(settled + CLOSE_SETTLE);
        assert_eq!(app.phase(), RevealPhase::Closed);
        assert_eq!(starts.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn close_during_opening_never_reveals() {
        let (mut app, starts, _) = mounted();
        let t0 = Instant::now();
        app.activate(t0);
        app.close(t0 + Duration::from_millis(200));

        let mut now = t0 + Duration::from_millis(200);
        now += CLOSE_SETTLE + FRAME;
        app.frame(now);
        assert_eq!(app.phase(), RevealPhase::Closed);

        // Long after the original deadline: still no payload.
        app.frame(now + REVEAL_DELAY * 2);
        assert_eq!(starts.load(Ordering::SeqCst), 0);
        assert!(app.particles().is_empty());
    }

    #[test]
    fn unmount_freezes_all_observable_state() {
        let (mut app, starts, stops) = mounted();
        let t0 = Instant::now();
        app.activate(t0);
        app.unmount();
        assert!(!app.is_mounted());
        assert!(!app.context().is_attached());

        let before = app.summary();
        // Sampled delays past both deadlines; nothing may change.
        app.frame(t0 + REVEAL_DELAY + FRAME);
        app.frame(t0 + REVEAL_DELAY + CLOSE_SETTLE);
        app.activate(t0 + REVEAL_DELAY + CLOSE_SETTLE);
        assert_eq!(app.summary(), before);
        assert_eq!(starts.load(Ordering::SeqCst), 0);
        assert_eq!(stops.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn unmount_from_open_stops_the_gallery() {
        let (mut app, starts, stops) = mounted();
        let t0 = Instant::now();
        app.activate(t0);
        run_frames(&mut app, t0, 100);
        assert_eq!(starts.load(Ordering::SeqCst), 1);

        app.unmount();
        app.unmount();
        assert_eq!(stops.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn resize_flows_through_to_the_context() {
        let (mut app, _, _) = mounted();
        app.resize(400, 300);
        assert_eq!(app.context().camera().aspect, 400.0 / 300.0);
        assert_eq!(app.context().size(), (400, 300));
    }
}
