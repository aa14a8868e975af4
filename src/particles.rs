use std::time::Duration;

use glam::Vec2;
use rand::Rng;

/// Particle size range in pixels.
pub const SIZE_RANGE: (f32, f32) = (2.0, 8.0);
/// Horizontal drift range over a particle's life.
pub const DRIFT_X_RANGE: (f32, f32) = (-150.0, 150.0);
/// Vertical drift range; negative is up in the panel's coordinate space.
pub const DRIFT_Y_RANGE: (f32, f32) = (-290.0, -40.0);
/// Per-particle lifetime range.
pub const DURATION_RANGE: (f32, f32) = (1.5, 2.5);

/// One short-lived burst particle. Animates from its origin along a random
/// drift, shrinking as it goes, and is dropped when its lifetime elapses.
#[derive(Debug, Clone, Copy)]
pub struct Particle {
    origin: Vec2,
    drift: Vec2,
    rotation_deg: f32,
    size: f32,
    duration: f32,
    age: f32,
}

impl Particle {
    fn spawn(origin: Vec2, rng: &mut impl Rng) -> Self {
        Self {
            origin,
            drift: Vec2::new(
                rng.gen_range(DRIFT_X_RANGE.0..DRIFT_X_RANGE.1),
                rng.gen_range(DRIFT_Y_RANGE.0..DRIFT_Y_RANGE.1),
            ),
            rotation_deg: rng.gen_range(0.0..360.0),
            size: rng.gen_range(SIZE_RANGE.0..SIZE_RANGE.1),
            duration: rng.gen_range(DURATION_RANGE.0..DURATION_RANGE.1),
            age: 0.0,
        }
    }

    fn progress(&self) -> f32 {
        (self.age / self.duration).min(1.0)
    }

    pub fn position(&self) -> Vec2 {
        self.origin + self.drift * self.progress()
    }

    /// Scales from full size down to nothing over the lifetime.
    pub fn scale(&self) -> f32 {
        1.0 - self.progress()
    }

    /// Fades in over the first fifth of the lifetime, then out.
    pub fn opacity(&self) -> f32 {
        let p = self.progress();
        if p < 0.2 {
            p / 0.2
        } else {
            1.0 - (p - 0.2) / 0.8
        }
    }

    pub fn rotation_deg(&self) -> f32 {
        self.rotation_deg * self.progress()
    }

    pub fn size(&self) -> f32 {
        self.size
    }

    fn expired(&self) -> bool {
        self.age >= self.duration
    }
}

/// Holds the live particles of past bursts. There is no tracking beyond the
/// live list: a particle removes itself the frame its lifetime elapses.
#[derive(Debug, Clone, Default)]
pub struct ParticleBurst {
    particles: Vec<Particle>,
}

impl ParticleBurst {
    pub fn new() -> Self {
        Self::default()
    }

    /// Spawns `count` independently randomized particles at `origin`.
    pub fn emit(&mut self, origin: Vec2, count: usize, rng: &mut impl Rng) {
        self.particles.reserve(count);
        for _ in 0..count {
            self.particles.push(Particle::spawn(origin, rng));
        }
    }

    /// Ages every particle and drops the expired ones in place.
    pub fn update(&mut self, dt: Duration) {
        let dt = dt.as_secs_f32();
        for particle in &mut self.particles {
            particle.age += dt;
        }
        self.particles.retain(|p| !p.expired());
    }

    pub fn live(&self) -> &[Particle] {
        &self.particles
    }

    pub fn clear(&mut self) {
        self.particles.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn rng() -> StdRng {
        StdRng::seed_from_u64(7)
    }

    #[test]
    fn emit_creates_exactly_count_particles() {
        let mut burst = ParticleBurst::new();
        burst.emit(Vec2::ZERO, 40, &mut rng());
        assert_eq!(burst.live().len(), 40);
        burst.emit(Vec2::ZERO, 40, &mut rng());
        assert_eq!(burst.live().len(), 80);
    }

    #[test]
    fn randomized_attributes_stay_in_range() {
        let mut burst = ParticleBurst::new();
        burst.emit(Vec2::new(50.0, 60.0), 200, &mut rng());
        for particle in burst.live() {
            assert!(particle.size() >= SIZE_RANGE.0 && particle.size() < SIZE_RANGE.1);
            assert!(particle.drift.x >= DRIFT_X_RANGE.0 && particle.drift.x < DRIFT_X_RANGE.1);
            // Vertical drift is always upward biased.
            assert!(particle.drift.y < 0.0);
            assert!(
                particle.duration >= DURATION_RANGE.0 && particle.duration < DURATION_RANGE.1
            );
        }
    }

    #[test]
    fn all_particles_expire_within_the_duration_bound() {
        let mut burst = ParticleBurst::new();
        burst.emit(Vec2::ZERO, 40, &mut rng());

        burst.update(Duration::from_secs_f32(DURATION_RANGE.0 - 0.1));
        assert!(!burst.is_empty());

        burst.update(Duration::from_secs_f32(DURATION_RANGE.1 - DURATION_RANGE.0 + 0.2));
        assert!(burst.is_empty());
    }

    #[test]
    fn particle_shrinks_and_drifts_toward_its_offset() {
        let mut burst = ParticleBurst::new();
        burst.emit(Vec2::ZERO, 1, &mut rng());
        let fresh = burst.live()[0];
        assert_eq!(fresh.scale(), 1.0);
        assert_eq!(fresh.position(), Vec2::ZERO);

        burst.update(Duration::from_millis(750));
        let aged = burst.live()[0];
        assert!(aged.scale() < 1.0);
        assert!(aged.position().y < 0.0);
    }

    #[test]
    fn opacity_ramps_in_then_fades_out() {
        let mut particle = Particle {
            origin: Vec2::ZERO,
            drift: Vec2::new(0.0, -100.0),
            rotation_deg: 180.0,
            size: 4.0,
            duration: 2.0,
            age: 0.0,
        };
        assert_eq!(particle.opacity(), 0.0);
        particle.age = 0.4; // end of the ramp-in fifth
        assert!((particle.opacity() - 1.0).abs() < 1e-6);
        particle.age = 1.9;
        assert!(particle.opacity() < 0.1);
        assert!(particle.rotation_deg() > 170.0);
    }
}
