use glam::Vec2;

/// Radians of yaw per pixel of horizontal drag.
pub const YAW_PER_PIXEL: f32 = 0.01;
/// Radians of pitch per pixel of vertical drag.
pub const PITCH_PER_PIXEL: f32 = 0.005;
/// Symmetric pitch clamp, in radians.
pub const PITCH_LIMIT: f32 = 0.5;

/// Converts pointer drags into incremental yaw/pitch of the chest. Mouse and
/// single-touch input both feed the same delta path; there is no inertia, so
/// motion stops the instant the drag ends.
#[derive(Debug, Clone, Copy, Default)]
pub struct OrbitController {
    yaw: f32,
    pitch: f32,
    dragging: bool,
    last_sample: Vec2,
}

impl OrbitController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pointer_down(&mut self, x: f32, y: f32) {
        self.dragging = true;
        self.last_sample = Vec2::new(x, y);
    }

    /// Applies the delta from the previous sample and advances it, so deltas
    /// are always frame-to-frame rather than measured from the drag origin.
    /// Returns whether the move was consumed.
    pub fn pointer_move(&mut self, x: f32, y: f32) -> bool {
        if !self.dragging {
            return false;
        }
        let sample = Vec2::new(x, y);
        let delta = sample - self.last_sample;
        self.yaw += delta.x * YAW_PER_PIXEL;
        self.pitch = (self.pitch + delta.y * PITCH_PER_PIXEL).clamp(-PITCH_LIMIT, PITCH_LIMIT);
        self.last_sample = sample;
        true
    }

    pub fn pointer_up(&mut self) {
        self.dragging = false;
    }

    pub fn is_dragging(&self) -> bool {
        self.dragging
    }

    pub fn yaw(&self) -> f32 {
        self.yaw
    }

    pub fn pitch(&self) -> f32 {
        self.pitch
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn moves_without_drag_are_ignored() {
        let mut orbit = OrbitController::new();
        assert!(!orbit.pointer_move(100.0, 100.0));
        assert_eq!(orbit.yaw(), 0.0);
        assert_eq!(orbit.pitch(), 0.0);
    }

    #[test]
    fn yaw_accumulates_per_move_deltas() {
        let mut orbit = OrbitController::new();
        orbit.pointer_down(0.0, 0.0);
        orbit.pointer_move(10.0, 0.0);
        orbit.pointer_move(25.0, 0.0);
        orbit.pointer_move(5.0, 0.0);
        // Sum of deltas is 5 pixels regardless of the path taken.
        assert!((orbit.yaw() - 5.0 * YAW_PER_PIXEL).abs() < 1e-6);
    }

    #[test]
    fn pitch_clamps_to_symmetric_range() {
        let mut orbit = OrbitController::new();
        orbit.pointer_down(0.0, 0.0);
        orbit.pointer_move(0.0, 10_000.0);
        assert_eq!(orbit.pitch(), PITCH_LIMIT);
        orbit.pointer_move(0.0, -20_000.0);
        assert_eq!(orbit.pitch(), -PITCH_LIMIT);
        // Yaw is unbounded either way.
        orbit.pointer_move(100_000.0, -20_000.0);
        assert!(orbit.yaw() > PITCH_LIMIT);
    }

    #[test]
    fn motion_stops_when_drag_ends() {
        let mut orbit = OrbitController::new();
        orbit.pointer_down(0.0, 0.0);
        orbit.pointer_move(10.0, 10.0);
        orbit.pointer_up();
        let (yaw, pitch) = (orbit.yaw(), orbit.pitch());
        assert!(!orbit.pointer_move(500.0, 500.0));
        assert_eq!(orbit.yaw(), yaw);
        assert_eq!(orbit.pitch(), pitch);
    }

    #[test]
    fn new_drag_does_not_jump_from_stale_sample() {
        let mut orbit = OrbitController::new();
        orbit.pointer_down(0.0, 0.0);
        orbit.pointer_move(10.0, 0.0);
        orbit.pointer_up();
        // Pressing far away must not apply the gap as a delta.
        orbit.pointer_down(900.0, 900.0);
        orbit.pointer_move(901.0, 900.0);
        assert!((orbit.yaw() - 11.0 * YAW_PER_PIXEL).abs() < 1e-6);
    }
}
