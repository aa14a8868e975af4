use glam::{Mat4, Vec3};

/// Damping fraction shared by every per-frame proportional easing step.
pub const EASE_DAMPING: f32 = 0.1;

/// Perspective camera with a fixed field of view and eye position; only the
/// aspect ratio changes at runtime, in response to container resizes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SceneCamera {
    pub fov_y_deg: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
    pub eye: Vec3,
    pub target: Vec3,
}

impl SceneCamera {
    fn new(aspect: f32) -> Self {
        Self {
            fov_y_deg: 40.0,
            aspect,
            near: 0.1,
            far: 1000.0,
            eye: Vec3::new(0.0, 1.5, 8.0),
            target: Vec3::new(0.0, 0.5, 0.0),
        }
    }

    pub fn view_proj(&self) -> Mat4 {
        let view = Mat4::look_at_rh(self.eye, self.target, Vec3::Y);
        let projection = Mat4::perspective_rh(
            self.fov_y_deg.to_radians(),
            self.aspect.max(0.01),
            self.near,
            self.far,
        );
        projection * view
    }
}

/// Scalar eased toward its target by a proportional step each frame. Never
/// overshoots; never assigned directly outside of construction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EasedScalar {
    current: f32,
    target: f32,
}

impl EasedScalar {
    pub fn new(value: f32) -> Self {
        Self {
            current: value,
            target: value,
        }
    }

    pub fn set_target(&mut self, target: f32) {
        self.target = target;
    }

    pub fn step(&mut self) {
        self.current += (self.target - self.current) * EASE_DAMPING;
    }

    pub fn current(&self) -> f32 {
        self.current
    }

    pub fn target(&self) -> f32 {
        self.target
    }
}

/// Fixed light rig: ambient + directional + rim and gold-glow point lights.
/// The beam and glow scalars are the only animated members.
#[derive(Debug, Clone, PartialEq)]
pub struct LightRig {
    pub ambient_color: Vec3,
    pub ambient_intensity: f32,
    pub sun_direction: Vec3,
    pub sun_color: Vec3,
    pub sun_intensity: f32,
    pub rim_position: Vec3,
    pub rim_color: Vec3,
    pub rim_intensity: f32,
    pub glow_position: Vec3,
    pub glow_color: Vec3,
    /// Gold glow intensity, ramped up while the chest is open.
    pub glow: EasedScalar,
    /// Arcane beam opacity: 1 while closed, fades to 0 for the reveal.
    pub beam: EasedScalar,
}

impl LightRig {
    fn new() -> Self {
        Self {
            ambient_color: Vec3::ONE,
            ambient_intensity: 0.3,
            sun_direction: Vec3::new(5.0, 10.0, 5.0).normalize(),
            sun_color: Vec3::new(1.0, 245.0 / 255.0, 225.0 / 255.0),
            sun_intensity: 1.5,
            rim_position: Vec3::new(-5.0, 5.0, -5.0),
            rim_color: Vec3::ONE,
            rim_intensity: 1.2,
            glow_position: Vec3::ZERO,
            glow_color: Vec3::new(1.0, 215.0 / 255.0, 0.0),
            glow: EasedScalar::new(2.0),
            beam: EasedScalar::new(1.0),
        }
    }

    pub fn step(&mut self) {
        self.glow.step();
        self.beam.step();
    }
}

/// Owns the camera, lights and render-surface dimensions. The wgpu backend
/// reads this state; everything here stays testable without a GPU.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneContext {
    camera: SceneCamera,
    lights: LightRig,
    width: u32,
    height: u32,
    attached: bool,
}

impl SceneContext {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            camera: SceneCamera::new(aspect_of(width, height)),
            lights: LightRig::new(),
            width,
            height,
            attached: true,
        }
    }

    /// Recomputes the camera aspect and surface dimensions. Geometry is not
    /// touched.
    pub fn resize(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
        self.camera.aspect = aspect_of(width, height);
    }

    /// Marks the render surface as released. Idempotent.
    pub fn detach(&mut self) {
        self.attached = false;
    }

    pub fn is_attached(&self) -> bool {
        self.attached
    }

    /// Whether the frame step should render at all.
    pub fn renderable(&self) -> bool {
        self.attached && self.width > 0 && self.height > 0
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn camera(&self) -> &SceneCamera {
        &self.camera
    }

    pub fn lights(&self) -> &LightRig {
        &self.lights
    }

    pub fn lights_mut(&mut self) -> &mut LightRig {
        &mut self.lights
    }
}

fn aspect_of(width: u32, height: u32) -> f32 {
    if height == 0 {
        1.0
    } else {
        width as f32 / height as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resize_updates_aspect_and_surface_exactly() {
        let mut context = SceneContext::new(800, 600);
        assert_eq!(context.camera().aspect, 800.0 / 600.0);
        context.resize(400, 300);
        assert_eq!(context.camera().aspect, 400.0 / 300.0);
        assert_eq!(context.size(), (400, 300));
    }

    #[test]
    fn zero_area_surface_is_not_renderable() {
        let mut context = SceneContext::new(0, 0);
        assert!(!context.renderable());
        context.resize(640, 480);
        assert!(context.renderable());
    }

    #[test]
    fn detach_is_observable_and_idempotent() {
        let mut context = SceneContext::new(800, 600);
        assert!(context.is_attached());
        context.detach();
        context.detach();
        assert!(!context.is_attached());
        assert!(!context.renderable());
    }

    #[test]
    fn eased_scalar_approaches_without_overshoot() {
        let mut value = EasedScalar::new(1.0);
        value.set_target(0.0);
        let mut previous = value.current();
        for _ in 0..200 {
            value.step();
            assert!(value.current() <= previous);
            assert!(value.current() >= 0.0);
            previous = value.current();
        }
        assert!(value.current() < 1e-6);
    }

    #[test]
    fn view_proj_is_finite_for_degenerate_aspect() {
        let context = SceneContext::new(1, 0);
        let matrix = context.camera().view_proj();
        assert!(matrix.is_finite());
    }
}
