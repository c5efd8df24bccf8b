use crate::uniforms::{self, UniformSink};
use cabinview_common::{CameraConfig, SceneBounds};
use glam::{Mat4, Vec2, Vec3};

/// View and projection matrices produced by [`Camera::update`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraMatrices {
    pub view: Mat4,
    /// OpenGL clip convention (depth in [-1, 1]).
    pub projection: Mat4,
}

impl CameraMatrices {
    /// Write `view` and `projection` into the sink. Missing slots are logged
    /// and skipped.
    pub fn upload(&self, sink: &mut impl UniformSink) {
        uniforms::set_or_warn(sink, uniforms::VIEW, self.view);
        uniforms::set_or_warn(sink, uniforms::PROJECTION, self.projection);
    }
}

/// Walk/fly camera clamped to the scene bounds.
///
/// In free mode every move follows the full 3D direction. In constrained
/// mode the eye height never changes from movement input.
#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    pos: Vec3,
    front: Vec3,
    up: Vec3,
    /// Degrees.
    fov: f32,
    aspect_ratio: f32,
    near: f32,
    far: f32,
    free_camera: bool,
    speed: f32,
    sensitivity: f32,
    bounds: SceneBounds,
}

impl Camera {
    pub const DEFAULT_SPEED: f32 = 3.5;
    pub const DEFAULT_SENSITIVITY: f32 = 2.5;

    #[allow(clippy::too_many_arguments)]
    pub fn new(
        pos: Vec3,
        front: Vec3,
        up: Vec3,
        fov: f32,
        aspect_ratio: f32,
        near: f32,
        far: f32,
        free_camera: bool,
    ) -> Self {
        Self {
            pos,
            front,
            up,
            fov,
            aspect_ratio,
            near,
            far,
            free_camera,
            speed: Self::DEFAULT_SPEED,
            sensitivity: Self::DEFAULT_SENSITIVITY,
            bounds: SceneBounds::default(),
        }
    }

    pub fn from_config(config: &CameraConfig) -> Self {
        let mut camera = Self::new(
            config.position,
            config.front,
            config.up,
            config.fov_degrees,
            config.aspect_ratio,
            config.near,
            config.far,
            config.free_camera,
        );
        camera.speed = config.speed;
        camera.sensitivity = config.sensitivity;
        camera.bounds = config.bounds;
        camera
    }

    pub fn move_front(&mut self, dt: f32) {
        self.translate(self.front, self.speed * dt);
    }

    pub fn move_back(&mut self, dt: f32) {
        self.translate(self.front, -self.speed * dt);
    }

    pub fn move_left(&mut self, dt: f32) {
        let right = self.strafe_direction();
        self.pos -= right * self.speed * dt;
    }

    pub fn move_right(&mut self, dt: f32) {
        let right = self.strafe_direction();
        self.pos += right * self.speed * dt;
    }

    /// Fly along the up vector. Ignored in constrained mode.
    pub fn move_up(&mut self, dt: f32) {
        self.climb(self.speed * dt);
    }

    pub fn move_down(&mut self, dt: f32) {
        self.climb(-self.speed * dt);
    }

    /// Clamp the eye into the scene bounds and recompute both matrices.
    pub fn update(&mut self) -> CameraMatrices {
        self.pos = self.bounds.clamp(self.pos);
        CameraMatrices {
            view: self.view_matrix(),
            projection: self.projection_matrix(),
        }
    }

    /// [`Camera::update`] followed by an upload into `sink`.
    pub fn update_uniforms(&mut self, sink: &mut impl UniformSink) -> CameraMatrices {
        let matrices = self.update();
        matrices.upload(sink);
        matrices
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.pos, self.pos + self.front, self.up)
    }

    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh_gl(
            self.fov.to_radians(),
            self.aspect_ratio,
            self.near,
            self.far,
        )
    }

    /// Unit vector pointing to the camera's right.
    pub fn right(&self) -> Vec3 {
        self.front.cross(self.up).normalize_or_zero()
    }

    fn translate(&mut self, dir: Vec3, amount: f32) {
        if self.free_camera {
            self.pos += dir * amount;
        } else {
            self.pos.x += dir.x * amount;
            self.pos.z += dir.z * amount;
        }
    }

    fn climb(&mut self, amount: f32) {
        if self.free_camera {
            self.pos += self.up.normalize_or_zero() * amount;
        }
    }

    // Constrained mode normalizes the ground-plane projection of the right
    // vector so strafing speed does not depend on pitch.
    fn strafe_direction(&self) -> Vec3 {
        let right = self.right();
        if self.free_camera {
            right
        } else {
            let flat = Vec2::new(right.x, right.z).normalize_or_zero();
            Vec3::new(flat.x, 0.0, flat.y)
        }
    }

    pub fn set_pos(&mut self, pos: Vec3) {
        self.pos = pos;
    }

    pub fn set_front(&mut self, front: Vec3) {
        self.front = front;
    }

    pub fn set_up(&mut self, up: Vec3) {
        self.up = up;
    }

    pub fn set_fov(&mut self, fov: f32) {
        self.fov = fov;
    }

    pub fn set_aspect_ratio(&mut self, aspect_ratio: f32) {
        self.aspect_ratio = aspect_ratio;
    }

    pub fn set_near(&mut self, near: f32) {
        self.near = near;
    }

    pub fn set_far(&mut self, far: f32) {
        self.far = far;
    }

    /// `true` for free flight, `false` to lock the eye height.
    pub fn set_camera_mode(&mut self, free_camera: bool) {
        self.free_camera = free_camera;
    }

    pub fn set_speed(&mut self, speed: f32) {
        self.speed = speed;
    }

    pub fn set_sensitivity(&mut self, sensitivity: f32) {
        self.sensitivity = sensitivity;
    }

    pub fn set_bounds(&mut self, bounds: SceneBounds) {
        self.bounds = bounds;
    }

    pub fn pos(&self) -> Vec3 {
        self.pos
    }

    pub fn front(&self) -> Vec3 {
        self.front
    }

    pub fn up(&self) -> Vec3 {
        self.up
    }

    pub fn fov(&self) -> f32 {
        self.fov
    }

    pub fn aspect_ratio(&self) -> f32 {
        self.aspect_ratio
    }

    pub fn near(&self) -> f32 {
        self.near
    }

    pub fn far(&self) -> f32 {
        self.far
    }

    pub fn is_free(&self) -> bool {
        self.free_camera
    }

    pub fn speed(&self) -> f32 {
        self.speed
    }

    pub fn sensitivity(&self) -> f32 {
        self.sensitivity
    }

    pub fn bounds(&self) -> SceneBounds {
        self.bounds
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::from_config(&CameraConfig::default())
    }
}
