//! Camera state and controllable variants
//!
//! The base camera owns view/projection matrices, the frustum, and the
//! cascade split distances. Variants share that state machine and differ in
//! how they rebuild their matrices each frame: free and drag cameras smooth
//! yaw/pitch toward target angles, the chase camera integrates a spring
//! toward an offset behind a tracked transform.

use crate::scene::frustum::Frustum;
use crate::scene::SceneError;
use glam::{Mat4, Vec2, Vec3};

/// Controllable camera with frustum state
#[derive(Debug, Clone)]
pub struct Camera {
    pub position: Vec3,

    /// Yaw/pitch in degrees, plus the targets the variants smooth toward
    yaw: f32,
    pitch: f32,
    target_yaw: f32,
    target_pitch: f32,

    world: Mat4,
    view: Mat4,
    projection: Mat4,
    old_view: Mat4,
    old_projection: Mat4,
    frustum: Frustum,

    pub near_plane: f32,
    pub far_plane: f32,
    near_split: f32,
    far_split: f32,

    viewport_size: Vec2,
    field_of_view: f32,
    aspect_ratio: f32,
}

impl Default for Camera {
    fn default() -> Self {
        Self::new()
    }
}

impl Camera {
    pub fn new() -> Self {
        let near_plane = 1.0;
        let far_plane = 1000.0;
        Self {
            position: Vec3::new(0.0, 4.0, 0.0),
            yaw: 0.0,
            pitch: 0.0,
            target_yaw: 0.0,
            target_pitch: 0.0,
            world: Mat4::IDENTITY,
            view: Mat4::IDENTITY,
            projection: Mat4::IDENTITY,
            old_view: Mat4::IDENTITY,
            old_projection: Mat4::IDENTITY,
            frustum: Frustum::from_matrix(Mat4::IDENTITY),
            near_plane,
            far_plane,
            near_split: near_plane,
            far_split: far_plane,
            viewport_size: Vec2::ZERO,
            field_of_view: std::f32::consts::FRAC_PI_4,
            aspect_ratio: 1.0,
        }
    }

    /// Camera at a position with an initial yaw/pitch in degrees
    pub fn with_pose(position: Vec3, yaw: f32, pitch: f32) -> Self {
        let mut camera = Self::new();
        camera.position = position;
        camera.snap_orientation(yaw, pitch);
        camera
    }

    /// Set aspect ratio and compute the initial projection
    pub fn initialize(&mut self, width: f32, height: f32) -> Result<(), SceneError> {
        if width <= 0.0 || height <= 0.0 {
            return Err(SceneError::InvalidViewport { width, height });
        }
        self.viewport_size = Vec2::new(width, height);
        self.update_projection();
        self.update_matrices();
        Ok(())
    }

    /// Update the near and far clipping planes and refresh the projection
    pub fn update_near_far(&mut self, near: f32, far: f32) {
        self.near_plane = near;
        self.far_plane = far;
        self.update_projection();
    }

    /// Set the smoothing targets for yaw/pitch in degrees
    pub fn set_orientation(&mut self, yaw: f32, pitch: f32) {
        self.target_yaw = yaw;
        self.target_pitch = pitch;
    }

    /// Set yaw/pitch immediately, skipping smoothing
    pub fn snap_orientation(&mut self, yaw: f32, pitch: f32) {
        self.yaw = yaw;
        self.pitch = pitch;
        self.target_yaw = yaw;
        self.target_pitch = pitch;
    }

    /// Snapshot the previous matrices and rebuild view and frustum
    pub fn update(&mut self) {
        self.old_view = self.view;
        self.old_projection = self.projection;
        self.update_matrices();
    }

    fn update_matrices(&mut self) {
        self.world = Mat4::from_axis_angle(Vec3::Y, self.yaw.to_radians())
            * Mat4::from_axis_angle(Vec3::X, self.pitch.to_radians());
        self.view = Mat4::look_at_rh(self.position, self.position + self.forward(), self.up());
        self.frustum = Frustum::from_matrix(self.projection * self.view);
    }

    fn update_projection(&mut self) {
        if self.viewport_size.y > 0.0 {
            self.aspect_ratio = self.viewport_size.x / self.viewport_size.y;
        }
        self.projection = Mat4::perspective_rh(
            self.field_of_view,
            self.aspect_ratio,
            self.near_plane,
            self.far_plane,
        );
    }

    /// Replace view and projection directly (light cameras), refreshing the
    /// frustum to match
    pub fn set_view_projection(&mut self, view: Mat4, projection: Mat4) {
        self.view = view;
        self.projection = projection;
        self.frustum = Frustum::from_matrix(projection * view);
    }

    /// Near/far distances for one cascade split, blending a logarithmic and
    /// a linear distribution: `c = lambda * c_log + (1 - lambda) * c_lin`.
    /// The returned near distance is pulled in by 5% to overlap bands.
    pub fn frustum_split(&mut self, split: u32, num_splits: u32, lambda: f32) -> (f32, f32) {
        let split = split.min(num_splits);
        let near = self.near_plane;
        let far = self.far_plane;
        let n = num_splits as f32;

        let blend = |i: f32| {
            let c_log = near * (far / near).powf(i / n);
            let c_lin = near + (far - near) * (i / n);
            c_log * lambda + c_lin * (1.0 - lambda)
        };

        self.far_split = blend((split + 1) as f32);
        self.near_split = blend(split as f32);

        (self.near_split * 0.95, self.far_split)
    }

    /// World-space corners of the current split band, near plane first
    pub fn split_corners(&self) -> [Vec3; 8] {
        let forward = self.forward();
        let left = -self.world.x_axis.truncate();

        let near_center = self.position + forward * self.near_split;
        let far_center = self.position + forward * self.far_split;

        let tan_half_fov = (self.field_of_view / 2.0).tan();
        let near_extent = tan_half_fov * self.near_split;
        let far_extent = tan_half_fov * self.far_split;

        let near_y = near_extent * Vec3::Y;
        let near_x = near_extent * self.aspect_ratio * left;
        let far_y = far_extent * Vec3::Y;
        let far_x = far_extent * self.aspect_ratio * left;

        [
            near_center + near_y - near_x,
            near_center + near_y + near_x,
            near_center - near_y + near_x,
            near_center - near_y - near_x,
            far_center + far_y - far_x,
            far_center + far_y + far_x,
            far_center - far_y + far_x,
            far_center - far_y - far_x,
        ]
    }

    pub fn forward(&self) -> Vec3 {
        -self.world.z_axis.truncate()
    }

    pub fn up(&self) -> Vec3 {
        self.world.y_axis.truncate()
    }

    pub fn view(&self) -> Mat4 {
        self.view
    }

    pub fn projection(&self) -> Mat4 {
        self.projection
    }

    pub fn view_projection(&self) -> Mat4 {
        self.projection * self.view
    }

    pub fn old_view(&self) -> Mat4 {
        self.old_view
    }

    pub fn old_projection(&self) -> Mat4 {
        self.old_projection
    }

    pub fn frustum(&self) -> &Frustum {
        &self.frustum
    }

    pub fn yaw(&self) -> f32 {
        self.yaw
    }

    pub fn pitch(&self) -> f32 {
        self.pitch
    }

    pub fn field_of_view(&self) -> f32 {
        self.field_of_view
    }

    pub fn aspect_ratio(&self) -> f32 {
        self.aspect_ratio
    }

    pub fn split_distances(&self) -> (f32, f32) {
        (self.near_split, self.far_split)
    }
}

/// Free-look camera smoothing toward target angles
#[derive(Debug, Clone)]
pub struct FreeCamera {
    pub camera: Camera,
    /// Higher values lag further behind the target orientation
    pub smoothing: f32,
    pub move_speed: f32,
}

impl FreeCamera {
    pub fn new(position: Vec3, yaw: f32, pitch: f32) -> Self {
        Self {
            camera: Camera::with_pose(position, yaw, pitch),
            smoothing: 3.5,
            move_speed: 0.0625,
        }
    }

    /// Nudge the target orientation, in degrees
    pub fn look_by(&mut self, delta: Vec2) {
        self.camera.target_yaw += delta.x;
        self.camera.target_pitch += delta.y;
    }

    pub fn move_forward(&mut self, amount: f32) {
        let forward = self.camera.forward();
        self.camera.position += forward * amount * self.move_speed;
    }

    pub fn move_right(&mut self, amount: f32) {
        let right = self.camera.world.x_axis.truncate();
        self.camera.position += right * amount * self.move_speed;
    }

    pub fn update(&mut self) {
        let camera = &mut self.camera;
        camera.target_pitch = camera.target_pitch.clamp(-90.0, 90.0);
        camera.yaw += (camera.target_yaw - camera.yaw) / self.smoothing;
        camera.pitch += (camera.target_pitch - camera.pitch) / self.smoothing;
        camera.update();
    }
}

/// Drag camera: orientation only changes while a drag is active
#[derive(Debug, Clone)]
pub struct DragCamera {
    pub camera: Camera,
    pub smoothing: f32,
    pub move_speed: f32,
    dragging: bool,
}

impl DragCamera {
    pub fn new(position: Vec3, yaw: f32, pitch: f32) -> Self {
        Self {
            camera: Camera::with_pose(position, yaw, pitch),
            smoothing: 3.5,
            move_speed: 0.25,
            dragging: false,
        }
    }

    pub fn begin_drag(&mut self) {
        self.dragging = true;
    }

    pub fn end_drag(&mut self) {
        self.dragging = false;
    }

    /// Apply a drag delta in degrees; ignored unless a drag is active
    pub fn drag_by(&mut self, delta: Vec2) {
        if self.dragging {
            self.camera.target_yaw += delta.x;
            self.camera.target_pitch += delta.y;
        }
    }

    pub fn move_forward(&mut self, amount: f32) {
        let forward = self.camera.forward();
        self.camera.position += forward * amount * self.move_speed;
    }

    pub fn update(&mut self) {
        let camera = &mut self.camera;
        camera.target_pitch = camera.target_pitch.clamp(-90.0, 90.0);
        camera.yaw += (camera.target_yaw - camera.yaw) / self.smoothing;
        camera.pitch += (camera.target_pitch - camera.pitch) / self.smoothing;
        camera.update();
    }
}

/// Camera that follows a target on a damped spring
#[derive(Debug, Clone)]
pub struct ChaseCamera {
    pub camera: Camera,

    chase_position: Vec3,
    chase_direction: Vec3,
    up: Vec3,

    /// Desired camera offset in the chased object's coordinate system
    pub desired_position_offset: Vec3,
    /// Look-at point offset in the chased object's coordinate system
    pub look_at_offset: Vec3,

    /// The stiffer the spring, the closer the camera stays to the target
    pub stiffness: f32,

    velocity: Vec3,
    desired_position: Vec3,
    look_at: Vec3,
}

impl ChaseCamera {
    pub fn new() -> Self {
        Self {
            camera: Camera::new(),
            chase_position: Vec3::ZERO,
            chase_direction: -Vec3::Z,
            up: Vec3::Y,
            desired_position_offset: Vec3::new(0.0, 30.0, 60.0),
            look_at_offset: Vec3::new(0.0, 0.0, -40.8),
            stiffness: 10.0,
            velocity: Vec3::ZERO,
            desired_position: Vec3::ZERO,
            look_at: Vec3::ZERO,
        }
    }

    /// Update the transform being chased
    pub fn update_chase_target(&mut self, position: Vec3, direction: Vec3) {
        self.chase_position = position;
        self.chase_direction = direction;
        self.up = Vec3::Y;
    }

    /// Rebuild desired position and look-at in world space from the chased
    /// object's basis
    fn update_world_positions(&mut self) {
        let forward = self.chase_direction;
        let right = self.up.cross(forward);

        let rotate = |offset: Vec3| offset.x * right + offset.y * self.up - offset.z * forward;

        self.desired_position = self.chase_position + rotate(self.desired_position_offset);
        self.look_at = self.chase_position + rotate(self.look_at_offset);
    }

    fn update_matrices(&mut self) {
        self.camera.world = Mat4::IDENTITY;
        let view = Mat4::look_at_rh(self.camera.position, self.look_at, self.up);
        let projection = self.camera.projection;
        self.camera.view = view;
        self.camera.frustum = Frustum::from_matrix(projection * view);
    }

    /// Snap to the desired position and stop moving. Call after the chased
    /// object is created or teleported, or the camera will fly across the
    /// world to catch up.
    pub fn reset(&mut self) {
        self.update_world_positions();
        self.velocity = Vec3::ZERO;
        self.camera.position = self.desired_position;
        self.update_matrices();
    }

    /// Re-aim at the target without moving
    pub fn no_follow(&mut self) {
        self.update_world_positions();
        self.velocity = Vec3::ZERO;
        self.update_matrices();
    }

    /// Euler-integrate the spring toward the desired offset
    pub fn update(&mut self, delta_seconds: f32) {
        self.update_world_positions();

        let stretch = self.camera.position - self.desired_position;
        self.camera.position -= stretch * delta_seconds * self.stiffness;

        self.update_matrices();
    }

    pub fn velocity(&self) -> Vec3 {
        self.velocity
    }

    pub fn desired_position(&self) -> Vec3 {
        self.update_world_positions_const()
    }

    fn update_world_positions_const(&self) -> Vec3 {
        let forward = self.chase_direction;
        let right = self.up.cross(forward);
        let offset = self.desired_position_offset;
        self.chase_position + offset.x * right + offset.y * self.up - offset.z * forward
    }
}

impl Default for ChaseCamera {
    fn default() -> Self {
        Self::new()
    }
}
