use approx::assert_relative_eq;
use deferred_engine::scene::{Camera, ChaseCamera, FreeCamera, SceneError};
use glam::{Mat4, Vec3};

const EPSILON: f32 = 1e-4;

fn assert_mat4_eq(a: Mat4, b: Mat4) {
    let (a, b) = (a.to_cols_array(), b.to_cols_array());
    for (x, y) in a.iter().zip(b.iter()) {
        assert!((x - y).abs() < EPSILON, "{a:?} != {b:?}");
    }
}

#[test]
fn default_view_matches_look_at_with_identity_orientation() {
    let mut camera = Camera::new();
    camera.initialize(1920.0, 1080.0).unwrap();
    camera.update();

    // Identity world orientation: forward is -Z, up is +Y
    let position = Vec3::new(0.0, 4.0, 0.0);
    assert_eq!(camera.position, position);
    let expected = Mat4::look_at_rh(position, position - Vec3::Z, Vec3::Y);
    assert_mat4_eq(camera.view(), expected);
}

#[test]
fn initialize_rejects_degenerate_viewports() {
    let mut camera = Camera::new();
    assert!(matches!(
        camera.initialize(0.0, 1080.0),
        Err(SceneError::InvalidViewport { .. })
    ));
    assert!(matches!(
        camera.initialize(1920.0, -1.0),
        Err(SceneError::InvalidViewport { .. })
    ));
}

#[test]
fn zero_lambda_reduces_to_the_linear_split() {
    let mut camera = Camera::new();
    camera.initialize(1280.0, 720.0).unwrap();
    let near = camera.near_plane;
    let far = camera.far_plane;
    let splits = 4;

    for split in 0..splits {
        let (_, far_split) = camera.frustum_split(split, splits, 0.0);
        let expected = near + (far - near) * (split + 1) as f32 / splits as f32;
        assert_relative_eq!(far_split, expected, epsilon = 1e-2);
    }
}

#[test]
fn unit_lambda_reduces_to_the_logarithmic_split() {
    let mut camera = Camera::new();
    camera.initialize(1280.0, 720.0).unwrap();
    let near = camera.near_plane;
    let far = camera.far_plane;
    let splits = 4;

    for split in 0..splits {
        let (_, far_split) = camera.frustum_split(split, splits, 1.0);
        let expected = near * (far / near).powf((split + 1) as f32 / splits as f32);
        assert_relative_eq!(far_split, expected, max_relative = 1e-3);
    }
}

#[test]
fn split_far_distances_increase_monotonically() {
    let mut camera = Camera::new();
    camera.initialize(1280.0, 720.0).unwrap();
    let splits = 6;

    for lambda in [0.0, 0.5, 0.75, 1.0] {
        let mut previous = camera.near_plane;
        for split in 0..splits {
            let (near_split, far_split) = camera.frustum_split(split, splits, lambda);
            assert!(
                far_split > previous,
                "far split {far_split} not past {previous} at lambda {lambda}"
            );
            assert!(near_split < far_split);
            previous = far_split;
        }
        assert_relative_eq!(previous, camera.far_plane, max_relative = 1e-3);
    }
}

#[test]
fn split_corners_straddle_the_band() {
    let mut camera = Camera::new();
    camera.initialize(1280.0, 720.0).unwrap();
    camera.update();
    camera.frustum_split(1, 4, 0.5);
    let (near_split, far_split) = camera.split_distances();

    let corners = camera.split_corners();
    // Near corners sit at the near split distance along -Z from the camera
    for corner in &corners[..4] {
        assert_relative_eq!(camera.position.z - corner.z, near_split, max_relative = 1e-3);
    }
    for corner in &corners[4..] {
        assert_relative_eq!(camera.position.z - corner.z, far_split, max_relative = 1e-3);
    }
}

#[test]
fn free_camera_smooths_toward_target_orientation() {
    let mut camera = FreeCamera::new(Vec3::ZERO, 0.0, 0.0);
    camera.camera.initialize(1280.0, 720.0).unwrap();
    camera.look_by(glam::Vec2::new(35.0, 0.0));

    let mut previous = 0.0;
    for _ in 0..8 {
        camera.update();
        let yaw = camera.camera.yaw();
        assert!(yaw > previous, "yaw should approach the target monotonically");
        assert!(yaw <= 35.0 + EPSILON);
        previous = yaw;
    }

    for _ in 0..200 {
        camera.update();
    }
    assert_relative_eq!(camera.camera.yaw(), 35.0, epsilon = 1e-2);
}

#[test]
fn free_camera_clamps_pitch() {
    let mut camera = FreeCamera::new(Vec3::ZERO, 0.0, 0.0);
    camera.camera.initialize(1280.0, 720.0).unwrap();
    camera.look_by(glam::Vec2::new(0.0, 500.0));

    for _ in 0..200 {
        camera.update();
    }
    assert!(camera.camera.pitch() <= 90.0 + EPSILON);
}

#[test]
fn chase_camera_reset_snaps_to_desired_offset() {
    let mut chase = ChaseCamera::new();
    chase.camera.initialize(1280.0, 720.0).unwrap();
    chase.update_chase_target(Vec3::ZERO, -Vec3::Z);
    chase.reset();

    // Offset (0, 30, 60) behind a -Z facing target lands at (0, 30, 60)
    assert_relative_eq!(chase.camera.position.x, 0.0, epsilon = EPSILON);
    assert_relative_eq!(chase.camera.position.y, 30.0, epsilon = EPSILON);
    assert_relative_eq!(chase.camera.position.z, 60.0, epsilon = EPSILON);
}

#[test]
fn chase_camera_spring_converges_on_moved_target() {
    let mut chase = ChaseCamera::new();
    chase.camera.initialize(1280.0, 720.0).unwrap();
    chase.update_chase_target(Vec3::ZERO, -Vec3::Z);
    chase.reset();

    chase.update_chase_target(Vec3::new(100.0, 0.0, 0.0), -Vec3::Z);
    let start_error = (chase.camera.position - Vec3::new(100.0, 30.0, 60.0)).length();

    for _ in 0..120 {
        chase.update(1.0 / 60.0);
    }
    let end_error = (chase.camera.position - Vec3::new(100.0, 30.0, 60.0)).length();

    assert!(end_error < start_error * 0.01, "spring failed to converge: {end_error}");
}

#[test]
fn update_snapshots_previous_matrices() {
    let mut camera = Camera::new();
    camera.initialize(1280.0, 720.0).unwrap();
    camera.update();

    let first_view = camera.view();
    camera.position = Vec3::new(5.0, 4.0, 0.0);
    camera.update();

    assert_mat4_eq(camera.old_view(), first_view);
    assert!(camera.view() != first_view);
}
