use deferred_engine::backend::HeadlessBackend;
use deferred_engine::content::{ContentLoader, Mesh, ProceduralContent};
use deferred_engine::scene::frustum::Containment;
use deferred_engine::scene::visibility;
use deferred_engine::scene::{Camera, Scene};
use glam::Vec3;

fn test_camera() -> Camera {
    let mut camera = Camera::new();
    camera.initialize(1280.0, 720.0).unwrap();
    camera.update();
    camera
}

fn scene_with_cubes(positions: &[(&str, Vec3)]) -> Scene {
    let mut backend = HeadlessBackend::new();
    let content = ProceduralContent::with_standard_meshes();
    let mut scene = Scene::new();

    for (name, position) in positions {
        let model = content.load_model(&mut backend, "cube").unwrap();
        let instance = scene.add_model(name, model).unwrap();
        instance.translate(*position).update_matrix();
    }
    scene
}

#[test]
fn visible_plus_culled_covers_every_mesh() {
    // Camera at (0, 4, 0) looking down -Z
    let camera = test_camera();
    let mut scene = scene_with_cubes(&[
        ("ahead", Vec3::new(0.0, 4.0, -10.0)),
        ("behind", Vec3::new(0.0, 4.0, 50.0)),
        ("far_left", Vec3::new(-500.0, 4.0, -10.0)),
    ]);

    visibility::cull_model_meshes(&mut scene, &camera);

    assert_eq!(
        scene.visible_meshes + scene.culled_meshes,
        scene.total_meshes() as u32
    );
    assert_eq!(scene.visible_meshes, 1);
    assert_eq!(scene.culled_meshes, 2);

    // Every mesh marked visible really is inside or straddling the frustum
    for instance in scene.static_models.values() {
        for &mesh in instance.visible_meshes() {
            let bounds = instance.world_bounds()[mesh];
            assert_ne!(camera.frustum().contains_box(&bounds), Containment::Disjoint);
        }
    }
}

#[test]
fn culling_is_per_mesh_within_one_model() {
    let mut backend = HeadlessBackend::new();
    let content = ProceduralContent::new();
    // One model, two meshes far apart in local space
    let mut ahead = Mesh::cube(2.0);
    for vertex in &mut ahead.vertices {
        vertex.position.z -= 10.0;
    }
    let mut behind = Mesh::cube(2.0);
    for vertex in &mut behind.vertices {
        vertex.position.z += 50.0;
    }
    content.register_model("split", vec![ahead, behind]).unwrap();

    let camera = test_camera();
    let mut scene = Scene::new();
    let model = content.load_model(&mut backend, "split").unwrap();
    scene
        .add_model("split", model)
        .unwrap()
        .translate(Vec3::new(0.0, 4.0, 0.0))
        .update_matrix();

    visibility::cull_model_meshes(&mut scene, &camera);

    let instance = scene.model("split").unwrap();
    assert_eq!(instance.visible_meshes(), &[0]);
    assert_eq!(scene.visible_meshes, 1);
    assert_eq!(scene.culled_meshes, 1);
}

#[test]
fn screen_position_of_centered_mesh_is_screen_center() {
    let camera = test_camera();
    let mut scene = scene_with_cubes(&[("center", Vec3::new(0.0, 4.0, -20.0))]);

    visibility::cull_model_meshes(&mut scene, &camera);

    let screen = scene.model("center").unwrap().screen_positions()[0];
    assert!((screen.x - 0.5).abs() < 1e-4, "screen x: {}", screen.x);
    assert!((screen.y - 0.5).abs() < 1e-4, "screen y: {}", screen.y);
}

#[test]
fn light_culling_keeps_spheres_touching_the_frustum() {
    let camera = test_camera();
    let mut scene = Scene::new();

    scene.add_point_light(Vec3::new(0.0, 4.0, -20.0), Vec3::ONE, 5.0, 1.0);
    scene.add_point_light(Vec3::new(0.0, 4.0, 100.0), Vec3::ONE, 5.0, 1.0);
    // Outside the cone, but the sphere reaches in
    scene.add_point_light(Vec3::new(-20.0, 4.0, -20.0), Vec3::ONE, 15.0, 1.0);

    visibility::cull_lights(&mut scene, &camera);

    assert_eq!(scene.visible_light_count(), 2);
    assert_eq!(scene.visible_lights[0].position, Vec3::new(0.0, 4.0, -20.0));
}

#[test]
fn draw_order_sorts_by_descending_priority() {
    let camera = test_camera();
    // Same radius, different distances: closest wins
    let mut scene = scene_with_cubes(&[
        ("mid", Vec3::new(0.0, 4.0, -40.0)),
        ("near", Vec3::new(0.0, 4.0, -5.0)),
        ("far", Vec3::new(0.0, 4.0, -90.0)),
    ]);

    visibility::build_draw_order(&mut scene, &camera);

    let order: Vec<&str> = scene
        .ordered_meshes
        .iter()
        .map(|entry| entry.model.as_str())
        .collect();
    assert_eq!(order, vec!["near", "mid", "far"]);

    let priorities: Vec<f32> = scene.ordered_meshes.iter().map(|e| e.priority).collect();
    assert!(priorities.windows(2).all(|pair| pair[0] >= pair[1]));

    // The no-cull path marks everything visible
    assert_eq!(scene.visible_meshes, 3);
    for instance in scene.static_models.values() {
        assert_eq!(instance.visible_count(), 1);
    }
}

#[test]
fn draw_order_clamps_zero_distance() {
    let mut camera = Camera::new();
    camera.position = Vec3::ZERO;
    camera.initialize(1280.0, 720.0).unwrap();
    camera.update();

    let mut scene = scene_with_cubes(&[("here", Vec3::ZERO)]);
    visibility::build_draw_order(&mut scene, &camera);

    let priority = scene.ordered_meshes[0].priority;
    assert!(priority.is_finite());
    // Clamped distance of 0.01 puts the priority at radius / 0.01
    let radius = Mesh::cube(1.0).bounds().radius();
    assert!((priority - radius / 0.01).abs() < 1e-2);
}
