use deferred_engine::backend::{Command, HeadlessBackend, RecordedParam};
use deferred_engine::backend::types::{CullMode, RasterizerState};
use deferred_engine::content::{ContentLoader, Mesh, ProceduralContent};
use deferred_engine::passes::CompositePass;
use deferred_engine::profile::{
    PassBuilder, PassRegistry, RenderContext, RenderError, RenderPass, RenderProfile, TargetArena,
};
use deferred_engine::profiles::{DeferredProfile, LightPrePassProfile};
use deferred_engine::scene::{Camera, Scene};
use deferred_engine::stats::RenderStats;
use deferred_engine::ProfileConfig;
use glam::Vec3;

fn test_camera() -> Camera {
    let mut camera = Camera::new();
    camera.initialize(1280.0, 720.0).unwrap();
    camera.update();
    camera
}

/// Ground plane, one cube, a shadow-casting sun, and one light on each side
/// of the near-plane classification boundary.
fn test_scene(backend: &mut HeadlessBackend, content: &ProceduralContent) -> Scene {
    let mut scene = Scene::new();

    let ground = content.load_model(backend, "ground").unwrap();
    scene.add_model("ground", ground).unwrap();

    let cube = content.load_model(backend, "cube").unwrap();
    scene
        .add_model("crate", cube)
        .unwrap()
        .translate(Vec3::new(0.0, 4.0, -15.0))
        .scale(2.0)
        .update_matrix();

    let skybox = content.load_model(backend, "skybox").unwrap();
    scene.set_skybox(skybox);

    scene
        .add_directional_light(Vec3::new(-0.4, -1.0, -0.2).normalize(), Vec3::ONE)
        .casts_shadows = true;

    // Camera sits inside this one: inner group
    scene.add_point_light(Vec3::new(0.0, 4.0, 0.0), Vec3::new(1.0, 0.5, 0.2), 10.0, 2.0);
    // Fully past the near plane: outer group
    scene.add_point_light(Vec3::new(0.0, 4.0, -30.0), Vec3::new(0.2, 0.5, 1.0), 5.0, 2.0);

    scene
}

#[test]
fn deferred_profile_draws_and_produces_an_output() {
    let mut backend = HeadlessBackend::new();
    let content = ProceduralContent::with_standard_meshes();
    let mut scene = test_scene(&mut backend, &content);
    let camera = test_camera();

    let mut profile =
        DeferredProfile::new(&mut backend, &content, ProfileConfig::default()).unwrap();
    assert!(profile.output().is_none());

    profile.draw(&mut backend, &mut scene, &camera, 1.0 / 60.0).unwrap();

    assert!(profile.output().is_some());
    assert_eq!(profile.debug_targets().len(), 4);
    assert!(scene.draw_calls > 0);

    // Every pass reported a timing, in execution order
    let passes: Vec<&str> = profile.stats().pass_times.iter().map(|(name, _)| *name).collect();
    assert_eq!(
        passes,
        vec!["gbuffer", "light", "ssao", "composite", "antialias", "bloom"]
    );
}

#[test]
fn shadow_tiles_use_the_atlas_layout() {
    let mut backend = HeadlessBackend::new();
    let content = ProceduralContent::with_standard_meshes();
    let mut scene = test_scene(&mut backend, &content);
    let camera = test_camera();

    let mut profile =
        DeferredProfile::new(&mut backend, &content, ProfileConfig::default()).unwrap();
    backend.clear_commands();
    profile.draw(&mut backend, &mut scene, &camera, 1.0 / 60.0).unwrap();

    // Two shadowed meshes (ground + crate): tiles (0,0) and (0,1)
    let tile_viewports: Vec<(f32, f32)> = backend
        .commands()
        .iter()
        .filter_map(|command| match command {
            Command::SetViewport(vp) if vp.width == 384.0 && vp.height == 384.0 => {
                Some((vp.x, vp.y))
            }
            _ => None,
        })
        .collect();

    assert_eq!(tile_viewports, vec![(0.0, 0.0), (384.0, 0.0)]);
    assert_eq!(profile.stats().shadow_meshes_dropped, 0);
}

#[test]
fn shadow_budget_drops_meshes_past_the_cap() {
    let mut backend = HeadlessBackend::new();
    let content = ProceduralContent::with_standard_meshes();
    content
        .register_model("forest", vec![Mesh::cube(1.0); 70])
        .unwrap();

    let mut scene = Scene::new();
    let forest = content.load_model(&mut backend, "forest").unwrap();
    scene
        .add_model("forest", forest)
        .unwrap()
        .translate(Vec3::new(0.0, 4.0, -20.0))
        .update_matrix();
    scene
        .add_directional_light(Vec3::new(0.0, -1.0, 0.0), Vec3::ONE)
        .casts_shadows = true;

    let camera = test_camera();
    let mut profile =
        DeferredProfile::new(&mut backend, &content, ProfileConfig::default()).unwrap();
    backend.clear_commands();
    profile.draw(&mut backend, &mut scene, &camera, 1.0 / 60.0).unwrap();

    let tile_viewports: Vec<(f32, f32)> = backend
        .commands()
        .iter()
        .filter_map(|command| match command {
            Command::SetViewport(vp) if vp.width == 384.0 && vp.height == 384.0 => {
                Some((vp.x, vp.y))
            }
            _ => None,
        })
        .collect();

    // Capped at the 8x8 atlas; the 65th mesh gets no tile
    assert_eq!(tile_viewports.len(), 64);
    assert_eq!(tile_viewports[63], (7.0 * 384.0, 7.0 * 384.0));
    assert_eq!(profile.stats().shadow_meshes_dropped, 6);
}

#[test]
fn point_light_groups_draw_with_opposite_cull_modes() {
    let mut backend = HeadlessBackend::new();
    let content = ProceduralContent::with_standard_meshes();
    let mut scene = test_scene(&mut backend, &content);
    let camera = test_camera();

    let mut profile =
        DeferredProfile::new(&mut backend, &content, ProfileConfig::default()).unwrap();
    backend.clear_commands();
    profile.draw(&mut backend, &mut scene, &camera, 1.0 / 60.0).unwrap();

    // One light per group: two instanced draws of one instance each, the
    // clockwise-culled (inner) group first
    let mut instanced = Vec::new();
    let mut last_cull = None;
    for command in backend.commands() {
        match command {
            Command::SetRasterizerState(RasterizerState { cull_mode, .. }) => {
                last_cull = Some(*cull_mode);
            }
            Command::DrawIndexedInstanced { instance_count, .. } => {
                instanced.push((last_cull, *instance_count));
            }
            _ => {}
        }
    }

    assert_eq!(
        instanced,
        vec![
            (Some(CullMode::Clockwise), 1),
            (Some(CullMode::CounterClockwise), 1),
        ]
    );
}

#[test]
fn map_inputs_is_idempotent() {
    let mut backend = HeadlessBackend::new();
    let content = ProceduralContent::with_standard_meshes();
    let mut scene = test_scene(&mut backend, &content);
    let camera = test_camera();

    let mut profile =
        DeferredProfile::new(&mut backend, &content, ProfileConfig::default()).unwrap();

    let first: Vec<_> = profile.debug_targets().to_vec();
    profile.map_inputs();
    profile.map_inputs();
    assert_eq!(profile.debug_targets(), first.as_slice());

    // Re-wiring between frames changes nothing about execution
    profile.draw(&mut backend, &mut scene, &camera, 1.0 / 60.0).unwrap();
    let output = profile.output();
    profile.map_inputs();
    profile.draw(&mut backend, &mut scene, &camera, 1.0 / 60.0).unwrap();
    assert_eq!(profile.output(), output);
}

#[test]
fn pass_inputs_replace_rather_than_accumulate() {
    let mut backend = HeadlessBackend::new();
    let content = ProceduralContent::with_standard_meshes();
    let config = ProfileConfig::default();
    let mut arena = TargetArena::new();
    let mut builder = PassBuilder::new(&mut backend, &content, &mut arena, &config);

    let mut pass = CompositePass::new(&mut builder).unwrap();
    let target = pass.outputs()[0];

    pass.set_inputs(&[target, target, target]);
    pass.set_inputs(&[target, target, target]);
    assert_eq!(pass.inputs().len(), 3);
}

#[test]
fn unwired_pass_fails_fast_at_draw() {
    let mut backend = HeadlessBackend::new();
    let content = ProceduralContent::with_standard_meshes();
    let config = ProfileConfig::default();
    let mut arena = TargetArena::new();
    let mut builder = PassBuilder::new(&mut backend, &content, &mut arena, &config);
    let mut pass = CompositePass::new(&mut builder).unwrap();

    let mut scene = Scene::new();
    let camera = test_camera();
    let mut stats = RenderStats::new();
    let mut ctx = RenderContext {
        backend: &mut backend,
        targets: &arena,
        scene: &mut scene,
        camera: &camera,
        stats: &mut stats,
        delta_seconds: 1.0 / 60.0,
    };

    match pass.draw(&mut ctx) {
        Err(RenderError::MissingInput { pass, required, wired }) => {
            assert_eq!(pass, "composite");
            assert_eq!(required, 3);
            assert_eq!(wired, 0);
        }
        other => panic!("expected MissingInput, got {other:?}"),
    }
}

#[test]
fn unknown_pass_name_is_a_registry_error() {
    let mut backend = HeadlessBackend::new();
    let content = ProceduralContent::with_standard_meshes();
    let config = ProfileConfig::default();
    let mut arena = TargetArena::new();
    let mut builder = PassBuilder::new(&mut backend, &content, &mut arena, &config);

    let registry = PassRegistry::with_builtin_passes();
    assert!(registry.contains("light"));
    assert!(matches!(
        registry.create("volumetric_fog", &mut builder),
        Err(RenderError::UnknownPass(name)) if name == "volumetric_fog"
    ));
}

#[test]
fn light_prepass_profile_runs_the_factory_route() {
    let mut backend = HeadlessBackend::new();
    let content = ProceduralContent::with_standard_meshes();
    let mut scene = test_scene(&mut backend, &content);
    let camera = test_camera();

    let mut profile =
        LightPrePassProfile::new(&mut backend, &content, ProfileConfig::default()).unwrap();
    profile.draw(&mut backend, &mut scene, &camera, 1.0 / 60.0).unwrap();

    assert!(profile.output().is_some());
    let passes: Vec<&str> = profile.stats().pass_times.iter().map(|(name, _)| *name).collect();
    assert_eq!(
        passes,
        vec!["forward", "small_gbuffer", "light", "ssao", "composite", "antialias", "bloom"]
    );
}

#[test]
fn shadow_batches_flush_in_groups_of_twelve() {
    let mut backend = HeadlessBackend::new();
    let content = ProceduralContent::with_standard_meshes();
    content
        .register_model("village", vec![Mesh::cube(1.0); 30])
        .unwrap();

    let mut scene = Scene::new();
    let village = content.load_model(&mut backend, "village").unwrap();
    scene
        .add_model("village", village)
        .unwrap()
        .translate(Vec3::new(0.0, 4.0, -20.0))
        .update_matrix();
    scene
        .add_directional_light(Vec3::new(0.0, -1.0, 0.0), Vec3::ONE)
        .casts_shadows = true;

    let camera = test_camera();
    let mut profile =
        DeferredProfile::new(&mut backend, &content, ProfileConfig::default()).unwrap();
    backend.clear_commands();
    profile.draw(&mut backend, &mut scene, &camera, 1.0 / 60.0).unwrap();

    // 30 meshes flush as 12 + 12 + 6
    let batch_sizes: Vec<usize> = backend
        .commands()
        .iter()
        .filter_map(|command| match command {
            Command::SetParam { name, value, .. } if name == "lightViewProj" => {
                match value {
                    RecordedParam::Mat4Array(matrices) => Some(matrices.len()),
                    _ => None,
                }
            }
            _ => None,
        })
        .collect();

    assert_eq!(batch_sizes, vec![12, 12, 6]);
}

#[test]
fn dispose_destroys_every_profile_target() {
    let mut backend = HeadlessBackend::new();
    let content = ProceduralContent::with_standard_meshes();

    let mut profile =
        DeferredProfile::new(&mut backend, &content, ProfileConfig::default()).unwrap();
    assert!(backend.live_target_count() > 0);

    profile.dispose(&mut backend);
    assert_eq!(backend.live_target_count(), 0);
    assert!(profile.output().is_none());
}
