//! Frustum-based visibility culling and draw ordering

use crate::scene::camera::Camera;
use crate::scene::frustum::Containment;
use crate::scene::model::ModelInstance;
use crate::scene::{OrderedMesh, Scene};
use glam::{Mat4, Vec2};
use std::collections::BTreeMap;

/// Minimum camera distance for priority scoring
const MIN_PRIORITY_DISTANCE: f32 = 0.01;

/// Cull every registered model's meshes against the camera frustum.
///
/// Refreshes each instance's world bounds and visible-mesh set, projects
/// mesh centers to screen space, and updates the scene's visible/culled
/// counters.
pub fn cull_model_meshes(scene: &mut Scene, camera: &Camera) {
    scene.visible_meshes = 0;
    scene.culled_meshes = 0;

    let mut visible = 0;
    let mut culled = 0;
    let view_projection = camera.view_projection();

    for registry in [
        &mut scene.static_models,
        &mut scene.skinned_models,
        &mut scene.blend_models,
    ] {
        for instance in registry.values_mut() {
            cull_instance(instance, camera, view_projection, &mut visible, &mut culled);
        }
    }

    scene.visible_meshes = visible;
    scene.culled_meshes = culled;
}

fn cull_instance(
    instance: &mut ModelInstance,
    camera: &Camera,
    view_projection: Mat4,
    visible: &mut u32,
    culled: &mut u32,
) {
    instance.clear_visible();
    let transform = instance.transform();

    for mesh_index in 0..instance.mesh_count() {
        let bounds = instance.model.meshes[mesh_index]
            .bounds
            .transformed(transform);
        instance.set_world_bounds(mesh_index, bounds);

        if camera.frustum().contains_box(&bounds) != Containment::Disjoint {
            instance.mark_visible(mesh_index);
            *visible += 1;
        } else {
            *culled += 1;
        }

        // Screen-space position of the mesh center via homogeneous divide
        let clip = view_projection * bounds.center().extend(1.0);
        let w = if clip.w.abs() < f32::EPSILON { f32::EPSILON } else { clip.w };
        instance.set_screen_position(
            mesh_index,
            Vec2::new((clip.x / w + 1.0) / 2.0, (-clip.y / w + 1.0) / 2.0),
        );
    }
}

/// Rebuild the visible point-light list with a frustum-vs-sphere test.
///
/// The sphere is derived from each light's packed instance transform:
/// position from the translation column, radius from the scale column.
pub fn cull_lights(scene: &mut Scene, camera: &Camera) {
    scene.visible_lights.clear();

    for light in &scene.point_lights {
        let center = light.instance_position();
        let radius = light.instance_radius();

        if camera.frustum().contains_sphere(center, radius) != Containment::Disjoint {
            scene.visible_lights.push(*light);
        }
    }
}

/// Clear all visibility results without re-culling
pub fn cull_all_models(scene: &mut Scene) {
    scene.visible_meshes = 0;
    scene.culled_meshes = 0;

    for registry in [
        &mut scene.static_models,
        &mut scene.skinned_models,
        &mut scene.blend_models,
    ] {
        for instance in registry.values_mut() {
            instance.clear_visible();
        }
    }
}

/// The no-cull path: mark every static and skinned mesh visible and rebuild
/// the priority-ordered draw list, largest screen contribution first.
///
/// Priority is `bounding_radius * scale / distance_to_camera`, with the
/// distance clamped away from zero. The sort is stable and descending; the
/// order decides which meshes get shadow-map tiles under the per-frame
/// budget.
pub fn build_draw_order(scene: &mut Scene, camera: &Camera) {
    scene.visible_meshes = 0;
    scene.culled_meshes = 0;
    scene.ordered_meshes.clear();

    let mut visible = 0;
    order_registry(&mut scene.static_models, camera, &mut scene.ordered_meshes, &mut visible);
    order_registry(&mut scene.skinned_models, camera, &mut scene.ordered_meshes, &mut visible);
    scene.visible_meshes = visible;

    scene
        .ordered_meshes
        .sort_by(|a, b| b.priority.total_cmp(&a.priority));
}

fn order_registry(
    registry: &mut BTreeMap<String, ModelInstance>,
    camera: &Camera,
    ordered: &mut Vec<OrderedMesh>,
    visible: &mut u32,
) {
    for (name, instance) in registry.iter_mut() {
        instance.clear_visible();
        let scale = instance.scaling().x;

        for mesh_index in 0..instance.mesh_count() {
            let radius = instance.model.meshes[mesh_index].bound_radius() * scale;
            let center = instance.model.meshes[mesh_index].bounds.center() + instance.position();
            let distance = camera
                .position
                .distance(center)
                .max(MIN_PRIORITY_DISTANCE);

            ordered.push(OrderedMesh {
                model: name.clone(),
                mesh: mesh_index,
                priority: radius / distance,
            });

            instance.mark_visible(mesh_index);
            *visible += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn priorities_sort_descending() {
        let mut ordered = vec![
            OrderedMesh { model: "a".into(), mesh: 0, priority: 0.5 },
            OrderedMesh { model: "b".into(), mesh: 0, priority: 2.0 },
            OrderedMesh { model: "c".into(), mesh: 0, priority: 1.0 },
        ];
        ordered.sort_by(|a, b| b.priority.total_cmp(&a.priority));
        let priorities: Vec<f32> = ordered.iter().map(|m| m.priority).collect();
        assert_eq!(priorities, vec![2.0, 1.0, 0.5]);
    }
}
