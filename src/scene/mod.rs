//! Scene management
//!
//! The scene is a set of name-keyed model registries plus the lights, with
//! the per-frame culling results the renderer reads. Registries own their
//! instances exclusively; names are unique and duplicates are a fatal
//! configuration error.

pub mod animation;
pub mod bounds;
pub mod camera;
pub mod frustum;
pub mod light;
pub mod model;
pub mod visibility;

pub use animation::AnimationPlayer;
pub use bounds::BoundingBox;
pub use camera::{Camera, ChaseCamera, DragCamera, FreeCamera};
pub use frustum::{Containment, Frustum, Plane, PlaneIntersection};
pub use light::{DirectionalLight, PointLight, PointLightInstance};
pub use model::ModelInstance;

use crate::content::model::Model;
use glam::Vec3;
use std::collections::BTreeMap;
use thiserror::Error;

/// Scene configuration error type
#[derive(Error, Debug)]
pub enum SceneError {
    #[error("a model named '{0}' is already registered")]
    DuplicateModel(String),
    #[error("model '{0}' has no skinning data")]
    MissingSkinningData(String),
    #[error("viewport dimensions must be positive, got {width}x{height}")]
    InvalidViewport { width: f32, height: f32 },
}

/// One entry of the priority-ordered draw list
#[derive(Debug, Clone)]
pub struct OrderedMesh {
    pub model: String,
    pub mesh: usize,
    pub priority: f32,
}

/// The scene: model registries, lights, and per-frame culling results
#[derive(Default)]
pub struct Scene {
    pub static_models: BTreeMap<String, ModelInstance>,
    pub skinned_models: BTreeMap<String, ModelInstance>,
    pub blend_models: BTreeMap<String, ModelInstance>,
    skybox: Option<ModelInstance>,

    pub directional_lights: Vec<DirectionalLight>,
    pub point_lights: Vec<PointLight>,

    /// Point lights that survived culling this frame
    pub visible_lights: Vec<PointLight>,
    /// Priority-sorted draw order, rebuilt by the culler
    pub ordered_meshes: Vec<OrderedMesh>,

    pub ambient_light: f32,
    pub debug: bool,

    // Frame counters for HUD display
    pub visible_meshes: u32,
    pub culled_meshes: u32,
    pub draw_calls: u32,
    pub total_polys: u32,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a static model under a unique name
    pub fn add_model(
        &mut self,
        name: &str,
        model: Model,
    ) -> Result<&mut ModelInstance, SceneError> {
        Self::insert(&mut self.static_models, name, ModelInstance::new(model))
    }

    /// Add a skinned model; requires skinning data, and starts its first clip
    pub fn add_skinned_model(
        &mut self,
        name: &str,
        model: Model,
    ) -> Result<&mut ModelInstance, SceneError> {
        if model.skinning.is_none() {
            return Err(SceneError::MissingSkinningData(name.to_string()));
        }
        Self::insert(&mut self.skinned_models, name, ModelInstance::new(model))
    }

    /// Add a model drawn with alpha blending
    pub fn add_blend_model(
        &mut self,
        name: &str,
        model: Model,
    ) -> Result<&mut ModelInstance, SceneError> {
        Self::insert(&mut self.blend_models, name, ModelInstance::new(model))
    }

    fn insert<'a>(
        registry: &'a mut BTreeMap<String, ModelInstance>,
        name: &str,
        instance: ModelInstance,
    ) -> Result<&'a mut ModelInstance, SceneError> {
        if registry.contains_key(name) {
            return Err(SceneError::DuplicateModel(name.to_string()));
        }
        Ok(registry.entry(name.to_string()).or_insert(instance))
    }

    /// Install the skybox model, replacing any previous one
    pub fn set_skybox(&mut self, model: Model) -> &mut ModelInstance {
        self.skybox.insert(ModelInstance::new(model))
    }

    pub fn skybox(&self) -> Option<&ModelInstance> {
        self.skybox.as_ref()
    }

    pub fn skybox_mut(&mut self) -> Option<&mut ModelInstance> {
        self.skybox.as_mut()
    }

    /// Add a point light and return a reference to it
    pub fn add_point_light(
        &mut self,
        position: Vec3,
        color: Vec3,
        radius: f32,
        intensity: f32,
    ) -> &mut PointLight {
        self.point_lights
            .push(PointLight::new(position, color, radius, intensity));
        let index = self.point_lights.len() - 1;
        &mut self.point_lights[index]
    }

    pub fn add_directional_light(&mut self, direction: Vec3, color: Vec3) -> &mut DirectionalLight {
        self.directional_lights
            .push(DirectionalLight::new(direction, color));
        let index = self.directional_lights.len() - 1;
        &mut self.directional_lights[index]
    }

    /// Look up a model instance in the static, then skinned registries
    pub fn model(&self, key: &str) -> Option<&ModelInstance> {
        self.static_models
            .get(key)
            .or_else(|| self.skinned_models.get(key))
    }

    pub fn model_mut(&mut self, key: &str) -> Option<&mut ModelInstance> {
        if self.static_models.contains_key(key) {
            self.static_models.get_mut(key)
        } else {
            self.skinned_models.get_mut(key)
        }
    }

    pub fn total_meshes(&self) -> usize {
        self.static_models
            .values()
            .chain(self.skinned_models.values())
            .chain(self.blend_models.values())
            .map(ModelInstance::mesh_count)
            .sum()
    }

    pub fn visible_light_count(&self) -> usize {
        self.visible_lights.len()
    }

    /// Advance animation players and refresh skinned transforms
    pub fn update(&mut self, delta_seconds: f32) {
        self.draw_calls = 0;
        self.total_polys = 0;

        for instance in self.skinned_models.values_mut() {
            let root = instance.transform();
            if let Some(player) = instance.animation.as_mut() {
                player.update(delta_seconds, true, root);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::model::{Model, ModelMesh};

    fn empty_model() -> Model {
        Model {
            meshes: vec![ModelMesh {
                parts: Vec::new(),
                bounds: BoundingBox::default(),
            }],
            skinning: None,
        }
    }

    #[test]
    fn duplicate_model_names_are_rejected() {
        let mut scene = Scene::new();
        scene.add_model("tower", empty_model()).unwrap();
        assert!(matches!(
            scene.add_model("tower", empty_model()),
            Err(SceneError::DuplicateModel(name)) if name == "tower"
        ));
        // The original registration is untouched
        assert_eq!(scene.static_models.len(), 1);
    }

    #[test]
    fn skinned_model_requires_skinning_data() {
        let mut scene = Scene::new();
        assert!(matches!(
            scene.add_skinned_model("walker", empty_model()),
            Err(SceneError::MissingSkinningData(_))
        ));
    }
}
