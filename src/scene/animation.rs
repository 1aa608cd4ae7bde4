//! Skeletal animation playback
//!
//! The three-stage pipeline for skinned meshes: clip keyframes drive bone
//! transforms, bones compose with their parents into world transforms, and
//! the inverse bind pose turns those into skin matrices for the shader.

use crate::content::model::{AnimationClip, SkinningData};
use glam::Mat4;

/// Plays back one clip of a skinned model
#[derive(Debug, Clone)]
pub struct AnimationPlayer {
    skinning: SkinningData,
    clip_name: String,
    time: f32,
    keyframe_cursor: usize,

    bone_transforms: Vec<Mat4>,
    world_transforms: Vec<Mat4>,
    skin_transforms: Vec<Mat4>,
}

impl AnimationPlayer {
    /// Create a player for skinning data and start its first clip
    pub fn new(skinning: SkinningData) -> Self {
        let bones = skinning.bone_count();
        let clip_name = skinning
            .first_clip()
            .map(|(name, _)| name.clone())
            .unwrap_or_default();

        let mut player = Self {
            bone_transforms: skinning.bind_pose.clone(),
            world_transforms: vec![Mat4::IDENTITY; bones],
            skin_transforms: vec![Mat4::IDENTITY; bones],
            skinning,
            clip_name,
            time: 0.0,
            keyframe_cursor: 0,
        };
        player.rewind();
        player
    }

    /// Switch to a named clip from the start; unknown names keep the current
    /// clip
    pub fn start_clip(&mut self, name: &str) -> bool {
        if self.skinning.clips.contains_key(name) {
            self.clip_name = name.to_string();
            self.rewind();
            true
        } else {
            false
        }
    }

    pub fn current_clip(&self) -> &str {
        &self.clip_name
    }

    pub fn time(&self) -> f32 {
        self.time
    }

    fn clip(&self) -> Option<&AnimationClip> {
        self.skinning.clips.get(&self.clip_name)
    }

    fn rewind(&mut self) {
        self.time = 0.0;
        self.keyframe_cursor = 0;
        self.bone_transforms.copy_from_slice(&self.skinning.bind_pose);
    }

    /// Advance playback and rebuild the skin matrices
    pub fn update(&mut self, delta_seconds: f32, looped: bool, root: Mat4) {
        self.advance_bone_transforms(delta_seconds, looped);
        self.update_world_transforms(root);
        self.update_skin_transforms();
    }

    fn advance_bone_transforms(&mut self, delta_seconds: f32, looped: bool) {
        let Some(clip) = self.clip() else {
            return;
        };
        let duration = clip.duration;
        let mut time = self.time + delta_seconds;

        if time >= duration {
            if looped && duration > 0.0 {
                time %= duration;
            } else {
                time = duration;
            }
        }

        // A wrap (or rewind) restarts the keyframe scan from the bind pose
        if time < self.time {
            self.keyframe_cursor = 0;
            self.bone_transforms.copy_from_slice(&self.skinning.bind_pose);
        }
        self.time = time;

        let Some(clip) = self.skinning.clips.get(&self.clip_name) else {
            return;
        };
        while self.keyframe_cursor < clip.keyframes.len() {
            let keyframe = clip.keyframes[self.keyframe_cursor];
            if keyframe.time > self.time {
                break;
            }
            if keyframe.bone < self.bone_transforms.len() {
                self.bone_transforms[keyframe.bone] = keyframe.transform;
            }
            self.keyframe_cursor += 1;
        }
    }

    fn update_world_transforms(&mut self, root: Mat4) {
        for bone in 0..self.bone_transforms.len() {
            match self.skinning.skeleton_hierarchy[bone] {
                None => {
                    self.world_transforms[bone] = root * self.bone_transforms[bone];
                }
                Some(parent) => {
                    // Parents precede children in the skeleton ordering
                    self.world_transforms[bone] =
                        self.world_transforms[parent] * self.bone_transforms[bone];
                }
            }
        }
    }

    fn update_skin_transforms(&mut self) {
        for bone in 0..self.bone_transforms.len() {
            self.skin_transforms[bone] =
                self.world_transforms[bone] * self.skinning.inverse_bind_pose[bone];
        }
    }

    /// Skin matrices for the bone array shader parameter
    pub fn skin_transforms(&self) -> &[Mat4] {
        &self.skin_transforms
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::model::Keyframe;
    use glam::Vec3;
    use std::collections::BTreeMap;

    fn two_bone_skinning() -> SkinningData {
        let mut clips = BTreeMap::new();
        clips.insert(
            "walk".to_string(),
            AnimationClip {
                duration: 1.0,
                keyframes: vec![
                    Keyframe {
                        bone: 0,
                        time: 0.5,
                        transform: Mat4::from_translation(Vec3::X),
                    },
                    Keyframe {
                        bone: 1,
                        time: 0.75,
                        transform: Mat4::from_translation(Vec3::Y),
                    },
                ],
            },
        );
        SkinningData {
            bind_pose: vec![Mat4::IDENTITY; 2],
            inverse_bind_pose: vec![Mat4::IDENTITY; 2],
            skeleton_hierarchy: vec![None, Some(0)],
            clips,
        }
    }

    #[test]
    fn keyframes_apply_in_time_order() {
        let mut player = AnimationPlayer::new(two_bone_skinning());
        player.update(0.6, true, Mat4::IDENTITY);

        // First keyframe passed, second not yet
        let root = player.skin_transforms()[0];
        assert_eq!(root.w_axis.truncate(), Vec3::X);

        player.update(0.2, true, Mat4::IDENTITY);
        // Child composes with its parent's world transform
        let child = player.skin_transforms()[1];
        assert_eq!(child.w_axis.truncate(), Vec3::X + Vec3::Y);
    }

    #[test]
    fn looping_wraps_back_to_bind_pose() {
        let mut player = AnimationPlayer::new(two_bone_skinning());
        player.update(0.9, true, Mat4::IDENTITY);
        player.update(0.2, true, Mat4::IDENTITY);
        // Wrapped to t=0.1: no keyframe fired yet this cycle
        assert_eq!(player.skin_transforms()[0], Mat4::IDENTITY);
        assert!(player.time() < 0.2);
    }
}
