use glam::{EulerRot, Mat4, Vec3};

use crate::assets::gltf_model::{RiggedModel, SkinnedMeshData};
use crate::assets::texture::TextureData;
use crate::config::DemoConfig;
use crate::model::animation::AnimationMixer;
use crate::model::camera::Camera;
use crate::model::playback::PlaybackSelector;
use crate::model::ready::ReadyOnce;
use crate::model::rig::{Pose, Rig};

/// The grass sphere. Only `rotation_x` changes after setup.
#[derive(Debug, Clone)]
pub struct Floor {
    pub radius: f32,
    pub rotation_x: f64,
    pub rotation_z: f32,
}

impl Floor {
    /// Euler XYZ, matching the order the rotations are authored in.
    pub fn model_matrix(&self) -> Mat4 {
        Mat4::from_euler(EulerRot::XYZ, self.rotation_x as f32, 0.0, self.rotation_z)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct AmbientLight {
    pub color: [f32; 3],
    pub intensity: f32,
}

#[derive(Debug, Clone, Copy)]
pub struct DirectionalLight {
    pub color: [f32; 3],
    pub intensity: f32,
    pub position: Vec3,
}

impl DirectionalLight {
    /// Direction from the lit surface towards the light (light shines at the origin).
    pub fn direction_to_light(&self) -> Vec3 {
        self.position.try_normalize().unwrap_or(Vec3::Y)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Lights {
    pub ambient: AmbientLight,
    pub sun: DirectionalLight,
}

/// The fox once it has finished loading.
pub struct FoxModel {
    pub mesh: SkinnedMeshData,
    pub base_color: Option<TextureData>,
    pub transform: Mat4,
    rig: Rig,
    pose: Pose,
    mixer: AnimationMixer,
    palette: Vec<Mat4>,
    // last selector asked for, whether or not the model has that clip
    requested: PlaybackSelector,
}

impl FoxModel {
    pub fn new(model: RiggedModel, transform: Mat4, selector: PlaybackSelector) -> Self {
        let RiggedModel { mesh, rig, clips, base_color } = model;
        let mut mixer = AnimationMixer::new(clips);
        mixer.play(selector.clip_index());
        let pose = rig.rest_pose();

        let mut fox = Self {
            mesh,
            base_color,
            transform,
            rig,
            pose,
            mixer,
            palette: Vec::new(),
            requested: selector,
        };
        fox.refresh_pose();
        fox
    }

    /// Switch to the clip matching `selector` when the selection changes.
    /// A selector without a matching clip keeps the current clip playing.
    pub fn select(&mut self, selector: PlaybackSelector) -> bool {
        if selector == self.requested {
            return false;
        }
        self.requested = selector;
        self.mixer.play(selector.clip_index())
    }

    /// Advance playback by `delta` seconds and recompute the joint palette.
    pub fn advance(&mut self, delta: f64) {
        self.mixer.update(delta);
        self.refresh_pose();
    }

    fn refresh_pose(&mut self) {
        self.rig.reset_pose(&mut self.pose);
        self.mixer.apply(&mut self.pose);
        self.palette = self.rig.joint_palette(&self.pose);
    }

    pub fn mixer(&self) -> &AnimationMixer {
        &self.mixer
    }

    pub fn joint_palette(&self) -> &[Mat4] {
        &self.palette
    }
}

/// Everything the frame loop reads and writes.
pub struct SceneState {
    pub floor: Floor,
    pub lights: Lights,
    pub camera: Camera,
    pub playback: PlaybackSelector,
    pub model: ReadyOnce<FoxModel>,
    pub model_transform: Mat4,
}

impl SceneState {
    pub fn new(config: &DemoConfig, width: u32, height: u32) -> Self {
        Self {
            floor: Floor {
                radius: config.floor.radius,
                rotation_x: 0.0,
                rotation_z: config.floor.base_rotation_z,
            },
            lights: Lights {
                ambient: AmbientLight {
                    color: config.lights.ambient_color,
                    intensity: config.lights.ambient_intensity,
                },
                sun: DirectionalLight {
                    color: config.lights.sun_color,
                    intensity: config.lights.sun_intensity,
                    position: config.lights.sun_position,
                },
            },
            camera: Camera::new(&config.camera, width, height),
            playback: PlaybackSelector::default(),
            model: ReadyOnce::pending(),
            model_transform: Mat4::from_scale_rotation_translation(
                Vec3::splat(config.model.scale),
                glam::Quat::IDENTITY,
                config.model.position,
            ),
        }
    }
}
