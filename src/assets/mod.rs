// Texture and model loading
pub mod gltf_model;
pub mod loader;
pub mod texture;

pub use gltf_model::{RiggedModel, SkinnedMeshData, SkinnedVertex};
pub use loader::{load_grass_textures, spawn_model_load, AssetLoad};
pub use texture::{GrassTextures, SamplerSettings, TextureData};
