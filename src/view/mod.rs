// VIEW: GPU setup and rendering
pub mod gpu_init;
pub mod mesh;
pub mod render;
pub mod texture;

pub use gpu_init::GpuContext;
pub use mesh::{Mesh, MeshBuffer, Vertex};
pub use render::RenderState;
pub use texture::GpuTexture;
