use thiserror::Error;

/// Failures while reading or decoding textures and models.
#[derive(Debug, Error)]
pub enum AssetError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to fetch {url}: {reason}")]
    Fetch { url: String, reason: String },

    #[error("failed to decode image {name}: {source}")]
    Image {
        name: String,
        #[source]
        source: image::ImageError,
    },

    #[error("failed to parse glTF: {0}")]
    Gltf(#[from] gltf::Error),

    #[error("unsupported buffer uri `{0}` (only relative file uris and GLB blobs)")]
    UnsupportedUri(String),

    #[error("glTF buffer {0} was not loaded")]
    MissingBuffer(usize),

    #[error("glTF document has no skinned mesh")]
    NoSkinnedMesh,

    #[error("skinned primitive is missing the {0} attribute")]
    MissingAttribute(&'static str),

    #[error("asset loader went away before delivering a result")]
    ChannelClosed,
}

/// Failures while drawing a frame. None of them are recovered from.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("failed to acquire surface texture: {0}")]
    Surface(#[from] wgpu::SurfaceError),

    #[error("surface lost and could not be reacquired: {0}")]
    SurfaceLost(wgpu::SurfaceError),
}

/// A ready-once slot was resolved twice.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("value was already resolved")]
pub struct AlreadyResolved;

/// Startup failures of the demo.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("GPU init failed: {0}")]
    Gpu(String),

    #[error(transparent)]
    Asset(#[from] AssetError),

    #[error("page setup failed: {0}")]
    Page(String),
}

pub type AssetResult<T> = Result<T, AssetError>;
