use crate::error::{AssetError, AssetResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Wrapping {
    Repeat,
    ClampToEdge,
}

impl Wrapping {
    pub fn address_mode(self) -> wgpu::AddressMode {
        match self {
            Wrapping::Repeat => wgpu::AddressMode::Repeat,
            Wrapping::ClampToEdge => wgpu::AddressMode::ClampToEdge,
        }
    }
}

/// How a texture is addressed: wrap mode per axis and the uv repeat factor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SamplerSettings {
    pub wrap_u: Wrapping,
    pub wrap_v: Wrapping,
    pub repeat: [f32; 2],
}

impl SamplerSettings {
    pub fn tiled(repeat: [f32; 2]) -> Self {
        Self { wrap_u: Wrapping::Repeat, wrap_v: Wrapping::Repeat, repeat }
    }

    pub fn clamped() -> Self {
        Self { wrap_u: Wrapping::ClampToEdge, wrap_v: Wrapping::ClampToEdge, repeat: [1.0, 1.0] }
    }
}

/// Decoded RGBA8 image ready for upload.
#[derive(Debug, Clone)]
pub struct TextureData {
    pub name: String,
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
    /// Color data is sampled as sRGB, data maps (normal, roughness, ...) linearly.
    pub srgb: bool,
    pub sampler: SamplerSettings,
}

impl TextureData {
    pub fn decode(name: &str, bytes: &[u8], srgb: bool) -> AssetResult<Self> {
        let img = image::load_from_memory(bytes)
            .map_err(|source| AssetError::Image { name: name.to_string(), source })?
            .to_rgba8();
        let (width, height) = img.dimensions();
        tracing::debug!("decoded {} ({}x{})", name, width, height);
        Ok(Self {
            name: name.to_string(),
            width,
            height,
            rgba: img.into_raw(),
            srgb,
            sampler: SamplerSettings::clamped(),
        })
    }

    /// 1x1 texture of a single color.
    pub fn solid(name: &str, rgba: [u8; 4], srgb: bool) -> Self {
        Self {
            name: name.to_string(),
            width: 1,
            height: 1,
            rgba: rgba.to_vec(),
            srgb,
            sampler: SamplerSettings::clamped(),
        }
    }

    pub fn with_sampler(mut self, sampler: SamplerSettings) -> Self {
        self.sampler = sampler;
        self
    }
}

/// The five maps of the grass floor material.
#[derive(Debug, Clone)]
pub struct GrassTextures {
    pub color: TextureData,
    pub ambient_occlusion: TextureData,
    pub normal: TextureData,
    pub roughness: TextureData,
    pub height: TextureData,
}

impl GrassTextures {
    /// Color, ambient occlusion, normal and roughness tile by `repeat`;
    /// the height map is left untiled.
    pub fn new(
        color: TextureData,
        ambient_occlusion: TextureData,
        normal: TextureData,
        roughness: TextureData,
        height: TextureData,
        repeat: [f32; 2],
    ) -> Self {
        let tiled = SamplerSettings::tiled(repeat);
        Self {
            color: color.with_sampler(tiled),
            ambient_occlusion: ambient_occlusion.with_sampler(tiled),
            normal: normal.with_sampler(tiled),
            roughness: roughness.with_sampler(tiled),
            height,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn png_bytes(w: u32, h: u32) -> Vec<u8> {
        let img = image::RgbaImage::from_pixel(w, h, image::Rgba([10, 200, 30, 255]));
        let mut out = std::io::Cursor::new(Vec::new());
        img.write_to(&mut out, image::ImageFormat::Png).unwrap();
        out.into_inner()
    }

    #[test]
    fn test_decode_png() {
        let tex = TextureData::decode("grass", &png_bytes(4, 2), true).unwrap();
        assert_eq!((tex.width, tex.height), (4, 2));
        assert_eq!(tex.rgba.len(), 4 * 2 * 4);
        assert_eq!(&tex.rgba[..4], &[10, 200, 30, 255]);
    }

    #[test]
    fn test_decode_garbage_is_an_error() {
        let err = TextureData::decode("broken", b"not an image", false).unwrap_err();
        assert!(matches!(err, AssetError::Image { .. }));
    }

    #[test]
    fn test_grass_maps_tile_except_height() {
        let t = |n| TextureData::solid(n, [255; 4], false);
        let grass = GrassTextures::new(t("c"), t("ao"), t("n"), t("r"), t("h"), [3.0, 3.0]);
        for map in [&grass.color, &grass.ambient_occlusion, &grass.normal, &grass.roughness] {
            assert_eq!(map.sampler, SamplerSettings::tiled([3.0, 3.0]));
            assert_eq!(map.sampler.wrap_u.address_mode(), wgpu::AddressMode::Repeat);
            assert_eq!(map.sampler.wrap_v.address_mode(), wgpu::AddressMode::Repeat);
        }
        assert_eq!(grass.height.sampler.repeat, [1.0, 1.0]);
    }
}
