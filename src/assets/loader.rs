use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};

use crate::assets::gltf_model::{load_rigged_model, RiggedModel};
use crate::assets::texture::{GrassTextures, TextureData};
use crate::config::{self, DemoConfig};
use crate::error::{AssetError, AssetResult};

/// Result of a background load, delivered at most once.
pub struct AssetLoad<T> {
    rx: Option<Receiver<AssetResult<T>>>,
}

pub fn asset_channel<T>() -> (Sender<AssetResult<T>>, AssetLoad<T>) {
    let (tx, rx) = mpsc::channel();
    (tx, AssetLoad { rx: Some(rx) })
}

impl<T> AssetLoad<T> {
    /// Non-blocking. Returns the result the first time it is available and
    /// `None` before and afterwards.
    pub fn poll(&mut self) -> Option<AssetResult<T>> {
        let rx = self.rx.as_ref()?;
        match rx.try_recv() {
            Ok(result) => {
                self.rx = None;
                Some(result)
            }
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => {
                self.rx = None;
                Some(Err(AssetError::ChannelClosed))
            }
        }
    }

    pub fn is_finished(&self) -> bool {
        self.rx.is_none()
    }
}

#[cfg(not(target_arch = "wasm32"))]
pub async fn load_bytes(path: &str) -> AssetResult<Vec<u8>> {
    std::fs::read(path).map_err(|source| AssetError::Io { path: path.to_string(), source })
}

#[cfg(target_arch = "wasm32")]
pub async fn load_bytes(url: &str) -> AssetResult<Vec<u8>> {
    use wasm_bindgen::JsCast;
    use wasm_bindgen_futures::JsFuture;

    let fetch_err = |reason: String| AssetError::Fetch { url: url.to_string(), reason };

    let window = web_sys::window().ok_or_else(|| fetch_err("no global `window`".into()))?;
    let response = JsFuture::from(window.fetch_with_str(url))
        .await
        .map_err(|e| fetch_err(format!("{e:?}")))?
        .dyn_into::<web_sys::Response>()
        .map_err(|_| fetch_err("fetch did not return a Response".into()))?;
    if !response.ok() {
        return Err(fetch_err(format!("HTTP {}", response.status())));
    }
    let buffer = JsFuture::from(response.array_buffer().map_err(|e| fetch_err(format!("{e:?}")))?)
        .await
        .map_err(|e| fetch_err(format!("{e:?}")))?;
    Ok(js_sys::Uint8Array::new(&buffer).to_vec())
}

async fn load_texture(config: &DemoConfig, relative: &str, srgb: bool) -> AssetResult<TextureData> {
    let path = config.asset_path(relative);
    let bytes = load_bytes(&path).await?;
    TextureData::decode(relative, &bytes, srgb)
}

/// Load and decode all five grass maps.
pub async fn load_grass_textures(config: &DemoConfig) -> AssetResult<GrassTextures> {
    let color = load_texture(config, config::GRASS_COLOR, true).await?;
    let ambient_occlusion = load_texture(config, config::GRASS_AMBIENT_OCCLUSION, false).await?;
    let normal = load_texture(config, config::GRASS_NORMAL, false).await?;
    let roughness = load_texture(config, config::GRASS_ROUGHNESS, false).await?;
    let height = load_texture(config, config::GRASS_HEIGHT, false).await?;
    tracing::info!("loaded grass textures from {}", config.asset_root);

    Ok(GrassTextures::new(
        color,
        ambient_occlusion,
        normal,
        roughness,
        height,
        config.floor.texture_repeat,
    ))
}

/// Start loading the fox in the background.
pub fn spawn_model_load(config: &DemoConfig) -> AssetLoad<RiggedModel> {
    let path = config.asset_path(config::FOX_MODEL);
    let (tx, load) = asset_channel();
    tracing::info!("loading model {}", path);

    #[cfg(target_arch = "wasm32")]
    wasm_bindgen_futures::spawn_local(async move {
        let _ = tx.send(load_rigged_model(&path).await);
    });

    #[cfg(not(target_arch = "wasm32"))]
    std::thread::spawn(move || {
        let _ = tx.send(pollster::block_on(load_rigged_model(&path)));
    });

    load
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_poll_delivers_once() {
        let (tx, mut load) = asset_channel::<u32>();
        assert!(load.poll().is_none());
        assert!(!load.is_finished());

        tx.send(Ok(5)).unwrap();
        assert!(matches!(load.poll(), Some(Ok(5))));
        assert!(load.is_finished());
        assert!(load.poll().is_none());
    }

    #[test]
    fn test_dropped_sender_reports_closed() {
        let (tx, mut load) = asset_channel::<u32>();
        drop(tx);
        assert!(matches!(load.poll(), Some(Err(AssetError::ChannelClosed))));
        assert!(load.poll().is_none());
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = pollster::block_on(load_bytes("definitely/not/here.jpg")).unwrap_err();
        assert!(matches!(err, AssetError::Io { .. }));
    }
}
