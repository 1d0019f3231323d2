use std::f64::consts::PI;

use crate::assets::{AssetLoad, RiggedModel};
use crate::controller::input::FrameInput;
use crate::controller::orbit_controls::OrbitControls;
use crate::controller::viewport::{PhysicalSize, Viewport};
use crate::error::{AlreadyResolved, RenderError};
use crate::model::{FoxModel, FrameClock, PlaybackSelector, SceneState};

/// Draws one frame of the scene.
pub trait FrameRenderer {
    fn render(&mut self, scene: &SceneState) -> Result<(), RenderError>;

    /// Reconfigure the output surface to a new physical size.
    fn resize(&mut self, size: PhysicalSize);
}

/// What happened during a single tick.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FrameStats {
    pub elapsed: f64,
    pub delta: f64,
    pub floor_rotation: f64,
    pub animation_advanced: bool,
    pub camera_moved: bool,
}

/// Floor spin about X. Zero for `Stay`, faster for `Run` than `Walk`.
pub fn floor_rotation(elapsed: f64, selector: PlaybackSelector) -> f64 {
    -elapsed * PI * 0.25 * selector.index() as f64
}

/// Owns the per-frame state and advances it one frame at a time.
pub struct FrameLoop {
    pub scene: SceneState,
    pub controls: OrbitControls,
    pub viewport: Viewport,
    clock: FrameClock,
    pending_model: Option<AssetLoad<RiggedModel>>,
}

impl FrameLoop {
    pub fn new(
        scene: SceneState,
        controls: OrbitControls,
        viewport: Viewport,
        pending_model: Option<AssetLoad<RiggedModel>>,
    ) -> Self {
        Self { scene, controls, viewport, clock: FrameClock::default(), pending_model }
    }

    /// Whether a model load is still outstanding.
    pub fn is_loading(&self) -> bool {
        self.pending_model.as_ref().is_some_and(|load| !load.is_finished())
    }

    /// Install the loaded model. Only the first delivery takes effect.
    pub fn deliver_model(&mut self, model: RiggedModel) -> Result<(), AlreadyResolved> {
        let fox = FoxModel::new(model, self.scene.model_transform, self.scene.playback);
        let fox = self.scene.model.resolve(fox)?;
        tracing::info!(
            "model ready: {} clips, {} vertices",
            fox.mixer().clips().len(),
            fox.mesh.vertices.len()
        );
        Ok(())
    }

    fn poll_model(&mut self) {
        let Some(load) = self.pending_model.as_mut() else {
            return;
        };
        let result = load.poll();
        if load.is_finished() {
            self.pending_model = None;
        }
        match result {
            None => {}
            Some(Ok(model)) => {
                if let Err(e) = self.deliver_model(model) {
                    tracing::warn!("dropping loaded model: {}", e);
                }
            }
            Some(Err(e)) => {
                tracing::warn!("model failed to load, continuing without it: {}", e);
            }
        }
    }

    fn apply_input(&mut self, input: &FrameInput, renderer: &mut impl FrameRenderer) {
        if let Some(request) = input.resize {
            if let Some(size) = self.viewport.resize(
                request.width,
                request.height,
                request.device_pixel_ratio,
                &mut self.scene.camera,
            ) {
                renderer.resize(size);
            }
        }
        let (dx, dy) = input.drag;
        if dx != 0.0 || dy != 0.0 {
            self.controls.drag(dx, dy, self.viewport.height);
        }
        if input.zoom_steps != 0.0 {
            self.controls.dolly(input.zoom_steps);
        }
    }

    /// Advance one frame at host time `now` (seconds) and draw it.
    pub fn tick(
        &mut self,
        now: f64,
        input: &FrameInput,
        renderer: &mut impl FrameRenderer,
    ) -> Result<FrameStats, RenderError> {
        self.poll_model();
        self.apply_input(input, renderer);

        let reading = self.clock.tick(now);

        let selector = self.scene.playback;
        let rotation = floor_rotation(reading.elapsed, selector);
        self.scene.floor.rotation_x = rotation;

        let mut animation_advanced = false;
        if let Some(fox) = self.scene.model.get_mut() {
            if fox.select(selector) {
                tracing::debug!("switched animation to {}", selector.label());
            }
            fox.advance(reading.delta);
            animation_advanced = true;
        }

        let camera_moved = self.controls.update(&mut self.scene.camera);

        renderer.render(&self.scene)?;

        Ok(FrameStats {
            elapsed: reading.elapsed,
            delta: reading.delta,
            floor_rotation: rotation,
            animation_advanced,
            camera_moved,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::loader::asset_channel;
    use crate::config::DemoConfig;
    use crate::controller::input::ResizeRequest;
    use crate::error::AssetError;
    use crate::model::scene::tests::three_clip_model;

    #[derive(Default)]
    struct RecordingRenderer {
        frames: usize,
        rotations: Vec<f64>,
        sizes: Vec<PhysicalSize>,
        fail_next: bool,
    }

    impl FrameRenderer for RecordingRenderer {
        fn render(&mut self, scene: &SceneState) -> Result<(), RenderError> {
            if self.fail_next {
                return Err(RenderError::Surface(wgpu::SurfaceError::OutOfMemory));
            }
            self.frames += 1;
            self.rotations.push(scene.floor.rotation_x);
            Ok(())
        }

        fn resize(&mut self, size: PhysicalSize) {
            self.sizes.push(size);
        }
    }

    fn frame_loop(pending: Option<AssetLoad<RiggedModel>>) -> FrameLoop {
        let config = DemoConfig::default();
        let scene = SceneState::new(&config, 800, 600);
        let controls = OrbitControls::new(&config.controls, config.camera.target);
        let viewport = Viewport::new(800, 600, 1.0, config.max_pixel_ratio);
        FrameLoop::new(scene, controls, viewport, pending)
    }

    #[test]
    fn test_frames_without_model_skip_animation() {
        let mut frames = frame_loop(None);
        let mut renderer = RecordingRenderer::default();
        for now in [0.0, 0.016, 0.5, 0.5, 3.0] {
            let stats = frames.tick(now, &FrameInput::default(), &mut renderer).unwrap();
            assert!(!stats.animation_advanced);
            assert!(stats.delta >= 0.0);
        }
        assert!(!frames.scene.model.is_ready());
        assert_eq!(renderer.frames, 5);
    }

    #[test]
    fn test_model_arrives_once_and_stays() {
        let (tx, load) = asset_channel();
        let mut frames = frame_loop(Some(load));
        let mut renderer = RecordingRenderer::default();
        let input = FrameInput::default();

        frames.tick(1.0, &input, &mut renderer).unwrap();
        assert!(frames.is_loading());
        assert!(!frames.scene.model.is_ready());

        tx.send(Ok(three_clip_model())).unwrap();
        let stats = frames.tick(1.1, &input, &mut renderer).unwrap();
        assert!(stats.animation_advanced);
        assert!(!frames.is_loading());

        for i in 0..10 {
            let stats = frames.tick(1.2 + i as f64 * 0.1, &input, &mut renderer).unwrap();
            assert!(stats.animation_advanced);
            assert!(frames.scene.model.is_ready());
        }
        assert_eq!(frames.deliver_model(three_clip_model()), Err(AlreadyResolved));
    }

    #[test]
    fn test_failed_load_leaves_handle_absent() {
        let (tx, load) = asset_channel::<RiggedModel>();
        let mut frames = frame_loop(Some(load));
        let mut renderer = RecordingRenderer::default();
        tx.send(Err(AssetError::NoSkinnedMesh)).unwrap();

        for now in [0.0, 0.1, 0.2] {
            let stats = frames.tick(now, &FrameInput::default(), &mut renderer).unwrap();
            assert!(!stats.animation_advanced);
        }
        assert!(!frames.scene.model.is_ready());
        assert!(!frames.is_loading());
    }

    #[test]
    fn test_stay_freezes_floor() {
        let mut frames = frame_loop(None);
        frames.scene.playback = PlaybackSelector::Stay;
        let mut renderer = RecordingRenderer::default();
        for now in [0.0, 0.7, 2.3, 9.1] {
            frames.tick(now, &FrameInput::default(), &mut renderer).unwrap();
        }
        assert!(renderer.rotations.iter().all(|r| *r == 0.0));
    }

    #[test]
    fn test_floor_rotation_follows_selector() {
        for selector in [PlaybackSelector::Walk, PlaybackSelector::Run] {
            let mut frames = frame_loop(None);
            frames.scene.playback = selector;
            let mut renderer = RecordingRenderer::default();
            for now in [10.0, 10.5, 12.0] {
                let stats = frames.tick(now, &FrameInput::default(), &mut renderer).unwrap();
                let expected = -stats.elapsed * PI * 0.25 * selector.index() as f64;
                assert!((stats.floor_rotation - expected).abs() < 1e-12);
                assert!((frames.scene.floor.rotation_x - expected).abs() < 1e-12);
            }
        }
        assert!((floor_rotation(2.0, PlaybackSelector::Walk) + PI * 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_delta_is_difference_of_elapsed() {
        let mut frames = frame_loop(None);
        let mut renderer = RecordingRenderer::default();
        let mut previous = 0.0;
        for now in [5.0, 5.016, 5.05, 5.04, 6.0] {
            let stats = frames.tick(now, &FrameInput::default(), &mut renderer).unwrap();
            assert!(stats.delta >= 0.0);
            assert!((stats.delta - (stats.elapsed - previous)).abs() < 1e-12);
            previous = stats.elapsed;
        }
    }

    #[test]
    fn test_selector_switches_clip() {
        let (tx, load) = asset_channel();
        tx.send(Ok(three_clip_model())).unwrap();
        let mut frames = frame_loop(Some(load));
        let mut renderer = RecordingRenderer::default();

        frames.tick(0.0, &FrameInput::default(), &mut renderer).unwrap();
        let active = |frames: &FrameLoop| {
            frames.scene.model.get().and_then(|fox| fox.mixer().active_clip()).map(|c| c.name.clone())
        };
        assert_eq!(active(&frames).as_deref(), Some("Run"));

        frames.scene.playback = PlaybackSelector::Walk;
        frames.tick(0.1, &FrameInput::default(), &mut renderer).unwrap();
        assert_eq!(active(&frames).as_deref(), Some("Walk"));
    }

    #[test]
    fn test_resize_and_drag_reach_camera() {
        let mut frames = frame_loop(None);
        let mut renderer = RecordingRenderer::default();
        let eye = frames.scene.camera.eye;
        let input = FrameInput {
            drag: (30.0, 0.0),
            zoom_steps: 0.0,
            resize: Some(ResizeRequest { width: 400, height: 400, device_pixel_ratio: 4.0 }),
        };

        let stats = frames.tick(0.0, &input, &mut renderer).unwrap();
        assert!(stats.camera_moved);
        assert!((frames.scene.camera.eye - eye).length() > 0.0);
        assert_eq!(frames.scene.camera.aspect, 1.0);
        assert_eq!(renderer.sizes, vec![PhysicalSize { width: 800, height: 800 }]);
    }

    #[test]
    fn test_render_failure_propagates() {
        let mut frames = frame_loop(None);
        let mut renderer = RecordingRenderer { fail_next: true, ..Default::default() };
        assert!(frames.tick(0.0, &FrameInput::default(), &mut renderer).is_err());
    }
}
