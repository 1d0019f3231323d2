use egui::Context;

use crate::controller::{FrameLoop, FrameStats};
use crate::model::PlaybackSelector;

#[derive(Debug, Clone, PartialEq)]
pub enum ModelStatus {
    Loading,
    Ready { clip: Option<String> },
    Unavailable,
}

/// Read-only values shown in the debug panel.
#[derive(Debug, Clone, PartialEq)]
pub struct PanelInfo {
    pub fps: f64,
    pub elapsed: f64,
    pub model: ModelStatus,
    pub camera_distance: f32,
}

impl PanelInfo {
    pub fn collect(frames: &FrameLoop, last: &FrameStats) -> Self {
        let model = match frames.scene.model.get() {
            Some(fox) => ModelStatus::Ready { clip: fox.mixer().active_clip().map(|c| c.name.clone()) },
            None if frames.is_loading() => ModelStatus::Loading,
            None => ModelStatus::Unavailable,
        };
        Self {
            fps: if last.delta > 0.0 { 1.0 / last.delta } else { 0.0 },
            elapsed: last.elapsed,
            model,
            camera_distance: frames.scene.camera.distance_to_target(),
        }
    }
}

pub struct UiOutput {
    pub full_output: egui::FullOutput,
    /// The pointer is over the panel or dragging one of its widgets.
    pub wants_pointer: bool,
}

/// Raw input for a canvas of `width`x`height` logical points.
pub fn raw_input(width: f32, height: f32, time: f64, events: Vec<egui::Event>) -> egui::RawInput {
    let mut raw_input = egui::RawInput::default();
    raw_input.time = Some(time);
    raw_input.screen_rect = Some(egui::Rect::from_min_size(
        egui::Pos2::new(0.0, 0.0),
        egui::vec2(width, height),
    ));
    raw_input.events = events;
    raw_input
}

/// Scale the panel to `pixel_ratio` physical pixels per point, whatever
/// native scale the host reports in `raw_input`.
pub fn apply_pixel_ratio(egui_ctx: &Context, raw_input: &egui::RawInput, pixel_ratio: f32) {
    let native = raw_input.viewport().native_pixels_per_point.unwrap_or(1.0);
    egui_ctx.set_zoom_factor(pixel_ratio / native);
}

/// Build the debug panel. Selecting an animation writes `playback`.
pub fn build_ui(
    egui_ctx: &Context,
    raw_input: egui::RawInput,
    playback: &mut PlaybackSelector,
    info: &PanelInfo,
) -> UiOutput {
    let full_output = egui_ctx.run(raw_input, |ctx| {
        draw_debug_window(ctx, playback, info);
    });
    let wants_pointer = egui_ctx.wants_pointer_input() || egui_ctx.is_pointer_over_area();
    UiOutput { full_output, wants_pointer }
}

fn draw_debug_window(ctx: &Context, playback: &mut PlaybackSelector, info: &PanelInfo) {
    egui::Window::new("Debug")
        .default_pos([8.0, 8.0])
        .resizable(false)
        .show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.label("Animation");
                egui::ComboBox::from_id_salt("animation")
                    .selected_text(playback.label())
                    .show_ui(ui, |ui| {
                        for selector in PlaybackSelector::ALL {
                            ui.selectable_value(playback, selector, selector.label());
                        }
                    });
            });
            ui.separator();
            ui.label(egui::RichText::new(format!("FPS: {:.0}", info.fps)).small());
            ui.label(egui::RichText::new(format!("Elapsed: {:.1}s", info.elapsed)).small());
            let status = match &info.model {
                ModelStatus::Loading => "Fox: loading".to_string(),
                ModelStatus::Ready { clip: Some(name) } => format!("Fox: {name}"),
                ModelStatus::Ready { clip: None } => "Fox: ready".to_string(),
                ModelStatus::Unavailable => "Fox: unavailable".to_string(),
            };
            ui.label(egui::RichText::new(status).small());
            ui.label(egui::RichText::new(format!("Distance: {:.2}", info.camera_distance)).small());
        });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::loader::asset_channel;
    use crate::config::DemoConfig;
    use crate::controller::{OrbitControls, Viewport};
    use crate::model::SceneState;

    fn frame_loop(loading: bool) -> FrameLoop {
        let config = DemoConfig::default();
        let scene = SceneState::new(&config, 800, 600);
        let controls = OrbitControls::new(&config.controls, config.camera.target);
        let viewport = Viewport::new(800, 600, 1.0, 2.0);
        let pending = loading.then(|| asset_channel().1);
        FrameLoop::new(scene, controls, viewport, pending)
    }

    #[test]
    fn test_panel_info_reports_model_status() {
        let stats = FrameStats { elapsed: 2.0, delta: 0.02, ..Default::default() };

        let info = PanelInfo::collect(&frame_loop(false), &stats);
        assert_eq!(info.model, ModelStatus::Unavailable);
        assert!((info.fps - 50.0).abs() < 1e-9);
        assert_eq!(info.elapsed, 2.0);

        let mut frames = frame_loop(true);
        // The sender is dropped, but nothing has been polled yet
        assert_eq!(PanelInfo::collect(&frames, &stats).model, ModelStatus::Loading);

        frames.deliver_model(crate::model::scene::tests::three_clip_model()).unwrap();
        let info = PanelInfo::collect(&frames, &FrameStats::default());
        assert_eq!(info.model, ModelStatus::Ready { clip: Some("Run".into()) });
        assert_eq!(info.fps, 0.0);
    }

    #[test]
    fn test_build_ui_without_interaction() {
        let ctx = Context::default();
        let mut playback = PlaybackSelector::Walk;
        let info = PanelInfo {
            fps: 60.0,
            elapsed: 1.0,
            model: ModelStatus::Loading,
            camera_distance: 2.3,
        };
        let output = build_ui(&ctx, raw_input(800.0, 600.0, 0.0, Vec::new()), &mut playback, &info);
        assert_eq!(playback, PlaybackSelector::Walk);
        assert!(!output.wants_pointer);
        assert!(output.full_output.textures_delta.free.is_empty());
    }

    #[test]
    fn test_panel_uses_capped_pixel_ratio() {
        let viewport = Viewport::new(800, 600, 3.0, 2.0);
        let mut playback = PlaybackSelector::Run;
        let info = PanelInfo {
            fps: 60.0,
            elapsed: 0.0,
            model: ModelStatus::Loading,
            camera_distance: 1.0,
        };

        // Browser: no native scale reported
        let ctx = Context::default();
        let raw = raw_input(800.0, 600.0, 0.0, Vec::new());
        apply_pixel_ratio(&ctx, &raw, viewport.pixel_ratio as f32);
        build_ui(&ctx, raw, &mut playback, &info);
        assert_eq!(ctx.pixels_per_point(), 2.0);

        // Desktop window at 3x
        let ctx = Context::default();
        let mut raw = raw_input(800.0, 600.0, 0.0, Vec::new());
        raw.viewports.entry(egui::ViewportId::ROOT).or_default().native_pixels_per_point = Some(3.0);
        apply_pixel_ratio(&ctx, &raw, viewport.pixel_ratio as f32);
        build_ui(&ctx, raw, &mut playback, &info);
        assert!((ctx.pixels_per_point() - 2.0).abs() < 1e-5);
    }
}
