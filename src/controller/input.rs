/// Platform-agnostic pointer and window input
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    PointerDown { button: MouseButton, x: f32, y: f32 },
    PointerUp { button: MouseButton },
    PointerMove { x: f32, y: f32 },
    Wheel { delta_y: f32 },
    Resized(ResizeRequest),
    FocusLost,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
}

impl MouseButton {
    pub fn from_web_button(button: i16) -> Self {
        match button {
            0 => MouseButton::Left,
            1 => MouseButton::Middle,
            2 => MouseButton::Right,
            _ => MouseButton::Left,
        }
    }
}

/// Logical window size plus the device pixel ratio reported by the host.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResizeRequest {
    pub width: u32,
    pub height: u32,
    pub device_pixel_ratio: f64,
}

/// Input gathered since the previous frame.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FrameInput {
    /// Pointer travel while dragging, in logical pixels.
    pub drag: (f32, f32),
    /// Wheel notches, positive zooms out.
    pub zoom_steps: f32,
    pub resize: Option<ResizeRequest>,
}

/// Accumulates events between frames.
#[derive(Debug, Default)]
pub struct InputState {
    pub dragging: bool,
    pub pointer_pos: Option<(f32, f32)>,
    /// Set each frame from the debug panel so drags on it don't orbit.
    pub ui_wants_pointer: bool,
    drag_delta: (f32, f32),
    zoom_steps: f32,
    pending_resize: Option<ResizeRequest>,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Process an input event and update state
    pub fn process_event(&mut self, event: &InputEvent) {
        match *event {
            InputEvent::PointerDown { button: MouseButton::Left, x, y } => {
                if !self.ui_wants_pointer {
                    self.dragging = true;
                }
                self.pointer_pos = Some((x, y));
            }
            InputEvent::PointerDown { x, y, .. } => {
                self.pointer_pos = Some((x, y));
            }
            InputEvent::PointerUp { button: MouseButton::Left } => {
                self.dragging = false;
            }
            InputEvent::PointerUp { .. } => {}
            InputEvent::PointerMove { x, y } => {
                if self.dragging {
                    if let Some((px, py)) = self.pointer_pos {
                        self.drag_delta.0 += x - px;
                        self.drag_delta.1 += y - py;
                    }
                }
                self.pointer_pos = Some((x, y));
            }
            InputEvent::Wheel { delta_y } => {
                if self.ui_wants_pointer {
                    return;
                }
                if delta_y < 0.0 {
                    self.zoom_steps -= 1.0;
                } else if delta_y > 0.0 {
                    self.zoom_steps += 1.0;
                }
            }
            InputEvent::Resized(request) => {
                // Only the latest size matters
                self.pending_resize = Some(request);
            }
            InputEvent::FocusLost => {
                self.dragging = false;
            }
        }
    }

    /// Take everything accumulated since the last call.
    pub fn consume(&mut self) -> FrameInput {
        let input = FrameInput {
            drag: self.drag_delta,
            zoom_steps: self.zoom_steps,
            resize: self.pending_resize.take(),
        };
        self.drag_delta = (0.0, 0.0);
        self.zoom_steps = 0.0;
        input
    }
}

#[cfg(target_arch = "wasm32")]
pub mod wasm {
    use super::*;
    use web_sys::{MouseEvent, WheelEvent, Window};

    pub fn mouse_down_to_input(e: &MouseEvent) -> InputEvent {
        InputEvent::PointerDown {
            button: MouseButton::from_web_button(e.button()),
            x: e.client_x() as f32,
            y: e.client_y() as f32,
        }
    }

    pub fn mouse_up_to_input(e: &MouseEvent) -> InputEvent {
        InputEvent::PointerUp { button: MouseButton::from_web_button(e.button()) }
    }

    pub fn mouse_move_to_input(e: &MouseEvent) -> InputEvent {
        InputEvent::PointerMove { x: e.client_x() as f32, y: e.client_y() as f32 }
    }

    pub fn wheel_to_input(e: &WheelEvent) -> InputEvent {
        InputEvent::Wheel { delta_y: e.delta_y() as f32 }
    }

    pub fn window_size(window: &Window) -> ResizeRequest {
        let dim = |v: Result<wasm_bindgen::JsValue, wasm_bindgen::JsValue>, fallback: f64| {
            v.ok().and_then(|v| v.as_f64()).unwrap_or(fallback) as u32
        };
        ResizeRequest {
            width: dim(window.inner_width(), 800.0),
            height: dim(window.inner_height(), 600.0),
            device_pixel_ratio: window.device_pixel_ratio(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drag_accumulates_only_while_pressed() {
        let mut input = InputState::new();
        input.process_event(&InputEvent::PointerMove { x: 10.0, y: 10.0 });
        input.process_event(&InputEvent::PointerMove { x: 30.0, y: 10.0 });
        assert_eq!(input.consume().drag, (0.0, 0.0));

        input.process_event(&InputEvent::PointerDown { button: MouseButton::Left, x: 30.0, y: 10.0 });
        input.process_event(&InputEvent::PointerMove { x: 35.0, y: 12.0 });
        input.process_event(&InputEvent::PointerMove { x: 40.0, y: 20.0 });
        input.process_event(&InputEvent::PointerUp { button: MouseButton::Left });
        input.process_event(&InputEvent::PointerMove { x: 90.0, y: 90.0 });

        let frame = input.consume();
        assert_eq!(frame.drag, (10.0, 10.0));
        assert_eq!(input.consume().drag, (0.0, 0.0));
    }

    #[test]
    fn test_ui_hover_blocks_orbit_and_zoom() {
        let mut input = InputState::new();
        input.ui_wants_pointer = true;
        input.process_event(&InputEvent::PointerDown { button: MouseButton::Left, x: 0.0, y: 0.0 });
        input.process_event(&InputEvent::PointerMove { x: 50.0, y: 0.0 });
        input.process_event(&InputEvent::Wheel { delta_y: 120.0 });
        let frame = input.consume();
        assert!(!input.dragging);
        assert_eq!(frame.drag, (0.0, 0.0));
        assert_eq!(frame.zoom_steps, 0.0);
    }

    #[test]
    fn test_wheel_and_latest_resize() {
        let mut input = InputState::new();
        input.process_event(&InputEvent::Wheel { delta_y: -3.0 });
        input.process_event(&InputEvent::Wheel { delta_y: -100.0 });
        input.process_event(&InputEvent::Wheel { delta_y: 53.0 });
        let first = ResizeRequest { width: 100, height: 100, device_pixel_ratio: 1.0 };
        let last = ResizeRequest { width: 640, height: 480, device_pixel_ratio: 3.0 };
        input.process_event(&InputEvent::Resized(first));
        input.process_event(&InputEvent::Resized(last));

        let frame = input.consume();
        assert_eq!(frame.zoom_steps, -1.0);
        assert_eq!(frame.resize, Some(last));
        assert_eq!(input.consume().resize, None);
    }

    #[test]
    fn test_focus_loss_ends_drag() {
        let mut input = InputState::new();
        input.process_event(&InputEvent::PointerDown { button: MouseButton::Left, x: 0.0, y: 0.0 });
        input.process_event(&InputEvent::FocusLost);
        input.process_event(&InputEvent::PointerMove { x: 5.0, y: 5.0 });
        assert_eq!(input.consume().drag, (0.0, 0.0));
    }
}
