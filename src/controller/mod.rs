// CONTROLLER: input, camera controls and the per-frame update
pub mod frame_loop;
pub mod input;
pub mod orbit_controls;
pub mod viewport;

pub use frame_loop::{floor_rotation, FrameLoop, FrameRenderer, FrameStats};
pub use input::{FrameInput, InputEvent, InputState, MouseButton, ResizeRequest};
pub use orbit_controls::OrbitControls;
pub use viewport::{PhysicalSize, Viewport};
