// MODEL: scene data, animation and timing
pub mod animation;
pub mod camera;
pub mod clock;
pub mod playback;
pub mod ready;
pub mod rig;
pub mod scene;

pub use animation::{AnimationClip, AnimationMixer};
pub use camera::Camera;
pub use clock::{ClockReading, FrameClock};
pub use playback::PlaybackSelector;
pub use ready::ReadyOnce;
pub use rig::{Pose, Rig, MAX_JOINTS};
pub use scene::{FoxModel, SceneState};
