use glam::{Quat, Vec3};

use crate::model::rig::Pose;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interpolation {
    Step,
    Linear,
}

#[derive(Debug, Clone)]
pub enum ChannelValues {
    Translation(Vec<Vec3>),
    Rotation(Vec<Quat>),
    Scale(Vec<Vec3>),
}

/// Keyframes for one property of one node.
#[derive(Debug, Clone)]
pub struct Channel {
    pub node: usize,
    pub times: Vec<f32>,
    pub values: ChannelValues,
    pub interpolation: Interpolation,
}

#[derive(Debug, Clone)]
pub struct AnimationClip {
    pub name: String,
    pub duration: f32,
    pub channels: Vec<Channel>,
}

impl AnimationClip {
    /// Duration is the latest keyframe time over all channels.
    pub fn new(name: impl Into<String>, channels: Vec<Channel>) -> Self {
        let duration = channels
            .iter()
            .filter_map(|c| c.times.last().copied())
            .fold(0.0f32, f32::max);
        Self { name: name.into(), duration, channels }
    }

    /// Write the clip's values at `time` into `pose`.
    pub fn sample_into(&self, time: f32, pose: &mut Pose) {
        for channel in &self.channels {
            let Some(local) = pose.locals.get_mut(channel.node) else {
                continue;
            };
            let Some((i0, i1, t)) = find_keyframe_index(&channel.times, time) else {
                continue;
            };
            let t = match channel.interpolation {
                Interpolation::Step => 0.0,
                Interpolation::Linear => t,
            };

            match &channel.values {
                ChannelValues::Translation(v) => {
                    if let (Some(a), Some(b)) = (v.get(i0), v.get(i1)) {
                        local.translation = a.lerp(*b, t);
                    }
                }
                ChannelValues::Rotation(q) => {
                    if let (Some(a), Some(b)) = (q.get(i0), q.get(i1)) {
                        local.rotation = a.slerp(*b, t).normalize();
                    }
                }
                ChannelValues::Scale(v) => {
                    if let (Some(a), Some(b)) = (v.get(i0), v.get(i1)) {
                        local.scale = a.lerp(*b, t);
                    }
                }
            }
        }
    }
}

/// Binary search for the keyframe interval containing `time`.
/// Returns (index0, index1, interpolation_factor) or None.
fn find_keyframe_index(times: &[f32], time: f32) -> Option<(usize, usize, f32)> {
    let last = times.len().checked_sub(1)?;
    if time <= times[0] {
        return Some((0, 0, 0.0));
    }
    if time >= times[last] {
        return Some((last, last, 0.0));
    }

    // First key strictly after `time`; guaranteed in 1..=last here
    let hi = times.partition_point(|&k| k <= time);
    let lo = hi - 1;

    let t0 = times[lo];
    let t1 = times[hi];
    let factor = if (t1 - t0).abs() < 1e-8 { 0.0 } else { (time - t0) / (t1 - t0) };
    Some((lo, hi, factor))
}

/// Plays one looping clip at a time.
#[derive(Debug, Clone)]
pub struct AnimationMixer {
    clips: Vec<AnimationClip>,
    active: Option<usize>,
    time: f32,
}

impl AnimationMixer {
    pub fn new(clips: Vec<AnimationClip>) -> Self {
        Self { clips, active: None, time: 0.0 }
    }

    pub fn clips(&self) -> &[AnimationClip] {
        &self.clips
    }

    /// Start clip `index` from the beginning. Unknown indices are ignored.
    pub fn play(&mut self, index: usize) -> bool {
        if index >= self.clips.len() {
            tracing::warn!("no animation clip {} (model has {})", index, self.clips.len());
            return false;
        }
        self.active = Some(index);
        self.time = 0.0;
        tracing::debug!("playing clip {} `{}`", index, self.clips[index].name);
        true
    }

    pub fn active_clip(&self) -> Option<&AnimationClip> {
        self.active.and_then(|i| self.clips.get(i))
    }

    pub fn active_index(&self) -> Option<usize> {
        self.active
    }

    pub fn time(&self) -> f32 {
        self.time
    }

    /// Advance playback by `delta` seconds, wrapping at the clip end.
    pub fn update(&mut self, delta: f64) {
        let Some(duration) = self.active_clip().map(|c| c.duration) else {
            return;
        };
        if duration <= 0.0 {
            self.time = 0.0;
            return;
        }
        self.time = (self.time + delta.max(0.0) as f32) % duration;
        if self.time >= duration {
            self.time = 0.0;
        }
    }

    pub fn apply(&self, pose: &mut Pose) {
        if let Some(clip) = self.active_clip() {
            clip.sample_into(self.time, pose);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::rig::Transform;

    fn slide_clip() -> AnimationClip {
        AnimationClip::new(
            "slide",
            vec![Channel {
                node: 0,
                times: vec![0.0, 1.0, 2.0],
                values: ChannelValues::Translation(vec![
                    Vec3::ZERO,
                    Vec3::new(2.0, 0.0, 0.0),
                    Vec3::new(2.0, 4.0, 0.0),
                ]),
                interpolation: Interpolation::Linear,
            }],
        )
    }

    fn spin_clip() -> AnimationClip {
        AnimationClip::new(
            "spin",
            vec![Channel {
                node: 1,
                times: vec![0.0, 0.5],
                values: ChannelValues::Rotation(vec![
                    Quat::IDENTITY,
                    Quat::from_rotation_z(std::f32::consts::FRAC_PI_2),
                ]),
                interpolation: Interpolation::Step,
            }],
        )
    }

    fn pose() -> Pose {
        Pose { locals: vec![Transform::IDENTITY; 2] }
    }

    #[test]
    fn test_keyframe_lookup() {
        let times = [0.0, 1.0, 2.0];
        assert_eq!(find_keyframe_index(&times, -1.0), Some((0, 0, 0.0)));
        assert_eq!(find_keyframe_index(&times, 1.0), Some((1, 2, 0.0)));
        assert_eq!(find_keyframe_index(&times, 1.5), Some((1, 2, 0.5)));
        assert_eq!(find_keyframe_index(&times, 3.0), Some((2, 2, 0.0)));
        assert_eq!(find_keyframe_index(&[], 0.0), None);
        assert_eq!(find_keyframe_index(&[0.4], 9.0), Some((0, 0, 0.0)));
    }

    #[test]
    fn test_sampling_at_keys_returns_key_values() {
        let clip = slide_clip();
        let mut p = pose();
        clip.sample_into(1.0, &mut p);
        assert_eq!(p.locals[0].translation, Vec3::new(2.0, 0.0, 0.0));
        clip.sample_into(2.0, &mut p);
        assert_eq!(p.locals[0].translation, Vec3::new(2.0, 4.0, 0.0));
        clip.sample_into(0.5, &mut p);
        assert!((p.locals[0].translation - Vec3::new(1.0, 0.0, 0.0)).length() < 1e-6);
    }

    #[test]
    fn test_step_interpolation_holds_previous_key() {
        let clip = spin_clip();
        let mut p = pose();
        clip.sample_into(0.49, &mut p);
        assert!(p.locals[1].rotation.abs_diff_eq(Quat::IDENTITY, 1e-6));
    }

    #[test]
    fn test_mixer_loops_within_duration() {
        let mut mixer = AnimationMixer::new(vec![slide_clip(), spin_clip()]);
        assert!(mixer.active_clip().is_none());
        mixer.update(1.0);
        assert_eq!(mixer.time(), 0.0);

        assert!(mixer.play(0));
        for _ in 0..50 {
            mixer.update(0.37);
            assert!(mixer.time() >= 0.0 && mixer.time() < 2.0);
        }
        assert!(!mixer.play(5));
        assert_eq!(mixer.active_index(), Some(0));
    }

    #[test]
    fn test_play_restarts_clip() {
        let mut mixer = AnimationMixer::new(vec![slide_clip(), spin_clip()]);
        mixer.play(0);
        mixer.update(0.75);
        assert_eq!(mixer.time(), 0.75);
        mixer.play(1);
        assert_eq!(mixer.time(), 0.0);
        assert_eq!(mixer.active_clip().map(|c| c.name.as_str()), Some("spin"));
    }

    #[test]
    fn test_apply_writes_only_targeted_nodes() {
        let mut mixer = AnimationMixer::new(vec![slide_clip()]);
        mixer.play(0);
        mixer.update(0.5);
        let mut p = pose();
        mixer.apply(&mut p);
        assert!(p.locals[0].translation.x > 0.0);
        assert_eq!(p.locals[1], Transform::IDENTITY);
    }
}
