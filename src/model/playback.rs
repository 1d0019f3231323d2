/// Which animation clip the fox plays. Also scales the floor spin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaybackSelector {
    Stay,
    Walk,
    #[default]
    Run,
}

impl PlaybackSelector {
    pub const ALL: [PlaybackSelector; 3] = [Self::Stay, Self::Walk, Self::Run];

    pub fn from_index(index: u32) -> Option<Self> {
        match index {
            0 => Some(Self::Stay),
            1 => Some(Self::Walk),
            2 => Some(Self::Run),
            _ => None,
        }
    }

    pub fn index(self) -> u32 {
        match self {
            Self::Stay => 0,
            Self::Walk => 1,
            Self::Run => 2,
        }
    }

    /// Clip index in the fox model.
    pub fn clip_index(self) -> usize {
        self.index() as usize
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Stay => "Stay",
            Self::Walk => "Walk",
            Self::Run => "Run",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_indices_and_labels() {
        for (i, sel) in PlaybackSelector::ALL.iter().enumerate() {
            assert_eq!(sel.index() as usize, i);
            assert_eq!(PlaybackSelector::from_index(i as u32), Some(*sel));
        }
        assert_eq!(PlaybackSelector::from_index(3), None);
        assert_eq!(PlaybackSelector::Walk.label(), "Walk");
        assert_eq!(PlaybackSelector::default(), PlaybackSelector::Run);
    }
}
