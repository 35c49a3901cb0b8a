use image::Rgba;

/// Opacity of the current step's group, in percent.
pub const TOPMOST_OPACITY: f32 = 100.0;
/// Opacity of every earlier visible step group, in percent.
pub const FULL_OPACITY: f32 = 100.0;

/// Highlight colours indexed by [`Recency::index`].
pub const FADING_COLORS: [Rgba<u8>; 4] = [
    Rgba([0xA0, 0xA0, 0xA0, 0xFF]), // older
    Rgba([0xFF, 0x00, 0x00, 0xFF]), // current
    Rgba([0x00, 0xFF, 0x00, 0xFF]), // 2nd most recent
    Rgba([0x00, 0x00, 0xFF, 0xFF]), // 3rd most recent
];

/// How recent a visible step is relative to the current one.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Recency {
    Older,
    Current,
    Second,
    Third,
}

impl Recency {
    pub fn classify(label: i64, current: i64, second: Option<i64>, third: Option<i64>) -> Self {
        if label == current {
            Recency::Current
        } else if Some(label) == second {
            Recency::Second
        } else if Some(label) == third {
            Recency::Third
        } else {
            Recency::Older
        }
    }

    pub fn index(self) -> usize {
        match self {
            Recency::Older => 0,
            Recency::Current => 1,
            Recency::Second => 2,
            Recency::Third => 3,
        }
    }

    /// Palette entry, clamped to the last colour.
    pub fn color(self) -> Rgba<u8> {
        FADING_COLORS[self.index().min(FADING_COLORS.len() - 1)]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn current_wins_over_predecessors() {
        assert_eq!(Recency::classify(5, 5, Some(5), None), Recency::Current);
        assert_eq!(Recency::classify(3, 5, Some(3), Some(1)), Recency::Second);
        assert_eq!(Recency::classify(1, 5, Some(3), Some(1)), Recency::Third);
        assert_eq!(Recency::classify(0, 5, Some(3), Some(1)), Recency::Older);
        assert_eq!(Recency::classify(3, 5, None, None), Recency::Older);
    }

    #[test]
    fn colors_follow_palette_order() {
        assert_eq!(Recency::Older.color(), FADING_COLORS[0]);
        assert_eq!(Recency::Current.color(), Rgba([0xFF, 0, 0, 0xFF]));
        assert_eq!(Recency::Second.color(), Rgba([0, 0xFF, 0, 0xFF]));
        assert_eq!(Recency::Third.color(), Rgba([0, 0, 0xFF, 0xFF]));
    }
}
