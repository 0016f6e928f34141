#![forbid(unsafe_code)]

//! Dynamic label sizing.
//!
//! Label width grows linearly with the number of grapheme clusters in the
//! label text. This is a deliberate heuristic, not text measurement: it only
//! needs to give the label plate and its hit extent a plausible size.

use unicode_segmentation::UnicodeSegmentation;

/// Default label font size in meters.
pub const DEFAULT_FONT_SIZE: f32 = 0.03;

/// Width and height of a label plate, in meters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LabelSize {
    pub width: f32,
    pub height: f32,
}

/// Constants driving [`LabelMetrics::size_for`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LabelMetrics {
    /// Base font size in meters.
    pub font_size: f32,
    /// Width of one grapheme as a fraction of the font size.
    pub char_width_factor: f32,
    /// Horizontal padding added to the text width.
    pub padding: f32,
    /// Width floor.
    pub min_width: f32,
    /// Height when collapsed (name only).
    pub collapsed_height: f32,
    /// Height when expanded (name and detail).
    pub expanded_height: f32,
}

impl Default for LabelMetrics {
    fn default() -> Self {
        Self {
            font_size: DEFAULT_FONT_SIZE,
            char_width_factor: 0.3,
            padding: 0.06,
            min_width: 0.1,
            collapsed_height: 0.04,
            expanded_height: 0.06,
        }
    }
}

impl LabelMetrics {
    /// Set the base font size.
    #[must_use]
    pub fn with_font_size(mut self, font_size: f32) -> Self {
        self.font_size = font_size;
        self
    }

    /// Size of a plate holding `text`.
    #[must_use]
    pub fn size_for(&self, text: &str, is_expanded: bool) -> LabelSize {
        let graphemes = text.graphemes(true).count() as f32;
        let width = graphemes * self.font_size * self.char_width_factor + self.padding;
        let height = if is_expanded {
            self.expanded_height
        } else {
            self.collapsed_height
        };
        LabelSize {
            width: width.max(self.min_width),
            height,
        }
    }
}

/// Size a label with default metrics and the given base font size.
#[must_use]
pub fn dynamic_label_size(text: &str, base_font_size: f32, is_expanded: bool) -> LabelSize {
    LabelMetrics::default()
        .with_font_size(base_font_size)
        .size_for(text, is_expanded)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn width_grows_linearly() {
        let a = dynamic_label_size("abcdefghij", 0.1, false);
        let b = dynamic_label_size("abcdefghijabcdefghij", 0.1, false);
        // 10 graphemes * 0.1 * 0.3 = 0.3 per step
        assert!((b.width - a.width - 0.3).abs() < 1e-5);
    }

    #[test]
    fn width_is_floored() {
        let s = dynamic_label_size("", DEFAULT_FONT_SIZE, false);
        assert_eq!(s.width, 0.1);
        let s = dynamic_label_size("ab", DEFAULT_FONT_SIZE, false);
        assert_eq!(s.width, 0.1);
    }

    #[test]
    fn height_switches_between_bands() {
        assert_eq!(dynamic_label_size("node", DEFAULT_FONT_SIZE, false).height, 0.04);
        assert_eq!(dynamic_label_size("node", DEFAULT_FONT_SIZE, true).height, 0.06);
    }

    #[test]
    fn counts_graphemes_not_bytes() {
        let ascii = dynamic_label_size("aaaaaaaaaaaaaaaaaaaa", DEFAULT_FONT_SIZE, false);
        let accented = dynamic_label_size("éééééééééééééééééééé", DEFAULT_FONT_SIZE, false);
        assert_eq!(ascii.width, accented.width);
    }
}
