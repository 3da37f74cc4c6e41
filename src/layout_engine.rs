//! Pure tab-bar geometry: which tabs are visible, where they go, and how
//! their titles are shortened to fit.

mod tab_bar;
mod text;

pub use tab_bar::{BarStyle, DrawCommand, TabBarLayout, TabSlot, TextOrigin, first_visible, layout_tab_bar};
pub use text::{ELLIPSIS_LEN, MAX_TEXT_CHARS, TextMeasure, fit_text};

#[cfg(test)]
pub(crate) mod testing {
    use super::TextMeasure;

    /// Fixed metrics: every char is 6px wide, the font is 10px tall.
    pub struct FixedMetrics;

    impl TextMeasure for FixedMetrics {
        fn text_width(&self, text: &str) -> u32 { 6 * text.chars().count() as u32 }

        fn font_height(&self) -> u32 { 10 }

        fn font_ascent(&self) -> u32 { 8 }
    }
}
