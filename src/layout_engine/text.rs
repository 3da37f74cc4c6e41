/// Upper bound on the number of chars considered when fitting a title.
pub const MAX_TEXT_CHARS: usize = 256;

/// How many trailing chars are replaced with `.` when a title is shortened.
pub const ELLIPSIS_LEN: usize = 3;

/// Font metrics in pixels.
pub trait TextMeasure {
    fn text_width(&self, text: &str) -> u32;
    fn font_height(&self) -> u32;
    fn font_ascent(&self) -> u32;
}

/// Shortens `text` until it fits in a region `width` pixels wide, keeping
/// half a font height of padding on each side. A shortened title ends with
/// dots; `None` means not even one char fits.
pub fn fit_text<M: TextMeasure + ?Sized>(measure: &M, text: &str, width: u32) -> Option<String> {
    let avail = width.saturating_sub(measure.font_height());
    let chars: Vec<char> = text.chars().take(MAX_TEXT_CHARS).collect();
    let truncated = chars.len() < text.chars().count();

    let mut len = chars.len();
    while len > 0 && measure.text_width(&chars[..len].iter().collect::<String>()) > avail {
        len -= 1;
    }
    if len == 0 {
        return None;
    }

    let mut out = chars[..len].to_vec();
    if truncated || len < chars.len() {
        for ch in &mut out[len.saturating_sub(ELLIPSIS_LEN)..] {
            *ch = '.';
        }
    }
    Some(out.into_iter().collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout_engine::testing::FixedMetrics;

    #[test]
    fn short_titles_are_untouched() {
        assert_eq!(fit_text(&FixedMetrics, "vim", 100).as_deref(), Some("vim"));
        assert_eq!(fit_text(&FixedMetrics, "", 100).as_deref(), None);
    }

    #[test]
    fn long_titles_end_in_dots() {
        // 100px minus 10px padding leaves room for 15 chars.
        let fitted = fit_text(&FixedMetrics, "a very long window title indeed", 100).unwrap();
        assert_eq!(fitted, "a very long ...");
        assert!(FixedMetrics.text_width(&fitted) <= 90);
    }

    #[test]
    fn tiny_regions_show_only_dots_or_nothing() {
        // Room for two chars: both become dots.
        assert_eq!(fit_text(&FixedMetrics, "abcdef", 22).as_deref(), Some(".."));
        assert_eq!(fit_text(&FixedMetrics, "abcdef", 15), None);
    }

    #[test]
    fn overlong_titles_are_capped_before_measuring() {
        let title = "x".repeat(400);
        let fitted = fit_text(&FixedMetrics, &title, 10_000).unwrap();
        assert_eq!(fitted.chars().count(), MAX_TEXT_CHARS);
        assert!(fitted.ends_with("..."));
    }

    #[test]
    fn multibyte_titles_are_cut_on_char_boundaries() {
        let fitted = fit_text(&FixedMetrics, "ünïcödé wïndöw tïtlé", 70).unwrap();
        assert_eq!(fitted.chars().count(), 10);
        assert!(fitted.ends_with("..."));
    }
}
