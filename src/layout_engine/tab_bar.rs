use super::text::{TextMeasure, fit_text};
use crate::sys::geometry::Rect;
use crate::ui::Scheme;

/// Static inputs of a tab-bar layout.
#[derive(Debug, Clone, Copy)]
pub struct BarStyle<'a> {
    pub width: u32,
    pub height: u32,
    /// Nominal width of a non-selected tab.
    pub tab_width: u32,
    /// Shown when tabs are scrolled off to the left.
    pub before: &'a str,
    /// Shown when tabs are scrolled off to the right.
    pub after: &'a str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TabSlot {
    pub index: usize,
    pub x: u32,
    pub width: u32,
}

impl TabSlot {
    pub fn end(&self) -> u32 { self.x + self.width }
}

/// Pen position for a region's text: left edge and baseline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextOrigin {
    pub x: i32,
    pub baseline: i32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DrawCommand {
    pub rect: Rect,
    pub scheme: Scheme,
    /// Already shortened to fit `rect`; `None` paints the background only.
    pub text: Option<String>,
    pub origin: TextOrigin,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TabBarLayout {
    pub first_visible: usize,
    /// Left scroll indicator, present when tabs are hidden on the left.
    pub left: Option<Rect>,
    /// Right scroll indicator, present when tabs are hidden on the right.
    pub right: Option<Rect>,
    pub tabs: Vec<TabSlot>,
    pub commands: Vec<DrawCommand>,
}

impl TabBarLayout {
    pub fn slot(&self, index: usize) -> Option<&TabSlot> {
        self.tabs.iter().find(|slot| slot.index == index)
    }

    /// Total width covered by the emitted regions.
    pub fn covered_width(&self) -> u32 { self.commands.iter().map(|cmd| cmd.rect.width).sum() }
}

/// Index of the first tab worth showing so the selected tab stays roughly in
/// the middle of the bar once tabs overflow it.
pub fn first_visible(selected: usize, count: usize, width: u32, tab_width: u32) -> usize {
    let tab_width = u64::from(tab_width);
    let width = u64::from(width);
    let (mut c, mut n, mut fc) = (selected as u64, count as u64, 0usize);
    while n * tab_width > width && c * tab_width > width / 2 {
        c -= 1;
        n -= 1;
        fc += 1;
    }
    fc
}

/// Lays out the bar for `titles` with `selected` active. The emitted regions
/// always cover exactly `style.width` pixels.
pub fn layout_tab_bar<M: TextMeasure + ?Sized>(
    measure: &M,
    style: &BarStyle<'_>,
    titles: &[&str],
    selected: Option<usize>,
    frame_title: &str,
) -> TabBarLayout {
    let region = |x: u32, width: u32, scheme: Scheme, text: &str| {
        let rect = Rect::new(x as i32, 0, width, style.height);
        DrawCommand {
            rect,
            scheme,
            text: fit_text(measure, text, width),
            origin: text_origin(measure, rect),
        }
    };

    let len = titles.len();
    let width = style.width;
    if len == 0 || width == 0 {
        return TabBarLayout {
            commands: vec![region(0, width, Scheme::Normal, frame_title)],
            ..TabBarLayout::default()
        };
    }

    let selected = selected.filter(|&sel| sel < len).unwrap_or(0);
    let tab_width = style.tab_width.max(1);
    let indicator = |text: &str| measure.text_width(text) + measure.font_height();

    let mut fc = first_visible(selected, len, width, tab_width);
    let mut right = (len - fc) as u64 * u64::from(tab_width) > u64::from(width);
    let (left_width, right_width, count) = loop {
        let mut left_width = if fc > 0 { indicator(style.before) } else { 0 };
        let mut right_width = if right { indicator(style.after) } else { 0 };
        if left_width + right_width >= width {
            left_width = 0;
            right_width = 0;
        }
        let avail = width - left_width - right_width;
        let count = ((avail / tab_width) as usize).clamp(1, len - fc);

        if selected >= fc + count {
            fc = selected + 1 - count;
            continue;
        }
        if fc + count < len && !right {
            right = true;
            continue;
        }
        break (left_width, right_width, count);
    };

    let mut layout = TabBarLayout { first_visible: fc, ..TabBarLayout::default() };

    if left_width > 0 {
        let cmd = region(0, left_width, Scheme::Selected, style.before);
        layout.left = Some(cmd.rect);
        layout.commands.push(cmd);
    }

    let avail = width - left_width - right_width;
    let selected_width = avail - (count as u32 - 1) * tab_width;
    let mut x = left_width;
    for (index, title) in titles.iter().enumerate().skip(fc).take(count) {
        let (w, scheme) = if index == selected {
            (selected_width, Scheme::Selected)
        } else {
            (tab_width, Scheme::Normal)
        };
        layout.tabs.push(TabSlot { index, x, width: w });
        layout.commands.push(region(x, w, scheme, title));
        x += w;
    }

    if right_width > 0 {
        let cmd = region(width - right_width, right_width, Scheme::Selected, style.after);
        layout.right = Some(cmd.rect);
        layout.commands.push(cmd);
    }

    layout
}

fn text_origin<M: TextMeasure + ?Sized>(measure: &M, rect: Rect) -> TextOrigin {
    let font_height = measure.font_height() as i32;
    TextOrigin {
        x: rect.x + font_height / 2,
        baseline: rect.y + rect.height as i32 / 2 - font_height / 2 + measure.font_ascent() as i32,
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::layout_engine::testing::FixedMetrics;

    fn style(width: u32) -> BarStyle<'static> {
        BarStyle {
            width,
            height: 12,
            tab_width: 100,
            before: "<",
            after: ">",
        }
    }

    fn slots(layout: &TabBarLayout) -> Vec<(usize, u32, u32)> {
        layout.tabs.iter().map(|s| (s.index, s.x, s.width)).collect()
    }

    #[test]
    fn first_visible_keeps_selection_near_the_middle() {
        assert_eq!(first_visible(0, 5, 300, 100), 0);
        assert_eq!(first_visible(1, 5, 300, 100), 0);
        assert_eq!(first_visible(4, 5, 300, 100), 2);
        // Everything fits: never scroll.
        assert_eq!(first_visible(2, 3, 300, 100), 0);
    }

    #[test]
    fn empty_bar_shows_the_frame_title() {
        let layout = layout_tab_bar(&FixedMetrics, &style(800), &[], None, "tabbed-0.8 :: st");
        assert!(layout.tabs.is_empty());
        assert_eq!(layout.commands.len(), 1);
        assert_eq!(layout.commands[0].rect, Rect::new(0, 0, 800, 12));
        assert_eq!(layout.commands[0].scheme, Scheme::Normal);
        assert_eq!(layout.commands[0].text.as_deref(), Some("tabbed-0.8 :: st"));
    }

    #[test]
    fn selected_tab_absorbs_the_slack() {
        let layout =
            layout_tab_bar(&FixedMetrics, &style(800), &["a", "b", "c"], Some(1), "frame");
        assert_eq!(slots(&layout), vec![(0, 0, 100), (1, 100, 600), (2, 700, 100)]);
        assert_eq!(layout.left, None);
        assert_eq!(layout.right, None);
        assert_eq!(layout.covered_width(), 800);
        assert_eq!(layout.commands[1].scheme, Scheme::Selected);
    }

    #[test]
    fn overflowing_selection_scrolls_into_view() {
        let titles = ["t0", "t1", "t2", "t3", "t4"];
        let layout = layout_tab_bar(&FixedMetrics, &style(300), &titles, Some(4), "frame");
        assert_eq!(layout.first_visible, 3);
        // "<" is 6px wide plus 10px of padding.
        assert_eq!(layout.left, Some(Rect::new(0, 0, 16, 12)));
        assert_eq!(layout.right, None);
        assert_eq!(slots(&layout), vec![(3, 16, 100), (4, 116, 184)]);
        assert_eq!(layout.covered_width(), 300);
    }

    #[test]
    fn hidden_tabs_on_the_right_get_an_indicator() {
        let titles = ["t0", "t1", "t2", "t3", "t4"];
        let layout = layout_tab_bar(&FixedMetrics, &style(300), &titles, Some(0), "frame");
        assert_eq!(layout.first_visible, 0);
        assert_eq!(layout.left, None);
        assert_eq!(layout.right, Some(Rect::new(284, 0, 16, 12)));
        assert_eq!(slots(&layout), vec![(0, 0, 184), (1, 184, 100)]);
        assert_eq!(layout.covered_width(), 300);
    }

    #[test]
    fn bar_never_overflows() {
        let titles: Vec<String> = (0..12).map(|i| format!("tab {i}")).collect();
        let titles: Vec<&str> = titles.iter().map(String::as_str).collect();
        for width in [1, 15, 40, 99, 100, 150, 250, 333, 640, 1199, 1200, 1500] {
            for tab_width in [1, 37, 100, 200] {
                for sel in 0..titles.len() {
                    let style = BarStyle { tab_width, ..style(width) };
                    let layout = layout_tab_bar(&FixedMetrics, &style, &titles, Some(sel), "f");
                    assert_eq!(layout.covered_width(), width, "w={width} t={tab_width} s={sel}");
                    assert!(layout.slot(sel).is_some(), "w={width} t={tab_width} s={sel}");
                    let mut x = layout.left.map_or(0, |r| r.width);
                    for slot in &layout.tabs {
                        assert_eq!(slot.x, x);
                        x = slot.end();
                    }
                    assert!(x <= width);
                }
            }
        }
    }

    #[test]
    fn titles_are_centered_and_shortened() {
        let layout = layout_tab_bar(
            &FixedMetrics,
            &style(200),
            &["a rather long title for one tab", "b"],
            Some(1),
            "frame",
        );
        let first = &layout.commands[0];
        assert_eq!(first.text.as_deref(), Some("a rather lon..."));
        assert_eq!(first.origin, TextOrigin { x: 5, baseline: 9 });
    }
}
