use crate::layout_engine::{DrawCommand, TextMeasure};
use crate::sys::geometry::{Rect, Size};
use crate::sys::window_server::Result;

/// Color pair a region is painted with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scheme {
    Normal,
    Selected,
}

/// Paints the tab bar into an off-screen buffer and copies it to the frame.
pub trait Renderer: TextMeasure {
    /// Recreates the back buffer after the frame changed size.
    fn resize_buffer(&mut self, size: Size) -> Result<()>;

    /// Fills a region with its background and draws its text, if any.
    fn draw(&mut self, command: &DrawCommand) -> Result<()>;

    /// Copies `rect` of the back buffer onto the frame and waits for the
    /// server to catch up.
    fn present(&mut self, rect: Rect) -> Result<()>;
}
