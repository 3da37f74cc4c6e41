pub mod color;
pub mod renderer;

pub use color::ColorSpec;
pub use renderer::{Renderer, Scheme};
