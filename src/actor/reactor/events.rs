mod command;
mod pointer;
mod window;

pub use command::CommandEventHandler;
pub use pointer::PointerEventHandler;
pub use window::WindowEventHandler;
