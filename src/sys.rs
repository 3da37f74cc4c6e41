//! Interfaces to the window system and the operating system.

pub mod event;
pub mod geometry;
pub mod hotkey;
pub mod process;
pub mod window_server;
pub mod x11;
pub mod xembed;
