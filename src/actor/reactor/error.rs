use thiserror::Error;

use crate::sys::event::RequestError;
use crate::sys::window_server::WindowServerError;

#[derive(Debug, Error)]
pub enum ReactorError {
    #[error("Window server communication failed: {0}")]
    WindowServer(#[from] WindowServerError),
    #[error("Fatal X error: {0}")]
    Fatal(RequestError),
}
