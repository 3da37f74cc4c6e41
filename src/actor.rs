//! The reactor owns all embedding state and runs on the main thread; the
//! reaper collects exited children in the background.

pub mod reactor;
pub mod reaper;
