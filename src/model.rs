//! Reactor-owned state: the ordered set of embedded clients and which of
//! them is selected.

pub mod registry;
pub mod selection;

pub use registry::{Client, Registry, RegistryError, Title};
pub use selection::Selection;
