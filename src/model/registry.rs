use std::fmt;

use thiserror::Error;
use tracing::debug;

use crate::sys::window_server::WindowId;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("window {0:#x} is already embedded")]
    AlreadyRegistered(WindowId),
}

/// A window title bounded to [`Title::MAX_LEN`] bytes of UTF-8.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Title(String);

impl Title {
    pub const MAX_LEN: usize = 255;

    pub fn new(text: &str) -> Self {
        let mut end = text.len().min(Self::MAX_LEN);
        while !text.is_char_boundary(end) {
            end -= 1;
        }
        Title(text[..end].to_string())
    }

    pub fn as_str(&self) -> &str { &self.0 }
}

impl fmt::Display for Title {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(&self.0) }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Client {
    pub handle: WindowId,
    pub title: Title,
    /// Right edge of the tab as of the last redraw; `None` while scrolled
    /// out of view.
    pub tab_end: Option<u32>,
    pub mapped: bool,
    /// A polite close was already sent; the next request kills.
    pub close_requested: bool,
}

impl Client {
    fn new(handle: WindowId) -> Self {
        Client {
            handle,
            title: Title::default(),
            tab_end: None,
            mapped: false,
            close_requested: false,
        }
    }
}

/// Embedded clients in tab order, left to right.
#[derive(Debug, Default)]
pub struct Registry {
    clients: Vec<Client>,
}

impl Registry {
    pub fn new() -> Self { Self::default() }

    pub fn len(&self) -> usize { self.clients.len() }

    pub fn is_empty(&self) -> bool { self.clients.is_empty() }

    /// Adds a client as the leftmost tab, shifting the others right.
    pub fn insert_front(&mut self, handle: WindowId) -> Result<usize, RegistryError> {
        if self.find(handle).is_some() {
            return Err(RegistryError::AlreadyRegistered(handle));
        }
        self.clients.insert(0, Client::new(handle));
        Ok(0)
    }

    pub fn remove(&mut self, index: usize) -> Option<Client> {
        if index >= self.clients.len() {
            debug!(index, len = self.clients.len(), "ignoring removal of unknown client");
            return None;
        }
        Some(self.clients.remove(index))
    }

    pub fn find(&self, handle: WindowId) -> Option<usize> {
        self.clients.iter().position(|c| c.handle == handle)
    }

    pub fn swap(&mut self, i: usize, j: usize) -> bool {
        if i >= self.clients.len() || j >= self.clients.len() {
            return false;
        }
        self.clients.swap(i, j);
        true
    }

    pub fn get(&self, index: usize) -> Option<&Client> { self.clients.get(index) }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut Client> { self.clients.get_mut(index) }

    pub fn iter(&self) -> impl Iterator<Item = &Client> { self.clients.iter() }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Client> { self.clients.iter_mut() }

    pub fn handles(&self) -> Vec<WindowId> { self.clients.iter().map(|c| c.handle).collect() }

    pub fn titles(&self) -> Vec<&str> { self.clients.iter().map(|c| c.title.as_str()).collect() }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn new_clients_go_to_the_front() {
        let mut reg = Registry::new();
        assert_eq!(reg.insert_front(0xa), Ok(0));
        assert_eq!(reg.insert_front(0xb), Ok(0));
        assert_eq!(reg.insert_front(0xc), Ok(0));
        assert_eq!(reg.handles(), vec![0xc, 0xb, 0xa]);
        assert_eq!(reg.find(0xa), Some(2));
        assert_eq!(reg.find(0xd), None);
    }

    #[test]
    fn handles_are_unique() {
        let mut reg = Registry::new();
        reg.insert_front(7).unwrap();
        assert_eq!(reg.insert_front(7), Err(RegistryError::AlreadyRegistered(7)));
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn removal_preserves_relative_order() {
        let mut reg = Registry::new();
        for h in [1, 2, 3, 4] {
            reg.insert_front(h).unwrap();
        }
        assert_eq!(reg.remove(1).map(|c| c.handle), Some(3));
        assert_eq!(reg.handles(), vec![4, 2, 1]);
        assert_eq!(reg.remove(3), None);
        assert_eq!(reg.len(), 3);
    }

    #[test]
    fn swap_requires_valid_indices() {
        let mut reg = Registry::new();
        for h in [1, 2, 3] {
            reg.insert_front(h).unwrap();
        }
        assert!(reg.swap(0, 2));
        assert_eq!(reg.handles(), vec![1, 2, 3]);
        assert!(!reg.swap(0, 3));
        assert_eq!(reg.handles(), vec![1, 2, 3]);
    }

    #[test]
    fn titles_are_bounded_on_char_boundaries() {
        assert_eq!(Title::new("st").as_str(), "st");
        let long = "é".repeat(200);
        let title = Title::new(&long);
        assert_eq!(title.as_str().len(), 254);
        assert_eq!(title.as_str().chars().count(), 127);
        assert_eq!(Title::new(&"a".repeat(300)).as_str().len(), Title::MAX_LEN);
    }
}
