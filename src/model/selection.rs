/// Which tab is active and which one was active before it.
///
/// Indices track client identity across registry mutations: after an
/// insertion or removal `current` and `previous` still denote the same
/// clients whenever those clients still exist. `previous` is never equal to
/// `current`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Selection {
    current: Option<usize>,
    previous: Option<usize>,
}

impl Selection {
    pub fn new() -> Self { Self::default() }

    pub fn current(&self) -> Option<usize> { self.current }

    pub fn previous(&self) -> Option<usize> { self.previous }

    /// Makes `index` current, remembering the old selection. Out-of-range
    /// indices are ignored.
    pub fn select(&mut self, index: usize, len: usize) -> bool {
        if index >= len {
            return false;
        }
        if self.current != Some(index) {
            self.previous = self.current;
        }
        self.current = Some(index);
        true
    }

    pub fn clear(&mut self) { *self = Self::default(); }

    /// Target of a relative selection change. A zero step goes back to the
    /// previously selected tab.
    pub fn rotate_target(&self, step: i32, len: usize) -> Option<usize> {
        let current = self.current?;
        if step == 0 {
            return self.previous;
        }
        Some(wrap(current, step, len))
    }

    /// Moves the selected client `step` slots over, wrapping around. Returns
    /// the pair of indices the caller has to swap in the registry.
    pub fn move_by(&mut self, step: i32, len: usize) -> Option<(usize, usize)> {
        let current = self.current?;
        if step == 0 {
            return None;
        }
        let target = wrap(current, step, len);
        if target == current {
            return None;
        }
        if self.previous == Some(target) {
            self.previous = Some(current);
        }
        self.current = Some(target);
        Some((current, target))
    }

    /// Keeps the selection on the same clients after a front insertion.
    pub fn on_insert_front(&mut self) {
        self.current = self.current.map(|c| c + 1);
        self.previous = self.previous.map(|p| p + 1);
    }

    /// Updates the selection after the client at `removed` left; `len` is
    /// the registry size after the removal.
    pub fn on_remove(&mut self, removed: usize, len: usize) {
        if len == 0 {
            self.clear();
            return;
        }

        self.previous = match self.previous {
            Some(p) if p == removed => None,
            Some(p) if p > removed => Some(p - 1),
            other => other,
        };

        self.current = match self.current {
            Some(c) if c > removed => Some(c - 1),
            // The selected client left; its right neighbour slides into the
            // slot, or the new last tab takes over at the end.
            Some(c) if c >= len => Some(len - 1),
            Some(c) => Some(c),
            None => Some(0),
        };

        if self.previous == self.current {
            self.previous = None;
        }
    }
}

fn wrap(index: usize, step: i32, len: usize) -> usize {
    let len = len as i64;
    (((index as i64 + i64::from(step)) % len + len) % len) as usize
}
