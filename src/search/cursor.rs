//! Keyboard selection over a search result list.

/// Tracks which hit is highlighted while the user presses up/down/enter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResultCursor {
    len: usize,
    selected: Option<usize>,
}

impl ResultCursor {
    pub fn new(len: usize) -> Self {
        Self { len, selected: None }
    }

    pub fn selected(&self) -> Option<usize> {
        self.selected
    }

    /// New results arrived; the highlight starts over.
    pub fn reset(&mut self, len: usize) {
        self.len = len;
        self.selected = None;
    }

    pub fn down(&mut self) -> Option<usize> {
        if self.len == 0 {
            return None;
        }
        self.selected = Some(match self.selected {
            Some(i) if i + 1 < self.len => i + 1,
            Some(_) => 0,
            None => 0,
        });
        self.selected
    }

    pub fn up(&mut self) -> Option<usize> {
        if self.len == 0 {
            return None;
        }
        self.selected = Some(match self.selected {
            Some(0) | None => self.len - 1,
            Some(i) => i - 1,
        });
        self.selected
    }

    /// Returns the highlighted hit, if any.
    pub fn enter<'a, T>(&self, hits: &'a [T]) -> Option<&'a T> {
        self.selected.and_then(|i| hits.get(i))
    }
}
