//! Tab bar state management
//!
//! Ordering of open documents and the active tab.

use super::DocumentId;
use serde::{Deserialize, Serialize};

/// A single tab in the tab bar
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tab {
    /// Document ID this tab represents
    pub document_id: DocumentId,

    /// Display title for the tab
    pub title: String,
}

impl Tab {
    pub fn new(document_id: DocumentId, title: String) -> Self {
        Self { document_id, title }
    }
}

/// State of the tab bar
#[derive(Debug, Clone, Default)]
pub struct TabState {
    /// Ordered list of tabs
    pub tabs: Vec<Tab>,

    /// Index of the currently active tab
    pub active_index: Option<usize>,
}

impl TabState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a tab and make it active
    pub fn add_tab(&mut self, document_id: DocumentId, title: String) {
        self.tabs.push(Tab::new(document_id, title));
        self.active_index = Some(self.tabs.len() - 1);
    }

    /// Remove a tab; the active index moves to `min(index, len - 1)`
    ///
    /// Returns the index the tab had.
    pub fn remove_tab(&mut self, document_id: DocumentId) -> Option<usize> {
        let index = self.find_tab_index(document_id)?;
        self.tabs.remove(index);

        self.active_index = match self.active_index {
            _ if self.tabs.is_empty() => None,
            Some(active) if active == index => Some(index.min(self.tabs.len() - 1)),
            Some(active) if active > index => Some(active - 1),
            other => other,
        };
        Some(index)
    }

    /// Set the active tab by document ID
    pub fn set_active(&mut self, document_id: DocumentId) -> bool {
        match self.find_tab_index(document_id) {
            Some(index) => {
                self.active_index = Some(index);
                true
            }
            None => false,
        }
    }

    /// Set the active tab by index
    pub fn set_active_index(&mut self, index: usize) {
        if index < self.tabs.len() {
            self.active_index = Some(index);
        }
    }

    /// Get the active tab's document ID
    pub fn active_tab(&self) -> Option<DocumentId> {
        self.active_index
            .and_then(|i| self.tabs.get(i))
            .map(|tab| tab.document_id)
    }

    /// Find tab index by document ID
    pub fn find_tab_index(&self, document_id: DocumentId) -> Option<usize> {
        self.tabs.iter().position(|t| t.document_id == document_id)
    }

    /// Move to the next tab, wrapping around
    pub fn next_tab(&mut self) {
        if self.tabs.is_empty() {
            return;
        }
        self.active_index = Some(match self.active_index {
            Some(active) => (active + 1) % self.tabs.len(),
            None => 0,
        });
    }

    /// Move to the previous tab, wrapping around
    pub fn prev_tab(&mut self) {
        if self.tabs.is_empty() {
            return;
        }
        self.active_index = Some(match self.active_index {
            Some(0) | None => self.tabs.len() - 1,
            Some(active) => active - 1,
        });
    }

    /// Update a tab's title
    pub fn update_title(&mut self, document_id: DocumentId, title: String) {
        if let Some(tab) = self.tabs.iter_mut().find(|t| t.document_id == document_id) {
            tab.title = title;
        }
    }

    /// Close all tabs except the given one; returns the closed IDs
    pub fn close_others(&mut self, keep: DocumentId) -> Vec<DocumentId> {
        let closed: Vec<DocumentId> = self
            .tabs
            .iter()
            .map(|t| t.document_id)
            .filter(|id| *id != keep)
            .collect();
        self.tabs.retain(|t| t.document_id == keep);
        self.active_index = if self.tabs.is_empty() { None } else { Some(0) };
        closed
    }

    /// Remove every tab; returns the closed IDs in tab order
    pub fn clear(&mut self) -> Vec<DocumentId> {
        self.active_index = None;
        self.tabs.drain(..).map(|t| t.document_id).collect()
    }

    pub fn count(&self) -> usize {
        self.tabs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tabs.is_empty()
    }

    /// Document IDs in tab order
    pub fn document_ids(&self) -> Vec<DocumentId> {
        self.tabs.iter().map(|t| t.document_id).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tabs(n: usize) -> (TabState, Vec<DocumentId>) {
        let mut state = TabState::new();
        let ids: Vec<DocumentId> = (0..n).map(|_| DocumentId::new()).collect();
        for (i, id) in ids.iter().enumerate() {
            state.add_tab(*id, format!("Tab {}", i));
        }
        (state, ids)
    }

    #[test]
    fn test_add_tab_activates_it() {
        let (state, ids) = tabs(3);
        assert_eq!(state.count(), 3);
        assert_eq!(state.active_tab(), Some(ids[2]));
    }

    #[test]
    fn test_remove_active_tab_selects_min_index() {
        let (mut state, ids) = tabs(3);
        state.set_active(ids[1]);
        assert_eq!(state.remove_tab(ids[1]), Some(1));
        assert_eq!(state.active_tab(), Some(ids[2]));

        assert_eq!(state.remove_tab(ids[2]), Some(1));
        assert_eq!(state.active_tab(), Some(ids[0]));

        state.remove_tab(ids[0]);
        assert_eq!(state.active_index, None);
        assert_eq!(state.remove_tab(ids[0]), None);
    }

    #[test]
    fn test_remove_before_active_shifts_index() {
        let (mut state, ids) = tabs(3);
        state.remove_tab(ids[0]);
        assert_eq!(state.active_tab(), Some(ids[2]));
        assert_eq!(state.active_index, Some(1));
    }

    #[test]
    fn test_tab_navigation_wraps() {
        let (mut state, ids) = tabs(3);
        state.next_tab();
        assert_eq!(state.active_tab(), Some(ids[0]));
        state.prev_tab();
        assert_eq!(state.active_tab(), Some(ids[2]));
        state.prev_tab();
        assert_eq!(state.active_tab(), Some(ids[1]));
    }

    #[test]
    fn test_close_others_and_clear() {
        let (mut state, ids) = tabs(4);
        let closed = state.close_others(ids[1]);
        assert_eq!(closed, vec![ids[0], ids[2], ids[3]]);
        assert_eq!(state.active_tab(), Some(ids[1]));

        assert_eq!(state.clear(), vec![ids[1]]);
        assert!(state.is_empty());
        assert_eq!(state.active_tab(), None);
    }
}
