//! Render cycle tokens
//!
//! Every render of a document gets a fresh generation token. Starting a
//! new render supersedes the previous one: its result is still computed
//! but never committed to the view.

use crate::state::DocumentId;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RenderToken {
    pub document: DocumentId,
    pub generation: u64,
}

#[derive(Debug, Default)]
pub struct RenderCycles {
    current: HashMap<DocumentId, u64>,
    next_generation: u64,
}

impl RenderCycles {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a cycle for `document`, superseding any cycle in flight
    pub fn begin(&mut self, document: DocumentId) -> RenderToken {
        self.next_generation += 1;
        let generation = self.next_generation;
        if let Some(previous) = self.current.insert(document, generation) {
            log::debug!(
                "Render cycle {} for {} superseded by {}",
                previous,
                document,
                generation
            );
        }
        RenderToken {
            document,
            generation,
        }
    }

    pub fn is_current(&self, token: RenderToken) -> bool {
        self.current.get(&token.document) == Some(&token.generation)
    }

    /// Consume `token`; true iff its result may be committed
    pub fn finish(&mut self, token: RenderToken) -> bool {
        if self.is_current(token) {
            self.current.remove(&token.document);
            true
        } else {
            log::debug!(
                "Discarding stale render {} for {}",
                token.generation,
                token.document
            );
            false
        }
    }

    pub fn in_flight(&self, document: DocumentId) -> bool {
        self.current.contains_key(&document)
    }

    /// Drop the cycle of a closed document
    pub fn cancel(&mut self, document: DocumentId) {
        self.current.remove(&document);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_newer_cycle_supersedes() {
        let mut cycles = RenderCycles::new();
        let doc = DocumentId::new();
        let first = cycles.begin(doc);
        let second = cycles.begin(doc);
        assert!(!cycles.is_current(first));
        assert!(!cycles.finish(first));
        assert!(cycles.in_flight(doc));
        assert!(cycles.finish(second));
        assert!(!cycles.in_flight(doc));
        assert!(!cycles.finish(second));
    }

    #[test]
    fn test_documents_are_independent() {
        let mut cycles = RenderCycles::new();
        let a = cycles.begin(DocumentId::new());
        let b = cycles.begin(DocumentId::new());
        assert!(cycles.finish(a));
        assert!(cycles.finish(b));
    }

    #[test]
    fn test_cancel_discards_in_flight() {
        let mut cycles = RenderCycles::new();
        let doc = DocumentId::new();
        let token = cycles.begin(doc);
        cycles.cancel(doc);
        assert!(!cycles.finish(token));
    }
}
