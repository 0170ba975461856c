use std::collections::HashMap;

use roamer_driver::{PageSignature, Target};

/// Cursor value meaning "every candidate on this page has been offered".
pub const EXHAUSTED: usize = 0;

#[derive(Debug, Clone)]
struct PageEntry {
    /// Index of the next candidate to offer, or [`EXHAUSTED`].
    cursor: usize,
    /// Href of every candidate present at first visit, in enumeration order.
    hrefs: Vec<String>,
}

/// Per-page bookkeeping of which candidate indices have been offered.
///
/// A multi-candidate page offers indices `1..len` once each, in order, and
/// then reports exhausted; index 0 is only ever offered by a single-candidate
/// page or once a page is exhausted.
// TODO: offer index 0 in the round-robin once action logs carry a format
// version; existing logs depend on the current order.
#[derive(Debug, Clone, Default)]
pub struct VisitedRegistry {
    pages: HashMap<PageSignature, PageEntry>,
}

impl VisitedRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a page on first encounter; later calls for the same signature
    /// change nothing.
    pub fn register(&mut self, signature: PageSignature, candidates: &[Target]) {
        if self.pages.contains_key(&signature) {
            return;
        }
        let cursor = if candidates.len() <= 1 { EXHAUSTED } else { 1 };
        let hrefs = candidates.iter().map(|t| t.href.clone()).collect();
        self.pages.insert(signature, PageEntry { cursor, hrefs });
    }

    /// Return the current cursor and advance it. `None` for an unknown page
    /// or one registered without candidates.
    pub fn next_index_and_advance(&mut self, signature: PageSignature) -> Option<usize> {
        let entry = self.pages.get_mut(&signature)?;
        if entry.hrefs.is_empty() {
            return None;
        }
        let index = entry.cursor;
        entry.cursor = if index == EXHAUSTED || index == entry.hrefs.len() - 1 {
            EXHAUSTED
        } else {
            index + 1
        };
        Some(index)
    }

    /// Register the page if new, then take its next index.
    pub fn handle_page(&mut self, signature: PageSignature, candidates: &[Target]) -> Option<usize> {
        self.register(signature, candidates);
        self.next_index_and_advance(signature)
    }

    pub fn is_exhausted(&self, signature: PageSignature) -> bool {
        self.pages
            .get(&signature)
            .is_some_and(|entry| entry.cursor == EXHAUSTED)
    }

    pub fn is_known(&self, signature: PageSignature) -> bool {
        self.pages.contains_key(&signature)
    }

    /// Distinct signatures seen.
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn hrefs(&self, signature: PageSignature) -> Option<&[String]> {
        self.pages.get(&signature).map(|entry| entry.hrefs.as_slice())
    }
}
