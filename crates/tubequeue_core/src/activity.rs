use std::collections::BTreeMap;

use crate::Timestamp;

/// Last-touched time per category. Only used for ordering in the view.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CategoryActivity {
    last_active: BTreeMap<String, Timestamp>,
}

impl CategoryActivity {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn touch(&mut self, category: &str, at: Timestamp) {
        self.last_active.insert(category.to_string(), at);
    }

    /// Registers a category as never active unless it is already known.
    pub fn ensure_known(&mut self, category: &str) {
        self.last_active.entry(category.to_string()).or_insert(0);
    }

    /// Zero for categories that were never touched.
    pub fn last_active(&self, category: &str) -> Timestamp {
        self.last_active.get(category).copied().unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.last_active.len()
    }

    pub fn is_empty(&self) -> bool {
        self.last_active.is_empty()
    }
}
