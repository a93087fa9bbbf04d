use crate::view_model::{build_view, AppViewModel};
use crate::{
    CategoryActivity, CategoryOrder, DuplicatePolicy, IngestionQueue, NormalizedIdentity,
    RefreshSeq, Settings, Timestamp, ViewDefaultsPatch,
};

/// Category used when a link or submission names none.
pub const FALLBACK_CATEGORY: &str = "Unsorted";

pub type LinkId = u64;

/// A link as stored by the backend. Read-only locally.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkRecord {
    pub id: LinkId,
    pub normalized_url: String,
    pub original_url: String,
    /// Never empty; the first entry is the primary category.
    pub categories: Vec<String>,
    pub title: Option<String>,
    pub author: Option<String>,
    pub duration: Option<String>,
    pub duration_seconds: Option<u64>,
    pub tags: Vec<String>,
    pub created_at: Option<String>,
    pub thumbnail_url: Option<String>,
}

impl LinkRecord {
    /// Builds a record, falling back to [`FALLBACK_CATEGORY`] and dropping repeated categories.
    pub fn new(
        id: LinkId,
        normalized_url: impl Into<String>,
        original_url: impl Into<String>,
        categories: impl IntoIterator<Item = String>,
    ) -> Self {
        let mut unique: Vec<String> = Vec::new();
        for category in categories {
            let category = category.trim();
            if !category.is_empty() && !unique.iter().any(|c| c == category) {
                unique.push(category.to_string());
            }
        }
        if unique.is_empty() {
            unique.push(FALLBACK_CATEGORY.to_string());
        }

        Self {
            id,
            normalized_url: normalized_url.into(),
            original_url: original_url.into(),
            categories: unique,
            title: None,
            author: None,
            duration: None,
            duration_seconds: None,
            tags: Vec::new(),
            created_at: None,
            thumbnail_url: None,
        }
    }

    pub fn primary_category(&self) -> &str {
        self.categories
            .first()
            .map(String::as_str)
            .unwrap_or(FALLBACK_CATEGORY)
    }

    pub fn in_category(&self, category: &str) -> bool {
        self.categories.iter().any(|c| c == category)
    }

    pub fn has_identity(&self, identity: &NormalizedIdentity) -> bool {
        self.normalized_url == identity.as_str()
    }
}

/// A queue row reported by the backend for work it has not finished.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ServerQueueEntry {
    pub url: Option<String>,
    pub status: Option<String>,
}

/// Partial configuration as supplied by the backend. `None` means not supplied.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ServerConfig {
    pub duplicate_policy: Option<DuplicatePolicy>,
    pub rate_limit_per_second: Option<u32>,
    pub rate_limit_per_minute: Option<u32>,
    pub category_order_strategy: Option<CategoryOrder>,
    pub pinned_categories: Option<Vec<String>>,
    pub view_defaults: Option<ViewDefaultsPatch>,
}

/// Authoritative state returned by a full fetch.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ServerState {
    pub links: Vec<LinkRecord>,
    pub categories: Vec<String>,
    pub queue: Vec<ServerQueueEntry>,
    pub config: ServerConfig,
}

/// The single owned application state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppState {
    pub(crate) settings: Settings,
    pub(crate) links: Vec<LinkRecord>,
    pub(crate) categories: Vec<String>,
    pub(crate) server_queue: Vec<ServerQueueEntry>,
    pub(crate) queue: IngestionQueue,
    pub(crate) activity: CategoryActivity,
    pub(crate) selected_category: String,
    next_refresh_seq: RefreshSeq,
    pub(crate) applied_refresh_seq: Option<RefreshSeq>,
    dirty: bool,
}

impl Default for AppState {
    fn default() -> Self {
        Self::with_settings(Settings::default())
    }
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts from locally persisted settings (or defaults when none were saved).
    pub fn with_settings(settings: Settings) -> Self {
        Self {
            settings,
            links: Vec::new(),
            categories: Vec::new(),
            server_queue: Vec::new(),
            queue: IngestionQueue::new(),
            activity: CategoryActivity::new(),
            selected_category: FALLBACK_CATEGORY.to_string(),
            next_refresh_seq: 1,
            applied_refresh_seq: None,
            dirty: false,
        }
    }

    pub fn view(&self) -> AppViewModel {
        build_view(self)
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn links(&self) -> &[LinkRecord] {
        &self.links
    }

    pub fn queue(&self) -> &IngestionQueue {
        &self.queue
    }

    pub fn activity(&self) -> &CategoryActivity {
        &self.activity
    }

    /// Returns whether the view changed since the last call, and clears the flag.
    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub(crate) fn touch_category(&mut self, category: &str, at: Timestamp) {
        self.activity.touch(category, at);
        self.mark_dirty();
    }

    pub(crate) fn next_refresh(&mut self) -> RefreshSeq {
        let seq = self.next_refresh_seq;
        self.next_refresh_seq += 1;
        seq
    }
}
