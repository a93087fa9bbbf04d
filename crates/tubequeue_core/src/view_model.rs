use crate::order::{link_counts, order_categories};
use crate::{AppState, Settings, Timestamp};

/// Status shown next to a queue row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueueStatus {
    /// Submitted here and not yet confirmed by a refresh.
    Local,
    /// Whatever the backend reported; `waiting` when it reported nothing.
    Reported(String),
}

impl QueueStatus {
    pub fn as_str(&self) -> &str {
        match self {
            QueueStatus::Local => "local",
            QueueStatus::Reported(status) => status,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueRow {
    pub url: String,
    pub status: QueueStatus,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryRow {
    pub name: String,
    pub link_count: usize,
    pub last_active: Timestamp,
}

/// Snapshot rendered by the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppViewModel {
    /// Local rows first (oldest first), then backend-reported rows.
    pub queue: Vec<QueueRow>,
    pub categories: Vec<CategoryRow>,
    pub selected_category: String,
    pub link_count: usize,
    pub pending_count: usize,
    pub awaiting_count: usize,
    pub in_flight: bool,
    /// At least one refresh has been applied since start.
    pub synced: bool,
    pub settings: Settings,
}

impl AppViewModel {
    /// True when every local submission has been dispatched and resolved.
    pub fn is_settled(&self) -> bool {
        self.pending_count == 0 && self.awaiting_count == 0 && !self.in_flight
    }
}

pub(crate) fn build_view(state: &AppState) -> AppViewModel {
    let queue = state
        .queue
        .awaiting()
        .chain(state.queue.in_flight())
        .chain(state.queue.pending())
        .map(|submission| QueueRow {
            url: submission.url.clone(),
            status: QueueStatus::Local,
        })
        .chain(state.server_queue.iter().map(|entry| QueueRow {
            url: entry.url.clone().unwrap_or_else(|| "pending".to_string()),
            status: QueueStatus::Reported(
                entry.status.clone().unwrap_or_else(|| "waiting".to_string()),
            ),
        }))
        .collect();

    let counts = link_counts(&state.links);
    let categories = order_categories(
        &state.categories,
        &state.links,
        &state.activity,
        state.settings.category_order,
        &state.settings.pinned_categories,
    )
    .into_iter()
    .map(|name| CategoryRow {
        link_count: counts.get(name.as_str()).copied().unwrap_or(0),
        last_active: state.activity.last_active(&name),
        name,
    })
    .collect();

    AppViewModel {
        queue,
        categories,
        selected_category: state.selected_category.clone(),
        link_count: state.links.len(),
        pending_count: state.queue.pending_len(),
        awaiting_count: state.queue.awaiting_len(),
        in_flight: state.queue.has_in_flight(),
        synced: state.applied_refresh_seq.is_some(),
        settings: state.settings.clone(),
    }
}
