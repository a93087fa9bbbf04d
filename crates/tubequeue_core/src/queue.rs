use std::collections::VecDeque;

use crate::{
    normalize, LinkId, LinkRecord, NormalizedIdentity, RateLimits, RateWindowCounters, RefreshSeq,
    ServerQueueEntry,
};

/// Refreshes, counted from the one requested after dispatch, that may miss an
/// accepted submission before it is dropped from the local queue.
pub const MAX_UNCONFIRMED_REFRESHES: u32 = 3;

/// A user intent to file `url` under `category`. Consumed once by the queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawSubmission {
    pub url: String,
    pub category: String,
}

impl RawSubmission {
    pub fn new(url: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            category: category.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct QueuedItem {
    pub(crate) submission: RawSubmission,
    pub(crate) identity: NormalizedIdentity,
}

/// What the backend told us about the link it created, if anything.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub(crate) struct CreatedLink {
    pub(crate) id: Option<LinkId>,
    pub(crate) normalized_url: Option<String>,
}

impl CreatedLink {
    pub(crate) fn from_record(link: Option<&LinkRecord>) -> Self {
        link.map(|link| Self {
            id: Some(link.id),
            normalized_url: Some(link.normalized_url.clone()),
        })
        .unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct AwaitingItem {
    item: QueuedItem,
    created: CreatedLink,
    /// First refresh expected to contain the created link.
    confirm_by: RefreshSeq,
    misses: u32,
}

impl AwaitingItem {
    /// The backend may store a different canonical form than ours (shorts are
    /// kept as watch links), so its own id and URL count as well.
    fn is_stored(&self, link: &LinkRecord) -> bool {
        link.has_identity(&self.item.identity)
            || self.created.id == Some(link.id)
            || self.created.normalized_url.as_deref() == Some(link.normalized_url.as_str())
    }

    fn is_processing(&self, entry: &ServerQueueEntry) -> bool {
        let Some(url) = entry.url.as_deref().map(str::trim) else {
            return false;
        };
        url == self.item.submission.url
            || self.created.normalized_url.as_deref() == Some(url)
            || normalize(url).is_some_and(|identity| identity == self.item.identity)
    }
}

/// Local submissions not yet confirmed by the backend, plus the rate windows
/// that gate draining them.
///
/// Items move `pending -> in flight -> awaiting confirmation` and leave once a
/// refresh contains their identity. Only one item is in flight at a time.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct IngestionQueue {
    pending: VecDeque<QueuedItem>,
    in_flight: Option<QueuedItem>,
    awaiting: Vec<AwaitingItem>,
    counters: RateWindowCounters,
}

impl IngestionQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    pub fn awaiting_len(&self) -> usize {
        self.awaiting.len()
    }

    pub fn has_in_flight(&self) -> bool {
        self.in_flight.is_some()
    }

    pub fn counters(&self) -> &RateWindowCounters {
        &self.counters
    }

    /// Submissions still waiting to be dispatched, oldest first.
    pub fn pending(&self) -> impl Iterator<Item = &RawSubmission> {
        self.pending.iter().map(|item| &item.submission)
    }

    pub fn in_flight(&self) -> Option<&RawSubmission> {
        self.in_flight.as_ref().map(|item| &item.submission)
    }

    /// Dispatched submissions whose link has not shown up in a refresh yet.
    pub fn awaiting(&self) -> impl Iterator<Item = &RawSubmission> {
        self.awaiting.iter().map(|entry| &entry.item.submission)
    }

    /// No pending, in-flight or unconfirmed work remains.
    pub fn is_settled(&self) -> bool {
        self.pending.is_empty() && self.in_flight.is_none() && self.awaiting.is_empty()
    }

    pub(crate) fn enqueue(&mut self, submission: RawSubmission, identity: NormalizedIdentity) {
        self.pending.push_back(QueuedItem {
            submission,
            identity,
        });
    }

    /// Pops the oldest item if nothing is in flight and both windows have budget.
    /// Counts the pop against both windows.
    pub(crate) fn pop_for_dispatch(&mut self, limits: &RateLimits) -> Option<QueuedItem> {
        if self.in_flight.is_some() || self.pending.is_empty() {
            return None;
        }
        if !self.counters.has_budget(limits) {
            return None;
        }
        let item = self.pending.pop_front()?;
        self.counters.record_dispatch();
        Some(item)
    }

    pub(crate) fn begin_dispatch(&mut self, item: QueuedItem) {
        self.in_flight = Some(item);
    }

    pub(crate) fn finish_dispatch(&mut self) -> Option<QueuedItem> {
        self.in_flight.take()
    }

    pub(crate) fn await_confirmation(
        &mut self,
        item: QueuedItem,
        created: CreatedLink,
        confirm_by: RefreshSeq,
    ) {
        self.awaiting.push(AwaitingItem {
            item,
            created,
            confirm_by,
            misses: 0,
        });
    }

    /// Drops awaiting items that `links` contains. An item the backend still
    /// lists in its own queue stays. Any other item missing from a refresh at
    /// or after its `confirm_by` counts a miss, and after
    /// [`MAX_UNCONFIRMED_REFRESHES`] misses it is returned as abandoned.
    pub(crate) fn confirm(
        &mut self,
        links: &[LinkRecord],
        server_queue: &[ServerQueueEntry],
        seq: RefreshSeq,
    ) -> Confirmation {
        let mut confirmation = Confirmation::default();
        let mut remaining = Vec::with_capacity(self.awaiting.len());
        for mut entry in self.awaiting.drain(..) {
            if links.iter().any(|link| entry.is_stored(link)) {
                continue;
            }
            if seq >= entry.confirm_by && !server_queue.iter().any(|row| entry.is_processing(row)) {
                entry.misses += 1;
                if entry.misses >= MAX_UNCONFIRMED_REFRESHES {
                    confirmation.abandoned.push(entry.item.submission);
                    continue;
                }
            }
            remaining.push(entry);
        }
        self.awaiting = remaining;
        confirmation
    }

    pub(crate) fn reset_second(&mut self) {
        self.counters.reset_second();
    }

    pub(crate) fn reset_minute(&mut self) {
        self.counters.reset_minute();
    }
}

#[derive(Debug, Default)]
pub(crate) struct Confirmation {
    pub(crate) abandoned: Vec<RawSubmission>,
}
