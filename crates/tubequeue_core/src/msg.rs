use crate::{CategoryOrder, DuplicatePolicy, LinkId, LinkRecord, RateLimits, ServerState};

/// Milliseconds since the Unix epoch.
pub type Timestamp = u64;

/// Sequence number attached to each full-state refresh request.
pub type RefreshSeq = u64;

/// Result of one submission call to the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchResult {
    /// The backend stored the link. `duplicate` means it already existed and
    /// was attached to the category instead.
    Created {
        link: Option<LinkRecord>,
        duplicate: bool,
    },
    /// The backend refused the link as a duplicate.
    Conflict,
    /// Network, validation or server failure.
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// User submitted a single link. `None` targets the selected category.
    Submit {
        url: String,
        category: Option<String>,
        at: Timestamp,
    },
    /// User pasted or dropped text holding one link per line.
    SubmitBatch {
        text: String,
        category: Option<String>,
        at: Timestamp,
    },
    /// Short periodic tick that may drain one queued item.
    DrainTick,
    /// The per-second window elapsed.
    SecondWindowElapsed,
    /// The per-minute window elapsed.
    MinuteWindowElapsed,
    /// The periodic full-state poll is due.
    PollElapsed,
    /// The in-flight submission call returned.
    DispatchFinished { result: DispatchResult, at: Timestamp },
    /// A full-state fetch returned.
    StateFetched { seq: RefreshSeq, state: ServerState },
    /// A full-state fetch failed; the previous mirror is kept.
    StateFetchFailed { seq: RefreshSeq, error: String },
    /// A category, link or config change finished on the backend.
    MutationFinished { error: Option<String> },
    /// User picked the default target category.
    CategorySelected { name: String, at: Timestamp },
    /// User created a category.
    CategoryAdded { name: String, at: Timestamp },
    /// User moved a link into another category.
    LinkMoved {
        id: LinkId,
        category: String,
        at: Timestamp,
    },
    /// User deleted a stored link.
    LinkDeleted { id: LinkId },
    /// User replaced a link's tags.
    TagsEdited { id: LinkId, tags: Vec<String> },
    DuplicatePolicyChanged(DuplicatePolicy),
    RateLimitsChanged(RateLimits),
    CategoryOrderChanged(CategoryOrder),
    /// Fallback for placeholder wiring.
    NoOp,
}
