use crate::{CategoryOrder, DuplicatePolicy, LinkId, Outcome, RawSubmission, RefreshSeq};

/// Configuration fields to push to the backend. `None` fields are not sent.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ConfigPatch {
    pub duplicate_policy: Option<DuplicatePolicy>,
    pub rate_limit_per_second: Option<u32>,
    pub rate_limit_per_minute: Option<u32>,
    pub category_order_strategy: Option<CategoryOrder>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Submit one link to the backend; answer with `Msg::DispatchFinished`.
    Dispatch(RawSubmission),
    /// Fetch the full state; answer with `Msg::StateFetched` carrying `seq`.
    RefreshState { seq: RefreshSeq },
    /// Answer with `Msg::MutationFinished`.
    PushConfig(ConfigPatch),
    /// Answer with `Msg::MutationFinished`.
    CreateCategory { name: String },
    /// Answer with `Msg::MutationFinished`.
    MoveLink { id: LinkId, category: String },
    /// Answer with `Msg::MutationFinished`.
    DeleteLink { id: LinkId },
    /// Answer with `Msg::MutationFinished`.
    UpdateTags { id: LinkId, tags: Vec<String> },
    /// Report an outcome to subscribers.
    Notify(Outcome),
    /// An accepted submission never showed up in a refresh; log it. Its
    /// outcome was already reported.
    ReportUnconfirmed(RawSubmission),
    /// Local settings changed and should be saved.
    PersistSettings,
}
