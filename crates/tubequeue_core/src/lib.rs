//! Tubequeue core: pure ingestion state machine and view-model helpers.
//!
//! Nothing in this crate performs I/O. The engine feeds [`Msg`] values into
//! [`update`] and executes the returned [`Effect`]s.
mod activity;
mod effect;
mod msg;
mod normalize;
mod order;
mod outcome;
mod policy;
mod queue;
mod rate;
mod reconcile;
mod settings;
mod state;
mod update;
mod view_model;

pub use activity::CategoryActivity;
pub use effect::{ConfigPatch, Effect};
pub use msg::{DispatchResult, Msg, RefreshSeq, Timestamp};
pub use normalize::{normalize, NormalizedIdentity, PRIMARY_HOST};
pub use order::order_categories;
pub use outcome::{Outcome, RejectReason, WarnReason};
pub use policy::{evaluate, DuplicatePolicy, DuplicateScope, Verdict, VerdictReason};
pub use queue::{IngestionQueue, RawSubmission, MAX_UNCONFIRMED_REFRESHES};
pub use rate::{RateLimits, RateWindowCounters};
pub use settings::{
    CategoryOrder, Settings, SortMode, ViewDefaults, ViewDefaultsPatch, ViewMode, MAX_COLUMNS,
    MIN_COLUMNS,
};
pub use state::{
    AppState, LinkId, LinkRecord, ServerConfig, ServerQueueEntry, ServerState, FALLBACK_CATEGORY,
};
pub use update::update;
pub use view_model::{AppViewModel, CategoryRow, QueueRow, QueueStatus};
