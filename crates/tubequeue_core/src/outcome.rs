use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WarnReason {
    /// The link already exists in some category.
    DuplicateExists,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RejectReason {
    /// Not a recognized video link; never queued.
    UnsupportedLink,
    /// The duplicate policy blocked it locally; never dispatched.
    DuplicateInCategory,
    /// The backend answered with a duplicate conflict.
    AlreadyExistedRemotely,
    /// The submission call failed. Not retried.
    DispatchFailed(String),
}

/// Per-item result reported to the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Accepted {
        url: String,
        category: String,
        already_existed: bool,
    },
    Warned {
        url: String,
        category: String,
        reason: WarnReason,
    },
    Rejected {
        url: String,
        category: String,
        reason: RejectReason,
    },
}

impl Outcome {
    pub fn url(&self) -> &str {
        match self {
            Outcome::Accepted { url, .. }
            | Outcome::Warned { url, .. }
            | Outcome::Rejected { url, .. } => url,
        }
    }

    pub fn is_rejection(&self) -> bool {
        matches!(self, Outcome::Rejected { .. })
    }
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectReason::UnsupportedLink => write!(f, "not a supported link"),
            RejectReason::DuplicateInCategory => write!(f, "duplicate in this category"),
            RejectReason::AlreadyExistedRemotely => write!(f, "already existed remotely"),
            RejectReason::DispatchFailed(message) => write!(f, "failed to add link: {message}"),
        }
    }
}

impl fmt::Display for WarnReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WarnReason::DuplicateExists => write!(f, "duplicate exists elsewhere, adding anyway"),
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Accepted {
                url,
                category,
                already_existed: false,
            } => write!(f, "added {url} to {category}"),
            Outcome::Accepted {
                url,
                category,
                already_existed: true,
            } => write!(f, "{url} already existed, added to {category}"),
            Outcome::Warned {
                url,
                category,
                reason,
            } => write!(f, "{url} ({category}): {reason}"),
            Outcome::Rejected {
                url,
                category,
                reason,
            } => write!(f, "skipped {url} ({category}): {reason}"),
        }
    }
}
