use std::fmt;

use crate::{normalize, LinkRecord};

/// How identical normalized identities are treated across categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DuplicatePolicy {
    /// Reject a link already present in the target category.
    #[default]
    BlockCategory,
    /// Accept, but warn when the link exists in any category.
    WarnGlobal,
    /// Accept without checking.
    AllowAll,
}

/// Which links a policy compares against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DuplicateScope {
    TargetCategory,
    AllCategories,
}

impl DuplicatePolicy {
    /// Parses a configuration value. Unrecognized values are `BlockCategory`.
    pub fn from_config(value: &str) -> Self {
        match value.trim() {
            "warn_global" => Self::WarnGlobal,
            "allow_all" => Self::AllowAll,
            _ => Self::BlockCategory,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::BlockCategory => "block_category",
            Self::WarnGlobal => "warn_global",
            Self::AllowAll => "allow_all",
        }
    }

    pub fn scope(self) -> Option<DuplicateScope> {
        match self {
            Self::BlockCategory => Some(DuplicateScope::TargetCategory),
            Self::WarnGlobal => Some(DuplicateScope::AllCategories),
            Self::AllowAll => None,
        }
    }
}

impl fmt::Display for DuplicatePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerdictReason {
    /// The link is not recognized; validation happens downstream.
    Unrecognized,
    /// No matching link in scope.
    Unique,
    DuplicateInCategory,
    DuplicateExists,
    PolicyAllowsAll,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Verdict {
    pub accept: bool,
    pub warn: bool,
    pub reason: VerdictReason,
}

impl Verdict {
    fn accept(reason: VerdictReason) -> Self {
        Self {
            accept: true,
            warn: false,
            reason,
        }
    }
}

/// Advisory duplicate check against the currently known links.
///
/// The backend remains the final arbiter; two quick submissions of the same
/// link can both pass here before either is confirmed.
pub fn evaluate(
    raw: &str,
    target_category: &str,
    existing: &[LinkRecord],
    policy: DuplicatePolicy,
) -> Verdict {
    let Some(identity) = normalize(raw) else {
        return Verdict::accept(VerdictReason::Unrecognized);
    };

    match policy.scope() {
        None => Verdict::accept(VerdictReason::PolicyAllowsAll),
        Some(DuplicateScope::TargetCategory) => {
            let blocked = existing
                .iter()
                .any(|link| link.has_identity(&identity) && link.in_category(target_category));
            if blocked {
                Verdict {
                    accept: false,
                    warn: false,
                    reason: VerdictReason::DuplicateInCategory,
                }
            } else {
                Verdict::accept(VerdictReason::Unique)
            }
        }
        Some(DuplicateScope::AllCategories) => {
            if existing.iter().any(|link| link.has_identity(&identity)) {
                Verdict {
                    accept: true,
                    warn: true,
                    reason: VerdictReason::DuplicateExists,
                }
            } else {
                Verdict::accept(VerdictReason::Unique)
            }
        }
    }
}
