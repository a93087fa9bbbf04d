use crate::{DuplicatePolicy, RateLimits, ServerConfig};

pub const MIN_COLUMNS: u8 = 2;
pub const MAX_COLUMNS: u8 = 10;

/// Strategy for ordering categories in the view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CategoryOrder {
    #[default]
    Recent,
    Alphabetical,
    MostItems,
    PinnedFirst,
}

impl CategoryOrder {
    /// Parses a configuration value. Unrecognized values are `Recent`.
    pub fn from_config(value: &str) -> Self {
        match value.trim() {
            "alphabetical" => Self::Alphabetical,
            "most_items" => Self::MostItems,
            "pinned_first" => Self::PinnedFirst,
            _ => Self::Recent,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Recent => "recent",
            Self::Alphabetical => "alphabetical",
            Self::MostItems => "most_items",
            Self::PinnedFirst => "pinned_first",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ViewMode {
    #[default]
    Grid,
    List,
}

impl ViewMode {
    pub fn from_config(value: &str) -> Option<Self> {
        match value.trim() {
            "grid" => Some(Self::Grid),
            "list" => Some(Self::List),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Grid => "grid",
            Self::List => "list",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortMode {
    #[default]
    Newest,
    Oldest,
    Alpha,
    Duration,
}

impl SortMode {
    pub fn from_config(value: &str) -> Option<Self> {
        match value.trim() {
            "newest" => Some(Self::Newest),
            "oldest" => Some(Self::Oldest),
            "alpha" => Some(Self::Alpha),
            "duration" => Some(Self::Duration),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Newest => "newest",
            Self::Oldest => "oldest",
            Self::Alpha => "alpha",
            Self::Duration => "duration",
        }
    }
}

/// Presentation defaults the backend may push; carried but not interpreted here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewDefaults {
    pub columns: u8,
    pub view_mode: ViewMode,
    pub sort_mode: SortMode,
}

impl Default for ViewDefaults {
    fn default() -> Self {
        Self {
            columns: 5,
            view_mode: ViewMode::Grid,
            sort_mode: SortMode::Newest,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ViewDefaultsPatch {
    pub columns: Option<u8>,
    pub view_mode: Option<ViewMode>,
    pub sort_mode: Option<SortMode>,
}

/// Locally cached settings. Server-supplied values overwrite these on refresh.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Settings {
    pub duplicate_policy: DuplicatePolicy,
    pub rate_limits: RateLimits,
    pub category_order: CategoryOrder,
    pub pinned_categories: Vec<String>,
    pub view_defaults: ViewDefaults,
}

impl Settings {
    /// Overwrites every field the server supplies. Returns true if anything changed.
    pub fn apply_server_config(&mut self, config: &ServerConfig) -> bool {
        let before = self.clone();

        if let Some(policy) = config.duplicate_policy {
            self.duplicate_policy = policy;
        }
        // A zero cap would stall the queue forever; treat it as not supplied.
        if let Some(per_second) = config.rate_limit_per_second.filter(|v| *v > 0) {
            self.rate_limits.per_second = per_second;
        }
        if let Some(per_minute) = config.rate_limit_per_minute.filter(|v| *v > 0) {
            self.rate_limits.per_minute = per_minute;
        }
        if let Some(order) = config.category_order_strategy {
            self.category_order = order;
        }
        if let Some(pinned) = &config.pinned_categories {
            self.pinned_categories = pinned.clone();
        }
        if let Some(patch) = &config.view_defaults {
            if let Some(columns) = patch.columns {
                self.view_defaults.columns = columns.clamp(MIN_COLUMNS, MAX_COLUMNS);
            }
            if let Some(view_mode) = patch.view_mode {
                self.view_defaults.view_mode = view_mode;
            }
            if let Some(sort_mode) = patch.sort_mode {
                self.view_defaults.sort_mode = sort_mode;
            }
        }

        *self != before
    }
}
