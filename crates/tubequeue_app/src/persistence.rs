use std::path::{Path, PathBuf};

use engine_logging::{engine_error, engine_info, engine_warn};
use serde::{Deserialize, Serialize};
use tubequeue_core::{
    CategoryOrder, DuplicatePolicy, RateLimits, Settings, SortMode, ViewMode, MAX_COLUMNS,
    MIN_COLUMNS,
};
use tubequeue_engine::StateFile;

pub const SETTINGS_FILENAME: &str = ".tubequeue_settings.ron";

/// On-disk shape. Every field is optional so older or hand-edited files
/// merge over the defaults instead of failing to load.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
struct PersistedSettings {
    duplicate_policy: Option<String>,
    rate_limit_per_second: Option<u32>,
    rate_limit_per_minute: Option<u32>,
    category_order: Option<String>,
    pinned_categories: Option<Vec<String>>,
    view_columns: Option<u8>,
    view_mode: Option<String>,
    sort_mode: Option<String>,
}

impl PersistedSettings {
    fn from_settings(settings: &Settings) -> Self {
        Self {
            duplicate_policy: Some(settings.duplicate_policy.as_str().to_string()),
            rate_limit_per_second: Some(settings.rate_limits.per_second),
            rate_limit_per_minute: Some(settings.rate_limits.per_minute),
            category_order: Some(settings.category_order.as_str().to_string()),
            pinned_categories: Some(settings.pinned_categories.clone()),
            view_columns: Some(settings.view_defaults.columns),
            view_mode: Some(settings.view_defaults.view_mode.as_str().to_string()),
            sort_mode: Some(settings.view_defaults.sort_mode.as_str().to_string()),
        }
    }

    fn merge_into(self, mut settings: Settings) -> Settings {
        if let Some(policy) = self.duplicate_policy {
            settings.duplicate_policy = DuplicatePolicy::from_config(&policy);
        }
        let RateLimits {
            per_second,
            per_minute,
        } = settings.rate_limits;
        settings.rate_limits = RateLimits {
            per_second: self.rate_limit_per_second.filter(|n| *n > 0).unwrap_or(per_second),
            per_minute: self.rate_limit_per_minute.filter(|n| *n > 0).unwrap_or(per_minute),
        };
        if let Some(order) = self.category_order {
            settings.category_order = CategoryOrder::from_config(&order);
        }
        if let Some(pinned) = self.pinned_categories {
            settings.pinned_categories = pinned;
        }
        if let Some(columns) = self.view_columns {
            settings.view_defaults.columns = columns.clamp(MIN_COLUMNS, MAX_COLUMNS);
        }
        if let Some(mode) = self.view_mode.as_deref().and_then(ViewMode::from_config) {
            settings.view_defaults.view_mode = mode;
        }
        if let Some(mode) = self.sort_mode.as_deref().and_then(SortMode::from_config) {
            settings.view_defaults.sort_mode = mode;
        }
        settings
    }
}

/// Loads settings from `state_dir`, falling back to defaults when the file is
/// missing, unreadable or unparsable.
pub fn load_settings(state_dir: &Path) -> Settings {
    let file = StateFile::new(state_dir, SETTINGS_FILENAME);
    let content = match file.read() {
        Ok(Some(text)) => text,
        Ok(None) => return Settings::default(),
        Err(err) => {
            engine_warn!("Failed to read settings from {:?}: {}", file.path(), err);
            return Settings::default();
        }
    };

    let persisted: PersistedSettings = match ron::from_str(&content) {
        Ok(persisted) => persisted,
        Err(err) => {
            engine_warn!("Failed to parse settings from {:?}: {}", file.path(), err);
            return Settings::default();
        }
    };

    engine_info!("Loaded settings from {:?}", file.path());
    persisted.merge_into(Settings::default())
}

/// Writes settings atomically. Failures are logged; the in-memory settings
/// stay authoritative for this run.
pub fn save_settings(state_dir: &Path, settings: &Settings) -> Option<PathBuf> {
    let persisted = PersistedSettings::from_settings(settings);
    let pretty = ron::ser::PrettyConfig::new();
    let content = match ron::ser::to_string_pretty(&persisted, pretty) {
        Ok(text) => text,
        Err(err) => {
            engine_error!("Failed to serialize settings: {}", err);
            return None;
        }
    };

    let file = StateFile::new(state_dir, SETTINGS_FILENAME);
    match file.write(&content) {
        Ok(path) => {
            engine_info!("Saved settings to {:?}", path);
            Some(path.to_path_buf())
        }
        Err(err) => {
            engine_error!("Failed to write settings: {}", err);
            None
        }
    }
}
