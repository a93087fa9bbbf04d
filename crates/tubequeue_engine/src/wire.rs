//! JSON shapes exchanged with the backend, and their mapping to core types.
//!
//! State decoding is lenient: missing or null collections become empty, and
//! individual entries that do not decode are skipped with a warning instead of
//! failing the whole refresh.

use engine_logging::engine_warn;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tubequeue_core::{
    CategoryOrder, ConfigPatch, DuplicatePolicy, LinkRecord, ServerConfig, ServerQueueEntry,
    ServerState, SortMode, ViewDefaultsPatch, ViewMode, MAX_COLUMNS, MIN_COLUMNS,
};

use crate::{BackendError, FailureKind, SubmitReceipt};

#[derive(Debug, Default, Deserialize)]
struct WireState {
    #[serde(default)]
    links: Option<Vec<Value>>,
    #[serde(default)]
    categories: Option<Vec<Value>>,
    #[serde(default)]
    queue: Option<Vec<Value>>,
    #[serde(default)]
    config: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct WireLink {
    id: Option<u64>,
    normalized_url: Option<String>,
    original_url: Option<String>,
    primary_category: Option<String>,
    categories: Option<Vec<String>>,
    /// Older backends store a single category.
    category: Option<String>,
    title: Option<String>,
    author: Option<String>,
    duration: Option<String>,
    duration_seconds: Option<u64>,
    tags: Option<Vec<String>>,
    created_at: Option<String>,
    thumbnail_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WireQueueEntry {
    url: Option<String>,
    status: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct WireConfig {
    duplicate_policy: Option<String>,
    rate_limit_per_second: Option<u32>,
    rate_limit_per_minute: Option<u32>,
    category_order_strategy: Option<String>,
    pinned_categories: Option<Vec<String>>,
    view_defaults: Option<WireViewDefaults>,
}

#[derive(Debug, Default, Deserialize)]
struct WireViewDefaults {
    columns: Option<u32>,
    #[serde(alias = "viewMode")]
    view_mode: Option<String>,
    #[serde(alias = "sortMode")]
    sort_mode: Option<String>,
}

#[derive(Debug, Serialize)]
struct WireSubmission<'a> {
    url: &'a str,
    category: &'a str,
}

#[derive(Debug, Serialize)]
struct WireTags<'a> {
    tags: &'a [String],
}

#[derive(Debug, Default, Serialize)]
struct WireConfigPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    duplicate_policy: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    rate_limit_per_second: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    rate_limit_per_minute: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    category_order_strategy: Option<&'static str>,
}

/// Decodes a `GET state` payload.
pub fn decode_state(body: &[u8]) -> Result<ServerState, BackendError> {
    let wire: WireState = match serde_json::from_slice::<Option<WireState>>(body) {
        Ok(state) => state.unwrap_or_default(),
        Err(err) => return Err(BackendError::new(FailureKind::Decode, err.to_string())),
    };

    let links = wire
        .links
        .unwrap_or_default()
        .into_iter()
        .filter_map(decode_link)
        .collect();
    let categories = wire
        .categories
        .unwrap_or_default()
        .into_iter()
        .filter_map(|value| match value {
            Value::String(name) if !name.trim().is_empty() => Some(name),
            other => {
                engine_warn!("Skipping malformed category entry: {}", other);
                None
            }
        })
        .collect();
    let queue = wire
        .queue
        .unwrap_or_default()
        .into_iter()
        .filter_map(|value| match serde_json::from_value::<WireQueueEntry>(value) {
            Ok(entry) => Some(ServerQueueEntry {
                url: entry.url,
                status: entry.status,
            }),
            Err(err) => {
                engine_warn!("Skipping malformed queue entry: {}", err);
                None
            }
        })
        .collect();
    let config = match wire.config {
        None | Some(Value::Null) => ServerConfig::default(),
        Some(value) => match serde_json::from_value::<WireConfig>(value) {
            Ok(config) => map_config(config),
            Err(err) => {
                engine_warn!("Ignoring malformed server config: {}", err);
                ServerConfig::default()
            }
        },
    };

    Ok(ServerState {
        links,
        categories,
        queue,
        config,
    })
}

/// Decodes a submission response: either the link itself or `{ link, duplicate }`.
pub fn decode_submit_response(body: &[u8]) -> SubmitReceipt {
    let payload: Value = match serde_json::from_slice(body) {
        Ok(value) => value,
        Err(err) => {
            engine_warn!("Submission response was not JSON: {}", err);
            return SubmitReceipt::default();
        }
    };

    let duplicate = payload
        .get("duplicate")
        .and_then(Value::as_bool)
        .unwrap_or(false);
    let link = match payload.get("link") {
        Some(link) if link.is_object() => link.clone(),
        _ => payload,
    };

    SubmitReceipt {
        link: decode_link(link),
        duplicate,
    }
}

pub(crate) fn encode_submission(url: &str, category: &str) -> Result<Vec<u8>, BackendError> {
    serde_json::to_vec(&WireSubmission { url, category })
        .map_err(|err| BackendError::new(FailureKind::Decode, err.to_string()))
}

pub(crate) fn encode_tags(tags: &[String]) -> Result<Vec<u8>, BackendError> {
    serde_json::to_vec(&WireTags { tags })
        .map_err(|err| BackendError::new(FailureKind::Decode, err.to_string()))
}

/// Encodes only the fields present in `patch`.
pub fn encode_config_patch(patch: &ConfigPatch) -> Vec<u8> {
    let wire = WireConfigPatch {
        duplicate_policy: patch.duplicate_policy.map(DuplicatePolicy::as_str),
        rate_limit_per_second: patch.rate_limit_per_second,
        rate_limit_per_minute: patch.rate_limit_per_minute,
        category_order_strategy: patch.category_order_strategy.map(CategoryOrder::as_str),
    };
    // A struct of plain optional scalars always serializes.
    serde_json::to_vec(&wire).unwrap_or_else(|_| b"{}".to_vec())
}

fn decode_link(value: Value) -> Option<LinkRecord> {
    let wire = match serde_json::from_value::<WireLink>(value) {
        Ok(link) => link,
        Err(err) => {
            engine_warn!("Skipping malformed link: {}", err);
            return None;
        }
    };
    let Some(normalized_url) = wire.normalized_url.filter(|url| !url.is_empty()) else {
        engine_warn!("Skipping link {:?} without normalized_url", wire.id);
        return None;
    };

    let categories = wire
        .primary_category
        .into_iter()
        .chain(wire.categories.unwrap_or_default())
        .chain(wire.category);
    let original_url = wire
        .original_url
        .unwrap_or_else(|| normalized_url.clone());

    let mut record = LinkRecord::new(wire.id.unwrap_or(0), normalized_url, original_url, categories);
    record.title = wire.title;
    record.author = wire.author;
    record.duration = wire.duration;
    record.duration_seconds = wire.duration_seconds;
    record.tags = wire.tags.unwrap_or_default();
    record.created_at = wire.created_at;
    record.thumbnail_url = wire.thumbnail_url;
    Some(record)
}

fn map_config(wire: WireConfig) -> ServerConfig {
    ServerConfig {
        duplicate_policy: wire.duplicate_policy.as_deref().map(DuplicatePolicy::from_config),
        rate_limit_per_second: wire.rate_limit_per_second,
        rate_limit_per_minute: wire.rate_limit_per_minute,
        category_order_strategy: wire
            .category_order_strategy
            .as_deref()
            .map(CategoryOrder::from_config),
        pinned_categories: wire.pinned_categories,
        view_defaults: wire.view_defaults.map(|view| ViewDefaultsPatch {
            columns: view
                .columns
                .map(|c| c.clamp(u32::from(MIN_COLUMNS), u32::from(MAX_COLUMNS)) as u8),
            view_mode: view.view_mode.as_deref().and_then(ViewMode::from_config),
            sort_mode: view.sort_mode.as_deref().and_then(SortMode::from_config),
        }),
    }
}
