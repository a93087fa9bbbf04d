use std::fmt::Write;

use chrono::{DateTime, Local, Utc};
use tubequeue_core::{AppViewModel, Outcome, Settings, Timestamp};

/// One line per outcome, prefixed by its kind so the output greps well.
pub fn outcome_line(outcome: &Outcome) -> String {
    let tag = match outcome {
        Outcome::Accepted { .. } => "ok",
        Outcome::Warned { .. } => "warn",
        Outcome::Rejected { .. } => "rejected",
    };
    format!("[{tag}] {outcome}")
}

pub fn settings_block(settings: &Settings) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "duplicate policy : {}", settings.duplicate_policy);
    let _ = writeln!(
        out,
        "rate limits      : {}/s, {}/min",
        settings.rate_limits.per_second, settings.rate_limits.per_minute
    );
    let _ = writeln!(out, "category order   : {}", settings.category_order.as_str());
    if !settings.pinned_categories.is_empty() {
        let _ = writeln!(
            out,
            "pinned           : {}",
            settings.pinned_categories.join(", ")
        );
    }
    let view = &settings.view_defaults;
    let _ = writeln!(
        out,
        "view defaults    : {} columns, {}, sorted {}",
        view.columns,
        view.view_mode.as_str(),
        view.sort_mode.as_str()
    );
    out
}

pub fn status_report(view: &AppViewModel) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{} link(s), default category {}",
        view.link_count, view.selected_category
    );

    let _ = writeln!(
        out,
        "\nCategories ({}):",
        view.settings.category_order.as_str()
    );
    if view.categories.is_empty() {
        let _ = writeln!(out, "  (none)");
    }
    for row in &view.categories {
        let _ = writeln!(
            out,
            "  {:<24} {:>5}  {}",
            row.name,
            row.link_count,
            last_active_label(row.last_active)
        );
    }

    let _ = writeln!(out, "\nQueue ({}):", view.queue.len());
    if view.queue.is_empty() {
        let _ = writeln!(out, "  (empty)");
    }
    for row in &view.queue {
        let _ = writeln!(out, "  {:<10} {}", row.status.as_str(), row.url);
    }
    out
}

fn last_active_label(at: Timestamp) -> String {
    if at == 0 {
        return "never".to_string();
    }
    i64::try_from(at)
        .ok()
        .and_then(DateTime::<Utc>::from_timestamp_millis)
        .map(|utc| {
            utc.with_timezone(&Local)
                .format("%Y-%m-%d %H:%M")
                .to_string()
        })
        .unwrap_or_else(|| "unknown".to_string())
}
