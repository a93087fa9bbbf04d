use crate::queue::{CreatedLink, QueuedItem};
use crate::reconcile::apply_fetched_state;
use crate::{
    evaluate, normalize, AppState, ConfigPatch, DispatchResult, Effect, Msg, Outcome,
    RawSubmission, RejectReason, Timestamp, WarnReason, FALLBACK_CATEGORY,
};

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: AppState, msg: Msg) -> (AppState, Vec<Effect>) {
    let effects = match msg {
        Msg::Submit { url, category, at } => {
            let category = target_category(&state, category);
            submit(&mut state, url.trim(), &category, at)
                .into_iter()
                .collect()
        }
        Msg::SubmitBatch { text, category, at } => {
            let category = target_category(&state, category);
            parse_urls(&text)
                .into_iter()
                .filter_map(|url| submit(&mut state, &url, &category, at))
                .collect()
        }
        Msg::DrainTick => drain_one(&mut state),
        Msg::SecondWindowElapsed => {
            state.queue.reset_second();
            Vec::new()
        }
        Msg::MinuteWindowElapsed => {
            state.queue.reset_minute();
            Vec::new()
        }
        // A failed mutation may still have been applied in part, so it refreshes too.
        Msg::PollElapsed | Msg::MutationFinished { .. } => refresh(&mut state),
        Msg::DispatchFinished { result, at } => finish_dispatch(&mut state, result, at),
        Msg::StateFetched { seq, state: fetched } => {
            apply_fetched_state(&mut state, seq, fetched)
        }
        Msg::StateFetchFailed { .. } => Vec::new(),
        Msg::CategorySelected { name, at } => {
            let name = name.trim();
            if name.is_empty() {
                return (state, Vec::new());
            }
            state.selected_category = name.to_string();
            state.touch_category(name, at);
            Vec::new()
        }
        Msg::CategoryAdded { name, at } => {
            let name = name.trim();
            if name.is_empty() {
                return (state, Vec::new());
            }
            state.touch_category(name, at);
            vec![Effect::CreateCategory {
                name: name.to_string(),
            }]
        }
        Msg::LinkMoved { id, category, at } => {
            let category = category.trim();
            if category.is_empty() {
                return (state, Vec::new());
            }
            state.selected_category = category.to_string();
            state.touch_category(category, at);
            vec![Effect::MoveLink {
                id,
                category: category.to_string(),
            }]
        }
        Msg::LinkDeleted { id } => vec![Effect::DeleteLink { id }],
        Msg::TagsEdited { id, tags } => vec![Effect::UpdateTags {
            id,
            tags: clean_tags(tags),
        }],
        Msg::DuplicatePolicyChanged(policy) => {
            state.settings.duplicate_policy = policy;
            state.mark_dirty();
            vec![
                Effect::PersistSettings,
                Effect::PushConfig(ConfigPatch {
                    duplicate_policy: Some(policy),
                    ..ConfigPatch::default()
                }),
            ]
        }
        Msg::RateLimitsChanged(limits) => {
            state.settings.rate_limits = limits;
            state.mark_dirty();
            vec![
                Effect::PersistSettings,
                Effect::PushConfig(ConfigPatch {
                    rate_limit_per_second: Some(limits.per_second),
                    rate_limit_per_minute: Some(limits.per_minute),
                    ..ConfigPatch::default()
                }),
            ]
        }
        Msg::CategoryOrderChanged(order) => {
            state.settings.category_order = order;
            state.mark_dirty();
            vec![
                Effect::PersistSettings,
                Effect::PushConfig(ConfigPatch {
                    category_order_strategy: Some(order),
                    ..ConfigPatch::default()
                }),
            ]
        }
        Msg::NoOp => Vec::new(),
    };

    (state, effects)
}

fn target_category(state: &AppState, requested: Option<String>) -> String {
    let requested = requested.as_deref().map(str::trim).unwrap_or_default();
    if !requested.is_empty() {
        return requested.to_string();
    }
    if state.selected_category.is_empty() {
        FALLBACK_CATEGORY.to_string()
    } else {
        state.selected_category.clone()
    }
}

/// Intake: normalize, run the optimistic policy check, then queue.
/// Returns the rejection to report, if any.
fn submit(state: &mut AppState, url: &str, category: &str, at: Timestamp) -> Option<Effect> {
    if url.is_empty() {
        return None;
    }
    state.touch_category(category, at);

    let reject = |reason| {
        Some(Effect::Notify(Outcome::Rejected {
            url: url.to_string(),
            category: category.to_string(),
            reason,
        }))
    };

    let Some(identity) = normalize(url) else {
        return reject(RejectReason::UnsupportedLink);
    };
    let verdict = evaluate(url, category, &state.links, state.settings.duplicate_policy);
    if !verdict.accept {
        return reject(RejectReason::DuplicateInCategory);
    }

    state
        .queue
        .enqueue(RawSubmission::new(url, category), identity);
    None
}

/// One drain step: pop the head if budget allows, re-check the policy
/// against current state and hand it to the backend.
fn drain_one(state: &mut AppState) -> Vec<Effect> {
    let limits = state.settings.rate_limits;
    let Some(item) = state.queue.pop_for_dispatch(&limits) else {
        return Vec::new();
    };
    state.mark_dirty();

    let QueuedItem { submission, .. } = &item;
    let verdict = evaluate(
        &submission.url,
        &submission.category,
        &state.links,
        state.settings.duplicate_policy,
    );
    if !verdict.accept {
        return vec![Effect::Notify(Outcome::Rejected {
            url: submission.url.clone(),
            category: submission.category.clone(),
            reason: RejectReason::DuplicateInCategory,
        })];
    }

    let mut effects = Vec::with_capacity(2);
    if verdict.warn {
        effects.push(Effect::Notify(Outcome::Warned {
            url: submission.url.clone(),
            category: submission.category.clone(),
            reason: WarnReason::DuplicateExists,
        }));
    }
    effects.push(Effect::Dispatch(submission.clone()));
    state.queue.begin_dispatch(item);
    effects
}

fn finish_dispatch(state: &mut AppState, result: DispatchResult, at: Timestamp) -> Vec<Effect> {
    let Some(item) = state.queue.finish_dispatch() else {
        return Vec::new();
    };
    state.mark_dirty();
    let RawSubmission { url, category } = item.submission.clone();

    match result {
        DispatchResult::Created { link, duplicate } => {
            let touched = link
                .as_ref()
                .map(|link| link.primary_category().to_string())
                .unwrap_or_else(|| category.clone());
            state.touch_category(&touched, at);
            let seq = state.next_refresh();
            let created = CreatedLink::from_record(link.as_ref());
            state.queue.await_confirmation(item, created, seq);
            vec![
                Effect::Notify(Outcome::Accepted {
                    url,
                    category,
                    already_existed: duplicate,
                }),
                Effect::RefreshState { seq },
            ]
        }
        DispatchResult::Conflict => {
            let seq = state.next_refresh();
            vec![
                Effect::Notify(Outcome::Rejected {
                    url,
                    category,
                    reason: RejectReason::AlreadyExistedRemotely,
                }),
                Effect::RefreshState { seq },
            ]
        }
        DispatchResult::Failed(message) => vec![Effect::Notify(Outcome::Rejected {
            url,
            category,
            reason: RejectReason::DispatchFailed(message),
        })],
    }
}

fn refresh(state: &mut AppState) -> Vec<Effect> {
    let seq = state.next_refresh();
    vec![Effect::RefreshState { seq }]
}

/// Trimmed, non-empty and without repeats, in the order given.
fn clean_tags(tags: Vec<String>) -> Vec<String> {
    let mut cleaned: Vec<String> = Vec::with_capacity(tags.len());
    for tag in tags {
        let tag = tag.trim();
        if !tag.is_empty() && !cleaned.iter().any(|t| t == tag) {
            cleaned.push(tag.to_string());
        }
    }
    cleaned
}

fn parse_urls(raw: &str) -> Vec<String> {
    raw.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(ToOwned::to_owned)
        .collect()
}
