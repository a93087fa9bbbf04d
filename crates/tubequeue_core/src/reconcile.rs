use crate::{AppState, Effect, RefreshSeq, ServerState};

/// Merges a fetched authoritative state into the local mirror.
///
/// Results older than the last applied refresh are ignored. Server config
/// overwrites local settings field by field and categories new to the
/// activity map start as never active. Awaiting submissions found in the
/// fetched link set leave the local queue.
pub(crate) fn apply_fetched_state(
    state: &mut AppState,
    seq: RefreshSeq,
    fetched: ServerState,
) -> Vec<Effect> {
    if state.applied_refresh_seq.is_some_and(|applied| seq <= applied) {
        return Vec::new();
    }
    state.applied_refresh_seq = Some(seq);

    let ServerState {
        links,
        categories,
        queue,
        config,
    } = fetched;

    let mut effects = Vec::new();
    if state.settings.apply_server_config(&config) {
        effects.push(Effect::PersistSettings);
    }

    for category in &categories {
        state.activity.ensure_known(category);
    }

    let confirmation = state.queue.confirm(&links, &queue, seq);
    effects.extend(
        confirmation
            .abandoned
            .into_iter()
            .map(Effect::ReportUnconfirmed),
    );

    state.links = links;
    state.categories = categories;
    state.server_queue = queue;
    state.mark_dirty();
    effects
}
