use pretty_assertions::assert_eq;
use tubequeue_core::{
    update, AppState, CategoryOrder, DispatchResult, DuplicatePolicy, Effect, LinkRecord, Msg,
    Outcome, QueueRow, QueueStatus, RawSubmission, RefreshSeq, RejectReason, ServerConfig,
    ServerQueueEntry, ServerState, MAX_UNCONFIRMED_REFRESHES,
};

fn init_logging() {
    engine_logging::initialize_for_tests();
}

fn link(id: u64, video: &str, category: &str) -> LinkRecord {
    LinkRecord::new(
        id,
        format!("https://www.youtube.com/watch?v={video}"),
        format!("https://youtu.be/{video}"),
        vec![category.to_string()],
    )
}

fn submit(state: AppState, url: &str, category: &str) -> (AppState, Vec<Effect>) {
    update(
        state,
        Msg::Submit {
            url: url.to_string(),
            category: Some(category.to_string()),
            at: 10,
        },
    )
}

/// Drains one item and completes it successfully; returns the refresh seq requested.
fn dispatch_ok(state: AppState) -> (AppState, RefreshSeq) {
    dispatch_created(state, None)
}

fn dispatch_created(state: AppState, link: Option<LinkRecord>) -> (AppState, RefreshSeq) {
    let (state, effects) = update(state, Msg::DrainTick);
    assert!(effects.iter().any(|e| matches!(e, Effect::Dispatch(_))));
    let (state, effects) = update(
        state,
        Msg::DispatchFinished {
            result: DispatchResult::Created {
                link,
                duplicate: false,
            },
            at: 20,
        },
    );
    let seq = effects
        .iter()
        .find_map(|effect| match effect {
            Effect::RefreshState { seq } => Some(*seq),
            _ => None,
        })
        .expect("refresh requested");
    (state, seq)
}

fn fetched(links: Vec<LinkRecord>, categories: &[&str]) -> ServerState {
    ServerState {
        links,
        categories: categories.iter().map(|c| c.to_string()).collect(),
        ..ServerState::default()
    }
}

#[test]
fn local_row_disappears_once_refresh_contains_the_link() {
    init_logging();
    let (state, _) = submit(AppState::new(), "https://youtu.be/abc", "Music");
    let (state, seq) = dispatch_ok(state);

    let local = QueueRow {
        url: "https://youtu.be/abc".into(),
        status: QueueStatus::Local,
    };
    assert_eq!(state.view().queue, vec![local.clone()]);

    // A poll that raced ahead of the backend does not confirm it yet.
    let (state, poll) = update(state, Msg::PollElapsed);
    let poll_seq = match poll.as_slice() {
        [Effect::RefreshState { seq }] => *seq,
        other => panic!("unexpected effects {other:?}"),
    };
    assert!(poll_seq > seq);
    let (state, _) = update(
        state,
        Msg::StateFetched {
            seq: seq - 1,
            state: fetched(Vec::new(), &["Music"]),
        },
    );
    assert_eq!(state.view().queue, vec![local]);

    let (state, effects) = update(
        state,
        Msg::StateFetched {
            seq,
            state: fetched(vec![link(1, "abc", "Music")], &["Music"]),
        },
    );
    assert!(effects.is_empty());
    let view = state.view();
    assert!(view.queue.is_empty());
    assert!(view.is_settled());
    assert_eq!(view.link_count, 1);
}

#[test]
fn stale_refresh_results_are_ignored() {
    init_logging();
    let (state, _) = update(
        AppState::new(),
        Msg::StateFetched {
            seq: 5,
            state: fetched(vec![link(1, "abc", "Music")], &["Music"]),
        },
    );
    let (state, effects) = update(
        state,
        Msg::StateFetched {
            seq: 4,
            state: fetched(Vec::new(), &[]),
        },
    );
    assert!(effects.is_empty());
    assert_eq!(state.view().link_count, 1);
}

#[test]
fn link_still_processing_on_the_backend_stays_local() {
    init_logging();
    let (state, _) = submit(AppState::new(), "https://youtu.be/abc", "Music");
    let (mut state, seq) = dispatch_ok(state);

    let processing = ServerState {
        categories: vec!["Music".into()],
        queue: vec![ServerQueueEntry {
            url: Some("https://youtu.be/abc".into()),
            status: Some("processing".into()),
        }],
        ..ServerState::default()
    };
    for n in 0..RefreshSeq::from(MAX_UNCONFIRMED_REFRESHES) + 2 {
        let (next, effects) = update(
            state,
            Msg::StateFetched {
                seq: seq + n,
                state: processing.clone(),
            },
        );
        assert_eq!(effects, Vec::new());
        state = next;
    }
    assert_eq!(state.queue().awaiting_len(), 1);
    assert!(!state.view().is_settled());

    let (state, effects) = update(
        state,
        Msg::StateFetched {
            seq: seq + 10,
            state: fetched(vec![link(1, "abc", "Music")], &["Music"]),
        },
    );
    assert!(effects.is_empty());
    assert!(state.view().is_settled());
}

#[test]
fn shorts_confirmed_by_the_link_the_backend_returned() {
    init_logging();
    let (state, _) = submit(AppState::new(), "https://www.youtube.com/shorts/xyz", "Clips");
    // The backend keeps shorts in watch form.
    let stored = LinkRecord::new(
        4,
        "https://www.youtube.com/watch?v=xyz",
        "https://www.youtube.com/shorts/xyz",
        vec!["Clips".to_string()],
    );
    let (state, seq) = dispatch_created(state, Some(stored.clone()));

    let (state, effects) = update(
        state,
        Msg::StateFetched {
            seq,
            state: fetched(vec![stored], &["Clips"]),
        },
    );
    assert_eq!(effects, Vec::new());
    assert!(state.view().is_settled());
    assert_eq!(state.view().link_count, 1);
}

#[test]
fn link_never_seen_is_dropped_with_a_log_not_an_outcome() {
    init_logging();
    let (state, _) = submit(AppState::new(), "https://youtu.be/gone", "Music");
    let (mut state, seq) = dispatch_ok(state);

    let mut reported = Vec::new();
    for n in 0..RefreshSeq::from(MAX_UNCONFIRMED_REFRESHES) {
        assert_eq!(state.queue().awaiting_len(), 1);
        let (next, effects) = update(
            state,
            Msg::StateFetched {
                seq: seq + n,
                state: fetched(Vec::new(), &["Music"]),
            },
        );
        assert!(!effects.iter().any(|e| matches!(e, Effect::Notify(_))));
        reported.extend(effects);
        state = next;
    }
    assert_eq!(
        reported,
        vec![Effect::ReportUnconfirmed(RawSubmission::new(
            "https://youtu.be/gone",
            "Music"
        ))]
    );
    assert!(state.view().queue.is_empty());
}

#[test]
fn deleting_and_tagging_links_go_to_the_backend() {
    init_logging();
    let (state, effects) = update(AppState::new(), Msg::LinkDeleted { id: 3 });
    assert_eq!(effects, vec![Effect::DeleteLink { id: 3 }]);

    let (state, effects) = update(
        state,
        Msg::TagsEdited {
            id: 3,
            tags: vec![" live".into(), "".into(), "piano ".into(), "live".into()],
        },
    );
    assert_eq!(
        effects,
        vec![Effect::UpdateTags {
            id: 3,
            tags: vec!["live".into(), "piano".into()],
        }]
    );

    let (_, effects) = update(state, Msg::MutationFinished { error: None });
    assert!(matches!(effects.as_slice(), [Effect::RefreshState { .. }]));
}

#[test]
fn local_rows_precede_server_rows() {
    init_logging();
    let state = AppState::new();
    let (state, _) = update(
        state,
        Msg::StateFetched {
            seq: 1,
            state: ServerState {
                queue: vec![
                    ServerQueueEntry {
                        url: Some("https://youtu.be/srv".into()),
                        status: Some("processing".into()),
                    },
                    ServerQueueEntry::default(),
                ],
                ..ServerState::default()
            },
        },
    );
    let (state, _) = submit(state, "https://youtu.be/one", "Music");
    let (state, _) = submit(state, "https://youtu.be/two", "Music");

    let rows: Vec<(String, String)> = state
        .view()
        .queue
        .into_iter()
        .map(|row| (row.url, row.status.as_str().to_string()))
        .collect();
    assert_eq!(
        rows,
        vec![
            ("https://youtu.be/one".into(), "local".into()),
            ("https://youtu.be/two".into(), "local".into()),
            ("https://youtu.be/srv".into(), "processing".into()),
            ("pending".into(), "waiting".into()),
        ]
    );
}

#[test]
fn block_category_rejects_second_submission_after_confirmation() {
    init_logging();
    let (state, _) = submit(AppState::new(), "https://youtu.be/abc", "Music");
    let (state, seq) = dispatch_ok(state);
    let (state, _) = update(
        state,
        Msg::StateFetched {
            seq,
            state: fetched(vec![link(1, "abc", "Music")], &["Music"]),
        },
    );

    let (state, effects) = submit(state, "https://www.youtube.com/watch?v=abc&t=9", "Music");
    assert_eq!(
        effects,
        vec![Effect::Notify(Outcome::Rejected {
            url: "https://www.youtube.com/watch?v=abc&t=9".into(),
            category: "Music".into(),
            reason: RejectReason::DuplicateInCategory,
        })]
    );
    assert_eq!(state.view().pending_count, 0);

    let (state, effects) = submit(state, "https://youtu.be/abc", "Talks");
    assert!(effects.is_empty());
    assert_eq!(state.view().pending_count, 1);
}

#[test]
fn dispatch_time_check_sees_links_that_arrived_after_intake() {
    init_logging();
    let (state, _) = submit(AppState::new(), "https://youtu.be/abc", "Music");
    let (state, _) = update(
        state,
        Msg::StateFetched {
            seq: 1,
            state: fetched(vec![link(1, "abc", "Music")], &["Music"]),
        },
    );

    let (state, effects) = update(state, Msg::DrainTick);
    assert!(matches!(
        effects.as_slice(),
        [Effect::Notify(Outcome::Rejected {
            reason: RejectReason::DuplicateInCategory,
            ..
        })]
    ));
    assert!(state.view().is_settled());
}

#[test]
fn warn_global_warns_at_dispatch_and_still_dispatches() {
    init_logging();
    let state = AppState::new();
    let (state, _) = update(state, Msg::DuplicatePolicyChanged(DuplicatePolicy::WarnGlobal));
    let (state, _) = update(
        state,
        Msg::StateFetched {
            seq: 1,
            state: fetched(vec![link(1, "abc", "Music")], &["Music"]),
        },
    );
    let (state, intake) = submit(state, "https://youtu.be/abc", "Music");
    assert!(intake.is_empty());

    let (_, effects) = update(state, Msg::DrainTick);
    assert!(matches!(
        effects.as_slice(),
        [Effect::Notify(Outcome::Warned { .. }), Effect::Dispatch(_)]
    ));
}

#[test]
fn unsupported_links_never_enter_the_queue() {
    init_logging();
    let (state, effects) = update(
        AppState::new(),
        Msg::SubmitBatch {
            text: "https://example.com/x\n\n  https://youtu.be/ok \n".into(),
            category: None,
            at: 1,
        },
    );
    assert_eq!(
        effects,
        vec![Effect::Notify(Outcome::Rejected {
            url: "https://example.com/x".into(),
            category: "Unsorted".into(),
            reason: RejectReason::UnsupportedLink,
        })]
    );
    let pending: Vec<_> = state.queue().pending().cloned().collect();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].url, "https://youtu.be/ok");
}

#[test]
fn server_config_wins_and_is_persisted() {
    init_logging();
    let state = AppState::new();
    let (state, effects) = update(
        state,
        Msg::StateFetched {
            seq: 1,
            state: ServerState {
                config: ServerConfig {
                    duplicate_policy: Some(DuplicatePolicy::AllowAll),
                    rate_limit_per_second: Some(2),
                    category_order_strategy: Some(CategoryOrder::Alphabetical),
                    ..ServerConfig::default()
                },
                ..ServerState::default()
            },
        },
    );
    assert_eq!(effects, vec![Effect::PersistSettings]);
    let settings = state.settings();
    assert_eq!(settings.duplicate_policy, DuplicatePolicy::AllowAll);
    assert_eq!(settings.rate_limits.per_second, 2);
    assert_eq!(settings.rate_limits.per_minute, 60);
    assert_eq!(settings.category_order, CategoryOrder::Alphabetical);
}

#[test]
fn categories_order_by_recent_activity_then_name() {
    init_logging();
    let (state, _) = update(
        AppState::new(),
        Msg::StateFetched {
            seq: 1,
            state: fetched(
                vec![link(1, "a", "Beta"), link(2, "b", "Beta"), link(3, "c", "Gamma")],
                &["Gamma", "Beta", "Alpha", "Delta"],
            ),
        },
    );
    let (state, _) = update(
        state,
        Msg::CategorySelected {
            name: "Delta".into(),
            at: 500,
        },
    );
    let (state, _) = update(
        state,
        Msg::LinkMoved {
            id: 3,
            category: "Gamma".into(),
            at: 900,
        },
    );

    let names = |state: &AppState| -> Vec<String> {
        state.view().categories.into_iter().map(|c| c.name).collect()
    };
    assert_eq!(names(&state), vec!["Gamma", "Delta", "Alpha", "Beta"]);

    let (state, _) = update(state, Msg::CategoryOrderChanged(CategoryOrder::MostItems));
    assert_eq!(names(&state), vec!["Beta", "Gamma", "Delta", "Alpha"]);

    let (state, _) = update(state, Msg::CategoryOrderChanged(CategoryOrder::Alphabetical));
    assert_eq!(names(&state), vec!["Alpha", "Beta", "Delta", "Gamma"]);
    assert_eq!(state.view().selected_category, "Gamma");
}
