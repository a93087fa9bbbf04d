use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::broadcast;
use tokio::time::{timeout, Instant};
use tubequeue_core::{
    normalize, AppState, ConfigPatch, DuplicatePolicy, LinkId, LinkRecord, Msg, Outcome,
    RawSubmission, RejectReason, ServerState,
};
use tubequeue_engine::{
    Backend, BackendError, EngineEvent, EngineHandle, EngineTiming, FailureKind, SubmitReceipt,
};

#[derive(Default)]
struct FakeBackend {
    fail_submissions: bool,
    links: Mutex<Vec<LinkRecord>>,
    dispatched: Mutex<Vec<(Instant, String)>>,
    created_categories: Mutex<Vec<String>>,
    pushed: Mutex<Vec<ConfigPatch>>,
}

impl FakeBackend {
    fn failing() -> Self {
        Self {
            fail_submissions: true,
            ..Self::default()
        }
    }

    fn dispatched(&self) -> Vec<(Instant, String)> {
        self.dispatched.lock().unwrap().clone()
    }
}

#[async_trait]
impl Backend for FakeBackend {
    async fn submit_link(&self, submission: &RawSubmission) -> Result<SubmitReceipt, BackendError> {
        self.dispatched
            .lock()
            .unwrap()
            .push((Instant::now(), submission.url.clone()));
        if self.fail_submissions {
            return Err(BackendError {
                kind: FailureKind::Network,
                message: "connection refused".to_string(),
            });
        }

        let identity = normalize(&submission.url).expect("only valid links are dispatched");
        // Shorts are stored in watch form, like the real backend does.
        let stored = identity
            .as_str()
            .replace("/shorts/", "/watch?v=");
        let mut links = self.links.lock().unwrap();
        let link = LinkRecord::new(
            links.len() as LinkId + 1,
            stored,
            submission.url.clone(),
            [submission.category.clone()],
        );
        links.push(link.clone());
        Ok(SubmitReceipt {
            link: Some(link),
            duplicate: false,
        })
    }

    async fn fetch_state(&self) -> Result<ServerState, BackendError> {
        let links = self.links.lock().unwrap().clone();
        Ok(ServerState {
            links,
            categories: self.created_categories.lock().unwrap().clone(),
            ..ServerState::default()
        })
    }

    async fn push_config(&self, patch: &ConfigPatch) -> Result<(), BackendError> {
        self.pushed.lock().unwrap().push(patch.clone());
        Ok(())
    }

    async fn add_category(&self, name: &str) -> Result<(), BackendError> {
        self.created_categories.lock().unwrap().push(name.to_string());
        Ok(())
    }

    async fn move_link(&self, _id: LinkId, _category: &str) -> Result<(), BackendError> {
        Ok(())
    }

    async fn delete_link(&self, id: LinkId) -> Result<(), BackendError> {
        self.links.lock().unwrap().retain(|link| link.id != id);
        Ok(())
    }

    async fn update_tags(&self, id: LinkId, tags: &[String]) -> Result<(), BackendError> {
        let mut links = self.links.lock().unwrap();
        match links.iter_mut().find(|link| link.id == id) {
            Some(link) => {
                link.tags = tags.to_vec();
                Ok(())
            }
            None => Err(BackendError {
                kind: FailureKind::HttpStatus(404),
                message: "404 Not Found".to_string(),
            }),
        }
    }
}

fn video_url(n: usize) -> String {
    format!("https://www.youtube.com/watch?v=vid{n:03}")
}

async fn collect_outcomes(events: &mut broadcast::Receiver<EngineEvent>, count: usize) -> Vec<Outcome> {
    let mut outcomes = Vec::new();
    timeout(Duration::from_secs(120), async {
        while outcomes.len() < count {
            if let Ok(EngineEvent::Outcome(outcome)) = events.recv().await {
                outcomes.push(outcome);
            }
        }
    })
    .await
    .expect("outcomes arrive");
    outcomes
}

#[tokio::test(start_paused = true)]
async fn dispatches_respect_per_second_budget_in_fifo_order() {
    let backend = Arc::new(FakeBackend::default());
    let start = Instant::now();
    let engine = EngineHandle::spawn(backend.clone(), AppState::new(), EngineTiming::default());
    let mut events = engine.subscribe();

    for n in 0..12 {
        engine.submit(video_url(n), Some("Music".to_string()));
    }

    let outcomes = collect_outcomes(&mut events, 12).await;
    assert!(outcomes
        .iter()
        .all(|outcome| matches!(outcome, Outcome::Accepted { already_existed: false, .. })));

    timeout(Duration::from_secs(30), engine.wait_until_settled())
        .await
        .expect("queue settles");

    let dispatched = backend.dispatched();
    let urls: Vec<String> = dispatched.iter().map(|(_, url)| url.clone()).collect();
    let expected: Vec<String> = (0..12).map(video_url).collect();
    assert_eq!(urls, expected);

    let mut per_second = std::collections::BTreeMap::new();
    for (at, _) in &dispatched {
        *per_second
            .entry(at.duration_since(start).as_millis() / 1000)
            .or_insert(0usize) += 1;
    }
    assert!(per_second.values().all(|&count| count <= 5), "{per_second:?}");
    assert!(per_second.len() >= 3);

    let view = engine.snapshot();
    assert_eq!(view.link_count, 12);
    assert!(view.queue.is_empty());

    let state = engine.shutdown().await.expect("engine stops cleanly");
    assert_eq!(state.links().len(), 12);
}

#[tokio::test(start_paused = true)]
async fn failed_dispatches_are_reported_and_not_retried() {
    let backend = Arc::new(FakeBackend::failing());
    let engine = EngineHandle::spawn(backend.clone(), AppState::new(), EngineTiming::default());
    let mut events = engine.subscribe();

    engine.submit_batch(
        format!("{}\n\n  {}  \n", video_url(1), video_url(2)),
        None,
    );

    let outcomes = collect_outcomes(&mut events, 2).await;
    for outcome in &outcomes {
        match outcome {
            Outcome::Rejected {
                category,
                reason: RejectReason::DispatchFailed(message),
                ..
            } => {
                assert_eq!(category, "Unsorted");
                assert!(message.contains("connection refused"));
            }
            other => panic!("unexpected outcome {other:?}"),
        }
    }

    engine.wait_until_settled().await;
    tokio::time::sleep(Duration::from_secs(3)).await;
    assert_eq!(backend.dispatched().len(), 2);
}

#[tokio::test(start_paused = true)]
async fn unsupported_links_never_reach_the_backend() {
    let backend = Arc::new(FakeBackend::default());
    let engine = EngineHandle::spawn(backend.clone(), AppState::new(), EngineTiming::default());
    let mut events = engine.subscribe();

    engine.submit("https://vimeo.com/12345", Some("Music".to_string()));

    let outcomes = collect_outcomes(&mut events, 1).await;
    assert_eq!(
        outcomes,
        vec![Outcome::Rejected {
            url: "https://vimeo.com/12345".to_string(),
            category: "Music".to_string(),
            reason: RejectReason::UnsupportedLink,
        }]
    );
    engine.wait_until_settled().await;
    assert!(backend.dispatched().is_empty());
}

#[tokio::test(start_paused = true)]
async fn settings_changes_are_published_and_pushed() {
    let backend = Arc::new(FakeBackend::default());
    let engine = EngineHandle::spawn(backend.clone(), AppState::new(), EngineTiming::default());
    let mut events = engine.subscribe();

    engine.send(Msg::DuplicatePolicyChanged(DuplicatePolicy::WarnGlobal));

    let settings = timeout(Duration::from_secs(5), async {
        loop {
            if let Ok(EngineEvent::SettingsChanged(settings)) = events.recv().await {
                return settings;
            }
        }
    })
    .await
    .expect("settings event");
    assert_eq!(settings.duplicate_policy, DuplicatePolicy::WarnGlobal);

    engine.wait_until_settled().await;
    tokio::time::sleep(Duration::from_millis(100)).await;
    let pushed = backend.pushed.lock().unwrap().clone();
    assert_eq!(
        pushed,
        vec![ConfigPatch {
            duplicate_policy: Some(DuplicatePolicy::WarnGlobal),
            ..ConfigPatch::default()
        }]
    );
    assert_eq!(
        engine.snapshot().settings.duplicate_policy,
        DuplicatePolicy::WarnGlobal
    );
}

#[tokio::test(start_paused = true)]
async fn added_category_is_created_and_shows_after_refresh() {
    let backend = Arc::new(FakeBackend::default());
    let engine = EngineHandle::spawn(backend.clone(), AppState::new(), EngineTiming::default());
    let mut view = engine.watch_view();

    engine.send(Msg::CategoryAdded {
        name: "Live Sets".to_string(),
        at: 1_000,
    });

    timeout(
        Duration::from_secs(10),
        view.wait_for(|view| view.categories.iter().any(|row| row.name == "Live Sets")),
    )
    .await
    .expect("category appears")
    .expect("engine running");

    assert_eq!(
        backend.created_categories.lock().unwrap().clone(),
        vec!["Live Sets".to_string()]
    );
}

#[tokio::test(start_paused = true)]
async fn shorts_stored_in_watch_form_still_settle_as_accepted() {
    let backend = Arc::new(FakeBackend::default());
    let engine = EngineHandle::spawn(backend.clone(), AppState::new(), EngineTiming::default());
    let mut events = engine.subscribe();

    engine.submit("https://www.youtube.com/shorts/xyz", Some("Clips".to_string()));

    let outcomes = collect_outcomes(&mut events, 1).await;
    assert!(matches!(
        outcomes.as_slice(),
        [Outcome::Accepted {
            already_existed: false,
            ..
        }]
    ));

    timeout(Duration::from_secs(30), engine.wait_until_settled())
        .await
        .expect("queue settles");
    // Several polls later nothing contradicts the acceptance.
    tokio::time::sleep(Duration::from_secs(20)).await;
    while let Ok(event) = events.try_recv() {
        assert!(
            !matches!(event, EngineEvent::Outcome(_)),
            "unexpected event {event:?}"
        );
    }
    assert_eq!(engine.snapshot().link_count, 1);
}

#[tokio::test(start_paused = true)]
async fn link_edits_reach_the_backend_and_the_mirror() {
    let backend = Arc::new(FakeBackend::default());
    let engine = EngineHandle::spawn(backend.clone(), AppState::new(), EngineTiming::default());
    let mut events = engine.subscribe();

    engine.submit(video_url(1), Some("Music".to_string()));
    engine.submit(video_url(2), Some("Music".to_string()));
    collect_outcomes(&mut events, 2).await;
    engine.wait_until_settled().await;

    engine.send(Msg::TagsEdited {
        id: 1,
        tags: vec![" live ".to_string(), String::new(), "live".to_string(), "piano".to_string()],
    });
    engine.send(Msg::LinkDeleted { id: 2 });

    let mut finished = Vec::new();
    timeout(Duration::from_secs(10), async {
        while finished.len() < 2 {
            if let Ok(EngineEvent::MutationFinished { action, error }) = events.recv().await {
                assert_eq!(error, None);
                finished.push(action);
            }
        }
    })
    .await
    .expect("both edits finish");
    finished.sort_unstable();
    assert_eq!(finished, vec!["delete link", "update tags"]);

    let mut view = engine.watch_view();
    timeout(Duration::from_secs(10), view.wait_for(|view| view.link_count == 1))
        .await
        .expect("deletion shows after refresh")
        .expect("engine running");

    let stored = backend.links.lock().unwrap().clone();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].id, 1);
    assert_eq!(stored[0].tags, vec!["live".to_string(), "piano".to_string()]);
}
