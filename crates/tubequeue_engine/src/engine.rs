use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use engine_logging::{engine_debug, engine_info, engine_warn};
use tokio::sync::{broadcast, mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tubequeue_core::{
    update, AppState, AppViewModel, DispatchResult, Effect, Msg, Outcome, RawSubmission,
    MAX_UNCONFIRMED_REFRESHES,
};

use crate::{now_ms, Backend, BackendError, EngineEvent};

const EVENT_CAPACITY: usize = 256;

enum Command {
    Apply(Msg),
    /// Answered once every command queued before it has been applied.
    Barrier(oneshot::Sender<()>),
}

/// Periods of the driver's independent timers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineTiming {
    pub drain_tick: Duration,
    pub second_window: Duration,
    pub minute_window: Duration,
    pub poll_interval: Duration,
}

impl Default for EngineTiming {
    fn default() -> Self {
        Self {
            drain_tick: Duration::from_millis(50),
            second_window: Duration::from_secs(1),
            minute_window: Duration::from_secs(60),
            poll_interval: Duration::from_secs(5),
        }
    }
}

/// Handle to the running driver.
///
/// The driver task is the only owner of [`AppState`]: user intents, timer
/// ticks and backend completions all arrive as [`Msg`]s on one channel and are
/// applied one at a time.
pub struct EngineHandle {
    cmd_tx: mpsc::UnboundedSender<Command>,
    event_tx: broadcast::Sender<EngineEvent>,
    view_rx: watch::Receiver<AppViewModel>,
    shutdown: CancellationToken,
    task: JoinHandle<AppState>,
}

impl EngineHandle {
    /// Starts the driver on the current tokio runtime.
    pub fn spawn(backend: Arc<dyn Backend>, state: AppState, timing: EngineTiming) -> Self {
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        let (event_tx, _) = broadcast::channel(EVENT_CAPACITY);
        let (view_tx, view_rx) = watch::channel(state.view());
        let shutdown = CancellationToken::new();

        let driver = Driver {
            backend,
            cmd_tx: cmd_tx.clone(),
            event_tx: event_tx.clone(),
            view_tx,
        };
        let task = tokio::spawn(driver.run(state, cmd_rx, timing, shutdown.clone()));

        Self {
            cmd_tx,
            event_tx,
            view_rx,
            shutdown,
            task,
        }
    }

    pub fn send(&self, msg: Msg) {
        let _ = self.cmd_tx.send(Command::Apply(msg));
    }

    pub fn submit(&self, url: impl Into<String>, category: Option<String>) {
        self.send(Msg::Submit {
            url: url.into(),
            category,
            at: now_ms(),
        });
    }

    /// Submits pasted or dropped text, one link per line.
    pub fn submit_batch(&self, text: impl Into<String>, category: Option<String>) {
        self.send(Msg::SubmitBatch {
            text: text.into(),
            category,
            at: now_ms(),
        });
    }

    /// Outcome and settings events. Subscribe before submitting to see every outcome.
    pub fn subscribe(&self) -> broadcast::Receiver<EngineEvent> {
        self.event_tx.subscribe()
    }

    /// Latest published view.
    pub fn snapshot(&self) -> AppViewModel {
        self.view_rx.borrow().clone()
    }

    pub fn watch_view(&self) -> watch::Receiver<AppViewModel> {
        self.view_rx.clone()
    }

    /// Resolves once the first refresh has been applied.
    pub async fn wait_until_synced(&self) {
        let mut view_rx = self.view_rx.clone();
        let _ = view_rx.wait_for(|view| view.synced).await;
    }

    /// Resolves once everything sent so far has been applied and no local
    /// submission is pending, in flight or awaiting confirmation.
    pub async fn wait_until_settled(&self) {
        let (done_tx, done_rx) = oneshot::channel();
        if self.cmd_tx.send(Command::Barrier(done_tx)).is_err() || done_rx.await.is_err() {
            return;
        }
        let mut view_rx = self.view_rx.clone();
        // Err means the driver stopped; nothing more will change.
        let _ = view_rx.wait_for(AppViewModel::is_settled).await;
    }

    /// Stops scheduling ticks and returns the final state. Calls already sent
    /// to the backend complete on their own.
    pub async fn shutdown(self) -> Option<AppState> {
        self.shutdown.cancel();
        match self.task.await {
            Ok(state) => Some(state),
            Err(err) => {
                engine_warn!("Engine task ended abnormally: {}", err);
                None
            }
        }
    }
}

struct Driver {
    backend: Arc<dyn Backend>,
    cmd_tx: mpsc::UnboundedSender<Command>,
    event_tx: broadcast::Sender<EngineEvent>,
    view_tx: watch::Sender<AppViewModel>,
}

impl Driver {
    async fn run(
        self,
        mut state: AppState,
        mut cmd_rx: mpsc::UnboundedReceiver<Command>,
        timing: EngineTiming,
        shutdown: CancellationToken,
    ) -> AppState {
        let mut drain = interval(timing.drain_tick);
        drain.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut second = interval(timing.second_window);
        let mut minute = interval(timing.minute_window);
        let mut poll = interval(timing.poll_interval);
        poll.set_missed_tick_behavior(MissedTickBehavior::Delay);

        engine_info!(
            "Engine started: drain every {:?}, poll every {:?}",
            timing.drain_tick,
            timing.poll_interval
        );

        loop {
            // Window resets win ties with a drain tick due at the same instant.
            let msg = tokio::select! {
                biased;
                _ = shutdown.cancelled() => break,
                _ = second.tick() => Msg::SecondWindowElapsed,
                _ = minute.tick() => Msg::MinuteWindowElapsed,
                Some(command) = cmd_rx.recv() => match command {
                    Command::Apply(msg) => msg,
                    Command::Barrier(done) => {
                        let _ = done.send(());
                        continue;
                    }
                },
                _ = drain.tick() => Msg::DrainTick,
                _ = poll.tick() => Msg::PollElapsed,
            };

            let (next, effects) = update(state, msg);
            state = next;
            for effect in effects {
                self.execute(effect, &state);
            }
            if state.consume_dirty() {
                self.view_tx.send_replace(state.view());
            }
        }

        engine_info!(
            "Engine stopped with {} pending submission(s)",
            state.queue().pending_len()
        );
        state
    }

    fn execute(&self, effect: Effect, state: &AppState) {
        match effect {
            Effect::Dispatch(submission) => self.dispatch(submission),
            Effect::RefreshState { seq } => {
                let backend = self.backend.clone();
                let cmd_tx = self.cmd_tx.clone();
                let event_tx = self.event_tx.clone();
                tokio::spawn(async move {
                    let msg = match backend.fetch_state().await {
                        Ok(fetched) => {
                            engine_debug!(
                                "Refresh #{} returned {} link(s), {} queued",
                                seq,
                                fetched.links.len(),
                                fetched.queue.len()
                            );
                            Msg::StateFetched {
                                seq,
                                state: fetched,
                            }
                        }
                        Err(err) => {
                            engine_warn!("Refresh #{} failed: {}", seq, err);
                            let _ = event_tx.send(EngineEvent::RefreshFailed(err.to_string()));
                            Msg::StateFetchFailed {
                                seq,
                                error: err.to_string(),
                            }
                        }
                    };
                    let _ = cmd_tx.send(Command::Apply(msg));
                });
            }
            Effect::PushConfig(patch) => {
                let backend = self.backend.clone();
                self.mutate("push config", async move { backend.push_config(&patch).await });
            }
            Effect::CreateCategory { name } => {
                let backend = self.backend.clone();
                self.mutate("create category", async move {
                    backend.add_category(&name).await
                });
            }
            Effect::MoveLink { id, category } => {
                let backend = self.backend.clone();
                self.mutate("move link", async move {
                    backend.move_link(id, &category).await
                });
            }
            Effect::DeleteLink { id } => {
                let backend = self.backend.clone();
                self.mutate("delete link", async move { backend.delete_link(id).await });
            }
            Effect::UpdateTags { id, tags } => {
                let backend = self.backend.clone();
                self.mutate("update tags", async move {
                    backend.update_tags(id, &tags).await
                });
            }
            Effect::ReportUnconfirmed(submission) => {
                engine_warn!(
                    "Dropping {} ({}) from the local queue: missing from {} refreshes",
                    submission.url,
                    submission.category,
                    MAX_UNCONFIRMED_REFRESHES
                );
            }
            Effect::Notify(outcome) => {
                log_outcome(&outcome);
                let _ = self.event_tx.send(EngineEvent::Outcome(outcome));
            }
            Effect::PersistSettings => {
                let _ = self
                    .event_tx
                    .send(EngineEvent::SettingsChanged(state.settings().clone()));
            }
        }
    }

    fn dispatch(&self, submission: RawSubmission) {
        let backend = self.backend.clone();
        let cmd_tx = self.cmd_tx.clone();
        engine_info!(
            "Dispatching url={} category={}",
            submission.url,
            submission.category
        );
        tokio::spawn(async move {
            let result = match backend.submit_link(&submission).await {
                Ok(receipt) => DispatchResult::Created {
                    link: receipt.link,
                    duplicate: receipt.duplicate,
                },
                Err(err) if err.is_conflict() => DispatchResult::Conflict,
                Err(err) => DispatchResult::Failed(err.to_string()),
            };
            let _ = cmd_tx.send(Command::Apply(Msg::DispatchFinished {
                result,
                at: now_ms(),
            }));
        });
    }

    fn mutate<F>(&self, action: &'static str, call: F)
    where
        F: Future<Output = Result<(), BackendError>> + Send + 'static,
    {
        let cmd_tx = self.cmd_tx.clone();
        let event_tx = self.event_tx.clone();
        tokio::spawn(async move {
            let error = match call.await {
                Ok(()) => {
                    engine_info!("{} succeeded", action);
                    None
                }
                Err(err) => {
                    engine_warn!("{} failed: {}", action, err);
                    Some(err.to_string())
                }
            };
            let _ = event_tx.send(EngineEvent::MutationFinished {
                action,
                error: error.clone(),
            });
            let _ = cmd_tx.send(Command::Apply(Msg::MutationFinished { error }));
        });
    }
}

fn log_outcome(outcome: &Outcome) {
    match outcome {
        Outcome::Accepted { .. } => engine_info!("{}", outcome),
        Outcome::Warned { .. } | Outcome::Rejected { .. } => engine_warn!("{}", outcome),
    }
}
