use std::io::{self, Read};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use engine_logging::{engine_info, engine_warn};
use tokio::sync::broadcast::{self, error::RecvError};
use tubequeue_core::{
    normalize, AppState, CategoryOrder, DuplicatePolicy, LinkId, Msg, Outcome, RateLimits,
};
use tubequeue_engine::{
    now_ms, BackendSettings, EngineEvent, EngineHandle, EngineTiming, ReqwestBackend,
};

use crate::cli::{Cli, CliCommand};
use crate::persistence::{load_settings, save_settings};
use crate::render::{outcome_line, settings_block, status_report};

/// Refresh failures tolerated while waiting for submissions to settle.
const MAX_REFRESH_FAILURES: usize = 3;

/// Tallies of the outcomes printed during one command.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct OutcomeTally {
    pub accepted: usize,
    pub warned: usize,
    pub rejected: usize,
}

impl OutcomeTally {
    fn record(&mut self, outcome: &Outcome) {
        match outcome {
            Outcome::Accepted { .. } => self.accepted += 1,
            Outcome::Warned { .. } => self.warned += 1,
            Outcome::Rejected { .. } => self.rejected += 1,
        }
    }
}

/// Runs the parsed command. `Ok(false)` means it completed but some items were rejected.
pub async fn run(cli: Cli) -> Result<bool> {
    let Cli {
        server,
        state_dir,
        command,
        ..
    } = cli;

    match command {
        CliCommand::Normalize { urls } => {
            let mut all_supported = true;
            for url in urls {
                match normalize(&url) {
                    Some(identity) => println!("{identity}"),
                    None => {
                        all_supported = false;
                        println!("unsupported link: {url}");
                    }
                }
            }
            Ok(all_supported)
        }
        CliCommand::Submit { category, urls } => {
            let text = if urls.is_empty() {
                let mut buffer = String::new();
                io::stdin()
                    .read_to_string(&mut buffer)
                    .context("reading links from stdin")?;
                buffer
            } else {
                urls.join("\n")
            };
            let mut session = Session::start(&server, state_dir).await?;
            let tally = session.submit(text, category).await?;
            session.finish().await;
            println!(
                "{} added, {} warned, {} rejected",
                tally.accepted, tally.warned, tally.rejected
            );
            Ok(tally.rejected == 0)
        }
        CliCommand::Status => {
            let session = Session::start(&server, state_dir).await?;
            print!("{}", status_report(&session.engine.snapshot()));
            session.finish().await;
            Ok(true)
        }
        CliCommand::Config {
            duplicate_policy,
            per_second,
            per_minute,
            category_order,
        } => {
            let mut session = Session::start(&server, state_dir).await?;
            let changes = config_messages(
                session.engine.snapshot().settings.rate_limits,
                duplicate_policy,
                per_second,
                per_minute,
                category_order,
            );
            let pushes = changes.len();
            for msg in changes {
                session.engine.send(msg);
            }
            let ok = session.await_mutations(pushes).await?;
            print!("{}", settings_block(&session.engine.snapshot().settings));
            session.finish().await;
            Ok(ok)
        }
        CliCommand::AddCategory { name } => {
            let mut session = Session::start(&server, state_dir).await?;
            session.engine.send(Msg::CategoryAdded { name, at: now_ms() });
            let ok = session.await_mutations(1).await?;
            session.finish().await;
            Ok(ok)
        }
        CliCommand::MoveLink { id, category } => {
            let mut session = Session::start(&server, state_dir).await?;
            session.engine.send(move_link(id, category));
            let ok = session.await_mutations(1).await?;
            session.finish().await;
            Ok(ok)
        }
        CliCommand::DeleteLink { id } => {
            let mut session = Session::start(&server, state_dir).await?;
            session.engine.send(Msg::LinkDeleted { id });
            let ok = session.await_mutations(1).await?;
            session.finish().await;
            Ok(ok)
        }
        CliCommand::Tag { id, tags } => {
            let mut session = Session::start(&server, state_dir).await?;
            session.engine.send(Msg::TagsEdited { id, tags });
            let ok = session.await_mutations(1).await?;
            session.finish().await;
            Ok(ok)
        }
    }
}

/// One message per changed setting, so each push carries only its own field.
pub fn config_messages(
    current: RateLimits,
    duplicate_policy: Option<DuplicatePolicy>,
    per_second: Option<u32>,
    per_minute: Option<u32>,
    category_order: Option<CategoryOrder>,
) -> Vec<Msg> {
    let mut messages = Vec::new();
    if let Some(policy) = duplicate_policy {
        messages.push(Msg::DuplicatePolicyChanged(policy));
    }
    if per_second.is_some() || per_minute.is_some() {
        messages.push(Msg::RateLimitsChanged(RateLimits {
            per_second: per_second.unwrap_or(current.per_second),
            per_minute: per_minute.unwrap_or(current.per_minute),
        }));
    }
    if let Some(order) = category_order {
        messages.push(Msg::CategoryOrderChanged(order));
    }
    messages
}

fn move_link(id: LinkId, category: String) -> Msg {
    Msg::LinkMoved {
        id,
        category,
        at: now_ms(),
    }
}

/// A running engine plus the event stream this command reports from.
struct Session {
    engine: EngineHandle,
    reporter: Reporter,
}

impl Session {
    /// Starts the engine with the saved settings and waits for the first refresh.
    async fn start(server: &str, state_dir: PathBuf) -> Result<Self> {
        let backend = ReqwestBackend::new(BackendSettings {
            base_url: server.to_string(),
            ..BackendSettings::default()
        })
        .with_context(|| format!("invalid backend url {server}"))?;
        engine_info!("Using backend {}", backend.base_url());

        let state = AppState::with_settings(load_settings(&state_dir));
        let engine = EngineHandle::spawn(Arc::new(backend), state, EngineTiming::default());
        let reporter = Reporter {
            events: engine.subscribe(),
            state_dir,
            tally: OutcomeTally::default(),
        };
        let mut session = Self { engine, reporter };
        session.sync().await?;
        Ok(session)
    }

    async fn sync(&mut self) -> Result<()> {
        let synced = self.engine.wait_until_synced();
        tokio::pin!(synced);
        loop {
            tokio::select! {
                _ = &mut synced => return Ok(()),
                event = self.reporter.events.recv() => {
                    if let Some(EngineEvent::RefreshFailed(error)) = self.reporter.handle(event)? {
                        bail!("backend unavailable: {error}");
                    }
                }
            }
        }
    }

    async fn submit(&mut self, text: String, category: Option<String>) -> Result<OutcomeTally> {
        self.engine.submit_batch(text, category);

        let mut refresh_failures = 0;
        let settled = self.engine.wait_until_settled();
        tokio::pin!(settled);
        loop {
            tokio::select! {
                _ = &mut settled => break,
                event = self.reporter.events.recv() => {
                    if let Some(EngineEvent::RefreshFailed(error)) = self.reporter.handle(event)? {
                        refresh_failures += 1;
                        if refresh_failures >= MAX_REFRESH_FAILURES {
                            bail!("backend stopped answering refreshes: {error}");
                        }
                    }
                }
            }
        }
        // Outcomes published in the same step that settled the queue.
        while let Ok(event) = self.reporter.events.try_recv() {
            self.reporter.handle(Ok(event))?;
        }
        Ok(self.reporter.tally)
    }

    /// Waits for `count` backend mutations; returns whether all of them succeeded.
    async fn await_mutations(&mut self, count: usize) -> Result<bool> {
        let mut remaining = count;
        let mut all_ok = true;
        while remaining > 0 {
            let event = self.reporter.events.recv().await;
            if let Some(EngineEvent::MutationFinished { action, error }) =
                self.reporter.handle(event)?
            {
                remaining -= 1;
                match error {
                    Some(error) => {
                        all_ok = false;
                        eprintln!("{action} failed: {error}");
                    }
                    None => println!("{action}: done"),
                }
            }
        }
        Ok(all_ok)
    }

    async fn finish(self) {
        if self.engine.shutdown().await.is_none() {
            engine_warn!("Engine did not shut down cleanly");
        }
    }
}

struct Reporter {
    events: broadcast::Receiver<EngineEvent>,
    state_dir: PathBuf,
    tally: OutcomeTally,
}

impl Reporter {
    /// Reports outcomes and saves settings; hands other events back to the caller.
    fn handle(&mut self, event: Result<EngineEvent, RecvError>) -> Result<Option<EngineEvent>> {
        match event {
            Ok(EngineEvent::Outcome(outcome)) => {
                self.tally.record(&outcome);
                println!("{}", outcome_line(&outcome));
                Ok(None)
            }
            Ok(EngineEvent::SettingsChanged(settings)) => {
                save_settings(&self.state_dir, &settings);
                Ok(None)
            }
            Ok(other) => Ok(Some(other)),
            Err(RecvError::Lagged(skipped)) => {
                engine_warn!("Missed {} engine event(s)", skipped);
                Ok(None)
            }
            Err(RecvError::Closed) => bail!("engine stopped unexpectedly"),
        }
    }
}
