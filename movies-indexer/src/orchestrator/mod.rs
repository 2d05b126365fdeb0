//! Orchestrator module for the movies indexer.
//!
//! Coordinates the extractor, transformer, and loader components and owns the
//! watermark.

use std::sync::Arc;

use movies_indexer_shared::{EntityKind, Watermark};
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tokio::time::Duration;
use tracing::{debug, error, info, instrument, warn};

use crate::errors::EtlError;
use crate::extractor::Extractor;
use crate::loader::SearchLoader;
use crate::state::StateStore;
use crate::transformer::Transformer;

/// Configuration for the orchestrator.
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Time to wait between cycles when no change signal arrives.
    pub poll_interval: Duration,
    /// Kinds synchronized by each cycle, in processing order.
    pub kinds: Vec<EntityKind>,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(10),
            kinds: EntityKind::ALL.to_vec(),
        }
    }
}

/// What the orchestrator is doing right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Waiting for the next trigger.
    Idle,
    /// One cycle in flight.
    Running,
}

/// Why a cycle started.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    /// First cycle after the process started.
    Startup,
    /// The poll interval elapsed.
    Interval,
    /// The catalog announced a change.
    ChangeSignal,
}

/// Outcome of one successful cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleReport {
    pub batches: usize,
    pub rows: usize,
    pub indexed: usize,
    pub rejected: usize,
    /// The watermark persisted at the end of the cycle.
    pub watermark: Watermark,
}

/// Orchestrator that coordinates the sync components.
///
/// The orchestrator:
/// - Runs one cycle at a time (extract, transform, load, checkpoint)
/// - Starts a cycle when the poll interval elapses or a change signal arrives
/// - Ignores change signals that arrive while a cycle is running
/// - Advances the watermark only after every kind of a cycle was loaded
/// - Handles shutdown signals between cycles
pub struct Orchestrator {
    extractor: Extractor,
    transformer: Transformer,
    loader: SearchLoader,
    state: Arc<dyn StateStore>,
    config: OrchestratorConfig,
    phase: Phase,
    signals: Option<mpsc::Receiver<()>>,
    shutdown_tx: broadcast::Sender<()>,
    shutdown_rx: broadcast::Receiver<()>,
}

impl Orchestrator {
    /// Create a new orchestrator with the given components.
    pub fn new(
        extractor: Extractor,
        transformer: Transformer,
        loader: SearchLoader,
        state: Arc<dyn StateStore>,
        config: OrchestratorConfig,
    ) -> Self {
        let (shutdown_tx, shutdown_rx) = broadcast::channel(1);

        Self {
            extractor,
            transformer,
            loader,
            state,
            config,
            phase: Phase::Idle,
            signals: None,
            shutdown_tx,
            shutdown_rx,
        }
    }

    /// Start cycles early whenever a value arrives on `signals`.
    pub fn with_change_signals(mut self, signals: mpsc::Receiver<()>) -> Self {
        self.signals = Some(signals);
        self
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Sender that stops [`Orchestrator::run`] once the current cycle is over.
    ///
    /// Other tasks (the change listener) can `subscribe()` to it to stop
    /// together with the orchestrator.
    pub fn shutdown_handle(&self) -> broadcast::Sender<()> {
        self.shutdown_tx.clone()
    }

    /// Trigger a graceful shutdown.
    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(());
    }

    /// Run the orchestrator.
    ///
    /// Provisions the indices, runs a first cycle, then one cycle per trigger
    /// until shutdown. Aborted cycles are logged and retried on the next
    /// trigger; configuration and logic errors stop the loop and are returned.
    /// Ctrl-C requests a shutdown at any time; a running cycle finishes first.
    #[instrument(skip(self))]
    pub async fn run(&mut self) -> Result<(), EtlError> {
        info!(
            poll_interval_secs = self.config.poll_interval.as_secs_f64(),
            kinds = ?self.config.kinds,
            batch_size = self.extractor.batch_size(),
            "Starting movies indexer orchestrator"
        );

        let interrupt = spawn_interrupt_forwarder(self.shutdown_tx.clone());
        let result = self.run_until_shutdown().await;
        interrupt.abort();
        result
    }

    async fn run_until_shutdown(&mut self) -> Result<(), EtlError> {
        self.loader.ensure_indices(&self.config.kinds).await?;

        let mut trigger = Trigger::Startup;
        loop {
            match self.run_cycle(trigger).await {
                Ok(report) => {
                    info!(
                        trigger = ?trigger,
                        batches = report.batches,
                        rows = report.rows,
                        indexed = report.indexed,
                        rejected = report.rejected,
                        watermark = %report.watermark,
                        "Cycle completed"
                    );
                }
                Err(e) if e.is_fatal() => {
                    error!(error = %e, "Cycle failed with a non-recoverable error");
                    return Err(e);
                }
                Err(e) => {
                    error!(error = %e, "Cycle aborted, watermark unchanged");
                }
            }

            self.drain_signals();

            trigger = match self.wait_for_trigger().await {
                Some(next) => next,
                None => break,
            };
        }

        info!("Orchestrator shutdown complete");
        Ok(())
    }

    /// Run exactly one cycle.
    ///
    /// The watermark written at the end is the time the cycle started, so rows
    /// modified while the cycle ran are picked up by the next one.
    #[instrument(skip(self))]
    pub async fn run_cycle(&mut self, trigger: Trigger) -> Result<CycleReport, EtlError> {
        self.phase = Phase::Running;
        let result = self.execute_cycle().await;
        self.phase = Phase::Idle;
        result
    }

    async fn execute_cycle(&self) -> Result<CycleReport, EtlError> {
        let since = self.state.get().await?;
        let cycle_start = Watermark::now();
        debug!(since = %since, cycle_start = %cycle_start, "Cycle started");

        let mut report = CycleReport::default();

        for kind in &self.config.kinds {
            let mut batches = self.extractor.extract(*kind, since);

            while let Some(rows) = batches.next_batch().await? {
                let documents = self.transformer.transform(&rows);
                let loaded = self.loader.load(&documents).await?;

                report.batches += 1;
                report.rows += rows.len();
                report.indexed += loaded.indexed;
                report.rejected += loaded.rejected;

                debug!(
                    kind = %kind,
                    rows = rows.len(),
                    indexed = loaded.indexed,
                    rejected = loaded.rejected,
                    "Batch loaded"
                );
            }
        }

        let watermark = since.advance_to(cycle_start);
        self.state.set(watermark).await?;
        report.watermark = watermark;

        info!(from = %since, to = %watermark, "Watermark advanced");
        Ok(report)
    }

    /// Discard change signals that arrived while the last cycle was running.
    ///
    /// That cycle already read every change since the watermark.
    fn drain_signals(&mut self) {
        let Some(signals) = self.signals.as_mut() else {
            return;
        };

        let mut ignored = 0;
        while signals.try_recv().is_ok() {
            ignored += 1;
        }
        if ignored > 0 {
            debug!(ignored = ignored, "Coalesced change signals received while running");
        }
    }

    /// Wait in the idle phase. Returns `None` on shutdown.
    async fn wait_for_trigger(&mut self) -> Option<Trigger> {
        let sleep = tokio::time::sleep(self.config.poll_interval);
        tokio::pin!(sleep);

        loop {
            tokio::select! {
                _ = self.shutdown_rx.recv() => {
                    info!("Received shutdown request");
                    return None;
                }
                _ = &mut sleep => return Some(Trigger::Interval),
                signal = next_signal(&mut self.signals) => match signal {
                    Some(()) => return Some(Trigger::ChangeSignal),
                    None => {
                        warn!("Change listener stopped, falling back to polling only");
                        self.signals = None;
                    }
                },
            }
        }
    }
}

/// Turn Ctrl-C into a shutdown request, whether a cycle is running or not.
///
/// The request stays queued on the broadcast channel until the orchestrator
/// is idle again.
fn spawn_interrupt_forwarder(shutdown_tx: broadcast::Sender<()>) -> JoinHandle<()> {
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Received shutdown signal");
                let _ = shutdown_tx.send(());
            }
            Err(e) => warn!(error = %e, "Failed to listen for the interrupt signal"),
        }
    })
}

async fn next_signal(signals: &mut Option<mpsc::Receiver<()>>) -> Option<()> {
    match signals {
        Some(receiver) => receiver.recv().await,
        None => std::future::pending().await,
    }
}
