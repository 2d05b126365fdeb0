//! Change signal listener.
//!
//! Subscribes to a PostgreSQL `LISTEN` channel and wakes the orchestrator when
//! a notification arrives. Payloads are ignored; a notification only means
//! "something may have changed".

use std::time::Duration;

use movies_indexer_repository::SourceError;
use sqlx::postgres::PgListener;
use tokio::sync::{broadcast, mpsc};
use tokio::time::sleep;
use tracing::{debug, info, warn};

/// Forwards catalog notifications to the orchestrator's signal channel.
pub struct ChangeListener {
    pool: sqlx::PgPool,
    channel: String,
    retry_interval: Duration,
    signals: mpsc::Sender<()>,
}

impl ChangeListener {
    pub fn new(
        pool: sqlx::PgPool,
        channel: impl Into<String>,
        retry_interval: Duration,
        signals: mpsc::Sender<()>,
    ) -> Self {
        Self {
            pool,
            channel: channel.into(),
            retry_interval,
            signals,
        }
    }

    /// Listen until `shutdown` fires or the orchestrator goes away.
    ///
    /// A failed subscription is logged and re-established after the retry
    /// interval; polling keeps the pipeline going meanwhile.
    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) {
        loop {
            match self.listen(&mut shutdown).await {
                Ok(()) => {
                    info!(channel = %self.channel, "Change listener stopped");
                    return;
                }
                Err(e) => {
                    warn!(
                        channel = %self.channel,
                        error = %e,
                        retry_interval_secs = self.retry_interval.as_secs(),
                        "Change listener failed, reconnecting..."
                    );
                }
            }

            tokio::select! {
                _ = shutdown.recv() => return,
                _ = sleep(self.retry_interval) => {}
            }
        }
    }

    async fn listen(&self, shutdown: &mut broadcast::Receiver<()>) -> Result<(), SourceError> {
        let mut listener = PgListener::connect_with(&self.pool).await?;
        listener.listen(&self.channel).await?;
        info!(channel = %self.channel, "Listening for change notifications");

        loop {
            tokio::select! {
                _ = shutdown.recv() => return Ok(()),
                notification = listener.recv() => {
                    let notification = notification?;
                    debug!(
                        channel = %self.channel,
                        payload = notification.payload(),
                        "Change notification received"
                    );
                    if !self.notify() {
                        return Ok(());
                    }
                }
            }
        }
    }

    /// Raise a trigger. Returns `false` once nobody is listening any more.
    ///
    /// The channel holds at most one pending trigger; further notifications
    /// before the orchestrator wakes up fold into it.
    fn notify(&self) -> bool {
        match self.signals.try_send(()) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(())) => true,
            Err(mpsc::error::TrySendError::Closed(())) => false,
        }
    }
}
