//! Background loop that runs a materialization pass once per interval.
//!
//! The first pass runs as soon as the loop starts, for today's local date;
//! later passes follow every `interval` (24 h by default). A failed, panicked
//! or timed-out pass is logged and reported, and the loop keeps going: the
//! next scheduled pass is the retry. Passes are idempotent, so an extra pass
//! after a restart creates nothing new.
//!
//! ```rust,ignore
//! let cancel = CancellationToken::new();
//! let handle = Scheduler::new(db_path, cancel.child_token()).spawn();
//! // ... on shutdown:
//! cancel.cancel();
//! handle.await?;
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::NaiveDate;
use tokio::sync::mpsc;
use tokio::task::{JoinError, JoinHandle};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::db::get_connection;
use crate::error::{BudgetError, Result};
use crate::materializer::{materialize, MaterializeReport};
use crate::schedule;

pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(24 * 60 * 60);
pub const DEFAULT_PASS_TIMEOUT: Duration = Duration::from_secs(300);

/// Result of one scheduled pass, published to an optional observer.
#[derive(Debug)]
pub struct PassOutcome {
    pub date: NaiveDate,
    pub result: Result<MaterializeReport>,
}

pub struct Scheduler {
    db_path: PathBuf,
    cancel: CancellationToken,
    interval: Duration,
    pass_timeout: Duration,
    today: fn() -> NaiveDate,
    outcome_tx: Option<mpsc::UnboundedSender<PassOutcome>>,
}

type PassResult = std::result::Result<Result<MaterializeReport>, JoinError>;

/// A pass that outlived its timeout and is still on the blocking pool.
struct InFlight {
    date: NaiveDate,
    handle: JoinHandle<Result<MaterializeReport>>,
}

fn run_pass_blocking(db_path: &Path, date: NaiveDate) -> Result<MaterializeReport> {
    let mut conn = get_connection(db_path)?;
    materialize(&mut conn, date)
}

impl Scheduler {
    /// Create a scheduler for the database at `db_path`. The loop stops when
    /// `cancel` is cancelled.
    pub fn new(db_path: impl Into<PathBuf>, cancel: CancellationToken) -> Self {
        Self {
            db_path: db_path.into(),
            cancel,
            interval: DEFAULT_INTERVAL,
            pass_timeout: DEFAULT_PASS_TIMEOUT,
            today: schedule::today,
            outcome_tx: None,
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn with_pass_timeout(mut self, timeout: Duration) -> Self {
        self.pass_timeout = timeout;
        self
    }

    /// Override the source of "today" (tests pin the date).
    pub fn with_clock(mut self, today: fn() -> NaiveDate) -> Self {
        self.today = today;
        self
    }

    /// Publish every pass outcome on `tx`.
    pub fn with_outcomes(mut self, tx: mpsc::UnboundedSender<PassOutcome>) -> Self {
        self.outcome_tx = Some(tx);
        self
    }

    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    /// Run until the cancellation token fires.
    pub async fn run(self) {
        info!(
            db = %self.db_path.display(),
            interval_secs = self.interval.as_secs(),
            "recurring materializer started"
        );
        let mut in_flight: Option<InFlight> = None;

        loop {
            let date = (self.today)();
            in_flight = match in_flight.take() {
                Some(pending) if !pending.handle.is_finished() => {
                    warn!(%date, pending = %pending.date, "previous pass still running, skipping this one");
                    self.publish(date, Err(BudgetError::PassInFlight));
                    Some(pending)
                }
                Some(pending) => {
                    // Finished, so this await returns at once.
                    let joined = pending.handle.await;
                    info!(date = %pending.date, "timed-out pass completed late");
                    self.settle(pending.date, joined);
                    self.run_pass(date).await
                }
                None => self.run_pass(date).await,
            };

            tokio::select! {
                _ = self.cancel.cancelled() => {
                    info!("recurring materializer stopped");
                    break;
                }
                _ = tokio::time::sleep(self.interval) => {}
            }
        }
    }

    /// Run one pass on the blocking pool. Returns the pass when it timed out
    /// or shutdown was requested while it was still running.
    async fn run_pass(&self, date: NaiveDate) -> Option<InFlight> {
        let db_path = self.db_path.clone();
        let mut handle = tokio::task::spawn_blocking(move || run_pass_blocking(&db_path, date));

        let waited = tokio::select! {
            _ = self.cancel.cancelled() => None,
            joined = tokio::time::timeout(self.pass_timeout, &mut handle) => Some(joined),
        };
        match waited {
            None => {
                warn!(%date, "shutdown requested while a pass is running, not waiting for it");
                Some(InFlight { date, handle })
            }
            Some(Ok(joined)) => {
                self.settle(date, joined);
                None
            }
            Some(Err(_)) => {
                let ms = self.pass_timeout.as_millis() as u64;
                warn!(%date, timeout_ms = ms, "materialization pass timed out");
                self.publish(date, Err(BudgetError::PassTimeout(ms)));
                Some(InFlight { date, handle })
            }
        }
    }

    /// Log and publish the result of a pass that has completed.
    fn settle(&self, date: NaiveDate, joined: PassResult) {
        let result = match joined {
            Ok(Ok(report)) => {
                info!(
                    %date,
                    created = report.created,
                    already_materialized = report.already_materialized,
                    "materialization pass finished"
                );
                Ok(report)
            }
            Ok(Err(e)) => {
                error!(%date, error = %e, "materialization pass failed");
                Err(e)
            }
            Err(join_err) => {
                error!(%date, error = %join_err, "materialization pass panicked");
                Err(BudgetError::Scheduler(format!("pass panicked: {join_err}")))
            }
        };
        self.publish(date, result);
    }

    fn publish(&self, date: NaiveDate, result: Result<MaterializeReport>) {
        if let Some(tx) = &self.outcome_tx {
            // No receiver is not an error.
            let _ = tx.send(PassOutcome { date, result });
        }
    }
}
