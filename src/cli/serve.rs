use std::time::Duration;

use anyhow::Context;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::db::{get_connection, init_db};
use crate::error::{BudgetError, Result};
use crate::scheduler::Scheduler;
use crate::settings::{load_settings, DB_FILE};

/// How long shutdown waits for a pass still running on the blocking pool.
/// An unfinished pass is rolled back when the process exits.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

pub fn run() -> Result<()> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    let result = runtime.block_on(serve());
    runtime.shutdown_timeout(SHUTDOWN_GRACE);
    result.map_err(|e| BudgetError::Scheduler(format!("{e:#}")))
}

async fn serve() -> anyhow::Result<()> {
    let settings = load_settings();
    let db_path = std::path::PathBuf::from(&settings.data_dir).join(DB_FILE);
    std::fs::create_dir_all(&settings.data_dir)
        .with_context(|| format!("cannot create data dir {}", settings.data_dir))?;
    let conn = get_connection(&db_path).context("cannot open database")?;
    init_db(&conn).context("cannot initialize database")?;
    drop(conn);

    let cancel = CancellationToken::new();
    let handle = Scheduler::new(&db_path, cancel.child_token())
        .with_interval(settings.interval())
        .with_pass_timeout(settings.pass_timeout())
        .spawn();

    tokio::signal::ctrl_c().await.context("cannot listen for Ctrl-C")?;
    info!("shutdown requested");
    cancel.cancel();
    handle.await.context("materializer task failed")?;
    info!("pennywise shut down cleanly");
    Ok(())
}
