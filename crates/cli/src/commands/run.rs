use std::sync::Arc;

use anyhow::Result;
use casker_core::reporting::ConsoleReporter;
use casker_core::TaskManager;
use tokio_util::sync::CancellationToken;

pub async fn execute(manager: &TaskManager, task: &str) -> Result<()> {
    let shutdown = CancellationToken::new();

    let interrupt = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::debug!("interrupt received, tearing down");
            interrupt.cancel();
        }
    });

    manager
        .run_task(task, Arc::new(ConsoleReporter), shutdown)
        .await?;

    Ok(())
}
