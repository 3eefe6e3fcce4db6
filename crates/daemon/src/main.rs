// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! tmd: notification daemon.

use tm_daemon::{logging, startup, Config, LifecycleError};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<(), LifecycleError> {
    let config = Config::load()?;
    let _log_guard = logging::init(&config.log_path, &config.log_level)?;

    let daemon = match startup(&config).await {
        Ok(daemon) => daemon,
        Err(e) => {
            error!(error = %e, "startup failed");
            return Err(e);
        }
    };

    let shutdown = CancellationToken::new();
    let signal = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("interrupt received, shutting down");
        }
        signal.cancel();
    });

    daemon.run(shutdown).await;
    Ok(())
}
