// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon startup and initialization logic.

use std::sync::Arc;

use tracing::info;

use crate::event_manager::EventManager;
use crate::handler::{EventChannelHandler, IngestChannelHandler};
use crate::listener::Listener;
use crate::log_ingest::LogIngestor;

use super::{Config, Daemon, LifecycleError};

/// Create directories, build the services and bind both listeners.
pub async fn startup(config: &Config) -> Result<Daemon, LifecycleError> {
    std::fs::create_dir_all(&config.state_dir)?;
    std::fs::create_dir_all(&config.logs_path)?;

    let events = Arc::new(EventManager::new());
    let ingestor = Arc::new(LogIngestor::new(events.clone(), config.logs_path.clone()));

    let xc = bind("xc", &config.xc_addr, Arc::new(EventChannelHandler::new(events.clone()))).await?;
    let il = bind("il", &config.il_addr, Arc::new(IngestChannelHandler::new(ingestor))).await?;

    info!(
        xc = %config.xc_addr,
        il = %config.il_addr,
        logs = %config.logs_path.display(),
        "daemon started"
    );
    Ok(Daemon { config: config.clone(), events, xc, il })
}

async fn bind(
    name: &'static str,
    addr: &str,
    handler: Arc<dyn tm_wire::ConnectionHandler>,
) -> Result<Listener, LifecycleError> {
    Listener::bind(name, addr, handler)
        .await
        .map_err(|source| LifecycleError::Bind { addr: addr.to_string(), source })
}
