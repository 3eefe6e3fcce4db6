// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon lifecycle: configuration, startup, run until shutdown.

mod startup;
pub use startup::startup;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::env::{il_addr, log_level, state_dir, xc_addr};
use crate::event_manager::EventManager;
use crate::listener::Listener;

/// Daemon configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Root state directory (e.g. ~/.local/state/tm)
    pub state_dir: PathBuf,
    /// Directory that ingested `Log-Filename` files are written under
    pub logs_path: PathBuf,
    /// Path to the daemon's own log file
    pub log_path: PathBuf,
    /// Listen address for the client-facing event channel
    pub xc_addr: String,
    /// Listen address for the log/event ingestion channel
    pub il_addr: String,
    /// Log filter used when `RUST_LOG` is unset
    pub log_level: String,
}

impl Config {
    /// Load configuration from the environment.
    pub fn load() -> Result<Self, LifecycleError> {
        let state_dir = state_dir()?;
        Ok(Self {
            logs_path: state_dir.join("logs"),
            log_path: state_dir.join("daemon.log"),
            xc_addr: xc_addr(),
            il_addr: il_addr(),
            log_level: log_level(),
            state_dir,
        })
    }
}

#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("Could not determine state directory")]
    NoStateDir,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },
}

/// A started daemon: shared services plus bound listeners.
pub struct Daemon {
    pub config: Config,
    pub events: Arc<EventManager>,
    xc: Listener,
    il: Listener,
}

impl Daemon {
    pub fn xc_addr(&self) -> std::io::Result<SocketAddr> {
        self.xc.local_addr()
    }

    pub fn il_addr(&self) -> std::io::Result<SocketAddr> {
        self.il.local_addr()
    }

    /// Serve both channels until `shutdown` is cancelled.
    pub async fn run(self, shutdown: CancellationToken) {
        tokio::join!(self.xc.run(shutdown.clone()), self.il.run(shutdown.clone()));
        info!(clients = self.events.client_count(), "daemon stopped");
    }
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
