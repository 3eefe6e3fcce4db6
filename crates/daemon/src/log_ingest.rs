// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Log/event ingestion channel.
//!
//! Accepts `LOG` notifications, optionally appends their body to a file under
//! the logs directory (named by the `Log-Filename` header), then fans them out
//! through the [`EventManager`].

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use thiserror::Error;
use tm_core::Method;
use tm_wire::headers::LOG_FILENAME;
use tm_wire::{Envelope, Request};
use tracing::{debug, warn};

use crate::event_manager::{DispatchReport, EventManager};

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("unsupported method on ingestion channel: {0}")]
    UnsupportedMethod(Method),

    #[error("refusing log filename {0:?}")]
    InvalidLogFilename(String),

    #[error("failed to append to {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Outcome of ingesting one `LOG` notification.
#[derive(Debug, Default)]
pub struct IngestReport {
    /// File the body was appended to.
    pub log_file: Option<PathBuf>,
    /// Why the append was skipped or failed; dispatch still happened.
    pub append_error: Option<IngestError>,
    pub dispatch: DispatchReport,
}

pub struct LogIngestor {
    events: Arc<EventManager>,
    logs_dir: PathBuf,
}

impl LogIngestor {
    pub fn new(events: Arc<EventManager>, logs_dir: impl Into<PathBuf>) -> Self {
        Self { events, logs_dir: logs_dir.into() }
    }

    pub fn logs_dir(&self) -> &Path {
        &self.logs_dir
    }

    pub fn ingest(&self, notification: &Request) -> Result<IngestReport, IngestError> {
        if notification.method() != &Method::Log {
            return Err(IngestError::UnsupportedMethod(notification.method().clone()));
        }

        let mut report = IngestReport::default();
        if let Some(name) = notification.header(LOG_FILENAME) {
            match self.append(name, notification.body()) {
                Ok(path) => report.log_file = Some(path),
                Err(e) => {
                    warn!(error = %e, "log append skipped");
                    report.append_error = Some(e);
                }
            }
        }
        report.dispatch = self.events.dispatch(notification);
        debug!(uri = %notification.uri(), delivered = report.dispatch.delivered, "log ingested");
        Ok(report)
    }

    fn append(&self, name: &str, body: &[u8]) -> Result<PathBuf, IngestError> {
        let path = self.resolve(name)?;
        let io_err = |source| IngestError::Io { path: path.clone(), source };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }
        let mut file = OpenOptions::new().create(true).append(true).open(&path).map_err(io_err)?;
        file.write_all(body).map_err(io_err)?;
        Ok(path)
    }

    /// Only plain relative paths stay inside the logs directory.
    fn resolve(&self, name: &str) -> Result<PathBuf, IngestError> {
        let relative = Path::new(name);
        let plain = relative.components().all(|c| matches!(c, Component::Normal(_)));
        if name.is_empty() || !plain {
            return Err(IngestError::InvalidLogFilename(name.to_string()));
        }
        Ok(self.logs_dir.join(relative))
    }
}

#[cfg(test)]
#[path = "log_ingest_tests.rs"]
mod tests;
