// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Notification daemon library
//!
//! Hosts the event manager, log ingestion and the two listening channels:
//! `xc` for subscribing clients and `il` for probes and agents pushing
//! logs and events.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod env;
pub mod event_manager;
pub mod handler;
pub mod lifecycle;
pub mod listener;
pub mod log_ingest;
pub mod logging;

pub use event_manager::{DeliveryFailure, DispatchReport, EventManager};
pub use handler::{EventChannelHandler, IngestChannelHandler};
pub use lifecycle::{startup, Config, Daemon, LifecycleError};
pub use listener::Listener;
pub use log_ingest::{IngestError, IngestReport, LogIngestor};
