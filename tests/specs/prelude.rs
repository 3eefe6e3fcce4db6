// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared harness: a daemon on ephemeral ports and raw wire peers.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

pub use tm_client::{AgentControllerClient, ClientConfig, ClientEvent};
pub use tm_core::{Method, Uri};
pub use tm_wire::{Envelope, Message, Request, Response};

use tm_daemon::{startup, Config, EventManager};
use tokio::net::TcpStream;
use tokio_util::sync::CancellationToken;

pub const WAIT: Duration = Duration::from_secs(2);

pub fn uri(s: &str) -> Uri {
    s.parse().unwrap()
}

/// A daemon serving both channels until dropped.
pub struct TestDaemon {
    pub xc: SocketAddr,
    pub il: SocketAddr,
    pub events: Arc<EventManager>,
    pub logs: std::path::PathBuf,
    shutdown: CancellationToken,
    _dir: tempfile::TempDir,
}

impl TestDaemon {
    pub async fn start() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let config = Config {
            state_dir: dir.path().to_path_buf(),
            logs_path: dir.path().join("logs"),
            log_path: dir.path().join("daemon.log"),
            xc_addr: "127.0.0.1:0".to_string(),
            il_addr: "127.0.0.1:0".to_string(),
            log_level: "debug".to_string(),
        };
        let daemon = startup(&config).await.unwrap();
        let xc = daemon.xc_addr().unwrap();
        let il = daemon.il_addr().unwrap();
        let events = daemon.events.clone();
        let shutdown = CancellationToken::new();
        tokio::spawn(daemon.run(shutdown.clone()));
        Self { xc, il, events, logs: config.logs_path, shutdown, _dir: dir }
    }
}

impl Drop for TestDaemon {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

/// A bare socket speaking framed messages, for driving the daemon directly.
pub struct Peer {
    stream: TcpStream,
}

impl Peer {
    pub async fn connect(addr: SocketAddr) -> Self {
        Self { stream: TcpStream::connect(addr).await.unwrap() }
    }

    pub async fn send(&mut self, message: impl Into<Message>) {
        let bytes = tm_wire::encode(&message.into());
        tm_wire::write_message(&mut self.stream, &bytes).await.unwrap();
    }

    pub async fn notify(&mut self, method: Method, target: &str) {
        self.send(Request::notification(method, uri(target), "Xc", "1.0")).await;
    }

    pub async fn recv(&mut self) -> Message {
        let data = tokio::time::timeout(WAIT, tm_wire::read_message(&mut self.stream))
            .await
            .expect("timed out waiting for a message")
            .unwrap();
        tm_wire::parse(&data).unwrap()
    }

    /// True if nothing arrives within `window`.
    pub async fn is_quiet(&mut self, window: Duration) -> bool {
        tokio::time::timeout(window, tm_wire::read_message(&mut self.stream)).await.is_err()
    }
}

/// Poll `check` until it holds or `WAIT` elapses.
pub async fn wait_until(mut check: impl FnMut() -> bool) -> bool {
    let deadline = tokio::time::Instant::now() + WAIT;
    while tokio::time::Instant::now() < deadline {
        if check() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    false
}
