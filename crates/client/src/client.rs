// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Correlation client for the agent controller ("Ia" protocol).
//!
//! Three pieces of state, each behind its own lock and never held together:
//! the current channel slot, the standing-subscription set, and the
//! pending-transaction table.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde_json::json;
use tm_core::{Method, Uri};
use tm_wire::{
    headers, ApplicationBody, ChannelRef, ConnectionHandler, Envelope, Request, Response,
    TransportError,
};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::env;
use crate::error::ClientError;
use crate::model::{AgentInfo, ClientEvent, ProbeInfo};
use crate::pending::{PendingTransactions, Unmatched};

pub const PROTOCOL: &str = "Ia";
pub const VERSION: &str = "1.0";

/// Domain of the controller's registry Uri (`system:tacs`).
const REGISTRY_DOMAIN: &str = "tacs";

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub protocol: String,
    pub version: String,
    /// Deadline for the high-level operations.
    pub timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            protocol: PROTOCOL.to_string(),
            version: VERSION.to_string(),
            timeout: Duration::from_millis(env::DEFAULT_TIMEOUT_MS),
        }
    }
}

impl ClientConfig {
    pub fn from_env() -> Self {
        Self { timeout: env::request_timeout(), ..Self::default() }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplayFailure {
    pub uri: Uri,
    pub error: TransportError,
}

/// Outcome of re-sending the standing subscriptions on a new connection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReplayReport {
    pub sent: Vec<Uri>,
    pub failed: Vec<ReplayFailure>,
}

impl ReplayReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

pub struct AgentControllerClient {
    config: ClientConfig,
    channel: Mutex<Option<ChannelRef>>,
    subscriptions: Mutex<BTreeSet<Uri>>,
    pending: PendingTransactions,
    events: mpsc::UnboundedSender<ClientEvent>,
}

impl AgentControllerClient {
    /// Create a disconnected client and the receiver its events arrive on.
    pub fn new(config: ClientConfig) -> (Arc<Self>, mpsc::UnboundedReceiver<ClientEvent>) {
        let (events, rx) = mpsc::unbounded_channel();
        let client = Arc::new(Self {
            config,
            channel: Mutex::new(None),
            subscriptions: Mutex::new(BTreeSet::new()),
            pending: PendingTransactions::new(),
            events,
        });
        (client, rx)
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn is_connected(&self) -> bool {
        self.channel.lock().is_some()
    }

    /// Snapshot of the standing-subscription set, in Uri order.
    pub fn standing_subscriptions(&self) -> Vec<Uri> {
        self.subscriptions.lock().iter().cloned().collect()
    }

    pub fn is_subscribed(&self, uri: &Uri) -> bool {
        self.subscriptions.lock().contains(uri)
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    fn current_channel(&self) -> Option<ChannelRef> {
        self.channel.lock().clone()
    }

    /// A request addressed with this client's protocol tag.
    pub fn request(&self, method: Method, uri: Uri) -> Request {
        Request::new(method, uri, &self.config.protocol, &self.config.version)
    }

    fn notification(&self, method: Method, uri: Uri) -> Request {
        Request::notification(method, uri, &self.config.protocol, &self.config.version)
    }

    /// Send `request` and wait for the response carrying its transaction id.
    ///
    /// Any status is returned as-is; only missing responses are errors.
    pub async fn execute_request(
        &self,
        mut request: Request,
        timeout: Duration,
    ) -> Result<Response, ClientError> {
        let channel = self.current_channel().ok_or(ClientError::NotConnected)?;
        let (transaction_id, rx) = self.pending.register();
        request.set_transaction_id(transaction_id);
        debug!(method = %request.method(), uri = %request.uri(), transaction_id, "sending request");

        if let Err(e) = channel.send(request.into()) {
            self.pending.cancel(transaction_id);
            return Err(e.into());
        }

        match tokio::time::timeout(timeout, rx).await {
            Ok(Ok(response)) => Ok(response),
            Ok(Err(_)) | Err(_) => {
                self.pending.cancel(transaction_id);
                warn!(transaction_id, ?timeout, "request timed out");
                Err(ClientError::Timeout { transaction_id, timeout })
            }
        }
    }

    /// `execute_request` with the default timeout; non-200 becomes an error.
    async fn call(&self, request: Request) -> Result<Response, ClientError> {
        let response = self.execute_request(request, self.config.timeout).await?;
        if !response.is_success() {
            return Err(ClientError::Remote {
                status: response.status(),
                reason: response.reason().to_string(),
                detail: String::from_utf8_lossy(response.body()).into_owned(),
            });
        }
        Ok(response)
    }

    async fn call_json<T: DeserializeOwned>(&self, request: Request) -> Result<T, ClientError> {
        Ok(self.call(request).await?.json_body()?)
    }

    // -- test-system interface -------------------------------------------

    /// Ask `probe` to send `message` to the SUT.
    pub async fn tri_send(
        &self,
        probe: &Uri,
        message: ApplicationBody,
        sut_address: Option<&str>,
    ) -> Result<(), ClientError> {
        let mut request = self.request(Method::TriSend, probe.clone());
        request.headers_mut().set_opt(headers::SUT_ADDRESS, sut_address);
        request.set_application_body(message)?;
        self.call(request).await.map(drop)
    }

    pub async fn tri_map(&self, probe: &Uri) -> Result<(), ClientError> {
        self.call(self.request(Method::TriMap, probe.clone())).await.map(drop)
    }

    pub async fn tri_unmap(&self, probe: &Uri) -> Result<(), ClientError> {
        self.call(self.request(Method::TriUnmap, probe.clone())).await.map(drop)
    }

    pub async fn tri_sa_reset(&self, probe: &Uri) -> Result<(), ClientError> {
        self.call(self.request(Method::TriSaReset, probe.clone())).await.map(drop)
    }

    pub async fn tri_execute_testcase(
        &self,
        probe: &Uri,
        testcase_id: &str,
        parameters: serde_json::Value,
    ) -> Result<(), ClientError> {
        let mut request = self.request(Method::TriExecuteTestcase, probe.clone());
        request.set_json_body(&json!({ "testcase-id": testcase_id, "parameters": parameters }))?;
        self.call(request).await.map(drop)
    }

    // -- registry --------------------------------------------------------

    pub async fn get_registered_probes(&self) -> Result<Vec<ProbeInfo>, ClientError> {
        let uri = Uri::system(REGISTRY_DOMAIN)?;
        self.call_json(self.request(Method::GetProbes, uri)).await
    }

    pub async fn get_registered_agents(&self) -> Result<Vec<AgentInfo>, ClientError> {
        let uri = Uri::system(REGISTRY_DOMAIN)?;
        self.call_json(self.request(Method::GetAgents, uri)).await
    }

    pub async fn get_probe(&self, probe: &Uri) -> Result<ProbeInfo, ClientError> {
        self.call_json(self.request(Method::GetProbe, probe.clone())).await
    }

    pub async fn get_variables(&self, uri: &Uri) -> Result<serde_json::Value, ClientError> {
        let response = self.call(self.request(Method::GetVariables, uri.clone())).await?;
        if response.body().is_empty() {
            return Ok(serde_json::Value::Null);
        }
        Ok(response.json_body()?)
    }

    // -- agent management ------------------------------------------------

    /// Deploy `probe` (`probe:<name>@<agent>`) on its agent.
    pub async fn deploy_probe(&self, probe: &Uri, probe_type: &str) -> Result<(), ClientError> {
        let request = self.probe_management(Method::Deploy, probe, Some(probe_type))?;
        self.call(request).await.map(drop)
    }

    pub async fn undeploy_probe(&self, probe: &Uri) -> Result<(), ClientError> {
        let request = self.probe_management(Method::Undeploy, probe, None)?;
        self.call(request).await.map(drop)
    }

    /// Probe (un)deployment is addressed to the hosting agent, not the probe.
    fn probe_management(
        &self,
        method: Method,
        probe: &Uri,
        probe_type: Option<&str>,
    ) -> Result<Request, ClientError> {
        let (name, agent) =
            probe.probe_parts().ok_or_else(|| ClientError::InvalidProbeUri(probe.clone()))?;
        let agent_uri = Uri::agent(agent)?;
        let mut request = self.request(method, agent_uri.clone());
        request.set_header(headers::AGENT_URI, &agent_uri);
        request.set_json_body(&json!({ "probe-name": name, "probe-type": probe_type }))?;
        Ok(request)
    }

    pub async fn restart_agent(&self, agent: &Uri) -> Result<(), ClientError> {
        self.call(self.request(Method::Restart, agent.clone())).await.map(drop)
    }

    pub async fn update_agent(
        &self,
        agent: &Uri,
        branch: Option<&str>,
        version: Option<&str>,
    ) -> Result<(), ClientError> {
        let mut request = self.request(Method::Update, agent.clone());
        request.set_json_body(&json!({ "branch": branch, "version": version }))?;
        self.call(request).await.map(drop)
    }

    // -- subscriptions ---------------------------------------------------

    /// Add `uri` to the standing set and, when connected, subscribe now.
    ///
    /// The standing set is updated even if the send fails; the
    /// subscription is replayed on the next connection.
    pub fn subscribe(&self, uri: &Uri) -> Result<(), ClientError> {
        // Insert before reading the channel slot; `on_connection` sets the
        // slot before reading the set. Overlapping the two can send the Uri
        // twice on the new channel but never zero times. The server treats
        // a repeated SUBSCRIBE as a no-op.
        self.subscriptions.lock().insert(uri.clone());
        self.notify(Method::Subscribe, uri)
    }

    /// Remove `uri` from the standing set and, when connected, unsubscribe.
    pub fn unsubscribe(&self, uri: &Uri) -> Result<(), ClientError> {
        self.subscriptions.lock().remove(uri);
        self.notify(Method::Unsubscribe, uri)
    }

    fn notify(&self, method: Method, uri: &Uri) -> Result<(), ClientError> {
        let Some(channel) = self.current_channel() else {
            debug!(%method, %uri, "not connected, recorded only");
            return Ok(());
        };
        channel.send(self.notification(method, uri.clone()).into())?;
        Ok(())
    }

    /// Lock `probe`; a granted lock also subscribes to its events.
    pub async fn lock_probe(&self, probe: &Uri) -> Result<(), ClientError> {
        self.call(self.request(Method::Lock, probe.clone())).await?;
        if let Err(e) = self.subscribe(probe) {
            warn!(%probe, error = %e, "locked but subscribe failed");
        }
        Ok(())
    }

    /// Unlock `probe`. The local subscription is dropped whatever the
    /// controller answers.
    pub async fn unlock_probe(&self, probe: &Uri) -> Result<(), ClientError> {
        let result = self.call(self.request(Method::Unlock, probe.clone())).await;
        if let Err(e) = self.unsubscribe(probe) {
            warn!(%probe, error = %e, "unsubscribe after unlock failed");
        }
        result.map(drop)
    }

    /// Re-send every standing subscription on the current channel.
    pub fn replay_subscriptions(&self) -> Result<ReplayReport, ClientError> {
        let channel = self.current_channel().ok_or(ClientError::NotConnected)?;
        Ok(self.replay_on(&channel))
    }

    fn replay_on(&self, channel: &ChannelRef) -> ReplayReport {
        let mut report = ReplayReport::default();
        for uri in self.standing_subscriptions() {
            match channel.send(self.notification(Method::Subscribe, uri.clone()).into()) {
                Ok(()) => report.sent.push(uri),
                Err(error) => report.failed.push(ReplayFailure { uri, error }),
            }
        }
        for failure in &report.failed {
            warn!(uri = %failure.uri, error = %failure.error, "subscription replay failed");
        }
        report
    }
}

impl ConnectionHandler for AgentControllerClient {
    fn on_connection(&self, channel: &ChannelRef) {
        *self.channel.lock() = Some(channel.clone());
        let report = self.replay_on(channel);
        info!(
            channel = %channel.id(),
            replayed = report.sent.len(),
            failed = report.failed.len(),
            "connected to agent controller"
        );
    }

    fn on_disconnection(&self, channel: &ChannelRef) {
        let mut slot = self.channel.lock();
        if slot.as_ref().is_some_and(|current| current.id() == channel.id()) {
            *slot = None;
            info!(channel = %channel.id(), "disconnected from agent controller");
        }
    }

    fn on_request(&self, channel: &ChannelRef, request: Request) {
        warn!(method = %request.method(), uri = %request.uri(), "unexpected request");
        if let Err(e) = channel.send(request.reply(501, "Not Implemented").into()) {
            debug!(error = %e, "failed to reject request");
        }
    }

    fn on_notification(&self, _channel: &ChannelRef, notification: Request) {
        match ClientEvent::from_notification(&notification) {
            Ok(Some(event)) => {
                if self.events.send(event).is_err() {
                    debug!(method = %notification.method(), "event receiver dropped");
                }
            }
            Ok(None) => {
                debug!(method = %notification.method(), uri = %notification.uri(), "ignored notification")
            }
            Err(e) => warn!(
                method = %notification.method(),
                uri = %notification.uri(),
                error = %e,
                "undecodable notification"
            ),
        }
    }

    fn on_response(&self, _channel: &ChannelRef, response: Response) {
        match self.pending.resolve(response) {
            Ok(transaction_id) => debug!(transaction_id, "response correlated"),
            Err(Unmatched::MissingTransactionId) => warn!("response without transaction id dropped"),
            Err(Unmatched::UnknownTransaction(id)) => {
                warn!(transaction_id = id, "response for unknown transaction dropped")
            }
            Err(Unmatched::WaiterGone(id)) => {
                debug!(transaction_id = id, "response arrived after caller gave up")
            }
        }
    }
}

#[cfg(test)]
#[path = "client_tests.rs"]
mod tests;
