// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Client against a scripted agent controller over TCP.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde_json::json;
use tm_core::ChannelId;
use tm_wire::{spawn_connection, ChannelRef, Connection, ConnectionHandler};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

use crate::prelude::*;

/// Answers every request with 200, except `GET-PROBE`, which is held until
/// two have arrived and then answered in reverse order.
#[derive(Default)]
struct Controller {
    subscribes: Mutex<Vec<(ChannelId, Uri)>>,
    held: Mutex<Vec<(ChannelRef, Request)>>,
}

impl Controller {
    fn subscribes_on(&self, channel: &ChannelId) -> Vec<Uri> {
        let subscribes = self.subscribes.lock().unwrap();
        subscribes.iter().filter(|(id, _)| id == channel).map(|(_, uri)| uri.clone()).collect()
    }

    fn channels(&self) -> Vec<ChannelId> {
        let mut ids: Vec<ChannelId> =
            self.subscribes.lock().unwrap().iter().map(|(id, _)| id.clone()).collect();
        ids.dedup();
        ids
    }
}

impl ConnectionHandler for Controller {
    fn on_request(&self, channel: &ChannelRef, request: Request) {
        if request.method() != &Method::GetProbe {
            channel.send(request.reply(200, "OK").into()).unwrap();
            return;
        }
        let mut held = self.held.lock().unwrap();
        held.push((channel.clone(), request));
        if held.len() == 2 {
            for (channel, request) in held.drain(..).rev() {
                let name = request.uri().user().unwrap_or_default().to_string();
                let mut reply = request.reply(200, "OK");
                reply.set_json_body(&json!({ "name": name, "agent": "a1" })).unwrap();
                channel.send(reply.into()).unwrap();
            }
        }
    }

    fn on_notification(&self, channel: &ChannelRef, notification: Request) {
        if notification.method() == &Method::Subscribe {
            let entry = (channel.id().clone(), notification.uri().clone());
            self.subscribes.lock().unwrap().push(entry);
        }
    }

    fn on_response(&self, _channel: &ChannelRef, _response: Response) {}
}

struct ControllerServer {
    addr: String,
    controller: Arc<Controller>,
    connections: Arc<Mutex<Vec<Connection>>>,
}

impl ControllerServer {
    async fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        let controller = Arc::new(Controller::default());
        let connections = Arc::new(Mutex::new(Vec::new()));
        tokio::spawn({
            let controller = controller.clone();
            let connections = connections.clone();
            async move {
                while let Ok((stream, _)) = listener.accept().await {
                    let (reader, writer) = stream.into_split();
                    let connection = spawn_connection(reader, writer, controller.clone());
                    connections.lock().unwrap().push(connection);
                }
            }
        });
        Self { addr, controller, connections }
    }

    fn drop_connections(&self) {
        for connection in self.connections.lock().unwrap().drain(..) {
            connection.close();
        }
    }
}

fn start_client(server: &ControllerServer) -> (Arc<AgentControllerClient>, CancellationToken) {
    let (client, _events) = AgentControllerClient::new(ClientConfig::default());
    let cancel = CancellationToken::new();
    tokio::spawn(tm_client::connect(
        client.clone(),
        server.addr.clone(),
        Duration::from_millis(10),
        cancel.clone(),
    ));
    (client, cancel)
}

#[tokio::test]
async fn lock_survives_reconnect_with_one_resubscribe() {
    let server = ControllerServer::start().await;
    let (client, cancel) = start_client(&server);
    assert!(wait_until(|| client.is_connected()).await);

    let probe = uri("probe:p1@a1");
    client.lock_probe(&probe).await.unwrap();
    assert!(wait_until(|| server.controller.channels().len() == 1).await);
    let first = server.controller.channels()[0].clone();
    assert_eq!(server.controller.subscribes_on(&first), vec![probe.clone()]);

    server.drop_connections();
    assert!(wait_until(|| server.controller.channels().len() == 2).await);
    let second = server.controller.channels()[1].clone();

    // Give any duplicate replay a chance to show up.
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(server.controller.subscribes_on(&second), vec![probe.clone()]);
    assert_eq!(client.standing_subscriptions(), vec![probe]);
    cancel.cancel();
}

#[tokio::test]
async fn concurrent_calls_get_their_own_answers() {
    let server = ControllerServer::start().await;
    let (client, cancel) = start_client(&server);
    assert!(wait_until(|| client.is_connected()).await);

    let p1 = uri("probe:p1@a1");
    let p2 = uri("probe:p2@a1");
    let (first, second) = tokio::join!(client.get_probe(&p1), client.get_probe(&p2));

    assert_eq!(first.unwrap().name, "p1");
    assert_eq!(second.unwrap().name, "p2");
    assert_eq!(client.pending_count(), 0);
    cancel.cancel();
}

#[tokio::test]
async fn calls_fail_fast_while_disconnected() {
    let (client, _events) = AgentControllerClient::new(ClientConfig::default());
    let err = client.restart_agent(&uri("agent:a1")).await.unwrap_err();
    assert!(matches!(err, tm_client::ClientError::NotConnected));

    client.subscribe(&uri("probe:p1@a1")).unwrap();
    assert_eq!(client.standing_subscriptions(), vec![uri("probe:p1@a1")]);
}
