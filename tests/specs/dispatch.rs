// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Notification fan-out through a running daemon.

use std::time::Duration;

use tm_wire::headers;

use crate::prelude::*;

#[tokio::test]
async fn subscribed_client_receives_ingested_logs() {
    let daemon = TestDaemon::start().await;
    let (client, mut events) = AgentControllerClient::new(ClientConfig::default());
    client.subscribe(&uri("job:42")).unwrap();

    let cancel = tokio_util::sync::CancellationToken::new();
    tokio::spawn(tm_client::connect(
        client.clone(),
        daemon.xc.to_string(),
        Duration::from_millis(10),
        cancel.clone(),
    ));
    assert!(wait_until(|| daemon.events.subscriber_count(&uri("job:42")) == 1).await);

    let mut agent = Peer::connect(daemon.il).await;
    agent
        .send(
            Request::notification(Method::Log, uri("job:42"), "Il", "1.0")
                .with_header(headers::LOG_FILENAME, "job-42.log")
                .with_header(headers::LOG_CLASS, "event")
                .with_body("step build ok\n"),
        )
        .await;

    let event = tokio::time::timeout(WAIT, events.recv()).await.unwrap().unwrap();
    let ClientEvent::Log { uri: source, class, text, .. } = event else {
        panic!("expected log event, got {event:?}");
    };
    assert_eq!(source, uri("job:42"));
    assert_eq!(class.as_deref(), Some("event"));
    assert_eq!(text, "step build ok\n");

    let written = std::fs::read_to_string(daemon.logs.join("job-42.log")).unwrap();
    assert_eq!(written, "step build ok\n");
    cancel.cancel();
}

#[tokio::test]
async fn dispatch_to_an_unwatched_topic_has_no_effect() {
    let daemon = TestDaemon::start().await;
    let mut publisher = Peer::connect(daemon.xc).await;
    publisher.notify(Method::Message, "job:42").await;

    assert!(publisher.is_quiet(Duration::from_millis(100)).await);
    assert_eq!(daemon.events.topic_count(), 0);

    let report = daemon
        .events
        .dispatch(&Request::notification(Method::Message, uri("job:42"), "Xc", "1.0"));
    assert!(report.is_empty());
}

#[tokio::test]
async fn repeated_subscribe_delivers_once() {
    let daemon = TestDaemon::start().await;
    let mut watcher = Peer::connect(daemon.xc).await;
    watcher.notify(Method::Subscribe, "job:1").await;
    watcher.notify(Method::Subscribe, "job:1").await;
    watcher.notify(Method::Subscribe, "job:2").await;
    assert!(wait_until(|| daemon.events.topic_count() == 2).await);
    assert_eq!(daemon.events.subscriber_count(&uri("job:1")), 1);

    let mut publisher = Peer::connect(daemon.xc).await;
    publisher.notify(Method::Message, "job:1").await;

    let Message::Request(delivered) = watcher.recv().await else {
        panic!("expected a notification");
    };
    assert_eq!(delivered.method(), &Method::Message);
    assert_eq!(delivered.uri(), &uri("job:1"));
    assert!(watcher.is_quiet(Duration::from_millis(100)).await);
}

#[tokio::test]
async fn disconnect_sweeps_every_topic() {
    let daemon = TestDaemon::start().await;
    let mut watcher = Peer::connect(daemon.xc).await;
    watcher.notify(Method::Subscribe, "job:1").await;
    watcher.notify(Method::Subscribe, "probe:p1@a1").await;
    assert!(wait_until(|| daemon.events.topic_count() == 2).await);
    assert_eq!(daemon.events.client_count(), 1);

    drop(watcher);
    assert!(
        wait_until(|| daemon.events.topic_count() == 0 && daemon.events.client_count() == 0).await
    );
}

#[tokio::test]
async fn requests_on_the_event_channel_are_refused() {
    let daemon = TestDaemon::start().await;
    let mut peer = Peer::connect(daemon.xc).await;
    let mut request = Request::new(Method::GetProbes, uri("system:tacs"), "Xc", "1.0");
    request.set_transaction_id(3);
    peer.send(request).await;

    let Message::Response(reply) = peer.recv().await else {
        panic!("expected a response");
    };
    assert_eq!(reply.status(), 501);
    assert_eq!(reply.transaction_id(), Some(3));
}
