// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Exact bytes on the wire for a client request and its answer.

use tokio::io::{duplex, split};

use crate::prelude::*;

#[tokio::test]
async fn registry_request_travels_as_plain_text() {
    let (client_io, mut server_io) = duplex(4096);
    let (reader, writer) = split(client_io);
    let (client, _events) = AgentControllerClient::new(ClientConfig::default());
    let _connection = tm_wire::spawn_connection(reader, writer, client.clone());

    let call = tokio::spawn({
        let client = client.clone();
        async move { client.get_registered_agents().await }
    });

    let data = tm_wire::read_message(&mut server_io).await.unwrap();
    let text = String::from_utf8(data.clone()).unwrap();
    let Message::Request(request) = tm_wire::parse(&data).unwrap() else {
        panic!("expected a request");
    };
    let id = request.transaction_id().unwrap();
    similar_asserts::assert_eq!(
        text,
        format!("GET-AGENTS system:tacs Ia/1.0\nType: request\nTransaction-Id: {id}\n\n")
    );

    let reply = format!(
        "200 OK\nTransaction-Id: {id}\nContent-Encoding: utf-8\nContent-Type: application/json\n\n\
         [{{\"name\":\"a1\",\"version\":\"3.2\"}}]"
    );
    tm_wire::write_message(&mut server_io, reply.as_bytes()).await.unwrap();

    let agents = call.await.unwrap().unwrap();
    assert_eq!(agents.len(), 1);
    assert_eq!(agents[0].name, "a1");
    assert_eq!(agents[0].version, "3.2");
}
