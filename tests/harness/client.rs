//! TestClient - WebSocket client joined to one session

#![allow(dead_code)]

use std::time::Duration;

use anyhow::{bail, Result};
use futures_util::{SinkExt, StreamExt};
use serde_json::{json, Value};
use tokio_tungstenite::{
    connect_async,
    tungstenite::{client::IntoClientRequest, Message},
};

use super::server::TestServer;

type WsStream =
    tokio_tungstenite::WebSocketStream<tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>>;

/// WebSocket test client for one user in one session
pub struct TestClient {
    user: String,
    write: futures_util::stream::SplitSink<WsStream, Message>,
    read: futures_util::stream::SplitStream<WsStream>,
    /// Document sent on connect
    initial: Value,
}

impl TestClient {
    /// Connect with the user id header and read the initial document
    pub async fn connect(server: &TestServer, session_id: &str, user: &str) -> Result<Self> {
        let mut request = server.ws_url(session_id).into_client_request()?;
        request.headers_mut().insert("x-user-id", user.parse()?);
        Self::open(request, user).await
    }

    /// Connect passing the user id as a query parameter
    pub async fn connect_with_query(
        server: &TestServer,
        session_id: &str,
        user: &str,
    ) -> Result<Self> {
        let url = format!("{}?user={}", server.ws_url(session_id), user);
        Self::open(url.into_client_request()?, user).await
    }

    async fn open(
        request: tokio_tungstenite::tungstenite::handshake::client::Request,
        user: &str,
    ) -> Result<Self> {
        let (ws_stream, _) = connect_async(request).await?;
        let (write, read) = ws_stream.split();

        let mut client = Self {
            user: user.to_string(),
            write,
            read,
            initial: Value::Null,
        };
        client.initial = client.expect_session().await?;
        Ok(client)
    }

    pub fn user(&self) -> &str {
        &self.user
    }

    /// Document received on connect
    pub fn initial(&self) -> &Value {
        &self.initial
    }

    async fn send_json(&mut self, msg: Value) -> Result<()> {
        self.write.send(Message::Text(msg.to_string().into())).await?;
        Ok(())
    }

    /// Send a session command
    pub async fn command(&mut self, command: Value) -> Result<()> {
        self.send_json(json!({ "type": "command", "command": command }))
            .await
    }

    /// Send a key press with nothing focused
    pub async fn key(&mut self, key: &str) -> Result<()> {
        self.send_json(json!({ "type": "key", "key": key })).await
    }

    /// Send a key press while a field has focus
    pub async fn key_in(&mut self, key: &str, focus: &str) -> Result<()> {
        self.send_json(json!({ "type": "key", "key": key, "focus": focus }))
            .await
    }

    /// Send a ping message
    pub async fn send_ping(&mut self) -> Result<()> {
        self.send_json(json!({ "type": "ping" })).await
    }

    /// Send raw text
    pub async fn send_text(&mut self, text: &str) -> Result<()> {
        self.write.send(Message::Text(text.to_string().into())).await?;
        Ok(())
    }

    /// Receive the next message as JSON
    pub async fn recv_json(&mut self) -> Result<Value> {
        loop {
            match self.read.next().await {
                Some(Ok(Message::Text(text))) => {
                    return Ok(serde_json::from_str(&text)?);
                }
                Some(Ok(Message::Close(_))) | None => {
                    bail!("WebSocket closed");
                }
                Some(Err(e)) => return Err(e.into()),
                _ => continue, // Skip binary/ping/pong frames
            }
        }
    }

    /// Receive with timeout
    pub async fn recv_json_timeout(&mut self, timeout: Duration) -> Result<Value> {
        match tokio::time::timeout(timeout, self.recv_json()).await {
            Ok(result) => result,
            Err(_) => bail!("Timeout waiting for WebSocket message"),
        }
    }

    /// Wait for a message of a specific type
    pub async fn expect(&mut self, msg_type: &str) -> Result<Value> {
        self.expect_timeout(msg_type, Duration::from_secs(5)).await
    }

    /// Wait for a message of a specific type with timeout
    pub async fn expect_timeout(&mut self, msg_type: &str, timeout: Duration) -> Result<Value> {
        let deadline = tokio::time::Instant::now() + timeout;

        loop {
            let remaining = deadline.saturating_duration_since(tokio::time::Instant::now());
            if remaining.is_zero() {
                bail!("Timeout waiting for message type '{}'", msg_type);
            }

            let msg = self.recv_json_timeout(remaining).await?;
            if msg["type"] == msg_type {
                return Ok(msg);
            }
        }
    }

    /// Wait for the next session document
    pub async fn expect_session(&mut self) -> Result<Value> {
        let msg = self.expect("session").await?;
        Ok(msg["session"].clone())
    }

    /// Assert nothing arrives within a short window
    pub async fn expect_silence(&mut self) -> Result<()> {
        match tokio::time::timeout(Duration::from_millis(200), self.recv_json()).await {
            Ok(Ok(msg)) => bail!("Unexpected message: {}", msg),
            _ => Ok(()),
        }
    }

    /// Drain all pending messages (non-blocking)
    pub async fn drain(&mut self) -> Vec<Value> {
        let mut messages = Vec::new();
        while let Ok(Ok(msg)) =
            tokio::time::timeout(Duration::from_millis(50), self.recv_json()).await
        {
            messages.push(msg);
        }
        messages
    }

    /// Close the connection
    pub async fn close(&mut self) -> Result<()> {
        self.write.close().await?;
        Ok(())
    }
}
