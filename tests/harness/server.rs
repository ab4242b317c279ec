//! TestServer - True end-to-end test harness
//!
//! Spawns the actual d2dd binary on a random port with an on-disk SQLite
//! database. Each instance gets its own temp directory, so tests run in
//! isolation while exercising CLI parsing and server startup.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::time::Duration;

use anyhow::{bail, Result};
use reqwest::{Client, Response};
use serde_json::Value;
use tempfile::TempDir;

use super::client::TestClient;

const USER_HEADER: &str = "x-user-id";

/// Test harness that spawns the d2dd binary on a random port
pub struct TestServer {
    pub addr: SocketAddr,
    pub client: Client,
    child: Child,
    /// Temp directory for the database (cleaned up on drop)
    _temp_dir: TempDir,
    pub db_path: PathBuf,
    /// Database pool for direct assertions
    db_pool: sqlx::SqlitePool,
}

impl TestServer {
    /// Start a new test server instance
    pub async fn start() -> Result<Self> {
        let temp_dir = TempDir::new()?;
        let db_path = temp_dir.path().join("test.db");

        let client = Client::builder().timeout(Duration::from_secs(5)).build()?;
        let (child, addr) = spawn(&client, &db_path).await?;

        let db_url = format!("sqlite:{}?mode=rwc", db_path.display());
        let db_pool = sqlx::SqlitePool::connect(&db_url).await?;

        Ok(Self {
            addr,
            client,
            child,
            _temp_dir: temp_dir,
            db_path,
            db_pool,
        })
    }

    /// Stop the process and start a new one on the same database file
    pub async fn restart(&mut self) -> Result<()> {
        let _ = self.child.kill();
        let _ = self.child.wait();

        let (child, addr) = spawn(&self.client, &self.db_path).await?;
        self.child = child;
        self.addr = addr;
        Ok(())
    }

    /// Get the base URL for the server
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// WebSocket URL for a session
    pub fn ws_url(&self, session_id: &str) -> String {
        format!("ws://{}/sessions/{}/ws", self.addr, session_id)
    }

    /// Anonymous GET request
    pub async fn get(&self, path: &str) -> Result<Response> {
        Ok(self
            .client
            .get(format!("{}{}", self.base_url(), path))
            .send()
            .await?)
    }

    /// GET request as a user
    pub async fn get_as(&self, user: &str, path: &str) -> Result<Response> {
        Ok(self
            .client
            .get(format!("{}{}", self.base_url(), path))
            .header(USER_HEADER, user)
            .send()
            .await?)
    }

    /// POST request with JSON body as a user
    pub async fn post_as<T: serde::Serialize + ?Sized>(
        &self,
        user: &str,
        path: &str,
        body: &T,
    ) -> Result<Response> {
        Ok(self
            .client
            .post(format!("{}{}", self.base_url(), path))
            .header(USER_HEADER, user)
            .json(body)
            .send()
            .await?)
    }

    /// DELETE request as a user
    pub async fn delete_as(&self, user: &str, path: &str) -> Result<Response> {
        Ok(self
            .client
            .delete(format!("{}{}", self.base_url(), path))
            .header(USER_HEADER, user)
            .send()
            .await?)
    }

    /// Create a session owned by `user` and return its id
    pub async fn create_session(&self, user: &str) -> Result<String> {
        let resp = self
            .client
            .post(format!("{}/sessions", self.base_url()))
            .header(USER_HEADER, user)
            .send()
            .await?;
        if resp.status() != 201 {
            bail!("Failed to create session: {}", resp.status());
        }
        let body: Value = resp.json().await?;
        match body["id"].as_str() {
            Some(id) => Ok(id.to_string()),
            None => bail!("No session id in {}", body),
        }
    }

    /// Run a command over HTTP, returning the updated document
    pub async fn command(&self, user: &str, session_id: &str, command: Value) -> Result<Value> {
        let resp = self
            .post_as(user, &format!("/sessions/{}/commands", session_id), &command)
            .await?;
        if !resp.status().is_success() {
            bail!("Command {} failed: {}", command, resp.status());
        }
        Ok(resp.json().await?)
    }

    /// Add a combatant and return its id
    pub async fn add_entity(
        &self,
        user: &str,
        session_id: &str,
        name: &str,
        health: i32,
        max_health: i32,
        initiative: i32,
    ) -> Result<String> {
        let doc = self
            .command(
                user,
                session_id,
                serde_json::json!({
                    "type": "add_entity",
                    "entity": {
                        "name": name,
                        "health": health,
                        "maxHealth": max_health,
                        "initiative": initiative
                    }
                }),
            )
            .await?;
        let entities = doc["entities"].as_array().cloned().unwrap_or_default();
        match entities.last().and_then(|e| e["id"].as_str()) {
            Some(id) => Ok(id.to_string()),
            None => bail!("No entity in {}", doc),
        }
    }

    /// Join a session over WebSocket as `user`
    pub async fn join(&self, session_id: &str, user: &str) -> Result<TestClient> {
        TestClient::connect(self, session_id, user).await
    }

    /// Direct access to the database for assertions
    pub fn pool(&self) -> &sqlx::SqlitePool {
        &self.db_pool
    }
}

/// Spawn d2dd on a free port and wait until it answers
async fn spawn(client: &Client, db_path: &Path) -> Result<(Child, SocketAddr)> {
    let listener = std::net::TcpListener::bind("127.0.0.1:0")?;
    let addr = listener.local_addr()?;
    drop(listener);

    let binary_path = env!("CARGO_BIN_EXE_d2dd");
    let mut child = Command::new(binary_path)
        .arg("--bind")
        .arg(addr.to_string())
        .arg("--database")
        .arg(db_path.to_string_lossy().as_ref())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .map_err(|e| anyhow::anyhow!("Failed to spawn d2dd at {}: {}", binary_path, e))?;

    // Poll until ready (max 5 seconds to handle resource contention)
    for _ in 0..50 {
        tokio::time::sleep(Duration::from_millis(100)).await;
        if client
            .get(format!("http://{}/health", addr))
            .send()
            .await
            .is_ok()
        {
            return Ok((child, addr));
        }
    }

    let _ = child.kill();
    bail!("Server failed to start within 5 seconds")
}

impl Drop for TestServer {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}
