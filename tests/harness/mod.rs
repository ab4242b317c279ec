//! Integration Test Harness
//!
//! - `TestServer` - Spawns the real d2dd binary on a random port with an
//!   on-disk SQLite database in a temp directory
//! - `TestClient` - WebSocket client joined to one session as one user
//!
//! # Example
//!
//! ```rust,ignore
//! use harness::TestServer;
//!
//! #[tokio::test]
//! async fn test_turns() {
//!     let server = TestServer::start().await.unwrap();
//!     let session = server.create_session("dm").await.unwrap();
//!
//!     let mut dm = server.join(&session, "dm").await.unwrap();
//!     dm.key("n").await.unwrap();
//!     let doc = dm.expect_session().await.unwrap();
//!     assert_eq!(doc["currentRound"], 1);
//! }
//! ```

mod client;
mod server;

pub use client::TestClient;
pub use server::TestServer;
