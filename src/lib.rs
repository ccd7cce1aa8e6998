//! Gradian Client Library
//!
//! This crate keeps a client's view of a Gradian card game in sync with the
//! server.
//!
//! # Overview
//!
//! - **Snapshot Store** - Every published state is an immutable [`Snapshot`];
//!   collaborators observe them through a `tokio::sync::watch` receiver.
//!
//! - **Diff Reducer** - Server `gract-list` batches are applied to the
//!   previous round data to produce the next revision.
//!
//! - **Action Encoder** - Player actions are checked against the current
//!   affordance markers, sent, and the markers cleared until the server
//!   offers new ones.
//!
//! - **Session State Machine** - Routes each server message by the current
//!   snapshot kind.
//!
//! - **Connection Lifecycle** - One task per session owns the transport and
//!   tears it down exactly once.
//!
//! # Example
//!
//! ```rust,no_run
//! use gradian_client::{ClientConfig, SessionClient, SessionRequest};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let mut client = SessionClient::websocket(ClientConfig::from_env()?);
//! let session = client.request(SessionRequest::join(4, "jed")).await?;
//!
//! let mut snapshots = session.subscribe();
//! while snapshots.changed().await.is_ok() {
//!     let snapshot = snapshots.borrow_and_update().clone();
//!     println!("{}", snapshot);
//!     if snapshot.is_terminal() {
//!         break;
//!     }
//! }
//! client.discard().await;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod connection;
pub mod error;
pub mod protocol;
pub mod state;
pub mod transport;

pub use config::ClientConfig;
pub use connection::{SessionClient, SessionHandle};
pub use error::{ConfigError, DispatchError, ReduceError, SessionError, TransportError};
pub use protocol::{ClientMessage, Gract, Mode, PossibleAction, ServerMessage};
pub use state::{Action, RoundData, SessionInfo, SessionRequest, Snapshot};
pub use transport::{Connector, Transport, WsConnector, WsTransport};
