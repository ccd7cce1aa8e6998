//! Client-side session state.
//!
//! This module provides the pure state types and transitions:
//!
//! - `round` - Card types, collections and cards shown during a round
//! - `reducer` - Applies gract batches to round data
//! - `action` - Player actions and their validation
//! - `session` - Session requests and the seated roster
//! - `machine` - Snapshot kinds and message routing
//!
//! # Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                            Snapshot                             │
//! │                                                                 │
//! │  Loading ──▶ Waiting ◀──▶ Starting ──▶ Playing ──▶ Closed       │
//! │     │           ▲                         │                     │
//! │     ▼           └───────── end-round ─────┘                     │
//! │  Invalid                                                        │
//! │                                                                 │
//! │  ┌───────────────────┐        ┌──────────────────────────────┐  │
//! │  │ Arc<SessionInfo>  │        │ Arc<RoundData>               │  │
//! │  │                   │        │                              │  │
//! │  │ player_id →       │        │ type_id → CardType           │  │
//! │  │   Player          │        │ coll_id → Collection         │  │
//! │  │ join/start modes  │        │ card_id → Card               │  │
//! │  └───────────────────┘        └──────────────────────────────┘  │
//! └────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Nothing here performs I/O. Every transition returns a new value and
//! leaves the previous one untouched.
//!
//! # Usage
//!
//! ```rust
//! use gradian_client::protocol::ServerMessage;
//! use gradian_client::state::Snapshot;
//!
//! let msg = ServerMessage::decode(
//!     r#"{"type": "intro", "player-id": 0, "game-id": 3,
//!         "join-mode": {"status": "open"}, "start-mode": {"status": "open"}}"#,
//! )
//! .unwrap();
//! let waiting = Snapshot::Loading.handle(msg).unwrap();
//! assert_eq!(waiting.kind(), "waiting");
//! assert!(waiting.start_round().is_ok());
//! ```

pub mod action;
pub mod machine;
pub mod reducer;
pub mod round;
pub mod session;

// Re-export commonly used types
pub use action::Action;
pub use machine::Snapshot;
pub use reducer::apply_batch;
pub use round::{
    Actionable, Card, CardId, CardType, Collection, CollectionDisplay, CollectionId, PlayerId,
    RoundData, TypeId,
};
pub use session::{Player, SessionInfo, SessionKind, SessionRequest};
