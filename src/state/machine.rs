//! Session state machine.
//!
//! Every inbound message is routed by the current snapshot kind and the
//! message tag. Each transition builds a new snapshot; published snapshots
//! are never changed.
//!
//! # State Diagram
//!
//! ```text
//! ┌─────────┐  error   ┌─────────┐
//! │ Loading │─────────▶│ Invalid │
//! └────┬────┘          └─────────┘
//!      │ intro
//!      ▼
//! ┌─────────┐ start_round() ┌──────────┐
//! │ Waiting │──────────────▶│ Starting │
//! └────┬────┘               └────┬─────┘
//!      │ start-round             │ start-round
//!      ▼                         │
//! ┌─────────┐◀───────────────────┘
//! │ Playing │
//! └────┬────┘
//!      │ end-round ──▶ Waiting
//!      │ end-game / transport close / failure
//!      ▼
//! ┌─────────┐
//! │ Closed  │
//! └─────────┘
//! ```

use std::fmt;
use std::sync::Arc;

use tracing::{error, warn};

use crate::error::{DispatchError, SessionError};
use crate::protocol::{Mode, ServerMessage};

use super::action::Action;
use super::reducer::apply_batch;
use super::round::RoundData;
use super::session::{Player, SessionInfo};

/// The state published to collaborators.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Snapshot {
    /// Connecting and waiting for the server's intro
    #[default]
    Loading,

    /// The server refused the session
    Invalid { reason: String },

    /// Seated, no round in progress
    Waiting {
        info: Arc<SessionInfo>,
        /// Why the previous round ended
        reason: Option<String>,
        error: Option<String>,
    },

    /// A round start was requested and not yet confirmed
    Starting {
        info: Arc<SessionInfo>,
        error: Option<String>,
    },

    /// A round is in progress
    Playing {
        info: Arc<SessionInfo>,
        round: Arc<RoundData>,
        error: Option<String>,
    },

    /// The session is over
    Closed { reason: Option<String> },
}

impl Snapshot {
    /// Wire name of the snapshot kind.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Loading => "loading",
            Self::Invalid { .. } => "invalid",
            Self::Waiting { .. } => "waiting",
            Self::Starting { .. } => "starting",
            Self::Playing { .. } => "playing",
            Self::Closed { .. } => "closed",
        }
    }

    /// No further messages are processed once terminal.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Invalid { .. } | Self::Closed { .. })
    }

    /// Get the session info if seated.
    pub fn info(&self) -> Option<&SessionInfo> {
        match self {
            Self::Waiting { info, .. } | Self::Starting { info, .. } | Self::Playing { info, .. } => {
                Some(info)
            }
            _ => None,
        }
    }

    /// Get the round data if playing.
    pub fn round(&self) -> Option<&RoundData> {
        match self {
            Self::Playing { round, .. } => Some(round),
            _ => None,
        }
    }

    /// Get the attached server error, if any.
    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Waiting { error, .. } | Self::Starting { error, .. } | Self::Playing { error, .. } => {
                error.as_deref()
            }
            _ => None,
        }
    }

    /// Reason carried by Invalid, Waiting or Closed.
    pub fn reason(&self) -> Option<&str> {
        match self {
            Self::Invalid { reason } => Some(reason),
            Self::Waiting { reason, .. } | Self::Closed { reason } => reason.as_deref(),
            _ => None,
        }
    }

    /// Route an inbound message.
    ///
    /// Returns `Ok(None)` when the snapshot is terminal and the message is
    /// ignored.
    pub fn on_message(&self, msg: ServerMessage) -> Result<Option<Snapshot>, SessionError> {
        let next = match self {
            Self::Invalid { .. } | Self::Closed { .. } => return Ok(None),
            Self::Loading => self.on_loading(msg)?,
            Self::Waiting { info, .. } | Self::Starting { info, .. } => self.on_lobby(info, msg)?,
            Self::Playing { info, round, error } => self.on_playing(info, round, error, msg)?,
        };
        Ok(Some(next))
    }

    /// Route an inbound message, turning failures into `Closed`.
    pub fn handle(&self, msg: ServerMessage) -> Option<Snapshot> {
        match self.on_message(msg) {
            Ok(next) => next,
            Err(err) => self.fail(&err),
        }
    }

    /// The snapshot after a fatal failure, `None` if already terminal.
    pub fn fail(&self, err: &SessionError) -> Option<Snapshot> {
        if self.is_terminal() {
            return None;
        }
        error!(state = self.kind(), error = %err, "session failed");
        Some(Self::Closed { reason: None })
    }

    /// The snapshot after the transport closed, `None` if already terminal.
    pub fn on_transport_closed(&self) -> Option<Snapshot> {
        if self.is_terminal() {
            None
        } else {
            Some(Self::Closed { reason: None })
        }
    }

    /// Request a round start. Allowed while Waiting or Starting with an open
    /// start mode.
    pub fn start_round(&self) -> Result<Snapshot, DispatchError> {
        match self {
            Self::Waiting { info, .. } | Self::Starting { info, .. } => match &info.start_mode {
                Mode::Open => Ok(Self::Starting {
                    info: Arc::clone(info),
                    error: None,
                }),
                Mode::Closed { reason } => Err(DispatchError::StartClosed(reason.clone())),
            },
            _ => Err(DispatchError::WrongState {
                action: "start-round",
                state: self.kind(),
            }),
        }
    }

    /// Validate an action and return the cleared snapshot to publish once it
    /// has been sent.
    pub fn act(&self, action: &Action) -> Result<Snapshot, DispatchError> {
        match self {
            Self::Playing { info, round, .. } => Ok(Self::Playing {
                info: Arc::clone(info),
                round: Arc::new(action.dispatch(round)?),
                error: None,
            }),
            _ => Err(DispatchError::WrongState {
                action: action.as_str(),
                state: self.kind(),
            }),
        }
    }

    fn on_loading(&self, msg: ServerMessage) -> Result<Snapshot, SessionError> {
        match msg {
            ServerMessage::Intro {
                player_id,
                game_id,
                join_mode,
                start_mode,
                players,
            } => Ok(Self::Waiting {
                info: Arc::new(SessionInfo::new(
                    player_id,
                    game_id,
                    join_mode,
                    start_mode,
                    players.into_iter().map(Player::from),
                )),
                reason: None,
                error: None,
            }),
            ServerMessage::Error { reason } => {
                warn!(%reason, "server refused session");
                Ok(Self::Invalid { reason })
            }
            other => Err(self.unexpected(&other)),
        }
    }

    fn on_lobby(&self, info: &Arc<SessionInfo>, msg: ServerMessage) -> Result<Snapshot, SessionError> {
        match msg {
            ServerMessage::PlayerJoin {
                player_id,
                player_name,
            } => Ok(self.with_info(info.with_player(Player {
                id: player_id,
                name: player_name,
            }))),
            ServerMessage::PlayerLeave { player_id } => {
                Ok(self.with_info(info.without_player(player_id)))
            }
            ServerMessage::StatusChange {
                join_mode,
                start_mode,
            } => Ok(self.with_info(info.with_modes(join_mode, start_mode))),
            ServerMessage::StartRound => Ok(Self::Playing {
                info: Arc::clone(info),
                round: Arc::new(RoundData::new()),
                error: None,
            }),
            ServerMessage::EndGame { reason } => Ok(Self::Closed { reason }),
            ServerMessage::Error { reason } => Ok(self.with_error(reason)),
            other => Err(self.unexpected(&other)),
        }
    }

    fn on_playing(
        &self,
        info: &Arc<SessionInfo>,
        round: &Arc<RoundData>,
        error: &Option<String>,
        msg: ServerMessage,
    ) -> Result<Snapshot, SessionError> {
        let playing = |info: Arc<SessionInfo>, round: Arc<RoundData>| Self::Playing {
            info,
            round,
            error: error.clone(),
        };

        match msg {
            ServerMessage::GractList { gract_list } => Ok(playing(
                Arc::clone(info),
                Arc::new(apply_batch(round, &gract_list)?),
            )),
            ServerMessage::PlayerJoin {
                player_id,
                player_name,
            } => Ok(playing(
                Arc::new(info.with_player(Player {
                    id: player_id,
                    name: player_name,
                })),
                Arc::clone(round),
            )),
            ServerMessage::PlayerLeave { player_id } => Ok(playing(
                Arc::new(info.without_player(player_id)),
                Arc::new(round.without_player(player_id)),
            )),
            ServerMessage::StatusChange {
                join_mode,
                start_mode,
            } => Ok(playing(
                Arc::new(info.with_modes(join_mode, start_mode)),
                Arc::clone(round),
            )),
            ServerMessage::EndRound { reason } => Ok(Self::Waiting {
                info: Arc::clone(info),
                reason,
                error: None,
            }),
            ServerMessage::EndGame { reason } => Ok(Self::Closed { reason }),
            ServerMessage::Error { reason } => Ok(self.with_error(reason)),
            other => Err(self.unexpected(&other)),
        }
    }

    /// Same kind, new session info.
    fn with_info(&self, info: SessionInfo) -> Snapshot {
        let info = Arc::new(info);
        match self {
            Self::Waiting { reason, error, .. } => Self::Waiting {
                info,
                reason: reason.clone(),
                error: error.clone(),
            },
            Self::Starting { error, .. } => Self::Starting {
                info,
                error: error.clone(),
            },
            Self::Playing { round, error, .. } => Self::Playing {
                info,
                round: Arc::clone(round),
                error: error.clone(),
            },
            other => other.clone(),
        }
    }

    /// Same kind with an error attached.
    fn with_error(&self, reason: String) -> Snapshot {
        warn!(state = self.kind(), %reason, "server reported error");
        match self {
            Self::Waiting { info, reason: why, .. } => Self::Waiting {
                info: Arc::clone(info),
                reason: why.clone(),
                error: Some(reason),
            },
            Self::Starting { info, .. } => Self::Starting {
                info: Arc::clone(info),
                error: Some(reason),
            },
            Self::Playing { info, round, .. } => Self::Playing {
                info: Arc::clone(info),
                round: Arc::clone(round),
                error: Some(reason),
            },
            other => other.clone(),
        }
    }

    fn unexpected(&self, msg: &ServerMessage) -> SessionError {
        SessionError::UnexpectedMessage {
            state: self.kind(),
            tag: msg.tag(),
        }
    }

    /// Convert to JSON for presentation layers.
    pub fn to_json(&self) -> serde_json::Value {
        let mut obj = serde_json::json!({ "kind": self.kind() });
        if let Some(info) = self.info() {
            obj["info"] = info.to_json();
        }
        if let Some(round) = self.round() {
            obj["round"] = round.to_json();
        }
        if let Some(error) = self.error() {
            obj["error"] = serde_json::json!(error);
        }
        if let Some(reason) = self.reason() {
            obj["reason"] = serde_json::json!(reason);
        }
        obj
    }
}

impl fmt::Display for Snapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Loading => write!(f, "Loading"),
            Self::Invalid { reason } => write!(f, "Invalid({})", reason),
            Self::Waiting { info, .. } => {
                write!(f, "Waiting(game {}, {} players)", info.game_id, info.player_count())
            }
            Self::Starting { info, .. } => write!(f, "Starting(game {})", info.game_id),
            Self::Playing { info, round, .. } => write!(
                f,
                "Playing(game {}, revision {}, {} cards)",
                info.game_id,
                round.revision,
                round.card_count()
            ),
            Self::Closed { reason: Some(reason) } => write!(f, "Closed({})", reason),
            Self::Closed { reason: None } => write!(f, "Closed"),
        }
    }
}
