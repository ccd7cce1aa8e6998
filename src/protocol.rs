//! Wire protocol.
//!
//! Every frame is a JSON object tagged by `"type"`, with hyphenated keys.
//! Unknown tags decode to an explicit `Unknown` variant so callers can decide
//! whether to skip them (inside a batch) or reject them (at the top level).

use serde::{Deserialize, Serialize};

use crate::state::action::Action;
use crate::state::round::{CardId, CollectionDisplay, CollectionId, PlayerId, TypeId};

pub type GameId = u64;

/// Whether joining or starting is currently permitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "kebab-case")]
pub enum Mode {
    Open,
    Closed {
        #[serde(default)]
        reason: String,
    },
}

impl Mode {
    pub fn closed(reason: impl Into<String>) -> Self {
        Self::Closed {
            reason: reason.into(),
        }
    }

    pub fn is_open(&self) -> bool {
        matches!(self, Self::Open)
    }

    /// Reason the mode is closed, if it is.
    pub fn reason(&self) -> Option<&str> {
        match self {
            Self::Open => None,
            Self::Closed { reason } => Some(reason),
        }
    }
}

/// Roster entry as sent in `intro`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct PlayerEntry {
    pub player_id: PlayerId,
    pub player_name: String,
}

/// A capability offered to the player inside a `possible-actions` gract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum PossibleAction {
    Next,
    #[serde(rename_all = "kebab-case")]
    Select { card_ids: Vec<CardId> },
    #[serde(rename_all = "kebab-case")]
    SelectColl { coll_ids: Vec<CollectionId> },
    #[serde(rename_all = "kebab-case")]
    Against {
        select_card_id: CardId,
        against_card_ids: Vec<CardId>,
    },
    #[serde(rename_all = "kebab-case")]
    Wild { card_id: CardId, type_ids: Vec<TypeId> },
    #[serde(other)]
    Unknown,
}

/// A single mutation record inside a `gract-list`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum Gract {
    #[serde(rename_all = "kebab-case")]
    ShowType {
        type_id: TypeId,
        type_name: String,
        #[serde(default)]
        type_desc: String,
        #[serde(default)]
        type_url: String,
    },
    #[serde(rename_all = "kebab-case")]
    ShowColl {
        coll_id: CollectionId,
        coll_display: CollectionDisplay,
        #[serde(default)]
        player_id: Option<PlayerId>,
    },
    #[serde(rename_all = "kebab-case")]
    HideColl { coll_id: CollectionId },
    #[serde(rename_all = "kebab-case")]
    ShowCard {
        card_id: CardId,
        type_id: TypeId,
        coll_id: CollectionId,
    },
    #[serde(rename_all = "kebab-case")]
    HideCard { card_id: CardId },
    #[serde(rename_all = "kebab-case")]
    MoveCard {
        card_id: CardId,
        coll_id: CollectionId,
    },
    #[serde(rename_all = "kebab-case")]
    RevealCard {
        old_id: CardId,
        new_id: CardId,
        new_type_id: TypeId,
    },
    #[serde(rename_all = "kebab-case")]
    ConcealCard {
        old_id: CardId,
        new_id: CardId,
        new_type_id: TypeId,
    },
    #[serde(rename_all = "kebab-case")]
    PossibleActions {
        possible_actions: Vec<PossibleAction>,
    },
    #[serde(other)]
    Unknown,
}

impl Gract {
    pub fn tag(&self) -> &'static str {
        match self {
            Self::ShowType { .. } => "show-type",
            Self::ShowColl { .. } => "show-coll",
            Self::HideColl { .. } => "hide-coll",
            Self::ShowCard { .. } => "show-card",
            Self::HideCard { .. } => "hide-card",
            Self::MoveCard { .. } => "move-card",
            Self::RevealCard { .. } => "reveal-card",
            Self::ConcealCard { .. } => "conceal-card",
            Self::PossibleActions { .. } => "possible-actions",
            Self::Unknown => "unknown",
        }
    }
}

/// Frames sent by the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ServerMessage {
    #[serde(rename_all = "kebab-case")]
    Intro {
        player_id: PlayerId,
        game_id: GameId,
        join_mode: Mode,
        start_mode: Mode,
        #[serde(default)]
        players: Vec<PlayerEntry>,
    },
    #[serde(rename_all = "kebab-case")]
    PlayerJoin {
        player_id: PlayerId,
        player_name: String,
    },
    #[serde(rename_all = "kebab-case")]
    PlayerLeave { player_id: PlayerId },
    #[serde(rename_all = "kebab-case")]
    StatusChange { join_mode: Mode, start_mode: Mode },
    StartRound,
    EndRound {
        #[serde(default)]
        reason: Option<String>,
    },
    EndGame {
        #[serde(default)]
        reason: Option<String>,
    },
    Error {
        reason: String,
    },
    #[serde(rename_all = "kebab-case")]
    GractList { gract_list: Vec<Gract> },
    #[serde(other)]
    Unknown,
}

impl ServerMessage {
    /// Decode a text frame.
    pub fn decode(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    pub fn tag(&self) -> &'static str {
        match self {
            Self::Intro { .. } => "intro",
            Self::PlayerJoin { .. } => "player-join",
            Self::PlayerLeave { .. } => "player-leave",
            Self::StatusChange { .. } => "status-change",
            Self::StartRound => "start-round",
            Self::EndRound { .. } => "end-round",
            Self::EndGame { .. } => "end-game",
            Self::Error { .. } => "error",
            Self::GractList { .. } => "gract-list",
            Self::Unknown => "unknown",
        }
    }
}

/// Frames sent by the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ClientMessage {
    #[serde(rename_all = "kebab-case")]
    Intro { player_name: String },
    StartRound,
    Action(Action),
}

impl ClientMessage {
    /// Encode as a text frame.
    pub fn encode(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
