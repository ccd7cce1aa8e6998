//! Error types.

use thiserror::Error;

use crate::state::round::{CardId, CollectionId, TypeId};

/// A gract batch referenced something that does not exist.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReduceError {
    #[error("{gract} references unknown card {card_id}")]
    UnknownCard { gract: &'static str, card_id: CardId },
    #[error("{gract} references unknown collection {coll_id}")]
    UnknownCollection {
        gract: &'static str,
        coll_id: CollectionId,
    },
    #[error("{gract} references unknown type {type_id}")]
    UnknownType { gract: &'static str, type_id: TypeId },
    #[error("{gract} would replace existing card {card_id}")]
    DuplicateCard { gract: &'static str, card_id: CardId },
    #[error("{gract}: card {card_id} is missing from collection {coll_id}")]
    NotInCollection {
        gract: &'static str,
        card_id: CardId,
        coll_id: CollectionId,
    },
}

/// Transport failures.
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("websocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),
    #[error("binary frame is not valid utf-8")]
    InvalidUtf8,
    #[error("connection closed")]
    Closed,
}

/// Fatal session failures. Each one ends the session in `Closed`.
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("malformed frame: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("unexpected {tag} message while {state}")]
    UnexpectedMessage {
        state: &'static str,
        tag: &'static str,
    },
    #[error("rejected gract batch: {0}")]
    Reduce(#[from] ReduceError),
    #[error("transport failure: {0}")]
    Transport(#[from] TransportError),
}

/// A dispatch that was rejected locally. Nothing was sent and the snapshot
/// is unchanged.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DispatchError {
    #[error("cannot {action} while {state}")]
    WrongState {
        action: &'static str,
        state: &'static str,
    },
    #[error("next is not currently available")]
    NotNextable,
    #[error("collection {0} is not selectable")]
    CollectionNotSelectable(CollectionId),
    #[error("card {0} is not selectable")]
    CardNotSelectable(CardId),
    #[error("card {select_card_id} cannot be played against card {against_card_id}")]
    AgainstNotAllowed {
        select_card_id: CardId,
        against_card_id: CardId,
    },
    #[error("card {card_id} cannot be played as type {type_id}")]
    WildNotAllowed { card_id: CardId, type_id: TypeId },
    #[error("round cannot be started: {0}")]
    StartClosed(String),
    #[error("failed to encode frame: {0}")]
    Encode(String),
    #[error("session has ended")]
    SessionEnded,
}

/// Configuration errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("invalid server url: {0}")]
    Url(#[from] url::ParseError),
    #[error("server url {0} cannot carry a path")]
    CannotBeABase(String),
    #[error("unsupported url scheme: {0} (expected ws or wss)")]
    InvalidScheme(String),
}
