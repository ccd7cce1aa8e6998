//! Session information.
//!
//! Who this client is, which game it is in, who else is seated and whether
//! the game currently accepts new players or a round start.

use std::collections::HashMap;
use std::fmt;

use crate::protocol::{GameId, Mode, PlayerEntry};

use super::round::PlayerId;

/// What the client asked the server for.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SessionKind {
    /// Create a new game running the given card module
    Create { module_id: String },
    /// Join an existing game
    Join { game_id: GameId },
}

impl SessionKind {
    /// Path segments addressing this request under the server base url.
    pub fn path_segments(&self) -> [String; 2] {
        match self {
            Self::Create { module_id } => ["create".to_string(), module_id.clone()],
            Self::Join { game_id } => ["join".to_string(), game_id.to_string()],
        }
    }
}

impl fmt::Display for SessionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Create { module_id } => write!(f, "create({})", module_id),
            Self::Join { game_id } => write!(f, "join({})", game_id),
        }
    }
}

/// A request to take part in a game session.
///
/// Two requests are the same session when they compare equal; anything else
/// is a new session.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionRequest {
    pub kind: SessionKind,
    pub player_name: String,
}

impl SessionRequest {
    /// Request a new game running a card module.
    pub fn create(module_id: impl Into<String>, player_name: impl Into<String>) -> Self {
        Self {
            kind: SessionKind::Create {
                module_id: module_id.into(),
            },
            player_name: player_name.into(),
        }
    }

    /// Request a seat in an existing game.
    pub fn join(game_id: GameId, player_name: impl Into<String>) -> Self {
        Self {
            kind: SessionKind::Join { game_id },
            player_name: player_name.into(),
        }
    }
}

/// A seated player.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
}

impl From<PlayerEntry> for Player {
    fn from(entry: PlayerEntry) -> Self {
        Self {
            id: entry.player_id,
            name: entry.player_name,
        }
    }
}

/// Session details learnt from the server's `intro`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionInfo {
    /// This client's player id
    pub player_id: PlayerId,

    pub game_id: GameId,

    /// Whether new players may join
    pub join_mode: Mode,

    /// Whether a round may be started
    pub start_mode: Mode,

    /// Players indexed by id
    roster: HashMap<PlayerId, Player>,
}

impl SessionInfo {
    /// Build session info from an `intro`.
    pub fn new(
        player_id: PlayerId,
        game_id: GameId,
        join_mode: Mode,
        start_mode: Mode,
        players: impl IntoIterator<Item = Player>,
    ) -> Self {
        Self {
            player_id,
            game_id,
            join_mode,
            start_mode,
            roster: players.into_iter().map(|p| (p.id, p)).collect(),
        }
    }

    /// Copy with a player added (or renamed).
    pub fn with_player(&self, player: Player) -> Self {
        let mut next = self.clone();
        next.roster.insert(player.id, player);
        next
    }

    /// Copy with a player removed.
    pub fn without_player(&self, player_id: PlayerId) -> Self {
        let mut next = self.clone();
        next.roster.remove(&player_id);
        next
    }

    /// Copy with new join and start modes.
    pub fn with_modes(&self, join_mode: Mode, start_mode: Mode) -> Self {
        Self {
            join_mode,
            start_mode,
            ..self.clone()
        }
    }

    /// Get a player by ID.
    pub fn get_player(&self, player_id: PlayerId) -> Option<&Player> {
        self.roster.get(&player_id)
    }

    /// Check if a player is seated.
    pub fn has_player(&self, player_id: PlayerId) -> bool {
        self.roster.contains_key(&player_id)
    }

    /// This client's own roster entry.
    pub fn me(&self) -> Option<&Player> {
        self.roster.get(&self.player_id)
    }

    /// All seated players.
    pub fn players(&self) -> impl Iterator<Item = &Player> {
        self.roster.values()
    }

    /// Number of seated players.
    pub fn player_count(&self) -> usize {
        self.roster.len()
    }

    /// Check if a round may be started.
    pub fn can_start(&self) -> bool {
        self.start_mode.is_open()
    }

    /// Check if new players may join.
    pub fn can_join(&self) -> bool {
        self.join_mode.is_open()
    }

    /// Convert to JSON for presentation layers.
    pub fn to_json(&self) -> serde_json::Value {
        let mut players: Vec<&Player> = self.roster.values().collect();
        players.sort_by_key(|p| p.id);
        let players: Vec<serde_json::Value> = players
            .into_iter()
            .map(|p| serde_json::json!({"player_id": p.id, "name": p.name}))
            .collect();

        serde_json::json!({
            "player_id": self.player_id,
            "game_id": self.game_id,
            "join_mode": self.join_mode,
            "start_mode": self.start_mode,
            "players": players
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn info() -> SessionInfo {
        SessionInfo::new(
            0,
            12,
            Mode::Open,
            Mode::closed("2 players required"),
            vec![Player {
                id: 0,
                name: "zachary".to_string(),
            }],
        )
    }

    #[test]
    fn test_roster_updates_are_copies() {
        let base = info();
        let joined = base.with_player(Player {
            id: 1,
            name: "jed".to_string(),
        });

        assert_eq!(base.player_count(), 1);
        assert_eq!(joined.player_count(), 2);
        assert_eq!(joined.get_player(1).unwrap().name, "jed");

        let left = joined.without_player(0);
        assert!(!left.has_player(0));
        assert!(left.me().is_none());
        assert!(joined.me().is_some());
    }

    #[test]
    fn test_modes() {
        let base = info();
        assert!(base.can_join());
        assert!(!base.can_start());
        assert_eq!(base.start_mode.reason(), Some("2 players required"));

        let opened = base.with_modes(Mode::closed("2 players max"), Mode::Open);
        assert!(!opened.can_join());
        assert!(opened.can_start());
        assert_eq!(opened.player_count(), 1);
    }

    #[test]
    fn test_request_identity() {
        let a = SessionRequest::join(4, "jed");
        let b = SessionRequest::join(4, "jed");
        let c = SessionRequest::join(4, "robert");
        let d = SessionRequest::create("rummy", "jed");

        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_ne!(a, d);
        assert_eq!(a.kind.to_string(), "join(4)");
        assert_eq!(d.kind.path_segments(), ["create".to_string(), "rummy".to_string()]);
    }

    #[test]
    fn test_to_json() {
        let json = info().to_json();
        assert_eq!(json["game_id"], serde_json::json!(12));
        assert_eq!(json["start_mode"]["status"], "closed");
        assert_eq!(json["players"][0]["name"], "zachary");
    }
}
