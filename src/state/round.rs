//! Round data.
//!
//! Holds everything the server has shown this player during the current
//! round: card types, collections and cards, plus the affordance markers
//! that say which actions are currently valid.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

pub type TypeId = u64;
pub type CollectionId = u64;
pub type CardId = u64;
pub type PlayerId = u64;

/// How a collection is laid out on screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CollectionDisplay {
    /// A player's hand
    Hand,
    /// Cards laid out side by side
    Spread,
    /// A face-down pile such as a deck
    Stack,
}

impl CollectionDisplay {
    /// Wire name of the layout.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Hand => "hand",
            Self::Spread => "spread",
            Self::Stack => "stack",
        }
    }
}

/// A card type revealed to the player.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardType {
    pub id: TypeId,
    pub name: String,
    pub description: String,
    pub image_url: String,
}

/// Which action, if any, may currently be performed with a card.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Actionable {
    #[default]
    None,
    Select,
    /// Can be played against one of these cards
    Against(Vec<CardId>),
    /// Can be played as one of these types
    Wild(Vec<TypeId>),
}

impl Actionable {
    /// Check if no action is offered.
    pub fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }

    /// Short name used in JSON output.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Select => "select",
            Self::Against(_) => "against",
            Self::Wild(_) => "wild",
        }
    }
}

/// An ordered group of cards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Collection {
    pub id: CollectionId,
    pub display: CollectionDisplay,
    /// Player the collection sits next to, `None` for the table centre
    pub owner: Option<PlayerId>,
    /// Card ids in presentation order
    pub cards: Vec<CardId>,
    pub selectable: bool,
}

impl Collection {
    /// Create an empty, non-selectable collection.
    pub fn new(id: CollectionId, display: CollectionDisplay, owner: Option<PlayerId>) -> Self {
        Self {
            id,
            display,
            owner,
            cards: Vec::new(),
            selectable: false,
        }
    }

    /// Position of a card within this collection.
    pub fn position(&self, card_id: CardId) -> Option<usize> {
        self.cards.iter().position(|id| *id == card_id)
    }

    /// Number of cards held.
    pub fn len(&self) -> usize {
        self.cards.len()
    }

    /// Check if the collection holds no cards.
    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }
}

/// A single card on the table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Card {
    pub id: CardId,
    pub type_id: TypeId,
    pub collection_id: CollectionId,
    pub actionable: Actionable,
}

impl Card {
    pub fn new(id: CardId, type_id: TypeId, collection_id: CollectionId) -> Self {
        Self {
            id,
            type_id,
            collection_id,
            actionable: Actionable::None,
        }
    }
}

/// One revision of the round state.
///
/// Revisions are never mutated once published; the reducer builds a new one
/// for every batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoundData {
    pub(crate) types: HashMap<TypeId, CardType>,
    pub(crate) collections: HashMap<CollectionId, Collection>,
    pub(crate) cards: HashMap<CardId, Card>,

    /// Whether the "next" action is currently valid
    pub nextable: bool,

    /// Number of batches applied since the round started
    pub revision: u64,

    /// When this round started
    pub started_at: chrono::DateTime<chrono::Utc>,
}

impl Default for RoundData {
    fn default() -> Self {
        Self::new()
    }
}

impl RoundData {
    /// Create the empty round entered on `start-round`.
    pub fn new() -> Self {
        Self {
            types: HashMap::new(),
            collections: HashMap::new(),
            cards: HashMap::new(),
            nextable: false,
            revision: 0,
            started_at: chrono::Utc::now(),
        }
    }

    /// Get a card type by ID.
    pub fn card_type(&self, id: TypeId) -> Option<&CardType> {
        self.types.get(&id)
    }

    /// Get a collection by ID.
    pub fn collection(&self, id: CollectionId) -> Option<&Collection> {
        self.collections.get(&id)
    }

    /// Get a card by ID.
    pub fn card(&self, id: CardId) -> Option<&Card> {
        self.cards.get(&id)
    }

    /// All revealed card types.
    pub fn types(&self) -> impl Iterator<Item = &CardType> {
        self.types.values()
    }

    /// All visible collections.
    pub fn collections(&self) -> impl Iterator<Item = &Collection> {
        self.collections.values()
    }

    /// All visible cards.
    pub fn cards(&self) -> impl Iterator<Item = &Card> {
        self.cards.values()
    }

    /// Cards of a collection in presentation order.
    pub fn cards_in(&self, id: CollectionId) -> impl Iterator<Item = &Card> {
        self.collections
            .get(&id)
            .into_iter()
            .flat_map(|c| c.cards.iter())
            .filter_map(|card_id| self.cards.get(card_id))
    }

    /// Collections owned by a player.
    pub fn collections_of(&self, player_id: PlayerId) -> impl Iterator<Item = &Collection> {
        self.collections
            .values()
            .filter(move |c| c.owner == Some(player_id))
    }

    /// Number of revealed card types.
    pub fn type_count(&self) -> usize {
        self.types.len()
    }

    /// Number of visible collections.
    pub fn collection_count(&self) -> usize {
        self.collections.len()
    }

    /// Number of visible cards.
    pub fn card_count(&self) -> usize {
        self.cards.len()
    }

    /// Whether any action is currently offered.
    pub fn has_affordances(&self) -> bool {
        self.nextable
            || self.collections.values().any(|c| c.selectable)
            || self.cards.values().any(|c| !c.actionable.is_none())
    }

    /// Copy of this revision with every affordance marker cleared.
    pub fn cleared(&self) -> Self {
        let mut next = self.clone();
        next.nextable = false;
        for coll in next.collections.values_mut() {
            coll.selectable = false;
        }
        for card in next.cards.values_mut() {
            card.actionable = Actionable::None;
        }
        next
    }

    /// Copy of this revision without the collections owned by a player,
    /// and without the cards those collections held.
    pub fn without_player(&self, player_id: PlayerId) -> Self {
        let mut next = self.clone();
        let owned: Vec<CollectionId> = self.collections_of(player_id).map(|c| c.id).collect();

        for coll_id in owned {
            if let Some(coll) = next.collections.remove(&coll_id) {
                for card_id in &coll.cards {
                    next.cards.remove(card_id);
                }
            }
        }
        next
    }

    /// Check the referential invariants between cards, collections and types.
    ///
    /// Returns a description of the first violation found.
    pub fn check_invariants(&self) -> Result<(), String> {
        for card in self.cards.values() {
            let coll = self.collections.get(&card.collection_id).ok_or_else(|| {
                format!(
                    "card {} references missing collection {}",
                    card.id, card.collection_id
                )
            })?;
            let occurrences = coll.cards.iter().filter(|id| **id == card.id).count();
            if occurrences != 1 {
                return Err(format!(
                    "card {} appears {} times in collection {}",
                    card.id, occurrences, coll.id
                ));
            }
            if !self.types.contains_key(&card.type_id) {
                return Err(format!(
                    "card {} references missing type {}",
                    card.id, card.type_id
                ));
            }
        }

        for coll in self.collections.values() {
            for card_id in &coll.cards {
                match self.cards.get(card_id) {
                    Some(card) if card.collection_id == coll.id => {}
                    Some(card) => {
                        return Err(format!(
                            "collection {} lists card {} owned by collection {}",
                            coll.id, card_id, card.collection_id
                        ))
                    }
                    None => {
                        return Err(format!(
                            "collection {} lists missing card {}",
                            coll.id, card_id
                        ))
                    }
                }
            }
        }

        Ok(())
    }

    /// Convert to JSON for debugging and presentation layers.
    pub fn to_json(&self) -> serde_json::Value {
        let mut collections: Vec<&Collection> = self.collections.values().collect();
        collections.sort_by_key(|c| c.id);

        let collections: Vec<serde_json::Value> = collections
            .into_iter()
            .map(|c| {
                let cards: Vec<serde_json::Value> = self
                    .cards_in(c.id)
                    .map(|card| {
                        serde_json::json!({
                            "card_id": card.id,
                            "type_id": card.type_id,
                            "actionable": card.actionable.as_str()
                        })
                    })
                    .collect();
                serde_json::json!({
                    "coll_id": c.id,
                    "display": c.display.as_str(),
                    "owner": c.owner,
                    "selectable": c.selectable,
                    "cards": cards
                })
            })
            .collect();

        serde_json::json!({
            "revision": self.revision,
            "nextable": self.nextable,
            "types": self.types.len(),
            "collections": collections
        })
    }
}
