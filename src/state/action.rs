//! Player actions.
//!
//! An action is only sent when the current round offers it. Once sent, every
//! affordance marker is cleared until the server publishes a fresh set.

use serde::{Deserialize, Serialize};

use crate::error::DispatchError;

use super::round::{Actionable, CardId, CollectionId, RoundData, TypeId};

/// An action the player can take during a round.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action-type", rename_all = "kebab-case")]
pub enum Action {
    Next,
    #[serde(rename_all = "kebab-case")]
    SelectColl { coll_id: CollectionId },
    #[serde(rename_all = "kebab-case")]
    Select { card_id: CardId },
    #[serde(rename_all = "kebab-case")]
    Against {
        select_card_id: CardId,
        against_card_id: CardId,
    },
    #[serde(rename_all = "kebab-case")]
    Wild { card_id: CardId, type_id: TypeId },
}

impl Action {
    /// Wire name of the action.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Next => "next",
            Self::SelectColl { .. } => "select-coll",
            Self::Select { .. } => "select",
            Self::Against { .. } => "against",
            Self::Wild { .. } => "wild",
        }
    }

    /// Check the action is currently offered by the round.
    pub fn validate(&self, round: &RoundData) -> Result<(), DispatchError> {
        match self {
            Self::Next => {
                if round.nextable {
                    Ok(())
                } else {
                    Err(DispatchError::NotNextable)
                }
            }
            Self::SelectColl { coll_id } => match round.collection(*coll_id) {
                Some(coll) if coll.selectable => Ok(()),
                _ => Err(DispatchError::CollectionNotSelectable(*coll_id)),
            },
            Self::Select { card_id } => match round.card(*card_id).map(|c| &c.actionable) {
                Some(Actionable::Select) => Ok(()),
                _ => Err(DispatchError::CardNotSelectable(*card_id)),
            },
            Self::Against {
                select_card_id,
                against_card_id,
            } => match round.card(*select_card_id).map(|c| &c.actionable) {
                Some(Actionable::Against(candidates)) if candidates.contains(against_card_id) => {
                    Ok(())
                }
                _ => Err(DispatchError::AgainstNotAllowed {
                    select_card_id: *select_card_id,
                    against_card_id: *against_card_id,
                }),
            },
            Self::Wild { card_id, type_id } => match round.card(*card_id).map(|c| &c.actionable) {
                Some(Actionable::Wild(types)) if types.contains(type_id) => Ok(()),
                _ => Err(DispatchError::WildNotAllowed {
                    card_id: *card_id,
                    type_id: *type_id,
                }),
            },
        }
    }

    /// Validate against the round and return the revision to publish once
    /// the action has been sent.
    pub fn dispatch(&self, round: &RoundData) -> Result<RoundData, DispatchError> {
        self.validate(round)?;
        Ok(round.cleared())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{Gract, PossibleAction};
    use crate::state::reducer::apply_batch;
    use crate::state::round::CollectionDisplay;
    use pretty_assertions::assert_eq;

    fn offered_round() -> RoundData {
        apply_batch(
            &RoundData::new(),
            &[
                Gract::ShowType {
                    type_id: 0,
                    type_name: "a card".to_string(),
                    type_desc: String::new(),
                    type_url: String::new(),
                },
                Gract::ShowType {
                    type_id: 2,
                    type_name: "wild 2".to_string(),
                    type_desc: String::new(),
                    type_url: String::new(),
                },
                Gract::ShowColl {
                    coll_id: 0,
                    coll_display: CollectionDisplay::Hand,
                    player_id: Some(0),
                },
                Gract::ShowColl {
                    coll_id: 1,
                    coll_display: CollectionDisplay::Spread,
                    player_id: None,
                },
                Gract::ShowColl {
                    coll_id: 2,
                    coll_display: CollectionDisplay::Stack,
                    player_id: None,
                },
                Gract::ShowCard {
                    card_id: 0,
                    type_id: 0,
                    coll_id: 0,
                },
                Gract::ShowCard {
                    card_id: 1,
                    type_id: 0,
                    coll_id: 0,
                },
                Gract::ShowCard {
                    card_id: 2,
                    type_id: 0,
                    coll_id: 0,
                },
                Gract::PossibleActions {
                    possible_actions: vec![
                        PossibleAction::Next,
                        PossibleAction::SelectColl {
                            coll_ids: vec![0, 1],
                        },
                        PossibleAction::Select { card_ids: vec![0] },
                        PossibleAction::Against {
                            select_card_id: 1,
                            against_card_ids: vec![0],
                        },
                        PossibleAction::Wild {
                            card_id: 2,
                            type_ids: vec![2],
                        },
                    ],
                },
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_offered_actions_validate() {
        let round = offered_round();
        let offered = [
            Action::Next,
            Action::SelectColl { coll_id: 0 },
            Action::SelectColl { coll_id: 1 },
            Action::Select { card_id: 0 },
            Action::Against {
                select_card_id: 1,
                against_card_id: 0,
            },
            Action::Wild {
                card_id: 2,
                type_id: 2,
            },
        ];
        for action in offered {
            assert_eq!(action.validate(&round), Ok(()), "{:?}", action);
        }
    }

    #[test]
    fn test_unoffered_actions_rejected() {
        let round = offered_round();

        assert_eq!(
            Action::SelectColl { coll_id: 2 }.validate(&round),
            Err(DispatchError::CollectionNotSelectable(2))
        );
        assert_eq!(
            Action::Select { card_id: 1 }.validate(&round),
            Err(DispatchError::CardNotSelectable(1))
        );
        assert_eq!(
            Action::Select { card_id: 2 }.validate(&round),
            Err(DispatchError::CardNotSelectable(2))
        );
        assert_eq!(
            Action::Select { card_id: 99 }.validate(&round),
            Err(DispatchError::CardNotSelectable(99))
        );
        for (select_card_id, against_card_id) in [(0, 0), (2, 0), (1, 1), (1, 2)] {
            assert!(Action::Against {
                select_card_id,
                against_card_id
            }
            .validate(&round)
            .is_err());
        }
        for (card_id, type_id) in [(0, 2), (1, 2), (2, 0), (2, 1)] {
            assert!(Action::Wild { card_id, type_id }.validate(&round).is_err());
        }
    }

    #[test]
    fn test_next_requires_nextable() {
        let round = offered_round().cleared();
        assert_eq!(
            Action::Next.validate(&round),
            Err(DispatchError::NotNextable)
        );
    }

    #[test]
    fn test_dispatch_clears_all_markers() {
        let round = offered_round();
        let next = Action::Select { card_id: 0 }.dispatch(&round).unwrap();

        assert!(!next.nextable);
        assert!(next.collections().all(|c| !c.selectable));
        assert!(next.cards().all(|c| c.actionable.is_none()));
        assert_eq!(next.revision, round.revision);

        // A second submission is no longer offered
        assert!(Action::Select { card_id: 0 }.dispatch(&next).is_err());
    }

    #[test]
    fn test_rejected_dispatch_leaves_round() {
        let round = offered_round();
        assert!(Action::SelectColl { coll_id: 2 }.dispatch(&round).is_err());
        assert!(round.nextable);
        assert!(round.collection(0).unwrap().selectable);
    }

    #[test]
    fn test_wire_encoding() {
        let json = serde_json::to_value(Action::Against {
            select_card_id: 1,
            against_card_id: 0,
        })
        .unwrap();
        assert_eq!(
            json,
            serde_json::json!({"action-type": "against", "select-card-id": 1, "against-card-id": 0})
        );

        let json = serde_json::to_value(Action::Wild {
            card_id: 2,
            type_id: 2,
        })
        .unwrap();
        assert_eq!(
            json,
            serde_json::json!({"action-type": "wild", "card-id": 2, "type-id": 2})
        );
    }
}
