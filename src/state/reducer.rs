//! Gract batch reducer.
//!
//! Folds an ordered batch of gracts over a round revision and produces the
//! next revision. The previous revision is never touched: a batch that
//! references something missing is rejected as a whole.

use tracing::{debug, trace};

use crate::error::ReduceError;
use crate::protocol::{Gract, PossibleAction};

use super::round::{Actionable, Card, CardId, CardType, Collection, CollectionId, RoundData, TypeId};

/// Apply a batch of gracts in order.
pub fn apply_batch(prev: &RoundData, batch: &[Gract]) -> Result<RoundData, ReduceError> {
    let mut next = prev.clone();
    for gract in batch {
        trace!(gract = gract.tag(), "applying gract");
        apply_gract(&mut next, gract)?;
    }
    next.revision += 1;
    debug!(
        revision = next.revision,
        gracts = batch.len(),
        cards = next.cards.len(),
        collections = next.collections.len(),
        "applied gract batch"
    );
    Ok(next)
}

fn apply_gract(round: &mut RoundData, gract: &Gract) -> Result<(), ReduceError> {
    let tag = gract.tag();
    match gract {
        Gract::ShowType {
            type_id,
            type_name,
            type_desc,
            type_url,
        } => {
            round.types.insert(
                *type_id,
                CardType {
                    id: *type_id,
                    name: type_name.clone(),
                    description: type_desc.clone(),
                    image_url: type_url.clone(),
                },
            );
        }

        Gract::ShowColl {
            coll_id,
            coll_display,
            player_id,
        } => match round.collections.get_mut(coll_id) {
            // Re-showing keeps the cards already placed in it
            Some(coll) => {
                coll.display = *coll_display;
                coll.owner = *player_id;
                coll.selectable = false;
            }
            None => {
                round
                    .collections
                    .insert(*coll_id, Collection::new(*coll_id, *coll_display, *player_id));
            }
        },

        Gract::HideColl { coll_id } => {
            let coll = round
                .collections
                .remove(coll_id)
                .ok_or(ReduceError::UnknownCollection {
                    gract: tag,
                    coll_id: *coll_id,
                })?;
            for card_id in &coll.cards {
                round.cards.remove(card_id);
            }
        }

        Gract::ShowCard {
            card_id,
            type_id,
            coll_id,
        } => {
            require_type(round, tag, *type_id)?;
            require_collection(round, tag, *coll_id)?;
            if let Some(existing) = round.cards.remove(card_id) {
                detach(round, tag, &existing)?;
            }
            round
                .cards
                .insert(*card_id, Card::new(*card_id, *type_id, *coll_id));
            collection_mut(round, tag, *coll_id)?.cards.push(*card_id);
        }

        Gract::HideCard { card_id } => {
            let card = round.cards.remove(card_id).ok_or(ReduceError::UnknownCard {
                gract: tag,
                card_id: *card_id,
            })?;
            detach(round, tag, &card)?;
        }

        Gract::MoveCard { card_id, coll_id } => {
            require_collection(round, tag, *coll_id)?;
            let card = round.cards.get(card_id).cloned().ok_or(ReduceError::UnknownCard {
                gract: tag,
                card_id: *card_id,
            })?;
            detach(round, tag, &card)?;
            collection_mut(round, tag, *coll_id)?.cards.push(*card_id);
            if let Some(card) = round.cards.get_mut(card_id) {
                card.collection_id = *coll_id;
            }
        }

        Gract::RevealCard {
            old_id,
            new_id,
            new_type_id,
        }
        | Gract::ConcealCard {
            old_id,
            new_id,
            new_type_id,
        } => {
            require_type(round, tag, *new_type_id)?;
            if new_id != old_id && round.cards.contains_key(new_id) {
                return Err(ReduceError::DuplicateCard {
                    gract: tag,
                    card_id: *new_id,
                });
            }
            let old = round.cards.remove(old_id).ok_or(ReduceError::UnknownCard {
                gract: tag,
                card_id: *old_id,
            })?;
            let coll = collection_mut(round, tag, old.collection_id)?;
            let index = coll.position(*old_id).ok_or(ReduceError::NotInCollection {
                gract: tag,
                card_id: *old_id,
                coll_id: old.collection_id,
            })?;
            coll.cards[index] = *new_id;
            round
                .cards
                .insert(*new_id, Card::new(*new_id, *new_type_id, old.collection_id));
        }

        Gract::PossibleActions { possible_actions } => {
            for action in possible_actions {
                apply_possible_action(round, tag, action)?;
            }
        }

        Gract::Unknown => {
            trace!("skipping unknown gract");
        }
    }
    Ok(())
}

fn apply_possible_action(
    round: &mut RoundData,
    tag: &'static str,
    action: &PossibleAction,
) -> Result<(), ReduceError> {
    match action {
        PossibleAction::Next => round.nextable = true,
        PossibleAction::Select { card_ids } => {
            for card_id in card_ids {
                card_mut(round, tag, *card_id)?.actionable = Actionable::Select;
            }
        }
        PossibleAction::SelectColl { coll_ids } => {
            for coll_id in coll_ids {
                collection_mut(round, tag, *coll_id)?.selectable = true;
            }
        }
        PossibleAction::Against {
            select_card_id,
            against_card_ids,
        } => {
            card_mut(round, tag, *select_card_id)?.actionable =
                Actionable::Against(against_card_ids.clone());
        }
        PossibleAction::Wild { card_id, type_ids } => {
            card_mut(round, tag, *card_id)?.actionable = Actionable::Wild(type_ids.clone());
        }
        PossibleAction::Unknown => {
            trace!("skipping unknown possible action");
        }
    }
    Ok(())
}

/// Remove a card's id from its owning collection's order.
fn detach(round: &mut RoundData, tag: &'static str, card: &Card) -> Result<(), ReduceError> {
    let coll = collection_mut(round, tag, card.collection_id)?;
    let index = coll.position(card.id).ok_or(ReduceError::NotInCollection {
        gract: tag,
        card_id: card.id,
        coll_id: card.collection_id,
    })?;
    coll.cards.remove(index);
    Ok(())
}

fn require_type(round: &RoundData, tag: &'static str, type_id: TypeId) -> Result<(), ReduceError> {
    if round.types.contains_key(&type_id) {
        Ok(())
    } else {
        Err(ReduceError::UnknownType { gract: tag, type_id })
    }
}

fn require_collection(
    round: &RoundData,
    tag: &'static str,
    coll_id: CollectionId,
) -> Result<(), ReduceError> {
    if round.collections.contains_key(&coll_id) {
        Ok(())
    } else {
        Err(ReduceError::UnknownCollection { gract: tag, coll_id })
    }
}

fn collection_mut<'a>(
    round: &'a mut RoundData,
    tag: &'static str,
    coll_id: CollectionId,
) -> Result<&'a mut Collection, ReduceError> {
    round
        .collections
        .get_mut(&coll_id)
        .ok_or(ReduceError::UnknownCollection { gract: tag, coll_id })
}

fn card_mut<'a>(
    round: &'a mut RoundData,
    tag: &'static str,
    card_id: CardId,
) -> Result<&'a mut Card, ReduceError> {
    round
        .cards
        .get_mut(&card_id)
        .ok_or(ReduceError::UnknownCard { gract: tag, card_id })
}
