//! Draw piles for project cards, corporations and preludes.
//!
//! Every card id the deck was built with sits in exactly one pile, a hand,
//! or a tableau. Draws that would run a pile short fail without touching it.

use crate::{
    error::{GameError, GameResult},
    events::{EventBus, GameEvent},
    game::{
        read,
        types::{CardId, GameId},
        write,
    },
};
use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, RwLock};

/// Pile sizes and counters for the read model.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeckCounts {
    pub project: usize,
    pub corporations: usize,
    pub preludes: usize,
    pub discard: usize,
    pub removed: usize,
    pub drawn: usize,
    pub shuffles: u32,
}

#[derive(Debug)]
struct DeckState {
    project: Vec<CardId>,
    corporations: Vec<CardId>,
    preludes: Vec<CardId>,
    discard: Vec<CardId>,
    removed: Vec<CardId>,
    drawn: usize,
    shuffles: u32,
    rng: StdRng,
}

impl DeckState {
    fn contains(&self, id: &str) -> bool {
        [
            &self.project,
            &self.corporations,
            &self.preludes,
            &self.discard,
            &self.removed,
        ]
        .iter()
        .any(|pile| pile.iter().any(|c| c == id))
    }
}

#[derive(Debug, Clone, Copy)]
enum Pile {
    Project,
    Corporations,
    Preludes,
}

#[derive(Debug)]
pub struct Deck {
    game_id: GameId,
    bus: Arc<EventBus>,
    state: RwLock<DeckState>,
}

impl Deck {
    pub fn new(
        game_id: GameId,
        mut project: Vec<CardId>,
        mut corporations: Vec<CardId>,
        mut preludes: Vec<CardId>,
        seed: u64,
        bus: Arc<EventBus>,
    ) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        project.shuffle(&mut rng);
        corporations.shuffle(&mut rng);
        preludes.shuffle(&mut rng);
        let state = DeckState {
            project,
            corporations,
            preludes,
            discard: Vec::new(),
            removed: Vec::new(),
            drawn: 0,
            shuffles: 0,
            rng,
        };

        log::debug!(
            "Game {}: deck built with {} project cards, {} corporations, {} preludes",
            game_id,
            state.project.len(),
            state.corporations.len(),
            state.preludes.len()
        );

        Deck {
            game_id,
            bus,
            state: RwLock::new(state),
        }
    }

    pub fn draw_project_cards(&self, count: usize) -> GameResult<Vec<CardId>> {
        self.draw(Pile::Project, count)
    }

    pub fn draw_corporations(&self, count: usize) -> GameResult<Vec<CardId>> {
        self.draw(Pile::Corporations, count)
    }

    pub fn draw_preludes(&self, count: usize) -> GameResult<Vec<CardId>> {
        self.draw(Pile::Preludes, count)
    }

    fn draw(&self, pile: Pile, count: usize) -> GameResult<Vec<CardId>> {
        let mut state = write(&self.state);
        let cards = match pile {
            Pile::Project => &mut state.project,
            Pile::Corporations => &mut state.corporations,
            Pile::Preludes => &mut state.preludes,
        };
        if count > cards.len() {
            return Err(GameError::InsufficientCards {
                requested: count,
                available: cards.len(),
            });
        }
        let drawn: Vec<CardId> = cards.drain(..count).collect();
        state.drawn += drawn.len();
        Ok(drawn)
    }

    pub fn discard(&self, card_ids: Vec<CardId>) -> GameResult<()> {
        if card_ids.is_empty() {
            return Ok(());
        }
        {
            let mut state = write(&self.state);
            check_untracked(&state, &card_ids)?;
            state.discard.extend(card_ids.iter().cloned());
        }
        self.bus.publish(GameEvent::CardsDiscarded {
            game_id: self.game_id,
            card_ids,
        });
        Ok(())
    }

    /// Takes cards out of the game for good.
    pub fn remove(&self, card_ids: Vec<CardId>) -> GameResult<()> {
        let mut state = write(&self.state);
        check_untracked(&state, &card_ids)?;
        state.removed.extend(card_ids);
        Ok(())
    }

    /// Shuffles the discard pile and puts it under the draw pile.
    pub fn reshuffle(&self) {
        let shuffle_count = {
            let mut state = write(&self.state);
            let DeckState {
                discard,
                project,
                rng,
                ..
            } = &mut *state;
            discard.shuffle(rng);
            project.append(discard);
            state.shuffles += 1;
            state.shuffles
        };
        log::info!("Game {}: discard pile reshuffled ({})", self.game_id, shuffle_count);
        self.bus.publish(GameEvent::DeckReshuffled {
            game_id: self.game_id,
            shuffle_count,
        });
    }

    pub fn project_count(&self) -> usize {
        read(&self.state).project.len()
    }

    pub fn discard_count(&self) -> usize {
        read(&self.state).discard.len()
    }

    pub fn project_cards(&self) -> Vec<CardId> {
        read(&self.state).project.clone()
    }

    pub fn discard_pile(&self) -> Vec<CardId> {
        read(&self.state).discard.clone()
    }

    pub fn removed_cards(&self) -> Vec<CardId> {
        read(&self.state).removed.clone()
    }

    pub fn counts(&self) -> DeckCounts {
        let state = read(&self.state);
        DeckCounts {
            project: state.project.len(),
            corporations: state.corporations.len(),
            preludes: state.preludes.len(),
            discard: state.discard.len(),
            removed: state.removed.len(),
            drawn: state.drawn,
            shuffles: state.shuffles,
        }
    }
}

fn check_untracked(state: &DeckState, card_ids: &[CardId]) -> GameResult<()> {
    for (i, id) in card_ids.iter().enumerate() {
        if state.contains(id) || card_ids[..i].contains(id) {
            return Err(GameError::CardAlreadyInDeck(id.clone()));
        }
    }
    Ok(())
}
