//! Turn order within a generation.

use crate::{
    error::{GameError, GameResult},
    events::{EventBus, GameEvent},
    game::{
        read,
        types::{GameId, PlayerId},
        write,
    },
};
use serde::{Deserialize, Serialize};
use std::{
    collections::HashMap,
    sync::{Arc, RwLock},
};

/// Marks a player who may keep acting until they pass.
pub const UNLIMITED_ACTIONS: i32 = -1;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
pub struct TurnSlot {
    pub available_actions: i32,
    pub passed: bool,
}

/// What `skip_turn` ended up doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SkipOutcome {
    pub passed: bool,
    pub generation_ended: bool,
    pub next_player: Option<PlayerId>,
}

#[derive(Debug, Default)]
struct TurnState {
    order: Vec<PlayerId>,
    current: Option<PlayerId>,
    slots: HashMap<PlayerId, TurnSlot>,
    full_allotment: i32,
}

impl TurnState {
    fn slot(&self, player_id: PlayerId) -> GameResult<&TurnSlot> {
        self.slots
            .get(&player_id)
            .ok_or(GameError::PlayerNotFound(player_id))
    }

    fn slot_mut(&mut self, player_id: PlayerId) -> GameResult<&mut TurnSlot> {
        self.slots
            .get_mut(&player_id)
            .ok_or(GameError::PlayerNotFound(player_id))
    }

    fn is_generation_ended(&self) -> bool {
        !self.slots.is_empty()
            && self
                .slots
                .values()
                .all(|s| s.passed || s.available_actions == 0)
    }

    fn advance(&mut self) -> GameResult<PlayerId> {
        if self.order.is_empty() {
            return Err(GameError::NoPlayers);
        }
        let start = self
            .current
            .and_then(|c| self.order.iter().position(|p| *p == c))
            .unwrap_or(self.order.len() - 1);

        let len = self.order.len();
        for step in 1..=len {
            let candidate = self.order[(start + step) % len];
            let eligible = self.slots.get(&candidate).is_some_and(|s| !s.passed);
            if eligible {
                self.current = Some(candidate);
                return Ok(candidate);
            }
        }
        Err(GameError::NoEligiblePlayer)
    }
}

#[derive(Debug)]
pub struct TurnOrder {
    game_id: GameId,
    bus: Arc<EventBus>,
    state: RwLock<TurnState>,
}

impl TurnOrder {
    pub fn new(game_id: GameId, bus: Arc<EventBus>) -> Self {
        TurnOrder {
            game_id,
            bus,
            state: RwLock::new(TurnState::default()),
        }
    }

    pub fn add_player(&self, player_id: PlayerId) {
        let mut state = write(&self.state);
        if !state.order.contains(&player_id) {
            state.order.push(player_id);
            state.slots.insert(player_id, TurnSlot::default());
        }
    }

    pub fn remove_player(&self, player_id: PlayerId) {
        let mut state = write(&self.state);
        state.order.retain(|p| *p != player_id);
        state.slots.remove(&player_id);
        if state.current == Some(player_id) {
            state.current = None;
        }
    }

    pub fn order(&self) -> Vec<PlayerId> {
        read(&self.state).order.clone()
    }

    pub fn current(&self) -> Option<PlayerId> {
        read(&self.state).current
    }

    pub fn slot(&self, player_id: PlayerId) -> Option<TurnSlot> {
        read(&self.state).slots.get(&player_id).copied()
    }

    /// Opens a generation: everybody un-passed with a full allotment and the
    /// first seat to move. A lone player gets unlimited actions.
    pub fn reset_for_generation(&self, actions: i32) -> GameResult<PlayerId> {
        let first = {
            let mut state = write(&self.state);
            let first = *state.order.first().ok_or(GameError::NoPlayers)?;
            let allotment = if state.order.len() == 1 {
                UNLIMITED_ACTIONS
            } else {
                actions
            };
            state.full_allotment = allotment;
            for slot in state.slots.values_mut() {
                *slot = TurnSlot {
                    available_actions: allotment,
                    passed: false,
                };
            }
            state.current = Some(first);
            first
        };
        self.bus.publish(GameEvent::TurnChanged {
            game_id: self.game_id,
            player_id: Some(first),
        });
        Ok(first)
    }

    pub fn validate_current_player(&self, player_id: PlayerId) -> GameResult<()> {
        let current = read(&self.state).current;
        if current != Some(player_id) {
            return Err(GameError::NotCurrentPlayer { current });
        }
        Ok(())
    }

    pub fn ensure_actions_left(&self, player_id: PlayerId) -> GameResult<()> {
        let state = read(&self.state);
        if state.slot(player_id)?.available_actions == 0 {
            return Err(GameError::NoActionsRemaining);
        }
        Ok(())
    }

    /// Spends one action. Unlimited stays unlimited.
    pub fn consume_action(&self, player_id: PlayerId) -> GameResult<i32> {
        let mut state = write(&self.state);
        let slot = state.slot_mut(player_id)?;
        match slot.available_actions {
            0 => Err(GameError::NoActionsRemaining),
            UNLIMITED_ACTIONS => Ok(UNLIMITED_ACTIONS),
            _ => {
                slot.available_actions -= 1;
                Ok(slot.available_actions)
            }
        }
    }

    /// Ends the current player's turn. Untouched allotment means a pass for
    /// the rest of the generation; otherwise it's a plain skip.
    pub fn skip_turn(&self, player_id: PlayerId) -> GameResult<SkipOutcome> {
        let mut events = Vec::new();
        let outcome = {
            let mut state = write(&self.state);
            if state.current != Some(player_id) {
                return Err(GameError::NotCurrentPlayer {
                    current: state.current,
                });
            }

            let full_allotment = state.full_allotment;
            let slot = state.slot_mut(player_id)?;
            let passed = slot.available_actions == full_allotment
                || slot.available_actions == UNLIMITED_ACTIONS;

            if passed {
                let active_before = state.slots.values().filter(|s| !s.passed).count();
                state.slot_mut(player_id)?.passed = true;
                events.push(GameEvent::PlayerPassed {
                    game_id: self.game_id,
                    player_id,
                });

                if active_before == 2 {
                    let last = state
                        .order
                        .iter()
                        .copied()
                        .find(|p| state.slots.get(p).is_some_and(|s| !s.passed));
                    if let Some(last) = last {
                        state.slot_mut(last)?.available_actions = UNLIMITED_ACTIONS;
                        events.push(GameEvent::UnlimitedActionsGranted {
                            game_id: self.game_id,
                            player_id: last,
                        });
                    }
                }
            }

            if state.is_generation_ended() {
                SkipOutcome {
                    passed,
                    generation_ended: true,
                    next_player: None,
                }
            } else {
                let next = state.advance()?;
                events.push(GameEvent::TurnChanged {
                    game_id: self.game_id,
                    player_id: Some(next),
                });
                SkipOutcome {
                    passed,
                    generation_ended: false,
                    next_player: Some(next),
                }
            }
        };

        log::debug!(
            "Game {}: player {} {}",
            self.game_id,
            player_id,
            if outcome.passed { "passed" } else { "skipped" }
        );
        self.bus.publish_all(events);
        Ok(outcome)
    }

    /// Moves the turn to the next seat that hasn't passed.
    pub fn advance_to_next_player(&self) -> GameResult<PlayerId> {
        let next = write(&self.state).advance()?;
        self.bus.publish(GameEvent::TurnChanged {
            game_id: self.game_id,
            player_id: Some(next),
        });
        Ok(next)
    }

    pub fn is_generation_ended(&self) -> bool {
        read(&self.state).is_generation_ended()
    }
}
