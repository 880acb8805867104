//! Generation end, the production phase and game end.

use super::{lobby::check_subset, GameSession};
use crate::{
    error::{GameError, GameResult},
    events::GameEvent,
    game::{
        player::Player,
        scoring, write,
        types::{CardId, GamePhase, GameStatus, PlayerId, ResourceSet},
    },
    protocol::ActionOutcome,
};

impl GameSession {
    /// Closes the generation once every player is done and nothing is
    /// pending. Exactly one caller wins the phase change.
    pub(super) fn maybe_end_generation(&self) -> GameResult<bool> {
        if !self.turns.is_generation_ended() {
            return Ok(false);
        }
        if self.players().iter().any(|p| p.has_pending_selection()) {
            return Ok(false);
        }
        let Some(generation) = self.transition(GamePhase::Action, GamePhase::Production) else {
            return Ok(false);
        };

        log::info!("Session {}: generation {} ended", self.id, generation);
        self.bus.publish(GameEvent::GenerationEnded {
            game_id: self.id,
            generation,
        });

        if self.parameters.is_maxed() {
            self.complete_game();
        } else {
            self.run_production()?;
        }
        Ok(true)
    }

    fn run_production(&self) -> GameResult<()> {
        let players = self.players();
        for player in &players {
            let report = player.resources().apply_production();
            player.reset_used_actions();
            log::debug!(
                "Session {}: player {} produced {:?} ({} energy to heat)",
                self.id,
                player.id(),
                report.income,
                report.energy_converted
            );
        }

        let generation = {
            let mut state = write(&self.state);
            state.generation += 1;
            state.generation
        };
        self.bus.publish(GameEvent::PhaseChanged {
            game_id: self.id,
            phase: GamePhase::Production,
            generation,
        });

        let draw = self.settings.production_draw;
        if draw > 0 {
            for player in &players {
                if self.deck.project_count() < draw && self.deck.discard_count() > 0 {
                    self.deck.reshuffle();
                }
                let n = draw.min(self.deck.project_count());
                if n == 0 {
                    log::warn!("Session {}: project deck exhausted", self.id);
                    break;
                }
                player.set_production_selection(Some(self.deck.draw_project_cards(n)?));
            }
        }

        self.maybe_resume_actions()
    }

    /// Buys `cards` out of the production offer; the rest are discarded.
    pub fn confirm_production_cards(
        &self,
        player_id: PlayerId,
        cards: &[CardId],
    ) -> GameResult<ActionOutcome> {
        self.ensure_active()?;
        self.ensure_phase(GamePhase::Production)?;
        let player = self.player(player_id)?;
        let offered = player
            .take_production_selection()
            .ok_or(GameError::NoPendingSelection("production"))?;

        if let Err(e) = self.buy_production_cards(&player, &offered, cards) {
            player.set_production_selection(Some(offered));
            return Err(e);
        }

        self.maybe_resume_actions()?;
        Ok(self.outcome())
    }

    fn buy_production_cards(
        &self,
        player: &Player,
        offered: &[CardId],
        cards: &[CardId],
    ) -> GameResult<()> {
        check_subset(cards, offered)?;
        let cost = cards.len() as i32 * self.settings.card_buy_cost;
        player.resources().pay_cost(&ResourceSet::credits(cost))?;
        player.add_to_hand(cards);
        self.deck.discard(
            offered
                .iter()
                .filter(|c| !cards.contains(c))
                .cloned()
                .collect(),
        )?;

        if !cards.is_empty() {
            self.bus.publish(GameEvent::CardsAddedToHand {
                game_id: self.id,
                player_id: player.id(),
                card_ids: cards.to_vec(),
            });
        }
        Ok(())
    }

    /// Back to the action phase once every production offer is resolved.
    fn maybe_resume_actions(&self) -> GameResult<()> {
        if self
            .players()
            .iter()
            .any(|p| p.production_selection().is_some())
        {
            return Ok(());
        }
        let Some(generation) = self.transition(GamePhase::Production, GamePhase::Action) else {
            return Ok(());
        };
        log::info!("Session {}: generation {} begins", self.id, generation);
        self.bus.publish(GameEvent::PhaseChanged {
            game_id: self.id,
            phase: GamePhase::Action,
            generation,
        });
        self.turns
            .reset_for_generation(self.settings.actions_per_generation)?;
        Ok(())
    }

    fn complete_game(&self) {
        let generation = {
            let mut state = write(&self.state);
            state.status = GameStatus::Completed;
            state.phase = GamePhase::Complete;
            state.generation
        };

        let scores = scoring::final_scores(&self.players(), &self.board.tiles());
        let winner = scoring::winner(&scores);
        log::info!(
            "Session {} finished after generation {}, winner {:?}",
            self.id,
            generation,
            winner
        );

        self.bus.publish(GameEvent::PhaseChanged {
            game_id: self.id,
            phase: GamePhase::Complete,
            generation,
        });
        self.bus.publish(GameEvent::GameEnded {
            game_id: self.id,
            winner,
            scores,
        });
    }

    /// Compare-and-set on the phase; returns the generation when it wins.
    fn transition(&self, from: GamePhase, to: GamePhase) -> Option<u32> {
        let mut state = write(&self.state);
        if state.phase != from {
            return None;
        }
        state.phase = to;
        Some(state.generation)
    }
}
