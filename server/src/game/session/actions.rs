//! Turn actions: cards, card actions, standard projects, conversions, skip.

use super::{lobby::check_subset, GameSession};
use crate::{
    error::{GameError, GameResult},
    events::GameEvent,
    game::{
        behavior::{Behavior, CardTag, Occurrence, Trigger},
        cards::{CardDef, CardPayment, RequirementType},
        effects::{EffectOutcome, EffectRequest},
        player::Player,
        projects::{self, StandardProject},
        types::{CardId, GamePhase, PlayerId, TileType},
    },
    protocol::ActionOutcome,
};

impl GameSession {
    pub fn play_card(
        &self,
        player_id: PlayerId,
        card_id: &str,
        payment: CardPayment,
        choice: Option<usize>,
        target_player: Option<PlayerId>,
        target_card: Option<&str>,
    ) -> GameResult<ActionOutcome> {
        let player = self.begin_action(player_id)?;
        if !player.has_in_hand(card_id) {
            return Err(GameError::CardNotInHand(card_id.to_string()));
        }
        let card = self
            .catalog
            .get(card_id)
            .ok_or_else(|| GameError::CardNotFound(card_id.to_string()))?;
        if !card.card_type.is_project() {
            return Err(GameError::InvalidSelection(format!(
                "{card_id} is not a project card"
            )));
        }
        self.check_requirements(&player, &card)?;
        let cost = payment.cost_for(&card)?;
        let behavior = Behavior::merged(card.auto_behaviors()).ok_or_else(|| {
            GameError::InvalidAuthoring(format!("{card_id} has several choice behaviors"))
        })?;

        let players = self.players();
        let outcome = self.engine(&players).resolve(
            &player,
            &behavior,
            &EffectRequest {
                source: card_id,
                source_card: Some(card_id),
                choice,
                extra_cost: cost,
                target_card,
                target_player,
            },
        )?;
        player.play_card(card_id)?;
        player.resources().add_victory_points(card.victory_points);

        log::info!("Session {}: player {} played {}", self.id, player_id, card_id);
        self.bus.publish(GameEvent::CardPlayed {
            game_id: self.id,
            player_id,
            card_id: card_id.to_string(),
        });

        self.absorb(&player, outcome);
        self.fire_triggers(&player, Occurrence::CardPlayed(card.tags.as_slice()));
        self.register_effects(&player, &card);
        self.finish_action(&player)
    }

    /// Every printed requirement must hold before anything is paid.
    fn check_requirements(&self, player: &Player, card: &CardDef) -> GameResult<()> {
        for requirement in &card.requirements {
            let value = match requirement.kind {
                RequirementType::Temperature => self.parameters.temperature(),
                RequirementType::Oxygen => self.parameters.oxygen(),
                RequirementType::Oceans => self.parameters.oceans(),
                RequirementType::TerraformRating => player.resources().terraform_rating(),
                RequirementType::Production => {
                    let resource = requirement.resource.ok_or_else(|| {
                        GameError::InvalidAuthoring(format!(
                            "{} production requirement without a resource",
                            card.id
                        ))
                    })?;
                    player.resources().production().get(resource)
                }
                RequirementType::Tags => {
                    let tag = requirement.tag.ok_or_else(|| {
                        GameError::InvalidAuthoring(format!(
                            "{} tag requirement without a tag",
                            card.id
                        ))
                    })?;
                    self.count_tags(player, tag)
                }
                RequirementType::Cities => {
                    self.board.count_tiles(TileType::City, Some(player.id())) as i32
                }
                RequirementType::Greeneries => {
                    self.board.count_tiles(TileType::Greenery, Some(player.id())) as i32
                }
            };
            requirement.check(&card.id, value)?;
        }
        Ok(())
    }

    /// Tags on played cards and the corporation; wild tags count for any.
    fn count_tags(&self, player: &Player, tag: CardTag) -> i32 {
        player
            .played()
            .into_iter()
            .chain(player.corporation())
            .flat_map(|card| self.catalog.tags(&card))
            .filter(|t| *t == tag || *t == CardTag::Wild)
            .count() as i32
    }

    /// Manual behaviors on played cards, once each per generation.
    pub fn use_card_action(
        &self,
        player_id: PlayerId,
        card_id: &str,
        behavior_index: usize,
        choice: Option<usize>,
        target_player: Option<PlayerId>,
        target_card: Option<&str>,
    ) -> GameResult<ActionOutcome> {
        let player = self.begin_action(player_id)?;
        if !player.owns_card(card_id) {
            return Err(GameError::CardNotPlayed(card_id.to_string()));
        }
        let card = self
            .catalog
            .get(card_id)
            .ok_or_else(|| GameError::CardNotFound(card_id.to_string()))?;
        let behavior = card
            .behaviors
            .get(behavior_index)
            .filter(|b| b.trigger == Trigger::Manual)
            .ok_or_else(|| {
                GameError::InvalidSelection(format!("{card_id} has no action #{behavior_index}"))
            })?;
        if player.action_used(card_id, behavior_index) {
            return Err(GameError::ActionAlreadyUsed {
                card_id: card_id.to_string(),
                behavior: behavior_index,
            });
        }

        let players = self.players();
        let outcome = self.engine(&players).resolve(
            &player,
            behavior,
            &EffectRequest {
                source: card_id,
                source_card: Some(card_id),
                choice,
                target_card,
                target_player,
                ..EffectRequest::default()
            },
        )?;
        player.mark_action_used(card_id, behavior_index);

        log::info!(
            "Session {}: player {} used action #{} of {}",
            self.id,
            player_id,
            behavior_index,
            card_id
        );
        self.bus.publish(GameEvent::CardActionUsed {
            game_id: self.id,
            player_id,
            card_id: card_id.to_string(),
            behavior: behavior_index,
        });

        self.absorb(&player, outcome);
        self.finish_action(&player)
    }

    /// `cards` lists the hand cards to sell; empty for every other project.
    pub fn standard_project(
        &self,
        player_id: PlayerId,
        project: StandardProject,
        cards: &[CardId],
    ) -> GameResult<ActionOutcome> {
        let player = self.begin_action(player_id)?;
        match project {
            StandardProject::SellPatents => {
                if cards.is_empty() {
                    return Err(GameError::InvalidSelection("no cards to sell".to_string()));
                }
                check_subset(cards, &player.hand())?;
            }
            _ if !cards.is_empty() => {
                return Err(GameError::InvalidSelection(format!(
                    "{} takes no cards",
                    project.name()
                )))
            }
            _ => {}
        }

        let behavior = project.behavior(cards.len());
        self.ensure_placeable(&player, &behavior)?;

        let players = self.players();
        let outcome = self.engine(&players).resolve(
            &player,
            &behavior,
            &EffectRequest {
                source: project.name(),
                ..EffectRequest::default()
            },
        )?;
        if project == StandardProject::SellPatents {
            player.remove_from_hand(cards)?;
            self.deck.discard(cards.to_vec())?;
        }

        log::info!(
            "Session {}: player {} used standard project {}",
            self.id,
            player_id,
            project.name()
        );
        self.bus.publish(GameEvent::StandardProjectUsed {
            game_id: self.id,
            player_id,
            project,
        });

        self.absorb(&player, outcome);
        self.finish_action(&player)
    }

    pub fn convert_heat_to_temperature(&self, player_id: PlayerId) -> GameResult<ActionOutcome> {
        self.convert(player_id, &projects::heat_conversion(), "heat-conversion")
    }

    pub fn convert_plants_to_greenery(&self, player_id: PlayerId) -> GameResult<ActionOutcome> {
        self.convert(player_id, &projects::plant_conversion(), "plant-conversion")
    }

    fn convert(
        &self,
        player_id: PlayerId,
        behavior: &Behavior,
        source: &str,
    ) -> GameResult<ActionOutcome> {
        let player = self.begin_action(player_id)?;
        self.ensure_placeable(&player, behavior)?;
        let players = self.players();
        let outcome = self.engine(&players).resolve(
            &player,
            behavior,
            &EffectRequest {
                source,
                ..EffectRequest::default()
            },
        )?;
        log::debug!("Session {}: player {} {}", self.id, player_id, source);
        self.absorb(&player, outcome);
        self.finish_action(&player)
    }

    /// Ends the turn; a pass if no action was taken this round.
    pub fn skip_turn(&self, player_id: PlayerId) -> GameResult<ActionOutcome> {
        self.ensure_active()?;
        self.ensure_phase(GamePhase::Action)?;
        let player = self.player(player_id)?;
        if player.has_pending_selection() {
            return Err(GameError::PendingSelection);
        }

        let skip = self.turns.skip_turn(player_id)?;
        log::info!(
            "Session {}: player {} {}",
            self.id,
            player_id,
            if skip.passed { "passed" } else { "skipped" }
        );
        if skip.generation_ended {
            self.maybe_end_generation()?;
        }
        Ok(self.outcome())
    }

    /// Hands the engine's follow-ups to the player: card choices and tiles.
    pub(super) fn absorb(&self, player: &Player, outcome: EffectOutcome) {
        if let Some(selection) = outcome.card_draw {
            self.bus.publish(GameEvent::CardDrawSelectionRequired {
                game_id: self.id,
                player_id: player.id(),
                card_ids: selection.available_cards,
                free_take: selection.free_take,
                max_buy: selection.max_buy,
            });
        }
        if !outcome.tiles.is_empty() {
            player.queue_tiles(outcome.tiles);
            self.process_tile_queue(player);
        }
    }
}
