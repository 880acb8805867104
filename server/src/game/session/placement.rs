//! Follow-up selections: tile placement and card-draw choices.

use super::{lobby::check_subset, GameSession};
use crate::{
    error::{GameError, GameResult},
    events::GameEvent,
    game::{
        behavior::{Behavior, Occurrence, ResourceType},
        parameters::MAX_OCEANS,
        player::{PendingCardDrawSelection, PendingTileSelection, Player},
        types::{CardId, GamePhase, HexPosition, PlayerId, ResourceSet, TileType},
    },
    protocol::ActionOutcome,
};

/// Credits paid for each ocean next to a newly placed tile.
pub const OCEAN_ADJACENCY_BONUS: i32 = 2;

impl GameSession {
    /// Turns the next queued tile request into a pending selection. Requests
    /// with no legal hex are dropped.
    pub(super) fn process_tile_queue(&self, player: &Player) {
        while player.pending_tile().is_none() {
            let Some(request) = player.next_tile_request() else {
                return;
            };

            let oceans_full =
                request.tile_type == TileType::Ocean && self.parameters.oceans() >= MAX_OCEANS;
            let available_hexes = if oceans_full {
                Vec::new()
            } else {
                self.board.available_hexes(request.tile_type, player.id())
            };
            if available_hexes.is_empty() {
                log::warn!(
                    "Session {}: no legal hex for {} from {}, skipping",
                    self.id,
                    request.tile_type,
                    request.source
                );
                continue;
            }

            player.set_pending_tile(PendingTileSelection {
                tile_type: request.tile_type,
                available_hexes: available_hexes.clone(),
                source: request.source,
            });
            self.bus.publish(GameEvent::TileSelectionRequired {
                game_id: self.id,
                player_id: player.id(),
                tile_type: request.tile_type,
                available_hexes,
            });
        }
    }

    /// Land tiles a behavior asks for must have somewhere to go before
    /// anything is paid. Oceans past the cap are a zero-effect success.
    pub(super) fn ensure_placeable(&self, player: &Player, behavior: &Behavior) -> GameResult<()> {
        let land_tiles = behavior
            .outputs
            .iter()
            .filter_map(|o| o.resource_type.placement())
            .filter(|t| *t != TileType::Ocean);
        for tile_type in land_tiles {
            if self.board.available_hexes(tile_type, player.id()).is_empty() {
                return Err(GameError::NoPlacementAvailable(tile_type));
            }
        }
        Ok(())
    }

    /// Places the pending tile, pays its bonuses, then raises the matching
    /// global parameter.
    pub fn select_tile(
        &self,
        player_id: PlayerId,
        coordinates: HexPosition,
    ) -> GameResult<ActionOutcome> {
        self.ensure_active()?;
        self.ensure_phase(GamePhase::Action)?;
        self.turns.validate_current_player(player_id)?;
        let player = self.player(player_id)?;
        let pending = player.take_pending_tile(coordinates)?;

        self.board
            .update_tile_occupancy(coordinates, pending.tile_type, player_id)?;
        self.pay_placement_bonus(&player, coordinates)?;

        let ledger = player.resources();
        match pending.tile_type {
            TileType::Ocean => {
                if self.parameters.place_ocean() {
                    ledger.update_terraform_rating(1);
                }
            }
            TileType::Greenery => {
                let raised = self.parameters.increase_oxygen(1);
                ledger.update_terraform_rating(raised);
            }
            TileType::City => {}
        }

        self.fire_triggers(&player, Occurrence::TilePlaced(pending.tile_type));
        self.process_tile_queue(&player);
        self.maybe_end_generation()?;
        Ok(self.outcome())
    }

    fn pay_placement_bonus(&self, player: &Player, coordinates: HexPosition) -> GameResult<()> {
        let tile = self.board.tile(coordinates)?;
        let mut gains = ResourceSet::default();
        let mut draw = 0;
        for bonus in &tile.bonuses {
            match bonus.resource_type {
                ResourceType::CardDraw => draw += bonus.amount.max(0) as usize,
                rt => match rt.as_resource() {
                    Some(resource) => gains.add(resource, bonus.amount),
                    None => log::warn!(
                        "Session {}: unsupported tile bonus {:?} at {}",
                        self.id,
                        rt,
                        coordinates
                    ),
                },
            }
        }
        gains.credits += OCEAN_ADJACENCY_BONUS * self.board.adjacent_oceans(coordinates) as i32;
        player.resources().add(&gains)?;

        let cards = if draw > 0 {
            let n = draw.min(self.deck.project_count());
            self.deck.draw_project_cards(n)?
        } else {
            Vec::new()
        };
        if !cards.is_empty() {
            player.add_to_hand(&cards);
            self.bus.publish(GameEvent::CardsAddedToHand {
                game_id: self.id,
                player_id: player.id(),
                card_ids: cards.clone(),
            });
        }

        if !gains.is_empty() || !cards.is_empty() {
            self.bus.publish(GameEvent::PlacementBonusGained {
                game_id: self.id,
                player_id: player.id(),
                coordinates,
                resources: gains.iter().filter(|(_, n)| *n != 0).collect(),
                cards_drawn: cards.len(),
            });
        }
        Ok(())
    }

    /// Resolves a pending card draw: `take` are free picks, `buy` are paid.
    pub fn confirm_card_draw(
        &self,
        player_id: PlayerId,
        take: &[CardId],
        buy: &[CardId],
    ) -> GameResult<ActionOutcome> {
        self.ensure_active()?;
        self.ensure_phase(GamePhase::Action)?;
        self.turns.validate_current_player(player_id)?;
        let player = self.player(player_id)?;
        let pending = player.take_pending_card_draw()?;

        if let Err(e) = self.keep_drawn_cards(&player, &pending, take, buy) {
            player.set_pending_card_draw(pending);
            return Err(e);
        }

        self.maybe_end_generation()?;
        Ok(self.outcome())
    }

    fn keep_drawn_cards(
        &self,
        player: &Player,
        pending: &PendingCardDrawSelection,
        take: &[CardId],
        buy: &[CardId],
    ) -> GameResult<()> {
        let kept: Vec<CardId> = take.iter().chain(buy).cloned().collect();
        check_subset(&kept, &pending.available_cards)?;
        if pending.mandatory && take.len() != pending.available_cards.len() {
            return Err(GameError::InvalidSelection(
                "every drawn card must be kept".to_string(),
            ));
        }
        if take.len() > pending.free_take {
            return Err(GameError::InvalidSelection(format!(
                "{} free card(s) taken, {} allowed",
                take.len(),
                pending.free_take
            )));
        }
        if buy.len() > pending.max_buy {
            return Err(GameError::InvalidSelection(format!(
                "{} card(s) bought, {} allowed",
                buy.len(),
                pending.max_buy
            )));
        }

        let cost = buy.len() as i32 * pending.card_buy_cost;
        player.resources().pay_cost(&ResourceSet::credits(cost))?;

        player.add_to_hand(&kept);
        self.deck.discard(
            pending
                .available_cards
                .iter()
                .filter(|c| !kept.contains(c))
                .cloned()
                .collect(),
        )?;

        log::info!(
            "Session {}: player {} kept {} card(s) from {}, bought {}",
            self.id,
            player.id(),
            kept.len(),
            pending.source,
            buy.len()
        );
        if !kept.is_empty() {
            self.bus.publish(GameEvent::CardsAddedToHand {
                game_id: self.id,
                player_id: player.id(),
                card_ids: kept,
            });
        }
        Ok(())
    }
}
