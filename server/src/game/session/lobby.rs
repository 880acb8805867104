//! Seating, start of play and the starting selection.

use super::GameSession;
use crate::{
    error::{GameError, GameResult},
    events::GameEvent,
    game::{
        behavior::Behavior,
        effects::{EffectOutcome, EffectRequest},
        player::{Player, StartingSelection},
        read,
        types::{CardId, GamePhase, GameStatus, PlayerId, Resource, ResourceSet},
        write,
    },
};
use std::{collections::HashSet, sync::Arc};
use uuid::Uuid;

impl GameSession {
    pub fn join(&self, name: &str) -> GameResult<PlayerId> {
        let player_id = Uuid::new_v4();
        {
            let mut players = write(&self.players);
            let mut state = write(&self.state);
            if state.status != GameStatus::Lobby {
                return Err(GameError::GameAlreadyStarted);
            }
            if players.len() >= self.settings.max_players {
                return Err(GameError::GameFull(self.settings.max_players));
            }
            players.push(Arc::new(Player::new(
                self.id,
                player_id,
                name,
                self.settings.starting_terraform_rating,
                Arc::clone(&self.bus),
            )));
            state.host_id.get_or_insert(player_id);
            self.turns.add_player(player_id);
        }

        log::info!("Session {}: {} joined as {}", self.id, name, player_id);
        self.bus.publish(GameEvent::PlayerJoined {
            game_id: self.id,
            player_id,
            name: name.to_string(),
        });
        Ok(player_id)
    }

    /// Lobby only; the host seat passes to the next player in line.
    pub fn leave(&self, player_id: PlayerId) -> GameResult<()> {
        {
            let mut players = write(&self.players);
            let mut state = write(&self.state);
            if state.status != GameStatus::Lobby {
                return Err(GameError::GameAlreadyStarted);
            }
            let before = players.len();
            players.retain(|p| p.id() != player_id);
            if players.len() == before {
                return Err(GameError::PlayerNotFound(player_id));
            }
            if state.host_id == Some(player_id) {
                state.host_id = players.first().map(|p| p.id());
            }
            self.turns.remove_player(player_id);
        }

        log::info!("Session {}: player {} left", self.id, player_id);
        self.bus.publish(GameEvent::PlayerLeft {
            game_id: self.id,
            player_id,
        });
        Ok(())
    }

    pub fn set_connected(&self, player_id: PlayerId, connected: bool) -> GameResult<()> {
        let player = self.player(player_id)?;
        if player.set_connected(connected) {
            log::info!(
                "Session {}: player {} {}",
                self.id,
                player_id,
                if connected { "reconnected" } else { "disconnected" }
            );
            self.bus.publish(GameEvent::PlayerConnectionChanged {
                game_id: self.id,
                player_id,
                connected,
            });
        }
        Ok(())
    }

    /// Deals corporations and starting cards. Host only.
    pub fn start_game(&self, player_id: PlayerId) -> GameResult<()> {
        let players = {
            let players = read(&self.players);
            let mut state = write(&self.state);
            if state.status != GameStatus::Lobby {
                return Err(GameError::GameAlreadyStarted);
            }
            if state.host_id != Some(player_id) {
                return Err(GameError::NotHost);
            }
            if players.is_empty() {
                return Err(GameError::NoPlayers);
            }

            let seats = players.len();
            let counts = self.deck.counts();
            let corporations = self.settings.starting_corporations * seats;
            let cards = self.settings.starting_hand * seats;
            if corporations > counts.corporations {
                return Err(GameError::InsufficientCards {
                    requested: corporations,
                    available: counts.corporations,
                });
            }
            if cards > counts.project {
                return Err(GameError::InsufficientCards {
                    requested: cards,
                    available: counts.project,
                });
            }

            state.status = GameStatus::Active;
            players.clone()
        };

        log::info!("Session {} started with {} player(s)", self.id, players.len());
        self.bus.publish(GameEvent::GameStarted {
            game_id: self.id,
            player_ids: players.iter().map(|p| p.id()).collect(),
        });

        for player in &players {
            let selection = StartingSelection {
                corporations: self
                    .deck
                    .draw_corporations(self.settings.starting_corporations)?,
                cards: self.deck.draw_project_cards(self.settings.starting_hand)?,
            };
            if selection.corporations.is_empty() && selection.cards.is_empty() {
                continue;
            }
            player.set_starting_selection(Some(selection));
        }

        self.set_phase(GamePhase::StartingCardSelection);
        self.maybe_begin_play()
    }

    /// Keeps `cards` at the buy price each and takes `corporation`, whose
    /// starting credits count towards that price.
    pub fn select_starting_cards(
        &self,
        player_id: PlayerId,
        corporation: Option<&str>,
        cards: &[CardId],
    ) -> GameResult<()> {
        self.ensure_active()?;
        self.ensure_phase(GamePhase::StartingCardSelection)?;
        let player = self.player(player_id)?;
        let selection = player
            .take_starting_selection()
            .ok_or(GameError::NoPendingSelection("starting"))?;

        if let Err(e) = self.keep_starting_cards(&player, &selection, corporation, cards) {
            player.set_starting_selection(Some(selection));
            return Err(e);
        }
        self.maybe_begin_play()
    }

    fn keep_starting_cards(
        &self,
        player: &Arc<Player>,
        selection: &StartingSelection,
        corporation: Option<&str>,
        cards: &[CardId],
    ) -> GameResult<()> {
        let player_id = player.id();
        let corporation = match corporation {
            Some(id) if selection.corporations.iter().any(|c| c == id) => Some(
                self.catalog
                    .get(id)
                    .ok_or_else(|| GameError::CardNotFound(id.to_string()))?,
            ),
            Some(id) => {
                return Err(GameError::InvalidSelection(format!(
                    "corporation {id} was not dealt"
                )))
            }
            None if selection.corporations.is_empty() => None,
            None => {
                return Err(GameError::InvalidSelection(
                    "a corporation must be chosen".to_string(),
                ))
            }
        };
        check_subset(cards, &selection.cards)?;

        let cost = ResourceSet::credits(cards.len() as i32 * self.settings.card_buy_cost);
        let grant = corporation.as_ref().map_or(0, |c| c.starting_credits());
        let available = player.resources().get().credits + grant;
        if available < cost.credits {
            return Err(GameError::InsufficientResources {
                resource: Resource::Credits,
                needed: cost.credits,
                available,
            });
        }

        let players = self.players();
        let mut first_action = None;
        if let Some(corp) = &corporation {
            let behavior = Behavior::merged(corp.auto_behaviors()).ok_or_else(|| {
                GameError::InvalidAuthoring(format!("{} has several choice behaviors", corp.id))
            })?;
            first_action = Some(self.engine(&players).resolve(
                player,
                &behavior,
                &EffectRequest {
                    source: &corp.id,
                    source_card: Some(&corp.id),
                    ..EffectRequest::default()
                },
            )?);
            player.set_corporation(corp.id.clone());
            self.register_effects(player, corp);
        }
        player.resources().pay_cost(&cost)?;
        player.add_to_hand(cards);
        self.deck.discard(
            selection
                .cards
                .iter()
                .filter(|c| !cards.contains(c))
                .cloned()
                .collect(),
        )?;
        self.deck.remove(
            selection
                .corporations
                .iter()
                .filter(|c| corporation.as_ref().map_or(true, |corp| corp.id != **c))
                .cloned()
                .collect(),
        )?;

        log::info!(
            "Session {}: player {} took {:?} and kept {} card(s)",
            self.id,
            player_id,
            corporation.as_ref().map(|c| c.id.as_str()),
            cards.len()
        );
        if !cards.is_empty() {
            self.bus.publish(GameEvent::CardsAddedToHand {
                game_id: self.id,
                player_id,
                card_ids: cards.to_vec(),
            });
        }
        if let Some(outcome) = first_action {
            self.stage_first_action(player, outcome);
        }
        Ok(())
    }

    /// Corporation follow-ups become the player's forced first action. A
    /// card choice is offered right away; tiles wait for the action phase.
    fn stage_first_action(&self, player: &Player, mut outcome: EffectOutcome) {
        let tiles = std::mem::take(&mut outcome.tiles);
        if !tiles.is_empty() {
            log::debug!(
                "Session {}: player {} starts with {} tile(s) to place",
                self.id,
                player.id(),
                tiles.len()
            );
            player.queue_tiles(tiles);
        }
        self.absorb(player, outcome);
    }

    /// Enters the first action phase once every starting selection is in.
    fn maybe_begin_play(&self) -> GameResult<()> {
        if self
            .players()
            .iter()
            .any(|p| p.starting_selection().is_some())
        {
            return Ok(());
        }
        self.set_phase(GamePhase::Action);
        self.turns
            .reset_for_generation(self.settings.actions_per_generation)?;
        for player in self.players() {
            self.process_tile_queue(&player);
        }
        Ok(())
    }
}

/// `selected` must be distinct members of `offered`.
pub(super) fn check_subset(selected: &[CardId], offered: &[CardId]) -> GameResult<()> {
    let mut seen = HashSet::new();
    for id in selected {
        if !offered.contains(id) {
            return Err(GameError::InvalidSelection(format!("{id} was not offered")));
        }
        if !seen.insert(id) {
            return Err(GameError::InvalidSelection(format!("{id} selected twice")));
        }
    }
    Ok(())
}
