//! A seat at the table: ledger plus hand, tableau and pending selections.

use crate::{
    error::{GameError, GameResult},
    events::EventBus,
    game::{
        behavior::Behavior,
        read,
        resources::PlayerResources,
        types::{CardId, GameId, HexPosition, PlayerId, TileType},
        write,
    },
};
use serde::{Deserialize, Serialize};
use std::{
    collections::{BTreeSet, HashSet, VecDeque},
    sync::{Arc, RwLock},
};

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct TileRequest {
    pub tile_type: TileType,
    pub source: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct PendingTileSelection {
    pub tile_type: TileType,
    pub available_hexes: Vec<HexPosition>,
    pub source: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct PendingCardDrawSelection {
    pub available_cards: Vec<CardId>,
    pub free_take: usize,
    pub max_buy: usize,
    pub card_buy_cost: i32,
    pub source: String,
    pub source_card: Option<CardId>,
    /// Every offered card must be kept.
    pub mandatory: bool,
}

/// A reactive behavior standing on a player's tableau.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct PlayerEffect {
    pub card_id: CardId,
    pub behavior_index: usize,
    pub behavior: Behavior,
}

/// Dealt at game start; resolved by `select_starting_cards`.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, Default)]
pub struct StartingSelection {
    pub corporations: Vec<CardId>,
    pub cards: Vec<CardId>,
}

#[derive(Debug, Clone, Default)]
struct PlayerState {
    name: String,
    connected: bool,
    hand: BTreeSet<CardId>,
    played: Vec<CardId>,
    corporation: Option<CardId>,
    pending_tile: Option<PendingTileSelection>,
    tile_queue: VecDeque<TileRequest>,
    pending_card_draw: Option<PendingCardDrawSelection>,
    starting_selection: Option<StartingSelection>,
    production_selection: Option<Vec<CardId>>,
    used_actions: HashSet<(CardId, usize)>,
    effects: Vec<PlayerEffect>,
}

#[derive(Debug)]
pub struct Player {
    id: PlayerId,
    resources: PlayerResources,
    state: RwLock<PlayerState>,
}

impl Player {
    pub fn new(
        game_id: GameId,
        id: PlayerId,
        name: &str,
        terraform_rating: i32,
        bus: Arc<EventBus>,
    ) -> Self {
        Player {
            id,
            resources: PlayerResources::new(game_id, id, terraform_rating, bus),
            state: RwLock::new(PlayerState {
                name: name.to_string(),
                connected: true,
                ..PlayerState::default()
            }),
        }
    }

    pub fn id(&self) -> PlayerId {
        self.id
    }

    pub fn resources(&self) -> &PlayerResources {
        &self.resources
    }

    pub fn name(&self) -> String {
        read(&self.state).name.clone()
    }

    pub fn is_connected(&self) -> bool {
        read(&self.state).connected
    }

    pub fn set_connected(&self, connected: bool) -> bool {
        let mut state = write(&self.state);
        let changed = state.connected != connected;
        state.connected = connected;
        changed
    }

    // ---------- cards ----------

    pub fn hand(&self) -> Vec<CardId> {
        read(&self.state).hand.iter().cloned().collect()
    }

    pub fn has_in_hand(&self, card_id: &str) -> bool {
        read(&self.state).hand.contains(card_id)
    }

    pub fn add_to_hand(&self, card_ids: &[CardId]) {
        write(&self.state).hand.extend(card_ids.iter().cloned());
    }

    /// Takes every card out of the hand, or none if one is missing.
    pub fn remove_from_hand(&self, card_ids: &[CardId]) -> GameResult<()> {
        let mut state = write(&self.state);
        if let Some(missing) = card_ids.iter().find(|c| !state.hand.contains(*c)) {
            return Err(GameError::CardNotInHand(missing.clone()));
        }
        for id in card_ids {
            state.hand.remove(id);
        }
        Ok(())
    }

    pub fn played(&self) -> Vec<CardId> {
        read(&self.state).played.clone()
    }

    pub fn has_played(&self, card_id: &str) -> bool {
        read(&self.state).played.iter().any(|c| c == card_id)
    }

    /// Played cards and the corporation.
    pub fn owns_card(&self, card_id: &str) -> bool {
        let state = read(&self.state);
        state.corporation.as_deref() == Some(card_id) || state.played.iter().any(|c| c == card_id)
    }

    /// Moves a card from hand to tableau.
    pub fn play_card(&self, card_id: &str) -> GameResult<()> {
        let mut state = write(&self.state);
        if !state.hand.remove(card_id) {
            return Err(GameError::CardNotInHand(card_id.to_string()));
        }
        state.played.push(card_id.to_string());
        Ok(())
    }

    pub fn corporation(&self) -> Option<CardId> {
        read(&self.state).corporation.clone()
    }

    pub fn set_corporation(&self, card_id: CardId) {
        write(&self.state).corporation = Some(card_id);
    }

    pub fn effects(&self) -> Vec<PlayerEffect> {
        read(&self.state).effects.clone()
    }

    pub fn add_effects(&self, effects: impl IntoIterator<Item = PlayerEffect>) {
        write(&self.state).effects.extend(effects);
    }

    pub fn action_used(&self, card_id: &str, behavior: usize) -> bool {
        read(&self.state)
            .used_actions
            .contains(&(card_id.to_string(), behavior))
    }

    pub fn mark_action_used(&self, card_id: &str, behavior: usize) {
        write(&self.state)
            .used_actions
            .insert((card_id.to_string(), behavior));
    }

    pub fn reset_used_actions(&self) {
        write(&self.state).used_actions.clear();
    }

    // ---------- pending selections ----------

    pub fn has_pending_selection(&self) -> bool {
        let state = read(&self.state);
        state.pending_tile.is_some() || state.pending_card_draw.is_some()
    }

    pub fn pending_tile(&self) -> Option<PendingTileSelection> {
        read(&self.state).pending_tile.clone()
    }

    pub fn set_pending_tile(&self, selection: PendingTileSelection) {
        write(&self.state).pending_tile = Some(selection);
    }

    /// Consumes the pending tile selection if `coordinates` is one of its hexes.
    pub fn take_pending_tile(&self, coordinates: HexPosition) -> GameResult<PendingTileSelection> {
        let mut state = write(&self.state);
        let pending = state
            .pending_tile
            .as_ref()
            .ok_or(GameError::NoPendingSelection("tile"))?;
        if !pending.available_hexes.contains(&coordinates) {
            return Err(GameError::InvalidSelection(format!(
                "{coordinates} is not available for a {} tile",
                pending.tile_type
            )));
        }
        state
            .pending_tile
            .take()
            .ok_or(GameError::NoPendingSelection("tile"))
    }

    pub fn queue_tiles(&self, requests: impl IntoIterator<Item = TileRequest>) {
        write(&self.state).tile_queue.extend(requests);
    }

    pub fn next_tile_request(&self) -> Option<TileRequest> {
        write(&self.state).tile_queue.pop_front()
    }

    pub fn pending_card_draw(&self) -> Option<PendingCardDrawSelection> {
        read(&self.state).pending_card_draw.clone()
    }

    pub fn set_pending_card_draw(&self, selection: PendingCardDrawSelection) {
        write(&self.state).pending_card_draw = Some(selection);
    }

    pub fn take_pending_card_draw(&self) -> GameResult<PendingCardDrawSelection> {
        write(&self.state)
            .pending_card_draw
            .take()
            .ok_or(GameError::NoPendingSelection("card draw"))
    }

    pub fn starting_selection(&self) -> Option<StartingSelection> {
        read(&self.state).starting_selection.clone()
    }

    pub fn take_starting_selection(&self) -> Option<StartingSelection> {
        write(&self.state).starting_selection.take()
    }

    pub fn set_starting_selection(&self, selection: Option<StartingSelection>) {
        write(&self.state).starting_selection = selection;
    }

    pub fn production_selection(&self) -> Option<Vec<CardId>> {
        read(&self.state).production_selection.clone()
    }

    pub fn take_production_selection(&self) -> Option<Vec<CardId>> {
        write(&self.state).production_selection.take()
    }

    pub fn set_production_selection(&self, cards: Option<Vec<CardId>>) {
        write(&self.state).production_selection = cards;
    }
}
