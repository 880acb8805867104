//! Serializable read model of a whole match.

use crate::game::{
    board::Tile,
    deck::DeckCounts,
    parameters::ParameterState,
    player::{PendingCardDrawSelection, PendingTileSelection, PlayerEffect},
    session::GameSession,
    types::{CardId, GameId, GamePhase, GameStatus, PlayerId, ResourceSet},
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct PlayerSnapshot {
    pub id: PlayerId,
    pub name: String,
    pub connected: bool,
    pub corporation: Option<CardId>,
    pub hand_size: usize,
    pub played: Vec<CardId>,
    pub effects: Vec<PlayerEffect>,
    pub resources: ResourceSet,
    pub production: ResourceSet,
    pub terraform_rating: i32,
    pub victory_points: i32,
    pub storage: BTreeMap<CardId, i32>,
    pub available_actions: i32,
    pub passed: bool,
    pub pending_tile: Option<PendingTileSelection>,
    pub pending_card_draw: Option<PendingCardDrawSelection>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct GameSnapshot {
    pub game_id: GameId,
    pub status: GameStatus,
    pub phase: GamePhase,
    pub generation: u32,
    pub host_id: Option<PlayerId>,
    pub current_turn: Option<PlayerId>,
    pub parameters: ParameterState,
    pub players: Vec<PlayerSnapshot>,
    pub tiles: Vec<Tile>,
    pub deck: DeckCounts,
}

impl GameSession {
    /// Copies every component; nothing in the result aliases live state.
    pub fn snapshot(&self) -> GameSnapshot {
        let state = self.state();
        let players = self
            .players()
            .iter()
            .map(|p| {
                let ledger = p.resources();
                let slot = self.turns().slot(p.id()).unwrap_or_default();
                PlayerSnapshot {
                    id: p.id(),
                    name: p.name(),
                    connected: p.is_connected(),
                    corporation: p.corporation(),
                    hand_size: p.hand().len(),
                    played: p.played(),
                    effects: p.effects(),
                    resources: ledger.get(),
                    production: ledger.production(),
                    terraform_rating: ledger.terraform_rating(),
                    victory_points: ledger.victory_points(),
                    storage: ledger.storage_map(),
                    available_actions: slot.available_actions,
                    passed: slot.passed,
                    pending_tile: p.pending_tile(),
                    pending_card_draw: p.pending_card_draw(),
                }
            })
            .collect();

        GameSnapshot {
            game_id: self.id(),
            status: state.status,
            phase: state.phase,
            generation: state.generation,
            host_id: state.host_id,
            current_turn: self.current_turn(),
            parameters: self.parameters().get(),
            players,
            tiles: self.board().tiles(),
            deck: self.deck().counts(),
        }
    }
}
