//! One aggregate per live match.
//!
//! Each component guards its own state; the session sequences them. Every
//! turn-bound entry point validates status, phase, current player and
//! pending selections before anything is mutated.

mod actions;
mod lobby;
mod placement;
mod production;
mod triggers;

use crate::{
    config::Settings,
    error::{GameError, GameResult},
    events::{EventBus, GameEvent},
    game::{
        board::Board,
        cards::{CardCatalog, CardType},
        deck::Deck,
        effects::EffectEngine,
        parameters::GlobalParameters,
        player::Player,
        read,
        turn::TurnOrder,
        types::{GameId, GamePhase, GameStatus, PlayerId},
        write,
    },
    protocol::{ActionOutcome, PlayerAction},
};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, RwLock};

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub struct GameState {
    pub status: GameStatus,
    pub phase: GamePhase,
    pub generation: u32,
    pub host_id: Option<PlayerId>,
}

#[derive(Debug)]
pub struct GameSession {
    id: GameId,
    settings: Settings,
    bus: Arc<EventBus>,
    catalog: Arc<CardCatalog>,
    state: RwLock<GameState>,
    players: RwLock<Vec<Arc<Player>>>,
    parameters: GlobalParameters,
    board: Board,
    deck: Deck,
    turns: TurnOrder,
}

impl GameSession {
    pub fn new(id: GameId, settings: Settings, catalog: Arc<CardCatalog>, bus: Arc<EventBus>) -> Self {
        let seed = settings.deck_seed.unwrap_or_else(rand::random);
        let deck = Deck::new(
            id,
            catalog.ids_where(|c| c.card_type.is_project()),
            catalog.ids_where(|c| c.card_type == CardType::Corporation),
            catalog.ids_where(|c| c.card_type == CardType::Prelude),
            seed,
            Arc::clone(&bus),
        );

        GameSession {
            id,
            parameters: GlobalParameters::new(id, Arc::clone(&bus)),
            board: Board::new(id, Arc::clone(&bus)),
            turns: TurnOrder::new(id, Arc::clone(&bus)),
            deck,
            state: RwLock::new(GameState {
                status: GameStatus::Lobby,
                phase: GamePhase::Waiting,
                generation: 1,
                host_id: None,
            }),
            players: RwLock::new(Vec::new()),
            settings,
            catalog,
            bus,
        }
    }

    /// Swaps in a custom board layout. Only meaningful before play starts.
    pub fn with_board(mut self, board: Board) -> Self {
        self.board = board;
        self
    }

    pub fn with_parameters(mut self, parameters: GlobalParameters) -> Self {
        self.parameters = parameters;
        self
    }

    pub fn id(&self) -> GameId {
        self.id
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn bus(&self) -> &Arc<EventBus> {
        &self.bus
    }

    pub fn state(&self) -> GameState {
        *read(&self.state)
    }

    pub fn status(&self) -> GameStatus {
        read(&self.state).status
    }

    pub fn phase(&self) -> GamePhase {
        read(&self.state).phase
    }

    pub fn generation(&self) -> u32 {
        read(&self.state).generation
    }

    pub fn host_id(&self) -> Option<PlayerId> {
        read(&self.state).host_id
    }

    pub fn current_turn(&self) -> Option<PlayerId> {
        self.turns.current()
    }

    pub fn players(&self) -> Vec<Arc<Player>> {
        read(&self.players).clone()
    }

    pub fn player(&self, player_id: PlayerId) -> GameResult<Arc<Player>> {
        read(&self.players)
            .iter()
            .find(|p| p.id() == player_id)
            .cloned()
            .ok_or(GameError::PlayerNotFound(player_id))
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn deck(&self) -> &Deck {
        &self.deck
    }

    pub fn parameters(&self) -> &GlobalParameters {
        &self.parameters
    }

    pub fn turns(&self) -> &TurnOrder {
        &self.turns
    }

    pub fn catalog(&self) -> &CardCatalog {
        &self.catalog
    }

    /// Routes one inbound action to the matching operation.
    pub fn handle(&self, player_id: PlayerId, action: PlayerAction) -> GameResult<ActionOutcome> {
        match action {
            PlayerAction::StartGame => self.start_game(player_id).map(|_| self.outcome()),
            PlayerAction::Leave => self.leave(player_id).map(|_| self.outcome()),
            PlayerAction::SetConnected { connected } => self
                .set_connected(player_id, connected)
                .map(|_| self.outcome()),
            PlayerAction::SelectStartingCards { corporation, cards } => self
                .select_starting_cards(player_id, corporation.as_deref(), &cards)
                .map(|_| self.outcome()),
            PlayerAction::PlayCard {
                card_id,
                payment,
                choice,
                target_player,
                target_card,
            } => self.play_card(
                player_id,
                &card_id,
                payment,
                choice,
                target_player,
                target_card.as_deref(),
            ),
            PlayerAction::UseCardAction {
                card_id,
                behavior_index,
                choice,
                target_player,
                target_card,
            } => self.use_card_action(
                player_id,
                &card_id,
                behavior_index,
                choice,
                target_player,
                target_card.as_deref(),
            ),
            PlayerAction::StandardProject { project, cards } => {
                self.standard_project(player_id, project, &cards)
            }
            PlayerAction::ConvertHeatToTemperature => self.convert_heat_to_temperature(player_id),
            PlayerAction::ConvertPlantsToGreenery => self.convert_plants_to_greenery(player_id),
            PlayerAction::SkipTurn => self.skip_turn(player_id),
            PlayerAction::SelectTile { coordinates } => self.select_tile(player_id, coordinates),
            PlayerAction::ConfirmCardDraw { take, buy } => {
                self.confirm_card_draw(player_id, &take, &buy)
            }
            PlayerAction::ConfirmProductionCards { cards } => {
                self.confirm_production_cards(player_id, &cards)
            }
        }
    }

    // ---------- shared guards ----------

    fn ensure_active(&self) -> GameResult<()> {
        if self.status() != GameStatus::Active {
            return Err(GameError::GameNotActive);
        }
        Ok(())
    }

    fn ensure_phase(&self, expected: GamePhase) -> GameResult<()> {
        let actual = self.phase();
        if actual != expected {
            return Err(GameError::WrongPhase { expected, actual });
        }
        Ok(())
    }

    /// Entry check for everything that costs an action.
    fn begin_action(&self, player_id: PlayerId) -> GameResult<Arc<Player>> {
        self.ensure_active()?;
        self.ensure_phase(GamePhase::Action)?;
        self.turns.validate_current_player(player_id)?;
        let player = self.player(player_id)?;
        if player.has_pending_selection() {
            return Err(GameError::PendingSelection);
        }
        self.turns.ensure_actions_left(player_id)?;
        Ok(player)
    }

    /// Spends the action and, once nothing is pending, checks whether the
    /// generation is over.
    fn finish_action(&self, player: &Player) -> GameResult<ActionOutcome> {
        let remaining = self.turns.consume_action(player.id())?;
        log::debug!(
            "Session {}: player {} has {} action(s) left",
            self.id,
            player.id(),
            remaining
        );
        self.maybe_end_generation()?;
        Ok(self.outcome())
    }

    fn engine<'a>(&'a self, players: &'a [Arc<Player>]) -> EffectEngine<'a> {
        EffectEngine {
            game_id: self.id,
            players,
            board: &self.board,
            deck: &self.deck,
            parameters: &self.parameters,
            catalog: &self.catalog,
            card_buy_cost: self.settings.card_buy_cost,
        }
    }

    fn outcome(&self) -> ActionOutcome {
        let state = self.state();
        ActionOutcome {
            status: state.status,
            phase: state.phase,
            generation: state.generation,
            current_turn: self.turns.current(),
        }
    }

    fn set_phase(&self, phase: GamePhase) {
        let generation = {
            let mut state = write(&self.state);
            state.phase = phase;
            state.generation
        };
        log::info!("Session {}: phase {:?} (generation {})", self.id, phase, generation);
        self.bus.publish(GameEvent::PhaseChanged {
            game_id: self.id,
            phase,
            generation,
        });
    }
}
