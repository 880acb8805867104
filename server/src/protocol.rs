//! Inbound actions accepted by a session, and what it answers with.
//! State changes themselves travel as [`crate::events::GameEvent`]s.

pub use crate::game::cards::CardPayment;
use crate::game::{
    projects::StandardProject,
    types::{CardId, GamePhase, GameStatus, HexPosition, PlayerId},
};
use serde::{Deserialize, Serialize};

// ---------- client → server ----------
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum PlayerAction {
    StartGame,
    Leave,
    /// Emitted by the transport layer when a socket opens or closes.
    SetConnected {
        connected: bool,
    },
    SelectStartingCards {
        #[serde(default)]
        corporation: Option<CardId>,
        #[serde(default)]
        cards: Vec<CardId>,
    },
    PlayCard {
        card_id: CardId,
        #[serde(default)]
        payment: CardPayment,
        #[serde(default)]
        choice: Option<usize>,
        #[serde(default)]
        target_player: Option<PlayerId>,
        #[serde(default)]
        target_card: Option<CardId>,
    },
    UseCardAction {
        card_id: CardId,
        behavior_index: usize,
        #[serde(default)]
        choice: Option<usize>,
        #[serde(default)]
        target_player: Option<PlayerId>,
        #[serde(default)]
        target_card: Option<CardId>,
    },
    StandardProject {
        project: StandardProject,
        /// Cards sold by `sell-patents`.
        #[serde(default)]
        cards: Vec<CardId>,
    },
    ConvertHeatToTemperature,
    ConvertPlantsToGreenery,
    SkipTurn,
    SelectTile {
        coordinates: HexPosition,
    },
    ConfirmCardDraw {
        #[serde(default)]
        take: Vec<CardId>,
        #[serde(default)]
        buy: Vec<CardId>,
    },
    ConfirmProductionCards {
        #[serde(default)]
        cards: Vec<CardId>,
    },
}

// ---------- server → client ----------
/// Where the match stands after an action went through.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub struct ActionOutcome {
    pub status: GameStatus,
    pub phase: GamePhase,
    pub generation: u32,
    pub current_turn: Option<PlayerId>,
}
