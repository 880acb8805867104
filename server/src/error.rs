//! Errors returned by every session operation.
//!
//! A failed operation never leaves partial state behind, so callers can
//! surface the error to the player and carry on.

use crate::game::{
    cards::RequirementType,
    types::{CardId, GameId, GamePhase, HexPosition, PlayerId, Resource, TileType},
};
use thiserror::Error;

pub type GameResult<T> = Result<T, GameError>;

/// Coarse classification used by callers that map errors onto responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    InvalidPrecondition,
    InsufficientResource,
    InvalidAuthoring,
    CapacityExceeded,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GameError {
    #[error("game {0} not found")]
    GameNotFound(GameId),
    #[error("player {0} not found")]
    PlayerNotFound(PlayerId),
    #[error("no tile at {0}")]
    TileNotFound(HexPosition),
    #[error("card {0} not found")]
    CardNotFound(CardId),
    #[error("card {0} is not in the player's hand")]
    CardNotInHand(CardId),
    #[error("card {0} has not been played")]
    CardNotPlayed(CardId),

    #[error("game is not active")]
    GameNotActive,
    #[error("game has already started")]
    GameAlreadyStarted,
    #[error("wrong phase: expected {expected:?}, currently {actual:?}")]
    WrongPhase { expected: GamePhase, actual: GamePhase },
    #[error("not this player's turn (current: {current:?})")]
    NotCurrentPlayer { current: Option<PlayerId> },
    #[error("a pending selection must be resolved first")]
    PendingSelection,
    #[error("no pending {0} selection")]
    NoPendingSelection(&'static str),
    #[error("no actions remaining this generation")]
    NoActionsRemaining,
    #[error("card action {card_id}#{behavior} already used this generation")]
    ActionAlreadyUsed { card_id: CardId, behavior: usize },
    #[error("only the host can do that")]
    NotHost,
    #[error("game has no players")]
    NoPlayers,
    #[error("no eligible player to take the next turn")]
    NoEligiblePlayer,
    #[error("card {0} is already tracked by the deck")]
    CardAlreadyInDeck(CardId),
    #[error("{card_id} requirement {requirement:?} not met (at {value})")]
    RequirementNotMet {
        card_id: CardId,
        requirement: RequirementType,
        value: i32,
    },
    #[error("invalid selection: {0}")]
    InvalidSelection(String),

    #[error("insufficient {resource}: need {needed}, have {available}")]
    InsufficientResources {
        resource: Resource,
        needed: i32,
        available: i32,
    },
    #[error("insufficient storage on {card_id}: need {needed}, have {available}")]
    InsufficientStorage {
        card_id: CardId,
        needed: i32,
        available: i32,
    },

    #[error("invalid choice {index:?} for {available} choices")]
    InvalidChoice {
        index: Option<usize>,
        available: usize,
    },
    #[error("invalid behavior: {0}")]
    InvalidAuthoring(String),

    #[error("not enough cards: requested {requested}, {available} available")]
    InsufficientCards { requested: usize, available: usize },
    #[error("game is full ({0} players)")]
    GameFull(usize),
    #[error("no legal hex for a {0} tile")]
    NoPlacementAvailable(TileType),
}

impl GameError {
    pub fn kind(&self) -> ErrorKind {
        use GameError::*;
        match self {
            GameNotFound(_) | PlayerNotFound(_) | TileNotFound(_) | CardNotFound(_)
            | CardNotInHand(_) | CardNotPlayed(_) => ErrorKind::NotFound,
            InsufficientResources { .. } | InsufficientStorage { .. } => {
                ErrorKind::InsufficientResource
            }
            InvalidChoice { .. } | InvalidAuthoring(_) => ErrorKind::InvalidAuthoring,
            InsufficientCards { .. } | GameFull(_) | NoPlacementAvailable(_) => {
                ErrorKind::CapacityExceeded
            }
            _ => ErrorKind::InvalidPrecondition,
        }
    }
}
