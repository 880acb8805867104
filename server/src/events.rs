//! Typed publish/subscribe for everything that happens inside a match.
//!
//! Components publish after their write lock is released. Delivery is
//! fire-and-forget: a subscriber whose receiver was dropped is pruned on the
//! next publish.

use crate::game::{
    projects::StandardProject,
    read,
    scoring::FinalScore,
    types::{CardId, GameId, GamePhase, HexPosition, PlayerId, Resource, TileType},
    write,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::{collections::BTreeMap, sync::RwLock};
use tokio::sync::mpsc;

pub type ResourceChanges = BTreeMap<Resource, i32>;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum GameEvent {
    // ---------- lobby ----------
    PlayerJoined {
        game_id: GameId,
        player_id: PlayerId,
        name: String,
    },
    PlayerLeft {
        game_id: GameId,
        player_id: PlayerId,
    },
    PlayerConnectionChanged {
        game_id: GameId,
        player_id: PlayerId,
        connected: bool,
    },
    GameStarted {
        game_id: GameId,
        player_ids: Vec<PlayerId>,
    },
    PhaseChanged {
        game_id: GameId,
        phase: GamePhase,
        generation: u32,
    },

    // ---------- ledger ----------
    ResourcesChanged {
        game_id: GameId,
        player_id: PlayerId,
        changes: ResourceChanges,
    },
    ProductionChanged {
        game_id: GameId,
        player_id: PlayerId,
        changes: ResourceChanges,
    },
    TerraformRatingChanged {
        game_id: GameId,
        player_id: PlayerId,
        old_rating: i32,
        new_rating: i32,
    },
    VictoryPointsChanged {
        game_id: GameId,
        player_id: PlayerId,
        old_points: i32,
        new_points: i32,
    },
    CardStorageChanged {
        game_id: GameId,
        player_id: PlayerId,
        card_id: CardId,
        old_amount: i32,
        new_amount: i32,
    },

    // ---------- planet ----------
    TemperatureChanged {
        game_id: GameId,
        old_value: i32,
        new_value: i32,
    },
    OxygenChanged {
        game_id: GameId,
        old_value: i32,
        new_value: i32,
    },
    OceansChanged {
        game_id: GameId,
        old_value: i32,
        new_value: i32,
    },
    TilePlaced {
        game_id: GameId,
        player_id: PlayerId,
        tile_type: TileType,
        coordinates: HexPosition,
    },
    PlacementBonusGained {
        game_id: GameId,
        player_id: PlayerId,
        coordinates: HexPosition,
        resources: ResourceChanges,
        cards_drawn: usize,
    },

    // ---------- cards ----------
    CardPlayed {
        game_id: GameId,
        player_id: PlayerId,
        card_id: CardId,
    },
    CardActionUsed {
        game_id: GameId,
        player_id: PlayerId,
        card_id: CardId,
        behavior: usize,
    },
    CardEffectTriggered {
        game_id: GameId,
        player_id: PlayerId,
        card_id: CardId,
        behavior: usize,
    },
    StandardProjectUsed {
        game_id: GameId,
        player_id: PlayerId,
        project: StandardProject,
    },
    CardsAddedToHand {
        game_id: GameId,
        player_id: PlayerId,
        card_ids: Vec<CardId>,
    },
    CardsDiscarded {
        game_id: GameId,
        card_ids: Vec<CardId>,
    },
    DeckReshuffled {
        game_id: GameId,
        shuffle_count: u32,
    },

    // ---------- pending selections ----------
    TileSelectionRequired {
        game_id: GameId,
        player_id: PlayerId,
        tile_type: TileType,
        available_hexes: Vec<HexPosition>,
    },
    CardDrawSelectionRequired {
        game_id: GameId,
        player_id: PlayerId,
        card_ids: Vec<CardId>,
        free_take: usize,
        max_buy: usize,
    },

    // ---------- turns ----------
    TurnChanged {
        game_id: GameId,
        player_id: Option<PlayerId>,
    },
    PlayerPassed {
        game_id: GameId,
        player_id: PlayerId,
    },
    UnlimitedActionsGranted {
        game_id: GameId,
        player_id: PlayerId,
    },
    GenerationEnded {
        game_id: GameId,
        generation: u32,
    },
    GameEnded {
        game_id: GameId,
        winner: Option<PlayerId>,
        scores: Vec<FinalScore>,
    },
}

impl GameEvent {
    pub fn game_id(&self) -> GameId {
        use GameEvent::*;
        match self {
            PlayerJoined { game_id, .. }
            | PlayerLeft { game_id, .. }
            | PlayerConnectionChanged { game_id, .. }
            | GameStarted { game_id, .. }
            | PhaseChanged { game_id, .. }
            | ResourcesChanged { game_id, .. }
            | ProductionChanged { game_id, .. }
            | TerraformRatingChanged { game_id, .. }
            | VictoryPointsChanged { game_id, .. }
            | CardStorageChanged { game_id, .. }
            | TemperatureChanged { game_id, .. }
            | OxygenChanged { game_id, .. }
            | OceansChanged { game_id, .. }
            | TilePlaced { game_id, .. }
            | PlacementBonusGained { game_id, .. }
            | CardPlayed { game_id, .. }
            | CardActionUsed { game_id, .. }
            | CardEffectTriggered { game_id, .. }
            | StandardProjectUsed { game_id, .. }
            | CardsAddedToHand { game_id, .. }
            | CardsDiscarded { game_id, .. }
            | DeckReshuffled { game_id, .. }
            | TileSelectionRequired { game_id, .. }
            | CardDrawSelectionRequired { game_id, .. }
            | TurnChanged { game_id, .. }
            | PlayerPassed { game_id, .. }
            | UnlimitedActionsGranted { game_id, .. }
            | GenerationEnded { game_id, .. }
            | GameEnded { game_id, .. } => *game_id,
        }
    }
}

/// What subscribers actually receive.
#[derive(Debug, Clone, Serialize)]
pub struct EventEnvelope {
    pub ts: DateTime<Utc>,
    #[serde(flatten)]
    pub event: GameEvent,
}

#[derive(Debug, Default)]
pub struct EventBus {
    subscribers: RwLock<Vec<mpsc::UnboundedSender<EventEnvelope>>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self) -> mpsc::UnboundedReceiver<EventEnvelope> {
        let (tx, rx) = mpsc::unbounded_channel();
        write(&self.subscribers).push(tx);
        rx
    }

    pub fn publish(&self, event: GameEvent) {
        let envelope = EventEnvelope {
            ts: Utc::now(),
            event,
        };

        let mut closed = false;
        for tx in read(&self.subscribers).iter() {
            if tx.send(envelope.clone()).is_err() {
                closed = true;
            }
        }

        if closed {
            write(&self.subscribers).retain(|tx| !tx.is_closed());
        }
    }

    pub fn publish_all(&self, events: impl IntoIterator<Item = GameEvent>) {
        for event in events {
            self.publish(event);
        }
    }

    pub fn subscriber_count(&self) -> usize {
        read(&self.subscribers).len()
    }
}
