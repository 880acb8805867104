//! Live matches by id.

use crate::{
    config::Settings,
    error::{GameError, GameResult},
    events::EventBus,
    game::{
        cards::CardCatalog,
        session::GameSession,
        types::{GameId, GameStatus, PlayerId},
    },
    protocol::{ActionOutcome, PlayerAction},
};
use dashmap::DashMap;
use std::sync::Arc;
use uuid::Uuid;

#[derive(Debug)]
pub struct SessionRegistry {
    sessions: DashMap<GameId, Arc<GameSession>>,
    settings: Settings,
    catalog: Arc<CardCatalog>,
    bus: Arc<EventBus>,
}

impl SessionRegistry {
    pub fn new(settings: Settings, catalog: Arc<CardCatalog>, bus: Arc<EventBus>) -> Self {
        SessionRegistry {
            sessions: DashMap::new(),
            settings,
            catalog,
            bus,
        }
    }

    pub fn bus(&self) -> &Arc<EventBus> {
        &self.bus
    }

    /// Opens a lobby seated with its host.
    pub fn create_game(&self, host_name: &str) -> GameResult<(Arc<GameSession>, PlayerId)> {
        let game_id = Uuid::new_v4();
        let session = Arc::new(GameSession::new(
            game_id,
            self.settings.clone(),
            Arc::clone(&self.catalog),
            Arc::clone(&self.bus),
        ));
        let host_id = session.join(host_name)?;
        self.sessions.insert(game_id, Arc::clone(&session));
        log::info!("Session {game_id} created by {host_id}");
        Ok((session, host_id))
    }

    pub fn get(&self, game_id: GameId) -> GameResult<Arc<GameSession>> {
        self.sessions
            .get(&game_id)
            .map(|e| Arc::clone(e.value()))
            .ok_or(GameError::GameNotFound(game_id))
    }

    pub fn join(&self, game_id: GameId, name: &str) -> GameResult<PlayerId> {
        self.get(game_id)?.join(name)
    }

    /// Applies one player action; a match that finished is dropped afterwards.
    pub fn dispatch(
        &self,
        game_id: GameId,
        player_id: PlayerId,
        action: PlayerAction,
    ) -> GameResult<ActionOutcome> {
        let session = self.get(game_id)?;
        let outcome = session.handle(player_id, action)?;
        if outcome.status == GameStatus::Completed {
            self.remove(game_id);
        }
        Ok(outcome)
    }

    pub fn remove(&self, game_id: GameId) -> bool {
        let removed = self.sessions.remove(&game_id).is_some();
        if removed {
            log::info!("Session {game_id} torn down");
        }
        removed
    }

    pub fn game_ids(&self) -> Vec<GameId> {
        self.sessions.iter().map(|e| *e.key()).collect()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
