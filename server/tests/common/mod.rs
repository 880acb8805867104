#![allow(dead_code)]

use std::sync::Arc;
use terraforming_server::{
    config::Settings,
    events::EventBus,
    game::{
        behavior::{Behavior, CardTag, ResourceCondition, ResourceType},
        board::Board,
        cards::{CardCatalog, CardDef, CardType},
        deck::Deck,
        effects::EffectEngine,
        parameters::{GlobalParameters, ParameterState},
        player::Player,
        session::GameSession,
        types::{CardId, PlayerId},
    },
};
use uuid::Uuid;

pub fn rc(resource_type: ResourceType, amount: i32) -> ResourceCondition {
    ResourceCondition::new(resource_type, amount)
}

pub fn card_ids(prefix: &str, n: usize) -> Vec<CardId> {
    (0..n).map(|i| format!("{prefix}{i:02}")).collect()
}

/// Free filler projects plus a few cards with real behaviors and four
/// corporations granting 40 credits.
pub fn catalog() -> CardCatalog {
    let catalog = CardCatalog::new();
    for id in card_ids("filler-", 30) {
        catalog.insert(CardDef::new(&id, CardType::Automated, 0));
    }
    for id in card_ids("corp-", 4) {
        catalog.insert(
            CardDef::new(&id, CardType::Corporation, 0)
                .behavior(Behavior::auto().output(rc(ResourceType::Credits, 40))),
        );
    }
    catalog.insert(
        CardDef::new("mine", CardType::Automated, 5)
            .tag(CardTag::Building)
            .behavior(Behavior::auto().output(rc(ResourceType::SteelProduction, 1))),
    );
    catalog.insert(
        CardDef::new("research", CardType::Automated, 0)
            .tag(CardTag::Science)
            .behavior(Behavior::auto().output(rc(ResourceType::CardDraw, 2)))
            .victory_points(1),
    );
    catalog.insert(
        CardDef::new("invention", CardType::Event, 0).behavior(
            Behavior::auto()
                .output(rc(ResourceType::CardPeek, 3))
                .output(rc(ResourceType::CardTake, 1))
                .output(rc(ResourceType::CardBuy, 1)),
        ),
    );
    catalog.insert(
        CardDef::new("factory", CardType::Active, 0)
            .behavior(Behavior::manual().output(rc(ResourceType::Credits, 2))),
    );
    catalog
}

pub fn settings() -> Settings {
    Settings {
        starting_corporations: 2,
        starting_hand: 4,
        production_draw: 2,
        deck_seed: Some(7),
        ..Settings::default()
    }
}

pub fn session() -> GameSession {
    session_with(settings())
}

pub fn session_with(settings: Settings) -> GameSession {
    GameSession::new(
        Uuid::new_v4(),
        settings,
        Arc::new(catalog()),
        Arc::new(EventBus::new()),
    )
}

/// Every seat takes its first corporation and keeps no cards.
pub fn pick_first_corporations(session: &GameSession) {
    for player in session.players() {
        let selection = player.starting_selection().expect("starting selection");
        session
            .select_starting_cards(player.id(), selection.corporations.first().map(|c| c.as_str()), &[])
            .expect("select starting cards");
    }
}

/// Seats `names`, starts play and resolves the starting selections.
pub fn started(session: &GameSession, names: &[&str]) -> Vec<PlayerId> {
    let ids: Vec<PlayerId> = names
        .iter()
        .map(|n| session.join(n).expect("join"))
        .collect();
    session.start_game(ids[0]).expect("start");
    pick_first_corporations(session);
    ids
}

/// Loose components for driving the engine directly.
pub struct World {
    pub game_id: Uuid,
    pub bus: Arc<EventBus>,
    pub board: Board,
    pub deck: Deck,
    pub parameters: GlobalParameters,
    pub catalog: CardCatalog,
    pub players: Vec<Arc<Player>>,
}

impl World {
    pub fn new(players: usize, deck_cards: usize) -> Self {
        Self::with_parameters(players, deck_cards, ParameterState::default())
    }

    pub fn with_parameters(players: usize, deck_cards: usize, parameters: ParameterState) -> Self {
        let game_id = Uuid::new_v4();
        let bus = Arc::new(EventBus::new());
        World {
            game_id,
            board: Board::new(game_id, Arc::clone(&bus)),
            deck: Deck::new(
                game_id,
                card_ids("p", deck_cards),
                Vec::new(),
                Vec::new(),
                1,
                Arc::clone(&bus),
            ),
            parameters: GlobalParameters::with_state(game_id, parameters, Arc::clone(&bus)),
            catalog: CardCatalog::new(),
            players: (0..players)
                .map(|i| {
                    Arc::new(Player::new(
                        game_id,
                        Uuid::new_v4(),
                        &format!("player-{i}"),
                        20,
                        Arc::clone(&bus),
                    ))
                })
                .collect(),
            bus,
        }
    }

    pub fn engine(&self) -> EffectEngine<'_> {
        EffectEngine {
            game_id: self.game_id,
            players: &self.players,
            board: &self.board,
            deck: &self.deck,
            parameters: &self.parameters,
            catalog: &self.catalog,
            card_buy_cost: 3,
        }
    }

    pub fn player(&self, i: usize) -> &Player {
        &self.players[i]
    }
}
