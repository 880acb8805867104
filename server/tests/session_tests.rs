mod common;

use common::{catalog, session, session_with, settings, started};
use std::sync::Arc;
use terraforming_server::{
    config::Settings,
    events::{EventBus, GameEvent},
    game::{
        board::{Board, Tile, TileBonus, TileKind},
        behavior::ResourceType,
        parameters::{GlobalParameters, ParameterState, MAX_OCEANS},
        projects::StandardProject,
        registry::SessionRegistry,
        session::GameSession,
        types::{GamePhase, GameStatus, HexPosition, Resource, ResourceSet, TileType},
    },
    protocol::{CardPayment, PlayerAction},
    GameError,
};
use uuid::Uuid;

/// Hands are kept in id order.
fn sorted(cards: &[String]) -> Vec<String> {
    let mut cards = cards.to_vec();
    cards.sort();
    cards
}

fn max_out(parameters: &GlobalParameters) {
    parameters.increase_temperature(19);
    parameters.increase_oxygen(14);
    for _ in 0..MAX_OCEANS {
        parameters.place_ocean();
    }
    assert!(parameters.is_maxed());
}

#[test]
fn lobby_seats_and_host() {
    let session = session_with(Settings {
        max_players: 2,
        ..settings()
    });
    let a = session.join("ada").unwrap();
    let b = session.join("bob").unwrap();
    assert_eq!(session.join("cy"), Err(GameError::GameFull(2)));
    assert_eq!(session.host_id(), Some(a));

    assert_eq!(session.start_game(b), Err(GameError::NotHost));
    session.leave(a).unwrap();
    assert_eq!(session.host_id(), Some(b));

    session.start_game(b).unwrap();
    assert_eq!(session.status(), GameStatus::Active);
    assert_eq!(session.join("late"), Err(GameError::GameAlreadyStarted));
    assert_eq!(session.leave(b), Err(GameError::GameAlreadyStarted));
}

#[test]
fn start_needs_enough_corporations() {
    let session = session_with(Settings {
        starting_corporations: 3,
        ..settings()
    });
    let a = session.join("ada").unwrap();
    session.join("bob").unwrap();
    assert_eq!(
        session.start_game(a),
        Err(GameError::InsufficientCards {
            requested: 6,
            available: 4
        })
    );
    assert_eq!(session.status(), GameStatus::Lobby);
}

#[test]
fn starting_selection() {
    let session = session();
    let a = session.join("ada").unwrap();
    let b = session.join("bob").unwrap();
    session.start_game(a).unwrap();
    assert_eq!(session.phase(), GamePhase::StartingCardSelection);

    let ada = session.player(a).unwrap();
    let offer = ada.starting_selection().unwrap();
    assert_eq!(offer.corporations.len(), 2);
    assert_eq!(offer.cards.len(), 4);

    let err = session
        .select_starting_cards(a, Some("not-dealt"), &offer.cards[..1])
        .unwrap_err();
    assert!(matches!(err, GameError::InvalidSelection(_)));
    assert_eq!(ada.starting_selection(), Some(offer.clone()));

    let corporation = offer.corporations[0].as_str();
    session
        .select_starting_cards(a, Some(corporation), &offer.cards[..2])
        .unwrap();
    assert_eq!(ada.resources().get().credits, 34);
    assert_eq!(ada.hand(), sorted(&offer.cards[..2]));
    assert_eq!(ada.corporation().as_deref(), Some(corporation));
    assert_eq!(session.deck().discard_count(), 2);
    assert_eq!(session.deck().removed_cards(), vec![offer.corporations[1].clone()]);
    assert_eq!(
        session.select_starting_cards(a, Some(corporation), &[]),
        Err(GameError::NoPendingSelection("starting"))
    );

    // still waiting on bob
    assert_eq!(session.phase(), GamePhase::StartingCardSelection);
    let bob_offer = session.player(b).unwrap().starting_selection().unwrap();
    session
        .select_starting_cards(b, Some(bob_offer.corporations[1].as_str()), &[])
        .unwrap();
    assert_eq!(session.phase(), GamePhase::Action);
    assert_eq!(session.current_turn(), Some(a));
}

#[test]
fn playing_a_card() {
    let session = session();
    let ids = started(&session, &["ada", "bob"]);
    let (a, b) = (ids[0], ids[1]);
    let ada = session.player(a).unwrap();
    ada.add_to_hand(&["mine".to_string()]);

    assert_eq!(
        session.play_card(b, "mine", CardPayment::credits(5), None, None, None),
        Err(GameError::NotCurrentPlayer { current: Some(a) })
    );
    assert_eq!(
        session.play_card(a, "research", CardPayment::credits(0), None, None, None),
        Err(GameError::CardNotInHand("research".to_string()))
    );
    assert!(matches!(
        session.play_card(a, "mine", CardPayment::credits(4), None, None, None),
        Err(GameError::InvalidSelection(_))
    ));

    ada.resources()
        .add(&ResourceSet::of(Resource::Steel, 2))
        .unwrap();
    let payment = CardPayment {
        credits: 1,
        steel: 2,
        titanium: 0,
    };
    session.play_card(a, "mine", payment, None, None, None).unwrap();

    let balance = ada.resources().get();
    assert_eq!(balance.credits, 39);
    assert_eq!(balance.steel, 0);
    assert_eq!(ada.resources().production().steel, 1);
    assert!(ada.has_played("mine"));
    assert!(!ada.has_in_hand("mine"));
    assert_eq!(session.turns().slot(a).unwrap().available_actions, 1);
}

#[test]
fn city_project_waits_for_a_tile() {
    let session = session();
    let a = started(&session, &["ada"])[0];
    let ada = session.player(a).unwrap();
    ada.add_to_hand(&["mine".to_string()]);

    session
        .standard_project(a, StandardProject::City, &[])
        .unwrap();
    assert_eq!(ada.resources().get().credits, 15);
    assert_eq!(ada.resources().production().credits, 1);
    let pending = ada.pending_tile().expect("pending city");
    assert_eq!(pending.tile_type, TileType::City);

    assert_eq!(
        session.play_card(a, "mine", CardPayment::credits(5), None, None, None),
        Err(GameError::PendingSelection)
    );
    assert_eq!(session.skip_turn(a), Err(GameError::PendingSelection));

    let illegal = session
        .board()
        .tiles()
        .into_iter()
        .find(|t| t.kind == TileKind::OceanReserved)
        .unwrap()
        .coordinates;
    assert!(matches!(
        session.select_tile(a, illegal),
        Err(GameError::InvalidSelection(_))
    ));

    session.select_tile(a, pending.available_hexes[0]).unwrap();
    assert!(ada.pending_tile().is_none());
    assert_eq!(session.board().count_tiles(TileType::City, Some(a)), 1);
    assert_eq!(
        session.select_tile(a, pending.available_hexes[1]),
        Err(GameError::NoPendingSelection("tile"))
    );
}

#[test]
fn land_projects_need_a_free_hex() {
    let id = Uuid::new_v4();
    let bus = Arc::new(EventBus::new());
    let only = HexPosition::new(0, 0);
    let board = Board::with_tiles(id, vec![Tile::land(only)], Arc::clone(&bus));
    board
        .update_tile_occupancy(only, TileType::City, Uuid::new_v4())
        .unwrap();
    let session =
        GameSession::new(id, settings(), Arc::new(catalog()), bus).with_board(board);
    let a = started(&session, &["ada"])[0];
    let ada = session.player(a).unwrap();

    assert_eq!(
        session.standard_project(a, StandardProject::City, &[]),
        Err(GameError::NoPlacementAvailable(TileType::City))
    );
    assert_eq!(
        session.standard_project(a, StandardProject::Greenery, &[]),
        Err(GameError::NoPlacementAvailable(TileType::Greenery))
    );
    assert_eq!(ada.resources().get().credits, 40);

    // no ocean hexes on this board either, but the aquifer still goes through
    session
        .standard_project(a, StandardProject::Aquifer, &[])
        .unwrap();
    assert_eq!(ada.resources().get().credits, 22);
    assert!(ada.pending_tile().is_none());
}

#[test]
fn sell_patents() {
    let session = session();
    let a = started(&session, &["ada"])[0];
    let ada = session.player(a).unwrap();
    let cards = session.deck().draw_project_cards(2).unwrap();
    ada.add_to_hand(&cards);

    assert!(matches!(
        session.standard_project(a, StandardProject::SellPatents, &[]),
        Err(GameError::InvalidSelection(_))
    ));
    assert!(matches!(
        session.standard_project(a, StandardProject::PowerPlant, &cards),
        Err(GameError::InvalidSelection(_))
    ));

    let discarded = session.deck().discard_count();
    session
        .standard_project(a, StandardProject::SellPatents, &cards)
        .unwrap();
    assert_eq!(ada.resources().get().credits, 42);
    assert!(ada.hand().is_empty());
    assert_eq!(session.deck().discard_count(), discarded + 2);
}

#[test]
fn greenery_at_full_oxygen_gives_no_rating() {
    let id = Uuid::new_v4();
    let bus = Arc::new(EventBus::new());
    let parameters = GlobalParameters::with_state(
        id,
        ParameterState {
            oxygen: 14,
            ..ParameterState::default()
        },
        Arc::clone(&bus),
    );
    let session = GameSession::new(id, settings(), Arc::new(catalog()), bus)
        .with_parameters(parameters);
    let a = started(&session, &["ada"])[0];
    let ada = session.player(a).unwrap();
    ada.resources()
        .add(&ResourceSet::of(Resource::Plants, 8))
        .unwrap();

    session.convert_plants_to_greenery(a).unwrap();
    assert_eq!(ada.resources().get().plants, 0);
    let pending = ada.pending_tile().unwrap();
    assert_eq!(pending.tile_type, TileType::Greenery);

    session.select_tile(a, pending.available_hexes[0]).unwrap();
    assert_eq!(session.parameters().oxygen(), 14);
    assert_eq!(ada.resources().terraform_rating(), 20);
}

#[test]
fn placement_bonuses() {
    let id = Uuid::new_v4();
    let bus = Arc::new(EventBus::new());
    let land = HexPosition::new(0, 0);
    let sea = HexPosition::new(1, 0);
    let board = Board::with_tiles(
        id,
        vec![
            Tile {
                bonuses: vec![
                    TileBonus {
                        resource_type: ResourceType::Steel,
                        amount: 2,
                    },
                    TileBonus {
                        resource_type: ResourceType::CardDraw,
                        amount: 1,
                    },
                ],
                ..Tile::land(land)
            },
            Tile {
                kind: TileKind::OceanReserved,
                ..Tile::land(sea)
            },
        ],
        Arc::clone(&bus),
    );
    board
        .update_tile_occupancy(sea, TileType::Ocean, Uuid::new_v4())
        .unwrap();
    let session =
        GameSession::new(id, settings(), Arc::new(catalog()), bus).with_board(board);
    let a = started(&session, &["ada"])[0];
    let ada = session.player(a).unwrap();
    ada.resources()
        .add(&ResourceSet::of(Resource::Plants, 8))
        .unwrap();
    let deck_before = session.deck().project_count();

    session.convert_plants_to_greenery(a).unwrap();
    assert_eq!(ada.pending_tile().unwrap().available_hexes, vec![land]);
    session.select_tile(a, land).unwrap();

    let balance = ada.resources().get();
    assert_eq!(balance.steel, 2);
    assert_eq!(balance.credits, 42);
    assert_eq!(ada.hand().len(), 1);
    assert_eq!(session.deck().project_count(), deck_before - 1);
    assert_eq!(session.parameters().oxygen(), 1);
    assert_eq!(ada.resources().terraform_rating(), 21);
}

#[test]
fn drawn_cards_must_all_be_kept() {
    let session = session();
    let a = started(&session, &["ada"])[0];
    let ada = session.player(a).unwrap();
    ada.add_to_hand(&["research".to_string()]);

    session
        .play_card(a, "research", CardPayment::default(), None, None, None)
        .unwrap();
    let pending = ada.pending_card_draw().unwrap();
    assert!(pending.mandatory);
    assert_eq!(pending.available_cards.len(), 2);
    assert_eq!(ada.resources().victory_points(), 1);

    assert!(matches!(
        session.confirm_card_draw(a, &pending.available_cards[..1], &[]),
        Err(GameError::InvalidSelection(_))
    ));
    assert_eq!(ada.pending_card_draw(), Some(pending.clone()));

    session
        .confirm_card_draw(a, &pending.available_cards, &[])
        .unwrap();
    assert_eq!(ada.hand(), sorted(&pending.available_cards));
    assert!(!ada.has_pending_selection());
}

#[test]
fn peek_take_and_buy() {
    let session = session();
    let a = started(&session, &["ada"])[0];
    let ada = session.player(a).unwrap();
    ada.add_to_hand(&["invention".to_string()]);

    session
        .play_card(a, "invention", CardPayment::default(), None, None, None)
        .unwrap();
    let offer = ada.pending_card_draw().unwrap().available_cards;
    assert_eq!(offer.len(), 3);

    // two free picks are one too many
    assert!(session.confirm_card_draw(a, &offer[..2], &[]).is_err());

    let discarded = session.deck().discard_count();
    session
        .confirm_card_draw(a, &offer[..1], &offer[1..2])
        .unwrap();
    assert_eq!(ada.resources().get().credits, 37);
    assert_eq!(ada.hand(), sorted(&offer[..2]));
    assert_eq!(session.deck().discard_count(), discarded + 1);
    assert!(session.deck().discard_pile().contains(&offer[2]));
}

#[test]
fn card_actions_once_per_generation() {
    let session = session();
    let a = started(&session, &["ada"])[0];
    let ada = session.player(a).unwrap();
    ada.add_to_hand(&["factory".to_string()]);

    assert_eq!(
        session.use_card_action(a, "factory", 0, None, None, None),
        Err(GameError::CardNotPlayed("factory".to_string()))
    );
    session
        .play_card(a, "factory", CardPayment::default(), None, None, None)
        .unwrap();
    // the manual behavior does not fire on play
    assert_eq!(ada.resources().get().credits, 40);

    session
        .use_card_action(a, "factory", 0, None, None, None)
        .unwrap();
    assert_eq!(ada.resources().get().credits, 42);
    assert_eq!(
        session.use_card_action(a, "factory", 0, None, None, None),
        Err(GameError::ActionAlreadyUsed {
            card_id: "factory".to_string(),
            behavior: 0
        })
    );
    assert!(matches!(
        session.use_card_action(a, "factory", 1, None, None, None),
        Err(GameError::InvalidSelection(_))
    ));
}

#[test]
fn generation_cycle() {
    let session = session();
    let ids = started(&session, &["ada", "bob"]);
    let (a, b) = (ids[0], ids[1]);

    session.skip_turn(a).unwrap();
    assert_eq!(session.current_turn(), Some(b));
    assert_eq!(session.turns().slot(b).unwrap().available_actions, -1);

    let outcome = session.skip_turn(b).unwrap();
    assert_eq!(outcome.phase, GamePhase::Production);
    assert_eq!(outcome.generation, 2);

    let ada = session.player(a).unwrap();
    // 40 starting credits plus terraform rating
    assert_eq!(ada.resources().get().credits, 60);
    let offer = ada.production_selection().unwrap();
    assert_eq!(offer.len(), 2);
    assert!(matches!(
        session.skip_turn(a),
        Err(GameError::WrongPhase { .. })
    ));

    session.confirm_production_cards(a, &offer[..1]).unwrap();
    assert_eq!(ada.resources().get().credits, 57);
    assert_eq!(session.phase(), GamePhase::Production);

    let outcome = session.confirm_production_cards(b, &[]).unwrap();
    assert_eq!(outcome.phase, GamePhase::Action);
    assert_eq!(outcome.current_turn, Some(a));
    let slot = session.turns().slot(b).unwrap();
    assert_eq!(slot.available_actions, 2);
    assert!(!slot.passed);
}

#[tokio::test]
async fn game_ends_when_parameters_are_maxed() {
    let session = session();
    let mut events = session.bus().subscribe();
    let a = started(&session, &["ada"])[0];
    max_out(session.parameters());

    let outcome = session.skip_turn(a).unwrap();
    assert_eq!(outcome.status, GameStatus::Completed);
    assert_eq!(outcome.phase, GamePhase::Complete);
    assert_eq!(session.skip_turn(a), Err(GameError::GameNotActive));

    let mut winner = None;
    while let Ok(envelope) = events.try_recv() {
        if let GameEvent::GameEnded {
            winner: w, scores, ..
        } = envelope.event
        {
            assert_eq!(scores.len(), 1);
            winner = w;
        }
    }
    assert_eq!(winner, Some(a));
}

#[test]
fn registry_tears_down_finished_games() {
    let registry = SessionRegistry::new(settings(), Arc::new(catalog()), Arc::new(EventBus::new()));
    let (session, host) = registry.create_game("ada").unwrap();
    let game_id = session.id();
    assert_eq!(registry.len(), 1);

    registry
        .dispatch(game_id, host, PlayerAction::StartGame)
        .unwrap();
    let corporation = session
        .player(host)
        .unwrap()
        .starting_selection()
        .unwrap()
        .corporations[0]
        .clone();
    let outcome = registry
        .dispatch(
            game_id,
            host,
            PlayerAction::SelectStartingCards {
                corporation: Some(corporation),
                cards: Vec::new(),
            },
        )
        .unwrap();
    assert_eq!(outcome.phase, GamePhase::Action);

    max_out(session.parameters());
    let outcome = registry
        .dispatch(game_id, host, PlayerAction::SkipTurn)
        .unwrap();
    assert_eq!(outcome.status, GameStatus::Completed);
    assert!(registry.is_empty());
    assert_eq!(
        registry.dispatch(game_id, host, PlayerAction::SkipTurn),
        Err(GameError::GameNotFound(game_id))
    );
}

#[test]
fn actions_decode_from_json() {
    let action: PlayerAction = serde_json::from_str(
        r#"{ "type": "StandardProject", "project": "sell-patents", "cards": ["filler-03"] }"#,
    )
    .unwrap();
    assert_eq!(
        action,
        PlayerAction::StandardProject {
            project: StandardProject::SellPatents,
            cards: vec!["filler-03".to_string()],
        }
    );
}

#[test]
fn snapshot_copies_everything() {
    let session = session();
    let ids = started(&session, &["ada", "bob"]);
    let snapshot = session.snapshot();

    assert_eq!(snapshot.status, GameStatus::Active);
    assert_eq!(snapshot.phase, GamePhase::Action);
    assert_eq!(snapshot.current_turn, Some(ids[0]));
    assert_eq!(snapshot.tiles.len(), 61);
    assert_eq!(snapshot.players.len(), 2);
    assert_eq!(snapshot.players[0].resources.credits, 40);
    assert_eq!(snapshot.players[0].available_actions, 2);

    session
        .player(ids[0])
        .unwrap()
        .resources()
        .add(&ResourceSet::credits(5))
        .unwrap();
    assert_eq!(snapshot.players[0].resources.credits, 40);

    let json = serde_json::to_value(&snapshot).unwrap();
    assert_eq!(json["players"].as_array().map(Vec::len), Some(2));
}
