mod common;

use common::card_ids;
use std::{collections::HashSet, sync::Arc};
use terraforming_server::{
    events::EventBus,
    game::deck::Deck,
    GameError,
};
use uuid::Uuid;

fn deck(project: usize, seed: u64) -> Deck {
    Deck::new(
        Uuid::new_v4(),
        card_ids("p", project),
        card_ids("c", 3),
        card_ids("pre", 2),
        seed,
        Arc::new(EventBus::new()),
    )
}

#[test]
fn overdraw_fails_and_leaves_the_pile_alone() {
    let deck = deck(2, 1);
    let before = deck.project_cards();

    assert_eq!(
        deck.draw_project_cards(3),
        Err(GameError::InsufficientCards {
            requested: 3,
            available: 2,
        })
    );
    assert_eq!(deck.project_cards(), before);
    assert_eq!(deck.counts().drawn, 0);

    assert_eq!(
        deck.draw_corporations(4),
        Err(GameError::InsufficientCards {
            requested: 4,
            available: 3,
        })
    );
}

#[test]
fn same_seed_same_order() {
    assert_eq!(deck(20, 42).project_cards(), deck(20, 42).project_cards());
    assert_ne!(deck(20, 42).project_cards(), deck(20, 43).project_cards());
}

#[test]
fn cards_are_conserved() {
    let deck = deck(10, 3);
    let mut hand = deck.draw_project_cards(6).unwrap();
    deck.discard(hand.drain(..3).collect()).unwrap();
    deck.remove(hand.drain(..1).collect()).unwrap();

    let counts = deck.counts();
    assert_eq!(counts.project + counts.discard + counts.removed + hand.len(), 10);

    deck.reshuffle();
    let counts = deck.counts();
    assert_eq!(counts.discard, 0);
    assert_eq!(counts.project, 7);
    assert_eq!(counts.shuffles, 1);

    let mut all: Vec<String> = deck.project_cards();
    all.extend(deck.removed_cards());
    all.extend(hand);
    let unique: HashSet<&String> = all.iter().collect();
    assert_eq!(unique.len(), 10);
}

#[test]
fn reshuffle_puts_discards_at_the_bottom() {
    let deck = deck(6, 9);
    let drawn = deck.draw_project_cards(2).unwrap();
    let remaining = deck.project_cards();
    deck.discard(drawn.clone()).unwrap();
    deck.reshuffle();

    let pile = deck.project_cards();
    assert_eq!(&pile[..4], &remaining[..]);
    let bottom: HashSet<&String> = pile[4..].iter().collect();
    assert_eq!(bottom, drawn.iter().collect::<HashSet<&String>>());
}

#[test]
fn a_card_is_never_tracked_twice() {
    let deck = deck(4, 5);
    let drawn = deck.draw_project_cards(1).unwrap();
    deck.discard(drawn.clone()).unwrap();
    assert_eq!(
        deck.discard(drawn.clone()),
        Err(GameError::CardAlreadyInDeck(drawn[0].clone()))
    );

    let still_in_pile = deck.project_cards()[0].clone();
    assert!(deck.remove(vec![still_in_pile]).is_err());
    assert_eq!(deck.counts().removed, 0);
}

#[test]
fn preludes_draw_from_their_own_pile() {
    let deck = deck(5, 3);
    let preludes = deck.draw_preludes(2).unwrap();
    assert_eq!(
        preludes.iter().collect::<HashSet<&String>>(),
        card_ids("pre", 2).iter().collect::<HashSet<&String>>()
    );
    assert_eq!(deck.counts().preludes, 0);
    assert_eq!(deck.project_count(), 5);
    assert!(deck.draw_preludes(1).is_err());
}
