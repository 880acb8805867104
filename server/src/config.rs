//! Runtime configuration for the terraforming match server.

use once_cell::sync::Lazy;
use std::env;

#[derive(Debug, Clone)]
pub struct Settings {
    /// Seats per match.
    pub max_players: usize,
    /// Terraform rating every player starts with.
    pub starting_terraform_rating: i32,
    /// Actions granted at the start of every generation.
    pub actions_per_generation: i32,
    /// Corporations dealt to each player during starting selection.
    pub starting_corporations: usize,
    /// Project cards dealt to each player during starting selection.
    pub starting_hand: usize,
    /// Project cards offered to each player in the production phase.
    pub production_draw: usize,
    /// Credits paid per purchased card (starting, production and peek/buy).
    pub card_buy_cost: i32,
    /// Fixed deck seed; `None` picks a random one per match.
    pub deck_seed: Option<u64>,
}

impl Settings {
    fn from_env() -> Self {
        let max_players = env::var("MAX_PLAYERS")
            .ok()
            .and_then(|v| v.parse::<usize>().ok())
            .unwrap_or(5);

        let starting_terraform_rating = env::var("STARTING_TR")
            .ok()
            .and_then(|v| v.parse::<i32>().ok())
            .unwrap_or(20);

        let actions_per_generation = env::var("ACTIONS_PER_TURN")
            .ok()
            .and_then(|v| v.parse::<i32>().ok())
            .unwrap_or(2);

        let starting_corporations = env::var("STARTING_CORPORATIONS")
            .ok()
            .and_then(|v| v.parse::<usize>().ok())
            .unwrap_or(2);

        let starting_hand = env::var("STARTING_HAND")
            .ok()
            .and_then(|v| v.parse::<usize>().ok())
            .unwrap_or(10);

        let production_draw = env::var("PRODUCTION_DRAW")
            .ok()
            .and_then(|v| v.parse::<usize>().ok())
            .unwrap_or(4);

        let card_buy_cost = env::var("CARD_BUY_COST")
            .ok()
            .and_then(|v| v.parse::<i32>().ok())
            .unwrap_or(3);

        let deck_seed = env::var("DECK_SEED")
            .ok()
            .and_then(|v| v.parse::<u64>().ok());

        Settings {
            max_players,
            starting_terraform_rating,
            actions_per_generation,
            starting_corporations,
            starting_hand,
            production_draw,
            card_buy_cost,
            deck_seed,
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            max_players: 5,
            starting_terraform_rating: 20,
            actions_per_generation: 2,
            starting_corporations: 2,
            starting_hand: 10,
            production_draw: 4,
            card_buy_cost: 3,
            deck_seed: None,
        }
    }
}

static SETTINGS: Lazy<Settings> = Lazy::new(Settings::from_env);

pub fn settings() -> &'static Settings {
    &SETTINGS
}
