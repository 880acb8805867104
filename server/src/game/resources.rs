//! Per-player resource ledger.
//!
//! All balances of one player live behind a single lock so that a multi-type
//! cost is validated and deducted in one critical section. Events go out
//! after the lock is dropped, one batched event per mutation.

use crate::{
    error::{GameError, GameResult},
    events::{EventBus, GameEvent, ResourceChanges},
    game::{
        read,
        types::{CardId, GameId, PlayerId, Resource, ResourceSet},
        write,
    },
};
use std::{
    collections::{BTreeMap, HashMap},
    sync::{Arc, RwLock},
};

/// Lowest credit production a player can be pushed to.
pub const MIN_CREDIT_PRODUCTION: i32 = -5;

/// A resource cost plus tokens taken off played cards, paid all-or-nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Payment {
    pub cost: ResourceSet,
    pub storage: Vec<(CardId, i32)>,
}

impl Payment {
    pub fn is_empty(&self) -> bool {
        self.cost.is_empty() && self.storage.iter().all(|(_, n)| *n == 0)
    }
}

/// What the production phase paid out.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProductionReport {
    pub energy_converted: i32,
    pub income: ResourceSet,
}

#[derive(Debug, Clone, Default)]
struct LedgerState {
    resources: ResourceSet,
    production: ResourceSet,
    terraform_rating: i32,
    victory_points: i32,
    storage: HashMap<CardId, i32>,
}

#[derive(Debug)]
pub struct PlayerResources {
    game_id: GameId,
    player_id: PlayerId,
    bus: Arc<EventBus>,
    state: RwLock<LedgerState>,
}

impl PlayerResources {
    pub fn new(game_id: GameId, player_id: PlayerId, terraform_rating: i32, bus: Arc<EventBus>) -> Self {
        PlayerResources {
            game_id,
            player_id,
            bus,
            state: RwLock::new(LedgerState {
                terraform_rating,
                ..LedgerState::default()
            }),
        }
    }

    pub fn get(&self) -> ResourceSet {
        read(&self.state).resources
    }

    pub fn production(&self) -> ResourceSet {
        read(&self.state).production
    }

    pub fn terraform_rating(&self) -> i32 {
        read(&self.state).terraform_rating
    }

    pub fn victory_points(&self) -> i32 {
        read(&self.state).victory_points
    }

    pub fn storage(&self, card_id: &str) -> i32 {
        read(&self.state).storage.get(card_id).copied().unwrap_or(0)
    }

    pub fn storage_map(&self) -> BTreeMap<CardId, i32> {
        read(&self.state)
            .storage
            .iter()
            .map(|(k, v)| (k.clone(), *v))
            .collect()
    }

    /// Validates a payment without touching the ledger.
    pub fn check_payment(&self, payment: &Payment) -> GameResult<()> {
        let state = read(&self.state);
        check_cost(&state.resources, &payment.cost)?;
        check_storage(&state.storage, &payment.storage)
    }

    /// Applies a batch of deltas. Rejects the whole batch if any balance
    /// would go negative.
    pub fn add(&self, changes: &ResourceSet) -> GameResult<()> {
        if changes.is_empty() {
            return Ok(());
        }
        {
            let mut state = write(&self.state);
            for (resource, delta) in changes.iter() {
                let have = state.resources.get(resource);
                if have + delta < 0 {
                    return Err(GameError::InsufficientResources {
                        resource,
                        needed: -delta,
                        available: have,
                    });
                }
            }
            state.resources.merge(changes);
        }
        self.publish_resources(changes);
        Ok(())
    }

    /// Applies production deltas, clamping credits at -5 and the rest at 0.
    /// Returns the deltas actually applied.
    pub fn add_production(&self, changes: &ResourceSet) -> ResourceSet {
        let mut applied = ResourceSet::default();
        {
            let mut state = write(&self.state);
            for (resource, delta) in changes.iter() {
                let floor = if resource == Resource::Credits {
                    MIN_CREDIT_PRODUCTION
                } else {
                    0
                };
                let old = state.production.get(resource);
                let new = (old + delta).max(floor);
                state.production.set(resource, new);
                applied.set(resource, new - old);
            }
        }
        if !applied.is_empty() {
            self.bus.publish(GameEvent::ProductionChanged {
                game_id: self.game_id,
                player_id: self.player_id,
                changes: changes_of(&applied),
            });
        }
        applied
    }

    pub fn pay_cost(&self, cost: &ResourceSet) -> GameResult<()> {
        self.pay(&Payment {
            cost: *cost,
            storage: Vec::new(),
        })
    }

    /// Validates and deducts under one write lock.
    pub fn pay(&self, payment: &Payment) -> GameResult<()> {
        let mut storage_changes = Vec::new();
        {
            let mut state = write(&self.state);
            check_cost(&state.resources, &payment.cost)?;
            check_storage(&state.storage, &payment.storage)?;

            for (resource, amount) in payment.cost.iter() {
                state.resources.add(resource, -amount);
            }
            for (card_id, amount) in &payment.storage {
                if *amount == 0 {
                    continue;
                }
                let slot = state.storage.entry(card_id.clone()).or_insert(0);
                let old = *slot;
                *slot -= amount;
                storage_changes.push((card_id.clone(), old, *slot));
            }
        }

        if !payment.cost.is_empty() {
            let mut spent = ResourceSet::default();
            for (resource, amount) in payment.cost.iter() {
                spent.set(resource, -amount);
            }
            self.publish_resources(&spent);
        }
        for (card_id, old_amount, new_amount) in storage_changes {
            self.publish_storage(card_id, old_amount, new_amount);
        }
        Ok(())
    }

    /// Takes up to `amount` of one resource, never going below zero.
    pub fn remove_up_to(&self, resource: Resource, amount: i32) -> i32 {
        if amount <= 0 {
            return 0;
        }
        let taken = {
            let mut state = write(&self.state);
            let taken = state.resources.get(resource).min(amount);
            state.resources.add(resource, -taken);
            taken
        };
        if taken > 0 {
            self.publish_resources(&ResourceSet::of(resource, -taken));
        }
        taken
    }

    pub fn convert_energy_to_heat(&self) -> i32 {
        let energy = {
            let mut state = write(&self.state);
            let energy = state.resources.energy;
            state.resources.energy = 0;
            state.resources.heat += energy;
            energy
        };
        if energy > 0 {
            let mut changes = ResourceSet::default();
            changes.energy = -energy;
            changes.heat = energy;
            self.publish_resources(&changes);
        }
        energy
    }

    /// Production-phase payout: energy becomes heat, then every resource
    /// grows by its production and credits also by the terraform rating.
    pub fn apply_production(&self) -> ProductionReport {
        let energy_converted = self.convert_energy_to_heat();
        let income = {
            let mut state = write(&self.state);
            let mut income = state.production;
            income.credits += state.terraform_rating;
            for resource in Resource::ALL {
                let old = state.resources.get(resource);
                let new = (old + income.get(resource)).max(0);
                state.resources.set(resource, new);
                income.set(resource, new - old);
            }
            income
        };
        self.publish_resources(&income);
        ProductionReport {
            energy_converted,
            income,
        }
    }

    pub fn update_terraform_rating(&self, delta: i32) {
        if delta == 0 {
            return;
        }
        let (old_rating, new_rating) = {
            let mut state = write(&self.state);
            let old = state.terraform_rating;
            state.terraform_rating += delta;
            (old, state.terraform_rating)
        };
        log::debug!(
            "Player {} terraform rating {} -> {}",
            self.player_id,
            old_rating,
            new_rating
        );
        self.bus.publish(GameEvent::TerraformRatingChanged {
            game_id: self.game_id,
            player_id: self.player_id,
            old_rating,
            new_rating,
        });
    }

    pub fn add_victory_points(&self, delta: i32) {
        if delta == 0 {
            return;
        }
        let (old_points, new_points) = {
            let mut state = write(&self.state);
            let old = state.victory_points;
            state.victory_points += delta;
            (old, state.victory_points)
        };
        self.bus.publish(GameEvent::VictoryPointsChanged {
            game_id: self.game_id,
            player_id: self.player_id,
            old_points,
            new_points,
        });
    }

    pub fn add_to_storage(&self, card_id: &str, amount: i32) -> GameResult<()> {
        if amount == 0 {
            return Ok(());
        }
        let (old_amount, new_amount) = {
            let mut state = write(&self.state);
            let slot = state.storage.entry(card_id.to_string()).or_insert(0);
            if *slot + amount < 0 {
                return Err(GameError::InsufficientStorage {
                    card_id: card_id.to_string(),
                    needed: -amount,
                    available: *slot,
                });
            }
            let old = *slot;
            *slot += amount;
            (old, *slot)
        };
        self.publish_storage(card_id.to_string(), old_amount, new_amount);
        Ok(())
    }

    pub fn remove_from_storage(&self, card_id: &str, amount: i32) -> GameResult<()> {
        self.add_to_storage(card_id, -amount)
    }

    fn publish_resources(&self, changes: &ResourceSet) {
        let changes = changes_of(changes);
        if changes.is_empty() {
            return;
        }
        self.bus.publish(GameEvent::ResourcesChanged {
            game_id: self.game_id,
            player_id: self.player_id,
            changes,
        });
    }

    fn publish_storage(&self, card_id: CardId, old_amount: i32, new_amount: i32) {
        self.bus.publish(GameEvent::CardStorageChanged {
            game_id: self.game_id,
            player_id: self.player_id,
            card_id,
            old_amount,
            new_amount,
        });
    }
}

fn changes_of(set: &ResourceSet) -> ResourceChanges {
    set.iter().filter(|(_, amount)| *amount != 0).collect()
}

fn check_cost(have: &ResourceSet, cost: &ResourceSet) -> GameResult<()> {
    for (resource, needed) in cost.iter() {
        if needed < 0 {
            return Err(GameError::InvalidAuthoring(format!(
                "negative {resource} cost {needed}"
            )));
        }
        let available = have.get(resource);
        if available < needed {
            return Err(GameError::InsufficientResources {
                resource,
                needed,
                available,
            });
        }
    }
    Ok(())
}

fn check_storage(have: &HashMap<CardId, i32>, debits: &[(CardId, i32)]) -> GameResult<()> {
    let mut totals: HashMap<&str, i32> = HashMap::new();
    for (card_id, amount) in debits {
        *totals.entry(card_id.as_str()).or_insert(0) += amount;
    }
    for (card_id, needed) in totals {
        let available = have.get(card_id).copied().unwrap_or(0);
        if needed < 0 || available < needed {
            return Err(GameError::InsufficientStorage {
                card_id: card_id.to_string(),
                needed,
                available,
            });
        }
    }
    Ok(())
}
