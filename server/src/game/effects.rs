//! Behavior interpreter.
//!
//! Resolution runs in two phases. Validation reads state only and either
//! produces a plan or fails; application then deducts the aggregated cost in
//! one ledger call and applies outputs. A failed validation leaves no trace.

use crate::{
    error::{GameError, GameResult},
    game::{
        behavior::{Behavior, PerCondition, ResourceCondition, ResourceType, Target},
        board::Board,
        cards::{CardCatalog, CardEffect},
        deck::Deck,
        parameters::GlobalParameters,
        player::{PendingCardDrawSelection, Player, TileRequest},
        resources::Payment,
        types::{GameId, PlayerId, ResourceSet},
    },
};
use std::sync::Arc;

/// What a [`crate::game::cards::CardEffect`] gets to work with.
pub struct EffectContext<'a> {
    pub game_id: GameId,
    pub player: &'a Player,
    pub players: &'a [Arc<Player>],
    pub source_card: &'a str,
    pub board: &'a Board,
    pub deck: &'a Deck,
    pub parameters: &'a GlobalParameters,
}

/// Per-invocation parameters.
#[derive(Debug, Clone, Default)]
pub struct EffectRequest<'a> {
    /// Label for logs and tile requests, e.g. a card id or project name.
    pub source: &'a str,
    /// Card the behavior belongs to; owns "self card" storage.
    pub source_card: Option<&'a str>,
    pub choice: Option<usize>,
    /// Paid together with the behavior inputs (a card's printed price).
    pub extra_cost: ResourceSet,
    pub target_card: Option<&'a str>,
    pub target_player: Option<PlayerId>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EffectOutcome {
    pub gained: ResourceSet,
    pub terraform_steps: i32,
    pub tiles: Vec<TileRequest>,
    pub card_draw: Option<PendingCardDrawSelection>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CardDraw {
    None,
    /// Draw and keep everything.
    Keep(usize),
    Peek {
        peek: usize,
        free_take: usize,
        max_buy: usize,
    },
}

impl CardDraw {
    fn from_counters(draw: i32, peek: i32, take: i32, buy: i32) -> GameResult<Self> {
        if draw < 0 || peek < 0 || take < 0 || buy < 0 {
            return Err(GameError::InvalidAuthoring(
                "negative card draw amount".to_string(),
            ));
        }
        let (draw, peek, take, buy) = (draw as usize, peek as usize, take as usize, buy as usize);
        if peek > 0 {
            return Ok(CardDraw::Peek {
                peek,
                free_take: draw + take,
                max_buy: buy,
            });
        }
        match (draw, take, buy) {
            (0, 0, 0) => Ok(CardDraw::None),
            (n, 0, 0) => Ok(CardDraw::Keep(n)),
            _ => Err(GameError::InvalidAuthoring(format!(
                "unsupported card draw combination: draw {draw}, take {take}, buy {buy} without peek"
            ))),
        }
    }

    fn cards_needed(self) -> usize {
        match self {
            CardDraw::None => 0,
            CardDraw::Keep(n) => n,
            CardDraw::Peek { peek, .. } => peek,
        }
    }
}

struct Plan<'b> {
    payment: Payment,
    outputs: Vec<(&'b ResourceCondition, i32)>,
    card_draw: CardDraw,
}

pub struct EffectEngine<'a> {
    pub game_id: GameId,
    pub players: &'a [Arc<Player>],
    pub board: &'a Board,
    pub deck: &'a Deck,
    pub parameters: &'a GlobalParameters,
    pub catalog: &'a CardCatalog,
    pub card_buy_cost: i32,
}

impl<'a> EffectEngine<'a> {
    pub fn resolve(
        &self,
        player: &Player,
        behavior: &Behavior,
        request: &EffectRequest<'_>,
    ) -> GameResult<EffectOutcome> {
        let plan = self.validate(player, behavior, request)?;
        self.apply(player, plan, request)
    }

    fn validate<'b>(
        &self,
        player: &Player,
        behavior: &'b Behavior,
        request: &EffectRequest<'_>,
    ) -> GameResult<Plan<'b>> {
        let (inputs, outputs) = select_choice(behavior, request.choice)?;

        let mut payment = Payment {
            cost: request.extra_cost,
            storage: Vec::new(),
        };
        for input in inputs {
            if input.amount < 0 {
                return Err(GameError::InvalidAuthoring(format!(
                    "negative input {:?}",
                    input.resource_type
                )));
            }
            let rt = input.resource_type;
            if let Some(resource) = rt.as_resource() {
                payment.cost.add(resource, input.amount);
            } else if rt.is_card_storage() {
                let card = self.storage_card(player, input.target, request)?;
                payment.storage.push((card.to_string(), input.amount));
            } else {
                log::warn!(
                    "Game {}: skipping unsupported input {:?} from {}",
                    self.game_id,
                    rt,
                    request.source
                );
            }
        }

        let mut scaled = Vec::with_capacity(outputs.len());
        let mut self_gains = ResourceSet::default();
        let (mut draw, mut peek, mut take, mut buy) = (0, 0, 0, 0);
        for output in outputs {
            let amount = match &output.per {
                Some(per) => {
                    if per.amount <= 0 {
                        return Err(GameError::InvalidAuthoring(format!(
                            "per-condition divisor {} on {:?}",
                            per.amount, output.resource_type
                        )));
                    }
                    output.amount * (self.count_per(player, per, request) / per.amount)
                }
                None => output.amount,
            };
            if amount == 0 {
                continue;
            }

            let rt = output.resource_type;
            match rt {
                ResourceType::CardDraw => draw += amount,
                ResourceType::CardPeek => peek += amount,
                ResourceType::CardTake => take += amount,
                ResourceType::CardBuy => buy += amount,
                _ if rt.is_card_storage() && output.target != Target::AnyPlayer => {
                    let card = self.storage_card(player, output.target, request)?;
                    if amount < 0 {
                        // Token losses are paid together with the inputs.
                        payment.storage.push((card.to_string(), -amount));
                        continue;
                    }
                }
                _ => {
                    if let (Some(resource), true) =
                        (rt.as_resource(), output.target != Target::AnyPlayer)
                    {
                        self_gains.add(resource, amount);
                    }
                }
            }
            scaled.push((output, amount));
        }
        player.resources().check_payment(&payment)?;

        // Losses among the outputs must be covered by what's left after paying.
        let balance = player.resources().get();
        for (resource, delta) in self_gains.iter() {
            let available = balance.get(resource) - payment.cost.get(resource);
            if available + delta < 0 {
                return Err(GameError::InsufficientResources {
                    resource,
                    needed: -delta,
                    available,
                });
            }
        }

        let card_draw = CardDraw::from_counters(draw, peek, take, buy)?;
        let needed = card_draw.cards_needed();
        let available = self.deck.project_count();
        if needed > available {
            return Err(GameError::InsufficientCards {
                requested: needed,
                available,
            });
        }

        if let Some((card_id, effect)) = self.custom_effect(request) {
            effect.validate(&self.context(player, card_id))?;
        }

        Ok(Plan {
            payment,
            outputs: scaled,
            card_draw,
        })
    }

    fn apply(
        &self,
        player: &Player,
        plan: Plan<'_>,
        request: &EffectRequest<'_>,
    ) -> GameResult<EffectOutcome> {
        let ledger = player.resources();
        if !plan.payment.is_empty() {
            ledger.pay(&plan.payment)?;
        }

        let mut outcome = EffectOutcome::default();
        let mut production = ResourceSet::default();
        let mut storage = Vec::new();
        let mut any_player = Vec::new();
        let (mut tr, mut vp, mut temperature, mut oxygen) = (0, 0, 0, 0);

        for (output, amount) in plan.outputs {
            let rt = output.resource_type;
            if output.target == Target::AnyPlayer {
                any_player.push((rt, amount));
                continue;
            }
            if let Some(resource) = rt.as_resource() {
                outcome.gained.add(resource, amount);
            } else if let Some(resource) = rt.as_production() {
                production.add(resource, amount);
            } else if rt.is_card_storage() {
                storage.push((self.storage_card(player, output.target, request)?, amount));
            } else if let Some(tile_type) = rt.placement() {
                for _ in 0..amount.max(0) {
                    outcome.tiles.push(TileRequest {
                        tile_type,
                        source: request.source.to_string(),
                    });
                }
            } else {
                match rt {
                    ResourceType::TerraformRating => tr += amount,
                    ResourceType::VictoryPoints => vp += amount,
                    ResourceType::Temperature => temperature += amount,
                    ResourceType::Oxygen => oxygen += amount,
                    ResourceType::CardDraw
                    | ResourceType::CardPeek
                    | ResourceType::CardTake
                    | ResourceType::CardBuy => {}
                    _ => log::warn!(
                        "Game {}: skipping unsupported output {:?} from {}",
                        self.game_id,
                        rt,
                        request.source
                    ),
                }
            }
        }

        ledger.add(&outcome.gained)?;
        ledger.add_production(&production);
        ledger.update_terraform_rating(tr);
        ledger.add_victory_points(vp);
        for (card_id, amount) in storage {
            ledger.add_to_storage(card_id, amount)?;
        }

        outcome.terraform_steps = self.parameters.increase_temperature(temperature)
            + self.parameters.increase_oxygen(oxygen);
        ledger.update_terraform_rating(outcome.terraform_steps);

        self.apply_to_target_player(request, &any_player);

        outcome.card_draw = self.draw_cards(player, plan.card_draw, request)?;

        if let Some((card_id, effect)) = self.custom_effect(request) {
            if let Err(e) = effect.apply(&self.context(player, card_id)) {
                log::error!(
                    "Game {}: custom effect of {} failed after commit: {e}",
                    self.game_id,
                    card_id
                );
            }
        }

        Ok(outcome)
    }

    fn custom_effect<'r>(
        &self,
        request: &EffectRequest<'r>,
    ) -> Option<(&'r str, Arc<dyn CardEffect>)> {
        let card_id = request.source_card?;
        self.catalog.effect(card_id).map(|effect| (card_id, effect))
    }

    fn context<'c>(&'c self, player: &'c Player, card_id: &'c str) -> EffectContext<'c> {
        EffectContext {
            game_id: self.game_id,
            player,
            players: self.players,
            source_card: card_id,
            board: self.board,
            deck: self.deck,
            parameters: self.parameters,
        }
    }

    /// Effects aimed at another player. Removals take what the target has.
    fn apply_to_target_player(&self, request: &EffectRequest<'_>, effects: &[(ResourceType, i32)]) {
        if effects.is_empty() {
            return;
        }
        let Some(target) = request
            .target_player
            .and_then(|id| self.players.iter().find(|p| p.id() == id))
        else {
            log::debug!(
                "Game {}: no target player for {}, skipping {} effect(s)",
                self.game_id,
                request.source,
                effects.len()
            );
            return;
        };

        let ledger = target.resources();
        for &(rt, amount) in effects {
            if let Some(resource) = rt.as_resource() {
                if amount < 0 {
                    ledger.remove_up_to(resource, -amount);
                } else if let Err(e) = ledger.add(&ResourceSet::of(resource, amount)) {
                    log::warn!("Game {}: target gain failed: {e}", self.game_id);
                }
            } else if let Some(resource) = rt.as_production() {
                ledger.add_production(&ResourceSet::of(resource, amount));
            } else {
                log::warn!(
                    "Game {}: skipping unsupported player-targeted {:?} from {}",
                    self.game_id,
                    rt,
                    request.source
                );
            }
        }
    }

    fn draw_cards(
        &self,
        player: &Player,
        card_draw: CardDraw,
        request: &EffectRequest<'_>,
    ) -> GameResult<Option<PendingCardDrawSelection>> {
        let (count, free_take, max_buy, mandatory) = match card_draw {
            CardDraw::None => return Ok(None),
            CardDraw::Keep(n) => (n, n, 0, true),
            CardDraw::Peek {
                peek,
                free_take,
                max_buy,
            } => (peek, free_take, max_buy, false),
        };

        let available_cards = self.deck.draw_project_cards(count)?;
        let selection = PendingCardDrawSelection {
            available_cards,
            free_take,
            max_buy,
            card_buy_cost: self.card_buy_cost,
            source: request.source.to_string(),
            source_card: request.source_card.map(str::to_string),
            mandatory,
        };
        player.set_pending_card_draw(selection.clone());
        Ok(Some(selection))
    }

    fn storage_card<'r>(
        &self,
        player: &Player,
        target: Target,
        request: &EffectRequest<'r>,
    ) -> GameResult<&'r str> {
        match target {
            Target::SelfCard | Target::SelfPlayer => request.source_card.ok_or_else(|| {
                GameError::InvalidAuthoring(format!(
                    "card storage on {} without a source card",
                    request.source
                ))
            }),
            Target::AnyCard => {
                let card = request.target_card.ok_or_else(|| {
                    GameError::InvalidSelection("no target card chosen".to_string())
                })?;
                if !player.owns_card(card) {
                    return Err(GameError::CardNotPlayed(card.to_string()));
                }
                Ok(card)
            }
            Target::AnyPlayer => Err(GameError::InvalidAuthoring(
                "card storage cannot target a player".to_string(),
            )),
        }
    }

    fn count_per(&self, player: &Player, per: &PerCondition, request: &EffectRequest<'_>) -> i32 {
        let rt = per.resource_type;
        if let Some(tag) = per.tag {
            let counted: Vec<&Player> = match per.target {
                Some(Target::AnyPlayer) => self.players.iter().map(|p| p.as_ref()).collect(),
                _ => vec![player],
            };
            return counted
                .into_iter()
                .flat_map(|p| p.played().into_iter().chain(p.corporation()))
                .map(|card| self.catalog.tags(&card).iter().filter(|t| **t == tag).count() as i32)
                .sum();
        }
        if let Some(tile_type) = rt.counted_tile() {
            let owner = match per.target {
                Some(Target::SelfPlayer) => Some(player.id()),
                _ => None,
            };
            return self.board.count_tiles(tile_type, owner) as i32;
        }
        if rt.is_card_storage() {
            let card = match per.target {
                Some(Target::AnyCard) => request.target_card,
                _ => request.source_card,
            };
            return card.map_or(0, |c| player.resources().storage(c));
        }
        if let Some(resource) = rt.as_resource() {
            return player.resources().get().get(resource);
        }
        if let Some(resource) = rt.as_production() {
            return player.resources().production().get(resource);
        }
        match rt {
            ResourceType::TerraformRating => player.resources().terraform_rating(),
            _ => {
                log::warn!(
                    "Game {}: cannot count {:?} for {}",
                    self.game_id,
                    rt,
                    request.source
                );
                0
            }
        }
    }
}

/// Base inputs/outputs plus those of the selected choice.
fn select_choice(
    behavior: &Behavior,
    choice: Option<usize>,
) -> GameResult<(Vec<&ResourceCondition>, Vec<&ResourceCondition>)> {
    let mut inputs: Vec<&ResourceCondition> = behavior.inputs.iter().collect();
    let mut outputs: Vec<&ResourceCondition> = behavior.outputs.iter().collect();

    let available = behavior.choices.len();
    match (available, choice) {
        (0, None) => {}
        (0, Some(_)) | (_, None) => {
            return Err(GameError::InvalidChoice {
                index: choice,
                available,
            })
        }
        (_, Some(index)) => {
            let selected = behavior.choices.get(index).ok_or(GameError::InvalidChoice {
                index: choice,
                available,
            })?;
            inputs.extend(selected.inputs.iter());
            outputs.extend(selected.outputs.iter());
        }
    }
    Ok((inputs, outputs))
}
