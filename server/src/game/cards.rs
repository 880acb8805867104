//! In-memory card catalog.
//!
//! Card text is loaded by whoever builds the catalog (JSON, tests, a content
//! pipeline); the engine only ever sees the typed [`CardDef`] rows. Cards
//! whose effect can't be expressed as a behavior register a [`CardEffect`].

use crate::{
    error::{GameError, GameResult},
    game::{
        behavior::{Behavior, CardTag, ResourceType, Target, Trigger},
        effects::EffectContext,
        types::{CardId, Resource, ResourceSet},
    },
};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum CardType {
    Automated,
    Active,
    Event,
    Corporation,
    Prelude,
}

impl CardType {
    pub fn is_project(self) -> bool {
        matches!(self, CardType::Automated | CardType::Active | CardType::Event)
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum RequirementType {
    Temperature,
    Oxygen,
    Oceans,
    Tags,
    #[serde(rename = "tr")]
    TerraformRating,
    Production,
    Cities,
    Greeneries,
}

/// A bound the table must satisfy before a card can be played.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Requirement {
    #[serde(rename = "type")]
    pub kind: RequirementType,
    #[serde(default)]
    pub min: Option<i32>,
    #[serde(default)]
    pub max: Option<i32>,
    /// Counted tag for `tags`.
    #[serde(default)]
    pub tag: Option<CardTag>,
    /// Production line for `production`.
    #[serde(default)]
    pub resource: Option<Resource>,
}

impl Requirement {
    pub fn at_least(kind: RequirementType, min: i32) -> Self {
        Requirement {
            kind,
            min: Some(min),
            max: None,
            tag: None,
            resource: None,
        }
    }

    pub fn at_most(kind: RequirementType, max: i32) -> Self {
        Requirement {
            kind,
            min: None,
            max: Some(max),
            tag: None,
            resource: None,
        }
    }

    pub fn tags(tag: CardTag, min: i32) -> Self {
        Requirement {
            tag: Some(tag),
            ..Requirement::at_least(RequirementType::Tags, min)
        }
    }

    pub fn production(resource: Resource, min: i32) -> Self {
        Requirement {
            resource: Some(resource),
            ..Requirement::at_least(RequirementType::Production, min)
        }
    }

    /// Checks a measured `value` against both bounds.
    pub fn check(&self, card_id: &str, value: i32) -> GameResult<()> {
        let below = self.min.is_some_and(|min| value < min);
        let above = self.max.is_some_and(|max| value > max);
        if below || above {
            return Err(GameError::RequirementNotMet {
                card_id: card_id.to_string(),
                requirement: self.kind,
                value,
            });
        }
        Ok(())
    }
}

/// One immutable card definition.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct CardDef {
    pub id: CardId,
    pub name: String,
    #[serde(rename = "type")]
    pub card_type: CardType,
    #[serde(default)]
    pub cost: i32,
    #[serde(default)]
    pub tags: Vec<CardTag>,
    #[serde(default)]
    pub behaviors: Vec<Behavior>,
    #[serde(default)]
    pub victory_points: i32,
    #[serde(default)]
    pub requirements: Vec<Requirement>,
}

impl CardDef {
    pub fn new(id: &str, card_type: CardType, cost: i32) -> Self {
        CardDef {
            id: id.to_string(),
            name: id.to_string(),
            card_type,
            cost,
            tags: Vec::new(),
            behaviors: Vec::new(),
            victory_points: 0,
            requirements: Vec::new(),
        }
    }

    pub fn tag(mut self, tag: CardTag) -> Self {
        self.tags.push(tag);
        self
    }

    pub fn behavior(mut self, behavior: Behavior) -> Self {
        self.behaviors.push(behavior);
        self
    }

    pub fn victory_points(mut self, points: i32) -> Self {
        self.victory_points = points;
        self
    }

    pub fn requires(mut self, requirement: Requirement) -> Self {
        self.requirements.push(requirement);
        self
    }

    pub fn has_tag(&self, tag: CardTag) -> bool {
        self.tags.contains(&tag)
    }

    /// Behaviors that resolve once, when the card is played.
    pub fn auto_behaviors(&self) -> impl Iterator<Item = &Behavior> {
        self.behaviors
            .iter()
            .filter(|b| b.trigger == Trigger::Auto && b.condition.is_none())
    }

    /// Behaviors that stay on the tableau and wait for their condition.
    pub fn reactive_behaviors(&self) -> impl Iterator<Item = (usize, &Behavior)> {
        self.behaviors.iter().enumerate().filter(|(_, b)| b.is_reactive())
    }

    /// Flat credits a corporation hands its owner when chosen.
    pub fn starting_credits(&self) -> i32 {
        self.auto_behaviors()
            .flat_map(|b| b.outputs.iter())
            .filter(|o| {
                o.resource_type == ResourceType::Credits
                    && o.target == Target::SelfPlayer
                    && o.per.is_none()
            })
            .map(|o| o.amount)
            .sum()
    }
}

/// Hook for cards that need code instead of a declarative behavior.
///
/// `validate` runs with the rest of validation, before anything is paid, and
/// is the only place a custom effect may veto the action. `apply` runs after
/// the declarative outputs; by then the action is committed, so an error
/// there is logged and the action still completes.
pub trait CardEffect: Send + Sync {
    fn validate(&self, _ctx: &EffectContext<'_>) -> GameResult<()> {
        Ok(())
    }

    fn apply(&self, ctx: &EffectContext<'_>) -> GameResult<()>;
}

#[derive(Default)]
pub struct CardCatalog {
    cards: DashMap<CardId, CardDef>,
    effects: DashMap<CardId, Arc<dyn CardEffect>>,
}

impl std::fmt::Debug for CardCatalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CardCatalog")
            .field("cards", &self.cards.len())
            .field("effects", &self.effects.len())
            .finish()
    }
}

impl CardCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_cards(cards: impl IntoIterator<Item = CardDef>) -> Self {
        let catalog = Self::new();
        for card in cards {
            catalog.insert(card);
        }
        catalog
    }

    /// Parses a JSON array of card definitions.
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        let cards: Vec<CardDef> = serde_json::from_str(json)?;
        Ok(Self::from_cards(cards))
    }

    pub fn insert(&self, card: CardDef) {
        self.cards.insert(card.id.clone(), card);
    }

    pub fn get(&self, id: &str) -> Option<CardDef> {
        self.cards.get(id).map(|e| e.value().clone())
    }

    pub fn register_effect(&self, card_id: &str, effect: Arc<dyn CardEffect>) {
        self.effects.insert(card_id.to_string(), effect);
    }

    pub fn effect(&self, card_id: &str) -> Option<Arc<dyn CardEffect>> {
        self.effects.get(card_id).map(|e| Arc::clone(e.value()))
    }

    pub fn tags(&self, card_id: &str) -> Vec<CardTag> {
        self.cards
            .get(card_id)
            .map(|e| e.value().tags.clone())
            .unwrap_or_default()
    }

    /// Ids of every card matching `filter`, sorted so decks built from the
    /// same catalog and seed come out identical.
    pub fn ids_where(&self, filter: impl Fn(&CardDef) -> bool) -> Vec<CardId> {
        let mut ids: Vec<CardId> = self
            .cards
            .iter()
            .filter(|e| filter(e.value()))
            .map(|e| e.key().clone())
            .collect();
        ids.sort();
        ids
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }
}

/// Credits a steel resource is worth towards a building card.
pub const STEEL_VALUE: i32 = 2;
/// Credits a titanium resource is worth towards a space card.
pub const TITANIUM_VALUE: i32 = 3;

/// How a player pays a card's printed cost.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
pub struct CardPayment {
    #[serde(default)]
    pub credits: i32,
    #[serde(default)]
    pub steel: i32,
    #[serde(default)]
    pub titanium: i32,
}

impl CardPayment {
    pub fn credits(credits: i32) -> Self {
        CardPayment {
            credits,
            ..CardPayment::default()
        }
    }

    /// Checks the payment is allowed and covers `card.cost`; returns the
    /// resources to deduct.
    pub fn cost_for(&self, card: &CardDef) -> GameResult<ResourceSet> {
        if self.credits < 0 || self.steel < 0 || self.titanium < 0 {
            return Err(GameError::InvalidSelection("negative payment".to_string()));
        }
        if self.steel > 0 && !card.has_tag(CardTag::Building) {
            return Err(GameError::InvalidSelection(format!(
                "steel cannot pay for {}",
                card.id
            )));
        }
        if self.titanium > 0 && !card.has_tag(CardTag::Space) {
            return Err(GameError::InvalidSelection(format!(
                "titanium cannot pay for {}",
                card.id
            )));
        }
        let value = self.credits + self.steel * STEEL_VALUE + self.titanium * TITANIUM_VALUE;
        if value < card.cost {
            return Err(GameError::InvalidSelection(format!(
                "payment worth {value} does not cover {} ({})",
                card.id, card.cost
            )));
        }
        Ok(ResourceSet {
            credits: self.credits,
            steel: self.steel,
            titanium: self.titanium,
            ..ResourceSet::default()
        })
    }
}
