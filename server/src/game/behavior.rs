//! Declarative card behaviors: what a card costs and what it produces.

use crate::game::types::{Resource, TileType};
use serde::{Deserialize, Serialize};

/// Everything a behavior can take or give.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum ResourceType {
    Credits,
    Steel,
    Titanium,
    Plants,
    Energy,
    Heat,

    CreditsProduction,
    SteelProduction,
    TitaniumProduction,
    PlantsProduction,
    EnergyProduction,
    HeatProduction,

    TerraformRating,
    VictoryPoints,
    Temperature,
    Oxygen,

    CityPlacement,
    GreeneryPlacement,
    OceanPlacement,

    CardDraw,
    CardPeek,
    CardTake,
    CardBuy,

    // Card storage tokens.
    Animals,
    Microbes,
    Floaters,
    Science,
    Asteroid,

    // Counted by per-conditions.
    CityTile,
    GreeneryTile,
    OceanTile,

    #[serde(other)]
    Unknown,
}

impl ResourceType {
    pub fn as_resource(self) -> Option<Resource> {
        match self {
            ResourceType::Credits => Some(Resource::Credits),
            ResourceType::Steel => Some(Resource::Steel),
            ResourceType::Titanium => Some(Resource::Titanium),
            ResourceType::Plants => Some(Resource::Plants),
            ResourceType::Energy => Some(Resource::Energy),
            ResourceType::Heat => Some(Resource::Heat),
            _ => None,
        }
    }

    pub fn as_production(self) -> Option<Resource> {
        match self {
            ResourceType::CreditsProduction => Some(Resource::Credits),
            ResourceType::SteelProduction => Some(Resource::Steel),
            ResourceType::TitaniumProduction => Some(Resource::Titanium),
            ResourceType::PlantsProduction => Some(Resource::Plants),
            ResourceType::EnergyProduction => Some(Resource::Energy),
            ResourceType::HeatProduction => Some(Resource::Heat),
            _ => None,
        }
    }

    pub fn is_card_storage(self) -> bool {
        matches!(
            self,
            ResourceType::Animals
                | ResourceType::Microbes
                | ResourceType::Floaters
                | ResourceType::Science
                | ResourceType::Asteroid
        )
    }

    /// Tile a placement output asks for.
    pub fn placement(self) -> Option<TileType> {
        match self {
            ResourceType::CityPlacement => Some(TileType::City),
            ResourceType::GreeneryPlacement => Some(TileType::Greenery),
            ResourceType::OceanPlacement => Some(TileType::Ocean),
            _ => None,
        }
    }

    /// Tile a per-condition counts.
    pub fn counted_tile(self) -> Option<TileType> {
        match self {
            ResourceType::CityTile | ResourceType::CityPlacement => Some(TileType::City),
            ResourceType::GreeneryTile | ResourceType::GreeneryPlacement => Some(TileType::Greenery),
            ResourceType::OceanTile | ResourceType::OceanPlacement => Some(TileType::Ocean),
            _ => None,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum Target {
    #[default]
    SelfPlayer,
    SelfCard,
    AnyCard,
    AnyPlayer,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum CardTag {
    Building,
    Space,
    Science,
    Power,
    Earth,
    Jovian,
    Venus,
    Plant,
    Microbe,
    Animal,
    City,
    Event,
    Wild,
}

/// "For every `amount` of X": scales an output by `floor(count / amount)`.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct PerCondition {
    #[serde(rename = "type")]
    pub resource_type: ResourceType,
    pub amount: i32,
    #[serde(default)]
    pub target: Option<Target>,
    #[serde(default)]
    pub tag: Option<CardTag>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct ResourceCondition {
    #[serde(rename = "type")]
    pub resource_type: ResourceType,
    pub amount: i32,
    #[serde(default)]
    pub target: Target,
    #[serde(default)]
    pub per: Option<PerCondition>,
}

impl ResourceCondition {
    pub fn new(resource_type: ResourceType, amount: i32) -> Self {
        ResourceCondition {
            resource_type,
            amount,
            target: Target::SelfPlayer,
            per: None,
        }
    }

    pub fn target(mut self, target: Target) -> Self {
        self.target = target;
        self
    }

    pub fn per(mut self, per: PerCondition) -> Self {
        self.per = Some(per);
        self
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum Trigger {
    #[default]
    Auto,
    Manual,
}

/// Game events a reactive behavior listens for.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum TriggerEvent {
    OceanPlaced,
    CityPlaced,
    GreeneryPlaced,
    TilePlaced,
    /// Once per matching tag on a played card.
    TagPlayed,
    CardPlayed,
}

/// Something that just happened at the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Occurrence<'a> {
    TilePlaced(TileType),
    CardPlayed(&'a [CardTag]),
}

/// Turns an auto behavior into a standing effect that fires on `event`
/// instead of once when the card is played.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TriggerCondition {
    #[serde(rename = "type")]
    pub event: TriggerEvent,
    #[serde(default)]
    pub affected_tags: Vec<CardTag>,
    /// Also fire on other players' tiles and cards.
    #[serde(default)]
    pub any_player: bool,
}

impl TriggerCondition {
    pub fn on(event: TriggerEvent) -> Self {
        TriggerCondition {
            event,
            affected_tags: Vec::new(),
            any_player: false,
        }
    }

    pub fn tags(mut self, tags: &[CardTag]) -> Self {
        self.affected_tags = tags.to_vec();
        self
    }

    pub fn any_player(mut self) -> Self {
        self.any_player = true;
        self
    }

    /// How many times this condition fires for `occurrence`.
    pub fn times(&self, occurrence: Occurrence<'_>) -> usize {
        match (self.event, occurrence) {
            (TriggerEvent::TilePlaced, Occurrence::TilePlaced(_)) => 1,
            (TriggerEvent::OceanPlaced, Occurrence::TilePlaced(TileType::Ocean))
            | (TriggerEvent::CityPlaced, Occurrence::TilePlaced(TileType::City))
            | (TriggerEvent::GreeneryPlaced, Occurrence::TilePlaced(TileType::Greenery)) => 1,
            (TriggerEvent::TagPlayed, Occurrence::CardPlayed(tags)) => tags
                .iter()
                .filter(|t| self.affected_tags.contains(*t))
                .count(),
            (TriggerEvent::CardPlayed, Occurrence::CardPlayed(tags)) => {
                let matches = self.affected_tags.is_empty()
                    || tags.iter().any(|t| self.affected_tags.contains(t));
                usize::from(matches)
            }
            _ => 0,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, Default)]
pub struct Choice {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub inputs: Vec<ResourceCondition>,
    #[serde(default)]
    pub outputs: Vec<ResourceCondition>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, Default)]
pub struct Behavior {
    #[serde(default)]
    pub trigger: Trigger,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<TriggerCondition>,
    #[serde(default)]
    pub inputs: Vec<ResourceCondition>,
    #[serde(default)]
    pub outputs: Vec<ResourceCondition>,
    #[serde(default)]
    pub choices: Vec<Choice>,
}

impl Behavior {
    pub fn auto() -> Self {
        Behavior::default()
    }

    pub fn manual() -> Self {
        Behavior {
            trigger: Trigger::Manual,
            ..Behavior::default()
        }
    }

    /// An auto behavior that waits for `condition`.
    pub fn when(condition: TriggerCondition) -> Self {
        Behavior {
            condition: Some(condition),
            ..Behavior::default()
        }
    }

    pub fn is_reactive(&self) -> bool {
        self.trigger == Trigger::Auto && self.condition.is_some()
    }

    /// Outputs that leave a selection pending on the owner.
    pub fn needs_owner_turn(&self) -> bool {
        self.outputs
            .iter()
            .chain(self.choices.iter().flat_map(|c| c.outputs.iter()))
            .any(|o| {
                o.resource_type.placement().is_some()
                    || matches!(
                        o.resource_type,
                        ResourceType::CardDraw
                            | ResourceType::CardPeek
                            | ResourceType::CardTake
                            | ResourceType::CardBuy
                    )
            })
    }

    pub fn input(mut self, condition: ResourceCondition) -> Self {
        self.inputs.push(condition);
        self
    }

    pub fn output(mut self, condition: ResourceCondition) -> Self {
        self.outputs.push(condition);
        self
    }

    pub fn choice(mut self, choice: Choice) -> Self {
        self.choices.push(choice);
        self
    }

    /// Folds several auto behaviors into one so they validate and apply as
    /// a single unit. At most one of them may offer choices.
    pub fn merged<'a>(behaviors: impl IntoIterator<Item = &'a Behavior>) -> Option<Behavior> {
        let mut merged = Behavior::auto();
        for b in behaviors {
            if !b.choices.is_empty() {
                if !merged.choices.is_empty() {
                    return None;
                }
                merged.choices = b.choices.clone();
            }
            merged.inputs.extend(b.inputs.iter().cloned());
            merged.outputs.extend(b.outputs.iter().cloned());
        }
        Some(merged)
    }
}
