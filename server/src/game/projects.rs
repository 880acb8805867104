//! Standard projects and resource conversions, expressed as behaviors so
//! they go through the same engine as cards.

use crate::game::behavior::{Behavior, ResourceCondition, ResourceType};
use serde::{Deserialize, Serialize};

/// Heat spent per temperature step.
pub const HEAT_PER_TEMPERATURE: i32 = 8;
/// Plants spent per greenery.
pub const PLANTS_PER_GREENERY: i32 = 8;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum StandardProject {
    SellPatents,
    PowerPlant,
    Asteroid,
    Aquifer,
    Greenery,
    City,
}

impl StandardProject {
    /// Credit price; selling patents is free.
    pub fn cost(self) -> i32 {
        match self {
            StandardProject::SellPatents => 0,
            StandardProject::PowerPlant => 11,
            StandardProject::Asteroid => 14,
            StandardProject::Aquifer => 18,
            StandardProject::Greenery => 23,
            StandardProject::City => 25,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            StandardProject::SellPatents => "sell-patents",
            StandardProject::PowerPlant => "power-plant",
            StandardProject::Asteroid => "asteroid",
            StandardProject::Aquifer => "aquifer",
            StandardProject::Greenery => "greenery",
            StandardProject::City => "city",
        }
    }

    /// `sold` only matters for sell patents: one credit per card.
    pub fn behavior(self, sold: usize) -> Behavior {
        let output = |rt, amount| ResourceCondition::new(rt, amount);
        let behavior = Behavior::auto();
        let behavior = match self {
            StandardProject::SellPatents => {
                return behavior.output(output(ResourceType::Credits, sold as i32))
            }
            StandardProject::PowerPlant => behavior.output(output(ResourceType::EnergyProduction, 1)),
            StandardProject::Asteroid => behavior.output(output(ResourceType::Temperature, 1)),
            StandardProject::Aquifer => behavior.output(output(ResourceType::OceanPlacement, 1)),
            StandardProject::Greenery => behavior.output(output(ResourceType::GreeneryPlacement, 1)),
            StandardProject::City => behavior
                .output(output(ResourceType::CityPlacement, 1))
                .output(output(ResourceType::CreditsProduction, 1)),
        };
        behavior.input(ResourceCondition::new(ResourceType::Credits, self.cost()))
    }
}

pub fn heat_conversion() -> Behavior {
    Behavior::auto()
        .input(ResourceCondition::new(ResourceType::Heat, HEAT_PER_TEMPERATURE))
        .output(ResourceCondition::new(ResourceType::Temperature, 1))
}

pub fn plant_conversion() -> Behavior {
    Behavior::auto()
        .input(ResourceCondition::new(ResourceType::Plants, PLANTS_PER_GREENERY))
        .output(ResourceCondition::new(ResourceType::GreeneryPlacement, 1))
}
