use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

pub type GameId = Uuid;
pub type PlayerId = Uuid;
pub type CardId = String;

/// The six fungible resources a player holds.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum Resource {
    Credits,
    Steel,
    Titanium,
    Plants,
    Energy,
    Heat,
}

impl Resource {
    pub const ALL: [Resource; 6] = [
        Resource::Credits,
        Resource::Steel,
        Resource::Titanium,
        Resource::Plants,
        Resource::Energy,
        Resource::Heat,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Resource::Credits => "credits",
            Resource::Steel => "steel",
            Resource::Titanium => "titanium",
            Resource::Plants => "plants",
            Resource::Energy => "energy",
            Resource::Heat => "heat",
        }
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One amount per [`Resource`]. Used both as a balance and as a batch of deltas.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResourceSet {
    pub credits: i32,
    pub steel: i32,
    pub titanium: i32,
    pub plants: i32,
    pub energy: i32,
    pub heat: i32,
}

impl ResourceSet {
    pub fn of(resource: Resource, amount: i32) -> Self {
        let mut set = ResourceSet::default();
        set.add(resource, amount);
        set
    }

    pub fn credits(amount: i32) -> Self {
        ResourceSet::of(Resource::Credits, amount)
    }

    pub fn get(&self, resource: Resource) -> i32 {
        match resource {
            Resource::Credits => self.credits,
            Resource::Steel => self.steel,
            Resource::Titanium => self.titanium,
            Resource::Plants => self.plants,
            Resource::Energy => self.energy,
            Resource::Heat => self.heat,
        }
    }

    pub fn set(&mut self, resource: Resource, amount: i32) {
        match resource {
            Resource::Credits => self.credits = amount,
            Resource::Steel => self.steel = amount,
            Resource::Titanium => self.titanium = amount,
            Resource::Plants => self.plants = amount,
            Resource::Energy => self.energy = amount,
            Resource::Heat => self.heat = amount,
        }
    }

    pub fn add(&mut self, resource: Resource, amount: i32) {
        self.set(resource, self.get(resource) + amount);
    }

    pub fn merge(&mut self, other: &ResourceSet) {
        for (resource, amount) in other.iter() {
            self.add(resource, amount);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (Resource, i32)> + '_ {
        Resource::ALL.into_iter().map(move |r| (r, self.get(r)))
    }

    pub fn is_empty(&self) -> bool {
        self.iter().all(|(_, amount)| amount == 0)
    }
}

/// Match life-cycle.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum GameStatus {
    Lobby,
    Active,
    Completed,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum GamePhase {
    Waiting,
    StartingCardSelection,
    Action,
    Production,
    Complete,
}

/// What can occupy a board hex.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum TileType {
    Ocean,
    Greenery,
    City,
}

impl fmt::Display for TileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TileType::Ocean => "ocean",
            TileType::Greenery => "greenery",
            TileType::City => "city",
        })
    }
}

/// Cube coordinates; `q + r + s == 0` for every hex on the board.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HexPosition {
    pub q: i32,
    pub r: i32,
    pub s: i32,
}

const DIRECTIONS: [(i32, i32); 6] = [(1, 0), (1, -1), (0, -1), (-1, 0), (-1, 1), (0, 1)];

impl HexPosition {
    pub fn new(q: i32, r: i32) -> Self {
        HexPosition { q, r, s: -q - r }
    }

    pub fn neighbors(&self) -> [HexPosition; 6] {
        DIRECTIONS.map(|(dq, dr)| HexPosition::new(self.q + dq, self.r + dr))
    }

    pub fn is_adjacent(&self, other: &HexPosition) -> bool {
        self.neighbors().contains(other)
    }
}

impl fmt::Display for HexPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.q, self.r, self.s)
    }
}
