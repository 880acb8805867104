//! The 61-hex Mars board.

use crate::{
    error::{GameError, GameResult},
    events::{EventBus, GameEvent},
    game::{
        behavior::ResourceType,
        read,
        types::{GameId, HexPosition, PlayerId, TileType},
        write,
    },
};
use serde::{Deserialize, Serialize};
use std::{
    collections::HashSet,
    sync::{Arc, RwLock},
};

/// Hexes per row, top to bottom.
const ROW_SIZES: [i32; 9] = [5, 6, 7, 8, 9, 8, 7, 6, 5];

/// (row, column) of the hexes reserved for oceans.
const OCEAN_HEXES: [(i32, i32); 9] = [
    (1, 2),
    (2, 1),
    (2, 5),
    (3, 3),
    (4, 1),
    (4, 7),
    (5, 4),
    (6, 2),
    (7, 3),
];

pub const NOCTIS_CITY: &str = "noctis-city";

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum TileKind {
    Land,
    OceanReserved,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct TileBonus {
    #[serde(rename = "type")]
    pub resource_type: ResourceType,
    pub amount: i32,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub struct TileOccupant {
    pub tile_type: TileType,
    pub owner_id: PlayerId,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Tile {
    pub coordinates: HexPosition,
    pub kind: TileKind,
    pub tags: Vec<String>,
    pub bonuses: Vec<TileBonus>,
    pub occupant: Option<TileOccupant>,
}

impl Tile {
    pub fn land(coordinates: HexPosition) -> Self {
        Tile {
            coordinates,
            kind: TileKind::Land,
            tags: Vec::new(),
            bonuses: Vec::new(),
            occupant: None,
        }
    }

    pub fn is_occupied(&self) -> bool {
        self.occupant.is_some()
    }

    fn holds(&self, tile_type: TileType) -> bool {
        matches!(self.occupant, Some(o) if o.tile_type == tile_type)
    }

    fn owned_by(&self, player_id: PlayerId) -> bool {
        matches!(self.occupant, Some(o) if o.owner_id == player_id)
    }
}

/// Builds the standard layout: ocean hexes, printed bonuses, named places.
pub fn standard_tiles() -> Vec<Tile> {
    let mut tiles = Vec::with_capacity(61);
    for (row, count) in ROW_SIZES.iter().enumerate() {
        let row = row as i32;
        let r = row - 4;
        for col in 0..*count {
            let mut q = col - count / 2;
            if r < 0 {
                q -= (r - 1) / 2;
            } else {
                q -= r / 2;
            }
            let coordinates = HexPosition::new(q, r);

            let mut tile = Tile::land(coordinates);
            if OCEAN_HEXES.contains(&(row, col)) {
                tile.kind = TileKind::OceanReserved;
            }
            tile.bonuses = printed_bonuses(row * 10 + col);
            if coordinates == HexPosition::new(-2, 0) {
                tile.tags.push(NOCTIS_CITY.to_string());
            }
            tiles.push(tile);
        }
    }
    tiles
}

fn printed_bonuses(index: i32) -> Vec<TileBonus> {
    let mut bonuses = Vec::new();
    let mut push = |resource_type, amount| bonuses.push(TileBonus { resource_type, amount });
    if index % 8 == 0 {
        push(ResourceType::Steel, 2);
    }
    if index % 9 == 0 {
        push(ResourceType::Titanium, 1);
    }
    if index % 11 == 0 {
        push(ResourceType::Plants, 1);
    }
    if index % 13 == 0 {
        push(ResourceType::CardDraw, 1);
    }
    bonuses
}

#[derive(Debug)]
pub struct Board {
    game_id: GameId,
    bus: Arc<EventBus>,
    tiles: RwLock<Vec<Tile>>,
}

impl Board {
    pub fn new(game_id: GameId, bus: Arc<EventBus>) -> Self {
        Self::with_tiles(game_id, standard_tiles(), bus)
    }

    pub fn with_tiles(game_id: GameId, tiles: Vec<Tile>, bus: Arc<EventBus>) -> Self {
        Board {
            game_id,
            bus,
            tiles: RwLock::new(tiles),
        }
    }

    pub fn tiles(&self) -> Vec<Tile> {
        read(&self.tiles).clone()
    }

    pub fn tile(&self, coordinates: HexPosition) -> GameResult<Tile> {
        read(&self.tiles)
            .iter()
            .find(|t| t.coordinates == coordinates)
            .cloned()
            .ok_or(GameError::TileNotFound(coordinates))
    }

    /// Sets the occupant of a hex. Legality is the caller's concern.
    pub fn update_tile_occupancy(
        &self,
        coordinates: HexPosition,
        tile_type: TileType,
        owner_id: PlayerId,
    ) -> GameResult<()> {
        {
            let mut tiles = write(&self.tiles);
            let tile = tiles
                .iter_mut()
                .find(|t| t.coordinates == coordinates)
                .ok_or(GameError::TileNotFound(coordinates))?;
            tile.occupant = Some(TileOccupant {
                tile_type,
                owner_id,
            });
        }
        log::info!(
            "Game {}: {} placed at {} by {}",
            self.game_id,
            tile_type,
            coordinates,
            owner_id
        );
        self.bus.publish(GameEvent::TilePlaced {
            game_id: self.game_id,
            player_id: owner_id,
            tile_type,
            coordinates,
        });
        Ok(())
    }

    /// Hexes where `player_id` may legally put a tile of `tile_type`.
    pub fn available_hexes(&self, tile_type: TileType, player_id: PlayerId) -> Vec<HexPosition> {
        let tiles = read(&self.tiles);
        let free_land = tiles
            .iter()
            .filter(|t| t.kind == TileKind::Land && !t.is_occupied());

        match tile_type {
            TileType::Ocean => {
                let placed = tiles.iter().filter(|t| t.holds(TileType::Ocean)).count();
                if placed as i32 >= crate::game::parameters::MAX_OCEANS {
                    return Vec::new();
                }
                tiles
                    .iter()
                    .filter(|t| t.kind == TileKind::OceanReserved && !t.is_occupied())
                    .map(|t| t.coordinates)
                    .collect()
            }
            TileType::City => {
                let cities: HashSet<HexPosition> = tiles
                    .iter()
                    .filter(|t| t.holds(TileType::City))
                    .map(|t| t.coordinates)
                    .collect();
                free_land
                    .filter(|t| !t.coordinates.neighbors().iter().any(|n| cities.contains(n)))
                    .map(|t| t.coordinates)
                    .collect()
            }
            TileType::Greenery => {
                let own: HashSet<HexPosition> = tiles
                    .iter()
                    .filter(|t| t.owned_by(player_id))
                    .map(|t| t.coordinates)
                    .collect();
                let free: Vec<HexPosition> = free_land.map(|t| t.coordinates).collect();
                if own.is_empty() {
                    return free;
                }
                let adjacent: Vec<HexPosition> = free
                    .iter()
                    .copied()
                    .filter(|c| c.neighbors().iter().any(|n| own.contains(n)))
                    .collect();
                // Nothing free next to the player's tiles: any land will do.
                if adjacent.is_empty() {
                    free
                } else {
                    adjacent
                }
            }
        }
    }

    /// Tiles of one type, optionally only those owned by `owner`.
    pub fn count_tiles(&self, tile_type: TileType, owner: Option<PlayerId>) -> usize {
        read(&self.tiles)
            .iter()
            .filter(|t| t.holds(tile_type))
            .filter(|t| owner.map_or(true, |id| t.owned_by(id)))
            .count()
    }

    pub fn adjacent_oceans(&self, coordinates: HexPosition) -> usize {
        let neighbors = coordinates.neighbors();
        read(&self.tiles)
            .iter()
            .filter(|t| neighbors.contains(&t.coordinates) && t.holds(TileType::Ocean))
            .count()
    }
}
