//! Final scoring.
//!
//! Terraform rating + card victory points + 1 per owned greenery + 1 per
//! greenery next to each owned city.

use crate::game::{
    board::Tile,
    player::Player,
    types::{HexPosition, PlayerId, TileType},
};
use serde::{Deserialize, Serialize};
use std::{collections::HashMap, sync::Arc};

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct FinalScore {
    pub player_id: PlayerId,
    pub terraform_rating: i32,
    pub victory_points: i32,
    pub greenery_points: i32,
    pub city_points: i32,
    pub total: i32,
}

/// Scores sorted best first (total, then terraform rating).
pub fn final_scores(players: &[Arc<Player>], tiles: &[Tile]) -> Vec<FinalScore> {
    let occupied: HashMap<HexPosition, (TileType, PlayerId)> = tiles
        .iter()
        .filter_map(|t| t.occupant.map(|o| (t.coordinates, (o.tile_type, o.owner_id))))
        .collect();

    let mut scores: Vec<FinalScore> = players
        .iter()
        .map(|p| {
            let id = p.id();
            let owned = |tile_type: TileType| {
                occupied
                    .iter()
                    .filter(move |(_, (t, owner))| *t == tile_type && *owner == id)
            };

            let greenery_points = owned(TileType::Greenery).count() as i32;
            let city_points = owned(TileType::City)
                .map(|(pos, _)| {
                    pos.neighbors()
                        .iter()
                        .filter(|n| matches!(occupied.get(*n), Some((TileType::Greenery, _))))
                        .count() as i32
                })
                .sum();

            let terraform_rating = p.resources().terraform_rating();
            let victory_points = p.resources().victory_points();
            FinalScore {
                player_id: id,
                terraform_rating,
                victory_points,
                greenery_points,
                city_points,
                total: terraform_rating + victory_points + greenery_points + city_points,
            }
        })
        .collect();

    scores.sort_by(|a, b| {
        b.total
            .cmp(&a.total)
            .then(b.terraform_rating.cmp(&a.terraform_rating))
    });
    scores
}

/// `None` on a tie for first place.
pub fn winner(scores: &[FinalScore]) -> Option<PlayerId> {
    match scores {
        [first, second, ..]
            if first.total == second.total && first.terraform_rating == second.terraform_rating =>
        {
            None
        }
        [first, ..] => Some(first.player_id),
        [] => None,
    }
}
