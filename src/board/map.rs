//! Map definitions and board construction.
//!
//! A map is a JSON document naming the players, the provinces with their
//! adjacency and coasts, and the starting units. Provinces refer to each other
//! by abbreviation; [`Board::from_map`] resolves those names to arena ids.

use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::phase::Phase;
use super::player::{Player, PlayerId, WinType};
use super::province::{Coast, Province, ProvinceId, ProvinceKind};
use super::state::Board;
use super::unit::UnitType;
use crate::config::GameRules;

/// The standard seven-player map.
pub const STANDARD_MAP: &str = include_str!("../../maps/standard.json");

/// Errors raised while building or editing a board.
#[derive(Debug, thiserror::Error)]
pub enum MapError {
    #[error("invalid map JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unknown province: '{0}'")]
    UnknownProvince(String),

    #[error("unknown coast: '{0}'")]
    UnknownCoast(String),

    #[error("unknown player: '{0}'")]
    UnknownPlayer(String),

    #[error("duplicate name: '{0}'")]
    Duplicate(String),

    #[error("adjacency of '{0}' and '{1}' is not symmetric")]
    Asymmetric(String, String),

    #[error("coast of '{0}' borders '{1}', which is not an adjacent sea")]
    BadCoast(String, String),

    #[error("an army cannot stand in sea province '{0}'")]
    ArmyAtSea(String),

    #[error("a fleet has no coast to stand on in '{0}'")]
    NoFleetCoast(String),

    #[error("province '{0}' is already occupied")]
    Occupied(String),

    #[error("too many {0} for the board arena")]
    TooMany(&'static str),

    #[error("unknown province id {0}")]
    UnknownProvinceId(u16),

    #[error("province id {province} has no coast {index}")]
    UnknownCoastId { province: u16, index: u8 },

    #[error("unknown player id {0}")]
    UnknownPlayerId(u8),

    #[error("unknown unit id {0}")]
    UnknownUnitId(u32),

    #[error("{what} at index {index} carries id {id}")]
    MisplacedId {
        what: &'static str,
        index: usize,
        id: u32,
    },

    #[error("{0} is not recorded in its province")]
    Unplaced(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MapDef {
    pub name: String,
    #[serde(default = "default_year")]
    pub year: u16,
    pub players: Vec<PlayerDef>,
    pub provinces: Vec<ProvinceDef>,
    #[serde(default)]
    pub units: Vec<UnitDef>,
}

fn default_year() -> u16 {
    1901
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerDef {
    pub name: String,
    pub vscc: u32,
    pub iscc: u32,
    #[serde(default)]
    pub win_type: WinType,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProvinceDef {
    pub name: String,
    pub abbr: String,
    pub kind: ProvinceKind,
    #[serde(default)]
    pub supply_center: bool,
    /// Owning and coring player at the start of the game.
    #[serde(default)]
    pub home: Option<String>,
    pub adjacent: Vec<String>,
    #[serde(default)]
    pub coasts: Vec<CoastDef>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoastDef {
    pub name: String,
    pub adjacent_seas: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnitDef {
    pub player: String,
    pub unit_type: UnitType,
    pub province: String,
    #[serde(default)]
    pub coast: Option<String>,
}

impl MapDef {
    pub fn from_json(s: &str) -> Result<Self, MapError> {
        Ok(serde_json::from_str(s)?)
    }

    pub fn standard() -> Result<Self, MapError> {
        Self::from_json(STANDARD_MAP)
    }
}

impl Board {
    /// Builds a board at Spring Moves of the map's starting year.
    pub fn from_map(def: &MapDef) -> Result<Board, MapError> {
        if def.players.len() > usize::from(u8::MAX) {
            return Err(MapError::TooMany("players"));
        }
        if def.provinces.len() > usize::from(u16::MAX) {
            return Err(MapError::TooMany("provinces"));
        }

        let mut player_ids = HashMap::new();
        let mut players = Vec::with_capacity(def.players.len());
        for (i, p) in def.players.iter().enumerate() {
            let id = PlayerId(i as u8);
            if player_ids.insert(p.name.to_ascii_lowercase(), id).is_some() {
                return Err(MapError::Duplicate(p.name.clone()));
            }
            let mut player = Player::new(id, p.name.clone(), p.vscc, p.iscc);
            player.win_type = p.win_type;
            players.push(player);
        }

        let mut province_ids = HashMap::new();
        for (i, p) in def.provinces.iter().enumerate() {
            if province_ids
                .insert(p.abbr.to_ascii_lowercase(), ProvinceId(i as u16))
                .is_some()
            {
                return Err(MapError::Duplicate(p.abbr.clone()));
            }
        }
        let lookup = |name: &str| {
            province_ids
                .get(&name.to_ascii_lowercase())
                .copied()
                .ok_or_else(|| MapError::UnknownProvince(name.to_string()))
        };

        let mut provinces = Vec::with_capacity(def.provinces.len());
        for (i, p) in def.provinces.iter().enumerate() {
            let adjacent = p
                .adjacent
                .iter()
                .map(|a| lookup(a))
                .collect::<Result<BTreeSet<_>, _>>()?;
            let mut coasts = Vec::with_capacity(p.coasts.len());
            for c in &p.coasts {
                let adjacent_seas = c
                    .adjacent_seas
                    .iter()
                    .map(|s| lookup(s))
                    .collect::<Result<BTreeSet<_>, _>>()?;
                coasts.push(Coast {
                    name: c.name.clone(),
                    adjacent_seas,
                });
            }
            let home = match &p.home {
                Some(name) => Some(
                    player_ids
                        .get(&name.to_ascii_lowercase())
                        .copied()
                        .ok_or_else(|| MapError::UnknownPlayer(name.clone()))?,
                ),
                None => None,
            };
            provinces.push(Province {
                id: ProvinceId(i as u16),
                name: p.name.clone(),
                abbr: p.abbr.clone(),
                kind: p.kind,
                adjacent,
                coasts,
                supply_center: p.supply_center,
                owner: None,
                core: home.filter(|_| p.supply_center),
                half_core: None,
                unit: None,
                dislodged_unit: None,
            });
        }

        check_geography(&provinces)?;

        let mut board = Board {
            name: def.name.clone(),
            year: def.year,
            phase: Phase::SpringMoves,
            rules: GameRules::default(),
            players,
            provinces,
            units: Vec::new(),
        };

        let homes: Vec<(ProvinceId, PlayerId)> = board
            .provinces
            .iter()
            .filter_map(|p| p.core.map(|c| (p.id, c)))
            .collect();
        for (province, player) in homes {
            board.set_owner(province, Some(player));
        }

        for u in &def.units {
            let player = board
                .player_by_name(&u.player)
                .ok_or_else(|| MapError::UnknownPlayer(u.player.clone()))?;
            let text = match &u.coast {
                Some(c) => format!("{}/{}", u.province, c),
                None => u.province.clone(),
            };
            let location = board.location(&text)?;
            board.place_unit(player, u.unit_type, location)?;
        }

        debug!(
            map = %board.name,
            provinces = board.provinces.len(),
            players = board.players.len(),
            units = board.units.len(),
            "board built from map"
        );
        Ok(board)
    }

    /// The standard map at Spring 1901 with the usual 22 starting units.
    pub fn standard() -> Result<Board, MapError> {
        Board::from_map(&MapDef::standard()?)
    }

    /// The standard map with home centers owned and cored but no units.
    pub fn empty_standard() -> Result<Board, MapError> {
        let mut def = MapDef::standard()?;
        def.units.clear();
        Board::from_map(&def)
    }
}

/// Rejects maps whose adjacency is not symmetric or whose coasts border
/// seas the province does not touch.
fn check_geography(provinces: &[Province]) -> Result<(), MapError> {
    for p in provinces {
        for &a in &p.adjacent {
            if !provinces[a.index()].adjacent.contains(&p.id) {
                return Err(MapError::Asymmetric(
                    p.abbr.clone(),
                    provinces[a.index()].abbr.clone(),
                ));
            }
        }
        for c in &p.coasts {
            for &s in &c.adjacent_seas {
                if !p.adjacent.contains(&s) || !provinces[s.index()].is_sea() {
                    return Err(MapError::BadCoast(
                        p.abbr.clone(),
                        provinces[s.index()].abbr.clone(),
                    ));
                }
            }
        }
    }
    Ok(())
}
