//! Province and coast definitions.
//!
//! Provinces live in an arena on the [`Board`](super::Board) and are addressed
//! by [`ProvinceId`]. Split-coast and coastal land provinces carry one or more
//! [`Coast`]s that fleets occupy; islands and seas carry none.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::player::PlayerId;
use super::unit::UnitId;

/// Index of a province in the board arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProvinceId(pub u16);

impl ProvinceId {
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for ProvinceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A coast of a province, addressed by the owning province and the coast's
/// position in [`Province::coasts`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CoastId {
    pub province: ProvinceId,
    pub index: u8,
}

/// Where a unit stands or where an order points.
///
/// Armies always stand on a `Province`. Fleets stand on a `Coast` when the
/// province is land, and on the `Province` itself for seas and islands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Location {
    Province(ProvinceId),
    Coast(CoastId),
}

impl Location {
    /// The province this location belongs to.
    #[inline]
    pub const fn province(self) -> ProvinceId {
        match self {
            Location::Province(p) => p,
            Location::Coast(c) => c.province,
        }
    }

    /// Returns the coast, if this location names one.
    pub const fn coast(self) -> Option<CoastId> {
        match self {
            Location::Province(_) => None,
            Location::Coast(c) => Some(c),
        }
    }
}

impl From<ProvinceId> for Location {
    fn from(p: ProvinceId) -> Self {
        Location::Province(p)
    }
}

impl From<CoastId> for Location {
    fn from(c: CoastId) -> Self {
        Location::Coast(c)
    }
}

/// Terrain class of a province.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProvinceKind {
    Land,
    Island,
    Sea,
}

/// A fleet-accessible coast of a land province.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Coast {
    /// Short name: `c` for a single coast, `nc`/`sc`/`ec` for split coasts.
    pub name: String,
    /// Sea provinces a fleet on this coast borders.
    pub adjacent_seas: BTreeSet<ProvinceId>,
}

/// A province together with its mutable game state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Province {
    pub id: ProvinceId,
    pub name: String,
    pub abbr: String,
    pub kind: ProvinceKind,
    pub adjacent: BTreeSet<ProvinceId>,
    #[serde(default)]
    pub coasts: Vec<Coast>,
    pub supply_center: bool,
    #[serde(default)]
    pub owner: Option<PlayerId>,
    #[serde(default)]
    pub core: Option<PlayerId>,
    /// Progress toward a core: one successful Core order so far.
    #[serde(default)]
    pub half_core: Option<PlayerId>,
    #[serde(default)]
    pub unit: Option<UnitId>,
    #[serde(default)]
    pub dislodged_unit: Option<UnitId>,
}

impl Province {
    #[inline]
    pub fn is_sea(&self) -> bool {
        self.kind == ProvinceKind::Sea
    }

    #[inline]
    pub fn is_island(&self) -> bool {
        self.kind == ProvinceKind::Island
    }

    /// True if a fleet could stand here at all.
    pub fn is_fleet_accessible(&self) -> bool {
        self.kind != ProvinceKind::Land || !self.coasts.is_empty()
    }

    /// True if the province has more than one named coast (Spain, Bulgaria, ...).
    pub fn has_split_coasts(&self) -> bool {
        self.coasts.len() > 1
    }

    pub fn coast_id(&self, index: usize) -> Option<CoastId> {
        (index < self.coasts.len()).then(|| CoastId {
            province: self.id,
            index: index as u8,
        })
    }

    /// Iterates over every coast of this province.
    pub fn coast_ids(&self) -> impl Iterator<Item = CoastId> + '_ {
        (0..self.coasts.len()).map(move |i| CoastId {
            province: self.id,
            index: i as u8,
        })
    }

    /// Finds a coast by its short name.
    pub fn coast_by_name(&self, name: &str) -> Option<CoastId> {
        self.coasts
            .iter()
            .position(|c| c.name.eq_ignore_ascii_case(name))
            .and_then(|i| self.coast_id(i))
    }
}
