//! Unit types and ownership.
//!
//! Represents armies and fleets, their owning player, their current
//! location and the order assigned to them for the current phase.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::order::Order;
use super::player::PlayerId;
use super::province::{Location, ProvinceId};

/// Index of a unit in the board arena. Ids are never reused within a game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UnitId(pub u32);

impl UnitId {
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for UnitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unit {}", self.0)
    }
}

/// The type of a military unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitType {
    Army,
    Fleet,
}

impl UnitType {
    /// Returns the uppercase abbreviation used in order notation.
    pub const fn short(self) -> char {
        match self {
            UnitType::Army => 'A',
            UnitType::Fleet => 'F',
        }
    }
}

/// A military unit on the board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Unit {
    pub id: UnitId,
    pub unit_type: UnitType,
    pub player: PlayerId,
    pub location: Location,
    /// The order for the current phase, if one was given.
    #[serde(default)]
    pub order: Option<Order>,
    /// Legal retreat targets. `None` unless the unit is dislodged; an empty set
    /// means the unit is dislodged and must disband.
    #[serde(default)]
    pub retreat_options: Option<BTreeSet<ProvinceId>>,
}

impl Unit {
    #[inline]
    pub fn province(&self) -> ProvinceId {
        self.location.province()
    }

    #[inline]
    pub fn is_army(&self) -> bool {
        self.unit_type == UnitType::Army
    }

    #[inline]
    pub fn is_fleet(&self) -> bool {
        self.unit_type == UnitType::Fleet
    }

    /// True while the unit awaits a retreat decision.
    pub fn is_dislodged(&self) -> bool {
        self.retreat_options.is_some()
    }
}
