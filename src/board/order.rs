//! Order types for all phases.
//!
//! Unit orders reference other units by *location*, never by id, so that the
//! referenced unit is looked up again at adjudication time. Build-phase and
//! diplomatic orders belong to players rather than units.

use serde::{Deserialize, Serialize};

use super::province::Location;
use super::unit::UnitType;

/// An order given to a single unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Order {
    /// `A vie H`
    Hold,

    /// Claim the province the unit stands on as a core.
    Core,

    /// `A bud - rum`. An army move between non-adjacent provinces is
    /// reinterpreted as a convoyed move when a fleet chain allows it.
    Move { destination: Location },

    /// `A lon - bel VIA CONVOY`
    ConvoyMove { destination: Location },

    /// `F nth C A lon - bel`
    ConvoyTransport {
        source: Location,
        destination: Location,
    },

    /// `A gal S A bud - rum`, or a support to hold when the source and
    /// destination name the same province.
    Support {
        source: Location,
        destination: Location,
    },

    /// `A vie R boh`
    RetreatMove { destination: Location },

    /// `F tri D` during retreats.
    RetreatDisband,

    /// No order received; behaves as a hold.
    Nmr,
}

impl Order {
    /// Every location the order names.
    pub fn locations(&self) -> impl Iterator<Item = Location> {
        let (first, second) = match *self {
            Order::Move { destination }
            | Order::ConvoyMove { destination }
            | Order::RetreatMove { destination } => (Some(destination), None),
            Order::ConvoyTransport {
                source,
                destination,
            }
            | Order::Support {
                source,
                destination,
            } => (Some(source), Some(destination)),
            Order::Hold | Order::Core | Order::RetreatDisband | Order::Nmr => (None, None),
        };
        first.into_iter().chain(second)
    }

    /// The province-level destination of a moving order.
    pub fn destination(&self) -> Option<Location> {
        match *self {
            Order::Move { destination }
            | Order::ConvoyMove { destination }
            | Order::RetreatMove { destination } => Some(destination),
            _ => None,
        }
    }

    /// True for orders only meaningful in the retreats phase.
    pub fn is_retreat(&self) -> bool {
        matches!(self, Order::RetreatMove { .. } | Order::RetreatDisband)
    }

    pub fn is_support_hold(&self) -> bool {
        matches!(self, Order::Support { source, destination } if source.province() == destination.province())
    }
}

/// A build-phase order given by a player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PlayerOrder {
    /// `F stp/sc B`
    Build {
        location: Location,
        unit_type: UnitType,
    },
    /// `A war D`
    Disband { location: Location },
    /// Voluntarily skip one build.
    Waive,
}

/// A diplomatic order between two players, resolved during the builds phase
/// when the vassal system is enabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationshipOrder {
    /// Offer to become the target's vassal.
    Vassal,
    /// Offer to become the target's liege.
    Liege,
    /// Offer to share a dual monarchy with the target.
    DualMonarchy,
    /// A liege releases the target vassal.
    Disown,
    /// A vassal leaves the target liege.
    Defect,
    /// A vassal rises against the target liege.
    Rebellion,
}
