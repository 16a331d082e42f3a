//! Order-validity checking.
//!
//! [`validate`] decides whether an order is legal for the unit it was given
//! to. It is a pure function of the board: geography, the positions of other
//! units and, in strict mode, the orders those units were given.
//!
//! Strict mode additionally requires supports and convoys to match what the
//! referenced unit was actually ordered to do. The moves adjudicator validates
//! strictly; the loose mode answers "could this ever work" and drives the
//! reinterpretation of army moves as convoyed moves.

use serde::{Deserialize, Serialize};

use super::convoy::convoy_is_possible;
use crate::board::{unit_can_reach, Board, Location, Order, ProvinceId, Unit, UnitType};

/// Why an order was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, thiserror::Error)]
#[serde(rename_all = "snake_case")]
pub enum InvalidOrder {
    #[error("no unit at the ordered location")]
    NoUnit,

    #[error("order cannot be given in this phase")]
    OutOfPhase,

    #[error("province is not a supply center")]
    NotSupplyCenter,

    #[error("supply center is not owned by the ordering player")]
    NotOwned,

    #[error("destination is the unit's own province")]
    SameProvince,

    #[error("destination cannot be reached")]
    Unreachable,

    #[error("destination is occupied")]
    Occupied,

    #[error("only armies can be convoyed")]
    NotAnArmy,

    #[error("only fleets can convoy")]
    NotAFleet,

    #[error("a convoying fleet must be at sea")]
    FleetNotAtSea,

    #[error("an army cannot be convoyed into a sea province")]
    SeaDestination,

    #[error("no convoy route exists")]
    NoConvoyRoute,

    #[error("the convoyed army was not ordered to make this move")]
    ConvoyMismatch,

    #[error("no unit to support")]
    NothingToSupport,

    #[error("a unit cannot support itself")]
    SupportSelf,

    #[error("the supported unit was not ordered to do this")]
    SupportMismatch,

    #[error("supply center is not a core of the ordering player")]
    NotCored,

    #[error("a fleet needs a coast to stand on")]
    NoFleetCoast,

    #[error("unit belongs to another player")]
    NotOwnUnit,

    #[error("no builds or disbands left to use")]
    NoAdjustmentLeft,
}

/// How an ordered move would travel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveRoute {
    /// The unit can reach the destination on its own.
    Direct,
    /// Fleets ordered to carry exactly this move form a route.
    Convoyed,
    /// A route exists through fleets that were not ordered to carry it.
    Unordered,
    /// No way to get there.
    Illegal,
}

/// Validates the order given to the unit in `province`.
///
/// Retreat orders address the dislodged unit of the province, everything
/// else the standing unit.
pub fn validate(
    board: &Board,
    province: ProvinceId,
    order: &Order,
    strict: bool,
) -> Result<(), InvalidOrder> {
    let unit = if order.is_retreat() {
        board
            .dislodged_at(province)
            .or_else(|| board.unit_at(province))
    } else {
        board.unit_at(province)
    };
    let unit = unit.ok_or(InvalidOrder::NoUnit)?;
    validate_unit(board, unit, order, strict)
}

/// Validates `order` as if it had been given to `unit`.
pub fn validate_unit(
    board: &Board,
    unit: &Unit,
    order: &Order,
    strict: bool,
) -> Result<(), InvalidOrder> {
    match *order {
        Order::Hold | Order::Nmr | Order::RetreatDisband => Ok(()),
        Order::Core => {
            let prov = board.province(unit.province());
            if !prov.supply_center {
                return Err(InvalidOrder::NotSupplyCenter);
            }
            if prov.owner != Some(unit.player) {
                return Err(InvalidOrder::NotOwned);
            }
            Ok(())
        }
        Order::Move { destination } => check_move(board, unit, destination, true),
        Order::RetreatMove { destination } => {
            check_move(board, unit, destination, true)?;
            if board.unit_at(destination.province()).is_some() {
                return Err(InvalidOrder::Occupied);
            }
            Ok(())
        }
        Order::ConvoyMove { destination } => {
            let (src, dst) = (unit.province(), destination.province());
            check_convoyable(board, unit, src, dst)?;
            if !convoy_is_possible(board, src, dst, strict) {
                return Err(InvalidOrder::NoConvoyRoute);
            }
            Ok(())
        }
        Order::ConvoyTransport {
            source,
            destination,
        } => {
            if unit.unit_type != UnitType::Fleet {
                return Err(InvalidOrder::NotAFleet);
            }
            if !board.province(unit.province()).is_sea() {
                return Err(InvalidOrder::FleetNotAtSea);
            }
            let (src, dst) = (source.province(), destination.province());
            let army = board.unit_at(src).ok_or(InvalidOrder::NotAnArmy)?;
            check_convoyable(board, army, src, dst)?;
            if strict {
                let ordered_there = matches!(
                    army.order,
                    Some(Order::Move { destination: d }) | Some(Order::ConvoyMove { destination: d })
                        if d.province() == dst
                );
                if !ordered_there {
                    return Err(InvalidOrder::ConvoyMismatch);
                }
            }
            if !convoy_is_possible(board, src, dst, strict) {
                return Err(InvalidOrder::NoConvoyRoute);
            }
            Ok(())
        }
        Order::Support {
            source,
            destination,
        } => {
            let supported = board
                .unit_at(source.province())
                .ok_or(InvalidOrder::NothingToSupport)?;
            if supported.id == unit.id {
                return Err(InvalidOrder::SupportSelf);
            }
            let (src, dst) = (source.province(), destination.province());
            // Any coast of the target province will do for the supporter.
            if !unit_can_reach(board, unit, Location::Province(dst), false) {
                return Err(InvalidOrder::Unreachable);
            }
            if src != dst {
                let by_itself = unit_can_reach(board, supported, destination, false);
                let by_sea = supported.is_army()
                    && !board.province(dst).is_sea()
                    && convoy_is_possible(board, src, dst, false);
                if !by_itself && !by_sea {
                    return Err(InvalidOrder::Unreachable);
                }
            }
            if strict && intended_province(board, supported) != dst {
                return Err(InvalidOrder::SupportMismatch);
            }
            Ok(())
        }
    }
}

fn check_move(
    board: &Board,
    unit: &Unit,
    destination: Location,
    strict_coast: bool,
) -> Result<(), InvalidOrder> {
    if destination.province() == unit.province() {
        return Err(InvalidOrder::SameProvince);
    }
    if !unit_can_reach(board, unit, destination, strict_coast) {
        return Err(InvalidOrder::Unreachable);
    }
    Ok(())
}

fn check_convoyable(
    board: &Board,
    army: &Unit,
    src: ProvinceId,
    dst: ProvinceId,
) -> Result<(), InvalidOrder> {
    if army.unit_type != UnitType::Army {
        return Err(InvalidOrder::NotAnArmy);
    }
    if src == dst {
        return Err(InvalidOrder::SameProvince);
    }
    if board.province(dst).is_sea() {
        return Err(InvalidOrder::SeaDestination);
    }
    Ok(())
}

/// Decides how a `Move` order would travel. Fleets only move directly;
/// armies fall back to a convoy route, first one ordered for this move and
/// then any route at all.
pub fn classify_move(board: &Board, unit: &Unit, destination: Location) -> MoveRoute {
    if check_move(board, unit, destination, true).is_ok() {
        return MoveRoute::Direct;
    }
    let (src, dst) = (unit.province(), destination.province());
    if unit.is_fleet() || check_convoyable(board, unit, src, dst).is_err() {
        return MoveRoute::Illegal;
    }
    if convoy_is_possible(board, src, dst, true) {
        MoveRoute::Convoyed
    } else if convoy_is_possible(board, src, dst, false) {
        MoveRoute::Unordered
    } else {
        MoveRoute::Illegal
    }
}

/// The province a unit will try to occupy at the end of the turn: the
/// destination of a move that can actually be made, or its own province.
pub fn intended_province(board: &Board, unit: &Unit) -> ProvinceId {
    match unit.order {
        Some(Order::Move { destination }) => match classify_move(board, unit, destination) {
            MoveRoute::Direct | MoveRoute::Convoyed => destination.province(),
            MoveRoute::Unordered | MoveRoute::Illegal => unit.province(),
        },
        Some(order @ Order::ConvoyMove { destination }) => {
            if validate_unit(board, unit, &order, true).is_ok() {
                destination.province()
            } else {
                unit.province()
            }
        }
        _ => unit.province(),
    }
}
