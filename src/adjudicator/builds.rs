//! Builds-phase adjudication.
//!
//! Each player may build as many units as they own supply centers beyond
//! their unit count, or must disband the difference. Orders are applied in
//! the order given; anything beyond the allowance is skipped.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;
use tracing::{debug, info, warn};

use super::validity::InvalidOrder;
use super::vassals::{resolve_relationships, VassalReport};
use super::{expect_phase, AdjudicationError};
use crate::board::{
    distance_to_any, Board, Location, PhaseKind, PlayerId, PlayerOrder, ProvinceId, UnitId,
    UnitType,
};

/// What a builds phase did.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct BuildsReport {
    pub built: BTreeMap<UnitId, Location>,
    pub disbanded: BTreeSet<UnitId>,
    /// Units removed because their player did not disband enough.
    pub civil_disorder: BTreeSet<UnitId>,
    /// Orders that were skipped, with the reason.
    pub failed: Vec<(PlayerId, PlayerOrder, InvalidOrder)>,
    /// Disbands still owed after orders and civil disorder.
    pub shortfall: BTreeMap<PlayerId, u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vassals: Option<VassalReport>,
}

/// Adjudicates a builds phase.
pub struct BuildsAdjudicator<'a> {
    board: &'a mut Board,
}

impl<'a> BuildsAdjudicator<'a> {
    pub fn new(board: &'a mut Board) -> Result<Self, AdjudicationError> {
        expect_phase(board, PhaseKind::Builds)?;
        Ok(BuildsAdjudicator { board })
    }

    pub fn run(self) -> BuildsReport {
        let board = self.board;
        let mut report = BuildsReport::default();

        let players: Vec<PlayerId> = board.player_ids().collect();
        for player in players {
            adjust_player(board, player, &mut report);
        }

        if board.rules.vassal_system {
            report.vassals = Some(resolve_relationships(board));
        }

        info!(
            year = board.year,
            built = report.built.len(),
            disbanded = report.disbanded.len() + report.civil_disorder.len(),
            skipped = report.failed.len(),
            "builds adjudicated"
        );

        board.clear_orders();
        board.advance_phase();
        report
    }
}

fn adjust_player(board: &mut Board, player: PlayerId, report: &mut BuildsReport) {
    let centers = board.player(player).center_count() as i64;
    let units = board.units_of(player).count() as i64;
    let orders = board.player(player).build_orders.clone();
    let mut available = centers - units;
    debug!(player = %board.player(player).name, available, "adjusting");

    for order in orders {
        let result = match order {
            PlayerOrder::Build {
                location,
                unit_type,
            } if available > 0 => build(board, player, location, unit_type).map(|id| {
                report.built.insert(id, board.unit(id).map_or(location, |u| u.location));
            }),
            PlayerOrder::Waive if available > 0 => Ok(()),
            PlayerOrder::Disband { location } if available < 0 => {
                disband(board, player, location).map(|id| {
                    report.disbanded.insert(id);
                })
            }
            _ => Err(InvalidOrder::NoAdjustmentLeft),
        };
        match result {
            Ok(()) if available > 0 => available -= 1,
            Ok(()) => available += 1,
            Err(reason) => {
                debug!(player = player.0, ?order, %reason, "adjustment skipped");
                report.failed.push((player, order, reason));
            }
        }
    }

    if available >= 0 {
        return;
    }
    let owed = available.unsigned_abs() as usize;
    if !board.rules.civil_disorder {
        warn!(
            player = %board.player(player).name,
            owed,
            "player did not disband enough units"
        );
        report.shortfall.insert(player, owed as u32);
        return;
    }
    for id in civil_disorder_order(board, player).into_iter().take(owed) {
        debug!(unit = id.0, "disbanded in civil disorder");
        board.remove_unit(id);
        report.civil_disorder.insert(id);
    }
}

/// Validates and places a build. Returns the new unit.
fn build(
    board: &mut Board,
    player: PlayerId,
    location: Location,
    unit_type: UnitType,
) -> Result<UnitId, InvalidOrder> {
    let prov = board.province(location.province());
    if !prov.supply_center {
        return Err(InvalidOrder::NotSupplyCenter);
    }
    if prov.owner != Some(player) {
        return Err(InvalidOrder::NotOwned);
    }
    if !board.rules.build_anywhere && prov.core != Some(player) {
        return Err(InvalidOrder::NotCored);
    }
    if prov.unit.is_some() {
        return Err(InvalidOrder::Occupied);
    }
    let location = board
        .normalize_location(unit_type, location)
        .map_err(|_| match unit_type {
            UnitType::Fleet => InvalidOrder::NoFleetCoast,
            UnitType::Army => InvalidOrder::SeaDestination,
        })?;
    board
        .place_unit(player, unit_type, location)
        .map_err(|_| InvalidOrder::Occupied)
}

fn disband(board: &mut Board, player: PlayerId, location: Location) -> Result<UnitId, InvalidOrder> {
    let unit = board
        .unit_at(location.province())
        .ok_or(InvalidOrder::NoUnit)?;
    if unit.player != player {
        return Err(InvalidOrder::NotOwnUnit);
    }
    let id = unit.id;
    board.remove_unit(id);
    Ok(id)
}

/// The player's units, farthest from any owned supply center first. Ties go
/// to the unit in the later province.
fn civil_disorder_order(board: &Board, player: PlayerId) -> Vec<UnitId> {
    let centers = &board.player(player).centers;
    let mut ranked: Vec<(u32, ProvinceId, UnitId)> = board
        .units_of(player)
        .map(|u| {
            let d = distance_to_any(board, u.province(), centers).unwrap_or(u32::MAX);
            (d, u.province(), u.id)
        })
        .collect();
    ranked.sort_by(|a, b| b.0.cmp(&a.0).then(b.1.cmp(&a.1)));
    ranked.into_iter().map(|(_, _, id)| id).collect()
}
