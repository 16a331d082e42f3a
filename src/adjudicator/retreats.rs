//! Retreat-phase adjudication.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;
use tracing::{debug, info};

use super::validity::{validate_unit, InvalidOrder};
use super::{expect_phase, AdjudicationError};
use crate::board::{Board, Location, Order, PhaseKind, ProvinceId, UnitId};

/// What a retreat phase did.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct RetreatsReport {
    pub retreated: BTreeMap<UnitId, Location>,
    pub disbanded: BTreeSet<UnitId>,
    /// Retreat orders that were rejected; the unit was disbanded.
    pub invalid: BTreeMap<UnitId, InvalidOrder>,
}

/// Adjudicates a retreat phase. Only dislodged units take part; orders given
/// to any other unit are ignored.
#[derive(Debug)]
pub struct RetreatsAdjudicator<'a> {
    board: &'a mut Board,
}

impl<'a> RetreatsAdjudicator<'a> {
    pub fn new(board: &'a mut Board) -> Result<Self, AdjudicationError> {
        expect_phase(board, PhaseKind::Retreats)?;
        Ok(RetreatsAdjudicator { board })
    }

    pub fn run(self) -> RetreatsReport {
        let board = self.board;
        let mut report = RetreatsReport::default();

        let dislodged: Vec<UnitId> = board
            .provinces
            .iter()
            .filter_map(|p| p.dislodged_unit)
            .collect();

        let mut wanted: BTreeMap<ProvinceId, Vec<(UnitId, Location)>> = BTreeMap::new();
        for &id in &dislodged {
            let Some(unit) = board.unit(id) else {
                continue;
            };
            let target = match unit.order {
                Some(order @ Order::RetreatMove { destination }) => {
                    let allowed = unit
                        .retreat_options
                        .as_ref()
                        .is_some_and(|o| o.contains(&destination.province()));
                    match validate_unit(board, unit, &order, true) {
                        Err(e) => Err(e),
                        Ok(()) if !allowed => Err(InvalidOrder::Unreachable),
                        Ok(()) => board
                            .normalize_location(unit.unit_type, destination)
                            .map_err(|_| InvalidOrder::Unreachable),
                    }
                }
                Some(Order::RetreatDisband) | None | Some(Order::Nmr) => {
                    report.disbanded.insert(id);
                    continue;
                }
                Some(_) => Err(InvalidOrder::OutOfPhase),
            };
            match target {
                Ok(location) => wanted
                    .entry(location.province())
                    .or_default()
                    .push((id, location)),
                Err(reason) => {
                    debug!(unit = id.0, %reason, "retreat rejected");
                    report.invalid.insert(id, reason);
                    report.disbanded.insert(id);
                }
            }
        }

        for (province, claimants) in wanted {
            if claimants.len() > 1 {
                debug!(province = province.0, count = claimants.len(), "retreat standoff");
                report.disbanded.extend(claimants.iter().map(|&(id, _)| id));
                continue;
            }
            let (id, location) = claimants[0];
            board.lift_unit(id);
            board.land_unit(id, location);
            report.retreated.insert(id, location);
            if board.phase.captures_centers() && board.province(province).supply_center {
                let player = board.unit(id).map(|u| u.player);
                board.set_owner(province, player);
            }
        }

        for &id in &report.disbanded {
            board.remove_unit(id);
        }
        for unit in board.units.iter_mut().flatten() {
            unit.retreat_options = None;
        }

        info!(
            phase = %board.phase,
            year = board.year,
            retreated = report.retreated.len(),
            disbanded = report.disbanded.len(),
            "retreats adjudicated"
        );

        board.clear_orders();
        board.advance_phase();
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{Phase, UnitType};

    struct Game {
        board: Board,
    }

    impl Game {
        fn new(phase: Phase) -> Self {
            let mut board = Board::empty_standard().unwrap();
            board.phase = phase;
            Game { board }
        }

        fn loc(&self, s: &str) -> Location {
            self.board.location(s).unwrap()
        }

        fn p(&self, s: &str) -> ProvinceId {
            self.loc(s).province()
        }

        /// Places a unit and dislodges it with the given retreat options.
        fn dislodged(&mut self, player: &str, unit_type: UnitType, at: &str, options: &[&str]) -> UnitId {
            let player = self.board.player_by_name(player).unwrap();
            let loc = self.loc(at);
            let id = self.board.place_unit(player, unit_type, loc).unwrap();
            self.board.dislodge_occupant(loc.province());
            let options = options.iter().map(|s| self.p(s)).collect();
            self.board.unit_mut(id).unwrap().retreat_options = Some(options);
            id
        }

        fn retreat(&mut self, id: UnitId, to: &str) {
            let destination = self.loc(to);
            self.board.set_order(id, Order::RetreatMove { destination });
        }

        fn run(&mut self) -> RetreatsReport {
            RetreatsAdjudicator::new(&mut self.board).unwrap().run()
        }
    }

    #[test]
    fn single_retreat_succeeds() {
        let mut g = Game::new(Phase::SpringRetreats);
        let a = g.dislodged("Austria", UnitType::Army, "tyr", &["ven", "vie"]);
        g.retreat(a, "ven");
        let report = g.run();
        assert_eq!(report.retreated.get(&a), Some(&g.loc("ven")));
        assert_eq!(g.board.unit_at(g.p("ven")).map(|u| u.id), Some(a));
        assert!(g.board.dislodged_at(g.p("tyr")).is_none());
        assert!(g.board.unit(a).unwrap().retreat_options.is_none());
        assert_eq!(g.board.phase, Phase::FallMoves);
    }

    #[test]
    fn retreat_outside_options_disbands() {
        let mut g = Game::new(Phase::SpringRetreats);
        let a = g.dislodged("Austria", UnitType::Army, "tyr", &["vie"]);
        g.retreat(a, "ven");
        let report = g.run();
        assert!(report.disbanded.contains(&a));
        assert!(g.board.unit(a).is_none());
    }

    #[test]
    fn missing_order_disbands() {
        let mut g = Game::new(Phase::SpringRetreats);
        let a = g.dislodged("Austria", UnitType::Army, "tyr", &["vie"]);
        let report = g.run();
        assert!(report.disbanded.contains(&a));
        assert!(report.invalid.is_empty());
    }

    #[test]
    fn standoff_disbands_both() {
        let mut g = Game::new(Phase::SpringRetreats);
        let a = g.dislodged("Austria", UnitType::Army, "tyr", &["boh"]);
        let b = g.dislodged("Germany", UnitType::Army, "mun", &["boh"]);
        g.retreat(a, "boh");
        g.retreat(b, "boh");
        let report = g.run();
        assert!(report.disbanded.contains(&a) && report.disbanded.contains(&b));
        assert!(g.board.unit_at(g.p("boh")).is_none());
    }

    #[test]
    fn support_orders_are_out_of_phase() {
        let mut g = Game::new(Phase::SpringRetreats);
        let a = g.dislodged("Austria", UnitType::Army, "tyr", &["vie"]);
        let vie = g.loc("vie");
        g.board.set_order(
            a,
            Order::Support {
                source: vie,
                destination: vie,
            },
        );
        let report = g.run();
        assert_eq!(report.invalid.get(&a), Some(&InvalidOrder::OutOfPhase));
        assert!(report.disbanded.contains(&a));
    }

    #[test]
    fn fall_retreat_captures_center() {
        let mut g = Game::new(Phase::FallRetreats);
        let a = g.dislodged("Austria", UnitType::Army, "tri", &["ser"]);
        g.retreat(a, "ser");
        g.run();
        let aus = g.board.player_by_name("Austria").unwrap();
        assert_eq!(g.board.province(g.p("ser")).owner, Some(aus));
        assert_eq!(g.board.phase, Phase::WinterBuilds);
    }

    #[test]
    fn fleet_retreat_keeps_coast() {
        let mut g = Game::new(Phase::SpringRetreats);
        let f = g.dislodged("France", UnitType::Fleet, "mao", &["spa", "por"]);
        g.retreat(f, "spa/nc");
        g.run();
        assert_eq!(g.board.unit(f).unwrap().location, g.loc("spa/nc"));
    }
}
