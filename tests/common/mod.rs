//! Scenario builder shared by the integration tests.
//!
//! Units are placed on an empty standard board by player name and location
//! text (`"spa/nc"`), ordered by unit id, and then run through one phase at a
//! time.

#![allow(dead_code)]

use chancery::adjudicator::{
    BuildsAdjudicator, BuildsReport, MovesAdjudicator, MovesReport, RetreatsAdjudicator,
    RetreatsReport,
};
use chancery::board::{
    Board, Location, Order, Phase, PlayerId, PlayerOrder, ProvinceId, RelationshipOrder, UnitId,
    UnitType,
};

pub struct Scenario {
    pub board: Board,
}

impl Scenario {
    /// Spring moves on the standard map, home centers owned, no units.
    pub fn new() -> Self {
        Scenario {
            board: Board::empty_standard().expect("standard map loads"),
        }
    }

    pub fn in_phase(phase: Phase) -> Self {
        let mut s = Self::new();
        s.board.phase = phase;
        s
    }

    pub fn player(&self, name: &str) -> PlayerId {
        self.board
            .player_by_name(name)
            .unwrap_or_else(|| panic!("no player {name}"))
    }

    pub fn loc(&self, text: &str) -> Location {
        self.board
            .location(text)
            .unwrap_or_else(|e| panic!("bad location {text}: {e}"))
    }

    pub fn prov(&self, text: &str) -> ProvinceId {
        self.loc(text).province()
    }

    fn place(&mut self, player: &str, unit_type: UnitType, at: &str) -> UnitId {
        let (p, l) = (self.player(player), self.loc(at));
        self.board
            .place_unit(p, unit_type, l)
            .unwrap_or_else(|e| panic!("cannot place at {at}: {e}"))
    }

    pub fn army(&mut self, player: &str, at: &str) -> UnitId {
        self.place(player, UnitType::Army, at)
    }

    pub fn fleet(&mut self, player: &str, at: &str) -> UnitId {
        self.place(player, UnitType::Fleet, at)
    }

    pub fn order(&mut self, unit: UnitId, order: Order) {
        assert!(self.board.set_order(unit, order), "no {unit}");
    }

    pub fn hold(&mut self, unit: UnitId) {
        self.order(unit, Order::Hold);
    }

    pub fn core(&mut self, unit: UnitId) {
        self.order(unit, Order::Core);
    }

    pub fn mv(&mut self, unit: UnitId, to: &str) {
        let destination = self.loc(to);
        self.order(unit, Order::Move { destination });
    }

    pub fn via_convoy(&mut self, unit: UnitId, to: &str) {
        let destination = self.loc(to);
        self.order(unit, Order::ConvoyMove { destination });
    }

    pub fn support_hold(&mut self, unit: UnitId, at: &str) {
        let at = self.loc(at);
        self.order(
            unit,
            Order::Support {
                source: at,
                destination: at,
            },
        );
    }

    pub fn support_move(&mut self, unit: UnitId, from: &str, to: &str) {
        let (source, destination) = (self.loc(from), self.loc(to));
        self.order(
            unit,
            Order::Support {
                source,
                destination,
            },
        );
    }

    pub fn convoy(&mut self, unit: UnitId, from: &str, to: &str) {
        let (source, destination) = (self.loc(from), self.loc(to));
        self.order(
            unit,
            Order::ConvoyTransport {
                source,
                destination,
            },
        );
    }

    pub fn retreat(&mut self, unit: UnitId, to: &str) {
        let destination = self.loc(to);
        self.order(unit, Order::RetreatMove { destination });
    }

    pub fn build(&mut self, player: &str, unit_type: UnitType, at: &str) {
        let location = self.loc(at);
        self.player_order(player, PlayerOrder::Build {
            location,
            unit_type,
        });
    }

    pub fn disband(&mut self, player: &str, at: &str) {
        let location = self.loc(at);
        self.player_order(player, PlayerOrder::Disband { location });
    }

    pub fn player_order(&mut self, player: &str, order: PlayerOrder) {
        let id = self.player(player);
        self.board.player_mut(id).build_orders.push(order);
    }

    pub fn offer(&mut self, from: &str, to: &str, order: RelationshipOrder) {
        let (from, to) = (self.player(from), self.player(to));
        self.board
            .player_mut(from)
            .relationship_orders
            .push((to, order));
    }

    /// Hands the listed supply centers to `player`.
    pub fn give(&mut self, player: &str, centers: &[&str]) {
        let id = self.player(player);
        for c in centers {
            let p = self.prov(c);
            self.board.set_owner(p, Some(id));
        }
    }

    pub fn moves(&mut self) -> MovesReport {
        MovesAdjudicator::new(&mut self.board)
            .expect("moves phase")
            .run()
    }

    pub fn retreats(&mut self) -> RetreatsReport {
        RetreatsAdjudicator::new(&mut self.board)
            .expect("retreats phase")
            .run()
    }

    pub fn builds(&mut self) -> BuildsReport {
        BuildsAdjudicator::new(&mut self.board)
            .expect("builds phase")
            .run()
    }

    /// True if `unit` is the non-dislodged unit standing in `at`.
    pub fn is_at(&self, unit: UnitId, at: &str) -> bool {
        self.board.unit_at(self.prov(at)).map(|u| u.id) == Some(unit)
    }

    pub fn location_of(&self, unit: UnitId) -> Location {
        self.board
            .unit(unit)
            .unwrap_or_else(|| panic!("{unit} was removed"))
            .location
    }

    pub fn is_removed(&self, unit: UnitId) -> bool {
        self.board.unit(unit).is_none()
    }

    pub fn retreat_options(&self, unit: UnitId) -> Vec<ProvinceId> {
        self.board
            .unit(unit)
            .and_then(|u| u.retreat_options.as_ref())
            .map(|o| o.iter().copied().collect())
            .unwrap_or_default()
    }
}

pub fn assert_succeeds(report: &MovesReport, units: &[UnitId]) {
    for &u in units {
        assert!(
            report.succeeded(u),
            "{u} should succeed, got {:?}",
            report.resolution(u)
        );
    }
}

pub fn assert_fails(report: &MovesReport, units: &[UnitId]) {
    for &u in units {
        assert!(
            !report.succeeded(u),
            "{u} should fail, got {:?}",
            report.resolution(u)
        );
    }
}

pub fn assert_illegal(report: &MovesReport, units: &[UnitId]) {
    for &u in units {
        assert!(report.is_invalid(u), "{u} should be rejected");
    }
}

pub fn assert_dislodged(report: &MovesReport, units: &[UnitId]) {
    for &u in units {
        assert!(report.is_dislodged(u), "{u} should be dislodged");
    }
}

pub fn assert_not_dislodged(report: &MovesReport, units: &[UnitId]) {
    for &u in units {
        assert!(!report.is_dislodged(u), "{u} should not be dislodged");
    }
}
