//! Movement-phase adjudication using Kruijswijk's guess-and-check algorithm.
//!
//! Every unit's order is wrapped in an [`AdjudicableOrder`]. Resolving an order
//! may require resolving others (supports, convoys, competing moves). When the
//! recursion comes back to an order that is already being resolved, the
//! current guess for that order is returned and the order is recorded as a
//! dependency. An order that turns out to depend on its own guess is
//! re-evaluated with the opposite guess; if both guesses are consistent the
//! result is the same either way, otherwise the backup rule decides:
//!
//! - a cycle containing a convoy is a convoy paradox and every convoy in it
//!   fails (Szykman rule);
//! - a cycle of moves only is circular movement and every move in it succeeds.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;
use tracing::{debug, info, warn};

use super::convoy::{convoy_is_possible, convoy_route};
use super::validity::{classify_move, validate_unit, InvalidOrder, MoveRoute};
use super::{expect_phase, AdjudicationError, Resolution};
use crate::board::{
    reachable_provinces, Board, Location, Order, PhaseKind, PlayerId, ProvinceId, Unit, UnitId,
    UnitType,
};

/// Classified order kind. Anything that does not move, support, convoy or
/// core is a hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OrderType {
    Hold,
    Core,
    Move,
    Support,
    Convoy,
}

/// Resolution state for the guess-and-check algorithm.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ResState {
    Unresolved,
    Guessing,
    Resolved,
}

/// Internal tracking for a single unit's order during adjudication.
#[derive(Debug, Clone, Copy)]
struct AdjudicableOrder {
    unit: UnitId,
    unit_type: UnitType,
    country: PlayerId,
    current: ProvinceId,
    /// Support and convoy: the province of the unit acted upon.
    source: ProvinceId,
    /// Move: target. Support and convoy: where the acted-upon unit goes.
    destination: ProvinceId,
    /// Where a successful mover ends up, coast included.
    landing: Location,
    order_type: OrderType,
    is_convoy: bool,
    /// The move could go by land; the convoy is only used while its route
    /// holds.
    land_fallback: bool,
    not_supportable: bool,
    valid: bool,
    resolution: Resolution,
    state: ResState,
}

impl AdjudicableOrder {
    fn new(unit: &Unit) -> Self {
        let here = unit.province();
        AdjudicableOrder {
            unit: unit.id,
            unit_type: unit.unit_type,
            country: unit.player,
            current: here,
            source: here,
            destination: here,
            landing: unit.location,
            order_type: OrderType::Hold,
            is_convoy: false,
            land_fallback: false,
            not_supportable: false,
            valid: true,
            resolution: Resolution::Fails,
            state: ResState::Unresolved,
        }
    }

    #[inline]
    fn is_move(&self) -> bool {
        self.valid && self.order_type == OrderType::Move
    }
}

/// Wraps a unit's raw order, validating it strictly. Returns the reason when
/// the order was rejected or reinterpreted.
fn classify(board: &Board, unit: &Unit) -> (AdjudicableOrder, Option<InvalidOrder>) {
    let raw = unit.order.unwrap_or(Order::Nmr);
    let mut o = AdjudicableOrder::new(unit);
    let check = validate_unit(board, unit, &raw, true);

    match raw {
        Order::Hold | Order::Nmr => {}
        Order::RetreatMove { .. } | Order::RetreatDisband => {
            o.valid = false;
            return (o, Some(InvalidOrder::OutOfPhase));
        }
        Order::Core => {
            o.order_type = OrderType::Core;
            if let Err(e) = check {
                o.valid = false;
                o.not_supportable = true;
                return (o, Some(e));
            }
        }
        Order::Move { destination } => {
            o.order_type = OrderType::Move;
            o.destination = destination.province();
            o.landing = landing(board, unit, destination);
            match classify_move(board, unit, destination) {
                MoveRoute::Direct => {}
                MoveRoute::Convoyed => o.is_convoy = true,
                MoveRoute::Unordered => {
                    // Fleets could carry the army but were not ordered to:
                    // the army stays put and cannot be supported in place.
                    o.order_type = OrderType::Hold;
                    o.destination = o.current;
                    o.landing = unit.location;
                    o.not_supportable = true;
                }
                MoveRoute::Illegal => {
                    // The unit holds in place; a support naming its own
                    // province as destination counts as a hold support.
                    o.valid = false;
                    return (o, Some(check.err().unwrap_or(InvalidOrder::Unreachable)));
                }
            }
        }
        Order::ConvoyMove { destination } => {
            o.order_type = OrderType::Move;
            o.destination = destination.province();
            o.landing = landing(board, unit, destination);
            if let Err(e) = check {
                o.valid = false;
                return (o, Some(e));
            }
            o.is_convoy = true;
        }
        Order::ConvoyTransport {
            source,
            destination,
        } => {
            o.order_type = OrderType::Convoy;
            o.source = source.province();
            o.destination = destination.province();
            if let Err(e) = check {
                o.valid = false;
                return (o, Some(e));
            }
        }
        Order::Support {
            source,
            destination,
        } => {
            o.order_type = OrderType::Support;
            o.source = source.province();
            o.destination = destination.province();
            if let Err(e) = check {
                o.valid = false;
                return (o, Some(e));
            }
        }
    }
    (o, None)
}

fn landing(board: &Board, unit: &Unit, destination: Location) -> Location {
    match unit.unit_type {
        UnitType::Army => Location::Province(destination.province()),
        UnitType::Fleet => board.fleet_location(destination).unwrap_or(destination),
    }
}

/// The resolution engine. Holds the board read-only; results are applied by
/// [`MovesAdjudicator`] once every order is resolved.
struct Resolver<'b> {
    board: &'b Board,
    adj_buf: Vec<AdjudicableOrder>,
    /// Order index of the unit standing in each province.
    lookup: Vec<Option<usize>>,
    /// Valid supports given to each order.
    supports: Vec<Vec<usize>>,
    /// Valid convoys ordered for each move.
    convoys: Vec<Vec<usize>>,
    /// Valid moves into each province.
    moves_to: Vec<Vec<usize>>,
    dependencies: Vec<usize>,
    invalid: BTreeMap<UnitId, InvalidOrder>,
    paradoxes: usize,
}

impl<'b> Resolver<'b> {
    fn new(board: &'b Board) -> Self {
        let provinces = board.provinces.len();
        let mut adj_buf = Vec::new();
        let mut lookup = vec![None; provinces];
        let mut invalid = BTreeMap::new();

        for prov in &board.provinces {
            let Some(unit) = prov.unit.and_then(|id| board.unit(id)) else {
                continue;
            };
            let (order, reason) = classify(board, unit);
            debug!(
                unit = unit.id.0,
                province = %prov.abbr,
                order_type = ?order.order_type,
                valid = order.valid,
                convoy = order.is_convoy,
                "classified order"
            );
            if let Some(reason) = reason {
                invalid.insert(unit.id, reason);
            }
            lookup[prov.id.index()] = Some(adj_buf.len());
            adj_buf.push(order);
        }

        let n = adj_buf.len();
        let mut resolver = Resolver {
            board,
            adj_buf,
            lookup,
            supports: vec![Vec::new(); n],
            convoys: vec![Vec::new(); n],
            moves_to: vec![Vec::new(); provinces],
            dependencies: Vec::new(),
            invalid,
            paradoxes: 0,
        };
        resolver.index_orders();
        resolver.detect_kidnapping();
        resolver
    }

    fn index_orders(&mut self) {
        for i in 0..self.adj_buf.len() {
            let o = self.adj_buf[i];
            if !o.valid {
                continue;
            }
            match o.order_type {
                OrderType::Support => {
                    if let Some(target) = self.lookup[o.source.index()] {
                        self.supports[target].push(i);
                    }
                }
                OrderType::Convoy => {
                    if let Some(target) = self.lookup[o.source.index()] {
                        self.convoys[target].push(i);
                    }
                }
                OrderType::Move => self.moves_to[o.destination.index()].push(i),
                OrderType::Hold | OrderType::Core => {}
            }
        }
    }

    /// An army that could walk but has convoys ordered for it, facing a unit
    /// moving the other way, travels by convoy when a route exists. That turns
    /// a would-be head-to-head battle into a swap.
    fn detect_kidnapping(&mut self) {
        for i in 0..self.adj_buf.len() {
            let o = self.adj_buf[i];
            if !o.is_move() || o.is_convoy || o.unit_type != UnitType::Army {
                continue;
            }
            if self.convoys[i].is_empty() {
                continue;
            }
            let Some(d) = self.lookup[o.destination.index()] else {
                continue;
            };
            let other = self.adj_buf[d];
            if other.is_move()
                && other.destination == o.current
                && convoy_is_possible(self.board, o.current, o.destination, true)
            {
                debug!(unit = o.unit.0, "move by land reinterpreted as convoy");
                self.adj_buf[i].is_convoy = true;
                self.adj_buf[i].land_fallback = true;
            }
        }
    }

    fn resolve_all(&mut self) {
        for i in 0..self.adj_buf.len() {
            self.resolve(i);
        }
    }

    fn resolve(&mut self, nr: usize) -> Resolution {
        match self.adj_buf[nr].state {
            ResState::Resolved => return self.adj_buf[nr].resolution,
            ResState::Guessing => {
                if !self.dependencies.contains(&nr) {
                    self.dependencies.push(nr);
                }
                return self.adj_buf[nr].resolution;
            }
            ResState::Unresolved => {}
        }

        if !self.adj_buf[nr].valid {
            self.adj_buf[nr].resolution = Resolution::Fails;
            self.adj_buf[nr].state = ResState::Resolved;
            return Resolution::Fails;
        }

        let old_count = self.dependencies.len();

        self.adj_buf[nr].resolution = Resolution::Fails;
        self.adj_buf[nr].state = ResState::Guessing;
        let first = self.adjudicate(nr);

        if self.dependencies.len() == old_count {
            // No guess was needed.
            if self.adj_buf[nr].state != ResState::Resolved {
                self.adj_buf[nr].resolution = first;
                self.adj_buf[nr].state = ResState::Resolved;
            }
            return first;
        }

        if self.dependencies[old_count] != nr {
            // Depends on some other order's guess; that order settles us.
            self.dependencies.push(nr);
            self.adj_buf[nr].resolution = first;
            return first;
        }

        // Depends on its own guess: try the other one.
        self.reset_dependencies(old_count);
        self.adj_buf[nr].resolution = Resolution::Succeeds;
        self.adj_buf[nr].state = ResState::Guessing;
        let second = self.adjudicate(nr);

        if first == second {
            self.reset_dependencies(old_count);
            self.adj_buf[nr].resolution = first;
            self.adj_buf[nr].state = ResState::Resolved;
            return first;
        }

        self.backup_rule(old_count);
        self.resolve(nr)
    }

    fn reset_dependencies(&mut self, from: usize) {
        for k in from..self.dependencies.len() {
            let d = self.dependencies[k];
            self.adj_buf[d].state = ResState::Unresolved;
        }
        self.dependencies.truncate(from);
    }

    fn backup_rule(&mut self, old_count: usize) {
        let cycle: Vec<usize> = self.dependencies.drain(old_count..).collect();
        self.paradoxes += 1;
        let convoy_paradox = cycle
            .iter()
            .any(|&d| self.adj_buf[d].order_type == OrderType::Convoy);
        let units: Vec<u32> = cycle.iter().map(|&d| self.adj_buf[d].unit.0).collect();

        if convoy_paradox {
            warn!(?units, "convoy paradox, applying Szykman rule");
            for &d in &cycle {
                let o = &mut self.adj_buf[d];
                if o.order_type == OrderType::Convoy {
                    o.resolution = Resolution::Fails;
                    o.state = ResState::Resolved;
                } else {
                    o.state = ResState::Unresolved;
                }
            }
        } else {
            warn!(?units, "circular movement, all moves in the cycle succeed");
            for &d in &cycle {
                let o = &mut self.adj_buf[d];
                if o.order_type == OrderType::Move {
                    o.resolution = Resolution::Succeeds;
                    o.state = ResState::Resolved;
                } else {
                    o.state = ResState::Unresolved;
                }
            }
        }
    }

    fn adjudicate(&mut self, nr: usize) -> Resolution {
        let o = self.adj_buf[nr];
        match o.order_type {
            OrderType::Hold => Resolution::Succeeds,
            OrderType::Core => {
                for k in 0..self.moves_to[o.current.index()].len() {
                    let m = self.moves_to[o.current.index()][k];
                    if self.attack_arrives(m) {
                        return Resolution::Fails;
                    }
                }
                Resolution::Succeeds
            }
            OrderType::Support => self.adjudicate_support(nr),
            OrderType::Convoy => {
                for k in 0..self.moves_to[o.current.index()].len() {
                    let m = self.moves_to[o.current.index()][k];
                    if self.resolve(m).succeeded() {
                        return Resolution::Fails;
                    }
                }
                Resolution::Succeeds
            }
            OrderType::Move => self.adjudicate_move(nr),
        }
    }

    /// A support is cut by any foreign attack that reaches it, except an
    /// attack from the province the support is directed at, which only cuts
    /// by dislodging.
    fn adjudicate_support(&mut self, nr: usize) -> Resolution {
        let o = self.adj_buf[nr];
        for k in 0..self.moves_to[o.current.index()].len() {
            let m = self.moves_to[o.current.index()][k];
            let attacker = self.adj_buf[m];
            if attacker.country == o.country || !self.attack_arrives(m) {
                continue;
            }
            if attacker.current == o.destination && o.source != o.destination {
                if self.resolve(m).succeeded() {
                    return Resolution::Fails;
                }
                continue;
            }
            return Resolution::Fails;
        }
        Resolution::Succeeds
    }

    fn adjudicate_move(&mut self, nr: usize) -> Resolution {
        let o = self.adj_buf[nr];
        if o.is_convoy && !o.land_fallback && !self.route_intact(nr) {
            return Resolution::Fails;
        }
        let convoyed = self.by_convoy(nr);

        let attack = match self.lookup[o.destination.index()] {
            None => 1 + self.support_count(nr, None),
            Some(d) => {
                let defender = self.adj_buf[d];
                let head_to_head = defender.is_move()
                    && defender.destination == o.current
                    && !convoyed
                    && !self.by_convoy(d);

                if head_to_head {
                    if defender.country == o.country {
                        return Resolution::Fails;
                    }
                    let attack = 1 + self.support_count(nr, Some(defender.country));
                    let defend = 1 + self.support_count(d, None);
                    if attack <= defend {
                        return Resolution::Fails;
                    }
                    attack
                } else if defender.is_move() && self.resolve(d).succeeded() {
                    1 + self.support_count(nr, None)
                } else {
                    if defender.country == o.country {
                        return Resolution::Fails;
                    }
                    let attack = 1 + self.support_count(nr, Some(defender.country));
                    let hold = if defender.is_move() || defender.not_supportable {
                        1
                    } else {
                        1 + self.support_count(d, None)
                    };
                    if attack <= hold {
                        return Resolution::Fails;
                    }
                    attack
                }
            }
        };

        for k in 0..self.moves_to[o.destination.index()].len() {
            let other = self.moves_to[o.destination.index()][k];
            if other == nr {
                continue;
            }
            if attack <= self.prevent_strength(other) {
                return Resolution::Fails;
            }
        }
        Resolution::Succeeds
    }

    /// Successful supports for an order, ignoring supports given by
    /// `exclude`.
    fn support_count(&mut self, nr: usize, exclude: Option<PlayerId>) -> u32 {
        let mut count = 0;
        for k in 0..self.supports[nr].len() {
            let s = self.supports[nr][k];
            if Some(self.adj_buf[s].country) == exclude {
                continue;
            }
            if self.resolve(s).succeeded() {
                count += 1;
            }
        }
        count
    }

    fn prevent_strength(&mut self, nr: usize) -> u32 {
        let o = self.adj_buf[nr];
        if o.is_convoy && !o.land_fallback && !self.route_intact(nr) {
            return 0;
        }
        if let Some(d) = self.lookup[o.destination.index()] {
            let defender = self.adj_buf[d];
            if defender.is_move()
                && defender.destination == o.current
                && !self.by_convoy(nr)
                && !self.by_convoy(d)
                && self.resolve(d).succeeded()
            {
                return 0;
            }
        }
        1 + self.support_count(nr, None)
    }

    /// True if the move actually travels by sea.
    fn by_convoy(&mut self, nr: usize) -> bool {
        let o = self.adj_buf[nr];
        o.is_convoy && (!o.land_fallback || self.route_intact(nr))
    }

    /// True if the move reaches its destination at all: by land, or over a
    /// convoy route that holds.
    fn attack_arrives(&mut self, nr: usize) -> bool {
        let o = self.adj_buf[nr];
        !o.is_convoy || o.land_fallback || self.route_intact(nr)
    }

    /// True if a chain of successful convoy orders still carries the move.
    fn route_intact(&mut self, nr: usize) -> bool {
        let o = self.adj_buf[nr];
        let board = self.board;
        convoy_route(board, o.current, o.destination, |sea| {
            for k in 0..self.convoys[nr].len() {
                let c = self.convoys[nr][k];
                if self.adj_buf[c].current == sea {
                    return self.resolve(c).succeeded();
                }
            }
            false
        })
    }
}

/// What a movement phase did.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct MovesReport {
    pub resolutions: BTreeMap<UnitId, Resolution>,
    /// Units whose order failed or was rejected.
    pub failed_or_invalid_units: BTreeSet<UnitId>,
    pub invalid: BTreeMap<UnitId, InvalidOrder>,
    /// New locations of units that moved.
    pub moved: BTreeMap<UnitId, Location>,
    /// Dislodged units and where each may retreat.
    pub dislodged: BTreeMap<UnitId, BTreeSet<ProvinceId>>,
    /// Provinces left empty by a standoff; nobody may retreat there.
    pub contested: BTreeSet<ProvinceId>,
    /// Number of times the backup rule had to decide a cycle.
    pub paradoxes: usize,
}

impl MovesReport {
    pub fn resolution(&self, unit: UnitId) -> Option<Resolution> {
        self.resolutions.get(&unit).copied()
    }

    pub fn succeeded(&self, unit: UnitId) -> bool {
        self.resolution(unit) == Some(Resolution::Succeeds)
    }

    pub fn is_dislodged(&self, unit: UnitId) -> bool {
        self.dislodged.contains_key(&unit)
    }

    pub fn is_invalid(&self, unit: UnitId) -> bool {
        self.invalid.contains_key(&unit)
    }
}

/// Adjudicates a movement phase.
pub struct MovesAdjudicator<'a> {
    board: &'a mut Board,
}

impl<'a> MovesAdjudicator<'a> {
    pub fn new(board: &'a mut Board) -> Result<Self, AdjudicationError> {
        expect_phase(board, PhaseKind::Moves)?;
        Ok(MovesAdjudicator { board })
    }

    /// Resolves every order, applies the result to the board and advances
    /// it to the retreats phase.
    pub fn run(self) -> MovesReport {
        let board = self.board;
        let mut report = MovesReport::default();

        let (orders, via_convoy) = {
            let mut resolver = Resolver::new(board);
            resolver.resolve_all();
            let via_convoy: Vec<bool> = (0..resolver.adj_buf.len())
                .map(|i| resolver.adj_buf[i].is_move() && resolver.by_convoy(i))
                .collect();
            report.invalid = std::mem::take(&mut resolver.invalid);
            report.paradoxes = resolver.paradoxes;
            (resolver.adj_buf, via_convoy)
        };

        for o in &orders {
            report.resolutions.insert(o.unit, o.resolution);
            if !o.valid || o.resolution == Resolution::Fails || report.invalid.contains_key(&o.unit)
            {
                report.failed_or_invalid_units.insert(o.unit);
            }
        }

        let lookup: BTreeMap<ProvinceId, usize> =
            orders.iter().enumerate().map(|(i, o)| (o.current, i)).collect();
        for (i, o) in orders.iter().enumerate() {
            if !o.is_move() {
                continue;
            }
            let lost_head_to_head = !via_convoy[i]
                && lookup.get(&o.destination).is_some_and(|&d| {
                    orders[d].is_move()
                        && orders[d].destination == o.current
                        && !via_convoy[d]
                        && orders[d].resolution.succeeded()
                });
            let contests = if via_convoy[i] {
                o.resolution.succeeded()
            } else {
                !lost_head_to_head
            };
            if contests {
                report.contested.insert(o.destination);
            }
        }

        apply_cores(board, &orders);

        let winners: Vec<usize> = (0..orders.len())
            .filter(|&i| orders[i].is_move() && orders[i].resolution.succeeded())
            .collect();
        for &i in &winners {
            board.lift_unit(orders[i].unit);
        }
        let mut dislodged = Vec::new();
        for &i in &winners {
            if let Some(victim) = board.dislodge_occupant(orders[i].destination) {
                dislodged.push((victim, orders[i].current, via_convoy[i]));
            }
        }
        for &i in &winners {
            board.land_unit(orders[i].unit, orders[i].landing);
            report.moved.insert(orders[i].unit, orders[i].landing);
        }

        for unit in board.units.iter_mut().flatten() {
            unit.retreat_options = None;
        }
        for (victim, attacker_origin, convoyed) in dislodged {
            let Some(unit) = board.unit(victim) else {
                continue;
            };
            let options: BTreeSet<ProvinceId> = reachable_provinces(board, unit)
                .into_iter()
                .filter(|&p| {
                    board.province(p).unit.is_none()
                        && !report.contested.contains(&p)
                        && (convoyed || p != attacker_origin)
                })
                .collect();
            debug!(unit = victim.0, ?options, "unit dislodged");
            report.dislodged.insert(victim, options.clone());
            if let Some(unit) = board.unit_mut(victim) {
                unit.retreat_options = Some(options);
            }
        }

        if board.phase.captures_centers() {
            capture_occupied_centers(board);
        }

        info!(
            phase = %board.phase,
            year = board.year,
            orders = orders.len(),
            moved = report.moved.len(),
            dislodged = report.dislodged.len(),
            paradoxes = report.paradoxes,
            "moves adjudicated"
        );

        board.clear_orders();
        board.advance_phase();
        report
    }
}

/// A first successful Core leaves a half-core; a second one by the same
/// player completes it.
fn apply_cores(board: &mut Board, orders: &[AdjudicableOrder]) {
    for o in orders {
        if o.order_type != OrderType::Core || !o.valid || !o.resolution.succeeded() {
            continue;
        }
        let prov = board.province_mut(o.current);
        if prov.core == Some(o.country) {
            continue;
        }
        if prov.half_core == Some(o.country) {
            prov.core = Some(o.country);
            prov.half_core = None;
        } else {
            prov.half_core = Some(o.country);
        }
    }
}

/// Every supply center with a unit in it passes to that unit's player.
pub(crate) fn capture_occupied_centers(board: &mut Board) {
    let captures: Vec<(ProvinceId, PlayerId)> = board
        .provinces
        .iter()
        .filter(|p| p.supply_center)
        .filter_map(|p| {
            let unit = board.unit(p.unit?)?;
            (p.owner != Some(unit.player)).then_some((p.id, unit.player))
        })
        .collect();
    for (province, player) in captures {
        debug!(province = province.0, player = player.0, "supply center captured");
        board.set_owner(province, Some(player));
    }
}
