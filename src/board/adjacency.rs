//! Geography queries.
//!
//! Province adjacency is stored on the provinces themselves. Fleet movement
//! additionally goes through coasts: a coast touches the seas listed in its
//! `adjacent_seas`, and two coasts of neighbouring provinces are adjacent when
//! they share one of those seas. Islands have no coasts; a fleet on an island
//! reaches every coast of the neighbouring land provinces.
//!
//! The shared-sea rule over-approximates a few real borders (Gascony reaches
//! Spain's south coast through the Mid-Atlantic). Those are kept as part of
//! the rules the engine adjudicates by.

use std::collections::{BTreeSet, VecDeque};

use super::province::{CoastId, Location, ProvinceId, ProvinceKind};
use super::state::Board;
use super::unit::{Unit, UnitType};

/// True if the two provinces share a border.
#[inline]
pub fn provinces_adjacent(board: &Board, a: ProvinceId, b: ProvinceId) -> bool {
    board.province(a).adjacent.contains(&b)
}

/// True if two coasts of neighbouring provinces share an adjacent sea.
pub fn coasts_adjacent(board: &Board, a: CoastId, b: CoastId) -> bool {
    if a.province == b.province || !provinces_adjacent(board, a.province, b.province) {
        return false;
    }
    let seas_b = &board.coast(b).adjacent_seas;
    board
        .coast(a)
        .adjacent_seas
        .iter()
        .any(|s| seas_b.contains(s))
}

/// True if an army in `from` may move to `to` without a convoy.
pub fn army_can_reach(board: &Board, from: ProvinceId, to: ProvinceId) -> bool {
    from != to && !board.province(to).is_sea() && provinces_adjacent(board, from, to)
}

/// True if a fleet standing at `from` may move to `to`.
///
/// With `strict` set, a destination naming a split-coast province without a
/// coast is rejected. Without it, any reachable coast of that province will
/// do; supports and retreat candidates are checked this way.
pub fn fleet_can_reach(board: &Board, from: Location, to: Location, strict: bool) -> bool {
    let (fp, tp) = (from.province(), to.province());
    if fp == tp || !provinces_adjacent(board, fp, tp) {
        return false;
    }
    let target = board.province(tp);
    if target.kind != ProvinceKind::Land {
        return match from {
            Location::Coast(c) => target.is_island() || board.coast(c).adjacent_seas.contains(&tp),
            Location::Province(_) => board.province(fp).is_fleet_accessible(),
        };
    }

    let candidates: Vec<CoastId> = match to {
        Location::Coast(c) => vec![c],
        Location::Province(_) if strict => match board.fleet_location(to) {
            Some(Location::Coast(c)) => vec![c],
            _ => return false,
        },
        Location::Province(_) => target.coast_ids().collect(),
    };

    candidates.into_iter().any(|c| match from {
        Location::Coast(fc) => coasts_adjacent(board, fc, c),
        Location::Province(_) => match board.province(fp).kind {
            ProvinceKind::Island => true,
            ProvinceKind::Sea => board.coast(c).adjacent_seas.contains(&fp),
            ProvinceKind::Land => false,
        },
    })
}

/// True if `unit` could move to `to` by land or sea on its own.
pub fn unit_can_reach(board: &Board, unit: &Unit, to: Location, strict: bool) -> bool {
    match unit.unit_type {
        UnitType::Army => army_can_reach(board, unit.province(), to.province()),
        UnitType::Fleet => fleet_can_reach(board, unit.location, to, strict),
    }
}

/// Every province `unit` could step into, used for retreat candidates.
pub fn reachable_provinces(board: &Board, unit: &Unit) -> BTreeSet<ProvinceId> {
    let from = unit.province();
    board
        .province(from)
        .adjacent
        .iter()
        .copied()
        .filter(|&p| unit_can_reach(board, unit, Location::Province(p), false))
        .collect()
}

/// Breadth-first distance in province steps from `from` to the nearest of
/// `targets`, ignoring terrain. `None` if no target is reachable.
pub fn distance_to_any(
    board: &Board,
    from: ProvinceId,
    targets: &BTreeSet<ProvinceId>,
) -> Option<u32> {
    if targets.is_empty() {
        return None;
    }
    let mut seen = vec![false; board.provinces.len()];
    let mut queue = VecDeque::new();
    seen[from.index()] = true;
    queue.push_back((from, 0u32));
    while let Some((p, d)) = queue.pop_front() {
        if targets.contains(&p) {
            return Some(d);
        }
        for &n in &board.province(p).adjacent {
            if !seen[n.index()] {
                seen[n.index()] = true;
                queue.push_back((n, d + 1));
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn board() -> Board {
        Board::empty_standard().unwrap()
    }

    fn loc(b: &Board, s: &str) -> Location {
        b.location(s).unwrap()
    }

    fn fleet_loc(b: &Board, s: &str) -> Location {
        b.fleet_location(loc(b, s)).unwrap()
    }

    #[test]
    fn army_moves() {
        let b = board();
        let p = |s: &str| b.province_by_name(s).unwrap();
        assert!(army_can_reach(&b, p("vie"), p("boh")));
        assert!(!army_can_reach(&b, p("vie"), p("vie")));
        assert!(!army_can_reach(&b, p("lon"), p("eng")));
        assert!(!army_can_reach(&b, p("lon"), p("bel")));
    }

    #[test]
    fn fleet_sea_to_coast() {
        let b = board();
        let nth = loc(&b, "nth");
        assert!(fleet_can_reach(&b, nth, loc(&b, "lon"), true));
        assert!(fleet_can_reach(&b, nth, loc(&b, "lon/c"), true));
        assert!(!fleet_can_reach(&b, nth, loc(&b, "wal"), true));
    }

    #[test]
    fn split_coast_needs_a_coast_when_strict() {
        let b = board();
        let mao = loc(&b, "mao");
        assert!(!fleet_can_reach(&b, mao, loc(&b, "spa"), true));
        assert!(fleet_can_reach(&b, mao, loc(&b, "spa"), false));
        assert!(fleet_can_reach(&b, mao, loc(&b, "spa/nc"), true));
        assert!(fleet_can_reach(&b, mao, loc(&b, "spa/sc"), true));
        let gol = loc(&b, "gol");
        assert!(!fleet_can_reach(&b, gol, loc(&b, "spa/nc"), true));
        assert!(fleet_can_reach(&b, gol, loc(&b, "spa/sc"), true));
    }

    #[test]
    fn coast_to_coast() {
        let b = board();
        let mar = fleet_loc(&b, "mar");
        assert!(fleet_can_reach(&b, mar, loc(&b, "spa/sc"), true));
        assert!(!fleet_can_reach(&b, mar, loc(&b, "spa/nc"), true));
        assert!(fleet_can_reach(&b, mar, loc(&b, "pie/c"), true));
        let bul_sc = loc(&b, "bul/sc");
        assert!(fleet_can_reach(&b, bul_sc, fleet_loc(&b, "con"), true));
        assert!(!fleet_can_reach(&b, bul_sc, loc(&b, "bla"), true));
        assert!(fleet_can_reach(&b, bul_sc, loc(&b, "aeg"), true));
    }

    #[test]
    fn shared_sea_reaches_gascony_to_south_spain() {
        let b = board();
        assert!(fleet_can_reach(&b, fleet_loc(&b, "gas"), loc(&b, "spa/sc"), true));
    }

    #[test]
    fn holland_borders_kiel() {
        let b = board();
        let p = |s: &str| b.province_by_name(s).unwrap();
        assert!(provinces_adjacent(&b, p("hol"), p("kie")));
        assert!(army_can_reach(&b, p("hol"), p("kie")));
        assert!(army_can_reach(&b, p("kie"), p("hol")));
        assert!(fleet_can_reach(&b, fleet_loc(&b, "hol"), fleet_loc(&b, "kie"), true));
        assert!(fleet_can_reach(&b, fleet_loc(&b, "cly"), fleet_loc(&b, "edi"), true));
    }

    #[test]
    fn fleet_cannot_reach_inland() {
        let b = board();
        assert!(!fleet_can_reach(&b, fleet_loc(&b, "kie"), loc(&b, "mun"), false));
        assert!(!fleet_can_reach(&b, loc(&b, "nth"), loc(&b, "ruh"), false));
    }

    #[test]
    fn distance() {
        let b = board();
        let p = |s: &str| b.province_by_name(s).unwrap();
        let home: BTreeSet<_> = ["vie", "bud", "tri"].iter().map(|s| p(s)).collect();
        assert_eq!(distance_to_any(&b, p("vie"), &home), Some(0));
        assert_eq!(distance_to_any(&b, p("boh"), &home), Some(1));
        assert!(distance_to_any(&b, p("gre"), &home).unwrap() >= 2);
        assert_eq!(distance_to_any(&b, p("gre"), &BTreeSet::new()), None);
    }
}
