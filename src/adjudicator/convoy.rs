//! Convoy-path search.
//!
//! A convoy route is a chain of fleets in sea provinces leading from the
//! army's province to its destination. The same breadth-first search serves
//! order validation, where a fleet is usable if its order permits the convoy,
//! and move resolution, where a fleet is usable only once its convoy order
//! resolves as successful.

use std::collections::VecDeque;

use crate::board::{Board, Order, ProvinceId};

/// Breadth-first search from `start` to `end` over sea provinces for which
/// `usable` returns true. `usable` is called at most once per sea province,
/// and only for provinces the search actually reaches.
pub fn convoy_route<F>(board: &Board, start: ProvinceId, end: ProvinceId, mut usable: F) -> bool
where
    F: FnMut(ProvinceId) -> bool,
{
    if start == end {
        return false;
    }
    let mut seen = vec![false; board.provinces.len()];
    let mut queue = VecDeque::new();
    seen[start.index()] = true;
    queue.push_back(start);

    while let Some(current) = queue.pop_front() {
        for &next in &board.province(current).adjacent {
            if seen[next.index()] {
                continue;
            }
            seen[next.index()] = true;
            if !board.province(next).is_sea() || !usable(next) {
                continue;
            }
            if board.province(next).adjacent.contains(&end) {
                return true;
            }
            queue.push_back(next);
        }
    }
    false
}

/// True if the fleets on the board could carry an army from `start` to `end`.
///
/// With `check_fleet_orders` every fleet on the route must be ordered to
/// convoy exactly this movement. Otherwise any fleet that is holding, has no
/// order, or is convoying something will do; a fleet busy supporting or
/// moving cannot also convoy.
pub fn convoy_is_possible(
    board: &Board,
    start: ProvinceId,
    end: ProvinceId,
    check_fleet_orders: bool,
) -> bool {
    convoy_route(board, start, end, |sea| {
        let Some(fleet) = board.unit_at(sea) else {
            return false;
        };
        if !fleet.is_fleet() {
            return false;
        }
        match fleet.order {
            Some(Order::ConvoyTransport {
                source,
                destination,
            }) => {
                !check_fleet_orders
                    || (source.province() == start && destination.province() == end)
            }
            None | Some(Order::Hold) | Some(Order::Nmr) => !check_fleet_orders,
            Some(_) => false,
        }
    })
}
