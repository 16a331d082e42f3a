//! Relationships between players: liege and vassal, dual monarchy.
//!
//! Resolved at the end of the builds phase when the vassal system is on.
//! Existing bonds are broken first (Disown, Defect, Rebellion), then new ones
//! are formed from mutual offers, then every player's points are recomputed.

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::{debug, warn};

use crate::board::{Board, PlayerId, RelationshipOrder};

/// What the relationship resolution did. Pairs are `(liege, vassal)` unless
/// noted otherwise.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct VassalReport {
    pub formed: Vec<(PlayerId, PlayerId)>,
    pub released: Vec<(PlayerId, PlayerId)>,
    pub dual_monarchies: Vec<(PlayerId, PlayerId)>,
    /// `(rebel, liege)` pairs whose rebellion was too weak.
    pub failed_rebellions: Vec<(PlayerId, PlayerId)>,
    pub points: BTreeMap<PlayerId, u32>,
}

pub(crate) fn resolve_relationships(board: &mut Board) -> VassalReport {
    let mut report = VassalReport::default();
    let orders: Vec<(PlayerId, PlayerId, RelationshipOrder)> = board
        .players
        .iter()
        .flat_map(|p| p.relationship_orders.iter().map(move |&(t, o)| (p.id, t, o)))
        .filter(|&(_, t, _)| t.index() < board.players.len())
        .collect();
    let offered = |from: PlayerId, to: PlayerId, kind: RelationshipOrder| {
        orders.contains(&(from, to, kind))
    };

    for &(player, target, order) in &orders {
        match order {
            RelationshipOrder::Disown if board.player(target).liege == Some(player) => {
                release(board, player, target, &mut report);
            }
            RelationshipOrder::Defect if board.player(player).liege == Some(target) => {
                release(board, target, player, &mut report);
            }
            _ => {}
        }
    }

    let mut rebellions: BTreeMap<PlayerId, Vec<PlayerId>> = BTreeMap::new();
    for &(player, target, order) in &orders {
        if order == RelationshipOrder::Rebellion && board.player(player).liege == Some(target) {
            let rebels = rebellions.entry(target).or_default();
            if !rebels.contains(&player) {
                rebels.push(player);
            }
        }
    }
    for (liege, rebels) in rebellions {
        let strength: usize = rebels.iter().map(|&r| board.player(r).center_count()).sum();
        if strength >= board.player(liege).center_count() {
            for rebel in rebels {
                release(board, liege, rebel, &mut report);
            }
        } else {
            warn!(
                liege = %board.player(liege).name,
                strength,
                "rebellion failed"
            );
            report
                .failed_rebellions
                .extend(rebels.into_iter().map(|r| (r, liege)));
        }
    }

    for &(vassal, liege, order) in &orders {
        if order != RelationshipOrder::Vassal || !offered(liege, vassal, RelationshipOrder::Liege) {
            continue;
        }
        let (v, l) = (board.player(vassal), board.player(liege));
        let allowed = vassal != liege
            && v.liege.is_none()
            && l.liege.is_none()
            && v.vassals.is_empty()
            && v.dual_monarch.is_none()
            && l.class() > v.class();
        if !allowed {
            debug!(vassal = %v.name, liege = %l.name, "vassalage refused");
            continue;
        }
        board.player_mut(vassal).liege = Some(liege);
        board.player_mut(liege).vassals.insert(vassal);
        report.formed.push((liege, vassal));
    }

    for &(a, b, order) in &orders {
        if order != RelationshipOrder::DualMonarchy
            || a >= b
            || !offered(b, a, RelationshipOrder::DualMonarchy)
        {
            continue;
        }
        let (pa, pb) = (board.player(a), board.player(b));
        let allowed = pa.class() == pb.class()
            && pa.liege.is_none()
            && pb.liege.is_none()
            && pa.dual_monarch.is_none()
            && pb.dual_monarch.is_none();
        if !allowed {
            debug!(a = %pa.name, b = %pb.name, "dual monarchy refused");
            continue;
        }
        board.player_mut(a).dual_monarch = Some(b);
        board.player_mut(b).dual_monarch = Some(a);
        report.dual_monarchies.push((a, b));
    }

    let points: Vec<(PlayerId, u32)> = board
        .players
        .iter()
        .map(|p| {
            let own = p.center_count();
            let vassals: usize = p
                .vassals
                .iter()
                .map(|&v| board.player(v).center_count())
                .sum();
            let partner = p
                .dual_monarch
                .map_or(0, |d| board.player(d).center_count());
            (p.id, (own + vassals / 2 + partner / 2) as u32)
        })
        .collect();
    for (id, points) in points {
        board.player_mut(id).points = points;
        report.points.insert(id, points);
    }
    report
}

fn release(board: &mut Board, liege: PlayerId, vassal: PlayerId, report: &mut VassalReport) {
    board.player_mut(liege).vassals.remove(&vassal);
    board.player_mut(vassal).liege = None;
    debug!(liege = liege.0, vassal = vassal.0, "vassal released");
    report.released.push((liege, vassal));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::ProvinceId;

    fn board() -> Board {
        Board::empty_standard().unwrap()
    }

    fn id(board: &Board, name: &str) -> PlayerId {
        board.player_by_name(name).unwrap()
    }

    fn give_centers(board: &mut Board, player: PlayerId, names: &[&str]) {
        for name in names {
            let p: ProvinceId = board.province_by_name(name).unwrap();
            board.set_owner(p, Some(player));
        }
    }

    fn offer(board: &mut Board, from: PlayerId, to: PlayerId, order: RelationshipOrder) {
        board.player_mut(from).relationship_orders.push((to, order));
    }

    #[test]
    fn mutual_offer_forms_vassalage() {
        let mut b = board();
        let (aus, ita) = (id(&b, "Austria"), id(&b, "Italy"));
        give_centers(&mut b, aus, &["ser", "gre", "rum"]);
        for p in b.player(ita).centers.clone() {
            if b.province(p).abbr != "rom" {
                b.set_owner(p, None);
            }
        }
        offer(&mut b, ita, aus, RelationshipOrder::Vassal);
        offer(&mut b, aus, ita, RelationshipOrder::Liege);
        let report = resolve_relationships(&mut b);
        assert_eq!(report.formed, vec![(aus, ita)]);
        assert_eq!(b.player(ita).liege, Some(aus));
        assert!(b.player(aus).vassals.contains(&ita));
        // 6 own centers plus half of Italy's one.
        assert_eq!(b.player(aus).points, 6);
    }

    #[test]
    fn one_sided_offer_does_nothing() {
        let mut b = board();
        let (aus, ita) = (id(&b, "Austria"), id(&b, "Italy"));
        offer(&mut b, ita, aus, RelationshipOrder::Vassal);
        let report = resolve_relationships(&mut b);
        assert!(report.formed.is_empty());
        assert_eq!(b.player(ita).liege, None);
    }

    #[test]
    fn equal_class_cannot_be_vassal() {
        let mut b = board();
        let (aus, ita) = (id(&b, "Austria"), id(&b, "Italy"));
        offer(&mut b, ita, aus, RelationshipOrder::Vassal);
        offer(&mut b, aus, ita, RelationshipOrder::Liege);
        let report = resolve_relationships(&mut b);
        assert!(report.formed.is_empty());
    }

    #[test]
    fn dual_monarchy_shares_points() {
        let mut b = board();
        let (aus, ita) = (id(&b, "Austria"), id(&b, "Italy"));
        offer(&mut b, ita, aus, RelationshipOrder::DualMonarchy);
        offer(&mut b, aus, ita, RelationshipOrder::DualMonarchy);
        let report = resolve_relationships(&mut b);
        assert_eq!(report.dual_monarchies, vec![(aus.min(ita), aus.max(ita))]);
        assert_eq!(b.player(aus).dual_monarch, Some(ita));
        assert_eq!(b.player(aus).points, 3 + 1);
    }

    #[test]
    fn defect_and_disown_break_bonds() {
        let mut b = board();
        let (aus, ita, tur) = (id(&b, "Austria"), id(&b, "Italy"), id(&b, "Turkey"));
        b.player_mut(ita).liege = Some(aus);
        b.player_mut(tur).liege = Some(aus);
        b.player_mut(aus).vassals.extend([ita, tur]);
        offer(&mut b, ita, aus, RelationshipOrder::Defect);
        offer(&mut b, aus, tur, RelationshipOrder::Disown);
        let report = resolve_relationships(&mut b);
        assert_eq!(report.released.len(), 2);
        assert!(b.player(aus).vassals.is_empty());
        assert_eq!(b.player(ita).liege, None);
        assert_eq!(b.player(tur).liege, None);
    }

    #[test]
    fn rebellion_needs_strength() {
        let mut b = board();
        let (rus, aus) = (id(&b, "Russia"), id(&b, "Austria"));
        b.player_mut(aus).liege = Some(rus);
        b.player_mut(rus).vassals.insert(aus);
        offer(&mut b, aus, rus, RelationshipOrder::Rebellion);
        let report = resolve_relationships(&mut b);
        assert_eq!(report.failed_rebellions, vec![(aus, rus)]);
        assert_eq!(b.player(aus).liege, Some(rus));

        b.clear_orders();
        let ita = id(&b, "Italy");
        b.player_mut(ita).liege = Some(rus);
        b.player_mut(rus).vassals.insert(ita);
        offer(&mut b, aus, rus, RelationshipOrder::Rebellion);
        offer(&mut b, ita, rus, RelationshipOrder::Rebellion);
        let report = resolve_relationships(&mut b);
        assert_eq!(report.released.len(), 2);
        assert!(b.player(rus).vassals.is_empty());
    }
}
