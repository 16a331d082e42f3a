//! Players, their holdings and their standing.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::order::{PlayerOrder, RelationshipOrder};
use super::province::ProvinceId;

/// Index of a player in the board arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(pub u8);

impl PlayerId {
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "player {}", self.0)
    }
}

/// How a player's score is computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WinType {
    /// Fraction of the victory count held.
    #[default]
    Classic,
    /// Progress from the initial count toward the victory count; negative
    /// below the initial count.
    Progress,
}

/// Rank of a player by supply-center count, used by the vassal system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlayerClass {
    Duchy,
    Kingdom,
    Empire,
}

impl PlayerClass {
    pub fn from_centers(centers: usize) -> Self {
        match centers {
            0..=2 => PlayerClass::Duchy,
            3..=5 => PlayerClass::Kingdom,
            _ => PlayerClass::Empire,
        }
    }
}

/// A player (power) and everything they hold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    #[serde(default)]
    pub win_type: WinType,
    /// Victory supply-center count.
    pub vscc: u32,
    /// Initial supply-center count.
    pub iscc: u32,
    #[serde(default)]
    pub centers: BTreeSet<ProvinceId>,
    #[serde(default)]
    pub build_orders: Vec<PlayerOrder>,
    #[serde(default)]
    pub relationship_orders: Vec<(PlayerId, RelationshipOrder)>,
    #[serde(default)]
    pub points: u32,
    #[serde(default)]
    pub liege: Option<PlayerId>,
    #[serde(default)]
    pub vassals: BTreeSet<PlayerId>,
    #[serde(default)]
    pub dual_monarch: Option<PlayerId>,
}

impl Player {
    pub fn new(id: PlayerId, name: impl Into<String>, vscc: u32, iscc: u32) -> Self {
        Player {
            id,
            name: name.into(),
            win_type: WinType::Classic,
            vscc,
            iscc,
            centers: BTreeSet::new(),
            build_orders: Vec::new(),
            relationship_orders: Vec::new(),
            points: 0,
            liege: None,
            vassals: BTreeSet::new(),
            dual_monarch: None,
        }
    }

    pub fn center_count(&self) -> usize {
        self.centers.len()
    }

    pub fn class(&self) -> PlayerClass {
        PlayerClass::from_centers(self.centers.len())
    }

    /// Score in `[-1, 1]` for progress scoring, `[0, ...)` for classic.
    pub fn score(&self) -> f64 {
        let centers = self.centers.len() as f64;
        let vscc = f64::from(self.vscc.max(1));
        let iscc = f64::from(self.iscc);
        match self.win_type {
            WinType::Classic => centers / vscc,
            WinType::Progress => {
                if centers > iscc {
                    (centers - iscc) / (vscc - iscc).max(1.0)
                } else if iscc > 0.0 {
                    centers / iscc - 1.0
                } else {
                    0.0
                }
            }
        }
    }

    /// True once the player holds their victory count.
    pub fn has_won(&self) -> bool {
        self.centers.len() as u32 >= self.vscc
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_centers(n: u16) -> Player {
        let mut p = Player::new(PlayerId(0), "Austria", 18, 3);
        p.centers = (0..n).map(ProvinceId).collect();
        p
    }

    #[test]
    fn class_boundaries() {
        assert_eq!(with_centers(0).class(), PlayerClass::Duchy);
        assert_eq!(with_centers(2).class(), PlayerClass::Duchy);
        assert_eq!(with_centers(3).class(), PlayerClass::Kingdom);
        assert_eq!(with_centers(5).class(), PlayerClass::Kingdom);
        assert_eq!(with_centers(6).class(), PlayerClass::Empire);
        assert!(PlayerClass::Empire > PlayerClass::Kingdom);
    }

    #[test]
    fn classic_score() {
        let p = with_centers(9);
        assert!((p.score() - 0.5).abs() < 1e-9);
        assert!(!p.has_won());
        assert!(with_centers(18).has_won());
    }

    #[test]
    fn progress_score() {
        let mut p = with_centers(3);
        p.win_type = WinType::Progress;
        assert!(p.score().abs() < 1e-9);
        p.centers = (0..10).map(ProvinceId).collect();
        assert!((p.score() - 7.0 / 15.0).abs() < 1e-9);
        p.centers = (0..1).map(ProvinceId).collect();
        assert!((p.score() - (1.0 / 3.0 - 1.0)).abs() < 1e-9);
    }
}
