//! Phase sequencing.
//!
//! A game year runs Spring Moves, Spring Retreats, Fall Moves, Fall Retreats,
//! Winter Builds. Every adjudication advances exactly one step, even when a
//! retreats phase has nothing to do.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The season of a game turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Season {
    Spring,
    Fall,
    Winter,
}

/// Which adjudicator handles a phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PhaseKind {
    Moves,
    Retreats,
    Builds,
}

/// A phase within the game year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    #[default]
    SpringMoves,
    SpringRetreats,
    FallMoves,
    FallRetreats,
    WinterBuilds,
}

impl Phase {
    /// The following phase, and whether the year rolls over on entering it.
    pub const fn next(self) -> (Phase, bool) {
        match self {
            Phase::SpringMoves => (Phase::SpringRetreats, false),
            Phase::SpringRetreats => (Phase::FallMoves, false),
            Phase::FallMoves => (Phase::FallRetreats, false),
            Phase::FallRetreats => (Phase::WinterBuilds, false),
            Phase::WinterBuilds => (Phase::SpringMoves, true),
        }
    }

    pub const fn season(self) -> Season {
        match self {
            Phase::SpringMoves | Phase::SpringRetreats => Season::Spring,
            Phase::FallMoves | Phase::FallRetreats => Season::Fall,
            Phase::WinterBuilds => Season::Winter,
        }
    }

    pub const fn kind(self) -> PhaseKind {
        match self {
            Phase::SpringMoves | Phase::FallMoves => PhaseKind::Moves,
            Phase::SpringRetreats | Phase::FallRetreats => PhaseKind::Retreats,
            Phase::WinterBuilds => PhaseKind::Builds,
        }
    }

    pub fn is_moves(self) -> bool {
        self.kind() == PhaseKind::Moves
    }

    pub fn is_retreats(self) -> bool {
        self.kind() == PhaseKind::Retreats
    }

    pub fn is_builds(self) -> bool {
        self.kind() == PhaseKind::Builds
    }

    /// Supply centers change hands at the end of Fall moves and Fall retreats.
    pub fn captures_centers(self) -> bool {
        self.season() == Season::Fall
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Phase::SpringMoves => "Spring Moves",
            Phase::SpringRetreats => "Spring Retreats",
            Phase::FallMoves => "Fall Moves",
            Phase::FallRetreats => "Fall Retreats",
            Phase::WinterBuilds => "Winter Builds",
        };
        f.write_str(s)
    }
}
