//! Turn adjudication.
//!
//! One adjudicator per phase kind. Each borrows the board mutably, resolves
//! every order given for the current phase, applies the outcome, clears the
//! orders and advances the board by exactly one phase. [`adjudicate`]
//! dispatches on the board's current phase.

pub mod builds;
pub mod convoy;
pub mod moves;
pub mod retreats;
pub mod validity;
pub mod vassals;

use serde::Serialize;

use crate::board::{Board, MapError, Order, Phase, PhaseKind};

pub use builds::{BuildsAdjudicator, BuildsReport};
pub use convoy::{convoy_is_possible, convoy_route};
pub use moves::{MovesAdjudicator, MovesReport};
pub use retreats::{RetreatsAdjudicator, RetreatsReport};
pub use validity::{classify_move, intended_province, validate, InvalidOrder, MoveRoute};
pub use vassals::VassalReport;

/// Errors that indicate a caller bug rather than a rules situation.
#[derive(Debug, thiserror::Error)]
pub enum AdjudicationError {
    #[error("cannot run the {expected:?} adjudicator during {found}")]
    WrongPhase { expected: PhaseKind, found: Phase },

    #[error("no unit at {0}")]
    NoUnitAt(String),

    #[error(transparent)]
    Map(#[from] MapError),
}

/// Outcome of a single order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Resolution {
    Succeeds,
    Fails,
}

impl Resolution {
    #[inline]
    pub fn succeeded(self) -> bool {
        self == Resolution::Succeeds
    }
}

/// What one phase of adjudication did.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "phase", rename_all = "snake_case")]
pub enum Report {
    Moves(MovesReport),
    Retreats(RetreatsReport),
    Builds(BuildsReport),
}

/// Adjudicates the board's current phase and advances it. The board's ids
/// are checked first, so a malformed deserialized board is an error.
pub fn adjudicate(board: &mut Board) -> Result<Report, AdjudicationError> {
    board.validate()?;
    match board.phase.kind() {
        PhaseKind::Moves => Ok(Report::Moves(MovesAdjudicator::new(board)?.run())),
        PhaseKind::Retreats => Ok(Report::Retreats(RetreatsAdjudicator::new(board)?.run())),
        PhaseKind::Builds => Ok(Report::Builds(BuildsAdjudicator::new(board)?.run())),
    }
}

/// Attaches orders to the units at the named locations, e.g. `("stp/sc",
/// Order::Hold)`. A retreat order goes to the dislodged unit of the province
/// if there is one. Orders naming provinces or coasts the board does not have
/// are rejected.
pub fn assign_orders<'s>(
    board: &mut Board,
    orders: impl IntoIterator<Item = (&'s str, Order)>,
) -> Result<(), AdjudicationError> {
    for (at, order) in orders {
        board.check_order(&order)?;
        let province = board.location(at)?.province();
        let unit = if order.is_retreat() {
            board.dislodged_at(province).or_else(|| board.unit_at(province))
        } else {
            board.unit_at(province)
        };
        let id = unit
            .map(|u| u.id)
            .ok_or_else(|| AdjudicationError::NoUnitAt(at.to_string()))?;
        board.set_order(id, order);
    }
    Ok(())
}

fn expect_phase(board: &Board, expected: PhaseKind) -> Result<(), AdjudicationError> {
    if board.phase.kind() == expected {
        Ok(())
    } else {
        Err(AdjudicationError::WrongPhase {
            expected,
            found: board.phase,
        })
    }
}
