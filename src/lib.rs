//! Chancery: a Diplomacy-variant adjudication engine.
//!
//! Exposes the board representation, the per-phase adjudicators and the game
//! rules for use by integration tests and the snapshot binary.

pub mod adjudicator;
pub mod board;
pub mod config;

pub use adjudicator::{adjudicate, assign_orders, AdjudicationError, Report, Resolution};
pub use board::{Board, Location, Order, Phase, PlayerOrder, UnitType};
pub use config::GameRules;
