//! Board representation and game-state types.
//!
//! Contains the arena-backed data structures for provinces, coasts, units,
//! players, orders and the overall game state, plus map loading.

pub mod adjacency;
pub mod map;
pub mod order;
pub mod phase;
pub mod player;
pub mod province;
pub mod state;
pub mod unit;

pub use adjacency::{
    army_can_reach, coasts_adjacent, distance_to_any, fleet_can_reach, provinces_adjacent,
    reachable_provinces, unit_can_reach,
};
pub use map::{MapDef, MapError, STANDARD_MAP};
pub use order::{Order, PlayerOrder, RelationshipOrder};
pub use phase::{Phase, PhaseKind, Season};
pub use player::{Player, PlayerClass, PlayerId, WinType};
pub use province::{Coast, CoastId, Location, Province, ProvinceId, ProvinceKind};
pub use state::Board;
pub use unit::{Unit, UnitId, UnitType};
