//! Game state representation.
//!
//! The [`Board`] is an arena: provinces, players and units live in vectors and
//! refer to each other by id. Every operation that moves a unit between
//! provinces goes through a method here so that `Province::unit`,
//! `Province::dislodged_unit` and `Unit::location` never disagree.

use serde::{Deserialize, Serialize};

use super::map::MapError;
use super::order::{Order, PlayerOrder};
use super::phase::Phase;
use super::player::{Player, PlayerId};
use super::province::{Coast, CoastId, Location, Province, ProvinceId, ProvinceKind};
use super::unit::{Unit, UnitId, UnitType};
use crate::config::GameRules;

/// Complete game state at a point in time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Board {
    pub name: String,
    pub year: u16,
    pub phase: Phase,
    #[serde(default)]
    pub rules: GameRules,
    pub players: Vec<Player>,
    pub provinces: Vec<Province>,
    /// Unit arena. Removed units leave a `None` so ids stay stable.
    #[serde(default)]
    pub units: Vec<Option<Unit>>,
}

impl Board {
    #[inline]
    pub fn province(&self, id: ProvinceId) -> &Province {
        &self.provinces[id.index()]
    }

    #[inline]
    pub fn province_mut(&mut self, id: ProvinceId) -> &mut Province {
        &mut self.provinces[id.index()]
    }

    pub fn coast(&self, id: CoastId) -> &Coast {
        &self.provinces[id.province.index()].coasts[id.index as usize]
    }

    #[inline]
    pub fn player(&self, id: PlayerId) -> &Player {
        &self.players[id.index()]
    }

    #[inline]
    pub fn player_mut(&mut self, id: PlayerId) -> &mut Player {
        &mut self.players[id.index()]
    }

    pub fn player_ids(&self) -> impl Iterator<Item = PlayerId> + '_ {
        self.players.iter().map(|p| p.id)
    }

    pub fn province_ids(&self) -> impl Iterator<Item = ProvinceId> + '_ {
        self.provinces.iter().map(|p| p.id)
    }

    pub fn unit(&self, id: UnitId) -> Option<&Unit> {
        self.units.get(id.index()).and_then(Option::as_ref)
    }

    pub fn unit_mut(&mut self, id: UnitId) -> Option<&mut Unit> {
        self.units.get_mut(id.index()).and_then(Option::as_mut)
    }

    /// Iterates over every unit still on the board, dislodged ones included.
    pub fn live_units(&self) -> impl Iterator<Item = &Unit> {
        self.units.iter().flatten()
    }

    pub fn units_of(&self, player: PlayerId) -> impl Iterator<Item = &Unit> {
        self.live_units().filter(move |u| u.player == player)
    }

    /// The non-dislodged unit standing in a province.
    pub fn unit_at(&self, province: ProvinceId) -> Option<&Unit> {
        self.province(province).unit.and_then(|id| self.unit(id))
    }

    pub fn dislodged_at(&self, province: ProvinceId) -> Option<&Unit> {
        self.province(province)
            .dislodged_unit
            .and_then(|id| self.unit(id))
    }

    /// Looks up a province by abbreviation or full name, case-insensitively.
    pub fn province_by_name(&self, name: &str) -> Option<ProvinceId> {
        self.provinces
            .iter()
            .find(|p| p.abbr.eq_ignore_ascii_case(name) || p.name.eq_ignore_ascii_case(name))
            .map(|p| p.id)
    }

    pub fn player_by_name(&self, name: &str) -> Option<PlayerId> {
        self.players
            .iter()
            .find(|p| p.name.eq_ignore_ascii_case(name))
            .map(|p| p.id)
    }

    /// Parses `spa` or `spa/sc` into a location.
    pub fn location(&self, text: &str) -> Result<Location, MapError> {
        let (prov, coast) = match text.split_once('/') {
            Some((p, c)) => (p, Some(c)),
            None => (text, None),
        };
        let id = self
            .province_by_name(prov.trim())
            .ok_or_else(|| MapError::UnknownProvince(prov.to_string()))?;
        match coast {
            None => Ok(Location::Province(id)),
            Some(c) => self
                .province(id)
                .coast_by_name(c.trim())
                .map(Location::Coast)
                .ok_or_else(|| MapError::UnknownCoast(text.to_string())),
        }
    }

    /// Where a fleet addressed at `location` would actually stand: the single
    /// coast of a one-coast province, or the province itself for seas and
    /// islands. `None` if the location is landlocked or names a split-coast
    /// province without a coast.
    pub fn fleet_location(&self, location: Location) -> Option<Location> {
        match location {
            Location::Coast(_) => Some(location),
            Location::Province(p) => {
                let prov = self.province(p);
                match prov.kind {
                    ProvinceKind::Sea | ProvinceKind::Island => Some(location),
                    ProvinceKind::Land if prov.coasts.len() == 1 => {
                        prov.coast_id(0).map(Location::Coast)
                    }
                    ProvinceKind::Land => None,
                }
            }
        }
    }

    /// Normalises a location for a unit type: armies stand on provinces,
    /// fleets on coasts (or seas and islands).
    pub fn normalize_location(
        &self,
        unit_type: UnitType,
        location: Location,
    ) -> Result<Location, MapError> {
        let prov = self.province(location.province());
        match unit_type {
            UnitType::Army if prov.is_sea() => Err(MapError::ArmyAtSea(prov.name.clone())),
            UnitType::Army => Ok(Location::Province(prov.id)),
            UnitType::Fleet => self
                .fleet_location(location)
                .ok_or_else(|| MapError::NoFleetCoast(prov.name.clone())),
        }
    }

    /// Places a new unit. Fails if the province is occupied or the unit
    /// cannot stand there.
    pub fn place_unit(
        &mut self,
        player: PlayerId,
        unit_type: UnitType,
        location: Location,
    ) -> Result<UnitId, MapError> {
        let location = self.normalize_location(unit_type, location)?;
        let province = location.province();
        if self.province(province).unit.is_some() {
            return Err(MapError::Occupied(self.province(province).name.clone()));
        }
        let id = UnitId(self.units.len() as u32);
        self.units.push(Some(Unit {
            id,
            unit_type,
            player,
            location,
            order: None,
            retreat_options: None,
        }));
        self.province_mut(province).unit = Some(id);
        Ok(id)
    }

    /// Removes a unit from the board entirely.
    pub fn remove_unit(&mut self, id: UnitId) -> Option<Unit> {
        let unit = self.units.get_mut(id.index())?.take()?;
        let prov = self.province_mut(unit.province());
        if prov.unit == Some(id) {
            prov.unit = None;
        }
        if prov.dislodged_unit == Some(id) {
            prov.dislodged_unit = None;
        }
        Some(unit)
    }

    /// Takes a unit off its province without removing it from the arena.
    /// Used while applying simultaneous moves.
    pub(crate) fn lift_unit(&mut self, id: UnitId) {
        if let Some(province) = self.unit(id).map(Unit::province) {
            let prov = self.province_mut(province);
            if prov.unit == Some(id) {
                prov.unit = None;
            }
            if prov.dislodged_unit == Some(id) {
                prov.dislodged_unit = None;
            }
        }
    }

    /// Puts a lifted unit down at `location`. The province must be empty.
    pub(crate) fn land_unit(&mut self, id: UnitId, location: Location) {
        let province = location.province();
        if let Some(unit) = self.unit_mut(id) {
            unit.location = location;
            unit.retreat_options = None;
        }
        self.province_mut(province).unit = Some(id);
    }

    /// Moves the occupant of a province into its dislodged slot.
    pub(crate) fn dislodge_occupant(&mut self, province: ProvinceId) -> Option<UnitId> {
        let prov = self.province_mut(province);
        let id = prov.unit.take()?;
        prov.dislodged_unit = Some(id);
        Some(id)
    }

    pub fn set_order(&mut self, id: UnitId, order: Order) -> bool {
        match self.unit_mut(id) {
            Some(unit) => {
                unit.order = Some(order);
                true
            }
            None => false,
        }
    }

    /// Changes supply-center ownership, keeping `Player::centers` in step.
    pub fn set_owner(&mut self, province: ProvinceId, owner: Option<PlayerId>) {
        let previous = std::mem::replace(&mut self.province_mut(province).owner, owner);
        if previous == owner {
            return;
        }
        if let Some(old) = previous {
            self.player_mut(old).centers.remove(&province);
        }
        if let Some(new) = owner {
            self.player_mut(new).centers.insert(province);
        }
    }

    /// Clears every unit and player order at the end of a phase.
    pub fn clear_orders(&mut self) {
        for unit in self.units.iter_mut().flatten() {
            unit.order = None;
        }
        for player in &mut self.players {
            player.build_orders.clear();
            player.relationship_orders.clear();
        }
    }

    /// Advances to the next phase, rolling the year over after builds.
    pub fn advance_phase(&mut self) {
        let (next, rollover) = self.phase.next();
        if rollover {
            self.year += 1;
        }
        self.phase = next;
    }

    /// The first player holding their victory count, if any.
    pub fn winner(&self) -> Option<PlayerId> {
        self.players.iter().find(|p| p.has_won()).map(|p| p.id)
    }

    /// Checks that a location names a province, and a coast of it, on this
    /// board.
    pub fn check_location(&self, location: Location) -> Result<(), MapError> {
        let province = location.province();
        let prov = self
            .provinces
            .get(province.index())
            .ok_or(MapError::UnknownProvinceId(province.0))?;
        match location.coast() {
            Some(c) if usize::from(c.index) >= prov.coasts.len() => Err(MapError::UnknownCoastId {
                province: province.0,
                index: c.index,
            }),
            _ => Ok(()),
        }
    }

    fn check_province(&self, id: ProvinceId) -> Result<(), MapError> {
        self.check_location(Location::Province(id))
    }

    fn check_player(&self, id: PlayerId) -> Result<(), MapError> {
        match self.players.get(id.index()) {
            Some(_) => Ok(()),
            None => Err(MapError::UnknownPlayerId(id.0)),
        }
    }

    pub fn check_order(&self, order: &Order) -> Result<(), MapError> {
        order.locations().try_for_each(|l| self.check_location(l))
    }

    /// Verifies every id a board refers to. Boards built through
    /// [`Board::from_map`] always pass; a deserialized board must be checked
    /// before it is adjudicated.
    pub fn validate(&self) -> Result<(), MapError> {
        for (index, player) in self.players.iter().enumerate() {
            if player.id.index() != index {
                return Err(MapError::MisplacedId {
                    what: "player",
                    index,
                    id: u32::from(player.id.0),
                });
            }
            for &p in &player.centers {
                self.check_province(p)?;
            }
            for order in &player.build_orders {
                match *order {
                    PlayerOrder::Build { location, .. } | PlayerOrder::Disband { location } => {
                        self.check_location(location)?
                    }
                    PlayerOrder::Waive => {}
                }
            }
            let related = player
                .relationship_orders
                .iter()
                .map(|&(target, _)| target)
                .chain(player.liege)
                .chain(player.dual_monarch)
                .chain(player.vassals.iter().copied());
            for other in related {
                self.check_player(other)?;
            }
        }

        for (index, prov) in self.provinces.iter().enumerate() {
            if prov.id.index() != index {
                return Err(MapError::MisplacedId {
                    what: "province",
                    index,
                    id: u32::from(prov.id.0),
                });
            }
            let seas = prov.coasts.iter().flat_map(|c| c.adjacent_seas.iter());
            for &p in prov.adjacent.iter().chain(seas) {
                self.check_province(p)?;
            }
            for player in [prov.owner, prov.core, prov.half_core].into_iter().flatten() {
                self.check_player(player)?;
            }
            for id in [prov.unit, prov.dislodged_unit].into_iter().flatten() {
                let unit = self.unit(id).ok_or(MapError::UnknownUnitId(id.0))?;
                if unit.province() != prov.id {
                    return Err(MapError::Unplaced(id.to_string()));
                }
            }
        }

        for (index, unit) in self.units.iter().enumerate() {
            let Some(unit) = unit else { continue };
            if unit.id.index() != index {
                return Err(MapError::MisplacedId {
                    what: "unit",
                    index,
                    id: unit.id.0,
                });
            }
            self.check_player(unit.player)?;
            self.check_location(unit.location)?;
            if let Some(order) = &unit.order {
                self.check_order(order)?;
            }
            for &p in unit.retreat_options.iter().flatten() {
                self.check_province(p)?;
            }
            let prov = self.province(unit.province());
            if prov.unit != Some(unit.id) && prov.dislodged_unit != Some(unit.id) {
                return Err(MapError::Unplaced(unit.id.to_string()));
            }
        }
        Ok(())
    }
}
