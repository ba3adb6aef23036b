pub mod doors;

use std::fmt::{self, Display, Formatter};
use std::ops::{Index, IndexMut};

use anyhow::{Context, Result, anyhow};
use hashbrown::{HashMap, HashSet};
use log::{debug, info};
use roomreach_game::{Direction, Door, MapCoord, ROOM_TILES, Supertile};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

use crate::ground_truth::{
    LockedCell, Manipulable, RoomSnapshot, RoomTags, TagOutcome, TagTrigger,
};

/// Reachable overlay value for cells nothing has reached yet.
pub const UNREACHED: u8 = 0x01;

/// Two 64x64 tile layers addressed by `MapCoord`.
#[derive(Clone, PartialEq, Eq)]
pub struct TileMap(Box<[u8; ROOM_TILES]>);

impl TileMap {
    pub fn filled(v: u8) -> TileMap {
        TileMap(Box::new([v; ROOM_TILES]))
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<TileMap> {
        let tiles: Box<[u8; ROOM_TILES]> = bytes
            .to_vec()
            .into_boxed_slice()
            .try_into()
            .map_err(|b: Box<[u8]>| {
                anyhow!("tile map must be ${:04x} bytes, got ${:04x}", ROOM_TILES, b.len())
            })?;
        Ok(TileMap(tiles))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0[..]
    }

    /// Little-endian pair starting at `t`, as the game reads tile attributes.
    pub fn read16(&self, t: MapCoord) -> u16 {
        u16::from(self[t]) | u16::from(self[t.offset(1)]) << 8
    }

    /// Fills the 2x2 block whose top-left tile is `t`.
    pub fn fill_2x2(&mut self, t: MapCoord, v: u8) {
        for d in [0x00, 0x01, 0x40, 0x41] {
            self[t.offset(d)] = v;
        }
    }

    pub fn count(&self, mut pred: impl FnMut(u8) -> bool) -> usize {
        self.0.iter().filter(|&&v| pred(v)).count()
    }
}

impl Index<MapCoord> for TileMap {
    type Output = u8;

    fn index(&self, t: MapCoord) -> &u8 {
        &self.0[t.index()]
    }
}

impl IndexMut<MapCoord> for TileMap {
    fn index_mut(&mut self, t: MapCoord) -> &mut u8 {
        &mut self.0[t.index()]
    }
}

impl fmt::Debug for TileMap {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "TileMap(..)")
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ExitPoint {
    pub supertile: Supertile,
    pub point: MapCoord,
    pub direction: Direction,
    /// Set on the first pit/bombable floor per room and on one corner of
    /// each warp tile, so the exit is only drawn once.
    pub worth_marking: bool,
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntryPoint {
    pub supertile: Supertile,
    pub point: MapCoord,
    pub direction: Direction,
    pub from: ExitPoint,
}

impl Display for EntryPoint {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{{{}, {}, {}}}", self.supertile, self.point, self.direction)
    }
}

/// Alternate visitation histories. Room tags (stars, push blocks) change the
/// room's tiles, so each outcome is explored against its own visited set.
#[derive(
    Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
pub enum VisitedSlot {
    #[default]
    Star0,
    Star1,
    Tag0,
    Tag1,
}

impl VisitedSlot {
    fn index(self) -> usize {
        self as usize
    }
}

pub struct RoomState {
    pub supertile: Supertile,

    pub entry_points: Vec<EntryPoint>,
    pub exit_points: Vec<ExitPoint>,

    pub warp_exit_to: Supertile,
    pub stair_exit_to: [Supertile; 4],
    pub warp_exit_layer: u16,
    pub stair_target_layer: [u16; 4],

    pub doors: Vec<Door>,
    pub stairs: Vec<MapCoord>,
    pub swap_layers: HashSet<MapCoord>,
    pub manipulables: Vec<Manipulable>,
    pub locked_cells: Vec<LockedCell>,
    pub has_tags: bool,

    pub tiles: TileMap,
    pub reachable: TileMap,
    pub hookshot: HashMap<MapCoord, u8>,

    visited: [HashSet<MapCoord>; 4],
    active_slot: VisitedSlot,
    star_state: u8,
    tags: Box<dyn RoomTags>,

    pub(crate) marked_pit: bool,
    pub(crate) marked_floor: bool,
    pub is_loaded: bool,
}

impl RoomState {
    pub fn new(supertile: Supertile, snapshot: RoomSnapshot, tags: Box<dyn RoomTags>) -> RoomState {
        info!("creating room {supertile}");
        let layer = |l2: bool| if l2 { MapCoord::LAYER2 } else { 0 };
        let meta = snapshot.meta;
        RoomState {
            supertile,
            entry_points: vec![],
            exit_points: vec![],
            warp_exit_to: meta.warp_exit_to,
            stair_exit_to: meta.stair_exit_to,
            warp_exit_layer: layer(meta.warp_exit_layer2),
            stair_target_layer: meta.stair_target_layer2.map(layer),
            doors: meta.doors,
            stairs: meta.stairs,
            swap_layers: meta.swap_layers.into_iter().collect(),
            manipulables: meta.manipulables,
            locked_cells: meta.locked_cells,
            has_tags: meta.has_tags,
            tiles: snapshot.tiles,
            reachable: TileMap::filled(UNREACHED),
            hookshot: HashMap::new(),
            visited: Default::default(),
            active_slot: VisitedSlot::Star0,
            star_state: 0,
            tags,
            marked_pit: false,
            marked_floor: false,
            is_loaded: false,
        }
    }

    /// One-time preparation before the first scan: opens doorways, records
    /// layer swaps, unlocks cell doors and lets the room tags settle.
    pub fn init(&mut self) -> Result<()> {
        if self.is_loaded {
            return Ok(());
        }
        let st = self.supertile;

        let doors = self.doors.clone();
        for door in &doors {
            debug!("room {st} door: {door}");
            doors::open_door(&mut self.tiles, door)
                .with_context(|| format!("opening door {door} in room {st}"))?;
        }

        self.mark_swap_layers();
        self.unlock_cells();

        if self.has_tags {
            self.activate_tags(TagTrigger::Load)
                .with_context(|| format!("room {st} load tags"))?;
        }

        self.is_loaded = true;
        Ok(())
    }

    /// Loads metadata only; tiles stay as captured and nothing is opened.
    pub fn init_static(&mut self) {
        self.is_loaded = true;
    }

    fn mark_swap_layers(&mut self) {
        let entries: Vec<MapCoord> = self.swap_layers.drain().collect();
        let mut swaps = HashSet::new();
        for t in entries {
            for layer in [0, MapCoord::LAYER2] {
                let t = t.with_layer(layer);
                for d in [0x00, 0x01, 0x40, 0x41] {
                    swaps.insert(t.offset(d));
                }
            }
        }
        self.swap_layers = swaps;
    }

    fn unlock_cells(&mut self) {
        for cell in &self.locked_cells {
            let Some(key) = 0x58u8.checked_add(cell.slot) else {
                continue;
            };
            for layer in [0, MapCoord::LAYER2] {
                let t = cell.pos.with_layer(layer);
                if self.tiles[t] == key {
                    debug!("room {} unlocking cell at {t}", self.supertile);
                    self.tiles.fill_2x2(t, 0x00);
                }
            }
        }
    }

    pub fn is_visited(&self, t: MapCoord) -> bool {
        self.visited[self.active_slot.index()].contains(&t)
    }

    pub fn mark_visited(&mut self, t: MapCoord) {
        self.visited[self.active_slot.index()].insert(t);
    }

    pub fn visited_count(&self) -> usize {
        self.visited[self.active_slot.index()].len()
    }

    pub fn active_slot(&self) -> VisitedSlot {
        self.active_slot
    }

    pub fn switch_slot(&mut self, slot: VisitedSlot) {
        if slot != self.active_slot {
            debug!("room {} visited set {} -> {}", self.supertile, self.active_slot, slot);
        }
        self.active_slot = slot;
    }

    /// Forgets the active visited set so the room is explored again with its
    /// changed tiles.
    pub fn clear_visited(&mut self) {
        self.visited[self.active_slot.index()].clear();
    }

    /// Records a reachable tile. A discovered cell never goes back to the
    /// unreached sentinel.
    pub fn mark_reachable(&mut self, t: MapCoord, v: u8) {
        if v == UNREACHED && self.reachable[t] != UNREACHED {
            return;
        }
        self.reachable[t] = v;
    }

    pub fn reachable_count(&self) -> usize {
        self.reachable.count(|v| v != UNREACHED)
    }

    pub fn manipulable_props(&self, slot: u8) -> Option<u16> {
        self.manipulables
            .iter()
            .find(|m| m.slot == slot)
            .map(|m| m.props)
    }

    pub fn star_state(&self) -> u8 {
        self.star_state
    }

    /// Runs the room-tag service. Without tags nothing fires and the star
    /// state is left alone.
    pub fn activate_tags(&mut self, trigger: TagTrigger) -> Result<TagOutcome> {
        if !self.has_tags {
            return Ok(TagOutcome {
                fired: false,
                star_state: self.star_state,
            });
        }
        let outcome = self.tags.activate(&mut self.tiles, trigger)?;
        if outcome.fired {
            info!("room {} tag fired on {trigger:?}", self.supertile);
        }
        self.star_state = outcome.star_state;
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ground_truth::{InertTags, RoomMeta};

    fn room(tiles: TileMap, meta: RoomMeta) -> RoomState {
        RoomState::new(Supertile(0x12), RoomSnapshot { tiles, meta }, Box::new(InertTags))
    }

    #[test]
    fn test_reachable_never_reverts() {
        let mut r = room(TileMap::filled(0x00), RoomMeta::default());
        let t = MapCoord::new(0, 0x10, 0x10);
        assert_eq!(r.reachable[t], UNREACHED);
        r.mark_reachable(t, 0x00);
        r.mark_reachable(t, UNREACHED);
        assert_eq!(r.reachable[t], 0x00);
        assert_eq!(r.reachable_count(), 1);
    }

    #[test]
    fn test_visited_slots_are_separate() {
        let mut r = room(TileMap::filled(0x00), RoomMeta::default());
        let t = MapCoord::new(0, 0x10, 0x10);
        r.mark_visited(t);
        assert!(r.is_visited(t));
        r.switch_slot(VisitedSlot::Tag0);
        assert!(!r.is_visited(t));
        r.mark_visited(t);
        r.clear_visited();
        assert!(!r.is_visited(t));
        r.switch_slot(VisitedSlot::Star0);
        assert!(r.is_visited(t));
    }

    #[test]
    fn test_init_marks_swaps_and_unlocks_cells() -> Result<()> {
        let mut tiles = TileMap::filled(0x01);
        let cell = MapCoord::new(MapCoord::LAYER2, 0x20, 0x20);
        tiles[cell] = 0x5A;
        let meta = RoomMeta {
            swap_layers: vec![MapCoord::new(0, 0x10, 0x10)],
            locked_cells: vec![LockedCell {
                slot: 2,
                pos: cell.with_layer(0),
            }],
            ..RoomMeta::default()
        };
        let mut r = room(tiles, meta);
        r.init()?;
        assert!(r.swap_layers.contains(&MapCoord::new(MapCoord::LAYER2, 0x11, 0x11)));
        assert_eq!(r.swap_layers.len(), 8);
        assert_eq!(r.tiles[cell], 0x00);
        assert_eq!(r.tiles[cell.offset(0x41)], 0x00);
        // layer 1 did not hold the key tile:
        assert_eq!(r.tiles[cell.with_layer(0)], 0x01);
        Ok(())
    }

    #[test]
    fn test_tile_map_size_checked() {
        assert!(TileMap::from_bytes(&[0u8; 0x100]).is_err());
        assert!(TileMap::from_bytes(&[0u8; ROOM_TILES]).is_ok());
    }
}
