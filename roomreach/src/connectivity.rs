//! Room-to-room connectivity: runs the flood fill from an entrance, turns
//! reachable tiles into exits, and follows every exit into the next room.

use std::sync::{Arc, Mutex, MutexGuard};

use anyhow::{Context, Result, anyhow};
use hashbrown::{HashMap, HashSet};
use log::{debug, info};
use roomreach_game::{Direction, LinkState, MapCoord, Supertile, TileKind};
use serde::{Deserialize, Serialize};

use crate::config::{EngineConfig, ScanMode};
use crate::entrance_table::EntranceTable;
use crate::error::ClassificationError;
use crate::ground_truth::{Entrance, GroundTruth, TagTrigger};
use crate::room::{EntryPoint, ExitPoint, RoomState, VisitedSlot};
use crate::scan::{Scan, ScanEvent, ScanState};

pub type SharedRoom = Arc<Mutex<RoomState>>;

#[derive(Default)]
struct RoomCache {
    rooms: HashMap<Supertile, SharedRoom>,
    order: Vec<Supertile>,
}

/// Rooms discovered so far, each behind its own lock. The cache lock is only
/// held to look up or insert a room, never while a room is locked.
#[derive(Default)]
pub struct RoomGraph {
    cache: Mutex<RoomCache>,
}

impl RoomGraph {
    pub fn new() -> RoomGraph {
        RoomGraph::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, RoomCache>> {
        self.cache
            .lock()
            .map_err(|_| anyhow!("room graph lock poisoned"))
    }

    pub fn get(&self, st: Supertile) -> Result<Option<SharedRoom>> {
        Ok(self.lock()?.rooms.get(&st).cloned())
    }

    /// Returns the room for `st`, creating it with `load` if this is the
    /// first request. Loading runs without the cache lock; if two threads race
    /// the first insert wins.
    pub fn get_or_insert(
        &self,
        st: Supertile,
        load: impl FnOnce() -> Result<RoomState>,
    ) -> Result<SharedRoom> {
        if let Some(room) = self.get(st)? {
            return Ok(room);
        }
        let room = load()?;
        let mut cache = self.lock()?;
        if let Some(existing) = cache.rooms.get(&st) {
            return Ok(existing.clone());
        }
        let room = Arc::new(Mutex::new(room));
        cache.rooms.insert(st, room.clone());
        cache.order.push(st);
        Ok(room)
    }

    /// Supertiles in the order they were first loaded.
    pub fn supertiles(&self) -> Result<Vec<Supertile>> {
        Ok(self.lock()?.order.clone())
    }

    pub fn len(&self) -> Result<usize> {
        Ok(self.lock()?.order.len())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    pub fn with_room<R>(&self, st: Supertile, f: impl FnOnce(&RoomState) -> R) -> Result<Option<R>> {
        let Some(room) = self.get(st)? else {
            return Ok(None);
        };
        let room = lock_room(&room, st)?;
        Ok(Some(f(&room)))
    }
}

fn lock_room(room: &SharedRoom, st: Supertile) -> Result<MutexGuard<'_, RoomState>> {
    room.lock().map_err(|_| anyhow!("room {st} lock poisoned"))
}

/// Rooms an entrance reaches, in discovery order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntranceRooms {
    pub entrance: Entrance,
    pub supertiles: Vec<Supertile>,
}

/// Landing coordinate and heading in the destination room for an interroom
/// staircase, given the tile beside it that tells which kind it is.
///
/// Each layer change on either end of the stairs moves the landing 2 rows
/// for spiral stairs and 4 rows for straight north/south stairs.
pub fn stair_destination(
    t: MapCoord,
    v: u8,
    beside: u8,
    d: Direction,
    target_layer: u16,
) -> Option<(MapCoord, Direction)> {
    let ascending = v & 0x04 == 0;
    let layer_changes = i32::from(t.is_layer2()) + i32::from(target_layer != 0);
    let sign = if ascending { 1 } else { -1 };
    let at = |dt: i32| MapCoord(dt.rem_euclid(0x1000) as u16).with_layer(target_layer);
    let col = i32::from(t.col());

    match beside {
        0x5E | 0x5F => Some((
            t.offset(sign * 0x80 * layer_changes).with_layer(target_layer),
            d.opposite(),
        )),
        0x38 => Some((at(col + 0xF40 - sign * 0x100 * layer_changes), d)),
        0x39 => Some((at(col + 0x80 - sign * 0x100 * layer_changes), d)),
        0x00 => Some((t.with_layer(target_layer), d.opposite())),
        _ => None,
    }
}

pub struct ConnectivityBuilder<'a, G: GroundTruth> {
    config: &'a EngineConfig,
    ground_truth: &'a G,
    graph: &'a RoomGraph,
    static_table: Option<&'a EntranceTable>,
}

impl<'a, G: GroundTruth> ConnectivityBuilder<'a, G> {
    pub fn new(config: &'a EngineConfig, ground_truth: &'a G, graph: &'a RoomGraph) -> Self {
        ConnectivityBuilder {
            config,
            ground_truth,
            graph,
            static_table: None,
        }
    }

    pub fn with_static_table(mut self, table: &'a EntranceTable) -> Self {
        self.static_table = Some(table);
        self
    }

    pub fn graph(&self) -> &RoomGraph {
        self.graph
    }

    pub fn process_entrance(&self, entrance: &Entrance) -> Result<EntranceRooms> {
        info!("entrance ${:02x} start", entrance.id);
        let rooms = match self.config.scan_mode {
            ScanMode::FloodFill => self.flood_entrance(entrance),
            ScanMode::Static => self.static_entrance(entrance),
        }
        .with_context(|| format!("entrance ${:02x}", entrance.id))?;
        info!(
            "entrance ${:02x} complete: {} rooms",
            entrance.id,
            rooms.supertiles.len()
        );
        Ok(rooms)
    }

    fn load_room(&self, st: Supertile) -> Result<SharedRoom> {
        let static_mode = self.config.scan_mode == ScanMode::Static;
        self.graph.get_or_insert(st, || {
            let (snapshot, tags) = self.ground_truth.load_room(st)?;
            let mut room = RoomState::new(st, snapshot, tags);
            if static_mode {
                room.init_static();
            } else {
                room.init()?;
            }
            Ok(room)
        })
    }

    fn static_entrance(&self, entrance: &Entrance) -> Result<EntranceRooms> {
        let table = self
            .static_table
            .context("static scan mode needs an entrance table")?;
        let listed = table
            .get(entrance.id)
            .with_context(|| format!("entrance ${:02x} not in the entrance table", entrance.id))?;
        for &st in &listed.supertiles {
            self.load_room(st)?;
        }
        Ok(EntranceRooms {
            entrance: *entrance,
            supertiles: listed.supertiles.clone(),
        })
    }

    fn flood_entrance(&self, entrance: &Entrance) -> Result<EntranceRooms> {
        let mut lifo = Vec::with_capacity(0x100);
        lifo.push(EntryPoint {
            supertile: entrance.supertile,
            point: entrance.entry,
            direction: Direction::None,
            from: ExitPoint::default(),
        });

        // each entry point is scanned from once; warps between pits of two
        // rooms would otherwise refill the stack forever
        let mut scanned: HashSet<(Supertile, MapCoord, Direction)> = HashSet::new();
        let mut supertiles = Vec::new();

        while let Some(ep) = lifo.pop() {
            if !scanned.insert((ep.supertile, ep.point, ep.direction)) {
                continue;
            }
            let st = ep.supertile;
            let room = self.load_room(st)?;
            if !supertiles.contains(&st) {
                supertiles.push(st);
            }

            let mut room = lock_room(&room, st)?;
            self.scan_from(&mut room, &ep, &mut lifo)
                .with_context(|| format!("room {st} from entry {ep}"))?;
        }

        Ok(EntranceRooms {
            entrance: *entrance,
            supertiles,
        })
    }

    fn scan_from(
        &self,
        room: &mut RoomState,
        ep: &EntryPoint,
        lifo: &mut Vec<EntryPoint>,
    ) -> Result<()> {
        let mut scan = Scan::new(
            room,
            ScanState::walk(ep.point, ep.direction),
            self.config.hookshot_max_tiles,
        );
        while let Some(event) = scan.next() {
            self.visit(scan.room_mut(), ep, event?, lifo)?;
        }
        Ok(())
    }

    fn push_entry(room: &mut RoomState, mut ep: EntryPoint, lifo: &mut Vec<EntryPoint>) {
        ep.supertile = ep.supertile.in_map_of(room.supertile);
        room.entry_points.push(ep);
        room.exit_points.push(ExitPoint {
            supertile: ep.supertile,
            point: ep.from.point,
            direction: ep.from.direction,
            worth_marking: ep.from.worth_marking,
        });
        debug!("room {} exit {} to {ep}", room.supertile, ep.from.point);
        lifo.push(ep);
    }

    fn visit(
        &self,
        room: &mut RoomState,
        ep: &EntryPoint,
        event: ScanEvent,
        lifo: &mut Vec<EntryPoint>,
    ) -> Result<()> {
        let ScanEvent { state, value: v } = event;
        let (t, d) = (state.t, state.d);
        let this = room.supertile;
        let exit = ExitPoint {
            supertile: ep.supertile,
            point: t,
            direction: d,
            worth_marking: false,
        };

        room.mark_reachable(t, v);

        match TileKind::classify(v) {
            TileKind::Floor => {
                // edge walkways lead straight into the neighbor:
                let Some(edir) = t.is_edge() else {
                    return Ok(());
                };
                if let (Some(sn), Some(landing)) = (this.move_by(edir), t.opposite_edge()) {
                    let to = EntryPoint {
                        supertile: sn,
                        point: landing,
                        direction: edir,
                        from: exit,
                    };
                    Self::push_entry(room, to, lifo);
                }
            }

            TileKind::Door(_) => {
                // dungeon exits were sealed on load, so this is a normal door
                let (layer, row, col) = t.row_col();
                let landing = if row >= 0x3A {
                    Some((Direction::South, MapCoord::new(layer, 0x06, col)))
                } else if row <= 0x06 {
                    Some((Direction::North, MapCoord::new(layer, 0x3A, col)))
                } else if col >= 0x3A {
                    Some((Direction::East, MapCoord::new(layer, row, 0x06)))
                } else if col <= 0x06 {
                    Some((Direction::West, MapCoord::new(layer, row, 0x3A)))
                } else {
                    None
                };
                if let Some((dir, point)) = landing {
                    if let Some(sn) = this.move_by(dir) {
                        let to = EntryPoint {
                            supertile: sn,
                            point,
                            direction: dir,
                            from: exit,
                        };
                        Self::push_entry(room, to, lifo);
                    }
                }
            }

            TileKind::Doorway(_)
            | TileKind::TeleportDoorway
            | TileKind::EntranceDoorway(_) => self.doorway_exit(room, t, v, d, exit, lifo)?,
            TileKind::ToggleDoorway if v <= 0x97 => self.doorway_exit(room, t, v, d, exit, lifo)?,

            TileKind::StairExit { index, .. } => {
                let mut beside = room.tiles[t.offset(-0x40)];
                if beside == 0x80 || beside == 0x26 {
                    beside = room.tiles[t.offset(0x40)];
                }
                let target_layer = room.stair_target_layer[index];
                let Some((point, direction)) = stair_destination(t, v, beside, d, target_layer)
                else {
                    return Err(ClassificationError::UnhandledTileTransition {
                        coord: t,
                        value: v,
                        dir: d,
                        state: LinkState::Walk,
                    }
                    .into());
                };
                let to = EntryPoint {
                    supertile: room.stair_exit_to[index],
                    point,
                    direction,
                    from: exit,
                };
                Self::push_entry(room, to, lifo);
            }

            TileKind::Pit if !self.config.has_pit_damage(this) => {
                let worth_marking = !room.marked_pit;
                room.marked_pit = true;
                self.warp_exit(room, t, d, ExitPoint { worth_marking, ..exit }, lifo);
            }
            TileKind::BombableFloor if !self.config.has_pit_damage(this) => {
                let worth_marking = !room.marked_floor;
                room.marked_floor = true;
                self.warp_exit(room, t, d, ExitPoint { worth_marking, ..exit }, lifo);
            }
            TileKind::WarpFloor => {
                // one corner of the 2x2 warp
                let worth_marking = t.0 & 0x40 == 0 && t.0 & 0x01 == 0;
                self.warp_exit(room, t, d, ExitPoint { worth_marking, ..exit }, lifo);
            }

            TileKind::Manipulable(slot) => {
                if room.manipulable_props(slot) == Some(0) && room.has_tags {
                    debug!("room {this} push block {slot} at {t}");
                    room.activate_tags(TagTrigger::PushBlock { slot })?;
                    room.switch_slot(VisitedSlot::Tag0);
                }
            }

            TileKind::StarTile => {
                if matches!(room.tiles.read16(t), 0x3A3A | 0x3B3B) {
                    room.activate_tags(TagTrigger::Star { pos: t })?;
                    let slot = if room.star_state() == 0 {
                        VisitedSlot::Star0
                    } else {
                        VisitedSlot::Star1
                    };
                    room.switch_slot(slot);
                }
            }

            TileKind::FloorSwitch => {
                if matches!(room.tiles.read16(t), 0x2323 | 0x2424)
                    && room.activate_tags(TagTrigger::Switch { pos: t })?.fired
                {
                    room.clear_visited();
                }
            }

            _ => {}
        }
        Ok(())
    }

    fn warp_exit(
        &self,
        room: &mut RoomState,
        t: MapCoord,
        d: Direction,
        exit: ExitPoint,
        lifo: &mut Vec<EntryPoint>,
    ) {
        let to = EntryPoint {
            supertile: room.warp_exit_to,
            point: t.with_layer(room.warp_exit_layer),
            direction: d,
            from: exit,
        };
        Self::push_entry(room, to, lifo);
    }

    /// A doorway reached in its door zone, heading out of the room.
    fn doorway_exit(
        &self,
        room: &mut RoomState,
        t: MapCoord,
        v: u8,
        d: Direction,
        exit: ExitPoint,
        lifo: &mut Vec<EntryPoint>,
    ) -> Result<()> {
        let Some(edir) = t.is_door_edge().filter(|&edir| edir == d) else {
            return Ok(());
        };

        // the doorway may run through a layer swap:
        let mut swap = 0;
        let mut tn = t;
        for _ in 0..self.config.doorway_swap_scan_tiles {
            let vd = room.tiles[tn];
            room.mark_reachable(tn, vd);
            if matches!(vd, 0x90..=0x9F | 0xA8..=0xAF) || room.swap_layers.contains(&tn) {
                swap = MapCoord::LAYER2;
            }
            match tn.move_by(edir, 1) {
                Some(next) => tn = next,
                None => break,
            }
        }
        let point = MapCoord(t.on_edge(edir.opposite()).0 ^ swap);

        let supertile = if v == 0x89 {
            match edir {
                Direction::West => room.stair_exit_to[2],
                Direction::East => room.stair_exit_to[3],
                _ => {
                    return Err(ClassificationError::InvalidApproachDirection {
                        coord: t,
                        value: v,
                        dir: edir,
                    }
                    .into());
                }
            }
        } else {
            match room.supertile.move_by(edir) {
                Some(sn) => sn,
                None => return Ok(()),
            }
        };

        let to = EntryPoint {
            supertile,
            point,
            direction: edir,
            from: exit,
        };
        Self::push_entry(room, to, lifo);
        Ok(())
    }
}
