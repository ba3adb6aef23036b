//! Flood fill over a room's tile map.
//!
//! `Scan` is a pull iterator: each `next()` pops work items off a LIFO until
//! it has reachable-tile events to hand out. Popping mutates the room's
//! active visited set, so a scan is single-pass; scanning again means
//! building a new `Scan` (which still sees tiles visited by earlier scans).
//!
//! Visitation policy: most tiles are marked visited the first time they are
//! processed. Pits and the pipe junction family are never marked so they can
//! be entered again from another direction; within one scan they are
//! deduplicated by (coordinate, direction, state) so the fill terminates.

pub mod hookshot;

use std::collections::VecDeque;
use std::fmt::{self, Display, Formatter};

use hashbrown::HashSet;
use roomreach_game::tile::{can_diagonal, is_straight_pipe};
use roomreach_game::Direction::{East, North, South, West};
use roomreach_game::{Axis, Direction, LinkState, MapCoord, PipeKind, TileKind};

use crate::error::ClassificationError;
use crate::room::RoomState;

use hookshot::scan_hookshot;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct ScanState {
    pub t: MapCoord,
    pub d: Direction,
    pub s: LinkState,
}

impl ScanState {
    pub fn walk(t: MapCoord, d: Direction) -> ScanState {
        ScanState {
            t,
            d,
            s: LinkState::Walk,
        }
    }
}

impl Display for ScanState {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{{{}, {}, {}}}", self.t, self.d, self.s)
    }
}

/// A reachable tile: the state it was reached in and its tile value.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ScanEvent {
    pub state: ScanState,
    pub value: u8,
}

pub struct Scan<'a> {
    room: &'a mut RoomState,
    lifo: Vec<ScanState>,
    pending: VecDeque<ScanEvent>,
    reentered: HashSet<ScanState>,
    hookshot_max_tiles: usize,
    failed: bool,
}

impl<'a> Scan<'a> {
    pub fn new(room: &'a mut RoomState, entry: ScanState, hookshot_max_tiles: usize) -> Scan<'a> {
        let mut lifo = Vec::with_capacity(0x200);
        lifo.push(entry);
        Scan {
            room,
            lifo,
            pending: VecDeque::new(),
            reentered: HashSet::new(),
            hookshot_max_tiles,
            failed: false,
        }
    }

    /// Access to the room between pulls, for side effects the consumer
    /// applies while the scan is still running.
    pub fn room_mut(&mut self) -> &mut RoomState {
        self.room
    }

    fn tile(&self, t: MapCoord) -> u8 {
        self.room.tiles[t]
    }

    fn push(&mut self, t: MapCoord, d: Direction, s: LinkState) {
        self.lifo.push(ScanState { t, d, s });
    }

    /// Pushes the tile `n` steps away, if the move is allowed.
    fn push_move(&mut self, from: MapCoord, d: Direction, n: u16, s: LinkState) {
        if let Some(tn) = from.move_by(d, n) {
            self.push(tn, d, s);
        }
    }

    fn mark(&mut self, t: MapCoord) {
        self.room.mark_visited(t);
    }

    fn visit(&mut self, state: ScanState, value: u8) {
        self.pending.push_back(ScanEvent { state, value });
    }

    /// Re-visitable tiles only pass once per (coordinate, direction, state)
    /// within a scan.
    fn first_reentry(&mut self, s: ScanState) -> bool {
        self.reentered.insert(s)
    }

    fn hookshot(&mut self, t: MapCoord, d: Direction) {
        let room = &mut *self.room;
        if let Some(landing) = scan_hookshot(
            &room.tiles,
            &mut room.hookshot,
            t,
            d,
            self.hookshot_max_tiles,
        ) {
            self.lifo.push(landing);
        }
    }

    fn push_all_directions(&mut self, t: MapCoord, s: LinkState) {
        let mut moved = [false; 4];
        for (i, d) in [North, West, East, South].into_iter().enumerate() {
            if let Some(tn) = t.move_by(d, 1) {
                self.push(tn, d, s);
                moved[i] = true;
            }
        }
        let [mn, mw, me, ms] = moved;

        if mn && mw && self.diagonal_open(t, -0x40, -0x01) {
            self.push(t.offset(-0x41), North, s);
        }
        if mn && me && self.diagonal_open(t, -0x40, 0x01) {
            self.push(t.offset(-0x3F), North, s);
        }
        if ms && mw && self.diagonal_open(t, 0x40, -0x01) {
            self.push(t.offset(0x3F), South, s);
        }
        if ms && me && self.diagonal_open(t, 0x40, 0x01) {
            self.push(t.offset(0x41), South, s);
        }
    }

    /// Diagonal squeezes only pass between pits and pipes, never solid tiles.
    fn diagonal_open(&self, t: MapCoord, a: i32, b: i32) -> bool {
        can_diagonal(self.tile(t.offset(a))) && can_diagonal(self.tile(t.offset(b)))
    }

    /// Coordinate three tiles out when the first two are pits.
    fn across_two_pits(&self, t: MapCoord, d: Direction) -> Option<MapCoord> {
        let t1 = t.move_by(d, 1).filter(|&t1| self.tile(t1) == 0x20)?;
        let t2 = t1.move_by(d, 1).filter(|&t2| self.tile(t2) == 0x20)?;
        t2.move_by(d, 1)
    }

    /// Doorway tiles stop the fill at the door edge in the heading direction.
    fn stop_or_step(&mut self, s: ScanState) {
        if s.t.is_door_edge() == Some(s.d) {
            return;
        }
        self.push_move(s.t, s.d, 1, LinkState::Walk);
    }

    fn step(&mut self) -> Result<(), ClassificationError> {
        let Some(s) = self.lifo.pop() else {
            return Ok(());
        };
        if self.room.is_visited(s.t) {
            return Ok(());
        }

        let v = self.tile(s.t);
        match s.s {
            LinkState::Pipe => {
                self.step_pipe(s, v);
                Ok(())
            }
            LinkState::Swim => self.step_swim(s, v),
            LinkState::Walk | LinkState::Fall => self.step_walk(s, v),
        }
    }

    fn step_pipe(&mut self, s: ScanState, v: u8) {
        // 00 and 01 are allowed inside pipes (TR $015 center area):
        if v == 0x00 || v == 0x01 {
            if self.first_reentry(s) {
                self.visit(s, v);
                self.push_move(s.t, s.d, 1, LinkState::Pipe);
            }
            return;
        }

        let Some(kind) = PipeKind::from_byte(v) else {
            return;
        };
        if kind.marks_visited() {
            self.mark(s.t);
        } else if !self.first_reentry(s) {
            return;
        }
        self.visit(s, v);

        match kind {
            PipeKind::Straight => {
                // jump over collision between a pipe and its exit:
                let next = s.t.move_by(s.d, 1);
                if let Some(tn) = next.filter(|&tn| self.tile(tn) & 0xF0 != 0xB0) {
                    if let Some(exit) = tn.move_by(s.d, 2).filter(|&e| self.tile(e) == 0xBE) {
                        self.push(exit, s.d, LinkState::Pipe);
                        return;
                    }
                }
                let Some(tn) = next else {
                    return;
                };
                // skip over a pipe crossing in the other direction:
                if self.tile(tn) == v ^ 0x01 {
                    if let Some(beyond) = tn.move_by(s.d, 2).filter(|&b| self.tile(b) == v) {
                        self.push(beyond, s.d, LinkState::Pipe);
                        return;
                    }
                }
                self.push(tn, s.d, LinkState::Pipe);
            }
            PipeKind::Turn(_) => {
                if let Some(d) = kind.turn(s.d) {
                    self.push_move(s.t, d, 1, LinkState::Pipe);
                }
            }
            PipeKind::LineExit => {
                if let Some(tn) = self.across_two_pits(s.t, s.d) {
                    if self.tile(tn) == 0x00 {
                        self.push(tn, s.d, LinkState::Walk);
                    }
                }
            }
            PipeKind::Junction(exits) => {
                for &d in exits {
                    self.push_move(s.t, d, 1, LinkState::Pipe);
                }
            }
            PipeKind::ExitCandidate => {
                self.push_move(s.t, s.d, 1, LinkState::Pipe);
                // exits across pits to either side:
                for side in [s.d.rotate_cw(), s.d.rotate_ccw()] {
                    if let Some(tn) = self.across_two_pits(s.t, side) {
                        if self.tile(tn) == 0x00 {
                            self.push(tn, side, LinkState::Walk);
                        }
                    }
                }
            }
            PipeKind::CrossOver => {
                self.push_move(s.t, s.d, 1, LinkState::Pipe);
            }
            PipeKind::Exit => {
                self.push_move(s.t, s.d, 1, LinkState::Walk);
            }
        }
    }

    fn step_swim(&mut self, s: ScanState, v: u8) -> Result<(), ClassificationError> {
        if !s.t.is_layer2() {
            return Err(ClassificationError::UnhandledTileTransition {
                coord: s.t,
                value: v,
                dir: s.d,
                state: s.s,
            });
        }

        let surface = s.t.with_layer(0);
        match TileKind::classify(v) {
            TileKind::Solid(0x02 | 0x03) => self.mark(s.t),
            TileKind::DeepWaterLadder => {
                self.mark(s.t);
                self.visit(s, v);
                self.push_move(surface, s.d, 1, LinkState::Walk);
            }
            TileKind::NorthStairs => {
                self.mark(s.t);
                self.visit(s, v);
                self.push_move(surface, North, 1, LinkState::Walk);
            }
            TileKind::SouthStairs => {
                self.mark(s.t);
                self.visit(s, v);
                self.push_move(surface, South, 1, LinkState::Walk);
            }
            // can swim over mostly everything on layer 2:
            _ => {
                self.mark(s.t);
                self.visit(s, v);
                self.push_all_directions(s.t, LinkState::Swim);
            }
        }
        Ok(())
    }

    fn step_walk(&mut self, s: ScanState, v: u8) -> Result<(), ClassificationError> {
        let unhandled = || ClassificationError::UnhandledTileTransition {
            coord: s.t,
            value: v,
            dir: s.d,
            state: s.s,
        };

        match TileKind::classify(v) {
            TileKind::DeepWater => {
                self.mark(s.t);
                self.visit(s, v);

                // dive to the swimming layer:
                let under = s.t.flip_layer();
                if !matches!(self.tile(under), 0x1C | 0x0D) {
                    self.push(under, s.d, LinkState::Swim);
                }
                self.push_move(s.t, s.d, 1, LinkState::Walk);
            }

            TileKind::Floor
            | TileKind::ShallowWater
            | TileKind::ManualStairs
            | TileKind::FloorSwitch
            | TileKind::Hazard
            | TileKind::StarTile
            | TileKind::ThickGrass
            | TileKind::WarpFloor
            | TileKind::RupeeFloor
            | TileKind::Conveyor
            | TileKind::DungeonSwapDoor
            | TileKind::Manipulable(_)
            | TileKind::BombableFloor
            | TileKind::CrystalPeg => {
                self.mark(s.t);
                self.visit(s, v);
                self.push_all_directions(s.t, LinkState::Walk);

                // water below us:
                let below = s.t.with_layer(MapCoord::LAYER2);
                if below != s.t && self.tile(below) == 0x08 && v != 0x0D {
                    self.push_all_directions(below, LinkState::Swim);
                }
            }

            TileKind::DeepWaterLadder => {
                self.mark(s.t);
                self.visit(s, v);

                let below = s.t.with_layer(MapCoord::LAYER2);
                self.mark(below);
                self.visit(
                    ScanState {
                        t: below,
                        d: s.d,
                        s: LinkState::Swim,
                    },
                    v,
                );
                self.push_move(below, s.d, 1, LinkState::Swim);
            }

            TileKind::LayerPassThrough => {
                self.mark(s.t);
                self.visit(s, v);

                if !s.t.is_layer2() {
                    let below = s.t.with_layer(MapCoord::LAYER2);
                    if self.tile(below) == 0x0C {
                        // scrolling floor underneath; acts as floor
                        self.push_all_directions(s.t, LinkState::Walk);
                    } else {
                        self.push(below, s.d, LinkState::Walk);
                    }
                }
                self.hookshot(s.t, s.d);
            }

            TileKind::ScrollingFloor => return Err(unhandled()),

            TileKind::NorthStairs | TileKind::SouthStairs => {
                self.mark(s.t);
                self.visit(s, v);
                self.push_move(s.t, s.d, 1, LinkState::Walk);
            }

            TileKind::NorthStairsLayerSwap | TileKind::SouthStairsLayerSwap => {
                self.mark(s.t);
                self.visit(s, v);
                if let Some(tn) = s.t.move_by(s.d, 2) {
                    self.push(tn.flip_layer(), s.d, LinkState::Walk);
                }
            }

            TileKind::Pit => {
                // not marked: the same pit may be fallen into from another side
                if !self.first_reentry(s) {
                    return Ok(());
                }
                self.visit(s, v);

                let near = s.t.move_by(s.d, 1).filter(|&t1| self.tile(t1) == 0x20);
                if let Some(t1) = near {
                    if let Some(t2) = t1.move_by(s.d, 1) {
                        self.land_beyond_pit(s, t1, t2);
                    }
                }

                // something hookable across the pit?
                self.hookshot(s.t, s.d);
            }

            TileKind::Ledge(ledge) => {
                if ledge != s.d && ledge != s.d.opposite() {
                    return Ok(());
                }
                self.mark(s.t);
                self.visit(s, v);
                self.hookshot(s.t, s.d);

                // the drop lands 4 tiles out:
                let Some(t) = s.t.move_by(s.d, 4) else {
                    return Ok(());
                };
                match self.tile(t) {
                    0x20 | 0x00 => self.push(t, s.d, LinkState::Walk),
                    0x1C => {
                        let t = t.flip_layer();
                        if self.tile(t) == 0x20 {
                            self.push(t, s.d, LinkState::Walk);
                        }
                    }
                    0x0C => {
                        return Err(ClassificationError::UnhandledTileTransition {
                            coord: t,
                            value: 0x0C,
                            dir: s.d,
                            state: s.s,
                        });
                    }
                    _ => {}
                }
            }

            TileKind::StairExit { .. } | TileKind::StraightStairs(_) => {
                self.mark(s.t);
                self.visit(s, v);
                // only the entry point may pass back through a staircase:
                if self.lifo.is_empty() {
                    self.push_move(s.t, s.d, 1, LinkState::Walk);
                }
            }

            TileKind::SpiralStairs => {
                self.mark(s.t);
                self.visit(s, v);
                self.push_move(s.t, s.d, 1, LinkState::Walk);
            }

            TileKind::Doorway(axis) => {
                if s.d == Direction::None {
                    self.scout(s.t, axis);
                    return Ok(());
                }
                if !axis.contains(s.d) {
                    return Err(ClassificationError::InvalidApproachDirection {
                        coord: s.t,
                        value: v,
                        dir: s.d,
                    });
                }
                self.mark(s.t);
                self.visit(s, v);
                self.stop_or_step(s);
            }

            TileKind::TeleportDoorway | TileKind::ToggleDoorway => {
                self.mark(s.t);
                self.visit(s, v);
                self.stop_or_step(s);
            }

            TileKind::EntranceDoorway(_) => {
                self.mark(s.t);
                self.visit(s, v);
                if s.d == Direction::None {
                    self.push_move(s.t, South, 1, LinkState::Walk);
                    self.push_move(s.t, North, 1, LinkState::Walk);
                    return Ok(());
                }
                self.stop_or_step(s);
            }

            TileKind::Pipe(PipeKind::Exit) => {
                self.mark(s.t);
                self.visit(s, v);
                // board the pipe: skip over the 2 tiles of the pipe mouth
                for d in [North, West, East, South] {
                    let Some(tn) = s.t.move_by(d, 1) else {
                        continue;
                    };
                    if !is_straight_pipe(self.tile(tn)) {
                        continue;
                    }
                    if let Some(tn) = tn.move_by(d, 2) {
                        self.push(tn, d, LinkState::Pipe);
                    }
                }
            }

            TileKind::Door(_) => {
                if s.d == Direction::None {
                    // head away from whichever side has open floor:
                    for side in [North, East, South, West] {
                        if let Some(tn) = s.t.move_by(side, 1) {
                            if self.tile(tn) == 0x00 {
                                self.push(tn, side.opposite(), LinkState::Walk);
                                return Ok(());
                            }
                        }
                    }
                    // too far inside the door
                    return Ok(());
                }
                self.mark(s.t);
                self.visit(s, v);
                self.push_move(s.t, s.d, 2, LinkState::Walk);
            }

            TileKind::Pipe(_)
            | TileKind::HookTarget
            | TileKind::Chest(_)
            | TileKind::Solid(_) => {}
        }
        Ok(())
    }

    /// Pits two deep: what is on the far side decides how we continue. `t1`
    /// is the far pit, `t` the tile beyond it.
    fn land_beyond_pit(&mut self, s: ScanState, t1: MapCoord, t: MapCoord) {
        let v = self.tile(t);
        match v {
            // pipe line start:
            0xB6 | 0xBC => {
                self.mark(t);
                self.visit(ScanState::walk(t, s.d), v);
                for d in [North, West, East, South] {
                    if let Some(tn) = t.move_by(d, 1) {
                        if is_straight_pipe(self.tile(tn)) {
                            self.push(tn, d, LinkState::Pipe);
                        }
                    }
                }
            }
            0x00 => {
                // stepping back from the landing crosses the gap, it does not
                // fall into it:
                self.reentered.insert(ScanState::walk(t1, s.d.opposite()));
                self.push(t, s.d, LinkState::Walk);
            }
            _ => {}
        }
    }

    /// Directionless entry into a doorway: try both ways along its axis.
    fn scout(&mut self, t: MapCoord, axis: Axis) {
        for d in axis.directions() {
            if t.move_by(d, 1).is_some() {
                self.push(t, d, LinkState::Walk);
            }
        }
    }
}

impl Iterator for Scan<'_> {
    type Item = Result<ScanEvent, ClassificationError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(event) = self.pending.pop_front() {
                return Some(Ok(event));
            }
            if self.failed || self.lifo.is_empty() {
                return None;
            }
            if let Err(err) = self.step() {
                self.failed = true;
                self.lifo.clear();
                self.pending.clear();
                return Some(Err(err));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ground_truth::{InertTags, RoomMeta, RoomSnapshot};
    use crate::room::TileMap;
    use roomreach_game::tile::{is_always_walkable, is_maybe_walkable};
    use roomreach_game::Supertile;

    fn room(tiles: TileMap) -> RoomState {
        RoomState::new(
            Supertile(0x12),
            RoomSnapshot {
                tiles,
                meta: RoomMeta::default(),
            },
            Box::new(InertTags),
        )
    }

    fn run(room: &mut RoomState, entry: ScanState) -> Result<Vec<ScanEvent>, ClassificationError> {
        Scan::new(room, entry, 0x10).collect()
    }

    fn at(row: u16, col: u16) -> MapCoord {
        MapCoord::new(0, row, col)
    }

    #[test]
    fn test_open_room_reaches_all_but_corners() {
        let mut r = room(TileMap::filled(0x00));
        let events = run(&mut r, ScanState::walk(at(0x20, 0x20), Direction::None)).unwrap();
        assert_eq!(events.len(), 0x1000 - 4);
        assert!(events.iter().all(|e| !e.state.t.is_layer2() && e.value == 0x00));
        assert!(!r.is_visited(at(0x00, 0x00)));
        assert!(!r.is_visited(at(0x3F, 0x3F)));
        assert!(r.is_visited(at(0x00, 0x05)));
        assert!(r.hookshot.is_empty());
    }

    #[test]
    fn test_straight_pipe_chain() {
        let mut tiles = TileMap::filled(0x01);
        let start = at(0x10, 0x10);
        for (i, v) in [0xB0, 0xB0, 0xB0, 0xBE, 0x00].into_iter().enumerate() {
            tiles[start.offset(i as i32)] = v;
        }
        let mut r = room(tiles);
        let entry = ScanState {
            t: start,
            d: East,
            s: LinkState::Pipe,
        };
        let events = run(&mut r, entry).unwrap();
        let values: Vec<u8> = events.iter().map(|e| e.value).collect();
        assert_eq!(values, vec![0xB0, 0xB0, 0xB0, 0xBE, 0x00]);
        assert_eq!(events[4].state, ScanState::walk(start.offset(4), East));
    }

    #[test]
    fn test_perpendicular_ledge_discarded() {
        let mut tiles = TileMap::filled(0x01);
        let t = at(0x10, 0x10);
        tiles[t] = 0x28;
        let mut r = room(tiles);
        let events = run(&mut r, ScanState::walk(t, East)).unwrap();
        assert!(events.is_empty());
        assert!(!r.is_visited(t));
    }

    #[test]
    fn test_entrance_doorway_stops_at_door_edge() {
        let mut tiles = TileMap::filled(0x01);
        for row in 0..=0x0C {
            tiles[at(row, 0x10)] = 0x8E;
        }
        let mut r = room(tiles);
        let events = run(&mut r, ScanState::walk(at(0x0C, 0x10), North)).unwrap();
        assert_eq!(events.len(), 5);
        assert_eq!(events[4].state.t, at(0x08, 0x10));
        assert!(!r.is_visited(at(0x07, 0x10)));
    }

    #[test]
    fn test_junction_block_terminates() {
        let mut tiles = TileMap::filled(0x02);
        let t = at(0x10, 0x10);
        tiles.fill_2x2(t, 0xBB);
        let mut r = room(tiles);
        let entry = ScanState {
            t,
            d: East,
            s: LinkState::Pipe,
        };
        let events = run(&mut r, entry).unwrap();
        assert!(!events.is_empty());
        assert!(events.len() <= 4 * 5);
        // junctions are never recorded as visited
        assert_eq!(r.visited_count(), 0);
    }

    #[test]
    fn test_two_pits_then_floor() {
        let mut tiles = TileMap::filled(0x01);
        let t = at(0x10, 0x10);
        tiles[t] = 0x20;
        tiles[t.offset(1)] = 0x20;
        tiles[t.offset(2)] = 0x00;
        let mut r = room(tiles);
        let events = run(&mut r, ScanState::walk(t, East)).unwrap();
        assert_eq!(events[0].value, 0x20);
        assert_eq!(events[1].state, ScanState::walk(t.offset(2), East));
        // walking back from the landing does not fall into the far pit
        assert_eq!(events.len(), 2);
        assert!(!r.is_visited(t));
        assert!(!r.is_visited(t.offset(1)));
    }

    #[test]
    fn test_swim_on_upper_layer_fails_once() {
        let mut r = room(TileMap::filled(0x08));
        let entry = ScanState {
            t: at(0x10, 0x10),
            d: East,
            s: LinkState::Swim,
        };
        let mut scan = Scan::new(&mut r, entry, 0x10);
        assert!(matches!(
            scan.next(),
            Some(Err(ClassificationError::UnhandledTileTransition {
                state: LinkState::Swim,
                ..
            }))
        ));
        assert!(scan.next().is_none());
    }

    #[test]
    fn test_perpendicular_doorway_is_an_error() {
        let mut tiles = TileMap::filled(0x01);
        let t = at(0x10, 0x10);
        tiles[t] = 0x80;
        let mut r = room(tiles);
        let err = run(&mut r, ScanState::walk(t, East)).unwrap_err();
        assert_eq!(
            err,
            ClassificationError::InvalidApproachDirection {
                coord: t,
                value: 0x80,
                dir: East
            }
        );
    }

    #[test]
    fn test_directionless_door_infers_heading() {
        let mut tiles = TileMap::filled(0x01);
        let t = at(0x20, 0x20);
        tiles[t] = 0xF0;
        tiles[t.offset(0x40)] = 0x00;
        let mut r = room(tiles);
        let events = run(&mut r, ScanState::walk(t, Direction::None)).unwrap();
        assert_eq!(events[0].state, ScanState::walk(t.offset(0x40), North));
        // the door itself is only marked once crossed with a heading
        assert!(r.is_visited(t));
    }

    #[test]
    fn test_deep_water_dives_to_lower_layer() {
        let mut tiles = TileMap::filled(0x02);
        let t = at(0x10, 0x10);
        tiles[t] = 0x08;
        let under = t.flip_layer();
        tiles[under] = 0x08;
        tiles[under.offset(1)] = 0x08;
        let mut r = room(tiles);
        let events = run(&mut r, ScanState::walk(t, East)).unwrap();
        let swum: Vec<MapCoord> = events
            .iter()
            .filter(|e| e.state.s == LinkState::Swim)
            .map(|e| e.state.t)
            .collect();
        assert!(swum.contains(&under));
        assert!(swum.contains(&under.offset(1)));
    }

    #[test]
    fn test_stairs_pass_back_only_from_entry() {
        let mut tiles = TileMap::filled(0x01);
        let t = at(0x10, 0x10);
        tiles[t] = 0x38;
        tiles[t.offset(0x40)] = 0x00;
        let mut r = room(tiles);
        let events = run(&mut r, ScanState::walk(t, South)).unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[1].state.t, t.offset(0x40));
    }

    #[test]
    fn test_layer_pass_through_drops_to_layer2() {
        let mut tiles = TileMap::filled(0x01);
        let t = at(0x10, 0x10);
        tiles[t] = 0x1C;
        let below = t.with_layer(MapCoord::LAYER2);
        tiles[below] = 0x00;
        let mut r = room(tiles);
        let events = run(&mut r, ScanState::walk(t, East)).unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].value, 0x1C);
        assert_eq!(events[1].state, ScanState::walk(below, East));
    }

    #[test]
    fn test_layer_pass_through_over_scrolling_floor_acts_as_floor() {
        let mut tiles = TileMap::filled(0x01);
        let t = at(0x10, 0x10);
        tiles[t] = 0x1C;
        tiles[t.offset(1)] = 0x00;
        tiles[t.with_layer(MapCoord::LAYER2)] = 0x0C;
        let mut r = room(tiles);
        let events = run(&mut r, ScanState::walk(t, East)).unwrap();
        assert_eq!(events.len(), 2);
        assert!(events.iter().all(|e| !e.state.t.is_layer2()));
        assert!(events.iter().any(|e| e.state.t == t.offset(1) && e.value == 0x00));
    }

    #[test]
    fn test_ledge_drop_lands_four_tiles_out() {
        let mut tiles = TileMap::filled(0x01);
        let t = at(0x10, 0x10);
        tiles[t] = 0x2B;
        tiles[t.offset(4)] = 0x00;
        let mut r = room(tiles);
        let events = run(&mut r, ScanState::walk(t, East)).unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].value, 0x2B);
        assert_eq!(events[1].state, ScanState::walk(t.offset(4), East));
        // the tiles jumped over are never reached
        assert!(!r.is_visited(t.offset(2)));
    }

    #[test]
    fn test_ledge_drop_through_layer_gap() {
        let mut tiles = TileMap::filled(0x01);
        let t = at(0x10, 0x10);
        tiles[t] = 0x2B;
        tiles[t.offset(4)] = 0x1C;
        let pit = t.offset(4).flip_layer();
        tiles[pit] = 0x20;
        let mut r = room(tiles);
        let events = run(&mut r, ScanState::walk(t, East)).unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[1].state, ScanState::walk(pit, East));
        assert_eq!(events[1].value, 0x20);
    }

    #[test]
    fn test_pits_then_line_start_boards_pipe() {
        let mut tiles = TileMap::filled(0x01);
        let t = at(0x10, 0x10);
        tiles[t] = 0x20;
        tiles[t.offset(1)] = 0x20;
        tiles[at(0x10, 0x12)] = 0xB6;
        tiles[at(0x11, 0x12)] = 0xB0;
        tiles[at(0x12, 0x12)] = 0xBE;
        let mut r = room(tiles);
        let events = run(&mut r, ScanState::walk(t, East)).unwrap();
        let values: Vec<u8> = events.iter().map(|e| e.value).collect();
        assert_eq!(values, vec![0x20, 0xB6, 0xB0, 0xBE]);
        assert_eq!(events[1].state, ScanState::walk(at(0x10, 0x12), East));
        assert_eq!(
            events[2].state,
            ScanState {
                t: at(0x11, 0x12),
                d: South,
                s: LinkState::Pipe
            }
        );
        assert!(r.is_visited(at(0x10, 0x12)));
    }

    #[test]
    fn test_ladder_enters_water_below() {
        let mut tiles = TileMap::filled(0x02);
        let t = at(0x10, 0x10);
        tiles[t] = 0x0A;
        let below = t.with_layer(MapCoord::LAYER2);
        tiles[below.offset(1)] = 0x08;
        let mut r = room(tiles);
        let events = run(&mut r, ScanState::walk(t, East)).unwrap();
        assert_eq!(events.len(), 3);
        assert_eq!(events[0].state, ScanState::walk(t, East));
        let swim = |t| ScanState {
            t,
            d: East,
            s: LinkState::Swim,
        };
        assert_eq!(events[1].state, swim(below));
        assert_eq!(events[1].value, 0x0A);
        assert_eq!(events[2].state, swim(below.offset(1)));
        assert_eq!(events[2].value, 0x08);
    }

    #[test]
    fn test_layer_swap_stairs() {
        let mut tiles = TileMap::filled(0x01);
        let t = at(0x20, 0x10);
        tiles[t] = 0x1E;
        let up = at(0x1E, 0x10).with_layer(MapCoord::LAYER2);
        tiles[up] = 0x00;
        let mut r = room(tiles);
        let events = run(&mut r, ScanState::walk(t, North)).unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[1].state, ScanState::walk(up, North));

        let mut tiles = TileMap::filled(0x01);
        tiles[t] = 0x3E;
        let down = at(0x22, 0x10).with_layer(MapCoord::LAYER2);
        tiles[down] = 0x00;
        let mut r = room(tiles);
        let events = run(&mut r, ScanState::walk(t, South)).unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[1].state, ScanState::walk(down, South));
    }

    #[test]
    fn test_hookshot_lands_across_pit_field() {
        let mut tiles = TileMap::filled(0x01);
        let t = at(0x10, 0x10);
        for i in 0..3 {
            tiles[t.offset(i)] = 0x20;
        }
        tiles[t.offset(3)] = 0x00;
        tiles[t.offset(4)] = 0x27;
        let mut r = room(tiles);
        let events = run(&mut r, ScanState::walk(t, East)).unwrap();
        // only the hookshot reaches the floor in front of the target
        assert_eq!(events[1].state, ScanState::walk(t.offset(3), East));
        assert!(r.is_visited(t.offset(3)));
        assert_eq!(r.hookshot.len(), 4);
        assert_eq!(r.hookshot.get(&t.offset(3)), Some(&East.mask()));
        assert!(!r.hookshot.contains_key(&t.offset(4)));
    }

    #[test]
    fn test_doorway_scout_skips_refused_moves() {
        // a north/south doorway on the west border cannot move vertically
        let mut tiles = TileMap::filled(0x01);
        let t = at(0x20, 0x00);
        tiles[t] = 0x80;
        let mut r = room(tiles);
        let events = run(&mut r, ScanState::walk(t, Direction::None)).unwrap();
        assert!(events.is_empty());
        assert!(!r.is_visited(t));
    }

    #[test]
    fn test_walkable_tiles_spread() {
        let t = at(0x10, 0x10);
        for v in 0..=0xFFu8 {
            if !is_always_walkable(v) && !is_maybe_walkable(v) {
                continue;
            }
            let mut tiles = TileMap::filled(0x01);
            tiles[t] = v;
            tiles[t.offset(1)] = 0x00;
            let mut r = room(tiles);
            let events = run(&mut r, ScanState::walk(t, West)).unwrap();
            assert!(r.is_visited(t), "${v:02x}");
            assert!(
                events.iter().any(|e| e.state.t == t.offset(1)),
                "${v:02x} did not spread"
            );
        }
    }
}
