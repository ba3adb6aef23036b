//! Door-opening geometry run once when a room is loaded.
//!
//! The captured tile map still shows closed doors. Doors leading out of the
//! dungeon are sealed so reachability stays inside, and the rest are blown
//! open into doorway tiles so the flood fill can pass through.

use log::{debug, info, warn};
use roomreach_game::{Direction, Door, DoorType, MapCoord};

use crate::error::ClassificationError;
use crate::room::TileMap;

const EDGE_DOORWAY_TILES: usize = 12;

fn is_ledge(v: u8) -> bool {
    (0x28..=0x2B).contains(&v)
}

/// Doorway tile written into a blown-open door, by axis and layer.
fn doorway_tile(door: &Door) -> u8 {
    let layer = (door.pos.layer() >> 10) as u8;
    if door.dir.is_vertical() {
        0x80 | layer
    } else {
        0x81 | layer
    }
}

/// Neighbor that forms the other half of the two-tile-wide doorway.
fn doorway_adjacent(dir: Direction) -> i32 {
    if dir.is_vertical() {
        0x01
    } else {
        0x40
    }
}

pub fn open_door(tiles: &mut TileMap, door: &Door) -> Result<(), ClassificationError> {
    if door.dir == Direction::None {
        warn!("door {door} has no direction; leaving it closed");
        return Ok(());
    }

    open_stairwell(tiles, door);

    if door.door_type.is_exit() {
        seal_exit(tiles, door);
        return Ok(());
    }

    if door.door_type == DoorType::EXPLODING_WALL {
        clear_exploding_wall(tiles, door);
        return Ok(());
    }

    if door.pos.is_door_edge().is_some() {
        blow_edge_doorway(tiles, door)
    } else {
        blow_interior_doorway(tiles, door)
    }
}

/// Doors placed in front of interroom stairs cover the stair entrance.
fn open_stairwell(tiles: &mut TileMap, door: &Door) {
    let stair = match door.dir {
        Direction::North => door.pos.offset(0x01),
        Direction::South => door.pos.offset(0xC1),
        Direction::East => door.pos.offset(0x43),
        Direction::West => door.pos.offset(0x40),
        Direction::None => return,
    };
    if (0x30..=0x39).contains(&tiles[stair]) {
        debug!("opening stairwell behind door {door}");
        tiles.fill_2x2(door.pos.offset(0x41), 0x00);
    }
}

fn seal_exit(tiles: &mut TileMap, door: &Door) {
    for y in 0..4 {
        for x in 0..4 {
            let t = door.pos.offset((y << 6) + x);
            if tiles[t] >= 0xF0 {
                tiles[t] = 0x00;
            }
        }
    }
}

fn clear_exploding_wall(tiles: &mut TileMap, door: &Door) {
    info!("exploding wall {}", door.pos);
    let pos = i32::from(door.pos.0);
    let mut clear = |i: i32| {
        if (0..0x2000).contains(&i) {
            tiles[MapCoord(i as u16)] = 0x00;
        }
    };
    for c in 0..11 {
        for r in 0..12 {
            clear(pos + (r << 6) - c);
            clear(pos + (r << 6) + 1 + c);
        }
    }
}

fn blow_edge_doorway(tiles: &mut TileMap, door: &Door) -> Result<(), ClassificationError> {
    let start = match door.dir {
        Direction::North => door.pos.offset(0x81),
        Direction::South | Direction::East => door.pos.offset(0x41),
        Direction::West => door.pos.offset(0x42),
        Direction::None => return Ok(()),
    };
    let doorway = doorway_tile(door);
    let adj = doorway_adjacent(door.dir);

    let door_tile = tiles[start];
    if door_tile < 0xF0 {
        // custom doorway; leave it alone
        return Ok(());
    }

    let can_blow = |v: u8| v == 0x00 || v == 0x01 || v == door_tile || is_ledge(v) || v == 0x10;

    let mut tn = start;
    for _ in 0..EDGE_DOORWAY_TILES {
        let v = tiles[tn];
        if !can_blow(v) {
            return Err(ClassificationError::BlockedDoorway { coord: tn, value: v });
        }
        debug!("blow open {tn}");
        tiles[tn] = doorway;
        tiles[tn.offset(adj)] = doorway;

        match tn.move_by(door.dir, 1) {
            Some(next) => tn = next,
            None => break,
        }
    }
    Ok(())
}

/// Decides where the doorway behind an interior door ends.
struct StopRule {
    doorway: u8,
    door_tile: u8,
    opposite: Option<u8>,
}

impl StopRule {
    fn must_stop(&self, v: u8) -> bool {
        if v == 0x01 || v == self.doorway || is_ledge(v) {
            return false;
        }
        match self.opposite {
            // opened from a doorway tile: any door tile continues
            None => v < 0xF0,
            Some(opposite) => v != opposite && v != self.door_tile,
        }
    }
}

fn blow_interior_doorway(tiles: &mut TileMap, door: &Door) -> Result<(), ClassificationError> {
    let (start, max_count) = match door.dir {
        Direction::North => (door.pos.offset(0x81), 12),
        Direction::South => (door.pos.offset(0x41), 12),
        Direction::East | Direction::West => (door.pos.offset(0x42), 10),
        Direction::None => return Ok(()),
    };
    let doorway = doorway_tile(door);
    let adj = doorway_adjacent(door.dir);

    let door_tile = tiles[start];
    let rule = if (0x80..=0x8D).contains(&door_tile) {
        StopRule {
            doorway,
            door_tile,
            opposite: None,
        }
    } else if door_tile >= 0xF0 {
        let opposite = if door_tile >= 0xF8 {
            door_tile - 8
        } else {
            door_tile + 8
        };
        StopRule {
            doorway,
            door_tile,
            opposite: Some(opposite),
        }
    } else {
        warn!("unrecognized door tile at {start}: ${door_tile:02x}");
        return Ok(());
    };

    // find how far the doorway runs behind the door:
    let mut count = 0;
    let mut tn = start;
    let mut stopped = false;
    while count < max_count {
        if rule.must_stop(tiles[tn]) {
            stopped = true;
            break;
        }
        match tn.move_by(door.dir, 1) {
            Some(next) => tn = next,
            None => {
                stopped = true;
                break;
            }
        }
        count += 1;
    }
    if !stopped {
        return Err(ClassificationError::SearchBoundExceeded {
            coord: start,
            dir: door.dir,
            limit: max_count,
        });
    }

    let mut tn = start;
    for _ in 0..count {
        if rule.must_stop(tiles[tn]) {
            break;
        }
        tiles[tn] = doorway;
        tiles[tn.offset(adj)] = doorway;
        match tn.move_by(door.dir, 1) {
            Some(next) => tn = next,
            None => break,
        }
    }
    Ok(())
}
