//! Supertile-level walk of each dungeon, without any tile flood fill: follows
//! header links (warp and stairs), doors on the room edges and open walkways
//! across the room border.

use anyhow::{Context, Result};
use hashbrown::HashSet;
use log::debug;
use roomreach_game::{Direction, MapCoord, Supertile};
use serde::{Deserialize, Serialize};

use crate::ground_truth::{Entrance, GroundTruth, RoomMeta};
use crate::room::TileMap;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DungeonRooms {
    pub dungeon_id: u8,
    pub entrances: Vec<u8>,
    pub supertiles: Vec<Supertile>,
}

fn is_walkway_bound(v: u8) -> bool {
    v == 0x02 || v == 0x04
}

/// Looks for a run of open floor enclosed by wall tiles (0x02/0x04) on both
/// ends along one border line.
pub fn has_walkway(line: &[u8]) -> bool {
    let mut x = 0;
    while x + 1 < line.len() {
        if !is_walkway_bound(line[x]) {
            x += 1;
            continue;
        }
        x += 1;
        if line[x] != 0x00 {
            continue;
        }
        x += 1;
        while x < line.len() {
            let v = line[x];
            x += 1;
            if is_walkway_bound(v) {
                return true;
            }
            if v != 0x00 {
                break;
            }
        }
    }
    false
}

fn border_line(tiles: &TileMap, layer: u16, edge: Direction) -> Vec<u8> {
    (0..0x40)
        .map(|i| {
            let t = match edge {
                Direction::North => MapCoord::new(layer, 0, i),
                Direction::South => MapCoord::new(layer, 0x3F, i),
                Direction::West => MapCoord::new(layer, i, 0),
                _ => MapCoord::new(layer, i, 0x3F),
            };
            tiles[t]
        })
        .collect()
}

fn neighbors(st: Supertile, tiles: &TileMap, meta: &RoomMeta) -> Vec<Supertile> {
    let mut next = Vec::new();

    for link in std::iter::once(meta.warp_exit_to).chain(meta.stair_exit_to) {
        if link.0 == 0 {
            continue;
        }
        let dest = link.in_map_of(st);
        debug!("  link {st} -> {dest}");
        next.push(dest);
    }

    for door in &meta.doors {
        let Some(edge) = door.pos.is_door_edge() else {
            continue;
        };
        // dungeon exits: 0x8E north/south, 0x89 east/west
        let v = tiles[door.pos.offset(0x41)];
        if v == 0x8E || v == 0x89 {
            continue;
        }
        if let Some(dest) = st.move_by(edge) {
            debug!("  door {edge} {st} -> {dest}");
            next.push(dest);
        }
    }

    for edge in [Direction::South, Direction::North, Direction::West, Direction::East] {
        let open = [0, MapCoord::LAYER2]
            .into_iter()
            .any(|layer| has_walkway(&border_line(tiles, layer, edge)));
        if !open {
            continue;
        }
        if let Some(dest) = st.move_by(edge) {
            debug!("  edge {edge} {st} -> {dest}");
            next.push(dest);
        }
    }

    next
}

/// Groups entrances by dungeon and collects every supertile reachable from
/// them. Rooms are read from `ground_truth` as captured, with doors closed.
pub fn walk_dungeons<G: GroundTruth>(
    ground_truth: &G,
    entrances: &[Entrance],
) -> Result<Vec<DungeonRooms>> {
    let mut dungeons: Vec<(DungeonRooms, HashSet<Supertile>)> = Vec::new();

    for entrance in entrances {
        let idx = match dungeons
            .iter()
            .position(|(d, _)| d.dungeon_id == entrance.dungeon_id)
        {
            Some(idx) => idx,
            None => {
                let dungeon = DungeonRooms {
                    dungeon_id: entrance.dungeon_id,
                    entrances: vec![],
                    supertiles: vec![],
                };
                dungeons.push((dungeon, HashSet::new()));
                dungeons.len() - 1
            }
        };
        let (dungeon, seen) = &mut dungeons[idx];
        dungeon.entrances.push(entrance.id);
        debug!("dungeon {:02x} entrance ${:02x}", dungeon.dungeon_id, entrance.id);

        let mut stack = vec![entrance.supertile];
        while let Some(st) = stack.pop() {
            if !seen.insert(st) {
                continue;
            }
            dungeon.supertiles.push(st);

            let (snapshot, _) = ground_truth
                .load_room(st)
                .with_context(|| format!("dungeon {:02x}", dungeon.dungeon_id))?;
            stack.extend(
                neighbors(st, &snapshot.tiles, &snapshot.meta)
                    .into_iter()
                    .filter(|dest| !seen.contains(dest)),
            );
        }
    }

    let mut dungeons: Vec<DungeonRooms> = dungeons.into_iter().map(|(d, _)| d).collect();
    dungeons.sort_by_key(|d| d.dungeon_id);
    Ok(dungeons)
}
