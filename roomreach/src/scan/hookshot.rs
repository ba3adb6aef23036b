use hashbrown::HashMap;
use roomreach_game::tile::{can_hook_thru, is_always_walkable, is_hookable};
use roomreach_game::{Direction, LinkState, MapCoord};

use super::ScanState;
use crate::room::TileMap;

fn is_ledge(v: u8) -> bool {
    (0x28..=0x2B).contains(&v)
}

/// Casts a hookshot from `start` heading `d`, covering at most `max_tiles`
/// tiles. A ledge start first has to find the matching ledge on the far side.
///
/// On a hit, every tile of the span gets `d`'s bit OR'd into `marks` and the
/// walkable tile in front of the target is returned as a new walk state.
/// Misses mark nothing.
pub fn scan_hookshot(
    tiles: &TileMap,
    marks: &mut HashMap<MapCoord, u8>,
    start: MapCoord,
    d: Direction,
    max_tiles: usize,
) -> Option<ScanState> {
    let mut i = 0;
    let mut t = start;
    let mut pt = start;

    let ledge = tiles[start];
    if is_ledge(ledge) {
        while i < max_tiles {
            t = t.move_by(d, 1)?;
            if tiles[t] == ledge {
                break;
            }
            i += 1;
        }
        if tiles[t] != ledge {
            return None;
        }
    }

    let mut landing = None;
    while i < max_tiles {
        // the tile before the target must be solid ground to land on; pits
        // are never marked visited so this also keeps the fill from looping
        if is_hookable(tiles[t]) && is_always_walkable(tiles[pt]) {
            landing = Some(pt);
            break;
        }
        if !can_hook_thru(tiles[t]) {
            return None;
        }
        pt = t;
        t = t.move_by(d, 1)?;
        i += 1;
    }
    let landing = landing?;

    let mut t = start;
    for _ in 0..i {
        *marks.entry(t).or_default() |= d.mask();
        match t.move_by(d, 1) {
            Some(next) => t = next,
            None => break,
        }
    }

    Some(ScanState {
        t: landing,
        d,
        s: LinkState::Walk,
    })
}
