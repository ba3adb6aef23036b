//! Interface to whatever captured the room data (tile maps, door tables,
//! exit links) and can replay room-tag side effects.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result, bail, ensure};
use hashbrown::HashMap;
use log::debug;
use roomreach_game::{Direction, Door, DoorType, MapCoord, Supertile};
use serde::{Deserialize, Serialize};

use crate::room::TileMap;

/// Most doors a room's door table can hold.
pub const MAX_DOORS: usize = 16;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entrance {
    pub id: u8,
    pub dungeon_id: u8,
    pub supertile: Supertile,
    /// Where the player stands once the entrance has loaded.
    pub entry: MapCoord,
}

/// Entrance as captured: the player's absolute pixel position and layer.
#[derive(Copy, Clone, Debug, Serialize, Deserialize)]
pub struct EntranceRecord {
    pub id: u8,
    #[serde(default)]
    pub dungeon_id: u8,
    pub supertile: Supertile,
    pub link_x: u16,
    pub link_y: u16,
    #[serde(default)]
    pub link_layer: u16,
}

impl From<EntranceRecord> for Entrance {
    fn from(r: EntranceRecord) -> Self {
        Entrance {
            id: r.id,
            dungeon_id: r.dungeon_id,
            supertile: r.supertile,
            entry: MapCoord::from_abs(r.link_x, r.link_y, r.link_layer),
        }
    }
}

/// Raw door table row; a zero position terminates the table.
#[derive(Copy, Clone, Debug, Serialize, Deserialize)]
pub struct DoorTableEntry {
    pub pos: u16,
    pub door_type: u8,
    pub dir: u8,
}

pub fn parse_door_table(entries: &[DoorTableEntry]) -> Result<Vec<Door>> {
    let mut doors = Vec::new();
    for (i, e) in entries.iter().enumerate() {
        if e.pos == 0 {
            break;
        }
        ensure!(i < MAX_DOORS, "door table has more than {MAX_DOORS} entries");
        let dir = Direction::try_from(e.dir)
            .map_err(|_| anyhow::anyhow!("door {i} has invalid direction {}", e.dir))?;
        doors.push(Door {
            door_type: DoorType(e.door_type),
            pos: MapCoord(e.pos),
            dir,
        });
    }
    Ok(doors)
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manipulable {
    pub slot: u8,
    pub pos: MapCoord,
    /// Zero for a push block.
    pub props: u16,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockedCell {
    /// Chest slot; the cell's key tile is `0x58 + slot`.
    pub slot: u8,
    pub pos: MapCoord,
}

/// Per-room metadata captured alongside the tile map.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoomMeta {
    pub warp_exit_to: Supertile,
    pub stair_exit_to: [Supertile; 4],
    pub warp_exit_layer2: bool,
    pub stair_target_layer2: [bool; 4],
    #[serde(skip)]
    pub doors: Vec<Door>,
    pub swap_layers: Vec<MapCoord>,
    pub stairs: Vec<MapCoord>,
    pub manipulables: Vec<Manipulable>,
    pub locked_cells: Vec<LockedCell>,
    pub has_tags: bool,
}

/// On-disk form of `RoomMeta`: the door table is kept raw.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
struct RoomMetaFile {
    #[serde(flatten)]
    meta: RoomMeta,
    door_table: Vec<DoorTableEntry>,
}

#[derive(Clone, Debug)]
pub struct RoomSnapshot {
    pub tiles: TileMap,
    pub meta: RoomMeta,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TagTrigger {
    Load,
    PushBlock { slot: u8 },
    Star { pos: MapCoord },
    Switch { pos: MapCoord },
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct TagOutcome {
    pub fired: bool,
    /// Which star-tile configuration the room is in after the call.
    pub star_state: u8,
}

/// Room-tag side effects: may rewrite the tile map and reports whether a
/// tag fired.
pub trait RoomTags: Send {
    fn activate(&mut self, tiles: &mut TileMap, trigger: TagTrigger) -> Result<TagOutcome>;
}

/// Tags that never fire.
pub struct InertTags;

impl RoomTags for InertTags {
    fn activate(&mut self, _tiles: &mut TileMap, _trigger: TagTrigger) -> Result<TagOutcome> {
        Ok(TagOutcome::default())
    }
}

pub type TagScript = Arc<dyn Fn(&mut TileMap, TagTrigger) -> TagOutcome + Send + Sync>;

/// Tags driven by a closure, for synthetic rooms.
pub struct ScriptedTags(pub TagScript);

impl RoomTags for ScriptedTags {
    fn activate(&mut self, tiles: &mut TileMap, trigger: TagTrigger) -> Result<TagOutcome> {
        Ok((self.0)(tiles, trigger))
    }
}

pub trait GroundTruth: Send + Sync {
    fn entrances(&self) -> Vec<Entrance>;

    fn entrance(&self, id: u8) -> Result<Entrance> {
        match self.entrances().into_iter().find(|e| e.id == id) {
            Some(e) => Ok(e),
            None => bail!("unknown entrance ${id:02x}"),
        }
    }

    fn load_room(&self, st: Supertile) -> Result<(RoomSnapshot, Box<dyn RoomTags>)>;
}

#[derive(Clone, Default)]
pub struct MemoryGroundTruth {
    entrances: Vec<Entrance>,
    rooms: HashMap<Supertile, RoomSnapshot>,
    tags: HashMap<Supertile, TagScript>,
}

impl MemoryGroundTruth {
    pub fn new() -> MemoryGroundTruth {
        MemoryGroundTruth::default()
    }

    pub fn add_entrance(&mut self, entrance: Entrance) -> &mut Self {
        self.entrances.push(entrance);
        self
    }

    pub fn add_room(&mut self, st: Supertile, tiles: TileMap, meta: RoomMeta) -> &mut Self {
        self.rooms.insert(st, RoomSnapshot { tiles, meta });
        self
    }

    pub fn set_tags(&mut self, st: Supertile, script: TagScript) -> &mut Self {
        self.tags.insert(st, script);
        self
    }
}

impl GroundTruth for MemoryGroundTruth {
    fn entrances(&self) -> Vec<Entrance> {
        self.entrances.clone()
    }

    fn load_room(&self, st: Supertile) -> Result<(RoomSnapshot, Box<dyn RoomTags>)> {
        let snapshot = self
            .rooms
            .get(&st)
            .with_context(|| format!("no snapshot for room {st}"))?
            .clone();
        let tags: Box<dyn RoomTags> = match self.tags.get(&st) {
            Some(script) => Box::new(ScriptedTags(script.clone())),
            None => Box::new(InertTags),
        };
        Ok((snapshot, tags))
    }
}

/// Snapshot directory layout:
///
/// - `entrances.json`: list of `EntranceRecord`
/// - `rooms/XXX.json`: room metadata and raw door table
/// - `rooms/XXX.tmap`: 0x2000-byte tile map
///
/// Rooms are read on demand. Tags from a snapshot directory never fire.
#[derive(Clone)]
pub struct SnapshotDir {
    root: PathBuf,
    entrances: Vec<Entrance>,
}

impl SnapshotDir {
    pub fn open(root: &Path) -> Result<SnapshotDir> {
        let path = root.join("entrances.json");
        let s = std::fs::read_to_string(&path)
            .with_context(|| format!("Unable to read {}", path.display()))?;
        let records: Vec<EntranceRecord> = serde_json::from_str(&s)
            .with_context(|| format!("Unable to parse {}", path.display()))?;
        Ok(SnapshotDir {
            root: root.to_owned(),
            entrances: records.into_iter().map(Entrance::from).collect(),
        })
    }

    fn room_path(&self, st: Supertile, ext: &str) -> PathBuf {
        self.root.join("rooms").join(format!("{:03X}.{ext}", st.0))
    }
}

impl GroundTruth for SnapshotDir {
    fn entrances(&self) -> Vec<Entrance> {
        self.entrances.clone()
    }

    fn load_room(&self, st: Supertile) -> Result<(RoomSnapshot, Box<dyn RoomTags>)> {
        let tmap_path = self.room_path(st, "tmap");
        let bytes = std::fs::read(&tmap_path)
            .with_context(|| format!("Unable to read {}", tmap_path.display()))?;
        let tiles = TileMap::from_bytes(&bytes)
            .with_context(|| format!("Bad tile map {}", tmap_path.display()))?;

        let meta_path = self.room_path(st, "json");
        let s = std::fs::read_to_string(&meta_path)
            .with_context(|| format!("Unable to read {}", meta_path.display()))?;
        let file: RoomMetaFile = serde_json::from_str(&s)
            .with_context(|| format!("Unable to parse {}", meta_path.display()))?;
        let mut meta = file.meta;
        meta.doors = parse_door_table(&file.door_table)
            .with_context(|| format!("Bad door table in {}", meta_path.display()))?;
        debug!("loaded room {st} with {} doors", meta.doors.len());

        Ok((RoomSnapshot { tiles, meta }, Box::new(InertTags)))
    }
}
