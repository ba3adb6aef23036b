use std::path::PathBuf;

use anyhow::Result;
use roomreach::config::EngineConfig;
use roomreach::connectivity::{ConnectivityBuilder, RoomGraph};
use roomreach::ground_truth::{GroundTruth, SnapshotDir};
use roomreach::report::{summarize, write_reachable, write_summaries};
use roomreach_game::{MapCoord, ROOM_TILES, Supertile};

fn scratch_dir(name: &str) -> Result<PathBuf> {
    let dir = std::env::temp_dir().join(format!("roomreach-{name}-{}", std::process::id()));
    if dir.exists() {
        std::fs::remove_dir_all(&dir)?;
    }
    std::fs::create_dir_all(dir.join("rooms"))?;
    Ok(dir)
}

#[test]
fn snapshot_dir_round_trip() -> Result<()> {
    let dir = scratch_dir("snapshot")?;

    std::fs::write(
        dir.join("entrances.json"),
        r#"[{"id": 4, "dungeon_id": 2, "supertile": 18, "link_x": 1144, "link_y": 1048}]"#,
    )?;

    // open floor on layer 1 rows/cols $10-$2f, solid elsewhere
    let mut tiles = vec![0x01u8; ROOM_TILES];
    for row in 0x10..0x30 {
        for col in 0x10..0x30 {
            tiles[MapCoord::new(0, row, col).index()] = 0x00;
        }
    }
    std::fs::write(dir.join("rooms/012.tmap"), &tiles)?;
    std::fs::write(
        dir.join("rooms/012.json"),
        r#"{"warp_exit_to": 34, "door_table": [{"pos": 0, "door_type": 0, "dir": 0}]}"#,
    )?;

    let gt = SnapshotDir::open(&dir)?;
    let entrance = gt.entrance(4)?;
    assert_eq!(entrance.supertile, Supertile(0x12));
    assert_eq!(entrance.entry, MapCoord::from_abs(1144, 1048, 0));
    assert!(gt.entrance(5).is_err());

    let (snapshot, _) = gt.load_room(Supertile(0x12))?;
    assert_eq!(snapshot.meta.warp_exit_to, Supertile(0x22));
    assert!(snapshot.meta.doors.is_empty());
    assert!(gt.load_room(Supertile(0x13)).is_err());

    let config = EngineConfig::default();
    let graph = RoomGraph::new();
    let entrance = roomreach::ground_truth::Entrance {
        entry: MapCoord::new(0, 0x20, 0x20),
        ..entrance
    };
    let rooms = ConnectivityBuilder::new(&config, &gt, &graph).process_entrance(&entrance)?;
    assert_eq!(rooms.supertiles, vec![Supertile(0x12)]);

    let summaries = summarize(&graph)?;
    write_summaries(&summaries, &dir.join("summaries.json"))?;
    let written = std::fs::read_to_string(dir.join("summaries.json"))?;
    assert!(written.contains("\"reachable_count\": 1024"));

    assert_eq!(write_reachable(&graph, &dir.join("rch"))?, 1);
    let rch = std::fs::read(dir.join("rch/012.rch"))?;
    assert_eq!(rch.len(), ROOM_TILES);
    assert_eq!(rch[MapCoord::new(0, 0x20, 0x20).index()], 0x00);
    assert_eq!(rch[0], 0x01);

    std::fs::remove_dir_all(&dir)?;
    Ok(())
}
