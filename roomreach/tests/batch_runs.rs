use std::sync::Arc;

use anyhow::Result;
use roomreach::batch::{BatchRunner, EntranceOutcome};
use roomreach::config::{EngineConfig, GraphScope, ScanMode};
use roomreach::entrance_table::{EntranceSupertiles, EntranceTable};
use roomreach::error::ClassificationError;
use roomreach::ground_truth::{Entrance, GroundTruth, MemoryGroundTruth, RoomMeta};
use roomreach::report::summarize;
use roomreach::room::TileMap;
use roomreach_game::{MapCoord, Supertile};

fn at(row: u16, col: u16) -> MapCoord {
    MapCoord::new(0, row, col)
}

fn floor_room() -> TileMap {
    let mut tiles = TileMap::filled(0x01);
    for row in 0x10..0x30 {
        for col in 0x10..0x30 {
            tiles[at(row, col)] = 0x00;
        }
    }
    tiles
}

/// Entrance 1 is a plain room, entrance 2 runs into a scrolling floor tile
/// and entrance 3 starts in a room that was never captured.
fn ground_truth() -> MemoryGroundTruth {
    let mut gt = MemoryGroundTruth::new();
    gt.add_room(Supertile(0x12), floor_room(), RoomMeta::default());

    let mut broken = floor_room();
    broken[at(0x18, 0x18)] = 0x0C;
    gt.add_room(Supertile(0x34), broken, RoomMeta::default());

    for (id, st) in [(1, 0x12), (2, 0x34), (3, 0x56)] {
        gt.add_entrance(Entrance {
            id,
            dungeon_id: 0x02,
            supertile: Supertile(st),
            entry: at(0x20, 0x20),
        });
    }
    gt
}

fn check_outcomes(runs: &[roomreach::batch::EntranceRun]) {
    assert_eq!(runs.len(), 3);
    let ids: Vec<u8> = runs.iter().map(|r| r.outcome.entrance()).collect();
    assert_eq!(ids, vec![1, 2, 3]);

    let rooms = runs[0].outcome.rooms().map(|r| r.supertiles.clone());
    assert_eq!(rooms, Some(vec![Supertile(0x12)]));

    assert!(matches!(
        runs[1].outcome.classification_error(),
        Some(ClassificationError::UnhandledTileTransition { value: 0x0C, .. })
    ));

    assert!(matches!(runs[2].outcome, EntranceOutcome::Failed { entrance: 3, .. }));
    assert!(runs[2].outcome.classification_error().is_none());
}

#[test]
fn failed_entrances_do_not_stop_the_batch() -> Result<()> {
    let gt = ground_truth();
    let config = EngineConfig::default();
    let runs = BatchRunner::new(&config, &gt).run(&gt.entrances());
    check_outcomes(&runs);

    // each entrance gets its own graph by default
    assert!(!Arc::ptr_eq(&runs[0].graph, &runs[1].graph));
    Ok(())
}

#[test]
fn parallel_batch_matches_sequential() -> Result<()> {
    let gt = ground_truth();
    let config = EngineConfig::default();
    let runs = BatchRunner::new(&config, &gt)
        .parallel(true)
        .run(&gt.entrances());
    check_outcomes(&runs);
    Ok(())
}

#[test]
fn shared_scope_reuses_rooms() -> Result<()> {
    let mut gt = MemoryGroundTruth::new();
    gt.add_room(Supertile(0x12), floor_room(), RoomMeta::default());
    for (id, row) in [(1, 0x20), (2, 0x28)] {
        gt.add_entrance(Entrance {
            id,
            dungeon_id: 0x02,
            supertile: Supertile(0x12),
            entry: at(row, 0x20),
        });
    }
    let config = EngineConfig {
        graph_scope: GraphScope::Shared,
        ..EngineConfig::default()
    };
    let runs = BatchRunner::new(&config, &gt).run(&gt.entrances());
    assert_eq!(runs.len(), 2);
    assert!(Arc::ptr_eq(&runs[0].graph, &runs[1].graph));

    let summaries = summarize(&runs[0].graph)?;
    assert_eq!(summaries.len(), 1);
    assert_eq!(summaries[0].reachable_count, 0x20 * 0x20);
    Ok(())
}

#[test]
fn static_mode_uses_entrance_table() -> Result<()> {
    let mut gt = ground_truth();
    gt.add_room(Supertile(0x13), floor_room(), RoomMeta::default());
    let table = EntranceTable {
        entrances: vec![EntranceSupertiles {
            entrance: 1,
            supertiles: vec![Supertile(0x12), Supertile(0x13)],
        }],
    };
    let config = EngineConfig {
        scan_mode: ScanMode::Static,
        ..EngineConfig::default()
    };
    let entrances: Vec<Entrance> = gt.entrances().into_iter().filter(|e| e.id <= 2).collect();
    let runs = BatchRunner::new(&config, &gt)
        .with_static_table(&table)
        .run(&entrances);

    let rooms = runs[0].outcome.rooms().map(|r| r.supertiles.clone());
    assert_eq!(rooms, Some(vec![Supertile(0x12), Supertile(0x13)]));
    // nothing is flood filled in static mode
    let summaries = summarize(&runs[0].graph)?;
    assert_eq!(summaries.len(), 2);
    assert!(summaries.iter().all(|s| s.reachable_count == 0));

    // entrance 2 is not in the table
    assert!(matches!(runs[1].outcome, EntranceOutcome::Failed { entrance: 2, .. }));

    let rebuilt = EntranceTable::from_rooms(runs.iter().filter_map(|r| r.outcome.rooms()));
    assert_eq!(rebuilt, table);
    Ok(())
}
