use roomreach_game::{Direction, LinkState, MapCoord};
use thiserror::Error;

/// Tile grammar violations. Any of these means the room snapshot breaks an
/// assumption the whole engine relies on, so the entrance being analyzed is
/// abandoned.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClassificationError {
    #[error("unhandled tile ${value:02x} at {coord} heading {dir} while in {state} state")]
    UnhandledTileTransition {
        coord: MapCoord,
        value: u8,
        dir: Direction,
        state: LinkState,
    },

    #[error("tile ${value:02x} at {coord} approached from {dir}")]
    InvalidApproachDirection {
        coord: MapCoord,
        value: u8,
        dir: Direction,
    },

    #[error("something blocking the doorway at {coord}: ${value:02x}")]
    BlockedDoorway { coord: MapCoord, value: u8 },

    #[error("no stopping tile within {limit} tiles of {coord} heading {dir}")]
    SearchBoundExceeded {
        coord: MapCoord,
        dir: Direction,
        limit: usize,
    },
}
