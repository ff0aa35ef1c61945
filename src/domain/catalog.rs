/// Obstacle catalog: the registered obstacle types a level may reference.
///
/// Level definitions store obstacle *names*; assembly resolves each name
/// against the catalog (first entry with a matching name wins). An
/// unresolvable name is a reported lookup failure — the slot is skipped,
/// assembly continues.
///
/// Each kind carries a blocked-cell mask over the 3×2 lane/row grid: the
/// cells a player standing in them would collide with.

use crate::domain::grid::{GRID_HEIGHT, GRID_WIDTH};
use crate::error::LevelError;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ObstacleKind {
    /// Low bar across the whole track — survivable only on the top row.
    HurdleLow,
    /// High bar across the whole track — survivable only on the bottom row.
    BarHigh,
    /// Full-height pillar in the left lane.
    PillarLeft,
    /// Full-height pillar in the center lane.
    PillarMid,
    /// Full-height pillar in the right lane.
    PillarRight,
    /// Wall with a single opening in the left lane.
    GateLeft,
    /// Wall with a single opening in the right lane.
    GateRight,
}

impl ObstacleKind {
    pub fn name(self) -> &'static str {
        match self {
            ObstacleKind::HurdleLow   => "HurdleLow",
            ObstacleKind::BarHigh     => "BarHigh",
            ObstacleKind::PillarLeft  => "PillarLeft",
            ObstacleKind::PillarMid   => "PillarMid",
            ObstacleKind::PillarRight => "PillarRight",
            ObstacleKind::GateLeft    => "GateLeft",
            ObstacleKind::GateRight   => "GateRight",
        }
    }

    /// Blocked-cell mask, bit `row * GRID_WIDTH + col`.
    fn mask(self) -> u8 {
        // Rows: 0 = bottom, 1 = top. Columns: 0 = left, 1 = center, 2 = right.
        const BOTTOM: u8 = 0b000_111;
        const TOP: u8 = 0b111_000;
        const COL_L: u8 = 0b001_001;
        const COL_M: u8 = 0b010_010;
        const COL_R: u8 = 0b100_100;
        match self {
            ObstacleKind::HurdleLow   => BOTTOM,
            ObstacleKind::BarHigh     => TOP,
            ObstacleKind::PillarLeft  => COL_L,
            ObstacleKind::PillarMid   => COL_M,
            ObstacleKind::PillarRight => COL_R,
            ObstacleKind::GateLeft    => COL_M | COL_R,
            ObstacleKind::GateRight   => COL_L | COL_M,
        }
    }

    /// Does this obstacle occupy grid cell (col, row)?
    pub fn blocks(self, col: usize, row: usize) -> bool {
        if col >= GRID_WIDTH || row >= GRID_HEIGHT {
            return false;
        }
        self.mask() & (1 << (row * GRID_WIDTH + col)) != 0
    }

    /// At least one survivable cell exists for every kind.
    #[allow(dead_code)]
    pub fn has_opening(self) -> bool {
        (0..GRID_WIDTH).any(|c| (0..GRID_HEIGHT).any(|r| !self.blocks(c, r)))
    }
}

/// Registration-ordered obstacle catalog.
#[derive(Clone, Debug)]
pub struct ObstacleCatalog {
    entries: Vec<ObstacleKind>,
}

impl ObstacleCatalog {
    /// The shipped catalog: every kind, in display order.
    pub fn standard() -> Self {
        ObstacleCatalog {
            entries: vec![
                ObstacleKind::HurdleLow,
                ObstacleKind::BarHigh,
                ObstacleKind::PillarLeft,
                ObstacleKind::PillarMid,
                ObstacleKind::PillarRight,
                ObstacleKind::GateLeft,
                ObstacleKind::GateRight,
            ],
        }
    }

    /// Resolve a stored obstacle name. First matching entry wins.
    pub fn resolve(&self, name: &str) -> Result<ObstacleKind, LevelError> {
        self.entries.iter()
            .copied()
            .find(|k| k.name() == name)
            .ok_or_else(|| LevelError::LookupFailure { name: name.to_string() })
    }

    pub fn entries(&self) -> &[ObstacleKind] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}
