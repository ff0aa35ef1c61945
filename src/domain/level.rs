/// Level definitions: the persisted description of one playable stage.
///
/// A level is a floor length (segment count), an ordered obstacle-name
/// sequence (one per slot, fixed slot spacing), and optional collectible
/// positions. The collection is stored as a single JSON document, indices
/// contiguous `0..N-1`; deleting shifts all subsequent indices down.
///
/// `LevelDefinition` is owned exclusively by the level store; the assembler
/// only reads.

use glam::Vec3;
use serde::{Deserialize, Serialize};

/// One playable stage.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LevelDefinition {
    /// 1-based ordinal, matches storage order.
    pub level_name: u32,
    /// Number of floor segments laid end to end. The last one is the
    /// finish segment.
    pub floor_length: u32,
    /// One obstacle-type name per slot. Length determines the slot count.
    pub obstacle_names: Vec<String>,
    /// Diamond positions, each coordinate rounded to 2 decimals for storage.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diamond_positions: Option<Vec<[f32; 3]>>,
}

impl LevelDefinition {
    pub fn new(level_name: u32, floor_length: u32, obstacle_names: Vec<String>) -> Self {
        LevelDefinition {
            level_name,
            floor_length,
            obstacle_names,
            diamond_positions: None,
        }
    }

    /// Number of obstacle slots this level lays out.
    pub fn slot_count(&self) -> usize {
        self.obstacle_names.len()
    }

    /// Store diamond positions from live world coordinates, rounding each
    /// coordinate to 2 decimal places (storage compactness; the live scene
    /// round-trips to within 0.01 units).
    pub fn set_diamond_positions(&mut self, positions: &[Vec3]) {
        if positions.is_empty() {
            self.diamond_positions = None;
            return;
        }
        self.diamond_positions = Some(
            positions.iter()
                .map(|p| [round2(p.x), round2(p.y), round2(p.z)])
                .collect(),
        );
    }

    /// Diamond positions as world coordinates (empty when none stored).
    pub fn diamond_positions(&self) -> Vec<Vec3> {
        self.diamond_positions
            .as_deref()
            .unwrap_or(&[])
            .iter()
            .map(|p| Vec3::new(p[0], p[1], p[2]))
            .collect()
    }
}

/// Round to 2 decimal places.
pub fn round2(v: f32) -> f32 {
    (v * 100.0).round() / 100.0
}
