/// Level assembler: materializes a `LevelDefinition` into live, traversable
/// geometry and tears it down again.
///
/// ## Assembly order (strict):
///   1. Full clear of any existing live instance — never an incremental diff
///   2. Floor segments end to end at a fixed pitch; the last segment is the
///      distinguished finish segment (finish trigger + confetti spawner)
///   3. One slot per obstacle name at `i * gap + offset`, resolved against
///      the catalog; each slot carries exactly one paired score trigger
///   4. Diamonds at their stored coordinates
///   5. Only then is the instance marked ready — "not ready" means
///      "do not allow movement yet"
///
/// The inverse direction, `capture`, reads the live scene back into a
/// `LevelDefinition` for authoring round trips.
///
/// The assembler also owns the contact sweep: as the track scrolls, slots,
/// diamonds, and the finish segment crossing the player plane produce the
/// contact events the orchestrator reacts to.

use glam::Vec3;
use log::{debug, warn};
use rand::Rng;

use crate::config::TrackConfig;
use crate::domain::catalog::{ObstacleCatalog, ObstacleKind};
use crate::domain::grid::GridCell;
use crate::domain::level::LevelDefinition;

/// Depth of the trailing score trigger behind each obstacle slot.
const SCORE_TRIGGER_DEPTH: f32 = 2.0;
/// Pickup radius for diamonds, in the lane/row plane and along the track.
pub const DIAMOND_RADIUS: f32 = 0.9;

#[derive(Clone, Debug)]
pub struct FloorSegment {
    pub z: f32,
    /// The finish segment carries the level-complete trigger and the
    /// confetti spawner.
    pub finish: bool,
}

#[derive(Clone, Debug)]
pub struct ObstacleSlot {
    pub z: f32,
    pub kind: ObstacleKind,
    /// Paired score trigger: fires exactly once per attempt.
    pub scored: bool,
}

#[derive(Clone, Debug)]
pub struct Diamond {
    pub pos: Vec3,
    pub collected: bool,
}

/// Contact produced by the sweep as geometry crosses the player plane.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Contact {
    ObstacleHit,
    SlotCleared,
    DiamondCollected,
    FinishCrossed,
}

/// The currently assembled geometry. Owned exclusively by the assembler;
/// fully torn down and recreated on every level (re)load.
#[derive(Clone, Debug, Default)]
pub struct LiveLevel {
    pub floors: Vec<FloorSegment>,
    pub slots: Vec<ObstacleSlot>,
    pub diamonds: Vec<Diamond>,
    /// Slots dropped because their obstacle name did not resolve.
    pub skipped_slots: usize,
    /// Distance the track has scrolled this attempt.
    pub travel: f32,
    finish_fired: bool,
    ready: bool,
}

impl LiveLevel {
    pub fn is_ready(&self) -> bool {
        self.ready
    }

    /// Track length: depth of the far edge of the finish segment.
    pub fn track_end(&self) -> f32 {
        self.floors.last().map(|f| f.z).unwrap_or(0.0)
    }
}

pub struct LevelAssembler {
    catalog: ObstacleCatalog,
    track: TrackConfig,
    live: LiveLevel,
}

impl LevelAssembler {
    pub fn new(catalog: ObstacleCatalog, track: TrackConfig) -> Self {
        LevelAssembler { catalog, track, live: LiveLevel::default() }
    }

    pub fn live(&self) -> &LiveLevel {
        &self.live
    }

    pub fn is_ready(&self) -> bool {
        self.live.ready
    }

    pub fn catalog(&self) -> &ObstacleCatalog {
        &self.catalog
    }

    // ── Assembly / teardown ──

    /// Tear down the current instance. Readers see "not ready" immediately.
    pub fn clear(&mut self) {
        self.live = LiveLevel::default();
    }

    /// Materialize `def`. Unresolvable obstacle names are reported and the
    /// slot is skipped; assembly continues.
    pub fn assemble(&mut self, def: &LevelDefinition) {
        self.clear();

        self.add_floor(def.floor_length);

        for (i, name) in def.obstacle_names.iter().enumerate() {
            let z = i as f32 * self.track.obstacle_gap + self.track.slot_offset;
            match self.catalog.resolve(name) {
                Ok(kind) => {
                    self.live.slots.push(ObstacleSlot { z, kind, scored: false });
                }
                Err(e) => {
                    warn!("slot {} of level {}: {e}; skipping slot", i + 1, def.level_name);
                    self.live.skipped_slots += 1;
                }
            }
        }

        for pos in def.diamond_positions() {
            self.live.diamonds.push(Diamond { pos, collected: false });
        }

        self.live.ready = true;
        debug!(
            "level {} assembled: {} floors, {} slots, {} diamonds",
            def.level_name,
            self.live.floors.len(),
            self.live.slots.len(),
            self.live.diamonds.len(),
        );
    }

    fn add_floor(&mut self, floor_length: u32) {
        for i in 0..floor_length {
            let z = i as f32 * self.track.floor_pitch + self.track.floor_offset;
            let finish = i == floor_length - 1;
            self.live.floors.push(FloorSegment { z, finish });
        }
    }

    /// Random variant for rapid prototyping: slot count derived from the
    /// floor length, each slot a uniform catalog pick. Not used for shipped
    /// content.
    pub fn assemble_random(&mut self, floor_length: u32, rng: &mut impl Rng) {
        self.clear();
        self.add_floor(floor_length);

        for i in 0..random_slot_count(floor_length, self.track.obstacle_gap) {
            let z = i as f32 * self.track.obstacle_gap + self.track.slot_offset;
            let kind = self.catalog.entries()[rng.random_range(0..self.catalog.len())];
            self.live.slots.push(ObstacleSlot { z, kind, scored: false });
        }

        self.live.ready = true;
    }

    // ── Capture (authoring round trip) ──

    /// Read the live scene back into a definition: floor-segment count,
    /// slot obstacle names in track order, diamond positions rounded to
    /// 2 decimals. The caller assigns the ordinal when storing.
    pub fn capture(&self) -> LevelDefinition {
        let mut def = LevelDefinition::new(
            0,
            self.live.floors.len() as u32,
            self.live.slots.iter().map(|s| s.kind.name().to_string()).collect(),
        );
        let positions: Vec<Vec3> = self.live.diamonds.iter().map(|d| d.pos).collect();
        def.set_diamond_positions(&positions);
        def
    }

    // ── Contact sweep ──

    /// Scroll the track by `distance` and report everything that crossed
    /// the player plane. `player_cell` decides obstacle collisions,
    /// `player_pos` decides diamond pickups.
    pub fn advance(
        &mut self,
        distance: f32,
        player_cell: GridCell,
        player_pos: Vec3,
    ) -> Vec<Contact> {
        let mut contacts = vec![];
        if !self.live.ready {
            return contacts;
        }

        let plane = self.track.player_plane;
        let prev = self.live.travel;
        let travel = prev + distance;
        self.live.travel = travel;

        for slot in &mut self.live.slots {
            // Leading edge reaches the plane: collision check.
            let eff_prev = slot.z - prev;
            let eff_now = slot.z - travel;
            if eff_prev > plane && eff_now <= plane && slot.kind.blocks(player_cell.col, player_cell.row) {
                contacts.push(Contact::ObstacleHit);
            }
            // Trailing score trigger exits the plane: score exactly once.
            let exit_line = plane - SCORE_TRIGGER_DEPTH;
            if !slot.scored && eff_prev > exit_line && eff_now <= exit_line {
                slot.scored = true;
                contacts.push(Contact::SlotCleared);
            }
        }

        for diamond in &mut self.live.diamonds {
            if diamond.collected {
                continue;
            }
            let eff_z = diamond.pos.z - travel;
            let in_plane = (eff_z - plane).abs() <= DIAMOND_RADIUS;
            let in_cell = (diamond.pos.x - player_pos.x).abs() <= DIAMOND_RADIUS
                && (diamond.pos.y - player_pos.y).abs() <= DIAMOND_RADIUS;
            if in_plane && in_cell {
                diamond.collected = true;
                contacts.push(Contact::DiamondCollected);
            }
        }

        // Finish trigger: the finish segment crossing the plane ends the
        // attempt (fires once).
        if !self.live.finish_fired {
            if let Some(finish) = self.live.floors.iter().find(|f| f.finish) {
                if finish.z - travel <= plane {
                    self.live.finish_fired = true;
                    contacts.push(Contact::FinishCrossed);
                }
            }
        }

        contacts
    }
}

/// Slot count for a random level: `round(floor_length * 11 / gap) - 2`,
/// clamped to zero.
fn random_slot_count(floor_length: u32, gap: f32) -> u32 {
    let raw = (floor_length as f32 * 11.0 / gap).round() as i64 - 2;
    raw.max(0) as u32
}
