/// Movement controller: applies discrete lane/row transitions in response
/// to directional input, serialized through motion and rotation queues so
/// overlapping transitions cannot corrupt position.
///
/// The logical grid cell updates the moment an input is accepted; the
/// animated world position catches up through the queue. Moves into a grid
/// boundary are no-ops, and input arriving while the waiting line is full
/// is dropped.
///
/// The controller is a pure consumer of orchestrator events: enabled by
/// attempt-start, disabled by pass/fail, snapped back to the home cell by
/// reset-complete.

use glam::Vec3;

use crate::config::MovementConfig;
use crate::domain::grid::{Direction, GridCell, GridLayout, HOME_CELL};
use crate::domain::tween::{Tween, TweenChain, TweenQueue};
use crate::sim::orchestrator::GameEvent;

/// Resting orientation: a slight forward lean, in euler degrees.
const NEUTRAL_ROT: Vec3 = Vec3::new(25.0, 0.0, 0.0);

/// Tilt pose held at the midpoint of a transition in each direction.
fn tilt_for(dir: Direction) -> Vec3 {
    match dir {
        Direction::Up => Vec3::new(-30.0, 0.0, 0.0),
        Direction::Down => Vec3::new(60.0, 0.0, 0.0),
        Direction::Left => Vec3::new(25.0, 0.0, 35.0),
        Direction::Right => Vec3::new(25.0, 0.0, -35.0),
    }
}

pub struct MovementController {
    layout: GridLayout,
    move_ticks: u32,
    enabled: bool,

    cell: GridCell,
    pos: Vec3,
    rot: Vec3,

    motion: TweenQueue,
    rotation: TweenQueue,
}

impl MovementController {
    pub fn new(layout: GridLayout, movement: &MovementConfig) -> Self {
        MovementController {
            layout,
            move_ticks: movement.move_ticks.max(1),
            enabled: false,
            cell: HOME_CELL,
            pos: layout.world_pos(HOME_CELL),
            rot: NEUTRAL_ROT,
            motion: TweenQueue::new(),
            rotation: TweenQueue::new(),
        }
    }

    // ── Accessors ──

    pub fn cell(&self) -> GridCell {
        self.cell
    }

    pub fn pos(&self) -> Vec3 {
        self.pos
    }

    pub fn rot(&self) -> Vec3 {
        self.rot
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    pub fn queued_moves(&self) -> usize {
        self.motion.len()
    }

    // ── Input ──

    /// Attempt one cell step. Boundary moves and input beyond the waiting
    /// cap are silently dropped.
    pub fn on_direction(&mut self, dir: Direction) {
        if !self.enabled {
            return;
        }
        let Some(next) = self.cell.step(dir) else {
            return; // clamped at the grid edge
        };

        let from = self.motion.pending_end().unwrap_or(self.pos);
        let to = self.layout.world_pos(next);
        if !self.motion.push(TweenChain::single(Tween::new(from, to, self.move_ticks))) {
            return; // waiting line full, input dropped
        }
        self.cell = next;

        // Tilt into the turn, settle back to neutral: one queued unit,
        // each phase half the transition.
        let rot_from = self.rotation.pending_end().unwrap_or(self.rot);
        self.rotation.push(TweenChain::two_phase(
            rot_from,
            tilt_for(dir),
            NEUTRAL_ROT,
            (self.move_ticks / 2).max(1),
        ));
    }

    // ── Per-frame ──

    pub fn tick(&mut self) {
        if let Some(p) = self.motion.tick() {
            self.pos = p;
        }
        if let Some(r) = self.rotation.tick() {
            self.rot = r;
        }
    }

    // ── Orchestrator events ──

    pub fn handle_event(&mut self, event: GameEvent) {
        match event {
            GameEvent::AttemptStarted => {
                self.enabled = true;
            }
            GameEvent::AttemptPassed | GameEvent::AttemptFailed => {
                self.enabled = false;
            }
            GameEvent::ResetComplete => {
                // Pre-attempt baseline: home cell, neutral pose, empty
                // queues. Movement stays off until the next start.
                self.enabled = false;
                self.motion.clear();
                self.rotation.clear();
                self.cell = HOME_CELL;
                self.pos = self.layout.world_pos(HOME_CELL);
                self.rot = NEUTRAL_ROT;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layout() -> GridLayout {
        GridLayout {
            origin_x: -1.8,
            origin_y: 1.0,
            size: 1.8,
            plane_z: 11.0,
        }
    }

    fn controller() -> MovementController {
        let movement = MovementConfig {
            grid_size: 1.8,
            grid_origin_x: -1.8,
            grid_origin_y: 1.0,
            move_ticks: 4,
        };
        let mut mc = MovementController::new(layout(), &movement);
        mc.handle_event(GameEvent::AttemptStarted);
        mc
    }

    #[test]
    fn rapid_inputs_apply_in_order() {
        let mut mc = controller();

        // Issued faster than any animation completes.
        mc.on_direction(Direction::Up);
        mc.on_direction(Direction::Left);
        mc.on_direction(Direction::Right);

        // Logical cell already reflects all three moves.
        assert_eq!(mc.cell(), GridCell { col: 1, row: 1 });

        // Animated position drains one transition at a time.
        for _ in 0..3 * 4 {
            mc.tick();
        }
        assert_eq!(mc.pos(), layout().world_pos(GridCell { col: 1, row: 1 }));
        assert_eq!(mc.queued_moves(), 0);
    }

    #[test]
    fn boundary_moves_are_noops() {
        let mut mc = controller();

        mc.on_direction(Direction::Left); // (0, 0)
        mc.on_direction(Direction::Left); // already at column 0
        mc.on_direction(Direction::Down); // already at row 0
        assert_eq!(mc.cell(), GridCell { col: 0, row: 0 });
        assert_eq!(mc.queued_moves(), 1);
    }

    #[test]
    fn excess_input_is_dropped_silently() {
        let mut mc = controller();

        mc.on_direction(Direction::Up);    // in flight
        mc.on_direction(Direction::Down);  // waiting
        mc.on_direction(Direction::Up);    // waiting
        mc.on_direction(Direction::Down);  // dropped
        assert_eq!(mc.cell(), GridCell { col: 1, row: 1 });
        assert_eq!(mc.queued_moves(), 3);
    }

    #[test]
    fn disabled_controller_ignores_input() {
        let mut mc = controller();
        mc.handle_event(GameEvent::AttemptFailed);

        mc.on_direction(Direction::Up);
        assert_eq!(mc.cell(), HOME_CELL);
        assert_eq!(mc.queued_moves(), 0);
    }

    #[test]
    fn at_most_one_motion_in_flight() {
        let mut mc = controller();
        let mid = layout().world_pos(GridCell { col: 1, row: 1 });

        mc.on_direction(Direction::Up);
        mc.on_direction(Direction::Left);

        // Until the first transition's 4 ticks elapse, position never
        // leaves the segment between home and the first target.
        for _ in 0..4 {
            mc.tick();
            assert!(mc.pos().x == mid.x, "second move started early");
        }
        assert_eq!(mc.pos(), mid);

        // Only now does the queued left move begin.
        mc.tick();
        assert!(mc.pos().x < mid.x);
    }

    #[test]
    fn rotation_settles_back_to_neutral() {
        let mut mc = controller();
        mc.on_direction(Direction::Up);

        // Two phases of move_ticks/2 each.
        mc.tick();
        mc.tick();
        assert_eq!(mc.rot(), tilt_for(Direction::Up));
        mc.tick();
        mc.tick();
        assert_eq!(mc.rot(), NEUTRAL_ROT);
    }

    #[test]
    fn reset_restores_home_baseline() {
        let mut mc = controller();
        mc.on_direction(Direction::Up);
        mc.on_direction(Direction::Right);
        for _ in 0..3 {
            mc.tick();
        }

        mc.handle_event(GameEvent::ResetComplete);
        assert_eq!(mc.cell(), HOME_CELL);
        assert_eq!(mc.pos(), layout().world_pos(HOME_CELL));
        assert_eq!(mc.rot(), NEUTRAL_ROT);
        assert_eq!(mc.queued_moves(), 0);
        assert!(!mc.enabled());
    }
}
