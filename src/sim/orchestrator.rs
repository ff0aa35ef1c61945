/// Game state orchestrator: the finite-state machine every other
/// subsystem reacts to.
///
/// ## Phases:
///   `Idle` → `Running` → `Passed` | `Failed` → `Resetting` → `Idle`
///
/// `Resetting` is itself staged: a scene-transition delay, then a rebuild
/// request the frame loop must satisfy (teardown + reassembly), then a wait
/// on assembler readiness. The readiness gate is the sole synchronization
/// point keeping movement off an incompletely built level. A reset request
/// arriving mid-reset restarts the pending wait; it never stacks.
///
/// ## Ordering guarantee:
///   Persistence writes happen before the event announcing the settled
///   state — a listener reacting to `AttemptPassed` or `AttemptFailed`
///   always sees already-persisted score/level values.
///
/// ## Pass policy:
///   The advanced level index is persisted immediately on pass. When the
///   advanced index equals the level count, the run is marked finished
///   instead of advancing.

use log::{info, warn};

use crate::config::TrackConfig;
use crate::sim::progress::ProgressTracker;

/// Per-tick multiplier easing the track to rest after a pass.
const DECEL_FACTOR: f32 = 0.92;
/// Score awarded for a diamond pickup.
const DIAMOND_SCORE: u32 = 10;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Phase {
    /// Pre-start; main menu showing, first input starts the attempt.
    Idle,
    /// Movement enabled, collisions live.
    Running,
    /// Terminal per-attempt: score settled, movement disabled.
    Passed,
    Failed,
    Resetting(ResetStage),
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ResetStage {
    /// Scene transition cover before teardown begins.
    Transition { ticks_left: u32 },
    /// Waiting for the frame loop to tear down and reassemble.
    Rebuild,
    /// Waiting for the assembler's readiness signal.
    AwaitReady,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum GameEvent {
    AttemptStarted,
    AttemptPassed,
    AttemptFailed,
    ResetComplete,
}

/// Snapshot handed to subscribers alongside each event. Events carry no
/// payload beyond this readable state.
#[derive(Clone, Copy, Debug)]
pub struct StateView {
    pub current_level: usize,
    pub current_score: u32,
    pub best_score: u32,
    pub level_count: usize,
    pub run_finished: bool,
}

pub type SubscriberId = usize;
type Subscriber = Box<dyn FnMut(GameEvent, &StateView)>;

pub struct Orchestrator {
    progress: ProgressTracker,
    track: TrackConfig,
    god_mode: bool,

    phase: Phase,
    level_count: usize,
    run_finished: bool,
    /// Current track scroll speed; eases to zero after a pass.
    speed: f32,

    subscribers: Vec<(SubscriberId, Subscriber)>,
    next_subscriber: SubscriberId,
}

impl Orchestrator {
    /// Construction enters the reset pipeline immediately (skipping the
    /// scene-transition cover, which only makes sense between attempts):
    /// the first frame must rebuild the level and pass the readiness gate
    /// before anything may move.
    pub fn new(
        progress: ProgressTracker,
        level_count: usize,
        track: TrackConfig,
        god_mode: bool,
    ) -> Self {
        let mut orch = Orchestrator {
            progress,
            track,
            god_mode,
            phase: Phase::Resetting(ResetStage::Rebuild),
            level_count,
            run_finished: false,
            speed: 0.0,
            subscribers: vec![],
            next_subscriber: 0,
        };
        orch.clamp_persisted_level();
        orch.speed = orch.attempt_speed();
        orch
    }

    /// A persisted level index at or past the collection size is invalid —
    /// the collection may have shrunk since the index was saved. Clamp to
    /// the last valid index, persist the correction, and report it.
    fn clamp_persisted_level(&mut self) {
        let current = self.progress.current_level();
        if self.level_count > 0 && current >= self.level_count {
            let clamped = self.level_count - 1;
            warn!(
                "persisted level index {current} outside collection of {}; clamping to {clamped}",
                self.level_count,
            );
            self.progress.set_current_level(clamped);
        }
    }

    // ── Accessors ──

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn current_level(&self) -> usize {
        self.progress.current_level()
    }

    pub fn current_score(&self) -> u32 {
        self.progress.current_score()
    }

    pub fn best_score(&self) -> u32 {
        self.progress.best_score()
    }

    pub fn level_count(&self) -> usize {
        self.level_count
    }

    pub fn run_finished(&self) -> bool {
        self.run_finished
    }

    pub fn speed(&self) -> f32 {
        self.speed
    }

    /// Is the track currently scrolling? True while running, and while the
    /// post-pass deceleration is still easing to rest.
    pub fn track_active(&self) -> bool {
        matches!(self.phase, Phase::Running) || (self.phase == Phase::Passed && self.speed > 0.0)
    }

    /// Does the frame loop owe us a teardown + reassembly?
    pub fn needs_rebuild(&self) -> bool {
        self.phase == Phase::Resetting(ResetStage::Rebuild)
    }

    pub fn view(&self) -> StateView {
        StateView {
            current_level: self.progress.current_level(),
            current_score: self.progress.current_score(),
            best_score: self.progress.best_score(),
            level_count: self.level_count,
            run_finished: self.run_finished,
        }
    }

    // ── Subscriber registry ──

    /// Register a subscriber. Dispatch is synchronous, in registration
    /// order, within the frame that fires the transition.
    pub fn subscribe(&mut self, f: Subscriber) -> SubscriberId {
        let id = self.next_subscriber;
        self.next_subscriber += 1;
        self.subscribers.push((id, f));
        id
    }

    /// Remove a subscriber; its callback is never invoked again.
    pub fn unsubscribe(&mut self, id: SubscriberId) {
        self.subscribers.retain(|(sid, _)| *sid != id);
    }

    fn publish(&mut self, event: GameEvent) {
        let view = self.view();
        let mut subs = std::mem::take(&mut self.subscribers);
        for (_, f) in subs.iter_mut() {
            f(event, &view);
        }
        self.subscribers = subs;
    }

    // ── Transitions ──

    /// `Idle → Running`. Fires once per idle period; duplicate input events
    /// while already running are ignored.
    pub fn start(&mut self) {
        if self.phase != Phase::Idle {
            return;
        }
        self.phase = Phase::Running;
        self.publish(GameEvent::AttemptStarted);
    }

    /// An obstacle slot's paired score trigger fired. Score delta is
    /// `current_level + 1` — later levels are worth more per slot.
    pub fn slot_cleared(&mut self) {
        if self.phase != Phase::Running {
            return;
        }
        let delta = self.progress.current_level() as u32 + 1;
        let score = self.progress.current_score() + delta;
        self.progress.set_current_score(score);
    }

    pub fn diamond_collected(&mut self) {
        if self.phase != Phase::Running {
            return;
        }
        let score = self.progress.current_score() + DIAMOND_SCORE;
        self.progress.set_current_score(score);
    }

    /// `Running → Failed`, unless the invulnerability override is active.
    /// Settles the best score and zeroes the current score; both are
    /// persisted before the event is published.
    pub fn obstacle_hit(&mut self) {
        if self.phase != Phase::Running {
            return;
        }
        if self.god_mode {
            return;
        }
        self.progress.settle_best();
        self.progress.set_current_score(0);
        self.phase = Phase::Failed;
        info!("attempt failed on level {}", self.progress.current_level() + 1);
        self.publish(GameEvent::AttemptFailed);
    }

    /// `Running → Passed`. Persists the advanced level index, or marks the
    /// run finished when the advanced index equals the level count.
    pub fn finish_crossed(&mut self) {
        if self.phase != Phase::Running {
            return;
        }
        let next = self.progress.current_level() + 1;
        if next >= self.level_count {
            self.run_finished = true;
            info!("final level passed; run finished");
        } else {
            self.progress.set_current_level(next);
            info!("level passed; advancing to level {}", next + 1);
        }
        self.progress.settle_best();
        self.phase = Phase::Passed;
        self.publish(GameEvent::AttemptPassed);
    }

    /// `Passed | Failed → Resetting`, by player acknowledgment or an
    /// external reset request. Re-entrant while already resetting: the
    /// pending wait restarts, it does not stack.
    pub fn request_reset(&mut self) {
        match self.phase {
            Phase::Idle => {}
            Phase::Resetting(_) | Phase::Running | Phase::Passed | Phase::Failed => {
                self.phase = Phase::Resetting(ResetStage::Transition {
                    ticks_left: self.track.reset_delay_ticks,
                });
            }
        }
    }

    /// The frame loop confirms the teardown + reassembly it was asked for.
    pub fn confirm_rebuild(&mut self) {
        if self.phase == Phase::Resetting(ResetStage::Rebuild) {
            self.phase = Phase::Resetting(ResetStage::AwaitReady);
        } else {
            warn!("rebuild confirmed outside a reset; ignoring");
        }
    }

    /// Advance one frame tick. `assembler_ready` is the readiness signal
    /// gating `Resetting → Idle`.
    pub fn tick(&mut self, assembler_ready: bool) {
        match self.phase {
            Phase::Passed => {
                // Ease the track to rest after the finish line.
                self.speed *= DECEL_FACTOR;
                if self.speed < 0.05 {
                    self.speed = 0.0;
                }
            }
            Phase::Resetting(ResetStage::Transition { ticks_left }) => {
                if ticks_left > 1 {
                    self.phase = Phase::Resetting(ResetStage::Transition {
                        ticks_left: ticks_left - 1,
                    });
                } else {
                    // Transition cover is up: re-read persisted progress and
                    // restore the pre-attempt speed baseline, then hand the
                    // rebuild to the frame loop.
                    self.progress.reload();
                    self.clamp_persisted_level();
                    self.speed = self.attempt_speed();
                    self.phase = Phase::Resetting(ResetStage::Rebuild);
                }
            }
            Phase::Resetting(ResetStage::AwaitReady) => {
                if assembler_ready {
                    self.phase = Phase::Idle;
                    self.publish(GameEvent::ResetComplete);
                }
            }
            _ => {}
        }
    }

    /// Track speed baseline for the current level: base speed plus one step
    /// per `levels_per_step` cleared levels.
    fn attempt_speed(&self) -> f32 {
        let steps = (self.progress.current_level() as u32 / self.track.levels_per_step) as f32;
        self.track.base_speed + steps * self.track.speed_step
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::path::PathBuf;
    use std::rc::Rc;

    fn track() -> TrackConfig {
        TrackConfig {
            floor_pitch: 12.5,
            floor_offset: 10.0,
            obstacle_gap: 18.0,
            slot_offset: 29.0,
            player_plane: 11.0,
            base_speed: 8.5,
            speed_step: 0.5,
            levels_per_step: 5,
            reset_delay_ticks: 3,
        }
    }

    fn orch_in(dir: &tempfile::TempDir, level_count: usize) -> (Orchestrator, PathBuf) {
        let path = dir.path().join("progress.dat");
        let progress = ProgressTracker::open(&path);
        (Orchestrator::new(progress, level_count, track(), false), path)
    }

    /// Drive the orchestrator from construction (or a reset request)
    /// through the rebuild handshake into Idle.
    fn settle_to_idle(orch: &mut Orchestrator) {
        for _ in 0..20 {
            if orch.needs_rebuild() {
                orch.confirm_rebuild();
            }
            if orch.phase() == Phase::Idle {
                return;
            }
            orch.tick(true);
        }
        panic!("never reached Idle, stuck at {:?}", orch.phase());
    }

    #[test]
    fn boot_gates_on_readiness() {
        let dir = tempfile::tempdir().unwrap();
        let (mut orch, _) = orch_in(&dir, 5);

        assert!(orch.needs_rebuild());
        orch.confirm_rebuild();

        // Not ready: stays gated, no matter how many ticks pass.
        orch.tick(false);
        orch.tick(false);
        assert_eq!(orch.phase(), Phase::Resetting(ResetStage::AwaitReady));

        orch.tick(true);
        assert_eq!(orch.phase(), Phase::Idle);
    }

    #[test]
    fn start_is_idempotent_per_idle_period() {
        let dir = tempfile::tempdir().unwrap();
        let (mut orch, _) = orch_in(&dir, 5);
        settle_to_idle(&mut orch);

        let starts = Rc::new(RefCell::new(0));
        let counter = starts.clone();
        orch.subscribe(Box::new(move |ev, _| {
            if ev == GameEvent::AttemptStarted {
                *counter.borrow_mut() += 1;
            }
        }));

        orch.start();
        orch.start(); // duplicate input event
        assert_eq!(orch.phase(), Phase::Running);
        assert_eq!(*starts.borrow(), 1);
    }

    #[test]
    fn slot_score_delta_is_level_plus_one() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("progress.dat");
        std::fs::write(&path, "CurrentScore=5\nCurrentLevel=2\nBestScore=0\n").unwrap();
        let progress = ProgressTracker::open(&path);
        let mut orch = Orchestrator::new(progress, 5, track(), false);
        settle_to_idle(&mut orch);
        orch.start();

        for _ in 0..4 {
            orch.slot_cleared();
        }
        // 4 slots at (level 2 + 1) each, on top of the carried 5.
        assert_eq!(orch.current_score(), 5 + 4 * 3);

        orch.diamond_collected();
        assert_eq!(orch.current_score(), 5 + 4 * 3 + 10);
    }

    #[test]
    fn fail_persists_zero_before_subscribers_observe() {
        let dir = tempfile::tempdir().unwrap();
        let (mut orch, path) = orch_in(&dir, 5);
        settle_to_idle(&mut orch);
        orch.start();
        orch.slot_cleared();
        orch.slot_cleared();
        assert_eq!(orch.current_score(), 2);

        let seen = Rc::new(RefCell::new(None));
        let slot = seen.clone();
        let observed_path = path.clone();
        orch.subscribe(Box::new(move |ev, view| {
            if ev == GameEvent::AttemptFailed {
                // Storage must already hold the settled values.
                let disk = std::fs::read_to_string(&observed_path).unwrap();
                *slot.borrow_mut() = Some((view.current_score, view.best_score, disk));
            }
        }));

        orch.obstacle_hit();
        assert_eq!(orch.phase(), Phase::Failed);
        let (score, best, disk) = seen.borrow().clone().unwrap();
        assert_eq!(score, 0);
        assert_eq!(best, 2);
        assert!(disk.contains("CurrentScore=0"));
        assert!(disk.contains("BestScore=2"));
    }

    #[test]
    fn god_mode_ignores_obstacle_contacts() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("progress.dat");
        let progress = ProgressTracker::open(&path);
        let mut orch = Orchestrator::new(progress, 5, track(), true);
        settle_to_idle(&mut orch);
        orch.start();

        orch.obstacle_hit();
        assert_eq!(orch.phase(), Phase::Running);
    }

    #[test]
    fn pass_persists_advanced_level_before_publish() {
        let dir = tempfile::tempdir().unwrap();
        let (mut orch, path) = orch_in(&dir, 5);
        settle_to_idle(&mut orch);
        orch.start();
        orch.slot_cleared();

        let seen = Rc::new(RefCell::new(None));
        let slot = seen.clone();
        let observed_path = path.clone();
        orch.subscribe(Box::new(move |ev, view| {
            if ev == GameEvent::AttemptPassed {
                let disk = std::fs::read_to_string(&observed_path).unwrap();
                *slot.borrow_mut() = Some((view.current_level, disk));
            }
        }));

        orch.finish_crossed();
        assert_eq!(orch.phase(), Phase::Passed);
        let (level, disk) = seen.borrow().clone().unwrap();
        assert_eq!(level, 1);
        assert!(disk.contains("CurrentLevel=1"));
        // Score carried across the pass, not reset.
        assert_eq!(orch.current_score(), 1);
    }

    #[test]
    fn passing_the_last_level_finishes_the_run() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("progress.dat");
        std::fs::write(&path, "CurrentScore=0\nCurrentLevel=4\nBestScore=0\n").unwrap();
        let progress = ProgressTracker::open(&path);
        let mut orch = Orchestrator::new(progress, 5, track(), false);
        settle_to_idle(&mut orch);
        orch.start();

        orch.finish_crossed();
        assert!(orch.run_finished());
        // Never advances past the last index.
        assert_eq!(orch.current_level(), 4);
    }

    #[test]
    fn stale_persisted_index_is_clamped_at_construction() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("progress.dat");
        // Saved while the collection held 8 levels; it holds 4 now.
        std::fs::write(&path, "CurrentScore=0\nCurrentLevel=7\nBestScore=0\n").unwrap();
        let progress = ProgressTracker::open(&path);
        let mut orch = Orchestrator::new(progress, 4, track(), false);

        // Clamped to the last valid index, and the correction is persisted.
        assert_eq!(orch.current_level(), 3);
        let disk = std::fs::read_to_string(&path).unwrap();
        assert!(disk.contains("CurrentLevel=3"));

        // Passing from the clamped index finishes the run; the index never
        // advances past the collection.
        settle_to_idle(&mut orch);
        orch.start();
        orch.finish_crossed();
        assert!(orch.run_finished());
        assert_eq!(orch.current_level(), 3);
    }

    #[test]
    fn reset_reclamps_an_externally_shrunk_index() {
        let dir = tempfile::tempdir().unwrap();
        let (mut orch, path) = orch_in(&dir, 4);
        settle_to_idle(&mut orch);
        orch.start();
        orch.obstacle_hit();

        // The progress file changes underneath us between attempts.
        std::fs::write(&path, "CurrentScore=0\nCurrentLevel=9\nBestScore=0\n").unwrap();
        orch.request_reset();
        settle_to_idle(&mut orch);

        assert_eq!(orch.current_level(), 3);
        // Speed baseline follows the clamped index, not the stale one.
        assert_eq!(orch.speed(), 8.5);
    }

    #[test]
    fn best_score_monotone_across_pass_fail_sequence() {
        let dir = tempfile::tempdir().unwrap();
        let (mut orch, _) = orch_in(&dir, 10);
        settle_to_idle(&mut orch);

        let mut bests = vec![];

        orch.start();
        for _ in 0..7 {
            orch.slot_cleared();
        }
        orch.finish_crossed();
        bests.push(orch.best_score());

        orch.request_reset();
        settle_to_idle(&mut orch);
        orch.start();
        orch.obstacle_hit(); // fail with low score
        bests.push(orch.best_score());

        orch.request_reset();
        settle_to_idle(&mut orch);
        orch.start();
        for _ in 0..20 {
            orch.slot_cleared();
        }
        orch.finish_crossed();
        bests.push(orch.best_score());

        assert!(bests.windows(2).all(|w| w[0] <= w[1]), "best went down: {bests:?}");
    }

    #[test]
    fn reset_runs_transition_then_rebuild_then_gate() {
        let dir = tempfile::tempdir().unwrap();
        let (mut orch, _) = orch_in(&dir, 5);
        settle_to_idle(&mut orch);
        orch.start();
        orch.obstacle_hit();

        orch.request_reset();
        assert_eq!(
            orch.phase(),
            Phase::Resetting(ResetStage::Transition { ticks_left: 3 })
        );

        orch.tick(false);
        orch.tick(false);
        orch.tick(false);
        assert!(orch.needs_rebuild());

        orch.confirm_rebuild();
        orch.tick(false); // still gated
        assert_eq!(orch.phase(), Phase::Resetting(ResetStage::AwaitReady));

        let done = Rc::new(RefCell::new(false));
        let flag = done.clone();
        orch.subscribe(Box::new(move |ev, _| {
            if ev == GameEvent::ResetComplete {
                *flag.borrow_mut() = true;
            }
        }));
        orch.tick(true);
        assert_eq!(orch.phase(), Phase::Idle);
        assert!(*done.borrow());
    }

    #[test]
    fn reentrant_reset_restarts_the_wait() {
        let dir = tempfile::tempdir().unwrap();
        let (mut orch, _) = orch_in(&dir, 5);
        settle_to_idle(&mut orch);
        orch.start();
        orch.obstacle_hit();

        orch.request_reset();
        orch.tick(false);
        // A second request supersedes the pending wait.
        orch.request_reset();
        assert_eq!(
            orch.phase(),
            Phase::Resetting(ResetStage::Transition { ticks_left: 3 })
        );
    }

    #[test]
    fn speed_baseline_follows_persisted_level() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("progress.dat");
        std::fs::write(&path, "CurrentScore=0\nCurrentLevel=12\nBestScore=0\n").unwrap();
        let progress = ProgressTracker::open(&path);
        let orch = Orchestrator::new(progress, 20, track(), false);
        // 12 levels in: two full steps of +0.5.
        assert_eq!(orch.speed(), 8.5 + 2.0 * 0.5);
    }

    #[test]
    fn unsubscribe_stops_delivery() {
        let dir = tempfile::tempdir().unwrap();
        let (mut orch, _) = orch_in(&dir, 5);
        settle_to_idle(&mut orch);

        let count = Rc::new(RefCell::new(0));
        let c = count.clone();
        let id = orch.subscribe(Box::new(move |_, _| *c.borrow_mut() += 1));
        orch.unsubscribe(id);

        orch.start();
        assert_eq!(*count.borrow(), 0);
    }
}
