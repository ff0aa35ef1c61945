/// Entry point and frame loop.
///
/// The loop owns the wiring between subsystems: input feeds the
/// orchestrator and the movement controller, the contact sweep feeds the
/// orchestrator, and published game events flow back into movement through
/// a drained-per-frame queue.

mod config;
mod domain;
mod error;
mod sim;
mod ui;

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;
use std::time::{Duration, Instant};

use crossterm::event::KeyCode;
use log::{error, info};

use config::GameConfig;
use domain::catalog::ObstacleCatalog;
use domain::grid::GridLayout;
use domain::level::LevelDefinition;
use sim::assembler::{Contact, LevelAssembler};
use sim::author::AuthoringSession;
use sim::movement::MovementController;
use sim::orchestrator::{GameEvent, Orchestrator, Phase};
use sim::progress::ProgressTracker;
use sim::store::LevelStore;
use ui::input::InputState;
use ui::renderer::Renderer;

const FRAME_SLEEP: Duration = Duration::from_millis(5);

fn main() {
    env_logger::init();
    let config = GameConfig::load();

    let store = LevelStore::new(config.levels_path.clone());
    let mut assembler = LevelAssembler::new(ObstacleCatalog::standard(), config.track.clone());

    if run_subcommand(&store, &mut assembler) {
        return;
    }

    let levels = store.load_or_embedded();
    if levels.is_empty() {
        error!("level document is empty; nothing to play");
        return;
    }
    info!("{} levels loaded", levels.len());

    let progress = ProgressTracker::open(&config.progress_path);
    let mut orch = Orchestrator::new(
        progress,
        levels.len(),
        config.track.clone(),
        config.god_mode,
    );

    let layout = GridLayout {
        origin_x: config.movement.grid_origin_x,
        origin_y: config.movement.grid_origin_y,
        size: config.movement.grid_size,
        plane_z: config.track.player_plane,
    };
    let mut movement = MovementController::new(layout, &config.movement);

    // Published events are queued here and drained into the movement
    // controller once per frame.
    let pending: Rc<RefCell<VecDeque<GameEvent>>> = Rc::new(RefCell::new(VecDeque::new()));
    let queue = pending.clone();
    orch.subscribe(Box::new(move |event, _| queue.borrow_mut().push_back(event)));

    let mut renderer = Renderer::new(layout);
    if let Err(e) = renderer.init() {
        error!("terminal init failed: {e}");
        return;
    }

    let result = game_loop(
        &config,
        &levels,
        &mut orch,
        &mut assembler,
        &mut movement,
        &pending,
        &mut renderer,
    );

    if let Err(e) = renderer.cleanup() {
        error!("terminal cleanup failed: {e}");
    }
    if let Err(e) = result {
        error!("frame loop aborted: {e}");
    }
}

/// Headless authoring subcommands: `list` prints the stored collection,
/// `gen <floor_length>` appends a randomized level to the document.
/// Returns true when a subcommand ran (the game does not start).
fn run_subcommand(store: &LevelStore, assembler: &mut LevelAssembler) -> bool {
    let mut args = std::env::args().skip(1);
    let Some(cmd) = args.next() else {
        return false;
    };

    match cmd.as_str() {
        "list" => {
            for name in store.level_names() {
                println!("level {name}");
            }
        }
        "gen" => {
            let floor_length = args.next().and_then(|a| a.parse().ok()).unwrap_or(8);
            let mut rng = rand::rng();
            let mut session = AuthoringSession::new(store, assembler);
            session.random_preview(floor_length, &mut rng);
            match session.append_from_scene() {
                Ok(index) => {
                    let levels = store.load_or_embedded();
                    println!(
                        "level {} generated: {} floors, {} slots",
                        index + 1,
                        floor_length,
                        levels[index].slot_count(),
                    );
                }
                Err(e) => error!("level generation failed: {e}"),
            }
        }
        other => error!("unknown command '{other}' (expected 'list' or 'gen')"),
    }
    true
}

fn game_loop(
    config: &GameConfig,
    levels: &[LevelDefinition],
    orch: &mut Orchestrator,
    assembler: &mut LevelAssembler,
    movement: &mut MovementController,
    pending: &Rc<RefCell<VecDeque<GameEvent>>>,
    renderer: &mut Renderer,
) -> std::io::Result<()> {
    let tick_rate = Duration::from_millis(config.tick_rate_ms.max(1));
    let tick_secs = tick_rate.as_secs_f32();
    let mut input = InputState::new();
    let mut last_tick = Instant::now();

    loop {
        if last_tick.elapsed() >= tick_rate {
            last_tick = Instant::now();

            input.drain_events();
            if input.ctrl_c_pressed()
                || input.was_pressed(KeyCode::Esc)
                || input.was_pressed(KeyCode::Char('q'))
            {
                info!("quit requested");
                return Ok(());
            }

            match orch.phase() {
                Phase::Idle => {
                    // First directional tap starts the attempt; the tap
                    // itself is not a move.
                    if !input.directions().is_empty() {
                        orch.start();
                    }
                }
                Phase::Running => {
                    for dir in input.directions() {
                        movement.on_direction(dir);
                    }
                }
                Phase::Passed | Phase::Failed => {
                    if input.any_pressed() {
                        orch.request_reset();
                    }
                }
                Phase::Resetting(_) => {}
            }

            if orch.needs_rebuild() {
                // The orchestrator keeps its level index inside the
                // collection, so this index is always in range.
                assembler.assemble(&levels[orch.current_level()]);
                orch.confirm_rebuild();
            }

            if orch.track_active() {
                let distance = orch.speed() * tick_secs;
                for contact in assembler.advance(distance, movement.cell(), movement.pos()) {
                    match contact {
                        Contact::ObstacleHit => orch.obstacle_hit(),
                        Contact::SlotCleared => orch.slot_cleared(),
                        Contact::DiamondCollected => orch.diamond_collected(),
                        Contact::FinishCrossed => orch.finish_crossed(),
                    }
                }
            }

            orch.tick(assembler.is_ready());
            movement.tick();

            let events: Vec<GameEvent> = pending.borrow_mut().drain(..).collect();
            for event in events {
                movement.handle_event(event);
            }

            renderer.render(orch, assembler, movement)?;
        }

        std::thread::sleep(FRAME_SLEEP);
    }
}
