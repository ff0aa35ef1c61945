/// Presentation layer: top-down lane view plus HUD, batched with `queue!`
/// and flushed once per frame.
///
/// Pure view: everything drawn here is read from orchestrator accessors
/// and the live level; nothing is mutated.

use std::io::{self, BufWriter, Stdout, Write};

use crossterm::{
    cursor::{self, MoveTo},
    execute, queue,
    style::{Color, Print, ResetColor, SetForegroundColor},
    terminal::{self, Clear, ClearType},
};

use crate::domain::grid::{GridCell, GridLayout, GRID_WIDTH};
use crate::sim::assembler::{LevelAssembler, DIAMOND_RADIUS};
use crate::sim::movement::MovementController;
use crate::sim::orchestrator::{Orchestrator, Phase};

/// Depth slices shown ahead of the player.
const VIEW_ROWS: usize = 14;
/// World distance per slice.
const DEPTH_PER_ROW: f32 = 4.0;
/// Terminal columns per lane.
const LANE_WIDTH: u16 = 5;

pub struct Renderer {
    out: BufWriter<Stdout>,
    layout: GridLayout,
}

impl Renderer {
    pub fn new(layout: GridLayout) -> Self {
        Renderer {
            out: BufWriter::new(io::stdout()),
            layout,
        }
    }

    /// World x of a lane's center, from the same layout the movement
    /// controller uses.
    fn lane_center_x(&self, lane: usize) -> f32 {
        self.layout.world_pos(GridCell { col: lane, row: 0 }).x
    }

    pub fn init(&mut self) -> io::Result<()> {
        terminal::enable_raw_mode()?;
        execute!(self.out, terminal::EnterAlternateScreen, cursor::Hide)?;
        Ok(())
    }

    pub fn cleanup(&mut self) -> io::Result<()> {
        execute!(self.out, cursor::Show, terminal::LeaveAlternateScreen, ResetColor)?;
        terminal::disable_raw_mode()?;
        Ok(())
    }

    pub fn render(
        &mut self,
        orch: &Orchestrator,
        assembler: &LevelAssembler,
        movement: &MovementController,
    ) -> io::Result<()> {
        queue!(self.out, Clear(ClearType::All))?;

        self.draw_hud(orch, assembler)?;
        if assembler.is_ready() {
            self.draw_track(orch, assembler, movement)?;
        }
        self.draw_message(orch)?;

        self.out.flush()
    }

    fn draw_hud(&mut self, orch: &Orchestrator, assembler: &LevelAssembler) -> io::Result<()> {
        queue!(
            self.out,
            MoveTo(1, 0),
            SetForegroundColor(Color::Cyan),
            Print("LANE RUNNER"),
            SetForegroundColor(Color::White),
            Print(format!(
                "   Level {}/{}   Score {}   Best {}",
                orch.current_level() + 1,
                orch.level_count(),
                orch.current_score(),
                orch.best_score(),
            )),
        )?;

        let live = assembler.live();
        if live.is_ready() && live.track_end() > 0.0 {
            let pct = (live.travel / live.track_end() * 100.0).clamp(0.0, 100.0);
            queue!(self.out, Print(format!("   {pct:3.0}%")))?;
        }
        Ok(())
    }

    fn draw_track(
        &mut self,
        orch: &Orchestrator,
        assembler: &LevelAssembler,
        movement: &MovementController,
    ) -> io::Result<()> {
        let live = assembler.live();
        let plane = movement.pos().z;
        let player_row = movement.cell().row;

        for row in 0..VIEW_ROWS {
            let depth = plane + (VIEW_ROWS - 1 - row) as f32 * DEPTH_PER_ROW;
            let y = row as u16 + 2;
            queue!(self.out, MoveTo(0, y), SetForegroundColor(Color::DarkGrey), Print("|"))?;

            for lane in 0..GRID_WIDTH {
                let x = 1 + lane as u16 * LANE_WIDTH + LANE_WIDTH / 2;

                // Finish line.
                let finish_near = live.floors.iter().any(|f| {
                    f.finish && ((f.z - live.travel) - depth).abs() < DEPTH_PER_ROW / 2.0
                });
                if finish_near {
                    queue!(self.out, MoveTo(x - 1, y), SetForegroundColor(Color::Green), Print("==="))?;
                    continue;
                }

                // Obstacle slice: block characters per blocked row.
                let slot = live.slots.iter().find(|s| {
                    ((s.z - live.travel) - depth).abs() < DEPTH_PER_ROW / 2.0
                });
                if let Some(slot) = slot {
                    let low = slot.kind.blocks(lane, 0);
                    let high = slot.kind.blocks(lane, 1);
                    let ch = match (low, high) {
                        (true, true) => "█",
                        (true, false) => "▄",
                        (false, true) => "▀",
                        (false, false) => " ",
                    };
                    if ch != " " {
                        queue!(self.out, MoveTo(x, y), SetForegroundColor(Color::Red), Print(ch))?;
                        continue;
                    }
                }

                // Diamonds.
                let lane_x = self.lane_center_x(lane);
                let diamond = live.diamonds.iter().any(|d| {
                    !d.collected
                        && (d.pos.x - lane_x).abs() <= DIAMOND_RADIUS
                        && ((d.pos.z - live.travel) - depth).abs() < DEPTH_PER_ROW / 2.0
                });
                if diamond {
                    queue!(self.out, MoveTo(x, y), SetForegroundColor(Color::Yellow), Print("*"))?;
                }
            }

            let right = 1 + GRID_WIDTH as u16 * LANE_WIDTH;
            queue!(self.out, MoveTo(right, y), SetForegroundColor(Color::DarkGrey), Print("|"))?;
        }

        // Player marker on the bottom slice: raised glyph for the top row,
        // leaning glyph while a sideways tilt is in flight.
        let px = 1 + movement.cell().col as u16 * LANE_WIDTH + LANE_WIDTH / 2;
        let py = VIEW_ROWS as u16 + 1;
        let tilt = movement.rot().z;
        let glyph = if tilt > 5.0 {
            "\\"
        } else if tilt < -5.0 {
            "/"
        } else if player_row == 0 {
            "@"
        } else {
            "^"
        };
        let color = if orch.phase() == Phase::Failed { Color::Red } else { Color::Cyan };
        queue!(self.out, MoveTo(px, py), SetForegroundColor(color), Print(glyph))?;

        Ok(())
    }

    fn draw_message(&mut self, orch: &Orchestrator) -> io::Result<()> {
        let y = VIEW_ROWS as u16 + 3;
        let msg = match orch.phase() {
            Phase::Idle if orch.run_finished() => "RUN COMPLETE - every level cleared",
            Phase::Idle => "press a direction to start",
            Phase::Running => "",
            Phase::Passed => "LEVEL PASSED - tap any key",
            Phase::Failed => "CRASHED - tap any key to retry",
            Phase::Resetting(_) => "...",
        };
        if !msg.is_empty() {
            queue!(self.out, MoveTo(1, y), SetForegroundColor(Color::White), Print(msg))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lane_columns_follow_the_configured_layout() {
        // A retuned grid must shift the lane columns with it.
        let r = Renderer::new(GridLayout {
            origin_x: -2.5,
            origin_y: 0.5,
            size: 2.5,
            plane_z: 9.0,
        });
        assert_eq!(r.lane_center_x(0), -2.5);
        assert_eq!(r.lane_center_x(1), 0.0);
        assert_eq!(r.lane_center_x(2), 2.5);
    }
}
