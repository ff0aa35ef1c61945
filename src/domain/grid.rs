/// The movement grid: a fixed 3×2 lane/row layout in front of the track.
///
/// The player occupies exactly one cell. Directional input moves one cell,
/// clamped at the edges (a move into a boundary is a no-op). Columns run
/// left→right, rows bottom→top.

use glam::Vec3;

pub const GRID_WIDTH: usize = 3;
pub const GRID_HEIGHT: usize = 2;

/// Home cell after a reset: center lane, bottom row.
pub const HOME_CELL: GridCell = GridCell { col: 1, row: 0 };

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct GridCell {
    pub col: usize,
    pub row: usize,
}

impl GridCell {
    /// One step in `dir`, clamped at grid edges.
    /// Returns `None` when already at the boundary (the move is a no-op).
    pub fn step(self, dir: Direction) -> Option<GridCell> {
        match dir {
            Direction::Up if self.row + 1 < GRID_HEIGHT => {
                Some(GridCell { row: self.row + 1, ..self })
            }
            Direction::Down if self.row > 0 => {
                Some(GridCell { row: self.row - 1, ..self })
            }
            Direction::Left if self.col > 0 => {
                Some(GridCell { col: self.col - 1, ..self })
            }
            Direction::Right if self.col + 1 < GRID_WIDTH => {
                Some(GridCell { col: self.col + 1, ..self })
            }
            _ => None,
        }
    }
}

/// World-space layout of the grid: cell (0, 0) sits at the origin, cells
/// are `size` apart, all at the fixed player plane depth.
#[derive(Clone, Copy, Debug)]
pub struct GridLayout {
    pub origin_x: f32,
    pub origin_y: f32,
    pub size: f32,
    pub plane_z: f32,
}

impl GridLayout {
    pub fn world_pos(&self, cell: GridCell) -> Vec3 {
        Vec3::new(
            self.origin_x + cell.col as f32 * self.size,
            self.origin_y + cell.row as f32 * self.size,
            self.plane_z,
        )
    }
}
