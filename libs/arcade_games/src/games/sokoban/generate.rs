//! Random level generation.
//!
//! Every placed box must be able to reach some storage cell by pushes alone.
//! Reachability is checked with a breadth-first search over box positions
//! that ignores the other boxes.

use std::collections::VecDeque;

use rand::Rng;
use rand::seq::SliceRandom as _;

use super::{Cell, HEIGHT, Sokoban, WIDTH};
use crate::error::SetupError;
use crate::grid::{Dir, Grid, Pos};

/// Level generation parameters.
#[derive(Debug, Clone, Copy)]
pub struct Generator {
    pub boxes: u8,
    /// Interior wall cells scattered over the level.
    pub walls: u8,
    pub attempts: u32,
}

impl Generator {
    pub const MAX_ATTEMPTS: u32 = 200;

    #[must_use]
    pub const fn new(boxes: u8) -> Self {
        Self {
            boxes,
            walls: 3,
            attempts: Self::MAX_ATTEMPTS,
        }
    }

    /// Generates a level.
    ///
    /// # Errors
    ///
    /// Returns `Err` if no solvable level was found within the attempt budget.
    pub fn generate<R: Rng + ?Sized>(self, rng: &mut R) -> Result<Sokoban, SetupError> {
        for _ in 0..self.attempts {
            if let Some(level) = self.attempt(rng) {
                return Ok(level);
            }
        }

        log::error!(
            "Sokoban generation failed after {} attempts ({} boxes, {} walls)",
            self.attempts,
            self.boxes,
            self.walls
        );

        Err(SetupError::Generation {
            attempts: self.attempts,
        })
    }

    fn attempt<R: Rng + ?Sized>(self, rng: &mut R) -> Option<Sokoban> {
        let mut grid = walled_room();
        let mut free = grid
            .iter()
            .filter(|&(_, c)| *c == Cell::Floor)
            .map(|(p, _)| p)
            .collect::<Vec<_>>();

        free.shuffle(rng);

        let mut place = |cell: Cell, count: u8| -> Option<()> {
            for _ in 0..count {
                let pos = free.pop()?;
                *grid.get_mut(pos)? = cell;
            }
            Some(())
        };

        place(Cell::Wall, self.walls)?;
        place(Cell::Storage, self.boxes)?;
        place(Cell::Box, self.boxes)?;
        let player = free.pop()?;

        let solvable = grid
            .iter()
            .filter(|&(_, c)| *c == Cell::Box)
            .all(|(p, _)| reaches_storage(&grid, p));

        solvable.then(|| Sokoban::from_parts(grid, player))
    }
}

fn walled_room() -> Grid<Cell> {
    let mut grid = Grid::filled(WIDTH, HEIGHT, Cell::Floor);
    for y in 0..HEIGHT {
        for x in 0..WIDTH {
            let edge = x == 0 || y == 0 || x == WIDTH - 1 || y == HEIGHT - 1;
            if edge && let Some(cell) = grid.get_mut(Pos::new(x, y)) {
                *cell = Cell::Wall;
            }
        }
    }
    grid
}

/// Whether a box starting at `start` can be pushed onto any storage cell.
///
/// A push in a direction needs the target cell and the cell behind the box,
/// where the pusher stands, to be free of walls.
pub(super) fn reaches_storage(grid: &Grid<Cell>, start: Pos) -> bool {
    let open = |pos: Pos| grid.get(pos).is_some_and(|c| *c != Cell::Wall);

    let mut seen = Grid::filled(grid.width(), grid.height(), false);
    let mut queue = VecDeque::from([start]);
    if let Some(s) = seen.get_mut(start) {
        *s = true;
    }

    while let Some(pos) = queue.pop_front() {
        if grid.get(pos).is_some_and(|c| c.is_storage()) {
            return true;
        }

        for dir in Dir::ALL {
            let next = pos.step(dir);
            if !open(next) || !open(pos.step(dir.opposite())) {
                continue;
            }

            if let Some(s) = seen.get_mut(next)
                && !*s
            {
                *s = true;
                queue.push_back(next);
            }
        }
    }

    false
}
