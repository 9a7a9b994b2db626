//! Push every box onto a storage cell.

use std::fmt::Write as _;

use rand::Rng;

use crate::error::{InvalidMove, SetupError};
use crate::games::GameKind;
use crate::grid::{Dir, Grid, Pos};
use crate::ids::Seat;
use crate::session::{Game, Mode, Terminal};

mod generate;

pub use generate::Generator;

pub const WIDTH: u8 = 9;
pub const HEIGHT: u8 = 7;

/// Allowed box counts.
pub const BOXES: std::ops::RangeInclusive<u8> = 1..=4;
pub const DEFAULT_BOXES: u8 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cell {
    Floor,
    Wall,
    Storage,
    Box,
    BoxOnStorage,
}

impl Cell {
    const fn is_storage(self) -> bool {
        matches!(self, Self::Storage | Self::BoxOnStorage)
    }

    const fn has_box(self) -> bool {
        matches!(self, Self::Box | Self::BoxOnStorage)
    }

    const fn is_open(self) -> bool {
        matches!(self, Self::Floor | Self::Storage)
    }

    /// The cell after a box was pushed out of it.
    const fn without_box(self) -> Self {
        match self {
            Self::BoxOnStorage => Self::Storage,
            Self::Box => Self::Floor,
            other => other,
        }
    }

    /// The cell after a box was pushed into it.
    const fn with_box(self) -> Self {
        match self {
            Self::Storage => Self::BoxOnStorage,
            Self::Floor => Self::Box,
            other => other,
        }
    }

    const fn icon(self) -> &'static str {
        match self {
            Self::Floor => "⬛",
            Self::Wall => "🟫",
            Self::Storage => "❎",
            Self::Box => "🟧",
            Self::BoxOnStorage => "✅",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sokoban {
    grid: Grid<Cell>,
    player: Pos,
    moves: u32,
}

impl Sokoban {
    /// Generates a random level with the given number of boxes.
    ///
    /// # Errors
    ///
    /// Returns `Err` if no solvable level could be generated.
    pub fn random<R: Rng + ?Sized>(boxes: u8, rng: &mut R) -> Result<Self, SetupError> {
        Generator::new(boxes.clamp(*BOXES.start(), *BOXES.end())).generate(rng)
    }

    fn from_parts(grid: Grid<Cell>, player: Pos) -> Self {
        Self {
            grid,
            player,
            moves: 0,
        }
    }

    /// Parses a level from text rows.
    ///
    /// `#` wall, `.` storage, `$` box, `*` box on storage, `@` player and a
    /// space for floor. Returns [`None`] if the rows are ragged, a character
    /// is unknown or there isn't exactly one player.
    #[must_use]
    pub fn from_rows(rows: &[&str]) -> Option<Self> {
        let width = rows.first()?.chars().count();
        let mut grid = Grid::filled(
            u8::try_from(width).ok()?,
            u8::try_from(rows.len()).ok()?,
            Cell::Floor,
        );

        if rows.iter().any(|r| r.chars().count() != width) {
            return None;
        }

        let mut player = None;
        for (y, row) in rows.iter().enumerate() {
            for (x, c) in row.chars().enumerate() {
                let pos = Pos::new(u8::try_from(x).ok()?, u8::try_from(y).ok()?);
                let cell = match c {
                    '#' => Cell::Wall,
                    '.' => Cell::Storage,
                    '$' => Cell::Box,
                    '*' => Cell::BoxOnStorage,
                    ' ' => Cell::Floor,
                    '@' if player.is_none() => {
                        player = Some(pos);
                        Cell::Floor
                    },
                    _ => return None,
                };

                *grid.get_mut(pos)? = cell;
            }
        }

        Some(Self::from_parts(grid, player?))
    }

    /// Whether every box sits on storage.
    #[must_use]
    pub fn is_won(&self) -> bool {
        !self.grid.iter().any(|(_, c)| *c == Cell::Box)
    }

    #[must_use]
    pub const fn player(&self) -> Pos {
        self.player
    }

    #[must_use]
    pub const fn moves(&self) -> u32 {
        self.moves
    }

    fn cell(&self, pos: Pos) -> Cell {
        self.grid.get(pos).copied().unwrap_or(Cell::Wall)
    }

    fn set(&mut self, pos: Pos, cell: Cell) {
        if let Some(c) = self.grid.get_mut(pos) {
            *c = cell;
        }
    }
}

impl Game for Sokoban {
    type Move = Dir;

    const KIND: GameKind = GameKind::Sokoban;
    const MODE: Mode = Mode::Solo;

    fn apply(&mut self, _seat: Seat, dir: Dir) -> Result<(), InvalidMove> {
        let target = self.player.step(dir);
        let cell = self.cell(target);

        if cell.has_box() {
            let beyond = target.step(dir);
            let behind = self.cell(beyond);
            if !behind.is_open() {
                return Err(InvalidMove::Blocked);
            }

            self.set(beyond, behind.with_box());
            self.set(target, cell.without_box());
        } else if !cell.is_open() {
            return Err(InvalidMove::Blocked);
        }

        self.player = target;
        self.moves += 1;
        Ok(())
    }

    fn check(&self) -> Terminal {
        if self.is_won() {
            Terminal::Won(Seat::P1)
        } else {
            Terminal::InProgress
        }
    }

    fn render(&self) -> String {
        let mut out = String::with_capacity(usize::from(WIDTH + 1) * usize::from(HEIGHT) * 4);
        for (pos, cell) in self.grid.iter() {
            if pos.x == 0 && pos.y != 0 {
                out.push('\n');
            }

            out.push_str(if pos == self.player { "😳" } else { cell.icon() });
        }

        _ = write!(out, "\nMoves: {}", self.moves);
        out
    }
}
