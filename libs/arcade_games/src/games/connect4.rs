//! Connect four on a configurable board.
//!
//! Pieces fall to the lowest open row of the chosen column. After each drop
//! only the lines through the new piece are checked, scanning at most three
//! cells in each direction.

use std::fmt::Write as _;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::InvalidMove;
use crate::games::{GameKind, parse_index};
use crate::ids::Seat;
use crate::session::{Game, Mode, Terminal};

/// Preset board sizes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scale {
    /// 6x5
    Small,
    /// 7x6, the classic board.
    #[default]
    Medium,
    /// 8x7
    Large,
    /// 10x9
    Huge,
}

impl Scale {
    /// The board `(width, height)`.
    #[must_use]
    pub const fn dims(self) -> (usize, usize) {
        match self {
            Self::Small => (6, 5),
            Self::Medium => (7, 6),
            Self::Large => (8, 7),
            Self::Huge => (10, 9),
        }
    }
}

impl FromStr for Scale {
    type Err = InvalidMove;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "small" => Ok(Self::Small),
            "medium" => Ok(Self::Medium),
            "large" => Ok(Self::Large),
            "huge" => Ok(Self::Huge),
            _ => Err(InvalidMove::Unparsable),
        }
    }
}

/// A 0-based column, parsed from a 1-based number.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Column(pub usize);

impl FromStr for Column {
    type Err = InvalidMove;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_index(s).map(Self)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Connect4 {
    width: usize,
    height: usize,
    /// Row-major, `y = 0` is the top row.
    cells: Vec<Option<Seat>>,
    /// The last placed piece as `(x, y)`.
    last: Option<(usize, usize)>,
    filled: usize,
}

const fn icon(p: Option<Seat>) -> &'static str {
    match p {
        Some(Seat::P1) => "🔴",
        Some(Seat::P2) => "🟡",
        None => "⚫",
    }
}

/// The four axes a line can run along, as `(dx, dy)`.
const AXES: [(isize, isize); 4] = [(1, 0), (0, 1), (1, 1), (1, -1)];

impl Connect4 {
    #[must_use]
    pub fn new(scale: Scale) -> Self {
        let (width, height) = scale.dims();
        Self {
            width,
            height,
            cells: vec![None; width * height],
            last: None,
            filled: 0,
        }
    }

    #[must_use]
    pub const fn width(&self) -> usize {
        self.width
    }

    #[must_use]
    pub const fn height(&self) -> usize {
        self.height
    }

    fn get(&self, x: isize, y: isize) -> Option<Seat> {
        let x = usize::try_from(x).ok().filter(|x| *x < self.width)?;
        let y = usize::try_from(y).ok().filter(|y| *y < self.height)?;
        self.cells[y * self.width + x]
    }

    /// Counts consecutive pieces of `seat` starting next to `(x, y)` along a
    /// direction, looking at most 3 cells ahead.
    fn run(&self, seat: Seat, (x, y): (isize, isize), (dx, dy): (isize, isize)) -> usize {
        (1..=3)
            .take_while(|&i| self.get(x + dx * i, y + dy * i) == Some(seat))
            .count()
    }

    fn is_win_at(&self, x: usize, y: usize) -> Option<Seat> {
        let (x, y) = (x.cast_signed(), y.cast_signed());
        let seat = self.get(x, y)?;
        AXES.into_iter()
            .any(|(dx, dy)| {
                1 + self.run(seat, (x, y), (dx, dy)) + self.run(seat, (x, y), (-dx, -dy)) >= 4
            })
            .then_some(seat)
    }
}

impl Game for Connect4 {
    type Move = Column;

    const KIND: GameKind = GameKind::Connect4;
    const MODE: Mode = Mode::Duel;

    fn apply(&mut self, seat: Seat, Column(x): Column) -> Result<(), InvalidMove> {
        if x >= self.width {
            return Err(InvalidMove::OutOfRange);
        }

        let y = (0..self.height)
            .rev()
            .find(|y| self.cells[y * self.width + x].is_none())
            .ok_or(InvalidMove::ColumnFull)?;

        self.cells[y * self.width + x] = Some(seat);
        self.last = Some((x, y));
        self.filled += 1;
        Ok(())
    }

    fn check(&self) -> Terminal {
        if let Some(seat) = self.last.and_then(|(x, y)| self.is_win_at(x, y)) {
            Terminal::Won(seat)
        } else if self.filled == self.cells.len() {
            Terminal::Tied
        } else {
            Terminal::InProgress
        }
    }

    fn render(&self) -> String {
        let mut out = String::with_capacity((self.width + 1) * (self.height + 1) * 4);
        for row in self.cells.chunks(self.width) {
            for &cell in row {
                out.push_str(icon(cell));
            }
            out.push('\n');
        }

        for x in 1..=self.width {
            _ = write!(out, "{x:^2}");
        }
        out
    }
}
