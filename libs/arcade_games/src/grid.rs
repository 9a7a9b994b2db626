//! Shared grid model for the board games.

use std::str::FromStr;

use crate::error::InvalidMove;

/// A board position. May be out of range for a given grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Pos {
    pub x: u8,
    pub y: u8,
}

impl Pos {
    #[must_use]
    pub const fn new(x: u8, y: u8) -> Self {
        Self { x, y }
    }

    /// Moves one step into a direction.
    ///
    /// Stepping off the low edge wraps around to a large value, which no grid
    /// considers in range.
    #[must_use]
    pub const fn step(self, dir: Dir) -> Self {
        let (dx, dy) = dir.offset();
        Self::new(
            self.x.wrapping_add(dx.cast_unsigned()),
            self.y.wrapping_add(dy.cast_unsigned()),
        )
    }
}

/// A cardinal direction. `Up` decreases `y`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dir {
    Up,
    Down,
    Left,
    Right,
}

impl Dir {
    pub const ALL: [Self; 4] = [Self::Up, Self::Down, Self::Left, Self::Right];

    #[must_use]
    pub const fn offset(self) -> (i8, i8) {
        match self {
            Self::Up => (0, -1),
            Self::Down => (0, 1),
            Self::Left => (-1, 0),
            Self::Right => (1, 0),
        }
    }

    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::Up => Self::Down,
            Self::Down => Self::Up,
            Self::Left => Self::Right,
            Self::Right => Self::Left,
        }
    }
}

impl FromStr for Dir {
    type Err = InvalidMove;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "up" | "w" | "⬆️" => Ok(Self::Up),
            "down" | "s" | "⬇️" => Ok(Self::Down),
            "left" | "a" | "⬅️" => Ok(Self::Left),
            "right" | "d" | "➡️" => Ok(Self::Right),
            _ => Err(InvalidMove::Unparsable),
        }
    }
}

/// A fixed-size, row-major grid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grid<T> {
    width: u8,
    height: u8,
    cells: Vec<T>,
}

impl<T: Clone> Grid<T> {
    pub fn filled(width: u8, height: u8, value: T) -> Self {
        Self {
            width,
            height,
            cells: vec![value; usize::from(width) * usize::from(height)],
        }
    }
}

impl<T> Grid<T> {
    #[must_use]
    pub const fn width(&self) -> u8 {
        self.width
    }

    #[must_use]
    pub const fn height(&self) -> u8 {
        self.height
    }

    #[must_use]
    pub const fn contains(&self, pos: Pos) -> bool {
        pos.x < self.width && pos.y < self.height
    }

    fn index(&self, pos: Pos) -> Option<usize> {
        self.contains(pos)
            .then(|| usize::from(pos.y) * usize::from(self.width) + usize::from(pos.x))
    }

    pub fn get(&self, pos: Pos) -> Option<&T> {
        self.cells.get(self.index(pos)?)
    }

    pub fn get_mut(&mut self, pos: Pos) -> Option<&mut T> {
        let index = self.index(pos)?;
        self.cells.get_mut(index)
    }

    /// Iterates all positions with their values, row by row.
    pub fn iter(&self) -> impl Iterator<Item = (Pos, &T)> + use<'_, T> {
        let width = usize::from(self.width);
        self.cells.iter().enumerate().map(move |(i, t)| {
            #[expect(clippy::cast_possible_truncation, reason = "grid dims fit in u8")]
            let pos = Pos::new((i % width) as u8, (i / width) as u8);
            (pos, t)
        })
    }
}
