/// The seven tetromino shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Shape {
    I,
    O,
    T,
    S,
    Z,
    J,
    L,
}

/// A cell offset from the piece's pivot, as `(dx, dy)`. `dy` grows downwards.
pub type Offset = (i8, i8);

impl Shape {
    pub const ALL: [Self; 7] = [
        Self::I,
        Self::O,
        Self::T,
        Self::S,
        Self::Z,
        Self::J,
        Self::L,
    ];

    /// The spawn orientation.
    #[must_use]
    pub const fn cells(self) -> [Offset; 4] {
        match self {
            Self::I => [(-1, 0), (0, 0), (1, 0), (2, 0)],
            Self::O => [(0, 0), (1, 0), (0, 1), (1, 1)],
            Self::T => [(-1, 0), (0, 0), (1, 0), (0, -1)],
            Self::S => [(-1, 0), (0, 0), (0, -1), (1, -1)],
            Self::Z => [(-1, -1), (0, -1), (0, 0), (1, 0)],
            Self::J => [(-1, -1), (-1, 0), (0, 0), (1, 0)],
            Self::L => [(1, -1), (-1, 0), (0, 0), (1, 0)],
        }
    }

    #[must_use]
    pub const fn icon(self) -> &'static str {
        match self {
            Self::I => "🟦",
            Self::O => "🟨",
            Self::T => "🟪",
            Self::S => "🟩",
            Self::Z => "🟥",
            Self::J => "🟫",
            Self::L => "🟧",
        }
    }

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::I => "I",
            Self::O => "O",
            Self::T => "T",
            Self::S => "S",
            Self::Z => "Z",
            Self::J => "J",
            Self::L => "L",
        }
    }
}

/// The falling piece.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Piece {
    pub shape: Shape,
    pub cells: [Offset; 4],
    pub x: i8,
    pub y: i8,
}

impl Piece {
    /// Places a piece at column `x` so its topmost cell sits in row 0.
    #[must_use]
    pub fn spawn(shape: Shape, x: i8) -> Self {
        let cells = shape.cells();
        let top = cells.iter().map(|&(_, dy)| dy).min().unwrap_or(0);
        Self {
            shape,
            cells,
            x,
            y: -top,
        }
    }

    /// Absolute board coordinates of every cell.
    pub fn positions(&self) -> impl Iterator<Item = (i8, i8)> + use<> {
        let (x, y) = (self.x, self.y);
        self.cells.into_iter().map(move |(dx, dy)| (x + dx, y + dy))
    }

    #[must_use]
    pub fn shifted(self, dx: i8, dy: i8) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
            ..self
        }
    }

    /// Rotated clockwise around the pivot. The square doesn't rotate.
    #[must_use]
    pub fn rotated(self) -> Self {
        if self.shape == Shape::O {
            return self;
        }

        Self {
            cells: self.cells.map(|(dx, dy)| (-dy, dx)),
            ..self
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn four_rotations_are_identity() {
        for shape in Shape::ALL {
            let piece = Piece::spawn(shape, 4);
            let back = piece.rotated().rotated().rotated().rotated();
            assert_eq!(piece, back, "{shape:?}");
        }
    }

    #[test]
    fn spawn_touches_the_top_row() {
        for shape in Shape::ALL {
            let piece = Piece::spawn(shape, 4);
            let top = piece.positions().map(|(_, y)| y).min();
            assert_eq!(top, Some(0), "{shape:?}");
        }
    }
}
