use std::fmt::Write as _;
use std::str::FromStr;

use crate::error::InvalidMove;
use crate::games::{GameKind, parse_index};
use crate::ids::Seat;
use crate::session::{Game, Mode, Terminal};

/// Classic 3x3 tic-tac-toe. P1 plays ❌, P2 plays ⭕.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TicTacToe {
    /// Indexed as `[y][x]`.
    board: [[Option<Seat>; 3]; 3],
}

/// A cell index in `0..9`, row-major. Parsed from `1`-`9`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cell(usize);

impl FromStr for Cell {
    type Err = InvalidMove;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let index = parse_index(s)?;
        if index < 9 {
            Ok(Self(index))
        } else {
            Err(InvalidMove::OutOfRange)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WinLine {
    Row(usize),
    Column(usize),
    DiagTopLeft,
    DiagTopRight,
}

impl WinLine {
    fn is_match(self, x: usize, y: usize) -> bool {
        match self {
            Self::Row(y_actual) => y == y_actual,
            Self::Column(x_actual) => x == x_actual,
            Self::DiagTopLeft => x == y,
            Self::DiagTopRight => 2usize.wrapping_sub(x) == y,
        }
    }
}

const fn icon(p: Option<Seat>) -> &'static str {
    match p {
        Some(Seat::P1) => "❌",
        Some(Seat::P2) => "⭕",
        None => "⬜",
    }
}

impl TicTacToe {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a board from row-major codes: `0` empty, `1` for P1, `2` for P2.
    ///
    /// Returns [`None`] if any code is out of range.
    #[must_use]
    pub fn from_codes(codes: [u8; 9]) -> Option<Self> {
        let mut board = [[None; 3]; 3];
        for (i, code) in codes.into_iter().enumerate() {
            board[i / 3][i % 3] = match code {
                0 => None,
                1 => Some(Seat::P1),
                2 => Some(Seat::P2),
                _ => return None,
            };
        }

        Some(Self { board })
    }

    fn is_full(&self) -> bool {
        !self.board.as_flattened().contains(&None)
    }

    /// Finds the winner and the line they completed.
    #[must_use]
    pub fn winner(&self) -> Option<(Seat, WinLine)> {
        let b = &self.board;
        let line = |cells: [Option<Seat>; 3]| match cells {
            [Some(a), Some(b), Some(c)] if a == b && b == c => Some(a),
            _ => None,
        };

        let lines = (0..3)
            .map(|y| (WinLine::Row(y), [b[y][0], b[y][1], b[y][2]]))
            .chain((0..3).map(|x| (WinLine::Column(x), [b[0][x], b[1][x], b[2][x]])))
            .chain([
                (WinLine::DiagTopLeft, [b[0][0], b[1][1], b[2][2]]),
                (WinLine::DiagTopRight, [b[0][2], b[1][1], b[2][0]]),
            ]);

        for (kind, cells) in lines {
            if let Some(seat) = line(cells) {
                return Some((seat, kind));
            }
        }

        None
    }
}

impl Game for TicTacToe {
    type Move = Cell;

    const KIND: GameKind = GameKind::TicTacToe;
    const MODE: Mode = Mode::Duel;

    fn apply(&mut self, seat: Seat, Cell(index): Cell) -> Result<(), InvalidMove> {
        let cell = self
            .board
            .as_flattened_mut()
            .get_mut(index)
            .ok_or(InvalidMove::OutOfRange)?;

        if cell.is_some() {
            return Err(InvalidMove::Occupied);
        }

        *cell = Some(seat);
        Ok(())
    }

    fn check(&self) -> Terminal {
        if let Some((seat, _)) = self.winner() {
            Terminal::Won(seat)
        } else if self.is_full() {
            Terminal::Tied
        } else {
            Terminal::InProgress
        }
    }

    fn render(&self) -> String {
        const KEYCAPS: [&str; 9] = ["1️⃣", "2️⃣", "3️⃣", "4️⃣", "5️⃣", "6️⃣", "7️⃣", "8️⃣", "9️⃣"];

        let win_line = self.winner().map(|(_, line)| line);
        let mut out = String::with_capacity(96);
        for (y, row) in self.board.iter().enumerate() {
            for (x, &cell) in row.iter().enumerate() {
                let text = match (cell, win_line) {
                    (Some(_), Some(line)) if line.is_match(x, y) => "🟩",
                    (None, None) => KEYCAPS[y * 3 + x],
                    (cell, _) => icon(cell),
                };
                out.push_str(text);
            }
            out.push('\n');
        }

        _ = write!(out, "{} P1 · {} P2", icon(Some(Seat::P1)), icon(Some(Seat::P2)));
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn top_row_wins() {
        let game = TicTacToe::from_codes([1, 1, 1, 0, 2, 0, 2, 0, 2]).expect("valid codes");
        assert_eq!(game.check(), Terminal::Won(Seat::P1), "top row is complete");
        assert_eq!(game.winner().map(|w| w.1), Some(WinLine::Row(0)));
    }

    #[test]
    fn columns_and_diagonals() {
        let column = TicTacToe::from_codes([2, 1, 0, 2, 1, 0, 0, 1, 0]).expect("valid codes");
        assert_eq!(column.winner().map(|w| w.1), Some(WinLine::Column(1)));

        let diag = TicTacToe::from_codes([1, 0, 2, 0, 2, 1, 2, 0, 1]).expect("valid codes");
        assert_eq!(diag.check(), Terminal::Won(Seat::P2));
        assert_eq!(diag.winner().map(|w| w.1), Some(WinLine::DiagTopRight));
    }

    #[test]
    fn full_board_without_line_ties() {
        let game = TicTacToe::from_codes([1, 2, 1, 1, 2, 2, 2, 1, 1]).expect("valid codes");
        assert_eq!(game.check(), Terminal::Tied);
    }

    #[test]
    fn occupied_cell_is_rejected() {
        let mut game = TicTacToe::new();
        game.apply(Seat::P1, Cell(4)).expect("empty cell");
        let before = game.clone();

        assert_eq!(game.apply(Seat::P2, Cell(4)), Err(InvalidMove::Occupied));
        assert_eq!(game, before, "rejected move must not change the board");
    }

    #[test]
    fn parse_cells() {
        assert_eq!("1".parse::<Cell>(), Ok(Cell(0)));
        assert_eq!("9".parse::<Cell>(), Ok(Cell(8)));
        assert_eq!("0".parse::<Cell>(), Err(InvalidMove::OutOfRange));
        assert_eq!("10".parse::<Cell>(), Err(InvalidMove::OutOfRange));
        assert_eq!("x".parse::<Cell>(), Err(InvalidMove::Unparsable));
    }

    #[test]
    fn render_is_pure() {
        let game = TicTacToe::from_codes([1, 0, 0, 0, 2, 0, 0, 0, 0]).expect("valid codes");
        assert_eq!(game.render(), game.render(), "same board, same output");
        assert!(game.render().starts_with("❌2️⃣3️⃣\n"), "{}", game.render());
    }
}
