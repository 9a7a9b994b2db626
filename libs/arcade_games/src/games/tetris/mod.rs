//! Tetris on an 18x10 well, driven purely by input.
//!
//! There is no gravity tick: the piece only moves down on `down` or `drop`.

use std::collections::VecDeque;
use std::str::FromStr;

use arrayvec::ArrayVec;
use rand::rngs::StdRng;
use rand::seq::SliceRandom as _;
use rand::{Rng, SeedableRng as _};

use crate::error::InvalidMove;
use crate::games::GameKind;
use crate::ids::Seat;
use crate::session::{Game, Mode, Terminal};

mod piece;

pub use piece::{Piece, Shape};

pub const WIDTH: usize = 10;
pub const HEIGHT: usize = 18;

/// Points per cleared line.
pub const LINE_SCORE: u32 = 100;

const SPAWN_X: i8 = 4;
const KICKS: [i8; 3] = [0, -1, 1];

type Row = [Option<Shape>; WIDTH];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Input {
    Left,
    Right,
    Rotate,
    Down,
    Drop,
}

impl FromStr for Input {
    type Err = InvalidMove;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "left" | "a" | "⬅️" => Ok(Self::Left),
            "right" | "d" | "➡️" => Ok(Self::Right),
            "rotate" | "r" | "w" | "🔄" => Ok(Self::Rotate),
            "down" | "s" | "⬇️" => Ok(Self::Down),
            "drop" | "x" | "⏬" => Ok(Self::Drop),
            _ => Err(InvalidMove::Unparsable),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Tetris {
    /// `board[y][x]`, row 0 at the top.
    board: [Row; HEIGHT],
    active: Piece,
    bag: VecDeque<Shape>,
    score: u32,
    lines: u32,
    topped_out: bool,
    rng: StdRng,
}

fn cell_index(x: i8, y: i8) -> Option<(usize, usize)> {
    let x = usize::try_from(x).ok().filter(|x| *x < WIDTH)?;
    let y = usize::try_from(y).ok().filter(|y| *y < HEIGHT)?;
    Some((x, y))
}

impl Tetris {
    pub fn new<R: Rng>(rng: &mut R) -> Self {
        let mut game = Self {
            board: [[None; WIDTH]; HEIGHT],
            active: Piece::spawn(Shape::O, SPAWN_X),
            bag: VecDeque::with_capacity(14),
            score: 0,
            lines: 0,
            topped_out: false,
            rng: StdRng::from_rng(rng),
        };

        game.active = Piece::spawn(game.next_shape(), SPAWN_X);
        game
    }

    #[must_use]
    pub const fn active(&self) -> &Piece {
        &self.active
    }

    /// The shape that spawns after the active one.
    #[must_use]
    pub fn preview(&self) -> Option<Shape> {
        self.bag.front().copied()
    }

    #[must_use]
    pub const fn lines(&self) -> u32 {
        self.lines
    }

    /// Takes the next shape from the bag, refilling it with a shuffled set of
    /// all seven shapes whenever fewer than seven remain.
    fn next_shape(&mut self) -> Shape {
        if self.bag.len() < Shape::ALL.len() {
            let mut set = Shape::ALL;
            set.shuffle(&mut self.rng);
            self.bag.extend(set);
        }

        self.bag.pop_front().unwrap_or(Shape::I)
    }

    fn fits(&self, piece: &Piece) -> bool {
        piece.positions().all(|(x, y)| {
            cell_index(x, y).is_some_and(|(x, y)| self.board[y][x].is_none())
        })
    }

    /// Replaces the active piece if the candidate fits.
    fn try_place(&mut self, piece: Piece) -> bool {
        let fits = self.fits(&piece);
        if fits {
            self.active = piece;
        }
        fits
    }

    fn rotate(&mut self) -> bool {
        let rotated = self.active.rotated();
        KICKS
            .into_iter()
            .any(|dx| self.try_place(rotated.shifted(dx, 0)))
    }

    /// Writes the active piece into the board, clears lines and spawns the
    /// next piece.
    fn lock(&mut self) {
        for (x, y) in self.active.positions() {
            if let Some((x, y)) = cell_index(x, y) {
                self.board[y][x] = Some(self.active.shape);
            }
        }

        self.clear_lines();

        let next = Piece::spawn(self.next_shape(), SPAWN_X);
        self.topped_out = !self.fits(&next);
        self.active = next;
    }

    fn clear_lines(&mut self) {
        // a single piece spans at most four rows
        let full: ArrayVec<usize, 4> = (0..HEIGHT)
            .filter(|&y| self.board[y].iter().all(Option::is_some))
            .take(4)
            .collect();

        if full.is_empty() {
            return;
        }

        let mut next = [[None; WIDTH]; HEIGHT];
        let mut dst = HEIGHT;
        for y in (0..HEIGHT).rev().filter(|y| !full.contains(y)) {
            dst -= 1;
            next[dst] = self.board[y];
        }

        #[expect(clippy::cast_possible_truncation, reason = "at most 4")]
        let cleared = full.len() as u32;

        self.board = next;
        self.lines += cleared;
        self.score += LINE_SCORE * cleared;
    }

    #[cfg(test)]
    fn set_row(&mut self, y: usize, holes: &[usize]) {
        for (x, cell) in self.board[y].iter_mut().enumerate() {
            *cell = (!holes.contains(&x)).then_some(Shape::J);
        }
    }

    #[cfg(test)]
    fn set_active(&mut self, shape: Shape) {
        self.active = Piece::spawn(shape, SPAWN_X);
    }
}

impl Game for Tetris {
    type Move = Input;

    const KIND: GameKind = GameKind::Tetris;
    const MODE: Mode = Mode::Solo;

    fn apply(&mut self, _seat: Seat, input: Input) -> Result<(), InvalidMove> {
        if self.topped_out {
            return Err(InvalidMove::Blocked);
        }

        match input {
            Input::Left | Input::Right => {
                let dx = if input == Input::Left { -1 } else { 1 };
                if !self.try_place(self.active.shifted(dx, 0)) {
                    return Err(InvalidMove::Blocked);
                }
            },
            Input::Rotate => {
                if !self.rotate() {
                    return Err(InvalidMove::Blocked);
                }
            },
            Input::Down => {
                if !self.try_place(self.active.shifted(0, 1)) {
                    self.lock();
                }
            },
            Input::Drop => {
                while self.try_place(self.active.shifted(0, 1)) {}
                self.lock();
            },
        }

        Ok(())
    }

    fn check(&self) -> Terminal {
        if self.topped_out {
            Terminal::Lost
        } else {
            Terminal::InProgress
        }
    }

    fn render(&self) -> String {
        let mut board = self.board;
        if !self.topped_out {
            for (x, y) in self.active.positions() {
                if let Some((x, y)) = cell_index(x, y) {
                    board[y][x] = Some(self.active.shape);
                }
            }
        }

        let mut out = String::with_capacity((WIDTH + 2) * HEIGHT * 4 + 16);
        for row in &board {
            out.push('▫');
            for cell in row {
                out.push_str(cell.map_or("⬛", Shape::icon));
            }
            out.push_str("▫\n");
        }

        if let Some(next) = self.preview() {
            out.push_str("Next: ");
            out.push_str(next.icon());
            out.push(' ');
            out.push_str(next.name());
        }
        out
    }

    fn score(&self) -> Option<u32> {
        Some(self.score)
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng as _;
    use rand::rngs::StdRng;

    use super::*;

    fn tetris() -> Tetris {
        Tetris::new(&mut StdRng::seed_from_u64(5))
    }

    fn input(game: &mut Tetris, raw: &str) -> Result<(), InvalidMove> {
        game.apply(Seat::P1, raw.parse()?)
    }

    #[test]
    fn bag_deals_every_shape_once_per_seven() {
        let mut game = tetris();
        let mut seen = vec![game.active().shape];
        for _ in 0..6 {
            seen.push(game.next_shape());
        }

        seen.sort_by_key(|s| Shape::ALL.iter().position(|a| a == s));
        assert_eq!(seen, Shape::ALL, "first seven pieces are one full bag");
        assert!(game.bag.len() >= 7, "bag is refilled before running low");
    }

    #[test]
    fn wall_blocks_translation() {
        let mut game = tetris();
        game.set_active(Shape::I);
        for _ in 0..3 {
            input(&mut game, "left").expect("room to the left");
        }

        let before = *game.active();
        assert_eq!(input(&mut game, "left"), Err(InvalidMove::Blocked));
        assert_eq!(*game.active(), before, "blocked move leaves the piece in place");
    }

    #[test]
    fn rotation_kicks_off_the_wall() {
        let mut game = tetris();
        game.set_active(Shape::I);
        input(&mut game, "down").expect("room below");
        input(&mut game, "down").expect("room below");
        input(&mut game, "rotate").expect("vertical fits");

        for _ in 0..5 {
            input(&mut game, "right").expect("room to the right");
        }
        assert_eq!(input(&mut game, "right"), Err(InvalidMove::Blocked));
        assert_eq!(game.active().x, 9);

        input(&mut game, "rotate").expect("kicked one column left");
        assert_eq!(game.active().x, 8);
        assert!(game.active().positions().all(|(x, _)| x < 10));
    }

    #[test]
    fn clearing_a_line_scores() {
        let mut game = tetris();
        game.set_row(HEIGHT - 1, &[3, 4, 5, 6]);
        game.set_row(HEIGHT - 2, &[0, 3, 4, 5, 6]);
        game.set_active(Shape::I);
        let above = game.board[HEIGHT - 2];

        input(&mut game, "drop").expect("hard drop");
        assert_eq!(game.score(), Some(LINE_SCORE));
        assert_eq!(game.lines(), 1);

        // the partial row above shifted down into the bottom row
        assert_eq!(game.board[HEIGHT - 1], above);
        assert!(game.board[HEIGHT - 2].iter().all(Option::is_none));
        assert_eq!(game.check(), Terminal::InProgress);
    }

    #[test]
    fn down_locks_at_the_floor() {
        let mut game = tetris();
        game.set_active(Shape::O);
        for _ in 0..(HEIGHT - 2) {
            input(&mut game, "down").expect("room below");
        }

        assert!(game.board.iter().flatten().all(Option::is_none), "not locked yet");
        input(&mut game, "down").expect("locks");
        assert_eq!(game.board[HEIGHT - 1][4], Some(Shape::O));
        let top = game.active().positions().map(|(_, y)| y).min();
        assert_eq!(top, Some(0), "next piece spawned at the top");
    }

    #[test]
    fn colliding_spawn_loses() {
        let mut game = tetris();
        // leave the last column open so no row can ever clear
        for y in 2..HEIGHT {
            game.set_row(y, &[9]);
        }

        for _ in 0..10 {
            if game.check() == Terminal::Lost {
                break;
            }
            input(&mut game, "drop").expect("hard drop");
        }

        assert_eq!(game.check(), Terminal::Lost, "the well overflowed");
        assert_eq!(game.score(), Some(0));
        assert_eq!(input(&mut game, "left"), Err(InvalidMove::Blocked));
    }
}
