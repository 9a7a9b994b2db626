//! Snake on a 10x10 board.
//!
//! Every accepted input sets the heading and advances the snake by one tick.

use std::collections::VecDeque;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng as _};

use crate::error::InvalidMove;
use crate::games::GameKind;
use crate::grid::{Dir, Pos};
use crate::ids::Seat;
use crate::session::{Game, Mode, Terminal};

pub const WIDTH: u8 = 10;
pub const HEIGHT: u8 = 10;

const CELLS: usize = WIDTH as usize * HEIGHT as usize;

#[derive(Debug, Clone)]
pub struct Snake {
    /// The head is at the front.
    body: VecDeque<Pos>,
    heading: Dir,
    food: Pos,
    score: u32,
    crashed: bool,
    rng: StdRng,
}

const fn in_bounds(pos: Pos) -> bool {
    pos.x < WIDTH && pos.y < HEIGHT
}

impl Snake {
    /// Starts with a length-1 snake in the center, heading right.
    pub fn new<R: Rng>(rng: &mut R) -> Self {
        let mut rng = StdRng::from_rng(rng);
        let head = Pos::new(WIDTH / 2 - 1, HEIGHT / 2);
        let body = VecDeque::from([head]);
        let food = random_free(&mut rng, &body);

        Self {
            body,
            heading: Dir::Right,
            food,
            score: 0,
            crashed: false,
            rng,
        }
    }

    #[must_use]
    pub fn head(&self) -> Pos {
        self.body[0]
    }

    #[must_use]
    pub fn length(&self) -> usize {
        self.body.len()
    }

    #[must_use]
    pub const fn food(&self) -> Pos {
        self.food
    }

    /// Advances one tick in the current heading.
    fn step(&mut self) {
        let next = self.head().step(self.heading);
        if !in_bounds(next) {
            self.crashed = true;
            return;
        }

        let eats = next == self.food;

        // the tail moves out of the way unless the snake grows this tick
        let solid = self.body.len() - usize::from(!eats);
        if self.body.iter().take(solid).any(|&p| p == next) {
            self.crashed = true;
            return;
        }

        self.body.push_front(next);
        if eats {
            self.score += 1;
            if self.body.len() < CELLS {
                self.food = random_free(&mut self.rng, &self.body);
            }
        } else {
            self.body.pop_back();
        }
    }

    #[cfg(test)]
    fn place_food(&mut self, food: Pos) {
        self.food = food;
    }
}

/// Picks a random cell not covered by the body.
///
/// The body must not cover the entire board.
fn random_free<R: Rng + ?Sized>(rng: &mut R, body: &VecDeque<Pos>) -> Pos {
    loop {
        let pos = Pos::new(rng.random_range(0..WIDTH), rng.random_range(0..HEIGHT));
        if !body.contains(&pos) {
            return pos;
        }
    }
}

impl Game for Snake {
    type Move = Dir;

    const KIND: GameKind = GameKind::Snake;
    const MODE: Mode = Mode::Solo;

    fn apply(&mut self, _seat: Seat, dir: Dir) -> Result<(), InvalidMove> {
        if self.body.len() > 1 && dir == self.heading.opposite() {
            return Err(InvalidMove::Reverse);
        }

        self.heading = dir;
        self.step();
        Ok(())
    }

    fn check(&self) -> Terminal {
        if self.crashed {
            Terminal::Lost
        } else if self.body.len() >= CELLS {
            Terminal::Won(Seat::P1)
        } else {
            Terminal::InProgress
        }
    }

    fn render(&self) -> String {
        let mut out = String::with_capacity(CELLS * 4 + usize::from(HEIGHT));
        for y in 0..HEIGHT {
            for x in 0..WIDTH {
                let pos = Pos::new(x, y);
                let icon = if pos == self.head() {
                    if self.crashed { "😵" } else { "🐍" }
                } else if self.body.contains(&pos) {
                    "🟩"
                } else if pos == self.food && self.body.len() < CELLS {
                    "🍎"
                } else {
                    "⬛"
                };
                out.push_str(icon);
            }
            out.push('\n');
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

    fn snake() -> Snake {
        Snake::new(&mut StdRng::seed_from_u64(1))
    }

    #[test]
    fn food_is_never_on_the_body() {
        let mut rng = StdRng::seed_from_u64(99);
        for _ in 0..50 {
            let game = Snake::new(&mut rng);
            assert_ne!(game.food(), game.head());
        }
    }

    #[test]
    fn eating_grows_and_scores() {
        let mut game = snake();
        let head = game.head();
        game.place_food(head.step(Dir::Right));

        game.apply(Seat::P1, Dir::Right).expect("legal move");
        assert_eq!(game.length(), 2);
        assert_eq!(game.score(), Some(1));
        assert!(!game.body.contains(&game.food()), "food relocated to a free cell");
        assert_eq!(game.check(), Terminal::InProgress);
    }

    #[test]
    fn wall_hit_loses() {
        let mut game = snake();
        game.place_food(Pos::new(0, 0));
        for _ in 0..(WIDTH / 2) {
            game.apply(Seat::P1, Dir::Right).expect("legal move");
        }

        assert_eq!(game.head().x, WIDTH - 1);
        assert_eq!(game.check(), Terminal::InProgress);

        game.apply(Seat::P1, Dir::Right).expect("legal move");
        assert_eq!(game.check(), Terminal::Lost, "ran into the wall");
    }

    #[test]
    fn body_hit_loses() {
        let mut game = snake();
        // grow to length 5 by placing food in front each step
        for _ in 0..4 {
            let next = game.head().step(Dir::Right);
            game.place_food(next);
            game.apply(Seat::P1, Dir::Right).expect("legal move");
        }
        assert_eq!(game.length(), 5);
        game.place_food(Pos::new(0, 0));

        for dir in [Dir::Down, Dir::Left] {
            game.apply(Seat::P1, dir).expect("legal move");
            assert_eq!(game.check(), Terminal::InProgress);
        }

        game.apply(Seat::P1, Dir::Up).expect("legal move");
        assert_eq!(game.check(), Terminal::Lost, "bit its own body");
    }

    #[test]
    fn reversing_is_rejected() {
        let mut game = snake();
        let next = game.head().step(Dir::Right);
        game.place_food(next);
        game.apply(Seat::P1, Dir::Right).expect("legal move");

        let head = game.head();
        assert_eq!(game.apply(Seat::P1, Dir::Left), Err(InvalidMove::Reverse));
        assert_eq!(game.head(), head, "rejected move must not advance");
    }
}
