//! Find the pairs on a 5x5 board.
//!
//! A mismatched pair stays face up until the session settles it or the next
//! tile is revealed. The joker matches anything and also discloses the true
//! partner of the tile it was matched with.

use std::str::FromStr;

use rand::Rng;
use rand::seq::{IndexedRandom as _, SliceRandom as _};

use crate::error::InvalidMove;
use crate::games::{GameKind, parse_index};
use crate::ids::Seat;
use crate::session::{Game, Mode, Terminal};

const SIDE: usize = 5;
const TILES: usize = SIDE * SIDE;
const PAIRS: usize = TILES / 2;

const EMOJI: [&str; 20] = [
    "🍎", "🍌", "🍒", "🍇", "🥝", "🍋", "🍑", "🍍", "🥥", "🍓", "🐶", "🐱", "🐸", "🦊", "🐼", "🐧",
    "🌵", "🌻", "🍄", "⭐",
];

const JOKER: &str = "🃏";
const HIDDEN: &str = "🟦";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tile {
    Face(&'static str),
    Joker,
}

impl Tile {
    const fn icon(self) -> &'static str {
        match self {
            Self::Face(e) => e,
            Self::Joker => JOKER,
        }
    }
}

/// A tile index in `0..25`. Parsed from `1`-`25`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Slot(usize);

impl FromStr for Slot {
    type Err = InvalidMove;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let index = parse_index(s)?;
        if index < TILES {
            Ok(Self(index))
        } else {
            Err(InvalidMove::OutOfRange)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Memory {
    tiles: [Tile; TILES],
    disclosed: [bool; TILES],
    /// The first tile of the current attempt.
    selected: Option<usize>,
    /// The last attempt's tiles if they didn't match.
    mismatch: Option<(usize, usize)>,
    attempts: u32,
}

impl Memory {
    /// Deals twelve random pairs and the joker in a random order.
    pub fn new<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let mut tiles = [Tile::Joker; TILES];
        let faces = EMOJI.choose_multiple(rng, PAIRS);
        for (i, &face) in faces.enumerate() {
            tiles[i * 2] = Tile::Face(face);
            tiles[i * 2 + 1] = Tile::Face(face);
        }

        tiles.shuffle(rng);
        Self::with_tiles(tiles)
    }

    const fn with_tiles(tiles: [Tile; TILES]) -> Self {
        Self {
            tiles,
            disclosed: [false; TILES],
            selected: None,
            mismatch: None,
            attempts: 0,
        }
    }

    #[must_use]
    pub const fn attempts(&self) -> u32 {
        self.attempts
    }

    fn is_face_up(&self, index: usize) -> bool {
        self.disclosed[index]
            || self.selected == Some(index)
            || self.mismatch.is_some_and(|(a, b)| a == index || b == index)
    }

    fn partner(&self, index: usize) -> Option<usize> {
        let tile = self.tiles[index];
        (0..TILES).find(|&i| i != index && self.tiles[i] == tile)
    }

    /// Resolves an attempt of two different tiles.
    fn pair(&mut self, first: usize, second: usize) {
        self.attempts += 1;

        let (a, b) = (self.tiles[first], self.tiles[second]);
        if a == b {
            self.disclosed[first] = true;
            self.disclosed[second] = true;
        } else if a == Tile::Joker || b == Tile::Joker {
            let other = if a == Tile::Joker { second } else { first };
            self.disclosed[first] = true;
            self.disclosed[second] = true;
            if let Some(partner) = self.partner(other) {
                self.disclosed[partner] = true;
            }
        } else {
            self.mismatch = Some((first, second));
        }

        // with every pair found, the joker has nothing left to match
        let pairs_done = (0..TILES)
            .filter(|&i| self.tiles[i] != Tile::Joker)
            .all(|i| self.disclosed[i]);

        if pairs_done {
            self.disclosed = [true; TILES];
        }
    }
}

impl Game for Memory {
    type Move = Slot;

    const KIND: GameKind = GameKind::Memory;
    const MODE: Mode = Mode::Solo;

    fn apply(&mut self, _seat: Seat, Slot(index): Slot) -> Result<(), InvalidMove> {
        if self.disclosed[index] || self.selected == Some(index) {
            return Err(InvalidMove::AlreadyRevealed);
        }

        self.mismatch = None;
        match self.selected.take() {
            None => self.selected = Some(index),
            Some(first) => self.pair(first, index),
        }

        Ok(())
    }

    fn check(&self) -> Terminal {
        if self.disclosed.iter().all(|&d| d) {
            Terminal::Won(Seat::P1)
        } else {
            Terminal::InProgress
        }
    }

    fn render(&self) -> String {
        let mut out = String::with_capacity(TILES * 4 + SIDE);
        for (i, tile) in self.tiles.iter().enumerate() {
            if i != 0 && i % SIDE == 0 {
                out.push('\n');
            }

            out.push_str(if self.is_face_up(i) { tile.icon() } else { HIDDEN });
        }
        out
    }

    fn score(&self) -> Option<u32> {
        Some(self.attempts)
    }

    fn wants_settle(&self) -> bool {
        self.mismatch.is_some()
    }

    fn settle(&mut self) {
        self.mismatch = None;
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng as _;
    use rand::rngs::StdRng;

    use super::*;

    /// Pairs sit next to each other: `0,1`, `2,3` and so on. The joker is last.
    fn ordered() -> Memory {
        let mut tiles = [Tile::Joker; TILES];
        for (i, tile) in tiles.iter_mut().take(TILES - 1).enumerate() {
            *tile = Tile::Face(EMOJI[i / 2]);
        }
        Memory::with_tiles(tiles)
    }

    fn reveal(game: &mut Memory, index: usize) -> Result<(), InvalidMove> {
        game.apply(Seat::P1, Slot(index))
    }

    #[test]
    fn deals_twelve_pairs_and_a_joker() {
        let game = Memory::new(&mut StdRng::seed_from_u64(3));
        let jokers = game.tiles.iter().filter(|t| **t == Tile::Joker).count();
        assert_eq!(jokers, 1);

        for i in (0..TILES).filter(|&i| game.tiles[i] != Tile::Joker) {
            assert!(game.partner(i).is_some(), "tile {i} has a partner");
        }
    }

    #[test]
    fn matching_pair_stays_disclosed() {
        let mut game = ordered();
        reveal(&mut game, 0).expect("hidden tile");
        reveal(&mut game, 1).expect("hidden tile");

        assert!(game.disclosed[0] && game.disclosed[1]);
        assert!(!game.wants_settle());
        assert_eq!(game.score(), Some(1));
    }

    #[test]
    fn mismatch_is_visible_until_settled() {
        let mut game = ordered();
        reveal(&mut game, 0).expect("hidden tile");
        reveal(&mut game, 2).expect("hidden tile");

        assert!(game.wants_settle());
        assert!(game.render().starts_with(&format!("{}🟦{}", EMOJI[0], EMOJI[1])));

        game.settle();
        assert!(!game.wants_settle());
        assert!(game.render().starts_with("🟦🟦🟦"));
        assert_eq!(game.attempts(), 1);
    }

    #[test]
    fn next_reveal_hides_the_mismatch() {
        let mut game = ordered();
        reveal(&mut game, 0).expect("hidden tile");
        reveal(&mut game, 2).expect("hidden tile");
        reveal(&mut game, 4).expect("hidden tile");

        assert_eq!(game.mismatch, None);
        assert_eq!(game.selected, Some(4));
        assert!(!game.is_face_up(0) && !game.is_face_up(2));
    }

    #[test]
    fn joker_discloses_the_partner() {
        let mut game = ordered();
        reveal(&mut game, TILES - 1).expect("hidden joker");
        reveal(&mut game, 6).expect("hidden tile");

        for i in [TILES - 1, 6, 7] {
            assert!(game.disclosed[i], "tile {i}");
        }
        assert_eq!(game.check(), Terminal::InProgress);
    }

    #[test]
    fn revealed_tiles_are_rejected() {
        let mut game = ordered();
        reveal(&mut game, 0).expect("hidden tile");
        reveal(&mut game, 1).expect("hidden tile");
        reveal(&mut game, 5).expect("hidden tile");
        let before = game.clone();

        assert_eq!(reveal(&mut game, 0), Err(InvalidMove::AlreadyRevealed));
        assert_eq!(reveal(&mut game, 5), Err(InvalidMove::AlreadyRevealed));
        assert_eq!(game, before);
    }

    #[test]
    fn all_pairs_win_and_disclose_the_joker() {
        let mut game = ordered();
        for pair in 0..PAIRS {
            assert_eq!(game.check(), Terminal::InProgress);
            reveal(&mut game, pair * 2).expect("hidden tile");
            reveal(&mut game, pair * 2 + 1).expect("hidden tile");
        }

        assert!(game.disclosed[TILES - 1], "joker disclosed at the end");
        assert_eq!(game.check(), Terminal::Won(Seat::P1));
        assert_eq!(game.score(), Some(12));
    }

    #[test]
    fn parse_slots() {
        assert_eq!("25".parse::<Slot>(), Ok(Slot(24)));
        assert_eq!("26".parse::<Slot>(), Err(InvalidMove::OutOfRange));
    }
}
