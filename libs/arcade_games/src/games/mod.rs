//! The game variants.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

pub mod connect4;
pub mod hangman;
pub mod memory;
pub mod snake;
pub mod sokoban;
pub mod tetris;
pub mod tic_tac_toe;

pub use connect4::Connect4;
pub use hangman::Hangman;
pub use memory::Memory;
pub use snake::Snake;
pub use sokoban::Sokoban;
pub use tetris::Tetris;
pub use tic_tac_toe::TicTacToe;

/// Identifies a game variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GameKind {
    TicTacToe,
    Connect4,
    Hangman,
    Snake,
    Tetris,
    Sokoban,
    Memory,
}

impl GameKind {
    pub const ALL: [Self; 7] = [
        Self::TicTacToe,
        Self::Connect4,
        Self::Hangman,
        Self::Snake,
        Self::Tetris,
        Self::Sokoban,
        Self::Memory,
    ];

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::TicTacToe => "tic-tac-toe",
            Self::Connect4 => "connect4",
            Self::Hangman => "hangman",
            Self::Snake => "snake",
            Self::Tetris => "tetris",
            Self::Sokoban => "sokoban",
            Self::Memory => "memory",
        }
    }
}

impl fmt::Display for GameKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The name didn't match any game.
#[derive(Debug, Clone, thiserror::Error)]
#[error("unknown game `{0}`")]
pub struct UnknownGame(String);

impl FromStr for GameKind {
    type Err = UnknownGame;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Self::ALL
            .into_iter()
            .find(|k| k.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| UnknownGame(s.to_owned()))
    }
}

/// Parses a 1-based cell or column number into a 0-based index.
///
/// The upper bound is up to the game since it may depend on the board size.
fn parse_index(raw: &str) -> Result<usize, crate::InvalidMove> {
    let n: usize = raw.parse().map_err(|_| crate::InvalidMove::Unparsable)?;
    n.checked_sub(1).ok_or(crate::InvalidMove::OutOfRange)
}
