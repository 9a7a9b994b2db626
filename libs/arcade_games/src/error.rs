//! Error taxonomy for sessions, setup and pagination.
//!
//! Every error that may reach an actor provides [`message`](MoveError::message)
//! with a stable l10n key.

use crate::ids::UserId;
use crate::render::Message;

/// Input came from someone not currently entitled to act.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum WrongActor {
    #[error("it's {current}'s turn")]
    NotYourTurn { current: UserId },
    #[error("not a participant of this game")]
    NotParticipant,
}

/// The actor was allowed to act, but the move itself is illegal.
///
/// Returning this from [`Game::apply`](crate::Game::apply) guarantees the board
/// was left untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum InvalidMove {
    #[error("input not understood")]
    Unparsable,
    #[error("target is out of range")]
    OutOfRange,
    #[error("cell is already occupied")]
    Occupied,
    #[error("column is full")]
    ColumnFull,
    #[error("not a letter")]
    NotALetter,
    #[error("letter was already guessed")]
    AlreadyGuessed,
    #[error("cannot reverse into itself")]
    Reverse,
    #[error("movement is blocked")]
    Blocked,
    #[error("tile is already revealed")]
    AlreadyRevealed,
}

impl InvalidMove {
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Unparsable => "move-unparsable",
            Self::OutOfRange => "move-out-of-range",
            Self::Occupied => "move-occupied",
            Self::ColumnFull => "move-column-full",
            Self::NotALetter => "move-not-a-letter",
            Self::AlreadyGuessed => "move-already-guessed",
            Self::Reverse => "move-reverse",
            Self::Blocked => "move-blocked",
            Self::AlreadyRevealed => "move-already-revealed",
        }
    }
}

/// Why a submitted move was rejected.
///
/// None of these change the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum MoveError {
    #[error(transparent)]
    WrongActor(#[from] WrongActor),
    #[error(transparent)]
    InvalidMove(#[from] InvalidMove),
    #[error("the game has already ended")]
    Ended,
    #[error("no such game session")]
    UnknownSession,
}

impl MoveError {
    /// The ephemeral notice shown to the offending actor.
    #[must_use]
    pub fn message(self) -> Message {
        match self {
            Self::WrongActor(WrongActor::NotYourTurn { current }) => {
                Message::new("error-not-your-turn").arg("player", current)
            },
            Self::WrongActor(WrongActor::NotParticipant) => Message::new("error-not-participant"),
            Self::InvalidMove(m) => Message::new(m.key()),
            Self::Ended => Message::new("error-session-ended"),
            Self::UnknownSession => Message::new("error-unknown-session"),
        }
    }
}

/// A session could not be created. Fatal for that session only.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SetupError {
    #[error("this game needs {expected} player(s), got {actual}")]
    PlayerCount { expected: usize, actual: usize },
    #[error("cannot play against yourself")]
    SelfPlay,
    #[error("word `{0}` may only contain letters and spaces")]
    InvalidWord(String),
    #[error("no solvable board found after {attempts} attempts")]
    Generation { attempts: u32 },
}

impl SetupError {
    #[must_use]
    pub fn message(&self) -> Message {
        match self {
            Self::PlayerCount { expected, .. } => {
                Message::new("error-player-count").arg("expected", expected)
            },
            Self::SelfPlay => Message::new("error-self-play"),
            Self::InvalidWord(word) => Message::new("error-invalid-word").arg("word", word),
            Self::Generation { attempts } => {
                Message::new("error-generation").arg("attempts", attempts)
            },
        }
    }
}

/// Why a navigation request was rejected.
#[derive(Debug, thiserror::Error)]
pub enum NavError {
    #[error("only the owner may navigate")]
    NotOwner,
    #[error("page {requested} is not within 1..={total}")]
    InvalidPage { requested: usize, total: usize },
    #[error("navigation has been closed")]
    Closed,
    #[error("no such page browser")]
    UnknownHandle,
    #[error("failed to load page")]
    Fetch(#[source] anyhow::Error),
}

impl NavError {
    #[must_use]
    pub fn message(&self) -> Message {
        match self {
            Self::NotOwner => Message::new("error-not-owner"),
            Self::InvalidPage { total, .. } => Message::new("error-invalid-page").arg("total", total),
            Self::Closed => Message::new("error-pages-closed"),
            Self::UnknownHandle => Message::new("error-unknown-pages"),
            Self::Fetch(_) => Message::new("error-page-fetch"),
        }
    }
}
