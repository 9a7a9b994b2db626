use std::fmt::Write as _;
use std::str::FromStr;

use rand::Rng;
use rand::seq::IndexedRandom as _;

use crate::error::{InvalidMove, SetupError};
use crate::games::GameKind;
use crate::ids::Seat;
use crate::session::{Game, Mode, Terminal};

mod words;

pub use words::Theme;

/// Wrong guesses allowed before the game is lost.
pub const MAX_DAMAGE: u8 = 5;

/// Guess the word one letter at a time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hangman {
    word: String,
    /// Bit `n` is set if letter `'a' + n` was guessed.
    guessed: u32,
    damage: u8,
}

/// A lowercase ASCII letter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Letter(u8);

impl Letter {
    const fn bit(self) -> u32 {
        1 << (self.0 - b'a')
    }
}

impl FromStr for Letter {
    type Err = InvalidMove;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.as_bytes() {
            [c] if c.is_ascii_alphabetic() => Ok(Self(c.to_ascii_lowercase())),
            _ => Err(InvalidMove::NotALetter),
        }
    }
}

fn letters(word: &str) -> impl Iterator<Item = Letter> + use<'_> {
    word.bytes().filter(u8::is_ascii_lowercase).map(Letter)
}

impl Hangman {
    /// Picks a random word from the theme.
    pub fn random<R: Rng + ?Sized>(theme: Theme, rng: &mut R) -> Self {
        let word = theme.words().choose(rng).copied().unwrap_or("hangman");
        Self {
            word: word.to_owned(),
            guessed: 0,
            damage: 0,
        }
    }

    /// Uses a custom word.
    ///
    /// # Errors
    ///
    /// Returns `Err` if the word has anything but ASCII letters and spaces or
    /// has no letters at all.
    pub fn with_word(word: &str) -> Result<Self, SetupError> {
        let word = word.trim().to_ascii_lowercase();
        let valid = word.bytes().all(|c| c.is_ascii_lowercase() || c == b' ')
            && word.bytes().any(|c| c != b' ');

        if !valid {
            return Err(SetupError::InvalidWord(word));
        }

        Ok(Self {
            word,
            guessed: 0,
            damage: 0,
        })
    }

    #[must_use]
    pub const fn damage(&self) -> u8 {
        self.damage
    }

    #[must_use]
    pub fn word(&self) -> &str {
        &self.word
    }

    fn is_guessed(&self, letter: Letter) -> bool {
        self.guessed & letter.bit() != 0
    }

    fn is_solved(&self) -> bool {
        letters(&self.word).all(|l| self.is_guessed(l))
    }

    /// The word with unguessed letters masked, i.e. `c _ t`.
    #[must_use]
    pub fn masked(&self) -> String {
        let mut out = String::with_capacity(self.word.len() * 2);
        for c in self.word.bytes() {
            if !out.is_empty() {
                out.push(' ');
            }

            match c {
                b' ' => out.push(' '),
                c if self.is_guessed(Letter(c)) => out.push(char::from(c)),
                _ => out.push('_'),
            }
        }
        out
    }
}

impl Game for Hangman {
    type Move = Letter;

    const KIND: GameKind = GameKind::Hangman;
    const MODE: Mode = Mode::Solo;

    fn apply(&mut self, _seat: Seat, letter: Letter) -> Result<(), InvalidMove> {
        if self.is_guessed(letter) {
            return Err(InvalidMove::AlreadyGuessed);
        }

        self.guessed |= letter.bit();
        if !letters(&self.word).any(|l| l == letter) {
            self.damage += 1;
        }

        Ok(())
    }

    fn check(&self) -> Terminal {
        if self.is_solved() {
            Terminal::Won(Seat::P1)
        } else if self.damage >= MAX_DAMAGE {
            Terminal::Lost
        } else {
            Terminal::InProgress
        }
    }

    fn render(&self) -> String {
        const PARTS: [&str; MAX_DAMAGE as usize] = ["🎩", "😟", "👕", "🩳", "👞👞"];

        let mut out = String::with_capacity(128);
        out.push_str("```\n|‾‾‾‾‾‾|\n");
        for (i, part) in PARTS.iter().enumerate() {
            let part = if usize::from(self.damage) > i { part } else { " " };
            _ = writeln!(out, "|      {part}");
        }
        out.push_str("|__________\n```\n");

        _ = writeln!(out, "`{}`", self.masked());

        let guessed = (b'a'..=b'z')
            .filter(|&c| self.is_guessed(Letter(c)))
            .map(char::from)
            .collect::<String>();
        _ = write!(out, "Guessed: {guessed}");
        out
    }
}
