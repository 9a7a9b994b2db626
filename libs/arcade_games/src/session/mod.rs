//! The per-game session state machine.
//!
//! Input flows through [`Session::submit`]: the turn arbiter checks the actor,
//! the game parses and applies the move, then the terminal check decides
//! whether to hand the turn over or resolve the session. Once resolved, the
//! session never changes again.

use std::str::FromStr;
use std::time::Duration;

use tokio::time::Instant;

use crate::error::{InvalidMove, MoveError, SetupError, WrongActor};
use crate::games::GameKind;
use crate::ids::{Seat, UserId};
use crate::render::{Frame, Message};


/// Whether a game is played alone or by two participants taking turns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Solo,
    Duel,
}

/// What a game reports about its board after a move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Terminal {
    InProgress,
    Won(Seat),
    Tied,
    Lost,
}

/// A game variant: board representation plus its rules.
pub trait Game: Send + 'static {
    /// A parsed move. Parsing failures are reported as invalid moves.
    type Move: FromStr<Err = InvalidMove>;

    const KIND: GameKind;
    const MODE: Mode;

    /// Validates and applies a move for the given seat.
    ///
    /// # Errors
    ///
    /// Returns `Err` if the move is illegal. The board must be unchanged then.
    fn apply(&mut self, seat: Seat, mv: Self::Move) -> Result<(), InvalidMove>;

    /// Evaluates the current board.
    fn check(&self) -> Terminal;

    /// Projects the board into text. Must not depend on anything but the
    /// board.
    fn render(&self) -> String;

    /// The current score, for games that keep one.
    fn score(&self) -> Option<u32> {
        None
    }

    /// Whether the board shows something transient that [`Game::settle`]
    /// should clear after a short delay.
    fn wants_settle(&self) -> bool {
        false
    }

    /// Clears transient board state.
    fn settle(&mut self) {}
}

/// Lifecycle status. Anything but [`Status::InProgress`] is final.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    InProgress,
    Won,
    Lost,
    Tied,
    TimedOut,
    Cancelled,
}

impl Status {
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        !matches!(self, Self::InProgress)
    }
}

/// What caused a session to end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndReason {
    /// The board reached a terminal state.
    Board,
    /// A participant of a duel stopped and forfeited.
    Forfeit(UserId),
    /// The solo player stopped.
    Stopped,
    /// Nobody made a move within the idle window.
    Idle,
    /// The same player started a new game of the same kind.
    Superseded,
}

/// The final outcome of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolution {
    pub status: Status,
    pub winner: Option<UserId>,
    pub reason: EndReason,
}

/// Result of an accepted move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Continue,
    Finished(Resolution),
}

/// The participants and whose turn it is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Players {
    p1: UserId,
    p2: Option<UserId>,
    turn: Seat,
}

impl Players {
    /// A solo player. The opponent seat stays empty.
    #[must_use]
    pub const fn solo(user: UserId) -> Self {
        Self {
            p1: user,
            p2: None,
            turn: Seat::P1,
        }
    }

    /// Two players. The first one starts.
    #[must_use]
    pub const fn duel(p1: UserId, p2: UserId) -> Self {
        Self {
            p1,
            p2: Some(p2),
            turn: Seat::P1,
        }
    }

    /// The user in the first seat, who started the session.
    #[must_use]
    pub const fn starter(&self) -> UserId {
        self.p1
    }

    #[must_use]
    pub const fn count(&self) -> usize {
        if self.p2.is_some() { 2 } else { 1 }
    }

    #[must_use]
    pub const fn turn(&self) -> Seat {
        self.turn
    }

    #[must_use]
    pub const fn user_id(&self, seat: Seat) -> Option<UserId> {
        match seat {
            Seat::P1 => Some(self.p1),
            Seat::P2 => self.p2,
        }
    }

    #[must_use]
    pub const fn turn_user_id(&self) -> UserId {
        match self.user_id(self.turn) {
            Some(user) => user,
            None => self.p1,
        }
    }

    #[must_use]
    pub fn seat_of(&self, user: UserId) -> Option<Seat> {
        if user == self.p1 {
            Some(Seat::P1)
        } else if self.p2 == Some(user) {
            Some(Seat::P2)
        } else {
            None
        }
    }

    /// The user in the other seat, if there is one.
    #[must_use]
    pub fn opponent_of(&self, user: UserId) -> Option<UserId> {
        self.seat_of(user).and_then(|s| self.user_id(s.next()))
    }

    pub fn iter(&self) -> impl Iterator<Item = UserId> + use<> {
        [Some(self.p1), self.p2].into_iter().flatten()
    }

    fn next_turn(&mut self) {
        if self.p2.is_some() {
            self.turn = self.turn.next();
        }
    }

    fn check_turn(&self, actor: UserId) -> Result<Seat, WrongActor> {
        let current = self.turn_user_id();
        if actor == current {
            Ok(self.turn)
        } else if self.seat_of(actor).is_some() {
            Err(WrongActor::NotYourTurn { current })
        } else {
            Err(WrongActor::NotParticipant)
        }
    }
}

fn is_stop(raw: &str) -> bool {
    raw.trim().eq_ignore_ascii_case("stop")
}

/// One play-through of a game.
#[derive(Debug)]
pub struct Session<G> {
    game: G,
    players: Players,
    status: Status,
    resolution: Option<Resolution>,
    created_at: Instant,
    last_activity_at: Instant,
    idle: Duration,
}

impl<G: Game> Session<G> {
    /// Creates a session for a freshly set up board.
    ///
    /// # Errors
    ///
    /// Returns `Err` if the players don't fit the game's mode.
    pub fn new(
        players: Players,
        game: G,
        idle: Duration,
        now: Instant,
    ) -> Result<Self, SetupError> {
        let expected = match G::MODE {
            Mode::Solo => 1,
            Mode::Duel => 2,
        };

        if players.count() != expected {
            return Err(SetupError::PlayerCount {
                expected,
                actual: players.count(),
            });
        }

        if players.p2 == Some(players.p1) {
            return Err(SetupError::SelfPlay);
        }

        Ok(Self {
            game,
            players,
            status: Status::InProgress,
            resolution: None,
            created_at: now,
            last_activity_at: now,
            idle,
        })
    }

    /// Processes one input from an actor.
    ///
    /// The input `stop` ends the session: solo games are cancelled, duels are
    /// forfeited by the actor. Anything else is parsed as a game move.
    ///
    /// # Errors
    ///
    /// Returns `Err` if the input was rejected. The session is unchanged then,
    /// except that an overdue idle timeout is resolved first.
    pub fn submit(&mut self, actor: UserId, raw: &str, now: Instant) -> Result<Step, MoveError> {
        // a timer that hasn't fired yet must still win against late input
        if self.expire(now).is_some() || self.status.is_terminal() {
            return Err(MoveError::Ended);
        }

        if self.players.seat_of(actor).is_none() {
            return Err(WrongActor::NotParticipant.into());
        }

        if is_stop(raw) {
            return Ok(Step::Finished(self.stop(actor)));
        }

        let seat = self.players.check_turn(actor)?;
        let mv = raw.trim().parse::<G::Move>()?;
        self.game.apply(seat, mv)?;
        self.last_activity_at = now;

        let resolution = match self.game.check() {
            Terminal::InProgress => {
                self.players.next_turn();
                return Ok(Step::Continue);
            },
            Terminal::Won(seat) => {
                self.resolve(Status::Won, self.players.user_id(seat), EndReason::Board)
            },
            Terminal::Tied => self.resolve(Status::Tied, None, EndReason::Board),
            Terminal::Lost => self.resolve(Status::Lost, None, EndReason::Board),
        };

        log::debug!("{:?} resolved: {resolution:?}", G::KIND);
        Ok(Step::Finished(resolution))
    }

    /// Resolves the session as timed out if the idle window has elapsed.
    ///
    /// Returns the resolution only on the call that actually resolved it.
    pub fn expire(&mut self, now: Instant) -> Option<Resolution> {
        let deadline = self.deadline()?;
        (now >= deadline).then(|| self.resolve(Status::TimedOut, None, EndReason::Idle))
    }

    /// Cancels the session because it was replaced by a newer one.
    pub fn supersede(&mut self) -> Option<Resolution> {
        (!self.status.is_terminal())
            .then(|| self.resolve(Status::Cancelled, None, EndReason::Superseded))
    }

    fn stop(&mut self, actor: UserId) -> Resolution {
        match G::MODE {
            Mode::Solo => self.resolve(Status::Cancelled, None, EndReason::Stopped),
            Mode::Duel => {
                let winner = self.players.opponent_of(actor);
                self.resolve(Status::Won, winner, EndReason::Forfeit(actor))
            },
        }
    }

    fn resolve(&mut self, status: Status, winner: Option<UserId>, reason: EndReason) -> Resolution {
        let resolution = Resolution {
            status,
            winner,
            reason,
        };

        self.status = status;
        self.resolution = Some(resolution);
        resolution
    }

    /// When the idle timer fires, as long as the session is in progress.
    #[must_use]
    pub fn deadline(&self) -> Option<Instant> {
        (!self.status.is_terminal()).then(|| self.last_activity_at + self.idle)
    }

    /// Clears transient board state, if the game has any.
    ///
    /// Returns whether anything changed.
    pub fn settle(&mut self) -> bool {
        if self.status.is_terminal() || !self.game.wants_settle() {
            return false;
        }

        self.game.settle();
        true
    }

    #[must_use]
    pub fn wants_settle(&self) -> bool {
        !self.status.is_terminal() && self.game.wants_settle()
    }

    /// Renders the current state. Never mutates anything.
    pub fn frame(&self) -> Frame {
        let header = match self.resolution {
            None => match G::MODE {
                Mode::Duel => Message::new("game-turn").arg("player", self.players.turn_user_id()),
                Mode::Solo => Message::new("game-playing").arg("player", self.players.p1),
            },
            Some(r) => outcome_message(r, &self.players),
        };

        let header = match self.game.score() {
            Some(score) => header.arg("score", score),
            None => header,
        };

        Frame {
            header,
            body: self.game.render(),
            closed: self.status.is_terminal(),
            nav: None,
        }
    }

    #[must_use]
    pub const fn status(&self) -> Status {
        self.status
    }

    #[must_use]
    pub const fn resolution(&self) -> Option<Resolution> {
        self.resolution
    }

    #[must_use]
    pub const fn players(&self) -> &Players {
        &self.players
    }

    #[must_use]
    pub const fn game(&self) -> &G {
        &self.game
    }

    #[must_use]
    pub fn score(&self) -> Option<u32> {
        self.game.score()
    }

    #[must_use]
    pub const fn created_at(&self) -> Instant {
        self.created_at
    }

    #[must_use]
    pub const fn last_activity_at(&self) -> Instant {
        self.last_activity_at
    }
}

fn outcome_message(resolution: Resolution, players: &Players) -> Message {
    match (resolution.status, resolution.reason, resolution.winner) {
        (Status::Won, EndReason::Forfeit(by), Some(winner)) => Message::new("game-forfeit")
            .arg("player", winner)
            .arg("loser", by),
        (Status::Won, _, winner) => {
            Message::new("game-won").arg("player", winner.unwrap_or(players.p1))
        },
        (Status::Lost, ..) => Message::new("game-lost").arg("player", players.p1),
        (Status::Tied, ..) => Message::new("game-tied"),
        (Status::TimedOut, ..) => Message::new("game-timed-out"),
        (Status::Cancelled, EndReason::Superseded, _) => Message::new("game-superseded"),
        (Status::Cancelled | Status::InProgress, ..) => Message::new("game-cancelled"),
    }
}
