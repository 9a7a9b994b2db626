//! Parses console input lines.
//!
//! Every line names the acting user first, as in `1 play connect4 2`, which
//! stands in for the author of a chat message. The rest of the line is
//! parsed by clap as a multicall command, so the command name comes first.

use std::fmt::Write as _;

use arcade_games::{GameKind, Message, PageId, SessionId, UserId};
use clap::{CommandFactory as _, Parser, Subcommand};

/// One parsed line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    Blank,
    Help,
    Quit,
    Command { user: UserId, command: Command },
}

/// What a user asked for.
#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Starts a game.
    ///
    /// Duels take the opponent's id, hangman a theme or a word and sokoban a
    /// box count.
    Play {
        /// One of the game names.
        game: GameKind,
        /// Opponent, theme, word or box count.
        #[arg(allow_hyphen_values = true)]
        args: Vec<String>,
    },
    /// Sends input to a running game.
    Move {
        /// The game id, like `#3`.
        #[arg(value_parser = parse_session)]
        session: SessionId,
        /// The move, like a cell, letter or direction.
        #[arg(required = true, num_args = 1.., allow_hyphen_values = true)]
        payload: Vec<String>,
    },
    /// Flips through an open list.
    Page {
        /// The list id, like `p2`.
        #[arg(value_parser = parse_pages)]
        pages: PageId,
        /// `first`, `prev`, `next`, `last` or a page number.
        direction: String,
    },
    /// Opens the leaderboard.
    Stats,
    /// Shows or changes the guild settings.
    Settings {
        /// `idle`, `scale`, `theme` or `boxes`.
        #[arg(requires = "value")]
        key: Option<String>,
        /// The new value, or `default`.
        value: Option<String>,
    },
}

#[derive(Debug, Parser)]
#[command(name = "arcade", multicall = true)]
struct UserLine {
    #[command(subcommand)]
    command: Command,
}

/// Words that don't act as a user.
#[derive(Debug, Subcommand)]
enum Control {
    Help,
    #[command(alias = "exit")]
    Quit,
}

#[derive(Debug, Parser)]
#[command(name = "arcade", multicall = true, disable_help_subcommand = true)]
struct ControlLine {
    #[command(subcommand)]
    control: Control,
}

/// The line could not be understood.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("`{0}` is not a valid id")]
    BadId(String),
    #[error("{0} named no command")]
    NoCommand(UserId),
    #[error(transparent)]
    Invalid(#[from] clap::Error),
}

impl ParseError {
    pub fn message(&self) -> Message {
        match self {
            Self::BadId(id) => Message::new("app-bad-id").arg("id", id),
            Self::NoCommand(user) => Message::new("app-no-command").arg("user", user),
            Self::Invalid(why) => {
                let details = why.render().to_string();
                Message::new("app-invalid-input").arg("details", details.trim_end())
            },
        }
    }
}

/// The command overview printed for `help`.
pub fn help() -> String {
    let mut command = UserLine::command();
    let mut text = "Commands, prefixed by the acting user id:".to_owned();
    for sub in command.get_subcommands_mut() {
        let about = sub.get_about().map(ToString::to_string).unwrap_or_default();
        let usage = sub.render_usage().to_string();
        let usage = usage.trim_start_matches("Usage:").trim();
        _ = write!(text, "\n  <user> {usage}\n      {about}");
    }

    text.push_str("\nWithout a user:\n  help\n  quit");
    text
}

impl std::str::FromStr for Input {
    type Err = ParseError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut words = line.split_whitespace();
        let Some(head) = words.next() else {
            return Ok(Self::Blank);
        };

        let user = match parse_user(head) {
            Ok(user) => user,
            Err(_) => {
                let lowered = head.to_ascii_lowercase();
                return match ControlLine::try_parse_from([lowered.as_str()]) {
                    Ok(ControlLine { control: Control::Help }) => Ok(Self::Help),
                    Ok(ControlLine { control: Control::Quit }) => Ok(Self::Quit),
                    Err(_) => Err(ParseError::BadId(head.to_owned())),
                };
            },
        };

        let rest = words.collect::<Vec<_>>();
        let Some(name) = rest.first() else {
            return Err(ParseError::NoCommand(user));
        };

        // command names are case-insensitive, arguments are not
        let name = name.to_ascii_lowercase();
        let args = std::iter::once(name.as_str()).chain(rest.iter().skip(1).copied());
        let UserLine { command } = UserLine::try_parse_from(args)?;
        Ok(Self::Command { user, command })
    }
}

/// Parses a number with an optional prefix and suffix, like `<@12>` or `#3`.
fn parse_id(raw: &str, prefix: &str, suffix: &str) -> Result<u64, std::num::ParseIntError> {
    let trimmed = raw.strip_prefix(prefix).unwrap_or(raw);
    let trimmed = trimmed.strip_suffix(suffix).unwrap_or(trimmed);
    trimmed.parse()
}

/// Parses a user id, plain or as a mention.
pub fn parse_user(raw: &str) -> Result<UserId, std::num::ParseIntError> {
    parse_id(raw, "<@", ">").map(UserId)
}

fn parse_session(raw: &str) -> Result<SessionId, std::num::ParseIntError> {
    parse_id(raw, "#", "").map(SessionId)
}

fn parse_pages(raw: &str) -> Result<PageId, std::num::ParseIntError> {
    parse_id(raw, "p", "").map(PageId)
}

#[cfg(test)]
mod tests {
    use clap::error::ErrorKind;

    use super::*;

    fn command(line: &str) -> (UserId, Command) {
        match line.parse::<Input>() {
            Ok(Input::Command { user, command }) => (user, command),
            other => panic!("expected a command for {line:?}, got {other:?}"),
        }
    }

    fn clap_error(line: &str) -> ErrorKind {
        match line.parse::<Input>() {
            Err(ParseError::Invalid(why)) => why.kind(),
            other => panic!("expected a clap error for {line:?}, got {other:?}"),
        }
    }

    #[test]
    fn command_definitions_are_consistent() {
        UserLine::command().debug_assert();
        ControlLine::command().debug_assert();
    }

    #[test]
    fn bare_words() {
        assert!(matches!("".parse::<Input>(), Ok(Input::Blank)), "empty line");
        assert!(matches!("  HELP ".parse::<Input>(), Ok(Input::Help)), "help");
        assert!(matches!("quit".parse::<Input>(), Ok(Input::Quit)), "quit");
        assert!(matches!("exit".parse::<Input>(), Ok(Input::Quit)), "exit alias");
    }

    #[test]
    fn play_with_and_without_args() {
        assert_eq!(command("1 play connect4 <@2>"), (UserId(1), Command::Play {
            game: GameKind::Connect4,
            args: vec!["<@2>".to_owned()],
        }));

        assert_eq!(command("<@7> PLAY Tic-Tac-Toe 8").1, Command::Play {
            game: GameKind::TicTacToe,
            args: vec!["8".to_owned()],
        });

        assert_eq!(command("3 play snake").1, Command::Play {
            game: GameKind::Snake,
            args: Vec::new(),
        });

        assert_eq!(command("3 play hangman ice cream").1, Command::Play {
            game: GameKind::Hangman,
            args: vec!["ice".to_owned(), "cream".to_owned()],
        });

        assert_eq!(clap_error("3 play chess"), ErrorKind::ValueValidation);
        assert_eq!(clap_error("3 play"), ErrorKind::MissingRequiredArgument);
    }

    #[test]
    fn move_keeps_the_whole_payload() {
        let Command::Move { session, payload } = command("2 move #4 ice cream").1 else {
            panic!("expected a move");
        };

        assert_eq!(session, SessionId(4));
        assert_eq!(payload.join(" "), "ice cream");
        assert_eq!(clap_error("2 move 4"), ErrorKind::MissingRequiredArgument);
    }

    #[test]
    fn page_and_settings() {
        assert_eq!(command("5 page p9 next").1, Command::Page {
            pages: PageId(9),
            direction: "next".to_owned(),
        });

        assert_eq!(command("5 settings").1, Command::Settings {
            key: None,
            value: None,
        });
        assert_eq!(command("5 settings idle 90").1, Command::Settings {
            key: Some("idle".to_owned()),
            value: Some("90".to_owned()),
        });
        assert_eq!(clap_error("5 settings idle"), ErrorKind::MissingRequiredArgument);
    }

    #[test]
    fn bad_ids_and_commands() {
        assert!(
            matches!("bob play snake".parse::<Input>(), Err(ParseError::BadId(id)) if id == "bob"),
            "unknown leading word"
        );
        assert!(
            matches!("7".parse::<Input>(), Err(ParseError::NoCommand(UserId(7)))),
            "user without command"
        );
        assert_eq!(clap_error("1 move #x 3"), ErrorKind::ValueValidation);

        let Err(why) = "1 dance".parse::<Input>() else {
            panic!("dance is not a command");
        };
        assert!(why.to_string().contains("dance"), "{why}");
    }

    #[test]
    fn help_lists_every_command() {
        let text = help();
        assert!(text.starts_with("Commands"), "{text}");
        for name in ["play", "move", "page", "stats", "settings"] {
            assert!(text.contains(&format!("<user> {name}")), "{name} missing: {text}");
        }
    }

    #[test]
    fn clap_errors_become_messages() {
        let Err(why) = "1 play chess".parse::<Input>() else {
            panic!("chess is not a game");
        };

        let message = why.message();
        assert_eq!(message.key, "app-invalid-input");
        let details = message.get("details").expect("details are attached");
        assert!(details.contains("chess"), "{details}");
    }
}
