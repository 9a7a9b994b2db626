//! A line-based frontend standing in for a chat platform.
//!
//! Input lines become commands of the named user. Frames and notices are
//! printed by [`ConsoleSink`].

use std::fmt::Write as _;
use std::num::NonZeroUsize;
use std::time::Duration;

use anyhow::Context as _;
use arcade_games::games::hangman::Theme;
use arcade_games::games::sokoban;
use arcade_games::games::{Connect4, Hangman, Memory, Snake, Sokoban, Tetris, TicTacToe};
use arcade_games::{
    GameKind, Hub, Message, PageId, PageSource, Players, RenderSink as _, SessionId, UserId,
};
use rand::Rng as _;
use tokio::io::{AsyncBufRead, AsyncBufReadExt as _};

use crate::config::GamesConfig;
use crate::data::{Cache, GuildId, GuildSettings, GuildSettingsPatch, Store, UserData};
use crate::fmt::l10n;

mod command;
mod sink;

use command::{Command, Input};
pub use sink::ConsoleSink;

/// Whether to keep reading input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

pub struct Console<S> {
    hub: Hub<ConsoleSink<S>>,
    guild: GuildId,
    idle: Duration,
    page_size: NonZeroUsize,
}

impl<S: Store> Console<S> {
    pub fn new(sink: ConsoleSink<S>, guild: GuildId, games: &GamesConfig) -> Self {
        Self {
            hub: Hub::with_settle_delay(sink, games.settle_delay()),
            guild,
            idle: games.idle_timeout(),
            page_size: games.page_size,
        }
    }

    /// Handles lines until the input ends or `quit` is read.
    ///
    /// # Errors
    ///
    /// Returns `Err` if reading the input or writing output fails.
    pub async fn run<R>(&self, input: R) -> anyhow::Result<()>
    where
        R: AsyncBufRead + Unpin,
    {
        self.print(&command::help())?;

        let mut lines = input.lines();
        while let Some(line) = lines.next_line().await.context("cannot read console input")? {
            if self.handle(&line).await == Flow::Quit {
                break;
            }
        }

        log::info!("Console closed with {} live session(s).", self.hub.session_count());
        Ok(())
    }

    /// Handles one input line.
    pub async fn handle(&self, line: &str) -> Flow {
        let (user, command) = match line.parse::<Input>() {
            Ok(Input::Blank) => return Flow::Continue,
            Ok(Input::Quit) => return Flow::Quit,
            Ok(Input::Help) => {
                self.print_lossy(&command::help());
                return Flow::Continue;
            },
            Ok(Input::Command { user, command }) => (user, command),
            Err(why) => {
                self.print_lossy(&l10n::format(&why.message()));
                return Flow::Continue;
            },
        };

        log::debug!("{user}: {command:?}");

        match command {
            Command::Play { game, args } => {
                let arg = (!args.is_empty()).then(|| args.join(" "));
                match self.play(user, game, arg.as_deref()).await {
                    Ok(id) => self.say(
                        Message::new("app-started")
                            .arg("game", game)
                            .arg("session", id),
                    ),
                    Err(message) => self.notice(user, message).await,
                }
            },
            Command::Move { session, payload } => {
                // rejections are reported by the hub
                _ = self.hub.submit(session, user, &payload.join(" ")).await;
            },
            Command::Page { pages, direction } => {
                _ = self.hub.navigate(pages, user, &direction).await;
            },
            Command::Stats => match self.stats(user).await {
                Ok(id) => self.say(Message::new("app-pages-opened").arg("pages", id)),
                Err(message) => self.notice(user, message).await,
            },
            Command::Settings { key, value } => match self.settings(key.zip(value)).await {
                Ok(text) => self.print_lossy(&text),
                Err(message) => self.notice(user, message).await,
            },
        }

        Flow::Continue
    }

    fn cache(&self) -> &Cache<S> {
        self.hub.sink().cache()
    }

    async fn guild_settings(&self) -> Result<GuildSettings, Message> {
        self.cache()
            .guild_settings(self.guild)
            .await
            .map_err(store_failed)
    }

    async fn play(
        &self,
        user: UserId,
        kind: GameKind,
        arg: Option<&str>,
    ) -> Result<SessionId, Message> {
        let settings = self.guild_settings().await?;
        let idle = settings
            .idle_timeout_secs
            .map_or(self.idle, Duration::from_secs);

        let hub = &self.hub;
        let started = match kind {
            GameKind::TicTacToe => {
                hub.start(duel(user, kind, arg)?, TicTacToe::new(), idle).await
            },
            GameKind::Connect4 => {
                let game = Connect4::new(settings.connect4_scale);
                hub.start(duel(user, kind, arg)?, game, idle).await
            },
            GameKind::Hangman => {
                let game = hangman(arg, settings.hangman_theme)?;
                hub.start(Players::solo(user), game, idle).await
            },
            GameKind::Snake => {
                let game = Snake::new(&mut rand::rng());
                hub.start(Players::solo(user), game, idle).await
            },
            GameKind::Tetris => {
                let game = Tetris::new(&mut rand::rng());
                hub.start(Players::solo(user), game, idle).await
            },
            GameKind::Sokoban => {
                let boxes = match arg {
                    Some(arg) => box_count(arg)?,
                    None => settings.sokoban_boxes,
                };
                let game = Sokoban::random(boxes, &mut rand::rng()).map_err(|e| e.message())?;
                hub.start(Players::solo(user), game, idle).await
            },
            GameKind::Memory => {
                let game = Memory::new(&mut rand::rng());
                hub.start(Players::solo(user), game, idle).await
            },
        };

        started.map_err(|e| e.message())
    }

    async fn stats(&self, user: UserId) -> Result<PageId, Message> {
        let mut entries = self.cache().all_user_data().await.map_err(store_failed)?;
        entries.sort_by(|(a_id, a), (b_id, b)| {
            b.wins
                .cmp(&a.wins)
                .then(b.played.cmp(&a.played))
                .then(a_id.cmp(b_id))
        });

        let board = Leaderboard {
            entries,
            page_size: self.page_size,
        };

        self.hub
            .open_pages(user, board.total(), board, self.idle)
            .await
            .map_err(|e| e.message())
    }

    async fn settings(&self, change: Option<(String, String)>) -> Result<String, Message> {
        let (header, settings) = match change {
            None => ("app-settings", self.guild_settings().await?),
            Some((key, value)) => {
                let patch = GuildSettingsPatch::parse(&key, &value).map_err(|why| {
                    Message::new("app-setting-rejected").arg("reason", why)
                })?;

                let settings = self
                    .cache()
                    .update_guild_settings(self.guild, &patch)
                    .await
                    .map_err(store_failed)?;

                log::info!("Updated {key} for {}.", self.guild);
                ("app-setting-updated", settings)
            },
        };

        Ok(self.describe(header, &settings))
    }

    fn describe(&self, header: &'static str, settings: &GuildSettings) -> String {
        let mut text = l10n::format(&Message::new(header).arg("guild", self.guild));

        match settings.idle_timeout_secs {
            Some(secs) => _ = write!(text, "\n  idle_timeout_secs = {secs}"),
            None => {
                let secs = self.idle.as_secs();
                _ = write!(text, "\n  idle_timeout_secs = {secs} (default)");
            },
        }

        _ = write!(text, "\n  connect4_scale = {:?}", settings.connect4_scale);
        match settings.hangman_theme {
            Some(theme) => _ = write!(text, "\n  hangman_theme = {}", theme.name()),
            None => text.push_str("\n  hangman_theme = random"),
        }
        _ = write!(text, "\n  sokoban_boxes = {}", settings.sokoban_boxes);
        text
    }

    fn print(&self, text: &str) -> anyhow::Result<()> {
        self.hub
            .sink()
            .print(text)
            .context("cannot write console output")
    }

    fn print_lossy(&self, text: &str) {
        if let Err(why) = self.print(text) {
            log::warn!("{why:?}");
        }
    }

    fn say(&self, message: Message) {
        self.print_lossy(&l10n::format(&message));
    }

    async fn notice(&self, user: UserId, message: Message) {
        if let Err(why) = self.hub.sink().notice(user, message).await {
            log::warn!("Failed to notify {user}: {why:?}");
        }
    }
}

fn store_failed(why: anyhow::Error) -> Message {
    log::error!("Store request failed: {why:?}");
    Message::new("app-store-failed")
}

/// Duel games take the opponent's id as their argument.
fn duel(user: UserId, kind: GameKind, arg: Option<&str>) -> Result<Players, Message> {
    let opponent = arg
        .and_then(|a| command::parse_user(a).ok())
        .ok_or_else(|| Message::new("app-needs-opponent").arg("game", kind))?;

    Ok(Players::duel(user, opponent))
}

/// Sokoban takes a box count within [`sokoban::BOXES`].
fn box_count(arg: &str) -> Result<u8, Message> {
    arg.parse()
        .ok()
        .filter(|boxes| sokoban::BOXES.contains(boxes))
        .ok_or_else(|| {
            Message::new("app-bad-boxes")
                .arg("min", sokoban::BOXES.start())
                .arg("max", sokoban::BOXES.end())
        })
}

/// Hangman takes a theme name or a custom word.
fn hangman(arg: Option<&str>, theme: Option<Theme>) -> Result<Hangman, Message> {
    let mut rng = rand::rng();
    if let Some(arg) = arg {
        return match Theme::from_name(arg) {
            Some(theme) => Ok(Hangman::random(theme, &mut rng)),
            None => Hangman::with_word(arg).map_err(|e| e.message()),
        };
    }

    let theme = theme.unwrap_or_else(|| Theme::ALL[rng.random_range(0..Theme::ALL.len())]);
    Ok(Hangman::random(theme, &mut rng))
}

/// Pages through user statistics, formatting a page only when it's shown.
struct Leaderboard {
    entries: Vec<(UserId, UserData)>,
    page_size: NonZeroUsize,
}

impl Leaderboard {
    fn total(&self) -> NonZeroUsize {
        NonZeroUsize::new(self.entries.len().div_ceil(self.page_size.get()))
            .unwrap_or(NonZeroUsize::MIN)
    }
}

impl PageSource for Leaderboard {
    fn page(&self, index: usize) -> anyhow::Result<String> {
        if self.entries.is_empty() {
            return Ok(l10n::format(&Message::new("leaderboard-empty")));
        }

        let size = self.page_size.get();
        let start = index * size;
        let chunk = self
            .entries
            .get(start..)
            .filter(|rest| !rest.is_empty())
            .with_context(|| format!("leaderboard has no page {}", index + 1))?;

        let mut text = String::new();
        for (rank, (user, data)) in (start + 1..).zip(chunk.iter().take(size)) {
            if !text.is_empty() {
                text.push('\n');
            }

            let entry = Message::new("leaderboard-entry")
                .arg("rank", rank)
                .arg("player", user)
                .arg("wins", data.wins)
                .arg("losses", data.losses)
                .arg("ties", data.ties)
                .arg("played", data.played);
            text.push_str(&l10n::format(&entry));
        }

        Ok(text)
    }
}
