use std::fmt::Write as _;
use std::io;
use std::sync::Mutex;

use anyhow::Context as _;
use arcade_games::{Frame, Message, NavState, RenderSink, Summary, Target, UserId};
use time::OffsetDateTime;

use crate::data::{Cache, Outcome, Store, UserDataPatch};
use crate::fmt::l10n;
use crate::fmt::term::{self, style};

/// Prints frames and notices as text and records finished games.
pub struct ConsoleSink<S> {
    out: Mutex<Box<dyn io::Write + Send>>,
    color: bool,
    cache: Cache<S>,
}

impl<S: Store> ConsoleSink<S> {
    /// Writes to `stdout`, colored if the terminal supports it.
    pub fn stdout(cache: Cache<S>) -> Self {
        let color = term::supports_ansi_escapes(&io::stdout());
        Self::new(Box::new(io::stdout()), color, cache)
    }

    pub fn new(out: Box<dyn io::Write + Send>, color: bool, cache: Cache<S>) -> Self {
        Self {
            out: Mutex::new(out),
            color,
            cache,
        }
    }

    pub const fn cache(&self) -> &Cache<S> {
        &self.cache
    }

    /// Writes one block of text followed by a line break.
    ///
    /// # Errors
    ///
    /// Returns `Err` if the output cannot be written.
    pub fn print(&self, text: &str) -> io::Result<()> {
        let mut out = self.out.lock().expect("should not be poisoned");
        writeln!(out, "{text}")?;
        out.flush()
    }

    fn styled(&self, escape: &str, text: &str) -> String {
        if self.color {
            format!("{escape}{text}{}", style::RESET)
        } else {
            text.to_owned()
        }
    }

    fn frame_text(&self, target: Target, frame: &Frame) -> String {
        let mut text = format!("── {target} ──\n");
        let header = l10n::format_with_score(&frame.header);
        let escape = if frame.closed { style::YELLOW } else { style::BOLD };
        _ = writeln!(text, "{}", self.styled(escape, &header));
        text.push_str(&frame.body);

        if let Some(nav) = frame.nav {
            let buttons = nav_buttons(nav);
            if !buttons.is_empty() {
                _ = write!(text, "\n{}", self.styled(style::CYAN, &buttons));
            }
        }

        if frame.closed {
            let closed = l10n::format(&Message::new("frame-closed"));
            _ = write!(text, "\n{}", self.styled(style::DIM, &closed));
        }

        text
    }

    async fn record(&self, summary: &Summary) {
        let now = OffsetDateTime::now_utc();
        for user in summary.players.iter() {
            let outcome = Outcome::of(user, &summary.resolution);
            let patch = UserDataPatch::default()
                .record(summary.kind, outcome, summary.score, now)
                .or_else(|_| UserDataPatch::default().record(summary.kind, outcome, None, now));

            let patch = match patch {
                Ok(patch) => patch,
                Err(why) => {
                    log::warn!("Skipping {} result for {user}: {why}", summary.kind);
                    continue;
                },
            };

            if let Err(why) = self.cache.update_user_data(user, &patch).await {
                log::error!("Failed to record {} result for {user}: {why:?}", summary.kind);
            }
        }
    }
}

fn nav_buttons(nav: NavState) -> String {
    [
        (nav.first, "[⏮️ first]"),
        (nav.prev, "[◀️ prev]"),
        (nav.next, "[▶️ next]"),
        (nav.last, "[⏭️ last]"),
    ]
    .into_iter()
    .filter_map(|(enabled, label)| enabled.then_some(label))
    .collect::<Vec<_>>()
    .join(" ")
}

impl<S: Store> RenderSink for ConsoleSink<S> {
    async fn render(&self, target: Target, frame: Frame) -> anyhow::Result<()> {
        let text = self.frame_text(target, &frame);
        self.print(&text)
            .with_context(|| format!("cannot print frame for {target}"))
    }

    async fn notice(&self, actor: UserId, message: Message) -> anyhow::Result<()> {
        let text = format!("[to {actor}] {}", l10n::format(&message));
        let text = self.styled(style::RED, &text);
        self.print(&text)
            .with_context(|| format!("cannot print notice for {actor}"))
    }

    async fn finished(&self, summary: Summary) {
        self.record(&summary).await;

        let text = l10n::format(&Message::new("app-finished").arg("session", summary.session));
        if let Err(why) = self.print(&text) {
            log::warn!("Failed to print summary: {why:?}");
        }
    }
}
