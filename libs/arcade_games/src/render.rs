//! The outward projection of sessions and page browsers.

use std::fmt;

use smallvec::SmallVec;

use crate::games::GameKind;
use crate::ids::{PageId, SessionId, UserId};
use crate::pagination::NavState;
use crate::session::{Players, Resolution};

/// A localizable text: a stable key plus interpolation arguments.
///
/// The core never produces user-facing literals. The host maps these to text.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use]
pub struct Message {
    pub key: &'static str,
    pub args: SmallVec<[(&'static str, String); 2]>,
}

impl Message {
    pub fn new(key: &'static str) -> Self {
        Self {
            key,
            args: SmallVec::new(),
        }
    }

    /// Adds an interpolation argument.
    pub fn arg(mut self, name: &'static str, value: impl fmt::Display) -> Self {
        self.args.push((name, value.to_string()));
        self
    }

    /// Gets the value of an argument by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.args
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, v)| v.as_str())
    }
}

/// Where a frame is shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Target {
    Session(SessionId),
    Pages(PageId),
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Session(id) => id.fmt(f),
            Self::Pages(id) => id.fmt(f),
        }
    }
}

/// One rendered state of a session or page browser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Turn info, page counter or the outcome label.
    pub header: Message,
    /// The board or page content.
    pub body: String,
    /// Whether this is the final frame. No further input is accepted.
    pub closed: bool,
    /// Navigation affordances, for page browsers.
    pub nav: Option<NavState>,
}

/// Final report about a resolved session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Summary {
    pub session: SessionId,
    pub kind: GameKind,
    pub players: Players,
    pub resolution: Resolution,
    pub score: Option<u32>,
}

/// The platform side that displays frames and notices.
///
/// Delivery failures are logged by the caller and otherwise ignored. The
/// in-memory state stays authoritative.
pub trait RenderSink: Send + Sync + 'static {
    /// Shows or replaces the frame for a target.
    fn render(
        &self,
        target: Target,
        frame: Frame,
    ) -> impl Future<Output = anyhow::Result<()>> + Send;

    /// Shows a notice only to the given actor.
    fn notice(
        &self,
        actor: UserId,
        message: Message,
    ) -> impl Future<Output = anyhow::Result<()>> + Send;

    /// Called once per session after it resolved and its final frame was sent.
    fn finished(&self, summary: Summary) -> impl Future<Output = ()> + Send {
        _ = summary;
        async {}
    }
}
