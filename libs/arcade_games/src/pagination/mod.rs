//! Owner-bound multi-page browsing.
//!
//! Navigation clamps to the valid range instead of failing, except for an
//! explicit page number, which must be within `1..=total`. After the idle
//! window elapses the browser freezes on the last page viewed.

use std::num::NonZeroUsize;
use std::str::FromStr;
use std::time::Duration;

use tokio::time::Instant;

use crate::error::{InvalidMove, NavError};
use crate::ids::UserId;
use crate::render::{Frame, Message};


/// Lazily produces page content.
pub trait PageSource: Send + Sync + 'static {
    /// Loads the page at the 0-based `index`.
    ///
    /// # Errors
    ///
    /// Returns `Err` if the content could not be produced.
    fn page(&self, index: usize) -> anyhow::Result<String>;
}

/// Precomputed pages.
#[derive(Debug, Clone, Default)]
pub struct VecSource(pub Vec<String>);

impl PageSource for VecSource {
    fn page(&self, index: usize) -> anyhow::Result<String> {
        self.0
            .get(index)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("page {index} is missing"))
    }
}

/// A navigation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    First,
    Prev,
    Next,
    Last,
    /// A 1-based page number.
    Custom(usize),
}

impl FromStr for Direction {
    type Err = InvalidMove;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "first" | "⏮️" => Ok(Self::First),
            "prev" | "previous" | "◀️" => Ok(Self::Prev),
            "next" | "▶️" => Ok(Self::Next),
            "last" | "⏭️" => Ok(Self::Last),
            other => other
                .parse()
                .map(Self::Custom)
                .map_err(|_| InvalidMove::Unparsable),
        }
    }
}

/// Which navigation affordances are enabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NavState {
    pub first: bool,
    pub prev: bool,
    pub next: bool,
    pub last: bool,
}

impl NavState {
    /// Everything disabled, for frozen browsers.
    pub const DISABLED: Self = Self {
        first: false,
        prev: false,
        next: false,
        last: false,
    };

    #[must_use]
    pub const fn at(index: usize, total: NonZeroUsize) -> Self {
        let back = index > 0;
        let forward = index + 1 < total.get();
        Self {
            first: back,
            prev: back,
            next: forward,
            last: forward,
        }
    }
}

/// The page currently shown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageView {
    pub index: usize,
    pub total: NonZeroUsize,
    pub content: String,
    pub nav: NavState,
}

/// One open page browser.
pub struct Pagination {
    owner: UserId,
    total: NonZeroUsize,
    current: usize,
    content: String,
    source: Box<dyn PageSource>,
    last_activity_at: Instant,
    idle: Duration,
    frozen: bool,
}

impl std::fmt::Debug for Pagination {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pagination")
            .field("owner", &self.owner)
            .field("total", &self.total)
            .field("current", &self.current)
            .field("frozen", &self.frozen)
            .finish_non_exhaustive()
    }
}

impl Pagination {
    /// Opens a browser on the first page.
    ///
    /// # Errors
    ///
    /// Returns `Err` if the first page could not be loaded.
    pub fn open(
        owner: UserId,
        total: NonZeroUsize,
        source: Box<dyn PageSource>,
        idle: Duration,
        now: Instant,
    ) -> Result<Self, NavError> {
        let content = source.page(0).map_err(NavError::Fetch)?;
        Ok(Self {
            owner,
            total,
            current: 0,
            content,
            source,
            last_activity_at: now,
            idle,
            frozen: false,
        })
    }

    /// Moves to another page.
    ///
    /// # Errors
    ///
    /// Returns `Err` if the actor isn't the owner, the browser is frozen, an
    /// explicit page is out of range or the page failed to load. The current
    /// page is unchanged in every case.
    pub fn navigate(
        &mut self,
        actor: UserId,
        direction: Direction,
        now: Instant,
    ) -> Result<PageView, NavError> {
        if self.expire(now) || self.frozen {
            return Err(NavError::Closed);
        }

        if actor != self.owner {
            return Err(NavError::NotOwner);
        }

        let last = self.total.get() - 1;
        let target = match direction {
            Direction::First => 0,
            Direction::Prev => self.current.saturating_sub(1),
            Direction::Next => self.current.saturating_add(1).min(last),
            Direction::Last => last,
            Direction::Custom(n) => match n.checked_sub(1) {
                Some(index) if index <= last => index,
                _ => {
                    return Err(NavError::InvalidPage {
                        requested: n,
                        total: self.total.get(),
                    });
                },
            },
        };

        if target != self.current {
            self.content = self.source.page(target).map_err(NavError::Fetch)?;
            self.current = target;
        }

        self.last_activity_at = now;
        Ok(self.view())
    }

    /// Freezes the browser if the idle window has elapsed.
    ///
    /// Returns `true` only on the call that froze it.
    pub fn expire(&mut self, now: Instant) -> bool {
        let Some(deadline) = self.deadline() else {
            return false;
        };

        self.frozen = now >= deadline;
        self.frozen
    }

    /// When the browser freezes, unless it already is.
    #[must_use]
    pub fn deadline(&self) -> Option<Instant> {
        (!self.frozen).then(|| self.last_activity_at + self.idle)
    }

    #[must_use]
    pub const fn owner(&self) -> UserId {
        self.owner
    }

    #[must_use]
    pub const fn total(&self) -> NonZeroUsize {
        self.total
    }

    #[must_use]
    pub const fn current(&self) -> usize {
        self.current
    }

    #[must_use]
    pub const fn is_frozen(&self) -> bool {
        self.frozen
    }

    #[must_use]
    pub fn view(&self) -> PageView {
        PageView {
            index: self.current,
            total: self.total,
            content: self.content.clone(),
            nav: self.nav(),
        }
    }

    fn nav(&self) -> NavState {
        if self.frozen {
            NavState::DISABLED
        } else {
            NavState::at(self.current, self.total)
        }
    }

    pub fn frame(&self) -> Frame {
        Frame {
            header: Message::new("page-counter")
                .arg("page", self.current + 1)
                .arg("total", self.total),
            body: self.content.clone(),
            closed: self.frozen,
            nav: Some(self.nav()),
        }
    }
}
