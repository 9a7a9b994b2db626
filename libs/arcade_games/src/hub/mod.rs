//! Owns the live sessions and page browsers.
//!
//! Every state change happens under the entry's lock without awaiting in
//! between. Frames are pushed after the lock is released. Whoever removes an
//! entry from its map is the one that delivers its final frame, so a session
//! is finalized exactly once no matter whether input or the idle timer got
//! there first.

use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use dashmap::DashMap;
use tokio::time::Instant;

use crate::error::{MoveError, NavError, SetupError};
use crate::games::GameKind;
use crate::ids::{PageId, SessionId, UserId};
use crate::pagination::{Direction, PageSource, PageView, Pagination};
use crate::render::{Frame, Message, RenderSink, Summary, Target};
use crate::session::{Game, Players, Resolution, Session, Step};

#[cfg(test)]
mod tests;

/// How long transient board state stays visible by default.
pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_millis(1500);

/// Object-safe view of a [`Session`] so sessions of all games share one map.
trait AnySession: Send {
    fn kind(&self) -> GameKind;
    fn players(&self) -> Players;
    fn submit(&mut self, actor: UserId, raw: &str, now: Instant) -> Result<Step, MoveError>;
    fn expire(&mut self, now: Instant) -> Option<Resolution>;
    fn supersede(&mut self) -> Option<Resolution>;
    fn resolution(&self) -> Option<Resolution>;
    fn deadline(&self) -> Option<Instant>;
    fn last_activity_at(&self) -> Instant;
    fn wants_settle(&self) -> bool;
    fn settle(&mut self) -> bool;
    fn frame(&self) -> Frame;
    fn score(&self) -> Option<u32>;
}

impl<G: Game> AnySession for Session<G> {
    fn kind(&self) -> GameKind {
        G::KIND
    }

    fn players(&self) -> Players {
        *Self::players(self)
    }

    fn submit(&mut self, actor: UserId, raw: &str, now: Instant) -> Result<Step, MoveError> {
        Self::submit(self, actor, raw, now)
    }

    fn expire(&mut self, now: Instant) -> Option<Resolution> {
        Self::expire(self, now)
    }

    fn supersede(&mut self) -> Option<Resolution> {
        Self::supersede(self)
    }

    fn resolution(&self) -> Option<Resolution> {
        Self::resolution(self)
    }

    fn deadline(&self) -> Option<Instant> {
        Self::deadline(self)
    }

    fn last_activity_at(&self) -> Instant {
        Self::last_activity_at(self)
    }

    fn wants_settle(&self) -> bool {
        Self::wants_settle(self)
    }

    fn settle(&mut self) -> bool {
        Self::settle(self)
    }

    fn frame(&self) -> Frame {
        Self::frame(self)
    }

    fn score(&self) -> Option<u32> {
        Self::score(self)
    }
}

type SessionEntry = Arc<Mutex<Box<dyn AnySession>>>;
type PagesEntry = Arc<Mutex<Pagination>>;

/// Routes input to sessions and page browsers and runs their idle timers.
///
/// Cloning is cheap and clones share all state.
pub struct Hub<S> {
    inner: Arc<HubInner<S>>,
}

struct HubInner<S> {
    sink: S,
    sessions: DashMap<SessionId, SessionEntry>,
    /// The live session per starting user and game.
    active: DashMap<(UserId, GameKind), SessionId>,
    pages: DashMap<PageId, PagesEntry>,
    next_id: AtomicU64,
    settle_delay: Duration,
}

impl<S> Clone for Hub<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S: RenderSink> Hub<S> {
    pub fn new(sink: S) -> Self {
        Self::with_settle_delay(sink, DEFAULT_SETTLE_DELAY)
    }

    pub fn with_settle_delay(sink: S, settle_delay: Duration) -> Self {
        Self {
            inner: Arc::new(HubInner {
                sink,
                sessions: DashMap::new(),
                active: DashMap::new(),
                pages: DashMap::new(),
                next_id: AtomicU64::new(1),
                settle_delay,
            }),
        }
    }

    /// The sink frames are delivered to.
    #[must_use]
    pub fn sink(&self) -> &S {
        &self.inner.sink
    }

    /// The number of live sessions.
    #[must_use]
    pub fn session_count(&self) -> usize {
        self.inner.sessions.len()
    }

    /// The live session the user started for a game, if any.
    #[must_use]
    pub fn active_session(&self, user: UserId, kind: GameKind) -> Option<SessionId> {
        self.inner.active.get(&(user, kind)).map(|e| *e.value())
    }

    fn next_id(&self) -> u64 {
        self.inner.next_id.fetch_add(1, Ordering::Relaxed)
    }

    /// Starts a new session.
    ///
    /// If the first player already has a live session of the same game, that
    /// one is cancelled first. The initial frame is pushed before returning.
    ///
    /// # Errors
    ///
    /// Returns `Err` if the players don't fit the game.
    pub async fn start<G: Game>(
        &self,
        players: Players,
        game: G,
        idle: Duration,
    ) -> Result<SessionId, SetupError> {
        let session = Session::new(players, game, idle, Instant::now())?;
        let starter = players.starter();
        let id = SessionId(self.next_id());

        if let Some((_, old)) = self.inner.active.remove(&(starter, G::KIND)) {
            self.supersede(old).await;
        }

        let frame = session.frame();
        let session: Box<dyn AnySession> = Box::new(session);
        let entry = Arc::new(Mutex::new(session));
        self.inner.sessions.insert(id, Arc::clone(&entry));
        self.inner.active.insert((starter, G::KIND), id);

        log::info!("Started {} session {id} for {starter}.", G::KIND);

        self.render(Target::Session(id), frame).await;
        self.watch_session(id, entry);
        Ok(id)
    }

    async fn supersede(&self, id: SessionId) {
        let Some((_, entry)) = self.inner.sessions.remove(&id) else {
            return;
        };

        let finished = {
            let mut session = entry.lock().expect("should not be poisoned");
            session
                .supersede()
                .map(|resolution| (session.frame(), summary(id, &**session, resolution)))
        };

        if let Some((frame, summary)) = finished {
            log::info!("Session {id} was superseded.");
            self.render(Target::Session(id), frame).await;
            self.inner.sink.finished(summary).await;
        }
    }

    /// Feeds one raw input into a session.
    ///
    /// Rejections are reported to the actor as a notice. Accepted moves push
    /// a new frame. A move that ends the session pushes the final frame and
    /// reports the summary.
    ///
    /// # Errors
    ///
    /// Returns `Err` if the input was rejected.
    pub async fn submit(
        &self,
        id: SessionId,
        actor: UserId,
        raw: &str,
    ) -> Result<Step, MoveError> {
        let entry = self.inner.sessions.get(&id).map(|e| Arc::clone(e.value()));
        let Some(entry) = entry else {
            let err = MoveError::UnknownSession;
            self.notice(actor, err.message()).await;
            return Err(err);
        };

        let (result, frame, settle_from) = {
            let mut session = entry.lock().expect("should not be poisoned");
            let result = session.submit(actor, raw, Instant::now());
            let settle_from = session
                .wants_settle()
                .then(|| session.last_activity_at());
            (result, session.frame(), settle_from)
        };

        match result {
            Ok(Step::Continue) => {
                self.render(Target::Session(id), frame).await;
                if let Some(activity) = settle_from {
                    self.schedule_settle(id, Arc::clone(&entry), activity);
                }
            },
            Ok(Step::Finished(_)) => self.finish(id, &entry).await,
            Err(err) => {
                self.notice(actor, err.message()).await;
                if err == MoveError::Ended {
                    // the input may have tripped an overdue timer
                    self.finish(id, &entry).await;
                }
            },
        }

        result
    }

    /// Delivers the final frame and summary, if nobody else did yet.
    async fn finish(&self, id: SessionId, entry: &Mutex<Box<dyn AnySession>>) {
        if self.inner.sessions.remove(&id).is_none() {
            return;
        }

        let finished = {
            let session = entry.lock().expect("should not be poisoned");
            let key = (session.players().starter(), session.kind());
            self.inner.active.remove_if(&key, |_, v| *v == id);

            session
                .resolution()
                .map(|resolution| (session.frame(), summary(id, &**session, resolution)))
        };

        let Some((frame, summary)) = finished else {
            log::warn!("Session {id} was removed while still in progress.");
            return;
        };

        log::info!(
            "Session {id} ({}) ended: {:?} via {:?}.",
            summary.kind,
            summary.resolution.status,
            summary.resolution.reason
        );

        self.render(Target::Session(id), frame).await;
        self.inner.sink.finished(summary).await;
    }

    /// Sleeps until the session's idle deadline, re-reading it after every
    /// wake-up since accepted input pushes it back.
    fn watch_session(&self, id: SessionId, entry: SessionEntry) {
        let hub = self.clone();
        tokio::spawn(async move {
            loop {
                let deadline = entry.lock().expect("should not be poisoned").deadline();
                let Some(deadline) = deadline else {
                    // resolved some other way
                    return;
                };

                tokio::time::sleep_until(deadline).await;

                let expired = entry
                    .lock()
                    .expect("should not be poisoned")
                    .expire(Instant::now());

                if expired.is_some() {
                    log::debug!("Session {id} timed out.");
                    hub.finish(id, &entry).await;
                    return;
                }
            }
        });
    }

    /// Clears transient board state after the settle delay unless the
    /// session saw new input in the meantime.
    fn schedule_settle(&self, id: SessionId, entry: SessionEntry, activity: Instant) {
        let hub = self.clone();
        tokio::spawn(async move {
            tokio::time::sleep(hub.inner.settle_delay).await;

            let frame = {
                let mut session = entry.lock().expect("should not be poisoned");
                (session.last_activity_at() == activity && session.settle())
                    .then(|| session.frame())
            };

            if let Some(frame) = frame {
                hub.render(Target::Session(id), frame).await;
            }
        });
    }

    /// Opens a page browser owned by `owner` and pushes the first page.
    ///
    /// # Errors
    ///
    /// Returns `Err` if the first page could not be loaded.
    pub async fn open_pages(
        &self,
        owner: UserId,
        total: NonZeroUsize,
        source: impl PageSource,
        idle: Duration,
    ) -> Result<PageId, NavError> {
        let pages = Pagination::open(owner, total, Box::new(source), idle, Instant::now())?;
        let id = PageId(self.next_id());
        let frame = pages.frame();

        let entry = Arc::new(Mutex::new(pages));
        self.inner.pages.insert(id, Arc::clone(&entry));

        self.render(Target::Pages(id), frame).await;
        self.watch_pages(id, entry);
        Ok(id)
    }

    /// Navigates a page browser with raw input, such as `next` or `3`.
    ///
    /// # Errors
    ///
    /// Returns `Err` if navigation was rejected. The actor gets a notice.
    pub async fn navigate(
        &self,
        id: PageId,
        actor: UserId,
        raw: &str,
    ) -> Result<PageView, NavError> {
        let entry = self.inner.pages.get(&id).map(|e| Arc::clone(e.value()));
        let Some(entry) = entry else {
            let err = NavError::UnknownHandle;
            self.notice(actor, err.message()).await;
            return Err(err);
        };

        let (result, frame) = {
            let mut pages = entry.lock().expect("should not be poisoned");
            let result = match raw.parse::<Direction>() {
                Ok(direction) => pages.navigate(actor, direction, Instant::now()),
                Err(_) => Err(NavError::InvalidPage {
                    requested: 0,
                    total: pages.total().get(),
                }),
            };
            (result, pages.frame())
        };

        match &result {
            Ok(_) => self.render(Target::Pages(id), frame).await,
            Err(err) => {
                self.notice(actor, err.message()).await;
                if matches!(err, NavError::Closed) {
                    self.freeze_pages(id, frame).await;
                }
            },
        }

        result
    }

    async fn freeze_pages(&self, id: PageId, frame: Frame) {
        if self.inner.pages.remove(&id).is_some() {
            log::debug!("Page browser {id} froze.");
            self.render(Target::Pages(id), frame).await;
        }
    }

    fn watch_pages(&self, id: PageId, entry: PagesEntry) {
        let hub = self.clone();
        tokio::spawn(async move {
            loop {
                let deadline = entry.lock().expect("should not be poisoned").deadline();
                let Some(deadline) = deadline else {
                    return;
                };

                tokio::time::sleep_until(deadline).await;

                let frame = {
                    let mut pages = entry.lock().expect("should not be poisoned");
                    pages.expire(Instant::now()).then(|| pages.frame())
                };

                if let Some(frame) = frame {
                    hub.freeze_pages(id, frame).await;
                    return;
                }
            }
        });
    }

    async fn render(&self, target: Target, frame: Frame) {
        if let Err(why) = self.inner.sink.render(target, frame).await {
            log::warn!("Failed to render {target}: {why:?}");
        }
    }

    async fn notice(&self, actor: UserId, message: Message) {
        if let Err(why) = self.inner.sink.notice(actor, message).await {
            log::warn!("Failed to notify {actor}: {why:?}");
        }
    }
}

fn summary(id: SessionId, session: &dyn AnySession, resolution: Resolution) -> Summary {
    Summary {
        session: id,
        kind: session.kind(),
        players: session.players(),
        resolution,
        score: session.score(),
    }
}
