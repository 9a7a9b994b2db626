use std::str::FromStr;
use std::sync::atomic::AtomicBool;

use super::*;
use crate::error::{InvalidMove, WrongActor};
use crate::games::{Hangman, TicTacToe};
use crate::ids::Seat;
use crate::pagination::VecSource;
use crate::session::{EndReason, Mode, Status, Terminal};

const ALICE: UserId = UserId(1);
const BOB: UserId = UserId(2);
const EVE: UserId = UserId(3);

const IDLE: Duration = Duration::from_secs(60);

#[derive(Debug, Clone)]
enum Event {
    Render(Target, Frame),
    Notice(UserId, Message),
    Finished(Summary),
}

#[derive(Debug, Default)]
struct Recorder {
    events: Mutex<Vec<Event>>,
    fail_renders: AtomicBool,
}

impl Recorder {
    fn take(&self) -> Vec<Event> {
        std::mem::take(&mut *self.events.lock().expect("should not be poisoned"))
    }

    fn push(&self, event: Event) {
        self.events.lock().expect("should not be poisoned").push(event);
    }
}

impl RenderSink for Recorder {
    async fn render(&self, target: Target, frame: Frame) -> anyhow::Result<()> {
        anyhow::ensure!(!self.fail_renders.load(Ordering::Relaxed), "render is down");
        self.push(Event::Render(target, frame));
        Ok(())
    }

    async fn notice(&self, actor: UserId, message: Message) -> anyhow::Result<()> {
        self.push(Event::Notice(actor, message));
        Ok(())
    }

    async fn finished(&self, summary: Summary) {
        self.push(Event::Finished(summary));
    }
}

fn hub() -> Hub<Recorder> {
    Hub::with_settle_delay(Recorder::default(), Duration::from_millis(1500))
}

fn renders(events: &[Event]) -> Vec<&Frame> {
    events
        .iter()
        .filter_map(|e| match e {
            Event::Render(_, frame) => Some(frame),
            _ => None,
        })
        .collect()
}

fn summaries(events: &[Event]) -> Vec<&Summary> {
    events
        .iter()
        .filter_map(|e| match e {
            Event::Finished(summary) => Some(summary),
            _ => None,
        })
        .collect()
}

/// Lets spawned timer tasks run after the clock moved.
async fn settle_tasks() {
    for _ in 0..8 {
        tokio::task::yield_now().await;
    }
}

/// A solo game that flashes a marker after every move until settled.
#[derive(Debug, Default)]
struct Blink {
    flashing: bool,
    moves: u32,
}

struct Tap;

impl FromStr for Tap {
    type Err = InvalidMove;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "tap" {
            Ok(Self)
        } else {
            Err(InvalidMove::Unparsable)
        }
    }
}

impl Game for Blink {
    type Move = Tap;

    const KIND: GameKind = GameKind::Memory;
    const MODE: Mode = Mode::Solo;

    fn apply(&mut self, _seat: Seat, _mv: Tap) -> Result<(), InvalidMove> {
        self.flashing = true;
        self.moves += 1;
        Ok(())
    }

    fn check(&self) -> Terminal {
        Terminal::InProgress
    }

    fn render(&self) -> String {
        if self.flashing { "*" } else { "." }.to_owned()
    }

    fn wants_settle(&self) -> bool {
        self.flashing
    }

    fn settle(&mut self) {
        self.flashing = false;
    }
}

#[tokio::test(start_paused = true)]
async fn duel_plays_to_a_win() {
    let hub = hub();
    let id = hub
        .start(Players::duel(ALICE, BOB), TicTacToe::new(), IDLE)
        .await
        .expect("valid players");

    let events = hub.sink().take();
    assert_eq!(renders(&events).len(), 1, "initial frame");

    for (actor, cell) in [(ALICE, "1"), (BOB, "4"), (ALICE, "2"), (BOB, "5")] {
        let step = hub.submit(id, actor, cell).await;
        assert_eq!(step, Ok(Step::Continue));
    }

    let step = hub.submit(id, ALICE, "3").await.expect("winning move");
    assert!(matches!(step, Step::Finished(r) if r.winner == Some(ALICE)));

    let events = hub.sink().take();
    let frames = renders(&events);
    let last = frames.last().expect("final frame");
    assert!(last.closed, "final frame is closed");
    assert_eq!(last.header.key, "game-won");

    let done = summaries(&events);
    assert_eq!(done.len(), 1, "finished exactly once");
    assert_eq!(done[0].kind, GameKind::TicTacToe);
    assert_eq!(done[0].resolution.reason, EndReason::Board);

    assert_eq!(hub.session_count(), 0, "resolved sessions are dropped");
    assert_eq!(hub.active_session(ALICE, GameKind::TicTacToe), None);
    assert_eq!(hub.submit(id, BOB, "9").await, Err(MoveError::UnknownSession));
}

#[tokio::test(start_paused = true)]
async fn rejections_notify_only_the_actor() {
    let hub = hub();
    let id = hub
        .start(Players::duel(ALICE, BOB), TicTacToe::new(), IDLE)
        .await
        .expect("valid players");
    hub.sink().take();

    let err = hub.submit(id, BOB, "1").await.expect_err("not bob's turn");
    assert_eq!(err, MoveError::WrongActor(WrongActor::NotYourTurn { current: ALICE }));

    hub.submit(id, EVE, "1").await.expect_err("not playing");

    let events = hub.sink().take();
    assert!(renders(&events).is_empty(), "rejections don't re-render");

    let notices = events
        .iter()
        .filter_map(|e| match e {
            Event::Notice(actor, message) => Some((*actor, message.key)),
            _ => None,
        })
        .collect::<Vec<_>>();

    assert_eq!(notices, [
        (BOB, "error-not-your-turn"),
        (EVE, "error-not-participant"),
    ]);
}

#[tokio::test(start_paused = true)]
async fn idle_timeout_finalizes_once() {
    let hub = hub();
    let id = hub
        .start(Players::solo(ALICE), Hangman::with_word("cat").expect("valid"), IDLE)
        .await
        .expect("valid players");
    hub.sink().take();

    tokio::time::sleep(IDLE + Duration::from_secs(1)).await;
    settle_tasks().await;

    let events = hub.sink().take();
    let frames = renders(&events);
    assert_eq!(frames.len(), 1, "one final frame");
    assert_eq!(frames[0].header.key, "game-timed-out");
    assert!(frames[0].closed);

    let done = summaries(&events);
    assert_eq!(done.len(), 1);
    assert_eq!(done[0].resolution.status, Status::TimedOut);

    // the timer can't fire twice and late input finds nothing
    tokio::time::sleep(IDLE * 2).await;
    settle_tasks().await;
    assert_eq!(hub.submit(id, ALICE, "c").await, Err(MoveError::UnknownSession));
    assert!(summaries(&hub.sink().take()).is_empty());
}

#[tokio::test(start_paused = true)]
async fn accepted_input_resets_the_idle_timer() {
    let hub = hub();
    let id = hub
        .start(Players::solo(ALICE), Hangman::with_word("dog").expect("valid"), IDLE)
        .await
        .expect("valid players");

    tokio::time::sleep(Duration::from_secs(45)).await;
    hub.submit(id, ALICE, "d").await.expect("fresh letter");

    tokio::time::sleep(Duration::from_secs(45)).await;
    settle_tasks().await;
    assert_eq!(hub.session_count(), 1, "90s since start, but 45s since the last move");

    tokio::time::sleep(Duration::from_secs(20)).await;
    settle_tasks().await;
    assert_eq!(hub.session_count(), 0, "timed out now");
}

#[tokio::test(start_paused = true)]
async fn rejected_input_does_not_reset_the_timer() {
    let hub = hub();
    let id = hub
        .start(Players::solo(ALICE), Hangman::with_word("dog").expect("valid"), IDLE)
        .await
        .expect("valid players");

    tokio::time::sleep(Duration::from_secs(45)).await;
    hub.submit(id, ALICE, "42").await.expect_err("not a letter");

    tokio::time::sleep(Duration::from_secs(20)).await;
    settle_tasks().await;
    assert_eq!(hub.session_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn new_game_supersedes_the_old_one() {
    let hub = hub();
    let game = || Hangman::with_word("owl").expect("valid");
    let old = hub
        .start(Players::solo(ALICE), game(), IDLE)
        .await
        .expect("valid players");
    hub.sink().take();

    let new = hub
        .start(Players::solo(ALICE), game(), IDLE)
        .await
        .expect("valid players");
    assert_ne!(old, new);

    let events = hub.sink().take();
    let done = summaries(&events);
    assert_eq!(done.len(), 1);
    assert_eq!(done[0].session, old);
    assert_eq!(done[0].resolution.status, Status::Cancelled);
    assert_eq!(done[0].resolution.reason, EndReason::Superseded);

    assert_eq!(hub.active_session(ALICE, GameKind::Hangman), Some(new));
    assert_eq!(hub.submit(old, ALICE, "o").await, Err(MoveError::UnknownSession));
    assert_eq!(hub.submit(new, ALICE, "o").await, Ok(Step::Continue));

    // another player's game of the same kind is unaffected
    hub.start(Players::solo(BOB), game(), IDLE)
        .await
        .expect("valid players");
    assert_eq!(hub.session_count(), 2);
}

#[tokio::test(start_paused = true)]
async fn transient_state_settles_after_the_delay() {
    let hub = hub();
    let id = hub
        .start(Players::solo(ALICE), Blink::default(), IDLE)
        .await
        .expect("valid players");

    hub.submit(id, ALICE, "tap").await.expect("tap");
    let events = hub.sink().take();
    assert_eq!(renders(&events).last().map(|f| f.body.as_str()), Some("*"));

    tokio::time::sleep(Duration::from_millis(1600)).await;
    settle_tasks().await;

    let events = hub.sink().take();
    let frames = renders(&events);
    assert_eq!(frames.len(), 1, "settled frame pushed");
    assert_eq!(frames[0].body, ".");
}

#[tokio::test(start_paused = true)]
async fn newer_input_cancels_a_pending_settle() {
    let hub = hub();
    let id = hub
        .start(Players::solo(ALICE), Blink::default(), IDLE)
        .await
        .expect("valid players");

    hub.submit(id, ALICE, "tap").await.expect("tap");
    tokio::time::sleep(Duration::from_millis(1000)).await;
    hub.submit(id, ALICE, "tap").await.expect("tap");
    hub.sink().take();

    // the first settle is due now but must not clear the second flash
    tokio::time::sleep(Duration::from_millis(600)).await;
    settle_tasks().await;
    assert!(renders(&hub.sink().take()).is_empty());

    tokio::time::sleep(Duration::from_millis(1000)).await;
    settle_tasks().await;
    let events = hub.sink().take();
    assert_eq!(renders(&events).last().map(|f| f.body.as_str()), Some("."));
}

#[tokio::test(start_paused = true)]
async fn render_failures_do_not_affect_state() {
    let hub = hub();
    hub.sink().fail_renders.store(true, Ordering::Relaxed);

    let id = hub
        .start(Players::duel(ALICE, BOB), TicTacToe::new(), IDLE)
        .await
        .expect("sessions start without a working renderer");

    assert_eq!(hub.submit(id, ALICE, "5").await, Ok(Step::Continue));
    assert_eq!(
        hub.submit(id, ALICE, "1").await,
        Err(MoveError::WrongActor(WrongActor::NotYourTurn { current: BOB })),
        "the accepted move still advanced the turn"
    );
}

#[tokio::test(start_paused = true)]
async fn page_browser_lifecycle() {
    let hub = hub();
    let total = NonZeroUsize::new(3).expect("non-zero");
    let source = VecSource(vec!["a".to_owned(), "b".to_owned(), "c".to_owned()]);
    let id = hub
        .open_pages(ALICE, total, source, IDLE)
        .await
        .expect("first page loads");

    let view = hub.navigate(id, ALICE, "last").await.expect("owner");
    assert_eq!(view.content, "c");

    let err = hub.navigate(id, BOB, "first").await.expect_err("not owner");
    assert!(matches!(err, NavError::NotOwner));

    let err = hub.navigate(id, ALICE, "9").await.expect_err("out of range");
    assert!(matches!(err, NavError::InvalidPage { requested: 9, total: 3 }));

    let err = hub.navigate(id, ALICE, "sideways").await.expect_err("unparsable");
    assert!(matches!(err, NavError::InvalidPage { .. }));

    hub.sink().take();
    tokio::time::sleep(IDLE + Duration::from_secs(1)).await;
    settle_tasks().await;

    let events = hub.sink().take();
    let frames = renders(&events);
    assert_eq!(frames.len(), 1, "frozen frame");
    assert!(frames[0].closed);
    assert_eq!(frames[0].body, "c", "frozen on the last viewed page");
    assert_eq!(frames[0].nav, Some(crate::pagination::NavState::DISABLED));

    let err = hub.navigate(id, ALICE, "first").await.expect_err("gone");
    assert!(matches!(err, NavError::UnknownHandle));
}
