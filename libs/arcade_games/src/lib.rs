//! Turn-based minigame sessions and paged list browsing, independent of any
//! particular chat platform.
//!
//! A [`Session`] owns one play-through of a [`Game`]. The [`Hub`] keeps the
//! live sessions and page browsers, arbitrates inbound input, runs the idle
//! timers and pushes [`Frame`]s to a [`RenderSink`].
//!
//! The platform only ever sees [`Message`] keys and rendered board strings. Any
//! user-facing text is resolved by the host.

pub mod error;
pub mod games;
mod grid;
pub mod hub;
mod ids;
pub mod pagination;
pub mod render;
pub mod session;

pub use error::{InvalidMove, MoveError, NavError, SetupError, WrongActor};
pub use games::GameKind;
pub use grid::{Dir, Pos};
pub use hub::Hub;
pub use ids::{PageId, Seat, SessionId, UserId};
pub use pagination::{Direction, NavState, PageSource, PageView, Pagination, VecSource};
pub use render::{Frame, Message, RenderSink, Summary, Target};
pub use session::{EndReason, Game, Mode, Players, Resolution, Session, Status, Step, Terminal};
