use std::collections::BTreeMap;
use std::fmt;
use std::ops::RangeInclusive;

use arcade_games::games::connect4::Scale;
use arcade_games::games::hangman::Theme;
use arcade_games::games::sokoban;
use arcade_games::{GameKind, Resolution, Status, UserId};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// Identifies a guild, the scope for [`GuildSettings`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GuildId(pub u64);

impl fmt::Display for GuildId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "guild {}", self.0)
    }
}

/// Accepted range for [`GuildSettings::idle_timeout_secs`].
pub const IDLE_TIMEOUT_SECS: RangeInclusive<u64> = 10..=600;

/// Per-guild game options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GuildSettings {
    /// Overrides the configured idle window.
    pub idle_timeout_secs: Option<u64>,
    pub connect4_scale: Scale,
    /// The hangman word list. A random theme is picked per game when unset.
    pub hangman_theme: Option<Theme>,
    pub sokoban_boxes: u8,
}

impl Default for GuildSettings {
    fn default() -> Self {
        Self {
            idle_timeout_secs: None,
            connect4_scale: Scale::default(),
            hangman_theme: None,
            sokoban_boxes: sokoban::DEFAULT_BOXES,
        }
    }
}

/// How a session ended for one participant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Win,
    Loss,
    Tie,
    /// Timed out, stopped or superseded without a winner.
    Abandoned,
}

impl Outcome {
    /// Determines the outcome for `user` from a session's resolution.
    pub fn of(user: UserId, resolution: &Resolution) -> Self {
        match (resolution.status, resolution.winner) {
            (Status::Tied, _) => Self::Tie,
            (_, Some(winner)) if winner == user => Self::Win,
            (Status::Won | Status::Lost, _) => Self::Loss,
            (Status::InProgress | Status::TimedOut | Status::Cancelled, _) => Self::Abandoned,
        }
    }
}

/// Per-user statistics.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserData {
    pub played: u32,
    pub wins: u32,
    pub losses: u32,
    pub ties: u32,
    /// The best score per game, for games that keep one.
    pub best: BTreeMap<GameKind, u32>,
    #[serde(with = "time::serde::rfc3339::option")]
    pub last_played: Option<OffsetDateTime>,
}

/// Whether lower scores are better for this game.
///
/// Memory counts attempts. Everything else counts points.
const fn lower_is_better(kind: GameKind) -> bool {
    matches!(kind, GameKind::Memory)
}

impl UserData {
    fn record(&mut self, record: &Record) {
        self.played = self.played.saturating_add(1);
        match record.outcome {
            Outcome::Win => self.wins = self.wins.saturating_add(1),
            Outcome::Loss => self.losses = self.losses.saturating_add(1),
            Outcome::Tie => self.ties = self.ties.saturating_add(1),
            Outcome::Abandoned => {},
        }

        if let Some(score) = record.score {
            self.offer_best(record.kind, score);
        }

        self.last_played = Some(record.at);
    }

    fn offer_best(&mut self, kind: GameKind, score: u32) {
        self.best
            .entry(kind)
            .and_modify(|best| {
                *best = if lower_is_better(kind) {
                    score.min(*best)
                } else {
                    score.max(*best)
                };
            })
            .or_insert(score);
    }
}

/// A rejected settings or stats change.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PatchError {
    #[error("unknown setting `{0}`")]
    UnknownKey(String),
    #[error("`{value}` is not a valid value for `{key}`")]
    InvalidValue { key: &'static str, value: String },
    #[error("`{key}` must be within {min}..={max}")]
    OutOfRange {
        key: &'static str,
        min: u64,
        max: u64,
    },
    #[error("memory scores only count for won games")]
    UnwonScore,
}

/// A validated change to [`GuildSettings`]. Unset fields are left alone.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GuildSettingsPatch {
    idle_timeout_secs: Option<Option<u64>>,
    connect4_scale: Option<Scale>,
    hangman_theme: Option<Option<Theme>>,
    sokoban_boxes: Option<u8>,
}

impl GuildSettingsPatch {
    /// Builds a patch from a setting name and its textual value.
    ///
    /// `default` resets optional settings.
    ///
    /// # Errors
    ///
    /// Returns `Err` if the key is unknown or the value invalid.
    pub fn parse(key: &str, value: &str) -> Result<Self, PatchError> {
        let value = value.trim();
        let reset = value.eq_ignore_ascii_case("default");
        let invalid = |key| PatchError::InvalidValue {
            key,
            value: value.to_owned(),
        };

        match key.trim().to_ascii_lowercase().as_str() {
            "idle" | "idle_timeout_secs" if reset => Ok(Self::default().idle_timeout(None)),
            "idle" | "idle_timeout_secs" => {
                let secs = value.parse().map_err(|_| invalid("idle_timeout_secs"))?;
                Self::default().try_idle_timeout(secs)
            },
            "scale" | "connect4_scale" => {
                let scale = value.parse().map_err(|_| invalid("connect4_scale"))?;
                Ok(Self::default().connect4_scale(scale))
            },
            "theme" | "hangman_theme" if reset => Ok(Self::default().hangman_theme(None)),
            "theme" | "hangman_theme" => {
                let theme = Theme::from_name(value).ok_or_else(|| invalid("hangman_theme"))?;
                Ok(Self::default().hangman_theme(Some(theme)))
            },
            "boxes" | "sokoban_boxes" => {
                let boxes = value.parse().map_err(|_| invalid("sokoban_boxes"))?;
                Self::default().try_sokoban_boxes(boxes)
            },
            other => Err(PatchError::UnknownKey(other.to_owned())),
        }
    }

    #[must_use]
    pub const fn idle_timeout(mut self, secs: Option<u64>) -> Self {
        self.idle_timeout_secs = Some(secs);
        self
    }

    /// Sets the idle timeout, validating its range.
    ///
    /// # Errors
    ///
    /// Returns `Err` if `secs` is outside [`IDLE_TIMEOUT_SECS`].
    pub fn try_idle_timeout(self, secs: u64) -> Result<Self, PatchError> {
        if IDLE_TIMEOUT_SECS.contains(&secs) {
            Ok(self.idle_timeout(Some(secs)))
        } else {
            Err(PatchError::OutOfRange {
                key: "idle_timeout_secs",
                min: *IDLE_TIMEOUT_SECS.start(),
                max: *IDLE_TIMEOUT_SECS.end(),
            })
        }
    }

    #[must_use]
    pub const fn connect4_scale(mut self, scale: Scale) -> Self {
        self.connect4_scale = Some(scale);
        self
    }

    #[must_use]
    pub const fn hangman_theme(mut self, theme: Option<Theme>) -> Self {
        self.hangman_theme = Some(theme);
        self
    }

    /// Sets the sokoban box count, validating its range.
    ///
    /// # Errors
    ///
    /// Returns `Err` if `boxes` is outside [`sokoban::BOXES`].
    pub fn try_sokoban_boxes(mut self, boxes: u8) -> Result<Self, PatchError> {
        if sokoban::BOXES.contains(&boxes) {
            self.sokoban_boxes = Some(boxes);
            Ok(self)
        } else {
            Err(PatchError::OutOfRange {
                key: "sokoban_boxes",
                min: u64::from(*sokoban::BOXES.start()),
                max: u64::from(*sokoban::BOXES.end()),
            })
        }
    }

    pub fn apply(&self, settings: &mut GuildSettings) {
        if let Some(secs) = self.idle_timeout_secs {
            settings.idle_timeout_secs = secs;
        }
        if let Some(scale) = self.connect4_scale {
            settings.connect4_scale = scale;
        }
        if let Some(theme) = self.hangman_theme {
            settings.hangman_theme = theme;
        }
        if let Some(boxes) = self.sokoban_boxes {
            settings.sokoban_boxes = boxes;
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Record {
    kind: GameKind,
    outcome: Outcome,
    score: Option<u32>,
    at: OffsetDateTime,
}

/// A validated change to [`UserData`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserDataPatch {
    records: Vec<Record>,
}

impl UserDataPatch {
    /// Records one finished session.
    ///
    /// # Errors
    ///
    /// Returns `Err` if a lower-is-better score is given for a game that
    /// wasn't won, since giving up early would otherwise set a record.
    pub fn record(
        mut self,
        kind: GameKind,
        outcome: Outcome,
        score: Option<u32>,
        at: OffsetDateTime,
    ) -> Result<Self, PatchError> {
        if score.is_some() && lower_is_better(kind) && outcome != Outcome::Win {
            return Err(PatchError::UnwonScore);
        }

        self.records.push(Record {
            kind,
            outcome,
            score,
            at,
        });
        Ok(self)
    }

    pub fn apply(&self, data: &mut UserData) {
        for record in &self.records {
            data.record(record);
        }
    }
}

#[cfg(test)]
mod tests {
    use arcade_games::EndReason;

    use super::*;

    const ALICE: UserId = UserId(1);
    const BOB: UserId = UserId(2);

    /// 2024-05-01 12:00 UTC
    fn noon() -> OffsetDateTime {
        OffsetDateTime::from_unix_timestamp(1_714_564_800).expect("valid timestamp")
    }

    #[test]
    fn outcome_per_participant() {
        let won = Resolution {
            status: Status::Won,
            winner: Some(ALICE),
            reason: EndReason::Board,
        };
        assert_eq!(Outcome::of(ALICE, &won), Outcome::Win);
        assert_eq!(Outcome::of(BOB, &won), Outcome::Loss);

        let idle = Resolution {
            status: Status::TimedOut,
            winner: None,
            reason: EndReason::Idle,
        };
        assert_eq!(Outcome::of(ALICE, &idle), Outcome::Abandoned);

        let tied = Resolution {
            status: Status::Tied,
            winner: None,
            reason: EndReason::Board,
        };
        assert_eq!(Outcome::of(BOB, &tied), Outcome::Tie);
    }

    #[test]
    fn records_keep_the_best_score() {
        let at = noon();
        let patch = UserDataPatch::default()
            .record(GameKind::Snake, Outcome::Loss, Some(40), at)
            .and_then(|p| p.record(GameKind::Snake, Outcome::Loss, Some(25), at))
            .and_then(|p| p.record(GameKind::Memory, Outcome::Win, Some(20), at))
            .and_then(|p| p.record(GameKind::Memory, Outcome::Win, Some(14), at))
            .and_then(|p| p.record(GameKind::TicTacToe, Outcome::Tie, None, at))
            .expect("valid records");

        let mut data = UserData::default();
        patch.apply(&mut data);

        assert_eq!(data.played, 5);
        assert_eq!(data.wins, 2);
        assert_eq!(data.losses, 2);
        assert_eq!(data.ties, 1);
        assert_eq!(data.best.get(&GameKind::Snake), Some(&40), "highest points");
        assert_eq!(data.best.get(&GameKind::Memory), Some(&14), "fewest attempts");
        assert_eq!(data.best.get(&GameKind::TicTacToe), None);
        assert_eq!(data.last_played, Some(at));
    }

    #[test]
    fn unwon_memory_scores_are_rejected() {
        let at = noon();
        let err = UserDataPatch::default()
            .record(GameKind::Memory, Outcome::Abandoned, Some(3), at)
            .expect_err("a quick give-up is no record");
        assert_eq!(err, PatchError::UnwonScore);
    }

    #[test]
    fn settings_patches_validate() {
        let patch = GuildSettingsPatch::parse("idle", "90").expect("in range");
        let mut settings = GuildSettings::default();
        patch.apply(&mut settings);
        assert_eq!(settings.idle_timeout_secs, Some(90));
        assert_eq!(settings.sokoban_boxes, sokoban::DEFAULT_BOXES, "untouched");

        GuildSettingsPatch::parse("theme", "Fruit")
            .expect("known theme")
            .apply(&mut settings);
        assert_eq!(settings.hangman_theme, Some(Theme::Fruit));

        GuildSettingsPatch::parse("idle", "default")
            .expect("reset")
            .apply(&mut settings);
        assert_eq!(settings.idle_timeout_secs, None);

        assert_eq!(
            GuildSettingsPatch::parse("idle", "5"),
            Err(PatchError::OutOfRange {
                key: "idle_timeout_secs",
                min: 10,
                max: 600
            })
        );
        assert_eq!(
            GuildSettingsPatch::parse("boxes", "9"),
            Err(PatchError::OutOfRange {
                key: "sokoban_boxes",
                min: 1,
                max: 4
            })
        );
        assert!(
            matches!(
                GuildSettingsPatch::parse("scale", "gigantic"),
                Err(PatchError::InvalidValue {
                    key: "connect4_scale",
                    ..
                })
            ),
            "unknown scale"
        );
        assert_eq!(
            GuildSettingsPatch::parse("color", "red"),
            Err(PatchError::UnknownKey("color".to_owned()))
        );
    }

    #[test]
    fn user_data_round_trips_through_json() {
        let mut data = UserData {
            played: 3,
            wins: 1,
            ..UserData::default()
        };
        data.best.insert(GameKind::Tetris, 400);
        data.last_played = Some(noon());

        let json = serde_json::to_string(&data).expect("serializable");
        assert!(json.contains("\"tetris\":400"), "kebab-case keys: {json}");
        assert!(json.contains("2024-05-01T12:00:00Z"), "rfc 3339 timestamp: {json}");

        let back: UserData = serde_json::from_str(&json).expect("deserializable");
        assert_eq!(back, data);
    }
}
