//! Text output helpers.

pub mod l10n;
pub mod term;
