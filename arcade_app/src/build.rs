//! Provides constants about the build environment.

/// The cargo package version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
