//! log4rs setup. Records go to log4rs' own `console` appender on `stderr`,
//! since `stdout` carries the game frames.

use log4rs::config::Deserializers;

mod arcade_pattern;

/// The stock log4rs deserializers plus the `"arcade"` encoder kind.
pub fn deserializers() -> Deserializers {
    let mut d = Deserializers::new();
    d.insert("arcade", arcade_pattern::ArcadePatternDeserializer);
    d
}
