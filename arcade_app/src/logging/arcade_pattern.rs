//! The `"arcade"` encoder kind: a [`PatternEncoder`] assembled from switches
//! instead of a raw pattern string.

use log4rs::config::{Deserialize, Deserializers};
use log4rs::encode::Encode;
use log4rs::encode::pattern::PatternEncoder;

#[derive(Debug, Default, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ArcadePatternConfig {
    /// Prefix lines with the wall-clock time.
    time: bool,
    /// Include the module the record came from.
    target: bool,
}

impl ArcadePatternConfig {
    fn pattern(&self) -> String {
        let mut pattern = "[".to_owned();
        if self.time {
            pattern.push_str("{d(%H:%M:%S%.3f)} ");
        }

        pattern.push_str("{h({l:<5})}");
        if self.target {
            pattern.push_str(" {t}");
        }

        pattern.push_str("] {m}{n}");
        pattern
    }
}

pub struct ArcadePatternDeserializer;

impl Deserialize for ArcadePatternDeserializer {
    type Trait = dyn Encode;
    type Config = ArcadePatternConfig;

    fn deserialize(
        &self,
        config: Self::Config,
        _deserializers: &Deserializers,
    ) -> anyhow::Result<Box<Self::Trait>> {
        Ok(Box::new(PatternEncoder::new(&config.pattern())))
    }
}
