use serde::{Deserialize, Serialize};

/// Word list themes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Theme {
    Nature,
    Sport,
    Color,
    Camp,
    Fruit,
    Discord,
    Winter,
    Pokemon,
}

impl Theme {
    pub const ALL: [Self; 8] = [
        Self::Nature,
        Self::Sport,
        Self::Color,
        Self::Camp,
        Self::Fruit,
        Self::Discord,
        Self::Winter,
        Self::Pokemon,
    ];

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Nature => "nature",
            Self::Sport => "sport",
            Self::Color => "color",
            Self::Camp => "camp",
            Self::Fruit => "fruit",
            Self::Discord => "discord",
            Self::Winter => "winter",
            Self::Pokemon => "pokemon",
        }
    }

    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|t| t.name().eq_ignore_ascii_case(name.trim()))
    }

    /// The fixed word list. Lowercase letters and spaces only.
    #[must_use]
    pub const fn words(self) -> &'static [&'static str] {
        match self {
            Self::Nature => &[
                "ocean", "forest", "mountain", "river", "desert", "volcano", "meadow",
                "glacier", "canyon", "waterfall", "rainforest", "island",
            ],
            Self::Sport => &[
                "tennis", "football", "basketball", "swimming", "cycling", "volleyball",
                "hockey", "badminton", "archery", "table tennis", "rugby", "golf",
            ],
            Self::Color => &[
                "red", "orange", "yellow", "green", "blue", "purple", "magenta", "turquoise",
                "crimson", "lavender", "maroon", "teal",
            ],
            Self::Camp => &[
                "tent", "campfire", "sleeping bag", "lantern", "backpack", "compass",
                "marshmallow", "hiking", "canoe", "flashlight",
            ],
            Self::Fruit => &[
                "apple", "banana", "cherry", "grape", "mango", "pineapple", "strawberry",
                "watermelon", "kiwi", "peach", "blueberry", "lemon",
            ],
            Self::Discord => &[
                "server", "channel", "emoji", "nitro", "moderator", "reaction", "thread",
                "voice chat", "webhook", "slash command",
            ],
            Self::Winter => &[
                "snowman", "blizzard", "icicle", "sledding", "snowflake", "mittens",
                "hot chocolate", "frost", "skiing", "scarf",
            ],
            Self::Pokemon => &[
                "pikachu", "charmander", "bulbasaur", "squirtle", "eevee", "snorlax",
                "jigglypuff", "gengar", "mewtwo", "lucario", "psyduck", "magikarp",
            ],
        }
    }
}
