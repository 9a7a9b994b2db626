//! Resolves [`Message`]s through Fluent bundles.
//!
//! The English resource is embedded from `assets/l10n/en.ftl`. Arguments are
//! passed to Fluent already formatted as strings.

use std::fmt::Write as _;
use std::sync::LazyLock;

use arcade_games::Message;
use fluent_bundle::concurrent::FluentBundle;
use fluent_bundle::{FluentArgs, FluentResource};
use unic_langid::LanguageIdentifier;

type Bundle = FluentBundle<FluentResource>;

const EN_SOURCE: &str = include_str!("../../assets/l10n/en.ftl");

static EN: LazyLock<Bundle> = LazyLock::new(|| load("en-US", EN_SOURCE));

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[expect(non_camel_case_types)]
pub enum Locale {
    #[default]
    en,
}

impl Locale {
    fn bundle(self) -> &'static Bundle {
        match self {
            Self::en => &EN,
        }
    }

    /// Whether the locale has text for a key.
    pub fn has(self, key: &str) -> bool {
        self.bundle().has_message(key)
    }

    /// Formats a message, substituting its arguments.
    ///
    /// Unknown keys are shown as the key itself so they stay visible.
    pub fn format(self, message: &Message) -> String {
        let bundle = self.bundle();
        let Some(pattern) = bundle.get_message(message.key).and_then(|m| m.value()) else {
            log::warn!("Missing translation for `{}`.", message.key);
            return message.key.to_owned();
        };

        let mut args = FluentArgs::new();
        for (name, value) in &message.args {
            args.set(*name, value.as_str());
        }

        let mut errors = Vec::new();
        let text = bundle.format_pattern(pattern, Some(&args), &mut errors);
        if !errors.is_empty() {
            log::warn!("Formatting `{}` reported: {errors:?}", message.key);
        }

        text.into_owned()
    }
}

fn load(lang: &str, source: &str) -> Bundle {
    let lang = lang.parse::<LanguageIdentifier>().unwrap_or_default();
    let mut bundle = FluentBundle::new_concurrent(vec![lang.clone()]);

    // frames are plain text, so no bidi isolation marks around arguments
    bundle.set_use_isolating(false);

    let resource = FluentResource::try_new(source.to_owned()).unwrap_or_else(|(res, errors)| {
        log::error!("Invalid {lang} l10n resource: {errors:?}");
        res
    });

    if let Err(errors) = bundle.add_resource(resource) {
        log::error!("Conflicting {lang} l10n messages: {errors:?}");
    }

    bundle
}

/// Formats a message with the default locale.
pub fn format(message: &Message) -> String {
    Locale::default().format(message)
}

/// Formats a message and appends the score, if it has one.
pub fn format_with_score(message: &Message) -> String {
    let mut text = format(message);
    if let Some(score) = message.get("score") {
        _ = write!(text, " {}", format(&Message::new("score").arg("score", score)));
    }
    text
}
