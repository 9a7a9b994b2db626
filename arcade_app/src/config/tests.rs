use super::setup::{Builder, TomlText};
use super::*;

const DEFAULT_CONFIG: &str = include_str!("../../assets/default_config.toml");

#[test]
fn default_config_is_complete() {
    let config: ArcadeConfig = Builder::new()
        .add_layer(TomlText::new(DEFAULT_CONFIG))
        .build()
        .expect("embedded config must be valid");

    assert_eq!(config.games.idle_timeout(), Duration::from_secs(60));
    assert_eq!(config.games.settle_delay(), Duration::from_millis(1500));
    assert_eq!(config.games.page_size.get(), 10);
    assert_eq!(config.store.path, None);
    assert_eq!(config.console.guild_id, 1);
    assert!(config.log.panic, "panic hook is on by default");
}

#[test]
fn default_log_appenders_load() {
    let config: ArcadeConfig = Builder::new()
        .add_layer(TomlText::new(DEFAULT_CONFIG))
        .build()
        .expect("embedded config must be valid");

    let (appenders, errors) = config
        .log
        .log4rs
        .appenders_lossy(&crate::logging::deserializers());
    assert!(errors.is_empty(), "default appenders should load: {errors:?}");
    assert_eq!(appenders.len(), 1, "only the stderr console appender");
}

#[test]
fn empty_config_uses_defaults() {
    let config: ArcadeConfig = Builder::new().build().expect("everything has defaults");

    assert_eq!(config.games.idle_timeout_secs.get(), 60);
    assert_eq!(config.console.guild_id, 1);
    assert!(!config.log.panic);
}

#[test]
fn zero_idle_timeout_is_rejected() {
    let result = Builder::new()
        .add_layer(TomlText::new("[games]\nidle_timeout_secs = 0"))
        .build::<ArcadeConfig>();

    assert!(
        result.is_err_and(|e| format!("{e:#}").contains("cannot deserialize config")),
        "idle timeout must be non-zero"
    );
}
