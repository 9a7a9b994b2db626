mod build;
mod config;
mod console;
mod data;
mod fmt;
mod logging;

fn main() -> anyhow::Result<()> {
    use std::borrow::Cow;
    use std::panic;

    use anyhow::Context as _;

    use crate::build::VERSION;
    use crate::config::ArcadeConfig;
    use crate::console::{Console, ConsoleSink};
    use crate::data::{AppStore, Cache, GuildId};

    return inner();

    // short async fn to reduce `tokio::main` scope
    #[tokio::main]
    async fn inner() -> anyhow::Result<()> {
        // run the program and clean up
        let res = run().await;
        if let Err(why) = &res {
            log::error!("Exiting due to error: {why:?}");
        }

        log::logger().flush();
        res
    }

    // actual main logic
    async fn run() -> anyhow::Result<()> {
        let config = build_config()?;
        init_logging(config.log.log4rs)?;

        if config.log.panic {
            // register the custom panic handler after logging is set up
            panic::set_hook(Box::new(on_panic));
        }

        log::info!(target: "arcade_app::version", "Arcade v{VERSION}");

        let store = AppStore::open(config.store.path.as_deref()).await?;
        let sink = ConsoleSink::stdout(Cache::new(store));
        let console = Console::new(sink, GuildId(config.console.guild_id), &config.games);

        let stdin = tokio::io::BufReader::new(tokio::io::stdin());
        console.run(stdin).await
    }

    /// Custom panic handler that writes the panic to the logger and flushes it.
    ///
    /// This _could_ be a problem if the logger is the cause of the panic, but
    /// at that stage error reporting is already screwed so this doesn't make it
    /// any worse.
    fn on_panic(info: &panic::PanicHookInfo<'_>) {
        use std::backtrace::Backtrace;
        use std::io::{Write as _, stderr};

        // always include the backtrace here, even when not enabled,
        // since the user already opted into a custom panic handler
        let backtrace = Backtrace::force_capture();
        let thread = std::thread::current();
        let name = thread.name().unwrap_or("<unnamed>");

        // just in case the loggers fail or are empty.
        // stdout is reserved for game output.
        _ = writeln!(stderr(), "thread '{name}' {info}");
        log::error!("thread '{name}' {info}\n{backtrace}");
        log::logger().flush();
    }

    fn profile() -> anyhow::Result<Cow<'static, str>> {
        use std::env::VarError::NotPresent;
        use std::env::var;

        match var("ARCADE_PROFILE") {
            Ok(value) => Ok(value.into()),
            Err(NotPresent) => Ok("release".into()),
            Err(err) => Err(err).context("cannot load ARCADE_PROFILE env variable"),
        }
    }

    fn build_config() -> anyhow::Result<ArcadeConfig> {
        use crate::config::setup::{Builder, Env, File, TomlText};

        let profile = profile()?;
        let profile_config = format!("arcade.{profile}.toml");
        let default_config = include_str!("../assets/default_config.toml");

        Builder::new()
            .add_layer(TomlText::new(default_config))
            .add_layer(File::new("arcade.toml").required(false))
            .add_layer(File::new(&profile_config).required(false))
            .add_layer(Env::prefixed("ARCADE__"))
            .build()
    }

    fn init_logging(config: log4rs::config::RawConfig) -> anyhow::Result<()> {
        let deserializers = crate::logging::deserializers();
        let (appenders, errors) = config.appenders_lossy(&deserializers);
        if !errors.is_empty() {
            return Err(errors.into());
        }

        let config = log4rs::Config::builder()
            .appenders(appenders)
            .loggers(config.loggers())
            .build(config.root())?;

        log4rs::init_config(config)?;
        Ok(())
    }
}
