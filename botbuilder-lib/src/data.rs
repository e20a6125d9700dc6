use crate::{actions, config::Config, cooldown::Cooldowns, host::DiscordHost};
use botbuilder_assistant::{Assistant, GeminiPlanner};
use botbuilder_db::BotDb;
use color_eyre::eyre::{Error, Result, WrapErr};
use std::{path::Path, sync::Arc};
use tokio::sync::RwLock;

/// The global state of the bot
pub type State = Arc<RawAppState>;

pub type BotAssistant = Assistant<GeminiPlanner, DiscordHost>;

pub struct RawAppState {
    pub config: Arc<RwLock<Config>>,
    /// Config file watcher that refreshes the config if it changes
    ///
    /// Attached to the AppState to keep the watcher alive
    _watcher: notify::RecommendedWatcher,
    /// The path to the config file.
    /// This is to allow for saving / reloading the config.
    pub config_path: Box<Path>,
    pub db: BotDb,
    pub assistant: BotAssistant,
    pub cooldowns: Cooldowns,
}

impl RawAppState {
    pub fn new(config: Config, config_path: String, gemini_api_key: String) -> Result<RawAppState> {
        let db = BotDb::open(&config.database_path)?;

        let planner = GeminiPlanner::new(config.assistant.gemini(gemini_api_key))?;
        let assistant = Assistant::new(
            planner,
            Arc::new(actions::registry()?),
            config.assistant.settings(),
        );

        let config = Arc::new(RwLock::new(config));

        use notify::{
            Event, EventKind, RecursiveMode, Watcher,
            event::{AccessKind, AccessMode},
        };

        let config_clone = Arc::clone(&config);
        let reload_config_path = config_path.clone();
        let config_path: Box<Path> = Path::new(&config_path).into();

        let mut watcher = notify::recommended_watcher(move |res| match res {
            Ok(Event {
                kind: EventKind::Access(AccessKind::Close(AccessMode::Write)),
                ..
            }) => {
                tracing::info!("config changed, reloading...");

                config_clone.blocking_write().reload(&*reload_config_path);
            }
            Err(e) => tracing::error!("watch error: {:?}", e),
            _ => {}
        })
        .wrap_err("Failed to create file watcher")?;

        watcher
            .watch(&config_path, RecursiveMode::NonRecursive)
            .wrap_err("Failed to watch config file")?;

        Ok(RawAppState {
            config,
            _watcher: watcher,
            config_path,
            db,
            assistant,
            cooldowns: Cooldowns::default(),
        })
    }
}

// User data, which is stored and accessible in all command invocations
pub type PoiseContext<'a> = poise::Context<'a, State, Error>;
