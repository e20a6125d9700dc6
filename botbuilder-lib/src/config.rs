use botbuilder_assistant::{AssistantSettings, GeminiConfig};
use chrono::Duration;
use color_eyre::eyre::{Result, WrapErr};
use serde::{Deserialize, Serialize};
use serde_with::{DurationSeconds, serde_as};
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Deserialize, Serialize, Debug, PartialEq)]
pub struct Config {
    /// The id of the guild the commands are registered in.
    pub guild_id: u64,
    /// The help text for the bot. `/help`
    pub help_text: Option<Arc<String>>,
    /// Where the sled database lives.
    #[serde(default = "default_database_path")]
    pub database_path: PathBuf,
    #[serde(default)]
    pub assistant: AssistantConfig,
}

/// The `[assistant]` table.
#[serde_as]
#[derive(Deserialize, Serialize, Debug, PartialEq, Clone)]
#[serde(default)]
pub struct AssistantConfig {
    /// Gemini model used for planning.
    pub model: String,
    pub endpoint: String,
    pub temperature: f32,
    /// Request timeout towards the planning backend, in seconds.
    #[serde_as(as = "DurationSeconds<i64>")]
    pub timeout: Duration,
    /// How long a user has to wait between two requests, in seconds.
    #[serde_as(as = "DurationSeconds<i64>")]
    pub cooldown: Duration,
    /// Plans longer than this are refused.
    pub max_invocations: usize,
    pub persona: String,
    /// Whether mentioning the bot in a message starts a run.
    pub respond_to_mentions: bool,
}

impl Default for AssistantConfig {
    fn default() -> Self {
        let gemini = GeminiConfig::default();
        let settings = AssistantSettings::default();

        AssistantConfig {
            model: gemini.model,
            endpoint: gemini.endpoint,
            temperature: gemini.temperature,
            timeout: Duration::seconds(30),
            cooldown: Duration::seconds(10),
            max_invocations: settings.max_invocations,
            persona: settings.persona,
            respond_to_mentions: true,
        }
    }
}

impl AssistantConfig {
    pub fn gemini(&self, api_key: String) -> GeminiConfig {
        GeminiConfig {
            api_key,
            model: self.model.clone(),
            endpoint: self.endpoint.clone(),
            temperature: self.temperature,
            timeout: self
                .timeout
                .to_std()
                .unwrap_or(GeminiConfig::default().timeout),
        }
    }

    pub fn settings(&self) -> AssistantSettings {
        AssistantSettings {
            persona: self.persona.clone(),
            max_invocations: self.max_invocations,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            guild_id: 0,
            help_text: None,
            database_path: default_database_path(),
            assistant: AssistantConfig::default(),
        }
    }
}

impl Config {
    /// Fetches the config from the given file.
    pub fn create_from_file(config_path: impl AsRef<Path>) -> Result<Config> {
        let file = std::fs::read_to_string(config_path).wrap_err("Could not read config file")?;

        toml::from_str(&file).wrap_err("Could not parse config file")
    }

    /// Reloads the config file and updates the configuration.
    pub fn reload(&mut self, config_path: impl AsRef<Path>) {
        match Config::create_from_file(config_path) {
            Ok(config) => *self = config,
            Err(e) => tracing::error!("Keeping the old config: {:?}", e),
        }
    }
}

fn default_database_path() -> PathBuf {
    PathBuf::from("botbuilder.db")
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn should_deserialize_properly() {
        let test_input = r#"
guild_id = 123456789109876
help_text = "Mention me and ask for something!"

[assistant]
model = "gemini-2.0-flash-lite"
cooldown = 30
persona = "You are Hal."
"#;

        let config: Config = toml::from_str(test_input).unwrap();

        assert_eq!(
            config,
            Config {
                guild_id: 123456789109876,
                help_text: Some(Arc::new("Mention me and ask for something!".to_owned())),
                assistant: AssistantConfig {
                    model: "gemini-2.0-flash-lite".to_owned(),
                    cooldown: Duration::seconds(30),
                    persona: "You are Hal.".to_owned(),
                    ..Default::default()
                },
                ..Default::default()
            }
        );
    }

    #[test]
    fn assistant_table_is_optional() {
        let config: Config = toml::from_str("guild_id = 1").unwrap();

        assert_eq!(config.assistant, AssistantConfig::default());
        assert_eq!(config.database_path, PathBuf::from("botbuilder.db"));
    }

    #[test]
    fn round_trips_through_toml() {
        let config = Config {
            guild_id: 42,
            ..Default::default()
        };

        let text = toml::to_string(&config).unwrap();

        assert_eq!(toml::from_str::<Config>(&text).unwrap(), config);
    }

    #[test]
    fn converts_into_planner_settings() {
        let assistant = AssistantConfig {
            timeout: Duration::seconds(5),
            max_invocations: 4,
            ..Default::default()
        };

        assert_eq!(
            assistant.gemini("key".to_owned()).timeout,
            std::time::Duration::from_secs(5)
        );
        assert_eq!(assistant.gemini("key".to_owned()).api_key, "key");
        assert_eq!(assistant.settings().max_invocations, 4);
    }
}
