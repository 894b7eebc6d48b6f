use config::{Config, ConfigBuilder, ConfigError, File};
use secrecy::{ExposeSecret, Secret};
use serde_aux::field_attributes::{deserialize_bool_from_anything, deserialize_number_from_string};

use crate::domain::web_app_link::WebAppLink;
use crate::telegram::keyboard::ButtonStyle;

/// Plain environment variables accepted on top of the `APP_*` ones, e.g. `PORT` as set by most
/// hosting platforms. They take precedence over every other source.
const LEGACY_ENV_OVERRIDES: [(&str, &str); 9] = [
    ("FIREBASE_API_KEY", "firestore.api_key"),
    ("FIREBASE_AUTH_DOMAIN", "firestore.auth_domain"),
    ("FIREBASE_PROJECT_ID", "firestore.project_id"),
    ("FIREBASE_STORAGE_BUCKET", "firestore.storage_bucket"),
    ("FIREBASE_MESSAGING_SENDER_ID", "firestore.messaging_sender_id"),
    ("FIREBASE_APP_ID", "firestore.app_id"),
    ("BOT_TOKEN", "telegram.bot_token"),
    ("WEB_APP_URL", "web_app.url"),
    ("PORT", "application.port"),
];

#[derive(Debug)]
pub enum Environment {
    Development,
    Production,
}

#[derive(serde::Deserialize, Clone)]
pub struct Settings {
    pub application: ApplicationSettings,
    pub firestore: FirestoreSettings,
    pub telegram: TelegramSettings,
    pub web_app: WebAppSettings,
}

#[derive(serde::Deserialize, Clone)]
pub struct ApplicationSettings {
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub port: u16,
    pub host: String,
}

#[derive(serde::Deserialize, Clone)]
pub struct FirestoreSettings {
    pub base_url: String,
    // secrecy protects secret information and prevents them to be exposed (eg: via logs)
    pub api_key: Secret<String>,
    #[serde(default)]
    pub auth_domain: String,
    pub project_id: String,
    #[serde(default)]
    pub storage_bucket: String,
    #[serde(default)]
    pub messaging_sender_id: String,
    #[serde(default)]
    pub app_id: String,
}

#[derive(serde::Deserialize, Clone)]
pub struct TelegramSettings {
    pub base_url: String,
    pub bot_token: Secret<String>,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub poll_timeout_secs: u64,
    pub button_style: ButtonStyle,
    #[serde(default, deserialize_with = "deserialize_bool_from_anything")]
    pub echo_errors: bool,
}

#[derive(serde::Deserialize, Clone)]
pub struct WebAppSettings {
    #[serde(default)]
    pub url: String,
}

impl Settings {
    pub fn get_address(&self) -> String {
        format!(
            "{}:{}",
            self.application.get_host(),
            self.application.get_port()
        )
    }

    pub fn get_web_app_link(&self) -> Result<WebAppLink, String> {
        WebAppLink::parse(self.web_app.url.clone())
    }

    pub fn set_firestore_base_url(&mut self, new_base_url: String) {
        self.firestore.base_url = new_base_url
    }

    pub fn set_telegram_base_url(&mut self, new_base_url: String) {
        self.telegram.base_url = new_base_url
    }

    pub fn set_app_port(&mut self, port: u16) {
        self.application.port = port;
    }
}

impl ApplicationSettings {
    pub fn get_port(&self) -> u16 {
        self.port
    }

    pub fn get_host(&self) -> String {
        self.host.clone()
    }
}

impl FirestoreSettings {
    /// Root of the document tree of the default database, without a trailing slash.
    pub fn get_documents_url(&self) -> String {
        format!(
            "{}/v1/{}/documents",
            self.base_url.trim_end_matches('/'),
            self.get_database_name()
        )
    }

    pub fn get_database_name(&self) -> String {
        format!("projects/{}/databases/(default)", self.project_id)
    }

    pub fn is_configured(&self) -> bool {
        !self.api_key.expose_secret().is_empty() && !self.project_id.is_empty()
    }
}

impl TelegramSettings {
    pub fn has_bot_token(&self) -> bool {
        !self.bot_token.expose_secret().is_empty()
    }
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Development => "development",
            Environment::Production => "production",
        }
    }
}

impl TryFrom<String> for Environment {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.to_lowercase().as_str() {
            "development" => Ok(Self::Development),
            "production" => Ok(Self::Production),
            unknown_env => Err(format!(
                "{} is not supported environment. Use either 'development' or 'production'.",
                unknown_env
            )),
        }
    }
}

pub fn get_configuration() -> Result<Settings, ConfigError> {
    let root_path = std::env::current_dir().map_err(|err| ConfigError::Foreign(Box::new(err)))?;
    let config_directory = root_path.join("config");
    // Uses development environment by default
    let enviroment: Environment = std::env::var("APP_ENVIRONMENT")
        .unwrap_or_else(|_| "development".into())
        .try_into()
        .map_err(ConfigError::Message)?;
    let config_base_filepath = config_directory.join("base");
    let config_env_filepath = config_directory.join(enviroment.as_str());

    // It merges the base configuration file with the one from the specific environment (development or production)
    let builder = Config::builder()
        .add_source(File::from(config_base_filepath).required(true))
        .add_source(File::from(config_env_filepath).required(true))
        // Merge settings from environment variables with a prefix of APP and "__" separator
        // E.g APP_APPLICATION__PORT would set Settings.application.port
        .add_source(config::Environment::with_prefix("app").separator("__"));
    let settings = with_legacy_overrides(builder)?.build()?;

    tracing::info!("Application environment = {:?}", enviroment);

    // Try to convert the value from the configuration file into a Settings type
    settings.try_deserialize()
}

fn with_legacy_overrides(
    mut builder: ConfigBuilder<config::builder::DefaultState>,
) -> Result<ConfigBuilder<config::builder::DefaultState>, ConfigError> {
    for (variable, key) in LEGACY_ENV_OVERRIDES {
        let value = std::env::var(variable).ok().filter(|value| !value.is_empty());

        builder = builder.set_override_option(key, value)?;
    }

    Ok(builder)
}
