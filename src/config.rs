// Runtime configuration, read once at startup from the environment (and a
// `.env` file loaded by `main`).
//
// Nothing here is ever logged: the struct holds the Discord token, the model
// API key and the service-account blob.

use crate::core::ai::context::{DEFAULT_CONTEXT_TOKENS, MIN_CONTEXT_TOKENS};
use crate::core::ai::AiConfig;
use crate::core::reminders::{
    ReminderConfig, DEFAULT_REMINDER_HOUR, DEFAULT_REMINDER_MINUTE, DEFAULT_TIMEZONE,
};
use crate::infra::google::CredentialSource;
use anyhow::{anyhow, bail, Context as _, Result};
use std::path::PathBuf;
use std::str::FromStr;

/// Where and when the daily check-in goes out.
pub struct ReminderSettings {
    pub channel_id: u64,
    pub config: ReminderConfig,
}

pub struct AppConfig {
    pub discord_token: String,
    pub credentials: CredentialSource,
    pub drive_folder_id: String,
    pub sheet_range: Option<String>,
    pub openai_api_key: String,
    pub openai_base_url: Option<String>,
    pub openai_model: String,
    pub context_tokens: usize,
    pub owner_id: Option<u64>,
    pub delegate_id: Option<u64>,
    /// `None` when `CHANNEL_ID` is unset; the bot then only answers commands.
    pub reminders: Option<ReminderSettings>,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let require = |key: &str| get(key).ok_or_else(|| anyhow!("Missing {} environment variable", key));

        let credentials = match (get("SERVICE_ACCOUNT_JSON"), get("SERVICE_ACCOUNT_PATH")) {
            (Some(json), _) => CredentialSource::Json(json),
            (None, Some(path)) => CredentialSource::File(PathBuf::from(path)),
            (None, None) => bail!("Set SERVICE_ACCOUNT_JSON or SERVICE_ACCOUNT_PATH"),
        };

        let reminders = match get("CHANNEL_ID") {
            Some(channel) => {
                let channel_id = parse_number::<u64>("CHANNEL_ID", &channel)?;
                let form_link = require("FORM_LINK")
                    .context("FORM_LINK is required when CHANNEL_ID enables reminders")?;
                let timezone = get("TIMEZONE").unwrap_or_else(|| DEFAULT_TIMEZONE.to_string());
                let hour = optional_number("REMINDER_HOUR", get("REMINDER_HOUR"))?
                    .unwrap_or(DEFAULT_REMINDER_HOUR);
                let minute = optional_number("REMINDER_MINUTE", get("REMINDER_MINUTE"))?
                    .unwrap_or(DEFAULT_REMINDER_MINUTE);
                let config = ReminderConfig::new(&timezone, hour, minute, form_link)?;
                Some(ReminderSettings { channel_id, config })
            }
            None => None,
        };

        let context_tokens = optional_number("CONTEXT_TOKEN_BUDGET", get("CONTEXT_TOKEN_BUDGET"))?
            .unwrap_or(DEFAULT_CONTEXT_TOKENS);
        if context_tokens < MIN_CONTEXT_TOKENS {
            bail!("CONTEXT_TOKEN_BUDGET must be at least {}", MIN_CONTEXT_TOKENS);
        }

        Ok(Self {
            discord_token: require("DISCORD_BOT_TOKEN")?,
            credentials,
            drive_folder_id: require("DRIVE_FOLDER_ID")?,
            sheet_range: get("SHEET_RANGE"),
            openai_api_key: require("OPENAI_API_KEY")?,
            openai_base_url: get("OPENAI_BASE_URL"),
            openai_model: get("OPENAI_MODEL").unwrap_or_else(|| AiConfig::default().model),
            context_tokens,
            owner_id: optional_number("USER_ID", get("USER_ID"))?,
            delegate_id: optional_number("DELEGATE_USER_ID", get("DELEGATE_USER_ID"))?,
            reminders,
        })
    }

    pub fn ai_config(&self) -> AiConfig {
        AiConfig {
            model: self.openai_model.clone(),
            ..AiConfig::default()
        }
    }
}

fn parse_number<T: FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .parse()
        .map_err(|_| anyhow!("{} must be a number, got '{}'", key, value))
}

fn optional_number<T: FromStr>(key: &str, value: Option<String>) -> Result<Option<T>> {
    value.map(|v| parse_number(key, &v)).transpose()
}
