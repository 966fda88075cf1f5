// Discord layer - commands and the reminder loop.
//
// Everything here translates between Discord types and the core services.
// No headache logic lives in this layer.

#[path = "commands/command_catalog.rs"]
pub mod commands;

#[path = "reminders/reminder_dispatcher.rs"]
pub mod reminder_dispatcher;

use crate::core::headaches::HeadacheService;
use crate::core::reminders::ReminderService;
use crate::infra::ai::OpenAiClient;
use crate::infra::google::GoogleSheetSource;
use std::sync::Arc;

pub type Error = Box<dyn std::error::Error + Send + Sync>;
pub type Context<'a> = poise::Context<'a, Data, Error>;

pub type Headaches = HeadacheService<GoogleSheetSource, OpenAiClient>;

/// Who may see or manage the headache data (`/ask`, `/refresh`, `/status`,
/// `/remindtest`). Only `/ping` is open to everyone.
#[derive(Debug, Clone, Copy, Default)]
pub struct AccessPolicy {
    pub owner_id: Option<u64>,
    pub delegate_id: Option<u64>,
}

impl AccessPolicy {
    /// With no owner configured the bot is open to everyone.
    pub fn is_authorized(&self, user_id: u64) -> bool {
        match self.owner_id {
            None => true,
            Some(owner) => owner == user_id || self.delegate_id == Some(user_id),
        }
    }
}

/// The daily check-in and the channel it goes to.
pub struct Reminders {
    pub service: Arc<ReminderService>,
    pub channel_id: u64,
}

/// Shared state handed to every command.
pub struct Data {
    pub headaches: Arc<Headaches>,
    pub reminders: Option<Arc<Reminders>>,
    pub access: AccessPolicy,
}

/// Replies with a refusal and returns `false` when the author may not run a
/// restricted command.
pub async fn ensure_authorized(ctx: Context<'_>) -> Result<bool, Error> {
    if ctx.data().access.is_authorized(ctx.author().id.get()) {
        return Ok(true);
    }

    tracing::info!(
        user_id = ctx.author().id.get(),
        command = %ctx.command().name,
        "Unauthorized command attempt"
    );
    ctx.send(
        poise::CreateReply::default()
            .content("You are not authorized to use this command.")
            .ephemeral(true),
    )
    .await?;
    Ok(false)
}

/// Discord rejects embed field values longer than this.
pub const EMBED_FIELD_LIMIT: usize = 1024;

/// Shortens `text` to at most `limit` characters, marking the cut with `...`.
pub fn clip(text: &str, limit: usize) -> String {
    if text.chars().count() <= limit {
        return text.to_string();
    }
    let kept: String = text.chars().take(limit.saturating_sub(3)).collect();
    format!("{}...", kept)
}
