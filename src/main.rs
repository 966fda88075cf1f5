// This is the entry point of the headache tracker bot.
//
// **Architecture Overview:**
// - `core/` = Business logic (parsing, caching, grounded answers, reminder timing)
// - `infra/` = Implementations of core traits (Google Drive/Sheets, OpenAI)
// - `discord/` = Discord-specific adapters (commands, reminder loop)
//
// This file's job is to:
// 1. Load configuration
// 2. Initialize services (dependency injection)
// 3. Set up the Discord framework
// 4. Register commands and start background tasks

// These attrs point each module declaration at a more descriptive root file
// so we don't end up with half a dozen mod.rs files that all look the same.
#[path = "core/core_layer.rs"]
mod core;
#[path = "discord/discord_layer.rs"]
mod discord;
#[path = "infra/infra_layer.rs"]
mod infra;

mod config;

use crate::config::AppConfig;
use crate::core::ai::GroundedQaEngine;
use crate::core::headaches::{DataCache, HeadacheService};
use crate::core::reminders::ReminderService;
use crate::discord::commands::presence;
use crate::discord::{reminder_dispatcher, AccessPolicy, Data, Reminders};
use crate::infra::ai::OpenAiClient;
use crate::infra::google::{
    http_client, GoogleSheetSource, ServiceAccountAuth, DRIVE_READONLY_SCOPE,
    SHEETS_READONLY_SCOPE,
};
use anyhow::Context as _;
use poise::serenity_prelude as serenity;
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging so we can see what's happening
    tracing_subscriber::fmt::init();

    // Load environment variables from .env file (if it exists)
    dotenv::dotenv().ok();

    let config = AppConfig::from_env()?;

    // ========================================================================
    // DEPENDENCY INJECTION
    // ========================================================================
    // Create our services with their dependencies.
    // This is the "composition root" where we wire everything together.

    // Google: resolve the service account once. A bad credential stops the bot
    // here instead of failing every refresh later.
    let google_http = http_client().context("Failed to build Google HTTP client")?;
    let credential_json = config.credentials.load().await?;
    let auth = ServiceAccountAuth::resolve(
        &credential_json,
        &[DRIVE_READONLY_SCOPE, SHEETS_READONLY_SCOPE],
        google_http.clone(),
    )
    .await
    .context("Service account credential could not be used")?;
    drop(credential_json);

    let sheet_source = GoogleSheetSource::new(
        google_http,
        Arc::new(auth),
        config.drive_folder_id.clone(),
    )
    .with_range(config.sheet_range.clone());
    let cache = DataCache::new(sheet_source);

    // Language model
    let ai_client = OpenAiClient::new(config.openai_api_key.clone(), config.openai_base_url.clone())
        .context("Failed to build completion HTTP client")?;
    let qa = GroundedQaEngine::new(ai_client, config.ai_config())
        .with_context_tokens(config.context_tokens);

    let headaches = Arc::new(HeadacheService::new(cache, qa));

    // Load data once so the first question has something to work with. The bot
    // still starts if this fails; /refresh can retry.
    match headaches.refresh_data().await {
        Ok(summary) => tracing::info!(
            records = summary.record_count,
            skipped = summary.skipped_count,
            "Initial headache data loaded"
        ),
        Err(err) => tracing::warn!("Initial refresh failed, starting without data: {}", err),
    }

    let reminders = config.reminders.map(|settings| {
        tracing::info!(
            channel_id = settings.channel_id,
            timezone = settings.config.timezone.name(),
            hour = settings.config.hour,
            minute = settings.config.minute,
            "Daily reminder enabled"
        );
        Arc::new(Reminders {
            service: Arc::new(ReminderService::new(settings.config)),
            channel_id: settings.channel_id,
        })
    });
    if reminders.is_none() {
        tracing::info!("CHANNEL_ID not set, daily reminder disabled");
    }

    // Create the data structure that will be shared across all commands
    let data = Data {
        headaches,
        reminders,
        access: AccessPolicy {
            owner_id: config.owner_id,
            delegate_id: config.delegate_id,
        },
    };

    // ========================================================================
    // DISCORD FRAMEWORK SETUP
    // ========================================================================
    // Slash commands only, so message content is not needed.

    let intents = serenity::GatewayIntents::GUILDS | serenity::GatewayIntents::GUILD_MESSAGES;

    let framework = poise::Framework::builder()
        .options(poise::FrameworkOptions {
            commands: discord::commands::all(),
            ..Default::default()
        })
        .setup(|ctx, ready, framework| {
            Box::pin(async move {
                tracing::info!(user = %ready.user.name, "Bot is starting up");

                // Register slash commands globally (can take up to an hour to propagate)
                poise::builtins::register_globally(ctx, &framework.options().commands).await?;
                tracing::info!("Commands registered");

                presence::on_ready(ctx);

                // Background reminder loop. Checks every 60 seconds.
                if let Some(reminders) = data.reminders.as_ref() {
                    let http = ctx.http.clone();
                    let reminders = Arc::clone(reminders);
                    tokio::spawn(reminder_dispatcher::run(http, reminders));
                }

                Ok(data)
            })
        })
        .build();

    // Create the client and start the bot
    let mut client = serenity::ClientBuilder::new(&config.discord_token, intents)
        .framework(framework)
        .await
        .context("Error creating Discord client")?;

    client.start().await.context("Error running bot")?;
    Ok(())
}
