// Health-check commands: data freshness, reminder schedule, latency.

use crate::core::headaches::SnapshotState;
use crate::discord::{clip, ensure_authorized, Context, Error, EMBED_FIELD_LIMIT};
use chrono::Utc;
use poise::serenity_prelude as serenity;

/// Keeps the warnings field under Discord's 1024-character field limit.
const MAX_LISTED_WARNINGS: usize = 5;
const MAX_WARNING_CHARS: usize = 180;

/// Show when the headache data was last synced and the reminder schedule.
#[poise::command(slash_command)]
pub async fn status(ctx: Context<'_>) -> Result<(), Error> {
    if !ensure_authorized(ctx).await? {
        return Ok(());
    }

    let data = ctx.data();
    let cache = data.headaches.status().await;

    let mut embed = serenity::CreateEmbed::new()
        .title("Bot Status")
        .color(0x3498DB);

    embed = match &cache.state {
        SnapshotState::NeverSynced => embed.field("Data", "Not synced yet", false),
        SnapshotState::Synced(snapshot) => embed
            .field("Spreadsheet", snapshot.source.name.clone(), false)
            .field("Records", snapshot.record_count().to_string(), true)
            .field("Skipped rows", snapshot.skipped_rows.to_string(), true)
            .field(
                "Last sync",
                format!("<t:{}:R>", snapshot.synced_at.timestamp()),
                true,
            ),
    };

    if let Some(snapshot) = cache.state.snapshot().filter(|s| !s.warnings.is_empty()) {
        let mut lines: Vec<String> = snapshot
            .warnings
            .iter()
            .take(MAX_LISTED_WARNINGS)
            .map(|w| clip(&format!("- {}", w), MAX_WARNING_CHARS))
            .collect();
        if snapshot.warnings.len() > MAX_LISTED_WARNINGS {
            lines.push(format!(
                "...and {} more",
                snapshot.warnings.len() - MAX_LISTED_WARNINGS
            ));
        }
        embed = embed.field(
            format!("Parse warnings ({})", snapshot.warnings.len()),
            lines.join("\n"),
            false,
        );
    }

    if let Some(err) = &cache.last_error {
        embed = embed.field("Last refresh error", clip(err, EMBED_FIELD_LIMIT), false);
    }

    embed = match &data.reminders {
        Some(reminders) => {
            let status = reminders.service.status(Utc::now()).await;
            embed
                .field("Local time", status.local_time, true)
                .field("Reminder", status.reminder_time, true)
                .field(
                    "Sent today",
                    if status.sent_today { "Yes" } else { "No" },
                    true,
                )
        }
        None => embed.field("Reminder", "Disabled (no CHANNEL_ID)", false),
    };

    ctx.send(poise::CreateReply::default().embed(embed)).await?;
    Ok(())
}

/// Check that the bot is responsive.
#[poise::command(slash_command)]
pub async fn ping(ctx: Context<'_>) -> Result<(), Error> {
    let latency = ctx.ping().await;
    ctx.say(format!("Pong! Gateway latency: {} ms", latency.as_millis()))
        .await?;
    Ok(())
}
