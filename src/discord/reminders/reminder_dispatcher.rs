use crate::discord::Reminders;
use chrono::Utc;
use poise::serenity_prelude as serenity;
use std::sync::Arc;
use std::time::Duration;

/// How often the loop checks whether the reminder is due.
pub const TICK: Duration = Duration::from_secs(60);

/// Post the check-in message to the reminder channel.
pub async fn send_reminder(http: &serenity::Http, reminders: &Reminders) -> Result<(), serenity::Error> {
    serenity::ChannelId::new(reminders.channel_id)
        .send_message(
            http,
            serenity::CreateMessage::new().content(reminders.service.reminder_message()),
        )
        .await?;
    Ok(())
}

/// Runs forever: once a minute, sends the reminder if it is due. Only a
/// successful send counts as today's reminder.
pub async fn run(http: Arc<serenity::Http>, reminders: Arc<Reminders>) {
    let mut interval = tokio::time::interval(TICK);
    loop {
        interval.tick().await;

        let now = Utc::now();
        if !reminders.service.is_due(now).await {
            continue;
        }

        match send_reminder(&http, &reminders).await {
            Ok(()) => {
                reminders.service.mark_sent(now).await;
                tracing::info!(channel_id = reminders.channel_id, "Daily reminder sent");
            }
            Err(err) => tracing::warn!(
                channel_id = reminders.channel_id,
                error = %err,
                "Failed to send daily reminder"
            ),
        }
    }
}
