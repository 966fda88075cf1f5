// Manual trigger for the daily check-in reminder.

use crate::discord::reminder_dispatcher::send_reminder;
use crate::discord::commands::headaches::DISCORD_MESSAGE_LIMIT;
use crate::discord::{clip, ensure_authorized, Context, Error};

/// Send the daily check-in reminder now (does not count as today's reminder).
#[poise::command(slash_command)]
pub async fn remindtest(ctx: Context<'_>) -> Result<(), Error> {
    if !ensure_authorized(ctx).await? {
        return Ok(());
    }

    let Some(reminders) = &ctx.data().reminders else {
        ctx.say("Reminders are disabled. Set CHANNEL_ID and FORM_LINK to enable them.")
            .await?;
        return Ok(());
    };

    match send_reminder(&ctx.serenity_context().http, reminders).await {
        Ok(()) => {
            ctx.say(format!("Reminder sent to <#{}>.", reminders.channel_id))
                .await?;
        }
        Err(err) => {
            tracing::warn!(channel_id = reminders.channel_id, error = %err, "Test reminder failed");
            let reply = format!("Could not send the reminder: {}", err);
            ctx.say(clip(&reply, DISCORD_MESSAGE_LIMIT)).await?;
        }
    }
    Ok(())
}
