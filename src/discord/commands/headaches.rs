// Discord commands for asking about and refreshing headache data.
//
// **Notice the pattern:**
// 1. Extract primitive data from Discord types
// 2. Call the headache service
// 3. Format the response based on the result

use crate::core::ai::QaError;
use crate::core::headaches::SyncError;
use crate::discord::{clip, ensure_authorized, Context, Error};
use poise::serenity_prelude as serenity;

/// Discord's per-message character limit.
pub const DISCORD_MESSAGE_LIMIT: usize = 2000;

/// Ask a question about your headache history (owner and delegate only).
#[poise::command(slash_command)]
pub async fn ask(
    ctx: Context<'_>,
    #[description = "What do you want to know about your headaches?"] question: String,
) -> Result<(), Error> {
    if !ensure_authorized(ctx).await? {
        return Ok(());
    }

    // The model call can take longer than Discord's 3 second window.
    ctx.defer().await?;

    tracing::info!(user_id = ctx.author().id.get(), "Question received");

    match ctx.data().headaches.get_answer(&question).await {
        Ok(answer) => {
            for chunk in split_message(&answer, DISCORD_MESSAGE_LIMIT) {
                ctx.say(chunk).await?;
            }
        }
        Err(QaError::EmptyQuestion) => {
            ctx.say("Please ask a question about your headache data.")
                .await?;
        }
        Err(QaError::Upstream(err)) => {
            tracing::warn!("Could not answer question: {}", err);
            ctx.say("Sorry, I couldn't get an answer right now. Please try again in a moment.")
                .await?;
        }
    }

    Ok(())
}

/// Re-read the headache spreadsheet from Google Drive.
#[poise::command(slash_command)]
pub async fn refresh(ctx: Context<'_>) -> Result<(), Error> {
    if !ensure_authorized(ctx).await? {
        return Ok(());
    }

    ctx.defer().await?;

    match ctx.data().headaches.refresh_data().await {
        Ok(summary) => {
            let embed = serenity::CreateEmbed::new()
                .title("Headache data refreshed")
                .color(0x2ECC71)
                .field("Records", summary.record_count.to_string(), true)
                .field("Skipped rows", summary.skipped_count.to_string(), true)
                .field(
                    "Synced",
                    format!("<t:{}:R>", summary.synced_at.timestamp()),
                    true,
                );
            ctx.send(poise::CreateReply::default().embed(embed)).await?;
        }
        Err(SyncError::RefreshInProgress) => {
            ctx.say("A refresh is already running. Try again when it finishes.")
                .await?;
        }
        Err(err) => {
            // The cache already logged the failure; only the user-facing text here.
            let reply = format!("Refresh failed, still using the previous data.\n> {}", err);
            ctx.say(clip(&reply, DISCORD_MESSAGE_LIMIT)).await?;
        }
    }

    Ok(())
}

/// Splits `text` into pieces of at most `limit` characters, preferring to
/// break at a newline so paragraphs stay whole.
pub fn split_message(text: &str, limit: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut rest = text;

    while rest.chars().count() > limit {
        // Byte index of the first character past the limit.
        let hard_end = rest
            .char_indices()
            .nth(limit)
            .map(|(i, _)| i)
            .unwrap_or(rest.len());
        let cut = match rest[..hard_end].rfind('\n') {
            Some(i) if i > 0 => i,
            _ => hard_end,
        };

        chunks.push(rest[..cut].to_string());
        rest = rest[cut..].strip_prefix('\n').unwrap_or(&rest[cut..]);
    }

    if !rest.is_empty() || chunks.is_empty() {
        chunks.push(rest.to_string());
    }
    chunks
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_answer_is_one_chunk() {
        assert_eq!(split_message("hello", 2000), vec!["hello".to_string()]);
    }

    #[test]
    fn test_long_answer_respects_limit() {
        let text = "a".repeat(4500);
        let chunks = split_message(&text, 2000);
        assert_eq!(chunks.len(), 3);
        assert!(chunks.iter().all(|c| c.chars().count() <= 2000));
        assert_eq!(chunks.concat(), text);
    }

    #[test]
    fn test_prefers_newline_breaks() {
        let text = format!("{}\n{}", "a".repeat(10), "b".repeat(10));
        let chunks = split_message(&text, 15);
        assert_eq!(chunks, vec!["a".repeat(10), "b".repeat(10)]);
    }

    #[test]
    fn test_counts_characters_not_bytes() {
        let text = "é".repeat(30);
        let chunks = split_message(&text, 10);
        assert_eq!(chunks.len(), 3);
        assert!(chunks.iter().all(|c| c.chars().count() == 10));
    }
}
