// Bot presence.
//
// Discord-layer glue only: sets the activity line shown under the bot's name.

use poise::serenity_prelude as serenity;

/// Called once the bot is ready so the member list shows what it does.
pub fn on_ready(ctx: &serenity::Context) {
    let activity = serenity::ActivityData::watching("your headache log | /ask");
    ctx.set_presence(Some(activity), serenity::OnlineStatus::Online);
}
