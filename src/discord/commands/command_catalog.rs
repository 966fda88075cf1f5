// Discord commands module.
// Each feature gets its own command file.

pub mod headaches;

pub mod reminders;

pub mod status;

// Bot presence management
pub mod presence;

use crate::discord::{Data, Error};

/// Every slash command the bot registers.
pub fn all() -> Vec<poise::Command<Data, Error>> {
    vec![
        headaches::ask(),
        headaches::refresh(),
        status::status(),
        status::ping(),
        reminders::remindtest(),
    ]
}
