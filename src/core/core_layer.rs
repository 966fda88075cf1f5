// The core module contains all business logic.
// Each feature gets its own submodule.

#[path = "ai/mod.rs"]
pub mod ai;

#[path = "headaches/mod.rs"]
pub mod headaches;

#[path = "reminders/reminder_service.rs"]
pub mod reminders;
