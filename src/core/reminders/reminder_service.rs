// Daily check-in reminder timing.
//
// Decides WHEN the reminder is due in the user's local timezone and remembers
// whether today's reminder already went out. Sending it is the Discord
// layer's job.

use chrono::{DateTime, NaiveDate, Timelike, Utc};
use chrono_tz::Tz;
use tokio::sync::RwLock;

pub const DEFAULT_TIMEZONE: &str = "America/Denver";
pub const DEFAULT_REMINDER_HOUR: u32 = 21;
pub const DEFAULT_REMINDER_MINUTE: u32 = 40;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ReminderConfigError {
    #[error("Unknown timezone '{0}'")]
    UnknownTimezone(String),

    #[error("Invalid reminder time {hour:02}:{minute:02}")]
    InvalidTime { hour: u32, minute: u32 },
}

#[derive(Debug, Clone)]
pub struct ReminderConfig {
    pub timezone: Tz,
    pub hour: u32,
    pub minute: u32,
    pub form_link: String,
}

impl ReminderConfig {
    pub fn new(
        timezone: &str,
        hour: u32,
        minute: u32,
        form_link: String,
    ) -> Result<Self, ReminderConfigError> {
        let timezone: Tz = timezone
            .parse()
            .map_err(|_| ReminderConfigError::UnknownTimezone(timezone.to_string()))?;
        if hour > 23 || minute > 59 {
            return Err(ReminderConfigError::InvalidTime { hour, minute });
        }
        Ok(Self {
            timezone,
            hour,
            minute,
            form_link,
        })
    }
}

pub struct ReminderStatus {
    pub local_time: String,
    pub reminder_time: String,
    pub sent_today: bool,
}

pub struct ReminderService {
    config: ReminderConfig,
    last_sent: RwLock<Option<NaiveDate>>,
}

impl ReminderService {
    pub fn new(config: ReminderConfig) -> Self {
        Self {
            config,
            last_sent: RwLock::new(None),
        }
    }

    fn local(&self, now: DateTime<Utc>) -> DateTime<Tz> {
        now.with_timezone(&self.config.timezone)
    }

    /// True during the configured minute if nothing was sent today.
    pub async fn is_due(&self, now: DateTime<Utc>) -> bool {
        let local = self.local(now);
        local.hour() == self.config.hour
            && local.minute() == self.config.minute
            && *self.last_sent.read().await != Some(local.date_naive())
    }

    /// Records that today's (local) reminder went out.
    pub async fn mark_sent(&self, now: DateTime<Utc>) {
        *self.last_sent.write().await = Some(self.local(now).date_naive());
    }

    pub fn reminder_message(&self) -> String {
        format!(
            "**Daily Headache Check-In**\n\n\
             Time to log today's headache data.\n\n\
             Fill out today's form here:\n{}\n\n\
             Thanks for tracking your health!",
            self.config.form_link
        )
    }

    pub async fn status(&self, now: DateTime<Utc>) -> ReminderStatus {
        let local = self.local(now);
        ReminderStatus {
            local_time: local.format("%Y-%m-%d %I:%M %p %Z").to_string(),
            reminder_time: format!(
                "{:02}:{:02} ({})",
                self.config.hour,
                self.config.minute,
                self.config.timezone.name()
            ),
            sent_today: *self.last_sent.read().await == Some(local.date_naive()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn service() -> ReminderService {
        let config = ReminderConfig::new(
            DEFAULT_TIMEZONE,
            DEFAULT_REMINDER_HOUR,
            DEFAULT_REMINDER_MINUTE,
            "https://forms.example/checkin".to_string(),
        )
        .unwrap();
        ReminderService::new(config)
    }

    /// Builds a UTC instant from a Denver wall-clock time.
    fn denver(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
        chrono_tz::America::Denver
            .with_ymd_and_hms(y, m, d, h, min, 0)
            .unwrap()
            .with_timezone(&Utc)
    }

    #[tokio::test]
    async fn test_due_only_at_configured_local_minute() {
        let service = service();
        assert!(service.is_due(denver(2024, 3, 1, 21, 40)).await);
        assert!(!service.is_due(denver(2024, 3, 1, 21, 41)).await);
        assert!(!service.is_due(denver(2024, 3, 1, 9, 40)).await);
    }

    #[tokio::test]
    async fn test_fires_once_per_local_day() {
        let service = service();
        let now = denver(2024, 3, 1, 21, 40);

        assert!(service.is_due(now).await);
        service.mark_sent(now).await;
        assert!(!service.is_due(now).await);
        assert!(service.status(now).await.sent_today);

        assert!(service.is_due(denver(2024, 3, 2, 21, 40)).await);
    }

    #[tokio::test]
    async fn test_local_date_used_across_utc_midnight() {
        let service = service();
        // 21:40 in Denver is already the next day in UTC.
        let now = denver(2024, 3, 1, 21, 40);
        service.mark_sent(now).await;
        let status = service.status(now).await;
        assert!(status.local_time.starts_with("2024-03-01"));
        assert!(status.sent_today);
    }

    #[tokio::test]
    async fn test_mark_sent_suppresses_todays_reminder() {
        let service = service();
        service.mark_sent(denver(2024, 3, 1, 8, 0)).await;
        assert!(!service.is_due(denver(2024, 3, 1, 21, 40)).await);
    }

    #[test]
    fn test_invalid_config_rejected() {
        assert_eq!(
            ReminderConfig::new("Mars/Olympus", 21, 40, String::new()).unwrap_err(),
            ReminderConfigError::UnknownTimezone("Mars/Olympus".to_string())
        );
        assert_eq!(
            ReminderConfig::new("UTC", 24, 0, String::new()).unwrap_err(),
            ReminderConfigError::InvalidTime { hour: 24, minute: 0 }
        );
    }

    #[test]
    fn test_message_contains_form_link() {
        assert!(service()
            .reminder_message()
            .contains("https://forms.example/checkin"));
    }
}
