//! Daily trigger for the alert dispatcher.

use std::sync::Arc;

use chrono::{DateTime, Duration, NaiveTime, Utc};
use tokio::sync::watch;
use tracing::{error, info};

use crate::alerts::dispatcher::AlertDispatcher;

/// A UTC wall-clock time at which the dispatcher runs once a day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DailySchedule {
    at: NaiveTime,
}

impl DailySchedule {
    /// Parses `HH:MM`.
    pub fn parse(raw: &str) -> Result<Self, String> {
        NaiveTime::parse_from_str(raw.trim(), "%H:%M")
            .map(|at| Self { at })
            .map_err(|e| format!("invalid daily time '{raw}' (expected HH:MM): {e}"))
    }

    /// The first scheduled instant strictly after `now`.
    pub fn next_after(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        let today = now.date_naive().and_time(self.at).and_utc();
        if today > now {
            today
        } else {
            today + Duration::days(1)
        }
    }
}

/// Sleeps until each scheduled instant and runs one dispatch to completion.
/// A single loop means ticks never overlap. Returns once `shutdown` flips.
pub async fn run(
    dispatcher: Arc<AlertDispatcher>,
    schedule: DailySchedule,
    mut shutdown: watch::Receiver<bool>,
) {
    loop {
        let now = Utc::now();
        let next = schedule.next_after(now);
        let wait = (next - now).to_std().unwrap_or_default();
        info!(next_run = %next, "alert dispatch scheduled");

        tokio::select! {
            _ = tokio::time::sleep(wait) => {
                if let Err(e) = dispatcher.run_daily_dispatch(next).await {
                    error!("alert dispatch failed: {e}");
                }
            }
            _ = shutdown.changed() => {
                info!("alert scheduler stopping");
                return;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_parse() {
        assert!(DailySchedule::parse("09:00").is_ok());
        assert!(DailySchedule::parse("23:59").is_ok());
        assert!(DailySchedule::parse("25:00").is_err());
        assert!(DailySchedule::parse("nine").is_err());
    }

    #[test]
    fn test_next_after_later_today() {
        let schedule = DailySchedule::parse("09:00").unwrap();
        let now = Utc.with_ymd_and_hms(2025, 9, 3, 8, 30, 0).unwrap();
        assert_eq!(
            schedule.next_after(now),
            Utc.with_ymd_and_hms(2025, 9, 3, 9, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_next_after_rolls_to_tomorrow() {
        let schedule = DailySchedule::parse("09:00").unwrap();
        let at_nine = Utc.with_ymd_and_hms(2025, 9, 3, 9, 0, 0).unwrap();
        assert_eq!(
            schedule.next_after(at_nine),
            Utc.with_ymd_and_hms(2025, 9, 4, 9, 0, 0).unwrap()
        );
    }

    #[tokio::test]
    async fn test_run_stops_on_shutdown() {
        use crate::alerts::dispatcher::{AlertStore, DispatchSettings};
        use crate::models::alert::AlertWithOwner;
        use crate::models::listing::JobListing;
        use crate::notifications::testing::RecordingNotifier;

        struct EmptyStore;

        #[async_trait::async_trait]
        impl AlertStore for EmptyStore {
            async fn active_alerts(&self) -> Result<Vec<AlertWithOwner>, sqlx::Error> {
                Ok(vec![])
            }
            async fn open_listings(&self, _: DateTime<Utc>) -> Result<Vec<JobListing>, sqlx::Error> {
                Ok(vec![])
            }
            async fn mark_sent(&self, _: i64, _: DateTime<Utc>) -> Result<(), sqlx::Error> {
                Ok(())
            }
        }

        let dispatcher = Arc::new(AlertDispatcher::new(
            Arc::new(EmptyStore),
            Arc::new(RecordingNotifier::default()),
            DispatchSettings::default(),
        ));
        let (tx, rx) = watch::channel(false);
        let handle = tokio::spawn(run(dispatcher, DailySchedule::parse("09:00").unwrap(), rx));

        tx.send(true).unwrap();
        tokio::time::timeout(std::time::Duration::from_secs(5), handle)
            .await
            .expect("scheduler did not stop")
            .unwrap();
    }
}
