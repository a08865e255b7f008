//! Daily job-alert dispatch.
//!
//! For every active alert: match the listings created since its watermark
//! (`last_sent_at`, or the lookback window for a fresh alert), notify the
//! owner, then advance the watermark to the tick time. Delivery is
//! at-least-once; a crash between notify and stamp re-sends next tick.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use tracing::{error, info, warn};

use crate::config::Config;
use crate::errors::AppError;
use crate::matching::filter::{self, Sort};
use crate::models::alert::{AlertWithOwner, JobAlert};
use crate::models::listing::JobListing;
use crate::notifications::{NotificationPayload, Notifier, NotifyError};

/// Persistence the dispatcher needs.
#[async_trait]
pub trait AlertStore: Send + Sync {
    async fn active_alerts(&self) -> Result<Vec<AlertWithOwner>, sqlx::Error>;
    async fn open_listings(&self, now: DateTime<Utc>) -> Result<Vec<JobListing>, sqlx::Error>;
    async fn mark_sent(&self, alert_id: i64, at: DateTime<Utc>) -> Result<(), sqlx::Error>;
}

#[derive(Debug, Clone, Copy)]
pub struct DispatchSettings {
    /// Window searched for alerts that have never been sent.
    pub lookback: Duration,
    /// Matches considered per alert per tick, newest first.
    pub max_matches: usize,
    /// Listings included in the notification payload.
    pub sample_size: usize,
}

impl Default for DispatchSettings {
    fn default() -> Self {
        Self {
            lookback: Duration::days(7),
            max_matches: 10,
            sample_size: 5,
        }
    }
}

impl DispatchSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            lookback: Duration::days(config.alerts_lookback_days),
            ..Self::default()
        }
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DispatchReport {
    pub alerts_checked: usize,
    pub notified: usize,
    pub skipped: usize,
    pub failed: usize,
}

#[derive(Debug, thiserror::Error)]
enum AlertFailure {
    #[error("notification failed: {0}")]
    Notify(#[from] NotifyError),
    #[error("could not advance watermark: {0}")]
    Stamp(#[from] sqlx::Error),
}

enum Outcome {
    Notified(usize),
    NoMatches,
}

#[derive(Debug, Clone, Serialize)]
pub struct AlertTestResult {
    pub matching_jobs_count: usize,
    pub jobs: Vec<JobListing>,
}

pub struct AlertDispatcher {
    store: Arc<dyn AlertStore>,
    notifier: Arc<dyn Notifier>,
    settings: DispatchSettings,
}

impl AlertDispatcher {
    pub fn new(store: Arc<dyn AlertStore>, notifier: Arc<dyn Notifier>, settings: DispatchSettings) -> Self {
        Self {
            store,
            notifier,
            settings,
        }
    }

    /// Runs one tick. Only loading the alerts or listings can fail the whole
    /// run; a failing alert is logged, counted and skipped.
    pub async fn run_daily_dispatch(&self, tick: DateTime<Utc>) -> Result<DispatchReport, AppError> {
        let listings = self.store.open_listings(tick).await?;
        let alerts = self.store.active_alerts().await?;

        let mut report = DispatchReport::default();
        for entry in alerts.iter().filter(|a| a.alert.is_active) {
            report.alerts_checked += 1;
            match self.dispatch_alert(entry, &listings, tick).await {
                Ok(Outcome::Notified(count)) => {
                    info!(alert_id = entry.alert.id, user_id = entry.alert.user_id, matches = count, "job alert sent");
                    report.notified += 1;
                }
                Ok(Outcome::NoMatches) => report.skipped += 1,
                Err(AlertFailure::Notify(e)) => {
                    warn!(alert_id = entry.alert.id, "skipping alert: {e}");
                    report.failed += 1;
                }
                Err(e @ AlertFailure::Stamp(_)) => {
                    error!(alert_id = entry.alert.id, "alert notified but {e}");
                    report.failed += 1;
                }
            }
        }

        info!(
            tick = %tick,
            checked = report.alerts_checked,
            notified = report.notified,
            skipped = report.skipped,
            failed = report.failed,
            "alert dispatch finished"
        );
        Ok(report)
    }

    async fn dispatch_alert(
        &self,
        entry: &AlertWithOwner,
        listings: &[JobListing],
        tick: DateTime<Utc>,
    ) -> Result<Outcome, AlertFailure> {
        let matches = self.new_matches(&entry.alert, listings, tick);
        if matches.is_empty() {
            return Ok(Outcome::NoMatches);
        }

        let payload = NotificationPayload::JobAlert {
            alert_id: entry.alert.id,
            jobs_count: matches.len(),
            jobs: matches
                .iter()
                .take(self.settings.sample_size)
                .map(|l| l.summary())
                .collect(),
        };
        self.notifier.send(&entry.recipient(), &payload).await?;
        self.store.mark_sent(entry.alert.id, tick).await?;
        Ok(Outcome::Notified(matches.len()))
    }

    /// Listings created after the alert's watermark, newest first, capped.
    fn new_matches<'a>(
        &self,
        alert: &JobAlert,
        listings: &'a [JobListing],
        tick: DateTime<Utc>,
    ) -> Vec<&'a JobListing> {
        let since = alert
            .last_sent_at
            .unwrap_or(tick - self.settings.lookback);
        let criteria = alert.criteria().normalized().with_since(since);
        let mut matches = filter::search(listings, &criteria, Sort::newest_first(), tick);
        matches.truncate(self.settings.max_matches);
        matches
    }
}

/// Dry run of an alert over every open listing, ignoring its watermark.
pub fn test_alert(
    alert: &JobAlert,
    listings: &[JobListing],
    now: DateTime<Utc>,
    sample_size: usize,
) -> AlertTestResult {
    let criteria = alert.criteria().normalized();
    let matches = filter::search(listings, &criteria, Sort::newest_first(), now);
    AlertTestResult {
        matching_jobs_count: matches.len(),
        jobs: matches.into_iter().take(sample_size).cloned().collect(),
    }
}
