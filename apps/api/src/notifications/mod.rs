pub mod handlers;
pub mod mail;
pub mod store;

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::application::ApplicationStatus;
use crate::models::listing::ListingSummary;

/// Who a notification is addressed to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recipient {
    pub user_id: i64,
    pub name: String,
    pub email: String,
}

/// Structured notification body. Serialised with its `type` tag into the
/// in-app store and rendered to text for mail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NotificationPayload {
    JobAlert {
        alert_id: i64,
        jobs_count: usize,
        jobs: Vec<ListingSummary>,
    },
    NewJobListing {
        job_listing_id: i64,
        job_title: String,
        company_name: String,
    },
    JobApproved {
        job_listing_id: i64,
        job_title: String,
    },
    JobRejected {
        job_listing_id: i64,
        job_title: String,
        rejection_reason: String,
    },
    NewApplication {
        application_id: i64,
        job_listing_id: i64,
        job_title: String,
        candidate_name: String,
    },
    ApplicationStatusUpdated {
        application_id: i64,
        job_title: String,
        status: ApplicationStatus,
    },
}

impl NotificationPayload {
    pub fn kind(&self) -> &'static str {
        match self {
            NotificationPayload::JobAlert { .. } => "job_alert",
            NotificationPayload::NewJobListing { .. } => "new_job_listing",
            NotificationPayload::JobApproved { .. } => "job_approved",
            NotificationPayload::JobRejected { .. } => "job_rejected",
            NotificationPayload::NewApplication { .. } => "new_application",
            NotificationPayload::ApplicationStatusUpdated { .. } => "application_status_updated",
        }
    }

    pub fn subject(&self) -> String {
        match self {
            NotificationPayload::JobAlert { .. } => {
                "New job listings matching your criteria".to_string()
            }
            NotificationPayload::NewJobListing { .. } => {
                "New job listing pending approval".to_string()
            }
            NotificationPayload::JobApproved { .. } => {
                "Your job listing has been approved".to_string()
            }
            NotificationPayload::JobRejected { .. } => {
                "Your job listing has been rejected".to_string()
            }
            NotificationPayload::NewApplication { job_title, .. } => {
                format!("New application for {job_title}")
            }
            NotificationPayload::ApplicationStatusUpdated { job_title, .. } => {
                format!("Update on your application for {job_title}")
            }
        }
    }

    pub fn body_lines(&self) -> Vec<String> {
        match self {
            NotificationPayload::JobAlert {
                jobs_count, jobs, ..
            } => {
                let mut lines = vec![format!(
                    "We found {jobs_count} new listings matching your search criteria."
                )];
                lines.extend(
                    jobs.iter()
                        .map(|job| format!("• {} at {} - {}", job.title, job.company, job.location)),
                );
                if *jobs_count > jobs.len() {
                    lines.push(format!("... and {} more.", jobs_count - jobs.len()));
                }
                lines
            }
            NotificationPayload::NewJobListing {
                job_title,
                company_name,
                ..
            } => vec![
                "A new job listing has been submitted and is pending your approval.".to_string(),
                format!("Job title: {job_title} ({company_name})"),
            ],
            NotificationPayload::JobApproved { job_title, .. } => vec![format!(
                "Your job listing \"{job_title}\" has been approved and is now live."
            )],
            NotificationPayload::JobRejected {
                job_title,
                rejection_reason,
                ..
            } => vec![
                format!("Your job listing \"{job_title}\" has been rejected."),
                format!("Reason: {rejection_reason}"),
            ],
            NotificationPayload::NewApplication {
                job_title,
                candidate_name,
                ..
            } => vec![format!("{candidate_name} applied to \"{job_title}\".")],
            NotificationPayload::ApplicationStatusUpdated { status, .. } => vec![format!(
                "The status of your application has been updated to: {}",
                status.as_str()
            )],
        }
    }

    /// Frontend path linked from mail, relative to `APP_URL`.
    pub fn action_path(&self) -> Option<String> {
        match self {
            NotificationPayload::JobAlert { .. } => Some("/jobs".to_string()),
            NotificationPayload::NewJobListing { job_listing_id, .. } => {
                Some(format!("/admin/jobs/{job_listing_id}/review"))
            }
            NotificationPayload::JobApproved { job_listing_id, .. } => {
                Some(format!("/jobs/{job_listing_id}"))
            }
            NotificationPayload::JobRejected { .. } => None,
            NotificationPayload::NewApplication { application_id, .. } => {
                Some(format!("/recruiter/applications/{application_id}"))
            }
            NotificationPayload::ApplicationStatusUpdated { .. } => {
                Some("/candidate/applications".to_string())
            }
        }
    }
}

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("failed to store notification: {0}")]
    Store(#[from] sqlx::Error),

    #[error("failed to encode notification: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("failed to build mail: {0}")]
    Mail(String),

    #[error("smtp transport failed: {0}")]
    Transport(String),
}

/// A delivery channel for notifications.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, to: &Recipient, payload: &NotificationPayload) -> Result<(), NotifyError>;
}

/// Delivers to every channel in order. The send counts as delivered when
/// at least one channel accepts it; failing channels are logged. Only when
/// every channel fails is the first error returned.
pub struct FanoutNotifier {
    channels: Vec<Arc<dyn Notifier>>,
}

impl FanoutNotifier {
    pub fn new(channels: Vec<Arc<dyn Notifier>>) -> Self {
        Self { channels }
    }
}

#[async_trait]
impl Notifier for FanoutNotifier {
    async fn send(&self, to: &Recipient, payload: &NotificationPayload) -> Result<(), NotifyError> {
        let mut delivered = false;
        let mut first_error = None;
        for channel in &self.channels {
            match channel.send(to, payload).await {
                Ok(()) => delivered = true,
                Err(e) => {
                    tracing::warn!(user_id = to.user_id, kind = payload.kind(), "notification channel failed: {e}");
                    first_error.get_or_insert(e);
                }
            }
        }
        match first_error {
            Some(e) if !delivered => Err(e),
            _ => Ok(()),
        }
    }
}

/// Fire-and-forget delivery for request handlers: a failed notification
/// never fails the request that triggered it.
pub async fn notify_quietly(notifier: &dyn Notifier, to: &Recipient, payload: NotificationPayload) {
    if let Err(e) = notifier.send(to, &payload).await {
        tracing::error!(user_id = to.user_id, kind = payload.kind(), "failed to notify: {e}");
    }
}

#[cfg(test)]
pub mod testing {
    use std::sync::Mutex;

    use super::*;

    /// Records every delivery; fails for the user ids in `fail_for`.
    #[derive(Default)]
    pub struct RecordingNotifier {
        pub sent: Mutex<Vec<(i64, NotificationPayload)>>,
        pub fail_for: Vec<i64>,
    }

    impl RecordingNotifier {
        pub fn failing_for(user_ids: &[i64]) -> Self {
            Self {
                sent: Mutex::new(Vec::new()),
                fail_for: user_ids.to_vec(),
            }
        }

        pub fn sent(&self) -> Vec<(i64, NotificationPayload)> {
            self.sent.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Notifier for RecordingNotifier {
        async fn send(&self, to: &Recipient, payload: &NotificationPayload) -> Result<(), NotifyError> {
            if self.fail_for.contains(&to.user_id) {
                return Err(NotifyError::Transport("connection refused".to_string()));
            }
            self.sent.lock().unwrap().push((to.user_id, payload.clone()));
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::RecordingNotifier;
    use super::*;
    use serde_json::json;

    fn recipient(user_id: i64) -> Recipient {
        Recipient {
            user_id,
            name: "Alice".to_string(),
            email: "alice@example.com".to_string(),
        }
    }

    fn alert_payload(jobs_count: usize) -> NotificationPayload {
        NotificationPayload::JobAlert {
            alert_id: 7,
            jobs_count,
            jobs: vec![ListingSummary {
                id: 1,
                title: "Backend Engineer".to_string(),
                company: "Acme".to_string(),
                location: "Douala".to_string(),
            }],
        }
    }

    #[test]
    fn test_payload_serializes_with_type_tag() {
        let value = serde_json::to_value(alert_payload(1)).unwrap();
        assert_eq!(
            value,
            json!({
                "type": "job_alert",
                "alert_id": 7,
                "jobs_count": 1,
                "jobs": [{"id": 1, "title": "Backend Engineer", "company": "Acme", "location": "Douala"}]
            })
        );
        assert_eq!(value["type"], alert_payload(1).kind());
    }

    #[test]
    fn test_alert_body_mentions_remaining_count() {
        let lines = alert_payload(4).body_lines();
        assert_eq!(lines.first().unwrap(), "We found 4 new listings matching your search criteria.");
        assert_eq!(lines.last().unwrap(), "... and 3 more.");
    }

    #[test]
    fn test_status_payload_round_trips() {
        let payload = NotificationPayload::ApplicationStatusUpdated {
            application_id: 3,
            job_title: "Dev".to_string(),
            status: ApplicationStatus::Shortlisted,
        };
        let value = serde_json::to_value(&payload).unwrap();
        assert_eq!(value["status"], "shortlisted");
        assert_eq!(serde_json::from_value::<NotificationPayload>(value).unwrap(), payload);
    }

    #[tokio::test]
    async fn test_fanout_delivers_when_one_channel_fails() {
        let broken = Arc::new(RecordingNotifier::failing_for(&[1]));
        let healthy = Arc::new(RecordingNotifier::default());
        let fanout = FanoutNotifier::new(vec![
            broken.clone() as Arc<dyn Notifier>,
            healthy.clone() as Arc<dyn Notifier>,
        ]);

        let result = fanout.send(&recipient(1), &alert_payload(1)).await;

        assert!(result.is_ok());
        assert_eq!(healthy.sent().len(), 1);
        assert!(broken.sent().is_empty());
    }

    #[tokio::test]
    async fn test_fanout_fails_when_every_channel_fails() {
        let a = Arc::new(RecordingNotifier::failing_for(&[1]));
        let b = Arc::new(RecordingNotifier::failing_for(&[1]));
        let fanout = FanoutNotifier::new(vec![a as Arc<dyn Notifier>, b]);

        let result = fanout.send(&recipient(1), &alert_payload(1)).await;

        assert!(matches!(result, Err(NotifyError::Transport(_))));
    }

    #[tokio::test]
    async fn test_fanout_succeeds_when_all_channels_do() {
        let a = Arc::new(RecordingNotifier::default());
        let b = Arc::new(RecordingNotifier::default());
        let fanout = FanoutNotifier::new(vec![a.clone() as Arc<dyn Notifier>, b.clone()]);

        fanout.send(&recipient(2), &alert_payload(1)).await.unwrap();
        assert_eq!(a.sent().len(), 1);
        assert_eq!(b.sent().len(), 1);
    }
}
