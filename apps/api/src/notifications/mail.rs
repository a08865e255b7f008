use anyhow::Context;
use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Address, Message, SmtpTransport, Transport};

use crate::config::MailConfig;
use crate::notifications::{NotificationPayload, Notifier, NotifyError, Recipient};

/// Plain-text mail channel over SMTP.
pub struct MailNotifier {
    mailer: SmtpTransport,
    from: Mailbox,
    app_url: String,
}

impl MailNotifier {
    pub fn new(config: &MailConfig, app_url: &str) -> anyhow::Result<Self> {
        let from = config
            .from
            .parse::<Mailbox>()
            .with_context(|| format!("MAIL_FROM is not a valid mailbox: {}", config.from))?;
        let creds = Credentials::new(config.smtp_username.clone(), config.smtp_password.clone());
        let mailer = SmtpTransport::relay(&config.smtp_host)
            .with_context(|| format!("Invalid SMTP relay host: {}", config.smtp_host))?
            .credentials(creds)
            .build();

        Ok(Self {
            mailer,
            from,
            app_url: app_url.trim_end_matches('/').to_string(),
        })
    }
}

/// Renders `(subject, body)` for a payload.
pub fn render(payload: &NotificationPayload, recipient_name: &str, app_url: &str) -> (String, String) {
    let mut body = format!("Hello {recipient_name},\n\n");
    for line in payload.body_lines() {
        body.push_str(&line);
        body.push('\n');
    }
    if let Some(path) = payload.action_path() {
        body.push('\n');
        body.push_str(app_url);
        body.push_str(&path);
        body.push('\n');
    }
    (payload.subject(), body)
}

#[async_trait]
impl Notifier for MailNotifier {
    async fn send(&self, to: &Recipient, payload: &NotificationPayload) -> Result<(), NotifyError> {
        let (subject, body) = render(payload, &to.name, &self.app_url);
        let address = to
            .email
            .parse::<Address>()
            .map_err(|e| NotifyError::Mail(e.to_string()))?;
        let to_mailbox = Mailbox::new(Some(to.name.clone()), address);

        let email = Message::builder()
            .from(self.from.clone())
            .to(to_mailbox)
            .subject(subject)
            .header(ContentType::TEXT_PLAIN)
            .body(body)
            .map_err(|e| NotifyError::Mail(e.to_string()))?;

        let mailer = self.mailer.clone();
        tokio::task::spawn_blocking(move || mailer.send(&email))
            .await
            .map_err(|e| NotifyError::Transport(e.to_string()))?
            .map_err(|e| NotifyError::Transport(e.to_string()))?;

        tracing::debug!(user_id = to.user_id, kind = payload.kind(), "mail sent");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::application::ApplicationStatus;

    #[test]
    fn test_render_includes_greeting_lines_and_link() {
        let payload = NotificationPayload::JobApproved {
            job_listing_id: 12,
            job_title: "Backend Engineer".to_string(),
        };
        let (subject, body) = render(&payload, "Bob", "https://jobs.example.com");

        assert_eq!(subject, "Your job listing has been approved");
        assert!(body.starts_with("Hello Bob,\n\n"));
        assert!(body.contains("\"Backend Engineer\" has been approved"));
        assert!(body.ends_with("https://jobs.example.com/jobs/12\n"));
    }

    #[test]
    fn test_render_without_action_has_no_link() {
        let payload = NotificationPayload::JobRejected {
            job_listing_id: 12,
            job_title: "Dev".to_string(),
            rejection_reason: "Missing salary".to_string(),
        };
        let (_, body) = render(&payload, "Bob", "https://jobs.example.com");
        assert!(body.ends_with("Reason: Missing salary\n"));
        assert!(!body.contains("https://"));
    }

    #[test]
    fn test_status_update_subject_names_the_job() {
        let payload = NotificationPayload::ApplicationStatusUpdated {
            application_id: 1,
            job_title: "Dev".to_string(),
            status: ApplicationStatus::Hired,
        };
        let (subject, body) = render(&payload, "Eve", "http://localhost");
        assert_eq!(subject, "Update on your application for Dev");
        assert!(body.contains("updated to: hired"));
    }
}
