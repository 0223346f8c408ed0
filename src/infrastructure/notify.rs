//! Outbound notifications for new form submissions.

use std::sync::Arc;

use async_trait::async_trait;
use derive_more::Display;
use lettre::{
    message::{header::ContentType, Mailbox},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};

use crate::{entities::submission::Submission, settings::AppConfig};

#[derive(Debug, Display)]
pub enum NotifyError {
    #[display("Invalid address: {_0}")]
    InvalidAddress(String),

    #[display("Failed to build message: {_0}")]
    Build(String),

    #[display("Failed to send message: {_0}")]
    Transport(String),
}

impl std::error::Error for NotifyError {}

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify_submission(&self, submission: &Submission) -> Result<(), NotifyError>;

    fn name(&self) -> &'static str;
}

/// Emails the configured inbox through SMTP (STARTTLS).
pub struct SmtpNotifier {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    to: Mailbox,
}

impl SmtpNotifier {
    pub fn new(
        host: &str,
        port: u16,
        credentials: Option<(String, String)>,
        from: &str,
        to: &str,
    ) -> Result<Self, NotifyError> {
        let from: Mailbox = from
            .parse()
            .map_err(|e| NotifyError::InvalidAddress(format!("from '{}': {}", from, e)))?;
        let to: Mailbox = to
            .parse()
            .map_err(|e| NotifyError::InvalidAddress(format!("to '{}': {}", to, e)))?;

        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host)
            .map_err(|e| NotifyError::Transport(e.to_string()))?
            .port(port);

        if let Some((username, password)) = credentials {
            builder = builder.credentials(Credentials::new(username, password));
        }

        Ok(SmtpNotifier {
            mailer: builder.build(),
            from,
            to,
        })
    }
}

#[async_trait]
impl Notifier for SmtpNotifier {
    async fn notify_submission(&self, submission: &Submission) -> Result<(), NotifyError> {
        let mut builder = Message::builder()
            .from(self.from.clone())
            .to(self.to.clone())
            .subject(subject_line(submission));

        if let Ok(reply_to) = submission.email.parse::<Mailbox>() {
            builder = builder.reply_to(reply_to);
        }

        let email = builder
            .header(ContentType::TEXT_PLAIN)
            .body(render_body(submission))
            .map_err(|e| NotifyError::Build(e.to_string()))?;

        self.mailer
            .send(email)
            .await
            .map_err(|e| NotifyError::Transport(e.to_string()))?;

        tracing::info!(submission_id = %submission.id, kind = %submission.kind, "Submission notification sent");
        Ok(())
    }

    fn name(&self) -> &'static str {
        "smtp"
    }
}

/// Used when SMTP is not configured: records the event in the log only.
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify_submission(&self, submission: &Submission) -> Result<(), NotifyError> {
        tracing::info!(
            submission_id = %submission.id,
            kind = %submission.kind,
            "New submission received (email notifications not configured)"
        );
        Ok(())
    }

    fn name(&self) -> &'static str {
        "log"
    }
}

pub fn subject_line(submission: &Submission) -> String {
    match (&submission.company, submission.kind.as_str()) {
        (Some(company), "onboarding") => format!("New onboarding request: {}", company),
        (_, "onboarding") => format!("New onboarding request from {}", submission.name),
        _ => match &submission.subject {
            Some(subject) => format!("New contact message: {}", subject),
            None => format!("New contact message from {}", submission.name),
        },
    }
}

pub fn render_body(submission: &Submission) -> String {
    let mut lines = vec![
        format!("Type: {}", submission.kind),
        format!("Name: {}", submission.name),
        format!("Email: {}", submission.email),
    ];

    if let Some(phone) = &submission.phone {
        lines.push(format!("Phone: {}", phone));
    }
    if let Some(company) = &submission.company {
        lines.push(format!("Company: {}", company));
    }
    if let Some(subject) = &submission.subject {
        lines.push(format!("Subject: {}", subject));
    }
    if let Some(details) = submission.details.as_object() {
        for (key, value) in details.iter().filter(|(_, v)| !v.is_null()) {
            let value = value.as_str().map(str::to_string).unwrap_or_else(|| value.to_string());
            lines.push(format!("{}: {}", key, value));
        }
    }
    if let Some(message) = &submission.message {
        lines.push(String::new());
        lines.push(message.clone());
    }

    lines.push(String::new());
    lines.push(format!("Submission id: {}", submission.id));
    lines.join("\n")
}

/// SMTP when host, sender and recipient are all configured, otherwise the
/// log-only notifier.
pub fn create_notifier(config: &AppConfig) -> Arc<dyn Notifier> {
    let (Some(host), Some(from), Some(to)) = (
        config.smtp_host.as_deref(),
        config.smtp_from.as_deref(),
        config.notification_email.as_deref(),
    ) else {
        tracing::warn!("SMTP not configured; submission notifications will only be logged");
        return Arc::new(LogNotifier);
    };

    let credentials = config.smtp_username.clone().zip(config.smtp_password.clone());

    match SmtpNotifier::new(host, config.smtp_port, credentials, from, to) {
        Ok(notifier) => {
            tracing::info!(host = %host, port = config.smtp_port, "Email notifier initialized");
            Arc::new(notifier)
        }
        Err(e) => {
            tracing::error!(error = %e, "Invalid SMTP configuration; falling back to log notifier");
            Arc::new(LogNotifier)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    use crate::entities::submission::{SubmissionKind, SubmissionStatus};

    fn onboarding() -> Submission {
        Submission {
            id: Uuid::new_v4(),
            kind: SubmissionKind::Onboarding,
            status: SubmissionStatus::New,
            name: "Amira".into(),
            email: "amira@example.com".into(),
            phone: None,
            company: Some("Dubai Café".into()),
            subject: None,
            message: Some("We have three branches.".into()),
            details: serde_json::json!({"businessType": "restaurant", "locations": 3, "monthlyCustomers": null}),
            ip_address: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn onboarding_subject_names_the_business() {
        assert_eq!(subject_line(&onboarding()), "New onboarding request: Dubai Café");
    }

    #[test]
    fn body_lists_details_and_skips_nulls() {
        let body = render_body(&onboarding());
        assert!(body.contains("businessType: restaurant"));
        assert!(body.contains("locations: 3"));
        assert!(!body.contains("monthlyCustomers"));
        assert!(body.contains("We have three branches."));
    }

    #[test]
    fn missing_smtp_config_falls_back_to_log_notifier() {
        let notifier = create_notifier(&AppConfig::default());
        assert_eq!(notifier.name(), "log");
    }
}
