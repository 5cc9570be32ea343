//! Notification Mail Service
//!
//! Sends acceptance/rejection emails to applicants over SMTP.
//! Delivery failures are logged and reported to the caller as a boolean;
//! they never fail the surrounding request.

use lettre::{
    message::{header::ContentType, Mailbox},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use tracing::{info, warn};

use crate::shared::error::{AdmissionsError, Result};

/// SMTP configuration, usually read from the environment.
#[derive(Debug, Clone, Default)]
pub struct MailConfig {
    /// SMTP relay host; when unset the service runs with delivery disabled
    pub smtp_host: Option<String>,
    pub smtp_username: String,
    pub smtp_password: String,
    /// Sender address, e.g. "admissions@krmu.edu.in"
    pub from_address: String,
}

/// Outbound notification mailer
pub struct MailService {
    transport: Option<AsyncSmtpTransport<Tokio1Executor>>,
    from: Option<Mailbox>,
}

impl MailService {
    pub fn new(config: MailConfig) -> Result<Self> {
        let Some(host) = config.smtp_host else {
            info!("SMTP not configured; notification emails are disabled");
            return Ok(Self {
                transport: None,
                from: None,
            });
        };

        let from = config
            .from_address
            .parse::<Mailbox>()
            .map_err(|e| AdmissionsError::Mail {
                message: format!("Invalid sender address: {}", e),
            })?;

        let transport = AsyncSmtpTransport::<Tokio1Executor>::relay(&host)
            .map_err(|e| AdmissionsError::Mail {
                message: format!("Invalid SMTP relay {}: {}", host, e),
            })?
            .credentials(Credentials::new(config.smtp_username, config.smtp_password))
            .build();

        Ok(Self {
            transport: Some(transport),
            from: Some(from),
        })
    }

    /// Mailer that drops every message (tests, local development).
    pub fn disabled() -> Self {
        Self {
            transport: None,
            from: None,
        }
    }

    /// Send the acceptance notification. Returns whether delivery succeeded.
    pub async fn send_acceptance(&self, to_address: &str, student_name: &str) -> bool {
        let subject = "Congratulations! Your Admission to KRMU";
        let body = format!(
            "<div style=\"font-family: Arial, sans-serif; max-width: 600px; margin: 0 auto;\">\
               <h2>Congratulations {}!</h2>\
               <p>We are pleased to inform you that you have been accepted to KRM University.</p>\
               <p>Complete your enrollment by visiting the student portal, submit any \
               remaining documents and pay your tuition fees.</p>\
               <p><strong>KRM University Admissions Office</strong></p>\
             </div>",
            student_name
        );
        self.send(to_address, subject, body).await
    }

    /// Send the rejection notification. Returns whether delivery succeeded.
    pub async fn send_rejection(&self, to_address: &str, student_name: &str) -> bool {
        let subject = "Admission Update from KRM University";
        let body = format!(
            "<div style=\"font-family: Arial, sans-serif; max-width: 600px; margin: 0 auto;\">\
               <h2>Dear {},</h2>\
               <p>Thank you for your interest in KRM University and for taking the time to apply.</p>\
               <p>After careful consideration of your application, we regret to inform you that \
               we are unable to offer you admission at this time.</p>\
               <p>We encourage you to continue pursuing your academic goals and wish you the \
               very best in your future endeavors.</p>\
               <p><strong>KRM University Admissions Office</strong></p>\
             </div>",
            student_name
        );
        self.send(to_address, subject, body).await
    }

    async fn send(&self, to_address: &str, subject: &str, html_body: String) -> bool {
        let (Some(transport), Some(from)) = (&self.transport, &self.from) else {
            warn!(to = to_address, "mail delivery disabled, skipping notification");
            return false;
        };

        let to = match to_address.parse::<Mailbox>() {
            Ok(mailbox) => mailbox,
            Err(e) => {
                warn!(to = to_address, error = %e, "invalid recipient address");
                return false;
            }
        };

        let message = match Message::builder()
            .from(from.clone())
            .to(to)
            .subject(subject)
            .header(ContentType::TEXT_HTML)
            .body(html_body)
        {
            Ok(message) => message,
            Err(e) => {
                warn!(to = to_address, error = %e, "failed to build notification email");
                return false;
            }
        };

        match transport.send(message).await {
            Ok(_) => {
                info!(to = to_address, subject = subject, "notification email sent");
                true
            }
            Err(e) => {
                warn!(to = to_address, error = %e, "failed to send notification email");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_disabled_mailer_reports_failure() {
        let mailer = MailService::disabled();
        assert!(!mailer.send_acceptance("student@example.com", "Priya").await);
        assert!(!mailer.send_rejection("student@example.com", "Priya").await);
    }

    #[test]
    fn test_invalid_sender_is_rejected() {
        let config = MailConfig {
            smtp_host: Some("smtp.example.com".to_string()),
            smtp_username: "user".to_string(),
            smtp_password: "pass".to_string(),
            from_address: "not a mailbox".to_string(),
        };
        assert!(MailService::new(config).is_err());
    }

    #[test]
    fn test_unconfigured_host_disables_delivery() {
        let service = MailService::new(MailConfig::default()).unwrap();
        assert!(service.transport.is_none());
    }
}
