//! Outgoing mail: template rendering and delivery.
//!
//! Delivery goes through the [`Mailer`] trait so the transport (SMTP relay,
//! on-disk spool, or log only) is picked from config and can be swapped out
//! in tests.

use async_trait::async_trait;
use lettre::{
    AsyncFileTransport, AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{Mailbox, header::ContentType},
    transport::smtp::authentication::Credentials,
};
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

use crate::config::{EmailConfig, EmailTransportKind};
use crate::models::user::User;

const RESET_PASSWORD_TEMPLATE: &str = include_str!("../../templates/reset_password.html");
const WELCOME_TEMPLATE: &str = include_str!("../../templates/welcome.html");

#[derive(Debug, Error)]
pub enum EmailError {
    #[error("Invalid email address: {0}")]
    Address(String),

    #[error("Failed to build email: {0}")]
    Build(String),

    #[error("Failed to deliver email: {0}")]
    Transport(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingEmail {
    pub to_email: String,
    pub to_name: Option<String>,
    pub subject: String,
    pub html_body: String,
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, email: OutgoingEmail) -> Result<(), EmailError>;
}

enum EmailTransport {
    Smtp(AsyncSmtpTransport<Tokio1Executor>),
    File(AsyncFileTransport<Tokio1Executor>),
    Log,
}

/// [`Mailer`] backed by lettre.
pub struct LettreMailer {
    transport: EmailTransport,
    from: Mailbox,
}

impl LettreMailer {
    pub fn from_config(config: &EmailConfig) -> Result<Self, EmailError> {
        let transport = match config.transport {
            EmailTransportKind::Smtp => {
                if !config.smtp_tls {
                    warn!("SMTP TLS is disabled - this is not recommended for production");
                }

                let builder = if config.smtp_tls {
                    AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)
                        .map_err(|e| EmailError::Transport(format!("create SMTP transport: {e}")))?
                } else {
                    AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&config.smtp_host)
                };

                let mut builder = builder.port(config.smtp_port);
                if !config.smtp_username.is_empty() {
                    builder = builder.credentials(Credentials::new(
                        config.smtp_username.clone(),
                        config.smtp_password.clone(),
                    ));
                }

                EmailTransport::Smtp(builder.build())
            }
            EmailTransportKind::File => {
                let dir = Path::new(&config.file_path);
                std::fs::create_dir_all(dir).map_err(|e| {
                    EmailError::Transport(format!("create email directory {}: {e}", dir.display()))
                })?;
                EmailTransport::File(AsyncFileTransport::<Tokio1Executor>::new(dir))
            }
            EmailTransportKind::Log => EmailTransport::Log,
        };

        let from = format!("{} <{}>", config.from_name, config.from_email)
            .parse::<Mailbox>()
            .map_err(|e| EmailError::Address(format!("from address: {e}")))?;

        Ok(Self { transport, from })
    }
}

#[async_trait]
impl Mailer for LettreMailer {
    async fn send(&self, email: OutgoingEmail) -> Result<(), EmailError> {
        if matches!(self.transport, EmailTransport::Log) {
            info!(
                to = %email.to_email,
                subject = %email.subject,
                "Email transport is log-only; message not delivered"
            );
            return Ok(());
        }

        let to = match &email.to_name {
            Some(name) => format!("{name} <{}>", email.to_email),
            None => email.to_email.clone(),
        }
        .parse::<Mailbox>()
        .map_err(|e| EmailError::Address(format!("{}: {e}", email.to_email)))?;

        let message = Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(email.subject)
            .header(ContentType::TEXT_HTML)
            .body(email.html_body)
            .map_err(|e| EmailError::Build(e.to_string()))?;

        match &self.transport {
            EmailTransport::Smtp(smtp) => {
                smtp.send(message)
                    .await
                    .map_err(|e| EmailError::Transport(format!("SMTP: {e}")))?;
            }
            EmailTransport::File(file) => {
                file.send(message)
                    .await
                    .map_err(|e| EmailError::Transport(format!("file: {e}")))?;
            }
            EmailTransport::Log => {}
        }

        Ok(())
    }
}

/// Replaces `{{key}}` placeholders, HTML-escaping every value.
#[must_use]
pub fn render_template(template: &str, vars: &[(&str, &str)]) -> String {
    vars.iter().fold(template.to_string(), |acc, (key, value)| {
        acc.replace(
            &format!("{{{{{key}}}}}"),
            &html_escape::encode_double_quoted_attribute(value),
        )
    })
}

/// Notification emails sent on behalf of the user service.
pub struct EmailService {
    mailer: Arc<dyn Mailer>,
    frontend_url: String,
}

impl EmailService {
    #[must_use]
    pub fn new(mailer: Arc<dyn Mailer>, frontend_url: impl Into<String>) -> Self {
        Self {
            mailer,
            frontend_url: frontend_url.into().trim_end_matches('/').to_string(),
        }
    }

    #[must_use]
    pub fn reset_link(&self, token: &str) -> String {
        format!("{}/reset-password?token={token}", self.frontend_url)
    }

    pub async fn send_password_reset(
        &self,
        user: &User,
        token: &str,
        expires_minutes: i64,
    ) -> Result<(), EmailError> {
        let name = user.full_name();
        let link = self.reset_link(token);
        let minutes = expires_minutes.to_string();

        let html_body = render_template(
            RESET_PASSWORD_TEMPLATE,
            &[
                ("name", &name),
                ("reset_link", &link),
                ("expires_minutes", &minutes),
            ],
        );

        self.mailer
            .send(OutgoingEmail {
                to_email: user.email.clone(),
                to_name: Some(name),
                subject: "Password Reset Request".to_string(),
                html_body,
            })
            .await
    }

    pub async fn send_welcome(&self, user: &User) -> Result<(), EmailError> {
        let name = user.full_name();
        let login_link = format!("{}/login", self.frontend_url);

        let html_body = render_template(
            WELCOME_TEMPLATE,
            &[
                ("name", &name),
                ("email", &user.email),
                ("login_link", &login_link),
            ],
        );

        self.mailer
            .send(OutgoingEmail {
                to_email: user.email.clone(),
                to_name: Some(name),
                subject: "Welcome!".to_string(),
                html_body,
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::user::UserRole;
    use tokio::sync::Mutex;

    #[derive(Default)]
    struct CapturingMailer {
        sent: Mutex<Vec<OutgoingEmail>>,
    }

    #[async_trait]
    impl Mailer for CapturingMailer {
        async fn send(&self, email: OutgoingEmail) -> Result<(), EmailError> {
            self.sent.lock().await.push(email);
            Ok(())
        }
    }

    fn user() -> User {
        User {
            id: 7,
            email: "ada@example.com".to_string(),
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            role: UserRole::User,
            is_active: true,
            created_at: String::new(),
            updated_at: String::new(),
        }
    }

    #[test]
    fn test_render_template_escapes_values() {
        let html = render_template("<p>{{name}}</p>", &[("name", "<script>")]);
        assert_eq!(html, "<p>&lt;script&gt;</p>");
    }

    #[test]
    fn test_render_template_leaves_unknown_placeholders() {
        let html = render_template("{{a}} {{b}}", &[("a", "1")]);
        assert_eq!(html, "1 {{b}}");
    }

    #[tokio::test]
    async fn test_password_reset_email_contains_link() {
        let mailer = Arc::new(CapturingMailer::default());
        let service = EmailService::new(mailer.clone(), "https://app.example.com/");

        service
            .send_password_reset(&user(), "tok123", 60)
            .await
            .unwrap();

        let sent = mailer.sent.lock().await;
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to_email, "ada@example.com");
        assert!(
            sent[0]
                .html_body
                .contains("https://app.example.com/reset-password?token=tok123")
        );
        assert!(sent[0].html_body.contains("Ada Lovelace"));
        assert!(sent[0].html_body.contains("60 minutes"));
    }

    #[tokio::test]
    async fn test_welcome_email() {
        let mailer = Arc::new(CapturingMailer::default());
        let service = EmailService::new(mailer.clone(), "https://app.example.com");

        service.send_welcome(&user()).await.unwrap();

        let sent = mailer.sent.lock().await;
        assert_eq!(sent[0].subject, "Welcome!");
        assert!(sent[0].html_body.contains("https://app.example.com/login"));
    }

    #[tokio::test]
    async fn test_file_transport_writes_message() {
        let dir = std::env::temp_dir().join(format!("compatd-mail-{}", uuid::Uuid::new_v4()));
        let config = EmailConfig {
            transport: EmailTransportKind::File,
            file_path: dir.to_string_lossy().to_string(),
            ..Default::default()
        };

        let mailer = LettreMailer::from_config(&config).unwrap();
        mailer
            .send(OutgoingEmail {
                to_email: "ada@example.com".to_string(),
                to_name: None,
                subject: "Hi".to_string(),
                html_body: "<p>hi</p>".to_string(),
            })
            .await
            .unwrap();

        let written = std::fs::read_dir(&dir).unwrap().count();
        assert_eq!(written, 1);
        std::fs::remove_dir_all(&dir).ok();
    }
}
