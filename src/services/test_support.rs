//! Shared fixtures for service tests.

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::config::{AuthConfig, SecurityConfig};
use crate::db::Store;
use crate::services::auth_service::AuthService;
use crate::services::email::{EmailError, Mailer, OutgoingEmail};

pub async fn store() -> Store {
    Store::new("sqlite::memory:")
        .await
        .expect("in-memory store should open")
}

pub fn auth() -> AuthService {
    AuthService::new(
        &AuthConfig {
            jwt_secret: "test-secret".to_string(),
            ..Default::default()
        },
        SecurityConfig {
            argon2_memory_cost_kib: 1024,
            argon2_time_cost: 1,
            argon2_parallelism: 1,
        },
    )
}

#[derive(Default)]
pub struct RecordingMailer {
    sent: Mutex<Vec<OutgoingEmail>>,
}

impl RecordingMailer {
    pub async fn sent(&self) -> Vec<OutgoingEmail> {
        self.sent.lock().await.clone()
    }

    pub async fn clear(&self) {
        self.sent.lock().await.clear();
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, email: OutgoingEmail) -> Result<(), EmailError> {
        self.sent.lock().await.push(email);
        Ok(())
    }
}

/// Pulls the token out of a rendered reset email.
pub fn reset_token_from(html: &str) -> String {
    let start = html.find("token=").expect("reset link present") + "token=".len();
    html[start..]
        .chars()
        .take_while(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
        .collect()
}
