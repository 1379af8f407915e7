// ==================== EMAIL DELIVERY ====================
// SMTP mailer behind a trait so auth flows can be exercised without a
// live relay. Delivery is synchronous with the request: a failed send
// fails the whole request, nothing is queued or retried.

use crate::config::SmtpConfig;
use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

#[async_trait]
pub trait Mailer: Send + Sync {
    /// Delivers one HTML email. The error string is surfaced to the
    /// caller inside a 502 response.
    async fn send(&self, to: &str, subject: &str, html: &str) -> Result<(), String>;
}

pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: String,
}

impl SmtpMailer {
    pub fn new(config: &SmtpConfig) -> Result<Self, String> {
        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
            .map_err(|e| format!("Invalid SMTP relay: {}", e))?
            .port(config.port)
            .credentials(Credentials::new(config.user.clone(), config.pass.clone()))
            .build();

        Ok(Self {
            transport,
            from: config.from.clone(),
        })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, to: &str, subject: &str, html: &str) -> Result<(), String> {
        let message = Message::builder()
            .from(self.from.parse().map_err(|e| format!("Invalid sender address: {}", e))?)
            .to(to.parse().map_err(|e| format!("Invalid recipient address: {}", e))?)
            .subject(subject)
            .header(ContentType::TEXT_HTML)
            .body(html.to_string())
            .map_err(|e| format!("Failed to build email: {}", e))?;

        match self.transport.send(message).await {
            Ok(_) => {
                log::info!("📧 Email delivered to {}", to);
                Ok(())
            }
            Err(e) => {
                log::error!("❌ SMTP error sending to {}: {}", to, e);
                Err(e.to_string())
            }
        }
    }
}

#[cfg(test)]
pub mod testing {
    use super::*;
    use std::sync::Mutex;

    /// Records sends instead of talking SMTP; can be told to fail.
    pub struct MockMailer {
        pub sent: Mutex<Vec<(String, String, String)>>,
        pub fail_with: Option<String>,
    }

    impl MockMailer {
        pub fn ok() -> Self {
            Self {
                sent: Mutex::new(Vec::new()),
                fail_with: None,
            }
        }

        pub fn failing(reason: &str) -> Self {
            Self {
                sent: Mutex::new(Vec::new()),
                fail_with: Some(reason.to_string()),
            }
        }

        pub fn sent_count(&self) -> usize {
            self.sent.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl Mailer for MockMailer {
        async fn send(&self, to: &str, subject: &str, html: &str) -> Result<(), String> {
            if let Some(reason) = &self.fail_with {
                return Err(reason.clone());
            }
            self.sent
                .lock()
                .unwrap()
                .push((to.to_string(), subject.to_string(), html.to_string()));
            Ok(())
        }
    }
}
