//! Outbound notifications.
//!
//! [`Mailer`] is the seam between payment validation and mail delivery.
//! [`OutboxMailer`] spools each message as an RFC 5322 `.eml` file (with MIME
//! attachment) for a relay to pick up.

use crate::errors::{Error, Result};
use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chrono::Utc;
use std::fmt::Write as _;
use std::path::PathBuf;
use tracing::info;
use uuid::Uuid;

/// A message to deliver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Email {
    /// Recipient address
    pub to: String,
    /// Subject line
    pub subject: String,
    /// Plain-text body
    pub body: String,
    /// File to attach, if any
    pub attachment: Option<PathBuf>,
}

/// Delivers emails.
#[async_trait]
pub trait Mailer: Send + Sync {
    /// Sends one message.
    ///
    /// # Errors
    /// Returns an error when the message could not be handed over.
    async fn send(&self, email: &Email) -> Result<()>;
}

/// Writes each message to `<dir>/<timestamp>-<uuid>.eml`.
#[derive(Debug, Clone)]
pub struct OutboxMailer {
    from: String,
    dir: PathBuf,
}

impl OutboxMailer {
    /// Creates a spooling mailer.
    #[must_use]
    pub fn new(from: impl Into<String>, dir: impl Into<PathBuf>) -> Self {
        Self {
            from: from.into(),
            dir: dir.into(),
        }
    }

    async fn compose(&self, email: &Email) -> Result<String> {
        let boundary = format!("=_{}", Uuid::new_v4().simple());
        let mut out = String::new();
        let _ = write!(
            out,
            "From: {}\r\nTo: {}\r\nSubject: {}\r\nDate: {}\r\nMIME-Version: 1.0\r\n",
            self.from,
            email.to,
            email.subject,
            Utc::now().to_rfc2822()
        );

        let attachment = match &email.attachment {
            Some(path) => Some((
                path.file_name()
                    .and_then(|n| n.to_str())
                    .unwrap_or("attachment")
                    .to_string(),
                tokio::fs::read(path).await?,
            )),
            None => None,
        };

        match attachment {
            None => {
                let _ = write!(
                    out,
                    "Content-Type: text/plain; charset=utf-8\r\n\
                     Content-Transfer-Encoding: 8bit\r\n\r\n{}\r\n",
                    email.body
                );
            }
            Some((name, bytes)) => {
                let _ = write!(
                    out,
                    "Content-Type: multipart/mixed; boundary=\"{boundary}\"\r\n\r\n\
                     --{boundary}\r\nContent-Type: text/plain; charset=utf-8\r\n\
                     Content-Transfer-Encoding: 8bit\r\n\r\n{}\r\n\
                     --{boundary}\r\nContent-Type: application/octet-stream; name=\"{name}\"\r\n\
                     Content-Disposition: attachment; filename=\"{name}\"\r\n\
                     Content-Transfer-Encoding: base64\r\n\r\n",
                    email.body
                );
                let encoded = STANDARD.encode(bytes);
                for chunk in encoded.as_bytes().chunks(76) {
                    out.push_str(&String::from_utf8_lossy(chunk));
                    out.push_str("\r\n");
                }
                let _ = write!(out, "--{boundary}--\r\n");
            }
        }
        Ok(out)
    }
}

#[async_trait]
impl Mailer for OutboxMailer {
    async fn send(&self, email: &Email) -> Result<()> {
        if email.to.trim().is_empty() {
            return Err(Error::invalid("email", "Recipient has no email address."));
        }
        let message = self.compose(email).await?;
        tokio::fs::create_dir_all(&self.dir).await?;
        let path = self.dir.join(format!(
            "{}-{}.eml",
            Utc::now().format("%Y%m%dT%H%M%S"),
            Uuid::new_v4().simple()
        ));
        tokio::fs::write(&path, message).await?;
        info!(to = %email.to, path = %path.display(), "Mail spooled");
        Ok(())
    }
}
