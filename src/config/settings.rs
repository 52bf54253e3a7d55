//! Application settings.
//!
//! Settings come from an optional TOML file (path in `RENTAL_CONFIG`, default
//! `./config.toml`) and are then overridden by environment variables, which
//! `main` loads from `.env` first. Every field has a default so an empty or
//! missing file yields a working development setup.

use crate::errors::{Error, Result};
use serde::Deserialize;
use std::{net::SocketAddr, path::Path, path::PathBuf};
use tracing::{debug, warn};

/// Top-level settings
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct Settings {
    /// HTTP listener settings
    pub server: ServerSettings,
    /// Database settings
    pub database: DatabaseSettings,
    /// Token issuance settings
    pub auth: AuthSettings,
    /// Attachment storage settings
    pub media: MediaSettings,
    /// Outbound mail settings
    pub mail: MailSettings,
    /// Receipt rendering settings
    pub receipt: ReceiptSettings,
}

/// HTTP listener settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    /// Address the API binds to
    pub bind_addr: SocketAddr,
    /// Base URL used to build absolute attachment links
    pub public_base_url: String,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8000)),
            public_base_url: "http://localhost:8000".to_string(),
        }
    }
}

/// Database settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseSettings {
    /// `SeaORM` connection URL
    pub url: String,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            url: super::database::DEFAULT_DATABASE_URL.to_string(),
        }
    }
}

/// Token issuance settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AuthSettings {
    /// HMAC secret for signing tokens
    pub jwt_secret: String,
    /// `iss` claim
    pub issuer: String,
    /// Access token lifetime in seconds
    pub access_token_lifetime_secs: i64,
    /// Refresh token lifetime in seconds
    pub refresh_token_lifetime_secs: i64,
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self {
            jwt_secret: String::new(),
            issuer: "rentdesk".to_string(),
            access_token_lifetime_secs: 300,
            refresh_token_lifetime_secs: 86_400,
        }
    }
}

/// Attachment storage settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MediaSettings {
    /// Directory holding uploaded and generated files
    pub root: PathBuf,
    /// URL prefix attachments are served under
    pub url_prefix: String,
    /// Whether the API itself serves files under `url_prefix`
    pub serve: bool,
}

impl Default for MediaSettings {
    fn default() -> Self {
        Self {
            root: PathBuf::from("media"),
            url_prefix: "/media".to_string(),
            serve: true,
        }
    }
}

/// Outbound mail settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MailSettings {
    /// Sender address
    pub from: String,
    /// Spool directory for outgoing mail, picked up by a relay
    pub outbox_dir: PathBuf,
}

impl Default for MailSettings {
    fn default() -> Self {
        Self {
            from: "no-reply@rentdesk.local".to_string(),
            outbox_dir: PathBuf::from("outbox"),
        }
    }
}

/// Receipt rendering settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ReceiptSettings {
    /// Currency printed after amounts
    pub currency: String,
}

impl Default for ReceiptSettings {
    fn default() -> Self {
        Self {
            currency: "FCFA".to_string(),
        }
    }
}

/// Parses settings from a TOML string.
pub fn parse_settings(contents: &str) -> Result<Settings> {
    toml::from_str(contents).map_err(|e| Error::Config {
        message: format!("Failed to parse settings: {e}"),
    })
}

/// Loads settings from a TOML file.
///
/// # Errors
/// Returns an error if the file cannot be read or the TOML is invalid.
pub fn load_settings_file<P: AsRef<Path>>(path: P) -> Result<Settings> {
    let path = path.as_ref();
    debug!("Loading settings from {}", path.display());
    let contents = std::fs::read_to_string(path).map_err(|e| Error::Config {
        message: format!("Failed to read settings file {}: {e}", path.display()),
    })?;
    parse_settings(&contents)
}

/// Loads settings from the configured file (if present) and applies
/// environment overrides, then checks the result.
///
/// # Errors
/// Returns an error if the file is unreadable or malformed, an override does
/// not parse, or no JWT secret is configured.
pub fn load_settings() -> Result<Settings> {
    let path = std::env::var("RENTAL_CONFIG").unwrap_or_else(|_| "config.toml".to_string());
    let mut settings = if Path::new(&path).exists() {
        load_settings_file(&path)?
    } else {
        warn!("Settings file {path} not found, using defaults");
        Settings::default()
    };
    settings.apply_env(|key| std::env::var(key).ok())?;
    settings.check()?;
    Ok(settings)
}

impl Settings {
    /// Applies overrides from a variable lookup (the process environment in
    /// production, a map in tests).
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("DATABASE_URL") {
            self.database.url = url;
        }
        if let Some(addr) = lookup("BIND_ADDR") {
            self.server.bind_addr = addr.parse().map_err(|e| Error::Config {
                message: format!("Invalid BIND_ADDR {addr}: {e}"),
            })?;
        }
        if let Some(base) = lookup("PUBLIC_BASE_URL") {
            self.server.public_base_url = base;
        }
        if let Some(secret) = lookup("JWT_SECRET") {
            self.auth.jwt_secret = secret;
        }
        if let Some(root) = lookup("MEDIA_ROOT") {
            self.media.root = PathBuf::from(root);
        }
        if let Some(from) = lookup("MAIL_FROM") {
            self.mail.from = from;
        }
        if let Some(outbox) = lookup("MAIL_OUTBOX") {
            self.mail.outbox_dir = PathBuf::from(outbox);
        }
        Ok(())
    }

    /// Rejects settings the server cannot run with.
    pub fn check(&self) -> Result<()> {
        if self.auth.jwt_secret.len() < 16 {
            return Err(Error::Config {
                message: "JWT secret must be set and at least 16 bytes long".to_string(),
            });
        }
        if self.auth.access_token_lifetime_secs <= 0 || self.auth.refresh_token_lifetime_secs <= 0
        {
            return Err(Error::Config {
                message: "Token lifetimes must be positive".to_string(),
            });
        }
        Ok(())
    }
}
