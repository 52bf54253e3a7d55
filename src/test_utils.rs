//! Shared test utilities for `rentdesk`.
//!
//! This module provides common helper functions for setting up test databases
//! and creating test entities with sensible defaults.

use crate::{
    config::settings::Settings,
    core::{
        access::Caller,
        account::{self, NewAccount},
        property::{self, PropertyInput, PropertyWithImages},
    },
    entities::{self, PaymentKind, PropertyKind},
    errors::{Error, Result},
    media::{MediaStore, Upload},
    notify::{Email, Mailer},
    receipt::{ReceiptData, ReceiptRenderer},
};
use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chrono::NaiveDate;
use sea_orm::{ActiveModelTrait, DatabaseConnection, Set};
use std::sync::Mutex;

/// Password satisfying the strength policy, shared by every test account.
pub const TEST_PASSWORD: &str = "Correct-Horse-42";

/// Creates an in-memory `SQLite` database with all tables initialized.
/// This is the standard setup for all integration tests.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    crate::config::database::create_tables(&db).await?;
    Ok(db)
}

/// Creates a file-backed `SQLite` database under `dir`. Unlike the in-memory
/// setup, its pool hands out several connections that see the same data.
pub async fn setup_file_db(dir: &std::path::Path) -> Result<DatabaseConnection> {
    let url = format!("sqlite://{}?mode=rwc", dir.join("rentdesk.sqlite").display());
    let db = crate::config::database::create_connection(&url).await?;
    crate::config::database::create_tables(&db).await?;
    Ok(db)
}

/// Default settings with a usable signing secret.
pub fn test_settings() -> Settings {
    let mut settings = Settings::default();
    settings.auth.jwt_secret = "test-secret-0123456789".to_string();
    settings
}

/// A media store rooted in a fresh directory under the system temp dir.
pub fn test_media() -> MediaStore {
    let root = std::env::temp_dir().join(format!("rentdesk-test-{}", uuid::Uuid::new_v4().simple()));
    MediaStore::new(root, "http://localhost:8000", "/media")
}

/// Account input with `TEST_PASSWORD` and an email derived from the username.
pub fn new_account(username: &str) -> NewAccount {
    NewAccount {
        username: username.to_string(),
        email: format!("{username}@example.com"),
        password: TEST_PASSWORD.to_string(),
        password2: TEST_PASSWORD.to_string(),
        first_name: String::new(),
        last_name: String::new(),
    }
}

/// Registers an administrator.
pub async fn create_test_admin(db: &DatabaseConnection, username: &str) -> Result<entities::user::Model> {
    account::register_admin(db, new_account(username)).await
}

/// Creates a tenant owned by `admin`.
pub async fn create_test_tenant(
    db: &DatabaseConnection,
    admin: &entities::user::Model,
    username: &str,
) -> Result<entities::user::Model> {
    account::create_tenant(db, &caller(admin), new_account(username)).await
}

/// The caller identity of a stored user.
pub const fn caller(user: &entities::user::Model) -> Caller {
    Caller::from_user(user)
}

/// Property input with sensible defaults and no images.
///
/// # Defaults
/// * `kind`: villa
/// * `monthly_rent`: 150000.0
/// * `deposit`: 300000.0
/// * `minimum_months`: 6
pub fn property_input(name: &str) -> PropertyInput {
    PropertyInput {
        name: name.to_string(),
        kind: PropertyKind::Villa,
        address: "12 Rue des Jardins".to_string(),
        description: String::new(),
        monthly_rent: 150_000.0,
        deposit: 300_000.0,
        minimum_months: 6,
        images: Vec::new(),
    }
}

/// Creates a property owned by `admin`.
pub async fn create_test_property(
    db: &DatabaseConnection,
    admin: &entities::user::Model,
    name: &str,
) -> Result<PropertyWithImages> {
    property::create_property(db, &test_media(), &caller(admin), property_input(name)).await
}

/// Inserts a contract row directly, bypassing ownership checks.
pub async fn create_test_contract(
    db: &DatabaseConnection,
    tenant: &entities::user::Model,
    property: &entities::property::Model,
    start_date: NaiveDate,
    end_date: NaiveDate,
) -> Result<entities::contract::Model> {
    entities::contract::ActiveModel {
        tenant_id: Set(tenant.id),
        property_id: Set(property.id),
        document: Set("contracts/test.pdf".to_string()),
        start_date: Set(start_date),
        end_date: Set(end_date),
        created_at: Set(chrono::Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await
    .map_err(Into::into)
}

/// Inserts an unvalidated rent payment directly.
pub async fn create_test_payment(
    db: &DatabaseConnection,
    tenant: &entities::user::Model,
    property: &entities::property::Model,
    amount: f64,
) -> Result<entities::payment::Model> {
    entities::payment::ActiveModel {
        tenant_id: Set(tenant.id),
        property_id: Set(property.id),
        amount: Set(amount),
        kind: Set(PaymentKind::Loyer),
        period: Set("Juin 2025".to_string()),
        validated: Set(false),
        paid_at: Set(chrono::Utc::now()),
        receipt: Set(None),
        validated_by: Set(None),
        notified_at: Set(None),
        ..Default::default()
    }
    .insert(db)
    .await
    .map_err(Into::into)
}

/// A small base64 PDF upload.
pub fn pdf_upload() -> Upload {
    Upload {
        filename: "lease.pdf".to_string(),
        content_base64: STANDARD.encode(b"%PDF-1.4 lease"),
    }
}

/// Mailer that keeps every message in memory.
#[derive(Debug, Default)]
pub struct RecordingMailer {
    sent: Mutex<Vec<Email>>,
}

impl RecordingMailer {
    /// Messages sent so far.
    #[allow(clippy::unwrap_used)]
    pub fn sent(&self) -> Vec<Email> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    #[allow(clippy::unwrap_used)]
    async fn send(&self, email: &Email) -> Result<()> {
        self.sent.lock().unwrap().push(email.clone());
        Ok(())
    }
}

/// Mailer whose every delivery fails.
#[derive(Debug, Clone, Copy)]
pub struct FailingMailer;

#[async_trait]
impl Mailer for FailingMailer {
    async fn send(&self, _email: &Email) -> Result<()> {
        Err(Error::Io(std::io::Error::other("relay unreachable")))
    }
}

/// Renderer whose every render fails.
#[derive(Debug, Clone, Copy)]
pub struct FailingRenderer;

impl ReceiptRenderer for FailingRenderer {
    fn extension(&self) -> &'static str {
        "pdf"
    }

    fn render(&self, _data: &ReceiptData) -> Result<Vec<u8>> {
        Err(Error::Io(std::io::Error::other("renderer crashed")))
    }
}
