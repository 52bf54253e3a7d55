//! User entity - Represents every account in the system.
//!
//! A user is either an administrator (landlord) or a tenant. Tenants carry an
//! `owner_id` pointing at the administrator who created them; that link drives
//! all per-admin scoping of tenant accounts.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Account role. Stored as a short string column.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(10))")]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Landlord managing properties, tenants and payment validation
    #[sea_orm(string_value = "admin")]
    Admin,
    /// Tenant scoped to their own contracts, payments and messages
    #[sea_orm(string_value = "tenant")]
    Tenant,
}

/// User database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "users")]
pub struct Model {
    /// Unique identifier for the user
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Login name, unique across all users
    #[sea_orm(unique)]
    pub username: String,
    /// Address used for receipts and notifications
    pub email: String,
    /// Given name
    pub first_name: String,
    /// Family name
    pub last_name: String,
    /// Argon2id PHC string; never serialized
    #[serde(skip_serializing)]
    pub password_hash: String,
    /// Account role, fixed at creation
    pub role: Role,
    /// Administrator who created this tenant, None for administrators
    pub owner_id: Option<i64>,
    /// When the account was created
    pub created_at: DateTimeUtc,
}

impl Model {
    /// Full name, falling back to the username when both names are blank.
    #[must_use]
    pub fn display_name(&self) -> String {
        let full = format!("{} {}", self.first_name.trim(), self.last_name.trim());
        let full = full.trim();
        if full.is_empty() {
            self.username.clone()
        } else {
            full.to_string()
        }
    }
}

/// Defines relationships between User and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each tenant belongs to the administrator who created it
    #[sea_orm(
        belongs_to = "Entity",
        from = "Column::OwnerId",
        to = "Column::Id",
        on_delete = "SetNull"
    )]
    Owner,
}

impl ActiveModelBehavior for ActiveModel {}
