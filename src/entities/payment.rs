//! Payment entity - Represents a monetary record owed by a tenant on a property.
//!
//! A payment starts unvalidated. Validation is a one-way transition that also
//! attaches a receipt document; `notified_at` stays empty until the receipt
//! mail has actually been delivered, so a validated payment with no
//! `notified_at` is still waiting for its notification.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// What the payment is for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
#[serde(rename_all = "lowercase")]
pub enum PaymentKind {
    /// Monthly rent
    #[sea_orm(string_value = "loyer")]
    Loyer,
    /// Water bill
    #[sea_orm(string_value = "eau")]
    Eau,
    /// Electricity bill
    #[sea_orm(string_value = "electricite")]
    Electricite,
    /// Internet subscription
    #[sea_orm(string_value = "internet")]
    Internet,
    /// Repair costs
    #[sea_orm(string_value = "reparation")]
    Reparation,
}

impl PaymentKind {
    /// Human-readable label printed on receipts.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Loyer => "Loyer",
            Self::Eau => "Eau",
            Self::Electricite => "Électricité",
            Self::Internet => "Internet",
            Self::Reparation => "Réparation",
        }
    }
}

/// Payment database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "payments")]
pub struct Model {
    /// Unique identifier for the payment
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Tenant who owes or made the payment
    pub tenant_id: i64,
    /// Property the payment relates to
    pub property_id: i64,
    /// Amount paid
    pub amount: f64,
    /// Payment type
    pub kind: PaymentKind,
    /// Free-text period label, e.g. `"Juin 2025"`
    pub period: String,
    /// Whether an administrator confirmed the payment
    pub validated: bool,
    /// When the payment was made
    pub paid_at: DateTimeUtc,
    /// Receipt path relative to the media root, set on validation
    pub receipt: Option<String>,
    /// Administrator who validated the payment
    pub validated_by: Option<i64>,
    /// When the receipt mail was delivered
    pub notified_at: Option<DateTimeUtc>,
}

/// Defines relationships between Payment and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each payment belongs to one tenant
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::TenantId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    Tenant,
    /// Each payment belongs to one property
    #[sea_orm(
        belongs_to = "super::property::Entity",
        from = "Column::PropertyId",
        to = "super::property::Column::Id",
        on_delete = "Cascade"
    )]
    Property,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Tenant.def()
    }
}

impl Related<super::property::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Property.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
