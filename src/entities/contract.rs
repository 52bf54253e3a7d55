//! Contract entity - A lease binding one tenant to one property for a date range.
//!
//! Each contract carries a signed document stored under the media root.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Contract database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "contracts")]
pub struct Model {
    /// Unique identifier for the contract
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Tenant holding the lease
    pub tenant_id: i64,
    /// Leased property
    pub property_id: i64,
    /// Contract document path relative to the media root
    pub document: String,
    /// First day of the lease
    pub start_date: Date,
    /// Last day of the lease, strictly after `start_date`
    pub end_date: Date,
    /// When the contract was recorded
    pub created_at: DateTimeUtc,
}

/// Defines relationships between Contract and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each contract belongs to one tenant
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::TenantId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    Tenant,
    /// Each contract belongs to one property
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
