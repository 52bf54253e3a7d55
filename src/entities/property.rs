//! Property entity - Represents a rental unit owned by an administrator.
//!
//! Properties carry their pricing terms (monthly rent, deposit, minimum lease
//! length) and own a list of image attachments stored in `property_images`.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Kind of rental unit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
#[serde(rename_all = "lowercase")]
pub enum PropertyKind {
    /// Single room
    #[sea_orm(string_value = "chambre")]
    Chambre,
    /// Studio
    #[sea_orm(string_value = "studio")]
    Studio,
    /// Room with living room
    #[sea_orm(string_value = "chambresalon")]
    ChambreSalon,
    /// Apartment
    #[sea_orm(string_value = "appartement")]
    Appartement,
    /// Villa
    #[sea_orm(string_value = "villa")]
    Villa,
    /// Office space
    #[sea_orm(string_value = "bureau")]
    Bureau,
    /// Shop
    #[sea_orm(string_value = "boutique")]
    Boutique,
}

/// Property database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "properties")]
pub struct Model {
    /// Unique identifier for the property
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Administrator who owns the property, set once at creation
    pub owner_id: i64,
    /// Display name
    pub name: String,
    /// Kind of unit
    pub kind: PropertyKind,
    /// Postal address
    pub address: String,
    /// Free-form description, may be empty
    pub description: String,
    /// Monthly rent
    pub monthly_rent: f64,
    /// Security deposit
    pub deposit: f64,
    /// Minimum lease length in months
    pub minimum_months: i32,
    /// When the property was added
    pub created_at: DateTimeUtc,
}

/// Defines relationships between Property and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each property belongs to one administrator
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::OwnerId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    Owner,
    /// One property has many images
    #[sea_orm(has_many = "super::property_image::Entity")]
    Images,
    /// One property has many contracts
    #[sea_orm(has_many = "super::contract::Entity")]
    Contracts,
    /// One property has many payments
    #[sea_orm(has_many = "super::payment::Entity")]
    Payments,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Owner.def()
    }
}

impl Related<super::property_image::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Images.def()
    }
}

impl Related<super::contract::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Contracts.def()
    }
}

impl Related<super::payment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Payments.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
