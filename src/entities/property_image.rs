//! Property image entity - One stored picture of a property.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Property image database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "property_images")]
pub struct Model {
    /// Unique identifier for the image
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Property the image belongs to
    pub property_id: i64,
    /// Path relative to the media root, e.g. `properties/3f2a.jpg`
    pub path: String,
    /// Display order within the property
    pub position: i32,
}

/// Defines relationships between `PropertyImage` and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each image belongs to one property
    #[sea_orm(
        belongs_to = "super::property::Entity",
        from = "Column::PropertyId",
        to = "super::property::Column::Id",
        on_delete = "Cascade"
    )]
    Property,
}

impl Related<super::property::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Property.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
