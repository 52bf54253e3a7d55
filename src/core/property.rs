//! Property business logic - The catalog of rental units.
//!
//! Properties are written by their owning administrator only. Creation is a
//! two-phase write inside one transaction: the property row first, then all of
//! its image rows in a single bulk insert. Reads go through the access scope,
//! so tenants only ever see the properties they hold a contract on.

use crate::{
    core::access::{self, Caller, Resource},
    entities::{Property, PropertyImage, PropertyKind, property, property_image},
    errors::{Error, Result},
    media::{self, MediaStore, Upload},
};
use sea_orm::{QueryOrder, QuerySelect, Set, TransactionTrait, prelude::*};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

/// Input for creating or replacing a property.
#[derive(Debug, Clone, Deserialize)]
pub struct PropertyInput {
    /// Display name
    pub name: String,
    /// Kind of unit
    pub kind: PropertyKind,
    /// Postal address
    pub address: String,
    /// Free-form description
    #[serde(default)]
    pub description: String,
    /// Monthly rent
    pub monthly_rent: f64,
    /// Security deposit
    pub deposit: f64,
    /// Minimum lease length in months
    pub minimum_months: i32,
    /// Pictures to attach; on update they are appended
    #[serde(default)]
    pub images: Vec<Upload>,
}

/// A property together with its images, in display order.
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyWithImages {
    /// The property row
    pub property: property::Model,
    /// Its image rows
    pub images: Vec<property_image::Model>,
}

/// Public view of a property with absolute image URLs.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PropertyView {
    /// Property id
    pub id: i64,
    /// Owning administrator
    pub owner_id: i64,
    /// Display name
    pub name: String,
    /// Kind of unit
    pub kind: PropertyKind,
    /// Postal address
    pub address: String,
    /// Free-form description
    pub description: String,
    /// Monthly rent
    pub monthly_rent: f64,
    /// Security deposit
    pub deposit: f64,
    /// Minimum lease length in months
    pub minimum_months: i32,
    /// Image URLs in display order
    pub images: Vec<String>,
    /// Creation time
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl PropertyView {
    /// Builds the view, resolving image paths to URLs.
    #[must_use]
    pub fn new(value: PropertyWithImages, media: &MediaStore) -> Self {
        let PropertyWithImages { property, images } = value;
        Self {
            id: property.id,
            owner_id: property.owner_id,
            name: property.name,
            kind: property.kind,
            address: property.address,
            description: property.description,
            monthly_rent: property.monthly_rent,
            deposit: property.deposit,
            minimum_months: property.minimum_months,
            images: images.iter().map(|image| media.url(&image.path)).collect(),
            created_at: property.created_at,
        }
    }
}

fn validate_input(input: &PropertyInput) -> Result<()> {
    if input.name.trim().is_empty() {
        return Err(Error::invalid("name", "Property name cannot be empty."));
    }
    if input.address.trim().is_empty() {
        return Err(Error::invalid("address", "Address cannot be empty."));
    }
    for amount in [input.monthly_rent, input.deposit] {
        if amount < 0.0 || !amount.is_finite() {
            return Err(Error::InvalidAmount { amount });
        }
    }
    if input.minimum_months < 1 {
        return Err(Error::invalid(
            "minimum_months",
            "Minimum lease length must be at least one month.",
        ));
    }
    Ok(())
}

/// Stores uploads on disk and returns their relative paths.
async fn store_images(media: &MediaStore, uploads: &[Upload]) -> Result<Vec<String>> {
    let mut paths = Vec::with_capacity(uploads.len());
    for upload in uploads {
        paths.push(media.save_upload(media::PROPERTY_IMAGES, "images", upload).await?);
    }
    Ok(paths)
}

/// Inserts image rows for `property_id`, numbering them after `first_position`.
async fn insert_images<C>(db: &C, property_id: i64, first_position: i32, paths: Vec<String>) -> Result<()>
where
    C: ConnectionTrait,
{
    if paths.is_empty() {
        return Ok(());
    }
    let rows = paths.into_iter().zip(first_position..).map(|(path, position)| {
        property_image::ActiveModel {
            property_id: Set(property_id),
            path: Set(path),
            position: Set(position),
            ..Default::default()
        }
    });
    PropertyImage::insert_many(rows).exec(db).await?;
    Ok(())
}

/// Creates a property owned by the calling administrator, with its images.
#[instrument(skip(db, media, input), fields(name = %input.name))]
pub async fn create_property(
    db: &DatabaseConnection,
    media: &MediaStore,
    caller: &Caller,
    input: PropertyInput,
) -> Result<PropertyWithImages> {
    access::require_admin(caller)?;
    validate_input(&input)?;
    let paths = store_images(media, &input.images).await?;

    let txn = db.begin().await?;
    let created = property::ActiveModel {
        owner_id: Set(caller.id),
        name: Set(input.name.trim().to_string()),
        kind: Set(input.kind),
        address: Set(input.address.trim().to_string()),
        description: Set(input.description),
        monthly_rent: Set(input.monthly_rent),
        deposit: Set(input.deposit),
        minimum_months: Set(input.minimum_months),
        created_at: Set(chrono::Utc::now()),
        ..Default::default()
    }
    .insert(&txn)
    .await?;
    insert_images(&txn, created.id, 0, paths).await?;
    txn.commit().await?;

    info!(property_id = created.id, owner_id = caller.id, "Property created");
    load_images(db, created).await
}

async fn load_images(db: &DatabaseConnection, property: property::Model) -> Result<PropertyWithImages> {
    let images = PropertyImage::find()
        .filter(property_image::Column::PropertyId.eq(property.id))
        .order_by_asc(property_image::Column::Position)
        .all(db)
        .await?;
    Ok(PropertyWithImages { property, images })
}

/// Lists the properties visible to the caller, oldest first.
pub async fn list_properties(
    db: &DatabaseConnection,
    caller: &Caller,
) -> Result<Vec<PropertyWithImages>> {
    let rows = Property::find()
        .filter(access::scope(Resource::Property, caller))
        .order_by_asc(property::Column::Id)
        .find_with_related(PropertyImage)
        .all(db)
        .await?;
    Ok(rows
        .into_iter()
        .map(|(property, mut images)| {
            images.sort_by_key(|image| image.position);
            PropertyWithImages { property, images }
        })
        .collect())
}

/// Retrieves one property visible to the caller.
pub async fn get_property(
    db: &DatabaseConnection,
    caller: &Caller,
    property_id: i64,
) -> Result<PropertyWithImages> {
    let property = find_scoped(db, caller, property_id).await?;
    load_images(db, property).await
}

/// Loads a property row within the caller's scope.
pub(crate) async fn find_scoped<C>(db: &C, caller: &Caller, property_id: i64) -> Result<property::Model>
where
    C: ConnectionTrait,
{
    Property::find_by_id(property_id)
        .filter(access::scope(Resource::Property, caller))
        .one(db)
        .await?
        .ok_or_else(|| Error::not_found("property", property_id))
}

/// Replaces a property's fields; supplied images are appended.
#[instrument(skip(db, media, input))]
pub async fn update_property(
    db: &DatabaseConnection,
    media: &MediaStore,
    caller: &Caller,
    property_id: i64,
    input: PropertyInput,
) -> Result<PropertyWithImages> {
    access::require_admin(caller)?;
    validate_input(&input)?;
    let existing = find_scoped(db, caller, property_id).await?;
    let paths = store_images(media, &input.images).await?;

    let txn = db.begin().await?;
    let next_position = PropertyImage::find()
        .filter(property_image::Column::PropertyId.eq(existing.id))
        .select_only()
        .column_as(property_image::Column::Position.max(), "max_position")
        .into_tuple::<Option<i32>>()
        .one(&txn)
        .await?
        .flatten()
        .map_or(0, |max| max + 1);

    let mut active: property::ActiveModel = existing.into();
    active.name = Set(input.name.trim().to_string());
    active.kind = Set(input.kind);
    active.address = Set(input.address.trim().to_string());
    active.description = Set(input.description);
    active.monthly_rent = Set(input.monthly_rent);
    active.deposit = Set(input.deposit);
    active.minimum_months = Set(input.minimum_months);
    let updated = active.update(&txn).await?;
    insert_images(&txn, updated.id, next_position, paths).await?;
    txn.commit().await?;

    info!(property_id = updated.id, "Property updated");
    load_images(db, updated).await
}

/// Deletes a property owned by the caller. Images, contracts and payments
/// on it are removed by the database cascade.
#[instrument(skip(db))]
pub async fn delete_property(db: &DatabaseConnection, caller: &Caller, property_id: i64) -> Result<()> {
    access::require_admin(caller)?;
    let existing = find_scoped(db, caller, property_id).await?;
    Property::delete_by_id(existing.id).exec(db).await?;
    info!(property_id, "Property deleted");
    Ok(())
}
