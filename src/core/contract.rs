//! Contract business logic - Leases between a tenant and a property.
//!
//! Only the administrator owning both the property and the tenant may write a
//! contract. The date range is checked before anything touches the database.

use crate::{
    core::access::{self, Caller, Resource},
    entities::{Contract, Role, User, contract},
    errors::{Error, Result},
    media::{self, MediaStore, Upload},
};
use chrono::NaiveDate;
use sea_orm::{QueryOrder, Set, prelude::*};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

/// Input for creating a contract.
#[derive(Debug, Clone, Deserialize)]
pub struct NewContract {
    /// Tenant holding the lease
    pub tenant_id: i64,
    /// Leased property
    pub property_id: i64,
    /// First day of the lease
    pub start_date: NaiveDate,
    /// Last day of the lease
    pub end_date: NaiveDate,
    /// Signed contract document
    pub document: Upload,
}

/// Input for replacing a contract. The document is kept unless a new one is sent.
#[derive(Debug, Clone, Deserialize)]
pub struct ContractUpdate {
    /// Tenant holding the lease
    pub tenant_id: i64,
    /// Leased property
    pub property_id: i64,
    /// First day of the lease
    pub start_date: NaiveDate,
    /// Last day of the lease
    pub end_date: NaiveDate,
    /// Replacement document
    #[serde(default)]
    pub document: Option<Upload>,
}

/// Public view of a contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContractView {
    /// Contract id
    pub id: i64,
    /// Tenant holding the lease
    pub tenant_id: i64,
    /// Leased property
    pub property_id: i64,
    /// Absolute document URL
    pub document_url: String,
    /// First day of the lease
    pub start_date: NaiveDate,
    /// Last day of the lease
    pub end_date: NaiveDate,
    /// When the contract was recorded
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl ContractView {
    /// Builds the view, resolving the document path to a URL.
    #[must_use]
    pub fn new(contract: contract::Model, media: &MediaStore) -> Self {
        Self {
            document_url: media.url(&contract.document),
            id: contract.id,
            tenant_id: contract.tenant_id,
            property_id: contract.property_id,
            start_date: contract.start_date,
            end_date: contract.end_date,
            created_at: contract.created_at,
        }
    }
}

/// Rejects ranges where the lease does not end strictly after it starts.
pub fn check_dates(start_date: NaiveDate, end_date: NaiveDate) -> Result<()> {
    if end_date <= start_date {
        return Err(Error::invalid(
            "end_date",
            "End date must be after start date.",
        ));
    }
    Ok(())
}

/// Ensures the property and the tenant both belong to the calling administrator.
async fn check_parties(
    db: &DatabaseConnection,
    caller: &Caller,
    tenant_id: i64,
    property_id: i64,
) -> Result<()> {
    crate::core::property::find_scoped(db, caller, property_id).await?;
    let tenant = User::find_by_id(tenant_id)
        .filter(access::scope(Resource::TenantAccount, caller))
        .one(db)
        .await?;
    match tenant {
        Some(tenant) if tenant.role == Role::Tenant => Ok(()),
        _ => Err(Error::not_found("tenant", tenant_id)),
    }
}

/// Records a new contract.
#[instrument(skip(db, media, input), fields(tenant_id = input.tenant_id, property_id = input.property_id))]
pub async fn create_contract(
    db: &DatabaseConnection,
    media: &MediaStore,
    caller: &Caller,
    input: NewContract,
) -> Result<contract::Model> {
    access::require_admin(caller)?;
    check_dates(input.start_date, input.end_date)?;
    check_parties(db, caller, input.tenant_id, input.property_id).await?;
    let document = media
        .save_upload(media::CONTRACT_DOCUMENTS, "document", &input.document)
        .await?;

    let created = contract::ActiveModel {
        tenant_id: Set(input.tenant_id),
        property_id: Set(input.property_id),
        document: Set(document),
        start_date: Set(input.start_date),
        end_date: Set(input.end_date),
        created_at: Set(chrono::Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await?;

    info!(contract_id = created.id, "Contract created");
    Ok(created)
}

/// Lists the contracts visible to the caller, by start date.
pub async fn list_contracts(db: &DatabaseConnection, caller: &Caller) -> Result<Vec<contract::Model>> {
    Contract::find()
        .filter(access::scope(Resource::Contract, caller))
        .order_by_asc(contract::Column::StartDate)
        .order_by_asc(contract::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Retrieves one contract visible to the caller.
pub async fn get_contract(
    db: &DatabaseConnection,
    caller: &Caller,
    contract_id: i64,
) -> Result<contract::Model> {
    Contract::find_by_id(contract_id)
        .filter(access::scope(Resource::Contract, caller))
        .one(db)
        .await?
        .ok_or_else(|| Error::not_found("contract", contract_id))
}

/// Replaces a contract's parties and dates, and optionally its document.
#[instrument(skip(db, media, input))]
pub async fn update_contract(
    db: &DatabaseConnection,
    media: &MediaStore,
    caller: &Caller,
    contract_id: i64,
    input: ContractUpdate,
) -> Result<contract::Model> {
    access::require_admin(caller)?;
    check_dates(input.start_date, input.end_date)?;
    let existing = get_contract(db, caller, contract_id).await?;
    check_parties(db, caller, input.tenant_id, input.property_id).await?;

    let mut active: contract::ActiveModel = existing.into();
    if let Some(upload) = &input.document {
        let document = media
            .save_upload(media::CONTRACT_DOCUMENTS, "document", upload)
            .await?;
        active.document = Set(document);
    }
    active.tenant_id = Set(input.tenant_id);
    active.property_id = Set(input.property_id);
    active.start_date = Set(input.start_date);
    active.end_date = Set(input.end_date);
    let updated = active.update(db).await?;

    info!(contract_id, "Contract updated");
    Ok(updated)
}

/// Deletes a contract on one of the caller's properties.
#[instrument(skip(db))]
pub async fn delete_contract(db: &DatabaseConnection, caller: &Caller, contract_id: i64) -> Result<()> {
    access::require_admin(caller)?;
    let existing = get_contract(db, caller, contract_id).await?;
    Contract::delete_by_id(existing.id).exec(db).await?;
    info!(contract_id, "Contract deleted");
    Ok(())
}
