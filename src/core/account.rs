//! Account business logic - Administrator registration and tenant management.
//!
//! Administrators register themselves; tenants are created by an
//! administrator and stay attached to them through `owner_id`. Every password
//! goes through the confirmation check and the strength policy before
//! anything is written.

use crate::{
    auth::password,
    core::access::{self, Caller, Resource},
    entities::{Role, User, user},
    errors::{Error, Result},
};
use sea_orm::{QueryOrder, Set, SqlErr, prelude::*};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use validator::Validate;

/// Input shared by administrator registration and tenant creation.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NewAccount {
    /// Login name
    #[validate(length(min = 1, max = 150, message = "Username must be 1 to 150 characters."))]
    pub username: String,
    /// Contact address
    #[validate(email(message = "Enter a valid email address."))]
    pub email: String,
    /// Password
    pub password: String,
    /// Password confirmation, must equal `password`
    pub password2: String,
    /// Given name
    #[serde(default)]
    pub first_name: String,
    /// Family name
    #[serde(default)]
    pub last_name: String,
}

/// Partial update of a tenant account.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct TenantUpdate {
    /// New login name
    #[validate(length(min = 1, max = 150, message = "Username must be 1 to 150 characters."))]
    pub username: Option<String>,
    /// New contact address
    #[validate(email(message = "Enter a valid email address."))]
    pub email: Option<String>,
    /// New given name
    pub first_name: Option<String>,
    /// New family name
    pub last_name: Option<String>,
    /// New password, checked against the strength policy
    pub password: Option<String>,
}

/// Public view of an account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccountView {
    /// User id
    pub id: i64,
    /// Login name
    pub username: String,
    /// Contact address
    pub email: String,
    /// Given name
    pub first_name: String,
    /// Family name
    pub last_name: String,
    /// Account role
    pub role: Role,
    /// Owning administrator, for tenants
    pub owner_id: Option<i64>,
}

impl From<user::Model> for AccountView {
    fn from(value: user::Model) -> Self {
        Self {
            id: value.id,
            username: value.username,
            email: value.email,
            first_name: value.first_name,
            last_name: value.last_name,
            role: value.role,
            owner_id: value.owner_id,
        }
    }
}

/// Registers a new administrator. Open to anyone; the role is always admin.
#[instrument(skip(db, input), fields(username = %input.username))]
pub async fn register_admin(db: &DatabaseConnection, input: NewAccount) -> Result<user::Model> {
    let account = create_account(db, input, Role::Admin, None).await?;
    info!(user_id = account.id, "Administrator registered");
    Ok(account)
}

/// Creates a tenant owned by the calling administrator.
#[instrument(skip(db, input), fields(username = %input.username))]
pub async fn create_tenant(
    db: &DatabaseConnection,
    caller: &Caller,
    input: NewAccount,
) -> Result<user::Model> {
    access::require_admin(caller)?;
    let account = create_account(db, input, Role::Tenant, Some(caller.id)).await?;
    info!(user_id = account.id, owner_id = caller.id, "Tenant created");
    Ok(account)
}

async fn create_account(
    db: &DatabaseConnection,
    input: NewAccount,
    role: Role,
    owner_id: Option<i64>,
) -> Result<user::Model> {
    input.validate()?;
    let username = input.username.trim().to_string();
    if username.is_empty() {
        return Err(Error::invalid("username", "Username cannot be blank."));
    }
    password::check_password_pair(
        &input.password,
        &input.password2,
        &[
            username.as_str(),
            input.email.as_str(),
            input.first_name.as_str(),
            input.last_name.as_str(),
        ],
    )?;
    ensure_username_free(db, &username, None).await?;

    let account = user::ActiveModel {
        username: Set(username.clone()),
        email: Set(input.email.trim().to_string()),
        first_name: Set(input.first_name.trim().to_string()),
        last_name: Set(input.last_name.trim().to_string()),
        password_hash: Set(password::hash_password(&input.password)?),
        role: Set(role),
        owner_id: Set(owner_id),
        created_at: Set(chrono::Utc::now()),
        ..Default::default()
    };
    account
        .insert(db)
        .await
        .map_err(|err| unique_violation(err, &username))
}

async fn ensure_username_free(
    db: &DatabaseConnection,
    username: &str,
    except_id: Option<i64>,
) -> Result<()> {
    let mut query = User::find().filter(user::Column::Username.eq(username));
    if let Some(id) = except_id {
        query = query.filter(user::Column::Id.ne(id));
    }
    if query.one(db).await?.is_some() {
        return Err(username_taken(username));
    }
    Ok(())
}

fn username_taken(username: &str) -> Error {
    Error::Conflict {
        message: format!("Username {username} is already taken"),
    }
}

// Catches a username taken between the pre-check and the write
fn unique_violation(err: DbErr, username: &str) -> Error {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => username_taken(username),
        _ => err.into(),
    }
}

/// Retrieves any user by id, without scoping. Used for authentication and
/// for resolving message counterparts.
pub async fn get_user_by_id(db: &DatabaseConnection, user_id: i64) -> Result<Option<user::Model>> {
    User::find_by_id(user_id).one(db).await.map_err(Into::into)
}

/// Returns the caller's own account.
pub async fn profile(db: &DatabaseConnection, caller: &Caller) -> Result<user::Model> {
    get_user_by_id(db, caller.id)
        .await?
        .ok_or_else(|| Error::not_found("user", caller.id))
}

/// Lists the tenants created by the calling administrator, ordered by username.
pub async fn list_tenants(db: &DatabaseConnection, caller: &Caller) -> Result<Vec<user::Model>> {
    access::require_admin(caller)?;
    User::find()
        .filter(access::scope(Resource::TenantAccount, caller))
        .order_by_asc(user::Column::Username)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Retrieves one of the calling administrator's tenants.
pub async fn get_tenant(
    db: &DatabaseConnection,
    caller: &Caller,
    tenant_id: i64,
) -> Result<user::Model> {
    access::require_admin(caller)?;
    User::find_by_id(tenant_id)
        .filter(access::scope(Resource::TenantAccount, caller))
        .one(db)
        .await?
        .ok_or_else(|| Error::not_found("tenant", tenant_id))
}

/// Updates one of the calling administrator's tenants.
#[instrument(skip(db, update))]
pub async fn update_tenant(
    db: &DatabaseConnection,
    caller: &Caller,
    tenant_id: i64,
    update: TenantUpdate,
) -> Result<user::Model> {
    update.validate()?;
    let existing = get_tenant(db, caller, tenant_id).await?;

    let username = update
        .username
        .as_deref()
        .map_or_else(|| existing.username.clone(), |u| u.trim().to_string());
    if username.is_empty() {
        return Err(Error::invalid("username", "Username cannot be blank."));
    }
    if username != existing.username {
        ensure_username_free(db, &username, Some(existing.id)).await?;
    }
    let email = update.email.map_or_else(|| existing.email.clone(), |e| e.trim().to_string());
    let first_name = update
        .first_name
        .map_or_else(|| existing.first_name.clone(), |n| n.trim().to_string());
    let last_name = update
        .last_name
        .map_or_else(|| existing.last_name.clone(), |n| n.trim().to_string());

    let mut account: user::ActiveModel = existing.into();
    if let Some(new_password) = update.password.as_deref() {
        password::check_password_strength(
            new_password,
            &[
                username.as_str(),
                email.as_str(),
                first_name.as_str(),
                last_name.as_str(),
            ],
        )?;
        account.password_hash = Set(password::hash_password(new_password)?);
    }
    account.username = Set(username.clone());
    account.email = Set(email);
    account.first_name = Set(first_name);
    account.last_name = Set(last_name);

    let updated = account
        .update(db)
        .await
        .map_err(|err| unique_violation(err, &username))?;
    info!(user_id = updated.id, "Tenant updated");
    Ok(updated)
}

/// Deletes one of the calling administrator's tenants. Their contracts,
/// payments and messages go with them.
#[instrument(skip(db))]
pub async fn delete_tenant(db: &DatabaseConnection, caller: &Caller, tenant_id: i64) -> Result<()> {
    let tenant = get_tenant(db, caller, tenant_id).await?;
    User::delete_by_id(tenant.id).exec(db).await?;
    info!(user_id = tenant_id, "Tenant deleted");
    Ok(())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::entities::{Contract, Payment, Property, contract, payment};
    use crate::test_utils::*;
    use sea_orm::{DatabaseBackend, MockDatabase};

    #[tokio::test]
    async fn test_register_admin_forces_role() -> Result<()> {
        let db = setup_test_db().await?;
        let admin = register_admin(&db, new_account("landlord")).await?;
        assert_eq!(admin.role, Role::Admin);
        assert_eq!(admin.owner_id, None);
        assert_ne!(admin.password_hash, TEST_PASSWORD);
        assert!(password::verify_password(TEST_PASSWORD, &admin.password_hash)?);
        Ok(())
    }

    #[tokio::test]
    async fn test_password_mismatch_writes_nothing() -> Result<()> {
        // MockDatabase with no results: any query would fail the test
        let db = MockDatabase::new(DatabaseBackend::Sqlite).into_connection();
        let mut input = new_account("landlord");
        input.password2 = "Different-Pass-77".to_string();
        let result = register_admin(&db, input).await;
        assert!(matches!(result, Err(Error::Validation { .. })));
        assert!(db.into_transaction_log().is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_weak_password_writes_nothing() -> Result<()> {
        let db = MockDatabase::new(DatabaseBackend::Sqlite).into_connection();
        let mut input = new_account("landlord");
        input.password = "12345".to_string();
        input.password2 = "12345".to_string();
        let result = register_admin(&db, input).await;
        assert!(matches!(result, Err(Error::Validation { .. })));
        assert!(db.into_transaction_log().is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_invalid_email_rejected() -> Result<()> {
        let db = MockDatabase::new(DatabaseBackend::Sqlite).into_connection();
        let mut input = new_account("landlord");
        input.email = "not-an-email".to_string();
        match register_admin(&db, input).await {
            Err(Error::Validation { errors }) => assert!(errors.contains_key("email")),
            other => panic!("expected validation error, got {other:?}"),
        }
        Ok(())
    }

    #[tokio::test]
    async fn test_duplicate_username_conflict() -> Result<()> {
        let db = setup_test_db().await?;
        register_admin(&db, new_account("landlord")).await?;
        let result = register_admin(&db, new_account("landlord")).await;
        assert!(matches!(result, Err(Error::Conflict { .. })));
        Ok(())
    }

    #[tokio::test]
    async fn test_create_tenant_stamps_owner() -> Result<()> {
        let db = setup_test_db().await?;
        let admin = create_test_admin(&db, "landlord").await?;
        let tenant = create_tenant(&db, &caller(&admin), new_account("renter")).await?;
        assert_eq!(tenant.role, Role::Tenant);
        assert_eq!(tenant.owner_id, Some(admin.id));
        Ok(())
    }

    #[tokio::test]
    async fn test_tenant_cannot_create_tenant() -> Result<()> {
        let db = setup_test_db().await?;
        let admin = create_test_admin(&db, "landlord").await?;
        let tenant = create_test_tenant(&db, &admin, "renter").await?;
        let result = create_tenant(&db, &caller(&tenant), new_account("other")).await;
        assert!(matches!(result, Err(Error::Forbidden { .. })));
        assert_eq!(User::find().count(&db).await?, 2);
        Ok(())
    }

    #[tokio::test]
    async fn test_list_tenants_only_own() -> Result<()> {
        let db = setup_test_db().await?;
        let admin_a = create_test_admin(&db, "landlord_a").await?;
        let admin_b = create_test_admin(&db, "landlord_b").await?;
        create_test_tenant(&db, &admin_a, "renter_1").await?;
        create_test_tenant(&db, &admin_a, "renter_2").await?;
        create_test_tenant(&db, &admin_b, "renter_3").await?;

        let tenants = list_tenants(&db, &caller(&admin_a)).await?;
        let names: Vec<_> = tenants.iter().map(|t| t.username.as_str()).collect();
        assert_eq!(names, vec!["renter_1", "renter_2"]);
        Ok(())
    }

    #[tokio::test]
    async fn test_other_admins_tenant_not_found() -> Result<()> {
        let db = setup_test_db().await?;
        let admin_a = create_test_admin(&db, "landlord_a").await?;
        let admin_b = create_test_admin(&db, "landlord_b").await?;
        let tenant = create_test_tenant(&db, &admin_b, "renter").await?;

        let result = get_tenant(&db, &caller(&admin_a), tenant.id).await;
        assert!(matches!(result, Err(Error::NotFound { .. })));
        let result = delete_tenant(&db, &caller(&admin_a), tenant.id).await;
        assert!(matches!(result, Err(Error::NotFound { .. })));
        assert!(get_user_by_id(&db, tenant.id).await?.is_some());
        Ok(())
    }

    #[tokio::test]
    async fn test_update_tenant_changes_fields_and_password() -> Result<()> {
        let db = setup_test_db().await?;
        let admin = create_test_admin(&db, "landlord").await?;
        let tenant = create_test_tenant(&db, &admin, "renter").await?;

        let updated = update_tenant(
            &db,
            &caller(&admin),
            tenant.id,
            TenantUpdate {
                first_name: Some("Awa".to_string()),
                password: Some("Mango-Season-88".to_string()),
                ..Default::default()
            },
        )
        .await?;

        assert_eq!(updated.first_name, "Awa");
        assert_eq!(updated.username, "renter");
        assert!(password::verify_password("Mango-Season-88", &updated.password_hash)?);
        Ok(())
    }

    #[tokio::test]
    async fn test_update_tenant_rejects_taken_username() -> Result<()> {
        let db = setup_test_db().await?;
        let admin = create_test_admin(&db, "landlord").await?;
        let tenant = create_test_tenant(&db, &admin, "renter").await?;

        let result = update_tenant(
            &db,
            &caller(&admin),
            tenant.id,
            TenantUpdate {
                username: Some("landlord".to_string()),
                ..Default::default()
            },
        )
        .await;
        assert!(matches!(result, Err(Error::Conflict { .. })));
        Ok(())
    }

    #[tokio::test]
    async fn test_delete_tenant() -> Result<()> {
        let db = setup_test_db().await?;
        let admin = create_test_admin(&db, "landlord").await?;
        let tenant = create_test_tenant(&db, &admin, "renter").await?;
        delete_tenant(&db, &caller(&admin), tenant.id).await?;
        assert!(get_user_by_id(&db, tenant.id).await?.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn test_delete_tenant_removes_contracts_and_payments() -> Result<()> {
        let db = setup_test_db().await?;
        let admin = create_test_admin(&db, "landlord").await?;
        let tenant = create_test_tenant(&db, &admin, "renter").await?;
        let neighbour = create_test_tenant(&db, &admin, "neighbour").await?;
        let property = create_test_property(&db, &admin, "Studio 1").await?;
        let start = chrono::NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
        let end = chrono::NaiveDate::from_ymd_opt(2025, 12, 31).unwrap();
        create_test_contract(&db, &tenant, &property.property, start, end).await?;
        create_test_payment(&db, &tenant, &property.property, 50_000.0).await?;
        create_test_payment(&db, &neighbour, &property.property, 20_000.0).await?;

        delete_tenant(&db, &caller(&admin), tenant.id).await?;

        let contracts = Contract::find()
            .filter(contract::Column::TenantId.eq(tenant.id))
            .count(&db)
            .await?;
        let payments = Payment::find()
            .filter(payment::Column::TenantId.eq(tenant.id))
            .count(&db)
            .await?;
        assert_eq!((contracts, payments), (0, 0));
        assert_eq!(Payment::find().count(&db).await?, 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_deleting_admin_detaches_tenants() -> Result<()> {
        let db = setup_test_db().await?;
        let admin = create_test_admin(&db, "landlord").await?;
        let tenant = create_test_tenant(&db, &admin, "renter").await?;
        create_test_property(&db, &admin, "Studio 1").await?;

        User::delete_by_id(admin.id).exec(&db).await?;

        let orphan = get_user_by_id(&db, tenant.id).await?.unwrap();
        assert_eq!(orphan.owner_id, None);
        assert_eq!(Property::find().count(&db).await?, 0);
        Ok(())
    }

    #[tokio::test]
    async fn test_unique_index_reports_conflict() -> Result<()> {
        let db = setup_test_db().await?;
        let admin = create_test_admin(&db, "landlord").await?;
        let tenant = create_test_tenant(&db, &admin, "renter").await?;

        // Bypasses the pre-check, as a concurrent registration would
        let duplicate = user::ActiveModel {
            username: Set(tenant.username.clone()),
            email: Set("other@example.com".to_string()),
            first_name: Set(String::new()),
            last_name: Set(String::new()),
            password_hash: Set(tenant.password_hash.clone()),
            role: Set(Role::Tenant),
            owner_id: Set(Some(admin.id)),
            created_at: Set(chrono::Utc::now()),
            ..Default::default()
        }
        .insert(&db)
        .await
        .map_err(|err| unique_violation(err, "renter"));

        assert!(matches!(duplicate, Err(Error::Conflict { .. })));
        Ok(())
    }
}
