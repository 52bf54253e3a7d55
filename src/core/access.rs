//! Access control - the single place where role-based visibility is decided.
//!
//! Every list and detail query in `core` filters with [`scope`], so a record
//! outside the caller's scope is simply never loaded. Admin-only actions are
//! additionally gated by [`require_admin`].

use crate::{
    entities::{Contract, Property, Role, contract, message, payment, property, user},
    errors::{Error, Result},
};
use sea_orm::{Condition, prelude::*, sea_query::Query};

/// The authenticated user performing an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Caller {
    /// User id
    pub id: i64,
    /// Current role
    pub role: Role,
}

impl Caller {
    /// Builds a caller from a stored user.
    #[must_use]
    pub const fn from_user(user: &user::Model) -> Self {
        Self {
            id: user.id,
            role: user.role,
        }
    }

    /// Whether the caller is an administrator.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// Kinds of records subject to scoping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    /// Rows of `properties`
    Property,
    /// Rows of `contracts`
    Contract,
    /// Rows of `payments`
    Payment,
    /// Rows of `messages`
    Message,
    /// Rows of `users` with the tenant role
    TenantAccount,
}

/// Returns the predicate selecting the records of `resource` the caller may see.
///
/// - properties: the admin's own, or those the tenant holds a contract on
/// - contracts and payments: those on the admin's properties, or the tenant's own
/// - messages: those the caller sent or received
/// - tenant accounts: the tenants the admin created; nothing for tenants
#[must_use]
pub fn scope(resource: Resource, caller: &Caller) -> Condition {
    match (resource, caller.role) {
        (Resource::Property, Role::Admin) => {
            Condition::all().add(property::Column::OwnerId.eq(caller.id))
        }
        (Resource::Property, Role::Tenant) => Condition::all().add(
            property::Column::Id.in_subquery(
                Query::select()
                    .column(contract::Column::PropertyId)
                    .from(Contract)
                    .and_where(contract::Column::TenantId.eq(caller.id))
                    .to_owned(),
            ),
        ),
        (Resource::Contract, Role::Admin) => {
            Condition::all().add(contract::Column::PropertyId.in_subquery(owned_properties(caller)))
        }
        (Resource::Contract, Role::Tenant) => {
            Condition::all().add(contract::Column::TenantId.eq(caller.id))
        }
        (Resource::Payment, Role::Admin) => {
            Condition::all().add(payment::Column::PropertyId.in_subquery(owned_properties(caller)))
        }
        (Resource::Payment, Role::Tenant) => {
            Condition::all().add(payment::Column::TenantId.eq(caller.id))
        }
        (Resource::Message, _) => Condition::any()
            .add(message::Column::SenderId.eq(caller.id))
            .add(message::Column::RecipientId.eq(caller.id)),
        (Resource::TenantAccount, Role::Admin) => Condition::all()
            .add(user::Column::Role.eq(Role::Tenant))
            .add(user::Column::OwnerId.eq(caller.id)),
        // Primary keys are never null, so this matches no row
        (Resource::TenantAccount, Role::Tenant) => {
            Condition::all().add(user::Column::Id.is_null())
        }
    }
}

fn owned_properties(caller: &Caller) -> sea_orm::sea_query::SelectStatement {
    Query::select()
        .column(property::Column::Id)
        .from(Property)
        .and_where(property::Column::OwnerId.eq(caller.id))
        .to_owned()
}

/// Admin-only predicate.
///
/// # Errors
/// Returns [`Error::Forbidden`] for tenants.
pub fn require_admin(caller: &Caller) -> Result<()> {
    if caller.is_admin() {
        Ok(())
    } else {
        Err(Error::forbidden(format!(
            "user {} is not an administrator",
            caller.id
        )))
    }
}
