//! Payment business logic - The ledger and its validation lifecycle.
//!
//! A payment is created unvalidated and can be validated exactly once. The
//! flag flip and the receipt document are committed together; the
//! notification mail is sent after commit and tracked by `notified_at`, so a
//! failed delivery leaves a validated payment that [`resend_receipt`] can
//! retry.

use crate::{
    core::access::{self, Caller, Resource},
    entities::{Payment, PaymentKind, User, payment, user},
    errors::{Error, Result, SideEffect},
    media::{self, MediaStore},
    notify::{Email, Mailer},
    receipt::{ReceiptData, ReceiptRenderer},
};
use chrono::{DateTime, Utc};
use sea_orm::{QueryOrder, Set, TransactionTrait, prelude::*, sea_query::Expr};
use serde::{Deserialize, Serialize};
use tracing::{error, info, instrument, warn};

/// Input for recording a payment.
#[derive(Debug, Clone, Deserialize)]
pub struct NewPayment {
    /// Paying tenant; required for administrators, forced to the caller for tenants
    #[serde(default)]
    pub tenant_id: Option<i64>,
    /// Property the payment relates to
    pub property_id: i64,
    /// Amount paid, strictly positive
    pub amount: f64,
    /// Payment type
    pub kind: PaymentKind,
    /// Period label, e.g. `"Juin 2025"`
    pub period: String,
    /// When the payment was made, defaults to now
    #[serde(default)]
    pub paid_at: Option<DateTime<Utc>>,
}

/// Editable fields of an unvalidated payment.
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentUpdate {
    /// Amount paid, strictly positive
    pub amount: f64,
    /// Payment type
    pub kind: PaymentKind,
    /// Period label
    pub period: String,
}

/// Public view of a payment.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PaymentView {
    /// Payment id
    pub id: i64,
    /// Paying tenant
    pub tenant_id: i64,
    /// Property
    pub property_id: i64,
    /// Amount paid
    pub amount: f64,
    /// Payment type
    pub kind: PaymentKind,
    /// Period label
    pub period: String,
    /// Validation flag
    pub validated: bool,
    /// When the payment was made
    pub paid_at: DateTime<Utc>,
    /// Absolute receipt URL once validated
    pub receipt_url: Option<String>,
    /// Validating administrator
    pub validated_by: Option<i64>,
    /// When the receipt mail was delivered
    pub notified_at: Option<DateTime<Utc>>,
}

impl PaymentView {
    /// Builds the view, resolving the receipt path to a URL.
    #[must_use]
    pub fn new(payment: payment::Model, media: &MediaStore) -> Self {
        Self {
            receipt_url: payment.receipt.as_deref().map(|path| media.url(path)),
            id: payment.id,
            tenant_id: payment.tenant_id,
            property_id: payment.property_id,
            amount: payment.amount,
            kind: payment.kind,
            period: payment.period,
            validated: payment.validated,
            paid_at: payment.paid_at,
            validated_by: payment.validated_by,
            notified_at: payment.notified_at,
        }
    }
}

/// Collaborators used when a payment is validated.
#[derive(Clone, Copy)]
pub struct Receipting<'a> {
    /// Where receipts are written
    pub media: &'a MediaStore,
    /// Document producer
    pub renderer: &'a dyn ReceiptRenderer,
    /// Notification transport
    pub mailer: &'a dyn Mailer,
    /// Currency printed on receipts and mails
    pub currency: &'a str,
}

fn check_amount(amount: f64) -> Result<()> {
    if amount > 0.0 && amount.is_finite() {
        Ok(())
    } else {
        Err(Error::InvalidAmount { amount })
    }
}

fn check_period(period: &str) -> Result<()> {
    if period.trim().is_empty() {
        return Err(Error::invalid("period", "Period cannot be empty."));
    }
    Ok(())
}

/// Records a payment.
///
/// An administrator records it for one of their tenants on one of their
/// properties. A tenant declares it for themselves on a property they hold a
/// contract on. The payment always starts unvalidated.
#[instrument(skip(db, input), fields(property_id = input.property_id))]
pub async fn create_payment(
    db: &DatabaseConnection,
    caller: &Caller,
    input: NewPayment,
) -> Result<payment::Model> {
    check_amount(input.amount)?;
    check_period(&input.period)?;
    // Property scope already encodes ownership for admins and contracts for tenants
    let property = crate::core::property::find_scoped(db, caller, input.property_id).await?;

    let tenant_id = if caller.is_admin() {
        let tenant_id = input
            .tenant_id
            .ok_or_else(|| Error::invalid("tenant_id", "A tenant is required."))?;
        User::find_by_id(tenant_id)
            .filter(access::scope(Resource::TenantAccount, caller))
            .one(db)
            .await?
            .ok_or_else(|| Error::not_found("tenant", tenant_id))?;
        tenant_id
    } else {
        caller.id
    };

    let created = payment::ActiveModel {
        tenant_id: Set(tenant_id),
        property_id: Set(property.id),
        amount: Set(input.amount),
        kind: Set(input.kind),
        period: Set(input.period.trim().to_string()),
        validated: Set(false),
        paid_at: Set(input.paid_at.unwrap_or_else(Utc::now)),
        receipt: Set(None),
        validated_by: Set(None),
        notified_at: Set(None),
        ..Default::default()
    }
    .insert(db)
    .await?;

    info!(payment_id = created.id, tenant_id, amount = created.amount, "Payment recorded");
    Ok(created)
}

/// Lists the payments visible to the caller, most recent first.
pub async fn list_payments(db: &DatabaseConnection, caller: &Caller) -> Result<Vec<payment::Model>> {
    Payment::find()
        .filter(access::scope(Resource::Payment, caller))
        .order_by_desc(payment::Column::PaidAt)
        .order_by_desc(payment::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Retrieves one payment visible to the caller.
pub async fn get_payment(
    db: &DatabaseConnection,
    caller: &Caller,
    payment_id: i64,
) -> Result<payment::Model> {
    Payment::find_by_id(payment_id)
        .filter(access::scope(Resource::Payment, caller))
        .one(db)
        .await?
        .ok_or_else(|| Error::not_found("payment", payment_id))
}

/// Changes amount, type and period of a payment that is not yet validated.
#[instrument(skip(db, input))]
pub async fn update_payment(
    db: &DatabaseConnection,
    caller: &Caller,
    payment_id: i64,
    input: PaymentUpdate,
) -> Result<payment::Model> {
    access::require_admin(caller)?;
    check_amount(input.amount)?;
    check_period(&input.period)?;
    let existing = get_payment(db, caller, payment_id).await?;
    if existing.validated {
        return Err(Error::AlreadyValidated { payment_id });
    }

    let mut active: payment::ActiveModel = existing.into();
    active.amount = Set(input.amount);
    active.kind = Set(input.kind);
    active.period = Set(input.period.trim().to_string());
    let updated = active.update(db).await?;
    info!(payment_id, "Payment updated");
    Ok(updated)
}

/// Deletes a payment on one of the caller's properties.
#[instrument(skip(db))]
pub async fn delete_payment(db: &DatabaseConnection, caller: &Caller, payment_id: i64) -> Result<()> {
    access::require_admin(caller)?;
    let existing = get_payment(db, caller, payment_id).await?;
    Payment::delete_by_id(existing.id).exec(db).await?;
    info!(payment_id, "Payment deleted");
    Ok(())
}

/// Validates a payment, stores its receipt and notifies the tenant.
///
/// # Errors
/// - [`Error::AlreadyValidated`] if the payment was validated before, including
///   by a concurrent call; nothing is changed.
/// - [`Error::SideEffectFailed`] with [`SideEffect::Receipt`] if the receipt
///   could not be produced; the payment stays unvalidated.
/// - [`Error::SideEffectFailed`] with [`SideEffect::Notification`] if the mail
///   could not be sent; the payment stays validated with `notified_at` unset.
#[instrument(skip(db, receipting))]
pub async fn validate_payment(
    db: &DatabaseConnection,
    receipting: Receipting<'_>,
    caller: &Caller,
    payment_id: i64,
) -> Result<payment::Model> {
    access::require_admin(caller)?;
    let payment = get_payment(db, caller, payment_id).await?;
    if payment.validated {
        return Err(Error::AlreadyValidated { payment_id });
    }
    let tenant = load_user(db, payment.tenant_id).await?;
    let validator = load_user(db, caller.id).await?;

    let txn = db.begin().await?;
    let flipped = Payment::update_many()
        .col_expr(payment::Column::Validated, Expr::value(true))
        .col_expr(payment::Column::ValidatedBy, Expr::value(caller.id))
        .filter(payment::Column::Id.eq(payment_id))
        .filter(payment::Column::Validated.eq(false))
        .exec(&txn)
        .await?;
    if flipped.rows_affected == 0 {
        txn.rollback().await?;
        return Err(Error::AlreadyValidated { payment_id });
    }

    let data = ReceiptData {
        payment_id,
        tenant_name: tenant.display_name(),
        amount: payment.amount,
        currency: receipting.currency.to_string(),
        period: payment.period.clone(),
        kind_label: payment.kind.label().to_string(),
        paid_at: payment.paid_at,
        property_id: payment.property_id,
        validator_name: validator.display_name(),
        generated_on: Utc::now().date_naive(),
    };
    let receipt = match store_receipt(receipting, &data).await {
        Ok(path) => path,
        Err(e) => {
            txn.rollback().await?;
            error!(payment_id, "Receipt generation failed: {e}");
            return Err(Error::SideEffectFailed {
                payment_id,
                stage: SideEffect::Receipt,
                reason: e.to_string(),
            });
        }
    };
    Payment::update_many()
        .col_expr(payment::Column::Receipt, Expr::value(receipt.clone()))
        .filter(payment::Column::Id.eq(payment_id))
        .exec(&txn)
        .await?;
    txn.commit().await?;
    info!(payment_id, validated_by = caller.id, receipt = %receipt, "Payment validated");

    let validated = get_payment(db, caller, payment_id).await?;
    send_receipt_mail(db, receipting, validated, &tenant).await
}

/// Sends the receipt mail again for a validated payment.
#[instrument(skip(db, receipting))]
pub async fn resend_receipt(
    db: &DatabaseConnection,
    receipting: Receipting<'_>,
    caller: &Caller,
    payment_id: i64,
) -> Result<payment::Model> {
    access::require_admin(caller)?;
    let payment = get_payment(db, caller, payment_id).await?;
    if !payment.validated {
        return Err(Error::NotValidated { payment_id });
    }
    let tenant = load_user(db, payment.tenant_id).await?;
    send_receipt_mail(db, receipting, payment, &tenant).await
}

async fn load_user(db: &DatabaseConnection, user_id: i64) -> Result<user::Model> {
    User::find_by_id(user_id)
        .one(db)
        .await?
        .ok_or_else(|| Error::not_found("user", user_id))
}

/// Renders the receipt and writes it under the receipts folder.
async fn store_receipt(receipting: Receipting<'_>, data: &ReceiptData) -> Result<String> {
    let bytes = receipting.renderer.render(data)?;
    let relative = format!(
        "{}/receipt_payment_{}.{}",
        media::RECEIPTS,
        data.payment_id,
        receipting.renderer.extension()
    );
    receipting.media.write(&relative, &bytes).await?;
    Ok(relative)
}

async fn send_receipt_mail(
    db: &DatabaseConnection,
    receipting: Receipting<'_>,
    payment: payment::Model,
    tenant: &user::Model,
) -> Result<payment::Model> {
    let payment_id = payment.id;
    let attachment = match payment.receipt.as_deref() {
        Some(path) if receipting.media.exists(path).await => {
            Some(receipting.media.absolute_path(path))
        }
        Some(path) => {
            warn!(payment_id, path, "Receipt file missing, sending mail without attachment");
            None
        }
        None => None,
    };
    let greeting = if tenant.first_name.trim().is_empty() {
        tenant.username.as_str()
    } else {
        tenant.first_name.as_str()
    };
    let email = Email {
        to: tenant.email.clone(),
        subject: format!("Payment receipt #{payment_id}"),
        body: format!(
            "Hello {greeting},\n\n\
             Your payment of {:.2} {} for {} ({}) has been validated.\n\
             Please find your receipt attached.\n",
            payment.amount,
            receipting.currency,
            payment.period,
            payment.kind.label()
        ),
        attachment,
    };

    if let Err(e) = receipting.mailer.send(&email).await {
        error!(payment_id, to = %email.to, "Receipt notification failed: {e}");
        return Err(Error::SideEffectFailed {
            payment_id,
            stage: SideEffect::Notification,
            reason: e.to_string(),
        });
    }

    let mut active: payment::ActiveModel = payment.into();
    active.notified_at = Set(Some(Utc::now()));
    let notified = active.update(db).await?;
    info!(payment_id, to = %email.to, "Receipt notification sent");
    Ok(notified)
}
