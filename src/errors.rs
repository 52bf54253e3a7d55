//! Unified error type for the rental backend.
//!
//! Every fallible operation in `core`, `auth`, `media`, `receipt` and `notify`
//! returns [`Result`]. The HTTP layer maps each variant onto a status code in
//! `api::error`.

use std::collections::BTreeMap;
use thiserror::Error;

/// Field name to list of human-readable messages.
pub type FieldErrors = BTreeMap<String, Vec<String>>;

/// Which payment-validation side effect failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SideEffect {
    /// Rendering or storing the receipt document
    Receipt,
    /// Delivering the notification mail
    Notification,
}

/// All errors produced by the crate.
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid or missing configuration
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the problem
        message: String,
    },

    /// Field-level input validation failure
    #[error("Validation failed: {}", format_field_errors(.errors))]
    Validation {
        /// Messages keyed by field name
        errors: FieldErrors,
    },

    /// A monetary amount was negative, zero where not allowed, or not finite
    #[error("Invalid amount: {amount}")]
    InvalidAmount {
        /// The rejected amount
        amount: f64,
    },

    /// Missing, malformed or expired credentials
    #[error("Authentication failed: {reason}")]
    Unauthenticated {
        /// Internal reason, never sent to clients
        reason: String,
    },

    /// Authenticated, but the role does not allow the action
    #[error("Permission denied: {reason}")]
    Forbidden {
        /// Internal reason, never sent to clients
        reason: String,
    },

    /// A record does not exist or is outside the caller's scope
    #[error("{entity} not found: {id}")]
    NotFound {
        /// Entity kind, e.g. `"payment"`
        entity: &'static str,
        /// Identifier that was looked up
        id: String,
    },

    /// A uniqueness rule was violated
    #[error("Conflict: {message}")]
    Conflict {
        /// Description of the conflict
        message: String,
    },

    /// The payment has already been validated
    #[error("Payment {payment_id} already validated")]
    AlreadyValidated {
        /// Payment that was targeted
        payment_id: i64,
    },

    /// The action requires a validated payment
    #[error("Payment {payment_id} is not validated")]
    NotValidated {
        /// Payment that was targeted
        payment_id: i64,
    },

    /// A side effect of payment validation failed
    #[error("Payment {payment_id}: {stage:?} failed: {reason}")]
    SideEffectFailed {
        /// Payment being validated
        payment_id: i64,
        /// Which step failed
        stage: SideEffect,
        /// Underlying failure
        reason: String,
    },

    /// Password hashing or token signing failure
    #[error("Cryptography error: {0}")]
    Crypto(String),

    /// Database failure
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// Filesystem failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Builds a [`Error::Validation`] carrying a single field message.
    pub fn invalid(field: &str, message: impl Into<String>) -> Self {
        let mut errors = FieldErrors::new();
        errors.insert(field.to_string(), vec![message.into()]);
        Self::Validation { errors }
    }

    /// Builds a [`Error::NotFound`] for the given entity kind and id.
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    /// Builds a [`Error::Forbidden`] with an internal reason.
    pub fn forbidden(reason: impl Into<String>) -> Self {
        Self::Forbidden {
            reason: reason.into(),
        }
    }
}

impl From<validator::ValidationErrors> for Error {
    fn from(value: validator::ValidationErrors) -> Self {
        let mut errors = FieldErrors::new();
        for (field, field_errors) in value.field_errors() {
            let messages = field_errors
                .iter()
                .map(|e| {
                    e.message
                        .as_ref()
                        .map_or_else(|| format!("invalid value ({})", e.code), ToString::to_string)
                })
                .collect();
            errors.insert(field.to_string(), messages);
        }
        Self::Validation { errors }
    }
}

fn format_field_errors(errors: &FieldErrors) -> String {
    errors
        .iter()
        .map(|(field, messages)| format!("{field}: {}", messages.join("; ")))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;
