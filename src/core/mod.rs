//! Framework-agnostic business operations.
//!
//! Every function takes the database connection and the [`access::Caller`]
//! explicitly; HTTP concerns stay in `api`.

pub mod access;
pub mod account;
pub mod contract;
pub mod message;
pub mod payment;
pub mod property;
