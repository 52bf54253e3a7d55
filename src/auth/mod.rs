//! Authentication - password hashing and policy, JWT pairs, login/refresh.

pub mod password;
pub mod service;
pub mod token;

pub use service::{RefreshedAccess, TokenPair, login, refresh};
pub use token::{Claims, TokenType};
