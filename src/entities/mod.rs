//! Entity module - Contains all SeaORM entity definitions for the database.
//! These entities represent the database tables and their relationships.
//! Each entity has a Model struct for data and an Entity struct for operations.

pub mod contract;
pub mod message;
pub mod payment;
pub mod property;
pub mod property_image;
pub mod user;

// Re-export specific types to avoid conflicts
pub use contract::{Column as ContractColumn, Entity as Contract, Model as ContractModel};
pub use message::{Column as MessageColumn, Entity as Message, Model as MessageModel};
pub use payment::{
    Column as PaymentColumn, Entity as Payment, Model as PaymentModel, PaymentKind,
};
pub use property::{
    Column as PropertyColumn, Entity as Property, Model as PropertyModel, PropertyKind,
};
pub use property_image::{
    Column as PropertyImageColumn, Entity as PropertyImage, Model as PropertyImageModel,
};
pub use user::{Column as UserColumn, Entity as User, Model as UserModel, Role};
