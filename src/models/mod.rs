//! # Data Models
//!
//! This module contains the SeaORM entity models for the billing service:
//! organizations, users, memberships, access keys, and the append-only
//! transaction/payment/balance ledger tables.

pub mod access_key;
pub mod balance;
pub mod membership;
pub mod organization;
pub mod payment;
pub mod transaction;
pub mod user;

pub use access_key::Entity as AccessKey;
pub use balance::Entity as Balance;
pub use membership::Entity as Membership;
pub use membership::Role;
pub use organization::Entity as Organization;
pub use payment::Entity as Payment;
pub use transaction::Entity as Transaction;
pub use user::Entity as User;
