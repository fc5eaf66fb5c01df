//! Database migrations for the billing service.
//!
//! This module contains all database migrations using SeaORM Migration.

pub use sea_orm_migration::prelude::*;

mod m2025_07_01_000100_create_organizations;
mod m2025_07_01_000200_create_users;
mod m2025_07_01_000300_create_memberships;
mod m2025_07_01_000400_create_access_keys;
mod m2025_07_01_000500_create_transactions;
mod m2025_07_01_000600_create_payments;
mod m2025_07_01_000700_create_balances;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m2025_07_01_000100_create_organizations::Migration),
            Box::new(m2025_07_01_000200_create_users::Migration),
            Box::new(m2025_07_01_000300_create_memberships::Migration),
            Box::new(m2025_07_01_000400_create_access_keys::Migration),
            Box::new(m2025_07_01_000500_create_transactions::Migration),
            Box::new(m2025_07_01_000600_create_payments::Migration),
            Box::new(m2025_07_01_000700_create_balances::Migration),
        ]
    }
}
