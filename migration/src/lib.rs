//! Database migrations for the rentals service.
//!
//! This module contains all database migrations using SeaORM Migration.

pub use sea_orm_migration::prelude::*;

mod m2025_10_01_090000_create_equipment;
mod m2025_10_01_090100_create_accounts;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m2025_10_01_090000_create_equipment::Migration),
            Box::new(m2025_10_01_090100_create_accounts::Migration),
        ]
    }
}
