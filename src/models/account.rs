//! Account entity model
//!
//! This module contains the SeaORM entity model for the accounts table.
//! `password_hash` holds an Argon2 PHC string and is never serialized.

use sea_orm::ActiveModelBehavior;
use sea_orm::entity::prelude::*;
use sea_orm::prelude::DateTimeWithTimeZone;

/// Account entity representing a registered user
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "accounts")]
pub struct Model {
    /// Unique identifier for the account (primary key)
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// Display name
    pub name: String,

    /// Login email, unique across accounts
    #[sea_orm(unique)]
    pub email: String,

    /// Salted Argon2 hash of the password
    pub password_hash: String,

    /// Timestamp when the account was created
    pub created_at: DateTimeWithTimeZone,

    /// Timestamp when the account was last updated
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
