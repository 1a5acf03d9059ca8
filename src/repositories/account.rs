//! Account repository for database operations
//!
//! Accounts are created at signup and read during authentication. The email
//! column is unique; a conflicting create fails with
//! [`RepositoryError::DuplicateEmail`] instead of overwriting.

use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};
use std::sync::Arc;
use uuid::Uuid;

use crate::error::{RepositoryError, is_unique_violation};
use crate::models::account::{self, Entity as Account};

/// Data required to persist a new account
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub name: String,
    pub email: String,
    /// Already-hashed password (PHC string)
    pub password_hash: String,
}

/// Repository for account database operations
#[derive(Debug, Clone)]
pub struct AccountRepository {
    pub db: Arc<DatabaseConnection>,
}

impl AccountRepository {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Creates an account, failing with `DuplicateEmail` if the email is taken.
    pub async fn create(&self, new_account: NewAccount) -> Result<account::Model, RepositoryError> {
        let now = Utc::now();
        let model = account::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(new_account.name),
            email: Set(new_account.email),
            password_hash: Set(new_account.password_hash),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        };

        model.insert(&*self.db).await.map_err(|err| {
            if is_unique_violation(&err) {
                RepositoryError::DuplicateEmail
            } else {
                RepositoryError::database_error(err)
            }
        })
    }

    pub async fn find_by_email(
        &self,
        email: &str,
    ) -> Result<Option<account::Model>, RepositoryError> {
        let account = Account::find()
            .filter(account::Column::Email.eq(email))
            .one(&*self.db)
            .await?;
        Ok(account)
    }

    pub async fn count_by_email(&self, email: &str) -> Result<u64, RepositoryError> {
        use sea_orm::PaginatorTrait;

        let count = Account::find()
            .filter(account::Column::Email.eq(email))
            .count(&*self.db)
            .await?;
        Ok(count)
    }
}
