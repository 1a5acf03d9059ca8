//! Equipment repository for database operations
//!
//! This module provides the EquipmentRepository struct which encapsulates
//! SeaORM operations for the equipment table. Business-rule validation happens
//! at the API boundary; the repository only persists.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, IntoActiveModel,
    ModelTrait, QueryFilter, QueryOrder, Set,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::error::RepositoryError;
use crate::models::equipment::{self, Category, DutyType, Entity as Equipment};

const ENTITY: &str = "equipment";

/// Field values for a new listing
#[derive(Debug, Clone, PartialEq)]
pub struct NewEquipment {
    pub name: String,
    pub brand: Option<String>,
    pub price: f64,
    pub rent: f64,
    pub category: Category,
    pub duty_type: DutyType,
    pub description: String,
    pub image: Option<String>,
}

/// Partial update; `None` leaves the stored value untouched.
///
/// The optional columns use a nested option so a caller can clear them:
/// `Some(None)` stores null, `None` keeps what is there.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EquipmentPatch {
    pub name: Option<String>,
    pub brand: Option<Option<String>>,
    pub price: Option<f64>,
    pub rent: Option<f64>,
    pub category: Option<Category>,
    pub duty_type: Option<DutyType>,
    pub description: Option<String>,
    pub image: Option<Option<String>>,
}

impl EquipmentPatch {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Typed predicate for [`EquipmentRepository::get_by_filter`]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EquipmentFilter {
    pub category: Option<Category>,
    pub duty_type: Option<DutyType>,
    pub max_rent: Option<f64>,
    /// Email of the listing owner. Listings carry no owner reference, so a
    /// filter on it never matches.
    pub listing_email: Option<String>,
}

impl EquipmentFilter {
    pub fn by_listing_email(email: impl Into<String>) -> Self {
        Self {
            listing_email: Some(email.into()),
            ..Default::default()
        }
    }

    /// Translates the filter into a SQL condition, or `None` when it can never match.
    fn into_condition(self) -> Option<Condition> {
        if self.listing_email.is_some() {
            return None;
        }

        let mut condition = Condition::all();
        if let Some(category) = self.category {
            condition = condition.add(equipment::Column::Category.eq(category));
        }
        if let Some(duty_type) = self.duty_type {
            condition = condition.add(equipment::Column::DutyType.eq(duty_type));
        }
        if let Some(max_rent) = self.max_rent {
            condition = condition.add(equipment::Column::Rent.lte(max_rent));
        }
        Some(condition)
    }
}

/// Repository for equipment database operations
#[derive(Debug, Clone)]
pub struct EquipmentRepository {
    /// Database connection pool
    pub db: Arc<DatabaseConnection>,
}

impl EquipmentRepository {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Persists a new listing, assigning its id and timestamps.
    pub async fn add(&self, fields: NewEquipment) -> Result<equipment::Model, RepositoryError> {
        let now = Utc::now();

        let listing = equipment::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(fields.name),
            brand: Set(fields.brand),
            price: Set(fields.price),
            rent: Set(fields.rent),
            category: Set(fields.category),
            duty_type: Set(fields.duty_type),
            description: Set(fields.description),
            image: Set(fields.image),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        };

        let created = listing.insert(&*self.db).await?;
        tracing::debug!(equipment_id = %created.id, "Equipment listing created");
        Ok(created)
    }

    /// Returns the whole catalog, newest first.
    pub async fn get_all(&self) -> Result<Vec<equipment::Model>, RepositoryError> {
        let listings = Equipment::find()
            .order_by_desc(equipment::Column::CreatedAt)
            .all(&*self.db)
            .await?;
        Ok(listings)
    }

    pub async fn get_by_id(&self, id: Uuid) -> Result<equipment::Model, RepositoryError> {
        Equipment::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| RepositoryError::not_found(ENTITY, id))
    }

    /// Returns the listings matching `filter`, newest first.
    pub async fn get_by_filter(
        &self,
        filter: EquipmentFilter,
    ) -> Result<Vec<equipment::Model>, RepositoryError> {
        let Some(condition) = filter.into_condition() else {
            return Ok(Vec::new());
        };

        let listings = Equipment::find()
            .filter(condition)
            .order_by_desc(equipment::Column::CreatedAt)
            .all(&*self.db)
            .await?;
        Ok(listings)
    }

    /// Shallow-merges `patch` into the stored listing and refreshes `updated_at`.
    pub async fn update(
        &self,
        id: Uuid,
        patch: EquipmentPatch,
    ) -> Result<equipment::Model, RepositoryError> {
        let existing = self.get_by_id(id).await?;
        let mut listing = existing.into_active_model();

        if let Some(name) = patch.name {
            listing.name = Set(name);
        }
        if let Some(brand) = patch.brand {
            listing.brand = Set(brand);
        }
        if let Some(price) = patch.price {
            listing.price = Set(price);
        }
        if let Some(rent) = patch.rent {
            listing.rent = Set(rent);
        }
        if let Some(category) = patch.category {
            listing.category = Set(category);
        }
        if let Some(duty_type) = patch.duty_type {
            listing.duty_type = Set(duty_type);
        }
        if let Some(description) = patch.description {
            listing.description = Set(description);
        }
        if let Some(image) = patch.image {
            listing.image = Set(image);
        }
        listing.updated_at = Set(Utc::now().into());

        let updated = listing.update(&*self.db).await?;
        tracing::debug!(equipment_id = %updated.id, "Equipment listing updated");
        Ok(updated)
    }

    /// Removes a listing and returns it as it was before deletion.
    pub async fn delete(&self, id: Uuid) -> Result<equipment::Model, RepositoryError> {
        let existing = self.get_by_id(id).await?;
        let snapshot = existing.clone();

        let result = existing.delete(&*self.db).await?;
        if result.rows_affected == 0 {
            // Lost a race with a concurrent delete.
            return Err(RepositoryError::not_found(ENTITY, id));
        }

        tracing::debug!(equipment_id = %id, "Equipment listing deleted");
        Ok(snapshot)
    }
}
