//! Equipment entity model
//!
//! This module contains the SeaORM entity model for the equipment table,
//! which stores the rentable listings that make up the catalog.

use std::fmt;
use std::str::FromStr;

use sea_orm::ActiveModelBehavior;
use sea_orm::entity::prelude::*;
use sea_orm::prelude::DateTimeWithTimeZone;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Catalog category a listing is filed under
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize, ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "lowercase")]
pub enum Category {
    #[sea_orm(string_value = "tractors")]
    Tractors,
    #[sea_orm(string_value = "harvesters")]
    Harvesters,
    #[sea_orm(string_value = "plows")]
    Plows,
    #[sea_orm(string_value = "sprayers")]
    Sprayers,
    #[sea_orm(string_value = "seeders")]
    Seeders,
    #[sea_orm(string_value = "tillers")]
    Tillers,
}

impl Category {
    pub const ALL: [Category; 6] = [
        Category::Tractors,
        Category::Harvesters,
        Category::Plows,
        Category::Sprayers,
        Category::Seeders,
        Category::Tillers,
    ];

    /// The stored tag for this category
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Tractors => "tractors",
            Category::Harvesters => "harvesters",
            Category::Plows => "plows",
            Category::Sprayers => "sprayers",
            Category::Seeders => "seeders",
            Category::Tillers => "tillers",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = UnknownTag;

    /// Exact, case-sensitive match on the stored tag.
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|category| category.as_str() == value)
            .ok_or_else(|| UnknownTag(value.to_string()))
    }
}

/// Duty class of a listing
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize, ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "lowercase")]
pub enum DutyType {
    #[sea_orm(string_value = "heavy")]
    Heavy,
    #[sea_orm(string_value = "medium")]
    Medium,
    #[sea_orm(string_value = "light")]
    Light,
    #[sea_orm(string_value = "premium")]
    Premium,
}

impl DutyType {
    pub const ALL: [DutyType; 4] = [
        DutyType::Heavy,
        DutyType::Medium,
        DutyType::Light,
        DutyType::Premium,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DutyType::Heavy => "heavy",
            DutyType::Medium => "medium",
            DutyType::Light => "light",
            DutyType::Premium => "premium",
        }
    }
}

impl fmt::Display for DutyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DutyType {
    type Err = UnknownTag;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        DutyType::ALL
            .into_iter()
            .find(|duty| duty.as_str() == value)
            .ok_or_else(|| UnknownTag(value.to_string()))
    }
}

/// Returned when a category or duty tag does not name a known variant
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown tag '{0}'")]
pub struct UnknownTag(pub String);

/// Equipment entity representing one rentable asset
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "equipment")]
pub struct Model {
    /// Unique identifier for the listing (primary key)
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// Display name, never empty
    pub name: String,

    /// Manufacturer (optional)
    pub brand: Option<String>,

    /// Replacement/reference value of the asset
    pub price: f64,

    /// Per-day rental rate
    pub rent: f64,

    /// Catalog category tag
    pub category: Category,

    /// Duty class tag (exposed as `type` on the wire)
    pub duty_type: DutyType,

    /// Free-form description
    pub description: String,

    /// URL of the externally hosted image
    pub image: Option<String>,

    /// Timestamp when the listing was created
    pub created_at: DateTimeWithTimeZone,

    /// Timestamp of the last mutation
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// A listing is complete once it carries an image reference.
    pub fn is_complete(&self) -> bool {
        self.image.as_deref().is_some_and(|image| !image.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_tags_parse_exactly() {
        for category in Category::ALL {
            assert_eq!(category.as_str().parse::<Category>(), Ok(category));
        }
        assert!("Tractors".parse::<Category>().is_err());
        assert!("all".parse::<Category>().is_err());
    }

    #[test]
    fn duty_type_serializes_as_lowercase_tag() {
        let value = serde_json::to_value(DutyType::Premium).unwrap();
        assert_eq!(value, serde_json::json!("premium"));
        assert_eq!("medium".parse::<DutyType>(), Ok(DutyType::Medium));
    }
}
