//! # Catalog Query Engine
//!
//! Pure filter → search → sort pipeline over an in-memory snapshot of the
//! catalog, plus the summary figures shown beside a view. The engine is
//! generic over [`CatalogEntry`] so the same query runs against stored
//! listings on the server and fetched records in the client.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

use crate::models::{Category, equipment};

/// Sentinel category value that matches every listing.
pub const ALL_CATEGORIES: &str = "all";

/// Fields the query engine needs from a listing
pub trait CatalogEntry {
    fn name(&self) -> &str;
    fn brand(&self) -> Option<&str>;
    fn category(&self) -> Category;
    fn rent(&self) -> f64;
    fn created_at(&self) -> DateTime<FixedOffset>;
}

impl CatalogEntry for equipment::Model {
    fn name(&self) -> &str {
        &self.name
    }

    fn brand(&self) -> Option<&str> {
        self.brand.as_deref()
    }

    fn category(&self) -> Category {
        self.category
    }

    fn rent(&self) -> f64 {
        self.rent
    }

    fn created_at(&self) -> DateTime<FixedOffset> {
        self.created_at
    }
}

/// Rejected query parameter
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    #[error("unknown category '{0}'")]
    UnknownCategory(String),
    #[error("unknown sort order '{0}'")]
    UnknownSort(String),
}

/// Category restriction of a query
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CategoryFilter {
    #[default]
    All,
    Only(Category),
}

impl CategoryFilter {
    pub fn matches(&self, category: Category) -> bool {
        match self {
            CategoryFilter::All => true,
            CategoryFilter::Only(wanted) => *wanted == category,
        }
    }
}

impl FromStr for CategoryFilter {
    type Err = QueryError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        if value == ALL_CATEGORIES {
            return Ok(CategoryFilter::All);
        }
        value
            .parse::<Category>()
            .map(CategoryFilter::Only)
            .map_err(|_| QueryError::UnknownCategory(value.to_string()))
    }
}

impl fmt::Display for CategoryFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CategoryFilter::All => f.write_str(ALL_CATEGORIES),
            CategoryFilter::Only(category) => fmt::Display::fmt(category, f),
        }
    }
}

/// Ordering of the derived view
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "kebab-case")]
pub enum SortOrder {
    /// Ascending daily rent
    PriceLow,
    /// Descending daily rent
    PriceHigh,
    /// Most recently created first
    #[default]
    Newest,
}

impl SortOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::PriceLow => "price-low",
            SortOrder::PriceHigh => "price-high",
            SortOrder::Newest => "newest",
        }
    }

    fn compare<E: CatalogEntry>(&self, a: &E, b: &E) -> Ordering {
        match self {
            SortOrder::PriceLow => a.rent().total_cmp(&b.rent()),
            SortOrder::PriceHigh => b.rent().total_cmp(&a.rent()),
            SortOrder::Newest => b.created_at().cmp(&a.created_at()),
        }
    }
}

impl FromStr for SortOrder {
    type Err = QueryError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "price-low" => Ok(SortOrder::PriceLow),
            "price-high" => Ok(SortOrder::PriceHigh),
            "newest" => Ok(SortOrder::Newest),
            other => Err(QueryError::UnknownSort(other.to_string())),
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A browse request: category, free-text search and sort order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatalogQuery {
    pub category: CategoryFilter,
    pub search: Option<String>,
    pub sort: SortOrder,
}

impl CatalogQuery {
    /// Builds a query from raw string parameters; absent values take defaults.
    pub fn parse(
        category: Option<&str>,
        search: Option<&str>,
        sort: Option<&str>,
    ) -> Result<Self, QueryError> {
        Ok(Self {
            category: category
                .map(str::parse::<CategoryFilter>)
                .transpose()?
                .unwrap_or_default(),
            search: search.map(str::to_string),
            sort: sort
                .map(str::parse::<SortOrder>)
                .transpose()?
                .unwrap_or_default(),
        })
    }

    pub fn with_category(mut self, category: Category) -> Self {
        self.category = CategoryFilter::Only(category);
        self
    }

    pub fn with_search(mut self, term: impl Into<String>) -> Self {
        self.search = Some(term.into());
        self
    }

    pub fn with_sort(mut self, sort: SortOrder) -> Self {
        self.sort = sort;
        self
    }

    /// Filters by category, then by search term, then sorts (stable).
    pub fn apply<E: CatalogEntry>(&self, entries: Vec<E>) -> Vec<E> {
        // Blank terms are ignored; others match as typed, surrounding spaces included.
        let needle = self
            .search
            .as_deref()
            .filter(|term| !term.trim().is_empty())
            .map(str::to_lowercase);

        let mut view: Vec<E> = entries
            .into_iter()
            .filter(|entry| self.category.matches(entry.category()))
            .filter(|entry| match &needle {
                Some(needle) => matches_search(entry, needle),
                None => true,
            })
            .collect();

        view.sort_by(|a, b| self.sort.compare(a, b));
        view
    }
}

/// Headline figures for a catalog view
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CatalogSummary {
    pub count: usize,
    /// `None` when the view is empty
    pub lowest_rent: Option<f64>,
    pub highest_rent: Option<f64>,
}

impl CatalogSummary {
    pub fn of<E: CatalogEntry>(entries: &[E]) -> Self {
        let rents = || entries.iter().map(E::rent);
        Self {
            count: entries.len(),
            lowest_rent: rents().min_by(f64::total_cmp),
            highest_rent: rents().max_by(f64::total_cmp),
        }
    }
}

fn matches_search<E: CatalogEntry>(entry: &E, needle: &str) -> bool {
    entry.name().to_lowercase().contains(needle)
        || entry
            .brand()
            .is_some_and(|brand| brand.to_lowercase().contains(needle))
}
