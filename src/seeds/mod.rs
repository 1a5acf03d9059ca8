//! Database seeding functionality
//!
//! This module provides functionality to seed the database with initial data.
//! Seeding only runs when `RENTALS_SEED_DEMO_CATALOG` is enabled.

pub mod equipment;

pub use equipment::seed_demo_catalog;
