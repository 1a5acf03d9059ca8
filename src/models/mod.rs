//! # Data Models
//!
//! This module contains all the data models used throughout the rentals service.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub mod account;
pub mod equipment;

pub use account::Entity as Account;
pub use equipment::Entity as Equipment;
pub use equipment::{Category, DutyType};

/// Basic service information response
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ServiceInfo {
    /// The name of the service
    pub service: String,
    /// The version of the service
    pub version: String,
}

impl Default for ServiceInfo {
    fn default() -> Self {
        Self {
            service: "rentals".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}
