//! # Repository Layer
//!
//! This module contains repository implementations that encapsulate SeaORM operations
//! for the equipment catalog and user accounts.

pub mod account;
pub mod equipment;

pub use account::{AccountRepository, NewAccount};
pub use equipment::{EquipmentFilter, EquipmentPatch, EquipmentRepository, NewEquipment};
