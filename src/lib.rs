//! # Equipment Rentals Library
//!
//! This library provides the core functionality for the equipment rentals
//! service: the catalog store, authentication, the catalog query engine, the
//! booking estimator, the HTTP API and a typed client.

pub mod auth;
pub mod booking;
pub mod catalog;
pub mod client;
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod models;
pub mod repositories;
pub mod seeds;
pub mod server;
pub mod telemetry;
pub use migration;
