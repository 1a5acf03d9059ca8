//! Test utilities for database and API testing.
//!
//! This module provides utilities for setting up in-memory SQLite databases
//! with migrations, application state with cheap password hashing, and a
//! bound test server.

use anyhow::{Context, Result};
use argon2::Params;
use migration::{Migrator, MigratorTrait};
use rentals::{
    auth::{AuthService, SigningSecret},
    config::AppConfig,
    models::{Category, DutyType},
    repositories::{AccountRepository, NewEquipment},
    server::{AppState, create_app},
};
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use std::sync::Arc;
use tokio::{net::TcpListener, sync::oneshot, task::JoinHandle};

/// Signing secret shared by test servers and tests that mint tokens directly.
#[allow(dead_code)]
pub const TEST_JWT_SECRET: [u8; 32] = [11u8; 32];

/// Sets up an in-memory SQLite database with all migrations applied.
///
/// The pool is capped at one connection: every SQLite memory connection is
/// its own database.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let mut options = ConnectOptions::new("sqlite::memory:");
    options.max_connections(1).min_connections(1);
    let db = Database::connect(options).await?;

    Migrator::up(&db, None).await?;

    Ok(db)
}

/// Sets up an in-memory SQLite database with all migrations applied and returns an Arc.
#[allow(dead_code)]
pub async fn setup_test_db_arc() -> Result<Arc<DatabaseConnection>> {
    let db = setup_test_db().await?;
    Ok(Arc::new(db))
}

/// Configuration used by API tests.
#[allow(dead_code)]
pub fn test_config(require_auth_for_writes: bool) -> AppConfig {
    AppConfig {
        profile: "test".to_string(),
        database_url: "sqlite::memory:".to_string(),
        db_max_connections: 1,
        jwt_secret: Some(TEST_JWT_SECRET.to_vec()),
        require_auth_for_writes,
        ..Default::default()
    }
}

/// Authentication service with low Argon2 costs so tests stay fast.
#[allow(dead_code)]
pub fn fast_auth_service(db: Arc<DatabaseConnection>) -> AuthService {
    let params = Params::new(1024, 1, 1, None).expect("valid argon2 params");
    AuthService::new(
        AccountRepository::new(db),
        SigningSecret::new(TEST_JWT_SECRET.to_vec()),
    )
    .with_argon2_params(params)
}

/// Builds application state over a fresh migrated database.
#[allow(dead_code)]
pub async fn setup_test_state(config: AppConfig) -> Result<AppState> {
    let db = setup_test_db().await?;
    let state = AppState::new(Arc::new(config), db.clone())?;
    Ok(state.with_auth(fast_auth_service(Arc::new(db))))
}

/// A listing that passes every validation rule.
#[allow(dead_code)]
pub fn sample_listing(name: &str, category: Category, rent: f64) -> NewEquipment {
    NewEquipment {
        name: name.to_string(),
        brand: Some("John Deere".to_string()),
        price: rent * 300.0,
        rent,
        category,
        duty_type: DutyType::Medium,
        description: "Well maintained, serviced every season".to_string(),
        image: Some("https://img.example.com/listing.jpg".to_string()),
    }
}

/// Handle for a server spawned by [`spawn_test_app`].
#[allow(dead_code)]
pub struct TestServerHandle {
    shutdown: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<Result<()>>>,
}

#[allow(dead_code)]
impl TestServerHandle {
    pub async fn shutdown(mut self) -> Result<()> {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        if let Some(task) = self.task.take() {
            task.await??;
        }
        Ok(())
    }
}

impl Drop for TestServerHandle {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
    }
}

/// Binds the full application to a random local port.
#[allow(dead_code)]
pub async fn spawn_test_app(state: AppState) -> (String, TestServerHandle) {
    let app = create_app(state);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server_url = format!("http://{}", addr);

    let (shutdown_tx, shutdown_rx) = oneshot::channel();
    let task = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async {
                let _ = shutdown_rx.await;
            })
            .await
            .context("axum server error")
    });

    (
        server_url,
        TestServerHandle {
            shutdown: Some(shutdown_tx),
            task: Some(task),
        },
    )
}
