//! # Server Configuration
//!
//! This module contains the router, shared state and serving loop for the
//! rentals API.

use std::sync::Arc;

use anyhow::Context;
use axum::{
    Router,
    http::{HeaderValue, Method, header},
    middleware,
    routing::{delete, get, post, put},
};
use sea_orm::DatabaseConnection;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};
use utoipa_swagger_ui::SwaggerUi;

use crate::auth::{self, AuthService, SigningSecret};
use crate::config::{AppConfig, ConfigError};
use crate::handlers::{self, equipment, users};
use crate::repositories::{AccountRepository, EquipmentRepository};
use crate::telemetry;

/// Application state containing shared resources
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub db: DatabaseConnection,
    pub equipment: EquipmentRepository,
    pub auth: Arc<AuthService>,
}

impl AppState {
    /// Wires the stores and the authentication service over one connection pool.
    pub fn new(config: Arc<AppConfig>, db: DatabaseConnection) -> Result<Self, ConfigError> {
        let secret = config
            .jwt_secret
            .clone()
            .map(SigningSecret::new)
            .ok_or(ConfigError::MissingJwtSecret)?;

        let shared_db = Arc::new(db.clone());
        let auth = AuthService::new(AccountRepository::new(shared_db.clone()), secret);

        Ok(Self {
            config,
            db,
            equipment: EquipmentRepository::new(shared_db),
            auth: Arc::new(auth),
        })
    }

    /// Replaces the authentication service (e.g. with cheaper hashing parameters).
    pub fn with_auth(mut self, auth: AuthService) -> Self {
        self.auth = Arc::new(auth);
        self
    }
}

/// Creates and configures the Axum application router
pub fn create_app(state: AppState) -> Router {
    let writes = Router::new()
        .route("/equipment/add", post(equipment::add_equipment))
        .route("/equipment/delete/{id}", delete(equipment::delete_equipment))
        .route("/equipment/update/{id}", put(equipment::update_equipment))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_session,
        ));

    let reads = Router::new()
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health))
        .route("/equipment/getall", get(equipment::get_all_equipment))
        .route("/equipment/getbyid/{id}", get(equipment::get_equipment_by_id))
        .route(
            "/equipment/getbyemail/{email}",
            get(equipment::get_equipment_by_email),
        )
        .route("/equipment/browse", get(equipment::browse_equipment))
        .route("/equipment/browse/summary", get(equipment::browse_summary))
        .route("/equipment/estimate/{id}", get(equipment::estimate_rental))
        .route("/user/add", post(users::register))
        .route("/user/authenticate", post(users::authenticate))
        .route("/user/login", post(users::authenticate))
        .route("/user/session", get(users::session));

    let config = state.config.clone();

    reads
        .merge(writes)
        .with_state(state)
        .merge(SwaggerUi::new("/docs").url("/openapi.json", ApiDoc::openapi()))
        .layer(TimeoutLayer::new(config.request_timeout()))
        .layer(cors_layer(&config))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(telemetry::trace_middleware))
}

fn cors_layer(config: &AppConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .cors_allowed_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring unusable CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .expose_headers([telemetry::TRACE_ID_HEADER.clone()])
}

/// Starts the server with the given configuration
pub async fn run_server(config: AppConfig, db: DatabaseConnection) -> anyhow::Result<()> {
    let addr = config
        .bind_addr()
        .with_context(|| format!("Invalid server address: {}", config.api_bind_addr))?;
    let profile = config.profile.clone();

    let state = AppState::new(Arc::new(config), db)?;
    let app = create_app(state);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    tracing::info!(%addr, %profile, "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            tracing::error!(error = %err, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("Received Ctrl+C, shutting down"),
        _ = terminate => tracing::info!("Received SIGTERM, shutting down"),
    }
}

/// Registers the bearer token scheme used by the write endpoints.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi
            .components
            .get_or_insert_with(utoipa::openapi::Components::default);

        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .description(Some("Token issued by POST /user/authenticate"))
                    .build(),
            ),
        );
    }
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    modifiers(&SecurityAddon),
    paths(
        crate::handlers::root,
        crate::handlers::health,
        crate::handlers::equipment::add_equipment,
        crate::handlers::equipment::get_all_equipment,
        crate::handlers::equipment::get_equipment_by_id,
        crate::handlers::equipment::get_equipment_by_email,
        crate::handlers::equipment::delete_equipment,
        crate::handlers::equipment::update_equipment,
        crate::handlers::equipment::browse_equipment,
        crate::handlers::equipment::browse_summary,
        crate::handlers::equipment::estimate_rental,
        crate::handlers::users::register,
        crate::handlers::users::authenticate,
        crate::handlers::users::session,
    ),
    components(
        schemas(
            crate::models::ServiceInfo,
            crate::models::Category,
            crate::models::DutyType,
            crate::error::ApiError,
            crate::handlers::HealthResponse,
            crate::handlers::types::CreateEquipmentRequest,
            crate::handlers::types::UpdateEquipmentRequest,
            crate::handlers::types::EquipmentResponse,
            crate::handlers::types::RegisterRequest,
            crate::handlers::types::AccountResponse,
            crate::handlers::types::AuthenticateRequest,
            crate::handlers::types::TokenResponse,
            crate::handlers::types::SessionResponse,
            crate::booking::RentalQuote,
            crate::booking::LineItem,
            crate::catalog::SortOrder,
            crate::catalog::CatalogSummary,
        )
    ),
    info(
        title = "Equipment Rentals API",
        description = "Catalog, authentication and rental estimates for agricultural equipment",
        version = env!("CARGO_PKG_VERSION"),
    )
)]
pub struct ApiDoc;
