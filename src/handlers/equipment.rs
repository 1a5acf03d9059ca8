//! # Equipment API Handlers
//!
//! CRUD endpoints over the catalog plus the browse and estimate views. Each
//! handler validates its input and delegates to a single store call.

use axum::{
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
    response::Json,
};
use serde_json::json;
use uuid::Uuid;

use crate::booking::{self, RentalDays, RentalQuote};
use crate::catalog::{CatalogQuery, CatalogSummary};
use crate::error::{ApiError, validation_error};
use crate::handlers::types::{
    BrowseParams, CreateEquipmentRequest, EquipmentResponse, EstimateParams,
    UpdateEquipmentRequest, normalize_email,
};
use crate::repositories::EquipmentFilter;
use crate::server::AppState;

fn parse_id(raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|_| {
        validation_error(
            "Malformed equipment id",
            json!({ "id": "must be a UUID" }),
        )
    })
}

fn query_rejection(rejection: QueryRejection) -> ApiError {
    validation_error(
        "Invalid query string",
        json!({ "query": rejection.body_text() }),
    )
}

fn into_responses(listings: Vec<crate::models::equipment::Model>) -> Vec<EquipmentResponse> {
    listings.into_iter().map(EquipmentResponse::from).collect()
}

/// Create a listing
#[utoipa::path(
    post,
    path = "/equipment/add",
    security(("bearer_auth" = [])),
    request_body = CreateEquipmentRequest,
    responses(
        (status = 200, description = "Listing created", body = EquipmentResponse),
        (status = 400, description = "Validation failed", body = ApiError),
        (status = 401, description = "Missing or invalid bearer token", body = ApiError),
        (status = 500, description = "Internal server error", body = ApiError)
    ),
    tag = "equipment"
)]
pub async fn add_equipment(
    State(state): State<AppState>,
    payload: Result<Json<CreateEquipmentRequest>, JsonRejection>,
) -> Result<Json<EquipmentResponse>, ApiError> {
    let Json(request) = payload?;
    let fields = request.validate()?;

    let created = state.equipment.add(fields).await?;
    tracing::info!(equipment_id = %created.id, category = %created.category, "Listing created");

    Ok(Json(created.into()))
}

/// List the whole catalog, newest first
#[utoipa::path(
    get,
    path = "/equipment/getall",
    responses(
        (status = 200, description = "All listings", body = Vec<EquipmentResponse>),
        (status = 500, description = "Internal server error", body = ApiError)
    ),
    tag = "equipment"
)]
pub async fn get_all_equipment(
    State(state): State<AppState>,
) -> Result<Json<Vec<EquipmentResponse>>, ApiError> {
    let listings = state.equipment.get_all().await?;
    Ok(Json(into_responses(listings)))
}

/// Fetch one listing
#[utoipa::path(
    get,
    path = "/equipment/getbyid/{id}",
    params(("id" = Uuid, Path, description = "Listing UUID")),
    responses(
        (status = 200, description = "Listing found", body = EquipmentResponse),
        (status = 400, description = "Malformed id", body = ApiError),
        (status = 404, description = "Listing not found", body = ApiError),
        (status = 500, description = "Internal server error", body = ApiError)
    ),
    tag = "equipment"
)]
pub async fn get_equipment_by_id(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<EquipmentResponse>, ApiError> {
    let id = parse_id(&id)?;
    let listing = state.equipment.get_by_id(id).await?;
    Ok(Json(listing.into()))
}

/// Listings filed under an owner email.
///
/// Listings have no owner reference, so the result is always empty.
#[utoipa::path(
    get,
    path = "/equipment/getbyemail/{email}",
    params(("email" = String, Path, description = "Owner email")),
    responses(
        (status = 200, description = "Matching listings", body = Vec<EquipmentResponse>),
        (status = 400, description = "Malformed email", body = ApiError),
        (status = 500, description = "Internal server error", body = ApiError)
    ),
    tag = "equipment"
)]
pub async fn get_equipment_by_email(
    State(state): State<AppState>,
    Path(email): Path<String>,
) -> Result<Json<Vec<EquipmentResponse>>, ApiError> {
    let email = normalize_email(&email);
    if email.is_empty() || !email.contains('@') {
        return Err(validation_error(
            "Malformed email",
            json!({ "email": "must be a valid email address" }),
        ));
    }

    let listings = state
        .equipment
        .get_by_filter(EquipmentFilter::by_listing_email(email))
        .await?;
    Ok(Json(into_responses(listings)))
}

/// Delete a listing, returning it as it was
#[utoipa::path(
    delete,
    path = "/equipment/delete/{id}",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Listing UUID")),
    responses(
        (status = 200, description = "Listing deleted", body = EquipmentResponse),
        (status = 400, description = "Malformed id", body = ApiError),
        (status = 401, description = "Missing or invalid bearer token", body = ApiError),
        (status = 404, description = "Listing not found", body = ApiError),
        (status = 500, description = "Internal server error", body = ApiError)
    ),
    tag = "equipment"
)]
pub async fn delete_equipment(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<EquipmentResponse>, ApiError> {
    let id = parse_id(&id)?;
    let deleted = state.equipment.delete(id).await?;
    tracing::info!(equipment_id = %id, "Listing deleted");
    Ok(Json(deleted.into()))
}

/// Partially update a listing
#[utoipa::path(
    put,
    path = "/equipment/update/{id}",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Listing UUID")),
    request_body = UpdateEquipmentRequest,
    responses(
        (status = 200, description = "Listing updated", body = EquipmentResponse),
        (status = 400, description = "Validation failed", body = ApiError),
        (status = 401, description = "Missing or invalid bearer token", body = ApiError),
        (status = 404, description = "Listing not found", body = ApiError),
        (status = 500, description = "Internal server error", body = ApiError)
    ),
    tag = "equipment"
)]
pub async fn update_equipment(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<UpdateEquipmentRequest>, JsonRejection>,
) -> Result<Json<EquipmentResponse>, ApiError> {
    let id = parse_id(&id)?;
    let Json(request) = payload?;
    let patch = request.validate()?;

    let updated = state.equipment.update(id, patch).await?;
    tracing::info!(equipment_id = %id, "Listing updated");
    Ok(Json(updated.into()))
}

/// Filtered, searched and sorted view of the catalog
#[utoipa::path(
    get,
    path = "/equipment/browse",
    params(BrowseParams),
    responses(
        (status = 200, description = "Derived catalog view", body = Vec<EquipmentResponse>),
        (status = 400, description = "Unknown category or sort order", body = ApiError),
        (status = 500, description = "Internal server error", body = ApiError)
    ),
    tag = "equipment"
)]
pub async fn browse_equipment(
    State(state): State<AppState>,
    params: Result<Query<BrowseParams>, QueryRejection>,
) -> Result<Json<Vec<EquipmentResponse>>, ApiError> {
    let query = browse_query(params)?;
    let listings = state.equipment.get_all().await?;
    Ok(Json(into_responses(query.apply(listings))))
}

/// Count and rent range of a browse view
#[utoipa::path(
    get,
    path = "/equipment/browse/summary",
    params(BrowseParams),
    responses(
        (status = 200, description = "Summary of the derived view", body = CatalogSummary),
        (status = 400, description = "Unknown category or sort order", body = ApiError),
        (status = 500, description = "Internal server error", body = ApiError)
    ),
    tag = "equipment"
)]
pub async fn browse_summary(
    State(state): State<AppState>,
    params: Result<Query<BrowseParams>, QueryRejection>,
) -> Result<Json<CatalogSummary>, ApiError> {
    let query = browse_query(params)?;
    let listings = state.equipment.get_all().await?;
    Ok(Json(CatalogSummary::of(&query.apply(listings))))
}

fn browse_query(
    params: Result<Query<BrowseParams>, QueryRejection>,
) -> Result<CatalogQuery, ApiError> {
    let Query(params) = params.map_err(query_rejection)?;
    CatalogQuery::parse(
        params.category.as_deref(),
        params.search.as_deref(),
        params.sort.as_deref(),
    )
    .map_err(|err| validation_error("Invalid browse query", json!({ "query": err.to_string() })))
}

/// Rental cost estimate for a listing
#[utoipa::path(
    get,
    path = "/equipment/estimate/{id}",
    params(
        ("id" = Uuid, Path, description = "Listing UUID"),
        EstimateParams
    ),
    responses(
        (status = 200, description = "Itemized estimate", body = RentalQuote),
        (status = 400, description = "Malformed id", body = ApiError),
        (status = 404, description = "Listing not found", body = ApiError),
        (status = 500, description = "Internal server error", body = ApiError)
    ),
    tag = "equipment"
)]
pub async fn estimate_rental(
    State(state): State<AppState>,
    Path(id): Path<String>,
    params: Result<Query<EstimateParams>, QueryRejection>,
) -> Result<Json<RentalQuote>, ApiError> {
    let id = parse_id(&id)?;
    let Query(params) = params.map_err(query_rejection)?;
    let days = params
        .days
        .as_deref()
        .map(RentalDays::parse_lenient)
        .unwrap_or_default();

    let listing = state.equipment.get_by_id(id).await?;
    Ok(Json(booking::quote(listing.rent, days)))
}
