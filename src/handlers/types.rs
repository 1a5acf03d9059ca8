//! # API Request and Response Types
//!
//! Wire DTOs for the equipment and user endpoints together with their
//! boundary validation. Field names are camelCase on the wire; the duty tag
//! travels as `type`.

use std::collections::BTreeMap;
use std::sync::OnceLock;

use chrono::{DateTime, FixedOffset};
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize};
use url::Url;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::catalog::CatalogEntry;
use crate::error::{ApiError, validation_error};
use crate::models::{Category, DutyType, account, equipment};
use crate::repositories::{EquipmentPatch, NewEquipment};

const MIN_DESCRIPTION_LEN: usize = 10;
const NAME_LEN: std::ops::RangeInclusive<usize> = 2..=50;
const MIN_PASSWORD_LEN: usize = 6;
const PASSWORD_SPECIALS: &str = "@$!%*#?&";

/// Field name → message, rendered as the `details` of a validation error
#[derive(Debug, Default)]
pub struct FieldErrors(BTreeMap<&'static str, String>);

impl FieldErrors {
    pub fn add(&mut self, field: &'static str, message: impl Into<String>) {
        self.0.entry(field).or_insert_with(|| message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_result(self) -> Result<(), ApiError> {
        if self.is_empty() {
            return Ok(());
        }
        Err(validation_error(
            "Request validation failed",
            serde_json::to_value(&self.0).unwrap_or_default(),
        ))
    }
}

fn email_pattern() -> &'static Regex {
    static EMAIL: OnceLock<Regex> = OnceLock::new();
    EMAIL.get_or_init(|| {
        Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern compiles")
    })
}

/// Lowercased, trimmed email used for storage and lookup.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn check_positive(errors: &mut FieldErrors, field: &'static str, value: f64) {
    if !value.is_finite() || value <= 0.0 {
        errors.add(field, "must be a positive number");
    }
}

fn check_name(errors: &mut FieldErrors, name: &str) {
    if name.trim().is_empty() {
        errors.add("name", "must not be empty");
    }
}

fn check_description(errors: &mut FieldErrors, description: &str) {
    if description.trim().chars().count() < MIN_DESCRIPTION_LEN {
        errors.add(
            "description",
            format!("must be at least {MIN_DESCRIPTION_LEN} characters"),
        );
    }
}

fn check_image(errors: &mut FieldErrors, image: &str) {
    match Url::parse(image) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => {}
        _ => errors.add("image", "must be an http(s) URL"),
    }
}

fn parse_category(errors: &mut FieldErrors, raw: &str) -> Option<Category> {
    raw.parse()
        .map_err(|_| {
            errors.add(
                "category",
                format!(
                    "must be one of: {}",
                    Category::ALL.map(|c| c.as_str()).join(", ")
                ),
            )
        })
        .ok()
}

fn parse_duty_type(errors: &mut FieldErrors, raw: &str) -> Option<DutyType> {
    raw.parse()
        .map_err(|_| {
            errors.add(
                "type",
                format!(
                    "must be one of: {}",
                    DutyType::ALL.map(|d| d.as_str()).join(", ")
                ),
            )
        })
        .ok()
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Distinguishes an absent field (`None`) from an explicit null (`Some(None)`).
fn explicit_null<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Request payload for creating a listing
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateEquipmentRequest {
    #[schema(example = "John Deere 5075E")]
    pub name: String,
    #[schema(example = "John Deere")]
    pub brand: Option<String>,
    #[schema(example = 45000.0)]
    pub price: f64,
    /// Per-day rental rate
    #[schema(example = 150.0)]
    pub rent: f64,
    #[schema(example = "tractors")]
    pub category: String,
    /// Duty tag: heavy, medium, light or premium
    #[serde(rename = "type")]
    #[schema(example = "medium")]
    pub duty_type: String,
    pub description: String,
    /// URL returned by the image host
    pub image: Option<String>,
}

impl CreateEquipmentRequest {
    /// Checks every field and converts into store input.
    pub fn validate(self) -> Result<NewEquipment, ApiError> {
        let mut errors = FieldErrors::default();

        check_name(&mut errors, &self.name);
        check_positive(&mut errors, "price", self.price);
        check_positive(&mut errors, "rent", self.rent);
        let category = parse_category(&mut errors, &self.category);
        let duty_type = parse_duty_type(&mut errors, &self.duty_type);
        check_description(&mut errors, &self.description);
        let image = non_blank(self.image);
        if let Some(image) = &image {
            check_image(&mut errors, image);
        }
        errors.into_result()?;

        // Both tags parsed, otherwise `errors` was non-empty.
        let (Some(category), Some(duty_type)) = (category, duty_type) else {
            return Err(validation_error("Request validation failed", serde_json::Value::Null));
        };

        Ok(NewEquipment {
            name: self.name.trim().to_string(),
            brand: non_blank(self.brand),
            price: self.price,
            rent: self.rent,
            category,
            duty_type,
            description: self.description.trim().to_string(),
            image,
        })
    }
}

/// Request payload for a partial update; omitted fields are left untouched
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateEquipmentRequest {
    pub name: Option<String>,
    /// `null` clears the brand
    #[serde(default, deserialize_with = "explicit_null", skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<String>)]
    pub brand: Option<Option<String>>,
    pub price: Option<f64>,
    pub rent: Option<f64>,
    pub category: Option<String>,
    #[serde(rename = "type")]
    pub duty_type: Option<String>,
    pub description: Option<String>,
    /// `null` clears the image
    #[serde(default, deserialize_with = "explicit_null", skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<String>)]
    pub image: Option<Option<String>>,
}

impl UpdateEquipmentRequest {
    /// Checks the supplied fields and converts into a store patch.
    pub fn validate(self) -> Result<EquipmentPatch, ApiError> {
        let mut errors = FieldErrors::default();

        if let Some(name) = &self.name {
            check_name(&mut errors, name);
        }
        if let Some(price) = self.price {
            check_positive(&mut errors, "price", price);
        }
        if let Some(rent) = self.rent {
            check_positive(&mut errors, "rent", rent);
        }
        let category = self
            .category
            .as_deref()
            .map(|raw| parse_category(&mut errors, raw));
        let duty_type = self
            .duty_type
            .as_deref()
            .map(|raw| parse_duty_type(&mut errors, raw));
        if let Some(description) = &self.description {
            check_description(&mut errors, description);
        }
        let image = self.image.map(non_blank);
        if let Some(Some(image)) = &image {
            check_image(&mut errors, image);
        }
        errors.into_result()?;

        let patch = EquipmentPatch {
            name: self.name.map(|name| name.trim().to_string()),
            brand: self.brand.map(non_blank),
            price: self.price,
            rent: self.rent,
            category: category.flatten(),
            duty_type: duty_type.flatten(),
            description: self.description.map(|d| d.trim().to_string()),
            image,
        };

        if patch.is_empty() {
            return Err(validation_error(
                "Request validation failed",
                serde_json::json!({ "body": "at least one field must be supplied" }),
            ));
        }
        Ok(patch)
    }
}

/// A listing as returned by the API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EquipmentResponse {
    pub id: Uuid,
    pub name: String,
    pub brand: Option<String>,
    pub price: f64,
    pub rent: f64,
    pub category: Category,
    #[serde(rename = "type")]
    pub duty_type: DutyType,
    pub description: String,
    pub image: Option<String>,
    /// True once the listing has an image
    pub complete: bool,
    pub created_at: DateTime<FixedOffset>,
    pub updated_at: DateTime<FixedOffset>,
}

impl From<equipment::Model> for EquipmentResponse {
    fn from(model: equipment::Model) -> Self {
        Self {
            complete: model.is_complete(),
            id: model.id,
            name: model.name,
            brand: model.brand,
            price: model.price,
            rent: model.rent,
            category: model.category,
            duty_type: model.duty_type,
            description: model.description,
            image: model.image,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

impl CatalogEntry for EquipmentResponse {
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

/// Signup payload
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RegisterRequest {
    #[schema(example = "Asha Patel")]
    pub name: String,
    #[schema(example = "asha@example.com")]
    pub email: String,
    #[schema(example = "Harvest#2025")]
    pub password: String,
}

impl RegisterRequest {
    /// Checks name, email and password rules and normalizes the email.
    pub fn validate(self) -> Result<Self, ApiError> {
        let mut errors = FieldErrors::default();

        let name = self.name.trim().to_string();
        if !NAME_LEN.contains(&name.chars().count()) {
            errors.add(
                "name",
                format!(
                    "must be between {} and {} characters",
                    NAME_LEN.start(),
                    NAME_LEN.end()
                ),
            );
        }

        let email = normalize_email(&self.email);
        if !email_pattern().is_match(&email) {
            errors.add("email", "must be a valid email address");
        }

        if let Err(message) = check_password(&self.password) {
            errors.add("password", message);
        }
        errors.into_result()?;

        Ok(Self {
            name,
            email,
            password: self.password,
        })
    }
}

fn check_password(password: &str) -> Result<(), String> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(format!("must be at least {MIN_PASSWORD_LEN} characters"));
    }
    let has_upper = password.chars().any(|c| c.is_ascii_uppercase());
    let has_lower = password.chars().any(|c| c.is_ascii_lowercase());
    let has_digit = password.chars().any(|c| c.is_ascii_digit());
    let has_special = password.chars().any(|c| PASSWORD_SPECIALS.contains(c));
    if has_upper && has_lower && has_digit && has_special {
        Ok(())
    } else {
        Err(format!(
            "must contain an uppercase letter, a lowercase letter, a digit and one of {PASSWORD_SPECIALS}"
        ))
    }
}

/// Registered account (the password hash is never exposed)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AccountResponse {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub created_at: DateTime<FixedOffset>,
}

impl From<account::Model> for AccountResponse {
    fn from(model: account::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            email: model.email,
            created_at: model.created_at,
        }
    }
}

/// Login payload
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AuthenticateRequest {
    #[schema(example = "asha@example.com")]
    pub email: String,
    pub password: String,
}

/// Issued session token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct TokenResponse {
    pub token: String,
}

/// Identity behind the presented token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    pub id: Uuid,
    pub email: String,
    pub expires_at: DateTime<chrono::Utc>,
}

/// Query string of the browse endpoint
#[derive(Debug, Clone, Default, Serialize, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct BrowseParams {
    /// `all` or a category tag
    pub category: Option<String>,
    /// Case-insensitive match on name or brand
    pub search: Option<String>,
    /// `price-low`, `price-high` or `newest`
    pub sort: Option<String>,
}

/// Query string of the estimate endpoint
#[derive(Debug, Clone, Default, Serialize, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct EstimateParams {
    /// Rental length; values below one or non-numeric count as one day
    pub days: Option<String>,
}
