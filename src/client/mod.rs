//! # Rentals API Client
//!
//! Typed HTTP client for the rentals API. The client owns an explicit
//! [`Session`]: it is restored from a [`SessionStore`] at construction, set by
//! [`RentalClient::login`] and torn down by [`RentalClient::logout`]. Catalog
//! browsing and rental estimates run locally on fetched data through the same
//! query engine and estimator the server uses.

use std::sync::Arc;

use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::{Deserialize, de::DeserializeOwned};
use thiserror::Error;
use url::Url;
use uuid::Uuid;

use crate::booking::{self, RentalDays, RentalQuote};
use crate::catalog::{CatalogQuery, CatalogSummary};
use crate::handlers::types::{
    AccountResponse, AuthenticateRequest, CreateEquipmentRequest, EquipmentResponse,
    RegisterRequest, SessionResponse, TokenResponse, UpdateEquipmentRequest,
};

pub mod session;

pub use session::{FileSessionStore, MemorySessionStore, Session, SessionStore};

/// Errors returned by [`RentalClient`]
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("API request failed with status {status} ({code}): {message}")]
    Api {
        status: u16,
        code: String,
        message: String,
    },

    #[error("URL parsing error: {0}")]
    Url(#[from] url::ParseError),

    #[error("Session store error: {0}")]
    SessionStore(#[from] std::io::Error),

    #[error("Invalid session token: {0}")]
    InvalidToken(String),

    #[error("Not signed in")]
    NotAuthenticated,
}

impl ClientError {
    /// The API error code, when the server answered with an error payload.
    pub fn code(&self) -> Option<&str> {
        match self {
            ClientError::Api { code, .. } => Some(code),
            _ => None,
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    code: String,
    message: String,
}

/// Client for the rentals API
pub struct RentalClient {
    http: reqwest::Client,
    base_url: Url,
    store: Arc<dyn SessionStore>,
    session: Option<Session>,
}

impl RentalClient {
    /// Creates a client and restores any persisted, unexpired session.
    pub async fn connect(base_url: &str, store: Arc<dyn SessionStore>) -> Result<Self, ClientError> {
        Self::with_http_client(reqwest::Client::new(), base_url, store).await
    }

    pub async fn with_http_client(
        http: reqwest::Client,
        base_url: &str,
        store: Arc<dyn SessionStore>,
    ) -> Result<Self, ClientError> {
        let mut base_url = Url::parse(base_url)?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let session = session::restore(store.as_ref()).await?;

        Ok(Self {
            http,
            base_url,
            store,
            session,
        })
    }

    /// The signed-in user, if any
    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.session.as_ref().is_some_and(|session| !session.is_expired())
    }

    pub async fn register(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<AccountResponse, ClientError> {
        let body = RegisterRequest {
            name: name.to_string(),
            email: email.to_string(),
            password: password.to_string(),
        };
        let request = self.request(Method::POST, "user/add")?.json(&body);
        self.send(request).await
    }

    /// Authenticates, persists the token and makes it the current session.
    pub async fn login(&mut self, email: &str, password: &str) -> Result<&Session, ClientError> {
        let body = AuthenticateRequest {
            email: email.to_string(),
            password: password.to_string(),
        };
        let request = self.request(Method::POST, "user/login")?.json(&body);
        let TokenResponse { token } = self.send(request).await?;

        let session = Session::from_token(token)?;
        self.store.save(&session.token).await?;
        tracing::debug!(user_id = %session.user_id, "Signed in");

        Ok(&*self.session.insert(session))
    }

    /// Drops the current session and clears it from the store.
    pub async fn logout(&mut self) -> Result<(), ClientError> {
        self.session = None;
        self.store.clear().await
    }

    /// Asks the server whether the current token is still accepted.
    pub async fn current_session(&self) -> Result<SessionResponse, ClientError> {
        let request = self.authorized(Method::GET, "user/session")?;
        self.send(request).await
    }

    pub async fn list_equipment(&self) -> Result<Vec<EquipmentResponse>, ClientError> {
        let request = self.request(Method::GET, "equipment/getall")?;
        self.send(request).await
    }

    pub async fn get_equipment(&self, id: Uuid) -> Result<EquipmentResponse, ClientError> {
        let request = self.request(Method::GET, &format!("equipment/getbyid/{id}"))?;
        self.send(request).await
    }

    pub async fn equipment_by_email(&self, email: &str) -> Result<Vec<EquipmentResponse>, ClientError> {
        let mut url = self.base_url.join("equipment/getbyemail/")?;
        url.path_segments_mut()
            .map_err(|_| url::ParseError::RelativeUrlWithCannotBeABaseBase)?
            .pop_if_empty()
            .push(email);
        self.send(self.http.get(url)).await
    }

    pub async fn add_equipment(
        &self,
        listing: &CreateEquipmentRequest,
    ) -> Result<EquipmentResponse, ClientError> {
        let request = self.authorized(Method::POST, "equipment/add")?.json(listing);
        self.send(request).await
    }

    pub async fn update_equipment(
        &self,
        id: Uuid,
        changes: &UpdateEquipmentRequest,
    ) -> Result<EquipmentResponse, ClientError> {
        let request = self
            .authorized(Method::PUT, &format!("equipment/update/{id}"))?
            .json(changes);
        self.send(request).await
    }

    pub async fn delete_equipment(&self, id: Uuid) -> Result<EquipmentResponse, ClientError> {
        let request = self.authorized(Method::DELETE, &format!("equipment/delete/{id}"))?;
        self.send(request).await
    }

    /// Fetches the catalog and applies `query` locally.
    pub async fn browse(&self, query: &CatalogQuery) -> Result<Vec<EquipmentResponse>, ClientError> {
        let listings = self.list_equipment().await?;
        Ok(query.apply(listings))
    }

    /// Count and rent range of the view `query` selects.
    pub async fn browse_summary(&self, query: &CatalogQuery) -> Result<CatalogSummary, ClientError> {
        let view = self.browse(query).await?;
        Ok(CatalogSummary::of(&view))
    }

    /// Fetches a listing and prices a rental of `days` locally.
    pub async fn estimate(
        &self,
        id: Uuid,
        days: impl Into<RentalDays>,
    ) -> Result<RentalQuote, ClientError> {
        let listing = self.get_equipment(id).await?;
        Ok(booking::quote(listing.rent, days))
    }

    fn request(&self, method: Method, path: &str) -> Result<RequestBuilder, ClientError> {
        let url = self.base_url.join(path)?;
        Ok(self.http.request(method, url))
    }

    /// Builds a request carrying the session token; fails locally when signed out.
    fn authorized(&self, method: Method, path: &str) -> Result<RequestBuilder, ClientError> {
        let session = self
            .session
            .as_ref()
            .filter(|session| !session.is_expired())
            .ok_or(ClientError::NotAuthenticated)?;
        Ok(self.request(method, path)?.bearer_auth(&session.token))
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ClientError> {
        let response = request.send().await?;
        if response.status().is_success() {
            return Ok(response.json().await?);
        }
        Err(Self::api_error(response).await)
    }

    async fn api_error(response: Response) -> ClientError {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();

        match serde_json::from_str::<ErrorBody>(&body) {
            Ok(ErrorBody { code, message }) => ClientError::Api {
                status: status.as_u16(),
                code,
                message,
            },
            Err(_) => ClientError::Api {
                status: status.as_u16(),
                code: fallback_code(status).to_string(),
                message: body,
            },
        }
    }
}

fn fallback_code(status: StatusCode) -> &'static str {
    match status {
        StatusCode::BAD_REQUEST => "VALIDATION_FAILED",
        StatusCode::UNAUTHORIZED => "UNAUTHORIZED",
        StatusCode::FORBIDDEN => "INVALID_CREDENTIALS",
        StatusCode::NOT_FOUND => "NOT_FOUND",
        StatusCode::CONFLICT => "DUPLICATE_EMAIL",
        StatusCode::SERVICE_UNAVAILABLE => "SERVICE_UNAVAILABLE",
        _ => "INTERNAL_SERVER_ERROR",
    }
}
