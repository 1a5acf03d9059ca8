//! # Authentication and Authorization
//!
//! Account registration, credential verification and session tokens.
//!
//! Passwords are stored as salted Argon2id hashes. Authentication failures are
//! reported as a single [`AuthError::InvalidCredentials`] whether the email is
//! unknown or the password is wrong. Successful authentication yields an HS256
//! token carrying the account id and email, valid for [`TOKEN_TTL`].

use std::sync::Arc;

use argon2::{
    Argon2, Params,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use axum::{
    extract::{FromRequestParts, Request, State},
    http::{HeaderMap, header::AUTHORIZATION, request::Parts},
    middleware::Next,
    response::Response,
};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use metrics::counter;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::OnceCell;
use uuid::Uuid;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::{ApiError, ErrorType, RepositoryError, unauthorized};
use crate::models::account;
use crate::repositories::{AccountRepository, NewAccount};
use crate::server::AppState;

/// Validity window of an issued token.
pub const TOKEN_TTL: Duration = Duration::hours(1);

/// Authentication errors
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("unauthenticated: {0}")]
    Unauthenticated(&'static str),
    #[error("password hashing failed: {0}")]
    Hashing(String),
    #[error("token signing failed: {0}")]
    Signing(#[from] jsonwebtoken::errors::Error),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl From<AuthError> for ApiError {
    fn from(error: AuthError) -> Self {
        match error {
            AuthError::InvalidCredentials => ErrorType::InvalidCredentials.into(),
            AuthError::Unauthenticated(reason) => unauthorized(Some(reason)),
            AuthError::Repository(err) => err.into(),
            other => {
                tracing::error!(error = %other, "Authentication service failure");
                ErrorType::InternalServerError.into()
            }
        }
    }
}

/// HMAC secret for token signing, wiped from memory on drop
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct SigningSecret(Vec<u8>);

impl SigningSecret {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl std::fmt::Debug for SigningSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SigningSecret([REDACTED])")
    }
}

/// Claims carried by a session token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Account id
    pub id: Uuid,
    pub email: String,
    /// Issued-at, seconds since the epoch
    pub iat: i64,
    /// Expiry, seconds since the epoch
    pub exp: i64,
}

impl Claims {
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.exp, 0)
    }
}

/// A freshly issued token
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub claims: Claims,
}

/// Registers accounts, verifies credentials and issues/verifies tokens.
#[derive(Clone)]
pub struct AuthService {
    accounts: AccountRepository,
    secret: SigningSecret,
    hasher: Argon2<'static>,
    dummy_hash: Arc<OnceCell<String>>,
}

impl std::fmt::Debug for AuthService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthService")
            .field("accounts", &self.accounts)
            .field("secret", &self.secret)
            .finish_non_exhaustive()
    }
}

impl AuthService {
    pub fn new(accounts: AccountRepository, secret: SigningSecret) -> Self {
        Self {
            accounts,
            secret,
            hasher: Argon2::default(),
            dummy_hash: Arc::new(OnceCell::new()),
        }
    }

    /// Overrides the Argon2 cost parameters (lower costs are useful in tests).
    pub fn with_argon2_params(mut self, params: Params) -> Self {
        self.hasher = Argon2::new(argon2::Algorithm::Argon2id, argon2::Version::V0x13, params);
        self.dummy_hash = Arc::new(OnceCell::new());
        self
    }

    pub fn accounts(&self) -> &AccountRepository {
        &self.accounts
    }

    /// Creates an account with a hashed password.
    pub async fn register(
        &self,
        name: String,
        email: String,
        password: String,
    ) -> Result<account::Model, AuthError> {
        // Checked before hashing; concurrent signups are settled by the unique index.
        if self.accounts.find_by_email(&email).await?.is_some() {
            return Err(RepositoryError::DuplicateEmail.into());
        }

        let password_hash = self.hash_password(password).await?;
        let account = self
            .accounts
            .create(NewAccount {
                name,
                email,
                password_hash,
            })
            .await?;

        counter!("rentals_registrations_total").increment(1);
        tracing::info!(account_id = %account.id, "Account registered");
        Ok(account)
    }

    /// Verifies credentials and issues a session token.
    pub async fn authenticate(&self, email: &str, password: String) -> Result<IssuedToken, AuthError> {
        let Some(account) = self.accounts.find_by_email(email).await? else {
            // Spend the same hashing work as a real comparison before failing.
            let dummy = self.dummy_hash().await?;
            let _ = self.verify_password(dummy, password).await?;
            return Err(self.reject());
        };

        if !self
            .verify_password(account.password_hash.clone(), password)
            .await?
        {
            return Err(self.reject());
        }

        let issued = self.issue_token(&account, Utc::now())?;
        counter!("rentals_authentications_total", "outcome" => "success").increment(1);
        tracing::info!(account_id = %account.id, "Account authenticated");
        Ok(issued)
    }

    /// Signs a token for `account` valid from `issued_at` for [`TOKEN_TTL`].
    pub fn issue_token(
        &self,
        account: &account::Model,
        issued_at: DateTime<Utc>,
    ) -> Result<IssuedToken, AuthError> {
        let claims = Claims {
            id: account.id,
            email: account.email.clone(),
            iat: issued_at.timestamp(),
            exp: (issued_at + TOKEN_TTL).timestamp(),
        };

        let token = jsonwebtoken::encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )?;

        Ok(IssuedToken { token, claims })
    }

    /// Checks signature and expiry. Every failure is "unauthenticated".
    pub fn verify_token(&self, token: &str) -> Result<Claims, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.validate_exp = true;
        validation.set_required_spec_claims(&["exp"]);

        jsonwebtoken::decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &validation,
        )
        .map(|data| data.claims)
        .map_err(|err| {
            tracing::debug!(error = %err, "Rejected session token");
            AuthError::Unauthenticated("Invalid or expired token")
        })
    }

    fn reject(&self) -> AuthError {
        counter!("rentals_authentications_total", "outcome" => "invalid_credentials").increment(1);
        tracing::info!("Authentication rejected");
        AuthError::InvalidCredentials
    }

    async fn hash_password(&self, password: String) -> Result<String, AuthError> {
        let hasher = self.hasher.clone();
        tokio::task::spawn_blocking(move || {
            let salt = SaltString::generate(&mut OsRng);
            hasher
                .hash_password(password.as_bytes(), &salt)
                .map(|hash| hash.to_string())
                .map_err(|e| AuthError::Hashing(e.to_string()))
        })
        .await
        .map_err(|e| AuthError::Hashing(e.to_string()))?
    }

    async fn verify_password(&self, stored_hash: String, password: String) -> Result<bool, AuthError> {
        let hasher = self.hasher.clone();
        tokio::task::spawn_blocking(move || {
            let parsed =
                PasswordHash::new(&stored_hash).map_err(|e| AuthError::Hashing(e.to_string()))?;
            Ok(hasher.verify_password(password.as_bytes(), &parsed).is_ok())
        })
        .await
        .map_err(|e| AuthError::Hashing(e.to_string()))?
    }

    async fn dummy_hash(&self) -> Result<String, AuthError> {
        self.dummy_hash
            .get_or_try_init(|| self.hash_password(Uuid::new_v4().to_string()))
            .await
            .cloned()
    }
}

/// Identity of the caller, established from a verified bearer token
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub Claims);

/// Gate for write endpoints.
///
/// When `require_auth_for_writes` is enabled the request must carry a valid
/// bearer token; the verified identity is attached as [`AuthenticatedUser`].
pub async fn require_session(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    if !state.config.require_auth_for_writes {
        return Ok(next.run(request).await);
    }

    let token = extract_bearer_token(request.headers())?;
    let claims = state.auth.verify_token(token)?;
    tracing::debug!(account_id = %claims.id, "Authenticated write request");

    request.extensions_mut().insert(AuthenticatedUser(claims));
    Ok(next.run(request).await)
}

fn extract_bearer_token(headers: &HeaderMap) -> Result<&str, ApiError> {
    let header = headers
        .get(AUTHORIZATION)
        .ok_or_else(|| unauthorized(Some("Missing Authorization header")))?
        .to_str()
        .map_err(|_| unauthorized(Some("Invalid Authorization header")))?;

    header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or_else(|| unauthorized(Some("Authorization header must use Bearer scheme")))
}

impl FromRequestParts<AppState> for AuthenticatedUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        if let Some(user) = parts.extensions.get::<AuthenticatedUser>() {
            return Ok(user.clone());
        }

        let token = extract_bearer_token(&parts.headers)?;
        let claims = state.auth.verify_token(token)?;
        Ok(AuthenticatedUser(claims))
    }
}
