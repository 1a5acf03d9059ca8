//! Client-side session context.
//!
//! A [`Session`] is the "current user" of a [`RentalClient`](super::RentalClient).
//! It is restored from a [`SessionStore`] when the client is created and
//! cleared from it on logout. Nothing here is global: the store is handed to
//! the client explicitly.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, Validation};
use tokio::sync::Mutex;
use uuid::Uuid;

use super::ClientError;
use crate::auth::Claims;

/// The signed-in user as seen by the client
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub token: String,
    pub user_id: Uuid,
    pub email: String,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    /// Reads the claims of `token` without checking its signature.
    ///
    /// The client does not hold the signing secret; the server remains the
    /// authority on validity. The claims are only used for display and to
    /// drop tokens that have visibly expired.
    pub fn from_token(token: impl Into<String>) -> Result<Self, ClientError> {
        let token = token.into();

        let mut validation = Validation::new(Algorithm::HS256);
        validation.insecure_disable_signature_validation();
        validation.validate_exp = false;
        validation.set_required_spec_claims(&["exp"]);

        let claims = jsonwebtoken::decode::<Claims>(&token, &DecodingKey::from_secret(&[]), &validation)
            .map_err(|err| ClientError::InvalidToken(err.to_string()))?
            .claims;

        let expires_at = claims
            .expires_at()
            .ok_or_else(|| ClientError::InvalidToken("expiry out of range".to_string()))?;

        Ok(Self {
            token,
            user_id: claims.id,
            email: claims.email,
            expires_at,
        })
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }
}

/// Persistence for the session token between client runs
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn load(&self) -> Result<Option<String>, ClientError>;
    async fn save(&self, token: &str) -> Result<(), ClientError>;
    async fn clear(&self) -> Result<(), ClientError>;
}

/// Keeps the token in a single file
#[derive(Debug, Clone)]
pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl SessionStore for FileSessionStore {
    async fn load(&self) -> Result<Option<String>, ClientError> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => {
                let token = contents.trim();
                Ok((!token.is_empty()).then(|| token.to_string()))
            }
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    async fn save(&self, token: &str) -> Result<(), ClientError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&self.path, token).await?;
        Ok(())
    }

    async fn clear(&self) -> Result<(), ClientError> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}

/// In-process store, for tests and short-lived tools
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    token: Mutex<Option<String>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            token: Mutex::new(Some(token.into())),
        }
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn load(&self) -> Result<Option<String>, ClientError> {
        Ok(self.token.lock().await.clone())
    }

    async fn save(&self, token: &str) -> Result<(), ClientError> {
        *self.token.lock().await = Some(token.to_string());
        Ok(())
    }

    async fn clear(&self) -> Result<(), ClientError> {
        *self.token.lock().await = None;
        Ok(())
    }
}

/// Restores the persisted session, discarding it if it is unreadable or expired.
pub(crate) async fn restore(store: &dyn SessionStore) -> Result<Option<Session>, ClientError> {
    let Some(token) = store.load().await? else {
        return Ok(None);
    };

    match Session::from_token(token) {
        Ok(session) if !session.is_expired() => Ok(Some(session)),
        Ok(session) => {
            tracing::debug!(user_id = %session.user_id, "Discarding expired session");
            store.clear().await?;
            Ok(None)
        }
        Err(err) => {
            tracing::warn!(error = %err, "Discarding unreadable session token");
            store.clear().await?;
            Ok(None)
        }
    }
}
