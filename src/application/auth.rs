//! Token validation seam.
//!
//! The token service is an external collaborator; this trait is the only
//! shape the request boundary knows about it.

use async_trait::async_trait;
use thiserror::Error;

/// The authenticated caller, attached to request extensions after a
/// successful bearer-token check.
#[derive(Debug, Clone)]
pub struct Principal {
    pub subject: String,
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("invalid token")]
    InvalidToken,
    #[error("token validation unavailable: {message}")]
    Unavailable { message: String },
}

#[async_trait]
pub trait TokenValidator: Send + Sync {
    async fn validate(&self, token: &str) -> Result<Principal, AuthError>;
}
