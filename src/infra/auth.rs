//! Static stand-in for the external token service.
//!
//! Production deployments are expected to point the boundary at a real
//! validator; this one answers from a configured token table and never
//! reports an infrastructure failure.

use std::collections::HashMap;

use async_trait::async_trait;

use crate::application::auth::{AuthError, Principal, TokenValidator};
use crate::config::AuthTokenSettings;

pub struct StaticTokenValidator {
    subjects: HashMap<String, String>,
}

impl StaticTokenValidator {
    pub fn new(tokens: &[AuthTokenSettings]) -> Self {
        let subjects = tokens
            .iter()
            .map(|entry| (entry.token.clone(), entry.subject.clone()))
            .collect();
        Self { subjects }
    }
}

#[async_trait]
impl TokenValidator for StaticTokenValidator {
    async fn validate(&self, token: &str) -> Result<Principal, AuthError> {
        match self.subjects.get(token) {
            Some(subject) => Ok(Principal {
                subject: subject.clone(),
            }),
            None => Err(AuthError::InvalidToken),
        }
    }
}
