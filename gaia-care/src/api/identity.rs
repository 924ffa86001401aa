//! Caller identity extraction
//!
//! Authentication happens in the gateway in front of this service, which
//! forwards the authenticated caregiver's id in `X-Caregiver-Id`. The id is
//! resolved against the identity store once per request and handed to the
//! handler as an explicit value.

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use gaia_common::db::models::Caregiver;
use uuid::Uuid;

use crate::db::caregivers;
use crate::error::ApiError;
use crate::AppState;

/// Header carrying the authenticated caregiver id
pub const CAREGIVER_HEADER: &str = "x-caregiver-id";

/// The caregiver making the request
#[derive(Debug, Clone)]
pub struct CurrentCaregiver(pub Caregiver);

impl CurrentCaregiver {
    pub fn id(&self) -> Uuid {
        self.0.id
    }
}

#[async_trait]
impl FromRequestParts<AppState> for CurrentCaregiver {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let value = parts
            .headers
            .get(CAREGIVER_HEADER)
            .ok_or_else(|| ApiError::Unauthenticated("Missing X-Caregiver-Id header".to_string()))?;

        let id = value
            .to_str()
            .ok()
            .and_then(|s| Uuid::parse_str(s.trim()).ok())
            .ok_or_else(|| ApiError::Unauthenticated("Malformed X-Caregiver-Id header".to_string()))?;

        match caregivers::get_caregiver(&state.db, id).await? {
            Some(caregiver) => Ok(CurrentCaregiver(caregiver)),
            None => Err(ApiError::Unauthenticated(format!("Unknown caregiver {}", id))),
        }
    }
}
