//! Deferred extractor rejections
//!
//! Subject-scoped handlers take their body and query string as
//! `Result<_, Rejection>`. A rejected value is reported only once the caller
//! holds the level the route requires, so a caller without access gets
//! `Denied` whatever the shape of the request.

use gaia_common::PermissionLevel;
use uuid::Uuid;

use super::CurrentCaregiver;
use crate::error::{ApiError, ApiResult};
use crate::services::access;
use crate::AppState;

/// Unwrap an extracted value, authorizing the caller before reporting a rejection
pub async fn authorized<T, R>(
    state: &AppState,
    caller: &CurrentCaregiver,
    care_subject_id: Uuid,
    required: PermissionLevel,
    extracted: Result<T, R>,
) -> ApiResult<T>
where
    R: Into<ApiError>,
{
    match extracted {
        Ok(value) => Ok(value),
        Err(rejection) => {
            let err: ApiError = rejection.into();
            access::authorize(&state.db, caller.id(), care_subject_id, required).await?;
            Err(err)
        }
    }
}
