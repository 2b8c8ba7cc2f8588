//! Authenticated caller extraction

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use coshare_service::RequestMetadata;
use coshare_types::Identity;

use super::state::AppState;
use crate::error::ApiError;

/// Identity of the caller, resolved from request headers. Rejects with 401
/// when the headers do not name a complete identity.
#[derive(Debug, Clone, Copy)]
pub struct Caller(pub Identity);

#[async_trait]
impl FromRequestParts<AppState> for Caller {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let metadata: RequestMetadata = parts
            .headers
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|value| (name.as_str(), value.to_string()))
            })
            .collect();

        let identity = state.service.authenticate(&metadata)?;
        Ok(Caller(identity))
    }
}
