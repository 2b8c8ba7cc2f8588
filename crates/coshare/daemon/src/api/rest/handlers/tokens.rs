//! Share token handlers

use crate::api::rest::caller::Caller;
use crate::api::rest::handlers::collections::{parse_collection_id, CollectionBody};
use crate::api::rest::state::AppState;
use crate::error::ApiResult;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use coshare_types::{CollectionId, ShareToken};
use serde::{Deserialize, Serialize};

/// Minted token response
#[derive(Debug, Serialize, Deserialize)]
pub struct ShareTokenBody {
    pub token: String,
    pub collection_id: CollectionId,
}

/// Mint an anonymous read token for a collection
pub async fn mint_share_token(
    State(state): State<AppState>,
    Caller(caller): Caller,
    Path(id): Path<String>,
) -> ApiResult<(StatusCode, Json<ShareTokenBody>)> {
    let collection_id = parse_collection_id(&id)?;
    let sharing = state
        .service
        .mint_share_token(&caller, &collection_id)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ShareTokenBody {
            token: sharing.token.into_inner(),
            collection_id: sharing.collection_id,
        }),
    ))
}

/// Revoke a share token
pub async fn revoke_share_token(
    State(state): State<AppState>,
    Caller(caller): Caller,
    Path(token): Path<String>,
) -> ApiResult<StatusCode> {
    state
        .service
        .revoke_share_token(&caller, &ShareToken::new(token))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Anonymous read through a share token
pub async fn get_shared_collection(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> ApiResult<Json<CollectionBody>> {
    let collection = state
        .service
        .get_shared_collection(&ShareToken::new(token))
        .await?;
    Ok(Json(collection.into()))
}
