//! Collection handlers

use crate::api::rest::caller::Caller;
use crate::api::rest::state::AppState;
use crate::error::{ApiError, ApiResult};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use coshare_types::{Collection, CollectionDraft, CollectionId};
use serde::{Deserialize, Serialize};

/// Collection as exposed over the wire. Ownership stays server-side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionBody {
    pub id: CollectionId,
    pub data: String,
    pub org_view: bool,
    pub org_edit: bool,
    pub org_share: bool,
}

impl From<Collection> for CollectionBody {
    fn from(collection: Collection) -> Self {
        Self {
            id: collection.id,
            data: collection.data,
            org_view: collection.org_view,
            org_edit: collection.org_edit,
            org_share: collection.org_share,
        }
    }
}

/// Unparseable ids name no collection.
pub(crate) fn parse_collection_id(raw: &str) -> ApiResult<CollectionId> {
    raw.parse().map_err(|_| ApiError::collection_not_found())
}

/// Create a collection owned by the caller
pub async fn create_collection(
    State(state): State<AppState>,
    Caller(caller): Caller,
    Json(draft): Json<CollectionDraft>,
) -> ApiResult<(StatusCode, Json<CollectionBody>)> {
    let collection = state.service.create_collection(&caller, draft).await?;
    Ok((StatusCode::CREATED, Json(collection.into())))
}

/// Get a collection the caller may read
pub async fn get_collection(
    State(state): State<AppState>,
    Caller(caller): Caller,
    Path(id): Path<String>,
) -> ApiResult<Json<CollectionBody>> {
    let collection_id = parse_collection_id(&id)?;
    let collection = state
        .service
        .get_collection(&caller, &collection_id)
        .await
        .map_err(ApiError::concealing_denial)?;

    Ok(Json(collection.into()))
}

/// Replace a collection's data and grants
pub async fn update_collection(
    State(state): State<AppState>,
    Caller(caller): Caller,
    Path(id): Path<String>,
    Json(draft): Json<CollectionDraft>,
) -> ApiResult<Json<CollectionBody>> {
    let collection_id = parse_collection_id(&id)?;

    // Owner fields are ignored by the store; the caller's are placeholders.
    let mut payload = Collection::from_draft(draft, &caller);
    payload.id = collection_id;

    let updated = state.service.update_collection(&caller, payload).await?;
    Ok(Json(updated.into()))
}

/// Delete a collection and its share tokens
pub async fn delete_collection(
    State(state): State<AppState>,
    Caller(caller): Caller,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    let collection_id = parse_collection_id(&id)?;
    state
        .service
        .delete_collection(&caller, &collection_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
