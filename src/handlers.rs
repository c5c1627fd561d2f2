use axum::{
    Json,
    extract::{Query, State, rejection::JsonRejection},
};

use crate::{
    error::{AppError, AppResult},
    models::{
        ApiMessage, GetHistoryQuery, GetHistoryResponse, GetNameQuery, GetNameResponse,
        MutationKind, WebhookPayload,
    },
    state::AppState,
};

pub async fn ping() -> Json<ApiMessage> {
    Json(ApiMessage::new("pong"))
}

/// Decodes the webhook envelope and routes to the matching mutation. Any
/// undecodable body or unrecognized payload type is rejected before a
/// mutation is attempted.
pub async fn accept_webhook(
    State(state): State<AppState>,
    payload: Result<Json<WebhookPayload>, JsonRejection>,
) -> AppResult<Json<ApiMessage>> {
    let Json(payload) = payload.map_err(|_| AppError::InvalidRequest)?;

    let kind = match payload.payload_type.as_str() {
        "PersonAdded" => {
            state.persons.add(&payload.payload_content).await?;
            MutationKind::Add
        }
        "PersonRenamed" => {
            state.persons.update(&payload.payload_content).await?;
            MutationKind::Update
        }
        "PersonRemoved" => {
            state.persons.remove(&payload.payload_content).await?;
            MutationKind::Remove
        }
        _ => return Err(AppError::InvalidRequest),
    };

    Ok(Json(ApiMessage::new(format!(
        "Person {} successfully",
        kind.past_tense()
    ))))
}

/// Latest name for a person id; empty string when no record exists.
pub async fn get_name(
    State(state): State<AppState>,
    Query(query): Query<GetNameQuery>,
) -> AppResult<Json<GetNameResponse>> {
    let name = state.persons.latest_name(&query.person_id).await?;
    Ok(Json(GetNameResponse { name }))
}

/// Audit trail for a person id, ordered by sort key.
pub async fn get_history(
    State(state): State<AppState>,
    Query(query): Query<GetHistoryQuery>,
) -> AppResult<Json<GetHistoryResponse>> {
    let history = state.persons.history(&query.person_id).await?;
    Ok(Json(GetHistoryResponse { history }))
}
