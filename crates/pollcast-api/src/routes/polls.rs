use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};
use pollcast_core::AppState;
use pollcast_models::{Poll, VoteStatus};
use serde::Deserialize;

use crate::error::ApiError;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePollRequest {
    #[serde(default)]
    pub question: String,
    #[serde(default)]
    pub options: Vec<String>,
    #[serde(default)]
    pub allow_multiple_answers: bool,
}

// Missing fields fall through to the voting rules so that a repeat request
// from a known voter is reported as a duplicate, whatever else it lacks.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteRequest {
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub option_indices: Vec<i64>,
}

pub async fn list_polls(State(state): State<AppState>) -> Result<Json<Vec<Poll>>, ApiError> {
    let polls = pollcast_core::polls::list_polls(&state.db).await?;
    Ok(Json(polls))
}

pub async fn get_poll(
    State(state): State<AppState>,
    Path(poll_id): Path<String>,
) -> Result<Json<Poll>, ApiError> {
    let poll = pollcast_core::polls::get_poll(&state.db, &poll_id).await?;
    Ok(Json(poll))
}

pub async fn create_poll(
    State(state): State<AppState>,
    body: Result<Json<CreatePollRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Poll>), ApiError> {
    let Json(body) = body?;
    let poll = pollcast_core::polls::create_poll(
        &state.db,
        &body.question,
        &body.options,
        body.allow_multiple_answers,
    )
    .await?;
    Ok((StatusCode::CREATED, Json(poll)))
}

pub async fn check_vote(
    State(state): State<AppState>,
    Path((poll_id, user_id)): Path<(String, String)>,
) -> Result<Json<VoteStatus>, ApiError> {
    let status = pollcast_core::polls::check_vote_status(&state.db, &poll_id, &user_id).await?;
    Ok(Json(status))
}

pub async fn vote(
    State(state): State<AppState>,
    Path(poll_id): Path<String>,
    body: Result<Json<VoteRequest>, JsonRejection>,
) -> Result<Json<Poll>, ApiError> {
    let Json(body) = body?;
    let poll = pollcast_core::polls::cast_vote(
        &state.db,
        &state.poll_locks,
        &poll_id,
        &body.user_id,
        &body.option_indices,
        state.config.vote_write_attempts,
    )
    .await?;
    Ok(Json(poll))
}
