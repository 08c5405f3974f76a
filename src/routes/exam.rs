use std::collections::HashMap;

use axum::body::Bytes;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::exam::{ExamSubmission, UserId, WordId, WordItem};
use crate::response::AppError;
use crate::state::AppState;

#[derive(Serialize)]
struct SuccessResponse<T> {
    success: bool,
    data: T,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GenerateRequest {
    #[serde(default)]
    count: Option<i64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SubmitRequest {
    user_id: UserId,
    #[serde(default)]
    answers: HashMap<WordId, String>,
    exam_words: Vec<WordItem>,
    #[serde(default)]
    exam_time_seconds: Option<i64>,
    #[serde(default)]
    paper_id: Option<Uuid>,
}

/// An empty body means "default count"; anything else must be a valid
/// `GenerateRequest`.
pub(crate) async fn generate(State(state): State<AppState>, body: Bytes) -> Response {
    let request = match parse_generate_request(&body) {
        Ok(request) => request,
        Err(err) => {
            tracing::debug!(error = %err, "invalid generate body");
            return AppError::validation("请求参数不合法").into_response();
        }
    };

    let engine = state.engine();
    let count = request
        .count
        .unwrap_or(engine.policy().default_question_count);

    match engine.generate_uniform_paper(count).await {
        Ok(paper) => Json(SuccessResponse {
            success: true,
            data: paper,
        })
        .into_response(),
        Err(err) => AppError::from(err).into_response(),
    }
}

fn parse_generate_request(body: &[u8]) -> Result<GenerateRequest, serde_json::Error> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(GenerateRequest::default());
    }
    serde_json::from_slice(body)
}

pub(crate) async fn submit(
    State(state): State<AppState>,
    payload: Result<Json<SubmitRequest>, JsonRejection>,
) -> Response {
    let Json(payload) = match payload {
        Ok(payload) => payload,
        Err(rejection) => {
            tracing::debug!(error = %rejection, "invalid exam submission body");
            return AppError::validation("请求参数不合法").into_response();
        }
    };

    let submission = ExamSubmission {
        paper_id: payload.paper_id,
        words: payload.exam_words,
        answers: payload.answers,
        exam_time_seconds: payload.exam_time_seconds.unwrap_or(0),
    };

    match state.engine().submit_exam(payload.user_id, submission).await {
        Ok(summary) => Json(SuccessResponse {
            success: true,
            data: summary,
        })
        .into_response(),
        Err(err) => AppError::from(err).into_response(),
    }
}

pub(crate) async fn records(State(state): State<AppState>, Path(user_id): Path<UserId>) -> Response {
    match state.engine().exam_records(user_id).await {
        Ok(records) => Json(SuccessResponse {
            success: true,
            data: records,
        })
        .into_response(),
        Err(err) => AppError::from(err).into_response(),
    }
}

pub(crate) async fn word_errors(
    State(state): State<AppState>,
    Path(user_id): Path<UserId>,
) -> Response {
    match state.engine().word_errors(user_id).await {
        Ok(errors) => Json(SuccessResponse {
            success: true,
            data: errors,
        })
        .into_response(),
        Err(err) => AppError::from(err).into_response(),
    }
}
