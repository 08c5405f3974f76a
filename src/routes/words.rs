use axum::extract::rejection::QueryRejection;
use axum::extract::{Path, Query, State};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::exam::{ExamError, ExamPaper, UserId};
use crate::response::AppError;
use crate::state::AppState;

#[derive(Serialize)]
struct SuccessResponse<T> {
    success: bool,
    data: T,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RandomQuery {
    #[serde(default)]
    unit: Option<i64>,
    #[serde(default)]
    count: Option<i64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct WeightedQuery {
    user_id: UserId,
    #[serde(default)]
    unit: Option<i64>,
    #[serde(default)]
    count: Option<i64>,
}

pub(crate) async fn random_by_grade(
    State(state): State<AppState>,
    Path(grade): Path<i64>,
    query: Result<Query<RandomQuery>, QueryRejection>,
) -> Response {
    let Ok(Query(query)) = query else {
        return AppError::validation("查询参数不合法").into_response();
    };

    let engine = state.engine();
    let count = query
        .count
        .unwrap_or(engine.policy().default_question_count);
    paper_response(
        engine
            .generate_uniform_paper_for(grade, query.unit, count)
            .await,
    )
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CountQuery {
    #[serde(default)]
    count: Option<i64>,
}

pub(crate) async fn random_by_grade_and_unit(
    State(state): State<AppState>,
    Path((grade, unit)): Path<(i64, i64)>,
    query: Result<Query<CountQuery>, QueryRejection>,
) -> Response {
    let Ok(Query(query)) = query else {
        return AppError::validation("查询参数不合法").into_response();
    };

    let engine = state.engine();
    let count = query
        .count
        .unwrap_or(engine.policy().default_question_count);
    paper_response(
        engine
            .generate_uniform_paper_for(grade, Some(unit), count)
            .await,
    )
}

pub(crate) async fn weighted_random_by_grade(
    State(state): State<AppState>,
    Path(grade): Path<i64>,
    query: Result<Query<WeightedQuery>, QueryRejection>,
) -> Response {
    let Ok(Query(query)) = query else {
        return AppError::validation("缺少 userId 或查询参数不合法").into_response();
    };

    weighted(state, grade, query.unit, query.user_id, query.count).await
}

pub(crate) async fn weighted_random_by_grade_and_unit(
    State(state): State<AppState>,
    Path((grade, unit)): Path<(i64, i64)>,
    query: Result<Query<WeightedQuery>, QueryRejection>,
) -> Response {
    let Ok(Query(query)) = query else {
        return AppError::validation("缺少 userId 或查询参数不合法").into_response();
    };

    weighted(state, grade, Some(unit), query.user_id, query.count).await
}

async fn weighted(
    state: AppState,
    grade: i64,
    unit: Option<i64>,
    user_id: UserId,
    count: Option<i64>,
) -> Response {
    let engine = state.engine();
    let count = count.unwrap_or(engine.policy().default_question_count);
    paper_response(
        engine
            .generate_weighted_paper(user_id, grade, unit, count)
            .await,
    )
}

fn paper_response(result: Result<ExamPaper, ExamError>) -> Response {
    match result {
        Ok(paper) => Json(SuccessResponse {
            success: true,
            data: paper,
        })
        .into_response(),
        Err(err) => AppError::from(err).into_response(),
    }
}
