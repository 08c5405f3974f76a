mod exam;
mod health;
mod words;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;

use crate::response::json_error;
use crate::state::AppState;

pub fn router(state: AppState) -> Router {
    Router::new()
        .nest("/health", health::router())
        .route(
            "/api/exam/generate",
            post(exam::generate).fallback(fallback_handler),
        )
        .route(
            "/api/exam/submit",
            post(exam::submit).fallback(fallback_handler),
        )
        .route("/api/exam/records/:user_id", get(exam::records))
        .route("/api/exam/errors/:user_id", get(exam::word_errors))
        .route("/api/stats/user/errors/:user_id", get(exam::word_errors))
        .route("/api/words/grade/:grade/random", get(words::random_by_grade))
        .route(
            "/api/words/grade/:grade/unit/:unit/random",
            get(words::random_by_grade_and_unit),
        )
        .route(
            "/api/words/grade/:grade/weighted-random",
            get(words::weighted_random_by_grade),
        )
        .route(
            "/api/words/grade/:grade/unit/:unit/weighted-random",
            get(words::weighted_random_by_grade_and_unit),
        )
        .fallback(fallback_handler)
        .with_state(state)
}

async fn fallback_handler() -> Response {
    json_error(StatusCode::NOT_FOUND, "NOT_FOUND", "接口不存在").into_response()
}
