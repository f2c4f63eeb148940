use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, Query, State,
    },
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::api::extract::{json_body, path_params, required};
use crate::api::state::AppState;
use crate::error::{AppError, Result};
use crate::models::{Attendance, AttendanceWithUser};
use crate::services::attendance::{self, AttendanceOutcome};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmAttendanceRequest {
    pub registration_id: Option<Uuid>,
    pub confirmed_by: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RetryMintRequest {
    pub confirmed_by: Option<String>,
    pub user_id: Option<Uuid>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ListAttendancesQuery {
    pub unminted: Option<bool>,
}

/// List attendances of an event
async fn list_attendances(
    State(state): State<AppState>,
    event_id: std::result::Result<Path<Uuid>, PathRejection>,
    Query(params): Query<ListAttendancesQuery>,
) -> Result<Json<Vec<AttendanceWithUser>>> {
    let event_id = path_params(event_id)?;

    let attendances =
        Attendance::list_by_event(&state.pool, event_id, params.unminted.unwrap_or(false)).await?;

    Ok(Json(attendances))
}

/// Confirm attendance and mint the attendee's NFT
async fn confirm_attendance(
    State(state): State<AppState>,
    event_id: std::result::Result<Path<Uuid>, PathRejection>,
    payload: std::result::Result<Json<ConfirmAttendanceRequest>, JsonRejection>,
) -> Result<Json<AttendanceOutcome>> {
    let event_id = path_params(event_id)?;
    let req = json_body(payload)?;

    let (Some(registration_id), Some(confirmed_by)) =
        (req.registration_id, required(req.confirmed_by))
    else {
        return Err(AppError::Validation(
            "Registration ID and confirmer wallet address are required".to_string(),
        ));
    };

    let outcome = attendance::confirm_attendance(
        &state.pool,
        state.minter(),
        event_id,
        registration_id,
        &confirmed_by,
    )
    .await?;

    tracing::info!(
        attendance_id = %outcome.attendance.id,
        nft_minted = outcome.nft_minted,
        "Attendance confirmation completed"
    );

    Ok(Json(outcome))
}

/// Retry minting for an attendance that has no NFT yet
async fn retry_mint(
    State(state): State<AppState>,
    ids: std::result::Result<Path<(Uuid, Uuid)>, PathRejection>,
    payload: std::result::Result<Json<RetryMintRequest>, JsonRejection>,
) -> Result<Json<AttendanceOutcome>> {
    let (event_id, attendance_id) = path_params(ids)?;
    let req = json_body(payload)?;

    let (Some(confirmed_by), Some(user_id)) = (required(req.confirmed_by), req.user_id) else {
        return Err(AppError::Validation(
            "Confirmer wallet address and user ID are required".to_string(),
        ));
    };

    let outcome = attendance::retry_mint(
        &state.pool,
        state.minter(),
        event_id,
        attendance_id,
        &confirmed_by,
        user_id,
    )
    .await?;

    tracing::info!(
        attendance_id = %attendance_id,
        nft_minted = outcome.nft_minted,
        "NFT mint retry completed"
    );

    Ok(Json(outcome))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/api/events/:id/attendances",
            get(list_attendances).post(confirm_attendance),
        )
        .route(
            "/api/events/:id/attendances/:attendance_id/retry-nft",
            post(retry_mint),
        )
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{header, Request, StatusCode},
    };
    use sqlx::postgres::PgPoolOptions;
    use tower::ServiceExt;

    fn test_state() -> AppState {
        // Never connected: these tests only exercise validation that runs before any query
        let pool = PgPoolOptions::new()
            .connect_lazy("postgres://postgres@127.0.0.1:1/eventseal_test")
            .unwrap();

        AppState { pool, minter: None }
    }

    fn post_json(uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn send(request: Request<Body>) -> (StatusCode, serde_json::Value) {
        let app = crate::api::router(test_state());
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
        (status, body)
    }

    #[tokio::test]
    async fn test_confirm_requires_fields() {
        let uri = format!("/api/events/{}/attendances", Uuid::new_v4());

        let (status, body) = send(post_json(&uri, r#"{"confirmedBy": "Creator111"}"#)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            body["error"],
            "Registration ID and confirmer wallet address are required"
        );

        let payload = format!(r#"{{"registrationId": "{}", "confirmedBy": "  "}}"#, Uuid::new_v4());
        let (status, _) = send(post_json(&uri, &payload)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_confirm_rejects_malformed_json() {
        let uri = format!("/api/events/{}/attendances", Uuid::new_v4());

        let (status, body) = send(post_json(&uri, "{not json")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Invalid JSON in request body");
    }

    #[tokio::test]
    async fn test_confirm_rejects_invalid_event_id() {
        let payload = format!(
            r#"{{"registrationId": "{}", "confirmedBy": "Creator111"}}"#,
            Uuid::new_v4()
        );

        let (status, body) = send(post_json("/api/events/not-a-uuid/attendances", &payload)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].is_string());
    }

    #[tokio::test]
    async fn test_retry_requires_confirmer_and_user() {
        let uri = format!(
            "/api/events/{}/attendances/{}/retry-nft",
            Uuid::new_v4(),
            Uuid::new_v4()
        );

        let (status, body) = send(post_json(&uri, &format!(r#"{{"userId": "{}"}}"#, Uuid::new_v4()))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Confirmer wallet address and user ID are required");

        let (status, body) = send(post_json(&uri, r#"{"confirmedBy": "Creator111"}"#)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Confirmer wallet address and user ID are required");
    }
}
