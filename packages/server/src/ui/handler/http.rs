//! HTTP API endpoint handlers.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Query, State, rejection::JsonRejection},
    http::{HeaderMap, StatusCode, header::AUTHORIZATION},
    response::{IntoResponse, Response},
};

use crate::{
    domain::{AuthenticatedUser, SiteId},
    infrastructure::dto::{
        http::{
            ApiErrorResponse, ApiResponse, HealthResponse, RecordSampleRequest,
            RecordSampleResponse, SiteSubscribersDto, ZoneStatusDto, ZonesQuery,
        },
        websocket::{MSG_INVALID_SITE_ID, MSG_UNAUTHORIZED},
    },
    ui::state::AppState,
    usecase::RecordSampleError,
};

fn error_response(status: StatusCode, message: &str) -> Response {
    (status, Json(ApiErrorResponse::new(message))).into_response()
}

/// `Authorization: Bearer <token>` を検証する
fn authenticate(state: &AppState, headers: &HeaderMap) -> Result<AuthenticatedUser, Response> {
    let token = headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .unwrap_or_default();

    state.token_verifier.verify(token).map_err(|e| {
        tracing::debug!("Rejected API request: {}", e);
        error_response(StatusCode::UNAUTHORIZED, MSG_UNAUTHORIZED)
    })
}

/// Health check endpoint with live connection and per-site subscriber counts
pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let registry = &state.registry;
    let mut sites = Vec::new();
    for site_id in registry.subscribed_sites().await {
        let subscribers = registry.subscriber_count(site_id).await;
        // 集計中に全員が抜けたサイトは載せない
        if subscribers > 0 {
            sites.push(SiteSubscribersDto {
                site_id,
                subscribers,
            });
        }
    }
    Json(HealthResponse::ok(registry.connection_count().await, sites))
}

/// Current zone snapshot of a site with a density band per zone
pub async fn get_zone_status(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<ZonesQuery>,
) -> Response {
    if let Err(rejection) = authenticate(&state, &headers) {
        return rejection;
    }

    let Some(site_id) = query
        .site_id
        .as_deref()
        .and_then(|raw| raw.parse::<SiteId>().ok())
    else {
        return error_response(StatusCode::BAD_REQUEST, MSG_INVALID_SITE_ID);
    };

    match state.get_zone_snapshot_usecase.execute(site_id).await {
        Ok(snapshots) => {
            // Domain Model から DTO への変換
            let zones: Vec<ZoneStatusDto> = snapshots.iter().map(ZoneStatusDto::from).collect();
            Json(ApiResponse::ok(zones)).into_response()
        }
        Err(e) => {
            tracing::error!("Failed to build zone status: {}", e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to fetch zone data")
        }
    }
}

/// Sensor ingestion endpoint
pub async fn record_crowd_data(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Result<Json<RecordSampleRequest>, JsonRejection>,
) -> Response {
    if let Err(rejection) = authenticate(&state, &headers) {
        return rejection;
    }

    let Json(request) = match body {
        Ok(body) => body,
        Err(e) => {
            tracing::debug!("Malformed crowd data: {}", e);
            return error_response(StatusCode::BAD_REQUEST, "Invalid crowd data payload");
        }
    };

    match state
        .record_sample_usecase
        .execute(
            request.site_id,
            request.zone_id,
            request.count,
            request.timestamp,
        )
        .await
    {
        Ok(_) => (
            StatusCode::CREATED,
            Json(RecordSampleResponse { success: true }),
        )
            .into_response(),
        Err(e @ RecordSampleError::ZoneNotFound { .. }) => {
            error_response(StatusCode::NOT_FOUND, &e.to_string())
        }
        Err(e @ RecordSampleError::FutureTimestamp(_)) => {
            tracing::debug!("Rejected crowd data: {}", e);
            error_response(StatusCode::BAD_REQUEST, &e.to_string())
        }
        Err(e) => {
            tracing::error!("Failed to record crowd data: {}", e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to record crowd data")
        }
    }
}
