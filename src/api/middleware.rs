//! Request gates and request metrics
//!
//! Gates run as `route_layer`s on the `/users/:user` routes, in this order:
//! 1. [`require_activity_media_type`]: 417 unless the request speaks ActivityPub
//! 2. [`require_local_actor`]: 404 unless the path user is hosted here
//!
//! The media type gate never touches storage or the body.

use std::time::Instant;

use axum::{
    extract::{MatchedPath, Path, Request, State},
    http::{Method, header},
    middleware::Next,
    response::Response,
};

use crate::AppState;
use crate::error::AppError;
use crate::federation::{accepts_activity_json, is_activity_media_type};
use crate::metrics::{HTTP_REQUEST_DURATION_SECONDS, HTTP_REQUESTS_TOTAL, MEDIA_TYPE_REJECTIONS_TOTAL};

/// Reject requests that do not negotiate an ActivityPub media type
///
/// Reads check `Accept`, writes check `Content-Type`.
pub async fn require_activity_media_type(
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let method = request.method().clone();
    let header_name = if method == Method::GET || method == Method::HEAD {
        header::ACCEPT
    } else {
        header::CONTENT_TYPE
    };

    let value = request
        .headers()
        .get(&header_name)
        .and_then(|value| value.to_str().ok());
    let admitted = if header_name == header::ACCEPT {
        value.is_some_and(accepts_activity_json)
    } else {
        value.is_some_and(is_activity_media_type)
    };

    if !admitted {
        MEDIA_TYPE_REJECTIONS_TOTAL
            .with_label_values(&[method.as_str()])
            .inc();
        tracing::debug!(
            method = %method,
            header = %header_name,
            path = %request.uri().path(),
            "Rejected non-ActivityPub media type"
        );
        return Err(AppError::ContentTypeMismatch);
    }

    Ok(next.run(request).await)
}

/// Reject requests for actors this node does not host
pub async fn require_local_actor(
    State(state): State<AppState>,
    Path(user): Path<String>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let domain = &state.config.server.domain;

    let exists = state.db.actor_exists(&user, domain).await.map_err(|e| {
        tracing::error!(user = %user, domain = %domain, error = %e, "Actor lookup failed");
        e
    })?;
    if !exists {
        tracing::debug!(user = %user, domain = %domain, "Unknown actor");
        return Err(AppError::ActorNotFound);
    }

    Ok(next.run(request).await)
}

/// Count and time every routed request
pub async fn record_http_metrics(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let endpoint = request
        .extensions()
        .get::<MatchedPath>()
        .map(|path| path.as_str().to_string())
        .unwrap_or_else(|| "unmatched".to_string());

    let started = Instant::now();
    let response = next.run(request).await;

    HTTP_REQUEST_DURATION_SECONDS
        .with_label_values(&[method.as_str(), &endpoint])
        .observe(started.elapsed().as_secs_f64());
    HTTP_REQUESTS_TOTAL
        .with_label_values(&[method.as_str(), &endpoint, response.status().as_str()])
        .inc();

    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        Router,
        body::Body,
        http::StatusCode,
        middleware::from_fn,
        routing::get,
    };
    use tower::ServiceExt;

    fn gated() -> Router {
        Router::new()
            .route("/gated", get(|| async { "ok" }).post(|| async { "ok" }))
            .route_layer(from_fn(require_activity_media_type))
    }

    async fn status(request: axum::http::Request<Body>) -> StatusCode {
        gated().oneshot(request).await.unwrap().status()
    }

    #[tokio::test]
    async fn reads_are_gated_on_accept() {
        let admitted = axum::http::Request::get("/gated")
            .header(header::ACCEPT, "text/html, application/activity+json")
            .body(Body::empty())
            .unwrap();
        assert_eq!(status(admitted).await, StatusCode::OK);

        let rejected = axum::http::Request::get("/gated")
            .header(header::ACCEPT, "text/html")
            .body(Body::empty())
            .unwrap();
        assert_eq!(status(rejected).await, StatusCode::EXPECTATION_FAILED);

        let missing = axum::http::Request::get("/gated")
            .body(Body::empty())
            .unwrap();
        assert_eq!(status(missing).await, StatusCode::EXPECTATION_FAILED);
    }

    #[tokio::test]
    async fn writes_are_gated_on_content_type() {
        let admitted = axum::http::Request::post("/gated")
            .header(
                header::CONTENT_TYPE,
                r#"application/ld+json; profile="https://www.w3.org/ns/activitystreams""#,
            )
            .body(Body::empty())
            .unwrap();
        assert_eq!(status(admitted).await, StatusCode::OK);

        // Accept is irrelevant for writes
        let rejected = axum::http::Request::post("/gated")
            .header(header::ACCEPT, "application/activity+json")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::empty())
            .unwrap();
        assert_eq!(status(rejected).await, StatusCode::EXPECTATION_FAILED);
    }
}
