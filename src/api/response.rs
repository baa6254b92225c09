//! Protocol JSON responses
//!
//! ActivityPub and WebFinger documents are served uncached with their own
//! media types instead of plain `application/json`.

use axum::{
    http::{HeaderValue, header},
    response::{IntoResponse, Response},
};
use serde::Serialize;

use crate::error::AppError;
use crate::federation::{ACTIVITY_JSON, JRD_JSON};

/// `application/activity+json` response
pub struct ActivityJson<T>(pub T);

/// `application/jrd+json` response
pub struct JrdJson<T>(pub T);

impl<T: Serialize> IntoResponse for ActivityJson<T> {
    fn into_response(self) -> Response {
        protocol_json(ACTIVITY_JSON, &self.0)
    }
}

impl<T: Serialize> IntoResponse for JrdJson<T> {
    fn into_response(self) -> Response {
        protocol_json(JRD_JSON, &self.0)
    }
}

fn protocol_json<T: Serialize>(content_type: &'static str, document: &T) -> Response {
    let body = match serde_json::to_vec(document) {
        Ok(body) => body,
        Err(e) => return AppError::Internal(e.into()).into_response(),
    };

    (
        [
            (header::CONTENT_TYPE, HeaderValue::from_static(content_type)),
            (header::CACHE_CONTROL, HeaderValue::from_static("no-cache")),
            (header::PRAGMA, HeaderValue::from_static("no-cache")),
        ],
        body,
    )
        .into_response()
}
