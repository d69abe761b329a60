//! Axum middleware that attaches subscription headers.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{header::USER_AGENT, Request},
    middleware::Next,
    response::Response,
};

use crate::subscription::annotator::HeaderAnnotator;

/// Annotate responses to `/sub/{key}`; every other request passes through.
pub async fn annotate_subscription(
    State(annotator): State<Arc<HeaderAnnotator>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let user_agent = request
        .headers()
        .get(USER_AGENT)
        .map(|v| String::from_utf8_lossy(v.as_bytes()).into_owned())
        .unwrap_or_default();
    let headers = annotator.annotate(request.uri().path(), &user_agent);

    let mut response = next.run(request).await;
    if let Some(headers) = headers {
        headers.apply(response.headers_mut());
    }
    response
}
