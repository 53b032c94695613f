use std::sync::Arc;

use axum::{
    body::Bytes,
    extract,
    http::{header, HeaderMap, StatusCode, Uri},
    response::{IntoResponse, Response},
};
use tracing::{debug, error, warn};

use crate::{
    admission_review,
    api::{api_error::ApiError, state::ApiServerState, MUTATE_PATH},
};

// The same handler serves `/mutate` and every unknown path: an admission review
// sent to the wrong path still gets a review back, carrying an error.
#[tracing::instrument(
    name = "admission",
    fields(
        host = crate::config::HOSTNAME.as_str(),
        path = uri.path(),
        request_uid = tracing::field::Empty,
        kind = tracing::field::Empty,
        name = tracing::field::Empty,
        namespace = tracing::field::Empty,
        operation = tracing::field::Empty,
        allowed = tracing::field::Empty,
        mutated = tracing::field::Empty,
        response_code = tracing::field::Empty,
        response_message = tracing::field::Empty,
    ),
    skip_all
)]
pub(crate) async fn admission_handler(
    extract::State(state): extract::State<Arc<ApiServerState>>,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, ApiError> {
    if body.is_empty() {
        warn!("no body found");
        return Err(ApiError::new(StatusCode::BAD_REQUEST, "no body found"));
    }

    if !is_json_content_type(&headers) {
        warn!(content_type = ?headers.get(header::CONTENT_TYPE), "invalid Content-Type");
        return Err(ApiError::new(
            StatusCode::UNSUPPORTED_MEDIA_TYPE,
            "invalid Content-Type, want `application/json`",
        ));
    }

    let review = if uri.path() == MUTATE_PATH {
        state.engine.review(&body)
    } else {
        state.engine.unhandled(uri.path(), &body)
    };
    debug!(response = ?review.response, "admission review handled");

    let payload = admission_review::encode(&review).map_err(|e| {
        error!(error = %e, "Can't encode response");
        ApiError::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("could not encode response: {e}"),
        )
    })?;

    Ok((
        StatusCode::OK,
        [(header::CONTENT_TYPE, mime::APPLICATION_JSON.as_ref())],
        payload,
    )
        .into_response())
}

pub(crate) async fn readiness_handler() -> StatusCode {
    StatusCode::OK
}

// Only the exact `application/json` value is accepted: no parameters, no
// change of case.
fn is_json_content_type(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|content_type| content_type == mime::APPLICATION_JSON.essence_str())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use rstest::rstest;

    #[rstest]
    #[case::json("application/json", true)]
    #[case::json_with_charset("application/json; charset=utf-8", false)]
    #[case::mixed_case("Application/JSON", false)]
    #[case::yaml("application/yaml", false)]
    #[case::text("text/plain", false)]
    #[case::garbage("json", false)]
    fn content_types(#[case] content_type: &str, #[case] expected: bool) {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_str(content_type).unwrap(),
        );

        assert_eq!(is_json_content_type(&headers), expected);
    }

    #[test]
    fn missing_content_type() {
        assert!(!is_json_content_type(&HeaderMap::new()));
    }
}
