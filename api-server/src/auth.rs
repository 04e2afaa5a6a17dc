use actix_web::http::header::HeaderMap;

pub(crate) const ACTION_TOKEN_HEADER: &str = "x-action-token";

pub(crate) fn action_token(headers: &HeaderMap) -> Option<&str> {
    headers.get(ACTION_TOKEN_HEADER)?.to_str().ok()
}

/// Exact match against the configured token; no token configured means open.
pub(crate) fn is_request_authorized(headers: &HeaderMap, expected_token: Option<&str>) -> bool {
    let Some(expected_token) = expected_token else {
        return true;
    };
    action_token(headers) == Some(expected_token)
}
