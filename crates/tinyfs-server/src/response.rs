//! Response construction.
//!
//! Every response carries the `Server` header, a `Content-Type` and a
//! `Content-Length` matching the body.

use bytes::Bytes;
use http::{header, HeaderValue, Response, StatusCode};
use http_body_util::Full;

/// Value of the `Server` header on every response.
pub const SERVER_NAME: &str = "TinyFS";

/// Content type used for listings and error pages.
pub const HTML: &str = "text/html";

/// Type alias for HTTP response body.
pub type ResponseBody = Full<Bytes>;

/// Type alias for the HTTP response.
pub type HttpResponse = Response<ResponseBody>;

/// Builds a response with the given status, body and content type.
pub fn generic(status: StatusCode, body: impl Into<Bytes>, content_type: &str) -> HttpResponse {
    let body = body.into();
    let length = body.len();

    let mut response = Response::new(Full::new(body));
    *response.status_mut() = status;

    let headers = response.headers_mut();
    headers.insert(header::SERVER, HeaderValue::from_static(SERVER_NAME));
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_str(content_type)
            .unwrap_or_else(|_| HeaderValue::from_static(crate::mime::DEFAULT_MIME_TYPE)),
    );
    headers.insert(header::CONTENT_LENGTH, HeaderValue::from(length));

    response
}

/// 200 OK with the given body.
pub fn ok(body: impl Into<Bytes>, content_type: &str) -> HttpResponse {
    generic(StatusCode::OK, body, content_type)
}

/// 400 Bad Request.
pub fn bad_request() -> HttpResponse {
    error_page(
        StatusCode::BAD_REQUEST,
        "The request target could not be decoded.",
    )
}

/// 403 Forbidden.
pub fn forbidden() -> HttpResponse {
    error_page(StatusCode::FORBIDDEN, "Access denied.")
}

/// 404 Not Found.
pub fn not_found() -> HttpResponse {
    error_page(
        StatusCode::NOT_FOUND,
        "The requested resource was not found.",
    )
}

/// 405 Method Not Allowed, advertising GET as the only method.
pub fn method_not_allowed() -> HttpResponse {
    let mut response = error_page(
        StatusCode::METHOD_NOT_ALLOWED,
        "This method is not allowed.",
    );
    response
        .headers_mut()
        .insert(header::ALLOW, HeaderValue::from_static("GET"));
    response
}

/// 500 Internal Server Error.
pub fn internal_error() -> HttpResponse {
    error_page(
        StatusCode::INTERNAL_SERVER_ERROR,
        "Server error occurred.",
    )
}

fn error_page(status: StatusCode, message: &str) -> HttpResponse {
    let title = format!(
        "{} {}",
        status.as_u16(),
        status.canonical_reason().unwrap_or("Error")
    );
    let body = format!("<html><body><h1>{title}</h1><p>{message}</p></body></html>");
    generic(status, body, HTML)
}
