//! Per-connection request handling.
//!
//! A connection carries exactly one request and one response. Keep-alive
//! is disabled, so hyper shuts down the write half as soon as the response
//! has been flushed.

use std::convert::Infallible;
use std::fmt::Display;
use std::sync::Arc;

use http::{Method, Request};
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::task::JoinError;

use crate::response::{self, HttpResponse};
use crate::router::Router;

/// Serves one HTTP exchange on `io`.
///
/// Errors while reading, routing or writing are logged and swallowed so
/// the accept loop is never affected by a single bad connection.
pub async fn serve_connection<I>(io: I, peer: impl Display, router: Arc<Router>)
where
    I: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    let service = service_fn(move |req: Request<Incoming>| {
        let router = Arc::clone(&router);
        async move { Ok::<_, Infallible>(dispatch(router, req).await) }
    });

    let result = http1::Builder::new()
        .keep_alive(false)
        .serve_connection(TokioIo::new(io), service)
        .await;

    if let Err(e) = result {
        if e.is_incomplete_message() {
            tracing::debug!(remote_addr = %peer, error = %e, "Client closed connection early");
        } else {
            tracing::error!(remote_addr = %peer, error = %e, "Session error");
        }
    }
}

/// Routes one request on the blocking pool.
async fn dispatch(router: Arc<Router>, req: Request<Incoming>) -> HttpResponse {
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    tracing::info!(method = %method, path = %path, "Handling request");

    let routed = {
        let method = method.clone();
        let path = path.clone();
        tokio::task::spawn_blocking(move || router.route(&method, &path)).await
    };

    complete(routed, &method, &path)
}

/// Unwraps the routing task's result.
///
/// A panic during routing surfaces as a join error and is answered with 500.
fn complete(routed: Result<HttpResponse, JoinError>, method: &Method, path: &str) -> HttpResponse {
    match routed {
        Ok(response) => {
            tracing::debug!(
                method = %method,
                path = %path,
                status = response.status().as_u16(),
                "Request completed"
            );
            response
        }
        Err(e) => {
            tracing::error!(method = %method, path = %path, error = %e, "Exception handling request");
            response::internal_error()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::StatusCode;
    use std::fs;
    use tempfile::TempDir;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    async fn exchange(root: &std::path::Path, request: &str) -> String {
        let router = Arc::new(Router::new(root, 1024));
        let (mut client, server) = tokio::io::duplex(64 * 1024);

        let handle = tokio::spawn(serve_connection(server, "test-peer", router));

        client.write_all(request.as_bytes()).await.unwrap();
        let mut raw = Vec::new();
        client.read_to_end(&mut raw).await.unwrap();
        handle.await.unwrap();

        String::from_utf8_lossy(&raw).into_owned()
    }

    #[tokio::test]
    async fn test_single_exchange_then_close() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("hello.txt"), "hello").unwrap();

        let raw = exchange(
            dir.path(),
            "GET /hello.txt HTTP/1.1\r\nHost: localhost\r\n\r\n",
        )
        .await;

        assert!(raw.starts_with("HTTP/1.1 200 OK\r\n"));
        let lower = raw.to_ascii_lowercase();
        assert!(lower.contains("server: tinyfs\r\n"));
        assert!(lower.contains("content-type: text/plain\r\n"));
        assert!(lower.contains("content-length: 5\r\n"));
        assert!(raw.ends_with("\r\n\r\nhello"));
    }

    #[tokio::test]
    async fn test_pipelined_second_request_ignored() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.txt"), "A").unwrap();

        let raw = exchange(
            dir.path(),
            "GET /a.txt HTTP/1.1\r\nHost: x\r\n\r\nGET /a.txt HTTP/1.1\r\nHost: x\r\n\r\n",
        )
        .await;

        assert_eq!(raw.matches("HTTP/1.1 200 OK").count(), 1);
    }

    #[tokio::test]
    async fn test_malformed_request_does_not_panic() {
        let dir = TempDir::new().unwrap();
        let raw = exchange(dir.path(), "NOT HTTP AT ALL\r\n\r\n").await;
        assert!(!raw.contains("200 OK"));
    }

    #[tokio::test]
    async fn test_not_found_over_wire() {
        let dir = TempDir::new().unwrap();
        let raw = exchange(dir.path(), "GET /missing HTTP/1.1\r\nHost: x\r\n\r\n").await;
        assert!(raw.starts_with("HTTP/1.1 404 Not Found\r\n"));
    }

    #[tokio::test]
    async fn test_routing_panic_becomes_internal_error() {
        let routed = tokio::task::spawn_blocking(|| -> HttpResponse {
            panic!("listing renderer blew up");
        })
        .await;
        assert!(routed.as_ref().is_err_and(JoinError::is_panic));

        let response = complete(routed, &Method::GET, "/boom");
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_completed_route_passes_through() {
        let routed = tokio::task::spawn_blocking(response::not_found).await;
        let response = complete(routed, &Method::GET, "/gone");
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
