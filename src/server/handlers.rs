use axum::{
    Router,
    body::Bytes,
    extract::State,
    http::{StatusCode, Uri, header},
    response::{IntoResponse, Response},
    routing::post,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::error::GatewayError;
use crate::server::AppState;
use crate::server::chat_request::{ChatRequest, to_backend_request};
use crate::server::streaming::Relay;

pub const CHAT_COMPLETIONS_PATH: &str = "/v1/chat/completions";

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            CHAT_COMPLETIONS_PATH,
            post(chat_completions)
                .options(preflight)
                .fallback(method_not_allowed),
        )
        .fallback(not_found)
}

/// CORS 预检：直接返回，不触发任何后端调用
async fn preflight() -> impl IntoResponse {
    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "application/json"),
            (header::ACCESS_CONTROL_ALLOW_ORIGIN, "*"),
            (header::ACCESS_CONTROL_ALLOW_METHODS, "POST, OPTIONS"),
            (
                header::ACCESS_CONTROL_ALLOW_HEADERS,
                "Content-Type, Authorization",
            ),
            (header::ACCESS_CONTROL_MAX_AGE, "86400"),
        ],
    )
}

/// Chat Completions 流式入口：
/// - 请求体解析失败直接返回 400，不会调用后端
/// - 后端流建立失败同样返回 400（此时尚未写出任何响应）
/// - 建立成功后固定 SSE 响应头，正文交给 `Relay` 逐块转发
pub async fn chat_completions(
    State(app_state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Response, GatewayError> {
    let request: ChatRequest = serde_json::from_slice(&body).map_err(|e| {
        tracing::warn!("illegal request body error: {}", e);
        GatewayError::from(e)
    })?;

    let request_id = Uuid::new_v4();
    let backend_request = to_backend_request(&request);

    let upstream = app_state
        .backend
        .chat_completion(backend_request)
        .await
        .map_err(|e| {
            tracing::error!(
                request_id = %request_id,
                model = %request.model,
                "invoke mesh service error: {}",
                e
            );
            GatewayError::from(e)
        })?;

    tracing::info!(
        request_id = %request_id,
        model = %request.model,
        messages = request.messages.len(),
        "ChatCompletion stream opened"
    );

    Ok(Relay::new(request_id, upstream).into_response())
}

async fn method_not_allowed() -> GatewayError {
    tracing::warn!("allow methods POST, OPTIONS error");
    GatewayError::MethodNotAllowed
}

async fn not_found(uri: Uri) -> GatewayError {
    tracing::warn!("Unsupported path: {}", uri.path());
    GatewayError::NotFound
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::stub::StubBackend;
    use axum::body::Body;
    use axum::http::{Method, Request};
    use tower::ServiceExt;

    const VALID_BODY: &str =
        r#"{"model":"m","messages":[{"role":"user","content":"hi"},{"role":"assistant","content":"yo"}]}"#;

    fn app(backend: Arc<StubBackend>) -> Router {
        routes().with_state(Arc::new(AppState { backend }))
    }

    fn request(method: Method, uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn body_text(response: Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn preflight_returns_cors_headers_without_backend_call() {
        let backend = Arc::new(StubBackend::streaming(&["a"]));
        let response = app(backend.clone())
            .oneshot(request(Method::OPTIONS, CHAT_COMPLETIONS_PATH, ""))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let headers = response.headers();
        assert_eq!(headers[header::CONTENT_TYPE], "application/json");
        assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
        assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_METHODS], "POST, OPTIONS");
        assert_eq!(
            headers[header::ACCESS_CONTROL_ALLOW_HEADERS],
            "Content-Type, Authorization"
        );
        assert_eq!(headers[header::ACCESS_CONTROL_MAX_AGE], "86400");
        assert!(body_text(response).await.is_empty());
        assert!(backend.calls().is_empty());
    }

    #[tokio::test]
    async fn post_streams_frames_then_done() {
        let backend = Arc::new(StubBackend::streaming(&["Hel", "lo"]));
        let response = app(backend.clone())
            .oneshot(request(Method::POST, CHAT_COMPLETIONS_PATH, VALID_BODY))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "text/event-stream");
        assert_eq!(response.headers()[header::CACHE_CONTROL], "no-cache");

        let text = body_text(response).await;
        let frames: Vec<&str> = text.split_terminator("\n\n").collect();
        assert_eq!(frames.len(), 3);
        assert!(frames.iter().all(|f| f.starts_with("data: ")));
        assert!(frames[0].contains("\"content\":\"Hel\""));
        assert!(frames[1].contains("\"content\":\"lo\""));
        assert_eq!(frames[2], "data: [DONE]");
        assert!(text.ends_with("data: [DONE]\n\n"));

        let calls = backend.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].model, "m");
        assert_eq!(calls[0].messages.len(), 2);
        assert_eq!(calls[0].messages[1].role, "assistant");
    }

    #[tokio::test]
    async fn mid_stream_failure_keeps_200_and_omits_done() {
        let backend = Arc::new(StubBackend::failing_after(&["one", "two"]));
        let response = app(backend)
            .oneshot(request(Method::POST, CHAT_COMPLETIONS_PATH, VALID_BODY))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let text = body_text(response).await;
        assert_eq!(text.matches("data: ").count(), 2);
        assert!(!text.contains("[DONE]"));
    }

    #[tokio::test]
    async fn malformed_json_never_reaches_backend() {
        let backend = Arc::new(StubBackend::streaming(&["a"]));
        for body in ["{not json", "", r#"{"messages":42}"#] {
            let response = app(backend.clone())
                .oneshot(request(Method::POST, CHAT_COMPLETIONS_PATH, body))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::BAD_REQUEST);
            assert_eq!(body_text(response).await, "illegal request body");
        }
        assert!(backend.calls().is_empty());
    }

    #[tokio::test]
    async fn backend_initiation_failure_is_400_without_stream_headers() {
        let backend = Arc::new(StubBackend::unreachable());
        let response = app(backend.clone())
            .oneshot(request(Method::POST, CHAT_COMPLETIONS_PATH, VALID_BODY))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_ne!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            "text/event-stream"
        );
        assert!(!body_text(response).await.contains("data: "));
        assert_eq!(backend.calls().len(), 1);
    }

    #[tokio::test]
    async fn other_methods_are_405_regardless_of_body() {
        let backend = Arc::new(StubBackend::streaming(&["a"]));
        for method in [Method::GET, Method::PUT, Method::DELETE, Method::PATCH, Method::HEAD] {
            for body in [VALID_BODY, "{garbage"] {
                let response = app(backend.clone())
                    .oneshot(request(method.clone(), CHAT_COMPLETIONS_PATH, body))
                    .await
                    .unwrap();
                assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED, "{}", method);
            }
        }
        assert!(backend.calls().is_empty());
    }

    #[tokio::test]
    async fn unknown_paths_are_404_for_every_method() {
        let backend = Arc::new(StubBackend::streaming(&["a"]));
        for method in [Method::GET, Method::POST, Method::OPTIONS, Method::DELETE] {
            for path in ["/", "/v1/chat", "/v1/chat/completions/extra", "/v1/models"] {
                let response = app(backend.clone())
                    .oneshot(request(method.clone(), path, VALID_BODY))
                    .await
                    .unwrap();
                assert_eq!(response.status(), StatusCode::NOT_FOUND, "{} {}", method, path);
            }
        }
        assert!(backend.calls().is_empty());
    }
}
