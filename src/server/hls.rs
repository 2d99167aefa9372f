use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use std::sync::Arc;
use crate::server::Registry;

/// HLS routes. Rooms are resolved here, segmenting is done elsewhere, so a
/// live room answers 501.
pub fn router(registry: Arc<Registry>) -> Router {
    Router::new()
        .route("/{app}/{stream}/index.m3u8", get(serve_playlist))
        .route("/{app}/{stream}/{segment}", get(serve_segment))
        .with_state(registry)
}

async fn serve_playlist(
    Path((app, stream)): Path<(String, String)>,
    State(registry): State<Arc<Registry>>,
) -> Response {
    resolve(&registry, &app, &stream).await
}

async fn serve_segment(
    Path((app, stream, segment)): Path<(String, String, String)>,
    State(registry): State<Arc<Registry>>,
) -> Response {
    match segment.strip_suffix(".ts") {
        Some(name) if !name.is_empty() => resolve(&registry, &app, &stream).await,
        _ => (StatusCode::BAD_REQUEST, "Expected a .ts segment").into_response(),
    }
}

async fn resolve(registry: &Registry, app_name: &str, stream: &str) -> Response {
    let Some(app) = registry.app(app_name) else {
        return (StatusCode::NOT_FOUND, "Unknown application").into_response();
    };
    if app.get(stream).await.is_none() {
        return (StatusCode::NOT_FOUND, "Stream not found").into_response();
    }

    log::debug!("HLS request for {}/{} has no segmenter", app_name, stream);
    (StatusCode::NOT_IMPLEMENTED, "HLS segmenting is not available").into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    async fn status(registry: Arc<Registry>, uri: &str) -> StatusCode {
        let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
        router(registry).oneshot(request).await.unwrap().status()
    }

    #[tokio::test]
    async fn test_routing() {
        let registry = Arc::new(Registry::new(["live"]));
        registry.app("live").unwrap().get_or_create("cam").await;

        assert_eq!(status(registry.clone(), "/live/cam/index.m3u8").await, StatusCode::NOT_IMPLEMENTED);
        assert_eq!(status(registry.clone(), "/live/cam/seg-3.ts").await, StatusCode::NOT_IMPLEMENTED);
        assert_eq!(status(registry.clone(), "/live/cam/seg-3.mp4").await, StatusCode::BAD_REQUEST);
        assert_eq!(status(registry.clone(), "/live/other/index.m3u8").await, StatusCode::NOT_FOUND);
        assert_eq!(status(registry, "/vod/cam/index.m3u8").await, StatusCode::NOT_FOUND);
    }
}
