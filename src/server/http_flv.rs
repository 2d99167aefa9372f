use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use bytes::Bytes;
use std::convert::Infallible;
use std::sync::Arc;
use crate::flv::{encode_tag, flv_header, FlvTag};
use crate::server::{App, Registry};
use crate::stream::BroadcastReader;

pub fn router(registry: Arc<Registry>) -> Router {
    Router::new()
        .route("/{app}/{file}", get(serve_flv))
        .with_state(registry)
}

/// `GET /{app}/{stream}.flv`: join the room and stream it as an FLV body.
async fn serve_flv(
    Path((app_name, file)): Path<(String, String)>,
    State(registry): State<Arc<Registry>>,
) -> Response {
    let stream_name = match file.strip_suffix(".flv") {
        Some(name) if !name.is_empty() => name.to_string(),
        _ => return (StatusCode::BAD_REQUEST, "Expected /{app}/{stream}.flv").into_response(),
    };

    let Some(app) = registry.app(&app_name) else {
        log::debug!("HTTP-FLV request for unknown app '{}'", app_name);
        return (StatusCode::NOT_FOUND, "Unknown application").into_response();
    };
    let Some(room) = app.get(&stream_name).await else {
        return (StatusCode::NOT_FOUND, "Stream not found").into_response();
    };

    log::info!("HTTP-FLV consumer joined {}/{}", app_name, stream_name);
    let reader = room.join().await;
    drop(room);

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "video/x-flv")
        .header(header::CACHE_CONTROL, "no-cache, no-store")
        .body(Body::from_stream(flv_body(reader, app, stream_name)))
        .unwrap_or_else(|_| StatusCode::INTERNAL_SERVER_ERROR.into_response())
}

struct BodyState {
    reader: Box<dyn BroadcastReader<FlvTag>>,
    app: Arc<App>,
    stream_name: String,
    header_sent: bool,
}

fn flv_body(
    reader: Box<dyn BroadcastReader<FlvTag>>,
    app: Arc<App>,
    stream_name: String,
) -> impl futures::Stream<Item = Result<Bytes, Infallible>> + Send {
    let state = BodyState {
        reader,
        app,
        stream_name,
        header_sent: false,
    };

    futures::stream::unfold(state, |mut state| async move {
        if !state.header_sent {
            state.header_sent = true;
            return Some((Ok(flv_header()), state));
        }

        match state.reader.read().await {
            Some(tag) => Some((Ok(encode_tag(&tag)), state)),
            None => {
                let BodyState { reader, app, stream_name, .. } = state;
                drop(reader);
                log::info!("HTTP-FLV stream {}/{} ended", app.name(), stream_name);
                app.remove_if_idle(&stream_name).await;
                None
            }
        }
    })
}
