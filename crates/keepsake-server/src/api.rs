//! HTTP surface of the album server.
//!
//! Handlers are stateless: everything they need arrives through
//! [`AppState`], which is constructed once in `main`.  Tests build a fresh
//! state per case, so nothing here leans on globals.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::{DefaultBodyLimit, Path, State},
    http::{header, Method, StatusCode},
    middleware,
    response::Response,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use keepsake_store::{MediaRecord, MediaRegistry};

use crate::config::ServerConfig;
use crate::error::ApiError;
use crate::mirror::MirrorClient;
use crate::rate_limit::{rate_limit_middleware, RateLimiter};
use crate::thumbnail;
use crate::upload;

#[derive(Clone)]
pub struct AppState {
    pub media: Arc<MediaRegistry>,
    pub mirror: Option<Arc<MirrorClient>>,
    pub rate_limiter: RateLimiter,
    pub config: Arc<ServerConfig>,
}

pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_check))
        .route("/info", get(server_info))
        .route("/api/media", get(media_list))
        .route("/api/media/upload", post(upload::media_upload))
        .route("/api/media/{id}", get(media_get).delete(media_delete))
        .route("/api/media/{id}/download", get(media_download))
        .route("/api/media/{id}/thumbnail", get(media_thumbnail))
        .layer(DefaultBodyLimit::max(state.config.max_upload_size))
        .layer(middleware::from_fn_with_state(
            state.rate_limiter.clone(),
            rate_limit_middleware,
        ))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

#[derive(Serialize)]
struct InfoResponse {
    name: String,
    version: &'static str,
}

#[derive(Serialize)]
struct MessageResponse {
    message: String,
}

async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

async fn server_info(State(state): State<AppState>) -> Json<InfoResponse> {
    Json(InfoResponse {
        name: state.config.instance_name.clone(),
        version: env!("CARGO_PKG_VERSION"),
    })
}

async fn media_list(State(state): State<AppState>) -> Json<Vec<MediaRecord>> {
    Json(state.media.all_media().await)
}

async fn media_get(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> Result<Response, ApiError> {
    let id = parse_media_id(&raw_id)?;
    let (bytes, record) = state.media.media_file(id).await?;
    media_response(bytes, &record, false)
}

async fn media_download(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> Result<Response, ApiError> {
    let id = parse_media_id(&raw_id)?;
    let (bytes, record) = state.media.media_file(id).await?;
    media_response(bytes, &record, true)
}

async fn media_thumbnail(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> Result<Response, ApiError> {
    let id = parse_media_id(&raw_id)?;

    // The blob must still exist even for videos, where the placeholder
    // ignores its bytes: a record without a blob is 404, not a thumbnail.
    let (bytes, record) = state.media.media_file(id).await?;

    if record.file_type.starts_with("video/") {
        let svg = thumbnail::video_placeholder(&record.file_name);
        return Response::builder()
            .status(StatusCode::OK)
            .header(header::CONTENT_TYPE, "image/svg+xml")
            .body(Body::from(svg))
            .map_err(|e| ApiError::Internal(format!("Failed to build response: {e}")));
    }

    media_response(bytes, &record, false)
}

async fn media_delete(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    let id = parse_media_id(&raw_id)?;

    if state.media.delete_media(id).await {
        info!(id, "Media deleted via API");
        Ok(Json(MessageResponse {
            message: format!("Media {id} deleted"),
        }))
    } else {
        Err(ApiError::NotFound(format!("Media {id} not found")))
    }
}

/// Parse the id path segment explicitly so a non-numeric id produces the
/// documented 400 JSON body instead of the extractor's plain-text reject.
fn parse_media_id(raw: &str) -> Result<u64, ApiError> {
    raw.parse::<u64>()
        .map_err(|_| ApiError::BadRequest(format!("Invalid media id '{raw}'")))
}

/// Raw bytes with the record's own content type; `attachment` adds the
/// download disposition.
fn media_response(
    bytes: Vec<u8>,
    record: &MediaRecord,
    attachment: bool,
) -> Result<Response, ApiError> {
    let mut builder = Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, record.file_type.as_str());

    if attachment {
        let disposition = format!(
            "attachment; filename=\"{}\"",
            header_safe_name(&record.file_name)
        );
        builder = builder.header(header::CONTENT_DISPOSITION, disposition);
    }

    builder
        .body(Body::from(bytes))
        .map_err(|e| ApiError::Internal(format!("Failed to build response: {e}")))
}

/// Keep quoted-string header values intact whatever the client named the
/// file.
fn header_safe_name(name: &str) -> String {
    name.chars()
        .filter(|c| !c.is_control() && *c != '"')
        .collect()
}

pub async fn serve(state: AppState, addr: std::net::SocketAddr) -> anyhow::Result<()> {
    let app = build_router(state);

    info!(addr = %addr, "Starting HTTP API server");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<std::net::SocketAddr>(),
    )
    .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;
    use axum::http::Request;
    use serde_json::Value;
    use tempfile::TempDir;
    use tower::ServiceExt;

    use keepsake_store::BlobStore;

    const BOUNDARY: &str = "keepsake-test-boundary";

    async fn test_router_with_config(config: ServerConfig) -> (Router, TempDir) {
        let dir = TempDir::new().unwrap();
        let blobs = BlobStore::open(dir.path().to_path_buf()).await.unwrap();
        let state = AppState {
            media: Arc::new(MediaRegistry::new(blobs)),
            mirror: None,
            rate_limiter: RateLimiter::default(),
            config: Arc::new(config),
        };
        (build_router(state), dir)
    }

    async fn test_router() -> (Router, TempDir) {
        test_router_with_config(ServerConfig::default()).await
    }

    fn file_part(filename: &str, content_type: &str, data: &[u8]) -> Vec<u8> {
        let mut part = format!(
            "--{BOUNDARY}\r\n\
             Content-Disposition: form-data; name=\"media\"; filename=\"{filename}\"\r\n\
             Content-Type: {content_type}\r\n\r\n"
        )
        .into_bytes();
        part.extend_from_slice(data);
        part.extend_from_slice(b"\r\n");
        part
    }

    fn multipart_request(parts: Vec<Vec<u8>>) -> Request<Body> {
        let mut body = Vec::new();
        for part in parts {
            body.extend_from_slice(&part);
        }
        body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

        Request::builder()
            .method("POST")
            .uri("/api/media/upload")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap()
    }

    fn get_request(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    async fn body_json(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_upload_then_get_round_trip() {
        let (router, _dir) = test_router().await;
        let payload = b"\xFF\xD8\xFFfake-jpeg-bytes";

        let response = router
            .clone()
            .oneshot(multipart_request(vec![file_part(
                "beach.jpg",
                "image/jpeg",
                payload,
            )]))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);

        let json = body_json(response).await;
        assert_eq!(json["results"][0]["status"], "success");
        assert_eq!(json["results"][0]["fileName"], "beach.jpg");
        let id = json["results"][0]["id"].as_u64().unwrap();

        let response = router
            .clone()
            .oneshot(get_request(&format!("/api/media/{id}")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "image/jpeg"
        );
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&bytes[..], payload);
    }

    #[tokio::test]
    async fn test_upload_batch_drops_non_media() {
        let (router, _dir) = test_router().await;

        let response = router
            .clone()
            .oneshot(multipart_request(vec![
                file_part("beach.jpg", "image/jpeg", b"jpeg"),
                file_part("notes.txt", "text/plain", b"guest list"),
            ]))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);

        let json = body_json(response).await;
        let results = json["results"].as_array().unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0]["status"], "success");
        assert_eq!(results[0]["fileName"], "beach.jpg");
        assert!(results[0]["id"].is_u64());

        let response = router.clone().oneshot(get_request("/api/media")).await.unwrap();
        let json = body_json(response).await;
        assert_eq!(json.as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_upload_partial_failure_stays_201() {
        let (router, _dir) = test_router().await;

        let response = router
            .clone()
            .oneshot(multipart_request(vec![
                file_part("good.png", "image/png", b"png"),
                // Empty payload fails shape validation for this file only.
                file_part("empty.png", "image/png", b""),
            ]))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);

        let json = body_json(response).await;
        let results = json["results"].as_array().unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0]["status"], "success");
        assert_eq!(results[1]["status"], "error");
        assert_eq!(results[1]["fileName"], "empty.png");
        assert!(results[1]["message"].is_string());
    }

    #[tokio::test]
    async fn test_upload_without_files_is_400() {
        let (router, _dir) = test_router().await;

        // A form with no "media" part at all.
        let note = format!(
            "--{BOUNDARY}\r\n\
             Content-Disposition: form-data; name=\"note\"\r\n\r\n\
             hello\r\n"
        )
        .into_bytes();

        let response = router.clone().oneshot(multipart_request(vec![note])).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let json = body_json(response).await;
        assert!(json["message"].is_string());
    }

    #[tokio::test]
    async fn test_upload_over_size_limit_is_413() {
        let (router, _dir) = test_router_with_config(ServerConfig {
            max_upload_size: 256,
            ..ServerConfig::default()
        })
        .await;

        let response = router
            .clone()
            .oneshot(multipart_request(vec![file_part(
                "huge.jpg",
                "image/jpeg",
                &[0u8; 1024],
            )]))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[tokio::test]
    async fn test_unknown_id_is_404() {
        let (router, _dir) = test_router().await;

        for uri in [
            "/api/media/99",
            "/api/media/99/download",
            "/api/media/99/thumbnail",
        ] {
            let response = router.clone().oneshot(get_request(uri)).await.unwrap();
            assert_eq!(response.status(), StatusCode::NOT_FOUND, "GET {uri}");
        }
    }

    #[tokio::test]
    async fn test_non_numeric_id_is_400() {
        let (router, _dir) = test_router().await;

        let response = router
            .clone()
            .oneshot(get_request("/api/media/abc"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let json = body_json(response).await;
        assert!(json["message"].as_str().unwrap().contains("abc"));
    }

    #[tokio::test]
    async fn test_download_sets_disposition() {
        let (router, _dir) = test_router().await;

        router
            .clone()
            .oneshot(multipart_request(vec![file_part(
                "rings.png",
                "image/png",
                b"png-bytes",
            )]))
            .await
            .unwrap();

        let response = router
            .clone()
            .oneshot(get_request("/api/media/1/download"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "image/png");
        assert_eq!(
            response.headers()[header::CONTENT_DISPOSITION],
            "attachment; filename=\"rings.png\""
        );
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&bytes[..], b"png-bytes");
    }

    #[tokio::test]
    async fn test_video_thumbnail_is_svg_with_name() {
        let (router, _dir) = test_router().await;

        router
            .clone()
            .oneshot(multipart_request(vec![file_part(
                "first-dance.mp4",
                "video/mp4",
                b"mp4-bytes",
            )]))
            .await
            .unwrap();

        let response = router
            .clone()
            .oneshot(get_request("/api/media/1/thumbnail"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "image/svg+xml"
        );
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let svg = String::from_utf8(bytes.to_vec()).unwrap();
        assert!(svg.contains("first-dance.mp4"));
    }

    #[tokio::test]
    async fn test_image_thumbnail_matches_get() {
        let (router, _dir) = test_router().await;
        let payload = b"png-pixels";

        router
            .clone()
            .oneshot(multipart_request(vec![file_part(
                "cake.png",
                "image/png",
                payload,
            )]))
            .await
            .unwrap();

        let thumb = router
            .clone()
            .oneshot(get_request("/api/media/1/thumbnail"))
            .await
            .unwrap();
        let direct = router
            .clone()
            .oneshot(get_request("/api/media/1"))
            .await
            .unwrap();

        let thumb_bytes = to_bytes(thumb.into_body(), usize::MAX).await.unwrap();
        let direct_bytes = to_bytes(direct.into_body(), usize::MAX).await.unwrap();
        assert_eq!(thumb_bytes, direct_bytes);
        assert_eq!(&direct_bytes[..], payload);
    }

    #[tokio::test]
    async fn test_delete_then_delete_again() {
        let (router, _dir) = test_router().await;

        router
            .clone()
            .oneshot(multipart_request(vec![file_part(
                "toast.jpg",
                "image/jpeg",
                b"jpeg",
            )]))
            .await
            .unwrap();

        let response = router
            .clone()
            .oneshot(
                Request::builder()
                    .method("DELETE")
                    .uri("/api/media/1")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert!(json["message"].is_string());

        let response = router
            .clone()
            .oneshot(
                Request::builder()
                    .method("DELETE")
                    .uri("/api/media/1")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = router.clone().oneshot(get_request("/api/media/1")).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_list_in_creation_order() {
        let (router, _dir) = test_router().await;

        let response = router
            .clone()
            .oneshot(multipart_request(vec![
                file_part("one.jpg", "image/jpeg", b"1"),
                file_part("two.jpg", "image/jpeg", b"2"),
                file_part("three.jpg", "image/jpeg", b"3"),
            ]))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);

        let response = router.clone().oneshot(get_request("/api/media")).await.unwrap();
        let json = body_json(response).await;
        let ids: Vec<u64> = json
            .as_array()
            .unwrap()
            .iter()
            .map(|r| r["id"].as_u64().unwrap())
            .collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_health() {
        let (router, _dir) = test_router().await;

        let response = router.clone().oneshot(get_request("/health")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["status"], "ok");
    }
}
