use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use axum::body::Bytes;
use axum::extract::multipart::{Multipart, MultipartError, MultipartRejection};
use axum::extract::rejection::JsonRejection;
use axum::extract::{DefaultBodyLimit, Path as AxumPath, Request, State};
use axum::http::{header, HeaderValue, Method, StatusCode, Uri};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::{routing::get, routing::post, Json, Router};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use serde::Deserialize;
use serde_json::{json, Value};
use thiserror::Error;
use tokio::task;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use gstdesk_core::{
    spawn_watcher, ArticleRecord, Collection, DocumentStore, ExtractionBridge, NewArticle,
    NewNotification, NewUser, NotificationRecord, ServiceConfig, StoreError, SubprocessExtractor,
    UploadStore, UserRecord, UserRegistry,
};

const MAX_MULTIPART_BYTES: usize = 50 * 1024 * 1024;
const MAX_ENVELOPE_BYTES: usize = 10 * 1024 * 1024;

struct AppState {
    store: Arc<DocumentStore>,
    registry: Arc<UserRegistry>,
    uploads: UploadStore,
    bridge: ExtractionBridge,
    public_dir: PathBuf,
}

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    tracing_subscriber::fmt::init();
    let config = ServiceConfig::from_env()?;
    fs::create_dir_all(&config.data_dir)
        .with_context(|| format!("failed to create {}", config.data_dir.display()))?;
    fs::create_dir_all(config.uploads_dir())
        .with_context(|| format!("failed to create {}", config.uploads_dir().display()))?;
    fs::create_dir_all(&config.public_dir)
        .with_context(|| format!("failed to create {}", config.public_dir.display()))?;

    let store = Arc::new(DocumentStore::open(
        config.primary_path(),
        config.fallback_path(),
    ));
    let registry = Arc::new(UserRegistry::open(config.users_path()));
    spawn_watcher(store.clone(), registry.clone(), config.watch_interval);

    let engine = SubprocessExtractor::new(&config.extract_command, config.extract_timeout)?;
    let state = Arc::new(AppState {
        bridge: ExtractionBridge::new(Arc::new(engine), store.clone()),
        uploads: UploadStore::new(config.uploads_dir()),
        public_dir: config.public_dir.clone(),
        store,
        registry,
    });
    let app = build_router(state);
    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("listening" = %addr);
    axum::serve(listener, app).await?;
    Ok(())
}

fn build_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE]);
    Router::new()
        .route("/api/health", get(handle_health))
        .route("/api/dashboard", get(handle_dashboard))
        .route("/api/users", get(handle_list_users).post(handle_create_user))
        .route("/api/notifications", post(handle_create_notification))
        .route("/api/content", post(handle_create_content))
        .route(
            "/api/upload",
            post(handle_upload_multipart).layer(DefaultBodyLimit::max(MAX_MULTIPART_BYTES)),
        )
        .route(
            "/api/upload/pdf",
            post(handle_upload_envelope).layer(DefaultBodyLimit::max(MAX_ENVELOPE_BYTES)),
        )
        .route("/admin", get(serve_admin_page))
        .route("/extract", get(serve_extract_page))
        .route("/admin/*asset", get(serve_admin_asset))
        .fallback(handle_fallback)
        .layer(middleware::from_fn(rewrite_admin_prefix))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(middleware::from_fn(answer_options))
        .with_state(state)
}

/// Reverse-proxy deployments mount the API under /admin; strip the prefix
/// before route matching.
async fn rewrite_admin_prefix(mut request: Request, next: Next) -> Response {
    if let Some(stripped) = request.uri().path().strip_prefix("/admin/api/") {
        let rewritten = match request.uri().query() {
            Some(query) => format!("/api/{stripped}?{query}"),
            None => format!("/api/{stripped}"),
        };
        if let Ok(uri) = rewritten.parse::<Uri>() {
            *request.uri_mut() = uri;
        }
    }
    next.run(request).await
}

async fn answer_options(request: Request, next: Next) -> Response {
    if request.method() == Method::OPTIONS {
        let mut response = StatusCode::NO_CONTENT.into_response();
        let headers = response.headers_mut();
        headers.insert(
            header::ACCESS_CONTROL_ALLOW_ORIGIN,
            HeaderValue::from_static("*"),
        );
        headers.insert(
            header::ACCESS_CONTROL_ALLOW_METHODS,
            HeaderValue::from_static("GET,POST,OPTIONS"),
        );
        headers.insert(
            header::ACCESS_CONTROL_ALLOW_HEADERS,
            HeaderValue::from_static("Content-Type"),
        );
        return response;
    }
    next.run(request).await
}

async fn handle_health(State(state): State<Arc<AppState>>) -> Json<Value> {
    let snapshot = state.store.snapshot();
    let users = state.registry.users();
    Json(json!({
        "status": "ok",
        "updatedAt": state.store.last_loaded().to_rfc3339(),
        "counts": {
            "sets": snapshot.sets.len(),
            "articles": snapshot.articles.len(),
            "trending": snapshot.trending.len(),
            "plans": snapshot.plans.len(),
            "aiMessages": snapshot.ai_messages.len(),
            "notifications": snapshot.notifications.len(),
            "users": users.len(),
        },
        "data": {
            "sets": snapshot.sets,
            "articles": snapshot.articles,
            "trending": snapshot.trending,
            "plans": snapshot.plans,
            "aiMessages": snapshot.ai_messages,
            "notifications": snapshot.notifications,
            "users": users,
        },
    }))
}

async fn handle_dashboard(State(state): State<Arc<AppState>>) -> Json<gstdesk_core::Snapshot> {
    Json(state.store.snapshot())
}

async fn handle_list_users(State(state): State<Arc<AppState>>) -> Json<Vec<UserRecord>> {
    Json(state.registry.users())
}

async fn handle_create_user(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<NewUser>, JsonRejection>,
) -> Result<(StatusCode, Json<UserRecord>), AppError> {
    let Json(input) = payload.map_err(AppError::from_json_rejection)?;
    let record = task::spawn_blocking(move || state.registry.create(input))
        .await
        .map_err(AppError::internal)??;
    Ok((StatusCode::CREATED, Json(record)))
}

async fn handle_create_notification(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<NewNotification>, JsonRejection>,
) -> Result<(StatusCode, Json<NotificationRecord>), AppError> {
    let Json(input) = payload.map_err(AppError::from_json_rejection)?;
    let record = NotificationRecord::from_input(input)?;
    let value = serde_json::to_value(&record).map_err(AppError::internal)?;
    task::spawn_blocking(move || state.store.append(Collection::Notifications, value))
        .await
        .map_err(AppError::internal)??;
    Ok((StatusCode::CREATED, Json(record)))
}

async fn handle_create_content(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<NewArticle>, JsonRejection>,
) -> Result<(StatusCode, Json<ArticleRecord>), AppError> {
    let Json(input) = payload.map_err(AppError::from_json_rejection)?;
    let record = ArticleRecord::from_input(input)?;
    let value = serde_json::to_value(&record).map_err(AppError::internal)?;
    task::spawn_blocking(move || state.store.append(Collection::Articles, value))
        .await
        .map_err(AppError::internal)??;
    Ok((StatusCode::CREATED, Json(record)))
}

async fn handle_upload_multipart(
    State(state): State<Arc<AppState>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<Value>, AppError> {
    let mut multipart =
        multipart.map_err(|_| AppError::BadRequest("No boundary found".to_string()))?;
    let mut upload: Option<(String, Bytes)> = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(AppError::from_multipart_error)?
    {
        let is_pdf = field
            .content_type()
            .map(|ct| ct == "application/pdf")
            .unwrap_or(false);
        if !is_pdf {
            continue;
        }
        let file_name = field.file_name().unwrap_or("upload.pdf").to_string();
        let data = field
            .bytes()
            .await
            .map_err(AppError::from_multipart_error)?;
        upload = Some((file_name, data));
        break;
    }
    let (file_name, data) =
        upload.ok_or_else(|| AppError::BadRequest("No PDF file found in upload".to_string()))?;

    let uploads = state.uploads.clone();
    let saved = task::spawn_blocking(move || uploads.save(&file_name, &data))
        .await
        .map_err(AppError::internal)??;
    match state.bridge.run(&saved.path).await {
        Ok(summary) => Ok(Json(json!({
            "success": true,
            "message": "PDF uploaded and data extracted successfully",
            "fileName": saved.file_name,
            "totalArticles": summary.total_articles,
            "categories": summary.categories,
        }))),
        Err(err) => Ok(Json(json!({
            "success": false,
            "message": "PDF uploaded but extraction failed",
            "fileName": saved.file_name,
            "error": err.to_string(),
        }))),
    }
}

#[derive(Debug, Deserialize)]
struct EnvelopeUpload {
    #[serde(default, rename = "fileName")]
    file_name: Option<String>,
    #[serde(default)]
    data: Option<String>,
}

async fn handle_upload_envelope(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<EnvelopeUpload>, JsonRejection>,
) -> Result<Response, AppError> {
    let Json(body) = payload.map_err(AppError::from_json_rejection)?;
    let encoded = body
        .data
        .ok_or_else(|| AppError::BadRequest("data is required (base64)".to_string()))?;
    let bytes = BASE64
        .decode(encoded.as_bytes())
        .map_err(|err| AppError::BadRequest(format!("invalid base64 payload: {err}")))?;
    let file_name = body.file_name.unwrap_or_else(|| "upload.pdf".to_string());

    let uploads = state.uploads.clone();
    let saved = task::spawn_blocking(move || uploads.save(&file_name, &bytes))
        .await
        .map_err(AppError::internal)??;
    match state.bridge.run(&saved.path).await {
        Ok(_) => Ok((
            StatusCode::CREATED,
            Json(json!({
                "ok": true,
                "message": "Uploaded and extracted",
                "path": saved.path,
            })),
        )
            .into_response()),
        Err(err) => Ok((
            StatusCode::OK,
            Json(json!({
                "ok": true,
                "message": "Uploaded but extraction failed",
                "path": saved.path,
                "error": err.to_string(),
            })),
        )
            .into_response()),
    }
}

async fn serve_admin_page(State(state): State<Arc<AppState>>) -> Response {
    serve_public_file(&state.public_dir, "admin.html", "text/html")
}

async fn serve_extract_page(State(state): State<Arc<AppState>>) -> Response {
    serve_public_file(&state.public_dir, "extract.html", "text/html")
}

async fn serve_admin_asset(
    State(state): State<Arc<AppState>>,
    AxumPath(asset): AxumPath<String>,
) -> Response {
    if asset.split('/').any(|part| part == "..") {
        return file_not_found();
    }
    let content_type = match Path::new(&asset).extension().and_then(|ext| ext.to_str()) {
        Some("js") => "application/javascript",
        Some("css") => "text/css",
        _ => "text/plain",
    };
    serve_public_file(&state.public_dir, &asset, content_type)
}

fn serve_public_file(dir: &Path, file: &str, content_type: &'static str) -> Response {
    match fs::read(dir.join(file)) {
        Ok(bytes) => ([(header::CONTENT_TYPE, content_type)], bytes).into_response(),
        Err(_) => file_not_found(),
    }
}

fn file_not_found() -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(json!({"error": "File not found"})),
    )
        .into_response()
}

async fn handle_fallback() -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(json!({"error": "Route not found"})),
    )
        .into_response()
}

#[derive(Debug, Error)]
enum AppError {
    #[error("{0}")]
    BadRequest(String),
    #[error("payload too large")]
    PayloadTooLarge,
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    fn internal<E: Into<anyhow::Error>>(err: E) -> Self {
        Self::Internal(err.into())
    }

    fn from_json_rejection(rejection: JsonRejection) -> Self {
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            Self::PayloadTooLarge
        } else {
            Self::BadRequest(rejection.body_text())
        }
    }

    fn from_multipart_error(err: MultipartError) -> Self {
        if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
            Self::PayloadTooLarge
        } else {
            Self::BadRequest(err.body_text())
        }
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Validation(msg) => AppError::BadRequest(msg),
            StoreError::PayloadTooLarge => AppError::PayloadTooLarge,
            other => AppError::Internal(other.into()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, Json(json!({"error": msg}))).into_response()
            }
            AppError::PayloadTooLarge => (
                StatusCode::PAYLOAD_TOO_LARGE,
                Json(json!({"error": "Payload too large"})),
            )
                .into_response(),
            AppError::Internal(err) => {
                error!("internal_error" = %err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({"error": "internal error"})),
                )
                    .into_response()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use base64::Engine as _;
    use gstdesk_core::ExtractionEngine;
    use http_body_util::BodyExt;
    use tempfile::{tempdir, TempDir};
    use tower::ServiceExt;

    struct WritingEngine(Value);

    #[async_trait::async_trait]
    impl ExtractionEngine for WritingEngine {
        async fn extract(&self, _source: &Path, output: &Path) -> gstdesk_core::Result<()> {
            fs::write(output, self.0.to_string())?;
            Ok(())
        }
    }

    struct FailingEngine;

    #[async_trait::async_trait]
    impl ExtractionEngine for FailingEngine {
        async fn extract(&self, _source: &Path, _output: &Path) -> gstdesk_core::Result<()> {
            Err(StoreError::Extraction("boom".to_string()))
        }
    }

    fn test_router(dir: &TempDir, engine: Arc<dyn ExtractionEngine>) -> Router {
        let data_dir = dir.path();
        let store = Arc::new(DocumentStore::open(
            data_dir.join("gst_data.json"),
            data_dir.join("db.json"),
        ));
        let registry = Arc::new(UserRegistry::open(data_dir.join("users.json")));
        build_router(Arc::new(AppState {
            bridge: ExtractionBridge::new(engine, store.clone()),
            uploads: UploadStore::new(data_dir.join("uploads")),
            public_dir: data_dir.join("public"),
            store,
            registry,
        }))
    }

    async fn call(router: Router, request: Request) -> (StatusCode, Value) {
        let response = router.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    fn get_request(path: &str) -> Request {
        Request::builder().uri(path).body(Body::empty()).unwrap()
    }

    fn json_post(path: &str, body: Value) -> Request {
        Request::builder()
            .method(Method::POST)
            .uri(path)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn multipart_post(path: &str, file_name: &str, part_content_type: &str) -> Request {
        let boundary = "XBOUNDARY";
        let body = format!(
            "--{boundary}\r\n\
             Content-Disposition: form-data; name=\"file\"; filename=\"{file_name}\"\r\n\
             Content-Type: {part_content_type}\r\n\r\n\
             %PDF-1.4 fake\r\n\
             --{boundary}--\r\n"
        );
        Request::builder()
            .method(Method::POST)
            .uri(path)
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={boundary}"),
            )
            .body(Body::from(body))
            .unwrap()
    }

    #[tokio::test]
    async fn content_creation_derives_category_and_reaches_dashboard() {
        let dir = tempdir().unwrap();
        let router = test_router(&dir, Arc::new(FailingEngine));
        let (status, body) = call(
            router.clone(),
            json_post("/api/content", json!({"title": "New Circular", "kind": "circular"})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["category"], "Circulars");

        let (status, body) = call(router, get_request("/api/dashboard")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["articles"][0]["title"], "New Circular");
        assert_eq!(body["articles"][0]["category"], "Circulars");
    }

    #[tokio::test]
    async fn create_user_requires_phone() {
        let dir = tempdir().unwrap();
        let router = test_router(&dir, Arc::new(FailingEngine));
        let (status, body) = call(router.clone(), json_post("/api/users", json!({}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "phone is required");

        let (_, users) = call(router, get_request("/api/users")).await;
        assert_eq!(users, json!([]));
    }

    #[tokio::test]
    async fn create_user_round_trips() {
        let dir = tempdir().unwrap();
        let router = test_router(&dir, Arc::new(FailingEngine));
        let (status, body) = call(
            router.clone(),
            json_post("/api/users", json!({"phone": "555-0100", "name": "Asha"})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert!(body["id"].as_str().is_some());

        let (_, users) = call(router, get_request("/api/users")).await;
        assert_eq!(users[0]["phone"], "555-0100");
    }

    #[tokio::test]
    async fn create_notification_requires_both_fields() {
        let dir = tempdir().unwrap();
        let router = test_router(&dir, Arc::new(FailingEngine));
        let (status, body) = call(
            router,
            json_post("/api/notifications", json!({"title": "only"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "title and message are required");
    }

    #[tokio::test]
    async fn unknown_route_is_json_404() {
        let dir = tempdir().unwrap();
        let router = test_router(&dir, Arc::new(FailingEngine));
        let (status, body) = call(router, get_request("/api/unknown")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "Route not found");
    }

    #[tokio::test]
    async fn options_gets_204_with_cors_headers() {
        let dir = tempdir().unwrap();
        let router = test_router(&dir, Arc::new(FailingEngine));
        let request = Request::builder()
            .method(Method::OPTIONS)
            .uri("/api/users")
            .body(Body::empty())
            .unwrap();
        let response = router.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert_eq!(
            response
                .headers()
                .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
                .unwrap(),
            "*"
        );
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        assert!(bytes.is_empty());
    }

    #[tokio::test]
    async fn admin_prefix_is_stripped_before_matching() {
        let dir = tempdir().unwrap();
        let router = test_router(&dir, Arc::new(FailingEngine));
        let (status, body) = call(router, get_request("/admin/api/users")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!([]));
    }

    #[tokio::test]
    async fn health_reports_counts_and_data() {
        let dir = tempdir().unwrap();
        let router = test_router(&dir, Arc::new(FailingEngine));
        let (status, _) = call(
            router.clone(),
            json_post("/api/content", json!({"title": "t"})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);

        let (status, body) = call(router, get_request("/api/health")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["counts"]["articles"], 1);
        assert_eq!(body["counts"]["users"], 0);
        assert_eq!(body["data"]["articles"][0]["title"], "t");
        assert!(body["updatedAt"].as_str().is_some());
    }

    #[tokio::test]
    async fn envelope_upload_requires_data() {
        let dir = tempdir().unwrap();
        let router = test_router(&dir, Arc::new(FailingEngine));
        let (status, body) = call(
            router,
            json_post("/api/upload/pdf", json!({"fileName": "x.pdf"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "data is required (base64)");
    }

    #[tokio::test]
    async fn envelope_upload_rejects_bad_base64() {
        let dir = tempdir().unwrap();
        let router = test_router(&dir, Arc::new(FailingEngine));
        let (status, _) = call(
            router,
            json_post("/api/upload/pdf", json!({"data": "!!not base64!!"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn envelope_upload_soft_fails_but_keeps_file() {
        let dir = tempdir().unwrap();
        let router = test_router(&dir, Arc::new(FailingEngine));
        let (status, body) = call(
            router,
            json_post(
                "/api/upload/pdf",
                json!({"fileName": "a report.pdf", "data": BASE64.encode(b"%PDF-1.4")}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["ok"], true);
        assert_eq!(body["message"], "Uploaded but extraction failed");
        assert_eq!(body["error"], "boom");
        let path = body["path"].as_str().unwrap();
        assert!(path.ends_with("-a_report.pdf"));
        assert!(Path::new(path).exists());
    }

    #[tokio::test]
    async fn envelope_upload_success_is_201_and_reloads_store() {
        let dir = tempdir().unwrap();
        let extracted = json!({"articles": [{"title": "a", "category": "Circulars"}]});
        let router = test_router(&dir, Arc::new(WritingEngine(extracted)));
        let (status, body) = call(
            router.clone(),
            json_post("/api/upload/pdf", json!({"data": BASE64.encode(b"%PDF-1.4")})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["message"], "Uploaded and extracted");

        let (_, dashboard) = call(router, get_request("/api/dashboard")).await;
        assert_eq!(dashboard["articles"][0]["category"], "Circulars");
    }

    #[tokio::test]
    async fn multipart_upload_without_boundary_is_rejected() {
        let dir = tempdir().unwrap();
        let router = test_router(&dir, Arc::new(FailingEngine));
        let request = Request::builder()
            .method(Method::POST)
            .uri("/api/upload")
            .header(header::CONTENT_TYPE, "application/octet-stream")
            .body(Body::from("raw"))
            .unwrap();
        let (status, body) = call(router, request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "No boundary found");
        assert!(!dir.path().join("uploads").exists());
    }

    #[tokio::test]
    async fn multipart_upload_without_pdf_part_is_rejected() {
        let dir = tempdir().unwrap();
        let router = test_router(&dir, Arc::new(FailingEngine));
        let (status, body) = call(
            router,
            multipart_post("/api/upload", "notes.txt", "text/plain"),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "No PDF file found in upload");
    }

    #[tokio::test]
    async fn multipart_upload_extracts_and_summarizes() {
        let dir = tempdir().unwrap();
        let extracted = json!({"articles": [
            {"title": "a", "category": "Circulars"},
            {"title": "b"}
        ]});
        let router = test_router(&dir, Arc::new(WritingEngine(extracted)));
        let (status, body) = call(
            router,
            multipart_post("/api/upload", "May circular.pdf", "application/pdf"),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["totalArticles"], 2);
        assert_eq!(body["categories"]["Circulars"], 1);
        assert_eq!(body["categories"]["Other"], 1);
        let file_name = body["fileName"].as_str().unwrap();
        assert!(file_name.ends_with("-May_circular.pdf"));
        assert!(dir.path().join("uploads").join(file_name).exists());
    }

    #[tokio::test]
    async fn multipart_extraction_failure_is_soft() {
        let dir = tempdir().unwrap();
        let router = test_router(&dir, Arc::new(FailingEngine));
        let (status, body) = call(
            router,
            multipart_post("/api/upload", "report.pdf", "application/pdf"),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], false);
        assert_eq!(body["message"], "PDF uploaded but extraction failed");
        assert_eq!(body["error"], "boom");
        let file_name = body["fileName"].as_str().unwrap();
        assert!(dir.path().join("uploads").join(file_name).exists());
    }

    #[tokio::test]
    async fn admin_assets_are_served_with_content_types() {
        let dir = tempdir().unwrap();
        let public = dir.path().join("public");
        fs::create_dir_all(&public).unwrap();
        fs::write(public.join("admin.html"), "<html></html>").unwrap();
        fs::write(public.join("app.js"), "console.log(1)").unwrap();
        let router = test_router(&dir, Arc::new(FailingEngine));

        let response = router
            .clone()
            .oneshot(get_request("/admin"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            "text/html"
        );

        let response = router
            .clone()
            .oneshot(get_request("/admin/app.js"))
            .await
            .unwrap();
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            "application/javascript"
        );

        let (status, body) = call(router, get_request("/admin/missing.css")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "File not found");
    }
}
