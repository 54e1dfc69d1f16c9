//! REST surface over a [`DocumentStore`]:
//!
//! | Method | Path                  | Success            |
//! |--------|-----------------------|--------------------|
//! | GET    | `/api/documents`      | 200, summaries     |
//! | GET    | `/api/documents/:id`  | 200, record        |
//! | POST   | `/api/documents`      | 201, record        |
//! | PUT    | `/api/documents/:id`  | 200, record        |
//! | DELETE | `/api/documents/:id`  | 200, `{"message"}` |
//!
//! Every error body is `{"message": string}`.

use axum::{
    extract::{rejection::JsonRejection, DefaultBodyLimit, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use folio_store::{DocumentDraft, DocumentRecord, DocumentStore, DocumentSummary, StoreError};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

/// Largest accepted request body; documents carry images as data URIs
pub const BODY_LIMIT: usize = 10 * 1024 * 1024;

#[derive(Error, Debug)]
pub enum ServerError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Store(#[from] StoreError),
}

#[derive(Debug, Serialize)]
struct MessageBody {
    message: String,
}

fn message(status: StatusCode, text: impl Into<String>) -> Response {
    (status, Json(MessageBody { message: text.into() })).into_response()
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        match self {
            ServerError::Store(StoreError::NotFound(_)) => {
                message(StatusCode::NOT_FOUND, "Document not found")
            }
            ServerError::BadRequest(text) => message(StatusCode::BAD_REQUEST, text),
            ServerError::Store(StoreError::Rejected { status, message: text }) => {
                let status = StatusCode::from_u16(status).unwrap_or(StatusCode::BAD_GATEWAY);
                message(status, text)
            }
            ServerError::Store(err @ StoreError::Unavailable(_)) => {
                tracing::error!(error = %err, "store unavailable");
                message(StatusCode::SERVICE_UNAVAILABLE, err.to_string())
            }
            ServerError::Store(err) => {
                tracing::error!(error = %err, "store error");
                message(StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
            }
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    store: Arc<dyn DocumentStore>,
}

/// Options for the HTTP layers around the API routes
#[derive(Debug, Clone, Default)]
pub struct ServeOptions {
    /// Serve this directory at `/uploads`
    pub uploads_dir: Option<PathBuf>,
}

/// API routes only, mounted under `/api`
pub fn router(store: Arc<dyn DocumentStore>) -> Router {
    let api = Router::new()
        .route("/documents", get(list_documents).post(create_document))
        .route(
            "/documents/:id",
            get(read_document).put(update_document).delete(delete_document),
        )
        .with_state(AppState { store });

    Router::new().nest("/api", api)
}

/// Full application: API routes plus body limit, CORS, tracing and uploads
pub fn app(store: Arc<dyn DocumentStore>, options: &ServeOptions) -> Router {
    let mut app = router(store);

    if let Some(dir) = &options.uploads_dir {
        tracing::info!(dir = %dir.display(), "serving uploads");
        app = app.nest_service("/uploads", ServeDir::new(dir));
    }

    app.layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(CorsLayer::permissive())
            .layer(DefaultBodyLimit::max(BODY_LIMIT)),
    )
}

fn draft_from(body: Result<Json<DocumentDraft>, JsonRejection>) -> Result<DocumentDraft, ServerError> {
    body.map(|Json(draft)| draft)
        .map_err(|rejection| ServerError::BadRequest(rejection.body_text()))
}

async fn list_documents(State(state): State<AppState>) -> Result<Json<Vec<DocumentSummary>>, ServerError> {
    Ok(Json(state.store.list().await?))
}

async fn read_document(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<DocumentRecord>, ServerError> {
    Ok(Json(state.store.read(&id).await?))
}

async fn create_document(
    State(state): State<AppState>,
    body: Result<Json<DocumentDraft>, JsonRejection>,
) -> Result<(StatusCode, Json<DocumentRecord>), ServerError> {
    let record = state.store.create(draft_from(body)?).await?;
    tracing::info!(id = %record.id, title = %record.title, "created document");
    Ok((StatusCode::CREATED, Json(record)))
}

async fn update_document(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<Json<DocumentDraft>, JsonRejection>,
) -> Result<Json<DocumentRecord>, ServerError> {
    let record = state.store.update(&id, draft_from(body)?).await?;
    tracing::info!(id = %record.id, "updated document");
    Ok(Json(record))
}

async fn delete_document(State(state): State<AppState>, Path(id): Path<String>) -> Result<Response, ServerError> {
    state.store.delete(&id).await?;
    tracing::info!(%id, "deleted document");
    Ok(message(StatusCode::OK, "Document deleted"))
}
