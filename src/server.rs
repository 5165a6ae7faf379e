//! HTTP surface.
//!
//! | Route | Behavior |
//! |---|---|
//! | `POST /api/thumbnail` | multipart `img` + `top`/`left`/`width`/`height` → `./api/thumbnail/get?id=N` |
//! | `GET /api/thumbnail/get?id=N` | the JPEG, as an attachment; afterwards it is gone |
//! | `GET /` | upload page, or the configured `static_dir` |
//!
//! Image work is CPU-bound and runs on tokio's blocking pool, one pipeline
//! per request. Every rejected request gets a plain-text error body.

use crate::config::{ServerConfig, ServiceConfig};
use crate::imaging::{
    Canvas, ExtractRect, ImageBackend, RustBackend, ThumbnailConfig, ThumbnailError,
    create_thumbnail,
};
use crate::store::{DiskStore, IdGenerator, StoreError, ThumbnailId, ThumbnailStore};
use axum::Router;
use axum::body::Bytes;
use axum::extract::multipart::MultipartError;
use axum::extract::{DefaultBodyLimit, Multipart, Query, State};
use axum::http::{StatusCode, header};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{get, post};
use maud::{DOCTYPE, Markup, html};
use serde::Deserialize;
use std::num::ParseIntError;
use std::sync::Arc;
use thiserror::Error;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

/// Form fields carrying the crop rectangle, in `ExtractRect` order.
const RECT_FIELDS: [&str; 4] = ["top", "left", "width", "height"];
const IMAGE_FIELD: &str = "img";

#[derive(Error, Debug)]
pub enum ServerError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Storage error: {0}")]
    Store(#[from] StoreError),
}

/// Errors a request can end in. Each maps to a status code.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("parse multipart form: {0}")]
    Multipart(#[from] MultipartError),
    #[error("missing form field \"{0}\"")]
    MissingField(&'static str),
    #[error("bad value in \"{field}\": {source}")]
    BadField {
        field: &'static str,
        source: ParseIntError,
    },
    #[error("bad thumbnail id: {0}")]
    BadId(ParseIntError),
    #[error("run thumbnailer: {0}")]
    Thumbnail(#[from] ThumbnailError),
    #[error("{0}")]
    Store(#[from] StoreError),
    #[error("worker failed: {0}")]
    Worker(#[from] tokio::task::JoinError),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            Self::Store(StoreError::NotFound(_)) => StatusCode::NOT_FOUND,
            Self::Store(_) | Self::Worker(_) => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), self.to_string()).into_response()
    }
}

/// Shared, read-only request context.
#[derive(Clone)]
pub struct AppState {
    backend: Arc<dyn ImageBackend>,
    store: Arc<dyn ThumbnailStore>,
    ids: Arc<IdGenerator>,
    thumbnail: ThumbnailConfig,
}

impl AppState {
    pub fn new(
        backend: Arc<dyn ImageBackend>,
        store: Arc<dyn ThumbnailStore>,
        thumbnail: ThumbnailConfig,
    ) -> Self {
        Self {
            backend,
            store,
            ids: Arc::new(IdGenerator::new()),
            thumbnail,
        }
    }
}

/// Build the application router.
///
/// With `static_dir` set, unmatched paths (including `/`) are served from
/// disk instead of the built-in upload page.
pub fn router(state: AppState, settings: &ServerConfig) -> Router {
    let api = Router::new()
        .route("/api/thumbnail", post(upload))
        .route("/api/thumbnail/get", get(download));

    let app = match &settings.static_dir {
        Some(dir) => api.fallback_service(ServeDir::new(dir)),
        None => api.route("/", get(index)),
    };

    app.layer(DefaultBodyLimit::max(settings.max_upload_bytes))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind the configured address and serve until the process is stopped.
pub async fn serve(config: ServiceConfig) -> Result<(), ServerError> {
    let store = DiskStore::open(&config.storage.dir)?;
    info!(dir = %store.dir().display(), "thumbnail storage ready");

    let state = AppState::new(
        Arc::new(RustBackend::new()),
        Arc::new(store),
        ThumbnailConfig::from(&config.thumbnail),
    );
    let app = router(state, &config.server);

    let listener = tokio::net::TcpListener::bind(config.server.address.as_str()).await?;
    info!(address = %listener.local_addr()?, "listening");
    axum::serve(listener, app).await?;
    Ok(())
}

// =============================================================================
// Handlers
// =============================================================================

struct Upload {
    image: Bytes,
    rect: ExtractRect,
}

async fn read_upload(multipart: &mut Multipart) -> Result<Upload, ApiError> {
    let mut image = None;
    let mut raw: [Option<String>; 4] = Default::default();

    while let Some(field) = multipart.next_field().await? {
        let Some(name) = field.name().map(str::to_owned) else {
            continue;
        };
        if name == IMAGE_FIELD {
            image = Some(field.bytes().await?);
        } else if let Some(i) = RECT_FIELDS.iter().position(|f| *f == name) {
            raw[i] = Some(field.text().await?);
        }
    }

    let mut values = [0i64; 4];
    for (i, field) in RECT_FIELDS.into_iter().enumerate() {
        let text = raw[i].as_deref().ok_or(ApiError::MissingField(field))?;
        values[i] = text
            .trim()
            .parse()
            .map_err(|source| ApiError::BadField { field, source })?;
    }
    let [top, left, width, height] = values;

    Ok(Upload {
        image: image.ok_or(ApiError::MissingField(IMAGE_FIELD))?,
        rect: ExtractRect::new(top, left, width, height),
    })
}

async fn render_and_store(
    state: &AppState,
    mut multipart: Multipart,
) -> Result<ThumbnailId, ApiError> {
    let Upload { image, rect } = read_upload(&mut multipart).await?;

    let backend = Arc::clone(&state.backend);
    let config = state.thumbnail.clone();
    let thumbnail = tokio::task::spawn_blocking(move || {
        create_thumbnail(backend.as_ref(), &image, &rect, &config)
    })
    .await??;

    let id = state.ids.next();
    let store = Arc::clone(&state.store);
    tokio::task::spawn_blocking(move || store.store(id, &thumbnail)).await??;
    Ok(id)
}

async fn upload(State(state): State<AppState>, multipart: Multipart) -> Result<String, ApiError> {
    match render_and_store(&state, multipart).await {
        Ok(id) => {
            info!(%id, "thumbnail created");
            Ok(format!("./api/thumbnail/get?id={id}"))
        }
        Err(e) => {
            warn!(error = %e, "thumbnail request rejected");
            Err(e)
        }
    }
}

#[derive(Debug, Deserialize)]
struct DownloadQuery {
    id: String,
}

async fn download(
    State(state): State<AppState>,
    Query(query): Query<DownloadQuery>,
) -> Result<Response, ApiError> {
    let id: ThumbnailId = query.id.trim().parse().map_err(ApiError::BadId)?;

    let store = Arc::clone(&state.store);
    let bytes = tokio::task::spawn_blocking(move || store.take_once(id)).await??;
    info!(%id, bytes = bytes.len(), "thumbnail served");

    Ok((
        [
            (header::CONTENT_TYPE, "image/jpeg"),
            (header::CONTENT_DISPOSITION, "attachment"),
        ],
        bytes,
    )
        .into_response())
}

async fn index(State(state): State<AppState>) -> Html<String> {
    Html(render_index(state.thumbnail.canvas).into_string())
}

// =============================================================================
// Upload page
// =============================================================================

const CSS: &str = "body{font-family:system-ui,sans-serif;max-width:32rem;margin:3rem auto;padding:0 1rem}\
label{display:block;margin:.5rem 0}input[type=number]{width:8rem}";

fn render_index(canvas: Canvas) -> Markup {
    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="UTF-8";
                meta name="viewport" content="width=device-width, initial-scale=1.0";
                title { "blurframe" }
                style { (CSS) }
            }
            body {
                h1 { "blurframe" }
                p {
                    "Upload an image and a crop rectangle. You get back a link to a "
                    (canvas.width) "×" (canvas.height)
                    " thumbnail; the link works once."
                }
                form method="post" action="api/thumbnail" enctype="multipart/form-data" {
                    label { "Image " input type="file" name=(IMAGE_FIELD) accept="image/*" required; }
                    @for field in RECT_FIELDS {
                        label { (field) " " input type="number" name=(field) min="0" required; }
                    }
                    button type="submit" { "Create thumbnail" }
                }
            }
        }
    }
}
