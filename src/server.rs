use std::sync::Arc;

use anyhow::Result;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::{
    classifier::Classifier,
    config::{DEFAULT_CAP, MAX_CAP},
    directory::MemberDirectory,
    error::{RunError, ScanError},
    scanner,
};

/// Collaborators shared by all requests. Each request runs its own scan with its own counters.
#[derive(Clone)]
pub struct AppState {
    directory: Arc<dyn MemberDirectory>,
    classifier: Arc<Classifier>,
    default_cap: usize,
}

impl AppState {
    pub fn new(directory: Arc<dyn MemberDirectory>, classifier: Classifier) -> Self {
        Self {
            directory,
            classifier: Arc::new(classifier),
            default_cap: DEFAULT_CAP,
        }
    }

    pub fn with_default_cap(mut self, cap: usize) -> Self {
        self.default_cap = cap;
        self
    }
}

#[derive(Debug, Deserialize)]
pub struct ScanRequest {
    pub input: String,
    #[serde(default)]
    pub cap: Option<usize>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    pub kind: String,
}

pub fn router(state: AppState) -> Router {
    let api = Router::new()
        .route("/health", get(get_health))
        .route("/scan", post(post_scan))
        .with_state(state);

    Router::new()
        .nest("/api", api)
        .layer(TraceLayer::new_for_http())
}

pub async fn spawn_server(bind: &str, state: AppState) -> Result<()> {
    let app = router(state);
    info!("serving API on http://{}", bind);
    axum::serve(tokio::net::TcpListener::bind(bind).await?, app).await?;
    Ok(())
}

async fn get_health() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}

async fn post_scan(State(app): State<AppState>, Json(req): Json<ScanRequest>) -> Response {
    let cap = req.cap.unwrap_or(app.default_cap);
    if cap == 0 || cap > MAX_CAP {
        return error_response(
            StatusCode::BAD_REQUEST,
            "invalid_cap",
            format!("cap must be within 1..={MAX_CAP}"),
        );
    }

    match scanner::run_scan(app.directory.as_ref(), &app.classifier, &req.input, cap).await {
        Ok(report) => (StatusCode::OK, Json(report)).into_response(),
        Err(e) => {
            warn!(input = %req.input, "scan failed: {e}");
            let (status, kind) = status_for(&e);
            error_response(status, kind, e.to_string())
        }
    }
}

fn status_for(err: &RunError) -> (StatusCode, &'static str) {
    match err {
        RunError::Resolution(_) => (StatusCode::BAD_REQUEST, "resolution"),
        RunError::Scan(ScanError::NotFound(_)) => (StatusCode::NOT_FOUND, "not_found"),
        RunError::Scan(ScanError::AccessDenied(_)) => (StatusCode::FORBIDDEN, "access_denied"),
        RunError::Scan(ScanError::EmptyRoster) => {
            (StatusCode::UNPROCESSABLE_ENTITY, "empty_roster")
        }
        RunError::Scan(ScanError::Platform(_)) => (StatusCode::BAD_GATEWAY, "platform"),
    }
}

fn error_response(status: StatusCode, kind: &str, error: String) -> Response {
    let body = ErrorBody {
        error,
        kind: kind.to_string(),
    };
    (status, Json(body)).into_response()
}
