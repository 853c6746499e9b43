//! Vista Web
//!
//! HTTP surface for the Vista test report viewer: attachment downloads and
//! previews, page metadata, the rendered report view, icon assets and the HTML
//! shell that hosts them.

pub mod assets;
mod error;
pub mod inspect;
pub mod routes;
pub mod shell;

pub use error::ServeError;

use axum::{Router, routing::get};
use serde::Deserialize;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use vista_core::{AttachmentStore, FsAttachmentStore, ReportView, ReportViewController, StepFilter};
use vista_proto::{ReportBundle, TestCase};

/// Default port for `vista serve`.
pub const DEFAULT_PORT: u16 = 9323;

/// Default upper bound on bytes read for an attachment preview.
pub const DEFAULT_PREVIEW_BYTES: usize = 64 * 1024;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// The report as handed over by the orchestrator
    pub bundle: Arc<ReportBundle>,
    /// The bound test, shared read-only with every view controller
    pub test: Option<Arc<TestCase>>,
    /// Source of attachment bytes
    pub store: Arc<dyn AttachmentStore>,
    pub preview_max_bytes: usize,
}

impl AppState {
    pub fn new(bundle: ReportBundle, store: Arc<dyn AttachmentStore>) -> Self {
        let test = bundle.test.clone().map(Arc::new);
        Self {
            bundle: Arc::new(bundle),
            test,
            store,
            preview_max_bytes: DEFAULT_PREVIEW_BYTES,
        }
    }

    /// Loads the report named by `config`, or an empty summary when none is set.
    ///
    /// Relative attachment paths resolve against the report's directory.
    pub fn load(config: &Config) -> Result<Self, ServeError> {
        let (bundle, store) = match &config.report_path {
            Some(path) => {
                let bundle = ReportBundle::load(path).map_err(|source| ServeError::Report {
                    path: path.clone(),
                    source,
                })?;
                let base_dir = path
                    .parent()
                    .map(PathBuf::from)
                    .unwrap_or_default();
                tracing::info!(
                    "Loaded report {:?} ({})",
                    path,
                    bundle.test.as_ref().map_or("summary", |t| t.title.as_str())
                );
                (bundle, FsAttachmentStore::with_base_dir(base_dir))
            }
            None => (ReportBundle::default(), FsAttachmentStore::new()),
        };

        let mut state = Self::new(bundle, Arc::new(store));
        state.preview_max_bytes = config.preview_max_bytes;
        Ok(state)
    }
}

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Port to listen on
    pub port: u16,
    /// Path to static files served for unknown routes
    pub static_dir: Option<PathBuf>,
    /// Report bundle JSON to serve
    pub report_path: Option<PathBuf>,
    /// Upper bound on bytes read for an attachment preview
    pub preview_max_bytes: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            static_dir: None,
            report_path: None,
            preview_max_bytes: DEFAULT_PREVIEW_BYTES,
        }
    }
}

/// How the report view should be set up before rendering.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewOptions {
    /// Result index to select; defaults to the bundle's `run`
    pub run: Option<usize>,
    /// Anchor to apply; defaults to the bundle's `anchor`
    pub anchor: Option<String>,
    #[serde(default)]
    pub errors_only: bool,
    #[serde(default)]
    pub expand_all: bool,
}

/// Builds a controller for `options`, loads the attachments it shows and
/// renders it.
pub async fn render_view(
    state: &AppState,
    options: &ViewOptions,
) -> Result<ReportView, ServeError> {
    let mut controller = ReportViewController::new();
    controller.set_project_names(state.bundle.project_names.clone());
    controller.bind(state.test.clone()).map_err(ServeError::Bind)?;
    controller.select_result(options.run.unwrap_or(state.bundle.run));

    let anchor = options.anchor.as_deref().unwrap_or(&state.bundle.anchor);
    let fetches: Vec<_> = controller.apply_anchor(anchor).into_iter().collect();
    if options.expand_all {
        controller.expand_all();
    }
    controller
        .load(fetches, state.store.as_ref(), state.preview_max_bytes)
        .await;

    let filter = if options.errors_only {
        StepFilter::ErrorsOnly
    } else {
        StepFilter::All
    };
    Ok(controller.render(filter))
}

/// Create the application router with provided state
pub fn create_app_with_state(config: &Config, state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let mut app = Router::new()
        .merge(routes::api_routes(state.clone()))
        .route("/assets/{file}", get(assets::icon))
        .route("/", get(shell::index).with_state(state))
        .layer(cors);

    // Add static file serving if configured
    if let Some(ref static_dir) = config.static_dir
        && static_dir.exists()
    {
        app = app.fallback_service(tower_http::services::ServeDir::new(static_dir));
    }

    app
}

/// Create the application router, loading the report named by `config`.
pub fn create_app(config: &Config) -> Result<Router, ServeError> {
    let state = AppState::load(config)?;
    Ok(create_app_with_state(config, state))
}

/// Start the server.
pub async fn serve(config: Config) -> Result<(), ServeError> {
    let app = create_app(&config)?;
    let addr = SocketAddr::from(([127, 0, 0, 1], config.port));

    tracing::info!("Starting vista server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
