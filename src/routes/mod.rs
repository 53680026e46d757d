// HTTP routes: banner, version, metrics pull and trace push

mod http;

use axum::{Router, routing::get};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use crate::config::AppConfig;
use crate::exporter::Exporter;
use crate::trace::TraceStore;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) exporter: Arc<Exporter>,
    pub(crate) traces: Option<Arc<TraceStore>>,
    pub(crate) config: AppConfig,
}

pub fn app(exporter: Arc<Exporter>, config: AppConfig) -> Router {
    let traces = exporter.traces().cloned();
    let trace_path = config.trace.path.clone();
    let metrics_path = config.server.metrics_path.clone();
    let state = AppState {
        exporter,
        traces: traces.clone(),
        config,
    };
    let mut router = Router::new()
        .route("/", get(http::root_handler)) // GET /
        .route("/version", get(http::version_handler)) // GET /version
        .route(&metrics_path, get(http::metrics_handler)); // GET /metrics
    if traces.is_some() {
        // POST/GET /trace
        router = router.route(
            &trace_path,
            get(http::list_traces_handler).post(http::upload_trace_handler),
        );
    }
    router
        .layer(CorsLayer::new().allow_origin(Any))
        .with_state(state)
}
