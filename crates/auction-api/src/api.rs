use {
    crate::submission::Submitter,
    axum::{
        Router,
        extract::{DefaultBodyLimit, MatchedPath, Request, State},
        http::StatusCode,
        middleware::{self, Next},
        response::{Json, Response},
    },
    observe::distributed_tracing::tracing_axum,
    serde::Serialize,
    std::{borrow::Cow, sync::Arc, time::Instant},
    tower_http::{cors::CorsLayer, trace::TraceLayer},
};

mod create_auction;
mod liveness;

const MAX_JSON_BODY_PAYLOAD: usize = 1024 * 16;

/// Middleware that tracks request metrics labeled by the matched route.
async fn with_matched_path_metric(
    State(metrics): State<&'static ApiMetrics>,
    req: Request,
    next: Next,
) -> Response {
    let method = req.method().to_string();
    let matched_path = req
        .extensions()
        .get::<MatchedPath>()
        .map(|path| path.as_str().to_owned())
        .unwrap_or_else(|| "unknown".to_owned());
    let label = format!("{method} {matched_path}");

    let timer = Instant::now();
    let response = next.run(req).await;
    let status = response.status();

    metrics.on_request_completed(&label, status, timer);
    if status.is_client_error() || status.is_server_error() {
        metrics
            .requests_rejected
            .with_label_values(&[status.as_str()])
            .inc();
    }

    response
}

pub fn handle_all_routes(submitter: Arc<Submitter>) -> Router {
    let metrics = ApiMetrics::instance(observe::metrics::get_storage_registry()).unwrap();
    metrics.reset_requests_rejected();

    let api_router = Router::new()
        .route("/", axum::routing::get(liveness::liveness_handler))
        .route(
            "/create-auction",
            axum::routing::post(create_auction::create_auction_handler),
        )
        .with_state(submitter)
        .layer(middleware::from_fn_with_state(
            metrics,
            with_matched_path_metric,
        ));

    finalize_router(api_router)
}

#[derive(prometheus_metric_storage::MetricStorage, Clone, Debug)]
#[metric(subsystem = "api")]
struct ApiMetrics {
    /// Number of completed API requests.
    #[metric(labels("method", "status_code"))]
    requests_complete: prometheus::IntCounterVec,

    /// Number of rejected API requests.
    #[metric(labels("status_code"))]
    requests_rejected: prometheus::IntCounterVec,

    /// Execution time for each API request. Auction creations wait for the
    /// transaction to be mined so they take much longer than usual requests.
    #[metric(labels("method"), buckets(0.1, 0.5, 1, 2, 5, 10, 20, 30, 60, 120))]
    requests_duration_seconds: prometheus::HistogramVec,
}

impl ApiMetrics {
    const INITIAL_STATUSES: &'static [StatusCode] = &[
        StatusCode::OK,
        StatusCode::BAD_REQUEST,
        StatusCode::NOT_FOUND,
        StatusCode::PAYLOAD_TOO_LARGE,
        StatusCode::INTERNAL_SERVER_ERROR,
    ];

    fn reset_requests_rejected(&self) {
        for status in Self::INITIAL_STATUSES {
            self.requests_rejected
                .with_label_values(&[status.as_str()])
                .reset();
        }
    }

    fn on_request_completed(&self, method: &str, status: StatusCode, timer: Instant) {
        self.requests_complete
            .with_label_values(&[method, status.as_str()])
            .inc();
        self.requests_duration_seconds
            .with_label_values(&[method])
            .observe(timer.elapsed().as_secs_f64());
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Error {
    pub error_type: Cow<'static, str>,
    pub error: Cow<'static, str>,
    /// Underlying diagnostic for failures the caller cannot fix.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

pub fn error(error_type: &'static str, message: impl Into<Cow<'static, str>>) -> Json<Error> {
    Json(Error {
        error_type: error_type.into(),
        error: message.into(),
        details: None,
    })
}

pub fn error_with_details(
    error_type: &'static str,
    message: impl Into<Cow<'static, str>>,
    details: impl ToString,
) -> Json<Error> {
    Json(Error {
        error_type: error_type.into(),
        error: message.into(),
        details: Some(details.to_string()),
    })
}

/// Sets up basic metrics, cors and proper log tracing for all routes.
fn finalize_router(api_router: Router) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods(vec![
            axum::http::Method::GET,
            axum::http::Method::POST,
            axum::http::Method::OPTIONS,
        ])
        .allow_headers(vec![
            axum::http::header::ORIGIN,
            axum::http::header::CONTENT_TYPE,
            // Must be lower case due to the HTTP-2 spec
            axum::http::HeaderName::from_static("x-request-id"),
        ]);

    let trace_layer = TraceLayer::new_for_http().make_span_with(tracing_axum::make_span);

    api_router
        .layer(DefaultBodyLimit::max(MAX_JSON_BODY_PAYLOAD))
        .layer(cors)
        .layer(trace_layer)
}

#[cfg(test)]
pub async fn response_body(response: Response) -> Vec<u8> {
    axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
        .to_vec()
}
