//! HTTP Request Collector - Automatic Per-Route Metrics
//!
//! Axum middleware recording, for every request passing through the
//! router:
//! - `http_requests_total{handler, method, status}`
//! - `http_request_duration_seconds{handler, method}`
//! - `http_requests_inprogress{handler, method}`
//!
//! `handler` is the matched route template, so `/items/{id}` stays one
//! series no matter how many ids are requested.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;

use axum::extract::{MatchedPath, Request, State};
use axum::http::{StatusCode, header};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use prometheus::{HistogramVec, IntCounterVec, IntGauge, IntGaugeVec};
use tracing::error;

use super::registry::{CONTENT_TYPE, MetricRegistry};
use crate::error::MetricsError;

pub const REQUESTS_TOTAL: &str = "http_requests_total";
pub const REQUEST_DURATION_SECONDS: &str = "http_request_duration_seconds";
pub const REQUESTS_IN_PROGRESS: &str = "http_requests_inprogress";

/// `handler` label for requests that matched no route.
pub const UNMATCHED_HANDLER: &str = "none";

/// Collector options taken from the `[metrics]` config section.
#[derive(Debug, Clone)]
pub struct CollectorOptions {
    /// Latency buckets in seconds.
    pub buckets: Vec<f64>,
    /// Route templates that are not recorded at all.
    pub excluded_handlers: Vec<String>,
    /// Report `2xx` instead of `200`, `201`, ...
    pub group_status_codes: bool,
}

impl Default for CollectorOptions {
    fn default() -> Self {
        Self {
            buckets: crate::domain::DEFAULT_BUCKETS.to_vec(),
            excluded_handlers: Vec::new(),
            group_status_codes: true,
        }
    }
}

/// Request metrics shared by the middleware.
pub struct RequestCollector {
    requests: IntCounterVec,
    duration: HistogramVec,
    in_progress: IntGaugeVec,
    excluded: HashSet<String>,
    group_status_codes: bool,
}

impl RequestCollector {
    /// Define the request instruments in `registry`.
    ///
    /// # Errors
    /// Any definition error from the registry.
    pub fn register(
        registry: &MetricRegistry,
        options: &CollectorOptions,
    ) -> Result<Self, MetricsError> {
        let requests = registry.define_counter_vec(
            REQUESTS_TOTAL,
            "Total number of requests by method, status and handler.",
            &["handler", "method", "status"],
        )?;
        let duration = registry.define_histogram_vec(
            REQUEST_DURATION_SECONDS,
            "Latency with only few buckets by handler.",
            &["handler", "method"],
            &options.buckets,
        )?;
        let in_progress = registry.define_gauge_vec(
            REQUESTS_IN_PROGRESS,
            "Number of HTTP requests in progress.",
            &["handler", "method"],
        )?;

        Ok(Self {
            requests,
            duration,
            in_progress,
            excluded: options.excluded_handlers.iter().cloned().collect(),
            group_status_codes: options.group_status_codes,
        })
    }

    fn status_label(&self, status: StatusCode) -> String {
        if self.group_status_codes {
            format!("{}xx", status.as_u16() / 100)
        } else {
            status.as_u16().to_string()
        }
    }
}

/// Decrements the in-progress gauge even if the request future is dropped.
struct InFlight(IntGauge);

impl InFlight {
    fn enter(gauge: IntGauge) -> Self {
        gauge.inc();
        Self(gauge)
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        self.0.dec();
    }
}

/// Middleware entry point, attached with `middleware::from_fn_with_state`.
pub async fn track_requests(
    State(collector): State<Arc<RequestCollector>>,
    req: Request,
    next: Next,
) -> Response {
    let handler = req
        .extensions()
        .get::<MatchedPath>()
        .map_or_else(|| UNMATCHED_HANDLER.to_string(), |p| p.as_str().to_string());

    if collector.excluded.contains(&handler) {
        return next.run(req).await;
    }

    let method = req.method().as_str().to_string();
    let labels = [handler.as_str(), method.as_str()];

    let _in_flight = InFlight::enter(collector.in_progress.with_label_values(&labels));
    let start = Instant::now();

    let response = next.run(req).await;

    collector
        .duration
        .with_label_values(&labels)
        .observe(start.elapsed().as_secs_f64());
    let status = collector.status_label(response.status());
    collector
        .requests
        .with_label_values(&[handler.as_str(), method.as_str(), status.as_str()])
        .inc();

    response
}

/// Render the registry for a scrape.
pub fn render_metrics(registry: &MetricRegistry) -> Response {
    match registry.snapshot() {
        Ok(body) => (StatusCode::OK, [(header::CONTENT_TYPE, CONTENT_TYPE)], body).into_response(),
        Err(e) => {
            error!(error = %e, "Failed to render metrics snapshot");
            (StatusCode::INTERNAL_SERVER_ERROR, "metrics unavailable").into_response()
        }
    }
}
