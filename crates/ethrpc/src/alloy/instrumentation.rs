//! Alloy transport layer that logs every RPC call going to the node and
//! collects prometheus metrics about them, labeled by the component that
//! issued the call and the RPC method.
use {
    alloy::{
        rpc::json_rpc::{RequestPacket, ResponsePacket},
        transports::TransportError,
    },
    std::{
        fmt::Debug,
        pin::Pin,
        task::{Context, Poll},
    },
    tower::{Layer, Service},
};

pub(crate) struct InstrumentationLayer {
    label: String,
}

impl InstrumentationLayer {
    pub(crate) fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
        }
    }
}

impl<S> Layer<S> for InstrumentationLayer {
    type Service = InstrumentedProvider<S>;

    fn layer(&self, inner: S) -> Self::Service {
        InstrumentedProvider {
            inner,
            label: self.label.clone(),
            metrics: Metrics::instance(observe::metrics::get_storage_registry()).unwrap(),
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) struct InstrumentedProvider<S> {
    inner: S,
    label: String,
    metrics: &'static Metrics,
}

impl<S> Service<RequestPacket> for InstrumentedProvider<S>
where
    S: Service<RequestPacket, Response = ResponsePacket, Error = TransportError>,
    S::Future: Send + 'static,
    S::Response: Send + 'static + Debug,
    S::Error: Send + 'static + Debug,
{
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;
    type Response = S::Response;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: RequestPacket) -> Self::Future {
        let timers: Vec<_> = req
            .requests_mut()
            .iter_mut()
            .map(|r| {
                tracing::trace!(component = %self.label, ?r, "executing request");
                self.metrics.on_request_start(&self.label, r.method())
            })
            .collect();

        if timers.len() > 1 {
            tracing::trace!(len = timers.len(), "executing batch request");
        }

        let fut = self.inner.call(req);
        Box::pin(async move {
            let res = fut.await;
            if let Err(err) = &res {
                tracing::debug!(?err, "RPC request failed");
            }
            drop(timers);
            res
        })
    }
}

#[derive(prometheus_metric_storage::MetricStorage, Clone, Debug)]
#[metric(subsystem = "alloy_rpc")]
struct Metrics {
    /// Number of inflight RPC requests for ethereum node.
    #[metric(labels("component", "method"))]
    requests_inflight: prometheus::IntGaugeVec,

    /// Number of completed RPC requests for ethereum node.
    #[metric(labels("component", "method"))]
    requests_complete: prometheus::IntCounterVec,

    /// Execution time for each RPC request (batches are counted as one
    /// request).
    #[metric(labels("component", "method"))]
    requests_duration_seconds: prometheus::HistogramVec,
}

impl Metrics {
    #[must_use]
    fn on_request_start(&self, label: &str, method: &str) -> impl Drop + use<> {
        let requests_inflight = self.requests_inflight.with_label_values(&[label, method]);
        let requests_complete = self.requests_complete.with_label_values(&[label, method]);
        let requests_duration_seconds = self
            .requests_duration_seconds
            .with_label_values(&[label, method]);

        requests_inflight.inc();
        let timer = requests_duration_seconds.start_timer();

        scopeguard::guard(timer, move |timer| {
            requests_inflight.dec();
            requests_complete.inc();
            timer.stop_and_record();
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tracks_inflight_requests() {
        let metrics = Metrics::instance(observe::metrics::get_storage_registry()).unwrap();
        let inflight = || {
            metrics
                .requests_inflight
                .with_label_values(&["test", "eth_gasPrice"])
                .get()
        };

        let guard = metrics.on_request_start("test", "eth_gasPrice");
        assert_eq!(inflight(), 1);
        drop(guard);
        assert_eq!(inflight(), 0);
        assert_eq!(
            metrics
                .requests_complete
                .with_label_values(&["test", "eth_gasPrice"])
                .get(),
            1
        );
    }
}
