use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts, Registry, TextEncoder,
};
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::info;

use crate::errors::MetricsError;

// Declare the static OnceCell to hold the Metrics.
static METRICS_INSTANCE: OnceCell<Arc<Metrics>> = OnceCell::const_new();

/// Asynchronously initializes and gets a reference to the static `Metrics`.
pub async fn get_metrics() -> &'static Arc<Metrics> {
    METRICS_INSTANCE
        .get_or_init(|| async {
            info!("Initializing Metrics ...");
            Metrics::new()
        })
        .await
}

pub const OUTCOME_SUCCESS: &str = "success";

#[derive(Clone)]
pub struct Metrics {
    pub registry: Registry,

    // Token metrics
    pub token_acquisitions: IntCounterVec,
    pub token_cache_hits: IntCounter,
    pub token_validation_failures: IntCounterVec,

    // Delivery metrics
    pub deliveries: IntCounterVec,
    pub delivery_duration: HistogramVec,
}

impl Metrics {
    fn new() -> Arc<Self> {
        let registry = Registry::new_custom(Some("rhose_handler".into()), None).unwrap();

        let metrics: Arc<Metrics> = Arc::new(Self {
            // Token
            token_acquisitions: IntCounterVec::new(Opts::new("token_acquisitions_total", "Client-credentials exchanges by outcome"),&["outcome"],).unwrap(),
            token_cache_hits: IntCounter::new("token_cache_hits_total", "Resolutions served from the token cache").unwrap(),
            token_validation_failures: IntCounterVec::new(Opts::new("token_validation_failures_total", "Cached tokens rejected by reason"),&["reason"],).unwrap(),

            // Delivery
            deliveries: IntCounterVec::new(Opts::new("deliveries_total", "Event deliveries by outcome"),&["outcome"],).unwrap(),
            delivery_duration: HistogramVec::new(HistogramOpts::new("delivery_duration_seconds", "Event delivery duration seconds").buckets(vec![0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0]),&["outcome"],).unwrap(),

            registry,
        });

        // Register all metrics in the registry
        let reg = &metrics.registry;
        reg.register(Box::new(metrics.token_acquisitions.clone())).unwrap();
        reg.register(Box::new(metrics.token_cache_hits.clone())).unwrap();
        reg.register(Box::new(metrics.token_validation_failures.clone())).unwrap();
        reg.register(Box::new(metrics.deliveries.clone())).unwrap();
        reg.register(Box::new(metrics.delivery_duration.clone())).unwrap();

        metrics
    }

    /// Render the registry in the text exposition format.
    pub fn render(&self) -> String {
        let mut buffer = Vec::new();
        let encoder = TextEncoder::new();
        if let Err(err) = encoder.encode(&self.registry.gather(), &mut buffer) {
            tracing::warn!("metrics encoding failed: {}", err);
        }
        String::from_utf8_lossy(&buffer).into_owned()
    }
}

/// Write the registry to `path` for the node-exporter textfile collector.
///
/// The file is written next to its destination and renamed into place so the
/// collector never reads a partial file.
pub async fn write_textfile(path: &str) -> Result<(), MetricsError> {
    let rendered = get_metrics().await.render();
    let tmp = format!("{}.tmp", path);
    let io_err = |source| MetricsError::Write {
        path: path.to_owned(),
        source,
    };
    tokio::fs::write(&tmp, rendered).await.map_err(io_err)?;
    tokio::fs::rename(&tmp, path).await.map_err(io_err)?;
    info!("metrics written to {}", path);
    Ok(())
}
