//! Prometheus metrics for the API server and analyses

use std::time::Duration;

use prometheus::{
    Encoder, Gauge, Histogram, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, IntGauge, Opts,
    Registry, TextEncoder,
};

pub struct Metrics {
    registry: Registry,
    pub http_requests_total: IntCounter,
    pub http_request_duration_seconds: Histogram,
    pub http_requests_in_flight: IntGauge,
    /// Labels: `analysis` (demand, seasonality, lifecycle), `outcome`
    pub analysis_requests_total: IntCounterVec,
    pub analysis_duration_seconds: HistogramVec,
    pub database_connected: Gauge,
}

impl Metrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let http_requests_total =
            IntCounter::new("http_requests_total", "Total number of HTTP requests")?;
        let http_request_duration_seconds = Histogram::with_opts(HistogramOpts::new(
            "http_request_duration_seconds",
            "HTTP request latency in seconds",
        ))?;
        let http_requests_in_flight =
            IntGauge::new("http_requests_in_flight", "HTTP requests currently being served")?;
        let analysis_requests_total = IntCounterVec::new(
            Opts::new("analysis_requests_total", "Product analyses by outcome"),
            &["analysis", "outcome"],
        )?;
        let analysis_duration_seconds = HistogramVec::new(
            HistogramOpts::new(
                "analysis_duration_seconds",
                "Time spent computing a product analysis",
            )
            .buckets(vec![0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 5.0]),
            &["analysis"],
        )?;
        let database_connected =
            Gauge::new("database_connected", "1 when the product database is reachable")?;

        registry.register(Box::new(http_requests_total.clone()))?;
        registry.register(Box::new(http_request_duration_seconds.clone()))?;
        registry.register(Box::new(http_requests_in_flight.clone()))?;
        registry.register(Box::new(analysis_requests_total.clone()))?;
        registry.register(Box::new(analysis_duration_seconds.clone()))?;
        registry.register(Box::new(database_connected.clone()))?;

        Ok(Self {
            registry,
            http_requests_total,
            http_request_duration_seconds,
            http_requests_in_flight,
            analysis_requests_total,
            analysis_duration_seconds,
            database_connected,
        })
    }

    /// Record one finished analysis
    pub fn observe_analysis(&self, analysis: &str, outcome: &str, elapsed: Duration) {
        self.analysis_requests_total
            .with_label_values(&[analysis, outcome])
            .inc();
        self.analysis_duration_seconds
            .with_label_values(&[analysis])
            .observe(elapsed.as_secs_f64());
    }

    /// Render every registered metric in the Prometheus text format
    pub fn export(&self) -> Result<String, prometheus::Error> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}
