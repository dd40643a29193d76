//! # Gateway Metrics
//!
//! Counters for what the gateway did and how it went. Registered in a
//! dedicated [`prometheus::Registry`] with the `cess_query` namespace so an
//! embedding application can expose or merge them as it sees fit.

use prometheus::{Encoder, Histogram, HistogramOpts, IntCounter, IntGauge, Registry, TextEncoder};

/// Prometheus handles for one gateway.
#[derive(Clone)]
pub struct GatewayMetrics {
    registry: Registry,
    /// Storage round trips attempted against the transport.
    pub round_trips_total: IntCounter,
    /// Single-key queries answered with "no such key".
    pub absent_total: IntCounter,
    /// Round trips that ended in a transport error.
    pub transport_failures_total: IntCounter,
    /// Queries refused because the connection was down.
    pub connection_down_total: IntCounter,
    /// Prefix batch members dropped for being absent or undecodable.
    pub skipped_entries_total: IntCounter,
    /// Liveness probes issued.
    pub health_checks_total: IntCounter,
    /// 1 while the last observed state is up, 0 otherwise.
    pub connection_up: IntGauge,
    pub round_trip_seconds: Histogram,
}

impl GatewayMetrics {
    /// Creates and registers all metrics.
    pub fn new() -> Self {
        let registry = Registry::new_custom(Some("cess_query".into()), None)
            .expect("failed to create prometheus registry");

        let round_trips_total = IntCounter::new(
            "gateway_round_trips_total",
            "Storage round trips issued to the chain transport",
        )
        .expect("metric creation");
        registry
            .register(Box::new(round_trips_total.clone()))
            .expect("metric registration");

        let absent_total = IntCounter::new(
            "gateway_absent_total",
            "Single-key queries for keys holding no value",
        )
        .expect("metric creation");
        registry
            .register(Box::new(absent_total.clone()))
            .expect("metric registration");

        let transport_failures_total = IntCounter::new(
            "gateway_transport_failures_total",
            "Round trips that failed in the transport",
        )
        .expect("metric creation");
        registry
            .register(Box::new(transport_failures_total.clone()))
            .expect("metric registration");

        let connection_down_total = IntCounter::new(
            "gateway_connection_down_total",
            "Queries refused without a round trip because the node was down",
        )
        .expect("metric creation");
        registry
            .register(Box::new(connection_down_total.clone()))
            .expect("metric registration");

        let skipped_entries_total = IntCounter::new(
            "gateway_skipped_entries_total",
            "Prefix enumeration entries skipped as absent or undecodable",
        )
        .expect("metric creation");
        registry
            .register(Box::new(skipped_entries_total.clone()))
            .expect("metric registration");

        let health_checks_total =
            IntCounter::new("gateway_health_checks_total", "Liveness probes issued")
                .expect("metric creation");
        registry
            .register(Box::new(health_checks_total.clone()))
            .expect("metric registration");

        let connection_up = IntGauge::new(
            "gateway_connection_up",
            "Whether the node answered the last probe or round trip",
        )
        .expect("metric creation");
        registry
            .register(Box::new(connection_up.clone()))
            .expect("metric registration");

        let round_trip_seconds = Histogram::with_opts(
            HistogramOpts::new(
                "gateway_round_trip_seconds",
                "Latency of storage round trips in seconds",
            )
            .buckets(vec![0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 6.0]),
        )
        .expect("metric creation");
        registry
            .register(Box::new(round_trip_seconds.clone()))
            .expect("metric registration");

        Self {
            registry,
            round_trips_total,
            absent_total,
            transport_failures_total,
            connection_down_total,
            skipped_entries_total,
            health_checks_total,
            connection_up,
            round_trip_seconds,
        }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Encodes all registered metrics into the Prometheus text exposition format.
    pub fn encode(&self) -> Result<String, prometheus::Error> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}

impl Default for GatewayMetrics {
    fn default() -> Self {
        Self::new()
    }
}
