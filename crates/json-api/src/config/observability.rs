//! Observability Config

use std::time::Duration;

use clap::Args;

/// Observability settings.
#[derive(Debug, Args)]
pub struct ObservabilityConfig {
    /// Export traces over OTLP. Off unless a collector is configured.
    #[arg(long, env = "OTEL_ENABLED", default_value_t = false)]
    pub otel_enabled: bool,

    /// Enable traceparent extraction from incoming request headers.
    #[arg(long, env = "OTEL_PARENT_PROPAGATION_ENABLED", default_value_t = false)]
    pub otel_parent_propagation_enabled: bool,

    /// OTLP gRPC endpoint for trace export.
    #[arg(
        long,
        env = "OTEL_EXPORTER_OTLP_ENDPOINT",
        default_value = "http://localhost:4317"
    )]
    pub otel_exporter_otlp_endpoint: String,

    /// OTLP exporter timeout in seconds.
    #[arg(
        long,
        env = "OTEL_EXPORTER_OTLP_TIMEOUT_SECONDS",
        default_value_t = 3u64
    )]
    pub otel_exporter_otlp_timeout_seconds: u64,

    /// OpenTelemetry service name.
    #[arg(long, env = "OTEL_SERVICE_NAME", default_value = "storefront-json")]
    pub otel_service_name: String,

    /// OpenTelemetry service version.
    #[arg(
        long,
        env = "OTEL_SERVICE_VERSION",
        default_value = env!("CARGO_PKG_VERSION")
    )]
    pub otel_service_version: String,

    /// OpenTelemetry deployment environment.
    #[arg(
        long,
        env = "OTEL_DEPLOYMENT_ENVIRONMENT",
        default_value = "development"
    )]
    pub otel_deployment_environment: String,

    /// Trace sampling ratio in range [0.0, 1.0].
    #[arg(long, env = "OTEL_TRACE_SAMPLE_RATIO", default_value_t = 1.0_f64)]
    pub otel_trace_sample_ratio: f64,

    /// Threshold for slow request warnings.
    #[arg(long, env = "SLOW_REQUEST_THRESHOLD_MS", default_value_t = 1_000_u64)]
    pub slow_request_threshold_ms: u64,
}

impl ObservabilityConfig {
    /// OTLP export deadline.
    #[must_use]
    pub fn otlp_timeout(&self) -> Duration {
        Duration::from_secs(self.otel_exporter_otlp_timeout_seconds)
    }

    /// Sampling ratio as a probability. Out-of-range values are clamped and
    /// `NaN` samples everything.
    #[must_use]
    pub fn sample_ratio(&self) -> f64 {
        if self.otel_trace_sample_ratio.is_nan() {
            return 1.0;
        }

        self.otel_trace_sample_ratio.clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use clap::Parser;
    use testresult::TestResult;

    use super::*;

    #[derive(Debug, Parser)]
    struct Harness {
        #[command(flatten)]
        observability: ObservabilityConfig,
    }

    fn ratio(value: &str) -> Result<f64, clap::Error> {
        let flag = format!("--otel-trace-sample-ratio={value}");

        Harness::try_parse_from(["storefront-json", flag.as_str()])
            .map(|harness| harness.observability.sample_ratio())
    }

    #[test]
    fn sample_ratio_is_clamped_to_a_probability() -> TestResult {
        assert!((ratio("1.5")? - 1.0).abs() < f64::EPSILON, "above 1 clamps to 1");
        assert!(ratio("-0.5")?.abs() < f64::EPSILON, "below 0 clamps to 0");
        assert!((ratio("0.25")? - 0.25).abs() < f64::EPSILON, "in range is kept");
        assert!((ratio("NaN")? - 1.0).abs() < f64::EPSILON, "NaN samples everything");

        Ok(())
    }

    #[test]
    fn export_is_off_by_default() -> TestResult {
        let harness = Harness::try_parse_from(["storefront-json"])?;

        assert!(!harness.observability.otel_enabled, "no collector assumed");
        assert_eq!(harness.observability.otlp_timeout(), Duration::from_secs(3));

        Ok(())
    }
}
