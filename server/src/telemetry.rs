//! Logging and trace export setup.

use opentelemetry::trace::TracerProvider;
use opentelemetry_appender_tracing::layer::OpenTelemetryTracingBridge;
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::logs::SdkLoggerProvider;
use opentelemetry_sdk::trace::SdkTracerProvider;
use std::env;
use std::net::{TcpStream, ToSocketAddrs};
use std::time::Duration;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

const SERVICE_NAME: &str = "procook-server";

/// Strip the scheme so the endpoint can be resolved as `host:port`.
fn host_port(endpoint: &str) -> &str {
    endpoint
        .trim_start_matches("http://")
        .trim_start_matches("https://")
        .trim_end_matches('/')
}

/// Quick TCP check to see if the collector is up
fn is_reachable(endpoint: &str) -> bool {
    host_port(endpoint)
        .to_socket_addrs()
        .ok()
        .and_then(|mut addrs| addrs.next())
        .map(|addr| TcpStream::connect_timeout(&addr, Duration::from_millis(100)).is_ok())
        .unwrap_or(false)
}

/// Initialize logging with optional OpenTelemetry export.
///
/// If OTEL_EXPORTER_OTLP_ENDPOINT is set and reachable, traces and logs are
/// also sent to the collector. Otherwise only console logging is used.
pub fn init_telemetry() {
    let fmt_layer = tracing_subscriber::fmt::layer();
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let endpoint = match env::var("OTEL_EXPORTER_OTLP_ENDPOINT") {
        Ok(endpoint) => endpoint,
        Err(_) => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt_layer)
                .init();
            tracing::debug!("OTEL_EXPORTER_OTLP_ENDPOINT not set, using console logging only");
            return;
        }
    };

    if !is_reachable(&endpoint) {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer)
            .init();
        tracing::info!(
            "OpenTelemetry endpoint {} not reachable, using console logging only",
            endpoint
        );
        return;
    }

    let service_name = env::var("OTEL_SERVICE_NAME").unwrap_or_else(|_| SERVICE_NAME.to_string());
    let resource = opentelemetry_sdk::Resource::builder()
        .with_service_name(service_name.clone())
        .build();

    let exporters = opentelemetry_otlp::SpanExporter::builder()
        .with_tonic()
        .with_endpoint(&endpoint)
        .build()
        .and_then(|spans| {
            let logs = opentelemetry_otlp::LogExporter::builder()
                .with_tonic()
                .with_endpoint(&endpoint)
                .build()?;
            Ok((spans, logs))
        });

    let (trace_exporter, log_exporter) = match exporters {
        Ok(e) => e,
        Err(e) => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt_layer)
                .init();
            tracing::warn!("Failed to create OTLP exporters, using console logging only: {}", e);
            return;
        }
    };

    let trace_provider = SdkTracerProvider::builder()
        .with_batch_exporter(trace_exporter)
        .with_resource(resource.clone())
        .build();
    let tracer = trace_provider.tracer(SERVICE_NAME);
    opentelemetry::global::set_tracer_provider(trace_provider);
    let otel_trace_layer = tracing_opentelemetry::layer().with_tracer(tracer);

    let log_provider = SdkLoggerProvider::builder()
        .with_batch_exporter(log_exporter)
        .with_resource(resource)
        .build();
    let otel_log_layer = OpenTelemetryTracingBridge::new(&log_provider);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .with(otel_trace_layer)
        .with(otel_log_layer)
        .init();

    tracing::info!(
        "OpenTelemetry enabled, exporting traces and logs to {} as {}",
        endpoint,
        service_name
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_host_port() {
        assert_eq!(host_port("http://collector:4317"), "collector:4317");
        assert_eq!(host_port("https://collector:4317/"), "collector:4317");
        assert_eq!(host_port("collector:4317"), "collector:4317");
    }

    #[test]
    fn test_unresolvable_endpoint_is_unreachable() {
        assert!(!is_reachable("http://"));
    }
}
