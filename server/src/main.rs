mod accounts;
mod api;
mod auth;
mod config;
mod db;
mod media;
mod models;
mod schema;
mod store;

#[cfg(test)]
mod test_support;

use anyhow::Context;
use axum::extract::MatchedPath;
use axum::http::Request;
use opentelemetry::trace::TracerProvider;
use opentelemetry_appender_tracing::layer::OpenTelemetryTracingBridge;
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::logs::SdkLoggerProvider;
use opentelemetry_sdk::trace::SdkTracerProvider;
use std::env;
use std::net::{TcpStream, ToSocketAddrs};
use std::sync::Arc;
use std::time::Duration;
use tower_http::trace::TraceLayer;
use tracing::Span;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::config::Config;
use crate::media::MediaStorage;
use crate::store::{PgStore, Store};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub media: Arc<MediaStorage>,
}

const SERVICE_NAME: &str = "larder-server";

/// Whether an OTLP collector accepts TCP connections at `endpoint`.
fn collector_reachable(endpoint: &str) -> bool {
    let host_port = endpoint
        .trim_start_matches("http://")
        .trim_start_matches("https://");

    host_port
        .to_socket_addrs()
        .ok()
        .and_then(|mut addrs| addrs.next())
        .is_some_and(|addr| TcpStream::connect_timeout(&addr, Duration::from_millis(100)).is_ok())
}

fn otlp_providers(endpoint: &str) -> anyhow::Result<(SdkTracerProvider, SdkLoggerProvider)> {
    let service_name = env::var("OTEL_SERVICE_NAME").unwrap_or_else(|_| SERVICE_NAME.to_string());
    let resource = opentelemetry_sdk::Resource::builder()
        .with_service_name(service_name)
        .build();

    let span_exporter = opentelemetry_otlp::SpanExporter::builder()
        .with_tonic()
        .with_endpoint(endpoint)
        .build()
        .context("Failed to create OTLP trace exporter")?;
    let log_exporter = opentelemetry_otlp::LogExporter::builder()
        .with_tonic()
        .with_endpoint(endpoint)
        .build()
        .context("Failed to create OTLP log exporter")?;

    let traces = SdkTracerProvider::builder()
        .with_batch_exporter(span_exporter)
        .with_resource(resource.clone())
        .build();
    let logs = SdkLoggerProvider::builder()
        .with_batch_exporter(log_exporter)
        .with_resource(resource)
        .build();

    Ok((traces, logs))
}

/// Console logging filtered by `RUST_LOG` (default `info`), plus OTLP traces
/// and logs when `OTEL_EXPORTER_OTLP_ENDPOINT` points at a reachable collector.
fn init_telemetry() -> anyhow::Result<()> {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let endpoint = env::var("OTEL_EXPORTER_OTLP_ENDPOINT").ok();
    let collector = endpoint.as_deref().filter(|e| collector_reachable(e));
    let otlp = collector.map(otlp_providers).transpose()?;

    let otel_trace_layer = otlp.as_ref().map(|(traces, _)| {
        opentelemetry::global::set_tracer_provider(traces.clone());
        tracing_opentelemetry::layer().with_tracer(traces.tracer(SERVICE_NAME))
    });
    let otel_log_layer = otlp
        .as_ref()
        .map(|(_, logs)| OpenTelemetryTracingBridge::new(logs));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .with(otel_trace_layer)
        .with(otel_log_layer)
        .init();

    match (endpoint.as_deref(), collector) {
        (_, Some(endpoint)) => tracing::info!("Exporting traces and logs to {}", endpoint),
        (Some(endpoint), None) => {
            tracing::info!("OpenTelemetry endpoint {} not reachable", endpoint)
        }
        (None, None) => tracing::debug!("OTEL_EXPORTER_OTLP_ENDPOINT not set"),
    }
    Ok(())
}

fn with_tracing(app: axum::Router) -> axum::Router {
    app.layer(
        TraceLayer::new_for_http()
            .make_span_with(|request: &Request<_>| {
                let matched_path = request
                    .extensions()
                    .get::<MatchedPath>()
                    .map(MatchedPath::as_str)
                    .unwrap_or(request.uri().path());

                // Don't create a span at all for noisy endpoints
                if matched_path == "/api/health" {
                    tracing::trace_span!("http_request")
                } else {
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        path = %matched_path,
                    )
                }
            })
            .on_request(|_request: &Request<_>, _span: &Span| {})
            .on_response(
                |response: &axum::http::Response<_>, latency: Duration, span: &Span| {
                    // Skip logging for noisy endpoints (trace-level spans)
                    if span.metadata().map(|m| m.level()) == Some(&tracing::Level::TRACE) {
                        return;
                    }
                    let status = response.status().as_u16();
                    if status >= 500 {
                        tracing::error!(
                            status = %status,
                            latency_ms = %latency.as_millis(),
                            "request failed with server error"
                        );
                    } else {
                        tracing::info!(
                            status = %status,
                            latency_ms = %latency.as_millis(),
                            "request completed"
                        );
                    }
                },
            )
            .on_failure(
                |error: tower_http::classify::ServerErrorsFailureClass,
                 latency: Duration,
                 _span: &Span| {
                    tracing::error!(
                        error = %error,
                        latency_ms = %latency.as_millis(),
                        "request failed"
                    );
                },
            ),
    )
}

/// `larder-server create-superuser <email>`, password from `SUPERUSER_PASSWORD`.
fn create_superuser(store: &dyn Store, email: Option<&str>) -> anyhow::Result<()> {
    let email = email.context("Usage: larder-server create-superuser <email>")?;
    let password =
        env::var("SUPERUSER_PASSWORD").context("SUPERUSER_PASSWORD must be set")?;

    let user = accounts::create_superuser(store, email, &password)
        .map_err(|e| anyhow::anyhow!("Failed to create superuser: {e}"))?;

    tracing::info!("Created superuser {}", user.email);
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args: Vec<String> = env::args().collect();

    // Check for --openapi flag to dump spec and exit
    if args.iter().any(|arg| arg == "--openapi") {
        let spec = api::openapi()
            .to_pretty_json()
            .context("Failed to serialize OpenAPI spec")?;
        println!("{}", spec);
        return Ok(());
    }

    init_telemetry()?;

    let config = Config::load()?;
    let pool = db::create_pool(&config.database_url)?;
    let store: Arc<dyn Store> = Arc::new(PgStore::new(pool));

    if args.get(1).map(String::as_str) == Some("create-superuser") {
        return create_superuser(store.as_ref(), args.get(2).map(String::as_str));
    }

    let state = AppState {
        store,
        media: Arc::new(MediaStorage::new(config.media_root.clone(), &config.media_url)),
    };

    let app = with_tracing(api::router(state));

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.bind_addr))?;
    let addr = listener.local_addr()?;

    tracing::info!("Server listening on {}", addr);
    tracing::info!("Swagger UI available at http://{}/swagger-ui/", addr);
    tracing::info!("OpenAPI spec available at http://{}/api-docs/openapi.json", addr);
    tracing::info!("Serving media from {} at {}", config.media_root.display(), config.media_url);

    axum::serve(listener, app).await?;
    Ok(())
}
