//! Subscriber setup for the `tracing` events emitted by this crate.

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

use crate::config::{LogFormat, TagSelectConfig};
use crate::error::TagSelectError;

/// Build the level filter: `RUST_LOG` wins, then `config.log_filter`.
pub fn env_filter(config: &TagSelectConfig) -> Result<EnvFilter, TagSelectError> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => EnvFilter::try_new(&config.log_filter)
            .map_err(|e| TagSelectError::Config(format!("invalid log_filter: {e}"))),
    }
}

/// Install the global subscriber. Fails if one is already installed.
///
/// With the `otlp` feature and an `otlp_endpoint` configured, spans are also
/// exported over OTLP; this must then be called inside a tokio runtime.
pub fn init_logging(config: &TagSelectConfig) -> Result<(), TagSelectError> {
    let registry = tracing_subscriber::registry()
        .with(env_filter(config)?)
        .with(otlp_layer(config)?);

    let result = match config.log_format {
        LogFormat::Json => registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .try_init(),
        LogFormat::Text => registry
            .with(fmt::layer().with_writer(std::io::stderr))
            .try_init(),
    };
    result.map_err(|e| TagSelectError::Config(e.to_string()))
}

#[cfg(feature = "otlp")]
fn otlp_layer<S>(
    config: &TagSelectConfig,
) -> Result<
    Option<tracing_opentelemetry::OpenTelemetryLayer<S, opentelemetry_sdk::trace::Tracer>>,
    TagSelectError,
>
where
    S: tracing::Subscriber + for<'span> tracing_subscriber::registry::LookupSpan<'span>,
{
    use opentelemetry::KeyValue;
    use opentelemetry_otlp::WithExportConfig;
    use opentelemetry_sdk::Resource;

    let Some(endpoint) = config.otlp_endpoint.as_deref() else {
        return Ok(None);
    };
    let tracer = opentelemetry_otlp::new_pipeline()
        .tracing()
        .with_exporter(
            opentelemetry_otlp::new_exporter()
                .tonic()
                .with_endpoint(endpoint),
        )
        .with_trace_config(opentelemetry_sdk::trace::config().with_resource(Resource::new(
            vec![KeyValue::new("service.name", config.service_name.clone())],
        )))
        .install_batch(opentelemetry_sdk::runtime::Tokio)
        .map_err(|e| TagSelectError::Config(format!("OTLP pipeline: {e}")))?;
    Ok(Some(tracing_opentelemetry::layer().with_tracer(tracer)))
}

#[cfg(not(feature = "otlp"))]
fn otlp_layer(
    config: &TagSelectConfig,
) -> Result<Option<tracing_subscriber::layer::Identity>, TagSelectError> {
    if config.otlp_endpoint.is_some() {
        tracing::warn!("otlp_endpoint is set but the otlp feature is disabled");
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_filter_from_config() {
        let config = TagSelectConfig {
            log_filter: "metric_tag_select=debug".to_string(),
            ..TagSelectConfig::default()
        };
        assert!(env_filter(&config).is_ok());
    }

    #[test]
    fn test_env_filter_rejects_bad_directive() {
        if std::env::var_os("RUST_LOG").is_some() {
            return;
        }
        let config = TagSelectConfig {
            log_filter: "metric_tag_select=loud".to_string(),
            ..TagSelectConfig::default()
        };
        let err = env_filter(&config).unwrap_err();
        assert!(err.to_string().contains("log_filter"));
    }
}
