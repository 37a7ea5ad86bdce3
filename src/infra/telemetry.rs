use std::sync::Once;

use metrics::{Unit, describe_counter};
use tracing::level_filters::LevelFilter;
use tracing_error::ErrorLayer;
use tracing_subscriber::{
    EnvFilter, fmt,
    layer::{Layer, SubscriberExt},
    util::SubscriberInitExt,
};

use crate::config::{LogFormat, LoggingSettings};

use super::error::InfraError;

static METRIC_DESCRIPTIONS: Once = Once::new();

/// Install a global tracing subscriber using the provided logging settings.
pub fn init(logging: &LoggingSettings) -> Result<(), InfraError> {
    describe_metrics();

    let env_filter = EnvFilter::builder()
        .with_default_directive(logging.level.into())
        .from_env_lossy();

    let fmt_layer = match logging.format {
        LogFormat::Json => fmt::layer()
            .json()
            .with_current_span(true)
            .with_span_list(true)
            .with_target(true)
            .boxed(),
        LogFormat::Compact => fmt::layer().compact().with_target(true).boxed(),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(ErrorLayer::default())
        .with(fmt_layer)
        .try_init()
        .map_err(|err| InfraError::Telemetry(err.to_string()))
}

/// Stderr-only subscriber for the interactive client, so stdout stays machine readable.
pub fn init_client(level: LevelFilter) -> Result<(), InfraError> {
    describe_metrics();

    let env_filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy();

    tracing_subscriber::registry()
        .with(env_filter)
        .with(ErrorLayer::default())
        .with(
            fmt::layer()
                .compact()
                .with_target(true)
                .with_writer(std::io::stderr),
        )
        .try_init()
        .map_err(|err| InfraError::Telemetry(err.to_string()))
}

fn describe_metrics() {
    METRIC_DESCRIPTIONS.call_once(|| {
        describe_counter!(
            "inkpost_posts_created_total",
            Unit::Count,
            "Total number of posts created through the content API."
        );
        describe_counter!(
            "inkpost_posts_relabelled_total",
            Unit::Count,
            "Total number of posts whose author label was rewritten."
        );
        describe_counter!(
            "inkpost_author_renames_total",
            Unit::Count,
            "Total number of author renames committed on this device."
        );
        describe_counter!(
            "inkpost_author_rename_failures_total",
            Unit::Count,
            "Total number of author renames abandoned because the relabel failed."
        );
        describe_counter!(
            "inkpost_identity_storage_failures_total",
            Unit::Count,
            "Total number of identity storage reads or writes that failed."
        );
    });
}
