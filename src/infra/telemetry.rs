use std::sync::Once;

use metrics::{Unit, describe_counter};
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
        .map_err(|err| {
            InfraError::telemetry(format!("failed to install tracing subscriber: {err}"))
        })
}

fn describe_metrics() {
    METRIC_DESCRIPTIONS.call_once(|| {
        describe_counter!(
            "taproom_site_cache_hit_total",
            Unit::Count,
            "Reads answered from a memoized site cache slot."
        );
        describe_counter!(
            "taproom_site_cache_miss_total",
            Unit::Count,
            "Reads that had to query the database to fill a site cache slot."
        );
        describe_counter!(
            "taproom_site_cache_invalidate_total",
            Unit::Count,
            "Explicit site cache invalidations."
        );
        describe_counter!(
            "taproom_media_upload_total",
            Unit::Count,
            "Stored media uploads, labelled by backend."
        );
        describe_counter!(
            "taproom_media_fallback_total",
            Unit::Count,
            "Uploads that fell back from cloud storage to local disk."
        );
        describe_counter!(
            "taproom_form_relay_total",
            Unit::Count,
            "Outbound form relay attempts, labelled by form kind and outcome."
        );
    });
}
