use crate::config::LoggingConfig;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Installs the global subscriber: `RUST_LOG` filtering (default `info`), human readable
/// output, and Sentry forwarding when a DSN is configured. Keep the returned guard alive
/// for the lifetime of the process so buffered events get flushed.
pub fn init(config: Option<&LoggingConfig>) -> Option<sentry::ClientInitGuard> {
    let guard = config
        .and_then(|c| c.sentry_dsn.as_deref())
        .filter(|dsn| !dsn.is_empty())
        .map(|dsn| {
            sentry::init((
                dsn,
                sentry::ClientOptions {
                    release: sentry::release_name!(),
                    ..Default::default()
                },
            ))
        });

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .with(sentry::integrations::tracing::layer())
        .init();

    guard
}
