use crate::config::MetricsConfig;
use metrics_exporter_statsd::StatsdBuilder;
use shared::metrics_defs::describe_all;

const PREFIX: &str = "switchboard";

#[derive(thiserror::Error, Debug)]
pub enum MetricsError {
    #[error("could not build statsd exporter: {0}")]
    Exporter(#[from] metrics_exporter_statsd::StatsdError),
    #[error("could not install metrics recorder: {0}")]
    Install(String),
}

/// Routes every metric to StatsD and registers the descriptions of all known metrics.
pub fn init(config: &MetricsConfig) -> Result<(), MetricsError> {
    let recorder =
        StatsdBuilder::from(config.statsd_host.clone(), config.statsd_port).build(Some(PREFIX))?;
    ::metrics::set_global_recorder(recorder).map_err(|e| MetricsError::Install(e.to_string()))?;

    describe_all(shared::metrics_defs::ALL_METRICS);
    describe_all(catalog_cleanup::metrics_defs::ALL_METRICS);
    describe_all(payments_console::metrics_defs::ALL_METRICS);

    tracing::info!(
        host = %config.statsd_host,
        port = config.statsd_port,
        "Metrics exported to statsd"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use shared::metrics_defs::MetricDef;
    use std::collections::HashSet;

    #[test]
    fn metric_names_are_unique_across_crates() {
        let all: Vec<&MetricDef> = shared::metrics_defs::ALL_METRICS
            .iter()
            .chain(catalog_cleanup::metrics_defs::ALL_METRICS)
            .chain(payments_console::metrics_defs::ALL_METRICS)
            .collect();
        let names: HashSet<&str> = all.iter().map(|m| m.name).collect();
        assert_eq!(names.len(), all.len());
    }
}
