use catalog_cleanup::config::Config as CatalogCleanupConfig;
use payments_console::config::Config as PaymentsConsoleConfig;
use serde::Deserialize;
use std::fs::File;

#[derive(Debug, Deserialize)]
pub struct MetricsConfig {
    pub statsd_host: String,
    pub statsd_port: u16,
}

#[derive(Debug, Deserialize)]
pub struct LoggingConfig {
    pub sentry_dsn: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CommonConfig {
    pub metrics: Option<MetricsConfig>,
    pub logging: Option<LoggingConfig>,
}

#[derive(Debug, Deserialize)]
pub struct Config {
    #[serde(flatten)]
    pub common: CommonConfig,
    pub catalog_cleanup: Option<CatalogCleanupConfig>,
    pub payments_console: Option<PaymentsConsoleConfig>,
}

impl Config {
    pub fn from_file(path: &std::path::Path) -> Result<Self, ConfigError> {
        let file = File::open(path)?;
        let data = serde_yaml::from_reader(file)?;

        Ok(data)
    }
}

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("could not load config from file: {0}")]
    LoadError(#[from] std::io::Error),
    #[error("could not parse config: {0}")]
    ParseError(#[from] serde_yaml::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_tmp_file(s: &str) -> tempfile::NamedTempFile {
        let mut tmp = tempfile::NamedTempFile::new().expect("create temp file");
        write!(tmp, "{}", s).expect("write yaml");

        tmp
    }

    #[test]
    fn catalog_cleanup_config() {
        let yaml = r#"
            metrics:
                statsd_host: 127.0.0.1
                statsd_port: 8125
            logging:
                sentry_dsn: https://key@sentry.example.com/1
            catalog_cleanup:
                listener:
                    host: 0.0.0.0
                    port: 8080
                catalog:
                    base_url: https://www.b1.lt
                    api_key: secret
                    company_id: "42"
                dry_run_default: false
            "#;
        let tmp = write_tmp_file(yaml);
        let config = Config::from_file(tmp.path()).expect("load config");

        let metrics = config.common.metrics.expect("metrics config");
        assert_eq!(metrics.statsd_port, 8125);
        assert!(config.common.logging.unwrap().sentry_dsn.is_some());
        assert!(config.payments_console.is_none());

        let cleanup = config.catalog_cleanup.expect("catalog cleanup config");
        assert_eq!(cleanup.listener.port, 8080);
        assert_eq!(cleanup.catalog.company_id.as_deref(), Some("42"));
        assert!(!cleanup.dry_run_default);
        assert_eq!(cleanup.target_group_name, "xxx_pvz grupė");
        assert!(cleanup.validate().is_ok());
    }

    #[test]
    fn payments_console_config() {
        let yaml = r#"
            payments_console:
                monday:
                    api_token: token-from-file
                    board_id: 1645436514
                    columns:
                        advance_link: text_mkqxtzec
                        final_link: text_mkr2wpca
                        lead_id: text_mkr4wv8q
                        advance_amount: numeric_mks5kp0t
                webhook:
                    url: https://hooks.example.com/resend
            "#;
        let tmp = write_tmp_file(yaml);
        let config = Config::from_file(tmp.path()).expect("load config");

        assert!(config.common.metrics.is_none());
        assert!(config.catalog_cleanup.is_none());

        let console = config.payments_console.expect("payments console config");
        assert_eq!(
            console.monday.resolve_api_token().as_deref(),
            Some("token-from-file")
        );
        assert_eq!(console.webhook.timeout_secs, 30);
        assert!(console.validate().is_ok());
    }

    #[test]
    fn missing_file() {
        let err = Config::from_file(std::path::Path::new("/nonexistent/switchboard.yaml"))
            .unwrap_err();
        assert!(matches!(err, ConfigError::LoadError(_)));
    }

    #[test]
    fn invalid_yaml() {
        let tmp = write_tmp_file("catalog_cleanup:\n    catalog: [not, a, map]\n");
        let err = Config::from_file(tmp.path()).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));
    }
}
