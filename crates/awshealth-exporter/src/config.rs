//! Process configuration.
//!
//! Every option is a long flag with an environment variable fallback,
//! so the exporter runs unchanged from a container environment.

use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use chrono::{DateTime, NaiveDate, Utc};
use clap::{Parser, ValueEnum};

use awshealth_types::{ConfigError, EventQuery};

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Debug, Clone, Parser)]
#[command(
    name = "awshealth-exporter",
    about = "Export AWS Health events as Prometheus metrics",
    version
)]
pub struct Config {
    /// Seconds between poll cycles.
    #[arg(
        long,
        env = "POLLING_INTERVAL_SECONDS",
        default_value_t = 3600,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub polling_interval_seconds: u64,

    /// Accepted for compatibility with existing deployments; unused.
    #[arg(long, env = "APP_URL", default_value = "")]
    pub app_url: String,

    /// Port the metrics server listens on.
    #[arg(long, env = "EXPORTER_PORT", default_value_t = 9876)]
    pub exporter_port: u16,

    /// Address the metrics server binds.
    #[arg(long, env = "EXPORTER_BIND", default_value = "0.0.0.0")]
    pub exporter_bind: IpAddr,

    /// Comma-separated event region allow-list.
    #[arg(
        long,
        env = "HEALTH_REGIONS",
        value_delimiter = ',',
        default_value = "eu-west-1,global"
    )]
    pub health_regions: Vec<String>,

    /// Lower bound of the event window (RFC 3339 or YYYY-MM-DD).
    #[arg(
        long,
        env = "HEALTH_EVENTS_SINCE",
        default_value = "2021-12-01",
        value_parser = parse_since
    )]
    pub health_events_since: DateTime<Utc>,

    /// Region of the Health API endpoint.
    #[arg(long, env = "HEALTH_API_REGION", default_value = "us-east-1")]
    pub health_api_region: String,

    /// Upper bound on one complete fetch, in seconds.
    #[arg(
        long,
        env = "FETCH_TIMEOUT_SECONDS",
        default_value_t = 30,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub fetch_timeout_seconds: u64,

    #[arg(long, env = "LOG_FORMAT", value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,
}

impl Config {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.polling_interval_seconds)
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_seconds)
    }

    pub fn listen_addr(&self) -> SocketAddr {
        SocketAddr::new(self.exporter_bind, self.exporter_port)
    }

    /// The event query selected by this configuration.
    pub fn query(&self) -> Result<EventQuery, ConfigError> {
        let regions: Vec<String> = self
            .health_regions
            .iter()
            .map(|r| r.trim())
            .filter(|r| !r.is_empty())
            .map(str::to_string)
            .collect();

        if regions.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "HEALTH_REGIONS",
                reason: "at least one region is required".to_string(),
            });
        }
        if self.health_events_since >= Utc::now() {
            return Err(ConfigError::InvalidValue {
                field: "HEALTH_EVENTS_SINCE",
                reason: format!("{} is in the future", self.health_events_since),
            });
        }

        Ok(EventQuery {
            regions,
            since: self.health_events_since,
            ..EventQuery::default()
        })
    }
}

fn parse_since(s: &str) -> Result<DateTime<Utc>, String> {
    if let Ok(t) = DateTime::parse_from_rfc3339(s) {
        return Ok(t.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|t| t.and_utc())
        .ok_or_else(|| format!("expected RFC 3339 timestamp or YYYY-MM-DD, got {s:?}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Config, clap::Error> {
        Config::try_parse_from(std::iter::once("awshealth-exporter").chain(args.iter().copied()))
    }

    #[test]
    fn defaults() {
        let config = parse(&[]).unwrap();
        assert_eq!(config.polling_interval_seconds, 3600);
        assert_eq!(config.exporter_port, 9876);
        assert_eq!(config.app_url, "");
        assert_eq!(config.health_api_region, "us-east-1");
        assert_eq!(config.fetch_timeout(), Duration::from_secs(30));
        assert_eq!(config.log_format, LogFormat::Text);
        assert_eq!(config.listen_addr().to_string(), "0.0.0.0:9876");
    }

    #[test]
    fn default_query_matches_domain_default() {
        let query = parse(&[]).unwrap().query().unwrap();
        assert_eq!(query, EventQuery::default());
    }

    #[test]
    fn regions_are_split_and_trimmed() {
        let config = parse(&["--health-regions", "us-east-1, eu-central-1,,global"]).unwrap();
        let query = config.query().unwrap();
        assert_eq!(query.regions, vec!["us-east-1", "eu-central-1", "global"]);
    }

    #[test]
    fn blank_regions_are_rejected() {
        let config = parse(&["--health-regions", " , "]).unwrap();
        assert!(matches!(
            config.query(),
            Err(ConfigError::InvalidValue { field: "HEALTH_REGIONS", .. })
        ));
    }

    #[test]
    fn zero_interval_is_rejected() {
        assert!(parse(&["--polling-interval-seconds", "0"]).is_err());
        assert!(parse(&["--fetch-timeout-seconds", "0"]).is_err());
    }

    #[test]
    fn non_numeric_port_is_rejected() {
        assert!(parse(&["--exporter-port", "http"]).is_err());
    }

    #[test]
    fn since_accepts_date_and_rfc3339() {
        assert_eq!(
            parse_since("2023-05-01").unwrap().to_rfc3339(),
            "2023-05-01T00:00:00+00:00"
        );
        assert_eq!(
            parse_since("2023-05-01T12:00:00+02:00").unwrap().to_rfc3339(),
            "2023-05-01T10:00:00+00:00"
        );
        assert!(parse_since("yesterday").is_err());
    }

    #[test]
    fn json_log_format() {
        let config = parse(&["--log-format", "json"]).unwrap();
        assert_eq!(config.log_format, LogFormat::Json);
    }
}
