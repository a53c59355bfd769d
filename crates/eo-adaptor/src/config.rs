use std::time::Duration;

use eo_sql::DialectKind;
use serde::{Deserialize, Serialize};
use url::Url;

/// The `serde`-deserializable shape a concrete adaptor crate parses its
/// connection/pool settings from (environment, file, or inline), per §3.1.
/// This crate stops at defining the shape; opening the actual socket and
/// authenticating is a concrete adaptor's job, out of scope here.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AdaptorConfig {
    pub dialect: DialectKind,
    pub dsn: Url,
    #[serde(default = "default_pool_size")]
    pub pool_size: u32,
    #[serde(with = "humantime_serde", default = "default_statement_timeout")]
    pub statement_timeout: Duration,
    #[serde(with = "humantime_serde", default = "default_max_channel_age")]
    pub max_channel_age: Duration,
}

fn default_pool_size() -> u32 {
    1
}

fn default_statement_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_max_channel_age() -> Duration {
    Duration::from_secs(300)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_from_json_with_defaults() {
        let json = r#"{"dialect":"postgres","dsn":"postgres://localhost/app"}"#;
        let config: AdaptorConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.dialect, DialectKind::Postgres);
        assert_eq!(config.pool_size, 1);
        assert_eq!(config.statement_timeout, Duration::from_secs(30));
        assert_eq!(config.max_channel_age, Duration::from_secs(300));
    }

    #[test]
    fn deserializes_explicit_durations() {
        let json = r#"{"dialect":"sqlite","dsn":"sqlite://memory","pool_size":4,"statement_timeout":"5s","max_channel_age":"1m"}"#;
        let config: AdaptorConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.pool_size, 4);
        assert_eq!(config.statement_timeout, Duration::from_secs(5));
        assert_eq!(config.max_channel_age, Duration::from_secs(60));
    }
}
