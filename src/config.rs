//! Configuration types for the DriftMQ client
//!
//! Configuration is validated when the config value is constructed, whether
//! through the typed builder or the string-map surface, so a misconfigured
//! client fails at construction rather than on first use.

use std::time::Duration;

use crate::error::DriftmqClientError;

/// Client configuration
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// List of bootstrap broker addresses
    pub bootstrap_servers: Vec<String>,
    /// Client identifier sent with every request
    pub client_id: Option<String>,
    /// Default per-call timeout applied to awaitable requests
    pub request_timeout: Duration,
    /// Acknowledgment level requested for produced records (0, 1, -1/all)
    pub acks: i16,
    /// How long `close` waits for an orderly drain before cancelling
    pub shutdown_grace: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            bootstrap_servers: vec!["localhost:9092".to_string()],
            client_id: None,
            request_timeout: Duration::from_secs(30),
            acks: 1,
            shutdown_grace: Duration::from_secs(5),
        }
    }
}

impl ClientConfig {
    /// Create a new config builder
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder::new()
    }

    /// Build a configuration from string key/value pairs.
    ///
    /// Recognized keys: `bootstrap.servers` (comma-separated), `client.id`,
    /// `request.timeout.ms`, `acks` (`all` or an integer), and
    /// `shutdown.grace.ms`. Unknown keys and malformed values are rejected
    /// here, not at first use.
    pub fn from_pairs<I, K, V>(pairs: I) -> Result<Self, DriftmqClientError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut config = ClientConfig {
            bootstrap_servers: Vec::new(),
            ..ClientConfig::default()
        };

        for (key, value) in pairs {
            let key = key.as_ref();
            let value = value.as_ref();
            match key {
                "bootstrap.servers" => {
                    config.bootstrap_servers = value
                        .split(',')
                        .map(|s| s.trim().to_string())
                        .filter(|s| !s.is_empty())
                        .collect();
                }
                "client.id" => {
                    config.client_id = Some(value.to_string());
                }
                "request.timeout.ms" => {
                    config.request_timeout = Duration::from_millis(parse_ms(key, value)?);
                }
                "shutdown.grace.ms" => {
                    config.shutdown_grace = Duration::from_millis(parse_ms(key, value)?);
                }
                "acks" => {
                    config.acks = if value == "all" {
                        -1
                    } else {
                        value.parse().map_err(|_| {
                            DriftmqClientError::invalid_config(format!(
                                "acks must be 'all' or an integer, got '{}'",
                                value
                            ))
                        })?
                    };
                }
                _ => {
                    return Err(DriftmqClientError::invalid_config(format!(
                        "unknown configuration property '{}'",
                        key
                    )));
                }
            }
        }

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), DriftmqClientError> {
        if self.bootstrap_servers.is_empty() {
            return Err(DriftmqClientError::invalid_config(
                "bootstrap.servers must list at least one broker",
            ));
        }
        if self.bootstrap_servers.iter().any(|s| s.is_empty()) {
            return Err(DriftmqClientError::invalid_config(
                "bootstrap.servers contains an empty address",
            ));
        }
        Ok(())
    }
}

fn parse_ms(key: &str, value: &str) -> Result<u64, DriftmqClientError> {
    value.parse().map_err(|_| {
        DriftmqClientError::invalid_config(format!(
            "{} must be a non-negative integer, got '{}'",
            key, value
        ))
    })
}

/// Builder for ClientConfig
#[derive(Debug, Default)]
pub struct ClientConfigBuilder {
    config: ClientConfig,
}

impl ClientConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn brokers<I, S>(mut self, brokers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.bootstrap_servers = brokers.into_iter().map(|s| s.into()).collect();
        self
    }

    pub fn client_id<S: Into<String>>(mut self, client_id: S) -> Self {
        self.config.client_id = Some(client_id.into());
        self
    }

    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.config.request_timeout = timeout;
        self
    }

    pub fn acks(mut self, acks: i16) -> Self {
        self.config.acks = acks;
        self
    }

    pub fn shutdown_grace(mut self, grace: Duration) -> Self {
        self.config.shutdown_grace = grace;
        self
    }

    pub fn build(self) -> Result<ClientConfig, DriftmqClientError> {
        self.config.validate()?;
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder() {
        let config = ClientConfig::builder()
            .brokers(vec!["broker1:9092", "broker2:9092"])
            .client_id("test-client")
            .request_timeout(Duration::from_secs(10))
            .acks(-1)
            .build()
            .unwrap();

        assert_eq!(config.bootstrap_servers, vec!["broker1:9092", "broker2:9092"]);
        assert_eq!(config.client_id, Some("test-client".to_string()));
        assert_eq!(config.request_timeout, Duration::from_secs(10));
        assert_eq!(config.acks, -1);
    }

    #[test]
    fn test_empty_brokers_rejected() {
        let result = ClientConfig::builder().brokers(Vec::<String>::new()).build();
        assert!(matches!(
            result,
            Err(DriftmqClientError::InvalidConfig { .. })
        ));
    }

    #[test]
    fn test_from_pairs() {
        let config = ClientConfig::from_pairs([
            ("bootstrap.servers", "b1:9092, b2:9092"),
            ("request.timeout.ms", "15000"),
            ("acks", "all"),
        ])
        .unwrap();

        assert_eq!(config.bootstrap_servers, vec!["b1:9092", "b2:9092"]);
        assert_eq!(config.request_timeout, Duration::from_secs(15));
        assert_eq!(config.acks, -1);
    }

    #[test]
    fn test_from_pairs_unknown_key_rejected() {
        let result = ClientConfig::from_pairs([
            ("bootstrap.servers", "b1:9092"),
            ("no.such.property", "1"),
        ]);
        assert!(matches!(
            result,
            Err(DriftmqClientError::InvalidConfig { .. })
        ));
    }

    #[test]
    fn test_from_pairs_malformed_value_rejected() {
        let result = ClientConfig::from_pairs([
            ("bootstrap.servers", "b1:9092"),
            ("request.timeout.ms", "soon"),
        ]);
        assert!(matches!(
            result,
            Err(DriftmqClientError::InvalidConfig { .. })
        ));
    }

    #[test]
    fn test_from_pairs_requires_bootstrap() {
        let result = ClientConfig::from_pairs([("client.id", "c1")]);
        assert!(matches!(
            result,
            Err(DriftmqClientError::InvalidConfig { .. })
        ));
    }
}
