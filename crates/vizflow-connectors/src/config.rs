//! Endpoint and connection configuration.
//!
//! [`ConnectionConfig`] is handed to the transform at construction time
//! (dependency injection) and never mutated afterwards. Every transform
//! instance built from the same config targets the same remote service;
//! the "set once before first use" contract is a constructor precondition
//! rather than process-wide state.

use crate::error::TransformError;

/// Transport endpoint for the remote query service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointConfig {
    /// Host name or address.
    pub host: String,
    /// TCP port.
    pub port: u16,
    /// Request path, leading slash included.
    pub path: String,
    /// Extra headers sent with every request.
    pub headers: Vec<(String, String)>,
}

impl Default for EndpointConfig {
    /// The conventional local query proxy: `localhost:3000/query`.
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 3000,
            path: "/query".to_string(),
            headers: Vec::new(),
        }
    }
}

impl EndpointConfig {
    /// Creates an endpoint for the given host and port with the default path.
    #[must_use]
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            ..Self::default()
        }
    }

    /// Sets the request path.
    #[must_use]
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    /// Adds a header sent with every request.
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Returns the full request URL.
    #[must_use]
    pub fn url(&self) -> String {
        format!("http://{}:{}{}", self.host, self.port, self.path)
    }

    /// Validates the endpoint.
    ///
    /// # Errors
    ///
    /// Returns `TransformError::MissingConfig` if the host is empty, or
    /// `TransformError::Configuration` if the path does not start with `/`.
    pub fn validate(&self) -> Result<(), TransformError> {
        if self.host.trim().is_empty() {
            return Err(TransformError::MissingConfig("endpoint host".into()));
        }
        if !self.path.starts_with('/') {
            return Err(TransformError::Configuration(format!(
                "endpoint path must start with '/': '{}'",
                self.path
            )));
        }
        Ok(())
    }
}

/// Complete connection configuration for the remote query service.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConnectionConfig {
    /// Where to send query requests.
    pub endpoint: EndpointConfig,
    /// Data-source connection string forwarded to the service, if any.
    pub connection_string: Option<String>,
}

impl ConnectionConfig {
    /// Creates a connection config for the given endpoint.
    #[must_use]
    pub fn new(endpoint: EndpointConfig) -> Self {
        Self {
            endpoint,
            connection_string: None,
        }
    }

    /// Sets the data-source connection string forwarded to the service.
    #[must_use]
    pub fn with_connection_string(mut self, conn: impl Into<String>) -> Self {
        self.connection_string = Some(conn.into());
        self
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns `TransformError` if the endpoint is invalid or the
    /// connection string is present but empty.
    pub fn validate(&self) -> Result<(), TransformError> {
        self.endpoint.validate()?;
        if let Some(conn) = &self.connection_string {
            if conn.trim().is_empty() {
                return Err(TransformError::Configuration(
                    "connection string is empty".into(),
                ));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_endpoint() {
        let endpoint = EndpointConfig::default();
        assert_eq!(endpoint.url(), "http://localhost:3000/query");
        assert!(endpoint.validate().is_ok());
    }

    #[test]
    fn test_builder() {
        let endpoint = EndpointConfig::new("db.internal", 8080)
            .with_path("/v1/query")
            .with_header("x-api-key", "secret");
        assert_eq!(endpoint.url(), "http://db.internal:8080/v1/query");
        assert_eq!(endpoint.headers.len(), 1);
    }

    #[test]
    fn test_empty_host_rejected() {
        let endpoint = EndpointConfig::new("", 3000);
        let err = endpoint.validate().unwrap_err();
        assert!(matches!(err, TransformError::MissingConfig(_)));
    }

    #[test]
    fn test_path_without_slash_rejected() {
        let endpoint = EndpointConfig::default().with_path("query");
        assert!(endpoint.validate().is_err());
    }

    #[test]
    fn test_empty_connection_string_rejected() {
        let config = ConnectionConfig::default().with_connection_string("   ");
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_valid_connection_config() {
        let config = ConnectionConfig::default()
            .with_connection_string("postgres://localhost:5432/vega");
        assert!(config.validate().is_ok());
    }
}
