//! Launch configuration handed over by the host application.
//!
//! The host passes an arbitrary string map; only `"Port"` is read.

use std::collections::HashMap;

use crate::error::TestlinkError;

/// Key holding the listener port in the launch configuration.
pub const PORT_KEY: &str = "Port";

/// Key/value data supplied by the host when it invokes an entry point.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LaunchConfiguration {
    values: HashMap<String, String>,
}

impl LaunchConfiguration {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.insert(key.into(), value.into());
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    /// The listener port, parsed as a base-10 integer.
    ///
    /// Surrounding whitespace is ignored. Missing keys, non-numeric values,
    /// values outside the `u16` range and 0 (the "closed" port) all yield
    /// `InvalidPort`.
    pub fn port(&self) -> Result<u16, TestlinkError> {
        self.get(PORT_KEY)
            .and_then(|raw| raw.trim().parse::<u16>().ok())
            .filter(|port| *port != 0)
            .ok_or(TestlinkError::InvalidPort)
    }
}

impl<K, V> FromIterator<(K, V)> for LaunchConfiguration
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            values: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_port() {
        let launch = LaunchConfiguration::new().with("Port", "9000");
        assert_eq!(launch.port().unwrap(), 9000);
    }

    #[test]
    fn tolerates_whitespace() {
        let launch = LaunchConfiguration::new().with("Port", " 9000\n");
        assert_eq!(launch.port().unwrap(), 9000);
    }

    #[test]
    fn missing_port() {
        let err = LaunchConfiguration::new().port().unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn bad_port_values() {
        for raw in ["abc", "", "-1", "70000", "90.5", "0", " 0 "] {
            let launch = LaunchConfiguration::new().with("Port", raw);
            assert!(
                matches!(launch.port(), Err(TestlinkError::InvalidPort)),
                "{raw:?} should be rejected"
            );
        }
    }

    #[test]
    fn zero_port_is_rejected() {
        let launch = LaunchConfiguration::new().with("Port", "0");
        let err = launch.port().unwrap_err();
        assert!(err.is_configuration());
        assert_eq!(err.to_string(), "The port is not given or is in a bad format!");
    }

    #[test]
    fn key_is_case_sensitive_and_others_ignored() {
        let launch: LaunchConfiguration = [("port", "9000"), ("Fixture", "X")].into_iter().collect();
        assert!(launch.port().is_err());
        assert_eq!(launch.get("Fixture"), Some("X"));
    }
}
