// MIT License - Copyright (c) 2026 Peter Wright

use std::collections::HashMap;

/// Configuration for one panel session.
///
/// Read-only for the lifetime of the session. The name maps translate the
/// panel's numeric partition/zone/usercode identifiers into display names;
/// targets absent from their map are filtered out of event publication.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Panel interface host
    pub host: String,
    /// Panel interface TCP port (default: 4025)
    pub port: u16,
    /// Interface login password
    pub password: String,
    /// Default usercode for disarm requests that don't supply one
    pub alarm_code: String,
    /// Fixed reconnect delay in seconds (default: 10, never grows)
    pub retry_delay_secs: u64,
    /// Verify the trailing checksum of inbound lines. Off by default: the
    /// panel's checksums are trusted, matching long-observed behavior.
    pub verify_inbound_checksum: bool,
    /// Partition number → display name
    pub partition_names: HashMap<u8, String>,
    /// Zone number → display name; `None` means the zone is configured but
    /// its display name is explicitly suppressed
    pub zone_names: HashMap<u16, Option<String>>,
    /// Usercode → display name
    pub user_names: HashMap<u16, String>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            host: "192.168.0.99".to_string(),
            port: 4025,
            password: "user".to_string(),
            alarm_code: "1234".to_string(),
            retry_delay_secs: 10,
            verify_inbound_checksum: false,
            partition_names: HashMap::new(),
            zone_names: HashMap::new(),
            user_names: HashMap::new(),
        }
    }
}

impl SessionConfig {
    /// Create a new config builder starting from defaults.
    pub fn builder() -> SessionConfigBuilder {
        SessionConfigBuilder::default()
    }

    /// Display name for a partition, if configured.
    pub fn partition_name(&self, partition: u8) -> Option<&str> {
        self.partition_names.get(&partition).map(String::as_str)
    }

    /// Display name for a zone.
    ///
    /// Returns `None` both for zones absent from the map and for zones
    /// explicitly mapped to "no name"; the two are deliberately not
    /// distinguished here (partitions have no suppressed form).
    pub fn zone_name(&self, zone: u16) -> Option<&str> {
        self.zone_names.get(&zone).and_then(|n| n.as_deref())
    }

    /// Whether a zone is present in configuration at all (named or
    /// suppressed). Publication filtering uses presence, not the name.
    pub fn zone_configured(&self, zone: u16) -> bool {
        self.zone_names.contains_key(&zone)
    }

    /// Whether a partition is present in configuration.
    pub fn partition_configured(&self, partition: u8) -> bool {
        self.partition_names.contains_key(&partition)
    }

    /// Display name for a usercode, if configured.
    pub fn user_name(&self, usercode: u16) -> Option<&str> {
        self.user_names.get(&usercode).map(String::as_str)
    }
}

/// Builder for SessionConfig.
#[derive(Debug, Clone, Default)]
pub struct SessionConfigBuilder {
    config: SessionConfig,
}

impl SessionConfigBuilder {
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.config.host = host.into();
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.config.port = port;
        self
    }

    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.config.password = password.into();
        self
    }

    pub fn alarm_code(mut self, code: impl Into<String>) -> Self {
        self.config.alarm_code = code.into();
        self
    }

    pub fn retry_delay_secs(mut self, secs: u64) -> Self {
        self.config.retry_delay_secs = secs;
        self
    }

    pub fn verify_inbound_checksum(mut self, verify: bool) -> Self {
        self.config.verify_inbound_checksum = verify;
        self
    }

    pub fn partition_name(mut self, partition: u8, name: impl Into<String>) -> Self {
        self.config.partition_names.insert(partition, name.into());
        self
    }

    pub fn zone_name(mut self, zone: u16, name: impl Into<String>) -> Self {
        self.config.zone_names.insert(zone, Some(name.into()));
        self
    }

    /// Configure a zone whose display name is suppressed.
    pub fn zone_unnamed(mut self, zone: u16) -> Self {
        self.config.zone_names.insert(zone, None);
        self
    }

    pub fn user_name(mut self, usercode: u16, name: impl Into<String>) -> Self {
        self.config.user_names.insert(usercode, name.into());
        self
    }

    pub fn build(self) -> SessionConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SessionConfig::default();
        assert_eq!(config.port, 4025);
        assert_eq!(config.retry_delay_secs, 10);
        assert!(!config.verify_inbound_checksum);
    }

    #[test]
    fn test_builder() {
        let config = SessionConfig::builder()
            .host("10.0.0.2")
            .port(4026)
            .password("secret")
            .alarm_code("0000")
            .partition_name(1, "Home")
            .zone_name(1, "Front Door")
            .user_name(1, "Alice")
            .build();

        assert_eq!(config.host, "10.0.0.2");
        assert_eq!(config.port, 4026);
        assert_eq!(config.partition_name(1), Some("Home"));
        assert_eq!(config.zone_name(1), Some("Front Door"));
        assert_eq!(config.user_name(1), Some("Alice"));
        assert_eq!(config.partition_name(2), None);
    }

    #[test]
    fn test_suppressed_zone_is_configured_but_unnamed() {
        let config = SessionConfig::builder().zone_unnamed(7).build();
        assert!(config.zone_configured(7));
        assert_eq!(config.zone_name(7), None);
        assert!(!config.zone_configured(8));
    }
}
