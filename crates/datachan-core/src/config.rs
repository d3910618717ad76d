//! Manager configuration.

use serde::{Deserialize, Serialize};

use crate::protocol::Role;

/// Configuration for a [`DataChannelManager`](crate::DataChannelManager).
///
/// Defaults reproduce the plain protocol behavior: the role comes from the
/// endpoint and the outbound queue is unbounded.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ManagerConfig {
    /// Override of the endpoint's role for stream id parity.
    pub role: Option<Role>,
    /// Outbound queue capacity. `None` means unbounded.
    pub outbound_capacity: Option<usize>,
}

impl ManagerConfig {
    /// Create a new config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Force the local role instead of asking the endpoint.
    pub fn with_role(mut self, role: Role) -> Self {
        self.role = Some(role);
        self
    }

    /// Bound the outbound queue.
    pub fn with_outbound_capacity(mut self, capacity: usize) -> Self {
        self.outbound_capacity = Some(capacity);
        self
    }

    /// Role to use given what the endpoint reports.
    pub fn resolve_role(&self, endpoint_is_server: bool) -> Role {
        self.role
            .unwrap_or_else(|| Role::from_is_server(endpoint_is_server))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = ManagerConfig::default();
        assert_eq!(config.role, None);
        assert_eq!(config.outbound_capacity, None);
        assert_eq!(config.resolve_role(true), Role::Server);
        assert_eq!(config.resolve_role(false), Role::Client);
    }

    #[test]
    fn test_config_builder() {
        let config = ManagerConfig::new()
            .with_role(Role::Client)
            .with_outbound_capacity(32);

        assert_eq!(config.resolve_role(true), Role::Client);
        assert_eq!(config.outbound_capacity, Some(32));
    }

    #[test]
    fn test_config_from_json() {
        let config: ManagerConfig =
            serde_json::from_str(r#"{"role": "server", "outbound_capacity": 8}"#).unwrap();
        assert_eq!(config.role, Some(Role::Server));
        assert_eq!(config.outbound_capacity, Some(8));

        let empty: ManagerConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(empty, ManagerConfig::default());
    }
}
