//! Connectivity status boundary.

use serde::{Deserialize, Serialize};

use crate::storage::NetworkConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionType {
    Wifi,
    Cellular,
    Ethernet,
    Other,
    None,
}

impl ConnectionType {
    /// Parse a config or host string. Unrecognized names map to `Other`.
    pub fn parse(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "wifi" => ConnectionType::Wifi,
            "cellular" => ConnectionType::Cellular,
            "ethernet" => ConnectionType::Ethernet,
            "none" => ConnectionType::None,
            _ => ConnectionType::Other,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkStatus {
    pub connected: bool,
    pub connection_type: ConnectionType,
}

/// Source of the device's current connectivity.
pub trait ConnectivityProbe: Send + Sync {
    fn status(&self) -> NetworkStatus;
}

/// Fixed connectivity report, typically from config.
#[derive(Debug, Clone, Copy)]
pub struct StaticConnectivity {
    status: NetworkStatus,
}

impl StaticConnectivity {
    pub fn new(connected: bool, connection_type: ConnectionType) -> Self {
        // A disconnected device has no transport.
        let connection_type = if connected {
            connection_type
        } else {
            ConnectionType::None
        };
        Self {
            status: NetworkStatus {
                connected,
                connection_type,
            },
        }
    }

    pub fn from_config(config: &NetworkConfig) -> Self {
        Self::new(config.connected, ConnectionType::parse(&config.connection_type))
    }
}

impl ConnectivityProbe for StaticConnectivity {
    fn status(&self) -> NetworkStatus {
        self.status
    }
}
