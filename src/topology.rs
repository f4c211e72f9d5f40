use crate::topology_connection::NetworkConnection;
use crate::topology_device::{DeviceStatus, DeviceType, NetworkDevice};
use crate::topology_subnet::Subnet;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_with::serde_as;
use std::collections::{HashMap, HashSet};
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum TopologyError {
    #[error("duplicate device id '{0}'")]
    DuplicateDeviceId(String),
    #[error("connection '{connection}' references unknown device '{device}'")]
    DanglingEndpoint { connection: String, device: String },
    #[error("stats field '{field}' is {found} but the topology holds {expected}")]
    StatsMismatch {
        field: &'static str,
        found: usize,
        expected: usize,
    },
}

#[serde_as]
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct DiscoveryStats {
    pub total_devices: usize,
    pub total_connections: usize,
    #[serde_as(as = "Vec<(_, _)>")]
    pub devices_by_type: HashMap<DeviceType, usize>,
    #[serde_as(as = "Vec<(_, _)>")]
    pub devices_by_status: HashMap<DeviceStatus, usize>,
    #[serde_as(as = "Vec<(_, _)>")]
    pub devices_by_location: HashMap<String, usize>,
    // Responding hosts / swept addresses
    pub coverage_percent: f32,
    pub scan_duration_ms: u64,
    pub unreachable_subnets: Vec<String>,
    pub credential_failures: usize,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct NetworkTopology {
    pub devices: Vec<NetworkDevice>,
    pub connections: Vec<NetworkConnection>,
    pub subnets: Vec<Subnet>,
    pub stats: DiscoveryStats,
    pub generated_at: DateTime<Utc>,
    // True when some subnets could not be swept
    pub partial: bool,
}

impl NetworkTopology {
    pub fn new() -> NetworkTopology {
        NetworkTopology {
            devices: Vec::new(),
            connections: Vec::new(),
            subnets: Vec::new(),
            stats: DiscoveryStats::default(),
            generated_at: Utc::now(),
            partial: false,
        }
    }

    pub fn device_by_id(&self, id: &str) -> Option<&NetworkDevice> {
        self.devices.iter().find(|d| d.id == id)
    }

    pub fn device_by_hostname(&self, hostname: &str) -> Option<&NetworkDevice> {
        self.devices.iter().find(|d| d.hostname == hostname)
    }

    pub fn connections_of(&self, device_id: &str) -> Vec<&NetworkConnection> {
        self.connections
            .iter()
            .filter(|c| c.involves(device_id))
            .collect()
    }

    // Recompute the count fields from the device/connection lists. Coverage,
    // duration and failure figures are owned by the discovery engine.
    pub fn refresh_stats(&mut self) {
        self.stats.total_devices = self.devices.len();
        self.stats.total_connections = self.connections.len();

        let mut by_type: HashMap<DeviceType, usize> = HashMap::new();
        let mut by_status: HashMap<DeviceStatus, usize> = HashMap::new();
        let mut by_location: HashMap<String, usize> = HashMap::new();
        for device in self.devices.iter() {
            *by_type.entry(device.device_type).or_insert(0) += 1;
            *by_status.entry(device.status).or_insert(0) += 1;
            if !device.location.is_empty() {
                *by_location.entry(device.location.clone()).or_insert(0) += 1;
            }
        }
        self.stats.devices_by_type = by_type;
        self.stats.devices_by_status = by_status;
        self.stats.devices_by_location = by_location;
    }

    // Structural invariants every snapshot must satisfy before it is stored
    pub fn validate(&self) -> Result<(), TopologyError> {
        let mut seen: HashSet<&str> = HashSet::new();
        for device in self.devices.iter() {
            if !seen.insert(device.id.as_str()) {
                return Err(TopologyError::DuplicateDeviceId(device.id.clone()));
            }
        }

        for connection in self.connections.iter() {
            for endpoint in [&connection.source, &connection.target] {
                if !seen.contains(endpoint.as_str()) {
                    return Err(TopologyError::DanglingEndpoint {
                        connection: connection.id.clone(),
                        device: endpoint.clone(),
                    });
                }
            }
        }

        if self.stats.total_devices != self.devices.len() {
            return Err(TopologyError::StatsMismatch {
                field: "total_devices",
                found: self.stats.total_devices,
                expected: self.devices.len(),
            });
        }
        if self.stats.total_connections != self.connections.len() {
            return Err(TopologyError::StatsMismatch {
                field: "total_connections",
                found: self.stats.total_connections,
                expected: self.connections.len(),
            });
        }
        let type_sum: usize = self.stats.devices_by_type.values().sum();
        if type_sum != self.devices.len() {
            return Err(TopologyError::StatsMismatch {
                field: "devices_by_type",
                found: type_sum,
                expected: self.devices.len(),
            });
        }
        let status_sum: usize = self.stats.devices_by_status.values().sum();
        if status_sum != self.devices.len() {
            return Err(TopologyError::StatsMismatch {
                field: "devices_by_status",
                found: status_sum,
                expected: self.devices.len(),
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::topology_connection::LinkType;

    fn topology_with_two_devices() -> NetworkTopology {
        let mut topology = NetworkTopology::new();
        let mut device1 = NetworkDevice::new();
        device1.hostname = "core-rt-01".to_string();
        device1.device_type = DeviceType::Router;
        device1.status = DeviceStatus::Online;
        let mut device2 = NetworkDevice::new();
        device2.hostname = "srv-web-01".to_string();
        device2.device_type = DeviceType::Server;
        device2.status = DeviceStatus::Online;
        topology.connections.push(NetworkConnection::new(
            &device1.id,
            &device2.id,
            LinkType::Ethernet,
        ));
        topology.devices.push(device1);
        topology.devices.push(device2);
        topology.refresh_stats();
        topology
    }

    #[test]
    fn test_valid_topology_passes() {
        let topology = topology_with_two_devices();
        assert!(topology.validate().is_ok());
    }

    #[test]
    fn test_duplicate_id_rejected() {
        let mut topology = topology_with_two_devices();
        let dup_id = topology.devices[0].id.clone();
        topology.devices[1].id = dup_id.clone();
        topology.refresh_stats();
        assert_eq!(
            topology.validate(),
            Err(TopologyError::DuplicateDeviceId(dup_id))
        );
    }

    #[test]
    fn test_dangling_endpoint_rejected() {
        let mut topology = topology_with_two_devices();
        topology.connections[0].target = "no-such-device".to_string();
        topology.refresh_stats();
        assert!(matches!(
            topology.validate(),
            Err(TopologyError::DanglingEndpoint { .. })
        ));
    }

    #[test]
    fn test_stats_sums_enforced() {
        let mut topology = topology_with_two_devices();
        topology.stats.total_devices = 5;
        assert!(matches!(
            topology.validate(),
            Err(TopologyError::StatsMismatch { .. })
        ));

        let mut topology = topology_with_two_devices();
        topology
            .stats
            .devices_by_type
            .insert(DeviceType::Firewall, 3);
        assert!(matches!(
            topology.validate(),
            Err(TopologyError::StatsMismatch { .. })
        ));
    }

    #[test]
    fn test_connections_of() {
        let topology = topology_with_two_devices();
        let first = topology.devices[0].id.clone();
        assert_eq!(topology.connections_of(&first).len(), 1);
        assert_eq!(topology.connections_of("missing").len(), 0);
    }
}
