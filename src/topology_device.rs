use chrono::{DateTime, Utc};
use eui48::MacAddress;
use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use strum_macros::{Display, EnumIter, EnumString};
use tracing::trace;

// Evidence older than this is ignored when merging scan rounds
pub static DEVICE_ACTIVITY_TIMEOUT: i64 = 900;

#[derive(
    Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter, EnumString,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum DeviceType {
    Router,
    Switch,
    Firewall,
    Server,
    Workstation,
    AccessPoint,
    LoadBalancer,
    IdsIps,
    Hypervisor,
    ContainerHost,
    Unknown,
}

impl DeviceType {
    // Infrastructure devices anchor the connection fabric and the hierarchical layout
    pub fn is_infrastructure(&self) -> bool {
        matches!(
            self,
            DeviceType::Router
                | DeviceType::Switch
                | DeviceType::Firewall
                | DeviceType::AccessPoint
                | DeviceType::LoadBalancer
                | DeviceType::IdsIps
        )
    }
}

#[derive(
    Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum DeviceStatus {
    Online,
    Warning,
    Offline,
    Unknown,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct InterfaceInfo {
    pub name: String,
    pub ipv4: Option<IpAddr>,
    pub mac: MacAddress,
    pub speed_mbps: u32,
    pub up: bool,
}

// Destination kept as a CIDR string to stay bridge friendly
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct RouteEntry {
    pub destination: String,
    pub next_hop: IpAddr,
    pub interface: String,
    pub metric: u32,
}

// We should really use HashSets for the address lists, but we don't in order
// to keep the struct usable over the FFI bridge
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct NetworkDevice {
    pub id: String,
    pub hostname: String,
    pub ip_addresses: Vec<IpAddr>,
    pub mac_addresses: Vec<MacAddress>,
    pub vendor: String,
    pub device_type: DeviceType,
    pub status: DeviceStatus,
    // Health gauges
    pub cpu_usage: f32,
    pub memory_usage: f32,
    pub temperature: f32,
    pub uptime_seconds: u64,
    // Topology metadata
    pub location: String,
    pub data_center: String,
    pub interfaces: Vec<InterfaceInfo>,
    pub vlans: Vec<u16>,
    pub routing_table: Vec<RouteEntry>,
    // Discovery provenance
    pub discovery_methods: Vec<String>,
    pub last_discovered: DateTime<Utc>,
}

impl NetworkDevice {
    pub fn new() -> NetworkDevice {
        NetworkDevice {
            id: uuid::Uuid::new_v4().to_string(),
            hostname: "".to_string(),
            ip_addresses: Vec::new(),
            mac_addresses: Vec::new(),
            vendor: "".to_string(),
            device_type: DeviceType::Unknown,
            status: DeviceStatus::Unknown,
            cpu_usage: 0.0,
            memory_usage: 0.0,
            temperature: 0.0,
            uptime_seconds: 0,
            location: "".to_string(),
            data_center: "".to_string(),
            interfaces: Vec::new(),
            vlans: Vec::new(),
            routing_table: Vec::new(),
            discovery_methods: Vec::new(),
            // Initialize the last discovered time to UNIX_EPOCH
            last_discovered: DateTime::from_timestamp(0, 0).unwrap(),
        }
    }

    pub fn primary_ip(&self) -> Option<IpAddr> {
        self.ip_addresses.first().copied()
    }

    // Combine scan rounds based on the hostname or a shared IP address
    pub fn merge_vec(devices: &mut Vec<NetworkDevice>, new_devices: &Vec<NetworkDevice>) {
        for new_device in new_devices {
            // If the new device information is not recent, skip it
            if new_device.last_discovered
                < Utc::now() - chrono::Duration::seconds(DEVICE_ACTIVITY_TIMEOUT)
            {
                trace!(
                    "Skipping device {} as its evidence is not recent",
                    new_device.hostname
                );
                continue;
            }

            let mut found = false;
            for device in devices.iter_mut() {
                // A device keeps one hostname but can surface several addresses,
                // so either key identifies a previously seen device
                let hostname_match = !new_device.hostname.is_empty()
                    && !device.hostname.is_empty()
                    && device.hostname == new_device.hostname;
                let ip_match = new_device
                    .ip_addresses
                    .iter()
                    .any(|ip| device.ip_addresses.contains(ip));
                if hostname_match || ip_match {
                    NetworkDevice::merge(device, new_device);
                    found = true;
                    break;
                }
            }

            if !found {
                devices.push(new_device.clone());
            }
        }
    }

    pub fn merge(device: &mut NetworkDevice, new_device: &NetworkDevice) {
        // Merge the IP addresses
        if !new_device.ip_addresses.is_empty() {
            device.ip_addresses.extend(new_device.ip_addresses.clone());
            device.ip_addresses.sort();
            device.ip_addresses.dedup();
        }

        // Merge the MAC addresses
        if !new_device.mac_addresses.is_empty() {
            device
                .mac_addresses
                .extend(new_device.mac_addresses.clone());
            device.mac_addresses.sort();
            device.mac_addresses.dedup();
        }

        // Allow fields to be updated when the new evidence carries them
        if !new_device.hostname.is_empty() {
            device.hostname.clone_from(&new_device.hostname);
        }
        if !new_device.vendor.is_empty() {
            device.vendor.clone_from(&new_device.vendor);
        }
        if !new_device.location.is_empty() {
            device.location.clone_from(&new_device.location);
        }
        if !new_device.data_center.is_empty() {
            device.data_center.clone_from(&new_device.data_center);
        }

        // Merge interfaces by name, latest evidence wins
        for new_iface in new_device.interfaces.iter() {
            let mut found = false;
            for existing in device.interfaces.iter_mut() {
                if existing.name == new_iface.name {
                    *existing = new_iface.clone();
                    found = true;
                    break;
                }
            }
            if !found {
                device.interfaces.push(new_iface.clone());
            }
        }

        // Merge VLANs and provenance
        if !new_device.vlans.is_empty() {
            device.vlans.extend(new_device.vlans.clone());
            device.vlans.sort();
            device.vlans.dedup();
        }
        if !new_device.discovery_methods.is_empty() {
            device
                .discovery_methods
                .extend(new_device.discovery_methods.clone());
            device.discovery_methods.sort();
            device.discovery_methods.dedup();
        }
        if !new_device.routing_table.is_empty() {
            device.routing_table.clone_from(&new_device.routing_table);
        }

        // Keep the freshest timestamp and gauges
        if device.last_discovered < new_device.last_discovered {
            device.last_discovered = new_device.last_discovered;
            device.cpu_usage = new_device.cpu_usage;
            device.memory_usage = new_device.memory_usage;
            device.temperature = new_device.temperature;
            device.uptime_seconds = new_device.uptime_seconds;
        }

        // Dynamic fields, use the latest if known
        if new_device.device_type != DeviceType::Unknown {
            device.device_type = new_device.device_type;
        }
        if new_device.status != DeviceStatus::Unknown {
            device.status = new_device.status;
        }
    }
}
