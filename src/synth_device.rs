use crate::device_profiles::RoleProfile;
use crate::topology_device::{DeviceStatus, DeviceType, InterfaceInfo, NetworkDevice, RouteEntry};
use crate::topology_subnet::Subnet;
use chrono::Utc;
use eui48::MacAddress;
use rand::prelude::*;
use std::net::{IpAddr, Ipv4Addr};

// OUI pool used for fabricated MAC addresses, one per vendor family
const OUI_POOL: [[u8; 3]; 6] = [
    [0x00, 0x1B, 0x54], // Cisco
    [0xF8, 0xBC, 0x12], // Dell
    [0x3C, 0xA8, 0x2A], // HPE
    [0x00, 0x0C, 0x29], // VMware
    [0xFC, 0xEC, 0xDA], // Ubiquiti
    [0x28, 0xD2, 0x44], // Lenovo
];

pub fn synth_mac(rng: &mut StdRng) -> MacAddress {
    let oui = OUI_POOL[rng.gen_range(0..OUI_POOL.len())];
    MacAddress::new([
        oui[0],
        oui[1],
        oui[2],
        rng.gen::<u8>(),
        rng.gen::<u8>(),
        rng.gen::<u8>(),
    ])
}

fn synth_status(rng: &mut StdRng) -> DeviceStatus {
    let draw: f64 = rng.gen();
    if draw < 0.80 {
        DeviceStatus::Online
    } else if draw < 0.92 {
        DeviceStatus::Warning
    } else if draw < 0.98 {
        DeviceStatus::Offline
    } else {
        DeviceStatus::Unknown
    }
}

fn interface_prefix(device_type: DeviceType) -> (&'static str, usize, u32) {
    // (name prefix, port count, speed in Mbps)
    match device_type {
        DeviceType::Router => ("ge-0/0/", 4, 10000),
        DeviceType::Switch => ("Gi1/0/", 8, 1000),
        DeviceType::Firewall => ("ethernet1/", 4, 10000),
        DeviceType::LoadBalancer => ("1.", 4, 10000),
        DeviceType::AccessPoint => ("wifi", 2, 1000),
        DeviceType::IdsIps => ("mon", 2, 10000),
        DeviceType::Hypervisor => ("vmnic", 4, 25000),
        DeviceType::ContainerHost => ("ens", 2, 10000),
        _ => ("eth", 1, 1000),
    }
}

// Fabricate one internally consistent device from a role template. The
// caller owns address allocation so ids and IPs never collide.
pub fn synth_device(
    rng: &mut StdRng,
    profile: &RoleProfile,
    index: usize,
    ip: Ipv4Addr,
    subnet: &Subnet,
    data_center: &str,
) -> NetworkDevice {
    let mut device = NetworkDevice::new();

    let prefix = &profile.hostname_prefixes[rng.gen_range(0..profile.hostname_prefixes.len())];
    device.hostname = format!("{}-{:02}", prefix, index);
    device.vendor = profile.vendors[rng.gen_range(0..profile.vendors.len())].clone();
    device.device_type = profile.device_type;
    device.status = synth_status(rng);

    device.ip_addresses.push(IpAddr::V4(ip));
    device.mac_addresses.push(synth_mac(rng));

    device.location = subnet.location.clone();
    device.data_center = data_center.to_string();
    device.vlans.push(subnet.vlan);
    if device.device_type == DeviceType::Switch {
        // Trunk ports carry a handful of extra VLANs
        for _ in 0..rng.gen_range(1..4) {
            device.vlans.push(rng.gen_range(100..400));
        }
        device.vlans.sort();
        device.vlans.dedup();
    }

    match device.status {
        DeviceStatus::Offline => {
            device.cpu_usage = 0.0;
            device.memory_usage = 0.0;
            device.temperature = 0.0;
            device.uptime_seconds = 0;
        }
        DeviceStatus::Warning => {
            device.cpu_usage = rng.gen_range(75.0..99.0);
            device.memory_usage = rng.gen_range(70.0..97.0);
            device.temperature = rng.gen_range(60.0..85.0);
            device.uptime_seconds = rng.gen_range(3_600..86_400 * 30);
        }
        _ => {
            // Infrastructure runs cooler than end hosts in the fabricated fleet
            let ceiling = if device.device_type.is_infrastructure() {
                55.0
            } else {
                75.0
            };
            device.cpu_usage = rng.gen_range(2.0..ceiling);
            device.memory_usage = rng.gen_range(10.0..ceiling + 15.0);
            device.temperature = rng.gen_range(35.0..60.0);
            device.uptime_seconds = rng.gen_range(86_400..86_400 * 365);
        }
    }

    let (iface_prefix, port_count, speed_mbps) = interface_prefix(device.device_type);
    for port in 0..port_count {
        device.interfaces.push(InterfaceInfo {
            name: format!("{}{}", iface_prefix, port),
            ipv4: if port == 0 { Some(IpAddr::V4(ip)) } else { None },
            mac: synth_mac(rng),
            speed_mbps,
            up: device.status != DeviceStatus::Offline && rng.gen_bool(0.9),
        });
    }

    // Only gateways carry a routing table worth showing
    if matches!(
        device.device_type,
        DeviceType::Router | DeviceType::Firewall
    ) {
        device.routing_table.push(RouteEntry {
            destination: "0.0.0.0/0".to_string(),
            next_hop: IpAddr::V4(Ipv4Addr::new(ip.octets()[0], ip.octets()[1], 0, 1)),
            interface: format!("{}0", iface_prefix),
            metric: 1,
        });
        device.routing_table.push(RouteEntry {
            destination: subnet.cidr.clone(),
            next_hop: IpAddr::V4(ip),
            interface: format!("{}1", iface_prefix),
            metric: 0,
        });
    }

    device.discovery_methods.push("inventory".to_string());
    device.last_discovered = Utc::now();

    device
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device_profiles::template_for;
    use crate::topology_subnet::SubnetRole;

    async fn synth_one(device_type: DeviceType, seed: u64) -> NetworkDevice {
        let profile = template_for(device_type).await.unwrap();
        let subnet = Subnet::new("10.20.0.0/24", 120, "paris-dc1", SubnetRole::Access);
        let mut rng = StdRng::seed_from_u64(seed);
        synth_device(
            &mut rng,
            &profile,
            1,
            Ipv4Addr::new(10, 20, 0, 10),
            &subnet,
            "dc1",
        )
    }

    #[tokio::test]
    async fn test_device_shape_is_consistent() {
        let device = synth_one(DeviceType::Router, 7).await;
        assert_eq!(device.device_type, DeviceType::Router);
        assert!(!device.hostname.is_empty());
        assert_eq!(device.ip_addresses.len(), 1);
        assert_eq!(device.interfaces.len(), 4);
        assert!(!device.routing_table.is_empty());
        assert_eq!(device.vlans, vec![120]);
        assert_eq!(device.location, "paris-dc1");
    }

    #[tokio::test]
    async fn test_offline_device_has_zeroed_gauges() {
        // Seeds are cheap, walk until the status draw lands on offline
        for seed in 0..200 {
            let device = synth_one(DeviceType::Workstation, seed).await;
            if device.status == DeviceStatus::Offline {
                assert_eq!(device.cpu_usage, 0.0);
                assert_eq!(device.uptime_seconds, 0);
                return;
            }
        }
        panic!("no offline device in 200 seeded draws");
    }

    #[tokio::test]
    async fn test_workstation_has_no_routes() {
        let device = synth_one(DeviceType::Workstation, 3).await;
        assert!(device.routing_table.is_empty());
    }

    #[tokio::test]
    async fn test_same_seed_same_hostname() {
        let first = synth_one(DeviceType::Server, 11).await;
        let second = synth_one(DeviceType::Server, 11).await;
        assert_eq!(first.hostname, second.hostname);
        assert_eq!(first.mac_addresses, second.mac_addresses);
    }
}
