use crate::device_profiles::template_for;
use crate::synth_device::synth_device;
use crate::topology::NetworkTopology;
use crate::topology_connection::{LinkStatus, LinkType, NetworkConnection};
use crate::topology_device::{DeviceStatus, DeviceType, NetworkDevice};
use crate::topology_subnet::{Subnet, SubnetRole};
use rand::prelude::*;
use serde::{Deserialize, Serialize};
use std::net::Ipv4Addr;
use strum_macros::{Display, EnumIter, EnumString};
use tracing::{info, warn};

pub const DATA_CENTERS: [&str; 4] = ["dc1-paris", "dc2-frankfurt", "dc3-ashburn", "dc4-singapore"];

pub const LOCATIONS: [&str; 5] = [
    "bldg-a-floor1",
    "bldg-a-floor2",
    "bldg-b-floor1",
    "server-room-1",
    "wiring-closet-2",
];

#[derive(
    Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Display, EnumIter, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum SizeProfile {
    Small,
    Medium,
    Large,
}

impl SizeProfile {
    // Totals are fixed per profile so consecutive runs produce the same
    // device count, only statuses and gauge values vary
    pub fn total_devices(&self) -> usize {
        self.composition().iter().map(|(_, count)| count).sum()
    }

    pub fn access_subnet_count(&self) -> usize {
        match self {
            SizeProfile::Small => 2,
            SizeProfile::Medium => 4,
            SizeProfile::Large => 8,
        }
    }

    pub fn dmz_subnet_count(&self) -> usize {
        match self {
            SizeProfile::Small => 1,
            SizeProfile::Medium => 1,
            SizeProfile::Large => 2,
        }
    }

    fn composition(&self) -> Vec<(DeviceType, usize)> {
        match self {
            SizeProfile::Small => vec![
                (DeviceType::Router, 1),
                (DeviceType::Firewall, 1),
                (DeviceType::Switch, 2),
                (DeviceType::AccessPoint, 1),
                (DeviceType::ContainerHost, 1),
                (DeviceType::Server, 2),
                (DeviceType::Workstation, 4),
            ],
            SizeProfile::Medium => vec![
                (DeviceType::Router, 2),
                (DeviceType::Firewall, 1),
                (DeviceType::LoadBalancer, 1),
                (DeviceType::IdsIps, 1),
                (DeviceType::Switch, 4),
                (DeviceType::AccessPoint, 2),
                (DeviceType::Hypervisor, 1),
                (DeviceType::ContainerHost, 2),
                (DeviceType::Server, 6),
                (DeviceType::Workstation, 16),
            ],
            SizeProfile::Large => vec![
                (DeviceType::Router, 3),
                (DeviceType::Firewall, 2),
                (DeviceType::LoadBalancer, 2),
                (DeviceType::IdsIps, 1),
                (DeviceType::Switch, 8),
                (DeviceType::AccessPoint, 4),
                (DeviceType::Hypervisor, 2),
                (DeviceType::ContainerHost, 6),
                (DeviceType::Server, 16),
                (DeviceType::Workstation, 52),
            ],
        }
    }
}

struct SubnetPlan {
    subnet: Subnet,
    next_host: u8,
}

impl SubnetPlan {
    fn new(subnet: Subnet) -> Self {
        // .1 is reserved for the local switch or gateway
        Self {
            subnet,
            next_host: 10,
        }
    }

    fn base(&self) -> (u8, u8, u8) {
        // Fabricated subnets are always 10.x.y.0/24
        let net = self.subnet.network().unwrap_or("10.0.0.0/24".parse().unwrap());
        let octets = net.network().octets();
        (octets[0], octets[1], octets[2])
    }

    fn gateway_ip(&self) -> Ipv4Addr {
        let (a, b, c) = self.base();
        Ipv4Addr::new(a, b, c, 1)
    }

    fn allocate(&mut self) -> Ipv4Addr {
        let (a, b, c) = self.base();
        let host = self.next_host;
        self.next_host = self.next_host.wrapping_add(1);
        Ipv4Addr::new(a, b, c, host)
    }
}

fn link_bandwidth(link_type: LinkType) -> u32 {
    match link_type {
        LinkType::Fiber | LinkType::Trunk => 10000,
        LinkType::Ethernet => 1000,
        LinkType::Wifi => 300,
        LinkType::Vpn => 200,
    }
}

pub fn synth_link(
    rng: &mut StdRng,
    source: &NetworkDevice,
    target: &NetworkDevice,
    link_type: LinkType,
) -> NetworkConnection {
    let mut connection = NetworkConnection::new(&source.id, &target.id, link_type);
    connection.bandwidth_mbps = link_bandwidth(link_type);

    if source.status == DeviceStatus::Offline || target.status == DeviceStatus::Offline {
        connection.status = LinkStatus::Down;
        return connection;
    }

    if rng.gen_bool(0.08) {
        connection.status = LinkStatus::Degraded;
        connection.latency_ms = rng.gen_range(20.0..80.0);
        connection.packet_loss = rng.gen_range(1.0..8.0);
        connection.utilization = rng.gen_range(40.0..99.0);
    } else {
        connection.status = LinkStatus::Up;
        connection.latency_ms = match link_type {
            LinkType::Fiber | LinkType::Trunk => rng.gen_range(0.2..2.0),
            LinkType::Wifi => rng.gen_range(2.0..20.0),
            _ => rng.gen_range(0.5..8.0),
        };
        connection.packet_loss = rng.gen_range(0.0..0.5);
        connection.utilization = rng.gen_range(5.0..85.0);
    }
    connection
}

// Fabricate a full, internally consistent topology. This is the data source
// behind the dashboard when no sweep has run yet, it always succeeds and
// always returns a non-empty device list.
pub async fn generate_topology(size: SizeProfile, seed: Option<u64>) -> NetworkTopology {
    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let site = rng.gen_range(10..200u8);
    let data_center = DATA_CENTERS[rng.gen_range(0..DATA_CENTERS.len())];

    let mut core = SubnetPlan::new(Subnet::new(
        &format!("10.{}.0.0/24", site),
        10,
        LOCATIONS[3],
        SubnetRole::Core,
    ));
    let mut access: Vec<SubnetPlan> = (0..size.access_subnet_count())
        .map(|i| {
            SubnetPlan::new(Subnet::new(
                &format!("10.{}.{}.0/24", site, i + 1),
                100 + (i as u16 + 1),
                LOCATIONS[i % 3],
                SubnetRole::Access,
            ))
        })
        .collect();
    let mut dmz: Vec<SubnetPlan> = (0..size.dmz_subnet_count())
        .map(|i| {
            SubnetPlan::new(Subnet::new(
                &format!("10.{}.{}.0/24", site, 100 + i),
                200 + (i as u16),
                LOCATIONS[3 + i % 2],
                SubnetRole::Dmz,
            ))
        })
        .collect();

    let mut topology = NetworkTopology::new();

    // Fabricate the devices role by role, core gear first
    let mut core_ids: Vec<String> = Vec::new(); // routers
    let mut edge_ids: Vec<String> = Vec::new(); // firewalls and load balancers
    let mut switch_ids: Vec<String> = Vec::new();
    let mut switch_subnet: Vec<usize> = Vec::new();

    for (device_type, count) in size.composition() {
        let profile = match template_for(device_type).await {
            Some(profile) => profile,
            None => {
                warn!("No role template for {}, skipping", device_type);
                continue;
            }
        };
        for index in 1..=count {
            let device = match device_type {
                DeviceType::Router
                | DeviceType::Firewall
                | DeviceType::LoadBalancer
                | DeviceType::IdsIps => {
                    let ip = core.allocate();
                    synth_device(&mut rng, &profile, index, ip, &core.subnet, data_center)
                }
                DeviceType::Switch => {
                    let plan = &mut access[(index - 1) % size.access_subnet_count()];
                    let ip = plan.gateway_ip();
                    let subnet = plan.subnet.clone();
                    synth_device(&mut rng, &profile, index, ip, &subnet, data_center)
                }
                DeviceType::AccessPoint | DeviceType::Workstation => {
                    let plan = &mut access[(index - 1) % size.access_subnet_count()];
                    let ip = plan.allocate();
                    let subnet = plan.subnet.clone();
                    synth_device(&mut rng, &profile, index, ip, &subnet, data_center)
                }
                _ => {
                    let plan = &mut dmz[(index - 1) % size.dmz_subnet_count()];
                    let ip = plan.allocate();
                    let subnet = plan.subnet.clone();
                    synth_device(&mut rng, &profile, index, ip, &subnet, data_center)
                }
            };

            match device_type {
                DeviceType::Router => core_ids.push(device.id.clone()),
                DeviceType::Firewall | DeviceType::LoadBalancer | DeviceType::IdsIps => {
                    edge_ids.push(device.id.clone())
                }
                DeviceType::Switch => {
                    switch_ids.push(device.id.clone());
                    switch_subnet.push((index - 1) % size.access_subnet_count());
                }
                _ => {}
            }
            topology.devices.push(device);
        }
    }

    // Connection fabric: core routers form a full mesh, edge gear and access
    // switches uplink to the core round robin, endpoints fan out from their
    // subnet's switch
    let device_snapshot = topology.devices.clone();
    let by_id = |id: &String| device_snapshot.iter().find(|d| &d.id == id).unwrap();

    for i in 0..core_ids.len() {
        for j in (i + 1)..core_ids.len() {
            let link = synth_link(&mut rng, by_id(&core_ids[i]), by_id(&core_ids[j]), LinkType::Trunk);
            topology.connections.push(link);
        }
    }
    for (i, edge_id) in edge_ids.iter().enumerate() {
        let core_id = &core_ids[i % core_ids.len()];
        let link = synth_link(&mut rng, by_id(core_id), by_id(edge_id), LinkType::Fiber);
        topology.connections.push(link);
    }
    for (i, switch_id) in switch_ids.iter().enumerate() {
        let core_id = &core_ids[i % core_ids.len()];
        let link = synth_link(&mut rng, by_id(core_id), by_id(switch_id), LinkType::Fiber);
        topology.connections.push(link);
    }

    for device in device_snapshot.iter() {
        match device.device_type {
            DeviceType::AccessPoint | DeviceType::Workstation => {
                // Find the switch serving this device's subnet
                let subnet_index = access
                    .iter()
                    .position(|plan| device.primary_ip().map_or(false, |ip| plan.subnet.contains(&ip)));
                if let Some(subnet_index) = subnet_index {
                    if let Some(pos) = switch_subnet.iter().position(|s| *s == subnet_index) {
                        let link =
                            synth_link(&mut rng, by_id(&switch_ids[pos]), device, LinkType::Ethernet);
                        topology.connections.push(link);
                    }
                }
            }
            DeviceType::Server
            | DeviceType::Hypervisor
            | DeviceType::ContainerHost => {
                // DMZ hosts hang off the edge gear, or the core when a profile
                // carries no firewall
                let anchor = if !edge_ids.is_empty() {
                    &edge_ids[topology.connections.len() % edge_ids.len()]
                } else {
                    &core_ids[0]
                };
                let link = synth_link(&mut rng, by_id(anchor), device, LinkType::Ethernet);
                topology.connections.push(link);
            }
            _ => {}
        }
    }

    topology.subnets.push(core.subnet.clone());
    topology.subnets.extend(access.iter().map(|p| p.subnet.clone()));
    topology.subnets.extend(dmz.iter().map(|p| p.subnet.clone()));

    topology.refresh_stats();
    topology.stats.coverage_percent = 100.0;
    topology.stats.scan_duration_ms = rng.gen_range(800..4000);

    info!(
        "Fabricated {} topology: {} devices, {} connections, {} subnets",
        size,
        topology.devices.len(),
        topology.connections.len(),
        topology.subnets.len()
    );

    topology
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_generator_is_total_and_non_empty() {
        for size in [SizeProfile::Small, SizeProfile::Medium, SizeProfile::Large] {
            let topology = generate_topology(size, None).await;
            assert!(!topology.devices.is_empty());
            assert!(topology.validate().is_ok());
        }
    }

    #[tokio::test]
    async fn test_device_ids_unique() {
        let topology = generate_topology(SizeProfile::Large, Some(42)).await;
        let mut ids: Vec<&String> = topology.devices.iter().map(|d| &d.id).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), topology.devices.len());
    }

    #[tokio::test]
    async fn test_connection_endpoints_resolve() {
        let topology = generate_topology(SizeProfile::Medium, Some(7)).await;
        for connection in topology.connections.iter() {
            assert!(topology.device_by_id(&connection.source).is_some());
            assert!(topology.device_by_id(&connection.target).is_some());
        }
    }

    #[tokio::test]
    async fn test_stats_sum_to_totals() {
        let topology = generate_topology(SizeProfile::Medium, Some(99)).await;
        assert_eq!(topology.stats.total_devices, topology.devices.len());
        let type_sum: usize = topology.stats.devices_by_type.values().sum();
        assert_eq!(type_sum, topology.devices.len());
        let status_sum: usize = topology.stats.devices_by_status.values().sum();
        assert_eq!(status_sum, topology.devices.len());
    }

    #[tokio::test]
    async fn test_totals_fixed_across_runs() {
        // Statuses and gauges vary run to run, totals do not
        let first = generate_topology(SizeProfile::Medium, Some(1)).await;
        let second = generate_topology(SizeProfile::Medium, Some(2)).await;
        assert_eq!(first.devices.len(), second.devices.len());
        assert_eq!(first.devices.len(), SizeProfile::Medium.total_devices());
    }

    #[tokio::test]
    async fn test_every_endpoint_is_linked() {
        let topology = generate_topology(SizeProfile::Small, Some(5)).await;
        for device in topology.devices.iter() {
            assert!(
                !topology.connections_of(&device.id).is_empty(),
                "device {} has no connections",
                device.hostname
            );
        }
    }
}
