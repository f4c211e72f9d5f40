use crate::device_profiles::{classify_device, template_for, RoleProfile};
use crate::discovery_config::{DiscoveryConfig, DiscoveryProtocol};
use crate::probe_arp::arp_lookup;
use crate::probe_icmp::ping_host;
use crate::probe_neighbors::{neighbor_table, NeighborEntry};
use crate::probe_snmp::snmp_walk_system;
use crate::probe_ssh::{run_version_command, SshError};
use crate::synth_device::synth_mac;
use crate::synth_topology::{synth_link, DATA_CENTERS, LOCATIONS};
use crate::topology::NetworkTopology;
use crate::topology_connection::LinkType;
use crate::topology_device::{DeviceStatus, DeviceType, NetworkDevice};
use crate::topology_subnet::{Subnet, SubnetRole};
use chrono::Utc;
use futures_util::future::join_all;
use rand::prelude::*;
use sorted_vec::SortedVec;
use std::collections::HashMap;
use std::net::{IpAddr, Ipv4Addr};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Instant;
use strum::IntoEnumIterator;
use thiserror::Error;
use tracing::{debug, info, warn};

// A whole subnet drops out of a sweep at this rate, producing partial scans
const SUBNET_OUTAGE_PROBABILITY: f64 = 0.10;

static SCAN_CANCELLED: AtomicBool = AtomicBool::new(false);
static SCAN_PROGRESS: AtomicUsize = AtomicUsize::new(0);

#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error("invalid discovery configuration: {0}")]
    InvalidConfig(String),
    #[error("scan cancelled")]
    Cancelled,
    #[error("all {0} configured subnets were unreachable")]
    AllSubnetsUnreachable(usize),
}

// Flags the running sweep, it stops at the next batch boundary
pub fn cancel_scan() {
    SCAN_CANCELLED.store(true, Ordering::SeqCst);
}

pub fn scan_progress_percent() -> usize {
    SCAN_PROGRESS.load(Ordering::SeqCst)
}

struct HostPlan {
    ip: Ipv4Addr,
    alive: bool,
    profile: Option<RoleProfile>,
    subnet_index: usize,
    seed: u64,
}

struct HostReport {
    device: Option<NetworkDevice>,
    responded: bool,
    credential_failure: bool,
}

pub struct DiscoveryEngine {
    config: DiscoveryConfig,
    seed: Option<u64>,
}

impl DiscoveryEngine {
    pub fn new(config: DiscoveryConfig) -> DiscoveryEngine {
        DiscoveryEngine { config, seed: None }
    }

    // Pinned randomness, used by tests and the demo mode of the shell
    pub fn with_seed(config: DiscoveryConfig, seed: u64) -> DiscoveryEngine {
        DiscoveryEngine {
            config,
            seed: Some(seed),
        }
    }

    fn enabled(&self, protocol: DiscoveryProtocol) -> bool {
        self.config.protocols.contains(&protocol)
    }

    // Weighted endpoint role draw for a fabricated alive host
    fn endpoint_role(rng: &mut StdRng) -> DeviceType {
        let draw: f64 = rng.gen();
        if draw < 0.55 {
            DeviceType::Workstation
        } else if draw < 0.75 {
            DeviceType::Server
        } else if draw < 0.85 {
            DeviceType::ContainerHost
        } else if draw < 0.92 {
            DeviceType::AccessPoint
        } else if draw < 0.97 {
            DeviceType::Hypervisor
        } else {
            DeviceType::LoadBalancer
        }
    }

    // Sweep the configured ranges and assemble a topology snapshot. Subnets
    // can drop out wholesale and single hosts can fail any probe, the
    // snapshot carries those as partial results rather than an error.
    pub async fn sweep(&self) -> Result<NetworkTopology, DiscoveryError> {
        self.config
            .validate()
            .map_err(|e| DiscoveryError::InvalidConfig(e.to_string()))?;

        if SCAN_CANCELLED.swap(false, Ordering::SeqCst) {
            return Err(DiscoveryError::Cancelled);
        }

        let start = Instant::now();
        SCAN_PROGRESS.store(0, Ordering::SeqCst);

        let mut rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let base_seed: u64 = rng.gen();

        // Role templates are cloned out once, probes fabricate evidence from them
        let mut templates: HashMap<DeviceType, RoleProfile> = HashMap::new();
        for device_type in DeviceType::iter() {
            if let Some(profile) = template_for(device_type).await {
                templates.insert(device_type, profile);
            }
        }

        let data_center = DATA_CENTERS[rng.gen_range(0..DATA_CENTERS.len())];
        let mut subnets: Vec<Subnet> = Vec::new();
        let mut unreachable: Vec<String> = Vec::new();
        let mut plans: Vec<HostPlan> = Vec::new();
        let mut swept_addresses = 0usize;

        for (subnet_index, range) in self.config.ranges.iter().enumerate() {
            let cidr = range.to_string();
            if rng.gen_bool(SUBNET_OUTAGE_PROBABILITY) {
                warn!("Subnet {} is unreachable, recording a partial scan", cidr);
                unreachable.push(cidr);
                continue;
            }

            let role = if subnet_index == 0 {
                SubnetRole::Core
            } else {
                SubnetRole::Access
            };
            let vlan = if subnet_index == 0 {
                10
            } else {
                100 + subnet_index as u16
            };
            subnets.push(Subnet::new(
                &cidr,
                vlan,
                LOCATIONS[subnet_index % LOCATIONS.len()],
                role,
            ));

            let hosts = self.config.target_hosts(range);
            swept_addresses += hosts.len();

            // Fabricated occupancy: a handful of hosts per subnet are alive
            let alive_count = rng.gen_range(4..=12usize.min(hosts.len().max(4)));
            let mut alive: Vec<Ipv4Addr> = hosts
                .choose_multiple(&mut rng, alive_count.min(hosts.len()))
                .copied()
                .collect();
            alive.sort();

            for (position, ip) in alive.iter().enumerate() {
                // The first alive host anchors the subnet as its gateway gear
                let role = if position == 0 {
                    if subnet_index == 0 {
                        DeviceType::Router
                    } else {
                        DeviceType::Switch
                    }
                } else {
                    Self::endpoint_role(&mut rng)
                };
                plans.push(HostPlan {
                    ip: *ip,
                    alive: true,
                    profile: templates.get(&role).cloned(),
                    subnet_index: subnets.len() - 1,
                    seed: base_seed.wrapping_add(u32::from(*ip) as u64),
                });
            }
            for ip in hosts.iter().filter(|ip| !alive.contains(*ip)) {
                plans.push(HostPlan {
                    ip: *ip,
                    alive: false,
                    profile: None,
                    subnet_index: subnets.len() - 1,
                    seed: base_seed.wrapping_add(u32::from(*ip) as u64),
                });
            }
        }

        if subnets.is_empty() {
            return Err(DiscoveryError::AllSubnetsUnreachable(
                self.config.ranges.len(),
            ));
        }

        // Batched probing, a window of hosts in flight at a time
        let total = plans.len().max(1);
        let mut processed = 0usize;
        let mut responded = 0usize;
        let mut credential_failures = 0usize;
        let mut devices: Vec<NetworkDevice> = Vec::new();
        let mut subnet_members: Vec<Vec<String>> = vec![Vec::new(); subnets.len()];

        for batch in plans.chunks(self.config.batch_size) {
            if SCAN_CANCELLED.swap(false, Ordering::SeqCst) {
                info!("Sweep cancelled after {} of {} hosts", processed, total);
                return Err(DiscoveryError::Cancelled);
            }

            let reports = join_all(batch.iter().map(|plan| self.probe_host(plan))).await;
            for (plan, report) in batch.iter().zip(reports) {
                if report.responded {
                    responded += 1;
                }
                if report.credential_failure {
                    credential_failures += 1;
                }
                if let Some(device) = report.device {
                    subnet_members[plan.subnet_index].push(device.hostname.clone());
                    NetworkDevice::merge_vec(&mut devices, &vec![device]);
                }
            }

            processed += batch.len();
            SCAN_PROGRESS.store(processed * 100 / total, Ordering::SeqCst);
        }

        let mut topology = NetworkTopology::new();
        topology.devices = devices;
        topology.subnets = subnets;
        self.map_connections(&mut rng, &mut topology, &subnet_members);

        for device in topology.devices.iter_mut() {
            device.data_center = data_center.to_string();
        }

        topology.partial = !unreachable.is_empty();
        topology.refresh_stats();
        topology.stats.unreachable_subnets = unreachable;
        topology.stats.credential_failures = credential_failures;
        topology.stats.coverage_percent = if swept_addresses > 0 {
            responded as f32 * 100.0 / swept_addresses as f32
        } else {
            0.0
        };
        topology.stats.scan_duration_ms = start.elapsed().as_millis() as u64;
        SCAN_PROGRESS.store(100, Ordering::SeqCst);

        info!(
            "Sweep complete: {} devices, {} connections, coverage {:.1}%, {} credential failures",
            topology.stats.total_devices,
            topology.stats.total_connections,
            topology.stats.coverage_percent,
            topology.stats.credential_failures
        );

        Ok(topology)
    }

    // Probe one address with every enabled protocol and fold the evidence
    // into a device record. Each host owns a derived rng so concurrent
    // batches stay deterministic under a pinned seed.
    async fn probe_host(&self, plan: &HostPlan) -> HostReport {
        let mut rng = StdRng::seed_from_u64(plan.seed);
        let mut report = HostReport {
            device: None,
            responded: false,
            credential_failure: false,
        };

        let mut methods: SortedVec<String> = SortedVec::new();

        let ping_ok = if self.enabled(DiscoveryProtocol::Ping) {
            match ping_host(&mut rng, plan.ip, plan.alive, self.config.probe_delay_ms).await {
                Ok(outcome) => {
                    debug!("{} answered in {:.2} ms", plan.ip, outcome.rtt_ms);
                    methods.push(DiscoveryProtocol::Ping.to_string());
                    true
                }
                Err(_) => false,
            }
        } else {
            plan.alive
        };

        // The neighbor cache can still hold a host that lost the ping draw
        let mut mac = None;
        if plan.alive && self.enabled(DiscoveryProtocol::Arp) {
            let fabricated = synth_mac(&mut rng);
            if let Ok(resolved) = arp_lookup(&mut rng, plan.ip, &fabricated) {
                methods.push(DiscoveryProtocol::Arp.to_string());
                mac = Some(resolved);
            }
        }

        if !ping_ok && mac.is_none() {
            return report;
        }
        let Some(profile) = plan.profile.as_ref() else {
            return report;
        };
        report.responded = true;

        let subnet_tag = plan.subnet_index + 1;
        let prefix = &profile.hostname_prefixes[rng.gen_range(0..profile.hostname_prefixes.len())];
        let hostname = format!("{}-{}-{}", prefix, subnet_tag, plan.ip.octets()[3]);
        let sys_descr = &profile.sys_descrs[rng.gen_range(0..profile.sys_descrs.len())];
        let vendor = &profile.vendors[rng.gen_range(0..profile.vendors.len())];
        let location = LOCATIONS[plan.subnet_index % LOCATIONS.len()];
        let uptime_seconds: u64 = rng.gen_range(3_600..86_400 * 365);

        // Infrastructure and server roles usually expose management planes,
        // end-user machines rarely do
        let managed = profile.device_type.is_infrastructure()
            || matches!(
                profile.device_type,
                DeviceType::Server | DeviceType::Hypervisor | DeviceType::ContainerHost
            );
        let has_agent = rng.gen_bool(if managed { 0.9 } else { 0.1 });

        let mut evidence_sys_descr = String::new();
        let mut evidence_uptime = None;

        if self.enabled(DiscoveryProtocol::Snmp) {
            match snmp_walk_system(
                &mut rng,
                plan.ip,
                has_agent,
                &hostname,
                sys_descr,
                location,
                uptime_seconds,
            ) {
                Ok(info) => {
                    methods.push(DiscoveryProtocol::Snmp.to_string());
                    evidence_uptime = Some(info.uptime_seconds);
                    evidence_sys_descr = info.sys_descr;
                }
                Err(e) => debug!("SNMP gave nothing for {}: {}", plan.ip, e),
            }
        }

        if self.enabled(DiscoveryProtocol::Ssh) {
            let ssh_authorized = managed && rng.gen_bool(0.8);
            match run_version_command(
                &mut rng,
                plan.ip,
                "netops",
                ssh_authorized,
                sys_descr,
                uptime_seconds,
            ) {
                Ok(evidence) => {
                    methods.push(DiscoveryProtocol::Ssh.to_string());
                    if evidence_sys_descr.is_empty() {
                        evidence_sys_descr = evidence.sys_descr;
                    }
                    evidence_uptime.get_or_insert(evidence.uptime_seconds);
                }
                Err(SshError::AuthFailed { .. }) => {
                    report.credential_failure = true;
                }
                Err(e) => debug!("SSH gave nothing for {}: {}", plan.ip, e),
            }
        }

        // Hypervisors and container hosts also answer on their management API
        if self.enabled(DiscoveryProtocol::Api)
            && matches!(
                profile.device_type,
                DeviceType::Hypervisor | DeviceType::ContainerHost
            )
            && rng.gen_bool(0.7)
        {
            methods.push(DiscoveryProtocol::Api.to_string());
            if evidence_sys_descr.is_empty() {
                evidence_sys_descr = sys_descr.clone();
            }
        }

        let device_type = classify_device(
            vendor,
            &hostname,
            &profile.services,
            &evidence_sys_descr,
        )
        .await;

        let mut device = NetworkDevice::new();
        device.hostname = hostname;
        device.ip_addresses.push(IpAddr::V4(plan.ip));
        if let Some(mac) = mac {
            device.mac_addresses.push(mac);
        }
        if !evidence_sys_descr.is_empty() {
            device.vendor = vendor.clone();
        }
        device.device_type = device_type;
        device.status = if !ping_ok {
            // Seen in a neighbor cache only
            DeviceStatus::Unknown
        } else {
            device.cpu_usage = rng.gen_range(2.0..97.0);
            device.memory_usage = rng.gen_range(10.0..95.0);
            device.temperature = rng.gen_range(35.0..80.0);
            if device.cpu_usage >= 90.0 || device.temperature >= 75.0 {
                DeviceStatus::Warning
            } else {
                DeviceStatus::Online
            }
        };
        device.uptime_seconds = evidence_uptime.unwrap_or(uptime_seconds);
        device.location = location.to_string();
        device.discovery_methods = methods.to_vec();
        device.last_discovered = Utc::now();

        report.device = Some(device);
        report
    }

    // Build edges from simulated CDP/LLDP tables. Each subnet's gateway gear
    // advertises its endpoints plus one uplink into the first subnet, parsing
    // the fabricated tables is what actually creates the connections.
    fn map_connections(
        &self,
        rng: &mut StdRng,
        topology: &mut NetworkTopology,
        subnet_members: &[Vec<String>],
    ) {
        if !self.enabled(DiscoveryProtocol::Cdp) && !self.enabled(DiscoveryProtocol::Lldp) {
            return;
        }

        let id_by_hostname: HashMap<String, String> = topology
            .devices
            .iter()
            .map(|d| (d.hostname.clone(), d.id.clone()))
            .collect();

        let capability = |device_type: DeviceType| match device_type {
            DeviceType::Router | DeviceType::Firewall => "R",
            DeviceType::Switch => "B",
            DeviceType::AccessPoint => "W",
            _ => "S",
        };

        let anchor_of = |members: &Vec<String>| -> Option<String> {
            members
                .iter()
                .find(|hostname| {
                    topology
                        .device_by_hostname(hostname)
                        .map_or(false, |d| d.device_type.is_infrastructure())
                })
                .or_else(|| members.first())
                .cloned()
        };

        let core_anchor = subnet_members.iter().find_map(|members| anchor_of(members));

        let mut edges: Vec<(String, String, LinkType)> = Vec::new();
        for (subnet_index, members) in subnet_members.iter().enumerate() {
            let Some(local_anchor) = anchor_of(members) else {
                continue;
            };

            let mut planned: Vec<NeighborEntry> = Vec::new();
            for (port, hostname) in members.iter().filter(|h| **h != local_anchor).enumerate() {
                let Some(peer) = topology.device_by_hostname(hostname) else {
                    continue;
                };
                planned.push(NeighborEntry {
                    device_id: hostname.clone(),
                    local_port: format!("Gi1/0/{}", port + 1),
                    capability: capability(peer.device_type).to_string(),
                    remote_port: "eth0".to_string(),
                });
            }
            if subnet_index > 0 {
                if let Some(core) = core_anchor.as_ref() {
                    if *core != local_anchor {
                        planned.push(NeighborEntry {
                            device_id: core.clone(),
                            local_port: "Gi1/0/48".to_string(),
                            capability: "R".to_string(),
                            remote_port: format!("ge-0/0/{}", subnet_index),
                        });
                    }
                }
            }

            match neighbor_table(rng, &local_anchor, &planned) {
                Ok(advertised) => {
                    for entry in advertised {
                        let link_type = if entry.capability == "R" || entry.capability == "B" {
                            LinkType::Trunk
                        } else {
                            LinkType::Ethernet
                        };
                        edges.push((local_anchor.clone(), entry.device_id, link_type));
                    }
                }
                Err(e) => warn!("Neighbor query failed on {}: {}", local_anchor, e),
            }
        }

        for (source_hostname, target_hostname, link_type) in edges {
            let (Some(source_id), Some(target_id)) = (
                id_by_hostname.get(&source_hostname),
                id_by_hostname.get(&target_hostname),
            ) else {
                continue;
            };
            let source = topology.device_by_id(source_id).cloned();
            let target = topology.device_by_id(target_id).cloned();
            if let (Some(source), Some(target)) = (source, target) {
                let link = synth_link(rng, &source, &target, link_type);
                topology.connections.push(link);
            }
        }
    }
}
