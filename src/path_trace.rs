use crate::topology::NetworkTopology;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use tracing::debug;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct PathHop {
    pub device_id: String,
    pub hostname: String,
    // Latency of the link into this hop, zero for the starting point
    pub latency_ms: f32,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct PathTrace {
    pub found: bool,
    pub hops: Vec<PathHop>,
    pub total_latency_ms: f32,
}

impl PathTrace {
    fn not_found() -> PathTrace {
        PathTrace {
            found: false,
            hops: Vec::new(),
            total_latency_ms: 0.0,
        }
    }
}

// Breadth first search over the connection graph. Links that are down are
// skipped, ties resolve in connection insertion order so repeated traces
// over the same snapshot return the same route.
pub fn trace_path(topology: &NetworkTopology, source_id: &str, target_id: &str) -> PathTrace {
    if topology.device_by_id(source_id).is_none() || topology.device_by_id(target_id).is_none() {
        debug!("Path trace with unknown endpoint {} -> {}", source_id, target_id);
        return PathTrace::not_found();
    }

    let mut adjacency: HashMap<&str, Vec<(&str, f32)>> = HashMap::new();
    for connection in topology.connections.iter().filter(|c| c.is_usable()) {
        adjacency
            .entry(connection.source.as_str())
            .or_default()
            .push((connection.target.as_str(), connection.latency_ms));
        adjacency
            .entry(connection.target.as_str())
            .or_default()
            .push((connection.source.as_str(), connection.latency_ms));
    }

    let mut visited: HashMap<&str, (&str, f32)> = HashMap::new();
    let mut queue: VecDeque<&str> = VecDeque::new();
    visited.insert(source_id, (source_id, 0.0));
    queue.push_back(source_id);

    while let Some(current) = queue.pop_front() {
        if current == target_id {
            break;
        }
        if let Some(neighbors) = adjacency.get(current) {
            for (neighbor, latency) in neighbors {
                if !visited.contains_key(neighbor) {
                    visited.insert(neighbor, (current, *latency));
                    queue.push_back(neighbor);
                }
            }
        }
    }

    if !visited.contains_key(target_id) {
        debug!("No path between {} and {}", source_id, target_id);
        return PathTrace::not_found();
    }

    // Walk the parent chain back to the source
    let mut reversed: Vec<(&str, f32)> = Vec::new();
    let mut cursor = target_id;
    loop {
        let (parent, latency) = visited[cursor];
        reversed.push((cursor, latency));
        if cursor == source_id {
            break;
        }
        cursor = parent;
    }
    reversed.reverse();

    let hops: Vec<PathHop> = reversed
        .iter()
        .map(|(device_id, latency)| PathHop {
            device_id: device_id.to_string(),
            hostname: topology
                .device_by_id(device_id)
                .map(|d| d.hostname.clone())
                .unwrap_or_default(),
            latency_ms: *latency,
        })
        .collect();
    let total_latency_ms = hops.iter().map(|hop| hop.latency_ms).sum();

    PathTrace {
        found: true,
        hops,
        total_latency_ms,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::synth_topology::{generate_topology, SizeProfile};
    use crate::topology_connection::{LinkStatus, LinkType, NetworkConnection};
    use crate::topology_device::NetworkDevice;

    fn chain_topology(hostnames: &[&str]) -> NetworkTopology {
        let mut topology = NetworkTopology::new();
        for hostname in hostnames {
            let mut device = NetworkDevice::new();
            device.hostname = hostname.to_string();
            topology.devices.push(device);
        }
        for pair in 0..hostnames.len().saturating_sub(1) {
            let source = topology.devices[pair].id.clone();
            let target = topology.devices[pair + 1].id.clone();
            let mut connection = NetworkConnection::new(&source, &target, LinkType::Ethernet);
            connection.latency_ms = 2.0;
            topology.connections.push(connection);
        }
        topology.refresh_stats();
        topology
    }

    #[test]
    fn test_path_endpoints_and_latency() {
        let topology = chain_topology(&["a", "b", "c", "d"]);
        let source = topology.devices[0].id.clone();
        let target = topology.devices[3].id.clone();

        let trace = trace_path(&topology, &source, &target);
        assert!(trace.found);
        assert_eq!(trace.hops.first().unwrap().device_id, source);
        assert_eq!(trace.hops.last().unwrap().device_id, target);
        assert_eq!(trace.hops.len(), 4);
        assert!((trace.total_latency_ms - 6.0).abs() < 0.001);
    }

    #[test]
    fn test_disconnected_returns_failed_trace() {
        let mut topology = chain_topology(&["a", "b"]);
        let mut island = NetworkDevice::new();
        island.hostname = "island".to_string();
        let island_id = island.id.clone();
        topology.devices.push(island);
        topology.refresh_stats();

        let source = topology.devices[0].id.clone();
        let trace = trace_path(&topology, &source, &island_id);
        assert!(!trace.found);
        assert!(trace.hops.is_empty());
    }

    #[test]
    fn test_down_link_is_not_crossed() {
        let mut topology = chain_topology(&["a", "b", "c"]);
        topology.connections[1].status = LinkStatus::Down;
        let source = topology.devices[0].id.clone();
        let target = topology.devices[2].id.clone();

        let trace = trace_path(&topology, &source, &target);
        assert!(!trace.found);
    }

    #[test]
    fn test_source_equals_target() {
        let topology = chain_topology(&["a", "b"]);
        let source = topology.devices[0].id.clone();
        let trace = trace_path(&topology, &source, &source);
        assert!(trace.found);
        assert_eq!(trace.hops.len(), 1);
        assert_eq!(trace.total_latency_ms, 0.0);
    }

    #[test]
    fn test_unknown_endpoint() {
        let topology = chain_topology(&["a", "b"]);
        let source = topology.devices[0].id.clone();
        let trace = trace_path(&topology, &source, "missing");
        assert!(!trace.found);
    }

    #[tokio::test]
    async fn test_fabricated_topology_traces_hold_endpoint_property() {
        let topology = generate_topology(SizeProfile::Small, Some(12)).await;
        let source = topology.devices.first().unwrap().id.clone();
        for device in topology.devices.iter() {
            let trace = trace_path(&topology, &source, &device.id);
            if trace.found {
                assert_eq!(trace.hops.first().unwrap().device_id, source);
                assert_eq!(trace.hops.last().unwrap().device_id, device.id);
            }
        }
    }
}
