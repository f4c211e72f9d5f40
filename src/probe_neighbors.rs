use anyhow::Result;
use rand::prelude::*;
use tracing::trace;

// An adjacency occasionally misses a hold-time refresh and drops out
const NEIGHBOR_MISS_PROBABILITY: f64 = 0.05;

#[derive(Debug, Clone, PartialEq)]
pub struct NeighborEntry {
    pub device_id: String,
    pub local_port: String,
    pub capability: String,
    pub remote_port: String,
}

// Fabricate a `show lldp neighbors` style table
fn synth_neighbor_table(neighbors: &[NeighborEntry]) -> String {
    let mut output = String::from(
        "Capability codes: (R) Router, (B) Bridge, (W) WLAN-AP, (S) Station\n\
         Device ID            Local Intf      Hold-time  Capability  Port ID\n",
    );
    for neighbor in neighbors {
        output.push_str(&format!(
            "{:<20} {:<15} 120        {:<11} {}\n",
            neighbor.device_id, neighbor.local_port, neighbor.capability, neighbor.remote_port
        ));
    }
    output
}

fn parse_neighbor_table(output: &str) -> Vec<NeighborEntry> {
    let mut entries = Vec::new();
    let mut in_rows = false;
    for line in output.lines() {
        if line.starts_with("Device ID") {
            in_rows = true;
            continue;
        }
        if !in_rows {
            continue;
        }
        let cols: Vec<&str> = line.split_whitespace().collect();
        // [Device ID, Local Intf, Hold-time, Capability, Port ID]
        if cols.len() != 5 {
            continue;
        }
        entries.push(NeighborEntry {
            device_id: cols[0].to_string(),
            local_port: cols[1].to_string(),
            capability: cols[3].to_string(),
            remote_port: cols[4].to_string(),
        });
    }
    entries
}

// Simulated CDP/LLDP neighbor query. The planned adjacencies are rendered
// as a neighbor table and parsed back, entries can drop out the way a
// stale hold-time drops a real one.
pub fn neighbor_table(
    rng: &mut StdRng,
    local_hostname: &str,
    planned: &[NeighborEntry],
) -> Result<Vec<NeighborEntry>> {
    let advertised: Vec<NeighborEntry> = planned
        .iter()
        .filter(|_| !rng.gen_bool(NEIGHBOR_MISS_PROBABILITY))
        .cloned()
        .collect();

    let output = synth_neighbor_table(&advertised);
    trace!(
        "{} advertises {} of {} adjacencies",
        local_hostname,
        advertised.len(),
        planned.len()
    );

    Ok(parse_neighbor_table(&output))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn planned() -> Vec<NeighborEntry> {
        vec![
            NeighborEntry {
                device_id: "acc-sw-01".to_string(),
                local_port: "ge-0/0/1".to_string(),
                capability: "B".to_string(),
                remote_port: "Gi1/0/24".to_string(),
            },
            NeighborEntry {
                device_id: "edge-fw-01".to_string(),
                local_port: "ge-0/0/2".to_string(),
                capability: "R".to_string(),
                remote_port: "ethernet1/1".to_string(),
            },
        ]
    }

    #[test]
    fn test_table_round_trip() {
        let table = synth_neighbor_table(&planned());
        let parsed = parse_neighbor_table(&table);
        assert_eq!(parsed, planned());
    }

    #[test]
    fn test_header_only_table_is_empty() {
        let table = synth_neighbor_table(&[]);
        assert!(parse_neighbor_table(&table).is_empty());
    }

    #[test]
    fn test_query_returns_subset_of_planned() {
        let mut rng = StdRng::seed_from_u64(6);
        let result = neighbor_table(&mut rng, "core-rt-01", &planned()).unwrap();
        assert!(result.len() <= planned().len());
        for entry in result {
            assert!(planned().contains(&entry));
        }
    }
}
