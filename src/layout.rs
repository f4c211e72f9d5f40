use crate::topology::NetworkTopology;
use crate::topology_device::DeviceType;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use strum_macros::{Display, EnumIter, EnumString};

const FORCE_ITERATIONS: usize = 60;
const MARGIN: f32 = 40.0;

#[derive(
    Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Display, EnumIter, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum LayoutMode {
    Hierarchical,
    Force,
    Circular,
    Grid,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct NodePosition {
    pub device_id: String,
    pub x: f32,
    pub y: f32,
}

// Row assignment for the hierarchical mode, core gear on top
fn tier(device_type: DeviceType) -> usize {
    match device_type {
        DeviceType::Router => 0,
        DeviceType::Firewall | DeviceType::LoadBalancer | DeviceType::IdsIps => 1,
        DeviceType::Switch => 2,
        DeviceType::Server | DeviceType::Hypervisor | DeviceType::ContainerHost => 3,
        DeviceType::AccessPoint => 3,
        DeviceType::Workstation | DeviceType::Unknown => 4,
    }
}

fn hierarchical(topology: &NetworkTopology, width: f32, height: f32) -> Vec<NodePosition> {
    let mut rows: Vec<Vec<&str>> = vec![Vec::new(); 5];
    for device in topology.devices.iter() {
        rows[tier(device.device_type)].push(device.id.as_str());
    }
    let used_rows = rows.iter().filter(|row| !row.is_empty()).count().max(1);

    let mut positions = Vec::new();
    let mut row_index = 0;
    for row in rows.iter().filter(|row| !row.is_empty()) {
        let y = MARGIN + (height - 2.0 * MARGIN) * row_index as f32 / (used_rows.max(2) - 1) as f32;
        for (column, device_id) in row.iter().enumerate() {
            let x = MARGIN + (width - 2.0 * MARGIN) * (column as f32 + 0.5) / row.len() as f32;
            positions.push(NodePosition {
                device_id: device_id.to_string(),
                x,
                y,
            });
        }
        row_index += 1;
    }
    positions
}

fn circular(topology: &NetworkTopology, width: f32, height: f32) -> Vec<NodePosition> {
    let count = topology.devices.len().max(1);
    let radius = (width.min(height) / 2.0) - MARGIN;
    let center_x = width / 2.0;
    let center_y = height / 2.0;

    topology
        .devices
        .iter()
        .enumerate()
        .map(|(index, device)| {
            let angle = std::f32::consts::TAU * index as f32 / count as f32;
            NodePosition {
                device_id: device.id.clone(),
                x: center_x + radius * angle.cos(),
                y: center_y + radius * angle.sin(),
            }
        })
        .collect()
}

fn grid(topology: &NetworkTopology, width: f32, height: f32) -> Vec<NodePosition> {
    let count = topology.devices.len().max(1);
    let columns = (count as f32).sqrt().ceil() as usize;
    let rows = count.div_ceil(columns);

    topology
        .devices
        .iter()
        .enumerate()
        .map(|(index, device)| {
            let column = index % columns;
            let row = index / columns;
            NodePosition {
                device_id: device.id.clone(),
                x: MARGIN + (width - 2.0 * MARGIN) * (column as f32 + 0.5) / columns as f32,
                y: MARGIN + (height - 2.0 * MARGIN) * (row as f32 + 0.5) / rows as f32,
            }
        })
        .collect()
}

// Plain spring embedder. Nodes start on a circle so the result is
// deterministic for a given snapshot, no randomness involved.
fn force_directed(topology: &NetworkTopology, width: f32, height: f32) -> Vec<NodePosition> {
    let count = topology.devices.len();
    if count == 0 {
        return Vec::new();
    }

    let mut positions = circular(topology, width, height);
    let index_of: HashMap<&str, usize> = topology
        .devices
        .iter()
        .enumerate()
        .map(|(index, device)| (device.id.as_str(), index))
        .collect();

    let area = (width - 2.0 * MARGIN) * (height - 2.0 * MARGIN);
    let rest_length = (area / count as f32).sqrt();

    for _ in 0..FORCE_ITERATIONS {
        let mut displacement = vec![(0.0f32, 0.0f32); count];

        // Pairwise repulsion
        for i in 0..count {
            for j in (i + 1)..count {
                let dx = positions[i].x - positions[j].x;
                let dy = positions[i].y - positions[j].y;
                let distance = (dx * dx + dy * dy).sqrt().max(0.01);
                let force = rest_length * rest_length / distance;
                let (fx, fy) = (dx / distance * force, dy / distance * force);
                displacement[i].0 += fx;
                displacement[i].1 += fy;
                displacement[j].0 -= fx;
                displacement[j].1 -= fy;
            }
        }

        // Spring attraction along edges
        for connection in topology.connections.iter() {
            let (Some(&i), Some(&j)) = (
                index_of.get(connection.source.as_str()),
                index_of.get(connection.target.as_str()),
            ) else {
                continue;
            };
            let dx = positions[i].x - positions[j].x;
            let dy = positions[i].y - positions[j].y;
            let distance = (dx * dx + dy * dy).sqrt().max(0.01);
            let force = distance * distance / rest_length;
            let (fx, fy) = (dx / distance * force, dy / distance * force);
            displacement[i].0 -= fx;
            displacement[i].1 -= fy;
            displacement[j].0 += fx;
            displacement[j].1 += fy;
        }

        // Bounded step, cooling as iterations progress
        let limit = rest_length / 4.0;
        for i in 0..count {
            let (dx, dy) = displacement[i];
            let magnitude = (dx * dx + dy * dy).sqrt().max(0.01);
            let step = magnitude.min(limit);
            positions[i].x = (positions[i].x + dx / magnitude * step)
                .clamp(MARGIN, width - MARGIN);
            positions[i].y = (positions[i].y + dy / magnitude * step)
                .clamp(MARGIN, height - MARGIN);
        }
    }

    positions
}

pub fn compute_layout(
    topology: &NetworkTopology,
    mode: LayoutMode,
    width: f32,
    height: f32,
) -> Vec<NodePosition> {
    match mode {
        LayoutMode::Hierarchical => hierarchical(topology, width, height),
        LayoutMode::Force => force_directed(topology, width, height),
        LayoutMode::Circular => circular(topology, width, height),
        LayoutMode::Grid => grid(topology, width, height),
    }
}
