use crate::alert::Alert;
use crate::topology::NetworkTopology;
use anyhow::Result;
use tracing::info;

// The shell turns these strings into file downloads, nothing is persisted here

pub fn devices_to_csv(topology: &NetworkTopology) -> Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record([
        "hostname",
        "ip_addresses",
        "mac_addresses",
        "type",
        "status",
        "vendor",
        "cpu_usage",
        "memory_usage",
        "temperature",
        "uptime_seconds",
        "location",
        "data_center",
        "discovery_methods",
        "last_discovered",
    ])?;

    for device in topology.devices.iter() {
        let ips = device
            .ip_addresses
            .iter()
            .map(|ip| ip.to_string())
            .collect::<Vec<String>>()
            .join(" ");
        let macs = device
            .mac_addresses
            .iter()
            .map(|mac| mac.to_hex_string())
            .collect::<Vec<String>>()
            .join(" ");
        writer.write_record([
            device.hostname.as_str(),
            &ips,
            &macs,
            &device.device_type.to_string(),
            &device.status.to_string(),
            device.vendor.as_str(),
            &format!("{:.1}", device.cpu_usage),
            &format!("{:.1}", device.memory_usage),
            &format!("{:.1}", device.temperature),
            &device.uptime_seconds.to_string(),
            device.location.as_str(),
            device.data_center.as_str(),
            &device.discovery_methods.join(" "),
            &device.last_discovered.to_rfc3339(),
        ])?;
    }

    let bytes = writer.into_inner()?;
    info!("Rendered {} devices to CSV", topology.devices.len());
    Ok(String::from_utf8(bytes)?)
}

pub fn connections_to_csv(topology: &NetworkTopology) -> Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record([
        "source",
        "target",
        "link_type",
        "bandwidth_mbps",
        "utilization",
        "latency_ms",
        "packet_loss",
        "status",
    ])?;

    for connection in topology.connections.iter() {
        // Hostnames read better than ids in a spreadsheet
        let source = topology
            .device_by_id(&connection.source)
            .map(|d| d.hostname.clone())
            .unwrap_or_else(|| connection.source.clone());
        let target = topology
            .device_by_id(&connection.target)
            .map(|d| d.hostname.clone())
            .unwrap_or_else(|| connection.target.clone());
        writer.write_record([
            source.as_str(),
            target.as_str(),
            &connection.link_type.to_string(),
            &connection.bandwidth_mbps.to_string(),
            &format!("{:.1}", connection.utilization),
            &format!("{:.2}", connection.latency_ms),
            &format!("{:.2}", connection.packet_loss),
            &connection.status.to_string(),
        ])?;
    }

    let bytes = writer.into_inner()?;
    Ok(String::from_utf8(bytes)?)
}

pub fn alerts_to_csv(alerts: &[Alert]) -> Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record([
        "created_at",
        "severity",
        "category",
        "hostname",
        "message",
        "acknowledged",
        "resolved",
    ])?;

    for alert in alerts {
        let created_at = alert.created_at.to_rfc3339();
        writer.write_record([
            created_at.as_str(),
            &alert.severity.to_string(),
            &alert.category.to_string(),
            alert.hostname.as_str(),
            alert.message.as_str(),
            &alert.acknowledged.to_string(),
            &alert.resolved.to_string(),
        ])?;
    }

    let bytes = writer.into_inner()?;
    Ok(String::from_utf8(bytes)?)
}

pub fn topology_to_json(topology: &NetworkTopology) -> Result<String> {
    Ok(serde_json::to_string_pretty(topology)?)
}
