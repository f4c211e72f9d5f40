use crate::topology::NetworkTopology;
use crate::topology_device::DeviceStatus;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter, EnumString};
use tracing::{debug, info};

// Gauge thresholds that raise dashboard alerts
const CPU_WARNING: f32 = 90.0;
const TEMPERATURE_WARNING: f32 = 75.0;
const UTILIZATION_WARNING: f32 = 85.0;
const PACKET_LOSS_WARNING: f32 = 5.0;

#[derive(
    Debug,
    Serialize,
    Deserialize,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Display,
    EnumIter,
    EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum AlertSeverity {
    Info,
    Warning,
    Critical,
}

#[derive(
    Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum AlertCategory {
    Availability,
    Performance,
    Capacity,
    Quality,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Alert {
    pub id: String,
    pub severity: AlertSeverity,
    pub category: AlertCategory,
    pub device_id: String,
    pub hostname: String,
    pub message: String,
    pub created_at: DateTime<Utc>,
    pub acknowledged: bool,
    pub resolved: bool,
}

impl Alert {
    fn new(
        severity: AlertSeverity,
        category: AlertCategory,
        device_id: &str,
        hostname: &str,
        message: String,
    ) -> Alert {
        Alert {
            id: uuid::Uuid::new_v4().to_string(),
            severity,
            category,
            device_id: device_id.to_string(),
            hostname: hostname.to_string(),
            message,
            created_at: Utc::now(),
            acknowledged: false,
            resolved: false,
        }
    }
}

lazy_static! {
    static ref ALERTS: DashMap<String, Alert> = DashMap::new();
}

// Derive alert candidates from a snapshot. Pure, the registry dedupes.
pub fn evaluate_topology(topology: &NetworkTopology) -> Vec<Alert> {
    let mut candidates = Vec::new();

    for device in topology.devices.iter() {
        if device.status == DeviceStatus::Offline {
            candidates.push(Alert::new(
                AlertSeverity::Critical,
                AlertCategory::Availability,
                &device.id,
                &device.hostname,
                format!("{} is offline", device.hostname),
            ));
            continue;
        }
        if device.cpu_usage >= CPU_WARNING {
            candidates.push(Alert::new(
                AlertSeverity::Warning,
                AlertCategory::Performance,
                &device.id,
                &device.hostname,
                format!(
                    "{} cpu at {:.0}%",
                    device.hostname, device.cpu_usage
                ),
            ));
        } else if device.temperature >= TEMPERATURE_WARNING {
            candidates.push(Alert::new(
                AlertSeverity::Warning,
                AlertCategory::Performance,
                &device.id,
                &device.hostname,
                format!(
                    "{} running hot at {:.0}C",
                    device.hostname, device.temperature
                ),
            ));
        }
    }

    for connection in topology.connections.iter() {
        let Some(source) = topology.device_by_id(&connection.source) else {
            continue;
        };
        let Some(target) = topology.device_by_id(&connection.target) else {
            continue;
        };
        if connection.utilization >= UTILIZATION_WARNING {
            candidates.push(Alert::new(
                AlertSeverity::Warning,
                AlertCategory::Capacity,
                &source.id,
                &source.hostname,
                format!(
                    "link {} - {} at {:.0}% utilization",
                    source.hostname, target.hostname, connection.utilization
                ),
            ));
        }
        if connection.packet_loss >= PACKET_LOSS_WARNING {
            candidates.push(Alert::new(
                AlertSeverity::Warning,
                AlertCategory::Quality,
                &source.id,
                &source.hostname,
                format!(
                    "link {} - {} losing {:.1}% of packets",
                    source.hostname, target.hostname, connection.packet_loss
                ),
            ));
        }
    }

    candidates
}

// One unresolved alert per (device, category), repeated sweeps do not stack
// duplicates. Returns how many alerts were actually raised.
pub fn raise_alerts(candidates: Vec<Alert>) -> usize {
    let mut raised = 0;
    for candidate in candidates {
        let duplicate = ALERTS.iter().any(|entry| {
            !entry.resolved
                && entry.device_id == candidate.device_id
                && entry.category == candidate.category
        });
        if duplicate {
            debug!(
                "Suppressing duplicate {} alert for {}",
                candidate.category, candidate.hostname
            );
            continue;
        }
        ALERTS.insert(candidate.id.clone(), candidate);
        raised += 1;
    }
    if raised > 0 {
        info!("Raised {} new alerts", raised);
    }
    raised
}

pub fn sweep_topology(topology: &NetworkTopology) -> usize {
    raise_alerts(evaluate_topology(topology))
}

// Unresolved alerts, most severe first, newest first within a severity
pub fn active_alerts() -> Vec<Alert> {
    let mut alerts: Vec<Alert> = ALERTS
        .iter()
        .filter(|entry| !entry.resolved)
        .map(|entry| entry.value().clone())
        .collect();
    alerts.sort_by(|a, b| {
        b.severity
            .cmp(&a.severity)
            .then_with(|| b.created_at.cmp(&a.created_at))
    });
    alerts
}

pub fn all_alerts() -> Vec<Alert> {
    ALERTS.iter().map(|entry| entry.value().clone()).collect()
}

pub fn acknowledge_alert(alert_id: &str) -> bool {
    match ALERTS.get_mut(alert_id) {
        Some(mut alert) => {
            alert.acknowledged = true;
            true
        }
        None => false,
    }
}

pub fn resolve_alert(alert_id: &str) -> bool {
    match ALERTS.get_mut(alert_id) {
        Some(mut alert) => {
            alert.resolved = true;
            true
        }
        None => false,
    }
}

pub fn clear_alerts() {
    ALERTS.clear();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::topology_device::NetworkDevice;
    use serial_test::serial;

    fn topology_with_offline_device() -> NetworkTopology {
        let mut topology = NetworkTopology::new();
        let mut device = NetworkDevice::new();
        device.hostname = "srv-db-01".to_string();
        device.status = DeviceStatus::Offline;
        topology.devices.push(device);
        let mut busy = NetworkDevice::new();
        busy.hostname = "srv-web-01".to_string();
        busy.status = DeviceStatus::Warning;
        busy.cpu_usage = 95.0;
        topology.devices.push(busy);
        topology.refresh_stats();
        topology
    }

    #[test]
    #[serial]
    fn test_offline_device_raises_critical() {
        clear_alerts();
        let topology = topology_with_offline_device();
        let raised = sweep_topology(&topology);
        assert_eq!(raised, 2);

        let alerts = active_alerts();
        assert_eq!(alerts[0].severity, AlertSeverity::Critical);
        assert_eq!(alerts[0].category, AlertCategory::Availability);
        assert_eq!(alerts[0].hostname, "srv-db-01");
        clear_alerts();
    }

    #[test]
    #[serial]
    fn test_repeated_sweep_does_not_stack() {
        clear_alerts();
        let topology = topology_with_offline_device();
        assert_eq!(sweep_topology(&topology), 2);
        assert_eq!(sweep_topology(&topology), 0);
        assert_eq!(active_alerts().len(), 2);
        clear_alerts();
    }

    #[test]
    #[serial]
    fn test_lifecycle_ack_resolve_reraise() {
        clear_alerts();
        let topology = topology_with_offline_device();
        sweep_topology(&topology);

        let alert = active_alerts().into_iter().next().unwrap();
        assert!(acknowledge_alert(&alert.id));
        assert!(resolve_alert(&alert.id));
        assert_eq!(active_alerts().len(), 1);

        // The condition persists, the next sweep raises it again
        assert_eq!(sweep_topology(&topology), 1);
        assert_eq!(active_alerts().len(), 2);
        clear_alerts();
    }

    #[test]
    #[serial]
    fn test_unknown_alert_id() {
        clear_alerts();
        assert!(!acknowledge_alert("missing"));
        assert!(!resolve_alert("missing"));
    }

    #[test]
    #[serial]
    fn test_severity_ordering() {
        clear_alerts();
        let topology = topology_with_offline_device();
        sweep_topology(&topology);
        let alerts = active_alerts();
        assert!(alerts[0].severity >= alerts[1].severity);
        clear_alerts();
    }
}
