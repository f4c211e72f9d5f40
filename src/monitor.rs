use crate::alert::sweep_topology;
use crate::topology::NetworkTopology;
use crate::topology_device::DeviceStatus;
use crate::topology_store::{get_topology, update_topology};
use lazy_static::lazy_static;
use rand::prelude::*;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::task;
use tokio::time::{sleep, Duration};
use tracing::{info, trace};

pub const DEFAULT_REFRESH_INTERVAL_MS: u64 = 15_000;

lazy_static! {
    static ref SHOULD_STOP: Arc<AtomicBool> = Arc::new(AtomicBool::new(false));
    static ref MONITOR_HANDLE: Arc<Mutex<Option<task::JoinHandle<()>>>> =
        Arc::new(Mutex::new(None));
    static ref TICK_COUNT: AtomicU64 = AtomicU64::new(0);
}

pub async fn monitor_start(interval_ms: u64) {
    if MONITOR_HANDLE.lock().await.is_some() {
        trace!("Monitor task already running");
        return;
    }
    info!("Starting monitor task with a {} ms interval", interval_ms);
    SHOULD_STOP.store(false, Ordering::Relaxed);
    *MONITOR_HANDLE.lock().await = Some(task::spawn(refresh_loop(interval_ms)));
}

// The task drains at its next tick
pub fn monitor_stop() {
    info!("Terminating monitor task");
    SHOULD_STOP.store(true, Ordering::Relaxed);
}

pub fn monitor_ticks() -> u64 {
    TICK_COUNT.load(Ordering::Relaxed)
}

async fn refresh_loop(interval_ms: u64) {
    loop {
        sleep(Duration::from_millis(interval_ms)).await;
        if SHOULD_STOP.load(Ordering::Relaxed) {
            break;
        }

        let interval_secs = (interval_ms / 1000).max(1);
        let refreshed = update_topology(|topology| {
            let mut rng = StdRng::from_entropy();
            drift(&mut rng, topology, interval_secs);
        })
        .await;

        if refreshed {
            if let Some(topology) = get_topology().await {
                let raised = sweep_topology(&topology);
                trace!("Monitor tick raised {} alerts", raised);
            }
        } else {
            trace!("Monitor tick with no stored snapshot");
        }
        TICK_COUNT.fetch_add(1, Ordering::Relaxed);
    }

    *MONITOR_HANDLE.lock().await = None;
    SHOULD_STOP.store(false, Ordering::Relaxed);
    info!("Monitor task stopped");
}

fn clamp_add(value: f32, delta: f32, min: f32, max: f32) -> f32 {
    (value + delta).clamp(min, max)
}

// Nudge the gauges the way a live network would move between polls, with a
// small chance of status churn so the alert panel stays busy
fn drift(rng: &mut StdRng, topology: &mut NetworkTopology, interval_secs: u64) {
    for device in topology.devices.iter_mut() {
        match device.status {
            DeviceStatus::Offline => {
                if rng.gen_bool(0.05) {
                    device.status = DeviceStatus::Online;
                    device.uptime_seconds = 0;
                }
            }
            DeviceStatus::Warning => {
                device.cpu_usage = clamp_add(device.cpu_usage, rng.gen_range(-10.0..4.0), 1.0, 99.0);
                device.temperature =
                    clamp_add(device.temperature, rng.gen_range(-3.0..2.0), 30.0, 90.0);
                device.uptime_seconds += interval_secs;
                if device.cpu_usage < 70.0 && device.temperature < 65.0 {
                    device.status = DeviceStatus::Online;
                }
            }
            _ => {
                device.cpu_usage = clamp_add(device.cpu_usage, rng.gen_range(-8.0..8.0), 1.0, 99.0);
                device.memory_usage =
                    clamp_add(device.memory_usage, rng.gen_range(-5.0..5.0), 5.0, 99.0);
                device.temperature =
                    clamp_add(device.temperature, rng.gen_range(-2.0..2.0), 30.0, 90.0);
                device.uptime_seconds += interval_secs;
                if device.cpu_usage >= 90.0 || device.temperature >= 75.0 {
                    device.status = DeviceStatus::Warning;
                } else if rng.gen_bool(0.02) {
                    device.status = DeviceStatus::Offline;
                }
            }
        }
    }

    for connection in topology.connections.iter_mut() {
        connection.utilization =
            clamp_add(connection.utilization, rng.gen_range(-10.0..10.0), 0.0, 99.0);
        connection.latency_ms =
            clamp_add(connection.latency_ms, rng.gen_range(-1.0..1.0), 0.1, 120.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alert::clear_alerts;
    use crate::synth_topology::{generate_topology, SizeProfile};
    use crate::topology_store::{clear_topology, set_topology};
    use serial_test::serial;

    #[tokio::test]
    #[serial]
    async fn test_monitor_drifts_stored_snapshot() {
        clear_alerts();
        clear_topology().await;
        let topology = generate_topology(SizeProfile::Small, Some(31)).await;
        set_topology(topology).await.unwrap();
        let ticks_before = monitor_ticks();

        monitor_start(20).await;
        // Double start is a no-op
        monitor_start(20).await;
        sleep(Duration::from_millis(200)).await;
        monitor_stop();
        sleep(Duration::from_millis(100)).await;

        assert!(monitor_ticks() > ticks_before);
        let drifted = get_topology().await.unwrap();
        assert!(drifted.validate().is_ok());

        clear_topology().await;
        clear_alerts();
    }

    #[tokio::test]
    #[serial]
    async fn test_monitor_restarts_after_stop() {
        clear_topology().await;
        monitor_start(20).await;
        monitor_stop();
        sleep(Duration::from_millis(150)).await;
        assert!(MONITOR_HANDLE.lock().await.is_none());

        monitor_start(20).await;
        assert!(MONITOR_HANDLE.lock().await.is_some());
        monitor_stop();
        sleep(Duration::from_millis(150)).await;
    }

    #[test]
    fn test_drift_keeps_gauges_in_bounds() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut topology = NetworkTopology::new();
        let mut device = crate::topology_device::NetworkDevice::new();
        device.status = DeviceStatus::Online;
        device.cpu_usage = 98.5;
        device.temperature = 89.5;
        topology.devices.push(device);
        topology.refresh_stats();

        for _ in 0..100 {
            drift(&mut rng, &mut topology, 1);
            let device = &topology.devices[0];
            assert!(device.cpu_usage >= 1.0 && device.cpu_usage <= 99.0);
            assert!(device.temperature >= 30.0 && device.temperature <= 90.0);
        }
    }
}
