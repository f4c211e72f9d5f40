use crate::rwlock::CustomRwLock;
use crate::topology::{NetworkTopology, TopologyError};
use chrono::{DateTime, Utc};
use humantime::format_duration;
use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use strum_macros::Display;
use tracing::{info, warn};

// Staleness thresholds of the dashboard banner
const FRESH_SECS: i64 = 30;
const AGING_SECS: i64 = 120;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Staleness {
    Fresh,
    Aging,
    Stale,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SnapshotMeta {
    pub stored_at: DateTime<Utc>,
    pub age_seconds: i64,
    pub age_human: String,
    pub staleness: Staleness,
    pub partial: bool,
    pub rescan_recommended: bool,
}

struct StoredSnapshot {
    topology: NetworkTopology,
    stored_at: DateTime<Utc>,
}

lazy_static! {
    static ref SNAPSHOT: CustomRwLock<Option<StoredSnapshot>> = CustomRwLock::new(None);
}

fn staleness_for(age_seconds: i64) -> Staleness {
    if age_seconds < FRESH_SECS {
        Staleness::Fresh
    } else if age_seconds < AGING_SECS {
        Staleness::Aging
    } else {
        Staleness::Stale
    }
}

// Snapshots are validated on the way in, the store never serves a topology
// that breaks the structural invariants
pub async fn set_topology(topology: NetworkTopology) -> Result<(), TopologyError> {
    if let Err(e) = topology.validate() {
        warn!("Rejecting snapshot: {}", e);
        return Err(e);
    }

    info!(
        "Storing snapshot: {} devices, {} connections",
        topology.devices.len(),
        topology.connections.len()
    );
    *SNAPSHOT.write().await = Some(StoredSnapshot {
        topology,
        stored_at: Utc::now(),
    });
    Ok(())
}

pub async fn get_topology() -> Option<NetworkTopology> {
    SNAPSHOT
        .read()
        .await
        .as_ref()
        .map(|stored| stored.topology.clone())
}

pub async fn clear_topology() {
    *SNAPSHOT.write().await = None;
}

// Apply an in-place update (gauge drift, alert sweep). The stored timestamp
// moves forward since the data was just refreshed.
pub async fn update_topology<F>(update: F) -> bool
where
    F: FnOnce(&mut NetworkTopology),
{
    let mut guard = SNAPSHOT.write().await;
    match guard.as_mut() {
        Some(stored) => {
            update(&mut stored.topology);
            stored.topology.refresh_stats();
            stored.stored_at = Utc::now();
            true
        }
        None => false,
    }
}

pub async fn snapshot_meta() -> Option<SnapshotMeta> {
    let guard = SNAPSHOT.read().await;
    let stored = guard.as_ref()?;

    let age_seconds = (Utc::now() - stored.stored_at).num_seconds().max(0);
    let staleness = staleness_for(age_seconds);
    let partial = stored.topology.partial;

    Some(SnapshotMeta {
        stored_at: stored.stored_at,
        age_seconds,
        age_human: format_duration(Duration::from_secs(age_seconds as u64)).to_string(),
        staleness,
        partial,
        // A partial sweep is worth redoing even while its data is fresh
        rescan_recommended: staleness == Staleness::Stale || partial,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::synth_topology::{generate_topology, SizeProfile};
    use chrono::Duration as ChronoDuration;
    use serial_test::serial;

    #[tokio::test]
    #[serial]
    async fn test_set_and_get_round_trip() {
        clear_topology().await;
        let topology = generate_topology(SizeProfile::Small, Some(1)).await;
        let device_count = topology.devices.len();
        set_topology(topology).await.unwrap();

        let fetched = get_topology().await.unwrap();
        assert_eq!(fetched.devices.len(), device_count);
        clear_topology().await;
    }

    #[tokio::test]
    #[serial]
    async fn test_invalid_snapshot_rejected() {
        clear_topology().await;
        let mut topology = generate_topology(SizeProfile::Small, Some(2)).await;
        topology.stats.total_devices += 1;
        assert!(set_topology(topology).await.is_err());
        assert!(get_topology().await.is_none());
    }

    #[tokio::test]
    #[serial]
    async fn test_fresh_snapshot_meta() {
        clear_topology().await;
        let topology = generate_topology(SizeProfile::Small, Some(3)).await;
        set_topology(topology).await.unwrap();

        let meta = snapshot_meta().await.unwrap();
        assert_eq!(meta.staleness, Staleness::Fresh);
        assert!(!meta.rescan_recommended);
        clear_topology().await;
    }

    #[tokio::test]
    #[serial]
    async fn test_old_snapshot_goes_stale() {
        clear_topology().await;
        let topology = generate_topology(SizeProfile::Small, Some(4)).await;
        set_topology(topology).await.unwrap();
        {
            let mut guard = SNAPSHOT.write().await;
            guard.as_mut().unwrap().stored_at = Utc::now() - ChronoDuration::seconds(300);
        }

        let meta = snapshot_meta().await.unwrap();
        assert_eq!(meta.staleness, Staleness::Stale);
        assert!(meta.rescan_recommended);
        assert!(meta.age_seconds >= 300);
        clear_topology().await;
    }

    #[tokio::test]
    #[serial]
    async fn test_partial_snapshot_recommends_rescan() {
        clear_topology().await;
        let mut topology = generate_topology(SizeProfile::Small, Some(5)).await;
        topology.partial = true;
        set_topology(topology).await.unwrap();

        let meta = snapshot_meta().await.unwrap();
        assert_eq!(meta.staleness, Staleness::Fresh);
        assert!(meta.rescan_recommended);
        clear_topology().await;
    }

    #[tokio::test]
    #[serial]
    async fn test_update_refreshes_timestamp() {
        clear_topology().await;
        let topology = generate_topology(SizeProfile::Small, Some(6)).await;
        set_topology(topology).await.unwrap();
        {
            let mut guard = SNAPSHOT.write().await;
            guard.as_mut().unwrap().stored_at = Utc::now() - ChronoDuration::seconds(300);
        }

        let updated = update_topology(|topology| {
            topology.devices[0].cpu_usage = 42.0;
        })
        .await;
        assert!(updated);

        let meta = snapshot_meta().await.unwrap();
        assert_eq!(meta.staleness, Staleness::Fresh);
        let fetched = get_topology().await.unwrap();
        assert_eq!(fetched.devices[0].cpu_usage, 42.0);
        clear_topology().await;
    }

    #[tokio::test]
    #[serial]
    async fn test_update_without_snapshot_is_noop() {
        clear_topology().await;
        assert!(!update_topology(|_| {}).await);
    }
}
