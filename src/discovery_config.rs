use anyhow::{bail, Result};
use ipnet::Ipv4Net;
use serde::{Deserialize, Serialize};
use std::env::var;
use std::net::Ipv4Addr;
use strum_macros::{Display, EnumIter, EnumString};
use tracing::warn;

#[derive(
    Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum DiscoveryProtocol {
    Ping,
    Arp,
    Snmp,
    Cdp,
    Lldp,
    Ssh,
    Api,
}

// Sweep parameters handed to the discovery engine. The shell builds this
// from its settings screen, env vars override for headless runs.
#[derive(Debug, Clone)]
pub struct DiscoveryConfig {
    pub ranges: Vec<Ipv4Net>,
    pub exclusions: Vec<Ipv4Net>,
    pub protocols: Vec<DiscoveryProtocol>,
    pub batch_size: usize,
    pub timeout_ms: u64,
    // Upper bound of the artificial per-batch delay, zero disables pacing
    pub probe_delay_ms: u64,
    // Large ranges are truncated to keep a sweep bounded
    pub max_hosts_per_range: usize,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            ranges: vec!["192.168.1.0/24".parse().unwrap()],
            exclusions: Vec::new(),
            protocols: vec![
                DiscoveryProtocol::Ping,
                DiscoveryProtocol::Arp,
                DiscoveryProtocol::Snmp,
                DiscoveryProtocol::Lldp,
            ],
            batch_size: 16,
            timeout_ms: 1000,
            probe_delay_ms: 80,
            max_hosts_per_range: 256,
        }
    }
}

impl DiscoveryConfig {
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(ranges) = var("NETMIRAGE_RANGES") {
            let parsed: Vec<Ipv4Net> = ranges
                .split(',')
                .filter_map(|s| match s.trim().parse() {
                    Ok(net) => Some(net),
                    Err(_) => {
                        warn!("Ignoring invalid range '{}' from NETMIRAGE_RANGES", s);
                        None
                    }
                })
                .collect();
            if !parsed.is_empty() {
                config.ranges = parsed;
            }
        }
        if let Ok(protocols) = var("NETMIRAGE_PROTOCOLS") {
            let parsed: Vec<DiscoveryProtocol> = protocols
                .split(',')
                .filter_map(|s| match s.trim().parse() {
                    Ok(protocol) => Some(protocol),
                    Err(_) => {
                        warn!("Ignoring invalid protocol '{}' from NETMIRAGE_PROTOCOLS", s);
                        None
                    }
                })
                .collect();
            if !parsed.is_empty() {
                config.protocols = parsed;
            }
        }
        if let Ok(batch) = var("NETMIRAGE_BATCH_SIZE") {
            if let Ok(batch) = batch.parse::<usize>() {
                config.batch_size = batch;
            }
        }
        if let Ok(timeout) = var("NETMIRAGE_TIMEOUT_MS") {
            if let Ok(timeout) = timeout.parse::<u64>() {
                config.timeout_ms = timeout;
            }
        }

        config
    }

    pub fn validate(&self) -> Result<()> {
        if self.ranges.is_empty() {
            bail!("No address ranges configured");
        }
        if self.protocols.is_empty() {
            bail!("No discovery protocols enabled");
        }
        if self.batch_size == 0 {
            bail!("Batch size must be at least 1");
        }
        Ok(())
    }

    pub fn is_excluded(&self, ip: &Ipv4Addr) -> bool {
        self.exclusions.iter().any(|net| net.contains(ip))
    }

    // Hosts to sweep for one range, exclusions removed, capped
    pub fn target_hosts(&self, range: &Ipv4Net) -> Vec<Ipv4Addr> {
        range
            .hosts()
            .filter(|ip| !self.is_excluded(ip))
            .take(self.max_hosts_per_range)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn test_default_config_is_valid() {
        let config = DiscoveryConfig::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_ranges_rejected() {
        let mut config = DiscoveryConfig::default();
        config.ranges.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_target_hosts_respects_exclusions() {
        let mut config = DiscoveryConfig::default();
        let range: Ipv4Net = "10.0.0.0/28".parse().unwrap();
        config.exclusions.push("10.0.0.8/29".parse().unwrap());
        let hosts = config.target_hosts(&range);
        // 14 hosts in a /28, the excluded /29 removes .8 through .14
        assert_eq!(hosts.len(), 7);
        assert!(hosts.iter().all(|ip| ip.octets()[3] < 8));
    }

    #[test]
    fn test_target_hosts_capped() {
        let mut config = DiscoveryConfig::default();
        config.max_hosts_per_range = 10;
        let range: Ipv4Net = "10.0.0.0/24".parse().unwrap();
        assert_eq!(config.target_hosts(&range).len(), 10);
    }

    #[test]
    #[serial]
    fn test_env_overrides() {
        std::env::set_var("NETMIRAGE_RANGES", "10.1.0.0/24, bogus, 10.2.0.0/24");
        std::env::set_var("NETMIRAGE_PROTOCOLS", "ping,ssh");
        std::env::set_var("NETMIRAGE_BATCH_SIZE", "4");
        let config = DiscoveryConfig::from_env();
        std::env::remove_var("NETMIRAGE_RANGES");
        std::env::remove_var("NETMIRAGE_PROTOCOLS");
        std::env::remove_var("NETMIRAGE_BATCH_SIZE");

        assert_eq!(config.ranges.len(), 2);
        assert_eq!(
            config.protocols,
            vec![DiscoveryProtocol::Ping, DiscoveryProtocol::Ssh]
        );
        assert_eq!(config.batch_size, 4);
    }
}
