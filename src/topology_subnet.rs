use anyhow::{Context, Result};
use ipnet::Ipv4Net;
use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use strum_macros::{Display, EnumIter, EnumString};

#[derive(
    Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum SubnetRole {
    Core,
    Distribution,
    Access,
    Dmz,
    Management,
}

// CIDR kept as a string to stay bridge friendly, parse on demand
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Subnet {
    pub cidr: String,
    pub vlan: u16,
    pub location: String,
    pub role: SubnetRole,
}

impl Subnet {
    pub fn new(cidr: &str, vlan: u16, location: &str, role: SubnetRole) -> Subnet {
        Subnet {
            cidr: cidr.to_string(),
            vlan,
            location: location.to_string(),
            role,
        }
    }

    pub fn network(&self) -> Result<Ipv4Net> {
        self.cidr
            .parse::<Ipv4Net>()
            .with_context(|| format!("Invalid subnet CIDR '{}'", self.cidr))
    }

    pub fn contains(&self, ip: &IpAddr) -> bool {
        match (self.network(), ip) {
            (Ok(net), IpAddr::V4(v4)) => net.contains(v4),
            _ => false,
        }
    }

    // Number of assignable host addresses (network and broadcast removed)
    pub fn host_capacity(&self) -> usize {
        match self.network() {
            Ok(net) => {
                let bits = 32u32.saturating_sub(net.prefix_len() as u32);
                (1usize << bits).saturating_sub(2)
            }
            Err(_) => 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    #[test]
    fn test_contains() {
        let subnet = Subnet::new("10.20.0.0/24", 120, "paris-dc1", SubnetRole::Access);
        assert!(subnet.contains(&IpAddr::V4(Ipv4Addr::new(10, 20, 0, 15))));
        assert!(!subnet.contains(&IpAddr::V4(Ipv4Addr::new(10, 21, 0, 15))));
    }

    #[test]
    fn test_host_capacity() {
        let subnet = Subnet::new("10.20.0.0/24", 120, "paris-dc1", SubnetRole::Access);
        assert_eq!(subnet.host_capacity(), 254);
        let wide = Subnet::new("172.16.0.0/16", 1, "paris-dc1", SubnetRole::Core);
        assert_eq!(wide.host_capacity(), 65534);
    }

    #[test]
    fn test_invalid_cidr_rejected() {
        let subnet = Subnet::new("not-a-cidr", 1, "paris-dc1", SubnetRole::Access);
        assert!(subnet.network().is_err());
        assert_eq!(subnet.host_capacity(), 0);
    }
}
