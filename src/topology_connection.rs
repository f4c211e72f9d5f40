use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter, EnumString};

#[derive(
    Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum LinkType {
    Ethernet,
    Fiber,
    Wifi,
    Vpn,
    Trunk,
}

#[derive(
    Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum LinkStatus {
    Up,
    Degraded,
    Down,
}

// An edge between two device ids. Source/target are directional only for
// rendering, traffic figures cover both directions.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct NetworkConnection {
    pub id: String,
    pub source: String,
    pub target: String,
    pub link_type: LinkType,
    pub bandwidth_mbps: u32,
    pub utilization: f32,
    pub latency_ms: f32,
    pub packet_loss: f32,
    pub status: LinkStatus,
}

impl NetworkConnection {
    pub fn new(source: &str, target: &str, link_type: LinkType) -> NetworkConnection {
        NetworkConnection {
            id: uuid::Uuid::new_v4().to_string(),
            source: source.to_string(),
            target: target.to_string(),
            link_type,
            bandwidth_mbps: 1000,
            utilization: 0.0,
            latency_ms: 0.0,
            packet_loss: 0.0,
            status: LinkStatus::Up,
        }
    }

    pub fn involves(&self, device_id: &str) -> bool {
        self.source == device_id || self.target == device_id
    }

    // The device id at the other end, if this edge touches the given one
    pub fn peer_of(&self, device_id: &str) -> Option<&str> {
        if self.source == device_id {
            Some(&self.target)
        } else if self.target == device_id {
            Some(&self.source)
        } else {
            None
        }
    }

    pub fn is_usable(&self) -> bool {
        self.status != LinkStatus::Down
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_peer_of() {
        let connection = NetworkConnection::new("a", "b", LinkType::Ethernet);
        assert_eq!(connection.peer_of("a"), Some("b"));
        assert_eq!(connection.peer_of("b"), Some("a"));
        assert_eq!(connection.peer_of("c"), None);
        assert!(connection.involves("a"));
        assert!(!connection.involves("c"));
    }

    #[test]
    fn test_down_link_not_usable() {
        let mut connection = NetworkConnection::new("a", "b", LinkType::Fiber);
        assert!(connection.is_usable());
        connection.status = LinkStatus::Down;
        assert!(!connection.is_usable());
    }

    #[test]
    fn test_wire_names_are_lowercase() {
        assert_eq!(
            serde_json::to_string(&LinkType::Ethernet).unwrap(),
            "\"ethernet\""
        );
        assert_eq!(serde_json::to_string(&LinkStatus::Up).unwrap(), "\"up\"");
    }
}
