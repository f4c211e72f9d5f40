use crate::device_profiles_db::*;
use crate::topology_device::DeviceType;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{trace, warn};

#[derive(Debug, Deserialize, Serialize, Clone)]
struct Attributes {
    services: Option<Vec<String>>,
    vendors: Option<Vec<String>>,
    hostnames: Option<Vec<String>>,
    sys_descrs: Option<Vec<String>>,
    negate: Option<bool>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
enum Condition {
    Leaf(Attributes),
    Node {
        #[serde(rename = "type")]
        condition_type: String,
        sub_conditions: Vec<Condition>,
    },
}

// One entry per device role: the template half drives fabrication, the
// condition half maps probe evidence back to a role.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct RoleProfile {
    pub device_type: DeviceType,
    pub hostname_prefixes: Vec<String>,
    pub vendors: Vec<String>,
    pub sys_descrs: Vec<String>,
    pub services: Vec<String>,
    conditions: Vec<Condition>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
struct RoleProfileListJSON {
    date: String,
    signature: String,
    profiles: Vec<RoleProfile>,
}

struct RoleProfileList {
    profiles: Vec<RoleProfile>,
}

static PROFILES: Lazy<Mutex<RoleProfileList>> = Lazy::new(|| {
    let profile_list: RoleProfileListJSON = serde_json::from_str(ROLE_PROFILES).unwrap();
    Mutex::new(RoleProfileList {
        profiles: profile_list.profiles,
    })
});

pub async fn template_for(device_type: DeviceType) -> Option<RoleProfile> {
    let profiles = PROFILES.lock().await;
    profiles
        .profiles
        .iter()
        .find(|p| p.device_type == device_type)
        .cloned()
}

// Map probe evidence back to a device role. First matching profile wins,
// the db orders the most specific profiles first.
pub async fn classify_device(
    vendor: &str,
    hostname: &str,
    services: &Vec<String>,
    sys_descr: &str,
) -> DeviceType {
    trace!(
        "Classifying device with vendor {}, hostname {}, services {:?}, sys_descr {}",
        vendor,
        hostname,
        services,
        sys_descr
    );

    let profiles = PROFILES.lock().await;

    // To lower case as used in the profiles
    let vendor_lower = vendor.to_lowercase();
    let hostname_lower = hostname.to_lowercase();
    let sys_descr_lower = sys_descr.to_lowercase();
    let services_lower: Vec<String> = services.iter().map(|s| s.to_lowercase()).collect();

    for profile in profiles.profiles.iter() {
        for condition in &profile.conditions {
            if match_condition(
                condition,
                &services_lower,
                &vendor_lower,
                &hostname_lower,
                &sys_descr_lower,
            ) {
                trace!("Match for device type {}", profile.device_type);
                return profile.device_type;
            }
        }
    }

    if !sys_descr.is_empty() || !services.is_empty() {
        warn!(
            "Unknown device type for vendor {}, hostname {}, services {:?}, sys_descr {}",
            vendor, hostname, services, sys_descr
        );
    }

    DeviceType::Unknown
}

fn match_condition(
    condition: &Condition,
    services: &Vec<String>,
    vendor: &str,
    hostname: &str,
    sys_descr: &str,
) -> bool {
    match condition {
        Condition::Leaf(attributes) => {
            let service_match = match &attributes.services {
                Some(wanted) if !wanted.is_empty() => wanted
                    .iter()
                    .filter(|s| !s.is_empty())
                    .any(|s| services.iter().any(|service| service.contains(s))),
                _ => true,
            };

            let vendor_match = match &attributes.vendors {
                Some(vendors) if !vendors.is_empty() => vendors
                    .iter()
                    .filter(|v| !v.is_empty())
                    .any(|v| vendor.contains(&v.to_lowercase())),
                _ => true,
            };

            let hostname_match = match &attributes.hostnames {
                Some(hostnames) if !hostnames.is_empty() => hostnames
                    .iter()
                    .filter(|h| !h.is_empty())
                    .any(|h| hostname.contains(&h.to_lowercase())),
                _ => true,
            };

            let sys_descr_match = match &attributes.sys_descrs {
                Some(fragments) if !fragments.is_empty() => fragments
                    .iter()
                    .filter(|f| !f.is_empty())
                    .any(|f| sys_descr.contains(&f.to_lowercase())),
                _ => true,
            };

            let result = service_match && vendor_match && hostname_match && sys_descr_match;
            if attributes.negate.unwrap_or(false) {
                !result
            } else {
                result
            }
        }
        Condition::Node {
            condition_type,
            sub_conditions,
        } => match condition_type.as_str() {
            "AND" => sub_conditions
                .iter()
                .all(|sub| match_condition(sub, services, vendor, hostname, sys_descr)),
            "OR" => sub_conditions
                .iter()
                .any(|sub| match_condition(sub, services, vendor, hostname, sys_descr)),
            _ => false,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_classify_router_from_sys_descr() {
        let device_type = classify_device(
            "Cisco Systems",
            "gw-lab-7",
            &vec![],
            "Cisco IOS XE Software, Version 17.09.04a",
        )
        .await;
        assert_eq!(device_type, DeviceType::Router);
    }

    #[tokio::test]
    async fn test_classify_container_host_beats_server() {
        // A Docker host also carries a Linux sys_descr, the more specific
        // profile must win
        let device_type = classify_device(
            "Dell Inc.",
            "srv-misc-3",
            &vec!["kubelet".to_string()],
            "Linux 6.8.0-39-generic Docker 26.1.4",
        )
        .await;
        assert_eq!(device_type, DeviceType::ContainerHost);
    }

    #[tokio::test]
    async fn test_classify_from_hostname_only() {
        let device_type = classify_device("", "acc-sw-04", &vec![], "").await;
        assert_eq!(device_type, DeviceType::Switch);
    }

    #[tokio::test]
    async fn test_classify_unknown_on_no_evidence() {
        let device_type = classify_device("", "mystery-9", &vec![], "").await;
        assert_eq!(device_type, DeviceType::Unknown);
    }

    #[tokio::test]
    async fn test_template_lookup() {
        let template = template_for(DeviceType::Firewall).await.unwrap();
        assert!(!template.hostname_prefixes.is_empty());
        assert!(!template.sys_descrs.is_empty());
        assert!(template_for(DeviceType::Unknown).await.is_none());
    }
}
