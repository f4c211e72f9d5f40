pub mod alert;
pub mod device_profiles;
pub mod device_profiles_db;
pub mod discovery_config;
pub mod discovery_engine;
pub mod export;
pub mod layout;
pub mod logger;
pub mod monitor;
pub mod path_trace;
pub mod privilege;
pub mod probe_arp;
pub mod probe_icmp;
pub mod probe_neighbors;
pub mod probe_snmp;
pub mod probe_ssh;
pub mod runtime;
pub mod rwlock;
pub mod synth_device;
pub mod synth_topology;
pub mod topology;
pub mod topology_connection;
pub mod topology_device;
pub mod topology_store;
pub mod topology_subnet;
pub mod user_profile;

pub static FOUNDATION_VERSION: &str = env!("CARGO_PKG_VERSION");
