use anyhow::{anyhow, Result};
use rand::prelude::*;
use regex::Regex;
use std::net::Ipv4Addr;
use tracing::trace;

// Agents reject the fabricated community string at this rate
const SNMP_COMMUNITY_MISMATCH_PROBABILITY: f64 = 0.05;

#[derive(Debug, Clone, PartialEq)]
pub struct SnmpSystemInfo {
    pub sys_name: String,
    pub sys_descr: String,
    pub sys_location: String,
    pub uptime_seconds: u64,
}

// Fabricate a system-group walk in the familiar snmpwalk rendering
fn synth_walk_output(
    sys_name: &str,
    sys_descr: &str,
    sys_location: &str,
    uptime_seconds: u64,
) -> String {
    let ticks = uptime_seconds * 100;
    let days = uptime_seconds / 86_400;
    format!(
        "SNMPv2-MIB::sysDescr.0 = STRING: {}\n\
         SNMPv2-MIB::sysUpTime.0 = Timeticks: ({}) {} days\n\
         SNMPv2-MIB::sysName.0 = STRING: {}\n\
         SNMPv2-MIB::sysLocation.0 = STRING: {}\n",
        sys_descr, ticks, days, sys_name, sys_location
    )
}

fn walk_string(output: &str, field: &str) -> Result<String> {
    let re = Regex::new(&format!(
        r"SNMPv2-MIB::{}\.0 = STRING: (?P<value>.+)",
        regex::escape(field)
    ))?;
    let caps = re
        .captures(output)
        .ok_or_else(|| anyhow!("No {} varbind in walk output", field))?;
    Ok(caps["value"].trim().to_string())
}

fn parse_walk_output(output: &str) -> Result<SnmpSystemInfo> {
    let uptime_re = Regex::new(r"sysUpTime\.0 = Timeticks: \((?P<ticks>\d+)\)")?;
    let ticks: u64 = uptime_re
        .captures(output)
        .ok_or_else(|| anyhow!("No sysUpTime varbind in walk output"))?["ticks"]
        .parse()?;

    Ok(SnmpSystemInfo {
        sys_name: walk_string(output, "sysName")?,
        sys_descr: walk_string(output, "sysDescr")?,
        sys_location: walk_string(output, "sysLocation")?,
        uptime_seconds: ticks / 100,
    })
}

// Simulated GET/WALK of the system group. `has_agent` reflects whether the
// fabricated host runs an agent at all, endpoints mostly do not.
pub fn snmp_walk_system(
    rng: &mut StdRng,
    ip: Ipv4Addr,
    has_agent: bool,
    sys_name: &str,
    sys_descr: &str,
    sys_location: &str,
    uptime_seconds: u64,
) -> Result<SnmpSystemInfo> {
    if !has_agent {
        return Err(anyhow!("Timeout: No Response from {}:161", ip));
    }
    if rng.gen_bool(SNMP_COMMUNITY_MISMATCH_PROBABILITY) {
        // The real tool prints this when the community string is wrong
        return Err(anyhow!("Timeout: No Response from {}:161 (bad community)", ip));
    }

    let output = synth_walk_output(sys_name, sys_descr, sys_location, uptime_seconds);
    trace!("snmpwalk {}: {} bytes of output", ip, output.len());

    parse_walk_output(&output)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_walk_round_trip() {
        let output = synth_walk_output(
            "core-sw-01",
            "Arista EOS 4.30.5M",
            "server-room-1",
            186_400,
        );
        let info = parse_walk_output(&output).unwrap();
        assert_eq!(info.sys_name, "core-sw-01");
        assert_eq!(info.sys_descr, "Arista EOS 4.30.5M");
        assert_eq!(info.sys_location, "server-room-1");
        assert_eq!(info.uptime_seconds, 186_400);
    }

    #[test]
    fn test_missing_varbind_rejected() {
        assert!(parse_walk_output("IF-MIB::ifIndex.1 = INTEGER: 1").is_err());
    }

    #[test]
    fn test_no_agent_times_out() {
        let mut rng = StdRng::seed_from_u64(4);
        let result = snmp_walk_system(
            &mut rng,
            Ipv4Addr::new(10, 0, 0, 30),
            false,
            "ws-01",
            "Windows 11 Pro 22631",
            "bldg-a-floor1",
            3600,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_agent_mostly_answers() {
        let mut rng = StdRng::seed_from_u64(5);
        let mut answers = 0;
        for _ in 0..50 {
            if snmp_walk_system(
                &mut rng,
                Ipv4Addr::new(10, 0, 0, 1),
                true,
                "core-rt-01",
                "Cisco IOS XE Software, Version 17.09.04a",
                "server-room-1",
                864_000,
            )
            .is_ok()
            {
                answers += 1;
            }
        }
        assert!(answers > 40);
    }
}
