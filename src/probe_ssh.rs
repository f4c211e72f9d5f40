use rand::prelude::*;
use regex::Regex;
use std::net::Ipv4Addr;
use thiserror::Error;
use tracing::trace;

// Fixed failure thresholds of the simulated transport
const SSH_AUTH_FAILURE_PROBABILITY: f64 = 0.15;
const SSH_TIMEOUT_PROBABILITY: f64 = 0.05;

#[derive(Debug, Error, PartialEq)]
pub enum SshError {
    #[error("authentication failed for {user}@{ip}")]
    AuthFailed { user: String, ip: Ipv4Addr },
    #[error("connection to {ip} port 22 timed out")]
    Timeout { ip: Ipv4Addr },
    #[error("unparseable command output from {ip}")]
    BadOutput { ip: Ipv4Addr },
}

#[derive(Debug, Clone, PartialEq)]
pub struct SshEvidence {
    pub sys_descr: String,
    pub uptime_seconds: u64,
    pub load_average: f32,
}

// Fabricate the banner an inventory command would print
fn synth_version_output(sys_descr: &str, uptime_seconds: u64, load_average: f32) -> String {
    let days = uptime_seconds / 86_400;
    let hours = (uptime_seconds % 86_400) / 3_600;
    format!(
        "{}\nup {} days, {} hours, load average: {:.2}, {:.2}, {:.2}\n",
        sys_descr,
        days,
        hours,
        load_average,
        load_average * 0.9,
        load_average * 0.8
    )
}

fn parse_version_output(ip: Ipv4Addr, output: &str) -> Result<SshEvidence, SshError> {
    let mut lines = output.lines();
    let sys_descr = match lines.next() {
        Some(line) if !line.is_empty() => line.to_string(),
        _ => return Err(SshError::BadOutput { ip }),
    };

    let re = Regex::new(
        r"up (?P<days>\d+) days, (?P<hours>\d+) hours, load average: (?P<load>[\d.]+)",
    )
    .unwrap();
    let caps = re.captures(output).ok_or(SshError::BadOutput { ip })?;
    let days: u64 = caps["days"].parse().map_err(|_| SshError::BadOutput { ip })?;
    let hours: u64 = caps["hours"]
        .parse()
        .map_err(|_| SshError::BadOutput { ip })?;
    let load_average: f32 = caps["load"]
        .parse()
        .map_err(|_| SshError::BadOutput { ip })?;

    Ok(SshEvidence {
        sys_descr,
        uptime_seconds: days * 86_400 + hours * 3_600,
        load_average,
    })
}

// Simulated credential-secured command run. Only hosts that accept SSH at
// all can answer, and the credential draw fails at a fixed rate so sweeps
// always report a few per-device credential failures.
pub fn run_version_command(
    rng: &mut StdRng,
    ip: Ipv4Addr,
    user: &str,
    accepts_ssh: bool,
    sys_descr: &str,
    uptime_seconds: u64,
) -> Result<SshEvidence, SshError> {
    if !accepts_ssh || rng.gen_bool(SSH_TIMEOUT_PROBABILITY) {
        return Err(SshError::Timeout { ip });
    }
    if rng.gen_bool(SSH_AUTH_FAILURE_PROBABILITY) {
        trace!("Simulated credential rejection for {}@{}", user, ip);
        return Err(SshError::AuthFailed {
            user: user.to_string(),
            ip,
        });
    }

    let load_average: f32 = rng.gen_range(0.05..3.5);
    let output = synth_version_output(sys_descr, uptime_seconds, load_average);
    trace!("ssh {}@{}: {} bytes of output", user, ip, output.len());

    parse_version_output(ip, &output)
}
