use anyhow::{anyhow, Result};
use rand::prelude::*;
use regex::Regex;
use std::net::Ipv4Addr;
use tokio::time::{sleep, Duration};
use tracing::trace;

// Fixed loss threshold of the simulated ICMP path
const PING_LOSS_PROBABILITY: f64 = 0.30;

const TTL_POOL: [u8; 3] = [64, 128, 255];

#[derive(Debug, Clone, PartialEq)]
pub struct PingOutcome {
    pub ip: Ipv4Addr,
    pub rtt_ms: f32,
    pub ttl: u8,
}

// Fabricate one echo reply line in the classic ping format
fn synth_reply_line(ip: Ipv4Addr, ttl: u8, rtt_ms: f32) -> String {
    format!(
        "64 bytes from {}: icmp_seq=1 ttl={} time={:.2} ms",
        ip, ttl, rtt_ms
    )
}

fn parse_reply_line(line: &str) -> Result<PingOutcome> {
    let re = Regex::new(
        r"64 bytes from (?P<ip>[\d.]+): icmp_seq=\d+ ttl=(?P<ttl>\d+) time=(?P<time>[\d.]+) ms",
    )?;
    let caps = re
        .captures(line)
        .ok_or_else(|| anyhow!("Unparseable echo reply '{}'", line))?;
    Ok(PingOutcome {
        ip: caps["ip"].parse()?,
        ttl: caps["ttl"].parse()?,
        rtt_ms: caps["time"].parse()?,
    })
}

// Simulated echo request. The reply is rendered as a ping output line and
// parsed back, a host that is down or on the losing side of the loss draw
// reports a timeout.
pub async fn ping_host(
    rng: &mut StdRng,
    ip: Ipv4Addr,
    alive: bool,
    probe_delay_ms: u64,
) -> Result<PingOutcome> {
    if probe_delay_ms > 0 {
        sleep(Duration::from_millis(rng.gen_range(0..=probe_delay_ms))).await;
    }

    if !alive || rng.gen_bool(PING_LOSS_PROBABILITY) {
        trace!("Request timeout for icmp_seq 1 ({})", ip);
        return Err(anyhow!("Request timeout for icmp_seq 1 ({})", ip));
    }

    let ttl = TTL_POOL[rng.gen_range(0..TTL_POOL.len())];
    let rtt_ms: f32 = rng.gen_range(0.2..45.0);
    let line = synth_reply_line(ip, ttl, rtt_ms);
    trace!("{}", line);

    parse_reply_line(&line)
}
