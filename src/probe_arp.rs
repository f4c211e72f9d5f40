use anyhow::{anyhow, Result};
use eui48::MacAddress;
use rand::prelude::*;
use std::net::Ipv4Addr;
use tracing::trace;

// Entries go incomplete when the fabricated cache misses
const ARP_INCOMPLETE_PROBABILITY: f64 = 0.05;

// Fabricate one `arp -an` style line
fn synth_arp_line(ip: Ipv4Addr, mac: &MacAddress, incomplete: bool) -> String {
    if incomplete {
        format!("? ({}) at (incomplete) on eth0 ifscope [ethernet]", ip)
    } else {
        format!(
            "? ({}) at {} on eth0 ifscope [ethernet]",
            ip,
            mac.to_hex_string()
        )
    }
}

fn sanitize_mac(s: &str) -> Option<MacAddress> {
    let mut bytes_iter = s.split(':').flat_map(|x| u8::from_str_radix(x, 16).ok());
    Some(MacAddress::new([
        bytes_iter.next()?,
        bytes_iter.next()?,
        bytes_iter.next()?,
        bytes_iter.next()?,
        bytes_iter.next()?,
        bytes_iter.next()?,
    ]))
}

// Parse an `arp -an` line, e.g. "? (192.168.1.5) at 00:11:22:33:44:55 on eth0"
fn parse_arp_line(row: &str) -> Option<(Ipv4Addr, MacAddress)> {
    let mut parts = row.split_whitespace().skip(1); // skip "?"
    let ip_str = parts.next()?;
    let ip_str = ip_str.trim_start_matches('(').trim_end_matches(')');
    let ip = ip_str.parse().ok()?;

    let at_word = parts.next()?;
    if at_word != "at" {
        return None;
    }
    let mac_str = parts.next()?;
    if mac_str == "(incomplete)" {
        return None;
    }
    let mac = sanitize_mac(mac_str)?;
    Some((ip, mac))
}

// Simulated neighbor cache lookup for a responding host. The entry is
// rendered in arp output format and parsed back.
pub fn arp_lookup(rng: &mut StdRng, ip: Ipv4Addr, mac: &MacAddress) -> Result<MacAddress> {
    let incomplete = rng.gen_bool(ARP_INCOMPLETE_PROBABILITY);
    let line = synth_arp_line(ip, mac, incomplete);
    trace!("{}", line);

    match parse_arp_line(&line) {
        Some((parsed_ip, parsed_mac)) if parsed_ip == ip => Ok(parsed_mac),
        Some((parsed_ip, _)) => Err(anyhow!(
            "ARP cache answered for {} while resolving {}",
            parsed_ip,
            ip
        )),
        None => Err(anyhow!("No valid MAC address found for {}", ip)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arp_line_round_trip() {
        let mac = MacAddress::new([0x00, 0x1b, 0x54, 0xaa, 0xbb, 0xcc]);
        let line = synth_arp_line(Ipv4Addr::new(192, 168, 1, 5), &mac, false);
        let (ip, parsed) = parse_arp_line(&line).unwrap();
        assert_eq!(ip, Ipv4Addr::new(192, 168, 1, 5));
        assert_eq!(parsed, mac);
    }

    #[test]
    fn test_incomplete_entry_rejected() {
        let mac = MacAddress::new([0x00, 0x1b, 0x54, 0xaa, 0xbb, 0xcc]);
        let line = synth_arp_line(Ipv4Addr::new(192, 168, 1, 5), &mac, true);
        assert!(parse_arp_line(&line).is_none());
    }

    #[test]
    fn test_lookup_mostly_resolves() {
        let mut rng = StdRng::seed_from_u64(3);
        let mac = MacAddress::new([0x00, 0x1b, 0x54, 0x01, 0x02, 0x03]);
        let mut resolved = 0;
        for _ in 0..50 {
            if arp_lookup(&mut rng, Ipv4Addr::new(10, 0, 0, 5), &mac).is_ok() {
                resolved += 1;
            }
        }
        assert!(resolved > 40);
    }
}
