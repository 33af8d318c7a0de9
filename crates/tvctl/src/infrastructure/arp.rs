//! MAC address resolution from the system ARP table.
//!
//! Waking a powered-down TV needs its hardware address, but users usually
//! only know its IP.  If the TV was on this network recently its address is
//! still cached in the ARP table, so `wake <IP>` can look it up there — on
//! Linux straight from `/proc/net/arp`, elsewhere by parsing `arp -n`.
//!
//! Resolution is best effort: a cold cache (TV off for a long time, or a
//! router between us and it) yields [`ArpError::NotFound`], at which point
//! the user has to supply the MAC directly.

use std::net::IpAddr;

use thiserror::Error;
use tracing::debug;

use ssap_core::wake::MacAddr;

/// Errors produced while consulting the ARP table.
#[derive(Debug, Error)]
pub enum ArpError {
    /// The table could not be read at all.
    #[error("could not read the ARP table: {0}")]
    Table(String),

    /// The table has no usable entry for the address.
    #[error(
        "no ARP entry for {ip}; the TV must have been on this network \
         recently, or pass its MAC address instead"
    )]
    NotFound { ip: IpAddr },
}

/// Looks up the hardware address for `ip` in the system ARP table.
///
/// # Errors
///
/// [`ArpError::Table`] when the table is unreadable, [`ArpError::NotFound`]
/// when no entry for `ip` carries a MAC address.
#[cfg(target_os = "linux")]
pub async fn resolve_mac(ip: IpAddr) -> Result<MacAddr, ArpError> {
    let table = tokio::fs::read_to_string("/proc/net/arp")
        .await
        .map_err(|e| ArpError::Table(e.to_string()))?;
    debug!("scanning /proc/net/arp for {ip}");
    find_mac_for_ip(&table, ip).ok_or(ArpError::NotFound { ip })
}

/// Looks up the hardware address for `ip` in the system ARP table.
///
/// # Errors
///
/// [`ArpError::Table`] when `arp -n` cannot be run, [`ArpError::NotFound`]
/// when no entry for `ip` carries a MAC address.
#[cfg(not(target_os = "linux"))]
pub async fn resolve_mac(ip: IpAddr) -> Result<MacAddr, ArpError> {
    let output = tokio::process::Command::new("arp")
        .arg("-n")
        .arg(ip.to_string())
        .output()
        .await
        .map_err(|e| ArpError::Table(e.to_string()))?;
    let stdout = String::from_utf8_lossy(&output.stdout);
    debug!("scanning `arp -n {ip}` output");
    find_mac_for_ip(&stdout, ip).ok_or(ArpError::NotFound { ip })
}

/// Scans ARP output for the line describing `ip` and extracts its MAC.
///
/// The IP must match a whole token (so `10.0.0.7` never matches the
/// `10.0.0.75` entry); BSD-style `(10.0.0.75)` parentheses are stripped
/// before comparing.  All-zero addresses mark incomplete entries and are
/// skipped.
fn find_mac_for_ip(output: &str, ip: IpAddr) -> Option<MacAddr> {
    let ip = ip.to_string();
    for line in output.lines() {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        let is_entry = tokens
            .iter()
            .any(|t| t.trim_matches(|c| c == '(' || c == ')') == ip);
        if !is_entry {
            continue;
        }
        for token in tokens {
            if let Ok(mac) = token.parse::<MacAddr>() {
                if mac.octets() != [0; 6] {
                    return Some(mac);
                }
            }
        }
    }
    None
}

// ── Tests ─────────────────────────────────────────────────────────────────────
