//! Host resolution for the port registry.
//!
//! Order: `TRADING_SYSTEM_HOST` env override -> detected LAN IP -> `localhost`.
//! Deliberately no other fallback, so a misconfigured environment fails
//! loudly via a bad bind rather than silently picking a surprising host.

use std::net::UdpSocket;

/// Resolve the host every service should bind to / be addressed at.
#[must_use]
pub fn resolve_host() -> String {
    if let Ok(host) = std::env::var("TRADING_SYSTEM_HOST") {
        if !host.is_empty() {
            return host;
        }
    }

    detect_lan_ip().unwrap_or_else(|| "localhost".to_string())
}

/// Detect the machine's LAN IP by opening a UDP socket toward a
/// non-routable address and reading back the local endpoint the OS chose.
/// No packets are actually sent.
fn detect_lan_ip() -> Option<String> {
    let socket = UdpSocket::bind("0.0.0.0:0").ok()?;
    socket.connect("10.254.254.254:1").ok()?;
    let addr = socket.local_addr().ok()?;
    Some(addr.ip().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_override_takes_precedence() {
        std::env::set_var("TRADING_SYSTEM_HOST", "192.0.2.10");
        assert_eq!(resolve_host(), "192.0.2.10");
        std::env::remove_var("TRADING_SYSTEM_HOST");
    }

    #[test]
    fn test_resolve_host_never_panics_without_env() {
        std::env::remove_var("TRADING_SYSTEM_HOST");
        let host = resolve_host();
        assert!(!host.is_empty());
    }
}
