//! Fully-qualified host name used in bus topics.

use std::io;
use std::net::IpAddr;

/// The canonical name of this host as reported by the resolver.
///
/// Falls back to the bare host name when no resolved name is qualified, and
/// to `localhost` when the host name cannot be read.
pub fn fqdn() -> String {
    let hostname = dns_lookup::get_hostname().unwrap_or_else(|err| {
        tracing::warn!(error = %err, "cannot read host name");
        "localhost".to_string()
    });
    resolve_with(&hostname, dns_lookup::lookup_host, dns_lookup::lookup_addr)
}

/// Forward-resolve `hostname`, then take the first reverse name of its
/// addresses that contains a dot.
fn resolve_with(
    hostname: &str,
    forward: impl Fn(&str) -> io::Result<Vec<IpAddr>>,
    reverse: impl Fn(&IpAddr) -> io::Result<String>,
) -> String {
    let addresses = match forward(hostname) {
        Ok(addresses) => addresses,
        Err(err) => {
            tracing::debug!(hostname, error = %err, "host name does not resolve");
            return hostname.to_string();
        }
    };

    addresses
        .iter()
        .filter_map(|address| reverse(address).ok())
        .find(|name| name.contains('.'))
        .unwrap_or_else(|| hostname.to_string())
}
