//! Domain extraction and normalization utilities.
//!
//! This module provides functions to reason about domain membership using the
//! Public Suffix List (PSL):
//! - `normalize_domain_input()` - Turns user input into a bare scan target
//! - `registrable_domain()` - domain+suffix of a hostname (`a.b.example.co.id` → `example.co.id`)
//! - `same_site()` - Internal-link / subdomain membership test
//! - `extract_domain()` - Registrable domain of a URL

use anyhow::{Context, Result};

/// Longest hostname allowed by DNS.
const MAX_DOMAIN_LENGTH: usize = 253;

fn is_ip_literal(host: &str) -> bool {
    let bare = host.trim_start_matches('[').trim_end_matches(']');
    bare.parse::<std::net::IpAddr>().is_ok()
}

/// Strips a port and trailing dot, and lowercases a host.
fn bare_host(host: &str) -> String {
    let host = host.trim().trim_end_matches('.').to_lowercase();
    if host.starts_with('[') {
        // IPv6 literal, keep brackets out of the comparison
        return host
            .split(']')
            .next()
            .unwrap_or_default()
            .trim_start_matches('[')
            .to_string();
    }
    match host.rsplit_once(':') {
        Some((name, port)) if port.chars().all(|c| c.is_ascii_digit()) => name.to_string(),
        _ => host,
    }
}

/// Returns the registrable domain (domain + public suffix) of a hostname.
///
/// # Arguments
///
/// * `host` - A hostname, optionally with a port
///
/// # Returns
///
/// `None` for IP addresses and hosts the PSL cannot split (e.g. a bare suffix).
pub fn registrable_domain(host: &str) -> Option<String> {
    let host = bare_host(host);
    if host.is_empty() || is_ip_literal(&host) {
        return None;
    }
    psl::domain_str(&host).map(|d| d.to_string())
}

/// Returns true if `host` belongs to the same site as `target`.
///
/// Two hostnames belong to the same site when their registrable domains match,
/// so every subdomain of the target counts as internal. IP addresses only match
/// themselves. Ports are ignored.
///
/// # Arguments
///
/// * `host` - The hostname to test
/// * `target` - The scan target (domain or host)
pub fn same_site(host: &str, target: &str) -> bool {
    let host = bare_host(host);
    let target = bare_host(target);
    if host.is_empty() || target.is_empty() {
        return false;
    }
    if is_ip_literal(&host) || is_ip_literal(&target) {
        return host == target;
    }
    match (registrable_domain(&host), registrable_domain(&target)) {
        (Some(a), Some(b)) => a == b,
        _ => host == target || host.ends_with(&format!(".{}", target)),
    }
}

/// Returns true if `host` is a strict subdomain of `domain`.
pub fn is_subdomain_of(host: &str, domain: &str) -> bool {
    let host = bare_host(host);
    let domain = bare_host(domain);
    host.len() > domain.len() && host.ends_with(&format!(".{}", domain))
}

/// Returns the lowercased host (with port, if any) of a URL.
pub fn host_of(url: &str) -> Option<String> {
    let parsed = url::Url::parse(url).ok()?;
    let host = parsed.host_str()?.to_lowercase();
    Some(match parsed.port() {
        Some(port) => format!("{}:{}", host, port),
        None => host,
    })
}

/// Returns the lowercased host of a URL without its port. IPv6 literals
/// keep their brackets.
pub fn hostname_of(url: &str) -> Option<String> {
    let parsed = url::Url::parse(url).ok()?;
    Some(parsed.host_str()?.to_lowercase())
}

/// Extracts the registrable domain from a URL.
///
/// # Arguments
///
/// * `url` - The URL to extract the domain from
///
/// # Returns
///
/// The registrable domain (e.g., "example.go.id" from "https://www.example.go.id/path")
///
/// # Errors
///
/// Returns an error if the URL cannot be parsed, has no host, is an IP address,
/// or the PSL cannot split the host.
pub fn extract_domain(url: &str) -> Result<String> {
    let parsed = url::Url::parse(url).with_context(|| format!("Failed to parse URL: {}", url))?;

    let host = parsed
        .host_str()
        .ok_or_else(|| anyhow::anyhow!("URL '{}' has no host component", url))?;

    if matches!(
        parsed.host(),
        Some(url::Host::Ipv4(_)) | Some(url::Host::Ipv6(_))
    ) {
        return Err(anyhow::anyhow!(
            "IP addresses do not have registrable domains: {}",
            host
        ));
    }

    registrable_domain(host)
        .ok_or_else(|| anyhow::anyhow!("No registrable domain found in URL: {}", url))
}

/// Normalizes user input into a bare scan target.
///
/// Accepts a domain or a URL, drops the scheme, path, query and a leading `www.`,
/// and lowercases the result. A non-default port is kept so local test servers can
/// be scanned.
///
/// # Errors
///
/// Returns an error if the input is empty, too long, or not a valid host.
pub fn normalize_domain_input(input: &str) -> Result<String> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        anyhow::bail!("Empty domain");
    }
    if trimmed.len() > MAX_DOMAIN_LENGTH + 16 {
        let prefix: String = trimmed.chars().take(32).collect();
        anyhow::bail!("Domain exceeds maximum length: {}...", prefix);
    }

    let with_scheme = if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        trimmed.to_string()
    } else {
        format!("https://{}", trimmed)
    };

    let host = host_of(&with_scheme)
        .ok_or_else(|| anyhow::anyhow!("Invalid domain: {}", input))?;
    let host = host.strip_prefix("www.").unwrap_or(&host).to_string();

    if bare_host(&host).len() > MAX_DOMAIN_LENGTH || !bare_host(&host).contains('.') {
        anyhow::bail!("Invalid domain: {}", input);
    }
    Ok(host)
}
