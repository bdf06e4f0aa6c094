//! Domain blacklist (DNSBL) checks.

use std::net::IpAddr;

use futures::future::join_all;
use serde::{Deserialize, Serialize};

use crate::dns::{HostResolver, Resolution};

/// Domain-based block lists queried for every scan.
pub const DOMAIN_BLOCKLISTS: &[&str] = &["dbl.spamhaus.org", "multi.surbl.org", "multi.uribl.com"];

/// Outcome for one block list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlacklistCheck {
    pub list: String,
    pub listed: bool,
    /// Return code, when the list answered with one
    pub response: Option<String>,
    /// Set when the lookup failed or the list answered with an error code
    pub error: Option<String>,
}

/// Outcome across every block list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlacklistReport {
    pub is_blacklisted: bool,
    pub listed_on: Vec<String>,
    pub checks: Vec<BlacklistCheck>,
}

impl BlacklistReport {
    /// Whether any list failed to answer.
    pub fn has_errors(&self) -> bool {
        self.checks.iter().any(|c| c.error.is_some())
    }
}

/// Interprets a DNSBL A answer: 127.0.0.0/8 means listed, except the
/// 127.255.255.0/24 range which lists use for query errors.
fn interpret(ip: IpAddr) -> Result<bool, String> {
    match ip {
        IpAddr::V4(v4) => {
            let [a, b, c, _] = v4.octets();
            if a != 127 {
                Ok(false)
            } else if b == 255 && c == 255 {
                Err(format!("list returned error code {}", v4))
            } else {
                Ok(true)
            }
        }
        IpAddr::V6(_) => Ok(false),
    }
}

fn check_from(list: &str, resolution: Resolution) -> BlacklistCheck {
    let (listed, response, error) = match resolution {
        Resolution::Resolved(ip) => match interpret(ip) {
            Ok(listed) => (listed, Some(ip.to_string()), None),
            Err(e) => (false, Some(ip.to_string()), Some(e)),
        },
        Resolution::NotFound => (false, None, None),
        Resolution::Failed(e) => (false, None, Some(e)),
    };
    BlacklistCheck {
        list: list.to_string(),
        listed,
        response,
        error,
    }
}

/// Looks up `{domain}.{list}` on every list in [`DOMAIN_BLOCKLISTS`].
pub async fn check_blacklists(resolver: &dyn HostResolver, domain: &str) -> BlacklistReport {
    let queries: Vec<String> = DOMAIN_BLOCKLISTS
        .iter()
        .map(|list| format!("{}.{}", domain, list))
        .collect();
    let resolutions = join_all(queries.iter().map(|q| resolver.resolve(q))).await;

    let checks: Vec<BlacklistCheck> = DOMAIN_BLOCKLISTS
        .iter()
        .zip(resolutions)
        .map(|(list, resolution)| check_from(list, resolution))
        .collect();
    let listed_on: Vec<String> = checks
        .iter()
        .filter(|c| c.listed)
        .map(|c| c.list.clone())
        .collect();
    BlacklistReport {
        is_blacklisted: !listed_on.is_empty(),
        listed_on,
        checks,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dns::StaticResolver;
    use std::net::Ipv4Addr;

    #[tokio::test]
    async fn test_check_blacklists() {
        let resolver = StaticResolver::new()
            .with_record(
                "example.go.id.dbl.spamhaus.org",
                IpAddr::V4(Ipv4Addr::new(127, 0, 1, 2)),
            )
            .with_record(
                "example.go.id.multi.surbl.org",
                IpAddr::V4(Ipv4Addr::new(127, 255, 255, 254)),
            )
            .with_failure("example.go.id.multi.uribl.com", "timed out");

        let report = check_blacklists(&resolver, "example.go.id").await;
        assert!(report.is_blacklisted);
        assert_eq!(report.listed_on, vec!["dbl.spamhaus.org"]);
        assert_eq!(report.checks.len(), 3);
        assert!(!report.checks[1].listed);
        assert!(report.checks[1].error.is_some());
        assert!(report.has_errors());
    }

    #[tokio::test]
    async fn test_clean_domain() {
        let report = check_blacklists(&StaticResolver::new(), "example.go.id").await;
        assert!(!report.is_blacklisted);
        assert!(report.listed_on.is_empty());
        assert!(!report.has_errors());
    }

    #[test]
    fn test_interpret() {
        assert_eq!(interpret(IpAddr::V4(Ipv4Addr::new(127, 0, 0, 2))), Ok(true));
        assert_eq!(interpret(IpAddr::V4(Ipv4Addr::new(10, 0, 0, 2))), Ok(false));
        assert!(interpret(IpAddr::V4(Ipv4Addr::new(127, 255, 255, 252))).is_err());
    }
}
