//! DNS resolution.
//!
//! This module provides async forward lookups behind the [`HostResolver`]
//! trait, implemented for `hickory-resolver`'s `TokioAsyncResolver` and for a
//! fixed in-memory table.

mod resolution;

// Re-export public API
pub use resolution::{HostResolver, Resolution, StaticResolver};

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::{IpAddr, Ipv4Addr};

    #[tokio::test]
    async fn test_static_resolver() {
        let ip = IpAddr::V4(Ipv4Addr::new(10, 0, 0, 1));
        let resolver = StaticResolver::new()
            .with_record("Mail.Example.go.id", ip)
            .with_failure("flaky.example.go.id", "timed out");

        assert_eq!(
            resolver.resolve("mail.example.go.id.").await,
            Resolution::Resolved(ip)
        );
        assert_eq!(resolver.resolve("nope.example.go.id").await, Resolution::NotFound);
        assert!(matches!(
            resolver.resolve("flaky.example.go.id").await,
            Resolution::Failed(_)
        ));
        assert_eq!(resolver.resolve("mail.example.go.id").await.ip(), Some(ip));
    }
}
