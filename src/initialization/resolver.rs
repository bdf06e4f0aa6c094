//! DNS resolver initialization.

use std::sync::Arc;
use std::time::Duration;

use hickory_resolver::TokioAsyncResolver;

use crate::error_handling::InitializationError;

/// Initializes the DNS resolver used for subdomain brute-forcing, the resolution
/// post-pass and DNSBL lookups.
///
/// Timeouts are aggressive because a wordlist scan issues ~100 lookups and most
/// of them are expected to fail with NXDOMAIN.
///
/// # Errors
///
/// Returns `InitializationError::DnsResolverError` if the resolver cannot be built.
pub fn init_resolver() -> Result<Arc<TokioAsyncResolver>, InitializationError> {
    use hickory_resolver::config::{ResolverConfig, ResolverOpts};

    let mut opts = ResolverOpts::default();
    opts.timeout = Duration::from_secs(crate::config::DNS_TIMEOUT_SECS);
    opts.attempts = 2;
    // Prevent search-domain appending; every name we look up is fully qualified
    opts.ndots = 0;

    Ok(Arc::new(TokioAsyncResolver::tokio(
        ResolverConfig::default(),
        opts,
    )))
}
