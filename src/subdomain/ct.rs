//! Certificate Transparency lookups via crt.sh.

use std::collections::BTreeSet;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::config::CT_LOOKUP_TIMEOUT;
use crate::domain::is_subdomain_of;

#[derive(Debug, Deserialize)]
struct CtEntry {
    #[serde(default)]
    name_value: String,
}

/// Extracts subdomains of `domain` from a crt.sh JSON response.
///
/// `name_value` holds one or more newline-separated names. Wildcards, email
/// addresses and names outside the target are skipped.
pub fn parse_ct_names(body: &str, domain: &str) -> Result<BTreeSet<String>> {
    let entries: Vec<CtEntry> =
        serde_json::from_str(body).context("crt.sh response is not a JSON array")?;
    Ok(entries
        .iter()
        .flat_map(|e| e.name_value.split('\n'))
        .map(|name| name.trim().trim_end_matches('.').to_lowercase())
        .filter(|name| !name.is_empty() && !name.starts_with('*') && !name.contains('@'))
        .filter(|name| is_subdomain_of(name, domain))
        .collect())
}

/// Queries `{base}/?q=%25.{domain}&output=json`.
///
/// # Errors
///
/// Returns an error on transport failure, non-2xx status or unparseable JSON.
pub async fn lookup_ct_subdomains(
    client: &reqwest::Client,
    base_url: &str,
    domain: &str,
) -> Result<BTreeSet<String>> {
    let url = format!("{}/", base_url.trim_end_matches('/'));
    let response = client
        .get(&url)
        .query(&[("q", format!("%.{}", domain)), ("output", "json".to_string())])
        .timeout(CT_LOOKUP_TIMEOUT)
        .send()
        .await
        .context("crt.sh request failed")?
        .error_for_status()
        .context("crt.sh returned an error status")?;
    let body = response.text().await.context("reading crt.sh body failed")?;
    if body.trim().is_empty() {
        return Ok(BTreeSet::new());
    }
    parse_ct_names(&body, domain)
}
