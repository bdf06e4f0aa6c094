//! RDAP registration lookups.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Registration data for a domain.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WhoisInfo {
    /// Domain creation date
    pub creation_date: Option<DateTime<Utc>>,
    /// Domain expiration date
    pub expiration_date: Option<DateTime<Utc>>,
    /// Domain updated date
    pub updated_date: Option<DateTime<Utc>>,
    /// Registrar name
    pub registrar: Option<String>,
    /// Domain status (e.g., "client transfer prohibited")
    pub status: Vec<String>,
    /// Nameservers, lowercased
    pub nameservers: Vec<String>,
}

/// Attempts to parse a date string in various formats
fn parse_date_string(date_str: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(date_str) {
        return Some(dt.with_timezone(&Utc));
    }
    let formats = ["%Y-%m-%dT%H:%M:%S%.fZ", "%Y-%m-%dT%H:%M:%SZ", "%Y-%m-%d %H:%M:%S"];
    for format in &formats {
        if let Ok(naive_dt) = chrono::NaiveDateTime::parse_from_str(date_str, format) {
            return Some(naive_dt.and_utc());
        }
    }
    chrono::NaiveDate::parse_from_str(date_str, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}

fn event_date(doc: &Value, action: &str) -> Option<DateTime<Utc>> {
    doc.get("events")?
        .as_array()?
        .iter()
        .find(|e| e.get("eventAction").and_then(Value::as_str) == Some(action))
        .and_then(|e| e.get("eventDate"))
        .and_then(Value::as_str)
        .and_then(parse_date_string)
}

/// Formatted name (`fn`) of the first entity holding the registrar role.
fn registrar_name(doc: &Value) -> Option<String> {
    let entities = doc.get("entities")?.as_array()?;
    let registrar = entities.iter().find(|e| {
        e.get("roles")
            .and_then(Value::as_array)
            .is_some_and(|roles| roles.iter().any(|r| r.as_str() == Some("registrar")))
    })?;
    // vcardArray = ["vcard", [[name, params, type, value], ...]]
    registrar
        .get("vcardArray")?
        .get(1)?
        .as_array()?
        .iter()
        .find(|prop| prop.get(0).and_then(Value::as_str) == Some("fn"))
        .and_then(|prop| prop.get(3))
        .and_then(Value::as_str)
        .map(str::to_string)
}

/// Parses an RDAP domain object.
///
/// # Errors
///
/// Returns an error if `body` is not JSON or is not an RDAP domain object.
pub fn parse_rdap(body: &str) -> Result<WhoisInfo> {
    let doc: Value = serde_json::from_str(body).context("RDAP response is not JSON")?;
    if doc.get("objectClassName").and_then(Value::as_str) != Some("domain") {
        anyhow::bail!("RDAP response is not a domain object");
    }

    let status = doc
        .get("status")
        .and_then(Value::as_array)
        .map(|s| s.iter().filter_map(Value::as_str).map(str::to_string).collect())
        .unwrap_or_default();
    let nameservers = doc
        .get("nameservers")
        .and_then(Value::as_array)
        .map(|ns| {
            ns.iter()
                .filter_map(|n| n.get("ldhName").and_then(Value::as_str))
                .map(str::to_lowercase)
                .collect()
        })
        .unwrap_or_default();

    Ok(WhoisInfo {
        creation_date: event_date(&doc, "registration"),
        expiration_date: event_date(&doc, "expiration"),
        updated_date: event_date(&doc, "last changed"),
        registrar: registrar_name(&doc),
        status,
        nameservers,
    })
}

/// Fetches `{rdap_url}/domain/{domain}`.
///
/// # Errors
///
/// Returns an error on transport failure, non-2xx status or an unparseable body.
pub async fn lookup_rdap(client: &reqwest::Client, rdap_url: &str, domain: &str) -> Result<WhoisInfo> {
    let url = format!("{}/domain/{}", rdap_url.trim_end_matches('/'), domain);
    let body = client
        .get(&url)
        .header(reqwest::header::ACCEPT, "application/rdap+json, application/json")
        .send()
        .await
        .context("RDAP request failed")?
        .error_for_status()
        .context("RDAP server returned an error status")?
        .text()
        .await
        .context("reading RDAP body failed")?;
    parse_rdap(&body)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "objectClassName": "domain",
        "ldhName": "EXAMPLE.GO.ID",
        "status": ["active", "client transfer prohibited"],
        "events": [
            {"eventAction": "registration", "eventDate": "2010-03-01T00:00:00Z"},
            {"eventAction": "expiration", "eventDate": "2027-03-01T00:00:00Z"},
            {"eventAction": "last changed", "eventDate": "2024-05-10T08:30:00.123Z"}
        ],
        "entities": [
            {"roles": ["technical"], "vcardArray": ["vcard", [["fn", {}, "text", "Tech Person"]]]},
            {"roles": ["registrar"], "vcardArray": ["vcard", [
                ["version", {}, "text", "4.0"],
                ["fn", {}, "text", "PANDI Registrar"]
            ]]}
        ],
        "nameservers": [{"ldhName": "NS1.EXAMPLE.GO.ID"}, {"ldhName": "ns2.example.go.id"}]
    }"#;

    #[test]
    fn test_parse_rdap() {
        let info = parse_rdap(SAMPLE).unwrap();
        assert_eq!(info.registrar.as_deref(), Some("PANDI Registrar"));
        assert_eq!(
            info.creation_date.map(|d| d.to_rfc3339()),
            Some("2010-03-01T00:00:00+00:00".to_string())
        );
        assert!(info.expiration_date.is_some());
        assert!(info.updated_date.is_some());
        assert_eq!(info.status.len(), 2);
        assert_eq!(info.nameservers, vec!["ns1.example.go.id", "ns2.example.go.id"]);
    }

    #[test]
    fn test_parse_rdap_minimal() {
        let info = parse_rdap(r#"{"objectClassName": "domain"}"#).unwrap();
        assert_eq!(info, WhoisInfo::default());
    }

    #[test]
    fn test_parse_rdap_rejects_error_objects() {
        assert!(parse_rdap(r#"{"errorCode": 404, "title": "Not Found"}"#).is_err());
        assert!(parse_rdap("not json").is_err());
    }

    #[test]
    fn test_parse_date_formats() {
        assert!(parse_date_string("2024-01-02").is_some());
        assert!(parse_date_string("2024-01-02 03:04:05").is_some());
        assert!(parse_date_string("2024-01-02T03:04:05+07:00").is_some());
        assert!(parse_date_string("yesterday").is_none());
    }
}
