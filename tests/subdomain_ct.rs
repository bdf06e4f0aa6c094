//! Integration tests for subdomain enumeration with a mocked crt.sh and a
//! static resolver.

mod helpers;

use std::net::{IpAddr, Ipv4Addr};
use std::sync::Arc;

use seo_poison_scanner::dns::{HostResolver, StaticResolver};
use seo_poison_scanner::error_handling::{ErrorType, ScanStats};
use seo_poison_scanner::subdomain::{DiscoveryMethod, SubdomainEnumerator, SubdomainStatus};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use helpers::client;

const DOMAIN: &str = "example.go.id";

fn resolver() -> Arc<dyn HostResolver> {
    Arc::new(
        StaticResolver::new()
            .with_record("mail.example.go.id", IpAddr::V4(Ipv4Addr::new(10, 0, 0, 2)))
            .with_record("www.example.go.id", IpAddr::V4(Ipv4Addr::new(10, 0, 0, 1)))
            .with_failure("vpn.example.go.id", "SERVFAIL"),
    )
}

async fn mock_crtsh(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/crtsh/"))
        .and(query_param("q", "%.example.go.id"))
        .and(query_param("output", "json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            {"name_value": "mail.example.go.id\n*.example.go.id"},
            {"name_value": "lama.example.go.id"},
            {"name_value": "vpn.example.go.id"},
            {"name_value": "phish.other.go.id"}
        ])))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_ct_names_are_resolved() {
    let server = MockServer::start().await;
    mock_crtsh(&server).await;
    let stats = Arc::new(ScanStats::new());
    let enumerator = SubdomainEnumerator::new(
        resolver(),
        client(),
        &format!("{}/crtsh", server.uri()),
        stats.clone(),
    );

    let report = enumerator.enumerate(DOMAIN, false, None).await;

    let status: Vec<(&str, SubdomainStatus)> = report
        .subdomains
        .iter()
        .map(|r| (r.subdomain.as_str(), r.status))
        .collect();
    assert_eq!(
        status,
        vec![
            ("lama.example.go.id", SubdomainStatus::Inactive),
            ("mail.example.go.id", SubdomainStatus::Active),
            ("vpn.example.go.id", SubdomainStatus::Unknown),
        ]
    );
    assert_eq!(report.total_subdomains, 3);
    assert_eq!(report.techniques_used, vec![DiscoveryMethod::CertificateTransparency]);
    assert_eq!(report.active().collect::<Vec<_>>(), vec!["mail.example.go.id"]);
    assert_eq!(stats.get(ErrorType::SubdomainDnsError), 1);
}

#[tokio::test]
async fn test_dns_and_ct_merge() {
    let server = MockServer::start().await;
    mock_crtsh(&server).await;
    let enumerator = SubdomainEnumerator::new(
        resolver(),
        client(),
        &format!("{}/crtsh", server.uri()),
        Arc::new(ScanStats::new()),
    );

    let report = enumerator.enumerate(DOMAIN, true, None).await;

    let mail = report
        .subdomains
        .iter()
        .find(|r| r.subdomain == "mail.example.go.id")
        .expect("mail found");
    // DNS ran first, so it is credited with the discovery
    assert_eq!(mail.discovery_method, DiscoveryMethod::Dns);
    assert_eq!(mail.ip.as_deref(), Some("10.0.0.2"));
    assert!(report.subdomains.iter().any(|r| r.subdomain == "www.example.go.id"));
    assert_eq!(
        report.techniques_used,
        vec![DiscoveryMethod::Dns, DiscoveryMethod::CertificateTransparency]
    );
}

#[tokio::test]
async fn test_crtsh_failure_is_counted() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/crtsh/"))
        .respond_with(ResponseTemplate::new(502))
        .mount(&server)
        .await;
    let stats = Arc::new(ScanStats::new());
    let enumerator = SubdomainEnumerator::new(
        resolver(),
        client(),
        &format!("{}/crtsh", server.uri()),
        stats.clone(),
    );

    let report = enumerator.enumerate(DOMAIN, false, None).await;

    assert_eq!(report.total_subdomains, 0);
    assert!(report.techniques_used.is_empty());
    assert_eq!(stats.get(ErrorType::CertificateTransparencyError), 1);
}
