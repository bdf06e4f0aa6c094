// Domain module tests.

use super::*;
use proptest::prelude::*;

#[test]
fn test_registrable_domain_basic() {
    assert_eq!(
        registrable_domain("www.example.com").as_deref(),
        Some("example.com")
    );
}

#[test]
fn test_registrable_domain_multi_part_suffix() {
    // co.id and go.id are public suffixes, so the registrable part keeps one more label
    assert_eq!(
        registrable_domain("a.b.example.co.id").as_deref(),
        Some("example.co.id")
    );
    assert_eq!(
        registrable_domain("portal.kemenkes.go.id").as_deref(),
        Some("kemenkes.go.id")
    );
}

#[test]
fn test_registrable_domain_ignores_port_and_case() {
    assert_eq!(
        registrable_domain("WWW.Example.COM:8443").as_deref(),
        Some("example.com")
    );
}

#[test]
fn test_registrable_domain_ip_is_none() {
    assert_eq!(registrable_domain("127.0.0.1"), None);
    assert_eq!(registrable_domain("127.0.0.1:8080"), None);
    assert_eq!(registrable_domain("[::1]:8080"), None);
}

#[test]
fn test_same_site_subdomains() {
    assert!(same_site("blog.example.go.id", "example.go.id"));
    assert!(same_site("example.go.id", "www.example.go.id"));
    assert!(!same_site("example.com", "example.go.id"));
    assert!(!same_site("evil-example.go.id", "example.go.id"));
}

#[test]
fn test_same_site_ip_hosts() {
    // IPs only match themselves; ports are ignored
    assert!(same_site("127.0.0.1:4000", "127.0.0.1:5000"));
    assert!(!same_site("127.0.0.2", "127.0.0.1"));
    assert!(!same_site("example.com", "127.0.0.1"));
}

#[test]
fn test_same_site_empty() {
    assert!(!same_site("", "example.com"));
    assert!(!same_site("example.com", ""));
}

#[test]
fn test_is_subdomain_of() {
    assert!(is_subdomain_of("mail.example.go.id", "example.go.id"));
    assert!(is_subdomain_of("a.b.example.go.id", "example.go.id"));
    assert!(!is_subdomain_of("example.go.id", "example.go.id"));
    assert!(!is_subdomain_of("badexample.go.id", "example.go.id"));
}

#[test]
fn test_host_of() {
    assert_eq!(
        host_of("https://Sub.Example.com/path?q=1").as_deref(),
        Some("sub.example.com")
    );
    assert_eq!(
        host_of("http://127.0.0.1:8080/").as_deref(),
        Some("127.0.0.1:8080")
    );
    assert_eq!(host_of("not a url"), None);
}

#[test]
fn test_hostname_of_drops_port() {
    assert_eq!(hostname_of("http://127.0.0.1:8080/").as_deref(), Some("127.0.0.1"));
    assert_eq!(hostname_of("http://[::1]:8080/x").as_deref(), Some("[::1]"));
    assert_eq!(hostname_of("https://[2001:DB8::1]/").as_deref(), Some("[2001:db8::1]"));
    assert_eq!(hostname_of("https://Example.go.id/").as_deref(), Some("example.go.id"));
    assert_eq!(hostname_of("not a url"), None);
}

#[test]
fn test_extract_domain_basic() {
    assert_eq!(
        extract_domain("https://www.example.go.id/path").unwrap(),
        "example.go.id"
    );
}

#[test]
fn test_extract_domain_with_query_and_fragment() {
    assert_eq!(
        extract_domain("https://example.com/path?query=1#fragment").unwrap(),
        "example.com"
    );
}

#[test]
fn test_extract_domain_ip_rejected() {
    assert!(extract_domain("http://192.168.1.1/").is_err());
}

#[test]
fn test_extract_domain_invalid_url() {
    assert!(extract_domain("not-a-url").is_err());
}

#[test]
fn test_normalize_domain_input() {
    assert_eq!(
        normalize_domain_input("https://www.Example.go.id/path?q=1").unwrap(),
        "example.go.id"
    );
    assert_eq!(
        normalize_domain_input("  example.go.id  ").unwrap(),
        "example.go.id"
    );
    assert_eq!(
        normalize_domain_input("sub.example.ac.id").unwrap(),
        "sub.example.ac.id"
    );
    assert_eq!(
        normalize_domain_input("http://127.0.0.1:8080").unwrap(),
        "127.0.0.1:8080"
    );
}

#[test]
fn test_normalize_domain_input_rejects_garbage() {
    assert!(normalize_domain_input("").is_err());
    assert!(normalize_domain_input("   ").is_err());
    assert!(normalize_domain_input("localhost").is_err());
    assert!(normalize_domain_input(&"a".repeat(400)).is_err());
}

// Property-based tests

proptest! {
    #[test]
    fn test_registrable_domain_idempotent(label in "[a-z]{1,12}", sub in "[a-z]{1,8}") {
        let host = format!("{}.{}.co.id", sub, label);
        if let Some(first) = registrable_domain(&host) {
            let second = registrable_domain(&first);
            prop_assert_eq!(Some(first), second);
        }
    }

    #[test]
    fn test_subdomains_are_same_site(label in "[a-z]{1,12}", sub in "[a-z]{1,8}") {
        let domain = format!("{}.go.id", label);
        let host = format!("{}.{}", sub, domain);
        prop_assert!(same_site(&host, &domain));
        prop_assert!(is_subdomain_of(&host, &domain));
    }

    #[test]
    fn test_normalize_domain_input_never_panics(input in ".{0,300}") {
        let _ = normalize_domain_input(&input);
    }
}
