//! Common subdomain prefixes for DNS brute-forcing.

/// Prefixes tried against every target.
pub const SUBDOMAIN_WORDLIST: &[&str] = &[
    "www", "mail", "webmail", "smtp", "pop", "imap", "ftp", "sftp", "ns1", "ns2", "dns", "mx",
    "remote", "vpn", "portal", "intranet", "extranet", "admin", "administrator", "cpanel",
    "whm", "webdisk", "autodiscover", "autoconfig", "blog", "news", "berita", "forum", "wiki",
    "docs", "help", "support", "helpdesk", "status", "api", "dev", "development", "staging",
    "stage", "test", "testing", "demo", "beta", "old", "new", "backup", "bak", "temp", "tmp",
    "static", "assets", "cdn", "media", "img", "images", "files", "download", "downloads",
    "upload", "uploads", "app", "apps", "mobile", "m", "shop", "store", "pay", "billing",
    "sso", "login", "auth", "accounts", "db", "mysql", "sql", "git", "gitlab", "jenkins",
    "monitor", "grafana", "elearning", "lms", "moodle", "siakad", "sim", "simpeg", "spmb",
    "pmb", "ppdb", "akademik", "perpustakaan", "library", "journal", "jurnal", "ejournal",
    "repository", "eprints", "lpse", "jdih", "ppid", "bkd", "dinas", "opendata", "data",
    "survey", "event", "career", "karir",
];
