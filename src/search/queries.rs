//! Search query construction.
//!
//! Queries are boolean, domain-scoped (`site:`) and target four keyword
//! clusters. Each mode also emits `inurl:` variants so keywords hidden in URL
//! paths or parameters are found even when the page text is clean.

/// A named group of search terms.
#[derive(Debug, Clone, Copy)]
pub struct QueryCluster {
    /// Cluster name (for logs)
    pub name: &'static str,
    /// Phrases searched in page text
    pub terms: &'static [&'static str],
    /// Single tokens searched in URLs
    pub url_terms: &'static [&'static str],
}

/// Keyword clusters targeted by search queries.
pub const QUERY_CLUSTERS: &[QueryCluster] = &[
    QueryCluster {
        name: "judi",
        terms: &["slot gacor", "judi online", "situs slot", "slot online", "togel"],
        url_terms: &["slot", "judi", "togel", "gacor"],
    },
    QueryCluster {
        name: "porn",
        terms: &["bokep", "video bokep", "situs dewasa", "xxx"],
        url_terms: &["bokep", "porn"],
    },
    QueryCluster {
        name: "hacked",
        terms: &["hacked by", "defaced by"],
        url_terms: &["shell", "deface"],
    },
    QueryCluster {
        name: "casino",
        terms: &["casino online", "poker online", "sbobet", "maxwin"],
        url_terms: &["casino", "sbobet"],
    },
];

fn or_phrases<'a>(terms: impl Iterator<Item = &'a &'a str>) -> String {
    terms
        .map(|t| format!("\"{}\"", t))
        .collect::<Vec<_>>()
        .join(" OR ")
}

fn or_inurl<'a>(terms: impl Iterator<Item = &'a &'a str>) -> String {
    terms
        .map(|t| format!("inurl:{}", t))
        .collect::<Vec<_>>()
        .join(" OR ")
}

/// Builds the search queries for a domain.
///
/// Comprehensive mode issues one text query spanning every cluster and one
/// `inurl:` query. Legacy mode issues a text query and an `inurl:` query per
/// cluster.
pub fn build_queries(domain: &str, comprehensive: bool) -> Vec<String> {
    if comprehensive {
        let text = or_phrases(QUERY_CLUSTERS.iter().flat_map(|c| c.terms.iter()));
        let inurl = or_inurl(QUERY_CLUSTERS.iter().flat_map(|c| c.url_terms.iter()));
        vec![
            format!("site:{} ({})", domain, text),
            format!("site:{} ({})", domain, inurl),
        ]
    } else {
        QUERY_CLUSTERS
            .iter()
            .flat_map(|cluster| {
                [
                    format!("site:{} ({})", domain, or_phrases(cluster.terms.iter())),
                    format!("site:{} ({})", domain, or_inurl(cluster.url_terms.iter())),
                ]
            })
            .collect()
    }
}

/// Query that lists indexed hosts of a domain other than `www`.
pub fn subdomain_query(domain: &str) -> String {
    format!("site:{} -www.{}", domain, domain)
}

/// Query for external pages that mention the domain next to gambling terms.
pub fn backlink_query(domain: &str) -> String {
    let terms = or_phrases(QUERY_CLUSTERS[0].terms.iter());
    format!("\"{}\" -site:{} ({})", domain, domain, terms)
}
