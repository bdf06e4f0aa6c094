//! Script and style injection patterns.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use super::document::PageDocument;
use crate::utils::{parse_selector, select_all, truncate_chars};
use scraper::Selector;

const EXCERPT_CHARS: usize = 120;

static SCRIPT_PATTERNS: LazyLock<Vec<(&'static str, Regex)>> = LazyLock::new(|| {
    compile(&[
        ("eval", r"\beval\s*\("),
        ("document.write", r"document\.write(?:ln)?\s*\("),
        ("atob", r"\batob\s*\("),
        ("function-constructor", r"\bnew\s+Function\s*\(|\bFunction\s*\(\s*['\x22]"),
        ("fromcharcode", r"String\.fromCharCode\s*\("),
        ("unescape", r"\bunescape\s*\("),
        ("string-timer", r"\bset(?:Timeout|Interval)\s*\(\s*['\x22]"),
        (
            "iframe-injection",
            r"(?i)<iframe[^>]+src\s*=\s*\\?['\x22]?https?://",
        ),
        (
            "js-redirect",
            r"(?:window|document|top)\.location(?:\.href)?\s*=\s*['\x22]https?://",
        ),
        ("hex-escapes", r"(?:\\x[0-9a-fA-F]{2}){8,}"),
        ("unicode-escapes", r"(?:\\u[0-9a-fA-F]{4}){6,}"),
    ])
});

static MARKUP_PATTERNS: LazyLock<Vec<(&'static str, Regex)>> = LazyLock::new(|| {
    compile(&[
        (
            "hidden-iframe",
            r#"(?i)<iframe[^>]*(?:width\s*=\s*['"]?0\b|height\s*=\s*['"]?0\b|display\s*:\s*none|visibility\s*:\s*hidden)"#,
        ),
        (
            "meta-refresh-redirect",
            r#"(?i)<meta[^>]+http-equiv\s*=\s*['"]?refresh['"]?[^>]+url\s*=\s*https?://"#,
        ),
    ])
});

static STYLE_PATTERNS: LazyLock<Vec<(&'static str, Regex)>> = LazyLock::new(|| {
    compile(&[
        (
            "offscreen-block",
            r"(?i)position\s*:\s*absolute[^;]*;[^}]*?(?:left|top)\s*:\s*-\d{3,}px",
        ),
        ("css-expression", r"(?i)expression\s*\("),
        ("css-behavior", r"(?i)behavior\s*:\s*url\("),
    ])
});

static SCRIPT_SELECTOR: LazyLock<Option<Selector>> =
    LazyLock::new(|| parse_selector("script", "injection scan"));
static STYLED_SELECTOR: LazyLock<Option<Selector>> =
    LazyLock::new(|| parse_selector("[style]", "inline style scan"));
static STYLE_TAG_SELECTOR: LazyLock<Option<Selector>> =
    LazyLock::new(|| parse_selector("style", "style tag scan"));

fn compile(patterns: &[(&'static str, &str)]) -> Vec<(&'static str, Regex)> {
    patterns
        .iter()
        .filter_map(|(name, pattern)| match Regex::new(pattern) {
            Ok(re) => Some((*name, re)),
            Err(e) => {
                log::error!("Failed to compile injection pattern {}: {}", name, e);
                None
            }
        })
        .collect()
}

/// One injection pattern hit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InjectionFinding {
    /// Pattern name (e.g. `eval`, `hidden-iframe`)
    pub pattern: String,
    /// `script`, `style` or `markup`
    pub location: String,
    /// Text around the match
    pub excerpt: String,
}

fn scan(
    text: &str,
    patterns: &[(&'static str, Regex)],
    location: &str,
    out: &mut Vec<InjectionFinding>,
) {
    for (name, re) in patterns {
        if let Some(m) = re.find(text) {
            let start = text[..m.start()]
                .char_indices()
                .rev()
                .nth(20)
                .map(|(i, _)| i)
                .unwrap_or(0);
            out.push(InjectionFinding {
                pattern: name.to_string(),
                location: location.to_string(),
                excerpt: truncate_chars(&text[start..], EXCERPT_CHARS),
            });
        }
    }
}

/// Scans script bodies, styles and raw markup for injection patterns.
///
/// Each pattern is reported at most once per location kind.
pub fn find_injections(document: &PageDocument, raw_html: &str) -> Vec<InjectionFinding> {
    let html = document.html();
    let mut findings = Vec::new();

    let scripts: String = select_all(html, &SCRIPT_SELECTOR)
        .iter()
        .map(|s| s.text().collect::<String>())
        .collect::<Vec<_>>()
        .join("\n");
    scan(&scripts, &SCRIPT_PATTERNS, "script", &mut findings);

    let mut styles: Vec<String> = select_all(html, &STYLE_TAG_SELECTOR)
        .iter()
        .map(|s| s.text().collect::<String>())
        .collect();
    styles.extend(
        select_all(html, &STYLED_SELECTOR)
            .iter()
            .filter_map(|e| e.value().attr("style").map(|s| format!("{{{}}}", s))),
    );
    scan(&styles.join("\n"), &STYLE_PATTERNS, "style", &mut findings);

    scan(raw_html, &MARKUP_PATTERNS, "markup", &mut findings);
    findings
}

/// Names of the script patterns matching one script body.
pub fn dangerous_script_patterns(script: &str) -> Vec<String> {
    SCRIPT_PATTERNS
        .iter()
        .filter(|(_, re)| re.is_match(script))
        .map(|(name, _)| name.to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn findings(html: &str) -> Vec<String> {
        let doc = PageDocument::parse(html);
        find_injections(&doc, html)
            .into_iter()
            .map(|f| format!("{}:{}", f.location, f.pattern))
            .collect()
    }

    #[test]
    fn test_script_patterns() {
        let hits = findings(
            r#"<script>eval(atob("ZG9jdW1lbnQ="));document.write('<iframe src="https://evil.example/x">');</script>"#,
        );
        assert!(hits.contains(&"script:eval".to_string()));
        assert!(hits.contains(&"script:atob".to_string()));
        assert!(hits.contains(&"script:document.write".to_string()));
        assert!(hits.contains(&"script:iframe-injection".to_string()));
    }

    #[test]
    fn test_markup_and_style_patterns() {
        let hits = findings(
            r#"<iframe src="https://x.example" width="0" height="0"></iframe>
               <div style="position:absolute; left:-5000px">x</div>"#,
        );
        assert!(hits.contains(&"markup:hidden-iframe".to_string()));
        assert!(hits.contains(&"style:offscreen-block".to_string()));
    }

    #[test]
    fn test_clean_page_has_no_findings() {
        assert!(findings(
            "<html><body><script>console.log('ok')</script><p>Halo</p></body></html>"
        )
        .is_empty());
    }

    #[test]
    fn test_dangerous_script_patterns() {
        assert_eq!(dangerous_script_patterns("eval(x)"), vec!["eval".to_string()]);
        assert!(dangerous_script_patterns("var a = 1;").is_empty());
        assert!(dangerous_script_patterns(r"var s='\x68\x65\x6c\x6c\x6f\x20\x77\x6f';")
            .contains(&"hex-escapes".to_string()));
    }
}
