//! Malicious keyword sets.
//!
//! A [`KeywordSet`] is built once per scan from the hardcoded lists below merged
//! with any dynamic keywords the caller supplies (e.g. from a database), then
//! shared read-only by the search, crawl, verification and classification stages.

use std::collections::BTreeSet;

use regex::Regex;

/// Category code for online gambling content.
pub const CATEGORY_JUDI: &str = "judi";
/// Category code for pornographic content.
pub const CATEGORY_PORNOGRAFI: &str = "pornografi";
/// Category code for defacement / hacked-site markers.
pub const CATEGORY_HACKED: &str = "hacked";
/// Category code for other illegal content found by the detector.
pub const CATEGORY_ILEGAL: &str = "ilegal";

const JUDI_KEYWORDS: &[&str] = &[
    "judi",
    "judi online",
    "judi slot",
    "judi bola",
    "slot gacor",
    "slot online",
    "situs slot",
    "slot88",
    "slot demo",
    "slot maxwin",
    "agen slot",
    "bandar slot",
    "rtp slot",
    "bocoran slot",
    "scatter hitam",
    "mahjong ways",
    "pragmatic play",
    "maxwin",
    "gacor",
    "togel",
    "togel online",
    "bandar togel",
    "casino online",
    "casino",
    "poker online",
    "sbobet",
    "deposit pulsa",
    "link alternatif",
];

const PORNOGRAFI_KEYWORDS: &[&str] = &[
    "bokep",
    "bokep indo",
    "video bokep",
    "porn",
    "porno",
    "xxx",
    "sex",
    "ngentot",
    "memek",
    "colmek",
    "situs dewasa",
    "hentai",
    "jav",
];

const HACKED_KEYWORDS: &[&str] = &[
    "hacked by",
    "defaced by",
    "deface",
    "h4ck3d",
    "greetz",
    "shell backdoor",
    "webshell",
    "mini shell",
    "indoxploit",
];

/// One category of keywords.
#[derive(Debug, Clone)]
pub struct KeywordGroup {
    /// Category code (`judi`, `pornografi`, `hacked`)
    pub code: String,
    /// Lowercased, deduplicated keywords
    pub keywords: Vec<String>,
    matcher: Option<Regex>,
}

impl KeywordGroup {
    fn new(code: &str, keywords: BTreeSet<String>) -> Self {
        let keywords: Vec<String> = keywords.into_iter().collect();
        Self {
            code: code.to_string(),
            matcher: build_matcher(&keywords),
            keywords,
        }
    }

    /// Distinct keywords of this group found in `text` (whole-word, case-insensitive).
    pub fn find_in(&self, text: &str) -> Vec<String> {
        find_with(self.matcher.as_ref(), text)
    }
}

/// Hardcoded ∪ dynamic malicious keywords, grouped by category.
#[derive(Debug, Clone)]
pub struct KeywordSet {
    groups: Vec<KeywordGroup>,
    matcher: Option<Regex>,
}

impl Default for KeywordSet {
    fn default() -> Self {
        Self::hardcoded()
    }
}

/// Builds one case-insensitive whole-word alternation. Longer keywords come
/// first so `slot gacor` wins over `slot`-prefixed shorter entries.
fn build_matcher(keywords: &[String]) -> Option<Regex> {
    if keywords.is_empty() {
        return None;
    }
    let mut sorted: Vec<&String> = keywords.iter().collect();
    sorted.sort_by(|a, b| b.len().cmp(&a.len()).then(a.cmp(b)));
    let alternation = sorted
        .iter()
        .map(|k| regex::escape(k))
        .collect::<Vec<_>>()
        .join("|");
    match Regex::new(&format!(r"(?i)\b(?:{})\b", alternation)) {
        Ok(re) => Some(re),
        Err(e) => {
            log::error!("Failed to compile keyword matcher: {}", e);
            None
        }
    }
}

fn find_with(matcher: Option<&Regex>, text: &str) -> Vec<String> {
    let Some(re) = matcher else {
        return Vec::new();
    };
    let found: BTreeSet<String> = re
        .find_iter(text)
        .map(|m| m.as_str().to_lowercase())
        .collect();
    found.into_iter().collect()
}

fn normalize_keyword(keyword: &str) -> Option<String> {
    let k = keyword.split_whitespace().collect::<Vec<_>>().join(" ");
    let k = k.to_lowercase();
    (!k.is_empty()).then_some(k)
}

impl KeywordSet {
    /// The built-in keyword lists only.
    pub fn hardcoded() -> Self {
        Self::merged(std::iter::empty::<(String, String)>())
    }

    /// Merges the built-in lists with dynamic `(category, keyword)` pairs.
    ///
    /// Unknown categories become new groups. Keywords are lowercased,
    /// whitespace-collapsed and deduplicated.
    pub fn merged<I, C, K>(dynamic: I) -> Self
    where
        I: IntoIterator<Item = (C, K)>,
        C: AsRef<str>,
        K: AsRef<str>,
    {
        let mut groups: Vec<(String, BTreeSet<String>)> = [
            (CATEGORY_JUDI, JUDI_KEYWORDS),
            (CATEGORY_PORNOGRAFI, PORNOGRAFI_KEYWORDS),
            (CATEGORY_HACKED, HACKED_KEYWORDS),
        ]
        .iter()
        .map(|(code, list)| {
            (
                code.to_string(),
                list.iter().filter_map(|k| normalize_keyword(k)).collect(),
            )
        })
        .collect();

        for (category, keyword) in dynamic {
            let Some(keyword) = normalize_keyword(keyword.as_ref()) else {
                continue;
            };
            let category = category.as_ref().trim().to_lowercase();
            match groups.iter_mut().find(|(code, _)| *code == category) {
                Some((_, set)) => {
                    set.insert(keyword);
                }
                None => groups.push((category, BTreeSet::from([keyword]))),
            }
        }

        let groups: Vec<KeywordGroup> = groups
            .into_iter()
            .map(|(code, set)| KeywordGroup::new(&code, set))
            .collect();
        let all: Vec<String> = groups
            .iter()
            .flat_map(|g| g.keywords.iter().cloned())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        Self {
            matcher: build_matcher(&all),
            groups,
        }
    }

    /// All keyword groups, built-in categories first.
    pub fn groups(&self) -> &[KeywordGroup] {
        &self.groups
    }

    /// Keywords of one category, if it exists.
    pub fn group(&self, code: &str) -> Option<&KeywordGroup> {
        self.groups.iter().find(|g| g.code == code)
    }

    /// Distinct keywords found in `text` across all categories.
    pub fn find_in(&self, text: &str) -> Vec<String> {
        find_with(self.matcher.as_ref(), text)
    }

    /// Whether `text` contains any keyword.
    pub fn contains_any(&self, text: &str) -> bool {
        self.matcher.as_ref().is_some_and(|re| re.is_match(text))
    }

    /// Like [`contains_any`](Self::contains_any) but treats URL separators
    /// (`-`, `_`, `+`, `/`, `.`) as spaces, so `slot-gacor` matches `slot gacor`.
    pub fn contains_any_in_url_text(&self, text: &str) -> bool {
        let spaced: String = text
            .chars()
            .map(|c| match c {
                '-' | '_' | '+' | '/' | '.' | '=' | '&' => ' ',
                other => other,
            })
            .collect();
        self.contains_any(&spaced)
    }

    /// Category with the most distinct keyword hits in `text`.
    ///
    /// Ties go to the earlier group (judi, then pornografi, then hacked).
    pub fn dominant_category(&self, text: &str) -> Option<&str> {
        let mut best: Option<(&str, usize)> = None;
        for group in &self.groups {
            let hits = group.find_in(text).len();
            if hits > 0 && best.map_or(true, |(_, n)| hits > n) {
                best = Some((group.code.as_str(), hits));
            }
        }
        best.map(|(code, _)| code)
    }

    /// Total number of keywords across all groups.
    pub fn len(&self) -> usize {
        self.groups.iter().map(|g| g.keywords.len()).sum()
    }

    /// Whether the set holds no keywords at all.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
