//! Illegal-content category taxonomy.
//!
//! Ten fixed categories with Indonesian and English keyword lists. Callers can
//! add categories or keywords with [`Taxonomy::with_keywords`].

use std::collections::{BTreeMap, BTreeSet};

use regex::Regex;

const DEFAULT_CATEGORIES: &[(&str, &str, &[&str])] = &[
    (
        "narkoba",
        "Narkoba",
        &[
            "narkoba", "sabu", "sabu-sabu", "shabu", "ganja", "ekstasi", "kokain", "heroin",
            "putaw", "pil koplo", "jual sabu", "jual ganja", "tramadol tanpa resep",
        ],
    ),
    (
        "penipuan",
        "Penipuan",
        &[
            "penipuan", "investasi bodong", "money game", "skema ponzi", "penggandaan uang",
            "pinjol ilegal", "hadiah undian", "arisan online", "transfer dulu",
        ],
    ),
    (
        "phising",
        "Phising",
        &[
            "phising", "phishing", "verifikasi akun", "akun anda diblokir", "update data rekening",
            "login bank", "masukkan pin", "kode otp", "klik link berikut",
        ],
    ),
    (
        "terorisme",
        "Terorisme",
        &[
            "terorisme", "bom rakitan", "rakit bom", "bahan peledak", "serangan teror", "isis",
        ],
    ),
    (
        "pemalsuan",
        "Pemalsuan Dokumen",
        &[
            "pemalsuan", "ijazah palsu", "jual ijazah", "jasa pembuatan ijazah", "ktp palsu",
            "sim palsu", "uang palsu", "surat palsu", "dokumen palsu",
        ],
    ),
    (
        "perdagangan_manusia",
        "Perdagangan Manusia",
        &[
            "perdagangan manusia", "human trafficking", "jual bayi", "jual ginjal", "jual organ",
            "tki ilegal",
        ],
    ),
    (
        "konten_kekerasan",
        "Konten Kekerasan",
        &["video pembunuhan", "penyiksaan", "mutilasi", "gore", "sadis"],
    ),
    (
        "prostitusi",
        "Prostitusi",
        &[
            "prostitusi", "open bo", "booking out", "psk", "pijat plus", "cewek panggilan",
            "layanan plus plus", "escort",
        ],
    ),
    (
        "perjudian_ilegal",
        "Perjudian Ilegal",
        &[
            "judi online", "situs judi", "agen judi", "bandar judi", "slot gacor", "slot online",
            "togel", "casino online", "sbobet", "taruhan bola",
        ],
    ),
    (
        "pornografi_anak",
        "Pornografi Anak",
        &["pornografi anak", "child porn", "lolicon", "pedofil"],
    ),
];

/// One category and its compiled whole-word matcher.
#[derive(Debug, Clone)]
pub struct TaxonomyCategory {
    /// Category code (e.g. `narkoba`)
    pub code: String,
    /// Display name
    pub name: String,
    /// Lowercased keywords
    pub keywords: Vec<String>,
    matcher: Option<Regex>,
}

impl TaxonomyCategory {
    fn new(code: &str, name: &str, keywords: BTreeSet<String>) -> Self {
        let keywords: Vec<String> = keywords.into_iter().collect();
        let mut ordered: Vec<&String> = keywords.iter().collect();
        ordered.sort_by(|a, b| b.len().cmp(&a.len()).then(a.cmp(b)));
        let pattern = ordered
            .iter()
            .map(|k| regex::escape(k))
            .collect::<Vec<_>>()
            .join("|");
        let matcher = if pattern.is_empty() {
            None
        } else {
            Regex::new(&format!(r"(?i)\b(?:{})\b", pattern))
                .map_err(|e| log::error!("Failed to compile matcher for {}: {}", code, e))
                .ok()
        };
        Self {
            code: code.to_string(),
            name: name.to_string(),
            keywords,
            matcher,
        }
    }

    /// Distinct keywords of this category in `text`.
    pub fn find_in(&self, text: &str) -> BTreeSet<String> {
        match &self.matcher {
            Some(re) => re
                .find_iter(text)
                .map(|m| m.as_str().to_lowercase())
                .collect(),
            None => BTreeSet::new(),
        }
    }
}

/// The category → keywords taxonomy used by the detector.
#[derive(Debug, Clone)]
pub struct Taxonomy {
    categories: Vec<TaxonomyCategory>,
}

impl Default for Taxonomy {
    fn default() -> Self {
        let categories = DEFAULT_CATEGORIES
            .iter()
            .map(|(code, name, keywords)| {
                TaxonomyCategory::new(code, name, keywords.iter().map(|k| k.to_string()).collect())
            })
            .collect();
        Self { categories }
    }
}

impl Taxonomy {
    /// Adds keywords to a category, creating it if needed.
    pub fn with_keywords(mut self, code: &str, name: &str, keywords: &[&str]) -> Self {
        let extra = keywords
            .iter()
            .map(|k| k.trim().to_lowercase())
            .filter(|k| !k.is_empty());
        match self.categories.iter().position(|c| c.code == code) {
            Some(index) => {
                let existing = &self.categories[index];
                let mut merged: BTreeSet<String> = existing.keywords.iter().cloned().collect();
                merged.extend(extra);
                let name = existing.name.clone();
                self.categories[index] = TaxonomyCategory::new(code, &name, merged);
            }
            None => self
                .categories
                .push(TaxonomyCategory::new(code, name, extra.collect())),
        }
        self
    }

    /// All categories in declaration order.
    pub fn categories(&self) -> &[TaxonomyCategory] {
        &self.categories
    }

    /// Display name of a category code.
    pub fn name_of(&self, code: &str) -> Option<&str> {
        self.categories
            .iter()
            .find(|c| c.code == code)
            .map(|c| c.name.as_str())
    }

    /// Matches `text` against every category.
    ///
    /// Returns only categories with at least one hit.
    pub fn match_text(&self, text: &str) -> BTreeMap<String, Vec<String>> {
        self.categories
            .iter()
            .filter_map(|c| {
                let hits = c.find_in(text);
                (!hits.is_empty()).then(|| (c.code.clone(), hits.into_iter().collect()))
            })
            .collect()
    }
}

/// Total distinct keyword hits across categories.
pub fn total_matches(matches: &BTreeMap<String, Vec<String>>) -> usize {
    matches.values().map(Vec::len).sum()
}
