//! Candidate classification.
//!
//! A trained model can be plugged in through [`Classifier`]. When none is
//! loaded, or it returns nothing, [`CandidateClassifier`] falls back to keyword
//! heuristics, which are then the only detector.

use std::sync::Arc;

use log::debug;

use crate::error_handling::{ErrorType, ScanStats};
use crate::keywords::{KeywordSet, CATEGORY_HACKED, CATEGORY_ILEGAL, CATEGORY_JUDI, CATEGORY_PORNOGRAFI};

/// Black-box text classifier.
pub trait Classifier: Send + Sync {
    /// Category code for `text`, or `None` when the text looks benign or the
    /// model cannot decide.
    fn predict(&self, text: &str) -> Option<String>;
}

/// Keyword-substring heuristic: the category with the most distinct hits.
pub struct KeywordClassifier {
    keywords: Arc<KeywordSet>,
}

impl KeywordClassifier {
    pub fn new(keywords: Arc<KeywordSet>) -> Self {
        Self { keywords }
    }
}

impl Classifier for KeywordClassifier {
    fn predict(&self, text: &str) -> Option<String> {
        self.keywords
            .dominant_category(text)
            .or_else(|| self.dominant_in_url_text(text))
            .map(str::to_string)
    }
}

impl KeywordClassifier {
    /// Keywords glued into URL paths ("slot-gacor") still count.
    fn dominant_in_url_text(&self, text: &str) -> Option<&str> {
        let spaced: String = text
            .chars()
            .map(|c| if c.is_alphanumeric() { c } else { ' ' })
            .collect();
        self.keywords.dominant_category(&spaced)
    }
}

/// Model first, keyword heuristic second.
pub struct CandidateClassifier {
    model: Option<Arc<dyn Classifier>>,
    fallback: KeywordClassifier,
    stats: Arc<ScanStats>,
}

impl CandidateClassifier {
    /// `model` may be `None` when no trained model is available.
    pub fn new(model: Option<Arc<dyn Classifier>>, keywords: Arc<KeywordSet>, stats: Arc<ScanStats>) -> Self {
        Self {
            model,
            fallback: KeywordClassifier::new(keywords),
            stats,
        }
    }

    /// Category code for a candidate, or `None` if it looks benign.
    pub fn classify(&self, text: &str) -> Option<String> {
        if let Some(model) = &self.model {
            if let Some(code) = model.predict(text).filter(|c| !c.trim().is_empty()) {
                return Some(code);
            }
            debug!("Classifier returned nothing, using keyword heuristic");
            self.stats.increment(ErrorType::ClassifierFallback);
        }
        self.fallback.predict(text)
    }
}

/// Display name of a category code.
pub fn category_name(code: &str) -> String {
    match code {
        CATEGORY_JUDI => "Judi Online".to_string(),
        CATEGORY_PORNOGRAFI => "Pornografi".to_string(),
        CATEGORY_HACKED => "Website Hacked/Defaced".to_string(),
        CATEGORY_ILEGAL => "Konten Ilegal".to_string(),
        other => {
            let mut chars = other.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>().replace('_', " "),
                None => String::new(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedModel(Option<&'static str>);

    impl Classifier for FixedModel {
        fn predict(&self, _text: &str) -> Option<String> {
            self.0.map(str::to_string)
        }
    }

    fn keywords() -> Arc<KeywordSet> {
        Arc::new(KeywordSet::hardcoded())
    }

    #[test]
    fn test_keyword_classifier() {
        let c = KeywordClassifier::new(keywords());
        assert_eq!(c.predict("Situs SLOT GACOR terpercaya").as_deref(), Some("judi"));
        assert_eq!(c.predict("video bokep indo").as_deref(), Some("pornografi"));
        assert_eq!(c.predict("Hacked by someone").as_deref(), Some("hacked"));
        assert_eq!(c.predict("Dinas Pendidikan Kota").as_deref(), None);
    }

    #[test]
    fn test_keyword_classifier_reads_url_text() {
        let c = KeywordClassifier::new(keywords());
        assert_eq!(
            c.predict("https://example.go.id/slot-gacor/index.php").as_deref(),
            Some("judi")
        );
    }

    #[test]
    fn test_model_wins_when_it_answers() {
        let stats = Arc::new(ScanStats::new());
        let c = CandidateClassifier::new(
            Some(Arc::new(FixedModel(Some("pornografi")))),
            keywords(),
            stats.clone(),
        );
        assert_eq!(c.classify("slot gacor").as_deref(), Some("pornografi"));
        assert_eq!(stats.get(ErrorType::ClassifierFallback), 0);
    }

    #[test]
    fn test_fallback_when_model_is_silent() {
        let stats = Arc::new(ScanStats::new());
        let silent = CandidateClassifier::new(Some(Arc::new(FixedModel(None))), keywords(), stats.clone());
        assert_eq!(silent.classify("togel hari ini").as_deref(), Some("judi"));
        assert_eq!(silent.classify("Dinas Pendidikan").as_deref(), None);
        assert_eq!(stats.get(ErrorType::ClassifierFallback), 2);
    }

    #[test]
    fn test_keyword_heuristic_without_model_is_not_an_error() {
        let stats = Arc::new(ScanStats::new());
        let missing = CandidateClassifier::new(None, keywords(), stats.clone());
        assert_eq!(missing.classify("togel hari ini").as_deref(), Some("judi"));
        assert_eq!(missing.classify("video bokep").as_deref(), Some("pornografi"));
        assert_eq!(stats.get(ErrorType::ClassifierFallback), 0);
        assert!(stats.snapshot().is_empty());
    }

    #[test]
    fn test_category_name() {
        assert_eq!(category_name("judi"), "Judi Online");
        assert_eq!(category_name("perjudian_ilegal"), "Perjudian ilegal");
    }
}
