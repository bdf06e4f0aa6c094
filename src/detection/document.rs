//! HTML views used by the detector passes.
//!
//! One parsed page exposes the text of each pass: visible text, text inside
//! concealed elements, HTML comments, meta tags and hidden-ish attributes.

use std::collections::HashSet;
use std::sync::LazyLock;

use ego_tree::NodeId;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};

use crate::utils::{collapse_whitespace, parse_selector, select_all};

/// Elements whose content is never rendered as page text.
const NON_TEXT_ELEMENTS: &[&str] = &[
    "script", "style", "meta", "link", "noscript", "template", "svg", "head",
];

/// Class tokens that conventionally hide an element.
const HIDING_CLASSES: &[&str] = &[
    "sr-only",
    "visually-hidden",
    "screen-reader-text",
    "hidden",
    "d-none",
    "invisible",
    "hide",
    "offscreen",
];

/// Attributes whose values are not shown as page text but are indexed.
const TEXT_ATTRIBUTES: &[&str] = &["title", "alt", "aria-label", "placeholder"];

static HIDING_STYLES: LazyLock<Vec<(&'static str, Regex)>> = LazyLock::new(|| {
    [
        ("display:none", r"(?i)display\s*:\s*none"),
        ("visibility:hidden", r"(?i)visibility\s*:\s*hidden"),
        ("opacity:0", r"(?i)opacity\s*:\s*0(?:\.0+)?\s*(?:;|!|$)"),
        ("font-size:0", r"(?i)font-size\s*:\s*0(?:px|em|rem|pt|%)?\s*(?:;|!|$)"),
        ("offscreen-position", r"(?i)(?:left|top|text-indent)\s*:\s*-\d{3,}"),
        ("clip-rect", r"(?i)clip\s*:\s*rect\(\s*0"),
        ("zero-size", r"(?i)(?:^|;|\s)(?:height|width)\s*:\s*0(?:px)?\s*(?:;|!|$)"),
    ]
    .into_iter()
    .filter_map(|(name, pattern)| match Regex::new(pattern) {
        Ok(re) => Some((name, re)),
        Err(e) => {
            log::error!("Failed to compile hiding-style pattern {}: {}", name, e);
            None
        }
    })
    .collect()
});

static CSS_RULE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"([^{}]+)\{([^}]*)\}").ok());
static CSS_CLASS: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"\.([A-Za-z_][\w-]*)").ok());
static HTML_COMMENT: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"(?s)<!--(.*?)-->").ok());

static ALL_SELECTOR: LazyLock<Option<Selector>> =
    LazyLock::new(|| parse_selector("*", "hidden element scan"));
static STYLE_SELECTOR: LazyLock<Option<Selector>> =
    LazyLock::new(|| parse_selector("style", "stylesheet scan"));
static META_SELECTOR: LazyLock<Option<Selector>> =
    LazyLock::new(|| parse_selector("meta[content]", "meta tag extraction"));
static TITLE_SELECTOR: LazyLock<Option<Selector>> =
    LazyLock::new(|| parse_selector("title", "title extraction"));

/// Returns the hiding technique an inline style uses, if any.
pub fn hiding_style(style: &str) -> Option<&'static str> {
    HIDING_STYLES
        .iter()
        .find(|(_, re)| re.is_match(style))
        .map(|(name, _)| *name)
}

/// Text found inside one concealed element.
#[derive(Debug, Clone, PartialEq)]
pub struct HiddenBlock {
    /// How the element is hidden (`display:none`, `class:sr-only`, ...)
    pub technique: String,
    /// Whitespace-collapsed text content
    pub text: String,
}

/// A parsed page plus the classes its stylesheets hide.
pub struct PageDocument {
    html: Html,
    hidden_classes: HashSet<String>,
}

impl PageDocument {
    /// Parses raw HTML.
    pub fn parse(raw: &str) -> Self {
        let html = Html::parse_document(raw);
        let hidden_classes = stylesheet_hidden_classes(&html);
        Self {
            html,
            hidden_classes,
        }
    }

    /// The parsed document.
    pub fn html(&self) -> &Html {
        &self.html
    }

    /// How an element is concealed, if it is.
    pub fn concealment(&self, element: &ElementRef) -> Option<String> {
        let value = element.value();
        if value.attr("hidden").is_some() {
            return Some("attribute:hidden".to_string());
        }
        if value
            .attr("aria-hidden")
            .is_some_and(|v| v.eq_ignore_ascii_case("true"))
        {
            return Some("aria-hidden".to_string());
        }
        if let Some(technique) = value.attr("style").and_then(hiding_style) {
            return Some(technique.to_string());
        }
        for class in value.classes() {
            let lower = class.to_lowercase();
            if HIDING_CLASSES.contains(&lower.as_str()) || self.hidden_classes.contains(&lower) {
                return Some(format!("class:{}", lower));
            }
        }
        None
    }

    /// Rendered text minus non-text elements and concealed elements.
    pub fn visible_text(&self) -> String {
        let mut out = String::new();
        self.collect_text(self.html.root_element(), true, &mut out);
        if let Some(title) = self.title() {
            out.insert_str(0, &format!("{} ", title));
        }
        collapse_whitespace(&out)
    }

    /// Appends the text under `root` in document order. The walk keeps its
    /// own stack, so nesting depth is bounded by the heap.
    fn collect_text(&self, root: ElementRef, skip_concealed: bool, out: &mut String) {
        let mut stack = vec![*root];
        while let Some(node) = stack.pop() {
            let Some(element) = ElementRef::wrap(node) else {
                if let Some(text) = node.value().as_text() {
                    out.push_str(text);
                    out.push(' ');
                }
                continue;
            };
            if NON_TEXT_ELEMENTS.contains(&element.value().name()) {
                continue;
            }
            if skip_concealed && self.concealment(&element).is_some() {
                continue;
            }
            stack.extend(node.children().rev());
        }
    }

    /// The page title, if present.
    pub fn title(&self) -> Option<String> {
        select_all(&self.html, &TITLE_SELECTOR)
            .first()
            .map(|t| collapse_whitespace(&t.text().collect::<String>()))
            .filter(|t| !t.is_empty())
    }

    /// Text of every outermost concealed element.
    pub fn hidden_blocks(&self) -> Vec<HiddenBlock> {
        let mut blocks = Vec::new();
        let mut stack = vec![self.html.root_element()];
        while let Some(element) = stack.pop() {
            let Some(technique) = self.concealment(&element) else {
                stack.extend(element.children().rev().filter_map(ElementRef::wrap));
                continue;
            };
            // Nested concealed elements belong to this block
            if NON_TEXT_ELEMENTS.contains(&element.value().name()) {
                continue;
            }
            let mut text = String::new();
            self.collect_text(element, false, &mut text);
            let text = collapse_whitespace(&text);
            if !text.is_empty() {
                blocks.push(HiddenBlock { technique, text });
            }
        }
        blocks
    }

    /// Content of every `<meta content=...>` tag.
    pub fn meta_text(&self) -> String {
        let values: Vec<&str> = select_all(&self.html, &META_SELECTOR)
            .iter()
            .filter_map(|m| m.value().attr("content"))
            .collect();
        collapse_whitespace(&values.join(" "))
    }

    /// Values of text-bearing attributes (`title`, `alt`, `aria-label`,
    /// `placeholder`, `data-*`) and hidden input values.
    pub fn attribute_text(&self) -> String {
        let mut values = Vec::new();
        for element in select_all(&self.html, &ALL_SELECTOR) {
            let value = element.value();
            for (name, attr) in value.attrs() {
                if TEXT_ATTRIBUTES.contains(&name) || name.starts_with("data-") {
                    values.push(attr.to_string());
                }
            }
            if value.name() == "input"
                && value
                    .attr("type")
                    .is_some_and(|t| t.eq_ignore_ascii_case("hidden"))
            {
                if let Some(v) = value.attr("value") {
                    values.push(v.to_string());
                }
            }
        }
        collapse_whitespace(&values.join(" "))
    }

    /// Every element that is concealed itself or sits inside a concealed
    /// ancestor, found in one pass over the tree.
    pub fn hidden_elements(&self) -> HashSet<NodeId> {
        let mut hidden = HashSet::new();
        let mut stack = vec![(self.html.root_element(), false)];
        while let Some((element, inherited)) = stack.pop() {
            let concealed = inherited || self.concealment(&element).is_some();
            if concealed {
                hidden.insert(element.id());
            }
            stack.extend(
                element
                    .children()
                    .filter_map(ElementRef::wrap)
                    .map(|child| (child, concealed)),
            );
        }
        hidden
    }
}

/// Classes that `<style>` rules hide.
fn stylesheet_hidden_classes(html: &Html) -> HashSet<String> {
    let (Some(rule_re), Some(class_re)) = (CSS_RULE.as_ref(), CSS_CLASS.as_ref()) else {
        return HashSet::new();
    };
    let mut classes = HashSet::new();
    for style in select_all(html, &STYLE_SELECTOR) {
        let css: String = style.text().collect();
        for rule in rule_re.captures_iter(&css) {
            if hiding_style(&rule[2]).is_none() {
                continue;
            }
            for class in class_re.captures_iter(&rule[1]) {
                classes.insert(class[1].to_lowercase());
            }
        }
    }
    classes
}

/// Text of every HTML comment in the raw source.
pub fn comment_text(raw: &str) -> String {
    let Some(re) = HTML_COMMENT.as_ref() else {
        return String::new();
    };
    let parts: Vec<&str> = re
        .captures_iter(raw)
        .filter_map(|c| c.get(1).map(|m| m.as_str()))
        .collect();
    collapse_whitespace(&parts.join(" "))
}

/// Visible text of raw HTML; shorthand for crawling and verification.
pub fn extract_visible_text(raw: &str) -> String {
    PageDocument::parse(raw).visible_text()
}
