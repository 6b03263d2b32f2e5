// Copyright 2026 Listscrape Contributors
// SPDX-License-Identifier: Apache-2.0

//! Element locators used by site profiles and the built-in fallback chains.
//!
//! A locator is a comma-separated list of alternatives. Each alternative is a
//! CSS selector optionally followed by `:has-text("label")`, which keeps only
//! elements whose normalised text contains `label` (case-insensitive):
//!
//! ```text
//! a.next-page, button:has-text("Next")
//! ```
//!
//! Alternatives are tried in declaration order and the first one matching
//! anything wins. Interaction (probe and click) skips alternatives whose
//! matches are all hidden. Matching against an HTML snapshot goes through `scraper`
//! and is synchronous: `scraper` types are `!Send`, so callers must not hold
//! a parsed document across an `.await`.

use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};
use std::fmt;

const HAS_TEXT: &str = ":has-text(";

/// Interaction state of the element a locator resolves to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ControlState {
    /// Nothing matches.
    Missing,
    /// Matches exist but none is visible.
    Hidden,
    /// The first visible match is disabled.
    Disabled,
    /// The first visible match can be clicked.
    Ready,
}

/// One alternative of a locator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Target {
    pub css: String,
    /// Lower-cased label the element text must contain.
    pub text: Option<String>,
}

impl Target {
    fn select<'a>(&self, scope: ElementRef<'a>) -> Vec<ElementRef<'a>> {
        let Ok(selector) = Selector::parse(&self.css) else {
            return Vec::new();
        };
        scope
            .select(&selector)
            .filter(|el| match &self.text {
                Some(label) => element_text(*el).to_lowercase().contains(label),
                None => true,
            })
            .collect()
    }
}

/// A parsed, validated locator.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Locator {
    raw: String,
    targets: Vec<Target>,
}

impl Locator {
    /// Parse a locator string, validating every CSS part.
    pub fn parse(raw: &str) -> Result<Self, String> {
        let mut targets = Vec::new();
        for part in split_top_level(raw) {
            let part = part.trim();
            if part.is_empty() {
                continue;
            }
            targets.push(parse_target(part)?);
        }
        if targets.is_empty() {
            return Err(format!("empty locator: {raw:?}"));
        }
        Ok(Self {
            raw: raw.trim().to_string(),
            targets,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn targets(&self) -> &[Target] {
        &self.targets
    }

    /// All elements below `scope` matched by the first alternative that
    /// matches anything, in document order.
    pub fn select<'a>(&self, scope: ElementRef<'a>) -> Vec<ElementRef<'a>> {
        self.targets
            .iter()
            .map(|target| target.select(scope))
            .find(|found| !found.is_empty())
            .unwrap_or_default()
    }

    /// First element matched below `scope`.
    pub fn first<'a>(&self, scope: ElementRef<'a>) -> Option<ElementRef<'a>> {
        self.select(scope).into_iter().next()
    }

    /// Matches anywhere in a parsed document.
    pub fn select_in<'a>(&self, doc: &'a Html) -> Vec<ElementRef<'a>> {
        self.select(doc.root_element())
    }

    /// The control a user would interact with: the first visible match of
    /// the first alternative that has one.
    ///
    /// Unlike [`Locator::select`], an alternative whose matches are all
    /// hidden does not shadow later ones.
    pub fn visible_in<'a>(&self, doc: &'a Html) -> Option<ElementRef<'a>> {
        let root = doc.root_element();
        self.targets
            .iter()
            .find_map(|target| target.select(root).into_iter().find(|el| !is_hidden(*el)))
    }

    /// Resolve the interaction state against a document snapshot.
    ///
    /// Visibility is judged from markup only (`hidden`, `aria-hidden`,
    /// inline `display:none` / `visibility:hidden` on the element or an
    /// ancestor); the Chromium renderer uses computed styles instead.
    pub fn state_in(&self, doc: &Html) -> ControlState {
        match self.visible_in(doc) {
            Some(el) if is_disabled(el) => ControlState::Disabled,
            Some(_) => ControlState::Ready,
            None if self.select_in(doc).is_empty() => ControlState::Missing,
            None => ControlState::Hidden,
        }
    }

    /// JSON array of `{css, text}` objects for in-page scripts.
    pub fn script_targets(&self) -> String {
        serde_json::to_string(&self.targets).unwrap_or_else(|_| "[]".to_string())
    }
}

impl fmt::Debug for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Locator({:?})", self.raw)
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl TryFrom<String> for Locator {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Locator> for String {
    fn from(value: Locator) -> Self {
        value.raw
    }
}

/// Parse a list of locator strings that are known at compile time.
///
/// Entries that fail to parse are dropped with a warning rather than
/// poisoning the whole chain.
pub fn chain(raw: &[&str]) -> Vec<Locator> {
    raw.iter()
        .filter_map(|r| match Locator::parse(r) {
            Ok(l) => Some(l),
            Err(e) => {
                tracing::warn!("dropping locator {r:?}: {e}");
                None
            }
        })
        .collect()
}

/// Whitespace-normalised text content of an element.
pub fn element_text(el: ElementRef<'_>) -> String {
    el.text()
        .flat_map(|t| t.split_whitespace())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Whether the element or any ancestor is hidden in markup.
pub fn is_hidden(el: ElementRef<'_>) -> bool {
    std::iter::once(el)
        .chain(el.ancestors().filter_map(ElementRef::wrap))
        .any(|e| {
            let v = e.value();
            if v.attr("hidden").is_some() || v.attr("aria-hidden") == Some("true") {
                return true;
            }
            v.attr("style")
                .map(|s| {
                    let s: String = s.chars().filter(|c| !c.is_whitespace()).collect();
                    let s = s.to_ascii_lowercase();
                    s.contains("display:none") || s.contains("visibility:hidden")
                })
                .unwrap_or(false)
        })
}

/// Whether the element is marked disabled.
pub fn is_disabled(el: ElementRef<'_>) -> bool {
    let v = el.value();
    v.attr("disabled").is_some()
        || v.attr("aria-disabled") == Some("true")
        || v.classes().any(|c| c.eq_ignore_ascii_case("disabled"))
}

fn parse_target(part: &str) -> Result<Target, String> {
    let (css, text) = match part.find(HAS_TEXT) {
        Some(idx) => {
            let rest = &part[idx + HAS_TEXT.len()..];
            let inner = rest
                .strip_suffix(')')
                .ok_or_else(|| format!("unterminated :has-text in {part:?}"))?
                .trim();
            let label = unquote(inner).ok_or_else(|| format!("unquoted :has-text label in {part:?}"))?;
            (part[..idx].trim(), Some(label.to_lowercase()))
        }
        None => (part, None),
    };
    let css = if css.is_empty() { "*" } else { css };
    Selector::parse(css).map_err(|e| format!("bad selector {css:?}: {e:?}"))?;
    Ok(Target {
        css: css.to_string(),
        text,
    })
}

fn unquote(s: &str) -> Option<&str> {
    let bytes = s.as_bytes();
    if bytes.len() >= 2
        && (bytes[0] == b'"' || bytes[0] == b'\'')
        && bytes[bytes.len() - 1] == bytes[0]
    {
        Some(&s[1..s.len() - 1])
    } else {
        None
    }
}

/// Split on commas that are not inside quotes, parentheses or brackets.
fn split_top_level(raw: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0i32;
    let mut quote: Option<char> = None;
    let mut start = 0;
    for (i, c) in raw.char_indices() {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '"' | '\'') => quote = Some(c),
            (None, '(' | '[') => depth += 1,
            (None, ')' | ']') => depth -= 1,
            (None, ',') if depth == 0 => {
                parts.push(&raw[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(&raw[start..]);
    parts
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_alternatives_and_has_text() {
        let loc = Locator::parse(r#"a.next-page, button:has-text("Next")"#).unwrap();
        assert_eq!(loc.targets().len(), 2);
        assert_eq!(loc.targets()[0].css, "a.next-page");
        assert_eq!(loc.targets()[0].text, None);
        assert_eq!(loc.targets()[1].css, "button");
        assert_eq!(loc.targets()[1].text.as_deref(), Some("next"));
    }

    #[test]
    fn test_commas_inside_attribute_values_are_kept() {
        let loc = Locator::parse(r#"a[title="a, b"], h2"#).unwrap();
        assert_eq!(loc.targets().len(), 2);
        assert_eq!(loc.targets()[0].css, r#"a[title="a, b"]"#);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(Locator::parse("").is_err());
        assert!(Locator::parse("button:has-text(Next)").is_err());
        assert!(Locator::parse("div[[").is_err());
    }

    #[test]
    fn test_first_matching_alternative_wins() {
        let html = Html::parse_document(
            r#"<body><h3>Third</h3><h2>Second</h2><span class="x">x</span></body>"#,
        );
        let loc = Locator::parse("h2, h3").unwrap();
        let found = loc.select_in(&html);
        assert_eq!(found.len(), 1);
        assert_eq!(element_text(found[0]), "Second");
    }

    #[test]
    fn test_has_text_is_case_insensitive() {
        let html = Html::parse_document(
            r#"<body><button>Prev</button><button>  NEXT  page </button></body>"#,
        );
        let loc = Locator::parse(r#"button:has-text("Next")"#).unwrap();
        let found = loc.select_in(&html);
        assert_eq!(found.len(), 1);
        assert_eq!(element_text(found[0]), "NEXT page");
    }

    #[test]
    fn test_state_in_reports_hidden_and_disabled() {
        let loc = Locator::parse(r#"button:has-text("Next")"#).unwrap();

        let missing = Html::parse_document("<body><p>none</p></body>");
        assert_eq!(loc.state_in(&missing), ControlState::Missing);

        let hidden = Html::parse_document(
            r#"<body><div style="display: none"><button>Next</button></div></body>"#,
        );
        assert_eq!(loc.state_in(&hidden), ControlState::Hidden);

        let disabled = Html::parse_document(r#"<body><button disabled>Next</button></body>"#);
        assert_eq!(loc.state_in(&disabled), ControlState::Disabled);

        let ready = Html::parse_document(
            r#"<body><button hidden>Next</button><button>Next</button></body>"#,
        );
        assert_eq!(loc.state_in(&ready), ControlState::Ready);
    }

    #[test]
    fn test_hidden_alternative_falls_through_to_visible_one() {
        let loc = Locator::parse(r#"a.next-page, button:has-text("Next")"#).unwrap();
        let html = Html::parse_document(
            r#"<body>
                <a class="next-page" href="/p2" style="display:none">›</a>
                <button>Next</button>
            </body>"#,
        );
        assert_eq!(loc.state_in(&html), ControlState::Ready);
        let el = loc.visible_in(&html).unwrap();
        assert_eq!(el.value().name(), "button");
        // plain selection still stops at the first matching alternative
        assert_eq!(loc.select_in(&html)[0].value().name(), "a");

        let both_hidden = Html::parse_document(
            r#"<body><a class="next-page" hidden>›</a><button aria-hidden="true">Next</button></body>"#,
        );
        assert_eq!(loc.state_in(&both_hidden), ControlState::Hidden);
        assert!(loc.visible_in(&both_hidden).is_none());
    }

    #[test]
    fn test_visible_disabled_alternative_reports_disabled() {
        let loc = Locator::parse(r#"a.next-page, button:has-text("Next")"#).unwrap();
        let html = Html::parse_document(
            r#"<body><a class="next-page" hidden>›</a><button disabled>Next</button></body>"#,
        );
        assert_eq!(loc.state_in(&html), ControlState::Disabled);
    }

    #[test]
    fn test_serde_round_trips_through_string() {
        let loc: Locator = serde_json::from_str(r#""a[rel=\"next\"]""#).unwrap();
        assert_eq!(loc.as_str(), r#"a[rel="next"]"#);
        assert!(serde_json::from_str::<Locator>(r#""""#).is_err());
    }

    #[test]
    fn test_script_targets_json() {
        let loc = Locator::parse(r#"button:has-text("Load More")"#).unwrap();
        let v: serde_json::Value = serde_json::from_str(&loc.script_targets()).unwrap();
        assert_eq!(v[0]["css"], "button");
        assert_eq!(v[0]["text"], "load more");
    }
}
