//! Element locators shared by the static and the scripted renderer.
//!
//! A locator is a CSS selector with two optional refinements: a
//! case-insensitive text filter and a scope the search is restricted to.
//! The scope covers the XPath-style "heading, then its parent, then a
//! button below it" lookups the expand cascade needs.

use std::fmt;

use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};

use super::{ElementHandle, RenderError, WaitCondition};

/// Element search description.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Locator {
    /// CSS selector for the target element.
    pub css: String,
    /// Only match elements whose text contains this, ignoring case.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Restrict the search to descendants of matching scope elements.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub within: Option<Scope>,
}

/// Scope element for a locator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scope {
    pub css: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Search from the scope element's parent instead of the element itself.
    #[serde(default)]
    pub parent: bool,
}

impl Locator {
    pub fn css(css: impl Into<String>) -> Self {
        Self {
            css: css.into(),
            text: None,
            within: None,
        }
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn within(mut self, css: impl Into<String>) -> Self {
        self.within = Some(Scope {
            css: css.into(),
            text: None,
            parent: false,
        });
        self
    }

    /// Search below the parent of the first element matching `css` whose
    /// text contains `text`.
    pub fn near(mut self, css: impl Into<String>, text: impl Into<String>) -> Self {
        self.within = Some(Scope {
            css: css.into(),
            text: Some(text.into()),
            parent: true,
        });
        self
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(scope) = &self.within {
            write!(f, "{}", scope.css)?;
            if let Some(text) = &scope.text {
                write!(f, "[text~'{}']", text)?;
            }
            if scope.parent {
                write!(f, "/..")?;
            }
            write!(f, " >> ")?;
        }
        write!(f, "{}", self.css)?;
        if let Some(text) = &self.text {
            write!(f, "[text~'{}']", text)?;
        }
        Ok(())
    }
}

fn parse_selector(css: &str) -> Result<Selector, RenderError> {
    Selector::parse(css).map_err(|e| RenderError::InvalidSelector {
        selector: css.to_string(),
        reason: e.to_string(),
    })
}

fn normalize_text(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

fn text_matches(element: &ElementRef<'_>, needle: Option<&str>) -> bool {
    match needle {
        None => true,
        Some(needle) => {
            let haystack = normalize_text(&element.text().collect::<String>());
            haystack.contains(&normalize_text(needle))
        }
    }
}

/// Elements matching a locator, in document order without duplicates.
pub fn select<'a>(document: &'a Html, locator: &Locator) -> Result<Vec<ElementRef<'a>>, RenderError> {
    let target = parse_selector(&locator.css)?;

    let roots: Vec<ElementRef<'a>> = match &locator.within {
        None => vec![document.root_element()],
        Some(scope) => {
            let scope_selector = parse_selector(&scope.css)?;
            document
                .select(&scope_selector)
                .filter(|el| text_matches(el, scope.text.as_deref()))
                .filter_map(|el| {
                    if scope.parent {
                        el.parent().and_then(ElementRef::wrap)
                    } else {
                        Some(el)
                    }
                })
                .collect()
        }
    };

    let mut found: Vec<ElementRef<'a>> = Vec::new();
    for root in roots {
        for el in root.select(&target) {
            if text_matches(&el, locator.text.as_deref()) && !found.iter().any(|f| f.id() == el.id()) {
                found.push(el);
            }
        }
    }
    // Scopes may overlap or nest, so restore document order.
    let order: Vec<_> = document.root_element().descendants().map(|n| n.id()).collect();
    found.sort_by_key(|el| order.iter().position(|id| *id == el.id()));
    Ok(found)
}

fn is_clickable(element: &ElementRef<'_>) -> bool {
    let value = element.value();
    value.attr("disabled").is_none()
        && value.attr("hidden").is_none()
        && value.attr("aria-hidden") != Some("true")
}

/// Index of the first element satisfying the condition in static markup.
pub fn find_static(
    html: &str,
    locator: &Locator,
    condition: WaitCondition,
) -> Result<Option<usize>, RenderError> {
    let document = Html::parse_document(html);
    let elements = select(&document, locator)?;
    Ok(elements.iter().position(|el| match condition {
        WaitCondition::Present => true,
        WaitCondition::Clickable => is_clickable(el),
    }))
}

/// Attribute of a previously located element in static markup.
pub fn attribute_static(
    html: &str,
    handle: &ElementHandle,
    name: &str,
) -> Result<Option<String>, RenderError> {
    let document = Html::parse_document(html);
    let elements = select(&document, &handle.locator)?;
    let element = elements
        .get(handle.index)
        .ok_or_else(|| RenderError::StaleElement(handle.to_string()))?;
    Ok(element.value().attr(name).map(|v| v.to_string()))
}

/// JavaScript that defines `__locate(spec)` with the same semantics as
/// [`select`].
const LOCATE_FN: &str = r#"
const __norm = (s) => (s || '').replace(/\s+/g, ' ').trim().toLowerCase();
const __textOk = (el, t) => !t || __norm(el.textContent).includes(__norm(t));
const __locate = (spec) => {
    let roots = [document];
    if (spec.within) {
        roots = Array.from(document.querySelectorAll(spec.within.css))
            .filter((el) => __textOk(el, spec.within.text))
            .map((el) => (spec.within.parent ? el.parentElement : el))
            .filter((el) => el);
    }
    const found = [];
    for (const root of roots) {
        for (const el of root.querySelectorAll(spec.css)) {
            if (!found.includes(el) && __textOk(el, spec.text)) {
                found.push(el);
            }
        }
    }
    found.sort((a, b) =>
        a === b ? 0 : a.compareDocumentPosition(b) & Node.DOCUMENT_POSITION_FOLLOWING ? -1 : 1
    );
    return found;
};
const __clickable = (el) => {
    const style = window.getComputedStyle(el);
    const rect = el.getBoundingClientRect();
    return !el.disabled
        && style.visibility !== 'hidden'
        && style.display !== 'none'
        && (rect.width > 0 || rect.height > 0);
};
"#;

fn spec_json(locator: &Locator) -> String {
    // Serializing plain strings cannot fail.
    serde_json::to_string(locator).unwrap_or_else(|_| "{}".to_string())
}

fn js_string(value: &str) -> String {
    serde_json::Value::String(value.to_string()).to_string()
}

/// Script returning the index of the first element satisfying the
/// condition, or -1.
pub fn find_script(locator: &Locator, condition: WaitCondition) -> String {
    let check = match condition {
        WaitCondition::Present => "true",
        WaitCondition::Clickable => "__clickable(els[i])",
    };
    format!(
        "(() => {{ {LOCATE_FN} const els = __locate({spec}); \
         for (let i = 0; i < els.length; i++) {{ if ({check}) return i; }} return -1; }})()",
        spec = spec_json(locator),
    )
}

/// Script that clicks the handle's element, returning whether it existed.
pub fn click_script(handle: &ElementHandle) -> String {
    format!(
        "(() => {{ {LOCATE_FN} const el = __locate({spec})[{index}]; \
         if (!el) return false; el.scrollIntoView({{ block: 'center' }}); el.click(); return true; }})()",
        spec = spec_json(&handle.locator),
        index = handle.index,
    )
}

/// Script returning an attribute of the handle's element (or null).
/// The second element of the returned pair says whether the element exists.
pub fn attribute_script(handle: &ElementHandle, name: &str) -> String {
    format!(
        "(() => {{ {LOCATE_FN} const el = __locate({spec})[{index}]; \
         return el ? [el.getAttribute({name}), true] : [null, false]; }})()",
        spec = spec_json(&handle.locator),
        index = handle.index,
        name = js_string(name),
    )
}

/// Script that sets a `<select>` element's value and fires `change`.
pub fn select_option_script(handle: &ElementHandle, value: &str) -> String {
    format!(
        "(() => {{ {LOCATE_FN} const el = __locate({spec})[{index}]; \
         if (!el) return false; el.value = {value}; \
         el.dispatchEvent(new Event('change', {{ bubbles: true }})); return true; }})()",
        spec = spec_json(&handle.locator),
        index = handle.index,
        value = js_string(value),
    )
}
