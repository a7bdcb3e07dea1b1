//! Vendor model-code pattern.
//!
//! Model codes look like `FD-100` or `GRD-12A`: a known prefix, a dash,
//! digits and an optional trailing letter. The same pattern drives link
//! discovery and output filenames.

use std::collections::HashSet;

use regex::Regex;

use crate::error::{Result, ScrapeError};

/// Prefixes recognized when none are configured.
pub const DEFAULT_PREFIXES: &[&str] = &["GRD", "RD", "FD", "DS", "FS", "CO", "TD"];

/// Compiled, case-insensitive model-code matcher.
#[derive(Debug, Clone)]
pub struct ModelCodePattern {
    regex: Regex,
}

impl ModelCodePattern {
    /// Build a matcher for the given prefixes.
    pub fn new<S: AsRef<str>>(prefixes: &[S]) -> Result<Self> {
        if prefixes.is_empty() {
            return Err(ScrapeError::Config(
                "at least one model-code prefix is required".to_string(),
            ));
        }
        // Longest first so GRD wins over RD at the same position.
        let mut prefixes: Vec<String> = prefixes
            .iter()
            .map(|p| regex::escape(p.as_ref().trim()))
            .collect();
        prefixes.sort_by_key(|p| std::cmp::Reverse(p.len()));

        let pattern = format!(r"(?i)\b(?:{})-\d+[A-Z]?", prefixes.join("|"));
        let regex = Regex::new(&pattern)
            .map_err(|e| ScrapeError::Config(format!("invalid model-code pattern: {}", e)))?;
        Ok(Self { regex })
    }

    /// Whether the text contains a model code.
    pub fn is_match(&self, text: &str) -> bool {
        self.regex.is_match(text)
    }

    /// First model code in the text, upper-cased.
    pub fn find(&self, text: &str) -> Option<String> {
        self.regex.find(text).map(|m| m.as_str().to_uppercase())
    }

    /// Every distinct model code in the text, upper-cased, in order of
    /// first appearance.
    pub fn find_all(&self, text: &str) -> Vec<String> {
        let mut seen = HashSet::new();
        self.regex
            .find_iter(text)
            .map(|m| m.as_str().to_uppercase())
            .filter(|code| seen.insert(code.clone()))
            .collect()
    }
}
