//! Output file layout: `{output_dir}/{category}/{stem}.pdf`.

use std::path::{Path, PathBuf};

use crate::models::ProductCandidate;
use crate::scrapers::extract::ModelCodePattern;
use crate::utils::{clean_filename, last_path_segment};

/// Maps candidates to deterministic output paths.
#[derive(Debug, Clone)]
pub struct OutputLayout {
    root: PathBuf,
    pattern: ModelCodePattern,
}

impl OutputLayout {
    pub fn new(root: impl Into<PathBuf>, pattern: ModelCodePattern) -> Self {
        Self {
            root: root.into(),
            pattern,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn category_dir(&self, category_name: &str) -> PathBuf {
        self.root.join(clean_filename(category_name))
    }

    /// Path for a candidate's spec sheet.
    ///
    /// The stem is the product URL's last segment when it carries the model
    /// code (`fd-100`), else the lower-cased model code.
    pub fn path_for(&self, category_name: &str, candidate: &ProductCandidate) -> PathBuf {
        let stem = last_path_segment(&candidate.product_url)
            .filter(|segment| self.pattern.is_match(segment))
            .unwrap_or_else(|| candidate.model_code.to_lowercase());
        let stem = stem.strip_suffix(".pdf").unwrap_or(&stem);
        self.category_dir(category_name)
            .join(format!("{}.pdf", clean_filename(stem)))
    }
}
