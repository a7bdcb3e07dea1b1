//! Spec-sheet resolution results.

use serde::Serialize;

use super::FailureRecord;

/// Outcome of resolving one product page to its spec-sheet URL.
///
/// `spec_url` is only ever set together with `verified = true`; a link that
/// fails the live probe is discarded rather than returned unverified.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SpecResolution {
    pub product_url: String,
    pub spec_url: Option<String>,
    pub verified: bool,
    pub failure: Option<FailureRecord>,
}

impl SpecResolution {
    pub fn verified(product_url: impl Into<String>, spec_url: impl Into<String>) -> Self {
        Self {
            product_url: product_url.into(),
            spec_url: Some(spec_url.into()),
            verified: true,
            failure: None,
        }
    }

    pub fn not_found(product_url: impl Into<String>, failure: FailureRecord) -> Self {
        Self {
            product_url: product_url.into(),
            spec_url: None,
            verified: false,
            failure: Some(failure),
        }
    }

    /// The verified spec URL, if resolution succeeded.
    pub fn accepted_url(&self) -> Option<&str> {
        if self.verified {
            self.spec_url.as_deref()
        } else {
            None
        }
    }
}
