//! Shared utility functions.
//!
//! - `filename`: filesystem-safe names for categories and spec sheets
//! - `format`: human-readable sizes and durations
//! - `mime`: content-type matching for the expected document type
//! - `url`: joining relative links against the page they came from

mod filename;
mod format;
mod mime;
mod url;

pub use filename::clean_filename;
pub use format::{format_duration, format_size};
pub use mime::{content_type_matches, is_pdf_bytes};
pub use self::url::{last_path_segment, resolve_url};
