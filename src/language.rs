//! Closed mapping from editor syntax identifiers to tool language tags.
//!
//! Editors report syntaxes in their own spelling (often a file path such as
//! `Packages/JavaScript/JavaScript.sublime-syntax`); the tool only understands
//! a small set of canonical tags. The mapping is matched by substring against
//! the lowercased basename, first entry wins, and anything outside the map
//! yields `None` so callers skip language filtering entirely.

use std::path::Path;

/// Language the tool falls back to when a snippet has no body for the
/// session's language.
pub const DEFAULT_LANGUAGE: &str = "javascript";

const LANGUAGE_MAP: &[(&str, &str)] = &[
    ("javascript", "javascript"),
    ("js", "javascript"),
    ("typescript", "javascript"),
    ("ts", "javascript"),
    ("python", "python"),
    ("ruby", "ruby"),
    ("php", "php"),
    ("shell", "bash"),
    ("bash", "bash"),
    ("sh", "bash"),
];

/// Canonical tool language for an editor-reported syntax identifier.
pub fn language_for_syntax(syntax: &str) -> Option<&'static str> {
    let name = Path::new(syntax)
        .file_name()
        .map(|name| name.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    LANGUAGE_MAP
        .iter()
        .find(|(key, _)| name.contains(key))
        .map(|&(_, language)| language)
}
