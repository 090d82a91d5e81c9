//! Destination key derivation
//!
//! Every source item maps to a key of the form `{prefix}{identifier}-{filename}`
//! (or `{prefix}{filename}` when the item has no usable identifier). The key
//! must be stable across runs so that already uploaded items are recognized.

use crate::account::{FILENAME_ATTRIBUTES, IDENTIFIER_ATTRIBUTES, SourceItem};

/// Extension used for synthesized filenames
const FALLBACK_EXTENSION: &str = "jpg";

/// Builds destination keys under a fixed prefix
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyBuilder {
    prefix: String,
}

impl KeyBuilder {
    pub fn new(prefix: &str) -> Self {
        Self {
            prefix: normalize_prefix(prefix),
        }
    }

    /// The normalized prefix (empty, or ending with `/`)
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Key for an item with the given identifier and resolved filename
    pub fn key(&self, identifier: Option<&str>, filename: &str) -> String {
        let safe = identifier.map(sanitize_identifier).unwrap_or_default();
        if safe.is_empty() {
            format!("{}{filename}", self.prefix)
        } else {
            format!("{}{safe}-{filename}", self.prefix)
        }
    }
}

/// Make a prefix end with a path separator
///
/// An empty prefix becomes `/`.
pub fn normalize_prefix(prefix: &str) -> String {
    if prefix.ends_with('/') {
        prefix.to_string()
    } else {
        format!("{prefix}/")
    }
}

/// Keep only `[A-Za-z0-9_-]`; everything else is dropped
pub fn sanitize_identifier(identifier: &str) -> String {
    identifier
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '-' || *c == '_')
        .collect()
}

/// First non-empty identifier attribute of the item
pub fn resolve_identifier(item: &dyn SourceItem) -> Option<String> {
    IDENTIFIER_ATTRIBUTES
        .iter()
        .filter_map(|attr| item.attribute(*attr))
        .find(|value| !value.is_empty())
}

/// First non-empty filename attribute of the item, or a synthesized one
///
/// Synthesized names are `{identifier}.jpg`, falling back to fresh random hex
/// when the item has no identifier either. Random names differ on every call.
pub fn resolve_filename(item: &dyn SourceItem) -> String {
    if let Some(name) = FILENAME_ATTRIBUTES
        .iter()
        .filter_map(|attr| item.attribute(*attr))
        .find(|value| !value.is_empty())
    {
        return name;
    }

    let stem = resolve_identifier(item).unwrap_or_else(|| {
        let random = hex::encode(rand::random::<[u8; 16]>());
        tracing::debug!(name = %random, "Item has neither filename nor identifier");
        random
    });
    format!("{stem}.{FALLBACK_EXTENSION}")
}
