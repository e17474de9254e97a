// SPDX-FileCopyrightText: 2025 oaiserve contributors
// SPDX-License-Identifier: MIT

//! Metadata formats and their registry.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use oaiserve_store_db::Record;

use crate::oai_dc::OaiDc;
use crate::xml::XmlWriter;

/// A metadata format writer.
///
/// `write` appends the format's root element for `record` to `out`; the
/// caller wraps it in `<metadata>`.
pub trait MetadataFormat: Send + Sync {
    fn prefix(&self) -> &str;

    fn namespace(&self) -> &str;

    fn schema_location(&self) -> &str;

    fn write(&self, out: &mut XmlWriter, record: &Record);
}

/// Metadata formats available to a feed, keyed by prefix.
///
/// Built once at startup and handed to the facade; nothing registers
/// formats globally.
#[derive(Clone, Default)]
pub struct FormatRegistry {
    formats: BTreeMap<String, Arc<dyn MetadataFormat>>,
}

impl FormatRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding the built-in `oai_dc` writer.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(OaiDc));
        registry
    }

    /// Add a format, replacing any format with the same prefix.
    pub fn register(&mut self, format: Arc<dyn MetadataFormat>) {
        self.formats.insert(format.prefix().to_owned(), format);
    }

    pub fn get(&self, prefix: &str) -> Option<&Arc<dyn MetadataFormat>> {
        self.formats.get(prefix)
    }

    pub fn contains(&self, prefix: &str) -> bool {
        self.formats.contains_key(prefix)
    }

    pub fn prefixes(&self) -> impl Iterator<Item = &str> {
        self.formats.keys().map(String::as_str)
    }
}

impl fmt::Debug for FormatRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.prefixes()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Titles;

    impl MetadataFormat for Titles {
        fn prefix(&self) -> &str {
            "titles"
        }

        fn namespace(&self) -> &str {
            "urn:titles"
        }

        fn schema_location(&self) -> &str {
            "urn:titles.xsd"
        }

        fn write(&self, out: &mut XmlWriter, record: &Record) {
            for title in record.values("title") {
                out.element("title", title.as_str().unwrap_or_default());
            }
        }
    }

    #[test]
    fn test_registry() {
        let mut registry = FormatRegistry::with_defaults();
        assert!(registry.contains("oai_dc"));
        assert!(!registry.contains("titles"));

        registry.register(Arc::new(Titles));
        assert_eq!(registry.prefixes().collect::<Vec<_>>(), vec!["oai_dc", "titles"]);
        assert_eq!(registry.get("titles").unwrap().namespace(), "urn:titles");
        assert!(registry.get("mods").is_none());
    }
}
