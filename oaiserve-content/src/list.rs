// SPDX-FileCopyrightText: 2025 oaiserve contributors
// SPDX-License-Identifier: MIT

//! Content provider backed by an in-memory list of documents.

use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::error::{Error, Result};
use crate::object::parse_timestamp;
use crate::provider::{ContentProvider, RawContent};

/// Serves a fixed list of JSON documents; content ids are list positions.
#[derive(Debug, Clone, Default)]
pub struct ListContentProvider {
    content: Vec<Value>,
}

impl ListContentProvider {
    pub fn new(content: Vec<Value>) -> Self {
        Self { content }
    }

    fn modified_since(document: &Value, from: DateTime<Utc>) -> bool {
        document
            .get("modified")
            .and_then(Value::as_str)
            .and_then(parse_timestamp)
            .is_some_and(|modified| modified >= from)
    }
}

impl ContentProvider for ListContentProvider {
    /// Documents without a readable `modified` are only reported when
    /// `from` is `None`.
    fn update(&mut self, from: Option<DateTime<Utc>>) -> Result<Vec<String>> {
        Ok(self
            .content
            .iter()
            .enumerate()
            .filter(|(_, document)| from.is_none_or(|from| Self::modified_since(document, from)))
            .map(|(index, _)| index.to_string())
            .collect())
    }

    fn count(&self) -> usize {
        self.content.len()
    }

    fn content_ids(&self) -> Vec<String> {
        (0..self.content.len()).map(|index| index.to_string()).collect()
    }

    fn content_by_id(&self, id: &str) -> Result<RawContent> {
        id.parse::<usize>()
            .ok()
            .and_then(|index| self.content.get(index))
            .map(|document| RawContent::Value(document.clone()))
            .ok_or_else(|| Error::UnknownContent(id.to_owned()))
    }

    fn name(&self) -> &str {
        "list"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn provider() -> ListContentProvider {
        ListContentProvider::new(vec![
            json!({"id": "a", "modified": "2008-01-01T00:00:00Z"}),
            json!({"id": "b", "modified": "2004-01-01T00:00:00Z"}),
            json!({"id": "c"}),
        ])
    }

    #[test]
    fn test_update_without_date() {
        let mut provider = provider();
        assert_eq!(provider.update(None).unwrap(), vec!["0", "1", "2"]);
        assert_eq!(provider.count(), 3);
        assert_eq!(provider.content_ids(), vec!["0", "1", "2"]);
    }

    #[test]
    fn test_update_from_date() {
        let mut provider = provider();
        let from = Utc.with_ymd_and_hms(2006, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(provider.update(Some(from)).unwrap(), vec!["0"]);
        // Every document stays addressable.
        assert_eq!(provider.count(), 3);
    }

    #[test]
    fn test_content_by_id() {
        let provider = provider();
        assert_eq!(
            provider.content_by_id("2").unwrap(),
            RawContent::Value(json!({"id": "c"}))
        );
        assert!(matches!(
            provider.content_by_id("3"),
            Err(Error::UnknownContent(_))
        ));
        assert!(matches!(
            provider.content_by_id("x"),
            Err(Error::UnknownContent(_))
        ));
    }
}
