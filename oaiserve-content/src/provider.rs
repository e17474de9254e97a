// SPDX-FileCopyrightText: 2025 oaiserve contributors
// SPDX-License-Identifier: MIT

//! The content provider seam.

use std::path::PathBuf;

use chrono::{DateTime, Utc};

use crate::error::Result;

/// Raw content handed from a provider to a content object.
#[derive(Debug, Clone, PartialEq)]
pub enum RawContent {
    /// An already decoded document.
    Value(serde_json::Value),
    /// A file the content object reads itself.
    File(PathBuf),
}

/// A source of raw content, addressed by provider-local ids.
///
/// Provider ids only identify raw content; the record id is whatever the
/// content object extracts from it.
pub trait ContentProvider {
    /// Refresh the provider and return the ids of content changed since
    /// `from` (everything when `None`).
    fn update(&mut self, from: Option<DateTime<Utc>>) -> Result<Vec<String>>;

    /// Number of content ids currently known.
    fn count(&self) -> usize;

    /// All content ids currently known, in a stable order.
    fn content_ids(&self) -> Vec<String>;

    fn content_by_id(&self, id: &str) -> Result<RawContent>;

    /// Short name used in log messages.
    fn name(&self) -> &str;
}
