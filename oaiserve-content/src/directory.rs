// SPDX-FileCopyrightText: 2025 oaiserve contributors
// SPDX-License-Identifier: MIT

//! Content provider reading a directory tree of files.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::error::{Error, Result};
use crate::provider::{ContentProvider, RawContent};

/// Walks a directory tree and serves every file with the configured
/// extension.
///
/// Hidden directories are not entered; files whose name starts with `.` or
/// `#` are skipped. Content ids are paths relative to the root, joined with
/// `/`. Ids found by earlier updates stay known.
#[derive(Debug, Clone)]
pub struct DirectoryContentProvider {
    root: PathBuf,
    extension: String,
    content: BTreeMap<String, PathBuf>,
}

impl DirectoryContentProvider {
    pub fn new(root: impl Into<PathBuf>, extension: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            extension: extension.into(),
            content: BTreeMap::new(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn harvest(
        &self,
        dir: &Path,
        from: Option<DateTime<Utc>>,
        found: &mut BTreeMap<String, PathBuf>,
    ) -> Result<()> {
        let entries = fs::read_dir(dir).map_err(|e| io_error(dir, e))?;
        for entry in entries {
            let entry = entry.map_err(|e| io_error(dir, e))?;
            let path = entry.path();
            let name = entry.file_name();
            let name = name.to_string_lossy();
            let file_type = entry.file_type().map_err(|e| io_error(&path, e))?;

            if file_type.is_dir() {
                if !name.starts_with('.') {
                    self.harvest(&path, from, found)?;
                }
                continue;
            }
            if name.starts_with('.') || name.starts_with('#') {
                continue;
            }
            if path.extension().is_none_or(|ext| ext != self.extension.as_str()) {
                continue;
            }
            if let Some(from) = from {
                let mtime = entry
                    .metadata()
                    .and_then(|meta| meta.modified())
                    .map_err(|e| io_error(&path, e))?;
                if DateTime::<Utc>::from(mtime) < from {
                    continue;
                }
            }
            found.insert(self.content_id(&path), path);
        }
        Ok(())
    }

    fn content_id(&self, path: &Path) -> String {
        let relative = path.strip_prefix(&self.root).unwrap_or(path);
        relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/")
    }
}

fn io_error(path: &Path, source: std::io::Error) -> Error {
    Error::Io {
        path: path.to_owned(),
        source,
    }
}

impl ContentProvider for DirectoryContentProvider {
    fn update(&mut self, from: Option<DateTime<Utc>>) -> Result<Vec<String>> {
        let mut found = BTreeMap::new();
        self.harvest(&self.root, from, &mut found)?;
        debug!(
            "Found {} changed files below {}",
            found.len(),
            self.root.display()
        );
        let ids = found.keys().cloned().collect();
        self.content.extend(found);
        Ok(ids)
    }

    fn count(&self) -> usize {
        self.content.len()
    }

    fn content_ids(&self) -> Vec<String> {
        self.content.keys().cloned().collect()
    }

    fn content_by_id(&self, id: &str) -> Result<RawContent> {
        self.content
            .get(id)
            .map(|path| RawContent::File(path.clone()))
            .ok_or_else(|| Error::UnknownContent(id.to_owned()))
    }

    fn name(&self) -> &str {
        "directory"
    }
}
