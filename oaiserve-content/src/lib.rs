// SPDX-FileCopyrightText: 2025 oaiserve contributors
// SPDX-License-Identifier: MIT

//! Content acquisition for an oaiserve repository.
//!
//! A [`ContentProvider`] yields raw content, a [`ContentObject`] turns raw
//! content into a record, and [`DatabaseUpdater`] writes the records into an
//! [`oaiserve_store_db::StoreDb`] with a per-run error policy.

mod directory;
mod error;
mod json;
mod list;
mod object;
mod provider;
mod updater;

pub use directory::DirectoryContentProvider;
pub use error::{Error, Result};
pub use json::JsonContentObject;
pub use list::ListContentProvider;
pub use object::{Asset, ContentObject, parse_timestamp};
pub use provider::{ContentProvider, RawContent};
pub use updater::{DatabaseUpdater, UpdateMode, UpdateReport};
