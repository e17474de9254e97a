// SPDX-FileCopyrightText: 2025 oaiserve contributors
// SPDX-License-Identifier: MIT

//! OAI-PMH 2.0 feed over an [`oaiserve_store_db::StoreDb`].
//!
//! [`OaiServer`] is the facade between protocol requests and the store's
//! query engine. [`Feed`] wraps it with request decoding and XML rendering
//! behind a single [`Feed::handle_request`] entry point.
//!
//! Metadata formats are looked up in an explicit [`FormatRegistry`] built by
//! the caller; [`FormatRegistry::with_defaults`] provides `oai_dc`.
//!
//! Resumption tokens are not issued: list verbs answer with the first
//! `batch_size` matches.

mod config;
mod datestamp;
mod error;
mod feed;
mod format;
mod oai_dc;
mod request;
mod response;
mod server;
mod xml;

pub use config::FeedConfig;
pub use datestamp::{Datestamp, GRANULARITY, Granularity, format_datestamp};
pub use error::{FeedConfigError, OaiError, Result};
pub use feed::Feed;
pub use format::{FormatRegistry, MetadataFormat};
pub use oai_dc::OaiDc;
pub use request::OaiRequest;
pub use server::{FormatInfo, Header, Identify, ListRequest, OaiServer};
pub use xml::XmlWriter;
