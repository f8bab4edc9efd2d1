// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! The backing store seam
//!
//! A `Bucket` is a flat container of objects addressed by opaque string
//! keys. It knows nothing about directories: the filesystem infers them
//! from listing queries issued with a single-level delimiter, which
//! collapse nested keys into common prefixes.

use crate::error::Result;
use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use futures::stream::BoxStream;
use std::ops::Range;

/// Lazy, forward-only sequence of listing results. `None` means the
/// listing is exhausted; a fresh query is the only way to restart it.
pub type EntryStream = BoxStream<'static, Result<ObjectEntry>>;

/// Byte content of one object
pub type ByteStream = BoxStream<'static, Result<Bytes>>;

/// A listing query
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Query {
    /// Only keys starting with this string are listed. Empty or ending
    /// in the delimiter.
    pub prefix: String,
    /// When set, keys with a `/` after the prefix are collapsed into one
    /// common prefix per first segment. Otherwise every key below the
    /// prefix is listed.
    pub delimited: bool,
}

impl Query {
    #[must_use]
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            delimited: false,
        }
    }

    /// A single-level listing
    #[must_use]
    pub fn delimited(mut self) -> Self {
        self.delimited = true;
        self
    }
}

/// Attributes of a stored object
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectAttrs {
    /// Full key within the bucket
    pub key: String,
    /// Size in bytes
    pub size: u64,
    /// Last modification time reported by the store
    pub updated: DateTime<Utc>,
    /// Entity tag, when the store reports one
    pub e_tag: Option<String>,
}

/// One result of a listing query: a concrete object, or a common prefix
/// standing in for everything nested below it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ObjectEntry {
    Object(ObjectAttrs),
    /// Always ends with the delimiter
    Prefix(String),
}

impl ObjectEntry {
    /// The key, or the common prefix string
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            ObjectEntry::Object(attrs) => &attrs.key,
            ObjectEntry::Prefix(prefix) => prefix,
        }
    }
}

/// Read access to a flat object container
///
/// Implementations translate their own not-found conditions into
/// `Error::NotFound` and pass every other failure through unchanged.
#[async_trait]
pub trait Bucket: Send + Sync {
    /// Start a listing. No request is issued until the stream is polled.
    /// A delimited listing must not read objects nested deeper than one
    /// level below the prefix.
    fn list(&self, query: &Query) -> EntryStream;

    /// Open the object at `key`, returning the attributes snapshot taken
    /// by the same request together with its content.
    async fn get(&self, key: &str) -> Result<(ObjectAttrs, ByteStream)>;

    /// Like `get`, but the content is only the bytes in `range`. The
    /// attributes still describe the whole object.
    async fn get_range(&self, key: &str, range: Range<u64>) -> Result<(ObjectAttrs, ByteStream)>;

    /// Fetch the attributes of the object at `key` without its content.
    async fn head(&self, key: &str) -> Result<ObjectAttrs>;
}
