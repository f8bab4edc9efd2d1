// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! `Bucket` implementation over any `object_store::ObjectStore`
//!
//! Google Cloud Storage, S3, Azure, the local filesystem and the in-memory
//! store all come through here. Delimited queries are answered by the
//! store's own `list_with_delimiter`, so a directory listing costs one
//! query for that directory regardless of how much is nested below it.
//! Recursive queries stream from `ObjectStore::list` and fetch pages only
//! as entries are consumed.

use crate::bucket::{Bucket, ByteStream, EntryStream, ObjectAttrs, ObjectEntry, Query};
use crate::error::{Error, Result};
use crate::path::SEPARATOR;
use async_trait::async_trait;
use futures::future;
use futures::stream::{self, StreamExt, TryStreamExt};
use object_store::path::Path;
use object_store::{GetOptions, GetRange, GetResult, ListResult, ObjectMeta, ObjectStore};
use std::ops::Range;
use std::sync::Arc;

/// Bucket backed by an `ObjectStore`
#[derive(Debug, Clone)]
pub struct ObjectStoreBucket {
    store: Arc<dyn ObjectStore>,
}

impl ObjectStoreBucket {
    #[must_use]
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self { store }
    }
}

/// Store path for a key. Keys reaching the store were validated already;
/// anything `Path::parse` still rejects is reported as an invalid path.
fn store_path(key: &str) -> Result<Path> {
    Path::parse(key).map_err(|_| Error::invalid_path(key))
}

/// Store prefix for a query prefix; `None` lists the whole bucket
fn store_prefix(prefix: &str) -> Result<Option<Path>> {
    let trimmed = prefix.trim_end_matches(SEPARATOR);
    if trimmed.is_empty() {
        return Ok(None);
    }
    store_path(trimmed).map(Some)
}

impl From<&ObjectMeta> for ObjectAttrs {
    fn from(meta: &ObjectMeta) -> Self {
        Self {
            key: meta.location.to_string(),
            size: meta.size,
            updated: meta.last_modified,
            e_tag: meta.e_tag.clone(),
        }
    }
}

/// True when `location` lies strictly below the query prefix.
///
/// `Path` drops trailing separators, so a zero-length folder marker such
/// as `subdir/` comes back located at `subdir` itself and fails this test.
fn below(location: &Path, prefix: &str) -> bool {
    location
        .as_ref()
        .strip_prefix(prefix)
        .is_some_and(|rest| !rest.is_empty())
}

/// Entries of one delimited listing, objects and common prefixes merged
/// in key order
fn directory_entries(listing: ListResult, prefix: &str) -> Vec<ObjectEntry> {
    let prefixes = listing
        .common_prefixes
        .iter()
        .map(|path| ObjectEntry::Prefix(format!("{path}{SEPARATOR}")));
    let objects = listing
        .objects
        .iter()
        .filter(|meta| below(&meta.location, prefix))
        .map(|meta| ObjectEntry::Object(ObjectAttrs::from(meta)));

    let mut entries: Vec<ObjectEntry> = prefixes.chain(objects).collect();
    entries.sort_by(|a, b| a.name().cmp(b.name()));
    entries
}

fn opened(key: &str, result: GetResult) -> (ObjectAttrs, ByteStream) {
    let attrs = ObjectAttrs::from(&result.meta);
    let owned_key = key.to_string();
    let content = result
        .into_stream()
        .map_err(move |err| Error::from_store(err, &owned_key))
        .boxed();
    (attrs, content)
}

#[async_trait]
impl Bucket for ObjectStoreBucket {
    fn list(&self, query: &Query) -> EntryStream {
        let prefix = match store_prefix(&query.prefix) {
            Ok(prefix) => prefix,
            Err(err) => return stream::once(async move { Err(err) }).boxed(),
        };

        let query_prefix = &query.prefix;
        let delimited = query.delimited;
        diagnostics::debug!(
            "Listing prefix {query_prefix} delimited={delimited}",
            query_prefix: query_prefix,
            delimited: delimited
        );

        let query = query.clone();
        if !query.delimited {
            return self
                .store
                .list(prefix.as_ref())
                .filter_map(move |item| {
                    future::ready(match item {
                        Ok(meta) => below(&meta.location, &query.prefix)
                            .then(|| Ok(ObjectEntry::Object(ObjectAttrs::from(&meta)))),
                        Err(err) => Some(Err(Error::from_store(err, &query.prefix))),
                    })
                })
                .boxed();
        }

        let store = Arc::clone(&self.store);
        stream::once(async move {
            let listing = store
                .list_with_delimiter(prefix.as_ref())
                .await
                .map_err(|err| Error::from_store(err, &query.prefix))?;
            let entries = directory_entries(listing, &query.prefix);
            Ok::<_, Error>(stream::iter(entries.into_iter().map(Ok::<_, Error>)))
        })
        .try_flatten()
        .boxed()
    }

    async fn get(&self, key: &str) -> Result<(ObjectAttrs, ByteStream)> {
        let path = store_path(key)?;
        let result = self
            .store
            .get(&path)
            .await
            .map_err(|err| Error::from_store(err, key))?;
        Ok(opened(key, result))
    }

    async fn get_range(&self, key: &str, range: Range<u64>) -> Result<(ObjectAttrs, ByteStream)> {
        let path = store_path(key)?;
        let options = GetOptions {
            range: Some(GetRange::Bounded(range)),
            ..GetOptions::default()
        };
        let result = self
            .store
            .get_opts(&path, options)
            .await
            .map_err(|err| Error::from_store(err, key))?;
        Ok(opened(key, result))
    }

    async fn head(&self, key: &str) -> Result<ObjectAttrs> {
        let path = store_path(key)?;
        let meta = self
            .store
            .head(&path)
            .await
            .map_err(|err| Error::from_store(err, key))?;
        Ok(ObjectAttrs::from(&meta))
    }
}
