// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! The filesystem view over a bucket
//!
//! A view is a (bucket, prefix, context) triple. Every path argument is
//! relative to the view's prefix. Directories are not stored: a path is a
//! directory when at least one object is nested under `path/`.

use crate::bucket::{Bucket, Query};
use crate::context::OpContext;
use crate::dir::Dir;
use crate::error::{Error, Result};
use crate::file::File;
use crate::handle::Handle;
use crate::metadata::Metadata;
use crate::object_store_bucket::ObjectStoreBucket;
use crate::path;
use futures::StreamExt;
use object_store::ObjectStore;
use std::ops::Range;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Read-only hierarchical view of a bucket, optionally scoped to a prefix
#[derive(Clone)]
pub struct BucketFs {
    bucket: Arc<dyn Bucket>,
    prefix: String,
    ctx: OpContext,
}

impl BucketFs {
    /// A view of the whole bucket
    #[must_use]
    pub fn new(bucket: Arc<dyn Bucket>) -> Self {
        Self {
            bucket,
            prefix: String::new(),
            ctx: OpContext::new(),
        }
    }

    #[must_use]
    pub fn from_object_store(store: Arc<dyn ObjectStore>) -> Self {
        Self::new(Arc::new(ObjectStoreBucket::new(store)))
    }

    #[must_use]
    pub fn with_context(mut self, ctx: OpContext) -> Self {
        self.ctx = ctx;
        self
    }

    /// Deadline `timeout` from now for every operation of this view
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.ctx = self.ctx.with_timeout(timeout);
        self
    }

    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.ctx = self.ctx.with_token(token);
        self
    }

    /// Key prefix of this view; empty for the bucket root
    #[must_use]
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    #[must_use]
    pub fn context(&self) -> &OpContext {
        &self.ctx
    }

    /// Open a file or directory.
    ///
    /// The root of the view is always a directory. A path that is both an
    /// object key and a prefix with descendants opens as the directory.
    pub async fn open(&self, path: &str) -> Result<Handle> {
        let key = self.resolve(path)?;

        if self.dir_exists(path, &key).await? {
            diagnostics::debug!("Opening directory {key}", key: &key);
            return Ok(Handle::Dir(self.dir(path, &key)));
        }

        diagnostics::debug!("Opening object {key}", key: &key);
        let (attrs, content) = self
            .ctx
            .run(self.bucket.get(&key))
            .await
            .map_err(|err| relative(err, path))?;
        Ok(Handle::File(File::new(path, attrs, content, &self.ctx)))
    }

    /// Open only the bytes of `range` of the file at `path`. The range must
    /// be non-empty and start inside the object; `stat` on the returned
    /// file still describes the whole object.
    pub async fn open_range(&self, path: &str, range: Range<u64>) -> Result<File> {
        let key = self.resolve(path)?;
        if self.dir_exists(path, &key).await? {
            return Err(Error::is_a_directory(path));
        }

        let (start, end) = (range.start, range.end);
        diagnostics::debug!("Opening object {key} bytes {start}..{end}", key: &key, start: start, end: end);
        let (attrs, content) = self
            .ctx
            .run(self.bucket.get_range(&key, range))
            .await
            .map_err(|err| relative(err, path))?;
        Ok(File::new(path, attrs, content, &self.ctx))
    }

    /// Metadata without opening a content stream
    pub async fn stat(&self, path: &str) -> Result<Metadata> {
        let path = path::trim_separators(path);
        let key = self.resolve(path)?;

        if self.dir_exists(path, &key).await? {
            return Ok(Metadata::directory(path));
        }

        let attrs = self
            .ctx
            .run(self.bucket.head(&key))
            .await
            .map_err(|err| relative(err, path))?;
        Ok(Metadata::file(&attrs))
    }

    /// All entries of a directory, in listing order
    pub async fn read_dir(&self, path: &str) -> Result<Vec<Metadata>> {
        let path = path::trim_separators(path);
        let key = self.resolve(path)?;

        if !self.dir_exists(path, &key).await? {
            // Distinguish a file from nothing at all
            _ = self
                .ctx
                .run(self.bucket.head(&key))
                .await
                .map_err(|err| relative(err, path))?;
            return Err(Error::not_a_directory(path));
        }

        self.dir(path, &key).read_dir(None).await
    }

    /// Entire content of a file
    pub async fn read_file(&self, path: &str) -> Result<Vec<u8>> {
        let mut file = self.open(path).await?.into_file()?;
        file.read_to_end().await
    }

    /// A view rooted at `path`. Sharing the bucket and the context, it
    /// behaves as if every path were prefixed with `path`.
    pub fn sub(&self, path: &str) -> Result<BucketFs> {
        path::validate(path)?;
        Ok(Self {
            bucket: Arc::clone(&self.bucket),
            prefix: path::join(&self.prefix, path),
            ctx: self.ctx.clone(),
        })
    }

    /// True when `path` names a directory of this view
    pub async fn is_dir(&self, path: &str) -> Result<bool> {
        let key = self.resolve(path)?;
        self.dir_exists(path, &key).await
    }

    fn resolve(&self, path: &str) -> Result<String> {
        path::validate(path)?;
        Ok(path::join(&self.prefix, path))
    }

    /// First result of a recursive listing under `key/`; only the first
    /// page is ever requested. The view root never needs one.
    async fn dir_exists(&self, path: &str, key: &str) -> Result<bool> {
        if path::is_root(path) {
            return Ok(true);
        }

        let query = Query::new(path::dir_prefix(key));
        let mut listing = self.bucket.list(&query);
        let first = self
            .ctx
            .run(async move { listing.next().await.transpose() })
            .await;

        match first {
            Ok(found) => {
                let is_dir = found.is_some();
                diagnostics::debug!("Checked {key}: directory={is_dir}", key: key, is_dir: is_dir);
                Ok(is_dir)
            }
            // Stores with real directories report a missing one this way
            Err(Error::NotFound(_)) => Ok(false),
            Err(err) => Err(err),
        }
    }

    fn dir(&self, path: &str, key: &str) -> Dir {
        let query = Query::new(path::dir_prefix(key)).delimited();
        Dir::new(path, self.bucket.list(&query), self.ctx.clone())
    }
}

/// Report not-found conditions by the path the caller used, not the key
fn relative(err: Error, path: &str) -> Error {
    match err {
        Error::NotFound(_) => Error::not_found(path),
        other => other,
    }
}

impl std::fmt::Debug for BucketFs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BucketFs")
            .field("prefix", &self.prefix)
            .field("ctx", &self.ctx)
            .finish_non_exhaustive()
    }
}
