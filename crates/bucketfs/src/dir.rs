// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! Open directory handles over a lazy listing cursor

use crate::bucket::{EntryStream, ObjectEntry};
use crate::context::OpContext;
use crate::error::{Error, Result};
use crate::metadata::Metadata;
use futures::StreamExt;
use futures::stream::Fuse;

/// A synthesized directory. Entries come from a forward-only listing
/// cursor; nothing is fetched until the first read.
pub struct Dir {
    path: String,
    entries: Fuse<EntryStream>,
    ctx: OpContext,
}

impl Dir {
    pub(crate) fn new(path: &str, entries: EntryStream, ctx: OpContext) -> Self {
        Self {
            path: path.to_string(),
            entries: entries.fuse(),
            ctx,
        }
    }

    /// Path relative to the view it was opened from
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    #[must_use]
    pub fn stat(&self) -> Metadata {
        Metadata::directory(&self.path)
    }

    /// Directories have no byte content
    pub async fn read(&mut self, _buf: &mut [u8]) -> Result<usize> {
        Ok(0)
    }

    /// Read entries in listing order.
    ///
    /// With `None` the cursor is drained and an exhausted cursor yields an
    /// empty list. With `Some(n)` at most `n` entries are returned and an
    /// already exhausted cursor yields `Error::EndOfDirectory`.
    pub async fn read_dir(&mut self, limit: Option<usize>) -> Result<Vec<Metadata>> {
        let mut entries = Vec::new();
        if limit == Some(0) {
            return Ok(entries);
        }

        while limit.is_none_or(|n| entries.len() < n) {
            match self.next_entry().await? {
                Some(entry) => entries.push(Metadata::from_entry(&entry)),
                None => break,
            }
        }

        let count = entries.len();
        let path = &self.path;
        diagnostics::debug!("Read {count} entries from {path}", count: count, path: path);

        if entries.is_empty() && limit.is_some() {
            return Err(Error::EndOfDirectory);
        }
        Ok(entries)
    }

    pub fn close(self) -> Result<()> {
        drop(self);
        Ok(())
    }

    async fn next_entry(&mut self) -> Result<Option<ObjectEntry>> {
        let entries = &mut self.entries;
        self.ctx
            .run(async move { entries.next().await.transpose() })
            .await
    }
}

impl std::fmt::Debug for Dir {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dir")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}
