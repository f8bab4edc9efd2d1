// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! Depth-first traversal of a bucket view

use anyhow::{Context, Result};
use async_trait::async_trait;
use bucketfs::{BucketFs, Metadata};

/// Receives every entry of a walk, parents before their children
#[async_trait]
pub trait WalkVisitor: Send {
    /// `path` is relative to the view; `depth` is 0 for the walk root
    async fn visit(&mut self, path: &str, meta: &Metadata, depth: usize) -> Result<()>;
}

/// Visit `root` and everything below it in listing order, descending into
/// each directory before continuing with its siblings. Returns the number
/// of entries visited.
pub async fn walk_dir<V>(fs: &BucketFs, root: &str, visitor: &mut V) -> Result<usize>
where
    V: WalkVisitor + ?Sized,
{
    let root_meta = fs
        .stat(root)
        .await
        .with_context(|| format!("Failed to stat '{root}'"))?;

    let mut stack = vec![(root.to_string(), root_meta, 0)];
    let mut visited = 0;

    while let Some((path, meta, depth)) = stack.pop() {
        visitor.visit(&path, &meta, depth).await?;
        visited += 1;

        if !meta.is_dir() {
            continue;
        }

        let mut dir = fs
            .open(&path)
            .await
            .and_then(bucketfs::Handle::into_dir)
            .with_context(|| format!("Failed to open directory '{path}'"))?;
        let entries = dir
            .read_dir(None)
            .await
            .with_context(|| format!("Failed to list '{path}'"))?;

        // Reversed so that the first listed entry is popped first
        for entry in entries.into_iter().rev() {
            let child = bucketfs::path::join(&path, entry.name());
            stack.push((child, entry, depth + 1));
        }
    }

    Ok(visited)
}
