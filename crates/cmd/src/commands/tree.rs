// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

use crate::tree_format::{TreeBuilder, format_tree};
use crate::walk::{WalkVisitor, walk_dir};
use anyhow::Result;
use async_trait::async_trait;
use bucketfs::{BucketFs, Metadata};

/// Collects walked entries into a tree, labelling each by its name
#[derive(Debug, Default)]
struct TreeVisitor {
    builder: TreeBuilder,
}

#[async_trait]
impl WalkVisitor for TreeVisitor {
    async fn visit(&mut self, path: &str, meta: &Metadata, depth: usize) -> Result<()> {
        let label = if depth == 0 { path } else { meta.name() };
        self.builder.push(label, depth);
        Ok(())
    }
}

/// Print the tree below `path`
pub async fn tree_command<F>(fs: &BucketFs, path: &str, mut handler: F) -> Result<()>
where
    F: FnMut(&str),
{
    let mut visitor = TreeVisitor::default();
    let count = walk_dir(fs, path, &mut visitor).await?;
    diagnostics::debug!("tree visited {count} entries", count: count);

    if let Some(root) = visitor.builder.finish() {
        handler(format_tree(&root).trim_end());
    }
    Ok(())
}
