// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

use anyhow::{Context, Result};
use bucketfs::BucketFs;

/// List one directory, one entry per line; directories end in `/`
pub async fn ls_command<F>(fs: &BucketFs, path: &str, mut handler: F) -> Result<()>
where
    F: FnMut(&str),
{
    let entries = fs
        .read_dir(path)
        .await
        .with_context(|| format!("Failed to list '{path}'"))?;

    for entry in &entries {
        let suffix = if entry.is_dir() { "/" } else { "" };
        handler(&format!("{}{suffix}", entry.name()));
    }
    Ok(())
}
