// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

use anyhow::{Context, Result};
use bucketfs::BucketFs;
use tokio::io::{AsyncWrite, AsyncWriteExt};

/// Copy each file to `out` in order. The first failure stops the command;
/// bytes already written stay written.
pub async fn cat_command<W>(fs: &BucketFs, files: &[String], out: &mut W) -> Result<u64>
where
    W: AsyncWrite + Unpin,
{
    let mut total = 0;
    for path in files {
        diagnostics::debug!("cat {path}", path: path);

        let mut file = fs
            .open(path)
            .await
            .and_then(bucketfs::Handle::into_file)
            .with_context(|| format!("Failed to open '{path}'"))?;

        total += tokio::io::copy(&mut file, out)
            .await
            .with_context(|| format!("Failed to read '{path}'"))?;
    }
    out.flush().await?;
    Ok(total)
}
