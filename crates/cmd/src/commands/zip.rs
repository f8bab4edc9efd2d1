// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! Zip archives of a bucket view
//!
//! The walk runs on the async runtime and hands entries to a blocking
//! task that owns the `ZipWriter`, so archive I/O never blocks a runtime
//! worker.

use crate::walk::{WalkVisitor, walk_dir};
use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use bucketfs::{BucketFs, Handle, Metadata};
use bytes::Bytes;
use chrono::{DateTime, Datelike, Timelike, Utc};
use futures::StreamExt;
use std::io::{Seek, Write};
use std::path::Path;
use tokio::sync::mpsc;
use tokio_util::io::ReaderStream;
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

const COPY_BUFFER_SIZE: usize = 64 * 1024;

/// Chunks in flight between the walk and the archive writer
const ARCHIVE_QUEUE_DEPTH: usize = 16;

/// One instruction for the archive writer
enum ZipEntry {
    Directory(String, SimpleFileOptions),
    File(String, SimpleFileOptions),
    /// Content of the most recently started file
    Data(Bytes),
}

/// Write every received entry, then finish the archive
fn write_archive<W: Write + Seek>(writer: W, mut entries: mpsc::Receiver<ZipEntry>) -> Result<W> {
    let mut zip = ZipWriter::new(writer);
    while let Some(entry) = entries.blocking_recv() {
        match entry {
            ZipEntry::Directory(path, options) => zip.add_directory(path, options)?,
            ZipEntry::File(path, options) => zip.start_file(path, options)?,
            ZipEntry::Data(data) => zip.write_all(&data)?,
        }
    }
    Ok(zip.finish()?)
}

/// Sends every walked entry to the archive writer
struct ZipVisitor<'a> {
    fs: &'a BucketFs,
    entries: mpsc::Sender<ZipEntry>,
    files: usize,
}

/// Zip timestamps start in 1980; anything earlier keeps the default
fn zip_time(time: DateTime<Utc>) -> Option<zip::DateTime> {
    zip::DateTime::from_date_and_time(
        u16::try_from(time.year()).ok()?,
        u8::try_from(time.month()).ok()?,
        u8::try_from(time.day()).ok()?,
        u8::try_from(time.hour()).ok()?,
        u8::try_from(time.minute()).ok()?,
        u8::try_from(time.second()).ok()?,
    )
    .ok()
}

impl ZipVisitor<'_> {
    async fn send(&self, entry: ZipEntry) -> Result<()> {
        self.entries
            .send(entry)
            .await
            .map_err(|_| anyhow!("Archive writer stopped"))
    }

    async fn add_file(&mut self, path: &str, meta: &Metadata) -> Result<()> {
        let file = match self.fs.open(path).await? {
            Handle::File(file) => file,
            Handle::Dir(_) => {
                // An object shadowed by a directory of the same name
                diagnostics::warn!("Skipping {path}: opens as a directory", path: path);
                return Ok(());
            }
        };

        let mut options = SimpleFileOptions::default()
            .unix_permissions(meta.mode())
            .large_file(meta.size() >= u64::from(u32::MAX));
        if let Some(time) = zip_time(meta.modified()) {
            options = options.last_modified_time(time);
        }
        self.send(ZipEntry::File(path.to_string(), options)).await?;

        let mut chunks = ReaderStream::with_capacity(file, COPY_BUFFER_SIZE);
        while let Some(chunk) = chunks.next().await {
            self.send(ZipEntry::Data(chunk?)).await?;
        }
        self.files += 1;
        Ok(())
    }
}

#[async_trait]
impl WalkVisitor for ZipVisitor<'_> {
    async fn visit(&mut self, path: &str, meta: &Metadata, depth: usize) -> Result<()> {
        if meta.is_file() {
            return self
                .add_file(path, meta)
                .await
                .with_context(|| format!("Failed to archive '{path}'"));
        }
        if depth > 0 {
            let options = SimpleFileOptions::default().unix_permissions(meta.mode());
            self.send(ZipEntry::Directory(format!("{path}/"), options))
                .await?;
        }
        Ok(())
    }
}

/// Archive the whole view into `writer`, paths relative to its root.
/// Returns the finished writer and the number of files written.
pub async fn zip_to_writer<W>(fs: &BucketFs, writer: W) -> Result<(W, usize)>
where
    W: Write + Seek + Send + 'static,
{
    let (sender, receiver) = mpsc::channel(ARCHIVE_QUEUE_DEPTH);
    let archiver = tokio::task::spawn_blocking(move || write_archive(writer, receiver));

    let mut visitor = ZipVisitor {
        fs,
        entries: sender,
        files: 0,
    };
    let walked = walk_dir(fs, ".", &mut visitor).await;
    let files = visitor.files;
    // Closing the channel lets the writer finish
    drop(visitor);

    // A failed writer is the cause of any send error in the walk
    let writer = archiver.await.context("Archive writer panicked")??;
    _ = walked?;
    Ok((writer, files))
}

/// Create (or truncate) `output` and archive the whole view into it
pub async fn zip_command(fs: &BucketFs, output: &Path) -> Result<usize> {
    let file = tokio::fs::File::create(output)
        .await
        .with_context(|| format!("Failed to create '{}'", output.display()))?
        .into_std()
        .await;
    let (_, files) = zip_to_writer(fs, file).await?;

    let output = output.display().to_string();
    diagnostics::info!("Wrote {files} files to {output}", files: files, output: output);
    Ok(files)
}
