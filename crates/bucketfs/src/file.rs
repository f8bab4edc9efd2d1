// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! Open object handles

use crate::bucket::{ByteStream, ObjectAttrs};
use crate::context::{Interrupt, OpContext};
use crate::error::Result;
use crate::metadata::Metadata;
use bytes::Bytes;
use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::io::{AsyncRead, AsyncReadExt, ReadBuf};
use tokio_util::io::StreamReader;

/// An open object: the attribute snapshot taken when it was opened and
/// the live content stream. Dropping the handle releases the stream.
pub struct File {
    path: String,
    attrs: ObjectAttrs,
    reader: StreamReader<ByteStream, Bytes>,
    interrupt: Interrupt,
}

impl File {
    pub(crate) fn new(path: &str, attrs: ObjectAttrs, content: ByteStream, ctx: &OpContext) -> Self {
        Self {
            path: path.to_string(),
            attrs,
            reader: StreamReader::new(content),
            interrupt: ctx.interrupt(),
        }
    }

    /// Path relative to the view it was opened from
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    #[must_use]
    pub fn attrs(&self) -> &ObjectAttrs {
        &self.attrs
    }

    /// Metadata from the snapshot taken at open time; no network call
    #[must_use]
    pub fn stat(&self) -> Metadata {
        Metadata::file(&self.attrs)
    }

    /// Read up to `buf.len()` bytes; `Ok(0)` at end of content
    pub async fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        Ok(AsyncReadExt::read(self, buf).await?)
    }

    /// Read the remaining content
    pub async fn read_to_end(&mut self) -> Result<Vec<u8>> {
        let mut content = Vec::with_capacity(usize::try_from(self.attrs.size).unwrap_or(0));
        _ = AsyncReadExt::read_to_end(self, &mut content).await?;
        Ok(content)
    }

    pub fn close(self) -> Result<()> {
        drop(self);
        Ok(())
    }
}

impl std::fmt::Debug for File {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("File")
            .field("path", &self.path)
            .field("attrs", &self.attrs)
            .finish_non_exhaustive()
    }
}

impl AsyncRead for File {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let this = self.get_mut();
        if let Some(err) = this.interrupt.poll_interrupted(cx) {
            return Poll::Ready(Err(err.into()));
        }
        Pin::new(&mut this.reader).poll_read(cx, buf)
    }
}
