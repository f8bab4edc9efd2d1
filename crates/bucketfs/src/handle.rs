// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

use crate::dir::Dir;
use crate::error::{Error, Result};
use crate::file::File;
use crate::metadata::Metadata;

/// Result of `BucketFs::open`: either an object or a synthesized directory
#[derive(Debug)]
pub enum Handle {
    File(File),
    Dir(Dir),
}

impl Handle {
    #[must_use]
    pub fn path(&self) -> &str {
        match self {
            Handle::File(file) => file.path(),
            Handle::Dir(dir) => dir.path(),
        }
    }

    #[must_use]
    pub fn stat(&self) -> Metadata {
        match self {
            Handle::File(file) => file.stat(),
            Handle::Dir(dir) => dir.stat(),
        }
    }

    #[must_use]
    pub fn is_dir(&self) -> bool {
        matches!(self, Handle::Dir(_))
    }

    pub async fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        match self {
            Handle::File(file) => file.read(buf).await,
            Handle::Dir(dir) => dir.read(buf).await,
        }
    }

    /// See `Dir::read_dir`; a file handle fails with `NotADirectory`
    pub async fn read_dir(&mut self, limit: Option<usize>) -> Result<Vec<Metadata>> {
        match self {
            Handle::File(file) => Err(Error::not_a_directory(file.path())),
            Handle::Dir(dir) => dir.read_dir(limit).await,
        }
    }

    pub fn into_file(self) -> Result<File> {
        match self {
            Handle::File(file) => Ok(file),
            Handle::Dir(dir) => Err(Error::is_a_directory(dir.path())),
        }
    }

    pub fn into_dir(self) -> Result<Dir> {
        match self {
            Handle::File(file) => Err(Error::not_a_directory(file.path())),
            Handle::Dir(dir) => Ok(dir),
        }
    }

    pub fn close(self) -> Result<()> {
        match self {
            Handle::File(file) => file.close(),
            Handle::Dir(dir) => dir.close(),
        }
    }
}
