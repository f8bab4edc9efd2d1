// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! Read-only hierarchical filesystem over a flat object store bucket
//!
//! Objects are addressed by keys such as `subdir/a.txt`; directories are
//! synthesized from key prefixes. `BucketFs` offers `open`, `stat`,
//! `read_dir`, `read_file` and `sub` over any `Bucket`, most commonly an
//! `ObjectStoreBucket` wrapping an `object_store::ObjectStore`.

pub mod bucket;
pub mod context;
pub mod dir;
pub mod entry_type;
pub mod error;
pub mod file;
pub mod fs;
pub mod handle;
pub mod metadata;
pub mod object_store_bucket;
pub mod path;

pub use bucket::{Bucket, ByteStream, EntryStream, ObjectAttrs, ObjectEntry, Query};
pub use context::OpContext;
pub use dir::Dir;
pub use entry_type::EntryType;
pub use error::{Error, Result};
pub use file::File;
pub use fs::BucketFs;
pub use handle::Handle;
pub use metadata::Metadata;
pub use object_store_bucket::ObjectStoreBucket;

#[cfg(test)]
mod tests;
