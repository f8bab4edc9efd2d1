// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

use crate::bucket::{ObjectAttrs, ObjectEntry};
use crate::entry_type::EntryType;
use crate::path;
use chrono::{DateTime, Utc};

/// Generic file metadata for an object or a synthesized directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Metadata {
    name: String,
    size: u64,
    modified: DateTime<Utc>,
    entry_type: EntryType,
}

impl Metadata {
    /// Metadata of an object, named by the last segment of its key
    #[must_use]
    pub fn file(attrs: &ObjectAttrs) -> Self {
        Self {
            name: path::base_name(&attrs.key).to_string(),
            size: attrs.size,
            modified: attrs.updated,
            entry_type: EntryType::File,
        }
    }

    /// Metadata of a synthesized directory. The store keeps no timestamp
    /// for prefixes, so every directory reports the Unix epoch.
    #[must_use]
    pub fn directory(key: &str) -> Self {
        Self {
            name: path::base_name(key).to_string(),
            size: 0,
            modified: DateTime::<Utc>::UNIX_EPOCH,
            entry_type: EntryType::Directory,
        }
    }

    /// Metadata of one listing result
    #[must_use]
    pub fn from_entry(entry: &ObjectEntry) -> Self {
        match entry {
            ObjectEntry::Object(attrs) => Self::file(attrs),
            ObjectEntry::Prefix(prefix) => Self::directory(prefix),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Size in bytes; zero for directories
    #[must_use]
    pub fn size(&self) -> u64 {
        self.size
    }

    #[must_use]
    pub fn modified(&self) -> DateTime<Utc> {
        self.modified
    }

    #[must_use]
    pub fn entry_type(&self) -> EntryType {
        self.entry_type
    }

    #[must_use]
    pub fn is_dir(&self) -> bool {
        self.entry_type.is_dir()
    }

    #[must_use]
    pub fn is_file(&self) -> bool {
        !self.is_dir()
    }

    #[must_use]
    pub fn mode(&self) -> u32 {
        self.entry_type.mode()
    }
}
