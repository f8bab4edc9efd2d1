/// Entry type of a listed or opened path
///
/// A bucket only knows objects, so this is either a regular file (an
/// object key) or a directory synthesized from a common prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryType {
    /// Object stored under an exact key
    File,
    /// Common prefix with at least one object nested under it
    Directory,
}

impl EntryType {
    #[must_use]
    pub fn is_dir(&self) -> bool {
        matches!(self, EntryType::Directory)
    }

    /// Fixed, non-authoritative permission bits; the store has none.
    #[must_use]
    pub fn mode(&self) -> u32 {
        match self {
            EntryType::File => 0o644,
            EntryType::Directory => 0o755,
        }
    }
}
